use crate::{bitmatrix::BitMatrix, image::ImageView, options::Binarizer};

// Binarization
//------------------------------------------------------------------------------

const BLOCK: usize = 8;
const MIN_DYNAMIC_RANGE: u32 = 24;

/// Grayscale to bits (set = dark). Best effort on any input; degenerate
/// images come back blank rather than failing.
pub fn binarize(img: &ImageView, mode: Binarizer) -> BitMatrix {
    match mode {
        Binarizer::LocalAverage => local_average(img),
        Binarizer::GlobalHistogram => global_histogram(img),
        Binarizer::FixedThreshold => fixed_threshold(img, 127),
        Binarizer::BoolCast => bool_cast(img),
    }
}

/// Block-adaptive thresholding: 8x8 block means, smoothed over a 5x5 block
/// neighborhood, with a flat-region heuristic that inherits the neighbor's
/// threshold.
fn local_average(img: &ImageView) -> BitMatrix {
    let (w, h) = (img.width(), img.height());
    if w < BLOCK || h < BLOCK {
        return global_histogram(img);
    }

    let bw = w.div_ceil(BLOCK);
    let bh = h.div_ceil(BLOCK);
    let mut thresholds = vec![0u32; bw * bh];

    for by in 0..bh {
        for bx in 0..bw {
            // Clamp the window so edge blocks still see 8x8 pixels
            let x0 = (bx * BLOCK).min(w - BLOCK);
            let y0 = (by * BLOCK).min(h - BLOCK);
            let (mut sum, mut min, mut max) = (0u32, 255u32, 0u32);
            for y in y0..y0 + BLOCK {
                for x in x0..x0 + BLOCK {
                    let p = img.luminance(x, y) as u32;
                    sum += p;
                    min = min.min(p);
                    max = max.max(p);
                }
            }

            thresholds[by * bw + bx] = if max - min < MIN_DYNAMIC_RANGE {
                // Flat region; trust the already-computed neighborhood
                if bx > 0 {
                    thresholds[by * bw + bx - 1]
                } else if by > 0 {
                    thresholds[(by - 1) * bw + bx]
                } else {
                    min / 2
                }
            } else {
                let mean = sum / (BLOCK * BLOCK) as u32;
                mean.saturating_sub(1).max(min + 1)
            };
        }
    }

    let mut bits = BitMatrix::new(w, h);
    for by in 0..bh {
        for bx in 0..bw {
            // Average the 5x5 neighborhood of block thresholds
            let (mut acc, mut n) = (0u32, 0u32);
            for dy in -2i32..=2 {
                for dx in -2i32..=2 {
                    let (nx, ny) = (bx as i32 + dx, by as i32 + dy);
                    if (0..bw as i32).contains(&nx) && (0..bh as i32).contains(&ny) {
                        acc += thresholds[ny as usize * bw + nx as usize];
                        n += 1;
                    }
                }
            }
            let t = acc / n;

            for y in by * BLOCK..((by + 1) * BLOCK).min(h) {
                for x in bx * BLOCK..((bx + 1) * BLOCK).min(w) {
                    if (img.luminance(x, y) as u32) < t {
                        bits.set(x, y);
                    }
                }
            }
        }
    }
    bits
}

/// Single global threshold from the luminance histogram (Otsu's criterion).
fn global_histogram(img: &ImageView) -> BitMatrix {
    let (w, h) = (img.width(), img.height());
    let mut hist = [0u64; 256];
    for y in 0..h {
        for x in 0..w {
            hist[img.luminance(x, y) as usize] += 1;
        }
    }

    let total = (w * h) as u64;
    let sum_all: u64 = hist.iter().enumerate().map(|(v, &c)| v as u64 * c).sum();

    let mut best_t = 127usize;
    let mut best_var = 0.0f64;
    let (mut w0, mut sum0) = (0u64, 0u64);
    for t in 0..256 {
        w0 += hist[t];
        if w0 == 0 {
            continue;
        }
        let w1 = total - w0;
        if w1 == 0 {
            break;
        }
        sum0 += t as u64 * hist[t];
        let m0 = sum0 as f64 / w0 as f64;
        let m1 = (sum_all - sum0) as f64 / w1 as f64;
        let var = w0 as f64 * w1 as f64 * (m0 - m1) * (m0 - m1);
        if var > best_var {
            best_var = var;
            best_t = t;
        }
    }

    fixed_threshold(img, best_t as u8)
}

fn fixed_threshold(img: &ImageView, t: u8) -> BitMatrix {
    let (w, h) = (img.width(), img.height());
    let mut bits = BitMatrix::new(w, h);
    for y in 0..h {
        for x in 0..w {
            if img.luminance(x, y) <= t {
                bits.set(x, y);
            }
        }
    }
    bits
}

/// For inputs that are already 0/1 masks: any nonzero pixel is set.
fn bool_cast(img: &ImageView) -> BitMatrix {
    let (w, h) = (img.width(), img.height());
    let mut bits = BitMatrix::new(w, h);
    for y in 0..h {
        for x in 0..w {
            if img.luminance(x, y) != 0 {
                bits.set(x, y);
            }
        }
    }
    bits
}
