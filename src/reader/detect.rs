use super::{
    alignment::find_alignment,
    finder::FinderPatternSet,
    perspective::Homography,
    sampler::sample_grid,
};
use crate::{
    bitmatrix::BitMatrix,
    error::{Error, ScanResult},
    geometry::PointF,
    metadata::Version,
    result::Position,
};

// Detector result
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DetectorResult {
    pub bits: BitMatrix,
    pub position: Position,
    /// How many scan lines confirmed the weakest finder of this symbol.
    pub line_count: usize,
}

// Full detection from one finder triple
//------------------------------------------------------------------------------

/// Estimates dimension from the finder geometry, refines the bottom-right
/// corner against the alignment pattern when the version has one, builds
/// the homography and samples the grid.
pub fn detect_from_set(img: &BitMatrix, set: &FinderPatternSet) -> ScanResult<DetectorResult> {
    let (tl, tr, bl) = (set.tl, set.tr, set.bl);
    let ms = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    if ms < 1.0 {
        return Err(Error::Format("module size below one pixel"));
    }

    let dim = compute_dimension(tl.center, tr.center, bl.center, ms)?;
    let ver = match Version::from_dimension(dim) {
        Some(v @ Version::Normal(_)) => v,
        _ => return Err(Error::Format("implausible symbol dimension")),
    };

    let dimf = dim as f64;
    let mut src_br = PointF::new(dimf - 3.5, dimf - 3.5);
    let mut dst_br = PointF::new(
        tr.center.x + bl.center.x - tl.center.x,
        tr.center.y + bl.center.y - tl.center.y,
    );

    // Versions with an alignment pattern get a measured fourth point
    if *ver >= 2 {
        let modules_between = (dim - 7) as f64;
        let correction = 1.0 - 3.0 / modules_between;
        let est = PointF::new(
            tl.center.x + correction * (dst_br.x - tl.center.x),
            tl.center.y + correction * (dst_br.y - tl.center.y),
        );
        for allowance in [4.0, 8.0, 16.0] {
            if let Some(p) = find_alignment(img, est.x, est.y, ms, allowance) {
                src_br = PointF::new(dimf - 6.5, dimf - 6.5);
                dst_br = p;
                break;
            }
        }
    }

    let src = [
        PointF::new(3.5, 3.5),
        PointF::new(dimf - 3.5, 3.5),
        src_br,
        PointF::new(3.5, dimf - 3.5),
    ];
    let dst = [tl.center, tr.center, dst_br, bl.center];
    let h = Homography::compute(src, dst).ok_or(Error::Format("degenerate perspective"))?;

    let bits = sample_grid(img, &h, dim)?;
    let position = Position([
        h.map(0.0, 0.0).to_i32(),
        h.map(dimf, 0.0).to_i32(),
        h.map(dimf, dimf).to_i32(),
        h.map(0.0, dimf).to_i32(),
    ]);
    let line_count = tl.count.min(tr.count).min(bl.count);

    Ok(DetectorResult { bits, position, line_count })
}

fn compute_dimension(tl: PointF, tr: PointF, bl: PointF, ms: f64) -> ScanResult<usize> {
    let top = (tl.distance(tr) / ms).round() as i64;
    let left = (tl.distance(bl) / ms).round() as i64;
    let mut dim = (top + left) / 2 + 7;
    match dim % 4 {
        0 => dim += 1,
        2 => dim -= 1,
        3 => return Err(Error::Format("dimension off by more than one module")),
        _ => {}
    }
    if !(21..=177).contains(&dim) {
        return Err(Error::Format("implausible symbol dimension"));
    }
    Ok(dim as usize)
}

// Pure symbol detection
//------------------------------------------------------------------------------

/// Axis-aligned detector for clean, unrotated renderings: takes the dark
/// bounding box, derives the module pitch from the top finder run and
/// samples directly. Works for QR and micro QR.
pub fn detect_pure(img: &BitMatrix) -> ScanResult<DetectorResult> {
    let (w, h) = (img.width(), img.height());
    let (mut left, mut top, mut right, mut bottom) = (w, h, 0usize, 0usize);
    for y in 0..h {
        for x in 0..w {
            if img.get(x, y) {
                left = left.min(x);
                top = top.min(y);
                right = right.max(x);
                bottom = bottom.max(y);
            }
        }
    }
    if left > right {
        return Err(Error::Format("blank image"));
    }

    let bw = right - left + 1;
    let bh = bottom - top + 1;
    if bw.abs_diff(bh) * 14 > bw.max(bh) {
        return Err(Error::Format("bounding box is not square"));
    }

    // Top edge of the top-left finder ring is exactly seven modules
    let mut run = 0;
    while left + run <= right && img.get(left + run, top) {
        run += 1;
    }
    if run == 0 {
        return Err(Error::Format("no finder run at the corner"));
    }
    let ms = run as f64 / 7.0;
    let dim = (bw as f64 / ms).round() as usize;
    if Version::from_dimension(dim).is_none() {
        return Err(Error::Format("implausible symbol dimension"));
    }

    let msx = bw as f64 / dim as f64;
    let msy = bh as f64 / dim as f64;
    let mut bits = BitMatrix::square(dim);
    for y in 0..dim {
        for x in 0..dim {
            let px = left as f64 + (x as f64 + 0.5) * msx;
            let py = top as f64 + (y as f64 + 0.5) * msy;
            if img.get(px as usize, py as usize) {
                bits.set(x, y);
            }
        }
    }

    let position = Position([
        PointF::new(left as f64, top as f64).to_i32(),
        PointF::new(right as f64, top as f64).to_i32(),
        PointF::new(right as f64, bottom as f64).to_i32(),
        PointF::new(left as f64, bottom as f64).to_i32(),
    ]);
    Ok(DetectorResult { bits, position, line_count: 0 })
}

#[cfg(test)]
mod detect_tests {
    use super::*;
    use crate::reader::finder::{group_finders, locate_finders};

    fn draw_finder(bits: &mut BitMatrix, ox: usize, oy: usize, s: usize) {
        for my in 0..7 {
            for mx in 0..7 {
                let ring = my == 0 || my == 6 || mx == 0 || mx == 6;
                let stone = (2..=4).contains(&mx) && (2..=4).contains(&my);
                if ring || stone {
                    for py in 0..s {
                        for px in 0..s {
                            bits.set(ox + mx * s + px, oy + my * s + py);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_detect_v1_dimension_and_corners() {
        let (s, dim, quiet) = (4usize, 21usize, 16usize);
        let mut img = BitMatrix::new(dim * s + 2 * quiet, dim * s + 2 * quiet);
        draw_finder(&mut img, quiet, quiet, s);
        draw_finder(&mut img, quiet + (dim - 7) * s, quiet, s);
        draw_finder(&mut img, quiet, quiet + (dim - 7) * s, s);

        let finders = locate_finders(&img, true);
        let sets = group_finders(&finders);
        assert_eq!(sets.len(), 1);
        let res = detect_from_set(&img, &sets[0]).unwrap();
        assert_eq!(res.bits.width(), dim);
        assert!(res.line_count >= 2);

        let tl = res.position.top_left();
        assert!(tl.x.abs_diff(quiet as i32) <= 1 && tl.y.abs_diff(quiet as i32) <= 1);
        let br = res.position.bottom_right();
        let far = (quiet + dim * s) as i32;
        assert!(br.x.abs_diff(far) <= 1 && br.y.abs_diff(far) <= 1);

        // The sampled image must contain the three finder rings
        for (mx, my) in [(3usize, 3usize), (17, 3), (3, 17)] {
            assert!(res.bits.get(mx, my), "stone missing at ({mx},{my})");
            assert!(!res.bits.get(mx + 1, my + 2), "separator area dark");
        }
    }

    #[test]
    fn test_pure_detection_samples_grid() {
        let (s, dim) = (3usize, 21usize);
        let mut img = BitMatrix::new(dim * s + 8, dim * s + 8);
        draw_finder(&mut img, 4, 4, s);
        draw_finder(&mut img, 4 + (dim - 7) * s, 4, s);
        draw_finder(&mut img, 4, 4 + (dim - 7) * s, s);
        // A lone dark module at (9, 10) pins the bounding box reading
        for py in 0..s {
            for px in 0..s {
                img.set(4 + 9 * s + px, 4 + 10 * s + py);
            }
        }
        let res = detect_pure(&img).unwrap();
        assert_eq!(res.bits.width(), dim);
        assert!(res.bits.get(9, 10));
        assert!(res.bits.get(0, 0) && res.bits.get(20, 0) && res.bits.get(0, 20));
        assert!(!res.bits.get(10, 10));
    }

    #[test]
    fn test_pure_rejects_non_square() {
        let mut img = BitMatrix::new(100, 40);
        for x in 10..90 {
            for y in 10..30 {
                img.set(x, y);
            }
        }
        assert!(detect_pure(&img).unwrap_err().is_format());
    }
}
