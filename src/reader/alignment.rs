use crate::{bitmatrix::BitMatrix, geometry::PointF};

// Alignment pattern search
//------------------------------------------------------------------------------

// 1:1:1 run ratio with half-module tolerance.
fn found_alignment_pattern(counts: &[u32; 3], module_size: f64) -> bool {
    let var = module_size / 2.0;
    counts.iter().all(|&c| (c as f64 - module_size).abs() < var)
}

// Looks for the one-module center dot: a white-dark-white column through
// (cx, cy). Ring segments fail the max_count cap, the dot passes.
fn cross_check_vertical(bits: &BitMatrix, cx: i32, cy: i32, module_size: f64) -> Option<f64> {
    let h = bits.height() as i32;
    if cx < 0 || cx >= bits.width() as i32 {
        return None;
    }
    let at = |y: i32| bits.get(cx as usize, y as usize);
    let max_count = (module_size * 2.0) as u32 + 1;
    let mut counts = [0u32; 3];

    let mut i = cy;
    while i >= 0 && at(i) && counts[1] <= max_count {
        counts[1] += 1;
        i -= 1;
    }
    if i < 0 || counts[1] > max_count {
        return None;
    }
    while i >= 0 && !at(i) && counts[0] <= max_count {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] > max_count {
        return None;
    }

    let mut i = cy + 1;
    while i < h && at(i) && counts[1] <= max_count {
        counts[1] += 1;
        i += 1;
    }
    if i == h || counts[1] > max_count {
        return None;
    }
    while i < h && !at(i) && counts[2] <= max_count {
        counts[2] += 1;
        i += 1;
    }
    if counts[2] > max_count {
        return None;
    }

    if found_alignment_pattern(&counts, module_size) {
        Some((i - counts[2] as i32) as f64 - counts[1] as f64 / 2.0)
    } else {
        None
    }
}

fn scan_alignment_row(
    bits: &BitMatrix,
    y: i32,
    x0: i32,
    x1: i32,
    module_size: f64,
) -> Option<PointF> {
    // 0 = leading white, 1 = dark, 2 = trailing white
    let mut counts = [0u32; 3];
    let mut state = 0usize;

    let check = |counts: &[u32; 3], end: i32| -> Option<PointF> {
        if !found_alignment_pattern(counts, module_size) {
            return None;
        }
        let cx = (end - counts[2] as i32) as f64 - counts[1] as f64 / 2.0;
        let cy = cross_check_vertical(bits, cx.round() as i32, y, module_size)?;
        Some(PointF::new(cx, cy))
    };

    for x in x0..=x1 {
        let dark = bits.get(x as usize, y as usize);
        match (state, dark) {
            (0, false) => counts[0] += 1,
            (0, true) | (2, true) => {
                if state == 2 {
                    if let Some(p) = check(&counts, x) {
                        return Some(p);
                    }
                    counts[0] = counts[2];
                }
                counts[1] = 1;
                counts[2] = 0;
                state = 1;
            }
            (1, true) => counts[1] += 1,
            (1, false) => {
                counts[2] = 1;
                state = 2;
            }
            (2, false) => counts[2] += 1,
            _ => unreachable!(),
        }
    }

    if state == 2 {
        return check(&counts, x1 + 1);
    }
    None
}

/// Searches a window around the expected center for the 1:1:1 alignment
/// pattern. `allowance` is the search half-width in modules; a miss returns
/// `None` and the caller falls back to the three-point approximation.
pub fn find_alignment(
    bits: &BitMatrix,
    est_x: f64,
    est_y: f64,
    module_size: f64,
    allowance: f64,
) -> Option<PointF> {
    let (w, h) = (bits.width() as i32, bits.height() as i32);
    let margin = (allowance * module_size).ceil() as i32;
    let x0 = ((est_x as i32) - margin).max(0);
    let x1 = ((est_x as i32) + margin).min(w - 1);
    let y0 = ((est_y as i32) - margin).max(0);
    let y1 = ((est_y as i32) + margin).min(h - 1);
    if x1 - x0 < (module_size * 3.0) as i32 || y1 - y0 < (module_size * 3.0) as i32 {
        return None;
    }

    // Alternate outward from the expected row so the nearest hit wins
    let mid = est_y.round() as i32;
    for d in 0..=(y1 - y0) {
        for y in [mid - d, mid + d] {
            if (y0..=y1).contains(&y) {
                if let Some(p) = scan_alignment_row(bits, y, x0, x1, module_size) {
                    return Some(p);
                }
            }
        }
        if mid - d < y0 && mid + d > y1 {
            break;
        }
    }
    None
}
