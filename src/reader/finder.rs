use crate::{bitmatrix::BitMatrix, geometry::PointF};

// Finder pattern
//------------------------------------------------------------------------------

/// A confirmed 1:1:3:1:1 center with its pixel-space module size and the
/// number of scans that agreed on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    pub center: PointF,
    pub module_size: f64,
    pub count: usize,
}

impl FinderPattern {
    /// Nearly the same center with nearly the same size.
    fn about_equals(&self, module_size: f64, i: f64, j: f64) -> bool {
        if (i - self.center.y).abs() <= module_size && (j - self.center.x).abs() <= module_size {
            let diff = (module_size - self.module_size).abs();
            diff <= 1.0 || diff <= self.module_size
        } else {
            false
        }
    }

    /// Count-weighted average of this estimate and a new observation.
    fn combine(&mut self, i: f64, j: f64, module_size: f64) {
        let c = self.count as f64;
        self.center.x = (c * self.center.x + j) / (c + 1.0);
        self.center.y = (c * self.center.y + i) / (c + 1.0);
        self.module_size = (c * self.module_size + module_size) / (c + 1.0);
        self.count += 1;
    }
}

// Line scanner
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct CandidateLine {
    center_x: f64,
    stone: u32,
    total: u32,
    y: u32,
}

// Rolling window of the last five complete run lengths along a row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineScanner {
    buffer: [u32; 6],
    prev: Option<bool>,
    transitions: u32,
    pos: u32,
    y: u32,
}

impl LineScanner {
    fn new() -> Self {
        Self { buffer: [0; 6], prev: None, transitions: 0, pos: 0, y: 0 }
    }

    fn reset(&mut self, y: u32) {
        self.buffer = [0; 6];
        self.prev = None;
        self.transitions = 0;
        self.pos = 0;
        self.y = y;
    }

    fn advance(&mut self, dark: bool) -> Option<CandidateLine> {
        self.pos += 1;

        if self.prev == Some(dark) {
            self.buffer[5] += 1;
            return None;
        }

        self.buffer.rotate_left(1);
        self.buffer[5] = 1;
        self.prev = Some(dark);
        self.transitions += 1;

        if self.is_finder_line() {
            let b = &self.buffer;
            let end = (self.pos - 2 - b[4] - b[3]) as f64;
            Some(CandidateLine {
                center_x: end - (b[2] as f64 - 1.0) / 2.0,
                stone: b[2],
                total: b[..5].iter().sum(),
                y: self.y,
            })
        } else {
            None
        }
    }

    // The window just closed with a white run, so buffer[0..5] holds a
    // dark-white-dark-white-dark sequence to test against 1:1:3:1:1.
    fn is_finder_line(&self) -> bool {
        if self.prev != Some(false) || self.transitions < 6 {
            return false;
        }
        found_pattern(&self.buffer[..5].try_into().unwrap(), 0.5)
    }
}

fn found_pattern(counts: &[u32; 5], tolerance: f64) -> bool {
    let total: u32 = counts.iter().sum();
    if total < 7 {
        return false;
    }
    let ms = total as f64 / 7.0;
    let var = ms * tolerance;
    for (i, &c) in counts.iter().enumerate() {
        let expected = if i == 2 { 3.0 * ms } else { ms };
        let allowed = if i == 2 { 3.0 * var } else { var };
        if (c as f64 - expected).abs() >= allowed {
            return false;
        }
    }
    true
}

// Cross checks
//------------------------------------------------------------------------------

fn center_from_end(counts: &[u32; 5], end: i32) -> f64 {
    (end - counts[4] as i32 - counts[3] as i32) as f64 - counts[2] as f64 / 2.0
}

// Verifies a 1:1:3:1:1 run along one axis through (cx, cy); returns the
// refined center coordinate on that axis and the run total.
fn cross_check(
    bits: &BitMatrix,
    cx: i32,
    cy: i32,
    vertical: bool,
    max_count: u32,
    orig_total: u32,
) -> Option<(f64, u32)> {
    let limit = if vertical { bits.height() } else { bits.width() } as i32;
    let at = |i: i32| -> bool {
        if vertical {
            bits.get(cx as usize, i as usize)
        } else {
            bits.get(i as usize, cy as usize)
        }
    };
    let start = if vertical { cy } else { cx };
    let mut counts = [0u32; 5];

    let mut i = start;
    while i >= 0 && at(i) {
        counts[2] += 1;
        i -= 1;
    }
    if i < 0 {
        return None;
    }
    while i >= 0 && !at(i) && counts[1] <= max_count {
        counts[1] += 1;
        i -= 1;
    }
    if i < 0 || counts[1] > max_count {
        return None;
    }
    while i >= 0 && at(i) && counts[0] <= max_count {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] > max_count {
        return None;
    }

    let mut i = start + 1;
    while i < limit && at(i) {
        counts[2] += 1;
        i += 1;
    }
    if i == limit {
        return None;
    }
    while i < limit && !at(i) && counts[3] <= max_count {
        counts[3] += 1;
        i += 1;
    }
    if i == limit || counts[3] > max_count {
        return None;
    }
    while i < limit && at(i) && counts[4] <= max_count {
        counts[4] += 1;
        i += 1;
    }
    if counts[4] > max_count {
        return None;
    }

    let total: u32 = counts.iter().sum();
    if 5 * total.abs_diff(orig_total) >= 2 * orig_total {
        return None;
    }
    if !found_pattern(&counts, 0.5) {
        return None;
    }
    Some((center_from_end(&counts, i), total))
}

// Rejects line-shaped noise that passes both axis checks but is not a
// concentric square.
fn cross_check_diagonal(bits: &BitMatrix, cx: i32, cy: i32) -> bool {
    let (w, h) = (bits.width() as i32, bits.height() as i32);
    let at = |x: i32, y: i32| bits.get(x as usize, y as usize);
    let mut counts = [0u32; 5];

    let mut i = 0;
    while cx - i >= 0 && cy - i >= 0 && at(cx - i, cy - i) {
        counts[2] += 1;
        i += 1;
    }
    if cx - i < 0 || cy - i < 0 {
        return false;
    }
    while cx - i >= 0 && cy - i >= 0 && !at(cx - i, cy - i) {
        counts[1] += 1;
        i += 1;
    }
    if cx - i < 0 || cy - i < 0 {
        return false;
    }
    while cx - i >= 0 && cy - i >= 0 && at(cx - i, cy - i) && counts[0] <= counts[2] {
        counts[0] += 1;
        i += 1;
    }

    let mut i = 1;
    while cx + i < w && cy + i < h && at(cx + i, cy + i) {
        counts[2] += 1;
        i += 1;
    }
    if cx + i >= w || cy + i >= h {
        return false;
    }
    while cx + i < w && cy + i < h && !at(cx + i, cy + i) {
        counts[3] += 1;
        i += 1;
    }
    if cx + i >= w || cy + i >= h {
        return false;
    }
    while cx + i < w && cy + i < h && at(cx + i, cy + i) && counts[4] <= counts[2] {
        counts[4] += 1;
        i += 1;
    }

    found_pattern(&counts, 0.75)
}

// Locate finders
//------------------------------------------------------------------------------

/// Scans rows for 1:1:3:1:1 runs, verifies candidates on the other axis and
/// the diagonal, and merges repeated observations. `count` on the returned
/// patterns tells how many scan lines confirmed each center.
pub fn locate_finders(bits: &BitMatrix, try_harder: bool) -> Vec<FinderPattern> {
    let (w, h) = (bits.width() as u32, bits.height() as u32);
    let row_skip: u32 = if try_harder { 1 } else { 3.max(h / 256) };
    let mut finders: Vec<FinderPattern> = Vec::new();
    let mut scanner = LineScanner::new();

    let mut y = 0;
    while y < h {
        scanner.reset(y);
        for x in 0..w {
            let candidate = match scanner.advance(bits.get(x as usize, y as usize)) {
                Some(c) => c,
                None => continue,
            };
            handle_possible_center(bits, &candidate, &mut finders);
        }
        y += row_skip;
    }

    finders
}

fn handle_possible_center(
    bits: &BitMatrix,
    candidate: &CandidateLine,
    finders: &mut Vec<FinderPattern>,
) {
    let max_count = candidate.stone * 2;
    let cx = candidate.center_x.round() as i32;

    let (cy, v_total) =
        match cross_check(bits, cx, candidate.y as i32, true, max_count, candidate.total) {
            Some(v) => v,
            None => return,
        };
    let (cx_refined, h_total) =
        match cross_check(bits, cx, cy.round() as i32, false, max_count, v_total) {
            Some(v) => v,
            None => return,
        };
    if !cross_check_diagonal(bits, cx_refined.round() as i32, cy.round() as i32) {
        return;
    }

    let module_size = h_total as f64 / 7.0;
    for f in finders.iter_mut() {
        if f.about_equals(module_size, cy, cx_refined) {
            f.combine(cy, cx_refined, module_size);
            return;
        }
    }
    finders.push(FinderPattern { center: PointF::new(cx_refined, cy), module_size, count: 1 });
}

// Grouping into symbol candidates
//------------------------------------------------------------------------------

/// Three finders ordered top-left, top-right, bottom-left.
#[derive(Debug, Clone, Copy)]
pub struct FinderPatternSet {
    pub tl: FinderPattern,
    pub tr: FinderPattern,
    pub bl: FinderPattern,
    pub score: f64,
}

/// Scores every triple of confirmed finders by module-size agreement,
/// equidistance and squareness; best candidates first.
pub fn group_finders(finders: &[FinderPattern]) -> Vec<FinderPatternSet> {
    let confirmed: Vec<&FinderPattern> = finders.iter().filter(|f| f.count >= 2).collect();
    let mut sets = Vec::new();

    for i in 0..confirmed.len() {
        for j in i + 1..confirmed.len() {
            for k in j + 1..confirmed.len() {
                let (a, b, c) = (confirmed[i], confirmed[j], confirmed[k]);

                let sizes = [a.module_size, b.module_size, c.module_size];
                let min_ms = sizes.iter().cloned().fold(f64::INFINITY, f64::min);
                let max_ms = sizes.iter().cloned().fold(0.0, f64::max);
                if max_ms > 2.0 * min_ms {
                    continue;
                }

                if let Some(set) = order_triple(a, b, c) {
                    sets.push(set);
                }
            }
        }
    }

    sets.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
    sets
}

fn order_triple(
    a: &FinderPattern,
    b: &FinderPattern,
    c: &FinderPattern,
) -> Option<FinderPatternSet> {
    let d_ab = a.center.distance(b.center);
    let d_ac = a.center.distance(c.center);
    let d_bc = b.center.distance(c.center);

    // The two most distant patterns sit on the diagonal
    let (tl, mut p, mut q, diag) = if d_bc >= d_ab && d_bc >= d_ac {
        (a, b, c, d_bc)
    } else if d_ac >= d_ab {
        (b, a, c, d_ac)
    } else {
        (c, a, b, d_ab)
    };

    // Proper winding puts top-right before bottom-left
    if (p.center - tl.center).cross(q.center - tl.center) < 0.0 {
        std::mem::swap(&mut p, &mut q);
    }
    let (tr, bl) = (p, q);

    let top = tl.center.distance(tr.center);
    let left = tl.center.distance(bl.center);
    if top == 0.0 || left == 0.0 {
        return None;
    }

    // Sides about equal, diagonal about right-angled
    let balance = (1.0 - top / left).abs().max((1.0 - left / top).abs());
    let squareness = (diag * diag - top * top - left * left).abs() / (diag * diag);
    if balance > 0.7 || squareness > 0.5 {
        return None;
    }

    Some(FinderPatternSet { tl: *tl, tr: *tr, bl: *bl, score: balance + squareness })
}
