use crate::config::Heuristic;
use crate::geometry::{FreeRect, Rect};

/// Where a rectangle would go and how well it scores there (lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    x: u32,
    y: u32,
    rotated: bool,
    score: (i64, i64),
}

/// MaxRects bin: tracks every maximal free rectangle of a fixed-size bin.
///
/// One instance is reused across many trials via [`MaxRectsBinPack::init`]; the free and
/// used lists keep their allocations between runs.
#[derive(Debug, Clone, Default)]
pub struct MaxRectsBinPack {
    bin_width: u32,
    bin_height: u32,
    allow_rotation: bool,
    used: Vec<FreeRect>,
    free: Vec<FreeRect>,
}

impl MaxRectsBinPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bin(width: u32, height: u32, allow_rotation: bool) -> Self {
        let mut bin = Self::new();
        bin.init(width, height, allow_rotation);
        bin
    }

    /// Resets the bin to a single free rectangle covering `width x height`.
    pub fn init(&mut self, width: u32, height: u32, allow_rotation: bool) {
        self.bin_width = width;
        self.bin_height = height;
        self.allow_rotation = allow_rotation;
        self.used.clear();
        self.free.clear();
        self.free.push(FreeRect::free(0, 0, width, height));
    }

    pub fn bin_size(&self) -> (u32, u32) {
        (self.bin_width, self.bin_height)
    }
    pub fn free_rects(&self) -> &[FreeRect] {
        &self.free
    }
    pub fn used_rects(&self) -> &[FreeRect] {
        &self.used
    }

    /// Places one `width x height` rectangle, possibly rotated.
    /// Returns `None` when no free rectangle can hold it in any allowed orientation.
    pub fn insert(&mut self, width: u32, height: u32, heuristic: Heuristic) -> Option<FreeRect> {
        let cand = self.find_position(width, height, heuristic)?;
        let mut node = FreeRect::free(cand.x, cand.y, width, height);
        node.set_rotated(cand.rotated);
        self.place_rect(&node);
        Some(node)
    }

    /// Offline insertion: each round scores every remaining rectangle and places the single
    /// best one (ties go to the earliest in `rects`).
    ///
    /// Placed rectangles are drained from `rects` and returned in placement order with their
    /// position and rotation set. Whatever is still in `rects` afterwards did not fit.
    pub fn insert_batch<K>(
        &mut self,
        rects: &mut Vec<Rect<K>>,
        heuristic: Heuristic,
    ) -> Vec<Rect<K>> {
        let mut placed = Vec::with_capacity(rects.len());
        while !rects.is_empty() {
            let mut best: Option<(usize, Candidate)> = None;
            for (i, r) in rects.iter().enumerate() {
                if let Some(cand) = self.find_position(r.width(), r.height(), heuristic) {
                    if best.is_none_or(|(_, b)| cand.score < b.score) {
                        best = Some((i, cand));
                    }
                }
            }
            let Some((idx, cand)) = best else {
                break;
            };
            let mut rect = rects.remove(idx);
            if cand.rotated {
                let flipped = !rect.rotated();
                rect.set_rotated(flipped);
            }
            rect.set_position(cand.x, cand.y);
            self.place_rect(&rect.with_handle(()));
            placed.push(rect);
        }
        placed
    }

    /// Ratio of used surface to bin surface.
    pub fn occupancy(&self) -> f64 {
        let bin_area = self.bin_width as u64 * self.bin_height as u64;
        if bin_area == 0 {
            return 0.0;
        }
        let used: u64 = self.used.iter().map(|r| r.area()).sum();
        used as f64 / bin_area as f64
    }

    fn place_rect(&mut self, node: &FreeRect) {
        let mut split = Vec::new();
        self.free.retain(|fr| !Self::split_free_node(fr, node, &mut split));
        self.free.extend(split);
        self.prune_free_list();
        self.used.push(node.clone());
    }

    /// Splits `free` around `used` when they intersect.
    ///
    /// Pushes up to four maximal slabs of `free` (above, below, left and right of `used`)
    /// into `out` and returns true, meaning `free` must be dropped. Disjoint pairs return
    /// false and push nothing.
    pub fn split_free_node(free: &FreeRect, used: &FreeRect, out: &mut Vec<FreeRect>) -> bool {
        if !free.intersects(used) {
            return false;
        }

        if used.x() < free.far_x() && used.far_x() > free.x() {
            // above
            if used.y() > free.y() && used.y() < free.far_y() {
                out.push(FreeRect::free(free.x(), free.y(), free.width(), used.y() - free.y()));
            }
            // below
            if used.far_y() < free.far_y() {
                out.push(FreeRect::free(
                    free.x(),
                    used.far_y(),
                    free.width(),
                    free.far_y() - used.far_y(),
                ));
            }
        }

        if used.y() < free.far_y() && used.far_y() > free.y() {
            // left
            if used.x() > free.x() && used.x() < free.far_x() {
                out.push(FreeRect::free(free.x(), free.y(), used.x() - free.x(), free.height()));
            }
            // right
            if used.far_x() < free.far_x() {
                out.push(FreeRect::free(
                    used.far_x(),
                    free.y(),
                    free.far_x() - used.far_x(),
                    free.height(),
                ));
            }
        }
        true
    }

    /// Drops every free rectangle contained in another one. Pairwise O(n^2).
    pub fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            let mut remove_i = false;
            while j < self.free.len() {
                if self.free[j].contains(&self.free[i]) {
                    remove_i = true;
                    break;
                }
                if self.free[i].contains(&self.free[j]) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn find_position(&self, w: u32, h: u32, heuristic: Heuristic) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for fr in &self.free {
            // upright
            if fr.width() >= w && fr.height() >= h {
                let score = self.score(fr, w, h, heuristic);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(Candidate {
                        x: fr.x(),
                        y: fr.y(),
                        rotated: false,
                        score,
                    });
                }
            }
            // rotated
            if self.allow_rotation && fr.width() >= h && fr.height() >= w {
                let score = self.score(fr, h, w, heuristic);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(Candidate {
                        x: fr.x(),
                        y: fr.y(),
                        rotated: true,
                        score,
                    });
                }
            }
        }
        best
    }

    /// Score of placing a `w x h` box (already oriented) at the top-left of `fr`.
    fn score(&self, fr: &FreeRect, w: u32, h: u32, heuristic: Heuristic) -> (i64, i64) {
        let leftover_h = fr.width() as i64 - w as i64;
        let leftover_v = fr.height() as i64 - h as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        match heuristic {
            Heuristic::BestShortSideFit => (short_fit, long_fit),
            Heuristic::BestLongSideFit => (long_fit, short_fit),
            Heuristic::BestAreaFit => {
                let area_fit = fr.area() as i64 - w as i64 * h as i64;
                (area_fit, short_fit)
            }
            Heuristic::BottomLeft => (fr.y() as i64 + h as i64, fr.x() as i64),
            Heuristic::ContactPoint => {
                // bigger contact is better; negate so every heuristic minimizes
                (-(self.contact_point_score(fr.x(), fr.y(), w, h) as i64), 0)
            }
        }
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let mut score = 0u64;
        if x == 0 || x + w == self.bin_width {
            score += h as u64;
        }
        if y == 0 || y + h == self.bin_height {
            score += w as u64;
        }
        for u in &self.used {
            if u.x() == x + w || u.far_x() == x {
                score += common_interval(u.y(), u.far_y(), y, y + h) as u64;
            }
            if u.y() == y + h || u.far_y() == y {
                score += common_interval(u.x(), u.far_x(), x, x + w) as u64;
            }
        }
        score
    }
}

/// Length of the overlap of `[a1, a2)` and `[b1, b2)`, 0 when disjoint.
fn common_interval(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}
