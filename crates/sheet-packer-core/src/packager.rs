//! Multi-heuristic search for the smallest sheet that holds every sprite.
//!
//! Every heuristic runs the same two phases against its own [`MaxRectsBinPack`]:
//! - Phase A grows a bin (width first, then height) until all sprites fit or both sides hit
//!   `max_side`.
//! - Phase B sweeps widths upward and, at each width, shrinks the height (and then the
//!   width) with a halving step, keeping the smallest feasible bin.
//!
//! The winner across heuristics is the feasible bin with the least area; ties go to the
//! heuristic listed first in [`Heuristic::ALL`].

use crate::config::{Heuristic, PackerOptions};
use crate::error::{Result, SheetPackerError};
use crate::geometry::Rect;
use crate::model::{Placement, Sheet, SpriteRect};
use crate::packer::MaxRectsBinPack;
use crate::progress::PackProgress;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cooperative cancellation flag shared between a caller and a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Candidate solution: a bin and every sprite placed in it.
#[derive(Debug, Clone)]
struct Bin {
    width: u32,
    height: u32,
    rects: Vec<Rect<usize>>,
}

impl Bin {
    /// Shrinks the bin to the bounding box of its placements.
    fn tight(rects: Vec<Rect<usize>>) -> Self {
        let width = rects.iter().map(Rect::far_x).max().unwrap_or(0);
        let height = rects.iter().map(Rect::far_y).max().unwrap_or(0);
        Self {
            width,
            height,
            rects,
        }
    }

    fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Input facts shared read-only by every heuristic task.
struct Problem {
    rects: Vec<Rect<usize>>,
    total_area: u64,
    /// Phase A starting width.
    start_width: u32,
    /// No bin narrower than this can hold every sprite.
    min_width: u32,
    /// No bin shorter than this can hold every sprite.
    min_height: u32,
    /// Width sweep step when the input looks like a uniform grid sheet.
    grid_step: Option<u32>,
    deadline: Option<Instant>,
}

impl Problem {
    fn new<K>(sprites: &[SpriteRect<K>], opts: &PackerOptions) -> Self {
        let rects: Vec<Rect<usize>> = sprites
            .iter()
            .enumerate()
            .map(|(i, s)| Rect::sized(s.width, s.height, i))
            .collect();
        let total_area = sprites
            .iter()
            .map(|s| s.width as u64 * s.height as u64)
            .fold(0u64, u64::saturating_add);
        let max_w = sprites.iter().map(|s| s.width).max().unwrap_or(0);
        let max_h = sprites.iter().map(|s| s.height).max().unwrap_or(0);
        let max_short = sprites
            .iter()
            .map(|s| s.width.min(s.height))
            .max()
            .unwrap_or(0);
        let (start_width, min_width, min_height) = if opts.allow_rotation {
            (max_w.max(max_h), max_short, max_short)
        } else {
            (max_w, max_w, max_h)
        };
        Self {
            rects,
            total_area,
            start_width,
            min_width,
            min_height,
            grid_step: uniform_grid_step(sprites, opts.uniform_ratio),
            deadline: opts
                .time_budget_ms
                .filter(|&ms| ms > 0)
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    fn len(&self) -> u64 {
        self.rects.len() as u64
    }
}

/// Width of the dominant sprite size when at least `ratio` of the sprites share it.
fn uniform_grid_step<K>(sprites: &[SpriteRect<K>], ratio: f32) -> Option<u32> {
    let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
    for s in sprites {
        *counts.entry((s.width, s.height)).or_default() += 1;
    }
    // deterministic pick on equal counts
    let ((w, _), n) = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))?;
    (n as f32 >= ratio * sprites.len() as f32).then_some(w)
}

/// Phase A growth step: proportional to the sprite count, at least 1.
fn grow_step(side: u32, count: u64) -> u32 {
    ((side as u64 * count / 5000) as u32).max(1)
}

/// One heuristic's worker state: a task-owned engine plus trial counters.
struct Search<'a> {
    problem: &'a Problem,
    opts: &'a PackerOptions,
    heuristic: Heuristic,
    engine: MaxRectsBinPack,
    cancel: &'a CancelToken,
    grow_trials: u32,
    shrink_trials: u32,
    narrow_trials: u32,
}

impl<'a> Search<'a> {
    fn stopped(&self) -> bool {
        self.cancel.is_cancelled()
            || self
                .problem
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Packs a fresh copy of every sprite into `width x height`; `Some` only if all fit.
    fn fit(&mut self, width: u32, height: u32) -> Option<Bin> {
        if width < self.problem.min_width
            || height < self.problem.min_height
            || width > self.opts.max_side
            || height > self.opts.max_side
        {
            return None;
        }
        let mut remaining = self.problem.rects.clone();
        self.engine.init(width, height, self.opts.allow_rotation);
        let placed = self.engine.insert_batch(&mut remaining, self.heuristic);
        remaining.is_empty().then(|| Bin::tight(placed))
    }

    /// Phase A. Returns `None` if the sprites don't fit even at `max_side x max_side`.
    fn grow(&mut self) -> Option<(u32, Bin)> {
        let max_side = self.opts.max_side;
        let count = self.problem.len();
        let area = self.problem.total_area.saturating_mul(101) / 100;
        let mut width = ((area.isqrt() / 2) as u32)
            .max(self.problem.start_width)
            .min(max_side);
        let mut height = ((area / width.max(1) as u64 + 1).min(max_side as u64) as u32)
            .max(self.problem.min_height)
            .min(max_side);
        loop {
            if self.stopped() {
                return None;
            }
            self.grow_trials += 1;
            if let Some(bin) = self.fit(width, height) {
                trace!(width, height, "phase A found a feasible bin");
                return Some((width, bin));
            }
            if width < max_side {
                width = width.saturating_add(grow_step(width, count)).min(max_side);
            } else if height < max_side {
                height = height.saturating_add(grow_step(height, count)).min(max_side);
            } else {
                return None;
            }
        }
    }

    /// Phase B. Sweeps widths from about half the Phase A width up to the square side of the
    /// best area, shrinking at every width. Stops early (keeping `best`) when cancelled.
    fn shrink(&mut self, grown_width: u32, mut best: Bin, progress: &PackProgress) -> Bin {
        let step = self
            .problem
            .grid_step
            .unwrap_or(self.opts.max_width_increment)
            .max(1);
        let start = (grown_width / 2).max(self.problem.min_width).max(1);
        let end = (best.area().isqrt() as u32).max(start).min(self.opts.max_side);
        let start = start.min(end);
        let widths = (end - start).div_ceil(step) as u64 + 1;
        progress.set_total(self.heuristic, 1 + widths);
        progress.set_done(self.heuristic, 1);

        let mut width = start;
        loop {
            if self.stopped() {
                break;
            }
            self.shrink_height(width, &mut best);
            progress.advance(self.heuristic, 1);
            if width >= end {
                break;
            }
            width = (width + step).min(end);
        }
        best
    }

    /// Minimal feasible height at `width` by halving-step descent from `best.area / width`.
    fn shrink_height(&mut self, width: u32, best: &mut Bin) {
        let mut height = (best.area() / width as u64).min(self.opts.max_side as u64) as i64;
        let mut step = self.opts.max_width_increment.max(1) as i64;
        let mut last_fit: Option<u32> = None;
        let mut improved = false;
        loop {
            if self.stopped() {
                return;
            }
            self.shrink_trials += 1;
            let fit = u32::try_from(height)
                .ok()
                .and_then(|h| self.fit(width, h).map(|bin| (h, bin)));
            match fit {
                Some((h, bin)) => {
                    last_fit = Some(h);
                    improved |= keep_smaller(best, bin);
                    height -= step;
                }
                None if step > 1 => {
                    height += step;
                    step /= 2;
                    height -= step;
                }
                None => break,
            }
        }
        if let Some(h) = last_fit.filter(|_| improved) {
            self.shrink_width(width, h, best);
        }
    }

    /// With the height pinned, narrows the width using the same halving descent.
    fn shrink_width(&mut self, width: u32, height: u32, best: &mut Bin) {
        let mut step = (self.opts.max_width_increment / 2).max(1);
        let mut width = width;
        loop {
            if self.stopped() {
                return;
            }
            let Some(next) = width.checked_sub(step) else {
                if step > 1 {
                    step /= 2;
                    continue;
                }
                return;
            };
            self.narrow_trials += 1;
            if let Some(bin) = self.fit(next, height) {
                keep_smaller(best, bin);
                width = next;
            } else if step > 1 {
                step /= 2;
            } else {
                return;
            }
        }
    }
}

fn keep_smaller(best: &mut Bin, candidate: Bin) -> bool {
    if candidate.area() < best.area() {
        *best = candidate;
        true
    } else {
        false
    }
}

/// Drives [`MaxRectsBinPack`] under every heuristic and keeps the smallest sheet.
#[derive(Debug, Clone)]
pub struct Packager {
    options: PackerOptions,
    progress: Arc<PackProgress>,
    cancel: CancelToken,
}

impl Packager {
    pub fn new(options: PackerOptions) -> Self {
        Self {
            options,
            progress: Arc::new(PackProgress::new()),
            cancel: CancelToken::new(),
        }
    }

    /// Reports into a caller-owned progress sink (e.g. polled by a UI thread).
    pub fn with_progress(mut self, progress: Arc<PackProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &PackerOptions {
        &self.options
    }

    pub fn progress(&self) -> Arc<PackProgress> {
        self.progress.clone()
    }

    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Packs `sprites` into the smallest sheet found within `max_side x max_side`.
    ///
    /// Notes:
    /// - Fails with `InvalidOption`/`InvalidSprite` before any search work.
    /// - An empty input succeeds immediately with a 0x0 sheet.
    /// - The result doesn't depend on thread scheduling unless a time budget cuts the search.
    #[instrument(skip_all, fields(sprites = sprites.len(), max_side = self.options.max_side))]
    pub fn pack<K>(&self, sprites: Vec<SpriteRect<K>>) -> Result<Sheet<K>> {
        self.options.validate()?;
        if let Some((index, s)) = sprites
            .iter()
            .enumerate()
            .find(|(_, s)| s.width == 0 || s.height == 0)
        {
            return Err(SheetPackerError::InvalidSprite {
                index,
                width: s.width,
                height: s.height,
            });
        }

        self.progress.reset();
        if sprites.is_empty() {
            self.progress.force_all_done();
            return Ok(Sheet::empty());
        }

        let max_side = self.options.max_side;
        // no orientation helps against a square cap
        if sprites
            .iter()
            .any(|s| s.width > max_side || s.height > max_side)
        {
            self.progress.force_all_done();
            return Err(SheetPackerError::DoesNotFit { max_side });
        }

        let started = Instant::now();
        let problem = Problem::new(&sprites, &self.options);
        let queue = self.heuristic_queue(problem.len());
        let results = self.run_queue(&problem, &queue);
        self.progress.force_all_done();

        if self.cancel.is_cancelled() {
            return Err(SheetPackerError::Cancelled);
        }

        let mut winner: Option<(Heuristic, Bin)> = None;
        for (heuristic, bin) in results {
            let Some(bin) = bin else { continue };
            if winner.as_ref().is_none_or(|(_, b)| bin.area() < b.area()) {
                winner = Some((heuristic, bin));
            }
        }
        let Some((heuristic, bin)) = winner else {
            if problem.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(SheetPackerError::TimedOut);
            }
            return Err(SheetPackerError::DoesNotFit { max_side });
        };

        info!(
            %heuristic,
            width = bin.width,
            height = bin.height,
            occupancy = format!("{:.2}%", problem.total_area as f64 / bin.area() as f64 * 100.0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sheet packed"
        );

        let mut rects = bin.rects;
        rects.sort_by_key(|r| *r.item());
        debug_assert_eq!(rects.len(), sprites.len());
        let placements = sprites
            .into_iter()
            .zip(&rects)
            .map(|(s, r)| Placement::from_rect(s.key, r))
            .collect();
        Ok(Sheet {
            width: bin.width,
            height: bin.height,
            heuristic: Some(heuristic),
            placements,
        })
    }

    /// Heuristics worth running for `count` sprites, in evaluation order.
    ///
    /// ContactPoint scores each candidate against every placed sprite, so one batch insert
    /// costs about `count^3`; above `contact_point_budget` it is dropped (and reported done).
    fn heuristic_queue(&self, count: u64) -> Vec<Heuristic> {
        let cp_cost = count.saturating_mul(count).saturating_mul(count);
        Heuristic::ALL
            .into_iter()
            .filter(|&h| {
                if h == Heuristic::ContactPoint && cp_cost > self.options.contact_point_budget {
                    debug!(count, cost = cp_cost, "skipping contact point heuristic");
                    self.progress.finish(h);
                    return false;
                }
                true
            })
            .collect()
    }

    fn run_queue(&self, problem: &Problem, queue: &[Heuristic]) -> Vec<(Heuristic, Option<Bin>)> {
        #[cfg(feature = "parallel")]
        {
            if self.options.parallel {
                return queue
                    .par_iter()
                    .map(|&h| (h, self.search(problem, h)))
                    .collect();
            }
        }
        queue
            .iter()
            .map(|&h| (h, self.search(problem, h)))
            .collect()
    }

    /// Runs Phase A then Phase B for one heuristic.
    fn search(&self, problem: &Problem, heuristic: Heuristic) -> Option<Bin> {
        let started = Instant::now();
        self.progress.begin(heuristic, 1);
        let mut search = Search {
            problem,
            opts: &self.options,
            heuristic,
            engine: MaxRectsBinPack::new(),
            cancel: &self.cancel,
            grow_trials: 0,
            shrink_trials: 0,
            narrow_trials: 0,
        };
        let result = search
            .grow()
            .map(|(width, bin)| search.shrink(width, bin, &self.progress));
        self.progress.finish(heuristic);

        match &result {
            Some(bin) => debug!(
                %heuristic,
                width = bin.width,
                height = bin.height,
                grow = search.grow_trials,
                shrink = search.shrink_trials,
                narrow = search.narrow_trials,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "heuristic finished"
            ),
            None => debug!(
                %heuristic,
                grow = search.grow_trials,
                "heuristic found no feasible bin"
            ),
        }
        result
    }
}

/// Convenience wrapper: `Packager::new(options).pack(sprites)`.
pub fn pack_sprites<K>(sprites: Vec<SpriteRect<K>>, options: PackerOptions) -> Result<Sheet<K>> {
    Packager::new(options).pack(sprites)
}
