//! Splitting track runs into per-page bars.
//!
//! A run crossing from one month page to the next becomes one [`TaskBar`] per
//! page, each keeping the run's track. The segment ends that touch a page
//! boundary are flagged as continuations when the task is still scheduled on
//! the other side.
//!
//! After splitting, a guard pass re-checks every (page, track) lane. A bar
//! that collides with an earlier bar on its lane moves to the lowest track
//! that is free on all of its days; when none is left its days become
//! overflow. Splitting a conflict-free assignment never triggers the guard,
//! but it keeps the no-shared-track guarantee independent of the input.

use std::collections::HashMap;

use log::{debug, warn};

use almanac_core::{calendar::CalendarGrid, identifier::Id};

use crate::{
    layout::{
        priority::{ProminenceTier, TaskPriority},
        result::TaskBar,
        tracks::{HiddenDays, TrackRun},
    },
    structure::TaskSet,
};

/// Turns track runs into page-local bars.
#[derive(Debug, Clone, Copy)]
pub struct MonthBoundaryProcessor<'g> {
    grid: &'g CalendarGrid,
    max_tracks: usize,
}

impl<'g> MonthBoundaryProcessor<'g> {
    pub fn new(grid: &'g CalendarGrid, max_tracks: usize) -> Self {
        Self { grid, max_tracks }
    }

    /// Splits `runs` at page boundaries and resolves lane collisions.
    ///
    /// Days of bars that cannot be placed are added to `hidden`.
    pub fn process(
        &self,
        runs: &[TrackRun],
        tasks: &TaskSet<'_>,
        priorities: &[TaskPriority],
        hidden: &mut HiddenDays,
    ) -> Vec<TaskBar> {
        let tiers: HashMap<Id, ProminenceTier> = priorities
            .iter()
            .map(|priority| (priority.task(), priority.tier()))
            .collect();

        let mut bars = Vec::with_capacity(runs.len());
        for run in runs {
            let Some(scheduled) = tasks.get(run.task()) else {
                continue;
            };
            let task_span = scheduled.span();
            let tier = tiers
                .get(&run.task())
                .copied()
                .unwrap_or(ProminenceTier::Minimal);

            for page in self.grid.pages() {
                let Some(piece) = run.span().intersect(page.span()) else {
                    continue;
                };
                let Some(first_day) = page.day_index(piece.start()) else {
                    continue;
                };

                let from_previous = piece.start() == page.span().start()
                    && piece
                        .start()
                        .pred_opt()
                        .is_some_and(|date| task_span.contains(date));
                let to_next = piece.end() == page.span().end()
                    && piece
                        .end()
                        .succ_opt()
                        .is_some_and(|date| task_span.contains(date));

                bars.push(
                    TaskBar::new(
                        run.task(),
                        run.group(),
                        scheduled.task().category(),
                        tier,
                        page.index(),
                        run.track(),
                        first_day,
                        piece,
                    )
                    .with_continuation(from_previous, to_next),
                );
            }
        }

        let split = bars.len();
        let bars = self.guard(bars, hidden);
        debug!(runs = runs.len(), bars = split, kept = bars.len(); "Runs split at page boundaries");
        bars
    }

    /// Moves or hides bars that share a (page, track) lane on some day.
    pub fn guard(&self, mut bars: Vec<TaskBar>, hidden: &mut HiddenDays) -> Vec<TaskBar> {
        bars.sort_by_key(|bar| (bar.page(), bar.first_day(), bar.track(), bar.task()));

        let mut kept: Vec<TaskBar> = Vec::with_capacity(bars.len());
        // Occupied day ranges per (page, track).
        let mut lanes: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
        let is_free = |lanes: &HashMap<(usize, usize), Vec<(usize, usize)>>,
                       page: usize,
                       track: usize,
                       bar: &TaskBar| {
            lanes.get(&(page, track)).is_none_or(|ranges| {
                ranges
                    .iter()
                    .all(|(first, last)| *last < bar.first_day() || bar.last_day() < *first)
            })
        };

        for mut bar in bars {
            let page = bar.page();
            let track = if bar.track() < self.max_tracks && is_free(&lanes, page, bar.track(), &bar)
            {
                Some(bar.track())
            } else {
                (0..self.max_tracks).find(|track| is_free(&lanes, page, *track, &bar))
            };

            match track {
                Some(track) => {
                    if track != bar.track() {
                        warn!(
                            task = bar.task().to_string(),
                            page,
                            from = bar.track(),
                            to = track;
                            "Bar collided on its track and was moved"
                        );
                        bar.set_track(track);
                    }
                    lanes
                        .entry((page, track))
                        .or_default()
                        .push((bar.first_day(), bar.last_day()));
                    kept.push(bar);
                }
                None => {
                    warn!(
                        task = bar.task().to_string(),
                        page;
                        "Bar collided and no track is free, hiding its days"
                    );
                    for date in bar.span().dates() {
                        hidden.hide(date, bar.task());
                    }
                }
            }
        }
        kept
    }
}
