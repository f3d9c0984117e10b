//! The layout result handed to renderers.
//!
//! A [`LayoutResult`] holds the positioned [`TaskBar`]s, the per-day overflow
//! records, the intermediate analysis (groups, conflicts, priorities), the
//! warnings for dropped tasks and a [`LayoutStats`] summary. Everything is
//! stored in explicitly sorted vectors so that two runs on the same input
//! serialize identically.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use almanac_core::{
    calendar::CalendarGrid,
    color::Color,
    geometry::{Bounds, Point, Size},
    identifier::Id,
    span::DaySpan,
};

use crate::{
    error::InvalidTaskError,
    layout::{
        conflict::{ConflictCategory, ConflictRecord},
        grouping::OverlapGroup,
        overlap::Severity,
        priority::{ProminenceTier, TaskPriority},
        tracks::HiddenDays,
    },
};

/// One rendered segment of a task on one month page.
///
/// A task crossing a page boundary yields one bar per page; all of them share
/// the same `group_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBar {
    task: Id,
    group_id: Id,
    overlap_group: usize,
    category: Id,
    tier: ProminenceTier,
    page: usize,
    track: usize,
    first_day: usize,
    last_day: usize,
    span: DaySpan,
    continues_from_previous: bool,
    continues_to_next: bool,
    position: Point,
    size: Size,
    color: Color,
}

impl TaskBar {
    /// Creates an unpositioned bar covering `first_day..=last_day` of `page`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task: Id,
        overlap_group: usize,
        category: Id,
        tier: ProminenceTier,
        page: usize,
        track: usize,
        first_day: usize,
        span: DaySpan,
    ) -> Self {
        let last_day = first_day + usize::try_from(span.days() - 1).unwrap_or_default();
        Self {
            task,
            group_id: task,
            overlap_group,
            category,
            tier,
            page,
            track,
            first_day,
            last_day,
            span,
            continues_from_previous: false,
            continues_to_next: false,
            position: Point::default(),
            size: Size::default(),
            color: Color::default(),
        }
    }

    pub fn with_continuation(mut self, from_previous: bool, to_next: bool) -> Self {
        self.continues_from_previous = from_previous;
        self.continues_to_next = to_next;
        self
    }

    pub fn task(&self) -> Id {
        self.task
    }

    /// Shared identity of every bar of the same task.
    pub fn group_id(&self) -> Id {
        self.group_id
    }

    /// Index of the overlap group the task belongs to.
    pub fn overlap_group(&self) -> usize {
        self.overlap_group
    }

    pub fn category(&self) -> Id {
        self.category
    }

    pub fn tier(&self) -> ProminenceTier {
        self.tier
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn track(&self) -> usize {
        self.track
    }

    /// First day index on the page, inclusive.
    pub fn first_day(&self) -> usize {
        self.first_day
    }

    /// Last day index on the page, inclusive.
    pub fn last_day(&self) -> usize {
        self.last_day
    }

    /// Dates covered by the bar.
    pub fn span(&self) -> DaySpan {
        self.span
    }

    pub fn day_count(&self) -> usize {
        self.last_day - self.first_day + 1
    }

    pub fn continues_from_previous(&self) -> bool {
        self.continues_from_previous
    }

    pub fn continues_to_next(&self) -> bool {
        self.continues_to_next
    }

    /// Returns true if both bars cover at least one common day index.
    pub fn shares_days(&self, other: &TaskBar) -> bool {
        self.first_day <= other.last_day && other.first_day <= self.last_day
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub(crate) fn set_track(&mut self, track: usize) {
        self.track = track;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// Tasks that did not fit on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowDay {
    page: usize,
    day: usize,
    date: NaiveDate,
    count: usize,
    task_ids: Vec<Id>,
}

impl OverflowDay {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Number of hidden tasks, the `N` of a "+N more" label.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Hidden tasks in id order.
    pub fn task_ids(&self) -> &[Id] {
        &self.task_ids
    }
}

/// Summary statistics of a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutStats {
    pub total_tasks: usize,
    pub laid_out_tasks: usize,
    pub dropped_tasks: usize,
    pub bar_count: usize,
    pub group_count: usize,
    pub total_overlaps: usize,
    pub overlaps_by_severity: IndexMap<Severity, usize>,
    pub conflicts_by_category: IndexMap<ConflictCategory, usize>,
    pub tier_counts: IndexMap<ProminenceTier, usize>,
    pub overflow_by_day: IndexMap<NaiveDate, usize>,
    pub total_overflow: usize,
    pub max_tracks_used: usize,
    /// Used track-days over `max_tracks_per_day` times the window length.
    pub space_efficiency: f32,
}

/// A broken layout guarantee, found by [`LayoutResult::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutViolation {
    #[error("bars of `{first}` and `{second}` share days on page {page}, track {track}")]
    SharedTrack {
        page: usize,
        track: usize,
        first: Id,
        second: Id,
    },

    #[error("page {page}, day {day} uses {tracks} tracks, the limit is {max}")]
    TooManyTracks {
        page: usize,
        day: usize,
        tracks: usize,
        max: usize,
    },

    #[error("bar of `{task}` sits on track {track}, the limit is {max}")]
    TrackOutOfRange { task: Id, track: usize, max: usize },
}

/// The complete output of a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    max_tracks_per_day: usize,
    stats: LayoutStats,
    bars: Vec<TaskBar>,
    overflow: Vec<OverflowDay>,
    groups: Vec<OverlapGroup>,
    conflicts: Vec<ConflictRecord>,
    priorities: Vec<TaskPriority>,
    warnings: Vec<InvalidTaskError>,
}

/// Everything [`LayoutResult::assemble`] collects.
pub(crate) struct LayoutParts {
    pub total_tasks: usize,
    pub max_tracks_per_day: usize,
    pub bars: Vec<TaskBar>,
    pub hidden: HiddenDays,
    pub groups: Vec<OverlapGroup>,
    pub conflicts: Vec<ConflictRecord>,
    pub priorities: Vec<TaskPriority>,
    pub warnings: Vec<InvalidTaskError>,
}

impl LayoutResult {
    /// Builds the result and its statistics.
    pub(crate) fn assemble(parts: LayoutParts, grid: &CalendarGrid) -> Self {
        let LayoutParts {
            total_tasks,
            max_tracks_per_day,
            mut bars,
            hidden,
            groups,
            conflicts,
            mut priorities,
            warnings,
        } = parts;

        bars.sort_by_key(|bar| (bar.page, bar.track, bar.first_day, bar.task));
        priorities.sort_by_key(TaskPriority::task);

        let overflow: Vec<_> = hidden
            .iter()
            .filter_map(|(date, ids)| {
                let cell = grid.locate(date)?;
                Some(OverflowDay {
                    page: cell.page,
                    day: cell.day,
                    date,
                    count: ids.len(),
                    task_ids: ids.to_vec(),
                })
            })
            .collect();

        let mut overlaps_by_severity: IndexMap<_, _> =
            Severity::ALL.iter().map(|severity| (*severity, 0)).collect();
        let mut conflicts_by_category: IndexMap<_, _> = ConflictCategory::ALL
            .iter()
            .map(|category| (*category, 0))
            .collect();
        for record in &conflicts {
            *overlaps_by_severity
                .entry(record.overlap().severity())
                .or_default() += 1;
            *conflicts_by_category.entry(record.category()).or_default() += 1;
        }

        let mut tier_counts: IndexMap<_, _> = ProminenceTier::ALL
            .iter()
            .map(|tier| (*tier, 0))
            .collect();
        for priority in &priorities {
            *tier_counts.entry(priority.tier()).or_default() += 1;
        }

        let used_track_days: usize = bars.iter().map(TaskBar::day_count).sum();
        let capacity = max_tracks_per_day * grid.day_count();
        let space_efficiency = if capacity == 0 {
            0.0
        } else {
            used_track_days as f32 / capacity as f32
        };

        let stats = LayoutStats {
            total_tasks,
            laid_out_tasks: priorities.len(),
            dropped_tasks: warnings.len(),
            bar_count: bars.len(),
            group_count: groups.len(),
            total_overlaps: conflicts.len(),
            overlaps_by_severity,
            conflicts_by_category,
            tier_counts,
            overflow_by_day: overflow.iter().map(|day| (day.date, day.count)).collect(),
            total_overflow: overflow.iter().map(|day| day.count).sum(),
            max_tracks_used: bars.iter().map(|bar| bar.track + 1).max().unwrap_or(0),
            space_efficiency,
        };

        Self {
            max_tracks_per_day,
            stats,
            bars,
            overflow,
            groups,
            conflicts,
            priorities,
            warnings,
        }
    }

    pub fn max_tracks_per_day(&self) -> usize {
        self.max_tracks_per_day
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    /// Bars ordered by page, track, first day and task id.
    pub fn bars(&self) -> &[TaskBar] {
        &self.bars
    }

    /// Bars of one task, in page order.
    pub fn bars_of(&self, task: Id) -> Vec<&TaskBar> {
        let mut bars: Vec<_> = self.bars.iter().filter(|bar| bar.task == task).collect();
        bars.sort_by_key(|bar| (bar.page, bar.first_day));
        bars
    }

    /// Overflow records in date order.
    pub fn overflow(&self) -> &[OverflowDay] {
        &self.overflow
    }

    pub fn overflow_on(&self, date: NaiveDate) -> usize {
        self.overflow
            .iter()
            .find(|day| day.date == date)
            .map_or(0, |day| day.count)
    }

    pub fn groups(&self) -> &[OverlapGroup] {
        &self.groups
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    /// Priorities ordered by task id.
    pub fn priorities(&self) -> &[TaskPriority] {
        &self.priorities
    }

    pub fn priority(&self, task: Id) -> Option<&TaskPriority> {
        self.priorities
            .binary_search_by(|priority| priority.task().cmp(&task))
            .ok()
            .and_then(|index| self.priorities.get(index))
    }

    /// Tasks dropped before layout.
    pub fn warnings(&self) -> &[InvalidTaskError] {
        &self.warnings
    }

    /// Re-checks the track guarantees of the bars.
    ///
    /// Returns every violation found; an empty list means no bars share a
    /// (page, track) on a common day and no day exceeds the track limit.
    pub fn validate(&self) -> Vec<LayoutViolation> {
        let mut violations = Vec::new();

        let mut by_lane: BTreeMap<(usize, usize), Vec<&TaskBar>> = BTreeMap::new();
        let mut tracks_per_day: BTreeMap<(usize, usize), BTreeSet<usize>> = BTreeMap::new();
        for bar in &self.bars {
            if bar.track >= self.max_tracks_per_day {
                violations.push(LayoutViolation::TrackOutOfRange {
                    task: bar.task,
                    track: bar.track,
                    max: self.max_tracks_per_day,
                });
            }
            by_lane.entry((bar.page, bar.track)).or_default().push(bar);
            for day in bar.first_day..=bar.last_day {
                tracks_per_day
                    .entry((bar.page, day))
                    .or_default()
                    .insert(bar.track);
            }
        }

        for ((page, track), mut lane) in by_lane {
            lane.sort_by_key(|bar| (bar.first_day, bar.task));
            for (i, first) in lane.iter().enumerate() {
                for second in lane[i + 1..]
                    .iter()
                    .take_while(|bar| bar.first_day <= first.last_day)
                {
                    violations.push(LayoutViolation::SharedTrack {
                        page,
                        track,
                        first: first.task,
                        second: second.task,
                    });
                }
            }
        }

        for ((page, day), tracks) in tracks_per_day {
            if tracks.len() > self.max_tracks_per_day {
                violations.push(LayoutViolation::TooManyTracks {
                    page,
                    day,
                    tracks: tracks.len(),
                    max: self.max_tracks_per_day,
                });
            }
        }

        violations
    }
}
