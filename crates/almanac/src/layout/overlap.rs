//! Pairwise overlap classification.
//!
//! Every pair of tasks that shares a day, sits within `min_overlap_days` empty
//! days of each other, or is linked by a dependency produces one
//! [`TaskOverlap`]. Intersecting pairs are only searched inside an overlap
//! group; adjacency is found by a sweep over all tasks in start order and
//! dependency pairs come straight from the dependency graph.

use std::{collections::HashSet, fmt};

use chrono::{Days, NaiveDate};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use almanac_core::{identifier::Id, span::DaySpan};

use crate::{
    layout::grouping::OverlapGroup,
    structure::{DependencyGraph, ScheduledTask, TaskSet},
};

/// Priority delta at which severity is raised by one band.
const PRIORITY_DELTA_ESCALATION: u8 = 3;

/// How two date ranges relate. Variants are listed in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapType {
    /// Same start and same end.
    Identical,
    /// One range strictly inside the other, no shared endpoint.
    Nested,
    /// One range inside the other, sharing exactly one endpoint.
    Complete,
    /// Any other intersection.
    Partial,
    /// Disjoint, separated by at most `min_overlap_days` empty days.
    Adjacent,
    /// Disjoint and farther apart, but linked by a dependency.
    Dependency,
}

impl OverlapType {
    /// Returns true for the types where the two ranges share days.
    pub fn intersects(self) -> bool {
        !matches!(self, Self::Adjacent | Self::Dependency)
    }
}

impl fmt::Display for OverlapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identical => "identical",
            Self::Nested => "nested",
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Adjacent => "adjacent",
            Self::Dependency => "dependency",
        };
        f.write_str(name)
    }
}

/// Severity of an overlap, ordered from `None` to `Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Every severity in ascending order.
    pub const ALL: [Severity; 5] = [
        Severity::None,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Band of an overlap share of the shorter task.
    pub fn from_percentage(percentage: f32) -> Self {
        if percentage >= 0.8 {
            Self::Critical
        } else if percentage >= 0.5 {
            Self::High
        } else if percentage >= 0.2 {
            Self::Medium
        } else if percentage > 0.0 {
            Self::Low
        } else {
            Self::None
        }
    }

    /// The next band up, capped at `Critical`.
    pub fn raised(self) -> Self {
        match self {
            Self::None => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }

    /// Severity mapped onto `[0, 1]` in even steps.
    pub fn score(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Critical => 1.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// The relationship between two tasks. `task_a` always sorts before `task_b`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOverlap {
    task_a: Id,
    task_b: Id,
    overlap_type: OverlapType,
    overlap_days: i64,
    overlap_percentage: f32,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<DaySpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gap_days: Option<i64>,
    priority_delta: u8,
    contributes_pressure: bool,
    reason: String,
    hint: String,
}

impl TaskOverlap {
    pub fn task_a(&self) -> Id {
        self.task_a
    }

    pub fn task_b(&self) -> Id {
        self.task_b
    }

    /// Returns true if `id` is one of the two tasks.
    pub fn involves(&self, id: Id) -> bool {
        self.task_a == id || self.task_b == id
    }

    /// The other task of the pair, if `id` is one of them.
    pub fn other(&self, id: Id) -> Option<Id> {
        if self.task_a == id {
            Some(self.task_b)
        } else if self.task_b == id {
            Some(self.task_a)
        } else {
            None
        }
    }

    pub fn overlap_type(&self) -> OverlapType {
        self.overlap_type
    }

    /// Number of shared days.
    pub fn overlap_days(&self) -> i64 {
        self.overlap_days
    }

    /// Shared days over the duration of the shorter task.
    pub fn overlap_percentage(&self) -> f32 {
        self.overlap_percentage
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The shared days, for intersecting pairs.
    pub fn window(&self) -> Option<DaySpan> {
        self.window
    }

    /// Empty days between the tasks, for disjoint pairs.
    pub fn gap_days(&self) -> Option<i64> {
        self.gap_days
    }

    pub fn priority_delta(&self) -> u8 {
        self.priority_delta
    }

    /// Whether the overlap is long enough to push tasks onto separate tracks
    /// for ranking purposes.
    pub fn contributes_pressure(&self) -> bool {
        self.contributes_pressure
    }

    /// Human-readable description of the conflict.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Suggested fix in plain words.
    pub fn hint(&self) -> &str {
        &self.hint
    }
}

/// Classifies task pairs.
#[derive(Debug, Clone, Copy)]
pub struct OverlapDetector {
    min_overlap_days: u32,
}

impl OverlapDetector {
    pub fn new(min_overlap_days: u32) -> Self {
        Self { min_overlap_days }
    }

    /// Compares two tasks. Returns `None` when they are unrelated.
    ///
    /// `linked` tells whether a dependency connects the two tasks.
    pub fn compare(
        &self,
        first: &ScheduledTask<'_>,
        second: &ScheduledTask<'_>,
        linked: bool,
    ) -> Option<TaskOverlap> {
        let (a, b) = if first.id() <= second.id() {
            (first, second)
        } else {
            (second, first)
        };
        let (span_a, span_b) = (a.span(), b.span());
        let priority_delta = a.task().priority().delta(b.task().priority());
        let min_overlap_days = i64::from(self.min_overlap_days);

        let (overlap_type, overlap_days, overlap_percentage, severity, window, gap_days) =
            match span_a.intersect(span_b) {
                Some(window) => {
                    let overlap_days = window.days();
                    let shorter = span_a.days().min(span_b.days());
                    let percentage = overlap_days as f32 / shorter as f32;
                    let mut severity = Severity::from_percentage(percentage);
                    if priority_delta >= PRIORITY_DELTA_ESCALATION {
                        severity = severity.raised();
                    }
                    (
                        classify_intersecting(span_a, span_b),
                        overlap_days,
                        percentage,
                        severity,
                        Some(window),
                        None,
                    )
                }
                None => {
                    let gap = span_a.gap_days(span_b)?;
                    let overlap_type = if gap <= min_overlap_days {
                        OverlapType::Adjacent
                    } else if linked {
                        OverlapType::Dependency
                    } else {
                        return None;
                    };
                    (overlap_type, 0, 0.0, Severity::None, None, Some(gap))
                }
            };

        let (reason, hint) = describe(a.id(), b.id(), overlap_type, severity);
        Some(TaskOverlap {
            task_a: a.id(),
            task_b: b.id(),
            overlap_type,
            overlap_days,
            overlap_percentage,
            severity,
            window,
            gap_days,
            priority_delta,
            contributes_pressure: overlap_days > 0 && overlap_days >= min_overlap_days,
            reason,
            hint,
        })
    }

    /// Finds every related pair, each recorded once, sorted by task ids.
    pub fn detect(
        &self,
        tasks: &TaskSet<'_>,
        groups: &[OverlapGroup],
        dependencies: &DependencyGraph,
    ) -> Vec<TaskOverlap> {
        let mut seen: HashSet<(Id, Id)> = HashSet::new();
        let mut overlaps = Vec::new();
        let mut record = |overlap: TaskOverlap| {
            if seen.insert((overlap.task_a, overlap.task_b)) {
                overlaps.push(overlap);
            }
        };

        // Intersections never cross group boundaries.
        for group in groups {
            let members: Vec<_> = group
                .members()
                .iter()
                .filter_map(|id| tasks.get(*id))
                .collect();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    if a.span().overlaps(b.span()) {
                        let linked = dependencies.linked(a.id(), b.id());
                        if let Some(overlap) = self.compare(a, b, linked) {
                            record(overlap);
                        }
                    }
                }
            }
        }

        // Adjacency sweep in start order.
        let mut by_start: Vec<_> = tasks.iter().collect();
        by_start.sort_by_key(|scheduled| (scheduled.span().start(), scheduled.id()));
        let reach = Days::new(u64::from(self.min_overlap_days) + 1);
        for (i, a) in by_start.iter().enumerate() {
            let limit = a
                .span()
                .end()
                .checked_add_days(reach)
                .unwrap_or(NaiveDate::MAX);
            for b in by_start[i + 1..]
                .iter()
                .take_while(|b| b.span().start() <= limit)
            {
                if !a.span().overlaps(b.span()) {
                    let linked = dependencies.linked(a.id(), b.id());
                    if let Some(overlap) = self.compare(a, b, linked) {
                        record(overlap);
                    }
                }
            }
        }

        // Remaining dependency pairs, however far apart.
        for (prerequisite, dependent) in dependencies.edges() {
            if let (Some(a), Some(b)) = (tasks.get(prerequisite), tasks.get(dependent)) {
                if let Some(overlap) = self.compare(a, b, true) {
                    record(overlap);
                }
            }
        }

        overlaps.sort_by_key(|overlap| (overlap.task_a, overlap.task_b));
        debug!(overlaps = overlaps.len(); "Overlaps detected");
        trace!(overlaps:?; "Detected overlaps");
        overlaps
    }
}

fn classify_intersecting(a: DaySpan, b: DaySpan) -> OverlapType {
    let same_start = a.start() == b.start();
    let same_end = a.end() == b.end();
    if same_start && same_end {
        OverlapType::Identical
    } else if a.covers(b) || b.covers(a) {
        if same_start || same_end {
            OverlapType::Complete
        } else {
            OverlapType::Nested
        }
    } else {
        OverlapType::Partial
    }
}

fn describe(a: Id, b: Id, overlap_type: OverlapType, severity: Severity) -> (String, String) {
    let (reason, hint) = match overlap_type {
        OverlapType::Identical => (
            format!("tasks {a} and {b} have identical schedules"),
            "merge the tasks or move one of them",
        ),
        OverlapType::Nested => (
            format!("one of tasks {a} and {b} runs entirely inside the other"),
            "treat the inner task as a subtask or shift it",
        ),
        OverlapType::Complete => (
            format!("tasks {a} and {b} overlap completely and share an endpoint"),
            "the tasks cannot run side by side, reschedule one",
        ),
        OverlapType::Partial => (
            format!("tasks {a} and {b} partially overlap"),
            "adjust start or end dates to reduce the overlap",
        ),
        OverlapType::Adjacent => (
            format!("tasks {a} and {b} are scheduled back to back"),
            "add buffer time between the tasks",
        ),
        OverlapType::Dependency => (
            format!("task {a} and task {b} are linked by a dependency"),
            "keep the dependency order when rescheduling",
        ),
    };
    match severity {
        Severity::Critical => (format!("{reason} (critical)"), format!("urgent: {hint}")),
        Severity::High => (format!("{reason} (high)"), format!("important: {hint}")),
        _ => (reason, hint.to_string()),
    }
}
