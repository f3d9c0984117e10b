//! Overlap groups: connected components of date-overlapping tasks.
//!
//! Tasks are swept in start order while tracking the latest end date of the
//! group being built. A task starting on or before that date joins the group,
//! otherwise it opens a new one. Two tasks in different groups never share a
//! day, so every later stage can work on one group at a time.

use chrono::NaiveDate;
use log::{debug, trace};
use serde::Serialize;

use almanac_core::{identifier::Id, span::DaySpan};

use crate::{
    layout::overlap::{Severity, TaskOverlap},
    structure::TaskSet,
};

/// A maximal set of transitively overlapping tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapGroup {
    index: usize,
    span: DaySpan,
    members: Vec<Id>,
    max_severity: Severity,
    conflict_count: usize,
}

impl OverlapGroup {
    /// Position of the group in start-date order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Days from the earliest start to the latest end of the members.
    pub fn span(&self) -> DaySpan {
        self.span
    }

    /// Member ids in ascending order.
    pub fn members(&self) -> &[Id] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Highest severity among overlaps involving a member.
    pub fn max_severity(&self) -> Severity {
        self.max_severity
    }

    /// Number of overlaps involving at least one member.
    ///
    /// Adjacent and dependency overlaps link two groups and count in both.
    pub fn conflict_count(&self) -> usize {
        self.conflict_count
    }

    pub fn contains(&self, id: Id) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Fills the summary fields from the detected overlaps.
    pub fn summarize(&mut self, overlaps: &[TaskOverlap]) {
        let (count, max_severity) = overlaps
            .iter()
            .filter(|overlap| self.contains(overlap.task_a()) || self.contains(overlap.task_b()))
            .fold((0, Severity::None), |(count, max), overlap| {
                (count + 1, max.max(overlap.severity()))
            });
        self.conflict_count = count;
        self.max_severity = max_severity;
    }
}

/// Splits scheduled tasks into overlap groups.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupingEngine;

impl GroupingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns the overlap groups ordered by start date, singletons included.
    pub fn group(&self, tasks: &TaskSet<'_>) -> Vec<OverlapGroup> {
        let mut order: Vec<_> = tasks.iter().collect();
        order.sort_by_key(|scheduled| {
            let span = scheduled.span();
            (span.start(), span.end(), scheduled.id())
        });

        let mut groups = Vec::new();
        let mut current: Option<PendingGroup> = None;

        for scheduled in order {
            let span = scheduled.span();
            match current.as_mut() {
                Some(pending) if span.start() <= pending.end => {
                    pending.end = pending.end.max(span.end());
                    pending.members.push(scheduled.id());
                }
                _ => {
                    if let Some(done) = current.take() {
                        groups.push(done.finish(groups.len()));
                    }
                    current = Some(PendingGroup {
                        start: span.start(),
                        end: span.end(),
                        members: vec![scheduled.id()],
                    });
                }
            }
        }
        if let Some(done) = current {
            groups.push(done.finish(groups.len()));
        }

        debug!(groups = groups.len(), tasks = tasks.len(); "Tasks grouped");
        trace!(groups:?; "Overlap groups");
        groups
    }
}

struct PendingGroup {
    start: NaiveDate,
    end: NaiveDate,
    members: Vec<Id>,
}

impl PendingGroup {
    fn finish(mut self, index: usize) -> OverlapGroup {
        self.members.sort();
        OverlapGroup {
            index,
            span: DaySpan::new(self.start, self.end).unwrap_or(DaySpan::single(self.start)),
            members: self.members,
            max_severity: Severity::None,
            conflict_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use almanac_core::task::Task;

    use super::*;
    use crate::{layout::overlap::OverlapDetector, structure::DependencyGraph};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn task(id: &str, start: u32, end: u32) -> Task {
        Task::new(Id::new(id), id, Id::new("general"), date(start), date(end))
    }

    fn window() -> DaySpan {
        DaySpan::new(date(1), date(31)).unwrap()
    }

    fn member_names(group: &OverlapGroup) -> Vec<String> {
        group.members().iter().map(Id::as_string).collect()
    }

    #[test]
    fn test_transitive_overlap_forms_one_group() {
        // a and c never touch, b bridges them.
        let tasks = vec![task("a", 1, 5), task("b", 4, 9), task("c", 8, 12)];
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        assert_eq!(groups.len(), 1);
        assert_eq!(member_names(&groups[0]), vec!["a", "b", "c"]);
        assert_eq!(groups[0].span(), DaySpan::new(date(1), date(12)).unwrap());
    }

    #[test]
    fn test_disjoint_tasks_form_singletons() {
        let tasks = vec![task("late", 20, 22), task("early", 1, 3), task("mid", 4, 4)];
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(OverlapGroup::is_singleton));
        assert_eq!(member_names(&groups[0]), vec!["early"]);
        assert_eq!(member_names(&groups[1]), vec!["mid"]);
        assert_eq!(member_names(&groups[2]), vec!["late"]);
        let indices: Vec<_> = groups.iter().map(OverlapGroup::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_shared_single_day_joins_group() {
        let tasks = vec![task("a", 1, 5), task("b", 5, 6)];
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_long_task_keeps_group_open() {
        let tasks = vec![task("long", 1, 20), task("x", 2, 3), task("y", 10, 11)];
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert!(groups[0].contains(Id::new("y")));
    }

    #[test]
    fn test_summarize_counts_member_overlaps() {
        let tasks = vec![task("A", 1, 10), task("B", 5, 15), task("far", 25, 28)];
        let (set, _) = TaskSet::build(&tasks, window());
        let mut groups = GroupingEngine::new().group(&set);
        let overlaps =
            OverlapDetector::new(0).detect(&set, &groups, &DependencyGraph::from_tasks(&set));

        for group in &mut groups {
            group.summarize(&overlaps);
        }

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].conflict_count(), 1);
        assert_eq!(groups[0].max_severity(), Severity::High);
        assert_eq!(groups[1].conflict_count(), 0);
        assert_eq!(groups[1].max_severity(), Severity::None);
    }

    #[test]
    fn test_summarize_twice_gives_same_result() {
        let tasks = vec![task("A", 1, 10), task("B", 5, 15)];
        let (set, _) = TaskSet::build(&tasks, window());
        let mut groups = GroupingEngine::new().group(&set);
        let overlaps =
            OverlapDetector::new(0).detect(&set, &groups, &DependencyGraph::from_tasks(&set));

        groups[0].summarize(&overlaps);
        groups[0].summarize(&overlaps);
        assert_eq!(groups[0].conflict_count(), 1);
    }

    #[test]
    fn test_empty_set_yields_no_groups() {
        let (set, _) = TaskSet::build(&[], window());
        assert!(GroupingEngine::new().group(&set).is_empty());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use almanac_core::task::Task;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn tasks_strategy() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec((0u64..60, 0u64..10), 0..25).prop_map(|ranges| {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            ranges
                .into_iter()
                .enumerate()
                .map(|(i, (offset, len))| {
                    let start = base + chrono::Days::new(offset);
                    let end = start + chrono::Days::new(len);
                    Task::new(Id::new(&format!("g{i:02}")), "t", Id::new("c"), start, end)
                })
                .collect()
        })
    }

    fn window() -> DaySpan {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        DaySpan::new(base, base + chrono::Days::new(80)).unwrap()
    }

    // ===================
    // Property Checks
    // ===================

    fn check_groups_partition_tasks(tasks: Vec<Task>) -> Result<(), TestCaseError> {
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        let total: usize = groups.iter().map(OverlapGroup::len).sum();
        prop_assert_eq!(total, set.len());
        Ok(())
    }

    fn check_groups_never_share_a_day(tasks: Vec<Task>) -> Result<(), TestCaseError> {
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        for pair in groups.windows(2) {
            prop_assert!(pair[0].span().end() < pair[1].span().start());
        }
        for group in &groups {
            for id in group.members() {
                let span = set.get(*id).map(|s| s.span());
                prop_assert!(span.is_some_and(|span| group.span().covers(span)));
            }
        }
        Ok(())
    }

    fn check_overlapping_pairs_share_group(tasks: Vec<Task>) -> Result<(), TestCaseError> {
        let (set, _) = TaskSet::build(&tasks, window());
        let groups = GroupingEngine::new().group(&set);

        for a in set.iter() {
            for b in set.iter() {
                if a.span().overlaps(b.span()) {
                    let together = groups
                        .iter()
                        .any(|group| group.contains(a.id()) && group.contains(b.id()));
                    prop_assert!(together);
                }
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn groups_partition_tasks(tasks in tasks_strategy()) {
            check_groups_partition_tasks(tasks)?;
        }

        #[test]
        fn groups_never_share_a_day(tasks in tasks_strategy()) {
            check_groups_never_share_a_day(tasks)?;
        }

        #[test]
        fn overlapping_pairs_share_group(tasks in tasks_strategy()) {
            check_overlapping_pairs_share_group(tasks)?;
        }
    }
}
