//! Validated task structures shared by the layout stages.
//!
//! - **Task set**: input tasks that survived validation, clipped to the calendar window [`TaskSet`]
//! - **Dependency graph**: declared dependencies between tasks of the set [`DependencyGraph`]
//! - **Assignee load**: who works on what, and when [`AssigneeLoad`]

mod dependency;

pub use dependency::DependencyGraph;

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use almanac_core::{identifier::Id, span::DaySpan, task::Task};

use crate::error::InvalidTaskError;

/// A task that passed validation, with its date range clipped to the window.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTask<'a> {
    task: &'a Task,
    span: DaySpan,
}

impl<'a> ScheduledTask<'a> {
    pub fn task(&self) -> &'a Task {
        self.task
    }

    pub fn id(&self) -> Id {
        self.task.id()
    }

    /// Date range restricted to the calendar window.
    pub fn span(&self) -> DaySpan {
        self.span
    }
}

/// Tasks that can be laid out, ordered by id.
#[derive(Debug, Default)]
pub struct TaskSet<'a> {
    tasks: Vec<ScheduledTask<'a>>,
    index: HashMap<Id, usize>,
}

impl<'a> TaskSet<'a> {
    /// Validates `tasks` against `window`.
    ///
    /// Tasks ending before they start, tasks entirely outside the window and
    /// repeated ids are dropped. One warning is returned per dropped task, in
    /// input order. The first valid occurrence of a repeated id is kept.
    pub fn build(tasks: &'a [Task], window: DaySpan) -> (Self, Vec<InvalidTaskError>) {
        let mut warnings = Vec::new();
        let mut accepted: Vec<ScheduledTask<'a>> = Vec::with_capacity(tasks.len());
        let mut seen = HashSet::with_capacity(tasks.len());

        for task in tasks {
            let id = task.id();
            let Ok(span) = task.span() else {
                warnings.push(InvalidTaskError::EndBeforeStart {
                    id,
                    start: task.start(),
                    end: task.end(),
                });
                continue;
            };

            let Some(clipped) = span.clip(window) else {
                warnings.push(InvalidTaskError::OutsideWindow {
                    id,
                    start: task.start(),
                    end: task.end(),
                });
                continue;
            };

            if !seen.insert(id) {
                warnings.push(InvalidTaskError::DuplicateId { id });
                continue;
            }

            if clipped != span {
                debug!(task = id.to_string(), kept = clipped.to_string(); "Task clipped to calendar window");
            }
            accepted.push(ScheduledTask {
                task,
                span: clipped,
            });
        }

        for warning in &warnings {
            warn!(task = warning.task_id().to_string(); "Dropping task: {warning}");
        }

        accepted.sort_by_key(|scheduled| scheduled.id());
        let index = accepted
            .iter()
            .enumerate()
            .map(|(position, scheduled)| (scheduled.id(), position))
            .collect();

        (
            Self {
                tasks: accepted,
                index,
            },
            warnings,
        )
    }

    pub fn get(&self, id: Id) -> Option<&ScheduledTask<'a>> {
        self.index.get(&id).and_then(|&position| self.tasks.get(position))
    }

    /// Tasks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask<'a>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Date ranges of every task, indexed by assignee.
#[derive(Debug, Default)]
pub struct AssigneeLoad {
    spans: HashMap<Id, Vec<DaySpan>>,
}

impl AssigneeLoad {
    pub fn from_tasks(tasks: &TaskSet<'_>) -> Self {
        let mut spans: HashMap<Id, Vec<DaySpan>> = HashMap::new();
        for scheduled in tasks.iter() {
            if let Some(assignee) = scheduled.task().assignee() {
                spans.entry(assignee).or_default().push(scheduled.span());
            }
        }
        Self { spans }
    }

    /// Number of tasks of `assignee` sharing at least one day with `span`.
    pub fn concurrent(&self, assignee: Id, span: DaySpan) -> usize {
        self.spans
            .get(&assignee)
            .map_or(0, |spans| spans.iter().filter(|s| s.overlaps(span)).count())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(Id::new(id), id, Id::new("general"), start, end)
    }

    fn january() -> DaySpan {
        DaySpan::new(date(1, 1), date(1, 31)).unwrap()
    }

    #[test]
    fn test_build_orders_by_id_and_clips() {
        let tasks = vec![
            task("b", date(1, 5), date(1, 6)),
            task("a", NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(), date(1, 3)),
        ];
        let (set, warnings) = TaskSet::build(&tasks, january());

        assert!(warnings.is_empty());
        let ids: Vec<_> = set.iter().map(ScheduledTask::id).collect();
        assert_eq!(ids, vec![Id::new("a"), Id::new("b")]);
        assert_eq!(
            set.get(Id::new("a")).unwrap().span(),
            DaySpan::new(date(1, 1), date(1, 3)).unwrap()
        );
    }

    #[test]
    fn test_build_drops_invalid_tasks_with_warnings() {
        let tasks = vec![
            task("ok", date(1, 2), date(1, 4)),
            task("reversed", date(1, 9), date(1, 2)),
            task("february", date(2, 1), date(2, 3)),
            task("ok", date(1, 10), date(1, 12)),
        ];
        let (set, warnings) = TaskSet::build(&tasks, january());

        assert_eq!(set.len(), 1);
        assert!(set.get(Id::new("ok")).is_some());
        assert_eq!(
            set.get(Id::new("ok")).unwrap().span().start(),
            date(1, 2),
            "first occurrence wins"
        );

        assert_eq!(warnings.len(), 3);
        assert!(matches!(warnings[0], InvalidTaskError::EndBeforeStart { .. }));
        assert!(matches!(warnings[1], InvalidTaskError::OutsideWindow { .. }));
        assert_eq!(
            warnings[2],
            InvalidTaskError::DuplicateId { id: Id::new("ok") }
        );
    }

    #[test]
    fn test_invalid_first_copy_does_not_shadow_valid_duplicate() {
        let tasks = vec![
            task("x", date(1, 9), date(1, 2)),
            task("x", date(1, 3), date(1, 5)),
            task("y", date(2, 1), date(2, 3)),
            task("y", date(1, 7), date(1, 7)),
        ];
        let (set, warnings) = TaskSet::build(&tasks, january());

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(Id::new("x")).unwrap().span(),
            DaySpan::new(date(1, 3), date(1, 5)).unwrap()
        );
        assert_eq!(set.get(Id::new("y")).unwrap().span(), DaySpan::single(date(1, 7)));

        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], InvalidTaskError::EndBeforeStart { .. }));
        assert!(matches!(warnings[1], InvalidTaskError::OutsideWindow { .. }));
    }

    #[test]
    fn test_assignee_load_counts_concurrent_tasks() {
        let tasks = vec![
            task("a", date(1, 1), date(1, 10)).with_assignee(Id::new("ana")),
            task("b", date(1, 5), date(1, 6)).with_assignee(Id::new("ana")),
            task("c", date(1, 20), date(1, 25)).with_assignee(Id::new("ana")),
            task("d", date(1, 5), date(1, 6)).with_assignee(Id::new("ben")),
            task("e", date(1, 5), date(1, 6)),
        ];
        let (set, _) = TaskSet::build(&tasks, january());
        let load = AssigneeLoad::from_tasks(&set);

        let week = DaySpan::new(date(1, 4), date(1, 8)).unwrap();
        assert_eq!(load.concurrent(Id::new("ana"), week), 2);
        assert_eq!(load.concurrent(Id::new("ben"), week), 1);
        assert_eq!(load.concurrent(Id::new("nobody"), week), 0);
        assert_eq!(load.concurrent(Id::new("ana"), january()), 3);
    }

    #[test]
    fn test_empty_input() {
        let (set, warnings) = TaskSet::build(&[], january());
        assert_eq!(set.len(), 0);
        assert!(warnings.is_empty());
    }
}
