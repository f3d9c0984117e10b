//! The task record consumed by the layout engine.
//!
//! Tasks are produced by an external ingestion layer and are treated as
//! immutable input. The engine only checks what it needs to lay them out
//! (date order, window membership, id uniqueness).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    identifier::Id,
    span::{DaySpan, SpanError},
};

/// Ordinal task priority from 1 (lowest) to 5 (highest).
///
/// Out-of-range values are clamped into `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(5);

    pub fn new(value: u8) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Absolute distance between two priorities.
    pub fn delta(self, other: Priority) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// Maps the priority onto `[0, 1]`, lowest priority being `0`.
    pub fn normalized(self) -> f32 {
        f32::from(self.0 - Self::MIN.0) / f32::from(Self::MAX.0 - Self::MIN.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(3)
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// A date-ranged unit of work to place on the calendar.
///
/// # Examples
///
/// ```
/// # use almanac_core::{identifier::Id, task::{Priority, Task}};
/// # use chrono::NaiveDate;
/// let task = Task::new(
///     Id::new("T-1"),
///     "Design review",
///     Id::new("design"),
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
/// )
/// .with_priority(Priority::new(4))
/// .with_assignee(Id::new("alice"));
///
/// assert_eq!(task.span().unwrap().days(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: Id,
    name: String,
    category: Id,
    #[serde(default)]
    priority: Priority,
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    milestone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<Id>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<Id>,
}

impl Task {
    /// Creates a task with default priority, no assignee and no dependencies.
    pub fn new(
        id: Id,
        name: impl Into<String>,
        category: Id,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            priority: Priority::default(),
            start,
            end,
            milestone: false,
            assignee: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_milestone(mut self, milestone: bool) -> Self {
        self.milestone = milestone;
        self
    }

    pub fn with_assignee(mut self, assignee: Id) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = Id>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Id {
        self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_milestone(&self) -> bool {
        self.milestone
    }

    pub fn assignee(&self) -> Option<Id> {
        self.assignee
    }

    /// Ids of the tasks this task depends on.
    pub fn dependencies(&self) -> &[Id] {
        &self.dependencies
    }

    /// The task's date range.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError`] when the end date precedes the start date.
    pub fn span(&self) -> Result<DaySpan, SpanError> {
        DaySpan::new(self.start, self.end)
    }
}
