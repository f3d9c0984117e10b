//! Plan files: the calendar window and the tasks to lay out.
//!
//! A plan is plain TOML. Dates are quoted ISO strings:
//!
//! ```toml
//! [calendar]
//! start = "2025-01-01"
//! end = "2025-03-31"
//!
//! [[tasks]]
//! id = "design"
//! name = "Design review"
//! category = "design"
//! start = "2025-01-06"
//! end = "2025-01-17"
//! priority = 4
//! assignee = "ana"
//! ```

use std::ops::Range;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use almanac::{
    calendar::{CalendarError, CalendarGrid, CellGeometry},
    task::Task,
};

/// Errors raised while reading a plan file.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The file is not a valid plan. Carries the source for diagnostics.
    #[error("Failed to parse plan: {message}")]
    Parse {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Invalid calendar window: {0}")]
    Calendar(#[from] CalendarError),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalendarWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// A parsed plan file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    calendar: CalendarWindow,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl Plan {
    /// Parses a plan from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] with the offending byte range when the
    /// source is not a valid plan.
    pub fn from_toml(src: &str) -> Result<Self, PlanError> {
        toml::from_str(src).map_err(|err| PlanError::Parse {
            message: err.message().to_string(),
            span: err.span(),
            src: src.to_string(),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Builds the month pages covering the plan's calendar window.
    pub fn grid(&self, geometry: CellGeometry) -> Result<CalendarGrid, PlanError> {
        Ok(CalendarGrid::new(
            self.calendar.start,
            self.calendar.end,
            geometry,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use almanac::identifier::Id;

    use super::*;

    const PLAN: &str = r#"
[calendar]
start = "2025-01-01"
end = "2025-02-28"

[[tasks]]
id = "design"
name = "Design"
category = "design"
start = "2025-01-06"
end = "2025-01-17"
priority = 4
assignee = "ana"

[[tasks]]
id = "build"
name = "Build"
category = "dev"
start = "2025-01-15"
end = "2025-02-10"
dependencies = ["design"]
"#;

    #[test]
    fn test_plan_is_parsed() {
        let plan = Plan::from_toml(PLAN).unwrap();

        assert_eq!(plan.tasks().len(), 2);
        let design = &plan.tasks()[0];
        assert_eq!(design.id(), Id::new("design"));
        assert_eq!(design.priority().value(), 4);
        assert_eq!(design.assignee(), Some(Id::new("ana")));
        assert_eq!(plan.tasks()[1].dependencies(), &[Id::new("design")]);

        let grid = plan.grid(CellGeometry::default()).unwrap();
        assert_eq!(grid.pages().len(), 2);
        assert_eq!(grid.day_count(), 59);
    }

    #[test]
    fn test_plan_without_tasks_is_valid() {
        let plan =
            Plan::from_toml("[calendar]\nstart = \"2025-01-01\"\nend = \"2025-01-31\"\n").unwrap();
        assert!(plan.tasks().is_empty());
    }

    #[test]
    fn test_parse_error_keeps_span() {
        let src = "[calendar]\nstart = \"2025-01-01\"\nend = \n";
        let err = Plan::from_toml(src).unwrap_err();

        match err {
            PlanError::Parse { span, src: kept, .. } => {
                assert!(span.is_some());
                assert_eq!(kept, src);
            }
            PlanError::Calendar(_) => panic!("Expected Parse"),
        }
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let plan =
            Plan::from_toml("[calendar]\nstart = \"2025-02-01\"\nend = \"2025-01-01\"\n").unwrap();
        assert!(matches!(
            plan.grid(CellGeometry::default()),
            Err(PlanError::Calendar(CalendarError::EmptyWindow { .. }))
        ));
    }
}
