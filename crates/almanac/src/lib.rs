//! Almanac - A layout engine for date-ranged tasks on monthly calendar pages.
//!
//! Given a list of tasks and a calendar grid, Almanac groups overlapping
//! tasks, classifies and categorizes their conflicts, ranks the tasks, stacks
//! them on a bounded number of tracks per day, splits bars at month
//! boundaries and computes page coordinates for every bar. Days with more
//! tasks than visible tracks report an overflow count instead of dropping
//! bars silently.

pub mod config;

mod error;
mod layout;
mod structure;

pub use almanac_core::{calendar, color, geometry, identifier, span, task};

pub use error::{AlmanacError, ConfigError, InvalidTaskError};
pub use layout::{
    conflict::{
        ConflictCategory, ConflictRecord, ConflictRule, ConflictScores, Resolution, RulePredicate,
    },
    grouping::OverlapGroup,
    overlap::{OverlapType, Severity, TaskOverlap},
    priority::{PriorityFactors, ProminenceTier, TaskPriority},
    result::{LayoutResult, LayoutStats, LayoutViolation, OverflowDay, TaskBar},
};

use log::{debug, info, trace};

use calendar::CalendarGrid;
use config::{AppConfig, validate_geometry};
use layout::{
    boundary::MonthBoundaryProcessor,
    conflict::ConflictCategorizer,
    grouping::GroupingEngine,
    overlap::OverlapDetector,
    positioning::PositioningEngine,
    priority::PriorityRanker,
    result::LayoutParts,
    tracks::TrackAssigner,
};
use structure::{AssigneeLoad, DependencyGraph, TaskSet};
use task::Task;

/// Builder for computing calendar layouts.
///
/// # Examples
///
/// ```rust
/// use almanac::{LayoutBuilder, calendar::{CalendarGrid, CellGeometry}, identifier::Id, task::Task};
/// use chrono::NaiveDate;
///
/// let date = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
/// let tasks = vec![
///     Task::new(Id::new("a"), "Design", Id::new("design"), date(1), date(10)),
///     Task::new(Id::new("b"), "Build", Id::new("dev"), date(5), date(15)),
/// ];
/// let grid = CalendarGrid::new(date(1), date(31), CellGeometry::default()).unwrap();
///
/// let layout = LayoutBuilder::default().compute(&tasks, &grid).unwrap();
/// assert_eq!(layout.bars().len(), 2);
/// assert!(layout.validate().is_empty());
/// ```
#[derive(Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including layout and style settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lay out `tasks` on the pages of `grid`.
    ///
    /// Invalid tasks are dropped and reported in [`LayoutResult::warnings`];
    /// the remaining tasks are still laid out.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::Config`] when the configuration or the grid's
    /// cell geometry is invalid. Nothing is computed in that case.
    pub fn compute(&self, tasks: &[Task], grid: &CalendarGrid) -> Result<LayoutResult, AlmanacError> {
        let layout_config = self.config.layout();
        layout_config.validate()?;
        validate_geometry(grid.geometry())?;
        let palette = self.config.style().palette()?;

        info!(
            tasks = tasks.len(),
            pages = grid.pages().len(),
            window = grid.window().to_string();
            "Computing layout"
        );

        let (task_set, warnings) = TaskSet::build(tasks, grid.window());
        let dependencies = DependencyGraph::from_tasks(&task_set);
        let load = AssigneeLoad::from_tasks(&task_set);
        debug!(
            scheduled = task_set.len(),
            dropped = warnings.len(),
            dependencies = dependencies.edge_count();
            "Tasks validated"
        );

        let mut groups = GroupingEngine::new().group(&task_set);
        let overlaps = OverlapDetector::new(layout_config.min_overlap_days()).detect(
            &task_set,
            &groups,
            &dependencies,
        );
        for group in &mut groups {
            group.summarize(&overlaps);
        }

        let conflicts = ConflictCategorizer::new(layout_config.conflicts().rules())
            .categorize_all(overlaps, &task_set, &dependencies, &load);
        let priorities = PriorityRanker::new(layout_config.ranking()).rank(
            &task_set,
            &conflicts,
            &dependencies,
            &load,
        );

        let max_tracks = layout_config.max_tracks_per_day();
        let assignment = TrackAssigner::new(max_tracks, layout_config.track_strategy())
            .assign(&task_set, &groups, &priorities);
        trace!(runs:? = assignment.runs(), hidden:? = assignment.hidden(); "Track assignment");
        let (runs, mut hidden) = assignment.into_parts();
        let mut bars = MonthBoundaryProcessor::new(grid, max_tracks).process(
            &runs,
            &task_set,
            &priorities,
            &mut hidden,
        );

        PositioningEngine::new(grid.geometry(), &palette, max_tracks)
            .with_alignment(layout_config.alignment())
            .with_grid_snap(layout_config.grid_snap())
            .position(&mut bars);

        let result = LayoutResult::assemble(
            LayoutParts {
                total_tasks: tasks.len(),
                max_tracks_per_day: max_tracks,
                bars,
                hidden,
                groups,
                conflicts,
                priorities,
                warnings,
            },
            grid,
        );

        let stats = result.stats();
        info!(
            bars = stats.bar_count,
            groups = stats.group_count,
            overlaps = stats.total_overlaps,
            overflow = stats.total_overflow;
            "Layout computed"
        );
        trace!(stats:?; "Layout statistics");
        Ok(result)
    }
}
