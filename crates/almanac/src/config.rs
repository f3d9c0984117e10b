//! Configuration types for Almanac layouts.
//!
//! This module provides configuration structures that control how tasks are
//! grouped, ranked, stacked and positioned. All types implement
//! [`serde::Deserialize`] so hosts can load them from TOML or any other serde
//! format. Every section has defaults, so an empty document is a valid
//! configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Track bounds, overlap threshold, stacking and alignment policy.
//! - [`ConflictConfig`] - The weighted rule list used to categorize conflicts.
//! - [`RankingConfig`] - Factor weights and tier thresholds of the priority ranker.
//! - [`StyleConfig`] - The category color palette.
//!
//! # Example
//!
//! ```
//! # use almanac::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.layout().max_tracks_per_day(), 3);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use almanac_core::{calendar::CellGeometry, color::Color, identifier::Id};

use crate::{
    error::ConfigError,
    layout::{
        conflict::{ConflictCategory, ConflictRule, RulePredicate},
        overlap::Severity,
    },
};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Top-level application configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.style.palette()?;
        Ok(())
    }
}

/// How a task keeps or changes its track from one day to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStrategy {
    /// Reuse the track the task held the previous day when it is still free.
    #[default]
    Sticky,
    /// Always take the lowest free track.
    Compact,
}

/// Vertical placement of a stack of bars that does not fill a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Top,
    Center,
    Bottom,
    /// Spread the used tracks evenly over the track area.
    Distributed,
}

/// Layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    max_tracks_per_day: usize,
    min_overlap_days: u32,
    track_strategy: TrackStrategy,
    alignment: Alignment,
    grid_snap: Option<f32>,
    /// Cell geometry hosts use when they build a calendar grid.
    geometry: CellGeometry,
    conflicts: ConflictConfig,
    ranking: RankingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_tracks_per_day: 3,
            min_overlap_days: 1,
            track_strategy: TrackStrategy::default(),
            alignment: Alignment::default(),
            grid_snap: None,
            geometry: CellGeometry::default(),
            conflicts: ConflictConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn with_max_tracks_per_day(mut self, max_tracks_per_day: usize) -> Self {
        self.max_tracks_per_day = max_tracks_per_day;
        self
    }

    pub fn with_min_overlap_days(mut self, min_overlap_days: u32) -> Self {
        self.min_overlap_days = min_overlap_days;
        self
    }

    pub fn with_track_strategy(mut self, track_strategy: TrackStrategy) -> Self {
        self.track_strategy = track_strategy;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_grid_snap(mut self, resolution: Option<f32>) -> Self {
        self.grid_snap = resolution;
        self
    }

    pub fn with_geometry(mut self, geometry: CellGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_conflicts(mut self, conflicts: ConflictConfig) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    /// Maximum number of visible tracks on any day.
    pub fn max_tracks_per_day(&self) -> usize {
        self.max_tracks_per_day
    }

    /// Gap, in empty days, under which disjoint tasks count as adjacent.
    /// Overlaps shorter than this do not add track pressure.
    pub fn min_overlap_days(&self) -> u32 {
        self.min_overlap_days
    }

    pub fn track_strategy(&self) -> TrackStrategy {
        self.track_strategy
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn grid_snap(&self) -> Option<f32> {
        self.grid_snap
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn conflicts(&self) -> &ConflictConfig {
        &self.conflicts
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    /// Checks the layout settings.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tracks_per_day == 0 {
            return Err(ConfigError::InvalidMaxTracks(self.max_tracks_per_day));
        }
        if let Some(resolution) = self.grid_snap {
            if !(resolution.is_finite() && resolution > 0.0) {
                return Err(ConfigError::InvalidSnapResolution(resolution));
            }
        }
        validate_geometry(&self.geometry)?;
        self.conflicts.validate()?;
        self.ranking.validate()?;
        Ok(())
    }
}

/// Checks that a cell geometry can hold at least one bar.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidGeometry`] describing the first problem.
pub fn validate_geometry(geometry: &CellGeometry) -> Result<(), ConfigError> {
    let positive = [
        ("day_width", geometry.day_width()),
        ("cell_height", geometry.cell_height()),
        ("bar_height", geometry.bar_height()),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::InvalidGeometry(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    let spacing = geometry.track_spacing();
    if !(spacing.is_finite() && spacing >= 0.0) {
        return Err(ConfigError::InvalidGeometry(format!(
            "track_spacing must be non-negative, got {spacing}"
        )));
    }
    if geometry.padding().is_invalid() {
        return Err(ConfigError::InvalidGeometry(
            "padding must be non-negative".to_string(),
        ));
    }
    let inset = geometry.bar_inset();
    if !(inset.is_finite() && inset >= 0.0 && inset * 2.0 < geometry.day_width()) {
        return Err(ConfigError::InvalidGeometry(format!(
            "bar_inset {inset} leaves no room in a {} wide day",
            geometry.day_width()
        )));
    }
    if geometry.track_area_height() < geometry.bar_height() {
        return Err(ConfigError::InvalidGeometry(format!(
            "track area of {} cannot hold a bar of height {}",
            geometry.track_area_height(),
            geometry.bar_height()
        )));
    }
    Ok(())
}

/// The weighted rule list of the conflict categorizer.
///
/// Rules are matched against every overlap. The highest weight wins; equal
/// weights resolve to the rule declared first.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    rules: Vec<ConflictRule>,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl ConflictConfig {
    pub fn new(rules: Vec<ConflictRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ConflictRule] {
        &self.rules
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rules {
            let weight = rule.weight();
            if !(weight.is_finite() && (0.0..=1.0).contains(&weight)) {
                return Err(ConfigError::InvalidRuleWeight {
                    name: rule.name().to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }
}

fn default_rules() -> Vec<ConflictRule> {
    vec![
        ConflictRule::new(
            "same assignee",
            RulePredicate::SameAssignee,
            ConflictCategory::Resource,
            0.9,
        ),
        ConflictRule::new(
            "dependency chain",
            RulePredicate::DependencyEdge,
            ConflictCategory::Dependency,
            0.85,
        ),
        ConflictRule::new(
            "identical schedule",
            RulePredicate::IdenticalRange,
            ConflictCategory::Schedule,
            0.8,
        ),
        ConflictRule::new(
            "milestone overlap",
            RulePredicate::Milestone,
            ConflictCategory::Milestone,
            0.75,
        ),
        ConflictRule::new(
            "high priority overlap",
            RulePredicate::BothHighPriority { min_priority: 4 },
            ConflictCategory::Priority,
            0.7,
        ),
        ConflictRule::new(
            "assignee workload",
            RulePredicate::AssigneeWorkload { min_concurrent: 3 },
            ConflictCategory::Workload,
            0.65,
        ),
        ConflictRule::new(
            "same category",
            RulePredicate::SameCategory {
                min_severity: Severity::High,
            },
            ConflictCategory::Category,
            0.6,
        ),
        ConflictRule::new(
            "deadline cluster",
            RulePredicate::DeadlineCluster { within_days: 2 },
            ConflictCategory::Deadline,
            0.55,
        ),
        ConflictRule::new(
            "long overlap",
            RulePredicate::LongOverlap {
                min_percentage: 0.7,
            },
            ConflictCategory::Timeline,
            0.5,
        ),
    ]
}

/// Weights of the ranking factors. They must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub conflict_severity: f32,
    pub task_priority: f32,
    pub milestone: f32,
    pub dependency_proximity: f32,
    pub assignee_workload: f32,
    pub category_importance: f32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            conflict_severity: 0.30,
            task_priority: 0.25,
            milestone: 0.15,
            dependency_proximity: 0.10,
            assignee_workload: 0.10,
            category_importance: 0.10,
        }
    }
}

impl RankingWeights {
    fn named(&self) -> [(&'static str, f32); 6] {
        [
            ("conflict_severity", self.conflict_severity),
            ("task_priority", self.task_priority),
            ("milestone", self.milestone),
            ("dependency_proximity", self.dependency_proximity),
            ("assignee_workload", self.assignee_workload),
            ("category_importance", self.category_importance),
        ]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.named() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let sum: f32 = self.named().iter().map(|(_, value)| value).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Lower score bounds of the prominence tiers. Scores below `low` are Minimal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub critical: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: 0.8,
            high: 0.6,
            medium: 0.4,
            low: 0.2,
        }
    }
}

impl TierThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.low
            && self.low < self.medium
            && self.medium < self.high
            && self.high < self.critical
            && self.critical <= 1.0;
        if !ordered {
            return Err(ConfigError::InvalidThresholds(format!(
                "expected 0 < low < medium < high < critical <= 1, got {} / {} / {} / {}",
                self.low, self.medium, self.high, self.critical
            )));
        }
        Ok(())
    }
}

/// Priority ranker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    weights: RankingWeights,
    tiers: TierThresholds,
    category_importance: IndexMap<Id, f32>,
    default_category_importance: f32,
    workload_saturation: usize,
    dependency_horizon_days: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            tiers: TierThresholds::default(),
            category_importance: IndexMap::new(),
            default_category_importance: 0.5,
            workload_saturation: 4,
            dependency_horizon_days: 7,
        }
    }
}

impl RankingConfig {
    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_category_importance(mut self, category: Id, importance: f32) -> Self {
        self.category_importance.insert(category, importance);
        self
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    pub fn tiers(&self) -> &TierThresholds {
        &self.tiers
    }

    /// Importance of a category in `[0, 1]`, falling back to the default.
    pub fn category_importance(&self, category: Id) -> f32 {
        self.category_importance
            .get(&category)
            .copied()
            .unwrap_or(self.default_category_importance)
    }

    /// Number of concurrent tasks at which an assignee counts as fully loaded.
    pub fn workload_saturation(&self) -> usize {
        self.workload_saturation
    }

    /// Gap, in days, at which dependency proximity has decayed to one half.
    pub fn dependency_horizon_days(&self) -> u32 {
        self.dependency_horizon_days
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.tiers.validate()?;
        let importances = self
            .category_importance
            .iter()
            .map(|(category, value)| (category.to_string(), *value))
            .chain(std::iter::once((
                "default_category_importance".to_string(),
                self.default_category_importance,
            )));
        for (category, value) in importances {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(ConfigError::InvalidCategoryImportance { category, value });
            }
        }
        if self.workload_saturation == 0 {
            return Err(ConfigError::InvalidWorkloadSaturation);
        }
        if self.dependency_horizon_days == 0 {
            return Err(ConfigError::InvalidDependencyHorizon);
        }
        Ok(())
    }
}

/// Visual styling: the explicit category color registry.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// CSS color per category.
    category_colors: IndexMap<Id, String>,

    /// Color for categories without an entry.
    default_color: Option<String>,
}

impl StyleConfig {
    pub fn with_category_color(mut self, category: Id, color: impl Into<String>) -> Self {
        self.category_colors.insert(category, color.into());
        self
    }

    /// Parses the configured colors into a [`CategoryPalette`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidColor`] for the first color string that
    /// does not parse.
    pub fn palette(&self) -> Result<CategoryPalette, ConfigError> {
        let fallback = self
            .default_color
            .as_deref()
            .map(|color| {
                Color::new(color).map_err(|reason| ConfigError::InvalidColor {
                    key: "default_color".to_string(),
                    reason,
                })
            })
            .transpose()?
            .unwrap_or_default();

        let colors = self
            .category_colors
            .iter()
            .map(|(category, color)| {
                Color::new(color)
                    .map(|parsed| (*category, parsed))
                    .map_err(|reason| ConfigError::InvalidColor {
                        key: category.to_string(),
                        reason,
                    })
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        Ok(CategoryPalette { colors, fallback })
    }
}

/// Resolved category colors.
#[derive(Debug, Clone, Default)]
pub struct CategoryPalette {
    colors: IndexMap<Id, Color>,
    fallback: Color,
}

impl CategoryPalette {
    /// Color for `category`, or the default color.
    pub fn color_for(&self, category: Id) -> Color {
        self.colors.get(&category).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use almanac_core::geometry::Insets;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout().track_strategy(), TrackStrategy::Sticky);
        assert_eq!(config.layout().alignment(), Alignment::Top);
        assert_eq!(config.layout().conflicts().rules().len(), 9);
    }

    #[test]
    fn test_zero_max_tracks_is_rejected() {
        let layout = LayoutConfig::default().with_max_tracks_per_day(0);
        assert_eq!(layout.validate(), Err(ConfigError::InvalidMaxTracks(0)));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = RankingWeights {
            conflict_severity: 0.5,
            ..RankingWeights::default()
        };
        let layout =
            LayoutConfig::default().with_ranking(RankingConfig::default().with_weights(weights));
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let weights = RankingWeights {
            conflict_severity: 0.5,
            task_priority: -0.05,
            ..RankingWeights::default()
        };
        let layout =
            LayoutConfig::default().with_ranking(RankingConfig::default().with_weights(weights));
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::NegativeWeight {
                name: "task_priority",
                ..
            })
        ));
    }

    #[test]
    fn test_unordered_tiers_are_rejected() {
        let tiers = TierThresholds {
            high: 0.9,
            ..TierThresholds::default()
        };
        let layout =
            LayoutConfig::default().with_ranking(RankingConfig::default().with_tiers(tiers));
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_ranking_settings_name_the_bad_value() {
        let ranking = RankingConfig::default().with_category_importance(Id::new("ops"), 1.5);
        let layout = LayoutConfig::default().with_ranking(ranking);
        assert_eq!(
            layout.validate(),
            Err(ConfigError::InvalidCategoryImportance {
                category: "ops".to_string(),
                value: 1.5,
            })
        );

        let ranking = RankingConfig {
            workload_saturation: 0,
            ..RankingConfig::default()
        };
        let layout = LayoutConfig::default().with_ranking(ranking);
        assert_eq!(layout.validate(), Err(ConfigError::InvalidWorkloadSaturation));

        let ranking = RankingConfig {
            dependency_horizon_days: 0,
            ..RankingConfig::default()
        };
        let layout = LayoutConfig::default().with_ranking(ranking);
        let err = layout.validate().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDependencyHorizon);
        assert!(err.to_string().contains("dependency_horizon_days"));
    }

    #[test]
    fn test_rule_weight_out_of_range_is_rejected() {
        let conflicts = ConflictConfig::new(vec![ConflictRule::new(
            "too heavy",
            RulePredicate::Milestone,
            ConflictCategory::Milestone,
            1.5,
        )]);
        let layout = LayoutConfig::default().with_conflicts(conflicts);
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidRuleWeight { .. })
        ));
    }

    #[test]
    fn test_snap_resolution_must_be_positive() {
        let layout = LayoutConfig::default().with_grid_snap(Some(0.0));
        assert_eq!(
            layout.validate(),
            Err(ConfigError::InvalidSnapResolution(0.0))
        );
        assert!(
            LayoutConfig::default()
                .with_grid_snap(Some(0.5))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_geometry_validation() {
        assert!(validate_geometry(&CellGeometry::default()).is_ok());

        let flat = CellGeometry::new(40.0, 60.0, 0.0, 2.0);
        assert!(matches!(
            validate_geometry(&flat),
            Err(ConfigError::InvalidGeometry(_))
        ));

        let crowded = CellGeometry::new(40.0, 20.0, 12.0, 2.0).with_padding(Insets::uniform(5.0));
        assert!(validate_geometry(&crowded).is_err());

        let fat_inset = CellGeometry::default().with_bar_inset(20.0);
        assert!(validate_geometry(&fat_inset).is_err());
    }

    #[test]
    fn test_palette_resolves_category_colors() {
        let style = StyleConfig::default().with_category_color(Id::new("design"), "#ff0000");
        let palette = style.palette().unwrap();

        assert_eq!(
            palette.color_for(Id::new("design")),
            Color::new("#ff0000").unwrap()
        );
        assert_eq!(palette.color_for(Id::new("unknown")), Color::default());
    }

    #[test]
    fn test_palette_rejects_bad_color() {
        let style = StyleConfig::default().with_category_color(Id::new("ops"), "not-a-color");
        let err = style.palette().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor { ref key, .. } if key == "ops"));
    }

    #[test]
    fn test_category_importance_lookup() {
        let ranking = RankingConfig::default().with_category_importance(Id::new("research"), 0.9);
        assert_eq!(ranking.category_importance(Id::new("research")), 0.9);
        assert_eq!(ranking.category_importance(Id::new("admin")), 0.5);
    }
}
