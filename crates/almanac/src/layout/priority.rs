//! Composite priority scores and prominence tiers.
//!
//! Every scheduled task gets a score in `[0, 1]`: a weighted sum of six
//! normalized factors. The score is mapped to a [`ProminenceTier`] through
//! fixed absolute bands from [`TierThresholds`], so a task's tier never
//! depends on how the other tasks scored.

use std::{collections::HashMap, fmt};

use log::{debug, trace};
use serde::Serialize;

use almanac_core::identifier::Id;

use crate::{
    config::{RankingConfig, TierThresholds},
    layout::{conflict::ConflictRecord, overlap::Severity},
    structure::{AssigneeLoad, DependencyGraph, ScheduledTask, TaskSet},
};

/// Scores are rounded to this many steps per unit so tiny float differences
/// never flip a tier or an ordering.
const SCORE_RESOLUTION: f64 = 1e6;

/// Visual prominence bucket. Orders from most to least prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProminenceTier {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
}

impl ProminenceTier {
    pub const ALL: [ProminenceTier; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Minimal,
    ];

    /// Band of `score` under `thresholds`.
    pub fn from_score(score: f32, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.critical {
            Self::Critical
        } else if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else if score >= thresholds.low {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

impl fmt::Display for ProminenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        };
        f.write_str(name)
    }
}

/// The normalized inputs of a priority score, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriorityFactors {
    pub conflict_severity: f32,
    pub task_priority: f32,
    pub milestone: f32,
    pub dependency_proximity: f32,
    pub assignee_workload: f32,
    pub category_importance: f32,
}

/// Ranking of one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPriority {
    task: Id,
    score: f32,
    tier: ProminenceTier,
    factors: PriorityFactors,
}

impl TaskPriority {
    pub fn task(&self) -> Id {
        self.task
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn tier(&self) -> ProminenceTier {
        self.tier
    }

    pub fn factors(&self) -> &PriorityFactors {
        &self.factors
    }
}

/// Computes [`TaskPriority`] values from conflicts and task attributes.
#[derive(Debug, Clone, Copy)]
pub struct PriorityRanker<'c> {
    config: &'c RankingConfig,
}

impl<'c> PriorityRanker<'c> {
    pub fn new(config: &'c RankingConfig) -> Self {
        Self { config }
    }

    /// Ranks every task of the set. The result is ordered by task id.
    pub fn rank(
        &self,
        tasks: &TaskSet<'_>,
        conflicts: &[ConflictRecord],
        dependencies: &DependencyGraph,
        load: &AssigneeLoad,
    ) -> Vec<TaskPriority> {
        // Only overlaps long enough to push tasks apart count.
        let mut severities: HashMap<Id, Severity> = HashMap::new();
        for record in conflicts {
            let overlap = record.overlap();
            if !overlap.contributes_pressure() {
                continue;
            }
            for id in [overlap.task_a(), overlap.task_b()] {
                let entry = severities.entry(id).or_default();
                *entry = (*entry).max(overlap.severity());
            }
        }

        let priorities: Vec<_> = tasks
            .iter()
            .map(|scheduled| {
                let factors = PriorityFactors {
                    conflict_severity: severities
                        .get(&scheduled.id())
                        .copied()
                        .unwrap_or_default()
                        .score(),
                    task_priority: scheduled.task().priority().normalized(),
                    milestone: if scheduled.task().is_milestone() {
                        1.0
                    } else {
                        0.0
                    },
                    dependency_proximity: self.dependency_proximity(
                        scheduled,
                        tasks,
                        dependencies,
                    ),
                    assignee_workload: self.assignee_workload(scheduled, load),
                    category_importance: self
                        .config
                        .category_importance(scheduled.task().category()),
                };
                let score = self.score(&factors);
                let tier = ProminenceTier::from_score(score, self.config.tiers());
                trace!(task = scheduled.id().to_string(), score, tier:?; "Task ranked");
                TaskPriority {
                    task: scheduled.id(),
                    score,
                    tier,
                    factors,
                }
            })
            .collect();

        debug!(tasks = priorities.len(); "Tasks ranked");
        priorities
    }

    fn score(&self, factors: &PriorityFactors) -> f32 {
        let weights = self.config.weights();
        let terms = [
            (weights.conflict_severity, factors.conflict_severity),
            (weights.task_priority, factors.task_priority),
            (weights.milestone, factors.milestone),
            (weights.dependency_proximity, factors.dependency_proximity),
            (weights.assignee_workload, factors.assignee_workload),
            (weights.category_importance, factors.category_importance),
        ];
        let sum: f64 = terms
            .iter()
            .map(|(weight, factor)| f64::from(*weight) * f64::from(*factor))
            .sum();
        ((sum.clamp(0.0, 1.0) * SCORE_RESOLUTION).round() / SCORE_RESOLUTION) as f32
    }

    /// Closeness of the nearest task linked by a dependency.
    ///
    /// Overlapping neighbors score 1; otherwise the score halves once the gap
    /// reaches the configured horizon.
    fn dependency_proximity(
        &self,
        scheduled: &ScheduledTask<'_>,
        tasks: &TaskSet<'_>,
        dependencies: &DependencyGraph,
    ) -> f32 {
        let horizon = self.config.dependency_horizon_days() as f32;
        dependencies
            .neighbors(scheduled.id())
            .into_iter()
            .filter_map(|id| tasks.get(id))
            .map(|neighbor| match scheduled.span().gap_days(neighbor.span()) {
                None => 1.0,
                Some(gap) => 1.0 / (1.0 + gap as f32 / horizon),
            })
            .fold(0.0, f32::max)
    }

    fn assignee_workload(&self, scheduled: &ScheduledTask<'_>, load: &AssigneeLoad) -> f32 {
        let Some(assignee) = scheduled.task().assignee() else {
            return 0.0;
        };
        let concurrent = load.concurrent(assignee, scheduled.span());
        (concurrent as f32 / self.config.workload_saturation() as f32).min(1.0)
    }
}

/// Placement order of tasks competing for tracks: most prominent tier
/// first, then higher score, then ascending id.
pub fn placement_order(a: &TaskPriority, b: &TaskPriority) -> std::cmp::Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.task.cmp(&b.task))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use float_cmp::assert_approx_eq;

    use almanac_core::{
        span::DaySpan,
        task::{Priority, Task},
    };

    use super::*;
    use crate::{
        config::{ConflictConfig, RankingWeights},
        layout::{
            conflict::ConflictCategorizer, grouping::GroupingEngine, overlap::OverlapDetector,
        },
    };

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn task(id: &str, start: u32, end: u32) -> Task {
        Task::new(Id::new(id), id, Id::new("general"), date(start), date(end))
    }

    fn rank_with(tasks: Vec<Task>, config: &RankingConfig) -> Vec<TaskPriority> {
        let window = DaySpan::new(date(1), date(31)).unwrap();
        let (set, _) = TaskSet::build(&tasks, window);
        let groups = GroupingEngine::new().group(&set);
        let dependencies = DependencyGraph::from_tasks(&set);
        let load = AssigneeLoad::from_tasks(&set);
        let overlaps = OverlapDetector::new(1).detect(&set, &groups, &dependencies);
        let rules = ConflictConfig::default();
        let conflicts = ConflictCategorizer::new(rules.rules()).categorize_all(
            overlaps,
            &set,
            &dependencies,
            &load,
        );
        PriorityRanker::new(config).rank(&set, &conflicts, &dependencies, &load)
    }

    fn rank(tasks: Vec<Task>) -> Vec<TaskPriority> {
        rank_with(tasks, &RankingConfig::default())
    }

    #[test]
    fn test_partial_overlap_pair() {
        let ranked = rank(vec![task("A", 1, 10), task("B", 5, 15)]);

        assert_eq!(ranked.len(), 2);
        for priority in &ranked {
            // 0.3 * 0.75 + 0.25 * 0.5 + 0.1 * 0.5
            assert_approx_eq!(f32, priority.score(), 0.4);
            assert_eq!(priority.tier(), ProminenceTier::Medium);
            assert_approx_eq!(f32, priority.factors().conflict_severity, 0.75);
        }
        assert_eq!(placement_order(&ranked[0], &ranked[1]), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_short_overlap_adds_no_severity() {
        let ranked = rank(vec![task("a", 1, 10), task("b", 12, 20)]);
        for priority in &ranked {
            assert_approx_eq!(f32, priority.factors().conflict_severity, 0.0);
        }
    }

    #[test]
    fn test_milestone_and_priority_raise_score() {
        let ranked = rank(vec![
            task("plain", 1, 3),
            task("launch", 20, 20)
                .with_milestone(true)
                .with_priority(Priority::MAX),
        ]);
        let launch = ranked.iter().find(|p| p.task() == "launch").unwrap();
        let plain = ranked.iter().find(|p| p.task() == "plain").unwrap();

        assert!(launch.score() > plain.score());
        assert_approx_eq!(f32, launch.factors().milestone, 1.0);
        assert_approx_eq!(f32, launch.factors().task_priority, 1.0);
    }

    #[test]
    fn test_dependency_proximity_decays_with_gap() {
        let ranked = rank(vec![
            task("base", 1, 3),
            task("near", 4, 5).with_dependencies([Id::new("base")]),
            task("far", 18, 20).with_dependencies([Id::new("near")]),
            task("alone", 25, 26),
        ]);
        let factor = |id: &str| {
            ranked
                .iter()
                .find(|p| p.task() == id)
                .unwrap()
                .factors()
                .dependency_proximity
        };

        // base and near touch with no empty day in between.
        assert_approx_eq!(f32, factor("base"), 1.0);
        assert_approx_eq!(f32, factor("near"), 1.0);
        // 12 empty days over a 7 day horizon.
        assert_approx_eq!(f32, factor("far"), 1.0 / (1.0 + 12.0 / 7.0));
        assert_approx_eq!(f32, factor("alone"), 0.0);
    }

    #[test]
    fn test_assignee_workload_saturates() {
        let tasks: Vec<_> = (1..=6)
            .map(|i| task(&format!("t{i}"), 1, 5).with_assignee(Id::new("ana")))
            .chain(std::iter::once(
                task("solo", 10, 12).with_assignee(Id::new("ben")),
            ))
            .collect();
        let ranked = rank(tasks);

        let workload = |id: &str| {
            ranked
                .iter()
                .find(|p| p.task() == id)
                .unwrap()
                .factors()
                .assignee_workload
        };
        assert_approx_eq!(f32, workload("t1"), 1.0);
        assert_approx_eq!(f32, workload("solo"), 0.25);
    }

    #[test]
    fn test_category_importance_and_custom_weights() {
        let weights = RankingWeights {
            conflict_severity: 0.0,
            task_priority: 0.0,
            milestone: 0.0,
            dependency_proximity: 0.0,
            assignee_workload: 0.0,
            category_importance: 1.0,
        };
        let config = RankingConfig::default()
            .with_weights(weights)
            .with_category_importance(Id::new("research"), 0.9);
        let tasks = vec![
            Task::new(Id::new("r"), "r", Id::new("research"), date(1), date(2)),
            task("g", 1, 2),
        ];
        let ranked = rank_with(tasks, &config);

        assert_approx_eq!(f32, ranked[1].score(), 0.9);
        assert_eq!(ranked[1].tier(), ProminenceTier::Critical);
        assert_approx_eq!(f32, ranked[0].score(), 0.5);
        assert_eq!(ranked[0].tier(), ProminenceTier::Medium);
    }

    #[test]
    fn test_tier_bands() {
        let thresholds = TierThresholds::default();
        assert_eq!(
            ProminenceTier::from_score(0.95, &thresholds),
            ProminenceTier::Critical
        );
        assert_eq!(
            ProminenceTier::from_score(0.6, &thresholds),
            ProminenceTier::High
        );
        assert_eq!(
            ProminenceTier::from_score(0.2, &thresholds),
            ProminenceTier::Low
        );
        assert_eq!(
            ProminenceTier::from_score(0.19, &thresholds),
            ProminenceTier::Minimal
        );
        assert!(ProminenceTier::Critical < ProminenceTier::Minimal);
    }

    #[test]
    fn test_ranking_is_repeatable() {
        let tasks = vec![
            task("x", 1, 9).with_priority(Priority::new(2)),
            task("y", 3, 12).with_assignee(Id::new("ana")),
            task("z", 8, 8).with_milestone(true),
        ];
        assert_eq!(rank(tasks.clone()), rank(tasks));
    }
}
