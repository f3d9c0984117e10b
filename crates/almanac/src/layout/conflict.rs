//! Rule-based conflict categorization.
//!
//! Each [`TaskOverlap`] is matched against a list of weighted
//! [`ConflictRule`]s. The matching rule with the highest weight decides the
//! [`ConflictCategory`]; equal weights go to the rule declared first. Pairs
//! that match no rule fall back to [`ConflictCategory::Schedule`]. The
//! categorizer is advisory: it never removes or merges tasks.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use almanac_core::span::DaySpan;

use crate::{
    layout::overlap::{OverlapType, Severity, TaskOverlap},
    structure::{AssigneeLoad, DependencyGraph, ScheduledTask, TaskSet},
};

/// Kind of conflict an overlap represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictCategory {
    Schedule,
    Resource,
    Dependency,
    Priority,
    Category,
    Assignee,
    Timeline,
    Workload,
    Deadline,
    Milestone,
}

impl ConflictCategory {
    pub const ALL: [ConflictCategory; 10] = [
        Self::Schedule,
        Self::Resource,
        Self::Dependency,
        Self::Priority,
        Self::Category,
        Self::Assignee,
        Self::Timeline,
        Self::Workload,
        Self::Deadline,
        Self::Milestone,
    ];

    /// The suggested resolution for conflicts of this category.
    pub fn resolution(self) -> Resolution {
        match self {
            Self::Schedule => Resolution::Stagger,
            Self::Resource | Self::Assignee => Resolution::Reassign,
            Self::Dependency => Resolution::Reorder,
            Self::Priority => Resolution::Reprioritize,
            Self::Category => Resolution::Merge,
            Self::Timeline => Resolution::Reschedule,
            Self::Workload => Resolution::Split,
            Self::Deadline | Self::Milestone => Resolution::Escalate,
        }
    }
}

/// Suggested action for resolving a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Reassign,
    Reschedule,
    Reorder,
    Reprioritize,
    Split,
    Merge,
    Stagger,
    Escalate,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reassign => "reassign",
            Self::Reschedule => "reschedule",
            Self::Reorder => "reorder",
            Self::Reprioritize => "reprioritize",
            Self::Split => "split",
            Self::Merge => "merge",
            Self::Stagger => "stagger",
            Self::Escalate => "escalate",
        };
        f.write_str(name)
    }
}

/// Condition of a [`ConflictRule`].
///
/// Configured as a table tagged by `kind`, e.g.
/// `predicate = { kind = "long_overlap", min_percentage = 0.7 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePredicate {
    /// Both tasks share an assignee and at least one day.
    SameAssignee,
    /// One task is declared a dependency of the other.
    DependencyEdge,
    /// Both tasks have the same start and end dates.
    IdenticalRange,
    /// At least one task is a milestone.
    Milestone,
    /// Both tasks have at least `min_priority`.
    BothHighPriority { min_priority: u8 },
    /// An assignee of either task has `min_concurrent` or more tasks
    /// running during the pair.
    AssigneeWorkload { min_concurrent: usize },
    /// Same category and at least `min_severity`.
    SameCategory { min_severity: Severity },
    /// The tasks end within `within_days` of each other.
    DeadlineCluster { within_days: u32 },
    /// The overlap covers at least `min_percentage` of the shorter task.
    LongOverlap { min_percentage: f32 },
    /// The overlap has the given type.
    OverlapKind { overlap_type: OverlapType },
}

/// A named, weighted predicate that maps matching overlaps to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRule {
    name: String,
    predicate: RulePredicate,
    category: ConflictCategory,
    weight: f32,
}

impl ConflictRule {
    pub fn new(
        name: impl Into<String>,
        predicate: RulePredicate,
        category: ConflictCategory,
        weight: f32,
    ) -> Self {
        Self {
            name: name.into(),
            predicate,
            category,
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> &RulePredicate {
        &self.predicate
    }

    pub fn category(&self) -> ConflictCategory {
        self.category
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    fn matches(&self, pair: &PairContext<'_, '_>) -> bool {
        let (a, b) = (pair.a.task(), pair.b.task());
        let overlap = pair.overlap;
        match &self.predicate {
            RulePredicate::SameAssignee => {
                overlap.overlap_days() > 0
                    && a.assignee().is_some()
                    && a.assignee() == b.assignee()
            }
            RulePredicate::DependencyEdge => pair.linked,
            RulePredicate::IdenticalRange => overlap.overlap_type() == OverlapType::Identical,
            RulePredicate::Milestone => a.is_milestone() || b.is_milestone(),
            RulePredicate::BothHighPriority { min_priority } => {
                a.priority().value() >= *min_priority && b.priority().value() >= *min_priority
            }
            RulePredicate::AssigneeWorkload { min_concurrent } => [a.assignee(), b.assignee()]
                .into_iter()
                .flatten()
                .any(|assignee| pair.load.concurrent(assignee, pair.hull()) >= *min_concurrent),
            RulePredicate::SameCategory { min_severity } => {
                a.category() == b.category() && overlap.severity() >= *min_severity
            }
            RulePredicate::DeadlineCluster { within_days } => {
                let apart = (pair.a.span().end() - pair.b.span().end()).num_days().abs();
                apart <= i64::from(*within_days)
            }
            RulePredicate::LongOverlap { min_percentage } => {
                overlap.overlap_percentage() >= *min_percentage
            }
            RulePredicate::OverlapKind { overlap_type } => overlap.overlap_type() == *overlap_type,
        }
    }
}

/// Resolution scores of a conflict, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConflictScores {
    pub risk: f32,
    pub urgency: f32,
    pub complexity: f32,
    pub impact: f32,
}

/// A categorized overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    overlap: TaskOverlap,
    category: ConflictCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<String>,
    resolution: Resolution,
    scores: ConflictScores,
}

impl ConflictRecord {
    pub fn overlap(&self) -> &TaskOverlap {
        &self.overlap
    }

    pub fn category(&self) -> ConflictCategory {
        self.category
    }

    /// Name of the rule that decided the category, `None` for the fallback.
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn scores(&self) -> ConflictScores {
        self.scores
    }
}

struct PairContext<'p, 'a> {
    a: &'p ScheduledTask<'a>,
    b: &'p ScheduledTask<'a>,
    overlap: &'p TaskOverlap,
    linked: bool,
    load: &'p AssigneeLoad,
}

impl PairContext<'_, '_> {
    /// Smallest span covering both tasks.
    fn hull(&self) -> DaySpan {
        let (a, b) = (self.a.span(), self.b.span());
        let start = a.start().min(b.start());
        let end = a.end().max(b.end());
        DaySpan::new(start, end).unwrap_or(a)
    }
}

/// Assigns categories, resolutions and scores to overlaps.
#[derive(Debug, Clone, Copy)]
pub struct ConflictCategorizer<'r> {
    rules: &'r [ConflictRule],
}

impl<'r> ConflictCategorizer<'r> {
    pub fn new(rules: &'r [ConflictRule]) -> Self {
        Self { rules }
    }

    /// Categorizes every overlap, keeping the input order.
    pub fn categorize_all(
        &self,
        overlaps: Vec<TaskOverlap>,
        tasks: &TaskSet<'_>,
        dependencies: &DependencyGraph,
        load: &AssigneeLoad,
    ) -> Vec<ConflictRecord> {
        let records: Vec<_> = overlaps
            .into_iter()
            .filter_map(|overlap| {
                let a = tasks.get(overlap.task_a())?;
                let b = tasks.get(overlap.task_b())?;
                let linked = dependencies.linked(a.id(), b.id());
                Some(self.categorize(overlap, a, b, linked, load))
            })
            .collect();
        debug!(conflicts = records.len(); "Conflicts categorized");
        records
    }

    /// Categorizes one overlap between tasks `a` and `b`.
    pub fn categorize(
        &self,
        overlap: TaskOverlap,
        a: &ScheduledTask<'_>,
        b: &ScheduledTask<'_>,
        linked: bool,
        load: &AssigneeLoad,
    ) -> ConflictRecord {
        let pair = PairContext {
            a,
            b,
            overlap: &overlap,
            linked,
            load,
        };

        let mut best: Option<&ConflictRule> = None;
        for rule in self.rules {
            if best.is_some_and(|current| rule.weight <= current.weight) {
                continue;
            }
            if rule.matches(&pair) {
                best = Some(rule);
            }
        }

        let category = best.map_or(ConflictCategory::Schedule, ConflictRule::category);
        let scores = score(&pair);
        trace!(
            task_a = a.id().to_string(),
            task_b = b.id().to_string(),
            category:?,
            rule = best.map(ConflictRule::name).unwrap_or("fallback");
            "Conflict categorized"
        );

        ConflictRecord {
            category,
            rule: best.map(|rule| rule.name.clone()),
            resolution: category.resolution(),
            scores,
            overlap,
        }
    }
}

/// Severity weight on a 1 to 5 scale, `None` counting as 1.
fn severity_weight(severity: Severity) -> u32 {
    match severity {
        Severity::None => 1,
        Severity::Low => 2,
        Severity::Medium => 3,
        Severity::High => 4,
        Severity::Critical => 5,
    }
}

fn ratio(raw: u32, max: u32) -> f32 {
    (raw as f32 / max as f32).min(1.0)
}

fn score(pair: &PairContext<'_, '_>) -> ConflictScores {
    let (a, b) = (pair.a.task(), pair.b.task());
    let overlap = pair.overlap;
    let severity = severity_weight(overlap.severity());
    let priorities = u32::from(a.priority().value()) + u32::from(b.priority().value());
    let same_assignee = a.assignee().is_some() && a.assignee() == b.assignee();
    let same_category = a.category() == b.category();
    let milestone = a.is_milestone() || b.is_milestone();
    let dependency_count = a.dependencies().len() + b.dependencies().len();

    let mut impact = severity + priorities;
    impact += match overlap.overlap_days() {
        days if days > 7 => 2,
        days if days > 3 => 1,
        _ => 0,
    };
    impact += if same_assignee { 3 } else { 0 };
    impact += u32::from(same_category);
    impact += if milestone { 2 } else { 0 };

    let ends_apart = (pair.a.span().end() - pair.b.span().end()).num_days().abs();
    let mut risk = severity;
    risk += if ends_apart <= 7 { 3 } else { 0 };
    risk += if a.priority().value() >= 4 || b.priority().value() >= 4 {
        2
    } else {
        0
    };
    risk += if milestone { 2 } else { 0 };
    risk += u32::from(dependency_count > 0);

    let lead = (pair.a.span().start() - pair.b.span().start()).num_days().abs();
    let mut urgency = severity + priorities;
    urgency += match lead {
        0..=3 => 3,
        4..=7 => 2,
        8..=14 => 1,
        _ => 0,
    };

    let mut complexity = match overlap.overlap_type() {
        OverlapType::Identical => 3,
        OverlapType::Nested | OverlapType::Complete => 2,
        _ => 1,
    };
    complexity += u32::try_from(dependency_count.min(4)).unwrap_or(4);
    complexity += if same_assignee { 2 } else { 0 };
    complexity += u32::from(same_category);

    ConflictScores {
        risk: ratio(risk, 13),
        urgency: ratio(urgency, 18),
        complexity: ratio(complexity, 10),
        impact: ratio(impact, 23),
    }
}
