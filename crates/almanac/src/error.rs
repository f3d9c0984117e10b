//! Error types for Almanac operations.
//!
//! Two kinds of failure exist. [`AlmanacError`] is fatal and stops a layout
//! run before any computation starts. [`InvalidTaskError`] is a warning: the
//! offending task is dropped and the run continues with the rest.

use std::io;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use almanac_core::identifier::Id;

/// The main error type for Almanac operations.
#[derive(Debug, Error)]
pub enum AlmanacError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Invalid engine configuration.
///
/// Any of these invalidates every downstream guarantee, so they are reported
/// before grouping starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_tracks_per_day must be at least 1, got {0}")]
    InvalidMaxTracks(usize),

    #[error("ranking weights must sum to 1.0, got {sum:.3}")]
    InvalidWeights { sum: f32 },

    #[error("ranking weight `{name}` must be a finite non-negative number, got {value}")]
    NegativeWeight { name: &'static str, value: f32 },

    #[error("conflict rule `{name}` has weight {weight}, expected a value in [0, 1]")]
    InvalidRuleWeight { name: String, weight: f32 },

    #[error("invalid prominence thresholds: {0}")]
    InvalidThresholds(String),

    #[error("importance of `{category}` must lie in [0, 1], got {value}")]
    InvalidCategoryImportance { category: String, value: f32 },

    #[error("workload_saturation must be at least 1")]
    InvalidWorkloadSaturation,

    #[error("dependency_horizon_days must be at least 1")]
    InvalidDependencyHorizon,

    #[error("invalid cell geometry: {0}")]
    InvalidGeometry(String),

    #[error("grid snap resolution must be positive, got {0}")]
    InvalidSnapResolution(f32),

    #[error("invalid color for `{key}`: {reason}")]
    InvalidColor { key: String, reason: String },
}

/// A task that cannot be laid out. The task is dropped, the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidTaskError {
    #[error("task `{id}` ends on {end} before it starts on {start}")]
    EndBeforeStart {
        id: Id,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("task `{id}` ({start} to {end}) lies outside the calendar window")]
    OutsideWindow {
        id: Id,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("task id `{id}` is used more than once; later copies are ignored")]
    DuplicateId { id: Id },
}

impl InvalidTaskError {
    /// Id of the dropped task.
    pub fn task_id(&self) -> Id {
        match self {
            Self::EndBeforeStart { id, .. }
            | Self::OutsideWindow { id, .. }
            | Self::DuplicateId { id } => *id,
        }
    }
}
