//! CLI logic for the Almanac calendar layout tool.
//!
//! Reads a plan file, lays its tasks out on the plan's calendar window and
//! writes the resulting layout as TOML.

pub mod error_adapter;
pub mod plan;

mod args;
mod config;

pub use args::Args;
pub use config::ConfigError;

use std::fs;

use log::{info, warn};
use thiserror::Error;

use almanac::{AlmanacError, LayoutBuilder};

use plan::{Plan, PlanError};

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Almanac(#[from] AlmanacError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Run the Almanac CLI application
///
/// This function reads the plan file, computes its layout and writes the
/// result to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Plan parsing errors
/// - Invalid engine configuration
/// - Serialization errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing plan"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input).map_err(AlmanacError::from)?;
    let plan = Plan::from_toml(&source)?;
    let grid = plan.grid(*app_config.layout().geometry())?;

    let builder = LayoutBuilder::new(app_config);
    let layout = builder.compute(plan.tasks(), &grid)?;

    for warning in layout.warnings() {
        warn!(task = warning.task_id().to_string(); "{warning}");
    }

    let output =
        toml::to_string(&layout).map_err(|e| AlmanacError::Serialization(e.to_string()))?;
    fs::write(&args.output, output).map_err(AlmanacError::from)?;

    info!(
        output_file = args.output,
        bars = layout.bars().len(),
        overflow = layout.stats().total_overflow;
        "Layout exported successfully"
    );

    Ok(())
}
