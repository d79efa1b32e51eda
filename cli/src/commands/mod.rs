//! Command implementations

pub mod apply;
pub mod config;
pub mod plan;
pub mod status;
pub mod version;

use std::path::PathBuf;

use clap::Args;

/// Arguments shared by commands that take an install plan.
#[derive(Args)]
pub struct PlanArgs {
    /// Install plan file (YAML or JSON)
    #[arg(long, short)]
    pub plan: PathBuf,
}
