//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// A/B partition OS updater
#[derive(Parser)]
#[command(
    name = "slotup",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file [default: /etc/slotup/config.yaml]
    #[arg(long, global = true, env = "SLOTUP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download, write and verify an update described by an install plan
    Apply(commands::PlanArgs),

    /// Show or change device configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show every field of an install plan
    Plan(commands::PlanArgs),

    /// Show the policy variables of this device
    Status,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            no_color,
            quiet,
            json,
            config,
        });
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Plan(args) => commands::plan::run(&app, &args),
            Command::Status => commands::status::run(&app),
            Command::Apply(args) => commands::apply::run(&app, &args).await,
        }
    }
}
