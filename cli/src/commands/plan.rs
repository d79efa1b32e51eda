//! Plan command: load an install plan and print every field.

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::commands::PlanArgs;
use crate::infra::load_install_plan;

/// Run the plan command.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded.
pub fn run(app: &AppContext, args: &PlanArgs) -> Result<()> {
    let plan = load_install_plan(&args.plan)?;
    plan.dump();

    if app.is_json() {
        let text = serde_json::to_string_pretty(&plan).context("JSON serialization failed")?;
        println!("{text}");
    } else if !app.output.quiet {
        println!("{plan}");
    }
    Ok(())
}
