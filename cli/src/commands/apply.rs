//! Apply command: run the update pipeline for one install plan.

use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;
use serde_json::json;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::apply::{ApplyOutcome, apply_update, prepare_plan};
use crate::commands::PlanArgs;
use crate::domain::UpdateError;
use crate::infra::{FilePartitionIo, LocalPayloadSource, load_install_plan};
use crate::output::TerminalReporter;

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if the plan or configuration cannot be loaded, or if
/// the update does not finish successfully.
pub async fn run(app: &AppContext, args: &PlanArgs) -> Result<()> {
    let config = app.config_store.load()?;
    let plan = prepare_plan(load_install_plan(&args.plan)?, &config.policy);
    plan.dump();

    let reporter = TerminalReporter::new(&app.output);
    let result = apply_update(
        plan,
        Arc::new(FilePartitionIo),
        Arc::new(LocalPayloadSource),
        &reporter,
        interrupted(),
    )
    .await
    .context("update attempt aborted")?;
    reporter.finish();

    report(app, &result)?;
    match update_error(&result) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// How an attempt that did not succeed is reported to the caller.
#[must_use]
pub fn update_error(result: &ApplyOutcome) -> Option<UpdateError> {
    let outcome = &result.outcome;
    if outcome.is_success() {
        return None;
    }
    match outcome.failed_action {
        Some(action) if !result.stopped => Some(UpdateError::Failed {
            code: outcome.code,
            action,
        }),
        action => Some(UpdateError::Stopped { action }),
    }
}

fn report(app: &AppContext, result: &ApplyOutcome) -> Result<()> {
    if app.is_json() {
        let value = json!({
            "success": result.outcome.is_success(),
            "code": result.outcome.code,
            "failed_action": result.outcome.failed_action,
            "stopped": result.stopped,
            "plan": result.plan,
        });
        let text = serde_json::to_string_pretty(&value).context("JSON serialization failed")?;
        println!("{text}");
        return Ok(());
    }

    let code = result.outcome.code;
    if result.outcome.is_success() {
        app.output.success("update applied and verified");
    } else if result.stopped {
        app.output.warn("update stopped before completion");
    } else if !app.output.quiet {
        let stage = result.outcome.failed_action.unwrap_or("-");
        app.output.kv(
            &format!("{:<14}", "failed stage"),
            &stage.style(app.output.styles.outcome(code)).to_string(),
        );
    }
    if !app.output.quiet {
        app.output.kv(
            &format!("{:<14}", "result"),
            &code.style(app.output.styles.outcome(code)).to_string(),
        );
    }
    Ok(())
}
