//! Concrete pipeline stages for one update attempt.
//!
//! Stages that touch partitions or fetch payloads do their work off the
//! dispatching thread when a tokio runtime is available, and report through
//! their `ActionCompleter` from there.

pub mod download;
pub mod filesystem_verifier;
pub mod install_plan_action;

pub use download::DownloadAction;
pub use filesystem_verifier::{FilesystemVerifierAction, VerifierMode};
pub use install_plan_action::InstallPlanAction;

use slotup_common::ErrorCode;

use crate::application::pipeline::ActionPipe;

/// Run `work` on tokio's blocking pool when inside a runtime, inline
/// otherwise.
fn run_blocking<F>(work: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            // Completion travels through the completer, not the join handle.
            drop(handle.spawn_blocking(work));
        }
        Err(_) => work(),
    }
}

/// Hand `value` to the next stage and return the stage's completion code.
fn deliver<T>(pipe: Option<ActionPipe<T>>, value: T, action: &'static str) -> ErrorCode {
    let Some(pipe) = pipe else {
        return ErrorCode::Success;
    };
    match pipe.set(value) {
        Ok(()) => ErrorCode::Success,
        Err(e) => {
            tracing::error!(action, error = %e, "cannot hand result to next stage");
            ErrorCode::Error
        }
    }
}
