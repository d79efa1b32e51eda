//! Application service: run one update attempt through the action pipeline.
//!
//! Imports only from `crate::domain`, `crate::application::ports` and the
//! pipeline modules. All device I/O is routed through injected port traits.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use slotup_common::{ErrorCode, InstallPlan, PolicyConfig};
use tokio::sync::mpsc;

use crate::application::actions::{
    DownloadAction, FilesystemVerifierAction, InstallPlanAction, VerifierMode,
};
use crate::application::pipeline::{
    Action, ActionPipe, ActionProcessor, ActionProcessorDelegate, ProcessingOutcome, bond_actions,
};
use crate::application::ports::{PartitionIo, PayloadSource, ProgressReporter};

// ── Processor events ──────────────────────────────────────────────────────────

/// Processor notifications forwarded to the async caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
    ActionCompleted {
        action: &'static str,
        code: ErrorCode,
    },
    Done(ProcessingOutcome),
    Stopped,
}

/// Delegate that forwards every notification onto a channel.
pub struct ChannelDelegate {
    tx: mpsc::UnboundedSender<ProcessorEvent>,
}

impl ChannelDelegate {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ProcessorEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: ProcessorEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("processor event dropped, receiver gone");
        }
    }
}

impl ActionProcessorDelegate for ChannelDelegate {
    fn processing_done(&self, outcome: ProcessingOutcome) {
        self.send(ProcessorEvent::Done(outcome));
    }

    fn processing_stopped(&self) {
        self.send(ProcessorEvent::Stopped);
    }

    fn action_completed(&self, action: &'static str, code: ErrorCode) {
        self.send(ProcessorEvent::ActionCompleted { action, code });
    }
}

// ── Pipeline assembly ─────────────────────────────────────────────────────────

/// A queued update pipeline and the pipe its final plan lands in.
pub struct UpdatePipeline {
    pub processor: ActionProcessor,
    pub result: ActionPipe<InstallPlan>,
}

/// Queue plan → source verify → download → target verify.
///
/// # Errors
///
/// Returns an error if the processor refuses an action.
pub fn build_pipeline(
    plan: InstallPlan,
    partitions: Arc<dyn PartitionIo>,
    payloads: Arc<dyn PayloadSource>,
) -> Result<UpdatePipeline> {
    let mut head = InstallPlanAction::new(plan);
    let mut source =
        FilesystemVerifierAction::new(VerifierMode::ComputeSourceHash, Arc::clone(&partitions));
    let mut download = DownloadAction::new(payloads);
    let mut target = FilesystemVerifierAction::new(VerifierMode::VerifyTargetHash, partitions);

    bond_actions(&mut head, &mut source);
    bond_actions(&mut source, &mut download);
    bond_actions(&mut download, &mut target);
    let result = ActionPipe::new();
    target.set_output_pipe(result.clone());

    let processor = ActionProcessor::new();
    processor.enqueue_action(head)?;
    processor.enqueue_action(source)?;
    processor.enqueue_action(download)?;
    processor.enqueue_action(target)?;
    Ok(UpdatePipeline { processor, result })
}

/// Apply device policy to a plan before it enters the pipeline.
#[must_use]
pub fn prepare_plan(mut plan: InstallPlan, policy: &PolicyConfig) -> InstallPlan {
    plan.hash_checks_mandatory |= policy.hash_checks_mandatory;
    plan
}

// ── Apply service ─────────────────────────────────────────────────────────────

/// Terminal status of an update attempt.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub outcome: ProcessingOutcome,
    /// Whether the run ended through `shutdown` rather than completion.
    pub stopped: bool,
    /// The plan as the last stage handed it on; only set on success.
    pub plan: Option<InstallPlan>,
}

/// Run the update pipeline for `plan` until it finishes or `shutdown`
/// resolves, reporting each completed stage.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be built or started. Stage
/// failures are not errors; they are reported in `ApplyOutcome`.
pub async fn apply_update(
    plan: InstallPlan,
    partitions: Arc<dyn PartitionIo>,
    payloads: Arc<dyn PayloadSource>,
    reporter: &impl ProgressReporter,
    shutdown: impl Future<Output = ()>,
) -> Result<ApplyOutcome> {
    let UpdatePipeline { processor, result } = build_pipeline(plan, partitions, payloads)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    processor.set_delegate(Arc::new(ChannelDelegate::new(tx)));

    reporter.step("applying update...");
    processor
        .start_processing()
        .context("cannot start update pipeline")?;

    tokio::pin!(shutdown);
    let mut stopping = false;
    let mut interrupted = None;

    loop {
        tokio::select! {
            () = &mut shutdown, if !stopping => {
                stopping = true;
                interrupted = processor.current_action_type();
                reporter.warn("interrupt received, stopping update");
                processor.stop_processing();
            }
            event = rx.recv() => match event {
                Some(ProcessorEvent::ActionCompleted { action, code }) => {
                    if code.is_success() {
                        reporter.success(&format!("{action} finished"));
                    } else {
                        reporter.warn(&format!("{action} failed: {code}"));
                    }
                }
                Some(ProcessorEvent::Done(outcome)) => {
                    let plan = if outcome.is_success() { result.take() } else { None };
                    return Ok(ApplyOutcome { outcome, stopped: false, plan });
                }
                Some(ProcessorEvent::Stopped) => {
                    let outcome = ProcessingOutcome {
                        code: ErrorCode::UserCanceled,
                        failed_action: interrupted,
                    };
                    return Ok(ApplyOutcome { outcome, stopped: true, plan: None });
                }
                None => bail!("update pipeline closed without a terminal status"),
            }
        }
    }
}
