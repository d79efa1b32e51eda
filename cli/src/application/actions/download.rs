//! Payload fetch and apply.
//!
//! Cross-checks the fetched payload document and the manifest it carries
//! against what the plan and the source verifier recorded, fills the expected post-apply sizes and hashes,
//! then writes the new images onto the install partitions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use slotup_common::{ErrorCode, InstallPlan, PartitionInfo};

use crate::application::actions::{deliver, run_blocking};
use crate::application::pipeline::{AbstractAction, Action, ActionCompleter, ActionPorts};
use crate::application::ports::{FetchedManifest, PayloadSource};
use crate::domain::{digest_matches, require_target_paths};

pub struct DownloadAction {
    source: Arc<dyn PayloadSource>,
    canceled: Arc<AtomicBool>,
    ports: ActionPorts<InstallPlan, InstallPlan>,
}

impl DownloadAction {
    #[must_use]
    pub fn new(source: Arc<dyn PayloadSource>) -> Self {
        Self {
            source,
            canceled: Arc::new(AtomicBool::new(false)),
            ports: ActionPorts::default(),
        }
    }
}

impl AbstractAction for DownloadAction {
    fn perform_action(&mut self, completer: ActionCompleter) {
        let Some(mut plan) = self.take_input_object() else {
            tracing::error!("no install plan on input pipe");
            completer.complete(ErrorCode::Error);
            return;
        };
        let source = Arc::clone(&self.source);
        let canceled = Arc::clone(&self.canceled);
        let output = self.output_pipe();

        run_blocking(move || {
            let code = match download(source.as_ref(), &canceled, &mut plan) {
                Ok(()) => deliver(output, plan, "DownloadAction"),
                Err(code) => code,
            };
            completer.complete(code);
        });
    }

    fn terminate_processing(&mut self) {
        tracing::info!("download canceled");
        self.canceled.store(true, Ordering::Relaxed);
    }

    fn type_name(&self) -> &'static str {
        "DownloadAction"
    }
}

impl Action for DownloadAction {
    type Input = InstallPlan;
    type Output = InstallPlan;

    fn ports(&self) -> &ActionPorts<InstallPlan, InstallPlan> {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut ActionPorts<InstallPlan, InstallPlan> {
        &mut self.ports
    }
}

/// Fetch, cross-check and apply the payload for `plan`.
///
/// # Errors
///
/// Returns the completion code for the first fatal problem.
pub fn download(
    source: &dyn PayloadSource,
    canceled: &AtomicBool,
    plan: &mut InstallPlan,
) -> Result<(), ErrorCode> {
    require_target_paths(plan).map_err(|e| {
        tracing::error!(error = %e, "refusing to download");
        ErrorCode::InvalidInstallPlan
    })?;

    let fetched = source.fetch(plan).map_err(|e| {
        tracing::error!(url = %plan.download_url, error = %e, "cannot fetch payload manifest");
        ErrorCode::DownloadTransfer
    })?;
    let manifest = &fetched.manifest;
    tracing::info!(
        version = %manifest.version,
        delta = manifest.is_delta(),
        bytes = fetched.size,
        "payload manifest fetched"
    );

    check_payload(plan, &fetched)?;
    if !plan.is_full_update {
        check_source(
            plan,
            manifest.old_rootfs_info.as_ref(),
            plan.rootfs_size,
            &plan.source_rootfs_hash,
            "rootfs",
        )?;
        check_source(
            plan,
            manifest.old_kernel_info.as_ref(),
            plan.kernel_size,
            &plan.source_kernel_hash,
            "kernel",
        )?;
    }

    plan.rootfs_size = manifest.new_rootfs_info.size;
    plan.rootfs_hash.clone_from(&manifest.new_rootfs_info.hash);
    plan.kernel_size = manifest.new_kernel_info.size;
    plan.kernel_hash.clone_from(&manifest.new_kernel_info.hash);

    if canceled.load(Ordering::Relaxed) {
        return Err(ErrorCode::UserCanceled);
    }
    source.apply(plan, manifest).map_err(|e| {
        tracing::error!(error = %e, "cannot write payload");
        ErrorCode::DownloadTransfer
    })?;
    if canceled.load(Ordering::Relaxed) {
        return Err(ErrorCode::UserCanceled);
    }

    tracing::info!(
        rootfs_size = plan.rootfs_size,
        kernel_size = plan.kernel_size,
        "payload applied"
    );
    Ok(())
}

/// Fatal under mandatory hash checks, a warning otherwise.
fn mismatch(plan: &InstallPlan, code: ErrorCode, what: &str) -> Result<(), ErrorCode> {
    if plan.hash_checks_mandatory {
        tracing::error!(%code, "{what}");
        return Err(code);
    }
    tracing::warn!(%code, "{what}, tolerated because hash checks are not mandatory");
    Ok(())
}

fn check_payload(plan: &InstallPlan, fetched: &FetchedManifest) -> Result<(), ErrorCode> {
    if plan.payload_size != 0 && plan.payload_size != fetched.size {
        mismatch(
            plan,
            ErrorCode::PayloadSizeMismatch,
            &format!(
                "payload size {} differs from expected {}",
                fetched.size, plan.payload_size
            ),
        )?;
    }
    if !plan.payload_hash.is_empty() && !digest_matches(&plan.payload_hash, &fetched.sha256) {
        mismatch(
            plan,
            ErrorCode::PayloadHashMismatch,
            &format!(
                "payload hash {} differs from expected {}",
                hex::encode(&fetched.sha256),
                plan.payload_hash
            ),
        )?;
    }
    Ok(())
}

/// Checks the recorded source extent and digest of one partition.
fn check_source(
    plan: &InstallPlan,
    expected: Option<&PartitionInfo>,
    recorded_size: u64,
    recorded_hash: &[u8],
    partition: &str,
) -> Result<(), ErrorCode> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if expected.size != recorded_size {
        return mismatch(
            plan,
            ErrorCode::SourceSizeMismatch,
            &format!(
                "source {partition} size {recorded_size} differs from expected {}",
                expected.size
            ),
        );
    }
    if expected.hash == recorded_hash {
        return Ok(());
    }
    mismatch(
        plan,
        ErrorCode::SourceHashMismatch,
        &format!(
            "source {partition} hash {} differs from expected {}",
            hex::encode(recorded_hash),
            hex::encode(&expected.hash)
        ),
    )
}
