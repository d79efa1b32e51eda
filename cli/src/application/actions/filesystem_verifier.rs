//! Partition hashing before download (source) and after apply (target).

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use slotup_common::{ErrorCode, InstallPlan};

use crate::application::actions::{deliver, run_blocking};
use crate::application::pipeline::{AbstractAction, Action, ActionCompleter, ActionPorts};
use crate::application::ports::PartitionIo;
use crate::domain::{
    EXT_SUPERBLOCK_END, HashError, ext_filesystem_size, require_source_paths,
    require_target_paths, sha256_prefix,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierMode {
    /// Record the extents and digests of the running kernel and rootfs.
    ComputeSourceHash,
    /// Check the freshly written partitions against the expected digests.
    VerifyTargetHash,
}

impl VerifierMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::ComputeSourceHash => "source",
            Self::VerifyTargetHash => "target",
        }
    }
}

pub struct FilesystemVerifierAction {
    mode: VerifierMode,
    partitions: Arc<dyn PartitionIo>,
    canceled: Arc<AtomicBool>,
    ports: ActionPorts<InstallPlan, InstallPlan>,
}

impl FilesystemVerifierAction {
    #[must_use]
    pub fn new(mode: VerifierMode, partitions: Arc<dyn PartitionIo>) -> Self {
        Self {
            mode,
            partitions,
            canceled: Arc::new(AtomicBool::new(false)),
            ports: ActionPorts::default(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> VerifierMode {
        self.mode
    }
}

impl AbstractAction for FilesystemVerifierAction {
    fn perform_action(&mut self, completer: ActionCompleter) {
        let Some(mut plan) = self.take_input_object() else {
            tracing::error!(mode = self.mode.as_str(), "no install plan on input pipe");
            completer.complete(ErrorCode::Error);
            return;
        };
        let mode = self.mode;
        let partitions = Arc::clone(&self.partitions);
        let canceled = Arc::clone(&self.canceled);
        let output = self.output_pipe();

        run_blocking(move || {
            let code = match verify(mode, partitions.as_ref(), &canceled, &mut plan) {
                Ok(()) => deliver(output, plan, "FilesystemVerifierAction"),
                Err(code) => code,
            };
            completer.complete(code);
        });
    }

    fn terminate_processing(&mut self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    fn type_name(&self) -> &'static str {
        "FilesystemVerifierAction"
    }
}

impl Action for FilesystemVerifierAction {
    type Input = InstallPlan;
    type Output = InstallPlan;

    fn ports(&self) -> &ActionPorts<InstallPlan, InstallPlan> {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut ActionPorts<InstallPlan, InstallPlan> {
        &mut self.ports
    }
}

/// Run one verifier pass over `plan`.
///
/// # Errors
///
/// Returns the completion code describing the first problem found.
pub fn verify(
    mode: VerifierMode,
    partitions: &dyn PartitionIo,
    canceled: &AtomicBool,
    plan: &mut InstallPlan,
) -> Result<(), ErrorCode> {
    match mode {
        VerifierMode::ComputeSourceHash => compute_source(partitions, canceled, plan),
        VerifierMode::VerifyTargetHash => verify_target(partitions, canceled, plan),
    }
}

fn compute_source(
    partitions: &dyn PartitionIo,
    canceled: &AtomicBool,
    plan: &mut InstallPlan,
) -> Result<(), ErrorCode> {
    if plan.is_full_update {
        tracing::info!("full update, source partitions not hashed");
        return Ok(());
    }
    require_source_paths(plan).map_err(|e| {
        tracing::error!(error = %e, "cannot hash source partitions");
        ErrorCode::InvalidInstallPlan
    })?;

    let rootfs_len = rootfs_extent(partitions, &plan.source_path)?;
    let kernel_len = partition_size(partitions, &plan.kernel_source_path)?;
    plan.source_rootfs_hash = hash_extent(partitions, &plan.source_path, rootfs_len, canceled)?;
    plan.source_kernel_hash =
        hash_extent(partitions, &plan.kernel_source_path, kernel_len, canceled)?;
    plan.rootfs_size = rootfs_len;
    plan.kernel_size = kernel_len;
    tracing::info!(
        rootfs_size = rootfs_len,
        rootfs = %hex::encode(&plan.source_rootfs_hash),
        kernel_size = kernel_len,
        kernel = %hex::encode(&plan.source_kernel_hash),
        "source partitions hashed"
    );
    Ok(())
}

fn partition_size(partitions: &dyn PartitionIo, path: &str) -> Result<u64, ErrorCode> {
    partitions.size(path).map_err(|e| {
        tracing::error!(path, error = %e, "cannot size source partition");
        ErrorCode::FilesystemVerifier
    })
}

/// Bytes of the source rootfs covered by its filesystem.
///
/// Falls back to the whole partition when no filesystem is recognized.
fn rootfs_extent(partitions: &dyn PartitionIo, path: &str) -> Result<u64, ErrorCode> {
    let size = partition_size(partitions, path)?;
    let mut head = Vec::with_capacity(EXT_SUPERBLOCK_END);
    partitions
        .open(path)
        .and_then(|reader| Ok(reader.take(EXT_SUPERBLOCK_END as u64).read_to_end(&mut head)?))
        .map_err(|e| {
            tracing::error!(path, error = %e, "cannot read source filesystem header");
            ErrorCode::FilesystemVerifier
        })?;

    match ext_filesystem_size(&head) {
        Some(fs_size) if fs_size > size => {
            tracing::error!(path, fs_size, size, "filesystem larger than its partition");
            Err(ErrorCode::FilesystemVerifier)
        }
        Some(fs_size) => Ok(fs_size),
        None => {
            tracing::debug!(path, size, "no filesystem recognized, hashing whole partition");
            Ok(size)
        }
    }
}

fn hash_extent(
    partitions: &dyn PartitionIo,
    path: &str,
    len: u64,
    canceled: &AtomicBool,
) -> Result<Vec<u8>, ErrorCode> {
    let read = || -> Result<Vec<u8>, HashError> {
        let reader = partitions
            .open(path)
            .map_err(|e| HashError::Io(std::io::Error::other(e)))?;
        sha256_prefix(reader, len, canceled)
    };
    read().map_err(|e| match e {
        HashError::Canceled => ErrorCode::UserCanceled,
        other => {
            tracing::error!(path, error = %other, "cannot hash source partition");
            ErrorCode::FilesystemVerifier
        }
    })
}

fn verify_target(
    partitions: &dyn PartitionIo,
    canceled: &AtomicBool,
    plan: &InstallPlan,
) -> Result<(), ErrorCode> {
    require_target_paths(plan).map_err(|e| {
        tracing::error!(error = %e, "cannot verify install partitions");
        ErrorCode::InvalidInstallPlan
    })?;

    check_prefix(
        partitions,
        &plan.install_path,
        plan.rootfs_size,
        &plan.rootfs_hash,
        canceled,
        ErrorCode::NewRootfsVerification,
    )?;
    check_prefix(
        partitions,
        &plan.kernel_install_path,
        plan.kernel_size,
        &plan.kernel_hash,
        canceled,
        ErrorCode::NewKernelVerification,
    )?;
    tracing::info!("install partitions verified");
    Ok(())
}

fn check_prefix(
    partitions: &dyn PartitionIo,
    path: &str,
    size: u64,
    expected: &[u8],
    canceled: &AtomicBool,
    mismatch: ErrorCode,
) -> Result<(), ErrorCode> {
    let reader = partitions.open(path).map_err(|e| {
        tracing::error!(path, error = %e, "cannot open install partition");
        ErrorCode::InstallDeviceOpen
    })?;
    match sha256_prefix(reader, size, canceled) {
        Ok(actual) if actual == expected => Ok(()),
        Ok(actual) => {
            tracing::error!(
                path,
                expected = %hex::encode(expected),
                actual = %hex::encode(actual),
                "install partition hash mismatch"
            );
            Err(mismatch)
        }
        Err(HashError::Canceled) => Err(ErrorCode::UserCanceled),
        Err(e) => {
            tracing::error!(path, error = %e, "cannot hash install partition");
            Err(mismatch)
        }
    }
}
