use std::fmt;

use serde::{Deserialize, Serialize};

/// Completion code an action reports to its processor.
///
/// `Success` lets the pipeline advance; every other variant halts it and is
/// surfaced as the terminal status of the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    #[default]
    Success,
    /// Unclassified failure, also used when an action drops its completer
    /// without reporting.
    Error,
    DownloadTransfer,
    PayloadHashMismatch,
    PayloadSizeMismatch,
    /// Source filesystem extent differs from the one the payload was built
    /// against.
    SourceSizeMismatch,
    /// Source partition digest differs from the one the payload was built
    /// against.
    SourceHashMismatch,
    FilesystemVerifier,
    NewRootfsVerification,
    NewKernelVerification,
    InstallDeviceOpen,
    InvalidInstallPlan,
    /// The run was stopped before the action finished.
    UserCanceled,
}

impl ErrorCode {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// True for codes raised by a digest comparison.
    #[must_use]
    pub fn is_hash_mismatch(self) -> bool {
        matches!(
            self,
            Self::PayloadHashMismatch
                | Self::SourceHashMismatch
                | Self::NewRootfsVerification
                | Self::NewKernelVerification
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::DownloadTransfer => "download_transfer",
            Self::PayloadHashMismatch => "payload_hash_mismatch",
            Self::PayloadSizeMismatch => "payload_size_mismatch",
            Self::SourceSizeMismatch => "source_size_mismatch",
            Self::SourceHashMismatch => "source_hash_mismatch",
            Self::FilesystemVerifier => "filesystem_verifier",
            Self::NewRootfsVerification => "new_rootfs_verification",
            Self::NewKernelVerification => "new_kernel_verification",
            Self::InstallDeviceOpen => "install_device_open",
            Self::InvalidInstallPlan => "invalid_install_plan",
            Self::UserCanceled => "user_canceled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
