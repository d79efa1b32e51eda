//! The record describing one update attempt.
//!
//! An `InstallPlan` is moved from stage to stage down the action pipeline.
//! The record performs no validation; each stage checks the fields it needs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters and accumulated results of a single update attempt.
///
/// The partition size and hash fields are filled progressively:
///
/// 1. The source filesystem verifier records the filesystem extent of the
///    partitions currently in use in `kernel_size` and `rootfs_size`, and
///    their digests in `source_kernel_hash` and `source_rootfs_hash`.
/// 2. The download stage checks those sizes and digests against the ones
///    the payload was built from, then replaces `kernel_size` and
///    `rootfs_size` with the expected sizes of the applied partitions and
///    records the expected `kernel_hash` and `rootfs_hash`.
/// 3. The target filesystem verifier recomputes the applied partition
///    hashes and compares them with step 2.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallPlan {
    pub is_resume: bool,
    pub is_full_update: bool,
    /// URL the payload is fetched from.
    pub download_url: String,
    /// Version being installed.
    pub version: String,

    /// Size in bytes of the payload document as fetched; 0 skips the check.
    pub payload_size: u64,
    /// SHA-256 of the payload document as fetched, hex; empty skips the check.
    pub payload_hash: String,
    /// Metadata size in bytes.
    pub metadata_size: u64,
    pub metadata_signature: String,
    /// Device receiving the new rootfs.
    pub install_path: String,
    /// Device receiving the new kernel.
    pub kernel_install_path: String,
    /// Rootfs device currently booted.
    pub source_path: String,
    /// Kernel device currently booted.
    pub kernel_source_path: String,

    /// Kernel extent in bytes: of the source partition until the download
    /// stage runs, of the applied partition afterwards.
    pub kernel_size: u64,
    /// Rootfs filesystem extent in bytes, with the same hand-over as
    /// `kernel_size`.
    pub rootfs_size: u64,
    #[serde(with = "hex::serde")]
    pub kernel_hash: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub rootfs_hash: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub source_kernel_hash: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub source_rootfs_hash: Vec<u8>,

    /// When set, any digest mismatch fails the attempt.
    pub hash_checks_mandatory: bool,
    /// Wipe stateful data on the next boot. Consumed after reboot.
    pub powerwash_required: bool,

    /// Base64 PEM public key sent with the update, overriding the built-in
    /// key when not empty.
    pub public_key_rsa: String,
}

impl InstallPlan {
    /// Builds a plan from the values known before the pipeline starts.
    ///
    /// Everything not passed here keeps its `Default` value: empty
    /// `version`, zero sizes, empty hashes and cleared policy flags.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    #[must_use]
    pub fn new(
        is_resume: bool,
        is_full_update: bool,
        url: &str,
        payload_size: u64,
        payload_hash: &str,
        metadata_size: u64,
        metadata_signature: &str,
        install_path: &str,
        kernel_install_path: &str,
        source_path: &str,
        kernel_source_path: &str,
        public_key_rsa: &str,
    ) -> Self {
        Self {
            is_resume,
            is_full_update,
            download_url: url.to_string(),
            payload_size,
            payload_hash: payload_hash.to_string(),
            metadata_size,
            metadata_signature: metadata_signature.to_string(),
            install_path: install_path.to_string(),
            kernel_install_path: kernel_install_path.to_string(),
            source_path: source_path.to_string(),
            kernel_source_path: kernel_source_path.to_string(),
            public_key_rsa: public_key_rsa.to_string(),
            ..Self::default()
        }
    }

    /// Logs every field at info level.
    pub fn dump(&self) {
        tracing::info!("{self}");
    }
}

impl fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "InstallPlan:")?;
        writeln!(f, "  is_resume: {}", self.is_resume)?;
        writeln!(f, "  is_full_update: {}", self.is_full_update)?;
        writeln!(f, "  download_url: {}", self.download_url)?;
        writeln!(f, "  version: {}", self.version)?;
        writeln!(f, "  payload_size: {}", self.payload_size)?;
        writeln!(f, "  payload_hash: {}", self.payload_hash)?;
        writeln!(f, "  metadata_size: {}", self.metadata_size)?;
        writeln!(f, "  metadata_signature: {}", self.metadata_signature)?;
        writeln!(f, "  install_path: {}", self.install_path)?;
        writeln!(f, "  kernel_install_path: {}", self.kernel_install_path)?;
        writeln!(f, "  source_path: {}", self.source_path)?;
        writeln!(f, "  kernel_source_path: {}", self.kernel_source_path)?;
        writeln!(f, "  kernel_size: {}", self.kernel_size)?;
        writeln!(f, "  rootfs_size: {}", self.rootfs_size)?;
        writeln!(f, "  kernel_hash: {}", hex::encode(&self.kernel_hash))?;
        writeln!(f, "  rootfs_hash: {}", hex::encode(&self.rootfs_hash))?;
        writeln!(f, "  source_kernel_hash: {}", hex::encode(&self.source_kernel_hash))?;
        writeln!(f, "  source_rootfs_hash: {}", hex::encode(&self.source_rootfs_hash))?;
        writeln!(f, "  hash_checks_mandatory: {}", self.hash_checks_mandatory)?;
        writeln!(f, "  powerwash_required: {}", self.powerwash_required)?;
        write!(f, "  public_key_rsa: {}", self.public_key_rsa)
    }
}
