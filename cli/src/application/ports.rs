//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `slotup_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.
//!
//! Ports consumed by actions and variables are `Send + Sync`: actions move
//! them onto blocking tasks and variables are read from any thread.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use slotup_common::{InstallPlan, PayloadManifest, SlotupConfig};

// ── Hardware Port ─────────────────────────────────────────────────────────────

/// Read-only device state backing the system provider's variables.
///
/// Implementations must answer promptly; a reading that cannot be taken
/// returns an error rather than waiting on the hardware.
pub trait HardwareInterface: Send + Sync {
    /// Device the running rootfs was booted from, e.g. `/dev/sda3`. Links
    /// such as `/dev/mapper/*` are resolved to their `/dev/dm-N` node.
    fn boot_device(&self) -> Result<String>;
    /// Whether the running image is an official (signed, non-debug) build.
    fn is_official_build(&self) -> Result<bool>;
    /// Whether the device booted with developer mode off.
    fn is_normal_boot_mode(&self) -> Result<bool>;
    /// Whether out-of-box setup has completed.
    fn is_oobe_complete(&self) -> Result<bool>;
    /// Whether the whole disk `disk` (e.g. `sda`, `dm-0`) is removable media.
    /// A device-mapper target counts as removable when a disk beneath it is.
    fn is_removable_device(&self, disk: &str) -> Result<bool>;
}

// ── Partition Port ────────────────────────────────────────────────────────────

/// Access to partitions named in an `InstallPlan`.
pub trait PartitionIo: Send + Sync {
    /// Size of the partition in bytes.
    fn size(&self, path: &str) -> Result<u64>;
    /// Open the partition for sequential reading from offset zero.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>>;
}

// ── Payload Port ──────────────────────────────────────────────────────────────

/// A payload manifest together with the size and digest of the document
/// it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    pub manifest: PayloadManifest,
    /// Bytes read from the payload location.
    pub size: u64,
    /// SHA-256 of exactly those bytes.
    pub sha256: Vec<u8>,
}

/// Where payloads come from and how they land on the install partitions.
pub trait PayloadSource: Send + Sync {
    /// Fetch and parse the manifest at `plan.download_url`.
    fn fetch(&self, plan: &InstallPlan) -> Result<FetchedManifest>;
    /// Write the new kernel and rootfs onto the plan's install partitions.
    fn apply(&self, plan: &InstallPlan, manifest: &PayloadManifest) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when none exists.
    fn load(&self) -> Result<SlotupConfig>;
    /// Persist the configuration.
    fn save(&self, config: &SlotupConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
