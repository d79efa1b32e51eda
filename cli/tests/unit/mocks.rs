//! Shared test doubles for the unit tests.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use mockall::mock;
use sha2::{Digest, Sha256};
use slotup_cli::application::pipeline::{
    AbstractAction, ActionCompleter, ActionProcessorDelegate, ProcessingOutcome,
};
use slotup_cli::application::ports::{
    FetchedManifest, HardwareInterface, PartitionIo, PayloadSource, ProgressReporter,
};
use slotup_common::{ErrorCode, InstallPlan, PartitionInfo, PayloadManifest};

// ── Hardware ──────────────────────────────────────────────────────────────────

mock! {
    pub Hardware {}

    impl HardwareInterface for Hardware {
        fn boot_device(&self) -> Result<String>;
        fn is_official_build(&self) -> Result<bool>;
        fn is_normal_boot_mode(&self) -> Result<bool>;
        fn is_oobe_complete(&self) -> Result<bool>;
        fn is_removable_device(&self, disk: &str) -> Result<bool>;
    }
}

// ── Partitions ────────────────────────────────────────────────────────────────

/// In-memory partitions that remember every open.
#[derive(Default)]
pub struct MemPartitions {
    contents: Mutex<HashMap<String, Vec<u8>>>,
    opened: Mutex<Vec<String>>,
}

impl MemPartitions {
    pub fn with(self, path: &str, bytes: &[u8]) -> Self {
        self.write(path, bytes);
        self
    }

    pub fn write(&self, path: &str, bytes: &[u8]) {
        self.contents
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.contents.lock().unwrap().get(path).cloned()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl PartitionIo for MemPartitions {
    fn size(&self, path: &str) -> Result<u64> {
        self.read(path)
            .map(|b| b.len() as u64)
            .ok_or_else(|| anyhow!("no such partition: {path}"))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        self.opened.lock().unwrap().push(path.to_string());
        let bytes = self
            .read(path)
            .ok_or_else(|| anyhow!("no such partition: {path}"))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Serves one manifest and writes its images into `MemPartitions`.
pub struct FakePayloadSource {
    pub manifest: PayloadManifest,
    pub rootfs: Vec<u8>,
    pub kernel: Vec<u8>,
    pub partitions: Arc<MemPartitions>,
    pub applied: Mutex<usize>,
}

impl FakePayloadSource {
    pub fn new(
        manifest: PayloadManifest,
        rootfs: &[u8],
        kernel: &[u8],
        partitions: Arc<MemPartitions>,
    ) -> Self {
        Self {
            manifest,
            rootfs: rootfs.to_vec(),
            kernel: kernel.to_vec(),
            partitions,
            applied: Mutex::new(0),
        }
    }

    pub fn applied(&self) -> usize {
        *self.applied.lock().unwrap()
    }
}

impl PayloadSource for FakePayloadSource {
    fn fetch(&self, _plan: &InstallPlan) -> Result<FetchedManifest> {
        Ok(fetched(&self.manifest))
    }

    fn apply(&self, plan: &InstallPlan, _manifest: &PayloadManifest) -> Result<()> {
        self.partitions.write(&plan.install_path, &self.rootfs);
        self.partitions.write(&plan.kernel_install_path, &self.kernel);
        *self.applied.lock().unwrap() += 1;
        Ok(())
    }
}

/// The manifest as it would arrive serialized as JSON.
pub fn fetched(manifest: &PayloadManifest) -> FetchedManifest {
    let document = serde_json::to_vec(manifest).unwrap();
    FetchedManifest {
        manifest: manifest.clone(),
        size: document.len() as u64,
        sha256: sha256(&document),
    }
}

pub fn sha256(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

pub fn info_for(bytes: &[u8]) -> PartitionInfo {
    PartitionInfo {
        size: bytes.len() as u64,
        hash: sha256(bytes),
    }
}

// ── Scenario fixture ──────────────────────────────────────────────────────────

pub const SOURCE_ROOTFS: &[u8] = b"running rootfs image";
pub const SOURCE_KERNEL: &[u8] = b"running kernel";
pub const NEW_ROOTFS: &[u8] = b"next rootfs image, a little longer";
pub const NEW_KERNEL: &[u8] = b"next kernel";

/// An ext2 filesystem of `blocks` 1 KiB blocks filled with `fill`.
pub fn ext_image(blocks: u32, fill: u8) -> Vec<u8> {
    let mut image = vec![fill; blocks as usize * 1024];
    let sb = &mut image[1024..];
    sb[0x04..0x08].copy_from_slice(&blocks.to_le_bytes());
    sb[0x18..0x1c].copy_from_slice(&0u32.to_le_bytes());
    sb[0x38..0x3a].copy_from_slice(&0xEF53u16.to_le_bytes());
    image
}

pub fn delta_plan(mandatory: bool) -> InstallPlan {
    InstallPlan {
        download_url: "file:///srv/update.json".into(),
        version: "2.0.0".into(),
        source_path: "/dev/sda3".into(),
        kernel_source_path: "/dev/sda2".into(),
        install_path: "/dev/sda5".into(),
        kernel_install_path: "/dev/sda4".into(),
        hash_checks_mandatory: mandatory,
        ..InstallPlan::default()
    }
}

pub fn device() -> Arc<MemPartitions> {
    Arc::new(
        MemPartitions::default()
            .with("/dev/sda3", SOURCE_ROOTFS)
            .with("/dev/sda2", SOURCE_KERNEL)
            .with("/dev/sda5", b"stale rootfs")
            .with("/dev/sda4", b"stale kernel"),
    )
}

pub fn delta_manifest() -> PayloadManifest {
    PayloadManifest {
        version: "2.0.0".into(),
        old_rootfs_info: Some(info_for(SOURCE_ROOTFS)),
        old_kernel_info: Some(info_for(SOURCE_KERNEL)),
        new_rootfs_info: info_for(NEW_ROOTFS),
        new_kernel_info: info_for(NEW_KERNEL),
        ..PayloadManifest::default()
    }
}

// ── Pipeline doubles ──────────────────────────────────────────────────────────

pub type Trace = Arc<Mutex<Vec<usize>>>;

/// Records its index and completes synchronously with a fixed code.
pub struct RecordingAction {
    pub index: usize,
    pub code: ErrorCode,
    pub trace: Trace,
}

impl AbstractAction for RecordingAction {
    fn perform_action(&mut self, completer: ActionCompleter) {
        self.trace.lock().unwrap().push(self.index);
        completer.complete(self.code);
    }

    fn type_name(&self) -> &'static str {
        "RecordingAction"
    }
}

/// Keeps its completer for the test to report through later.
pub struct ParkingAction {
    pub index: usize,
    pub trace: Trace,
    pub parked: Arc<Mutex<Option<ActionCompleter>>>,
    pub terminated: Arc<Mutex<bool>>,
}

impl AbstractAction for ParkingAction {
    fn perform_action(&mut self, completer: ActionCompleter) {
        self.trace.lock().unwrap().push(self.index);
        *self.parked.lock().unwrap() = Some(completer);
    }

    fn terminate_processing(&mut self) {
        *self.terminated.lock().unwrap() = true;
    }

    fn type_name(&self) -> &'static str {
        "ParkingAction"
    }
}

#[derive(Default)]
pub struct RecordingDelegate {
    pub done: Mutex<Vec<ProcessingOutcome>>,
    pub stopped: Mutex<usize>,
    pub completions: Mutex<Vec<(&'static str, ErrorCode)>>,
}

impl RecordingDelegate {
    pub fn last_outcome(&self) -> Option<ProcessingOutcome> {
        self.done.lock().unwrap().last().copied()
    }
}

impl ActionProcessorDelegate for RecordingDelegate {
    fn processing_done(&self, outcome: ProcessingOutcome) {
        self.done.lock().unwrap().push(outcome);
    }

    fn processing_stopped(&self) {
        *self.stopped.lock().unwrap() += 1;
    }

    fn action_completed(&self, action_type: &'static str, code: ErrorCode) {
        self.completions.lock().unwrap().push((action_type, code));
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warn: {message}"));
    }
}
