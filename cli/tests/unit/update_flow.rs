//! Whole update attempts through the four-stage pipeline.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use slotup_cli::application::pipeline::ProcessingOutcome;
use slotup_cli::application::ports::{FetchedManifest, PartitionIo, PayloadSource};
use slotup_cli::application::services::apply::{apply_update, build_pipeline};
use slotup_common::{ErrorCode, InstallPlan, PayloadManifest};
use tokio::sync::Notify;

use crate::mocks::{
    FakePayloadSource, MemPartitions, NEW_KERNEL, NEW_ROOTFS, RecordingDelegate,
    RecordingReporter, delta_manifest, delta_plan, device, ext_image, fetched, info_for, sha256,
};

/// Runs the pipeline without a tokio runtime, so every stage completes
/// before `start_processing` returns.
fn run_inline(
    plan: InstallPlan,
    partitions: Arc<MemPartitions>,
    payloads: Arc<dyn PayloadSource>,
) -> (ProcessingOutcome, Option<InstallPlan>) {
    let pipeline = build_pipeline(plan, partitions, payloads).unwrap();
    let delegate = Arc::new(RecordingDelegate::default());
    pipeline.processor.set_delegate(delegate.clone());
    pipeline.processor.start_processing().unwrap();
    let outcome = delegate.last_outcome().expect("terminal status");
    (outcome, pipeline.result.take())
}

#[test]
fn delta_update_writes_and_verifies() {
    let partitions = device();
    let payloads = Arc::new(FakePayloadSource::new(
        delta_manifest(),
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, plan) = run_inline(delta_plan(true), Arc::clone(&partitions), payloads.clone());

    assert!(outcome.is_success(), "{outcome:?}");
    let plan = plan.expect("final plan");
    assert_eq!(plan.source_rootfs_hash, info_for(crate::mocks::SOURCE_ROOTFS).hash);
    assert_eq!(plan.rootfs_hash, sha256(NEW_ROOTFS));
    assert_eq!(plan.kernel_size, NEW_KERNEL.len() as u64);
    assert_eq!(partitions.read("/dev/sda5").unwrap(), NEW_ROOTFS);
    assert_eq!(payloads.applied(), 1);
}

#[test]
fn source_mismatch_halts_before_target_verification() {
    let partitions = device();
    let mut manifest = delta_manifest();
    manifest.old_rootfs_info = Some(info_for(b"RUNNING ROOTFS IMAGE"));
    let payloads = Arc::new(FakePayloadSource::new(
        manifest,
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, plan) = run_inline(delta_plan(true), Arc::clone(&partitions), payloads.clone());

    assert_eq!(outcome.code, ErrorCode::SourceHashMismatch);
    assert!(outcome.code.is_hash_mismatch());
    assert_eq!(outcome.failed_action, Some("DownloadAction"));
    assert!(plan.is_none());
    assert_eq!(payloads.applied(), 0);
    let opened = partitions.opened();
    assert!(opened.contains(&"/dev/sda3".to_string()));
    assert!(!opened.contains(&"/dev/sda5".to_string()), "{opened:?}");
    assert!(!opened.contains(&"/dev/sda4".to_string()), "{opened:?}");
}

#[test]
fn source_mismatch_tolerated_without_mandatory_checks() {
    let partitions = device();
    let mut manifest = delta_manifest();
    manifest.old_rootfs_info = Some(info_for(b"RUNNING ROOTFS IMAGE"));
    let payloads = Arc::new(FakePayloadSource::new(
        manifest,
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, _) = run_inline(delta_plan(false), partitions, payloads);
    assert!(outcome.is_success(), "{outcome:?}");
}

#[test]
fn source_rootfs_slack_is_outside_the_checked_extent() {
    let filesystem = ext_image(8, 0x5a);
    let mut partition = filesystem.clone();
    partition.extend_from_slice(&[0xee; 64]);
    let partitions = device();
    partitions.write("/dev/sda3", &partition);

    let mut manifest = delta_manifest();
    manifest.old_rootfs_info = Some(info_for(&filesystem));
    let payloads = Arc::new(FakePayloadSource::new(
        manifest,
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, plan) = run_inline(delta_plan(true), Arc::clone(&partitions), payloads);
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(plan.unwrap().source_rootfs_hash, sha256(&filesystem));
}

#[test]
fn source_extent_differing_from_manifest_halts() {
    let partitions = device();
    let mut manifest = delta_manifest();
    manifest.old_rootfs_info = Some(info_for(b"running rootfs image plus"));
    let payloads = Arc::new(FakePayloadSource::new(
        manifest,
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, _) = run_inline(delta_plan(true), partitions, payloads.clone());
    assert_eq!(outcome.code, ErrorCode::SourceSizeMismatch);
    assert_eq!(outcome.failed_action, Some("DownloadAction"));
    assert_eq!(payloads.applied(), 0);
}

#[test]
fn payload_document_digest_gates_the_write() {
    let document = fetched(&delta_manifest());
    let plan = InstallPlan {
        payload_size: document.size,
        payload_hash: hex::encode(&document.sha256),
        ..delta_plan(true)
    };
    let partitions = device();
    let payloads = Arc::new(FakePayloadSource::new(
        delta_manifest(),
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));
    let (outcome, _) = run_inline(plan.clone(), Arc::clone(&partitions), payloads);
    assert!(outcome.is_success(), "{outcome:?}");

    let tampered = InstallPlan {
        payload_hash: "deadbeef".into(),
        ..plan
    };
    let partitions = device();
    let payloads = Arc::new(FakePayloadSource::new(
        delta_manifest(),
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));
    let (outcome, _) = run_inline(tampered, Arc::clone(&partitions), payloads.clone());
    assert_eq!(outcome.code, ErrorCode::PayloadHashMismatch);
    assert_eq!(payloads.applied(), 0);
    assert_eq!(partitions.read("/dev/sda5").unwrap(), b"stale rootfs");
}

#[test]
fn corrupted_write_fails_target_verification() {
    let partitions = device();
    let payloads = Arc::new(FakePayloadSource::new(
        delta_manifest(),
        b"bit-flipped rootfs image, a little longer",
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));

    let (outcome, plan) = run_inline(delta_plan(true), partitions, payloads);
    assert_eq!(outcome.code, ErrorCode::NewRootfsVerification);
    assert_eq!(outcome.failed_action, Some("FilesystemVerifierAction"));
    assert!(plan.is_none());
}

#[test]
fn full_update_skips_source_partitions() {
    let partitions = Arc::new(
        MemPartitions::default()
            .with("/dev/sda5", b"")
            .with("/dev/sda4", b""),
    );
    let manifest = PayloadManifest {
        new_rootfs_info: info_for(NEW_ROOTFS),
        new_kernel_info: info_for(NEW_KERNEL),
        ..PayloadManifest::default()
    };
    let payloads = Arc::new(FakePayloadSource::new(
        manifest,
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));
    let plan = InstallPlan {
        is_full_update: true,
        source_path: String::new(),
        kernel_source_path: String::new(),
        ..delta_plan(true)
    };

    let (outcome, _) = run_inline(plan, Arc::clone(&partitions), payloads);
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(partitions.opened(), ["/dev/sda5", "/dev/sda4"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn apply_update_reports_each_stage() {
    let partitions = device();
    let payloads = Arc::new(FakePayloadSource::new(
        delta_manifest(),
        NEW_ROOTFS,
        NEW_KERNEL,
        Arc::clone(&partitions),
    ));
    let reporter = RecordingReporter::default();

    let result = apply_update(
        delta_plan(true),
        partitions,
        payloads,
        &reporter,
        std::future::pending(),
    )
    .await
    .unwrap();

    assert!(result.outcome.is_success());
    assert!(!result.stopped);
    assert_eq!(result.plan.unwrap().rootfs_hash, sha256(NEW_ROOTFS));
    let lines = reporter.lines.lock().unwrap();
    let finished = lines.iter().filter(|l| l.starts_with("ok: ")).count();
    assert_eq!(finished, 4, "{lines:?}");
}

/// Blocks in `fetch` until released, announcing when it got there.
struct StallingSource {
    entered: Arc<Notify>,
    release: Mutex<mpsc::Receiver<()>>,
    applied: Mutex<bool>,
}

impl PayloadSource for StallingSource {
    fn fetch(&self, _plan: &InstallPlan) -> Result<FetchedManifest> {
        self.entered.notify_one();
        let _ = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5));
        Ok(fetched(&delta_manifest()))
    }

    fn apply(&self, _plan: &InstallPlan, _manifest: &PayloadManifest) -> Result<()> {
        *self.applied.lock().unwrap() = true;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_the_running_stage() {
    let partitions = device();
    let entered = Arc::new(Notify::new());
    let (release_tx, release_rx) = mpsc::channel();
    let source = Arc::new(StallingSource {
        entered: Arc::clone(&entered),
        release: Mutex::new(release_rx),
        applied: Mutex::new(false),
    });
    let reporter = RecordingReporter::default();
    let shutdown = {
        let entered = Arc::clone(&entered);
        async move { entered.notified().await }
    };

    let result = apply_update(
        delta_plan(true),
        Arc::clone(&partitions) as Arc<dyn PartitionIo>,
        source.clone(),
        &reporter,
        shutdown,
    )
    .await
    .unwrap();

    assert!(result.stopped);
    assert_eq!(result.outcome.code, ErrorCode::UserCanceled);
    assert_eq!(result.outcome.failed_action, Some("DownloadAction"));
    assert!(result.plan.is_none());

    release_tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!*source.applied.lock().unwrap());
    assert!(!partitions.opened().contains(&"/dev/sda5".to_string()));
}
