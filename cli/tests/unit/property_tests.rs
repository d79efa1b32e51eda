//! Property-based tests for the processor and disk naming.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use proptest::prelude::*;
use slotup_cli::application::pipeline::{ActionProcessor, ProcessorState};
use slotup_cli::domain::disk_name;
use slotup_common::ErrorCode;

use crate::mocks::{RecordingAction, RecordingDelegate, Trace};

const FAILURES: [ErrorCode; 4] = [
    ErrorCode::Error,
    ErrorCode::DownloadTransfer,
    ErrorCode::SourceHashMismatch,
    ErrorCode::NewKernelVerification,
];

proptest! {
    /// Actions run in order up to and including the first failure, and the
    /// terminal status is that failure.
    #[test]
    fn prop_first_failure_wins(
        len in 1usize..10,
        fail_at in proptest::option::of(0usize..10),
        failure in proptest::sample::select(FAILURES.to_vec()),
    ) {
        let processor = ActionProcessor::new();
        let delegate = Arc::new(RecordingDelegate::default());
        processor.set_delegate(delegate.clone());
        let trace = Trace::default();
        let fail_at = fail_at.filter(|k| *k < len);

        for index in 0..len {
            let code = if Some(index) == fail_at { failure } else { ErrorCode::Success };
            processor
                .enqueue_action(RecordingAction { index, code, trace: Arc::clone(&trace) })
                .unwrap();
        }
        processor.start_processing().unwrap();

        let last = fail_at.unwrap_or(len - 1);
        prop_assert_eq!(trace.lock().unwrap().clone(), (0..=last).collect::<Vec<_>>());
        let outcome = delegate.last_outcome().unwrap();
        prop_assert_eq!(outcome.code, fail_at.map_or(ErrorCode::Success, |_| failure));
        prop_assert_eq!(delegate.done.lock().unwrap().len(), 1);
        prop_assert_eq!(processor.state(), ProcessorState::Idle);
    }

    /// Any `/dev/sdXN` partition maps to its whole disk.
    #[test]
    fn prop_letter_disks(disk in "[a-z]{2,3}", part in 1u32..64) {
        let device = format!("/dev/{disk}{part}");
        prop_assert_eq!(disk_name(&device), Some(disk));
    }

    /// Any `/dev/mmcblkNpM` partition maps to `mmcblkN`.
    #[test]
    fn prop_mmc_disks(n in 0u32..8, part in 1u32..16) {
        let device = format!("/dev/mmcblk{n}p{part}");
        prop_assert_eq!(disk_name(&device), Some(format!("mmcblk{n}")));
    }
}
