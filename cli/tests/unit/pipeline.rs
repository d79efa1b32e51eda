//! Processor behaviour seen from outside the crate.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use slotup_cli::application::pipeline::{
    ActionProcessor, ProcessingOutcome, ProcessorState,
};
use slotup_cli::domain::ProcessorError;
use slotup_common::ErrorCode;

use crate::mocks::{ParkingAction, RecordingAction, RecordingDelegate, Trace};

fn processor() -> (ActionProcessor, Arc<RecordingDelegate>, Trace) {
    let processor = ActionProcessor::new();
    let delegate = Arc::new(RecordingDelegate::default());
    processor.set_delegate(delegate.clone());
    (processor, delegate, Trace::default())
}

#[test]
fn succeeding_actions_complete_in_declared_order() {
    let (processor, delegate, trace) = processor();
    for index in 0..5 {
        processor
            .enqueue_action(RecordingAction {
                index,
                code: ErrorCode::Success,
                trace: Arc::clone(&trace),
            })
            .unwrap();
    }

    processor.start_processing().unwrap();

    assert_eq!(*trace.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(delegate.completions.lock().unwrap().len(), 5);
    assert_eq!(delegate.last_outcome(), Some(ProcessingOutcome::success()));
    assert_eq!(processor.state(), ProcessorState::Idle);
}

#[test]
fn failing_action_stops_successors() {
    let (processor, delegate, trace) = processor();
    let codes = [
        ErrorCode::Success,
        ErrorCode::FilesystemVerifier,
        ErrorCode::Success,
    ];
    for (index, code) in codes.into_iter().enumerate() {
        processor
            .enqueue_action(RecordingAction {
                index,
                code,
                trace: Arc::clone(&trace),
            })
            .unwrap();
    }

    processor.start_processing().unwrap();

    assert_eq!(*trace.lock().unwrap(), vec![0, 1]);
    let outcome = delegate.last_outcome().expect("terminal status");
    assert_eq!(outcome.code, ErrorCode::FilesystemVerifier);
    assert_eq!(outcome.failed_action, Some("RecordingAction"));
    assert_eq!(delegate.done.lock().unwrap().len(), 1);
}

#[test]
fn stop_during_second_of_three() {
    let (processor, delegate, trace) = processor();
    let parked = Arc::new(Mutex::new(None));
    let terminated = Arc::new(Mutex::new(false));

    processor
        .enqueue_action(RecordingAction {
            index: 0,
            code: ErrorCode::Success,
            trace: Arc::clone(&trace),
        })
        .unwrap();
    processor
        .enqueue_action(ParkingAction {
            index: 1,
            trace: Arc::clone(&trace),
            parked: Arc::clone(&parked),
            terminated: Arc::clone(&terminated),
        })
        .unwrap();
    processor
        .enqueue_action(RecordingAction {
            index: 2,
            code: ErrorCode::Success,
            trace: Arc::clone(&trace),
        })
        .unwrap();

    processor.start_processing().unwrap();
    assert!(processor.is_running());

    processor.stop_processing();
    assert_eq!(processor.state(), ProcessorState::Idle);
    assert!(*terminated.lock().unwrap());
    assert_eq!(*delegate.stopped.lock().unwrap(), 1);

    let late = parked.lock().unwrap().take().expect("parked completer");
    late.complete(ErrorCode::Success);

    assert_eq!(*trace.lock().unwrap(), vec![0, 1]);
    assert!(delegate.done.lock().unwrap().is_empty());
    assert_eq!(processor.state(), ProcessorState::Idle);
}

#[test]
fn control_surface_rejections() {
    let (processor, _, trace) = processor();
    assert_eq!(processor.start_processing(), Err(ProcessorError::NoActions));

    let parked = Arc::new(Mutex::new(None));
    processor
        .enqueue_action(ParkingAction {
            index: 0,
            trace,
            parked: Arc::clone(&parked),
            terminated: Arc::default(),
        })
        .unwrap();
    processor.start_processing().unwrap();
    assert_eq!(
        processor.start_processing(),
        Err(ProcessorError::AlreadyRunning)
    );
    assert_eq!(processor.current_action_type(), Some("ParkingAction"));

    parked
        .lock()
        .unwrap()
        .take()
        .expect("parked completer")
        .complete(ErrorCode::Success);
    assert!(!processor.is_running());
}
