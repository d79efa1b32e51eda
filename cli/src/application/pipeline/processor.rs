//! Sequential driver for a queue of actions.
//!
//! The processor runs one action at a time, in queue order. Each action gets
//! an `ActionCompleter`; reporting `Success` through it starts the next
//! action, any other code halts the run. The terminal status goes to the
//! delegate.
//!
//! All state lives behind one mutex that is never held while calling into an
//! action or the delegate, so actions may complete synchronously from inside
//! `perform_action` or later from any thread. A synchronous completion is
//! recorded and picked up by the dispatch loop once `perform_action`
//! returns, which keeps long pipelines of synchronous stages from recursing.
//!
//! Every `start_processing` begins a new run. Dispatch loops and completion
//! handling carry the run they belong to and stand down once it is no
//! longer current, so a callback that stops and restarts the processor
//! never has its new run advanced or ended by the old one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use slotup_common::ErrorCode;

use crate::application::pipeline::action::AbstractAction;
use crate::domain::error::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Idle,
    Running,
}

/// Terminal status of one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub code: ErrorCode,
    /// Type of the action that reported `code`; `None` on success.
    pub failed_action: Option<&'static str>,
}

impl ProcessingOutcome {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            failed_action: None,
        }
    }

    #[must_use]
    pub fn failure(code: ErrorCode, action: &'static str) -> Self {
        Self {
            code,
            failed_action: Some(action),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// Receives the processor's notifications. Called without the processor's
/// lock held, so implementations may call back into the processor.
pub trait ActionProcessorDelegate: Send + Sync {
    /// The queue ran to completion or an action failed.
    fn processing_done(&self, outcome: ProcessingOutcome);

    /// `stop_processing` ended the run. `processing_done` is not called.
    fn processing_stopped(&self) {}

    /// An action's completion has been handled.
    fn action_completed(&self, _action_type: &'static str, _code: ErrorCode) {}
}

struct ActiveAction {
    ticket: u64,
    type_name: &'static str,
    /// `None` while `perform_action` runs on the dispatching thread.
    action: Option<Box<dyn AbstractAction>>,
    /// Completion reported while `action` was checked out.
    early_completion: Option<ErrorCode>,
}

struct Inner {
    state: ProcessorState,
    queue: VecDeque<Box<dyn AbstractAction>>,
    active: Option<ActiveAction>,
    next_ticket: u64,
    /// Generation of the current or most recent run.
    run: u64,
    delegate: Option<Arc<dyn ActionProcessorDelegate>>,
}

impl Inner {
    fn is_current(&self, run: u64) -> bool {
        self.state == ProcessorState::Running && self.run == run
    }
}

struct Shared {
    inner: Mutex<Inner>,
}

/// Runs a queue of actions, one per update attempt.
pub struct ActionProcessor {
    shared: Arc<Shared>,
}

impl ActionProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: ProcessorState::Idle,
                    queue: VecDeque::new(),
                    active: None,
                    next_ticket: 0,
                    run: 0,
                    delegate: None,
                }),
            }),
        }
    }

    pub fn set_delegate(&self, delegate: Arc<dyn ActionProcessorDelegate>) {
        self.shared.lock().delegate = Some(delegate);
    }

    /// Append an action to the queue.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` while a run is in progress.
    pub fn enqueue_action(&self, action: impl AbstractAction + 'static) -> Result<(), ProcessorError> {
        let mut inner = self.shared.lock();
        if inner.state == ProcessorState::Running {
            return Err(ProcessorError::AlreadyRunning);
        }
        inner.queue.push_back(Box::new(action));
        Ok(())
    }

    /// Start the first queued action and return once it has been dispatched.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if a run is in progress and `NoActions` if
    /// the queue is empty.
    pub fn start_processing(&self) -> Result<(), ProcessorError> {
        let run = {
            let mut inner = self.shared.lock();
            if inner.state == ProcessorState::Running {
                return Err(ProcessorError::AlreadyRunning);
            }
            if inner.queue.is_empty() {
                return Err(ProcessorError::NoActions);
            }
            inner.state = ProcessorState::Running;
            inner.run += 1;
            tracing::info!(run = inner.run, actions = inner.queue.len(), "starting processing");
            inner.run
        };
        self.shared.dispatch(run);
        Ok(())
    }

    /// Abort the run: the active action is asked to terminate, queued actions
    /// are dropped, and the processor is idle when this returns. A completion
    /// the active action reports afterwards is ignored.
    pub fn stop_processing(&self) {
        let (action, delegate) = {
            let mut inner = self.shared.lock();
            if inner.state != ProcessorState::Running {
                return;
            }
            inner.state = ProcessorState::Idle;
            inner.queue.clear();
            let active = inner.active.take();
            if let Some(active) = &active {
                tracing::info!(action = active.type_name, "stopping processing");
            }
            (active.and_then(|a| a.action), inner.delegate.clone())
        };
        // A checked-out action is terminated by the dispatch loop instead.
        if let Some(mut action) = action {
            action.terminate_processing();
        }
        if let Some(delegate) = delegate {
            delegate.processing_stopped();
        }
    }

    #[must_use]
    pub fn state(&self) -> ProcessorState {
        self.shared.lock().state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == ProcessorState::Running
    }

    /// Type of the action currently running, if any.
    #[must_use]
    pub fn current_action_type(&self) -> Option<&'static str> {
        self.shared.lock().active.as_ref().map(|a| a.type_name)
    }
}

impl Default for ActionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start queued actions of `run` until one completes asynchronously, one
    /// fails, the queue empties, or the run is no longer current.
    fn dispatch(self: &Arc<Self>, run: u64) {
        loop {
            let (mut action, completer) = {
                let mut inner = self.lock();
                if !inner.is_current(run) {
                    return;
                }
                let Some(action) = inner.queue.pop_front() else {
                    inner.state = ProcessorState::Idle;
                    let delegate = inner.delegate.clone();
                    drop(inner);
                    tracing::info!("all actions completed");
                    if let Some(delegate) = delegate {
                        delegate.processing_done(ProcessingOutcome::success());
                    }
                    return;
                };
                let ticket = inner.next_ticket;
                inner.next_ticket += 1;
                let type_name = action.type_name();
                inner.active = Some(ActiveAction {
                    ticket,
                    type_name,
                    action: None,
                    early_completion: None,
                });
                let completer = ActionCompleter {
                    shared: Some(Arc::downgrade(self)),
                    ticket,
                    run,
                    action_type: type_name,
                };
                (action, completer)
            };

            let ticket = completer.ticket;
            tracing::debug!(action = action.type_name(), "performing action");
            action.perform_action(completer);

            let mut inner = self.lock();
            let still_active = inner.active.as_ref().is_some_and(|a| a.ticket == ticket);
            if !still_active {
                drop(inner);
                action.terminate_processing();
                return;
            }
            let early = inner
                .active
                .as_mut()
                .and_then(|a| a.early_completion.take());
            let Some(code) = early else {
                // Completion will arrive later through the completer.
                if let Some(active) = inner.active.as_mut() {
                    active.action = Some(action);
                }
                return;
            };
            inner.active = None;
            drop(inner);
            if !self.finish(action, code, run) {
                return;
            }
        }
    }

    /// Handle a completed action of `run`. Returns whether dispatch should
    /// continue.
    fn finish(&self, mut action: Box<dyn AbstractAction>, code: ErrorCode, run: u64) -> bool {
        let type_name = action.type_name();
        action.action_completed(code);
        drop(action);

        let delegate = {
            let inner = self.lock();
            if !inner.is_current(run) {
                tracing::debug!(action = type_name, %code, run, "run ended during completion");
                return false;
            }
            inner.delegate.clone()
        };
        if let Some(delegate) = &delegate {
            delegate.action_completed(type_name, code);
        }

        if code.is_success() {
            tracing::info!(action = type_name, "action succeeded");
            return true;
        }

        tracing::warn!(action = type_name, %code, "action failed, halting pipeline");
        {
            let mut inner = self.lock();
            if !inner.is_current(run) {
                return false;
            }
            inner.state = ProcessorState::Idle;
            inner.queue.clear();
        }
        if let Some(delegate) = delegate {
            delegate.processing_done(ProcessingOutcome::failure(code, type_name));
        }
        false
    }
}

/// One-shot completion report for a single action run.
///
/// Holds only a weak reference: reports arriving after the processor is
/// dropped, or after the run was stopped or moved on, are ignored.
pub struct ActionCompleter {
    shared: Option<Weak<Shared>>,
    ticket: u64,
    run: u64,
    action_type: &'static str,
}

impl ActionCompleter {
    /// Report the action's result to the processor.
    pub fn complete(mut self, code: ErrorCode) {
        self.report(code);
    }

    fn report(&mut self, code: ErrorCode) {
        let Some(weak) = self.shared.take() else {
            return;
        };
        let Some(shared) = weak.upgrade() else {
            tracing::debug!(action = self.action_type, %code, "processor gone, completion dropped");
            return;
        };

        let action = {
            let mut inner = shared.lock();
            let Some(active) = inner.active.as_mut().filter(|a| a.ticket == self.ticket) else {
                tracing::debug!(action = self.action_type, %code, "stale completion ignored");
                return;
            };
            match active.action.take() {
                None => {
                    active.early_completion = Some(code);
                    return;
                }
                Some(action) => {
                    inner.active = None;
                    action
                }
            }
        };

        if shared.finish(action, code, self.run) {
            shared.dispatch(self.run);
        }
    }
}

impl Drop for ActionCompleter {
    fn drop(&mut self) {
        if self.shared.is_some() {
            tracing::error!(action = self.action_type, "action dropped its completer without reporting");
            self.report(ErrorCode::Error);
        }
    }
}
