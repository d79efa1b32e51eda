//! The capability set every pipeline stage implements.
//!
//! `AbstractAction` is the object-safe half the processor drives through
//! `Box<dyn AbstractAction>`. `Action` adds the compile-time input and output
//! payload types, which is what makes `bond_actions` reject mismatched
//! neighbours.

use slotup_common::ErrorCode;

use crate::application::pipeline::pipe::ActionPipe;
use crate::application::pipeline::processor::ActionCompleter;
use crate::domain::error::PipeError;

/// Type-erased stage as seen by the processor.
pub trait AbstractAction: Send {
    /// Begin the stage's work.
    ///
    /// The stage reports its result through `completer`, either before
    /// returning or later from background work. A completer dropped without
    /// a report counts as `ErrorCode::Error`.
    fn perform_action(&mut self, completer: ActionCompleter);

    /// Best-effort request to stop in-flight work early.
    fn terminate_processing(&mut self) {}

    /// Called once the processor has handled this stage's completion.
    fn action_completed(&mut self, _code: ErrorCode) {}

    /// Name used in logs and in the terminal status of a failed run.
    fn type_name(&self) -> &'static str;
}

/// Input and output pipe slots of a typed action.
pub struct ActionPorts<I, O> {
    input: Option<ActionPipe<I>>,
    output: Option<ActionPipe<O>>,
}

impl<I, O> Default for ActionPorts<I, O> {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
        }
    }
}

/// A stage with fixed payload types.
///
/// Stages with nothing to consume or produce use `()`.
pub trait Action: AbstractAction {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn ports(&self) -> &ActionPorts<Self::Input, Self::Output>;
    fn ports_mut(&mut self) -> &mut ActionPorts<Self::Input, Self::Output>;

    fn set_input_pipe(&mut self, pipe: ActionPipe<Self::Input>) {
        self.ports_mut().input = Some(pipe);
    }

    fn set_output_pipe(&mut self, pipe: ActionPipe<Self::Output>) {
        self.ports_mut().output = Some(pipe);
    }

    fn has_input_object(&self) -> bool {
        self.ports()
            .input
            .as_ref()
            .is_some_and(ActionPipe::has_contents)
    }

    /// Take the payload handed over by the previous stage.
    fn take_input_object(&mut self) -> Option<Self::Input> {
        self.ports().input.as_ref().and_then(ActionPipe::take)
    }

    fn has_output_pipe(&self) -> bool {
        self.ports().output.is_some()
    }

    /// Producer end of the output pipe, for stages that finish on another
    /// thread.
    fn output_pipe(&self) -> Option<ActionPipe<Self::Output>> {
        self.ports().output.clone()
    }

    /// Hand `value` to the next stage. Without an output pipe the value is
    /// dropped, which is not an error.
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Occupied` if the output pipe still holds an
    /// earlier payload.
    fn set_output_object(&mut self, value: Self::Output) -> Result<(), PipeError> {
        match &self.ports().output {
            Some(pipe) => pipe.set(value),
            None => Ok(()),
        }
    }
}
