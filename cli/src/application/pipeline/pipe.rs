//! Typed conduit between two adjacent actions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::pipeline::action::Action;
use crate::domain::error::PipeError;

/// Holds at most one payload of type `T` between the producer setting it and
/// the consumer taking it.
///
/// Clones share the same slot: the producer keeps one end, the consumer the
/// other.
pub struct ActionPipe<T> {
    contents: Arc<Mutex<Option<T>>>,
}

impl<T> ActionPipe<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            contents: Arc::new(Mutex::new(None)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<T>> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place a payload in the pipe.
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Occupied` if the previous payload has not been
    /// taken yet; the pipe keeps the earlier payload.
    pub fn set(&self, value: T) -> Result<(), PipeError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(PipeError::Occupied);
        }
        *slot = Some(value);
        Ok(())
    }

    /// Remove and return the payload, if any.
    #[must_use]
    pub fn take(&self) -> Option<T> {
        self.slot().take()
    }

    #[must_use]
    pub fn has_contents(&self) -> bool {
        self.slot().is_some()
    }
}

impl<T> Clone for ActionPipe<T> {
    fn clone(&self) -> Self {
        Self {
            contents: Arc::clone(&self.contents),
        }
    }
}

impl<T> Default for ActionPipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Connect `producer`'s output to `consumer`'s input.
///
/// The consumer's input type must be the producer's output type; anything
/// else does not compile:
///
/// ```
/// use slotup_cli::application::actions::InstallPlanAction;
/// use slotup_cli::application::pipeline::bond_actions;
///
/// let mut head = InstallPlanAction::default();
/// let mut relay = InstallPlanAction::default();
/// bond_actions(&mut head, &mut relay);
/// ```
///
/// ```compile_fail
/// use slotup_cli::application::actions::InstallPlanAction;
/// use slotup_cli::application::pipeline::{
///     AbstractAction, Action, ActionCompleter, ActionPorts, bond_actions,
/// };
///
/// #[derive(Default)]
/// struct Counter {
///     ports: ActionPorts<u32, u32>,
/// }
///
/// impl AbstractAction for Counter {
///     fn perform_action(&mut self, _completer: ActionCompleter) {}
///     fn type_name(&self) -> &'static str {
///         "Counter"
///     }
/// }
///
/// impl Action for Counter {
///     type Input = u32;
///     type Output = u32;
///     fn ports(&self) -> &ActionPorts<u32, u32> {
///         &self.ports
///     }
///     fn ports_mut(&mut self) -> &mut ActionPorts<u32, u32> {
///         &mut self.ports
///     }
/// }
///
/// bond_actions(&mut InstallPlanAction::default(), &mut Counter::default());
/// ```
pub fn bond_actions<P, C>(producer: &mut P, consumer: &mut C)
where
    P: Action,
    C: Action<Input = P::Output>,
{
    let pipe = ActionPipe::new();
    producer.set_output_pipe(pipe.clone());
    consumer.set_input_pipe(pipe);
}
