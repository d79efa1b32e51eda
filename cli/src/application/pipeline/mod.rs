//! Action pipeline: typed stages chained through pipes and driven one at a
//! time by an `ActionProcessor`.

pub mod action;
pub mod pipe;
pub mod processor;

pub use action::{AbstractAction, Action, ActionPorts};
pub use pipe::{ActionPipe, bond_actions};
pub use processor::{
    ActionCompleter, ActionProcessor, ActionProcessorDelegate, ProcessingOutcome, ProcessorState,
};
