//! Application layer: port trait definitions, the action pipeline, policy
//! variables and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod actions;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod services;

pub use ports::{ConfigStore, HardwareInterface, PartitionIo, PayloadSource, ProgressReporter};
