//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: sysfs and procfs reads,
//! partition access, payload copying, and config persistence.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod hardware;
pub mod partition;
pub mod payload;
pub mod plan_file;

pub use config::YamlConfigStore;
pub use hardware::SysfsHardware;
pub use partition::FilePartitionIo;
pub use payload::LocalPayloadSource;
pub use plan_file::load_install_plan;
