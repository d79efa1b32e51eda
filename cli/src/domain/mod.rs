//! Domain layer: pure update logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod disk;
pub mod error;
pub mod filesystem;
pub mod hash;
pub mod plan;

pub use disk::disk_name;
pub use error::{
    ConfigError, PipeError, PlanError, ProcessorError, ProviderError, UpdateError, VariableError,
};
pub use filesystem::{EXT_SUPERBLOCK_END, ext_filesystem_size};
pub use hash::{HashError, digest_matches, sha256_prefix};
pub use plan::{require_source_paths, require_target_paths};
