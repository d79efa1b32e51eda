//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use slotup_common::ErrorCode;
use thiserror::Error;

// ── Pipeline errors ───────────────────────────────────────────────────────────

/// Rejected processor control requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("processor is already running")]
    AlreadyRunning,

    #[error("no actions queued")]
    NoActions,
}

/// Misuse of an action pipe.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipeError {
    #[error("pipe still holds an unconsumed payload")]
    Occupied,
}

// ── Plan errors ───────────────────────────────────────────────────────────────

/// An install plan lacks what a stage needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("install plan has no {0}")]
    MissingPath(&'static str),
}

// ── Policy errors ─────────────────────────────────────────────────────────────

/// A provider could not establish one of its variables.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("cannot initialize variable '{variable}': {reason}")]
    InitFailed {
        variable: &'static str,
        reason: String,
    },
}

/// A variable read produced no value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("variable '{name}' could not be determined: {reason}")]
    Undetermined { name: String, reason: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// A `config set` request that cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown setting '{key}' (valid: {valid})")]
    UnknownKey { key: String, valid: String },

    #[error("invalid value '{value}' for {key} (valid: {valid})")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}

// ── Update errors ─────────────────────────────────────────────────────────────

/// An update attempt that ran but did not finish successfully.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    #[error("update failed in {action}: {code}")]
    Failed {
        code: ErrorCode,
        action: &'static str,
    },

    #[error("update stopped before completion")]
    Stopped { action: Option<&'static str> },
}

impl UpdateError {
    /// Completion code reported for the attempt.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Stopped { .. } => ErrorCode::UserCanceled,
        }
    }

    /// Stage that was running when the attempt ended.
    #[must_use]
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Self::Failed { action, .. } => Some(*action),
            Self::Stopped { action } => *action,
        }
    }
}
