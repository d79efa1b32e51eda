//! Typed, named values the policy layer reads.
//!
//! A variable is read synchronously and either yields a value or reports
//! that the value could not be determined. The three kinds differ only in
//! when the underlying source is consulted.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::VariableError;

/// How often a polled variable is worth re-reading.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableMode {
    /// Fixed for the lifetime of the provider.
    Const,
    /// Recomputed on read; `interval` is a hint for observers.
    Poll { interval: Duration },
}

impl VariableMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Poll { .. } => "poll",
        }
    }
}

pub trait Variable<T>: Send + Sync {
    fn name(&self) -> &str;

    fn mode(&self) -> VariableMode;

    /// Current value.
    ///
    /// # Errors
    ///
    /// Returns `VariableError::Undetermined` when the source cannot answer.
    fn value(&self) -> Result<T, VariableError>;

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// ── Const ─────────────────────────────────────────────────────────────────────

/// Value computed once, before the variable was handed out.
pub struct ConstVariable<T> {
    name: String,
    value: T,
}

impl<T> ConstVariable<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl<T: Clone + Send + Sync> Variable<T> for ConstVariable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> VariableMode {
        VariableMode::Const
    }

    fn value(&self) -> Result<T, VariableError> {
        Ok(self.value.clone())
    }
}

// ── Call ──────────────────────────────────────────────────────────────────────

type Source<T> = Box<dyn Fn() -> anyhow::Result<T> + Send + Sync>;

/// Asks its source on every read.
pub struct CallVariable<T> {
    name: String,
    interval: Duration,
    source: Source<T>,
}

impl<T> CallVariable<T> {
    pub fn new<F>(name: impl Into<String>, interval: Duration, source: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            interval,
            source: Box::new(source),
        }
    }
}

impl<T: Send + Sync> Variable<T> for CallVariable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> VariableMode {
        VariableMode::Poll {
            interval: self.interval,
        }
    }

    fn value(&self) -> Result<T, VariableError> {
        (self.source)().map_err(|e| undetermined(&self.name, &e))
    }
}

// ── Cached ────────────────────────────────────────────────────────────────────

/// Like `CallVariable`, but reuses a successful reading for `ttl`.
///
/// Failed reads are not cached.
pub struct CachedVariable<T> {
    name: String,
    ttl: Duration,
    source: Source<T>,
    cached: Mutex<Option<(Instant, T)>>,
}

impl<T> CachedVariable<T> {
    pub fn new<F>(name: impl Into<String>, ttl: Duration, source: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ttl,
            source: Box::new(source),
            cached: Mutex::new(None),
        }
    }

    /// Drop the cached reading so the next read asks the source.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<T: Clone + Send + Sync> Variable<T> for CachedVariable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> VariableMode {
        VariableMode::Poll { interval: self.ttl }
    }

    fn value(&self) -> Result<T, VariableError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((taken_at, value)) = cached.as_ref()
            && taken_at.elapsed() < self.ttl
        {
            return Ok(value.clone());
        }
        let value = (self.source)().map_err(|e| undetermined(&self.name, &e))?;
        *cached = Some((Instant::now(), value.clone()));
        Ok(value)
    }
}

fn undetermined(name: &str, cause: &anyhow::Error) -> VariableError {
    tracing::debug!(variable = name, error = %cause, "variable undetermined");
    VariableError::Undetermined {
        name: name.to_string(),
        reason: format!("{cause:#}"),
    }
}
