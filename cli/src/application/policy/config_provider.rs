//! Device configuration exposed to policy.

use crate::application::policy::variable::{ConstVariable, Variable};
use crate::application::ports::ConfigStore;
use crate::domain::ProviderError;

/// Variables sourced from the device configuration.
pub trait ConfigProvider: Send + Sync {
    /// The device runs an out-of-box setup flow.
    fn var_is_oobe_enabled(&self) -> &dyn Variable<bool>;
}

/// `ConfigProvider` reading the configuration once at init.
pub struct RealConfigProvider {
    is_oobe_enabled: ConstVariable<bool>,
}

impl RealConfigProvider {
    /// Load the configuration and build the provider's variables.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InitFailed` when the configuration cannot be
    /// loaded.
    pub fn init(store: &dyn ConfigStore) -> Result<Self, ProviderError> {
        let config = store.load().map_err(|e| {
            tracing::warn!(error = %e, "config provider init failed");
            ProviderError::InitFailed {
                variable: "is_oobe_enabled",
                reason: format!("{e:#}"),
            }
        })?;
        Ok(Self {
            is_oobe_enabled: ConstVariable::new("is_oobe_enabled", config.policy.oobe_enabled),
        })
    }
}

impl ConfigProvider for RealConfigProvider {
    fn var_is_oobe_enabled(&self) -> &dyn Variable<bool> {
        &self.is_oobe_enabled
    }
}
