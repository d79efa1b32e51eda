//! Device and build state exposed to policy.

use std::sync::Arc;

use crate::application::policy::variable::{
    CallVariable, ConstVariable, DEFAULT_POLL_INTERVAL, Variable,
};
use crate::application::ports::HardwareInterface;
use crate::domain::{ProviderError, disk_name};

/// Variables describing the running system.
pub trait SystemProvider: Send + Sync {
    /// Developer mode is off.
    fn var_is_normal_boot_mode(&self) -> &dyn Variable<bool>;
    /// The running image is an official build.
    fn var_is_official_build(&self) -> &dyn Variable<bool>;
    /// Out-of-box setup has finished.
    fn var_is_oobe_complete(&self) -> &dyn Variable<bool>;
    /// The device was booted from removable media.
    fn var_is_boot_device_removable(&self) -> &dyn Variable<bool>;
}

/// `SystemProvider` backed by a `HardwareInterface`.
///
/// Boot mode, build type and boot device cannot change without a reboot and
/// are read once in `init`. OOBE completion is read on every access.
pub struct RealSystemProvider {
    is_normal_boot_mode: ConstVariable<bool>,
    is_official_build: ConstVariable<bool>,
    is_oobe_complete: CallVariable<bool>,
    is_boot_device_removable: ConstVariable<bool>,
}

impl RealSystemProvider {
    /// Read the fixed system state and build the provider's variables.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InitFailed` naming the first variable whose
    /// initial reading failed.
    pub fn init(hardware: Arc<dyn HardwareInterface>) -> Result<Self, ProviderError> {
        let is_normal_boot_mode = hardware
            .is_normal_boot_mode()
            .map_err(|e| init_failed("is_normal_boot_mode", &e))?;
        let is_official_build = hardware
            .is_official_build()
            .map_err(|e| init_failed("is_official_build", &e))?;
        let is_boot_device_removable = boot_device_removable(hardware.as_ref())
            .map_err(|e| init_failed("is_boot_device_removable", &e))?;

        let oobe_source = Arc::clone(&hardware);
        let provider = Self {
            is_normal_boot_mode: ConstVariable::new("is_normal_boot_mode", is_normal_boot_mode),
            is_official_build: ConstVariable::new("is_official_build", is_official_build),
            is_oobe_complete: CallVariable::new(
                "is_oobe_complete",
                DEFAULT_POLL_INTERVAL,
                move || oobe_source.is_oobe_complete(),
            ),
            is_boot_device_removable: ConstVariable::new(
                "is_boot_device_removable",
                is_boot_device_removable,
            ),
        };
        tracing::debug!(
            is_normal_boot_mode,
            is_official_build,
            is_boot_device_removable,
            "system provider initialized"
        );
        Ok(provider)
    }
}

impl SystemProvider for RealSystemProvider {
    fn var_is_normal_boot_mode(&self) -> &dyn Variable<bool> {
        &self.is_normal_boot_mode
    }

    fn var_is_official_build(&self) -> &dyn Variable<bool> {
        &self.is_official_build
    }

    fn var_is_oobe_complete(&self) -> &dyn Variable<bool> {
        &self.is_oobe_complete
    }

    fn var_is_boot_device_removable(&self) -> &dyn Variable<bool> {
        &self.is_boot_device_removable
    }
}

fn boot_device_removable(hardware: &dyn HardwareInterface) -> anyhow::Result<bool> {
    let device = hardware.boot_device()?;
    let disk = disk_name(&device)
        .ok_or_else(|| anyhow::anyhow!("cannot derive disk from boot device {device}"))?;
    hardware.is_removable_device(&disk)
}

fn init_failed(variable: &'static str, cause: &anyhow::Error) -> ProviderError {
    tracing::warn!(variable, error = %cause, "system provider init failed");
    ProviderError::InitFailed {
        variable,
        reason: format!("{cause:#}"),
    }
}
