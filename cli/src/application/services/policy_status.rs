//! Application service: snapshot of every policy variable.
//!
//! Imports only from `crate::domain` and `crate::application::policy`.

use serde::Serialize;

use crate::application::policy::{ConfigProvider, SystemProvider, Variable};

/// One variable as read at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableReading {
    pub name: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    /// `None` when the variable could not be determined.
    pub value: Option<bool>,
}

fn read(var: &dyn Variable<bool>) -> VariableReading {
    let value = match var.value() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "policy variable undetermined");
            None
        }
    };
    VariableReading {
        name: var.name().to_string(),
        mode: var.mode().as_str(),
        value_type: var.value_type(),
        value,
    }
}

/// Read every system and config variable once.
///
/// Infallible: a variable that cannot be read is reported with no value.
#[must_use]
pub fn gather_policy_status(
    system: &dyn SystemProvider,
    config: &dyn ConfigProvider,
) -> Vec<VariableReading> {
    [
        system.var_is_normal_boot_mode(),
        system.var_is_official_build(),
        system.var_is_oobe_complete(),
        system.var_is_boot_device_removable(),
        config.var_is_oobe_enabled(),
    ]
    .into_iter()
    .map(read)
    .collect()
}
