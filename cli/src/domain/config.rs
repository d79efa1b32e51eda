//! Settable configuration keys and their validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use slotup_common::SlotupConfig;

use crate::domain::error::ConfigError;

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "policy.oobe_enabled",
    "policy.hash_checks_mandatory",
    "hardware.boot_device",
];

/// Value of `hardware.boot_device` that restores detection from the mount table.
pub const AUTO_BOOT_DEVICE: &str = "auto";

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns `UnknownKey` if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<(), ConfigError> {
    if VALID_CONFIG_KEYS.contains(&key) {
        return Ok(());
    }
    Err(ConfigError::UnknownKey {
        key: key.to_string(),
        valid: VALID_CONFIG_KEYS.join(", "),
    })
}

/// Sets `key` on `config` from its textual `value`.
///
/// # Errors
///
/// Returns `UnknownKey` for keys outside `VALID_CONFIG_KEYS` and
/// `InvalidValue` when `value` does not fit the key.
pub fn set_config_value(
    config: &mut SlotupConfig,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    validate_config_key(key)?;
    match key {
        "policy.oobe_enabled" => config.policy.oobe_enabled = parse_bool(key, value)?,
        "policy.hash_checks_mandatory" => {
            config.policy.hash_checks_mandatory = parse_bool(key, value)?;
        }
        _ => config.hardware.boot_device = parse_boot_device(key, value)?,
    }
    Ok(())
}

/// Current value of `key` as shown by `config show`.
#[must_use]
pub fn config_value(config: &SlotupConfig, key: &str) -> Option<String> {
    match key {
        "policy.oobe_enabled" => Some(config.policy.oobe_enabled.to_string()),
        "policy.hash_checks_mandatory" => Some(config.policy.hash_checks_mandatory.to_string()),
        "hardware.boot_device" => Some(
            config
                .hardware
                .boot_device
                .clone()
                .unwrap_or_else(|| AUTO_BOOT_DEVICE.to_string()),
        ),
        _ => None,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid: "true, false".to_string(),
        }),
    }
}

fn parse_boot_device(key: &str, value: &str) -> Result<Option<String>, ConfigError> {
    if value == AUTO_BOOT_DEVICE {
        return Ok(None);
    }
    if value.starts_with("/dev/") && value.len() > "/dev/".len() {
        return Ok(Some(value.to_string()));
    }
    Err(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: format!("{AUTO_BOOT_DEVICE}, /dev/<partition>"),
    })
}
