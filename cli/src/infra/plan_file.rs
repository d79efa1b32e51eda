//! Loading install plans from disk.

use std::path::Path;

use anyhow::{Context, Result};
use slotup_common::InstallPlan;

/// Read an `InstallPlan` from a YAML (or JSON) file. Fields not present keep
/// their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_install_plan(path: &Path) -> Result<InstallPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
