//! Status command: read and print every policy variable.

use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::policy::{RealConfigProvider, RealSystemProvider};
use crate::application::ports::ConfigStore;
use crate::application::services::policy_status::{VariableReading, gather_policy_status};
use crate::infra::SysfsHardware;

/// Display form of a reading's value.
#[must_use]
pub fn value_display(reading: &VariableReading) -> &'static str {
    match reading.value {
        Some(true) => "true",
        Some(false) => "false",
        None => "undetermined",
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a provider
/// fails to initialize.
pub fn run(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    let hardware = Arc::new(SysfsHardware::new(config.hardware));
    let system =
        RealSystemProvider::init(hardware).context("cannot initialize system provider")?;
    let config_provider = RealConfigProvider::init(&app.config_store)
        .context("cannot initialize config provider")?;

    let readings = gather_policy_status(&system, &config_provider);

    if app.is_json() {
        let text = serde_json::to_string_pretty(&readings).context("JSON serialization failed")?;
        println!("{text}");
        return Ok(());
    }

    app.output.header("Policy variables");
    for reading in &readings {
        let display = value_display(reading);
        let value = display.style(app.output.styles.reading(reading.value));
        app.output.kv(
            &format!("{:<26}", reading.name),
            &format!("{value} ({})", reading.mode),
        );
    }
    Ok(())
}
