//! Config command: show and set configuration values.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::json;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::domain::config::{VALID_CONFIG_KEYS, config_value, set_config_value};

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or saved, or the
/// key or value is invalid.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    let path = app.config_store.path()?;

    if app.is_json() {
        let value = json!({
            "path": path.display().to_string(),
            "config": config,
        });
        let text = serde_json::to_string_pretty(&value).context("JSON serialization failed")?;
        println!("{text}");
        return Ok(());
    }

    app.output.header(&format!("Configuration ({})", path.display()));
    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_default();
        app.output.kv(&format!("{:<30}", format!("{key}:")), &value);
    }
    Ok(())
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<()> {
    let mut config = app.config_store.load()?;
    set_config_value(&mut config, key, value)?;
    app.config_store.save(&config)?;
    tracing::info!(key, value, "configuration updated");

    if app.is_json() {
        let text = serde_json::to_string_pretty(&json!({ "key": key, "value": value }))
            .context("JSON serialization failed")?;
        println!("{text}");
        return Ok(());
    }
    app.output.success(&format!("Set {key} = {value}"));
    Ok(())
}
