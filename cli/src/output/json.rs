//! JSON error reporting for `--json` runs.
//!
//! Failed commands print one error object on stderr. Update failures carry
//! the completion code and the stage that reported it; every other error is
//! reported with the generic `error` code.

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::UpdateError;

/// Code used for errors that are not update failures.
pub const GENERIC_ERROR_CODE: &str = "error";

/// Format `err` as a JSON error object:
///
/// ```json
/// {
///   "error": true,
///   "message": "update failed in DownloadAction: source_hash_mismatch",
///   "code": "source_hash_mismatch",
///   "failed_action": "DownloadAction"
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(err: &anyhow::Error) -> Result<String> {
    let (code, failed_action) = match err.downcast_ref::<UpdateError>() {
        Some(update) => (update.code().as_str(), update.action()),
        None => (GENERIC_ERROR_CODE, None),
    };
    let obj = json!({
        "error": true,
        "message": format!("{err:#}"),
        "code": code,
        "failed_action": failed_action,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
