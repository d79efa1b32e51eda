//! Terminal styles for update outcomes and policy readings.

use owo_colors::Style;
use slotup_common::ErrorCode;

/// Styles applied to CLI output. Plain until `colorize` is called.
#[derive(Default, Clone)]
pub struct Styles {
    /// Finished stages and successful attempts.
    pub success: Style,
    /// Tolerated mismatches and stopped attempts.
    pub warning: Style,
    /// Failed attempts.
    pub error: Style,
    /// Stage in progress.
    pub info: Style,
    /// Keys and undetermined readings.
    pub dim: Style,
    pub header: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
    }

    /// Style for the completion code of an update attempt.
    ///
    /// A canceled attempt left the device untouched, so it is a warning
    /// rather than an error.
    #[must_use]
    pub fn outcome(&self, code: ErrorCode) -> Style {
        match code {
            ErrorCode::Success => self.success,
            ErrorCode::UserCanceled => self.warning,
            _ => self.error,
        }
    }

    /// Style for a boolean policy variable reading.
    #[must_use]
    pub fn reading(&self, value: Option<bool>) -> Style {
        match value {
            Some(true) => self.success,
            Some(false) => self.warning,
            None => self.dim,
        }
    }
}
