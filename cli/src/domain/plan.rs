//! Stage preconditions on an `InstallPlan`.
//!
//! The plan itself never validates; stages call these before touching the
//! devices it names.

use slotup_common::InstallPlan;

use crate::domain::error::PlanError;

/// Both install partitions must be named before anything is written.
///
/// # Errors
///
/// Returns the first missing path.
pub fn require_target_paths(plan: &InstallPlan) -> Result<(), PlanError> {
    if plan.install_path.is_empty() {
        return Err(PlanError::MissingPath("install_path"));
    }
    if plan.kernel_install_path.is_empty() {
        return Err(PlanError::MissingPath("kernel_install_path"));
    }
    Ok(())
}

/// Delta updates read both source partitions.
///
/// # Errors
///
/// Returns the first missing path.
pub fn require_source_paths(plan: &InstallPlan) -> Result<(), PlanError> {
    if plan.source_path.is_empty() {
        return Err(PlanError::MissingPath("source_path"));
    }
    if plan.kernel_source_path.is_empty() {
        return Err(PlanError::MissingPath("kernel_source_path"));
    }
    Ok(())
}
