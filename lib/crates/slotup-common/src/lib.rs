pub mod config;
pub mod error_code;
pub mod install_plan;
pub mod manifest;

pub use config::{HardwareConfig, PolicyConfig, SlotupConfig};
pub use error_code::ErrorCode;
pub use install_plan::InstallPlan;
pub use manifest::{PartitionInfo, PayloadManifest};
