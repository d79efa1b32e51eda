use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `/etc/slotup/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotupConfig {
    /// Where device state is read from.
    pub hardware: HardwareConfig,
    /// Policy defaults.
    pub policy: PolicyConfig,
}

/// Locations the sysfs hardware accessor reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Root of the block device tree (default: `/sys/block`).
    pub sysfs_block_root: String,
    /// Mount table used to find the boot device (default: `/proc/mounts`).
    pub mounts_path: String,
    /// Overrides boot device detection when set, e.g. `/dev/sda3`.
    pub boot_device: Option<String>,
    /// File present once out-of-box setup has finished.
    pub oobe_completed_marker: String,
    /// File present while the device runs in developer mode.
    pub developer_mode_marker: String,
    /// `KEY=value` release description (default: `/etc/lsb-release`).
    pub lsb_release_path: String,
    /// Key in the release description holding the build type.
    pub build_type_key: String,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sysfs_block_root: default_sysfs_block_root(),
            mounts_path: "/proc/mounts".to_string(),
            boot_device: None,
            oobe_completed_marker: "/home/chronos/.oobe_completed".to_string(),
            developer_mode_marker: "/run/slotup/developer_mode".to_string(),
            lsb_release_path: "/etc/lsb-release".to_string(),
            build_type_key: "RELEASE_BUILD_TYPE".to_string(),
        }
    }
}

fn default_sysfs_block_root() -> String {
    "/sys/block".to_string()
}

/// Policy-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Whether this device runs an out-of-box setup flow at all.
    pub oobe_enabled: bool,
    /// Forces `hash_checks_mandatory` on every plan when set.
    pub hash_checks_mandatory: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            oobe_enabled: true,
            hash_checks_mandatory: false,
        }
    }
}
