//! Sysfs/procfs implementation of the `HardwareInterface` port.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use slotup_common::HardwareConfig;

use crate::application::ports::HardwareInterface;
use crate::domain::disk_name;

/// Stacked device-mapper targets deeper than this are not followed.
const MAX_SLAVE_DEPTH: usize = 8;

/// Reads device state from the files named in `HardwareConfig`.
pub struct SysfsHardware {
    config: HardwareConfig,
}

impl SysfsHardware {
    #[must_use]
    pub fn new(config: HardwareConfig) -> Self {
        Self { config }
    }

    fn release_value(&self, key: &str) -> Result<Option<String>> {
        let path = &self.config.lsb_release_path;
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
        Ok(content.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
        }))
    }

    /// Whether `disk`, or any disk beneath it when it is a device-mapper
    /// target, is removable.
    fn removable_below(&self, disk: &str, depth: usize) -> Result<bool> {
        let dir = Path::new(&self.config.sysfs_block_root).join(disk);
        let path = dir.join("removable");
        let flag = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if flag.trim() == "1" {
            return Ok(true);
        }

        let slaves = dir.join("slaves");
        let Ok(entries) = std::fs::read_dir(&slaves) else {
            return Ok(false);
        };
        if depth >= MAX_SLAVE_DEPTH {
            tracing::warn!(disk, "device stack too deep, not following slaves");
            return Ok(false);
        }
        for entry in entries {
            let entry = entry.with_context(|| format!("cannot list {}", slaves.display()))?;
            let name = entry.file_name();
            let Some(slave_disk) = name.to_str().and_then(disk_name) else {
                tracing::debug!(disk, slave = ?name, "unrecognized slave device");
                continue;
            };
            if self.removable_below(&slave_disk, depth + 1)? {
                tracing::debug!(disk, slave = %slave_disk, "backed by removable media");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl HardwareInterface for SysfsHardware {
    fn boot_device(&self) -> Result<String> {
        if let Some(device) = &self.config.boot_device {
            return Ok(device.clone());
        }
        let path = &self.config.mounts_path;
        let mounts =
            std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
        let device =
            root_device(&mounts).ok_or_else(|| anyhow!("no block device mounted at / in {path}"))?;
        Ok(resolve_device_link(&device))
    }

    fn is_official_build(&self) -> Result<bool> {
        let key = &self.config.build_type_key;
        let value = self
            .release_value(key)?
            .ok_or_else(|| anyhow!("{key} missing from {}", self.config.lsb_release_path))?;
        Ok(value.starts_with("Official"))
    }

    fn is_normal_boot_mode(&self) -> Result<bool> {
        Ok(!Path::new(&self.config.developer_mode_marker).exists())
    }

    fn is_oobe_complete(&self) -> Result<bool> {
        Ok(Path::new(&self.config.oobe_completed_marker).exists())
    }

    fn is_removable_device(&self, disk: &str) -> Result<bool> {
        self.removable_below(disk, 0)
    }
}

/// Follows device links such as `/dev/mapper/vroot` to their node
/// (`/dev/dm-0`). Anything that is not a resolvable link is returned as is.
fn resolve_device_link(device: &str) -> String {
    let is_link = std::fs::symlink_metadata(device).is_ok_and(|m| m.file_type().is_symlink());
    if !is_link {
        return device.to_string();
    }
    match std::fs::canonicalize(device) {
        Ok(node) => {
            let node = node.display().to_string();
            tracing::debug!(device, %node, "boot device link resolved");
            node
        }
        Err(e) => {
            tracing::warn!(device, error = %e, "cannot resolve boot device link");
            device.to_string()
        }
    }
}

/// Device of the last `/` entry in a mounts table that names a block device.
fn root_device(mounts: &str) -> Option<String> {
    mounts
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            (mount_point == "/" && device.starts_with("/dev/")).then(|| device.to_string())
        })
        .last()
}
