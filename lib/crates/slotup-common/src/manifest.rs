//! Payload manifest as read by the download stage.

use serde::{Deserialize, Serialize};

/// Size and digest of one partition image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartitionInfo {
    /// Size in bytes.
    pub size: u64,
    #[serde(with = "hex::serde")]
    pub hash: Vec<u8>,
}

/// What a payload expects to find on the device and what it produces.
///
/// `old_*_info` are only present for delta payloads, which can only be
/// applied on top of the exact partitions they were generated from. Their
/// `size` is the filesystem extent the payload was generated from, not the
/// size of the partition holding it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadManifest {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_kernel_info: Option<PartitionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_rootfs_info: Option<PartitionInfo>,
    pub new_kernel_info: PartitionInfo,
    pub new_rootfs_info: PartitionInfo,
    /// Location of the new kernel image, relative to the manifest.
    pub kernel_image: String,
    /// Location of the new rootfs image, relative to the manifest.
    pub rootfs_image: String,
}

impl PayloadManifest {
    /// A manifest without source partition info applies to any device.
    #[must_use]
    pub fn is_delta(&self) -> bool {
        self.old_kernel_info.is_some() || self.old_rootfs_info.is_some()
    }
}
