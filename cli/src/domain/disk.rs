//! Block device naming.

use std::sync::LazyLock;

use regex::Regex;

/// Partitions whose disk name ends in a digit carry a `p` separator
/// (`mmcblk0p3`, `nvme0n1p3`, `loop0p1`). Device-mapper nodes (`dm-0`) are
/// whole block devices of their own.
static NUMBERED_DISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?:/dev/)?(?:((?:mmcblk|loop|nvme\d+n)\d+)(?:p\d+)?|(dm-\d+))$")
        .expect("valid regex")
});

/// Classic `sdX`/`vdX`/`hdX` style names, partition number appended directly.
static LETTER_DISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?:/dev/)?([a-z]+)\d*$").expect("valid regex")
});

/// Returns the whole-disk name for a partition device, e.g. `/dev/sda3` →
/// `sda`, `/dev/mmcblk0p3` → `mmcblk0`, `/dev/dm-1` → `dm-1`.
///
/// `/dev/mapper/*` names are links and must be resolved to their `dm-N`
/// node first.
#[must_use]
pub fn disk_name(device: &str) -> Option<String> {
    NUMBERED_DISK_RE
        .captures(device)
        .or_else(|| LETTER_DISK_RE.captures(device))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
}
