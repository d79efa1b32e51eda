//! Filesystem extent detection for source rootfs partitions.
//!
//! A rootfs partition is usually larger than the filesystem written into it.
//! Delta payloads are built against the filesystem, so only its extent is
//! hashed and compared.

/// Bytes that must be read from the start of a partition to find the
/// superblock.
pub const EXT_SUPERBLOCK_END: usize = 2048;

const SUPERBLOCK_OFFSET: usize = 1024;
const MAGIC: u16 = 0xEF53;
const INCOMPAT_64BIT: u32 = 0x80;

const BLOCKS_COUNT_LO: usize = 0x04;
const LOG_BLOCK_SIZE: usize = 0x18;
const MAGIC_AT: usize = 0x38;
const FEATURE_INCOMPAT: usize = 0x60;
const BLOCKS_COUNT_HI: usize = 0x150;

/// Size in bytes of the ext2/3/4 filesystem whose superblock is in `head`.
///
/// `head` is the start of the partition, at least `EXT_SUPERBLOCK_END` bytes.
/// Returns `None` when no ext superblock is found or its geometry overflows.
#[must_use]
pub fn ext_filesystem_size(head: &[u8]) -> Option<u64> {
    let sb = head.get(SUPERBLOCK_OFFSET..EXT_SUPERBLOCK_END)?;
    if le_u16(sb, MAGIC_AT)? != MAGIC {
        return None;
    }

    let log_block_size = le_u32(sb, LOG_BLOCK_SIZE)?;
    // Block sizes above 64 KiB are not valid ext geometry.
    if log_block_size > 6 {
        return None;
    }
    let block_size = 1024u64 << log_block_size;

    let mut blocks = u64::from(le_u32(sb, BLOCKS_COUNT_LO)?);
    if le_u32(sb, FEATURE_INCOMPAT)? & INCOMPAT_64BIT != 0 {
        blocks |= u64::from(le_u32(sb, BLOCKS_COUNT_HI)?) << 32;
    }
    blocks.checked_mul(block_size)
}

fn le_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn le_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
