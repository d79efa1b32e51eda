//! File and block-device implementation of the `PartitionIo` port.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use anyhow::{Context, Result};

use crate::application::ports::PartitionIo;

/// Opens partitions by path. Block devices report no length through
/// metadata, so size is taken by seeking to the end.
pub struct FilePartitionIo;

impl PartitionIo for FilePartitionIo {
    fn size(&self, path: &str) -> Result<u64> {
        let mut file = File::open(path).with_context(|| format!("cannot open {path}"))?;
        file.seek(SeekFrom::End(0))
            .with_context(|| format!("cannot determine size of {path}"))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
        Ok(Box::new(file))
    }
}
