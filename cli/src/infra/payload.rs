//! Local-file implementation of the `PayloadSource` port.
//!
//! `download_url` names a JSON `PayloadManifest`, either as a plain path or
//! a `file://` URL. Image paths in the manifest are relative to its
//! directory. The manifest document is hashed as read so the download
//! stage can check it against the digest the plan carries.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use slotup_common::{InstallPlan, PayloadManifest};

use crate::application::ports::{FetchedManifest, PayloadSource};

pub struct LocalPayloadSource;

fn manifest_path(url: &str) -> Result<PathBuf> {
    if url.is_empty() {
        bail!("install plan has no download_url");
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if url.contains("://") {
        bail!("unsupported payload location: {url}");
    }
    Ok(PathBuf::from(url))
}

fn copy_image(image: &Path, target: &str) -> Result<u64> {
    let mut src = File::open(image).with_context(|| format!("cannot open {}", image.display()))?;
    // Block devices cannot be truncated; partition tails are left as they are.
    let mut dst = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(target)
        .with_context(|| format!("cannot open {target} for writing"))?;
    let written = io::copy(&mut src, &mut dst)
        .with_context(|| format!("cannot write {} to {target}", image.display()))?;
    dst.sync_all()
        .with_context(|| format!("cannot sync {target}"))?;
    Ok(written)
}

impl PayloadSource for LocalPayloadSource {
    fn fetch(&self, plan: &InstallPlan) -> Result<FetchedManifest> {
        let path = manifest_path(&plan.download_url)?;
        let bytes = std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
        let manifest = serde_json::from_slice(&bytes)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(FetchedManifest {
            manifest,
            size: bytes.len() as u64,
            sha256: Sha256::digest(&bytes).to_vec(),
        })
    }

    fn apply(&self, plan: &InstallPlan, manifest: &PayloadManifest) -> Result<()> {
        let path = manifest_path(&plan.download_url)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let written = copy_image(&base.join(&manifest.rootfs_image), &plan.install_path)?;
        tracing::debug!(target = %plan.install_path, bytes = written, "rootfs image written");
        let written = copy_image(&base.join(&manifest.kernel_image), &plan.kernel_install_path)?;
        tracing::debug!(target = %plan.kernel_install_path, bytes = written, "kernel image written");
        Ok(())
    }
}
