//! Descriptor builder: turns a source file into a serialized transfer
//! descriptor via the transport engine.
//!
//! The serialized bytes are written to a temporary file next to the
//! source, because the descriptor records a path relative to that
//! directory. The temp artifact is held by a [`TempDescriptor`] guard
//! which deletes it on drop, so it is released on every exit path of
//! the seeding flow.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{DESCRIPTOR_TEMP_PREFIX, DESCRIPTOR_TEMP_SUFFIX};
use crate::engine::{DescriptorOptions, TransportEngine};
use crate::error::TransferError;

/// A serialized descriptor plus its on-disk temporary artifact.
///
/// Dropping the guard removes the file.
#[derive(Debug)]
pub struct TempDescriptor {
    bytes: Vec<u8>,
    path: PathBuf,
}

impl TempDescriptor {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDescriptor {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(
                event = "descriptor_temp_cleanup_failure",
                path = %self.path.display(),
                error = %e,
                "Failed to delete temporary descriptor file"
            );
        }
    }
}

/// Build a descriptor for `source` and stage its serialized form in a
/// temporary file inside the source's parent directory.
///
/// Fails with [`TransferError::InvalidInput`] when `source` is not an
/// existing regular file, and [`TransferError::DescriptorBuildFailed`]
/// when the engine cannot lay out or serialize it. No partially written
/// artifact survives a failure.
pub fn build(
    engine: &dyn TransportEngine,
    source: &Path,
    opts: &DescriptorOptions,
) -> Result<TempDescriptor, TransferError> {
    if !source.is_file() {
        return Err(TransferError::InvalidInput(format!(
            "source file does not exist: {}",
            source.display()
        )));
    }

    let bytes = engine
        .build_descriptor(source, opts)
        .map_err(TransferError::DescriptorBuildFailed)?;

    let parent = source
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let path = parent.join(format!(
        "{DESCRIPTOR_TEMP_PREFIX}{}{DESCRIPTOR_TEMP_SUFFIX}",
        Uuid::new_v4().simple()
    ));

    if let Err(e) = std::fs::write(&path, &bytes) {
        // Never leave a torso behind that a caller could mistake for a
        // valid descriptor.
        let _ = std::fs::remove_file(&path);
        return Err(TransferError::DescriptorBuildFailed(
            anyhow::Error::new(e).context("failed to write temporary descriptor file"),
        ));
    }

    debug!(
        event = "descriptor_built",
        source = %source.display(),
        descriptor = %path.display(),
        size = bytes.len(),
        "Built transfer descriptor"
    );

    Ok(TempDescriptor { bytes, path })
}
