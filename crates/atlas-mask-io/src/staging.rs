// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! All-or-nothing artifact persistence
//!
//! Every artifact is first written next to its target as `<name>.partial`.
//! Targets are only replaced in [`StagedWriter::commit`], after every
//! artifact was written. A commit that fails halfway rolls back to the
//! previous targets. Partial files left behind by a failed or dropped
//! writer are removed.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::VolumeIoResult;

const PARTIAL_SUFFIX: &str = ".partial";
const BACKUP_SUFFIX: &str = ".previous";

/// Sibling path used while an artifact is being written
pub fn partial_path(target: &Path) -> PathBuf {
    with_suffix(target, PARTIAL_SUFFIX)
}

fn backup_path(target: &Path) -> PathBuf {
    with_suffix(target, BACKUP_SUFFIX)
}

fn with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

#[derive(Debug)]
struct StagedArtifact {
    partial: PathBuf,
    target: PathBuf,
}

/// Collects artifacts and publishes them together
#[derive(Debug, Default)]
pub struct StagedWriter {
    staged: Vec<StagedArtifact>,
}

impl StagedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one artifact to its partial file
    ///
    /// Parent directories of `target` are created as needed.
    pub fn stage<F>(&mut self, target: &Path, write: F) -> VolumeIoResult<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> VolumeIoResult<()>,
    {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path(target);
        if let Err(err) = write_partial(&partial, write) {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }

        debug!(path = %partial.display(), "Staged artifact");
        self.staged.push(StagedArtifact {
            partial,
            target: target.to_path_buf(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Move every partial file onto its target
    ///
    /// Existing targets are first moved aside to `<name>.previous`. If any
    /// rename fails, published artifacts are withdrawn and the previous
    /// targets are restored before the error is returned.
    pub fn commit(mut self) -> VolumeIoResult<Vec<PathBuf>> {
        let staged = std::mem::take(&mut self.staged);

        let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
        for artifact in &staged {
            if !artifact.target.exists() {
                continue;
            }
            let backup = backup_path(&artifact.target);
            if let Err(err) = fs::rename(&artifact.target, &backup) {
                restore(&[], &backups);
                discard_partials(&staged);
                return Err(err.into());
            }
            backups.push((artifact.target.clone(), backup));
        }

        let mut published = Vec::with_capacity(staged.len());
        for artifact in &staged {
            if let Err(err) = fs::rename(&artifact.partial, &artifact.target) {
                warn!(
                    path = %artifact.target.display(),
                    error = %err,
                    "Publishing failed; restoring previous artifacts"
                );
                restore(&published, &backups);
                discard_partials(&staged);
                return Err(err.into());
            }
            published.push(artifact.target.clone());
        }

        for (_, backup) in &backups {
            if let Err(err) = fs::remove_file(backup) {
                warn!(path = %backup.display(), error = %err, "Could not remove previous artifact");
            }
        }
        info!(artifacts = published.len(), "Published artifacts");
        Ok(published)
    }

    /// Remove every partial file without publishing
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        for artifact in self.staged.drain(..) {
            if let Err(err) = fs::remove_file(&artifact.partial) {
                warn!(path = %artifact.partial.display(), error = %err, "Could not remove partial artifact");
            }
        }
    }
}

/// Withdraw `published` targets and move backups back into place
fn restore(published: &[PathBuf], backups: &[(PathBuf, PathBuf)]) {
    for target in published {
        if let Err(err) = fs::remove_file(target) {
            warn!(path = %target.display(), error = %err, "Could not withdraw artifact");
        }
    }
    for (target, backup) in backups {
        if let Err(err) = fs::rename(backup, target) {
            warn!(path = %backup.display(), error = %err, "Could not restore previous artifact");
        }
    }
}

fn discard_partials(staged: &[StagedArtifact]) {
    for artifact in staged {
        let _ = fs::remove_file(&artifact.partial);
    }
}

fn write_partial<F>(partial: &Path, write: F) -> VolumeIoResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> VolumeIoResult<()>,
{
    let mut writer = BufWriter::new(File::create(partial)?);
    write(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

impl Drop for StagedWriter {
    fn drop(&mut self) {
        self.discard();
    }
}
