// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed [`TemporaryFileCleaner`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_core::error::CourierError;
use courier_core::traits::{Collaborator, TemporaryFileCleaner};
use courier_core::types::{Artifact, Attachment};
use tracing::debug;

/// Deletes artifact files, and originals that live in the app's own
/// staging directory.
///
/// Originals outside `staging_dir` belong to the user and are left alone.
#[derive(Debug, Clone)]
pub struct FsCleaner {
    staging_dir: PathBuf,
}

impl FsCleaner {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    async fn remove(path: &Path) -> Result<(), CourierError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed temporary file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Collaborator for FsCleaner {
    fn name(&self) -> &str {
        "fs-cleaner"
    }
}

#[async_trait]
impl TemporaryFileCleaner for FsCleaner {
    async fn delete_artifact(&self, artifact: &Artifact) -> Result<(), CourierError> {
        let mut first_error = None;
        for file in artifact.files() {
            if let Err(e) = Self::remove(file).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn delete_original(&self, attachment: &Attachment) -> Result<(), CourierError> {
        if !attachment.source.starts_with(&self.staging_dir) {
            debug!(path = %attachment.source.display(), "original is not staged, keeping it");
            return Ok(());
        }
        Self::remove(&attachment.source).await
    }
}
