// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording cleaner.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::{Collaborator, TemporaryFileCleaner};
use courier_core::types::{Artifact, ArtifactId, Attachment, AttachmentId};

/// A cleaner that records what it was asked to delete and deletes nothing.
#[derive(Default)]
pub struct MockCleaner {
    artifacts: Arc<Mutex<Vec<ArtifactId>>>,
    originals: Arc<Mutex<Vec<AttachmentId>>>,
}

impl MockCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact deletions, in call order. Duplicates are kept.
    pub async fn deleted_artifacts(&self) -> Vec<ArtifactId> {
        self.artifacts.lock().await.clone()
    }

    /// How often `id` was deleted.
    pub async fn deletions_of(&self, id: ArtifactId) -> usize {
        self.artifacts
            .lock()
            .await
            .iter()
            .filter(|deleted| **deleted == id)
            .count()
    }

    pub async fn released_originals(&self) -> usize {
        self.originals.lock().await.len()
    }
}

impl Collaborator for MockCleaner {
    fn name(&self) -> &str {
        "mock-cleaner"
    }
}

#[async_trait]
impl TemporaryFileCleaner for MockCleaner {
    async fn delete_artifact(&self, artifact: &Artifact) -> Result<(), CourierError> {
        self.artifacts.lock().await.push(artifact.id);
        Ok(())
    }

    async fn delete_original(&self, attachment: &Attachment) -> Result<(), CourierError> {
        self.originals.lock().await.push(attachment.id.clone());
        Ok(())
    }
}
