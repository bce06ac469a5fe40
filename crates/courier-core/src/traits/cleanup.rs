// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary resource cleanup trait.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::collaborator::Collaborator;
use crate::types::{Artifact, Attachment};

/// Deletes local files owned by the pipeline.
///
/// Cleanup is best effort: the pipeline logs errors and moves on.
#[async_trait]
pub trait TemporaryFileCleaner: Collaborator {
    /// Delete every file of a pre-processed artifact.
    async fn delete_artifact(&self, artifact: &Artifact) -> Result<(), CourierError>;

    /// Release the local reference to the original attachment.
    async fn delete_original(&self, attachment: &Attachment) -> Result<(), CourierError>;
}
