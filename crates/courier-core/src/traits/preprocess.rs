// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-processing trait (compression, transcoding, thumbnailing).

use async_trait::async_trait;

use crate::error::PreProcessingError;
use crate::traits::collaborator::Collaborator;
use crate::types::{Artifact, Attachment, OptimizationConfig};

/// Turns a raw attachment into an upload-ready [`Artifact`].
///
/// The returned future may be dropped at any await point when the pipeline
/// cancels the run. Files written before that point must be removable by the
/// [`TemporaryFileCleaner`](crate::traits::TemporaryFileCleaner) or by the
/// implementation's own drop logic.
#[async_trait]
pub trait PreProcessor: Collaborator {
    async fn process(
        &self,
        attachment: &Attachment,
        config: &OptimizationConfig,
    ) -> Result<Artifact, PreProcessingError>;
}
