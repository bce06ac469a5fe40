// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UploadError;
use crate::traits::collaborator::Collaborator;
use crate::types::Artifact;

/// Callback receiving upload progress fractions in `[0, 1]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Sends an artifact to the server.
///
/// Progress reported through the sink should be non-decreasing; the pipeline
/// clamps and deduplicates it either way. Dropping the returned future
/// aborts the transfer.
#[async_trait]
pub trait Uploader: Collaborator {
    async fn upload(
        &self,
        artifact: &Artifact,
        caption: Option<&str>,
        progress: ProgressSink,
    ) -> Result<(), UploadError>;
}
