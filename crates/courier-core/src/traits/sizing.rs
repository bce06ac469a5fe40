// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload size limit and estimation traits.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::collaborator::Collaborator;
use crate::types::{Attachment, OptimizationConfig, Uploadability};

/// Reports the server's maximum upload size.
#[async_trait]
pub trait MaxUploadSizeProvider: Collaborator {
    /// `Ok(None)` means the server does not impose a limit.
    async fn max_upload_size(&self) -> Result<Option<u64>, CourierError>;
}

/// Estimates whether attachments can be uploaded under the server limit.
#[async_trait]
pub trait UploadabilityEstimator: Collaborator {
    async fn estimate(
        &self,
        attachments: &[Attachment],
        config: &OptimizationConfig,
    ) -> Uploadability;
}
