// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The "file too large" precondition checked before any upload.

use courier_core::error::PreconditionError;
use courier_core::traits::UploadabilityEstimator;
use courier_core::types::{Attachment, AttachmentKind, OptimizationConfig};
use tracing::debug;

/// Check whether `attachment` can be uploaded with `config`.
///
/// Images and videos rely on the estimator, which accounts for optimization.
/// Other attachments compare their raw size with the server maximum.
pub async fn check_upload_precondition(
    estimator: &dyn UploadabilityEstimator,
    attachment: &Attachment,
    config: &OptimizationConfig,
) -> Option<PreconditionError> {
    let report = estimator
        .estimate(std::slice::from_ref(attachment), config)
        .await;

    let verdict = match attachment.kind {
        AttachmentKind::Image | AttachmentKind::Video => report.too_large(),
        _ => report
            .max_size
            .filter(|max| attachment.size > *max)
            .map(|max| PreconditionError::TooLarge {
                size: attachment.size,
                max,
            }),
    };

    debug!(
        estimator = estimator.name(),
        attachment_id = %attachment.id,
        max_size = ?report.max_size,
        too_large = verdict.is_some(),
        "upload precondition checked"
    );
    verdict
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use courier_core::CourierError;
    use courier_core::traits::{Collaborator, MaxUploadSizeProvider};
    use tracing_test::traced_test;

    use super::*;
    use crate::estimate::PresetSizeEstimator;

    struct Limit(Option<u64>);

    impl Collaborator for Limit {
        fn name(&self) -> &str {
            "limit"
        }
    }

    #[async_trait]
    impl MaxUploadSizeProvider for Limit {
        async fn max_upload_size(&self) -> Result<Option<u64>, CourierError> {
            Ok(self.0)
        }
    }

    struct Unreachable;

    impl Collaborator for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[async_trait]
    impl MaxUploadSizeProvider for Unreachable {
        async fn max_upload_size(&self) -> Result<Option<u64>, CourierError> {
            Err(CourierError::Collaborator {
                name: "unreachable".into(),
                message: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let estimator = PresetSizeEstimator::new(Arc::new(Limit(Some(1_000))), 1);
        let file = Attachment::new("/tmp/a.zip", "application/zip", 1_001);
        let verdict =
            check_upload_precondition(&estimator, &file, &OptimizationConfig::default()).await;
        assert_eq!(
            verdict,
            Some(PreconditionError::TooLarge {
                size: 1_001,
                max: 1_000
            })
        );
    }

    #[tokio::test]
    async fn file_at_limit_is_accepted() {
        let estimator = PresetSizeEstimator::new(Arc::new(Limit(Some(1_000))), 1);
        let file = Attachment::new("/tmp/a.zip", "application/zip", 1_000);
        let verdict =
            check_upload_precondition(&estimator, &file, &OptimizationConfig::default()).await;
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn video_without_metadata_uses_raw_size() {
        let estimator = PresetSizeEstimator::new(Arc::new(Limit(Some(1_000))), 1);
        let video = Attachment::new("/tmp/a.mp4", "video/mp4", 5_000);
        let verdict =
            check_upload_precondition(&estimator, &video, &OptimizationConfig::default()).await;
        assert!(verdict.is_some());
    }

    #[tokio::test]
    #[traced_test]
    async fn unreachable_server_falls_back_and_logs() {
        let estimator = PresetSizeEstimator::new(Arc::new(Unreachable), 2_000);
        let file = Attachment::new("/tmp/a.zip", "application/zip", 3_000);
        let verdict =
            check_upload_precondition(&estimator, &file, &OptimizationConfig::default()).await;
        assert_eq!(
            verdict,
            Some(PreconditionError::TooLarge {
                size: 3_000,
                max: 2_000
            })
        );
        assert!(logs_contain("using fallback"));
    }
}
