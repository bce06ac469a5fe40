// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier attachment send pipeline.
//!
//! This crate provides the domain types, the error taxonomy and the
//! collaborator traits shared by the pipeline and its hosts. Media
//! processing, networking and storage implementations live behind the
//! traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{
    CourierError, FailureKind, PreProcessingError, PreconditionError, SendFailure, UploadError,
};
pub use types::{
    AppliedOptimization, Artifact, ArtifactId, Attachment, AttachmentId, AttachmentKind,
    DismissReason, OptimizationConfig, SendState, SizeEstimate, Uploadability,
    VideoCompressionPreset, VideoUploadEstimation,
};

pub use traits::{
    CaptionSource, Collaborator, MaxUploadSizeProvider, PreProcessor, ProgressSink,
    TemporaryFileCleaner, UploadabilityEstimator, Uploader,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn attachment_kind_round_trips_through_strings() {
        let kinds = [
            AttachmentKind::Image,
            AttachmentKind::Video,
            AttachmentKind::Audio,
            AttachmentKind::File,
            AttachmentKind::Voice,
        ];

        for kind in &kinds {
            let s = kind.to_string();
            let parsed = AttachmentKind::from_str(&s).expect("should parse back");
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn dismiss_reason_display() {
        assert_eq!(DismissReason::Queued.to_string(), "queued");
        assert_eq!(DismissReason::Cancelled.to_string(), "cancelled");
    }
}
