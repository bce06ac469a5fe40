// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end send flows: happy paths, failures, retries, double sends and
//! optimization changes.

use std::time::Duration;

use tokio::time::timeout;

use courier_core::error::{PreProcessingError, PreconditionError, UploadError};
use courier_core::types::{
    Attachment, DismissReason, OptimizationConfig, SendState, VideoCompressionPreset,
};
use courier_core::{CourierError, FailureKind};
use courier_test_utils::harness::STEP_TIMEOUT;
use courier_test_utils::{Gate, MockPreProcessor, MockUploadLimit, MockUploader, PipelineHarness};

fn photo() -> Attachment {
    Attachment::new("/tmp/staging/cat.jpg", "image/jpeg", 812_000)
}

fn report(size: u64) -> Attachment {
    Attachment::new("/tmp/staging/report.pdf", "application/pdf", size)
}

fn is_ready(state: &SendState) -> bool {
    matches!(state, SendState::ReadyToUpload { .. })
}

fn is_uploading(state: &SendState) -> bool {
    matches!(state, SendState::Uploading { .. })
}

fn is_done(state: &SendState) -> bool {
    state.is_terminal()
}

#[tokio::test]
async fn eager_image_is_sent_and_cleaned_up() {
    let mut harness = PipelineHarness::builder(photo())
        .optimization_ui_required(false)
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;
    assert_eq!(harness.handle.dismissed().await, Some(DismissReason::Sent));

    let finished = harness.join().await;
    assert_eq!(
        finished.labels(),
        [
            "idle",
            "processing(silent)",
            "ready_to_upload",
            "uploading(0%)",
            "uploading(50%)",
            "uploading(100%)",
            "done",
        ]
    );

    let produced = finished.preprocessor.produced().await;
    assert_eq!(produced.len(), 1);
    assert_eq!(finished.cleaner.deleted_artifacts().await, vec![produced[0].id]);
    assert_eq!(finished.cleaner.released_originals().await, 1);
    assert_eq!(finished.uploader.call_count().await, 1);
}

#[tokio::test]
async fn transport_failure_keeps_artifact_for_retry() {
    let uploader =
        MockUploader::with_outcomes(vec![Err(UploadError::Transport("offline".into()))]);
    let mut harness = PipelineHarness::builder(report(4_096))
        .uploader(uploader)
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();

    let failure = harness
        .wait_for_transition(|s| matches!(s, SendState::Failure { .. }))
        .await;
    let SendState::Failure { error, artifact } = failure else {
        unreachable!();
    };
    assert_eq!(error.kind(), FailureKind::Network);
    assert!(error.is_retryable());
    let kept = artifact.expect("upload failure keeps the artifact");

    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(
        finished.labels(),
        [
            "idle",
            "processing(silent)",
            "ready_to_upload",
            "uploading(0%)",
            "failure(network)",
            "uploading(0%)",
            "uploading(50%)",
            "uploading(100%)",
            "done",
        ]
    );
    assert_eq!(finished.preprocessor.call_count().await, 1);

    let calls = finished.uploader.calls().await;
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.artifact_id == kept.id));
    assert_eq!(finished.cleaner.deletions_of(kept.id).await, 1);
}

#[tokio::test]
async fn preprocessing_failure_is_retried_from_scratch() {
    let preprocessor =
        MockPreProcessor::with_outcomes(vec![Err(PreProcessingError::new("codec missing"))]);
    let mut harness = PipelineHarness::builder(photo())
        .preprocessor(preprocessor)
        .build();

    // Images wait for the optimization choice, so nothing runs before Send.
    harness.handle.send(None).await.unwrap();
    let failure = harness
        .wait_for_transition(|s| matches!(s, SendState::Failure { .. }))
        .await;
    assert_eq!(failure.artifact(), None);
    assert_eq!(failure.to_string(), "failure(processing)");

    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.preprocessor.call_count().await, 2);
    assert_eq!(finished.uploader.call_count().await, 1);
    assert_eq!(
        finished.labels(),
        [
            "idle",
            "processing",
            "failure(processing)",
            "processing",
            "ready_to_upload",
            "uploading(0%)",
            "uploading(50%)",
            "uploading(100%)",
            "done",
        ]
    );
}

#[tokio::test]
async fn oversized_file_is_refused_before_upload() {
    let mut harness = PipelineHarness::builder(report(2_000_000))
        .max_upload_size(1_000_000)
        .build();

    harness.wait_for_transition(is_ready).await;
    assert_eq!(
        harness.handle.precondition_checked().await,
        Some(PreconditionError::TooLarge {
            size: 2_000_000,
            max: 1_000_000
        })
    );
    assert!(harness.handle.file_too_large());

    harness.handle.send(None).await.unwrap();
    harness.handle.cancel_and_dismiss().await.unwrap();

    let finished = harness.join().await;
    assert_eq!(
        finished.labels(),
        ["idle", "processing(silent)", "ready_to_upload", "done"]
    );
    assert_eq!(finished.uploader.call_count().await, 0);
}

#[tokio::test]
async fn file_within_limit_passes_precondition() {
    let mut harness = PipelineHarness::builder(report(1_000))
        .max_upload_size(1_000_000)
        .build();

    harness.wait_for_transition(is_ready).await;
    assert_eq!(harness.handle.precondition_checked().await, None);
    assert!(!harness.handle.file_too_large());
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;
    assert_eq!(harness.join().await.uploader.call_count().await, 1);
}

#[tokio::test]
async fn video_too_large_at_configured_preset_is_refused() {
    // One minute of 1080p: Standard is ~22.8 MB, Low ~5.7 MB.
    let clip = Attachment::new("/tmp/staging/clip.mp4", "video/mp4", 400_000_000)
        .with_dimensions(1920, 1080)
        .with_duration(Duration::from_secs(60));
    let mut harness = PipelineHarness::builder(clip)
        .max_upload_size(10_000_000)
        .build();

    assert_eq!(
        harness.handle.precondition_checked().await,
        Some(PreconditionError::TooLarge {
            size: 22_809_600,
            max: 10_000_000
        })
    );

    let mut verdicts = harness.handle.precondition_updates();
    verdicts.borrow_and_update();
    harness.handle.send(None).await.unwrap();
    timeout(STEP_TIMEOUT, verdicts.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(verdicts.borrow().is_some());
    assert_eq!(harness.handle.state(), SendState::Idle);

    harness.optimization.send_replace(OptimizationConfig {
        video_preset: VideoCompressionPreset::Low,
        ..OptimizationConfig::default()
    });
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;
    assert!(!harness.handle.file_too_large());

    let finished = harness.join().await;
    let configs = finished.preprocessor.configs().await;
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].video_preset, VideoCompressionPreset::Low);
    assert_eq!(finished.uploader.call_count().await, 1);
    assert_eq!(finished.labels()[..3], ["idle", "processing", "ready_to_upload"]);
}

#[tokio::test]
async fn send_waits_for_size_check() {
    let limit_gate = Gate::closed();
    let mut harness = PipelineHarness::builder(report(1_000))
        .upload_limit(MockUploadLimit::new(Some(1_000_000)).gated(limit_gate.clone()))
        .build();

    // Eager pre-processing does not wait for the limit lookup.
    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.handle.send(None).await.unwrap();
    limit_gate.open();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.uploader.call_count().await, 1);
}

#[tokio::test]
async fn send_during_silent_prefetch_only_shows_progress() {
    let gate = Gate::closed();
    let mut harness = PipelineHarness::builder(photo())
        .optimization_ui_required(false)
        .preprocessor(MockPreProcessor::new().gated(gate.clone()))
        .build();

    harness
        .wait_for_transition(|s| {
            matches!(
                s,
                SendState::Processing {
                    display_progress: false
                }
            )
        })
        .await;
    harness.handle.send(None).await.unwrap();
    harness
        .wait_for_transition(|s| {
            matches!(
                s,
                SendState::Processing {
                    display_progress: true
                }
            )
        })
        .await;

    gate.open();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.preprocessor.call_count().await, 1);
    assert_eq!(
        finished.labels(),
        [
            "idle",
            "processing(silent)",
            "processing",
            "ready_to_upload",
            "uploading(0%)",
            "uploading(50%)",
            "uploading(100%)",
            "done",
        ]
    );
}

#[tokio::test]
async fn double_send_during_processing_uploads_once() {
    let gate = Gate::closed();
    let mut harness = PipelineHarness::builder(photo())
        .preprocessor(MockPreProcessor::new().gated(gate.clone()))
        .build();

    harness.handle.send(None).await.unwrap();
    harness.handle.send(None).await.unwrap();
    gate.open();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.preprocessor.call_count().await, 1);
    assert_eq!(finished.uploader.call_count().await, 1);
}

#[tokio::test]
async fn double_send_during_upload_uploads_once() {
    let gate = Gate::closed();
    let mut harness = PipelineHarness::builder(report(10))
        .uploader(MockUploader::new().gated(gate.clone()))
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_uploading).await;
    harness.handle.send(None).await.unwrap();
    gate.open();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.uploader.call_count().await, 1);
    assert_eq!(finished.uploader.completed().await, 1);
}

#[tokio::test]
async fn config_change_discards_stale_artifact() {
    let mut harness = PipelineHarness::builder(photo())
        .optimization_ui_required(false)
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.optimization.send_replace(OptimizationConfig {
        compress_images: false,
        ..OptimizationConfig::default()
    });
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    let produced = finished.preprocessor.produced().await;
    assert_eq!(produced.len(), 2);

    let configs = finished.preprocessor.configs().await;
    assert!(configs[0].compress_images);
    assert!(!configs[1].compress_images);

    let calls = finished.uploader.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].artifact_id, produced[1].id);

    assert_eq!(finished.cleaner.deletions_of(produced[0].id).await, 1);
    assert_eq!(finished.cleaner.deletions_of(produced[1].id).await, 1);
    assert_eq!(
        finished.labels(),
        [
            "idle",
            "processing(silent)",
            "ready_to_upload",
            "processing",
            "ready_to_upload",
            "uploading(0%)",
            "uploading(50%)",
            "uploading(100%)",
            "done",
        ]
    );
}

#[tokio::test]
async fn config_change_during_processing_restarts_with_new_config() {
    let gate = Gate::closed();
    let mut harness = PipelineHarness::builder(photo())
        .preprocessor(MockPreProcessor::new().gated(gate.clone()))
        .build();

    harness.handle.send(None).await.unwrap();
    harness
        .wait_for_transition(|s| matches!(s, SendState::Processing { .. }))
        .await;
    harness.optimization.send_replace(OptimizationConfig {
        compress_images: false,
        ..OptimizationConfig::default()
    });
    gate.open();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    let produced = finished.preprocessor.produced().await;
    assert_eq!(produced.len(), 2);
    assert!(!finished.preprocessor.configs().await[1].compress_images);
    assert_eq!(finished.uploader.calls().await[0].artifact_id, produced[1].id);
    assert_eq!(finished.cleaner.deleted_artifacts().await.len(), 2);
}

#[tokio::test]
async fn irrelevant_config_change_keeps_artifact() {
    let gif = Attachment::new("/tmp/staging/party.gif", "image/gif", 90_000);
    let mut harness = PipelineHarness::builder(gif)
        .optimization_ui_required(false)
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.optimization.send_replace(OptimizationConfig {
        compress_images: false,
        ..OptimizationConfig::default()
    });
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.preprocessor.call_count().await, 1);
}

#[tokio::test]
async fn clear_send_state_during_upload_returns_to_preview() {
    let gate = Gate::closed();
    let mut harness = PipelineHarness::builder(report(10))
        .uploader(MockUploader::new().gated(gate.clone()))
        .build();

    let ready = harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_uploading).await;
    harness.handle.cancel_and_clear_send_state().await.unwrap();

    let reverted = harness.wait_for_transition(is_ready).await;
    assert_eq!(reverted.artifact(), ready.artifact());
    assert!(
        !harness
            .labels()
            .iter()
            .any(|l| l == "done" || l.starts_with("failure"))
    );

    gate.open();
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let finished = harness.join().await;
    assert_eq!(finished.uploader.call_count().await, 2);
    assert_eq!(finished.uploader.completed().await, 1);
    assert_eq!(finished.preprocessor.call_count().await, 1);
}

#[tokio::test]
async fn clear_send_state_after_processing_failure_returns_to_idle() {
    let preprocessor = MockPreProcessor::with_outcomes(vec![Err(PreProcessingError::new("oom"))]);
    let mut harness = PipelineHarness::builder(photo())
        .preprocessor(preprocessor)
        .build();

    harness.handle.send(None).await.unwrap();
    harness
        .wait_for_transition(|s| matches!(s, SendState::Failure { .. }))
        .await;
    harness.handle.cancel_and_clear_send_state().await.unwrap();
    let cleared = harness.wait_for_transition(|_| true).await;
    assert_eq!(cleared, SendState::Idle);
}

#[tokio::test]
async fn caption_source_is_read_at_send_time() {
    let mut harness = PipelineHarness::builder(report(10))
        .caption("quarterly numbers")
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let calls = harness.join().await.uploader.calls().await;
    assert_eq!(calls[0].caption.as_deref(), Some("quarterly numbers"));
}

#[tokio::test]
async fn explicit_caption_wins() {
    let mut harness = PipelineHarness::builder(report(10))
        .caption("from the composer")
        .build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(Some("explicit".into())).await.unwrap();
    harness.wait_for_transition(is_done).await;

    let calls = harness.join().await.uploader.calls().await;
    assert_eq!(calls[0].caption.as_deref(), Some("explicit"));
}

#[tokio::test]
async fn finished_pipeline_rejects_commands() {
    let mut harness = PipelineHarness::builder(report(10)).build();

    harness.wait_for_transition(is_ready).await;
    harness.handle.send(None).await.unwrap();
    harness.wait_for_transition(is_done).await;
    harness
        .handle
        .wait_for(SendState::is_terminal)
        .await
        .unwrap();

    let err = harness.handle.send(None).await.unwrap_err();
    assert!(matches!(err, CourierError::PipelineClosed));
    let err = harness.handle.cancel_and_dismiss().await.unwrap_err();
    assert!(matches!(err, CourierError::PipelineClosed));
}
