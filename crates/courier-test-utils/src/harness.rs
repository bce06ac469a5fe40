// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires mock collaborators into a live pipeline and records transitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::timeout;

use courier_core::types::{Attachment, OptimizationConfig, SendState};
use courier_pipeline::{
    Collaborators, PipelineHandle, PipelineScopes, PresetSizeEstimator, SendPipeline,
};

use crate::mock_cleaner::MockCleaner;
use crate::mock_limits::{MockUploadLimit, StaticCaption};
use crate::mock_preprocessor::MockPreProcessor;
use crate::mock_uploader::MockUploader;

/// Upper bound on any single wait in a harness-driven test.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for [`PipelineHarness`].
pub struct PipelineHarnessBuilder {
    attachment: Attachment,
    preprocessor: MockPreProcessor,
    uploader: MockUploader,
    optimization: OptimizationConfig,
    optimization_ui_required: Option<bool>,
    queued_background: bool,
    max_upload_size: Option<MockUploadLimit>,
    caption: Option<String>,
    scopes: PipelineScopes,
}

impl PipelineHarnessBuilder {
    pub fn new(attachment: Attachment) -> Self {
        Self {
            attachment,
            preprocessor: MockPreProcessor::new(),
            uploader: MockUploader::new(),
            optimization: OptimizationConfig::default(),
            optimization_ui_required: None,
            queued_background: false,
            max_upload_size: None,
            caption: None,
            scopes: PipelineScopes::new(),
        }
    }

    pub fn preprocessor(mut self, preprocessor: MockPreProcessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn uploader(mut self, uploader: MockUploader) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn optimization(mut self, config: OptimizationConfig) -> Self {
        self.optimization = config;
        self
    }

    pub fn optimization_ui_required(mut self, required: bool) -> Self {
        self.optimization_ui_required = Some(required);
        self
    }

    pub fn queued_background(mut self, queued: bool) -> Self {
        self.queued_background = queued;
        self
    }

    /// Enable the size precondition against a fixed server limit.
    pub fn max_upload_size(mut self, max: u64) -> Self {
        self.max_upload_size = Some(MockUploadLimit::new(Some(max)));
        self
    }

    /// Enable the size precondition against a scripted limit source.
    pub fn upload_limit(mut self, limit: MockUploadLimit) -> Self {
        self.max_upload_size = Some(limit);
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn scopes(mut self, scopes: PipelineScopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Spawn the pipeline. Must run inside a tokio runtime.
    pub fn build(self) -> PipelineHarness {
        let preprocessor = Arc::new(self.preprocessor);
        let uploader = Arc::new(self.uploader);
        let cleaner = Arc::new(MockCleaner::new());
        let (optimization, optimization_rx) = watch::channel(self.optimization);

        let mut pipeline = SendPipeline::new(
            self.attachment,
            Collaborators {
                preprocessor: preprocessor.clone(),
                uploader: uploader.clone(),
                cleaner: cleaner.clone(),
            },
        )
        .optimization(optimization_rx)
        .queued_background(self.queued_background)
        .scopes(self.scopes);

        if let Some(required) = self.optimization_ui_required {
            pipeline = pipeline.optimization_ui_required(required);
        }
        if let Some(limit) = self.max_upload_size {
            let estimator = PresetSizeEstimator::new(Arc::new(limit), u64::MAX);
            pipeline = pipeline.estimator(Arc::new(estimator));
        }
        if let Some(caption) = self.caption {
            pipeline = pipeline.caption_source(Arc::new(StaticCaption(Some(caption))));
        }

        let mut handle = pipeline.spawn();
        let transitions = handle.subscribe();

        PipelineHarness {
            handle,
            preprocessor,
            uploader,
            cleaner,
            optimization,
            transitions,
            seen: Vec::new(),
        }
    }
}

/// A running pipeline with mock collaborators.
pub struct PipelineHarness {
    pub handle: PipelineHandle,
    pub preprocessor: Arc<MockPreProcessor>,
    pub uploader: Arc<MockUploader>,
    pub cleaner: Arc<MockCleaner>,
    /// Drives the pipeline's optimization config.
    pub optimization: watch::Sender<OptimizationConfig>,
    transitions: broadcast::Receiver<SendState>,
    seen: Vec<SendState>,
}

/// What is left after a harness is joined.
pub struct FinishedHarness {
    pub state: SendState,
    pub transitions: Vec<SendState>,
    pub preprocessor: Arc<MockPreProcessor>,
    pub uploader: Arc<MockUploader>,
    pub cleaner: Arc<MockCleaner>,
}

impl FinishedHarness {
    /// Transitions rendered with their `Display` form.
    pub fn labels(&self) -> Vec<String> {
        self.transitions.iter().map(ToString::to_string).collect()
    }
}

impl PipelineHarness {
    pub fn builder(attachment: Attachment) -> PipelineHarnessBuilder {
        PipelineHarnessBuilder::new(attachment)
    }

    /// The next transition, or `None` once the pipeline has finished.
    ///
    /// # Panics
    /// If nothing happens within [`STEP_TIMEOUT`].
    pub async fn next_transition(&mut self) -> Option<SendState> {
        loop {
            let received = timeout(STEP_TIMEOUT, self.transitions.recv())
                .await
                .expect("timed out waiting for a send state transition");
            match received {
                Ok(state) => {
                    self.seen.push(state.clone());
                    return Some(state);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Consume transitions until one matches `predicate`. Transitions
    /// already consumed are not considered.
    ///
    /// # Panics
    /// If the pipeline finishes first or the wait times out.
    pub async fn wait_for_transition(
        &mut self,
        predicate: impl Fn(&SendState) -> bool,
    ) -> SendState {
        loop {
            match self.next_transition().await {
                Some(state) if predicate(&state) => return state,
                Some(_) => continue,
                None => panic!(
                    "pipeline finished without the expected state; saw {:?}",
                    self.labels()
                ),
            }
        }
    }

    /// Transitions observed so far.
    pub fn transitions(&self) -> &[SendState] {
        &self.seen
    }

    pub fn labels(&self) -> Vec<String> {
        self.seen.iter().map(ToString::to_string).collect()
    }

    /// Close the handle, wait for the pipeline and its cleanups, and collect
    /// the remaining transitions.
    ///
    /// # Panics
    /// If the pipeline does not finish within [`STEP_TIMEOUT`].
    pub async fn join(mut self) -> FinishedHarness {
        let state = timeout(STEP_TIMEOUT, self.handle.join())
            .await
            .expect("timed out joining the send pipeline")
            .expect("send pipeline task failed");

        while let Ok(next) = self.transitions.try_recv() {
            self.seen.push(next);
        }

        FinishedHarness {
            state,
            transitions: self.seen,
            preprocessor: self.preprocessor,
            uploader: self.uploader,
            cleaner: self.cleaner,
        }
    }
}
