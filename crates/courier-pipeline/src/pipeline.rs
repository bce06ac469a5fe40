// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline construction.

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::traits::{CaptionSource, UploadabilityEstimator};
use courier_core::types::{Attachment, OptimizationConfig, SendState};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, info_span};

use crate::controller::{Collaborators, Controller, ControllerParts, Outputs};
use crate::handle::PipelineHandle;
use crate::policy::PreProcessPolicy;
use crate::scope::PipelineScopes;

/// Transitions buffered per subscriber before it starts lagging.
const TRANSITION_BUFFER: usize = 256;

const COMMAND_BUFFER: usize = 16;

/// Builder for one attachment's send pipeline.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use courier_core::types::Attachment;
/// # use courier_pipeline::{Collaborators, SendPipeline};
/// # async fn demo(collaborators: Collaborators) {
/// let attachment = Attachment::new("/tmp/staging/cat.jpg", "image/jpeg", 812_000);
/// let handle = SendPipeline::new(attachment, collaborators)
///     .queued_background(true)
///     .spawn();
/// handle.send(Some("look".into())).await.ok();
/// # }
/// ```
pub struct SendPipeline {
    attachment: Attachment,
    collaborators: Collaborators,
    optimization: Option<watch::Receiver<OptimizationConfig>>,
    optimization_ui_required: Option<bool>,
    queued_background: bool,
    caption_source: Option<Arc<dyn CaptionSource>>,
    estimator: Option<Arc<dyn UploadabilityEstimator>>,
    scopes: PipelineScopes,
}

impl SendPipeline {
    pub fn new(attachment: Attachment, collaborators: Collaborators) -> Self {
        Self {
            attachment,
            collaborators,
            optimization: None,
            optimization_ui_required: None,
            queued_background: false,
            caption_source: None,
            estimator: None,
            scopes: PipelineScopes::new(),
        }
    }

    /// Live optimization choice, read at every send attempt.
    pub fn optimization(mut self, optimization: watch::Receiver<OptimizationConfig>) -> Self {
        self.optimization = Some(optimization);
        self
    }

    /// Whether the user must pick an optimization before pre-processing.
    /// Defaults to true for images and videos.
    pub fn optimization_ui_required(mut self, required: bool) -> Self {
        self.optimization_ui_required = Some(required);
        self
    }

    pub fn queued_background(mut self, queued: bool) -> Self {
        self.queued_background = queued;
        self
    }

    pub fn caption_source(mut self, source: Arc<dyn CaptionSource>) -> Self {
        self.caption_source = Some(source);
        self
    }

    /// Enables the "file too large" precondition.
    pub fn estimator(mut self, estimator: Arc<dyn UploadabilityEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn scopes(mut self, scopes: PipelineScopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Apply the `[pipeline]` and `[optimization]` sections. An
    /// optimization receiver set explicitly takes precedence.
    pub fn from_config(mut self, config: &CourierConfig) -> Self {
        self.queued_background = config.pipeline.queued_background;
        self.optimization_ui_required = Some(
            config
                .pipeline
                .optimization_ui
                .required_for(self.attachment.kind),
        );
        if self.optimization.is_none() {
            let (_fixed, optimization) =
                watch::channel(config.optimization.to_optimization_config());
            self.optimization = Some(optimization);
        }
        self
    }

    /// Start the pipeline on the current tokio runtime.
    pub fn spawn(self) -> PipelineHandle {
        let policy = PreProcessPolicy::from_ui_required(
            self.optimization_ui_required
                .unwrap_or_else(|| self.attachment.kind.supports_optimization()),
        );
        let optimization = self.optimization.unwrap_or_else(|| {
            let (_fixed, optimization) = watch::channel(OptimizationConfig::default());
            optimization
        });

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SendState::Idle);
        let (transitions_tx, first_subscriber) = broadcast::channel(TRANSITION_BUFFER);
        let subscriber_template = first_subscriber.resubscribe();
        let _ = transitions_tx.send(SendState::Idle);
        let (precondition_tx, precondition_rx) = watch::channel(None);
        let (dismiss_tx, dismiss_rx) = watch::channel(None);

        let span = info_span!(
            "send_pipeline",
            attachment_id = %self.attachment.id,
        );
        let controller = Controller::new(ControllerParts {
            attachment: Arc::new(self.attachment),
            policy,
            queued_background: self.queued_background,
            optimization,
            collaborators: self.collaborators,
            estimator: self.estimator,
            caption_source: self.caption_source,
            scopes: self.scopes.clone(),
            commands: command_rx,
            outputs: Outputs {
                state: state_tx,
                transitions: transitions_tx,
                precondition: precondition_tx,
                dismiss: dismiss_tx,
            },
        });
        let task = tokio::spawn(controller.run().instrument(span));

        PipelineHandle {
            commands: command_tx,
            state: state_rx,
            first_subscriber: Some(first_subscriber),
            subscriber_template,
            precondition: precondition_rx,
            dismiss: dismiss_rx,
            scopes: self.scopes,
            task,
        }
    }
}
