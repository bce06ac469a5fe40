// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The send pipeline actor.
//!
//! One actor owns one attachment. Commands from the handle, results from
//! spawned tasks and scope cancellations are all handled on the actor's
//! loop, so state transitions are totally ordered.

use std::collections::HashSet;
use std::sync::Arc;

use courier_core::error::PreconditionError;
use courier_core::traits::{
    CaptionSource, PreProcessor, ProgressSink, TemporaryFileCleaner, UploadabilityEstimator,
    Uploader,
};
use courier_core::types::{
    AppliedOptimization, Artifact, ArtifactId, Attachment, DismissReason, OptimizationConfig,
    SendState,
};
use courier_core::{PreProcessingError, UploadError};
use strum::Display;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, warn};

use crate::command::{PipelineCommand, TaskEvent};
use crate::policy::PreProcessPolicy;
use crate::scope::{PipelineScopes, TaskLifetime, TaskSlot};
use crate::size_check::check_upload_precondition;

/// Collaborators a pipeline cannot run without.
#[derive(Clone)]
pub struct Collaborators {
    pub preprocessor: Arc<dyn PreProcessor>,
    pub uploader: Arc<dyn Uploader>,
    pub cleaner: Arc<dyn TemporaryFileCleaner>,
}

/// Sending halves of the channels observed through the handle.
pub(crate) struct Outputs {
    pub state: watch::Sender<SendState>,
    pub transitions: broadcast::Sender<SendState>,
    pub precondition: watch::Sender<Option<PreconditionError>>,
    pub dismiss: watch::Sender<Option<DismissReason>>,
}

pub(crate) struct ControllerParts {
    pub attachment: Arc<Attachment>,
    pub policy: PreProcessPolicy,
    pub queued_background: bool,
    pub optimization: watch::Receiver<OptimizationConfig>,
    pub collaborators: Collaborators,
    pub estimator: Option<Arc<dyn UploadabilityEstimator>>,
    pub caption_source: Option<Arc<dyn CaptionSource>>,
    pub scopes: PipelineScopes,
    pub commands: mpsc::Receiver<PipelineCommand>,
    pub outputs: Outputs,
}

struct ProcessingRun {
    slot: TaskSlot,
    applied: AppliedOptimization,
    display_progress: bool,
}

struct UploadRun {
    slot: TaskSlot,
    artifact: Arc<Artifact>,
    last_progress: f64,
}

/// The current artifact and the optimization it was produced with.
struct HeldArtifact {
    artifact: Arc<Artifact>,
    applied: AppliedOptimization,
}

/// A `Send` accepted while pre-processing is still running.
struct PendingSend {
    caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
enum Teardown {
    Dismissed,
    ScreenClosed,
    SessionEnded,
}

pub(crate) struct Controller {
    attachment: Arc<Attachment>,
    policy: PreProcessPolicy,
    queued_background: bool,
    optimization: watch::Receiver<OptimizationConfig>,
    preprocessor: Arc<dyn PreProcessor>,
    uploader: Arc<dyn Uploader>,
    cleaner: Arc<dyn TemporaryFileCleaner>,
    estimator: Option<Arc<dyn UploadabilityEstimator>>,
    caption_source: Option<Arc<dyn CaptionSource>>,
    scopes: PipelineScopes,

    commands: mpsc::Receiver<PipelineCommand>,
    commands_open: bool,
    task_tx: mpsc::UnboundedSender<TaskEvent>,
    task_rx: mpsc::UnboundedReceiver<TaskEvent>,
    outputs: Outputs,

    state: SendState,
    next_attempt: u64,
    processing: Option<ProcessingRun>,
    upload: Option<UploadRun>,
    artifact: Option<HeldArtifact>,
    pending_send: Option<PendingSend>,
    /// A `Send` held until the running size check reports.
    awaiting_verdict: Option<PendingSend>,
    size_check: Option<TaskSlot>,
    screen_closed: bool,

    retired: HashSet<ArtifactId>,
    original_released: bool,
    cleanups: TaskTracker,
}

impl Controller {
    pub(crate) fn new(parts: ControllerParts) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        Self {
            attachment: parts.attachment,
            policy: parts.policy,
            queued_background: parts.queued_background,
            optimization: parts.optimization,
            preprocessor: parts.collaborators.preprocessor,
            uploader: parts.collaborators.uploader,
            cleaner: parts.collaborators.cleaner,
            estimator: parts.estimator,
            caption_source: parts.caption_source,
            scopes: parts.scopes,
            commands: parts.commands,
            commands_open: true,
            task_tx,
            task_rx,
            outputs: parts.outputs,
            state: SendState::Idle,
            next_attempt: 0,
            processing: None,
            upload: None,
            artifact: None,
            pending_send: None,
            awaiting_verdict: None,
            size_check: None,
            screen_closed: false,
            retired: HashSet::new(),
            original_released: false,
            cleanups: TaskTracker::new(),
        }
    }

    /// Run until the pipeline reaches a terminal point, then wait for every
    /// cleanup it started.
    pub(crate) async fn run(mut self) {
        info!(
            kind = %self.attachment.kind,
            policy = %self.policy,
            queued_background = self.queued_background,
            "send pipeline started"
        );

        self.start_size_check();
        if self.policy.starts_at_creation() {
            self.start_processing(false);
        }

        let screen = self.scopes.screen.clone();
        let session = self.scopes.session.clone();

        loop {
            let flow = tokio::select! {
                biased;
                _ = session.cancelled() => self.teardown(Teardown::SessionEnded).await,
                _ = screen.cancelled(), if !self.screen_closed => self.on_screen_closed().await,
                Some(event) = self.task_rx.recv() => self.on_task_event(event).await,
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        debug!("all pipeline handles dropped");
                        self.commands_open = false;
                        if self.screen_closed {
                            Flow::Continue
                        } else {
                            self.on_screen_closed().await
                        }
                    }
                },
            };
            if flow == Flow::Finish {
                break;
            }
        }

        if let Some(check) = self.size_check.take() {
            check.cancel_and_wait().await;
        }
        self.cleanups.close();
        self.cleanups.wait().await;
        info!(state = %self.state, "send pipeline finished");
    }

    // --- commands ---

    async fn on_command(&mut self, command: PipelineCommand) -> Flow {
        debug!(?command, state = %self.state, "command received");
        match command {
            PipelineCommand::Send { caption } => {
                self.on_send(caption);
                Flow::Continue
            }
            PipelineCommand::CancelAndDismiss => self.on_cancel_and_dismiss().await,
            PipelineCommand::CancelAndClearSendState => {
                self.on_cancel_and_clear().await;
                Flow::Continue
            }
        }
    }

    fn on_send(&mut self, caption: Option<String>) {
        if self.upload.is_some() || self.pending_send.is_some() || self.awaiting_verdict.is_some()
        {
            debug!("send already in flight, ignoring");
            return;
        }

        let caption = caption.or_else(|| {
            self.caption_source
                .as_ref()
                .and_then(|source| source.caption_text())
        });

        if self.estimator.is_some() {
            self.awaiting_verdict = Some(PendingSend { caption });
            self.start_size_check();
            return;
        }
        self.proceed_send(caption);
    }

    /// Upload the held artifact or pre-process first. The size check has
    /// already passed.
    fn proceed_send(&mut self, caption: Option<String>) {
        let applied = self.applied_now();

        if let Some(run) = self.processing.as_mut() {
            if run.applied == applied {
                self.pending_send = Some(PendingSend { caption });
                if !run.display_progress {
                    run.display_progress = true;
                    self.publish(SendState::Processing {
                        display_progress: true,
                    });
                }
            } else {
                debug!("optimization changed during pre-processing, restarting");
                self.pending_send = Some(PendingSend { caption });
                self.start_processing(true);
            }
            return;
        }

        match self.artifact.as_ref().map(|held| (held.applied, held.artifact.clone())) {
            Some((held_applied, artifact)) if held_applied == applied => {
                self.start_upload(artifact, caption);
            }
            Some(_) => {
                debug!("optimization changed since pre-processing, discarding artifact");
                self.discard_held_artifact();
                self.pending_send = Some(PendingSend { caption });
                self.start_processing(true);
            }
            None => {
                self.pending_send = Some(PendingSend { caption });
                self.start_processing(true);
            }
        }
    }

    async fn on_cancel_and_dismiss(&mut self) -> Flow {
        if self.upload_survives_screen() {
            self.cancel_processing().await;
            self.pending_send = None;
            self.screen_closed = true;
            self.fire_dismiss(DismissReason::Cancelled);
            info!("screen dismissed, queued upload continues");
            return Flow::Continue;
        }
        self.teardown(Teardown::Dismissed).await
    }

    async fn on_cancel_and_clear(&mut self) {
        if let Some(run) = self.upload.take() {
            debug!(attempt = run.slot.attempt(), "cancelling upload");
            run.slot.cancel_and_wait().await;
        }
        self.pending_send = None;
        self.awaiting_verdict = None;

        let next = if let Some(held) = &self.artifact {
            SendState::ReadyToUpload {
                artifact: held.artifact.clone(),
            }
        } else if let Some(run) = self.processing.as_mut() {
            run.display_progress = false;
            SendState::Processing {
                display_progress: false,
            }
        } else {
            SendState::Idle
        };

        if next != self.state {
            self.publish(next);
        }
    }

    async fn on_screen_closed(&mut self) -> Flow {
        self.screen_closed = true;
        if self.upload_survives_screen() {
            self.cancel_processing().await;
            self.pending_send = None;
            info!("screen closed, queued upload continues");
            return Flow::Continue;
        }
        self.teardown(Teardown::ScreenClosed).await
    }

    // --- task events ---

    async fn on_task_event(&mut self, event: TaskEvent) -> Flow {
        match event {
            TaskEvent::Processed { attempt, result } => self.on_processed(attempt, result),
            TaskEvent::Progress { attempt, fraction } => {
                self.on_progress(attempt, fraction);
                Flow::Continue
            }
            TaskEvent::Uploaded { attempt, result } => self.on_uploaded(attempt, result).await,
            TaskEvent::SizeChecked { attempt, verdict } => {
                self.on_size_checked(attempt, verdict);
                Flow::Continue
            }
        }
    }

    fn on_size_checked(&mut self, attempt: u64, verdict: Option<PreconditionError>) {
        let is_current = self
            .size_check
            .as_ref()
            .is_some_and(|slot| slot.attempt() == attempt);
        if !is_current {
            return;
        }
        self.size_check = None;
        self.outputs.precondition.send_replace(verdict.clone());

        let Some(request) = self.awaiting_verdict.take() else {
            return;
        };
        match verdict {
            Some(error) => warn!(%error, "send refused"),
            None => self.proceed_send(request.caption),
        }
    }

    fn on_processed(&mut self, attempt: u64, result: Result<Artifact, PreProcessingError>) -> Flow {
        let is_current = self
            .processing
            .as_ref()
            .is_some_and(|run| run.slot.attempt() == attempt);
        if !is_current {
            if let Ok(artifact) = result {
                debug!(attempt, artifact_id = %artifact.id, "discarding artifact of superseded run");
                self.retire_artifact(&artifact);
            }
            return Flow::Continue;
        }
        let Some(run) = self.processing.take() else {
            return Flow::Continue;
        };

        let artifact = match result {
            Ok(artifact) => artifact,
            Err(error) => {
                warn!(attempt, %error, "pre-processing failed");
                self.pending_send = None;
                self.publish(SendState::Failure {
                    error: error.into(),
                    artifact: None,
                });
                return Flow::Continue;
            }
        };

        debug!(attempt, artifact_id = %artifact.id, size = artifact.size, "pre-processing finished");

        if self.pending_send.is_some() && self.applied_now() != run.applied {
            debug!("optimization changed during pre-processing, reprocessing");
            self.retire_artifact(&artifact);
            self.start_processing(true);
            return Flow::Continue;
        }

        let artifact = Arc::new(artifact);
        self.artifact = Some(HeldArtifact {
            artifact: artifact.clone(),
            applied: run.applied,
        });
        self.publish(SendState::ReadyToUpload {
            artifact: artifact.clone(),
        });

        if let Some(pending) = self.pending_send.take() {
            self.start_upload(artifact, pending.caption);
        }
        Flow::Continue
    }

    fn on_progress(&mut self, attempt: u64, fraction: f64) {
        let Some(run) = self.upload.as_mut() else {
            return;
        };
        if run.slot.attempt() != attempt || !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction <= run.last_progress {
            return;
        }
        run.last_progress = fraction;
        let artifact = run.artifact.clone();
        self.publish(SendState::Uploading {
            progress: fraction,
            artifact,
        });
    }

    async fn on_uploaded(&mut self, attempt: u64, result: Result<(), UploadError>) -> Flow {
        let is_current = self
            .upload
            .as_ref()
            .is_some_and(|run| run.slot.attempt() == attempt);
        if !is_current {
            return Flow::Continue;
        }
        let Some(run) = self.upload.take() else {
            return Flow::Continue;
        };

        match result {
            Ok(()) => {
                info!(attempt, artifact_id = %run.artifact.id, "upload finished");
                self.cancel_processing().await;
                self.artifact = None;
                self.retire_artifact(&run.artifact);
                self.release_original();
                self.publish(SendState::Done);
                self.fire_dismiss(DismissReason::Sent);
                Flow::Finish
            }
            Err(error) if self.screen_closed => {
                warn!(attempt, %error, "background upload failed, nobody left to retry");
                self.artifact = None;
                self.retire_artifact(&run.artifact);
                self.release_original();
                self.publish(SendState::Failure {
                    error: error.into(),
                    artifact: None,
                });
                Flow::Finish
            }
            Err(error) => {
                warn!(attempt, %error, retryable = error.is_retryable(), "upload failed");
                self.publish(SendState::Failure {
                    error: error.into(),
                    artifact: Some(run.artifact),
                });
                Flow::Continue
            }
        }
    }

    // --- tasks ---

    fn allocate_attempt(&mut self) -> u64 {
        self.next_attempt += 1;
        self.next_attempt
    }

    fn start_processing(&mut self, display_progress: bool) {
        if let Some(previous) = self.processing.take() {
            previous.slot.cancel();
        }

        let attempt = self.allocate_attempt();
        let config = *self.optimization.borrow();
        let applied = config.applied_to(&self.attachment);
        let preprocessor = self.preprocessor.clone();
        let attachment = self.attachment.clone();
        let events = self.task_tx.clone();

        let slot = TaskSlot::spawn(
            attempt,
            async move {
                let result = preprocessor.process(&attachment, &config).await;
                let _ = events.send(TaskEvent::Processed { attempt, result });
            }
            .in_current_span(),
        );
        debug!(
            attempt,
            preprocessor = self.preprocessor.name(),
            ?applied,
            display_progress,
            "pre-processing started"
        );

        self.processing = Some(ProcessingRun {
            slot,
            applied,
            display_progress,
        });
        self.publish(SendState::Processing { display_progress });
    }

    fn start_upload(&mut self, artifact: Arc<Artifact>, caption: Option<String>) {
        if let Some(previous) = self.upload.take() {
            previous.slot.cancel();
        }

        let attempt = self.allocate_attempt();
        let uploader = self.uploader.clone();
        let payload = artifact.clone();
        let events = self.task_tx.clone();
        let progress_events = self.task_tx.clone();
        let progress: ProgressSink = Arc::new(move |fraction| {
            let _ = progress_events.send(TaskEvent::Progress { attempt, fraction });
        });

        let mut slot = TaskSlot::spawn(
            attempt,
            async move {
                let result = uploader.upload(&payload, caption.as_deref(), progress).await;
                let _ = events.send(TaskEvent::Uploaded { attempt, result });
            }
            .in_current_span(),
        );
        debug!(
            attempt,
            uploader = self.uploader.name(),
            artifact_id = %artifact.id,
            "upload started"
        );

        self.publish(SendState::Uploading {
            progress: 0.0,
            artifact: artifact.clone(),
        });

        if self.queued_background && slot.promote() {
            info!(attempt, "upload queued in background");
            self.fire_dismiss(DismissReason::Queued);
        }

        self.upload = Some(UploadRun {
            slot,
            artifact,
            last_progress: 0.0,
        });
    }

    /// Re-run the size check with the current config. Without an estimator
    /// the verdict is always "fits".
    fn start_size_check(&mut self) {
        let Some(estimator) = self.estimator.clone() else {
            self.outputs.precondition.send_replace(None);
            return;
        };
        if let Some(previous) = self.size_check.take() {
            previous.cancel();
        }

        let attempt = self.allocate_attempt();
        let config = *self.optimization.borrow();
        let attachment = self.attachment.clone();
        let events = self.task_tx.clone();
        let slot = TaskSlot::spawn(
            attempt,
            async move {
                let verdict =
                    check_upload_precondition(estimator.as_ref(), &attachment, &config).await;
                let _ = events.send(TaskEvent::SizeChecked { attempt, verdict });
            }
            .in_current_span(),
        );
        debug!(attempt, estimator = self.estimator_name(), "size check started");
        self.size_check = Some(slot);
    }

    fn estimator_name(&self) -> &str {
        self.estimator
            .as_ref()
            .map_or("none", |estimator| estimator.name())
    }

    async fn cancel_processing(&mut self) {
        if let Some(run) = self.processing.take() {
            debug!(attempt = run.slot.attempt(), "cancelling pre-processing");
            run.slot.cancel_and_wait().await;
        }
    }

    fn upload_survives_screen(&self) -> bool {
        self.upload
            .as_ref()
            .is_some_and(|run| run.slot.lifetime() == TaskLifetime::Session)
    }

    /// Cancel everything, release every temporary resource and finish.
    async fn teardown(&mut self, reason: Teardown) -> Flow {
        self.cancel_processing().await;
        if let Some(run) = self.upload.take() {
            run.slot.cancel_and_wait().await;
        }
        if let Some(check) = self.size_check.take() {
            check.cancel_and_wait().await;
        }
        self.pending_send = None;
        self.awaiting_verdict = None;

        // Runs that completed just before cancellation may have queued an
        // artifact nobody will claim.
        while let Ok(event) = self.task_rx.try_recv() {
            if let TaskEvent::Processed {
                result: Ok(artifact),
                ..
            } = event
            {
                self.retire_artifact(&artifact);
            }
        }

        self.discard_held_artifact();
        self.release_original();
        self.publish(SendState::Done);
        if reason == Teardown::Dismissed {
            self.fire_dismiss(DismissReason::Cancelled);
        }
        info!(%reason, "send pipeline torn down");
        Flow::Finish
    }

    // --- resources ---

    fn discard_held_artifact(&mut self) {
        if let Some(held) = self.artifact.take() {
            self.retire_artifact(&held.artifact);
        }
    }

    /// Hand an artifact to the cleaner, at most once per artifact.
    fn retire_artifact(&mut self, artifact: &Artifact) {
        if !self.retired.insert(artifact.id) {
            return;
        }
        let cleaner = self.cleaner.clone();
        let artifact = artifact.clone();
        self.cleanups.spawn(
            async move {
                if let Err(e) = cleaner.delete_artifact(&artifact).await {
                    warn!(artifact_id = %artifact.id, error = %e, "failed to delete artifact");
                }
            }
            .in_current_span(),
        );
    }

    fn release_original(&mut self) {
        if self.original_released {
            return;
        }
        self.original_released = true;
        let cleaner = self.cleaner.clone();
        let attachment = self.attachment.clone();
        self.cleanups.spawn(
            async move {
                if let Err(e) = cleaner.delete_original(&attachment).await {
                    warn!(error = %e, "failed to release original attachment");
                }
            }
            .in_current_span(),
        );
    }

    // --- outputs ---

    fn applied_now(&self) -> AppliedOptimization {
        self.optimization.borrow().applied_to(&self.attachment)
    }

    fn publish(&mut self, next: SendState) {
        if self.state.is_terminal() {
            warn!(rejected = %next, "transition after done ignored");
            return;
        }
        debug!(from = %self.state, to = %next, "send state transition");
        self.state = next.clone();
        self.outputs.state.send_replace(next.clone());
        // No subscribers is fine.
        let _ = self.outputs.transitions.send(next);
    }

    fn fire_dismiss(&mut self, reason: DismissReason) {
        let fired = self.outputs.dismiss.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
        if fired {
            info!(%reason, "screen may be dismissed");
        }
    }
}
