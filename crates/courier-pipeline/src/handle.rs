// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client side of a running pipeline.

use courier_core::error::{CourierError, PreconditionError};
use courier_core::types::{DismissReason, SendState};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::command::PipelineCommand;
use crate::scope::PipelineScopes;

/// Handle to a spawned send pipeline.
///
/// Dropping every handle closes the screen: screen-scoped work is cancelled
/// and cleaned up, a queued upload keeps running.
pub struct PipelineHandle {
    pub(crate) commands: mpsc::Sender<PipelineCommand>,
    pub(crate) state: watch::Receiver<SendState>,
    pub(crate) first_subscriber: Option<broadcast::Receiver<SendState>>,
    pub(crate) subscriber_template: broadcast::Receiver<SendState>,
    pub(crate) precondition: watch::Receiver<Option<PreconditionError>>,
    pub(crate) dismiss: watch::Receiver<Option<DismissReason>>,
    pub(crate) scopes: PipelineScopes,
    pub(crate) task: JoinHandle<()>,
}

impl PipelineHandle {
    /// Request an upload. `caption` overrides the configured caption source.
    pub async fn send(&self, caption: Option<String>) -> Result<(), CourierError> {
        self.command(PipelineCommand::Send { caption }).await
    }

    pub async fn cancel_and_dismiss(&self) -> Result<(), CourierError> {
        self.command(PipelineCommand::CancelAndDismiss).await
    }

    pub async fn cancel_and_clear_send_state(&self) -> Result<(), CourierError> {
        self.command(PipelineCommand::CancelAndClearSendState).await
    }

    async fn command(&self, command: PipelineCommand) -> Result<(), CourierError> {
        if self.state.borrow().is_terminal() || self.task.is_finished() {
            return Err(CourierError::PipelineClosed);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| CourierError::PipelineClosed)
    }

    /// The latest published state.
    pub fn state(&self) -> SendState {
        self.state.borrow().clone()
    }

    /// Every transition, in order.
    ///
    /// The first call returns a receiver that starts at `Idle`; later calls
    /// only see transitions published after they subscribed.
    pub fn subscribe(&mut self) -> broadcast::Receiver<SendState> {
        self.first_subscriber
            .take()
            .unwrap_or_else(|| self.subscriber_template.resubscribe())
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// Only the latest state is checked, so short-lived states can be
    /// skipped; use [`subscribe`](Self::subscribe) to observe every one.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SendState) -> bool,
    ) -> Result<SendState, CourierError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| predicate(s))
            .await
            .map(|s| s.clone())
            .map_err(|_| CourierError::PipelineClosed)
    }

    /// The current "file too large" verdict.
    pub fn precondition(&self) -> Option<PreconditionError> {
        self.precondition.borrow().clone()
    }

    /// Wait until a size check has reported at least once, then return the
    /// latest verdict.
    pub async fn precondition_checked(&self) -> Option<PreconditionError> {
        let mut precondition = self.precondition.clone();
        // An error means the pipeline finished; the last verdict still holds.
        let _ = precondition.changed().await;
        precondition.borrow().clone()
    }

    /// Every verdict as it is published, including ones that refuse a `Send`.
    pub fn precondition_updates(&self) -> watch::Receiver<Option<PreconditionError>> {
        self.precondition.clone()
    }

    pub fn file_too_large(&self) -> bool {
        self.precondition.borrow().is_some()
    }

    /// Resolves when the screen may close, or with `None` if the pipeline
    /// finished without allowing it.
    pub async fn dismissed(&self) -> Option<DismissReason> {
        let mut dismiss = self.dismiss.clone();
        dismiss.wait_for(Option::is_some).await.ok().and_then(|r| *r)
    }

    /// Signal that the hosting screen was torn down.
    pub fn close_screen(&self) {
        self.scopes.screen.cancel();
    }

    /// Wait for the pipeline, including its cleanups, to finish.
    ///
    /// Consumes the handle, which closes the screen.
    pub async fn join(self) -> Result<SendState, CourierError> {
        let PipelineHandle {
            commands,
            state,
            task,
            ..
        } = self;
        drop(commands);
        task.await
            .map_err(|e| CourierError::Internal(format!("send pipeline task failed: {e}")))?;
        let final_state = state.borrow().clone();
        Ok(final_state)
    }
}
