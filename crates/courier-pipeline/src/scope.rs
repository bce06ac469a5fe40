// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task lifetimes and cancellable task slots.
//!
//! A pipeline lives inside two scopes. The screen scope ends when the
//! preview closes; the session scope ends when the account session does.
//! Every task starts screen-scoped. A queued upload is promoted to the
//! session scope once, so closing the screen no longer cancels it.

use std::future::Future;

use strum::Display;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The two cancellation scopes a pipeline runs in.
#[derive(Debug, Clone, Default)]
pub struct PipelineScopes {
    pub screen: CancellationToken,
    pub session: CancellationToken,
}

impl PipelineScopes {
    /// Independent screen and session scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A screen scope nested in an existing session: ending the session
    /// also ends the screen.
    pub fn within_session(session: &CancellationToken) -> Self {
        Self {
            screen: session.child_token(),
            session: session.clone(),
        }
    }
}

/// Which scope ends a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskLifetime {
    Screen,
    Session,
}

/// A spawned pre-processing or upload run.
///
/// Cancelling the slot drops the task's future at its next await point, so
/// a cancelled run never reports a result.
#[derive(Debug)]
pub(crate) struct TaskSlot {
    attempt: u64,
    lifetime: TaskLifetime,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskSlot {
    pub(crate) fn spawn<F>(attempt: u64, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let guard = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {}
                _ = work => {}
            }
        });
        Self {
            attempt,
            lifetime: TaskLifetime::Screen,
            token,
            handle,
        }
    }

    pub(crate) fn attempt(&self) -> u64 {
        self.attempt
    }

    pub(crate) fn lifetime(&self) -> TaskLifetime {
        self.lifetime
    }

    /// Move the task to the session scope. Returns `false` if it was
    /// already promoted.
    pub(crate) fn promote(&mut self) -> bool {
        if self.lifetime == TaskLifetime::Session {
            return false;
        }
        self.lifetime = TaskLifetime::Session;
        debug!(attempt = self.attempt, "task promoted to session scope");
        true
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and wait until the task has stopped.
    pub(crate) async fn cancel_and_wait(self) {
        self.token.cancel();
        // A panicking collaborator surfaces here; the run is gone either way.
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                warn!(attempt = self.attempt, "task panicked before cancellation");
            }
        }
    }
}
