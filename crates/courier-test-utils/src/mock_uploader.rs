// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock uploader with scripted progress and outcomes.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::UploadError;
use courier_core::traits::{Collaborator, ProgressSink, Uploader};
use courier_core::types::{Artifact, ArtifactId};

use crate::gate::Gate;

/// One recorded upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub artifact_id: ArtifactId,
    pub caption: Option<String>,
}

/// An uploader that reports fixed progress steps.
///
/// Outcomes are popped from a FIFO queue; an empty queue means success.
/// A failing call returns before reporting any progress.
pub struct MockUploader {
    progress_steps: Vec<f64>,
    outcomes: Arc<Mutex<VecDeque<Result<(), UploadError>>>>,
    calls: Arc<Mutex<Vec<UploadCall>>>,
    completed: Arc<Mutex<usize>>,
    gate: Option<Gate>,
}

impl MockUploader {
    /// Reports `0.5` then `1.0`.
    pub fn new() -> Self {
        Self {
            progress_steps: vec![0.5, 1.0],
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(Mutex::new(0)),
            gate: None,
        }
    }

    pub fn with_outcomes(outcomes: Vec<Result<(), UploadError>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..Self::new()
        }
    }

    pub fn progress_steps(mut self, steps: Vec<f64>) -> Self {
        self.progress_steps = steps;
        self
    }

    /// Hold every call until `gate` opens.
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Calls that ran to a successful end without being dropped.
    pub async fn completed(&self) -> usize {
        *self.completed.lock().await
    }
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl Collaborator for MockUploader {
    fn name(&self) -> &str {
        "mock-uploader"
    }
}

#[async_trait]
impl Uploader for MockUploader {
    async fn upload(
        &self,
        artifact: &Artifact,
        caption: Option<&str>,
        progress: ProgressSink,
    ) -> Result<(), UploadError> {
        self.calls.lock().await.push(UploadCall {
            artifact_id: artifact.id,
            caption: caption.map(str::to_string),
        });

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        self.outcomes.lock().await.pop_front().unwrap_or(Ok(()))?;

        for step in &self.progress_steps {
            progress(*step);
        }
        *self.completed.lock().await += 1;
        Ok(())
    }
}
