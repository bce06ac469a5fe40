// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock pre-processor with scripted outcomes.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::PreProcessingError;
use courier_core::traits::{Collaborator, PreProcessor};
use courier_core::types::{Artifact, Attachment, OptimizationConfig};

use crate::gate::Gate;

/// A pre-processor that produces a fake artifact per call.
///
/// Outcomes are popped from a FIFO queue; an empty queue means success.
/// Calls are recorded before the optional gate is awaited.
pub struct MockPreProcessor {
    outcomes: Arc<Mutex<VecDeque<Result<(), PreProcessingError>>>>,
    calls: Arc<Mutex<Vec<OptimizationConfig>>>,
    produced: Arc<Mutex<Vec<Artifact>>>,
    gate: Option<Gate>,
}

impl MockPreProcessor {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            produced: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Pre-loaded outcomes, consumed one per call.
    pub fn with_outcomes(outcomes: Vec<Result<(), PreProcessingError>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..Self::new()
        }
    }

    /// Hold every call until `gate` opens.
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// The optimization config of every call, in order.
    pub async fn configs(&self) -> Vec<OptimizationConfig> {
        self.calls.lock().await.clone()
    }

    /// Every artifact handed back to the pipeline.
    pub async fn produced(&self) -> Vec<Artifact> {
        self.produced.lock().await.clone()
    }
}

impl Default for MockPreProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Collaborator for MockPreProcessor {
    fn name(&self) -> &str {
        "mock-preprocessor"
    }
}

#[async_trait]
impl PreProcessor for MockPreProcessor {
    async fn process(
        &self,
        attachment: &Attachment,
        config: &OptimizationConfig,
    ) -> Result<Artifact, PreProcessingError> {
        let call = {
            let mut calls = self.calls.lock().await;
            calls.push(*config);
            calls.len()
        };

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        self.outcomes.lock().await.pop_front().unwrap_or(Ok(()))?;

        let artifact = Artifact::new(
            format!("/tmp/courier-mock/{}-{call}.bin", attachment.id),
            attachment.mime_type.clone(),
            attachment.size,
        );
        self.produced.lock().await.push(artifact.clone());
        Ok(artifact)
    }
}
