// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static upload limit and caption sources.

use async_trait::async_trait;

use courier_core::error::CourierError;
use courier_core::traits::{CaptionSource, Collaborator, MaxUploadSizeProvider};

use crate::gate::Gate;

/// A server limit that never changes, or a server that cannot be reached.
pub struct MockUploadLimit {
    max: Result<Option<u64>, String>,
    gate: Option<Gate>,
}

impl MockUploadLimit {
    pub fn new(max: Option<u64>) -> Self {
        Self {
            max: Ok(max),
            gate: None,
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            max: Err(message.into()),
            gate: None,
        }
    }

    /// Hold every lookup until `gate` opens.
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Collaborator for MockUploadLimit {
    fn name(&self) -> &str {
        "mock-upload-limit"
    }
}

#[async_trait]
impl MaxUploadSizeProvider for MockUploadLimit {
    async fn max_upload_size(&self) -> Result<Option<u64>, CourierError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        self.max.clone().map_err(|message| CourierError::Collaborator {
            name: self.name().to_string(),
            message,
        })
    }
}

/// A caption that never changes.
pub struct StaticCaption(pub Option<String>);

impl CaptionSource for StaticCaption {
    fn caption_text(&self) -> Option<String> {
        self.0.clone()
    }
}
