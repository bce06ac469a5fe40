// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier send pipeline.
//!
//! [`CourierError`] covers failures of the pipeline machinery itself. The
//! remaining types describe why a send attempt failed; they are cheap to
//! clone because they are stored inside [`SendState`](crate::types::SendState)
//! and broadcast to every subscriber.

use thiserror::Error;

/// The primary error type for pipeline operations that are not part of the
/// observable send state.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator failed outside of a send attempt (e.g. the server
    /// refused to report its upload limit).
    #[error("{name} failed: {message}")]
    Collaborator { name: String, message: String },

    /// A command was issued to a pipeline instance that already finished.
    #[error("send pipeline is closed")]
    PipelineClosed,

    /// Local filesystem errors.
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Pre-processing (compression, thumbnailing, metadata extraction) failed.
///
/// Always retryable: a retry runs pre-processing again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pre-processing failed: {message}")]
pub struct PreProcessingError {
    pub message: String,
}

impl PreProcessingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Upload of a prepared artifact failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Connectivity problem between the client and the server.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected or failed the request.
    #[error("server error: {0}")]
    Server(String),

    /// The server refused the payload because of its size.
    #[error("payload of {size} bytes exceeds the server limit of {max} bytes")]
    PayloadTooLarge { size: u64, max: u64 },
}

impl UploadError {
    /// Whether retrying with the same artifact can succeed.
    ///
    /// An oversized payload stays oversized until the optimization config
    /// changes, so it is the only non-retryable cause.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UploadError::PayloadTooLarge { .. })
    }
}

/// A locally detected condition that blocks an upload before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("attachment of {size} bytes is too large (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// The failure stored in [`SendState::Failure`](crate::types::SendState::Failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendFailure {
    #[error(transparent)]
    PreProcessing(#[from] PreProcessingError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Coarse classification of a [`SendFailure`] for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Processing,
    Network,
    Rejected,
    TooLarge,
}

impl SendFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            SendFailure::PreProcessing(_) => FailureKind::Processing,
            SendFailure::Upload(UploadError::Transport(_)) => FailureKind::Network,
            SendFailure::Upload(UploadError::Server(_)) => FailureKind::Rejected,
            SendFailure::Upload(UploadError::PayloadTooLarge { .. }) => FailureKind::TooLarge,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SendFailure::PreProcessing(_) => true,
            SendFailure::Upload(e) => e.is_retryable(),
        }
    }
}
