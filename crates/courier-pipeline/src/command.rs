// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages processed by the pipeline actor.

use courier_core::error::{PreProcessingError, PreconditionError, UploadError};
use courier_core::types::Artifact;

/// User commands accepted by a running pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    /// Upload the attachment, pre-processing it first if needed.
    Send { caption: Option<String> },
    /// Abandon the attachment and close the screen.
    CancelAndDismiss,
    /// Stop an in-flight upload and return to the preview.
    CancelAndClearSendState,
}

/// Results reported by spawned tasks. `attempt` identifies the run that
/// produced the event so superseded runs can be recognised.
#[derive(Debug)]
pub(crate) enum TaskEvent {
    Processed {
        attempt: u64,
        result: Result<Artifact, PreProcessingError>,
    },
    Progress {
        attempt: u64,
        fraction: f64,
    },
    Uploaded {
        attempt: u64,
        result: Result<(), UploadError>,
    },
    SizeChecked {
        attempt: u64,
        verdict: Option<PreconditionError>,
    },
}
