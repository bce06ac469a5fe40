// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the pipeline, its collaborators and its observers.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::error::{PreconditionError, SendFailure};

/// Unique identifier for an attachment picked by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

impl AttachmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a pre-processed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What kind of media an attachment holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
    /// A recorded voice message. Never inferred from a mime type.
    Voice,
}

impl AttachmentKind {
    /// Classify a mime type. Anything that is not image, video or audio is a
    /// generic file.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let top = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => AttachmentKind::Image,
            "video" => AttachmentKind::Video,
            "audio" => AttachmentKind::Audio,
            _ => AttachmentKind::File,
        }
    }

    /// Whether the user may pick an optimization setting for this kind.
    pub fn supports_optimization(self) -> bool {
        matches!(self, AttachmentKind::Image | AttachmentKind::Video)
    }
}

/// Animated and already-efficient image formats are uploaded as is.
pub fn is_compressible_image(mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    mime.starts_with("image/") && mime != "image/gif" && mime != "image/webp"
}

/// Pixel dimensions of an image or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A local media attachment picked by the user. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Local reference to the original content.
    pub source: PathBuf,
    pub kind: AttachmentKind,
    pub mime_type: String,
    /// Size of the original in bytes.
    pub size: u64,
    pub duration: Option<Duration>,
    pub dimensions: Option<Dimensions>,
}

impl Attachment {
    /// Create an attachment whose kind is derived from its mime type.
    pub fn new(source: impl Into<PathBuf>, mime_type: impl Into<String>, size: u64) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: AttachmentId::new(),
            source: source.into(),
            kind: AttachmentKind::from_mime_type(&mime_type),
            mime_type,
            size,
            duration: None,
            dimensions: None,
        }
    }

    /// Create a recorded voice message.
    pub fn voice(
        source: impl Into<PathBuf>,
        mime_type: impl Into<String>,
        size: u64,
        duration: Duration,
    ) -> Self {
        Self {
            kind: AttachmentKind::Voice,
            duration: Some(duration),
            ..Self::new(source, mime_type, size)
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }
}

/// Video transcoding quality, ordered from best to smallest.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoCompressionPreset {
    High,
    #[default]
    Standard,
    Low,
}

impl VideoCompressionPreset {
    /// Longest edge, in pixels, of the transcoded output.
    pub fn max_edge(self) -> u32 {
        match self {
            VideoCompressionPreset::High => 1920,
            VideoCompressionPreset::Standard => 1280,
            VideoCompressionPreset::Low => 640,
        }
    }
}

/// User choice of how media is optimized before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub compress_images: bool,
    pub video_preset: VideoCompressionPreset,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            compress_images: true,
            video_preset: VideoCompressionPreset::Standard,
        }
    }
}

/// The part of an [`OptimizationConfig`] that can change the artifact
/// produced for a given attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedOptimization {
    None,
    Image { compress: bool },
    Video { preset: VideoCompressionPreset },
}

impl OptimizationConfig {
    /// Reduce this config to the settings that affect `attachment`.
    ///
    /// Two configs with the same applied optimization produce equivalent
    /// artifacts, so an artifact is only stale when this value changes.
    pub fn applied_to(&self, attachment: &Attachment) -> AppliedOptimization {
        match attachment.kind {
            AttachmentKind::Image if is_compressible_image(&attachment.mime_type) => {
                AppliedOptimization::Image {
                    compress: self.compress_images,
                }
            }
            AttachmentKind::Video => AppliedOptimization::Video {
                preset: self.video_preset,
            },
            _ => AppliedOptimization::None,
        }
    }
}

/// An upload-ready payload produced by pre-processing.
///
/// Owns its files on local storage until they are handed to the cleaner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub payload: PathBuf,
    pub thumbnail: Option<PathBuf>,
    pub mime_type: String,
    pub size: u64,
}

impl Artifact {
    pub fn new(payload: impl Into<PathBuf>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            id: ArtifactId::new(),
            payload: payload.into(),
            thumbnail: None,
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<PathBuf>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Every local file owned by this artifact.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.payload).chain(self.thumbnail.iter())
    }
}

/// Observable state of one send pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub enum SendState {
    /// No artifact and nothing in flight.
    Idle,
    /// Pre-processing in flight. `display_progress` is false for a silent
    /// prefetch.
    Processing { display_progress: bool },
    /// Pre-processing finished and nothing has been sent.
    ReadyToUpload { artifact: Arc<Artifact> },
    /// Upload in flight, `progress` in `[0, 1]`.
    Uploading { progress: f64, artifact: Arc<Artifact> },
    /// The last attempt failed. The artifact is kept when retrying can
    /// reuse it.
    Failure {
        error: SendFailure,
        artifact: Option<Arc<Artifact>>,
    },
    /// Sent, or dismissed. Nothing follows.
    Done,
}

impl SendState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SendState::Done)
    }

    /// The artifact referenced by this state, if any.
    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        match self {
            SendState::ReadyToUpload { artifact } | SendState::Uploading { artifact, .. } => {
                Some(artifact)
            }
            SendState::Failure { artifact, .. } => artifact.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendState::Idle => write!(f, "idle"),
            SendState::Processing {
                display_progress: true,
            } => write!(f, "processing"),
            SendState::Processing {
                display_progress: false,
            } => write!(f, "processing(silent)"),
            SendState::ReadyToUpload { .. } => write!(f, "ready_to_upload"),
            SendState::Uploading { progress, .. } => {
                write!(f, "uploading({:.0}%)", progress * 100.0)
            }
            SendState::Failure { error, .. } => write!(f, "failure({})", error.kind()),
            SendState::Done => write!(f, "done"),
        }
    }
}

/// Why the hosting screen may close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DismissReason {
    /// The upload continues in the background.
    Queued,
    /// The upload finished in the foreground.
    Sent,
    /// The user cancelled.
    Cancelled,
}

/// Estimated upload size for one video preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoUploadEstimation {
    pub preset: VideoCompressionPreset,
    pub size_in_bytes: u64,
    pub can_upload: bool,
}

/// Estimated upload size for one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub size_in_bytes: u64,
    pub can_upload: bool,
}

/// Result of an uploadability estimation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uploadability {
    /// Server maximum, `None` when the server imposes no limit.
    pub max_size: Option<u64>,
    pub estimates: Vec<SizeEstimate>,
}

impl Uploadability {
    /// The precondition failure, raised when no estimated item can be
    /// uploaded.
    pub fn too_large(&self) -> Option<PreconditionError> {
        let max = self.max_size?;
        if self.estimates.is_empty() || self.estimates.iter().any(|e| e.can_upload) {
            return None;
        }
        let size = self
            .estimates
            .iter()
            .map(|e| e.size_in_bytes)
            .min()
            .unwrap_or_default();
        Some(PreconditionError::TooLarge { size, max })
    }
}

/// Map an uploader's byte counters to a fraction in `[0, 1]`.
pub fn progress_fraction(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current as f64 / total as f64).clamp(0.0, 1.0)
}
