// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload size estimation.
//!
//! Videos are estimated per compression preset from an optimal bitrate for
//! the preset's output resolution. Compressed images are estimated from their
//! downscaled pixel count. Every other attachment is estimated at its raw
//! size.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_config::CourierConfig;
use courier_core::traits::{Collaborator, MaxUploadSizeProvider, UploadabilityEstimator};
use courier_core::types::{
    AppliedOptimization, Attachment, AttachmentKind, Dimensions, OptimizationConfig,
    SizeEstimate, Uploadability, VideoCompressionPreset, VideoUploadEstimation,
};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// Frame rate assumed when estimating video bitrates.
pub const ESTIMATION_FRAME_RATE: u32 = 30;

/// Container and audio overhead added on top of the video stream.
const OVERHEAD_FACTOR: f64 = 1.1;

/// Bits per pixel per frame for H.264 at a reasonable quality.
const BITS_PER_PIXEL: f64 = 0.1;

/// Longest edge, in pixels, of a compressed image.
pub const IMAGE_SCALE_REF_EDGE: u32 = 640;

/// Upper bound for JPEG output at the compression quality used for images.
const JPEG_BYTES_PER_PIXEL: f64 = 0.5;

/// Output dimensions for a preset. Videos are never upscaled.
pub fn target_dimensions(source: Dimensions, preset: VideoCompressionPreset) -> Dimensions {
    scale_to_edge(source, preset.max_edge())
}

/// Upper bound on a compressed image's size. Never more than `raw_size`.
pub fn estimate_compressed_image(dimensions: Dimensions, raw_size: u64) -> u64 {
    let scaled = scale_to_edge(dimensions, IMAGE_SCALE_REF_EDGE);
    let pixels = u64::from(scaled.width) * u64::from(scaled.height);
    ((pixels as f64 * JPEG_BYTES_PER_PIXEL).round() as u64).min(raw_size)
}

fn scale_to_edge(source: Dimensions, max_edge: u32) -> Dimensions {
    let long_edge = source.width.max(source.height);
    if long_edge <= max_edge || long_edge == 0 {
        return source;
    }
    let scale = f64::from(max_edge) / f64::from(long_edge);
    Dimensions::new(
        (f64::from(source.width) * scale).round() as u32,
        (f64::from(source.height) * scale).round() as u32,
    )
}

/// Optimal bitrate in bits per second.
pub fn optimal_bitrate(dimensions: Dimensions, frame_rate: u32) -> u64 {
    let pixels = u64::from(dimensions.width) * u64::from(dimensions.height);
    (pixels as f64 * f64::from(frame_rate) * BITS_PER_PIXEL).round() as u64
}

/// Estimate the upload size of a video for every preset, best quality first.
pub fn estimate_video_presets(
    dimensions: Dimensions,
    duration: Duration,
    max_upload_size: Option<u64>,
) -> Vec<VideoUploadEstimation> {
    VideoCompressionPreset::iter()
        .map(|preset| {
            let bitrate = optimal_bitrate(target_dimensions(dimensions, preset), ESTIMATION_FRAME_RATE);
            let bytes_per_second = bitrate as f64 / 8.0;
            let size_in_bytes =
                (bytes_per_second * duration.as_secs_f64() * OVERHEAD_FACTOR).round() as u64;
            VideoUploadEstimation {
                preset,
                size_in_bytes,
                can_upload: max_upload_size.is_none_or(|max| size_in_bytes <= max),
            }
        })
        .collect()
}

/// First preset at or below `default` quality whose estimate fits.
pub fn find_best_video_preset(
    default: VideoCompressionPreset,
    estimations: &[VideoUploadEstimation],
) -> Option<VideoCompressionPreset> {
    estimations
        .iter()
        .find(|e| e.preset >= default && e.can_upload)
        .map(|e| e.preset)
}

/// [`UploadabilityEstimator`] backed by the server's upload limit.
pub struct PresetSizeEstimator {
    limits: Arc<dyn MaxUploadSizeProvider>,
    fallback_max_upload_size: u64,
}

impl PresetSizeEstimator {
    pub fn new(limits: Arc<dyn MaxUploadSizeProvider>, fallback_max_upload_size: u64) -> Self {
        Self {
            limits,
            fallback_max_upload_size,
        }
    }

    /// Falls back to `limits.fallback_max_upload_size`.
    pub fn from_config(limits: Arc<dyn MaxUploadSizeProvider>, config: &CourierConfig) -> Self {
        Self::new(limits, config.limits.fallback_max_upload_size)
    }

    /// The server limit, or the fallback when it cannot be fetched.
    pub async fn max_upload_size(&self) -> Option<u64> {
        match self.limits.max_upload_size().await {
            Ok(max) => max,
            Err(e) => {
                warn!(
                    provider = self.limits.name(),
                    error = %e,
                    fallback = self.fallback_max_upload_size,
                    "failed to fetch max upload size, using fallback"
                );
                Some(self.fallback_max_upload_size)
            }
        }
    }

    fn estimate_one(
        attachment: &Attachment,
        config: &OptimizationConfig,
        max: Option<u64>,
    ) -> SizeEstimate {
        let fits = |size: u64| max.is_none_or(|m| size <= m);
        let raw = SizeEstimate {
            size_in_bytes: attachment.size,
            can_upload: fits(attachment.size),
        };

        match (attachment.kind, config.applied_to(attachment)) {
            (AttachmentKind::Image, AppliedOptimization::Image { compress: true }) => {
                let Some(dimensions) = attachment.dimensions else {
                    return raw;
                };
                let size_in_bytes = estimate_compressed_image(dimensions, attachment.size);
                SizeEstimate {
                    size_in_bytes,
                    can_upload: fits(size_in_bytes),
                }
            }
            (AttachmentKind::Video, AppliedOptimization::Video { preset }) => {
                let Some((dimensions, duration)) = attachment.dimensions.zip(attachment.duration)
                else {
                    return raw;
                };
                // Pre-processing transcodes at the configured preset, so only
                // that estimate decides.
                let estimations = estimate_video_presets(dimensions, duration, max);
                let Some(chosen) = estimations.iter().find(|e| e.preset == preset) else {
                    return raw;
                };
                if !chosen.can_upload {
                    if let Some(smaller) = find_best_video_preset(preset, &estimations) {
                        debug!(%preset, %smaller, "configured preset too large, a smaller one fits");
                    }
                }
                SizeEstimate {
                    size_in_bytes: chosen.size_in_bytes,
                    can_upload: chosen.can_upload,
                }
            }
            _ => raw,
        }
    }
}

impl Collaborator for PresetSizeEstimator {
    fn name(&self) -> &str {
        "preset-size-estimator"
    }
}

#[async_trait]
impl UploadabilityEstimator for PresetSizeEstimator {
    async fn estimate(
        &self,
        attachments: &[Attachment],
        config: &OptimizationConfig,
    ) -> Uploadability {
        let max_size = self.max_upload_size().await;
        Uploadability {
            max_size,
            estimates: attachments
                .iter()
                .map(|a| Self::estimate_one(a, config, max_size))
                .collect(),
        }
    }
}
