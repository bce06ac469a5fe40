// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier send pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a mistyped key is
//! reported at startup instead of silently falling back to a default.

use courier_core::types::{AttachmentKind, OptimizationConfig, VideoCompressionPreset};
use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Every section is optional and defaults to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Send pipeline behaviour.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Default media optimization choice.
    #[serde(default)]
    pub optimization: OptimizationSection,

    /// Upload size limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// When the optimization chooser is shown before a send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationUi {
    /// Shown for images and videos.
    #[default]
    Auto,
    Always,
    Never,
}

impl OptimizationUi {
    /// Whether an attachment of `kind` waits for the user's optimization
    /// choice before pre-processing.
    pub fn required_for(self, kind: AttachmentKind) -> bool {
        match self {
            OptimizationUi::Auto => kind.supports_optimization(),
            OptimizationUi::Always => true,
            OptimizationUi::Never => false,
        }
    }
}

/// Send pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Let uploads continue in the background once the screen is dismissed.
    #[serde(default)]
    pub queued_background: bool,

    /// When the optimization chooser is shown.
    #[serde(default)]
    pub optimization_ui: OptimizationUi,
}

/// Default optimization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationSection {
    #[serde(default = "default_compress_images")]
    pub compress_images: bool,

    #[serde(default)]
    pub video_preset: VideoCompressionPreset,
}

impl Default for OptimizationSection {
    fn default() -> Self {
        Self {
            compress_images: default_compress_images(),
            video_preset: VideoCompressionPreset::default(),
        }
    }
}

impl OptimizationSection {
    pub fn to_optimization_config(&self) -> OptimizationConfig {
        OptimizationConfig {
            compress_images: self.compress_images,
            video_preset: self.video_preset,
        }
    }
}

fn default_compress_images() -> bool {
    true
}

/// Upload size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum upload size assumed when the server limit cannot be fetched.
    #[serde(default = "default_fallback_max_upload_size")]
    pub fallback_max_upload_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            fallback_max_upload_size: default_fallback_max_upload_size(),
        }
    }
}

fn default_fallback_max_upload_size() -> u64 {
    100 * 1024 * 1024
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CourierConfig::default();
        assert!(!config.pipeline.queued_background);
        assert_eq!(config.pipeline.optimization_ui, OptimizationUi::Auto);
        assert!(config.optimization.compress_images);
        assert_eq!(
            config.optimization.video_preset,
            VideoCompressionPreset::Standard
        );
        assert_eq!(config.limits.fallback_max_upload_size, 104_857_600);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn optimization_ui_auto_follows_kind() {
        assert!(OptimizationUi::Auto.required_for(AttachmentKind::Image));
        assert!(OptimizationUi::Auto.required_for(AttachmentKind::Video));
        assert!(!OptimizationUi::Auto.required_for(AttachmentKind::File));
        assert!(OptimizationUi::Always.required_for(AttachmentKind::Voice));
        assert!(!OptimizationUi::Never.required_for(AttachmentKind::Image));
    }

    #[test]
    fn optimization_section_converts() {
        let section = OptimizationSection {
            compress_images: false,
            video_preset: VideoCompressionPreset::Low,
        };
        let config = section.to_optimization_config();
        assert!(!config.compress_images);
        assert_eq!(config.video_preset, VideoCompressionPreset::Low);
    }
}
