// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./courier.toml` > `~/.config/courier/courier.toml` >
//! `/etc/courier/courier.toml`, with `COURIER_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CourierConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/courier/courier.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "courier.toml";

/// Per-user config file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("courier/courier.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml`
/// 3. `~/.config/courier/courier.toml`
/// 4. `./courier.toml`
/// 5. `COURIER_*` environment variables
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full provider stack before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Render the compiled defaults as a TOML document.
pub fn default_config_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&CourierConfig::default())
}

/// Environment provider with an explicit section mapping.
///
/// Keys contain underscores, so `split("_")` would turn
/// `COURIER_PIPELINE_QUEUED_BACKGROUND` into `pipeline.queued.background`.
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["pipeline", "optimization", "limits", "logging"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("pipeline_queued_background"),
            "pipeline.queued_background"
        );
        assert_eq!(
            map_env_key("limits_fallback_max_upload_size"),
            "limits.fallback_max_upload_size"
        );
        assert_eq!(map_env_key("logging_log_level"), "logging.log_level");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn rendered_defaults_load_back() {
        let rendered = default_config_toml().expect("defaults serialize");
        assert!(rendered.contains("[limits]"));
        let config = load_config_from_str(&rendered).expect("rendered defaults parse");
        assert_eq!(config.limits.fallback_max_upload_size, 104_857_600);
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[pipeline]\nqueued_background = true\n")
            .expect("valid toml");
        assert!(config.pipeline.queued_background);
        assert!(config.optimization.compress_images);
    }
}
