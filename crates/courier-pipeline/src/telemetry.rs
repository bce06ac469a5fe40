// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for hosts embedding the pipeline.

use courier_config::CourierConfig;
use tracing_subscriber::EnvFilter;

/// Default filter directive: `courier` crates at `log_level`, everything
/// else at `warn`.
pub fn default_directive(log_level: &str) -> String {
    format!("courier={log_level},warn")
}

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`default_directive`].
///
/// Does nothing if the host already installed a global subscriber.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(log_level, "tracing initialized");
    }
}

/// [`init_tracing`] at `logging.log_level`.
pub fn init_tracing_from_config(config: &CourierConfig) {
    init_tracing(&config.logging.log_level);
}
