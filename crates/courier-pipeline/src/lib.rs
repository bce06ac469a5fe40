// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment send pipeline.
//!
//! Drives one attachment through optional pre-processing and upload while
//! the user sends, retries, cancels or dismisses the preview. Every
//! temporary file is handed to the cleaner exactly once and a double `Send`
//! never produces two uploads.
//!
//! - [`SendPipeline`] - builder; `spawn()` starts the actor
//! - [`PipelineHandle`] - commands, state observation, dismissal signal
//! - [`PresetSizeEstimator`] - upload limit check with per-preset video estimates
//! - [`FsCleaner`] - filesystem cleanup collaborator

pub mod command;
pub mod controller;
pub mod estimate;
pub mod fs_cleaner;
pub mod handle;
pub mod pipeline;
pub mod policy;
pub mod scope;
pub mod size_check;
pub mod telemetry;

pub use command::PipelineCommand;
pub use controller::Collaborators;
pub use estimate::{PresetSizeEstimator, estimate_video_presets, find_best_video_preset};
pub use fs_cleaner::FsCleaner;
pub use handle::PipelineHandle;
pub use pipeline::SendPipeline;
pub use policy::PreProcessPolicy;
pub use scope::{PipelineScopes, TaskLifetime};
pub use size_check::check_upload_precondition;
