// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier pipeline tests.
//!
//! Mock collaborators and a harness for fast, deterministic tests without
//! media codecs, a network or a filesystem.
//!
//! # Components
//!
//! - [`MockPreProcessor`] - scripted pre-processing outcomes
//! - [`MockUploader`] - scripted progress and upload outcomes
//! - [`MockCleaner`] - records deletions
//! - [`MockUploadLimit`] / [`StaticCaption`] - fixed limit and caption
//! - [`Gate`] - holds mock calls open until released
//! - [`PipelineHarness`] - spawns a pipeline and records its transitions

pub mod gate;
pub mod harness;
pub mod mock_cleaner;
pub mod mock_limits;
pub mod mock_preprocessor;
pub mod mock_uploader;

pub use gate::Gate;
pub use harness::{FinishedHarness, PipelineHarness, PipelineHarnessBuilder};
pub use mock_cleaner::MockCleaner;
pub use mock_limits::{MockUploadLimit, StaticCaption};
pub use mock_preprocessor::MockPreProcessor;
pub use mock_uploader::{MockUploader, UploadCall};
