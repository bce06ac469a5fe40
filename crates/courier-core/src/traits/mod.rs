// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the send pipeline.
//!
//! The pipeline owns scheduling and state; everything that touches media
//! bytes, the network or the filesystem sits behind one of these traits.

pub mod caption;
pub mod cleanup;
pub mod collaborator;
pub mod preprocess;
pub mod sizing;
pub mod upload;

pub use caption::CaptionSource;
pub use cleanup::TemporaryFileCleaner;
pub use collaborator::Collaborator;
pub use preprocess::PreProcessor;
pub use sizing::{MaxUploadSizeProvider, UploadabilityEstimator};
pub use upload::{ProgressSink, Uploader};
