// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every pipeline collaborator.

/// Base trait for pipeline collaborators.
///
/// The name is used as a structured field in pipeline logs.
pub trait Collaborator: Send + Sync + 'static {
    /// Returns the name of this collaborator.
    fn name(&self) -> &str;
}
