// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! When pre-processing starts.

use strum::Display;

/// Pre-processing trigger policy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PreProcessPolicy {
    /// No optimization choice is needed: start silently at creation.
    Eager,
    /// The user picks the optimization first: start on `Send`.
    Deferred,
}

impl PreProcessPolicy {
    pub fn from_ui_required(optimization_ui_required: bool) -> Self {
        if optimization_ui_required {
            PreProcessPolicy::Deferred
        } else {
            PreProcessPolicy::Eager
        }
    }

    pub fn starts_at_creation(self) -> bool {
        matches!(self, PreProcessPolicy::Eager)
    }
}
