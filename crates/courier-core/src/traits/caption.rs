// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caption source trait.

/// Supplies the caption typed alongside the attachment, read when a send
/// starts.
pub trait CaptionSource: Send + Sync + 'static {
    fn caption_text(&self) -> Option<String>;
}
