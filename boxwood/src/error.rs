// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::style::WsId;

/// Contract faults surfaced by the engine.
///
/// Routine "nothing there" outcomes (a hit test over empty space, a selection
/// request with no text target) are expressed as `Option::None`, never as an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A logical or rendered offset beyond the valid end-of-text boundary.
    #[error("offset {offset} out of range for text of length {len}")]
    OffsetOutOfRange {
        /// The offending offset, in characters.
        offset: usize,
        /// Length of the addressed text, in characters.
        len: usize,
    },

    /// A client run index that does not exist in the text source.
    #[error("client run index {index} out of range ({count} runs)")]
    RunIndexOutOfRange {
        /// The offending run index.
        index: usize,
        /// Number of client runs in the source.
        count: usize,
    },

    /// A lazy expansion pass that failed to shrink its unresolved region.
    ///
    /// The item builder is required to make forward progress on every call;
    /// without this guard a misbehaving builder would spin the expansion loop
    /// forever.
    #[error("lazy expansion made no progress over items {first}..{last}")]
    NoExpansionProgress {
        /// First unresolved item index at the time of the failed pass.
        first: usize,
        /// Past-the-end unresolved item index.
        last: usize,
    },

    /// No renderer could be produced for a writing system.
    #[error("no renderer available for writing system {0:?}")]
    RendererUnavailable(WsId),

    /// A text edit that would cross a client-run or embedded-object
    /// boundary; such edits belong to the domain layer.
    #[error("edit crosses a client-run or embedded-object boundary")]
    UnsupportedEdit,
}
