// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental box layout, painting and selection for structured text views.
//!
//! Boxwood owns a tree of rectangular layout boxes (piles, divisions, rows,
//! cells, paragraphs, fixed blocks, images and lazy placeholders), an interned
//! cascading style model, and a mapping layer relating logical document text
//! to the rendered text actually measured and painted. Layout is pull-based
//! and top-down; repainting after an edit is driven by an incremental relayout
//! pass guided by a precomputed ancestor fixup map, so the cost of a change is
//! proportional to the boxes it actually touches.
//!
//! Glyph shaping and measurement, the host window system and the backing
//! document model are collaborators reached through the traits in [`host`];
//! Boxwood holds no persistent state of its own.

pub use peniko;

mod coords;
mod error;
mod lazy;
mod tree;

pub mod editing;
pub mod host;
pub mod layout;
pub mod root;
pub mod style;
pub mod text;

#[cfg(test)]
mod tests;

pub use coords::{LayoutTransform, PaintTransform, PixelSides, Point, Rect, Size, Thickness};
pub use error::Error;
pub use lazy::{BuildContext, ItemBuilder, ItemId, LazyBox, SizeChange};
pub use root::{DropRequest, LayoutScope, RootBox};
pub use style::{AssembledStyles, Style, StyleCache, TextProp, WsId};
pub use tree::{BoxId, BoxKind, BoxNode, BoxTree};
