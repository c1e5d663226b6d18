// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurement and placement.
//!
//! Layout is pull-based and top-down: a container computes each child's
//! available width, asks the child to lay itself out, then positions it.
//! Sizes recorded on boxes are border-box extents (content plus padding plus
//! borders); margins belong to the parent's placement pass, which is what
//! makes margin collapsing possible.

pub mod group;
pub mod leaf;
pub mod para;
pub mod relayout;

use crate::coords::LayoutTransform;
use crate::host::RendererFactory;
use crate::lazy;
use crate::style::StyleCache;
use crate::tree::{BoxId, BoxKind, BoxTree};

pub use relayout::{build_fixup_map, relayout_box, FixupMap, InvalidateSink};

/// Everything a box needs to lay itself out.
#[derive(Clone, Copy)]
pub struct LayoutInfo<'a> {
    /// Width available to the box being laid out, in device pixels,
    /// excluding the box's own margins.
    pub avail_width: i32,
    /// Resolution for millipoint conversion.
    pub transform: LayoutTransform,
    /// The style table.
    pub styles: &'a StyleCache,
    /// Per-writing-system measurement.
    pub renderers: &'a dyn RendererFactory,
}

impl core::fmt::Debug for LayoutInfo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutInfo")
            .field("avail_width", &self.avail_width)
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

impl<'a> LayoutInfo<'a> {
    /// A copy of this info with a different available width.
    #[must_use]
    pub fn with_avail_width(&self, avail_width: i32) -> Self {
        Self {
            avail_width,
            ..*self
        }
    }
}

/// Lays out one box and its descendants.
///
/// On return the box's `width` and `height` are set; its position is the
/// parent's business. The only failure a layout pass can hit is a renderer
/// the factory cannot supply; that error propagates untouched.
pub fn layout_box(tree: &mut BoxTree, id: BoxId, info: &LayoutInfo<'_>) -> Result<(), crate::Error> {
    match &tree[id].kind {
        BoxKind::Pile | BoxKind::Div | BoxKind::Cell => group::layout_pile(tree, id, info),
        BoxKind::Row(_) => group::layout_row(tree, id, info),
        BoxKind::Block(_) => leaf::layout_block(tree, id, info),
        BoxKind::Image(_) => leaf::layout_image(tree, id, info),
        BoxKind::Para(_) => para::layout_para(tree, id, info),
        BoxKind::Lazy(_) => lazy::layout_lazy(tree, id, info),
    }
}
