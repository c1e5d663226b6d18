// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection model: insertion points, ranges, and drag-and-drop plans.

mod cursor;
mod drag;
mod selection;

pub use cursor::InsertionPoint;
pub use drag::{
    apply_drop, drag_text, drop_actions, drop_effect, drop_plan, DragSource, DropAction,
    DropEffect, DropPlan, DropTarget,
};
pub use selection::{RangeSelection, Selection};

use crate::layout::para::ParaBox;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Keyboard modifier state accompanying a mouse event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control key held.
    pub control: bool,
    /// Shift key held.
    pub shift: bool,
    /// Alt key held.
    pub alt: bool,
}

/// The paragraph payload of `id`, if it is a paragraph box.
pub(crate) fn para_mut(tree: &mut BoxTree, id: BoxId) -> Option<&mut ParaBox> {
    match &mut tree[id].kind {
        BoxKind::Para(para) => Some(para),
        _ => None,
    }
}

/// True if `a` precedes `b` in the linearized whole-tree traversal.
///
/// A box precedes itself is false; equal ids compare as not-before.
pub(crate) fn tree_precedes(tree: &BoxTree, a: BoxId, b: BoxId) -> bool {
    if a == b {
        return false;
    }
    let mut cur = Some(a);
    while let Some(id) = cur {
        if id == b {
            return true;
        }
        cur = tree.next_in_traversal(id);
    }
    false
}
