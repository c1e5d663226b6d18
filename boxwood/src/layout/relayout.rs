// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental relayout guided by a precomputed ancestor fixup map.
//!
//! After a mutation, the boxes that might change are exactly the mutated
//! boxes and their ancestors. [`build_fixup_map`] records each such box's
//! prior root-relative rectangle; [`relayout_box`] then walks the tree and
//! re-lays-out only boxes that are in the map or have never been laid out,
//! leaving every sibling subtree untouched. That locality is what keeps
//! edits in large documents cheap.

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::{group, layout_box, LayoutInfo};
use crate::coords::Rect;
use crate::error::Error;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Prior root-relative rectangles of the boxes on the mutation path.
#[derive(Debug, Default)]
pub struct FixupMap {
    rects: HashMap<BoxId, Rect>,
}

impl FixupMap {
    /// True if `id` is on the mutation path.
    pub fn contains(&self, id: BoxId) -> bool {
        self.rects.contains_key(&id)
    }

    /// The prior rectangle recorded for `id`.
    pub fn get(&self, id: BoxId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// Number of boxes on the path.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// True if no box was recorded.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Records the prior root-relative rectangle of each dirty box and of every
/// ancestor up to the root.
pub fn build_fixup_map(tree: &BoxTree, dirty: &[BoxId]) -> FixupMap {
    let mut map = FixupMap::default();
    for &start in dirty {
        let path: SmallVec<[BoxId; 8]> = tree.self_and_ancestors(start).collect();
        for id in path {
            if map.rects.contains_key(&id) {
                // Shared ancestors above this point are already recorded.
                break;
            }
            map.rects.insert(id, tree.root_rect(id));
        }
    }
    debug!(dirty = dirty.len(), path = map.rects.len(), "built fixup map");
    map
}

/// Receiver for invalidation rectangles raised during relayout.
pub trait InvalidateSink {
    /// Marks a root-relative rectangle as needing repaint.
    fn invalidate(&mut self, rect: Rect);
}

// A plain vector collects rectangles; the coordinator drains it into the
// host when the suspension scope releases.
impl InvalidateSink for Vec<Rect> {
    fn invalidate(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.push(rect);
        }
    }
}

/// Incrementally re-lays-out `id`.
///
/// Per box: never laid out (height zero) means a full layout; present in
/// the fixup map means re-lay and invalidate against the prior rectangle;
/// anything else is a no-op. Returns whether the box's rectangle changed,
/// so the parent can account for the shift.
pub fn relayout_box(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
    fixup: &FixupMap,
    sink: &mut dyn InvalidateSink,
) -> Result<bool, Error> {
    if tree[id].height == 0 {
        // Never laid out; there is no prior rectangle to invalidate.
        layout_box(tree, id, info)?;
        return Ok(true);
    }
    let Some(old_rect) = fixup.get(id) else {
        return Ok(false);
    };

    if tree[id].kind.is_group() {
        relayout_group(tree, id, info, fixup, sink, old_rect)
    } else {
        layout_box(tree, id, info)?;
        let new_rect = Rect::new(
            old_rect.left,
            old_rect.top,
            old_rect.left + tree[id].width,
            old_rect.top + tree[id].height,
        );
        sink.invalidate(old_rect.union(&new_rect));
        Ok(true)
    }
}

fn relayout_group(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
    fixup: &FixupMap,
    sink: &mut dyn InvalidateSink,
    old_rect: Rect,
) -> Result<bool, Error> {
    let avails = group::child_avails(tree, id, info);
    let old_child_rects: Vec<(BoxId, Rect)> = avails
        .iter()
        .map(|&(child, _)| (child, tree[child].rect()))
        .collect();

    for &(child, avail) in &avails {
        relayout_box(tree, child, &info.with_avail_width(avail), fixup, sink)?;
    }
    group::place_children(tree, id, info);

    let merge_band = matches!(tree[id].kind, BoxKind::Div);
    let mut band: Option<(i32, i32)> = None;
    for (child, old) in &old_child_rects {
        let new = tree[*child].rect();
        if new == *old {
            continue;
        }
        if merge_band {
            // Track the minimal vertical band touched by moved or resized
            // children; one merged invalidation covers them all.
            let top = old.top.min(new.top);
            let bottom = old.bottom.max(new.bottom);
            band = Some(match band {
                None => (top, bottom),
                Some((t, b)) => (t.min(top), b.max(bottom)),
            });
        } else {
            let old_root = old.translate(old_rect.left, old_rect.top);
            let new_root = new.translate(old_rect.left, old_rect.top);
            sink.invalidate(old_root.union(&new_root));
        }
    }
    if let Some((top, bottom)) = band {
        sink.invalidate(Rect::new(
            old_rect.left,
            old_rect.top + top,
            old_rect.right,
            old_rect.top + bottom,
        ));
    }

    let size_changed =
        tree[id].width != old_rect.width() || tree[id].height != old_rect.height();
    if size_changed {
        let new_rect = Rect::new(
            old_rect.left,
            old_rect.top,
            old_rect.left + tree[id].width,
            old_rect.top + tree[id].height,
        );
        sink.invalidate(old_rect.union(&new_rect));
    }
    Ok(size_changed)
}
