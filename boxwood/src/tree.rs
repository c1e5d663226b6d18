// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The box arena.
//!
//! Boxes live in a flat arena addressed by [`BoxId`] and are linked into a
//! tree with intrusive sibling pointers, giving O(1) attach and detach at
//! known boundary nodes. Detached boxes are abandoned in place; a parent
//! rebinds its child list wholesale rather than destroying children one by
//! one.

use core::ops::{Index, IndexMut};

use crate::layout::group::RowBox;
use crate::layout::leaf::{BlockBox, ImageBox};
use crate::layout::para::ParaBox;
use crate::lazy::LazyBox;
use crate::style::Style;
use crate::Rect;

/// Handle of a box in a [`BoxTree`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BoxId(u32);

impl BoxId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Payload distinguishing the closed set of box kinds.
#[derive(Debug)]
pub enum BoxKind {
    /// Vertical stack of children with collapsed margins.
    Pile,
    /// Vertical stack that merges child invalidations into one minimal band.
    Div,
    /// Horizontal sequence of children, optionally wrapping.
    Row(RowBox),
    /// Constrained-width vertical stack, as used for table cells.
    Cell,
    /// Fixed-size filled rectangle.
    Block(BlockBox),
    /// Scaled bitmap.
    Image(ImageBox),
    /// A paragraph of rendered text with embedded boxes.
    Para(ParaBox),
    /// Placeholder for a run of not-yet-materialized items.
    Lazy(LazyBox),
}

impl BoxKind {
    /// True for kinds whose children participate in group layout.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Pile | Self::Div | Self::Row(_) | Self::Cell)
    }

    /// True for kinds that may carry children at all.
    pub fn is_container(&self) -> bool {
        self.is_group() || matches!(self, Self::Para(_))
    }
}

/// One box in the arena.
///
/// `left`/`top` are relative to the parent box; `width`/`height` are the
/// measured extent. A height of zero marks a box that has never been laid
/// out.
#[derive(Debug)]
pub struct BoxNode {
    /// Horizontal offset from the parent's origin, in device pixels.
    pub left: i32,
    /// Vertical offset from the parent's origin, in device pixels.
    pub top: i32,
    /// Measured width in device pixels.
    pub width: i32,
    /// Measured height in device pixels; zero means never laid out.
    pub height: i32,
    /// Formatting bundle handle.
    pub style: Style,
    /// Parent box; `None` only for the root.
    pub parent: Option<BoxId>,
    /// Next sibling.
    pub next: Option<BoxId>,
    /// Previous sibling.
    pub prev: Option<BoxId>,
    /// First child, for containers.
    pub first_child: Option<BoxId>,
    /// Last child, for containers.
    pub last_child: Option<BoxId>,
    /// Kind payload.
    pub kind: BoxKind,
}

impl BoxNode {
    /// The box's rectangle relative to its parent.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }
}

/// Arena of [`BoxNode`]s forming one view tree.
#[derive(Debug, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
}

impl Index<BoxId> for BoxTree {
    type Output = BoxNode;

    fn index(&self, id: BoxId) -> &BoxNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxNode {
        &mut self.nodes[id.index()]
    }
}

impl BoxTree {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boxes ever allocated, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no box has been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached box.
    pub fn alloc(&mut self, style: Style, kind: BoxKind) -> BoxId {
        let id = BoxId(self.nodes.len() as u32);
        self.nodes.push(BoxNode {
            left: 0,
            top: 0,
            width: 0,
            height: 0,
            style,
            parent: None,
            next: None,
            prev: None,
            first_child: None,
            last_child: None,
            kind,
        });
        id
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// The child must be detached.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) {
        let anchor = self[parent].last_child;
        self.insert_child_after(parent, anchor, child);
    }

    /// Inserts `child` under `parent` after sibling `anchor`, or first when
    /// `anchor` is `None`.
    ///
    /// The child must be detached; `anchor` must be a child of `parent`.
    pub fn insert_child_after(&mut self, parent: BoxId, anchor: Option<BoxId>, child: BoxId) {
        debug_assert!(
            self[child].parent.is_none(),
            "insert_child_after requires a detached child"
        );
        debug_assert!(
            anchor.is_none_or(|a| self[a].parent == Some(parent)),
            "anchor must be a child of parent"
        );
        let next = match anchor {
            Some(a) => self[a].next,
            None => self[parent].first_child,
        };
        self[child].parent = Some(parent);
        self[child].prev = anchor;
        self[child].next = next;
        match anchor {
            Some(a) => self[a].next = Some(child),
            None => self[parent].first_child = Some(child),
        }
        match next {
            Some(n) => self[n].prev = Some(child),
            None => self[parent].last_child = Some(child),
        }
    }

    /// Unlinks `child` from its parent, leaving it detached in the arena.
    pub fn remove_child(&mut self, child: BoxId) {
        let Some(parent) = self[child].parent else {
            return;
        };
        let prev = self[child].prev;
        let next = self[child].next;
        match prev {
            Some(p) => self[p].next = next,
            None => self[parent].first_child = next,
        }
        match next {
            Some(n) => self[n].prev = prev,
            None => self[parent].last_child = prev,
        }
        let node = &mut self[child];
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Replaces `old` in its parent's child list with `new_children`, in
    /// order.
    ///
    /// `old` ends up detached. Used when a lazy box materializes into real
    /// boxes.
    pub fn splice_children(&mut self, old: BoxId, new_children: &[BoxId]) {
        let parent = self[old].parent.expect("splice target must be linked");
        let mut anchor = self[old].prev;
        self.remove_child(old);
        for &child in new_children {
            self.insert_child_after(parent, anchor, child);
            anchor = Some(child);
        }
    }

    /// Iterates the direct children of `parent`.
    pub fn children(&self, parent: BoxId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self[parent].first_child,
        }
    }

    /// Iterates `id` and then each of its ancestors up to the root.
    pub fn self_and_ancestors(&self, id: BoxId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            next: Some(id),
        }
    }

    /// The next box in the linearized whole-tree traversal.
    ///
    /// Descends into containers first; at the end of a sibling chain the
    /// traversal continues with the nearest ancestor's next sibling, so the
    /// chain spans the entire tree.
    pub fn next_in_traversal(&self, id: BoxId) -> Option<BoxId> {
        if let Some(first) = self[id].first_child {
            return Some(first);
        }
        let mut cur = id;
        loop {
            if let Some(next) = self[cur].next {
                return Some(next);
            }
            cur = self[cur].parent?;
        }
    }

    /// The previous box in the linearized whole-tree traversal.
    pub fn prev_in_traversal(&self, id: BoxId) -> Option<BoxId> {
        if let Some(prev) = self[id].prev {
            let mut cur = prev;
            while let Some(last) = self[cur].last_child {
                cur = last;
            }
            return Some(cur);
        }
        self[id].parent
    }

    /// The box's rectangle in root-relative coordinates.
    pub fn root_rect(&self, id: BoxId) -> Rect {
        let node = &self[id];
        let mut rect = node.rect();
        let mut cur = node.parent;
        while let Some(parent) = cur {
            let p = &self[parent];
            rect = rect.translate(p.left, p.top);
            cur = p.parent;
        }
        rect
    }

    /// The top-left of the box in root-relative coordinates.
    pub fn root_origin(&self, id: BoxId) -> crate::Point {
        let rect = self.root_rect(id);
        crate::Point::new(rect.left, rect.top)
    }
}

/// Iterator over direct children.
#[derive(Debug)]
pub struct ChildIter<'a> {
    tree: &'a BoxTree,
    next: Option<BoxId>,
}

impl Iterator for ChildIter<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let id = self.next?;
        self.next = self.tree[id].next;
        Some(id)
    }
}

/// Iterator over a box and its ancestors.
#[derive(Debug)]
pub struct AncestorIter<'a> {
    tree: &'a BoxTree,
    next: Option<BoxId>,
}

impl Iterator for AncestorIter<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let id = self.next?;
        self.next = self.tree[id].parent;
        Some(id)
    }
}
