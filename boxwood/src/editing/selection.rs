// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{para_mut, tree_precedes, InsertionPoint};
use crate::coords::{Point, Rect};
use crate::host::RendererFactory;
use crate::style::StyleCache;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// A range between two insertion points.
///
/// The anchor is where the selection was initiated; the focus is the end
/// being moved. Either may precede the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeSelection {
    /// Fixed end of the selection.
    pub anchor: InsertionPoint,
    /// Moving end of the selection.
    pub focus: InsertionPoint,
}

impl RangeSelection {
    /// Creates a range selection.
    pub fn new(anchor: InsertionPoint, focus: InsertionPoint) -> Self {
        Self { anchor, focus }
    }

    /// True if anchor and focus name the same position.
    pub fn is_collapsed(&self) -> bool {
        self.anchor.para == self.focus.para && self.anchor.ren == self.focus.ren
    }

    /// The endpoints in document order (start, end).
    pub fn ordered(&self, tree: &BoxTree) -> (InsertionPoint, InsertionPoint) {
        if self.anchor.para == self.focus.para {
            if self.anchor.ren <= self.focus.ren {
                (self.anchor, self.focus)
            } else {
                (self.focus, self.anchor)
            }
        } else if tree_precedes(tree, self.anchor.para, self.focus.para) {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    /// Visits the root-relative rectangles that visually cover the range.
    pub fn geometry(
        &self,
        tree: &mut BoxTree,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
        mut f: impl FnMut(Rect),
    ) {
        let (start, end) = self.ordered(tree);
        let paras = paras_between(tree, start.para, end.para);
        for para in paras {
            let origin = tree.root_origin(para);
            let Some(p) = para_mut(tree, para) else {
                continue;
            };
            let len = p.source.ren_len();
            let lo = if para == start.para { start.ren } else { 0 };
            let hi = if para == end.para { end.ren } else { len };
            p.selection_rects(lo..hi, styles, renderers, |r| {
                f(r.translate(origin.x, origin.y));
            });
        }
    }

    /// True if a root-relative point lies inside the selection's geometry.
    pub fn contains_point(
        &self,
        tree: &mut BoxTree,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
        p: Point,
    ) -> bool {
        let mut hit = false;
        self.geometry(tree, styles, renderers, |r| hit |= r.contains(p));
        hit
    }
}

/// The current selection: an insertion point or a range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// A collapsed caret.
    Insertion(InsertionPoint),
    /// A range between two insertion points.
    Range(RangeSelection),
}

impl Selection {
    /// The active (moving) end.
    pub fn focus(&self) -> InsertionPoint {
        match self {
            Self::Insertion(ip) => *ip,
            Self::Range(range) => range.focus,
        }
    }

    /// A new selection keeping this one's anchor and moving the focus.
    #[must_use]
    pub fn extended_to(&self, focus: InsertionPoint) -> Self {
        let anchor = match self {
            Self::Insertion(ip) => *ip,
            Self::Range(range) => range.anchor,
        };
        if anchor.para == focus.para && anchor.ren == focus.ren {
            Self::Insertion(focus)
        } else {
            Self::Range(RangeSelection::new(anchor, focus))
        }
    }

    /// Smallest root-relative rectangle covering the selection's geometry.
    pub fn bounds(
        &self,
        tree: &mut BoxTree,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
    ) -> Option<Rect> {
        match self {
            Self::Insertion(ip) => ip.caret_rect_root(tree, styles, renderers),
            Self::Range(range) => {
                let mut acc: Option<Rect> = None;
                range.geometry(tree, styles, renderers, |r| {
                    acc = Some(acc.map(|a| a.union(&r)).unwrap_or(r));
                });
                acc
            }
        }
    }
}

impl From<InsertionPoint> for Selection {
    fn from(ip: InsertionPoint) -> Self {
        Self::Insertion(ip)
    }
}

/// Paragraph boxes from `start` to `end` in traversal order, inclusive.
fn paras_between(tree: &BoxTree, start: BoxId, end: BoxId) -> Vec<BoxId> {
    let mut out = Vec::new();
    let mut cur = Some(start);
    while let Some(id) = cur {
        if matches!(tree[id].kind, BoxKind::Para(_)) {
            out.push(id);
        }
        if id == end {
            break;
        }
        cur = tree.next_in_traversal(id);
    }
    out
}
