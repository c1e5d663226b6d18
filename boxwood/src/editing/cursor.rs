// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::para_mut;
use crate::coords::Rect;
use crate::error::Error;
use crate::host::RendererFactory;
use crate::style::StyleCache;
use crate::tree::{BoxId, BoxTree};

/// A position within a paragraph's rendered text.
///
/// `assoc_prev` disambiguates boundary positions between runs: a position at
/// a format boundary belongs visually either to the character before it or
/// to the character after it, and caret geometry follows that choice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InsertionPoint {
    /// The paragraph box.
    pub para: BoxId,
    /// Rendered character offset within the paragraph's source.
    pub ren: usize,
    /// True if the position associates with the preceding character.
    pub assoc_prev: bool,
}

impl InsertionPoint {
    /// Creates an insertion point without validation.
    pub fn new(para: BoxId, ren: usize, assoc_prev: bool) -> Self {
        Self {
            para,
            ren,
            assoc_prev,
        }
    }

    /// Resolves a logical offset in `para` to an insertion point.
    ///
    /// Returns `Ok(None)` when the position has no valid text target — a
    /// routine outcome, not a fault.
    pub fn from_logical(
        tree: &mut BoxTree,
        para: BoxId,
        log: usize,
        assoc_prev: bool,
    ) -> Result<Option<Self>, Error> {
        let Some(p) = para_mut(tree, para) else {
            return Ok(None);
        };
        Ok(p.source
            .select_at(log, assoc_prev)?
            .map(|anchor| Self::new(para, anchor.ren, anchor.assoc_prev)))
    }

    /// Resolves a rendered offset in `para` to an insertion point.
    pub fn from_render(
        tree: &mut BoxTree,
        para: BoxId,
        ren: usize,
        assoc_prev: bool,
    ) -> Result<Option<Self>, Error> {
        let Some(p) = para_mut(tree, para) else {
            return Ok(None);
        };
        Ok(p.source
            .select_at_render(ren, assoc_prev)?
            .map(|anchor| Self::new(para, anchor.ren, anchor.assoc_prev)))
    }

    /// The logical offset this insertion point corresponds to.
    pub fn logical(&self, tree: &mut BoxTree) -> Result<usize, Error> {
        let p = para_mut(tree, self.para).ok_or(Error::OffsetOutOfRange {
            offset: self.ren,
            len: 0,
        })?;
        p.source.ren_to_log(self.ren)
    }

    /// Caret rectangle in root-relative coordinates.
    pub fn caret_rect_root(
        &self,
        tree: &mut BoxTree,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
    ) -> Option<Rect> {
        let origin = tree.root_origin(self.para);
        let p = para_mut(tree, self.para)?;
        let rect = p.caret_rect(self.ren, self.assoc_prev, styles, renderers)?;
        Some(rect.translate(origin.x, origin.y))
    }

    /// The insertion point one rendered character forward, clamped to the
    /// end of the paragraph.
    #[must_use]
    pub fn next_char(&self, tree: &mut BoxTree) -> Self {
        let len = para_mut(tree, self.para)
            .map(|p| p.source.ren_len())
            .unwrap_or(0);
        Self {
            para: self.para,
            ren: (self.ren + 1).min(len),
            assoc_prev: true,
        }
    }

    /// The insertion point one rendered character back, clamped to the start
    /// of the paragraph.
    #[must_use]
    pub fn prev_char(&self, _tree: &mut BoxTree) -> Self {
        Self {
            para: self.para,
            ren: self.ren.saturating_sub(1),
            assoc_prev: false,
        }
    }
}
