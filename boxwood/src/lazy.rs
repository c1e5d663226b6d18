// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy virtualization: placeholder boxes for unmaterialized items.
//!
//! A [`LazyBox`] stands in for an ordered run of items that have not been
//! turned into real boxes yet, sized as item count times a uniform estimated
//! height. Before painting or hit-testing touches a vertical band, the root
//! asks each box on the path to guarantee it can satisfy the band; a lazy
//! box materializes exactly the item sub-range overlapping it, splitting
//! itself around the expansion.

use core::cell::RefCell;
use core::ops::Range;
use std::rc::Rc;

use tracing::debug;

use crate::coords::LayoutTransform;
use crate::error::Error;
use crate::layout::LayoutInfo;
use crate::style::StyleCache;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Identifier of one unmaterialized item, opaque to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// Notification that lazily estimated content changed real size.
///
/// `est_top`/`est_bottom` bound the expanded band at its estimated position
/// so the host can decide whether the change happened above the viewport and
/// adjust scrolling without a visible jump.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeChange {
    /// Estimated top of the expanded band, root-relative.
    pub est_top: i32,
    /// Estimated bottom of the expanded band, root-relative.
    pub est_bottom: i32,
    /// Real height minus estimated height of the band.
    pub delta: i32,
}

/// Context handed to an [`ItemBuilder`] while it materializes boxes.
#[derive(Debug)]
pub struct BuildContext<'a> {
    /// The arena to allocate boxes in.
    pub tree: &'a mut BoxTree,
    /// The style cache for deriving formatting.
    pub styles: &'a mut StyleCache,
}

/// Materializes real boxes for lazy items.
///
/// Implemented by the view constructor that decided to defer the items in
/// the first place.
pub trait ItemBuilder {
    /// Estimated height in device pixels of one unmaterialized item.
    fn estimated_height(&self, transform: &LayoutTransform) -> i32;

    /// Builds detached boxes for `items`, in order.
    fn build_items(&mut self, cx: &mut BuildContext<'_>, items: &[ItemId]) -> Vec<BoxId>;
}

/// Payload of a lazy placeholder box.
pub struct LazyBox {
    items: Vec<ItemId>,
    builder: Rc<RefCell<dyn ItemBuilder>>,
    est_item_height: i32,
}

impl core::fmt::Debug for LazyBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyBox")
            .field("items", &self.items.len())
            .field("est_item_height", &self.est_item_height)
            .finish_non_exhaustive()
    }
}

impl LazyBox {
    /// Creates a placeholder for `items` expanded by `builder`.
    pub fn new(items: Vec<ItemId>, builder: Rc<RefCell<dyn ItemBuilder>>) -> Self {
        Self {
            items,
            builder,
            est_item_height: 0,
        }
    }

    /// The unmaterialized items.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Removes an item sub-range without materializing anything.
    ///
    /// The caller must reset the box height to zero afterwards; removal
    /// defers re-estimation to the next layout pass rather than adjusting
    /// incrementally.
    pub fn remove_items(&mut self, range: Range<usize>) {
        self.items.drain(range);
        self.est_item_height = 0;
    }

    /// The current per-item height estimate in pixels; zero when unknown.
    pub fn estimated_item_height(&self) -> i32 {
        self.est_item_height
    }
}

/// Sizes a lazy box purely from its estimate.
pub(crate) fn layout_lazy(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    let (mut est, count, builder) = match &tree[id].kind {
        BoxKind::Lazy(lazy) => (
            lazy.est_item_height,
            lazy.items.len(),
            lazy.builder.clone(),
        ),
        _ => panic!("layout_lazy requires a lazy box"),
    };
    if est == 0 {
        est = builder.borrow().estimated_height(&info.transform).max(0);
        if let BoxKind::Lazy(lazy) = &mut tree[id].kind {
            lazy.est_item_height = est;
        }
    }
    let height = (i64::from(est) * count as i64).min(i64::from(i32::MAX)) as i32;
    let node = &mut tree[id];
    node.width = info.avail_width;
    node.height = height;
    Ok(())
}

/// Result of one lazy expansion step.
#[derive(Debug)]
pub(crate) struct ExpandOutcome {
    /// Boxes now occupying the lazy box's place, in order. Some may be new
    /// lazy boxes covering the unexpanded remainders.
    pub(crate) replacement: Vec<BoxId>,
    /// The newly materialized boxes only.
    pub(crate) built: Vec<BoxId>,
    /// Estimated top of the expanded band, relative to the old lazy box.
    pub(crate) est_top: i32,
    /// Estimated bottom of the expanded band, relative to the old lazy box.
    pub(crate) est_bottom: i32,
}

/// Materializes the minimal item sub-range of lazy box `id` overlapping
/// `band` (a vertical range relative to the box's own top), splicing the
/// results into the tree in the lazy box's place.
///
/// The item builder is required to make forward progress; a configuration
/// that cannot shrink the unresolved region (an estimate of zero with items
/// remaining) faults rather than loops.
pub(crate) fn expand_lazy(
    tree: &mut BoxTree,
    styles: &mut StyleCache,
    id: BoxId,
    band: Range<i32>,
) -> Result<ExpandOutcome, Error> {
    let (est, len, style, builder) = match &tree[id].kind {
        BoxKind::Lazy(lazy) => (
            lazy.est_item_height,
            lazy.items.len(),
            tree[id].style,
            lazy.builder.clone(),
        ),
        _ => panic!("expand_lazy requires a lazy box"),
    };
    if len == 0 {
        tree.splice_children(id, &[]);
        return Ok(ExpandOutcome {
            replacement: Vec::new(),
            built: Vec::new(),
            est_top: 0,
            est_bottom: 0,
        });
    }
    if est <= 0 {
        return Err(Error::NoExpansionProgress { first: 0, last: len });
    }

    // Minimal contiguous sub-range of items whose estimated extents overlap
    // the band.
    let first = (band.start.max(0) / est) as usize;
    let first = first.min(len - 1);
    let last = (band.end.max(0) + est - 1) / est;
    let last = (last as usize).clamp(first + 1, len);

    let (sub, before, after) = {
        let BoxKind::Lazy(lazy) = &tree[id].kind else {
            unreachable!();
        };
        (
            lazy.items[first..last].to_vec(),
            lazy.items[..first].to_vec(),
            lazy.items[last..].to_vec(),
        )
    };

    let built = {
        let mut cx = BuildContext {
            tree: &mut *tree,
            styles: &mut *styles,
        };
        builder.borrow_mut().build_items(&mut cx, &sub)
    };
    debug!(
        first,
        last,
        built = built.len(),
        remaining = before.len() + after.len(),
        "expanded lazy items"
    );

    let mut replacement = Vec::new();
    if !before.is_empty() {
        let lazy = tree.alloc(
            style,
            BoxKind::Lazy(LazyBox {
                items: before,
                builder: builder.clone(),
                est_item_height: est,
            }),
        );
        replacement.push(lazy);
    }
    replacement.extend(&built);
    if !after.is_empty() {
        let lazy = tree.alloc(
            style,
            BoxKind::Lazy(LazyBox {
                items: after,
                builder,
                est_item_height: est,
            }),
        );
        replacement.push(lazy);
    }
    tree.splice_children(id, &replacement);

    Ok(ExpandOutcome {
        replacement,
        built,
        est_top: (first as i64 * i64::from(est)).min(i64::from(i32::MAX)) as i32,
        est_bottom: (last as i64 * i64::from(est)).min(i64::from(i32::MAX)) as i32,
    })
}
