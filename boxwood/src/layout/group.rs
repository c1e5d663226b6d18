// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container layout: vertical piles and horizontal rows.

use super::{layout_box, LayoutInfo};
use crate::coords::LayoutTransform;
use crate::error::Error;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Pluggable column sizing for a row.
pub trait ColumnStrategy: core::fmt::Debug {
    /// Widths of `count` column slots sharing `available` pixels.
    fn column_widths(&self, available: i32, count: usize, transform: &LayoutTransform) -> Vec<i32>;
}

/// Fixed column widths in millipoints; missing trailing entries repeat the
/// last width.
#[derive(Clone, Debug)]
pub struct FixedColumns(pub Vec<i32>);

impl ColumnStrategy for FixedColumns {
    fn column_widths(&self, _available: i32, count: usize, transform: &LayoutTransform) -> Vec<i32> {
        let last = self.0.last().copied().unwrap_or(0);
        (0..count)
            .map(|i| transform.to_px_x(self.0.get(i).copied().unwrap_or(last)))
            .collect()
    }
}

/// Proportional shares of the available width; missing trailing entries get
/// an equal share of one.
#[derive(Clone, Debug)]
pub struct ProportionalColumns(pub Vec<u32>);

impl ColumnStrategy for ProportionalColumns {
    fn column_widths(&self, available: i32, count: usize, _transform: &LayoutTransform) -> Vec<i32> {
        let shares: Vec<u32> = (0..count)
            .map(|i| self.0.get(i).copied().unwrap_or(1).max(1))
            .collect();
        let total: i64 = shares.iter().map(|&s| i64::from(s)).sum();
        if total == 0 {
            return vec![0; count];
        }
        // Distribute rounding remainders left to right so the slots sum to
        // the available width exactly.
        let mut acc = 0_i64;
        let mut prev_edge = 0_i64;
        let mut out = Vec::with_capacity(count);
        for &share in &shares {
            acc += i64::from(share);
            let edge = i64::from(available) * acc / total;
            out.push((edge - prev_edge) as i32);
            prev_edge = edge;
        }
        out
    }
}

/// Payload of a row box.
#[derive(Debug)]
pub struct RowBox {
    /// Column sizing used when not wrapping.
    pub strategy: Box<dyn ColumnStrategy>,
    /// True to flow children onto new lines instead of into column slots.
    pub wrap: bool,
}

impl RowBox {
    /// A row with proportional columns and no wrapping.
    pub fn new() -> Self {
        Self {
            strategy: Box::new(ProportionalColumns(Vec::new())),
            wrap: false,
        }
    }

    /// A row using the given column strategy.
    pub fn with_strategy(strategy: Box<dyn ColumnStrategy>) -> Self {
        Self {
            strategy,
            wrap: false,
        }
    }

    /// A wrapping row.
    pub fn wrapping() -> Self {
        Self {
            wrap: true,
            ..Self::new()
        }
    }
}

impl Default for RowBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Available width for each direct child of a group, accounting for the
/// group's surround, the child's margins, and (for non-wrapping rows) the
/// column strategy.
pub(crate) fn child_avails(
    tree: &BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Vec<(BoxId, i32)> {
    let surround = info.styles.get(tree[id].style).surround_px(&info.transform);
    let content_width = (info.avail_width - surround.horizontal()).max(0);
    let children: Vec<BoxId> = tree.children(id).collect();
    let columns = match &tree[id].kind {
        BoxKind::Row(row) if !row.wrap => Some(row.strategy.column_widths(
            content_width,
            children.len(),
            &info.transform,
        )),
        _ => None,
    };
    children
        .iter()
        .enumerate()
        .map(|(i, &child)| {
            let margins = info
                .styles
                .get(tree[child].style)
                .margins_px(&info.transform);
            let base = match &columns {
                Some(widths) => widths[i],
                None => content_width,
            };
            (child, (base - margins.horizontal()).max(0))
        })
        .collect()
}

/// Positions the already-sized children of any group kind.
pub(crate) fn place_children(tree: &mut BoxTree, id: BoxId, info: &LayoutInfo<'_>) {
    match &tree[id].kind {
        BoxKind::Row(_) => place_row_children(tree, id, info),
        _ => place_pile_children(tree, id, info),
    }
}

/// Lays out a pile, div or cell: children stacked vertically.
pub(crate) fn layout_pile(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    for (child, avail) in child_avails(tree, id, info) {
        layout_box(tree, child, &info.with_avail_width(avail))?;
    }
    place_pile_children(tree, id, info);
    Ok(())
}

/// Positions already-sized children of a pile and records the pile's size.
///
/// The vertical gap between two adjacent children collapses to the smaller
/// of the previous child's bottom margin and the next child's top margin.
pub(crate) fn place_pile_children(tree: &mut BoxTree, id: BoxId, info: &LayoutInfo<'_>) {
    let surround = info.styles.get(tree[id].style).surround_px(&info.transform);
    let children: Vec<BoxId> = tree.children(id).collect();
    let mut y = surround.top;
    let mut prev_bottom_margin: Option<i32> = None;
    for &child in &children {
        let margins = info
            .styles
            .get(tree[child].style)
            .margins_px(&info.transform);
        match prev_bottom_margin {
            None => y += margins.top,
            Some(prev) => y += prev.min(margins.top),
        }
        let child_node = &mut tree[child];
        child_node.left = surround.left + margins.left;
        child_node.top = y;
        y += child_node.height;
        prev_bottom_margin = Some(margins.bottom);
    }
    y += prev_bottom_margin.unwrap_or(0);
    let node = &mut tree[id];
    node.width = info.avail_width;
    node.height = y + surround.bottom;
}

/// Lays out a row: children in column slots, or flowed onto wrapped lines.
pub(crate) fn layout_row(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    for (child, avail) in child_avails(tree, id, info) {
        layout_box(tree, child, &info.with_avail_width(avail))?;
    }
    place_row_children(tree, id, info);
    Ok(())
}

/// Positions already-sized children of a row and records the row's size.
pub(crate) fn place_row_children(tree: &mut BoxTree, id: BoxId, info: &LayoutInfo<'_>) {
    let surround = info.styles.get(tree[id].style).surround_px(&info.transform);
    let content_width = (info.avail_width - surround.horizontal()).max(0);
    let children: Vec<BoxId> = tree.children(id).collect();
    let wrap = matches!(&tree[id].kind, BoxKind::Row(row) if row.wrap);

    if wrap {
        // Flow children left to right, starting a new line once the next
        // child would exceed the available width; each line is as tall as
        // its tallest member.
        let mut x = surround.left;
        let mut y = surround.top;
        let mut line_height = 0;
        for &child in &children {
            let margins = info
                .styles
                .get(tree[child].style)
                .margins_px(&info.transform);
            let advance = margins.horizontal() + tree[child].width;
            if x > surround.left && x + advance > surround.left + content_width {
                x = surround.left;
                y += line_height;
                line_height = 0;
            }
            let extent = margins.vertical() + tree[child].height;
            let child_node = &mut tree[child];
            child_node.left = x + margins.left;
            child_node.top = y + margins.top;
            x += advance;
            line_height = line_height.max(extent);
        }
        let node = &mut tree[id];
        node.width = info.avail_width;
        node.height = y + line_height + surround.bottom;
    } else {
        let widths = match &tree[id].kind {
            BoxKind::Row(row) => {
                row.strategy
                    .column_widths(content_width, children.len(), &info.transform)
            }
            _ => unreachable!("place_row_children requires a row box"),
        };
        let mut x = surround.left;
        let mut max_extent = 0;
        for (i, &child) in children.iter().enumerate() {
            let margins = info
                .styles
                .get(tree[child].style)
                .margins_px(&info.transform);
            let extent = margins.vertical() + tree[child].height;
            let child_node = &mut tree[child];
            child_node.left = x + margins.left;
            child_node.top = surround.top + margins.top;
            x += widths[i];
            max_extent = max_extent.max(extent);
        }
        let node = &mut tree[id];
        node.width = info.avail_width;
        node.height = surround.top + max_extent + surround.bottom;
    }
}
