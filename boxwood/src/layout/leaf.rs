// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf boxes: fixed blocks and images.
//!
//! Besides being rectangles in the tree, leaf boxes stand in for one
//! character of the text model; the [`placeholder_run`] capability is how
//! the mapping and editing layers see them.
//!
//! [`placeholder_run`]: crate::tree::BoxKind::placeholder_run

use peniko::color::Rgba8;
use peniko::ImageData as Image;

use super::LayoutInfo;
use crate::error::Error;
use crate::text::OBJ_REPLACEMENT;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// A fixed-size filled rectangle.
#[derive(Clone, Debug)]
pub struct BlockBox {
    /// Content width in millipoints.
    pub width: i32,
    /// Content height in millipoints.
    pub height: i32,
    /// Fill color.
    pub color: Rgba8,
}

/// A bitmap scaled to a fixed destination size.
#[derive(Clone, Debug)]
pub struct ImageBox {
    /// The bitmap.
    pub image: Image,
    /// Destination width in millipoints.
    pub width: i32,
    /// Destination height in millipoints.
    pub height: i32,
}

/// The one-character run a leaf box contributes to the text model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaceholderRun {
    /// Logical length of the placeholder; always one for today's leaves.
    pub len: usize,
    /// The character standing in for the box.
    pub text: char,
}

impl BoxKind {
    /// The run-like capability of a leaf box, if this kind has one.
    pub fn placeholder_run(&self) -> Option<PlaceholderRun> {
        match self {
            Self::Block(_) | Self::Image(_) => Some(PlaceholderRun {
                len: 1,
                text: OBJ_REPLACEMENT,
            }),
            _ => None,
        }
    }
}

pub(crate) fn layout_block(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    let surround = info.styles.get(tree[id].style).surround_px(&info.transform);
    let (w, h) = match &tree[id].kind {
        BoxKind::Block(block) => (
            info.transform.to_px_x(block.width),
            info.transform.to_px_y(block.height),
        ),
        _ => unreachable!("layout_block requires a block box"),
    };
    let node = &mut tree[id];
    node.width = w + surround.horizontal();
    node.height = h + surround.vertical();
    Ok(())
}

pub(crate) fn layout_image(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    let surround = info.styles.get(tree[id].style).surround_px(&info.transform);
    let (w, h) = match &tree[id].kind {
        BoxKind::Image(image) => (
            info.transform.to_px_x(image.width),
            info.transform.to_px_y(image.height),
        ),
        _ => unreachable!("layout_image requires an image box"),
    };
    let node = &mut tree[id];
    node.width = w + surround.horizontal();
    node.height = h + surround.vertical();
    Ok(())
}
