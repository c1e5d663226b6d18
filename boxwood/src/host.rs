// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator interfaces.
//!
//! Boxwood never shapes glyphs, owns a window or touches the document
//! schema. Those concerns arrive through the traits here: a
//! [`RendererFactory`] supplies per-writing-system measurement, a
//! [`DrawingSurface`] accepts paint commands, and a [`HostSite`] receives
//! invalidation, scrolling and size-change traffic.

use peniko::Color;
use peniko::ImageData as Image;

use crate::coords::{Point, Rect, Size};
use crate::error::Error;
use crate::lazy::SizeChange;
use crate::style::{AssembledStyles, WsId};

/// Identifier of a domain object, opaque to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u64);

/// Identifier of a property of a domain object, opaque to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropId(pub u32);

/// Identity of one property of one object: the granularity at which the
/// domain layer reports changes and at which boxes register interest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropTag {
    /// The owning object.
    pub obj: ObjId,
    /// The changed property.
    pub prop: PropId,
}

/// Result of fitting a prefix of text into an available width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Fit {
    /// Number of characters that fit.
    pub chars: usize,
    /// Width consumed by those characters, in device pixels.
    pub px: i32,
}

/// Measurement engine for one writing system.
///
/// Implementations wrap whatever shaping stack the application uses; the
/// layout engine only asks for widths, vertical metrics and break positions.
pub trait TextRenderer {
    /// Width of `text` in device pixels under `styles`.
    fn measure(&self, styles: &AssembledStyles, text: &str) -> i32;

    /// Ascent and descent in device pixels under `styles`.
    fn ascent_descent(&self, styles: &AssembledStyles) -> (i32, i32);

    /// Longest prefix of `text` fitting within `avail` pixels, preferring to
    /// break after whitespace.
    ///
    /// With `force` set the result contains at least one character whenever
    /// `text` is non-empty, so a too-narrow line still makes progress.
    fn fit(&self, styles: &AssembledStyles, text: &str, avail: i32, force: bool) -> Fit;

    /// The character boundary nearest to `x` pixels into `text`, for caret
    /// placement.
    ///
    /// The default walks prefix widths; implementations with cheaper cluster
    /// maps should override it.
    fn char_index(&self, styles: &AssembledStyles, text: &str, x: i32) -> Fit {
        let mut prev_px = 0;
        let mut out = Fit::default();
        let char_count = text.chars().count();
        for i in 1..=char_count {
            let prefix: String = text.chars().take(i).collect();
            let w = self.measure(styles, &prefix);
            if x < (prev_px + w) / 2 {
                break;
            }
            out = Fit { chars: i, px: w };
            prev_px = w;
        }
        out
    }
}

/// Source of [`TextRenderer`]s, one per writing system.
pub trait RendererFactory {
    /// The renderer for a writing system.
    ///
    /// Absence of a usable renderer is the factory's fault to report, via
    /// [`Error::RendererUnavailable`].
    fn renderer(&self, ws: WsId) -> Result<&dyn TextRenderer, Error>;

    /// True if the writing system runs right-to-left.
    fn is_rtl(&self, ws: WsId) -> bool;
}

/// Paint-command receiver, in device coordinates.
pub trait DrawingSurface {
    /// Fills a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws a run of text with its baseline-left corner at `origin`.
    fn draw_text(&mut self, origin: Point, text: &str, styles: &AssembledStyles, ws: WsId);

    /// Draws an image scaled into `dest`.
    fn draw_image(&mut self, image: &Image, dest: Rect);
}

/// The engine's view of the hosting window.
pub trait HostSite {
    /// Marks a root-relative rectangle as needing repaint.
    fn invalidate_root(&mut self, rect: Rect);

    /// Marks a device-relative rectangle as needing repaint.
    fn invalidate_device(&mut self, rect: Rect);

    /// Reports that lazily estimated content changed real size, so the host
    /// can adjust its scroll position without a visible jump.
    fn size_changed(&mut self, change: SizeChange);

    /// Current scroll offsets.
    fn scroll_position(&self) -> Point;

    /// Moves the scroll offsets.
    fn set_scroll_position(&mut self, position: Point);

    /// Publishes the total scrollable extent.
    fn set_scroll_range(&mut self, extent: Size);
}
