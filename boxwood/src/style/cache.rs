// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interned style bundles and the derivation cache.

use core::hash::{Hash, Hasher};
use std::sync::Arc;

use hashbrown::HashMap;
use peniko::color::Rgba8;

use super::{hash_opt_rgba8, hash_rgba8, FontWeight, Stylesheet, TextProp, UnderlineKind, WsId};
use crate::coords::{LayoutTransform, PixelSides, Thickness};

const BLACK: Rgba8 = Rgba8 {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// Handle for an interned [`AssembledStyles`] bundle.
///
/// Two handles are equal exactly when the bundles they denote are
/// structurally equal, so equality and hashing of styles is a single integer
/// comparison.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Style(u32);

impl Style {
    /// Handle of the default bundle every cache is seeded with.
    pub const DEFAULT: Self = Self(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An immutable, fully resolved formatting bundle.
///
/// Instances live in a [`StyleCache`] and are addressed by [`Style`] handles;
/// nothing outside the cache mutates one.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledStyles {
    /// Font face name.
    pub face_name: Arc<str>,
    /// Font size in millipoints.
    pub font_size: i32,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Italic slant.
    pub italic: bool,
    /// Foreground color.
    pub fore_color: Rgba8,
    /// Background color, if any.
    pub back_color: Option<Rgba8>,
    /// Underline color; `None` uses the foreground color.
    pub underline_color: Option<Rgba8>,
    /// Border color.
    pub border_color: Rgba8,
    /// Underline kind.
    pub underline: UnderlineKind,
    /// Baseline offset in millipoints; positive raises the text.
    pub baseline_offset: i32,
    /// Line height in millipoints; `None` derives it from font metrics.
    pub line_height: Option<i32>,
    /// Margins outside the border.
    pub margins: Thickness,
    /// Padding inside the border.
    pub padding: Thickness,
    /// Border widths.
    pub borders: Thickness,
    /// Name of the last-applied named style, if any.
    pub style_name: Option<Arc<str>>,
    /// Writing system, once one has been set.
    pub ws: Option<WsId>,
}

impl Default for AssembledStyles {
    fn default() -> Self {
        Self {
            face_name: Arc::from("sans-serif"),
            font_size: 10_000,
            font_weight: FontWeight::NORMAL,
            italic: false,
            fore_color: BLACK,
            back_color: None,
            underline_color: None,
            border_color: BLACK,
            underline: UnderlineKind::None,
            baseline_offset: 0,
            line_height: None,
            margins: Thickness::ZERO,
            padding: Thickness::ZERO,
            borders: Thickness::ZERO,
            style_name: None,
            ws: None,
        }
    }
}

impl Eq for AssembledStyles {}

// Manual impl because `Rgba8` hashes by its bytes.
impl Hash for AssembledStyles {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.face_name.hash(state);
        self.font_size.hash(state);
        self.font_weight.hash(state);
        self.italic.hash(state);
        hash_rgba8(self.fore_color, state);
        hash_opt_rgba8(self.back_color, state);
        hash_opt_rgba8(self.underline_color, state);
        hash_rgba8(self.border_color, state);
        self.underline.hash(state);
        self.baseline_offset.hash(state);
        self.line_height.hash(state);
        self.margins.hash(state);
        self.padding.hash(state);
        self.borders.hash(state);
        self.style_name.hash(state);
        self.ws.hash(state);
    }
}

impl AssembledStyles {
    /// Margin widths in device pixels.
    pub fn margins_px(&self, transform: &LayoutTransform) -> PixelSides {
        transform.thickness_px(self.margins)
    }

    /// Padding widths in device pixels.
    pub fn padding_px(&self, transform: &LayoutTransform) -> PixelSides {
        transform.thickness_px(self.padding)
    }

    /// Border widths in device pixels; a non-zero border never converts to
    /// zero pixels.
    pub fn borders_px(&self, transform: &LayoutTransform) -> PixelSides {
        transform.border_px(self.borders)
    }

    /// Total of margins, borders and padding per side, in device pixels.
    pub fn surround_px(&self, transform: &LayoutTransform) -> PixelSides {
        let m = self.margins_px(transform);
        let b = self.borders_px(transform);
        let p = self.padding_px(transform);
        PixelSides {
            left: m.left + b.left + p.left,
            top: m.top + b.top + p.top,
            right: m.right + b.right + p.right,
            bottom: m.bottom + b.bottom + p.bottom,
        }
    }

    /// The effective underline color.
    pub fn effective_underline_color(&self) -> Rgba8 {
        self.underline_color.unwrap_or(self.fore_color)
    }
}

/// Interning cache for [`AssembledStyles`].
///
/// Derivation operations return canonical handles: a memoized
/// (base, property) edge table answers repeated derivations without cloning,
/// and a full structural-equality table guarantees one handle per unique
/// bundle. The cache is unbounded and lives for the process.
pub struct StyleCache {
    table: Vec<AssembledStyles>,
    interned: HashMap<AssembledStyles, Style>,
    edges: HashMap<(Style, TextProp), Style>,
    stylesheet: Arc<dyn Stylesheet>,
}

impl core::fmt::Debug for StyleCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StyleCache")
            .field("styles", &self.table.len())
            .field("edges", &self.edges.len())
            .finish_non_exhaustive()
    }
}

impl StyleCache {
    /// Creates a cache resolving named styles against `stylesheet`.
    pub fn new(stylesheet: Arc<dyn Stylesheet>) -> Self {
        let mut cache = Self {
            table: Vec::new(),
            interned: HashMap::new(),
            edges: HashMap::new(),
            stylesheet,
        };
        let default = cache.intern(AssembledStyles::default());
        debug_assert_eq!(default, Style::DEFAULT);
        cache
    }

    /// The bundle a handle denotes.
    pub fn get(&self, style: Style) -> &AssembledStyles {
        &self.table[style.index()]
    }

    /// Number of distinct bundles interned so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the cache holds only the default bundle.
    pub fn is_empty(&self) -> bool {
        self.table.len() <= 1
    }

    /// Canonical handle for a bundle, interning it if new.
    pub fn intern(&mut self, bundle: AssembledStyles) -> Style {
        if let Some(&style) = self.interned.get(&bundle) {
            return style;
        }
        let style = Style(self.table.len() as u32);
        self.table.push(bundle.clone());
        self.interned.insert(bundle, style);
        style
    }

    /// Derives a bundle differing from `base` in exactly one property.
    ///
    /// The (base, property) edge is memoized, and the result is interned, so
    /// any two derivation paths reaching the same bundle yield the same
    /// handle.
    pub fn derive(&mut self, base: Style, prop: TextProp) -> Style {
        if let Some(&hit) = self.edges.get(&(base, prop.clone())) {
            return hit;
        }
        let mut bundle = self.get(base).clone();
        self.apply_prop(&mut bundle, &prop);
        let derived = self.intern(bundle);
        self.edges.insert((base, prop), derived);
        derived
    }

    /// Derivative with the given face name.
    pub fn with_face_name(&mut self, base: Style, face: &str) -> Style {
        self.derive(base, TextProp::FaceName(Arc::from(face)))
    }

    /// Derivative with the given font size in millipoints.
    pub fn with_font_size(&mut self, base: Style, mp: i32) -> Style {
        self.derive(base, TextProp::FontSize(mp))
    }

    /// Derivative with the given font weight.
    pub fn with_font_weight(&mut self, base: Style, weight: FontWeight) -> Style {
        self.derive(base, TextProp::FontWeight(weight))
    }

    /// Derivative with the given italic setting.
    pub fn with_italic(&mut self, base: Style, italic: bool) -> Style {
        self.derive(base, TextProp::Italic(italic))
    }

    /// Derivative with the given foreground color.
    pub fn with_fore_color(&mut self, base: Style, color: Rgba8) -> Style {
        self.derive(base, TextProp::ForeColor(color))
    }

    /// Derivative with the given background color.
    pub fn with_back_color(&mut self, base: Style, color: Option<Rgba8>) -> Style {
        self.derive(base, TextProp::BackColor(color))
    }

    /// Derivative with the given underline kind.
    pub fn with_underline(&mut self, base: Style, kind: UnderlineKind) -> Style {
        self.derive(base, TextProp::Underline(kind))
    }

    /// Derivative with the given baseline offset in millipoints.
    pub fn with_baseline_offset(&mut self, base: Style, mp: i32) -> Style {
        self.derive(base, TextProp::BaselineOffset(mp))
    }

    /// Derivative with the given line height.
    pub fn with_line_height(&mut self, base: Style, mp: Option<i32>) -> Style {
        self.derive(base, TextProp::LineHeight(mp))
    }

    /// Derivative with the given margins.
    pub fn with_margins(&mut self, base: Style, margins: Thickness) -> Style {
        self.derive(base, TextProp::Margins(margins))
    }

    /// Derivative with the given padding.
    pub fn with_padding(&mut self, base: Style, padding: Thickness) -> Style {
        self.derive(base, TextProp::Padding(padding))
    }

    /// Derivative with the given border widths.
    pub fn with_borders(&mut self, base: Style, borders: Thickness) -> Style {
        self.derive(base, TextProp::Borders(borders))
    }

    /// Derivative with the given border color.
    pub fn with_border_color(&mut self, base: Style, color: Rgba8) -> Style {
        self.derive(base, TextProp::BorderColor(color))
    }

    /// Derivative with the given writing system.
    pub fn with_ws(&mut self, base: Style, ws: WsId) -> Style {
        self.derive(base, TextProp::WritingSystem(ws))
    }

    /// Derivative with the named style applied.
    ///
    /// The style's default character formatting is applied first; if `base`
    /// already has a writing system, that writing system's override for the
    /// style is applied on top.
    pub fn with_named_style(&mut self, base: Style, name: &str) -> Style {
        self.derive(base, TextProp::NamedStyle(Arc::from(name)))
    }

    /// Applies explicit properties to `base` in cascade order.
    ///
    /// The declared order of `props` does not matter: writing-system
    /// properties resolve first, named styles second, and the remaining
    /// explicit properties last. A writing system must be in place before a
    /// named style is looked up so the style's writing-system override can
    /// participate.
    pub fn apply_text_props(&mut self, base: Style, props: &[TextProp]) -> Style {
        let mut style = base;
        for prop in props {
            if matches!(prop, TextProp::WritingSystem(_)) {
                style = self.derive(style, prop.clone());
            }
        }
        for prop in props {
            if matches!(prop, TextProp::NamedStyle(_)) {
                style = self.derive(style, prop.clone());
            }
        }
        for prop in props {
            if !matches!(prop, TextProp::WritingSystem(_) | TextProp::NamedStyle(_)) {
                style = self.derive(style, prop.clone());
            }
        }
        style
    }

    /// Derivative carrying only inherited properties, for a new nesting
    /// context.
    ///
    /// Font, colors, underline, writing system and named style pass through;
    /// background, margins, padding and borders reset to their defaults.
    pub fn inherited_only(&mut self, base: Style) -> Style {
        let mut bundle = self.get(base).clone();
        bundle.back_color = None;
        bundle.margins = Thickness::ZERO;
        bundle.padding = Thickness::ZERO;
        bundle.borders = Thickness::ZERO;
        bundle.border_color = BLACK;
        self.intern(bundle)
    }

    fn apply_prop(&self, bundle: &mut AssembledStyles, prop: &TextProp) {
        match prop {
            TextProp::FaceName(face) => bundle.face_name = face.clone(),
            TextProp::FontSize(mp) => bundle.font_size = *mp,
            TextProp::FontWeight(weight) => bundle.font_weight = *weight,
            TextProp::Italic(italic) => bundle.italic = *italic,
            TextProp::ForeColor(color) => bundle.fore_color = *color,
            TextProp::BackColor(color) => bundle.back_color = *color,
            TextProp::UnderlineColor(color) => bundle.underline_color = *color,
            TextProp::BorderColor(color) => bundle.border_color = *color,
            TextProp::Underline(kind) => bundle.underline = *kind,
            TextProp::BaselineOffset(mp) => bundle.baseline_offset = *mp,
            TextProp::LineHeight(mp) => bundle.line_height = *mp,
            TextProp::Margins(t) => bundle.margins = *t,
            TextProp::Padding(t) => bundle.padding = *t,
            TextProp::Borders(t) => bundle.borders = *t,
            TextProp::WritingSystem(ws) => bundle.ws = Some(*ws),
            TextProp::NamedStyle(name) => {
                bundle.style_name = Some(name.clone());
                let Some(defn) = self.stylesheet.style(name) else {
                    return;
                };
                for p in &defn.props {
                    // A nested named style would recurse through the
                    // stylesheet; only its name is recorded.
                    if let TextProp::NamedStyle(nested) = p {
                        bundle.style_name = Some(nested.clone());
                    } else {
                        self.apply_prop(bundle, p);
                    }
                }
                if let Some(ws) = bundle.ws {
                    if let Some(overrides) = defn.override_for(ws) {
                        for p in overrides {
                            if !matches!(p, TextProp::NamedStyle(_)) {
                                self.apply_prop(bundle, p);
                            }
                        }
                    }
                }
            }
        }
    }
}
