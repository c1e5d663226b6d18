// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cascading style model.
//!
//! Formatting is carried by [`AssembledStyles`] bundles, which are immutable
//! and interned: structurally equal bundles are always the same [`Style`]
//! handle, so consumers compare and hash styles by handle alone. Bundles are
//! derived from one another one property at a time through the
//! [`StyleCache`], which memoizes every derivation edge it has seen.

mod cache;

use core::hash::{Hash, Hasher};
use std::sync::Arc;

pub use cache::{AssembledStyles, Style, StyleCache};

use crate::coords::Thickness;
use peniko::color::Rgba8;

/// Identifier of a writing system.
///
/// Writing systems are owned by the renderer collaborator; the engine only
/// forwards them and uses them to group rendered runs for painting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WsId(pub u32);

/// Visual weight of a font.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Normal (regular) weight.
    pub const NORMAL: Self = Self(400);
    /// Bold weight.
    pub const BOLD: Self = Self(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Kind of underline decoration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnderlineKind {
    /// No underline.
    #[default]
    None,
    /// Single solid line.
    Single,
    /// Double solid line.
    Double,
    /// Dotted line.
    Dotted,
    /// Dashed line.
    Dashed,
    /// Squiggly (wavy) line.
    Squiggle,
}

/// A single settable formatting property.
///
/// The set is closed; every variant corresponds to one field of
/// [`AssembledStyles`] except [`TextProp::NamedStyle`], which expands to the
/// named style's character formatting via the injected [`Stylesheet`].
#[derive(Clone, Debug, PartialEq)]
pub enum TextProp {
    /// Font face name.
    FaceName(Arc<str>),
    /// Font size in millipoints.
    FontSize(i32),
    /// Font weight.
    FontWeight(FontWeight),
    /// Italic slant.
    Italic(bool),
    /// Foreground (text) color.
    ForeColor(Rgba8),
    /// Background color; `None` paints nothing behind the box.
    BackColor(Option<Rgba8>),
    /// Underline color; `None` uses the foreground color.
    UnderlineColor(Option<Rgba8>),
    /// Border color.
    BorderColor(Rgba8),
    /// Underline kind.
    Underline(UnderlineKind),
    /// Baseline offset in millipoints; positive raises the text.
    BaselineOffset(i32),
    /// Line height in millipoints; `None` derives it from font metrics.
    LineHeight(Option<i32>),
    /// Margins outside the border.
    Margins(Thickness),
    /// Padding inside the border.
    Padding(Thickness),
    /// Border widths.
    Borders(Thickness),
    /// Named style from the stylesheet.
    NamedStyle(Arc<str>),
    /// Writing system.
    WritingSystem(WsId),
}

impl Eq for TextProp {}

// Manual impl because `Rgba8` payloads hash by their bytes.
impl Hash for TextProp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::FaceName(name) | Self::NamedStyle(name) => name.hash(state),
            Self::FontSize(v) | Self::BaselineOffset(v) => v.hash(state),
            Self::FontWeight(w) => w.hash(state),
            Self::Italic(b) => b.hash(state),
            Self::ForeColor(c) | Self::BorderColor(c) => hash_rgba8(*c, state),
            Self::BackColor(c) | Self::UnderlineColor(c) => {
                c.is_some().hash(state);
                if let Some(c) = c {
                    hash_rgba8(*c, state);
                }
            }
            Self::Underline(k) => k.hash(state),
            Self::LineHeight(v) => v.hash(state),
            Self::Margins(t) | Self::Padding(t) | Self::Borders(t) => t.hash(state),
            Self::WritingSystem(ws) => ws.hash(state),
        }
    }
}

pub(crate) fn hash_rgba8<H: Hasher>(c: Rgba8, state: &mut H) {
    (c.r, c.g, c.b, c.a).hash(state);
}

pub(crate) fn hash_opt_rgba8<H: Hasher>(c: Option<Rgba8>, state: &mut H) {
    c.is_some().hash(state);
    if let Some(c) = c {
        hash_rgba8(c, state);
    }
}

/// A named style's formatting as resolved from a stylesheet.
#[derive(Clone, Debug, Default)]
pub struct StyleDefinition {
    /// Default character formatting applied by the style.
    pub props: Vec<TextProp>,
    /// Per-writing-system overrides, applied after `props` when the target
    /// bundle already has that writing system set.
    pub ws_overrides: Vec<(WsId, Vec<TextProp>)>,
}

impl StyleDefinition {
    /// The override property list for a writing system, if any.
    pub fn override_for(&self, ws: WsId) -> Option<&[TextProp]> {
        self.ws_overrides
            .iter()
            .find(|(w, _)| *w == ws)
            .map(|(_, props)| props.as_slice())
    }
}

/// Source of named styles.
///
/// Injected into the [`StyleCache`]; the engine has no stylesheet model of
/// its own.
pub trait Stylesheet {
    /// Resolves a style name to its formatting, if the stylesheet defines it.
    fn style(&self, name: &str) -> Option<StyleDefinition>;
}

/// A stylesheet defining no styles.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyStylesheet;

impl Stylesheet for EmptyStylesheet {
    fn style(&self, _name: &str) -> Option<StyleDefinition> {
        None
    }
}
