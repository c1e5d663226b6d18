// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use peniko::color::Rgba8;

use crate::style::{
    EmptyStylesheet, FontWeight, Style, StyleCache, StyleDefinition, Stylesheet, TextProp,
    UnderlineKind, WsId,
};
use crate::Thickness;

const RED: Rgba8 = Rgba8 {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};

fn cache() -> StyleCache {
    StyleCache::new(Arc::new(EmptyStylesheet))
}

/// "Emphasis" applies italics, and for writing system 2 also switches the
/// face.
#[derive(Debug)]
struct SheetWithEmphasis;

impl Stylesheet for SheetWithEmphasis {
    fn style(&self, name: &str) -> Option<StyleDefinition> {
        (name == "Emphasis").then(|| StyleDefinition {
            props: vec![TextProp::Italic(true)],
            ws_overrides: vec![(WsId(2), vec![TextProp::FaceName(Arc::from("Ethiopic"))])],
        })
    }
}

#[test]
fn two_derivation_paths_one_instance() {
    let mut cache = cache();
    let a = cache.with_font_weight(Style::DEFAULT, FontWeight::BOLD);
    let a = cache.with_italic(a, true);
    let b = cache.with_italic(Style::DEFAULT, true);
    let b = cache.with_font_weight(b, FontWeight::BOLD);
    assert_eq!(a, b, "equal bundles must be the same handle");
    assert_eq!(cache.get(a).font_weight, FontWeight::BOLD);
    assert!(cache.get(a).italic);
}

#[test]
fn derivation_edges_are_memoized() {
    let mut cache = cache();
    let a = cache.with_fore_color(Style::DEFAULT, RED);
    let interned = cache.len();
    let b = cache.with_fore_color(Style::DEFAULT, RED);
    assert_eq!(a, b);
    assert_eq!(cache.len(), interned, "repeat derivation must not intern");
}

#[test]
fn no_op_derivation_is_identity() {
    let mut cache = cache();
    let same = cache.with_font_weight(Style::DEFAULT, FontWeight::NORMAL);
    assert_eq!(same, Style::DEFAULT);
}

#[test]
fn apply_text_props_order_independent() {
    let mut cache = StyleCache::new(Arc::new(SheetWithEmphasis));
    let orders: [&[TextProp]; 3] = [
        &[
            TextProp::WritingSystem(WsId(2)),
            TextProp::NamedStyle(Arc::from("Emphasis")),
            TextProp::FontWeight(FontWeight::BOLD),
        ],
        &[
            TextProp::FontWeight(FontWeight::BOLD),
            TextProp::WritingSystem(WsId(2)),
            TextProp::NamedStyle(Arc::from("Emphasis")),
        ],
        &[
            TextProp::NamedStyle(Arc::from("Emphasis")),
            TextProp::FontWeight(FontWeight::BOLD),
            TextProp::WritingSystem(WsId(2)),
        ],
    ];
    let results: Vec<Style> = orders
        .iter()
        .map(|props| cache.apply_text_props(Style::DEFAULT, props))
        .collect();
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
    let bundle = cache.get(results[0]);
    assert!(bundle.italic);
    assert_eq!(&*bundle.face_name, "Ethiopic", "ws override must apply");
    assert_eq!(bundle.font_weight, FontWeight::BOLD);
}

#[test]
fn named_style_without_ws_skips_override() {
    let mut cache = StyleCache::new(Arc::new(SheetWithEmphasis));
    let styled = cache.with_named_style(Style::DEFAULT, "Emphasis");
    let bundle = cache.get(styled);
    assert!(bundle.italic);
    assert_eq!(&*bundle.face_name, "sans-serif");
    assert_eq!(bundle.style_name.as_deref(), Some("Emphasis"));
}

#[test]
fn named_style_override_applies_after_ws() {
    let mut cache = StyleCache::new(Arc::new(SheetWithEmphasis));
    let ws = cache.with_ws(Style::DEFAULT, WsId(2));
    let styled = cache.with_named_style(ws, "Emphasis");
    assert_eq!(&*cache.get(styled).face_name, "Ethiopic");

    // The other order leaves the default face: the style resolved before
    // the writing system arrived.
    let styled = cache.with_named_style(Style::DEFAULT, "Emphasis");
    let ws_late = cache.with_ws(styled, WsId(2));
    assert_eq!(&*cache.get(ws_late).face_name, "sans-serif");
}

#[test]
fn inherited_only_resets_non_inherited() {
    let mut cache = cache();
    let style = cache.with_margins(Style::DEFAULT, Thickness::uniform(3000));
    let style = cache.with_padding(style, Thickness::uniform(1000));
    let style = cache.with_borders(style, Thickness::uniform(500));
    let style = cache.with_back_color(style, Some(RED));
    let style = cache.with_fore_color(style, RED);
    let style = cache.with_underline(style, UnderlineKind::Double);

    let inherited = cache.inherited_only(style);
    let bundle = cache.get(inherited);
    assert_eq!(bundle.margins, Thickness::ZERO);
    assert_eq!(bundle.padding, Thickness::ZERO);
    assert_eq!(bundle.borders, Thickness::ZERO);
    assert_eq!(bundle.back_color, None);
    assert_eq!(bundle.fore_color, RED, "inherited color passes through");
    assert_eq!(bundle.underline, UnderlineKind::Double);

    // The derivative is canonical like any other bundle.
    let again = cache.inherited_only(style);
    assert_eq!(inherited, again);
}

#[test]
fn interning_across_construction_routes() {
    let mut cache = cache();
    let via_ops = {
        let s = cache.with_fore_color(Style::DEFAULT, RED);
        cache.with_underline(s, UnderlineKind::Single)
    };
    let via_bundle = {
        let mut bundle = cache.get(Style::DEFAULT).clone();
        bundle.fore_color = RED;
        bundle.underline = UnderlineKind::Single;
        cache.intern(bundle)
    };
    assert_eq!(via_ops, via_bundle);
}
