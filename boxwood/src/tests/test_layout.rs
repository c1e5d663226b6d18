// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{mp, HostEvent, TestEnv, LINE_H};
use crate::layout::group::{FixedColumns, RowBox};
use crate::style::Style;
use crate::text::{ClientRun, TextClientRun};
use crate::tree::BoxKind;
use crate::Thickness;

#[test]
fn margin_collapse_uses_smaller_margin() {
    let mut env = TestEnv::new();
    let s1 = env
        .root
        .styles_mut()
        .with_margins(Style::DEFAULT, Thickness::new(0, 0, 0, mp(10)));
    let s2 = env
        .root
        .styles_mut()
        .with_margins(Style::DEFAULT, Thickness::new(0, mp(6), 0, 0));
    let b1 = env.block(s1, mp(20), mp(20));
    let b2 = env.block(s2, mp(20), mp(20));
    env.layout(200);

    let bottom_of_first = env.root.tree()[b1].top + env.root.tree()[b1].height;
    let gap = env.root.tree()[b2].top - bottom_of_first;
    assert_eq!(gap, 6, "gap must be min(10, 6), not the sum");
}

#[test]
fn pile_height_spans_children_and_margins() {
    let mut env = TestEnv::new();
    let s1 = env
        .root
        .styles_mut()
        .with_margins(Style::DEFAULT, Thickness::new(0, 0, 0, mp(10)));
    let s2 = env
        .root
        .styles_mut()
        .with_margins(Style::DEFAULT, Thickness::new(0, mp(6), 0, 0));
    env.block(s1, mp(20), mp(20));
    env.block(s2, mp(20), mp(20));
    env.layout(200);

    let root = env.root.root_id();
    assert_eq!(env.root.tree()[root].height, 20 + 6 + 20);
    assert_eq!(env.root.tree()[root].width, 200);
}

#[test]
fn row_fixed_columns_position_children() {
    let mut env = TestEnv::new();
    let row = env.root.tree_mut().alloc(
        Style::DEFAULT,
        BoxKind::Row(RowBox::with_strategy(Box::new(FixedColumns(vec![
            mp(50),
            mp(30),
        ])))),
    );
    let root = env.root.root_id();
    env.root.tree_mut().append_child(root, row);
    let b1 = env.block(Style::DEFAULT, mp(20), mp(20));
    let b2 = env.block(Style::DEFAULT, mp(20), mp(20));
    env.root.tree_mut().remove_child(b1);
    env.root.tree_mut().remove_child(b2);
    env.root.tree_mut().append_child(row, b1);
    env.root.tree_mut().append_child(row, b2);
    env.layout(200);

    assert_eq!(env.root.tree()[b1].left, 0);
    assert_eq!(env.root.tree()[b2].left, 50);
    assert_eq!(env.root.tree()[row].height, 20);
}

#[test]
fn row_wrap_starts_new_line_and_tracks_height() {
    let mut env = TestEnv::new();
    let row = env
        .root
        .tree_mut()
        .alloc(Style::DEFAULT, BoxKind::Row(RowBox::wrapping()));
    let root = env.root.root_id();
    env.root.tree_mut().append_child(root, row);
    let mut blocks = Vec::new();
    for _ in 0..3 {
        let b = env.block(Style::DEFAULT, mp(40), mp(20));
        env.root.tree_mut().remove_child(b);
        env.root.tree_mut().append_child(row, b);
        blocks.push(b);
    }
    env.layout(100);

    assert_eq!(env.root.tree()[blocks[0]].top, 0);
    assert_eq!(env.root.tree()[blocks[1]].left, 40);
    // The third child would exceed the available width, so it wraps.
    assert_eq!(env.root.tree()[blocks[2]].left, 0);
    assert_eq!(env.root.tree()[blocks[2]].top, 20);
    assert_eq!(env.root.tree()[row].height, 40);
}

#[test]
fn hairline_border_survives_rounding() {
    let mut env = TestEnv::new();
    // 300 millipoints is less than half a pixel at 96dpi.
    let bordered = env
        .root
        .styles_mut()
        .with_borders(Style::DEFAULT, Thickness::uniform(300));
    let b = env.block(bordered, mp(20), mp(20));
    env.layout(200);

    let sides = env
        .root
        .styles()
        .get(bordered)
        .borders_px(&env.root.transform());
    assert_eq!(sides.left, 1);
    assert_eq!(env.root.tree()[b].width, 22);
}

#[test]
fn para_wraps_and_stacks_lines() {
    let mut env = TestEnv::new();
    let para = env.para("aaaa bbbb cccc");
    env.layout(100);

    let BoxKind::Para(p) = &env.root.tree()[para].kind else {
        panic!("expected a paragraph");
    };
    assert_eq!(p.lines().len(), 2);
    assert_eq!(env.root.tree()[para].height, 2 * LINE_H);
}

#[test]
fn relayout_touches_only_the_fixup_path() {
    let mut env = TestEnv::with_ws(&[1, 2, 3]);
    let styles = [1, 2, 3].map(|ws| {
        env.root
            .styles_mut()
            .with_ws(Style::DEFAULT, crate::style::WsId(ws))
    });
    let _p1 = env.para_with_style("first paragraph", styles[0]);
    let p2 = env.para_with_style("second paragraph", styles[1]);
    let _p3 = env.para_with_style("third paragraph", styles[2]);
    env.layout(400);
    env.reset_calls();
    env.take_events();

    env.root
        .replace_client_run(
            p2,
            0,
            ClientRun::Text(TextClientRun::new("second paragraph, edited", styles[1])),
        )
        .expect("replace");

    assert_eq!(env.ws_call_count(1), 0, "sibling subtree must not re-lay");
    assert_eq!(env.ws_call_count(3), 0, "sibling subtree must not re-lay");
    assert!(env.ws_call_count(2) > 0, "the edited paragraph re-lays");
    assert!(
        env.take_events()
            .iter()
            .any(|e| matches!(e, HostEvent::InvalidateRoot(_))),
        "the edit must invalidate its old rectangle"
    );
}

#[test]
fn relayout_is_noop_without_dirt() {
    let mut env = TestEnv::with_ws(&[1]);
    let s = env
        .root
        .styles_mut()
        .with_ws(Style::DEFAULT, crate::style::WsId(1));
    let _para = env.para_with_style("hello world", s);
    env.layout(400);
    env.reset_calls();

    env.root.relayout(&[]).expect("relayout");
    assert_eq!(env.ws_call_count(1), 0);
}
