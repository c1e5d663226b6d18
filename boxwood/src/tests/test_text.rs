// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use crate::style::{Style, StyleCache, EmptyStylesheet, WsId};
use crate::text::{
    ClientRun, MapRunKind, OrcInterpreter, Span, TextClientRun, TextSource, OBJ_REPLACEMENT,
};
use crate::tree::{BoxKind, BoxTree};

struct ThreeCharInterpreter;

impl OrcInterpreter for ThreeCharInterpreter {
    fn expand(&self, _run: usize, _offset: usize) -> TextClientRun {
        TextClientRun::new("XYZ", Style::DEFAULT)
    }
}

fn embedded_box() -> crate::tree::BoxId {
    let mut tree = BoxTree::new();
    tree.alloc(Style::DEFAULT, BoxKind::Pile)
}

fn source_with_orc() -> TextSource {
    // "ab<ORC>cd" + embedded box + "ef"
    let text = format!("ab{OBJ_REPLACEMENT}cd");
    TextSource::new(vec![
        ClientRun::Text(TextClientRun::new(text, Style::DEFAULT)),
        ClientRun::Embedded(embedded_box()),
        ClientRun::Text(TextClientRun::new("ef", Style::DEFAULT)),
    ])
    .with_interpreter(Arc::new(ThreeCharInterpreter))
}

#[test]
fn map_runs_partition_both_spaces() {
    let mut source = source_with_orc();
    let log_len = source.log_len();
    let ren_len = source.ren_len();
    assert_eq!(log_len, 5 + 1 + 2);
    // "ab" + "XYZ" + "cd" + box + "ef"
    assert_eq!(ren_len, 2 + 3 + 2 + 1 + 2);

    let maps = source.map_runs().to_vec();
    let mut log = 0;
    let mut ren = 0;
    for m in &maps {
        assert_eq!(m.log_start, log, "no gaps or overlaps in logical space");
        assert_eq!(m.ren_start, ren, "no gaps or overlaps in rendered space");
        log += m.log_len;
        ren += m.ren_len;
    }
    assert_eq!(log, log_len);
    assert_eq!(ren, ren_len);
}

#[test]
fn orc_collapses_many_to_one() {
    let mut source = source_with_orc();
    // Logical 2 is the sentinel; it renders as "XYZ" at rendered 2..5.
    assert_eq!(source.log_to_ren(2).unwrap(), 2);
    for ren in 2..5 {
        assert_eq!(source.ren_to_log(ren).unwrap(), 2);
    }
    // Logical offsets after the sentinel shift by the expansion.
    assert_eq!(source.log_to_ren(3).unwrap(), 5);
    assert_eq!(source.log_to_ren(5).unwrap(), 7);

    let log_len = source.log_len();
    for log in 0..=log_len {
        let ren = source.log_to_ren(log).unwrap();
        assert_eq!(
            source.ren_to_log(ren).unwrap(),
            log,
            "round trip must hold for every logical offset"
        );
    }
}

#[test]
fn out_of_range_offsets_fault() {
    let mut source = source_with_orc();
    let log_len = source.log_len();
    let ren_len = source.ren_len();
    assert!(source.log_to_ren(log_len).is_ok(), "end boundary is valid");
    assert!(source.log_to_ren(log_len + 1).is_err());
    assert!(source.ren_to_log(ren_len + 1).is_err());
}

#[test]
fn render_runs_merge_same_ws_and_break_at_boxes() {
    let mut styles = StyleCache::new(Arc::new(EmptyStylesheet));
    let ws1 = styles.with_ws(Style::DEFAULT, WsId(1));
    let ws1_bold = styles.with_font_weight(ws1, crate::style::FontWeight::BOLD);
    let ws2 = styles.with_ws(Style::DEFAULT, WsId(2));

    let mut source = TextSource::new(vec![
        ClientRun::Text(TextClientRun::styled(
            "abcd",
            vec![
                Span { len: 2, style: ws1 },
                Span {
                    len: 2,
                    style: ws1_bold,
                },
            ],
        )),
        ClientRun::Embedded(embedded_box()),
        ClientRun::Text(TextClientRun::new("ef", Style::DEFAULT)),
        ClientRun::Text(TextClientRun::new("gh", ws2)),
    ]);

    let runs = source.render_runs(&styles);
    // Two same-ws spans merge; the box splits; the trailing runs differ in ws.
    assert_eq!(runs.len(), 3);
    assert_eq!((runs[0].ren_start, runs[0].ren_len), (0, 4));
    assert_eq!(runs[0].ws, Some(WsId(1)));
    assert_eq!((runs[1].ren_start, runs[1].ren_len), (5, 2));
    assert_eq!(runs[1].ws, None);
    assert_eq!((runs[2].ren_start, runs[2].ren_len), (7, 2));
    assert_eq!(runs[2].ws, Some(WsId(2)));
}

#[test]
fn substitute_shows_for_empty_run() {
    let mut source = TextSource::new(vec![ClientRun::Text(
        TextClientRun::new("", Style::DEFAULT).with_substitute("type here", Style::DEFAULT),
    )]);
    assert_eq!(source.log_len(), 0);
    assert_eq!(source.ren_len(), 9);
    let maps = source.map_runs();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0].kind, MapRunKind::Substitute);
    assert_eq!(maps[0].log_len, 0);
    assert_eq!(source.rendered_text(), "type here");
}

#[test]
fn degenerate_empty_runs_are_swept() {
    // A sentinel at the start of the run leaves an empty text slice before
    // the expansion; it must not survive next to the non-empty runs.
    let text = format!("{OBJ_REPLACEMENT}ab");
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        text,
        Style::DEFAULT,
    ))])
    .with_interpreter(Arc::new(ThreeCharInterpreter));
    let maps = source.map_runs();
    assert!(
        maps.iter().all(|m| m.ren_len > 0),
        "empty slices next to non-empty text must be removed: {maps:?}"
    );
}

#[test]
fn empty_paragraph_keeps_its_caret_target() {
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        "",
        Style::DEFAULT,
    ))]);
    assert_eq!(source.map_runs().len(), 1);
    let anchor = source.select_at(0, false).unwrap();
    assert!(anchor.is_some(), "an empty run is still a caret target");
}

#[test]
fn growth_is_a_pure_insert() {
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        "cat",
        Style::DEFAULT,
    ))]);
    source.ren_len();
    let change = source
        .client_run_changed(0, ClientRun::Text(TextClientRun::new("cats", Style::DEFAULT)))
        .unwrap();
    assert_eq!((change.start, change.deleted, change.inserted), (3, 0, 1));
    assert_eq!(source.rendered_text(), "cats");
}

#[test]
fn shrink_is_a_pure_delete() {
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        "cats",
        Style::DEFAULT,
    ))]);
    source.ren_len();
    let change = source
        .client_run_changed(0, ClientRun::Text(TextClientRun::new("cat", Style::DEFAULT)))
        .unwrap();
    assert_eq!((change.start, change.deleted, change.inserted), (3, 1, 0));
}

#[test]
fn unchanged_text_reports_zero_length_change() {
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        "abc",
        Style::DEFAULT,
    ))]);
    source.ren_len();
    let change = source
        .client_run_changed(0, ClientRun::Text(TextClientRun::new("abc", Style::DEFAULT)))
        .unwrap();
    assert!(change.is_empty());
    assert_eq!(change.start, 0, "reported at the run's start");
}

#[test]
fn interior_edit_trims_prefix_and_suffix() {
    let mut source = TextSource::new(vec![
        ClientRun::Text(TextClientRun::new("hello world", Style::DEFAULT)),
        ClientRun::Text(TextClientRun::new("tail", Style::DEFAULT)),
    ]);
    source.ren_len();
    let change = source
        .client_run_changed(
            0,
            ClientRun::Text(TextClientRun::new("hello brave world", Style::DEFAULT)),
        )
        .unwrap();
    assert_eq!(change.start, 6);
    assert_eq!(change.deleted, 0);
    assert_eq!(change.inserted, 6);

    // Later runs shifted by the delta, nothing else rebuilt.
    let maps = source.map_runs().to_vec();
    let tail = maps.iter().find(|m| m.client == 1).unwrap();
    assert_eq!(tail.ren_start, 17);
    assert_eq!(source.ren_to_log(18).unwrap(), 18);
}

#[test]
fn formatting_change_counts_as_change() {
    let mut styles = StyleCache::new(Arc::new(EmptyStylesheet));
    let bold = styles.with_font_weight(Style::DEFAULT, crate::style::FontWeight::BOLD);
    let mut source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(
        "abc",
        Style::DEFAULT,
    ))]);
    source.ren_len();
    let change = source
        .client_run_changed(
            0,
            ClientRun::Text(TextClientRun::styled(
                "abc",
                vec![
                    Span {
                        len: 1,
                        style: Style::DEFAULT,
                    },
                    Span { len: 1, style: bold },
                    Span {
                        len: 1,
                        style: Style::DEFAULT,
                    },
                ],
            )),
        )
        .unwrap();
    // Same characters, but "b" changed formatting.
    assert_eq!((change.start, change.deleted, change.inserted), (1, 1, 1));
}

#[test]
fn select_at_falls_back_across_box_boundaries() {
    let mut source = TextSource::new(vec![
        ClientRun::Embedded(embedded_box()),
        ClientRun::Text(TextClientRun::new("ab", Style::DEFAULT)),
    ]);
    // Logical 1 is the boundary between the box and the text. Associating
    // with the previous "character" would target the box, so the anchor
    // falls back to the following text run.
    let anchor = source.select_at(1, true).unwrap().expect("has target");
    assert_eq!(anchor.ren, 1);
    assert!(!anchor.assoc_prev, "fell back to the adjacent text run");

    // The same position associating forward resolves directly.
    let anchor = source.select_at(1, false).unwrap().expect("has target");
    assert!(!anchor.assoc_prev);
}

#[test]
fn select_with_no_text_target_is_none() {
    let mut source = TextSource::new(vec![ClientRun::Embedded(embedded_box())]);
    assert_eq!(source.select_at(0, false).unwrap(), None);
    assert_eq!(source.select_at(1, true).unwrap(), None);
}

#[test]
fn run_edit_helpers_adjust_spans() {
    let mut styles = StyleCache::new(Arc::new(EmptyStylesheet));
    let bold = styles.with_font_weight(Style::DEFAULT, crate::style::FontWeight::BOLD);
    let run = TextClientRun::styled(
        "abcdef",
        vec![
            Span {
                len: 3,
                style: Style::DEFAULT,
            },
            Span { len: 3, style: bold },
        ],
    );

    let deleted = run.with_deleted(2..4);
    assert_eq!(deleted.text(), "abef");
    assert_eq!(deleted.spans().len(), 2);
    assert_eq!(deleted.spans()[0].len, 2);
    assert_eq!(deleted.spans()[1].len, 2);

    let inserted = run.with_inserted(3, "XY");
    assert_eq!(inserted.text(), "abcXYdef");
    assert_eq!(inserted.spans()[0].len, 5, "insert extends the span ending here");
    assert_eq!(inserted.spans()[1].len, 3);
}

#[test]
fn replacing_an_embedded_run_with_text() {
    let mut source = source_with_orc();
    source.ren_len();
    let change = source
        .client_run_changed(1, ClientRun::Text(TextClientRun::new("Q", Style::DEFAULT)))
        .unwrap();
    // The box's one rendered character became "Q" at the same offset.
    assert_eq!(change.start, 7);
    assert_eq!(change.deleted, 1);
    assert_eq!(change.inserted, 1);
    assert_eq!(source.rendered_text(), "abXYZcdQef");
}
