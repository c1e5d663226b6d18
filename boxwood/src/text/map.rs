// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Map runs: slices relating logical to rendered character offsets.

use super::source::OrcInterpreter;
use super::{char_len, char_slice, ClientRun, OBJ_REPLACEMENT};
use crate::style::{Style, WsId};
use crate::tree::BoxId;

/// Discriminates how a [`MapRun`]'s rendered text was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapRunKind {
    /// Plain text copied from the client run.
    Text,
    /// A structural placeholder: one logical and one rendered position
    /// standing in for an embedded box.
    Boxed(BoxId),
    /// Rendered text produced by expanding an object-replacement sentinel;
    /// the whole rendered span collapses onto one logical position.
    Orc,
    /// Fixed rendered text with no logical extent (substitute for an empty
    /// run).
    Substitute,
}

/// One slice relating a logical offset range to a rendered offset range.
///
/// Map runs partition both offset spaces of their [`TextSource`]
/// (zero-length runs occupy empty intervals at boundaries).
///
/// [`TextSource`]: super::TextSource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRun {
    /// First logical offset covered.
    pub log_start: usize,
    /// Number of logical characters covered.
    pub log_len: usize,
    /// First rendered offset covered.
    pub ren_start: usize,
    /// Number of rendered characters covered.
    pub ren_len: usize,
    /// Index of the owning client run.
    pub client: usize,
    /// Character offset of this slice within the owning client run.
    pub offset: usize,
    /// Style of the rendered characters.
    pub style: Style,
    /// How the rendered text was produced.
    pub kind: MapRunKind,
}

impl MapRun {
    /// Past-the-end logical offset.
    pub fn log_end(&self) -> usize {
        self.log_start + self.log_len
    }

    /// Past-the-end rendered offset.
    pub fn ren_end(&self) -> usize {
        self.ren_start + self.ren_len
    }

    /// True for runs that carry rendered text rather than a box.
    pub fn is_textual(&self) -> bool {
        !matches!(self.kind, MapRunKind::Boxed(_))
    }
}

/// A maximal run of consecutive textual map runs sharing a writing system.
///
/// Render runs exist purely to batch painting and measurement; they never
/// alter offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRun {
    /// First rendered offset covered.
    pub ren_start: usize,
    /// Number of rendered characters covered.
    pub ren_len: usize,
    /// Writing system shared by the merged runs.
    pub ws: Option<WsId>,
}

/// The minimal rendered-text edit produced by a client-run replacement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextChange {
    /// Rendered offset where old and new text first differ.
    pub start: usize,
    /// Characters deleted from the old rendered text.
    pub deleted: usize,
    /// Characters inserted from the new rendered text.
    pub inserted: usize,
}

impl TextChange {
    /// True if old and new rendered text were identical.
    pub fn is_empty(&self) -> bool {
        self.deleted == 0 && self.inserted == 0
    }
}

/// A logical or rendered position resolved to a concrete rendered anchor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAnchor {
    /// Rendered character offset.
    pub ren: usize,
    /// True if the position associates with the character before it.
    pub assoc_prev: bool,
}

/// Output of expanding one client run into map runs.
#[derive(Debug, Default)]
pub(crate) struct RunExpansion {
    pub(crate) maps: Vec<MapRun>,
    pub(crate) rendered: String,
    pub(crate) log_len: usize,
    pub(crate) ren_len: usize,
}

/// Expands one client run into map runs and rendered text.
///
/// A structural run emits one map run of logical length 1 and rendered
/// length 1. A text run is walked span by span; each object-replacement
/// sentinel closes the preceding text map run, is interpreted into a nested
/// run, and emits an [`MapRunKind::Orc`] run whose rendered length is the
/// nested run's first uniform length. An empty text run renders its
/// substitute, if any, else an empty placeholder map run.
pub(crate) fn expand_run(
    client: usize,
    run: &ClientRun,
    log_base: usize,
    ren_base: usize,
    interpreter: Option<&dyn OrcInterpreter>,
) -> RunExpansion {
    let mut out = RunExpansion::default();
    match run {
        ClientRun::Embedded(box_id) => {
            out.rendered.push(OBJ_REPLACEMENT);
            out.maps.push(MapRun {
                log_start: log_base,
                log_len: 1,
                ren_start: ren_base,
                ren_len: 1,
                client,
                offset: 0,
                style: Style::DEFAULT,
                kind: MapRunKind::Boxed(*box_id),
            });
            out.log_len = 1;
            out.ren_len = 1;
        }
        ClientRun::Text(text_run) => {
            if text_run.char_len() == 0 {
                if let Some(sub) = text_run.substitute() {
                    let ren_len = char_len(&sub.text);
                    out.rendered.push_str(&sub.text);
                    out.maps.push(MapRun {
                        log_start: log_base,
                        log_len: 0,
                        ren_start: ren_base,
                        ren_len,
                        client,
                        offset: 0,
                        style: sub.style,
                        kind: MapRunKind::Substitute,
                    });
                    out.ren_len = ren_len;
                } else {
                    let style = text_run.style_at(0);
                    out.maps.push(MapRun {
                        log_start: log_base,
                        log_len: 0,
                        ren_start: ren_base,
                        ren_len: 0,
                        client,
                        offset: 0,
                        style,
                        kind: MapRunKind::Text,
                    });
                }
                return out;
            }

            let text = text_run.text();
            let chars: Vec<char> = text.chars().collect();
            let mut run_offset = 0;
            let mut span_start = 0;
            for span in text_run.spans() {
                let span_end = span_start + span.len;
                let mut seg_start = run_offset;
                while run_offset < span_end {
                    if chars[run_offset] == OBJ_REPLACEMENT {
                        // Close the preceding text slice, even when empty;
                        // degenerate runs are swept after construction.
                        push_text_slice(
                            &mut out, client, text, seg_start, run_offset, span.style, log_base,
                            ren_base,
                        );
                        push_orc(&mut out, client, run_offset, interpreter, log_base, ren_base);
                        run_offset += 1;
                        seg_start = run_offset;
                    } else {
                        run_offset += 1;
                    }
                }
                push_text_slice(
                    &mut out, client, text, seg_start, run_offset, span.style, log_base, ren_base,
                );
                span_start = span_end;
            }
        }
    }
    out
}

fn push_text_slice(
    out: &mut RunExpansion,
    client: usize,
    text: &str,
    seg_start: usize,
    seg_end: usize,
    style: Style,
    log_base: usize,
    ren_base: usize,
) {
    let len = seg_end - seg_start;
    out.maps.push(MapRun {
        log_start: log_base + out.log_len,
        log_len: len,
        ren_start: ren_base + out.ren_len,
        ren_len: len,
        client,
        offset: seg_start,
        style,
        kind: MapRunKind::Text,
    });
    out.rendered.push_str(char_slice(text, seg_start, seg_end));
    out.log_len += len;
    out.ren_len += len;
}

fn push_orc(
    out: &mut RunExpansion,
    client: usize,
    run_offset: usize,
    interpreter: Option<&dyn OrcInterpreter>,
    log_base: usize,
    ren_base: usize,
) {
    let (orc_text, style) = match interpreter {
        Some(interp) => {
            let nested = interp.expand(client, run_offset);
            let first_len = nested.spans().first().map(|s| s.len).unwrap_or(0);
            let text = char_slice(nested.text(), 0, first_len).to_owned();
            let style = nested.style_at(0);
            (text, style)
        }
        // Without an interpreter the sentinel renders as itself.
        None => (OBJ_REPLACEMENT.to_string(), Style::DEFAULT),
    };
    let ren_len = char_len(&orc_text);
    out.maps.push(MapRun {
        log_start: log_base + out.log_len,
        log_len: 1,
        ren_start: ren_base + out.ren_len,
        ren_len,
        client,
        offset: run_offset,
        style,
        kind: MapRunKind::Orc,
    });
    out.rendered.push_str(&orc_text);
    out.log_len += 1;
    out.ren_len += ren_len;
}

/// Removes degenerate empty text map runs that sit next to non-empty textual
/// runs, so a format boundary never orphans characters.
///
/// An empty run with no non-empty textual neighbor survives; it is the only
/// valid caret target in an empty paragraph.
pub(crate) fn sweep_degenerate(maps: &mut Vec<MapRun>) {
    if maps.len() < 2 {
        return;
    }
    let keep: Vec<bool> = (0..maps.len())
        .map(|i| {
            let m = &maps[i];
            if m.kind != MapRunKind::Text || m.log_len != 0 || m.ren_len != 0 {
                return true;
            }
            let prev_nonempty = i
                .checked_sub(1)
                .map(|p| maps[p].is_textual() && maps[p].ren_len > 0)
                .unwrap_or(false);
            let next_nonempty = maps
                .get(i + 1)
                .map(|n| n.is_textual() && n.ren_len > 0)
                .unwrap_or(false);
            !(prev_nonempty || next_nonempty)
        })
        .collect();
    let mut it = keep.iter();
    maps.retain(|_| *it.next().unwrap_or(&true));
}

/// Index of the map run containing logical offset `log`.
///
/// Zero-length runs never contain an offset.
pub(crate) fn map_at_log(maps: &[MapRun], log: usize) -> Option<usize> {
    let idx = maps.partition_point(|m| m.log_end() <= log);
    let m = maps.get(idx)?;
    (m.log_start <= log && log < m.log_end()).then_some(idx)
}

/// Index of the map run containing rendered offset `ren`.
pub(crate) fn map_at_ren(maps: &[MapRun], ren: usize) -> Option<usize> {
    let idx = maps.partition_point(|m| m.ren_end() <= ren);
    let m = maps.get(idx)?;
    (m.ren_start <= ren && ren < m.ren_end()).then_some(idx)
}

/// Merges consecutive textual map runs sharing a writing system.
pub(crate) fn merge_render_runs(
    maps: &[MapRun],
    ws_of: impl Fn(Style) -> Option<WsId>,
) -> Vec<RenderRun> {
    let mut out: Vec<RenderRun> = Vec::new();
    for m in maps {
        if !m.is_textual() {
            continue;
        }
        let ws = ws_of(m.style);
        if let Some(last) = out.last_mut() {
            if last.ws == ws && last.ren_start + last.ren_len == m.ren_start {
                last.ren_len += m.ren_len;
                continue;
            }
        }
        out.push(RenderRun {
            ren_start: m.ren_start,
            ren_len: m.ren_len,
            ws,
        });
    }
    out
}

/// Computes the minimal edit between the old and new rendered text of a
/// replaced client run.
///
/// Characters are equal only if both the character and its formatting match;
/// the common prefix and suffix are trimmed and whatever remains is the
/// change. `ren_base` is the absolute rendered offset of the replaced span.
pub(crate) fn minimal_change(
    old_text: &str,
    old_styles: &[Style],
    new_text: &str,
    new_styles: &[Style],
    ren_base: usize,
) -> TextChange {
    let old: Vec<char> = old_text.chars().collect();
    let new: Vec<char> = new_text.chars().collect();
    debug_assert_eq!(old.len(), old_styles.len());
    debug_assert_eq!(new.len(), new_styles.len());

    let mut prefix = 0;
    while prefix < old.len()
        && prefix < new.len()
        && old[prefix] == new[prefix]
        && old_styles[prefix] == new_styles[prefix]
    {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && old[old.len() - 1 - suffix] == new[new.len() - 1 - suffix]
        && old_styles[old.len() - 1 - suffix] == new_styles[new.len() - 1 - suffix]
    {
        suffix += 1;
    }
    let deleted = old.len() - prefix - suffix;
    let inserted = new.len() - prefix - suffix;
    if deleted == 0 && inserted == 0 {
        // No differences: a zero-length change at the run's start.
        return TextChange {
            start: ren_base,
            deleted: 0,
            inserted: 0,
        };
    }
    TextChange {
        start: ren_base + prefix,
        deleted,
        inserted,
    }
}
