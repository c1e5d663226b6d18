// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop: ordering decisions and text-level application.
//!
//! The ordering rule is a pure function so hosts (and tests) can reason
//! about it directly: when source and destination live in the same property
//! and the destination precedes the source, the insert happens before the
//! delete so the deletion's offsets stay valid; otherwise delete comes
//! first.

use core::ops::Range;

use super::{para_mut, Modifiers};
use crate::error::Error;
use crate::host::PropTag;
use crate::text::{char_len, ClientRun, MapRunKind, TextChange, TextSource};
use crate::tree::{BoxId, BoxTree};

/// Where a drag started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragSource {
    /// Paragraph the dragged text came from.
    pub para: BoxId,
    /// Domain property identity of that paragraph, when known.
    pub tag: Option<PropTag>,
    /// Dragged rendered range.
    pub range: Range<usize>,
}

/// Where a drop landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropTarget {
    /// Paragraph receiving the drop.
    pub para: BoxId,
    /// Domain property identity of that paragraph, when known.
    pub tag: Option<PropTag>,
    /// Rendered offset of the drop position.
    pub ren: usize,
}

/// Ordering decision for a move-drop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DropPlan {
    /// True to insert at the destination before deleting the source.
    pub insert_first: bool,
}

/// Decides the insert/delete order for a drop.
pub fn drop_plan(src: &DragSource, dst: &DropTarget) -> DropPlan {
    let same_property = match (src.tag, dst.tag) {
        (Some(a), Some(b)) => a == b,
        _ => src.para == dst.para,
    };
    DropPlan {
        insert_first: same_property && dst.ren <= src.range.start,
    }
}

/// Whether a drop moves or copies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropEffect {
    /// Remove the source after inserting (same-session internal move).
    Move,
    /// Leave the source in place (external copy).
    Copy,
}

/// Distinguishes an internal move from a copy by modifier-key state.
pub fn drop_effect(mods: Modifiers) -> DropEffect {
    if mods.control {
        DropEffect::Copy
    } else {
        DropEffect::Move
    }
}

/// One text-level operation produced by a drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropAction {
    /// Delete a rendered range from a paragraph.
    Delete {
        /// The paragraph to edit.
        para: BoxId,
        /// Rendered range to remove.
        range: Range<usize>,
    },
    /// Insert text at a rendered offset.
    Insert {
        /// The paragraph to edit.
        para: BoxId,
        /// Rendered offset to insert at.
        ren: usize,
        /// The text to insert.
        text: String,
    },
}

/// The ordered operations implementing a drop, with offsets pre-adjusted for
/// whichever operation runs first.
pub fn drop_actions(
    src: &DragSource,
    dst: &DropTarget,
    text: String,
    effect: DropEffect,
) -> Vec<DropAction> {
    let len = char_len(&text);
    match effect {
        DropEffect::Copy => vec![DropAction::Insert {
            para: dst.para,
            ren: dst.ren,
            text,
        }],
        DropEffect::Move => {
            let plan = drop_plan(src, dst);
            if plan.insert_first {
                let same_para = src.para == dst.para;
                let shift = if same_para { len } else { 0 };
                vec![
                    DropAction::Insert {
                        para: dst.para,
                        ren: dst.ren,
                        text,
                    },
                    DropAction::Delete {
                        para: src.para,
                        range: src.range.start + shift..src.range.end + shift,
                    },
                ]
            } else {
                let removed = src.range.end - src.range.start;
                let ren = if dst.para == src.para && dst.ren >= src.range.end {
                    dst.ren - removed
                } else {
                    dst.ren
                };
                vec![
                    DropAction::Delete {
                        para: src.para,
                        range: src.range.clone(),
                    },
                    DropAction::Insert {
                        para: dst.para,
                        ren,
                        text,
                    },
                ]
            }
        }
    }
}

/// The dragged text: rendered characters, with embedded boxes contributing
/// their placeholder run.
pub fn drag_text(tree: &mut BoxTree, src: &DragSource) -> String {
    let (text, boxed) = {
        let Some(para) = para_mut(tree, src.para) else {
            return String::new();
        };
        let maps = para.source.map_runs().to_vec();
        let mut out = String::new();
        let mut boxed = Vec::new();
        for m in &maps {
            let lo = src.range.start.max(m.ren_start);
            let hi = src.range.end.min(m.ren_end());
            if lo >= hi {
                continue;
            }
            match m.kind {
                MapRunKind::Boxed(id) => {
                    boxed.push((out.chars().count(), id));
                    out.push(crate::text::OBJ_REPLACEMENT);
                }
                _ => {
                    let slice = para.source.rendered_slice(lo, hi).to_owned();
                    out.push_str(&slice);
                }
            }
        }
        (out, boxed)
    };
    // The placeholder character comes from the box's own run capability.
    let mut chars: Vec<char> = text.chars().collect();
    for (pos, id) in boxed {
        if let Some(run) = tree[id].kind.placeholder_run() {
            chars[pos] = run.text;
        }
    }
    chars.into_iter().collect()
}

/// Applies drop actions whose edits stay inside single client runs.
///
/// Edits that would cross a client-run or embedded-object boundary are the
/// domain layer's business and fault with [`Error::UnsupportedEdit`].
pub fn apply_drop(tree: &mut BoxTree, actions: &[DropAction]) -> Result<Vec<TextChange>, Error> {
    let mut changes = Vec::new();
    for action in actions {
        let change = match action {
            DropAction::Delete { para, range } => {
                let p = para_mut(tree, *para).ok_or(Error::UnsupportedEdit)?;
                delete_range(&mut p.source, range.clone())?
            }
            DropAction::Insert { para, ren, text } => {
                let p = para_mut(tree, *para).ok_or(Error::UnsupportedEdit)?;
                insert_text(&mut p.source, *ren, text)?
            }
        };
        changes.push(change);
    }
    Ok(changes)
}

fn delete_range(source: &mut TextSource, range: Range<usize>) -> Result<TextChange, Error> {
    if range.is_empty() {
        return Ok(TextChange::default());
    }
    let maps = source.map_runs().to_vec();
    let start_idx = maps
        .iter()
        .position(|m| m.ren_start <= range.start && range.start < m.ren_end())
        .ok_or(Error::UnsupportedEdit)?;
    let end_idx = maps
        .iter()
        .position(|m| m.ren_start < range.end && range.end <= m.ren_end())
        .ok_or(Error::UnsupportedEdit)?;
    let client = maps[start_idx].client;
    for m in &maps[start_idx..=end_idx] {
        if m.client != client || m.kind != MapRunKind::Text {
            return Err(Error::UnsupportedEdit);
        }
    }
    let off_start = maps[start_idx].offset + (range.start - maps[start_idx].ren_start);
    let off_end = maps[end_idx].offset + (range.end - maps[end_idx].ren_start);
    let new_run = match &source.runs()[client] {
        ClientRun::Text(t) => t.with_deleted(off_start..off_end),
        ClientRun::Embedded(_) => return Err(Error::UnsupportedEdit),
    };
    source.client_run_changed(client, ClientRun::Text(new_run))
}

fn insert_text(source: &mut TextSource, ren: usize, text: &str) -> Result<TextChange, Error> {
    let maps = source.map_runs().to_vec();
    // Prefer the run the position is inside; at a boundary, the run ending
    // here, then the one starting here.
    let idx = maps
        .iter()
        .position(|m| {
            m.kind == MapRunKind::Text && m.ren_start < ren && ren < m.ren_end()
        })
        .or_else(|| {
            maps.iter()
                .position(|m| m.kind == MapRunKind::Text && m.ren_end() == ren)
        })
        .or_else(|| {
            maps.iter()
                .position(|m| m.kind == MapRunKind::Text && m.ren_start == ren)
        })
        .ok_or(Error::UnsupportedEdit)?;
    let m = &maps[idx];
    let offset = m.offset + (ren - m.ren_start);
    let new_run = match &source.runs()[m.client] {
        ClientRun::Text(t) => t.with_inserted(offset, text),
        ClientRun::Embedded(_) => return Err(Error::UnsupportedEdit),
    };
    source.client_run_changed(m.client, ClientRun::Text(new_run))
}
