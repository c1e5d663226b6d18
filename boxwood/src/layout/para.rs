// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph layout: rendered text broken into lines.
//!
//! A paragraph owns a [`TextSource`] and breaks its rendered text greedily
//! into line segments using the per-writing-system renderer. Embedded
//! (structural) boxes are real children of the paragraph; line breaking
//! reserves their measured widths and sits them on the baseline.

use core::ops::Range;

use hashbrown::HashMap;

use super::{layout_box, LayoutInfo};
use crate::coords::{Point, Rect};
use crate::error::Error;
use crate::host::{PropTag, RendererFactory};
use crate::style::{Style, StyleCache, WsId};
use crate::text::{MapRunKind, TextSource};
use crate::tree::{BoxId, BoxKind, BoxTree};

/// How a line segment produces its pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegKind {
    /// A slice of rendered text.
    Text,
    /// An embedded box occupying its measured width.
    Boxed(BoxId),
}

/// One horizontal piece of a laid-out line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seg {
    /// First rendered offset covered.
    pub ren_start: usize,
    /// Number of rendered characters covered.
    pub ren_len: usize,
    /// Left edge relative to the paragraph box origin.
    pub left: i32,
    /// Width in device pixels.
    pub width: i32,
    /// Style of the segment.
    pub style: Style,
    /// Segment kind.
    pub kind: SegKind,
}

impl Seg {
    /// Past-the-end rendered offset.
    pub fn ren_end(&self) -> usize {
        self.ren_start + self.ren_len
    }
}

/// One laid-out line of a paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParaLine {
    /// Top edge relative to the paragraph box origin.
    pub top: i32,
    /// Line height in device pixels.
    pub height: i32,
    /// Baseline distance from the line top.
    pub ascent: i32,
    /// Segments, left to right.
    pub segs: Vec<Seg>,
}

impl ParaLine {
    /// Past-the-end rendered offset of the line, if it has segments.
    pub fn ren_end(&self) -> Option<usize> {
        self.segs.last().map(Seg::ren_end)
    }
}

/// Payload of a paragraph box.
#[derive(Debug)]
pub struct ParaBox {
    /// The logical-to-rendered text mapping backing this paragraph.
    pub source: TextSource,
    /// Identity of the document property this paragraph displays, when the
    /// domain layer provides one.
    pub tag: Option<PropTag>,
    lines: Vec<ParaLine>,
}

impl ParaBox {
    /// Creates a paragraph over a text source.
    pub fn new(source: TextSource) -> Self {
        Self {
            source,
            tag: None,
            lines: Vec::new(),
        }
    }

    /// Attaches the domain property identity.
    #[must_use]
    pub fn with_tag(mut self, tag: PropTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// The laid-out lines.
    pub fn lines(&self) -> &[ParaLine] {
        &self.lines
    }

    /// The rendered text of a segment.
    pub fn seg_text(&mut self, seg: &Seg) -> String {
        self.source
            .rendered_slice(seg.ren_start, seg.ren_start + seg.ren_len)
            .to_owned()
    }

    /// Caret rectangle for a rendered offset, relative to the paragraph box
    /// origin.
    ///
    /// Returns `None` if the paragraph has not been laid out or the offset
    /// lies outside every line.
    pub fn caret_rect(
        &mut self,
        ren: usize,
        assoc_prev: bool,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
    ) -> Option<Rect> {
        let (line_idx, seg_idx) = self.find_seg(ren, assoc_prev)?;
        let line = self.lines[line_idx].clone();
        let seg = line.segs[seg_idx].clone();
        let x = match seg.kind {
            SegKind::Boxed(_) => {
                if ren <= seg.ren_start {
                    seg.left
                } else {
                    seg.left + seg.width
                }
            }
            SegKind::Text => {
                let prefix = self
                    .source
                    .rendered_slice(seg.ren_start, ren.min(seg.ren_end()))
                    .to_owned();
                let bundle = styles.get(seg.style);
                let renderer = renderers.renderer(ws_of(styles, seg.style)).ok()?;
                seg.left + renderer.measure(bundle, &prefix)
            }
        };
        Some(Rect::new(x, line.top, x + 1, line.top + line.height))
    }

    /// Maps a point relative to the paragraph box origin to a rendered
    /// offset and an associate-previous flag.
    ///
    /// The nearest line is used when the point lies above or below all text;
    /// within a line a segment containing the point wins, else the nearest
    /// segment by horizontal distance.
    pub fn hit_test(
        &mut self,
        p: Point,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
    ) -> Option<(usize, bool)> {
        if self.lines.is_empty() {
            return None;
        }
        let line_idx = self
            .lines
            .iter()
            .position(|line| p.y < line.top + line.height)
            .unwrap_or(self.lines.len() - 1);
        let line = self.lines[line_idx].clone();
        if line.segs.is_empty() {
            return Some((self.source.ren_len(), false));
        }
        let seg_idx = line
            .segs
            .iter()
            .position(|seg| p.x >= seg.left && p.x < seg.left + seg.width)
            .unwrap_or_else(|| nearest_seg(&line.segs, p.x));
        let seg = line.segs[seg_idx].clone();
        match seg.kind {
            SegKind::Boxed(_) => {
                if p.x < seg.left + seg.width / 2 {
                    Some((seg.ren_start, false))
                } else {
                    Some((seg.ren_end(), true))
                }
            }
            SegKind::Text => {
                let text = self.seg_text(&seg);
                let bundle = styles.get(seg.style);
                let renderer = renderers.renderer(ws_of(styles, seg.style)).ok()?;
                let rel = (p.x - seg.left).max(0);
                let fit = renderer.char_index(bundle, &text, rel);
                let chars = fit.chars.min(seg.ren_len);
                Some((seg.ren_start + chars, chars > 0))
            }
        }
    }

    /// Visits one rectangle per line for the rendered range, relative to the
    /// paragraph box origin.
    pub fn selection_rects(
        &mut self,
        range: Range<usize>,
        styles: &StyleCache,
        renderers: &dyn RendererFactory,
        mut f: impl FnMut(Rect),
    ) {
        if range.is_empty() {
            return;
        }
        let lines = self.lines.clone();
        for line in &lines {
            let mut left = i32::MAX;
            let mut right = i32::MIN;
            for seg in &line.segs {
                let lo = range.start.max(seg.ren_start);
                let hi = range.end.min(seg.ren_end());
                if lo >= hi {
                    continue;
                }
                let (x0, x1) = match seg.kind {
                    SegKind::Boxed(_) => (seg.left, seg.left + seg.width),
                    SegKind::Text => {
                        let Ok(renderer) = renderers.renderer(ws_of(styles, seg.style)) else {
                            continue;
                        };
                        let bundle = styles.get(seg.style);
                        let prefix = self.source.rendered_slice(seg.ren_start, lo).to_owned();
                        let body = self.source.rendered_slice(lo, hi).to_owned();
                        let x0 = seg.left + renderer.measure(bundle, &prefix);
                        (x0, x0 + renderer.measure(bundle, &body))
                    }
                };
                left = left.min(x0);
                right = right.max(x1);
            }
            if left < right {
                f(Rect::new(left, line.top, right, line.top + line.height));
            }
        }
    }

    fn find_seg(&self, ren: usize, assoc_prev: bool) -> Option<(usize, usize)> {
        let mut fallback = None;
        for (li, line) in self.lines.iter().enumerate() {
            for (si, seg) in line.segs.iter().enumerate() {
                let contains = if assoc_prev {
                    ren > seg.ren_start && ren <= seg.ren_end()
                } else {
                    ren >= seg.ren_start && ren < seg.ren_end()
                };
                if contains {
                    return Some((li, si));
                }
                if ren >= seg.ren_start && ren <= seg.ren_end() {
                    fallback = Some((li, si));
                }
            }
        }
        fallback
    }
}

fn ws_of(styles: &StyleCache, style: Style) -> WsId {
    styles.get(style).ws.unwrap_or(WsId(0))
}

fn nearest_seg(segs: &[Seg], x: i32) -> usize {
    let mut best = 0;
    let mut best_dist = i32::MAX;
    for (i, seg) in segs.iter().enumerate() {
        let dist = if x < seg.left {
            seg.left - x
        } else {
            x - (seg.left + seg.width)
        };
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

struct SegMetrics {
    seg: Seg,
    ascent: i32,
    descent: i32,
    explicit_height: Option<i32>,
}

/// Lays out a paragraph box.
pub(crate) fn layout_para(
    tree: &mut BoxTree,
    id: BoxId,
    info: &LayoutInfo<'_>,
) -> Result<(), Error> {
    let para_style = tree[id].style;
    let surround = info.styles.get(para_style).surround_px(&info.transform);
    let content_width = (info.avail_width - surround.horizontal()).max(0);

    // Embedded boxes are measured first; line breaking needs their widths.
    let children: Vec<BoxId> = tree.children(id).collect();
    for &child in &children {
        layout_box(tree, child, &info.with_avail_width(content_width))?;
    }
    let mut child_sizes = HashMap::new();
    for &child in &children {
        child_sizes.insert(child, (tree[child].width, tree[child].height));
    }

    let mut para = take_para(tree, id);
    let result = para.break_lines(info, para_style, content_width, surround.left, surround.top, &child_sizes);
    tree[id].kind = BoxKind::Para(para);
    let (content_height, positions) = result?;

    for (child, pos) in positions {
        let node = &mut tree[child];
        node.left = pos.x;
        node.top = pos.y;
    }
    let node = &mut tree[id];
    node.width = info.avail_width;
    node.height = content_height + surround.bottom;
    Ok(())
}

fn take_para(tree: &mut BoxTree, id: BoxId) -> ParaBox {
    match core::mem::replace(&mut tree[id].kind, BoxKind::Pile) {
        BoxKind::Para(para) => para,
        _ => panic!("box {id:?} is not a paragraph"),
    }
}

impl ParaBox {
    /// Breaks rendered text into lines; returns the content height (top
    /// surround included) and the baseline positions of embedded boxes.
    #[allow(clippy::too_many_arguments)]
    fn break_lines(
        &mut self,
        info: &LayoutInfo<'_>,
        para_style: Style,
        content_width: i32,
        left_origin: i32,
        top_origin: i32,
        child_sizes: &HashMap<BoxId, (i32, i32)>,
    ) -> Result<(i32, Vec<(BoxId, Point)>), Error> {
        // One renderer lookup per merged writing-system group; this also
        // surfaces a missing renderer before any line is half-built.
        for rr in self.source.render_runs(info.styles) {
            if let Some(ws) = rr.ws {
                info.renderers.renderer(ws)?;
            }
        }

        let maps = self.source.map_runs().to_vec();
        self.lines.clear();
        let mut positions = Vec::new();
        let mut cur: Vec<SegMetrics> = Vec::new();
        let mut x = 0;
        let mut y = top_origin;

        let mut flush = |cur: &mut Vec<SegMetrics>,
                         lines: &mut Vec<ParaLine>,
                         positions: &mut Vec<(BoxId, Point)>,
                         y: &mut i32| {
            let mut ascent = 0;
            let mut descent = 0;
            let mut explicit: Option<i32> = None;
            for m in cur.iter() {
                ascent = ascent.max(m.ascent);
                descent = descent.max(m.descent);
                if let Some(h) = m.explicit_height {
                    explicit = Some(explicit.unwrap_or(0).max(h));
                }
            }
            let height = explicit.unwrap_or(ascent + descent).max(1);
            for m in cur.iter() {
                if let SegKind::Boxed(id) = m.seg.kind {
                    positions.push((id, Point::new(m.seg.left, *y + ascent - m.ascent)));
                }
            }
            lines.push(ParaLine {
                top: *y,
                height,
                ascent,
                segs: cur.drain(..).map(|m| m.seg).collect(),
            });
            *y += height;
        };

        for m in &maps {
            match m.kind {
                MapRunKind::Boxed(child) => {
                    let (w, h) = child_sizes.get(&child).copied().unwrap_or((0, 0));
                    if x > 0 && x + w > content_width {
                        flush(&mut cur, &mut self.lines, &mut positions, &mut y);
                        x = 0;
                    }
                    cur.push(SegMetrics {
                        seg: Seg {
                            ren_start: m.ren_start,
                            ren_len: m.ren_len,
                            left: left_origin + x,
                            width: w,
                            style: m.style,
                            kind: SegKind::Boxed(child),
                        },
                        ascent: h,
                        descent: 0,
                        explicit_height: None,
                    });
                    x += w;
                }
                MapRunKind::Text | MapRunKind::Orc | MapRunKind::Substitute => {
                    let bundle = info.styles.get(m.style).clone();
                    let renderer = info.renderers.renderer(ws_of(info.styles, m.style))?;
                    let (asc, desc) = renderer.ascent_descent(&bundle);
                    let offset = info.transform.to_px_y(bundle.baseline_offset);
                    let ascent = asc + offset.max(0);
                    let descent = desc + (-offset).max(0);
                    let explicit_height = bundle.line_height.map(|mp| info.transform.to_px_y(mp));

                    if m.ren_len == 0 {
                        cur.push(SegMetrics {
                            seg: Seg {
                                ren_start: m.ren_start,
                                ren_len: 0,
                                left: left_origin + x,
                                width: 0,
                                style: m.style,
                                kind: SegKind::Text,
                            },
                            ascent,
                            descent,
                            explicit_height,
                        });
                        continue;
                    }

                    let mut consumed = 0;
                    while consumed < m.ren_len {
                        let rest = self
                            .source
                            .rendered_slice(m.ren_start + consumed, m.ren_end())
                            .to_owned();
                        let avail = content_width - x;
                        let mut fit = renderer.fit(&bundle, &rest, avail, x == 0);
                        if fit.chars == 0 {
                            if x == 0 {
                                // The renderer refused to place anything on an
                                // empty line; force one character through so
                                // layout always terminates.
                                let first = crate::text::char_slice(&rest, 0, 1).to_owned();
                                fit.chars = 1;
                                fit.px = renderer.measure(&bundle, &first);
                            } else {
                                flush(&mut cur, &mut self.lines, &mut positions, &mut y);
                                x = 0;
                                continue;
                            }
                        }
                        cur.push(SegMetrics {
                            seg: Seg {
                                ren_start: m.ren_start + consumed,
                                ren_len: fit.chars,
                                left: left_origin + x,
                                width: fit.px,
                                style: m.style,
                                kind: SegKind::Text,
                            },
                            ascent,
                            descent,
                            explicit_height,
                        });
                        x += fit.px;
                        consumed += fit.chars;
                        if consumed < m.ren_len {
                            flush(&mut cur, &mut self.lines, &mut positions, &mut y);
                            x = 0;
                        }
                    }
                }
            }
        }
        if !cur.is_empty() || self.lines.is_empty() {
            if cur.is_empty() {
                // An empty paragraph still shows one line of caret room.
                let bundle = info.styles.get(para_style);
                let renderer = info.renderers.renderer(ws_of(info.styles, para_style))?;
                let (asc, desc) = renderer.ascent_descent(bundle);
                cur.push(SegMetrics {
                    seg: Seg {
                        ren_start: 0,
                        ren_len: 0,
                        left: left_origin,
                        width: 0,
                        style: para_style,
                        kind: SegKind::Text,
                    },
                    ascent: asc,
                    descent: desc,
                    explicit_height: None,
                });
            }
            flush(&mut cur, &mut self.lines, &mut positions, &mut y);
        }

        // A right-to-left paragraph direction mirrors every line; segment
        // offsets (and with them carets, hit tests and selection geometry)
        // count from the right edge instead.
        if info.renderers.is_rtl(ws_of(info.styles, para_style)) {
            for line in &mut self.lines {
                for seg in &mut line.segs {
                    seg.left = left_origin + content_width - (seg.left - left_origin) - seg.width;
                }
            }
            // Embedded boxes follow their (now mirrored) segments.
            for (child, pos) in &mut positions {
                for line in &self.lines {
                    if let Some(seg) = line
                        .segs
                        .iter()
                        .find(|seg| seg.kind == SegKind::Boxed(*child))
                    {
                        pos.x = seg.left;
                    }
                }
            }
        }
        Ok((y, positions))
    }
}
