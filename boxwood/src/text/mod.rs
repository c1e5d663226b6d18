// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logical-to-rendered text mapping.
//!
//! The document model supplies [`ClientRun`]s: either logical text with
//! uniform styling spans, or a structural placeholder standing in for an
//! embedded box. A [`TextSource`] expands those runs into rendered text —
//! object-replacement sentinels are interpreted into nested runs, empty runs
//! may show substitute text — and maintains [`MapRun`]s relating logical to
//! rendered character offsets in both directions. All offsets in this module
//! are in characters, not bytes.

mod map;
mod source;

pub use map::{MapRun, MapRunKind, RenderRun, ResolvedAnchor, TextChange};
pub use source::{OrcInterpreter, TextSource};

use crate::style::Style;
use crate::tree::BoxId;

/// The reserved placeholder sentinel standing in for an embedded inline
/// object (the Unicode object replacement character).
pub const OBJ_REPLACEMENT: char = '\u{FFFC}';

/// A uniformly styled span within a [`TextClientRun`], measured in
/// characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// Length of the span in characters.
    pub len: usize,
    /// Style of every character in the span.
    pub style: Style,
}

/// Fixed text shown in place of an empty client run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitute {
    /// The text to render.
    pub text: String,
    /// Style for the substitute text.
    pub style: Style,
}

/// Logical text from the document model: a string plus uniform styling
/// spans covering it exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextClientRun {
    text: String,
    spans: Vec<Span>,
    substitute: Option<Substitute>,
}

impl TextClientRun {
    /// A run with a single uniform span.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        let text = text.into();
        let len = char_len(&text);
        Self {
            text,
            spans: vec![Span { len, style }],
            substitute: None,
        }
    }

    /// A run with explicit spans.
    ///
    /// The span lengths must cover the text exactly.
    pub fn styled(text: impl Into<String>, spans: Vec<Span>) -> Self {
        let text = text.into();
        let total: usize = spans.iter().map(|s| s.len).sum();
        assert_eq!(
            total,
            char_len(&text),
            "spans must cover the run text exactly"
        );
        Self {
            text,
            spans,
            substitute: None,
        }
    }

    /// Attaches substitute text shown while the run is empty.
    #[must_use]
    pub fn with_substitute(mut self, text: impl Into<String>, style: Style) -> Self {
        self.substitute = Some(Substitute {
            text: text.into(),
            style,
        });
        self
    }

    /// The logical text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The uniform spans.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The substitute, if one is attached.
    pub fn substitute(&self) -> Option<&Substitute> {
        self.substitute.as_ref()
    }

    /// Length of the logical text in characters.
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// The style in force at a character offset.
    ///
    /// The end-of-run boundary reports the final span's style.
    pub fn style_at(&self, offset: usize) -> Style {
        let mut start = 0;
        for span in &self.spans {
            if offset < start + span.len {
                return span.style;
            }
            start += span.len;
        }
        self.spans.last().map(|s| s.style).unwrap_or(Style::DEFAULT)
    }

    /// A copy of this run with a character range deleted.
    ///
    /// Spans shrink by their overlap with the range; spans reduced to
    /// nothing disappear (at least one span always remains).
    #[must_use]
    pub fn with_deleted(&self, range: core::ops::Range<usize>) -> Self {
        let text: String = self
            .text
            .chars()
            .enumerate()
            .filter(|(i, _)| !range.contains(i))
            .map(|(_, c)| c)
            .collect();
        let mut spans = Vec::new();
        let mut start = 0;
        for span in &self.spans {
            let end = start + span.len;
            let overlap = range.end.min(end).saturating_sub(range.start.max(start));
            let len = span.len - overlap;
            if len > 0 {
                spans.push(Span {
                    len,
                    style: span.style,
                });
            }
            start = end;
        }
        if spans.is_empty() {
            spans.push(Span {
                len: 0,
                style: self.style_at(range.start),
            });
        }
        Self {
            text,
            spans,
            substitute: self.substitute.clone(),
        }
    }

    /// A copy of this run with text inserted at a character offset.
    ///
    /// The inserted characters take the formatting of the span ending at the
    /// offset, or the following span at the start of the run.
    #[must_use]
    pub fn with_inserted(&self, at: usize, insert: &str) -> Self {
        let byte = byte_of_char(&self.text, at);
        let mut text = self.text.clone();
        text.insert_str(byte, insert);
        let added = char_len(insert);
        let mut spans = self.spans.clone();
        let mut start = 0;
        let mut grown = false;
        for span in &mut spans {
            let end = start + span.len;
            // The span ending exactly at the offset absorbs the insertion.
            if at <= end && (at > start || start == 0) {
                span.len += added;
                grown = true;
                break;
            }
            start = end;
        }
        if !grown {
            if let Some(last) = spans.last_mut() {
                last.len += added;
            }
        }
        Self {
            text,
            spans,
            substitute: self.substitute.clone(),
        }
    }
}

/// One content unit from the document model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientRun {
    /// Logical text.
    Text(TextClientRun),
    /// A structural placeholder for an embedded box, occupying one logical
    /// and one rendered position.
    Embedded(BoxId),
}

/// Character count of a string.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `chars`; `s.len()` at or past the end.
pub(crate) fn byte_of_char(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Slice of `s` between character offsets.
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let b0 = byte_of_char(s, start);
    let b1 = byte_of_char(s, end);
    &s[b0..b1]
}
