// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The text source: client runs expanded into rendered text plus map runs.

use std::sync::Arc;

use tracing::trace;

use super::map::{
    expand_run, map_at_log, map_at_ren, merge_render_runs, minimal_change, sweep_degenerate,
    MapRun, MapRunKind, RenderRun, ResolvedAnchor, TextChange,
};
use super::{byte_of_char, char_slice, ClientRun, TextClientRun};
use crate::error::Error;
use crate::style::{Style, StyleCache};
use crate::tree::BoxId;

/// Interpreter for object-replacement sentinels.
///
/// When map-run construction meets a sentinel in client run `run` at
/// character `offset`, the interpreter supplies the nested client run whose
/// first uniform slice becomes the sentinel's rendered text.
pub trait OrcInterpreter {
    /// Produces the nested run for one sentinel occurrence.
    fn expand(&self, run: usize, offset: usize) -> TextClientRun;
}

/// Logical client runs plus the derived rendered text and map runs.
///
/// Map runs are rebuilt wholesale on first use and patched incrementally by
/// [`TextSource::client_run_changed`].
pub struct TextSource {
    runs: Vec<ClientRun>,
    interpreter: Option<Arc<dyn OrcInterpreter>>,
    maps: Vec<MapRun>,
    rendered: String,
    log_len: usize,
    ren_len: usize,
    built: bool,
}

impl core::fmt::Debug for TextSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextSource")
            .field("runs", &self.runs.len())
            .field("maps", &self.maps.len())
            .field("log_len", &self.log_len)
            .field("ren_len", &self.ren_len)
            .finish_non_exhaustive()
    }
}

impl TextSource {
    /// Creates a source over the given client runs.
    pub fn new(runs: Vec<ClientRun>) -> Self {
        Self {
            runs,
            interpreter: None,
            maps: Vec::new(),
            rendered: String::new(),
            log_len: 0,
            ren_len: 0,
            built: false,
        }
    }

    /// Attaches the sentinel interpreter.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: Arc<dyn OrcInterpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    /// The client runs.
    pub fn runs(&self) -> &[ClientRun] {
        &self.runs
    }

    /// Total logical length in characters.
    pub fn log_len(&mut self) -> usize {
        self.ensure_maps();
        self.log_len
    }

    /// Total rendered length in characters.
    pub fn ren_len(&mut self) -> usize {
        self.ensure_maps();
        self.ren_len
    }

    /// The map runs, building them on first use.
    pub fn map_runs(&mut self) -> &[MapRun] {
        self.ensure_maps();
        &self.maps
    }

    /// The rendered text, building it on first use.
    pub fn rendered_text(&mut self) -> &str {
        self.ensure_maps();
        &self.rendered
    }

    /// A slice of the rendered text between character offsets.
    pub fn rendered_slice(&mut self, start: usize, end: usize) -> &str {
        self.ensure_maps();
        char_slice(&self.rendered, start, end)
    }

    /// The style in force at a rendered offset; the final textual run's style
    /// at the end boundary.
    pub fn style_at_ren(&mut self, ren: usize) -> Style {
        self.ensure_maps();
        if let Some(idx) = map_at_ren(&self.maps, ren) {
            return self.maps[idx].style;
        }
        self.maps
            .iter()
            .rev()
            .find(|m| m.is_textual())
            .map(|m| m.style)
            .unwrap_or(Style::DEFAULT)
    }

    /// Rendered positions of the embedded (structural) boxes, in order.
    pub fn boxed_runs(&mut self) -> Vec<(usize, BoxId)> {
        self.ensure_maps();
        self.maps
            .iter()
            .filter_map(|m| match m.kind {
                MapRunKind::Boxed(id) => Some((m.ren_start, id)),
                _ => None,
            })
            .collect()
    }

    /// Maps a logical offset to its rendered offset.
    ///
    /// The end-of-text boundary is valid; anything past it is an error. A
    /// position inside an expanded placeholder cannot be named logically, so
    /// the result is always the placeholder's rendered start.
    pub fn log_to_ren(&mut self, log: usize) -> Result<usize, Error> {
        self.ensure_maps();
        if log > self.log_len {
            return Err(Error::OffsetOutOfRange {
                offset: log,
                len: self.log_len,
            });
        }
        if log == self.log_len {
            return Ok(self.ren_len);
        }
        let idx = map_at_log(&self.maps, log)
            .expect("map runs partition the logical space");
        let m = &self.maps[idx];
        Ok(match m.kind {
            MapRunKind::Text => m.ren_start + (log - m.log_start),
            _ => m.ren_start,
        })
    }

    /// Maps a rendered offset to its logical offset.
    ///
    /// Every rendered position inside an expanded placeholder collapses onto
    /// the placeholder's single logical position.
    pub fn ren_to_log(&mut self, ren: usize) -> Result<usize, Error> {
        self.ensure_maps();
        if ren > self.ren_len {
            return Err(Error::OffsetOutOfRange {
                offset: ren,
                len: self.ren_len,
            });
        }
        if ren == self.ren_len {
            return Ok(self.log_len);
        }
        let idx = map_at_ren(&self.maps, ren)
            .expect("map runs partition the rendered space");
        let m = &self.maps[idx];
        Ok(match m.kind {
            MapRunKind::Text => m.log_start + (ren - m.ren_start),
            _ => m.log_start,
        })
    }

    /// Paint-level groups: consecutive textual map runs sharing a writing
    /// system, merged. Offsets are unchanged.
    pub fn render_runs(&mut self, styles: &StyleCache) -> Vec<RenderRun> {
        self.ensure_maps();
        merge_render_runs(&self.maps, |style| styles.get(style).ws)
    }

    /// Replaces client run `index` and patches the mapping incrementally.
    ///
    /// Only the map runs derived from the replaced client run are rebuilt;
    /// all others are shifted by the length delta. The returned change is the
    /// minimal rendered edit: common prefix and suffix characters (including
    /// formatting) within the replaced run's span are trimmed away.
    pub fn client_run_changed(
        &mut self,
        index: usize,
        new_run: ClientRun,
    ) -> Result<TextChange, Error> {
        self.ensure_maps();
        if index >= self.runs.len() {
            return Err(Error::RunIndexOutOfRange {
                index,
                count: self.runs.len(),
            });
        }

        // Locate the replaced run's contiguous map segment, or the splice
        // position if its maps were swept away entirely.
        let first = self.maps.iter().position(|m| m.client == index);
        let (splice_start, splice_end, old_log_start, old_ren_start, old_log_len, old_ren_len) =
            match first {
                Some(f) => {
                    let l = self
                        .maps
                        .iter()
                        .rposition(|m| m.client == index)
                        .expect("rposition must succeed when position did");
                    let log_start = self.maps[f].log_start;
                    let ren_start = self.maps[f].ren_start;
                    (
                        f,
                        l + 1,
                        log_start,
                        ren_start,
                        self.maps[l].log_end() - log_start,
                        self.maps[l].ren_end() - ren_start,
                    )
                }
                None => {
                    let pos = self
                        .maps
                        .iter()
                        .position(|m| m.client > index)
                        .unwrap_or(self.maps.len());
                    let (log_start, ren_start) = self
                        .maps
                        .get(pos)
                        .map(|m| (m.log_start, m.ren_start))
                        .unwrap_or((self.log_len, self.ren_len));
                    (pos, pos, log_start, ren_start, 0, 0)
                }
            };

        let old_text =
            char_slice(&self.rendered, old_ren_start, old_ren_start + old_ren_len).to_owned();
        let old_styles = styles_per_char(&self.maps[splice_start..splice_end]);

        self.runs[index] = new_run;
        let expansion = expand_run(
            index,
            &self.runs[index],
            old_log_start,
            old_ren_start,
            self.interpreter.as_deref(),
        );
        let new_styles = styles_per_char(&expansion.maps);
        let new_text = expansion.rendered.clone();
        let log_delta = expansion.log_len as isize - old_log_len as isize;
        let ren_delta = expansion.ren_len as isize - old_ren_len as isize;

        let byte_start = byte_of_char(&self.rendered, old_ren_start);
        let byte_end = byte_of_char(&self.rendered, old_ren_start + old_ren_len);
        self.rendered
            .replace_range(byte_start..byte_end, &expansion.rendered);

        let inserted_maps = expansion.maps.len();
        self.maps.splice(splice_start..splice_end, expansion.maps);
        for m in &mut self.maps[splice_start + inserted_maps..] {
            m.log_start = (m.log_start as isize + log_delta) as usize;
            m.ren_start = (m.ren_start as isize + ren_delta) as usize;
        }
        self.log_len = (self.log_len as isize + log_delta) as usize;
        self.ren_len = (self.ren_len as isize + ren_delta) as usize;
        sweep_degenerate(&mut self.maps);

        let change = minimal_change(&old_text, &old_styles, &new_text, &new_styles, old_ren_start);
        trace!(
            run = index,
            start = change.start,
            deleted = change.deleted,
            inserted = change.inserted,
            "client run changed"
        );
        Ok(change)
    }

    /// Resolves a logical position to a rendered anchor.
    ///
    /// `assoc_prev` associates the position with the character before it. A
    /// position landing against a structural box falls back to the adjacent
    /// textual run; with no textual target at all the result is `None`.
    pub fn select_at(&mut self, log: usize, assoc_prev: bool) -> Result<Option<ResolvedAnchor>, Error> {
        let ren = self.log_to_ren(log)?;
        Ok(self.resolve_anchor(ren, assoc_prev))
    }

    /// Resolves a rendered position to an anchor, as [`TextSource::select_at`]
    /// but on the rendered side.
    pub fn select_at_render(
        &mut self,
        ren: usize,
        assoc_prev: bool,
    ) -> Result<Option<ResolvedAnchor>, Error> {
        self.ensure_maps();
        if ren > self.ren_len {
            return Err(Error::OffsetOutOfRange {
                offset: ren,
                len: self.ren_len,
            });
        }
        Ok(self.resolve_anchor(ren, assoc_prev))
    }

    fn resolve_anchor(&self, ren: usize, assoc_prev: bool) -> Option<ResolvedAnchor> {
        let prev_textual = ren > 0
            && map_at_ren(&self.maps, ren - 1)
                .map(|i| self.maps[i].is_textual())
                .unwrap_or(false);
        let next_textual = ren < self.ren_len
            && map_at_ren(&self.maps, ren)
                .map(|i| self.maps[i].is_textual())
                .unwrap_or(false);
        // An empty textual run whose boundary sits exactly here is a valid
        // caret target (the empty-paragraph case).
        let empty_here = self
            .maps
            .iter()
            .any(|m| m.is_textual() && m.ren_len == 0 && m.ren_start == ren);

        if assoc_prev {
            if prev_textual {
                return Some(ResolvedAnchor {
                    ren,
                    assoc_prev: true,
                });
            }
            if next_textual {
                return Some(ResolvedAnchor {
                    ren,
                    assoc_prev: false,
                });
            }
        } else {
            if next_textual {
                return Some(ResolvedAnchor {
                    ren,
                    assoc_prev: false,
                });
            }
            if prev_textual {
                return Some(ResolvedAnchor {
                    ren,
                    assoc_prev: true,
                });
            }
        }
        empty_here.then_some(ResolvedAnchor { ren, assoc_prev })
    }

    fn ensure_maps(&mut self) {
        if self.built {
            return;
        }
        self.maps.clear();
        self.rendered.clear();
        let mut log = 0;
        let mut ren = 0;
        for (index, run) in self.runs.iter().enumerate() {
            let expansion = expand_run(index, run, log, ren, self.interpreter.as_deref());
            self.maps.extend(expansion.maps);
            self.rendered.push_str(&expansion.rendered);
            log += expansion.log_len;
            ren += expansion.ren_len;
        }
        sweep_degenerate(&mut self.maps);
        self.log_len = log;
        self.ren_len = ren;
        self.built = true;
        trace!(
            runs = self.runs.len(),
            maps = self.maps.len(),
            log_len = log,
            ren_len = ren,
            "built map runs"
        );
    }
}

fn styles_per_char(maps: &[MapRun]) -> Vec<Style> {
    let mut out = Vec::new();
    for m in maps {
        for _ in 0..m.ren_len {
            out.push(m.style);
        }
    }
    out
}
