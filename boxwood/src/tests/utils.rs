// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test harness: deterministic mock renderer and a recording host site.

use core::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::host::{Fit, HostSite, RendererFactory, TextRenderer};
use crate::lazy::SizeChange;
use crate::style::{AssembledStyles, EmptyStylesheet, Style, Stylesheet, WsId};
use crate::text::{ClientRun, TextClientRun, TextSource};
use crate::tree::{BoxId, BoxKind};
use crate::{LayoutTransform, Point, Rect, RootBox, Size};

/// Width of every character under the mock renderer, in pixels.
pub(crate) const CHAR_W: i32 = 10;
/// Mock ascent in pixels.
pub(crate) const ASCENT: i32 = 8;
/// Mock descent in pixels.
pub(crate) const DESCENT: i32 = 2;
/// Default line height under the mock renderer.
pub(crate) const LINE_H: i32 = ASCENT + DESCENT;

pub(crate) struct MockRenderer {
    calls: Rc<RefCell<usize>>,
}

impl TextRenderer for MockRenderer {
    fn measure(&self, _styles: &AssembledStyles, text: &str) -> i32 {
        *self.calls.borrow_mut() += 1;
        text.chars().count() as i32 * CHAR_W
    }

    fn ascent_descent(&self, _styles: &AssembledStyles) -> (i32, i32) {
        (ASCENT, DESCENT)
    }

    fn fit(&self, _styles: &AssembledStyles, text: &str, avail: i32, force: bool) -> Fit {
        *self.calls.borrow_mut() += 1;
        let chars: Vec<char> = text.chars().collect();
        let max = (avail / CHAR_W).max(0) as usize;
        if max >= chars.len() {
            return Fit {
                chars: chars.len(),
                px: chars.len() as i32 * CHAR_W,
            };
        }
        let mut break_at = None;
        for i in (1..=max).rev() {
            if chars[i - 1].is_whitespace() {
                break_at = Some(i);
                break;
            }
        }
        match break_at {
            Some(i) => Fit {
                chars: i,
                px: i as i32 * CHAR_W,
            },
            None if force => {
                let n = max.max(1);
                Fit {
                    chars: n,
                    px: n as i32 * CHAR_W,
                }
            }
            None => Fit::default(),
        }
    }
}

pub(crate) struct MockFactory {
    by_ws: HashMap<u32, MockRenderer>,
    fallback: MockRenderer,
    missing: Vec<WsId>,
}

impl RendererFactory for MockFactory {
    fn renderer(&self, ws: WsId) -> Result<&dyn TextRenderer, crate::Error> {
        if self.missing.contains(&ws) {
            return Err(crate::Error::RendererUnavailable(ws));
        }
        Ok(self
            .by_ws
            .get(&ws.0)
            .map(|r| r as &dyn TextRenderer)
            .unwrap_or(&self.fallback))
    }

    fn is_rtl(&self, _ws: WsId) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HostEvent {
    InvalidateRoot(Rect),
    InvalidateDevice(Rect),
    SizeChanged(SizeChange),
    ScrollRange(Size),
    ScrollTo(Point),
}

pub(crate) struct RecordingHost {
    events: Rc<RefCell<Vec<HostEvent>>>,
    scroll: Point,
}

impl HostSite for RecordingHost {
    fn invalidate_root(&mut self, rect: Rect) {
        self.events.borrow_mut().push(HostEvent::InvalidateRoot(rect));
    }

    fn invalidate_device(&mut self, rect: Rect) {
        self.events
            .borrow_mut()
            .push(HostEvent::InvalidateDevice(rect));
    }

    fn size_changed(&mut self, change: SizeChange) {
        self.events.borrow_mut().push(HostEvent::SizeChanged(change));
    }

    fn scroll_position(&self) -> Point {
        self.scroll
    }

    fn set_scroll_position(&mut self, position: Point) {
        self.scroll = position;
        self.events.borrow_mut().push(HostEvent::ScrollTo(position));
    }

    fn set_scroll_range(&mut self, extent: Size) {
        self.events.borrow_mut().push(HostEvent::ScrollRange(extent));
    }
}

pub(crate) struct TestEnv {
    pub(crate) root: RootBox,
    pub(crate) events: Rc<RefCell<Vec<HostEvent>>>,
    calls: Rc<RefCell<usize>>,
    ws_calls: HashMap<u32, Rc<RefCell<usize>>>,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self::build(&[], &[], Arc::new(EmptyStylesheet))
    }

    /// An environment with a dedicated (separately counted) renderer per
    /// listed writing system.
    pub(crate) fn with_ws(ws_list: &[u32]) -> Self {
        Self::build(ws_list, &[], Arc::new(EmptyStylesheet))
    }

    pub(crate) fn with_missing_ws(missing: &[u32]) -> Self {
        Self::build(&[], missing, Arc::new(EmptyStylesheet))
    }

    fn build(ws_list: &[u32], missing: &[u32], sheet: Arc<dyn Stylesheet>) -> Self {
        let calls = Rc::new(RefCell::new(0));
        let mut by_ws = HashMap::new();
        let mut ws_calls = HashMap::new();
        for &ws in ws_list {
            let counter = Rc::new(RefCell::new(0));
            by_ws.insert(
                ws,
                MockRenderer {
                    calls: counter.clone(),
                },
            );
            ws_calls.insert(ws, counter);
        }
        let factory = MockFactory {
            by_ws,
            fallback: MockRenderer {
                calls: calls.clone(),
            },
            missing: missing.iter().map(|&w| WsId(w)).collect(),
        };
        let events = Rc::new(RefCell::new(Vec::new()));
        let host = RecordingHost {
            events: events.clone(),
            scroll: Point::default(),
        };
        let root = RootBox::new(
            sheet,
            Box::new(factory),
            Box::new(host),
            LayoutTransform::new(96, 96),
        );
        Self {
            root,
            events,
            calls,
            ws_calls,
        }
    }

    /// Appends a paragraph with a single uniform run to the root.
    pub(crate) fn para(&mut self, text: &str) -> BoxId {
        self.para_with_style(text, Style::DEFAULT)
    }

    pub(crate) fn para_with_style(&mut self, text: &str, style: Style) -> BoxId {
        let source = TextSource::new(vec![ClientRun::Text(TextClientRun::new(text, style))]);
        self.para_from_source(source, style)
    }

    pub(crate) fn para_from_source(&mut self, source: TextSource, style: Style) -> BoxId {
        let para = self.root.tree_mut().alloc(
            style,
            BoxKind::Para(crate::layout::para::ParaBox::new(source)),
        );
        let root_id = self.root.root_id();
        self.root.tree_mut().append_child(root_id, para);
        para
    }

    /// Appends a fixed block to the root.
    pub(crate) fn block(&mut self, style: Style, w_mp: i32, h_mp: i32) -> BoxId {
        let id = self.root.tree_mut().alloc(
            style,
            BoxKind::Block(crate::layout::leaf::BlockBox {
                width: w_mp,
                height: h_mp,
                color: peniko::color::Rgba8 {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: 255,
                },
            }),
        );
        let root_id = self.root.root_id();
        self.root.tree_mut().append_child(root_id, id);
        id
    }

    pub(crate) fn layout(&mut self, width: i32) {
        self.root.layout(width).expect("layout");
    }

    pub(crate) fn take_events(&self) -> Vec<HostEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub(crate) fn reset_calls(&self) {
        *self.calls.borrow_mut() = 0;
        for counter in self.ws_calls.values() {
            *counter.borrow_mut() = 0;
        }
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    pub(crate) fn ws_call_count(&self, ws: u32) -> usize {
        self.ws_calls.get(&ws).map(|c| *c.borrow()).unwrap_or(0)
    }
}

/// Millipoints that convert to exactly `px` pixels at the 96dpi test
/// resolution.
pub(crate) fn mp(px: i32) -> i32 {
    px * 750
}
