// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root coordinator.
//!
//! A [`RootBox`] owns the box arena, the style cache and the current
//! selection, and mediates every interaction with the host: painting in
//! three fixed passes (background, foreground, selection), hit testing,
//! mouse and drag handling, scrolling, and the change-notification registry
//! of the domain layer.
//!
//! Layout-mutating operations run inside a synchronous, stack-nesting
//! suspension scope. Invalidations raised inside the scope are queued, a
//! paint attempted while suspended records its region as pending, and
//! releasing the outermost scope flushes everything to the host in recorded
//! order.

use core::mem::take;
use core::ops::{Deref, DerefMut, Range};
use std::sync::Arc;

use hashbrown::HashMap;
use peniko::color::Rgba8;
use peniko::Color;
use tracing::{debug, trace};

use crate::coords::{LayoutTransform, PaintTransform, Point, Rect, Size};
use crate::editing::{
    apply_drop, drag_text, drop_actions, drop_effect, para_mut, DragSource, DropAction,
    DropEffect, DropTarget, InsertionPoint, Modifiers, Selection,
};
use crate::error::Error;
use crate::host::{DrawingSurface, HostSite, PropTag, RendererFactory};
use crate::layout::para::{Seg, SegKind};
use crate::layout::{build_fixup_map, layout_box, relayout_box, LayoutInfo};
use crate::lazy::{expand_lazy, SizeChange};
use crate::style::{StyleCache, Stylesheet, UnderlineKind};
use crate::text::{ClientRun, TextChange};
use crate::tree::{BoxId, BoxKind, BoxTree};

const SCROLL_SLACK: i32 = 8;
const DRAG_THRESHOLD: i32 = 4;
const SELECTION_HIGHLIGHT: Color = Color::from_rgba8(61, 123, 216, 102);

fn color(c: Rgba8) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[derive(Clone, Debug)]
enum MouseState {
    Idle,
    Selecting,
    DragPending {
        src: DragSource,
        origin: Point,
    },
    Dragging {
        src: DragSource,
    },
}

/// The operations a completed drop asks the document layer to perform, in
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropRequest {
    /// Ordered text operations.
    pub actions: Vec<DropAction>,
    /// Move or copy.
    pub effect: DropEffect,
    /// The dragged text.
    pub text: String,
}

/// Owner of the box tree and everything view-level.
pub struct RootBox {
    tree: BoxTree,
    root: BoxId,
    styles: StyleCache,
    renderers: Box<dyn RendererFactory>,
    host: Box<dyn HostSite>,
    transform: LayoutTransform,
    selection: Option<Selection>,
    mouse: MouseState,
    registry: HashMap<PropTag, Vec<BoxId>>,
    pending_invalidates: Vec<Rect>,
    pending_size_changes: Vec<SizeChange>,
    pending_paint: Option<Rect>,
    suspend_depth: u32,
    last_width: i32,
}

impl core::fmt::Debug for RootBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RootBox")
            .field("boxes", &self.tree.len())
            .field("suspend_depth", &self.suspend_depth)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl RootBox {
    /// Creates an empty root over the given collaborators.
    pub fn new(
        stylesheet: Arc<dyn Stylesheet>,
        renderers: Box<dyn RendererFactory>,
        host: Box<dyn HostSite>,
        transform: LayoutTransform,
    ) -> Self {
        let styles = StyleCache::new(stylesheet);
        let mut tree = BoxTree::new();
        let root = tree.alloc(crate::style::Style::DEFAULT, BoxKind::Div);
        Self {
            tree,
            root,
            styles,
            renderers,
            host,
            transform,
            selection: None,
            mouse: MouseState::Idle,
            registry: HashMap::new(),
            pending_invalidates: Vec::new(),
            pending_size_changes: Vec::new(),
            pending_paint: None,
            suspend_depth: 0,
            last_width: 0,
        }
    }

    /// The root division box every view hangs from.
    pub fn root_id(&self) -> BoxId {
        self.root
    }

    /// The box arena.
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Mutable access to the box arena, for view construction.
    pub fn tree_mut(&mut self) -> &mut BoxTree {
        &mut self.tree
    }

    /// The style cache.
    pub fn styles(&self) -> &StyleCache {
        &self.styles
    }

    /// Mutable access to the style cache, for view construction.
    pub fn styles_mut(&mut self) -> &mut StyleCache {
        &mut self.styles
    }

    /// The current selection.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The layout resolution.
    pub fn transform(&self) -> LayoutTransform {
        self.transform
    }

    // ---- layout ----------------------------------------------------------

    /// Full top-down layout of the whole tree at the given available width.
    pub fn layout(&mut self, avail_width: i32) -> Result<(), Error> {
        self.last_width = avail_width;
        {
            let Self {
                tree,
                styles,
                renderers,
                transform,
                root,
                ..
            } = self;
            let info = LayoutInfo {
                avail_width,
                transform: *transform,
                styles: &*styles,
                renderers: renderers.as_ref(),
            };
            layout_box(tree, *root, &info)?;
        }
        self.publish_extent();
        Ok(())
    }

    /// Incremental relayout after the given boxes changed.
    ///
    /// Builds the ancestor fixup map, re-lays-out only the boxes on it (plus
    /// never-laid-out boxes), and queues the resulting invalidations. Runs
    /// inside a suspension scope; everything flushes on return.
    pub fn relayout(&mut self, dirty: &[BoxId]) -> Result<(), Error> {
        let mut scope = self.suspend_layout();
        scope.relayout_suspended(dirty)?;
        Ok(())
    }

    fn relayout_suspended(&mut self, dirty: &[BoxId]) -> Result<(), Error> {
        debug_assert!(self.suspend_depth > 0, "relayout requires a suspension scope");
        let fixup = build_fixup_map(&self.tree, dirty);
        {
            let Self {
                tree,
                styles,
                renderers,
                transform,
                root,
                last_width,
                pending_invalidates,
                ..
            } = self;
            let info = LayoutInfo {
                avail_width: *last_width,
                transform: *transform,
                styles: &*styles,
                renderers: renderers.as_ref(),
            };
            relayout_box(tree, *root, &info, &fixup, pending_invalidates)?;
        }
        self.publish_extent();
        Ok(())
    }

    fn publish_extent(&mut self) {
        let extent = Size::new(self.tree[self.root].width, self.tree[self.root].height);
        self.host.set_scroll_range(extent);
    }

    // ---- suspension ------------------------------------------------------

    /// Opens a suspension scope around layout mutation.
    ///
    /// While any scope is open, invalidations queue instead of reaching the
    /// host and paints degrade to recording their region. Scopes nest; the
    /// outermost release flushes queued work in recorded order. The guard
    /// releases on every exit path.
    pub fn suspend_layout(&mut self) -> LayoutScope<'_> {
        self.suspend_depth += 1;
        LayoutScope { root: self }
    }

    /// True while a suspension scope is open.
    pub fn is_suspended(&self) -> bool {
        self.suspend_depth > 0
    }

    fn resume_suspend(&mut self) {
        debug_assert!(self.suspend_depth > 0, "unbalanced suspension release");
        self.suspend_depth -= 1;
        if self.suspend_depth > 0 {
            return;
        }
        let invalidates = take(&mut self.pending_invalidates);
        let size_changes = take(&mut self.pending_size_changes);
        let paint = self.pending_paint.take();
        if !invalidates.is_empty() || !size_changes.is_empty() || paint.is_some() {
            debug!(
                invalidates = invalidates.len(),
                size_changes = size_changes.len(),
                pending_paint = paint.is_some(),
                "flushing deferred host notifications"
            );
        }
        for rect in invalidates {
            self.host.invalidate_root(rect);
        }
        for change in size_changes {
            self.host.size_changed(change);
        }
        if let Some(region) = paint {
            self.host.invalidate_device(region);
        }
    }

    /// Marks a root-relative rectangle as needing repaint, queueing it while
    /// suspended.
    pub fn invalidate(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if self.suspend_depth > 0 {
            trace!(?rect, "invalidate queued");
            self.pending_invalidates.push(rect);
        } else {
            self.host.invalidate_root(rect);
        }
    }

    // ---- change notification --------------------------------------------

    /// Registers `id` as displaying the given object property.
    pub fn register_dependency(&mut self, tag: PropTag, id: BoxId) {
        let boxes = self.registry.entry(tag).or_default();
        if !boxes.contains(&id) {
            boxes.push(id);
        }
    }

    /// Handles the domain layer's change hook: relayouts every box
    /// registered for the property.
    pub fn property_changed(&mut self, tag: PropTag) -> Result<(), Error> {
        let Some(dirty) = self.registry.get(&tag).cloned() else {
            return Ok(());
        };
        debug!(?tag, boxes = dirty.len(), "property changed");
        self.relayout(&dirty)
    }

    /// Replaces one client run of a paragraph and patches display state
    /// incrementally, returning the minimal rendered edit.
    pub fn replace_client_run(
        &mut self,
        para: BoxId,
        index: usize,
        run: ClientRun,
    ) -> Result<TextChange, Error> {
        let mut scope = self.suspend_layout();
        let change = {
            let p = para_mut(&mut scope.tree, para).ok_or(Error::UnsupportedEdit)?;
            p.source.client_run_changed(index, run)?
        };
        scope.relayout_suspended(&[para])?;
        Ok(change)
    }

    // ---- lazy preparation ------------------------------------------------

    /// Guarantees every box overlapping the root-relative vertical band is
    /// real, expanding lazy boxes minimally.
    ///
    /// Each expansion must shrink the number of unresolved items overlapping
    /// the band; a pass that fails to faults with
    /// [`Error::NoExpansionProgress`].
    pub fn prepare_to_paint(&mut self, band: Range<i32>) -> Result<(), Error> {
        let mut prev_unresolved: Option<usize> = None;
        loop {
            let Some((lazy_id, unresolved)) = self.first_lazy_in_band(&band) else {
                return Ok(());
            };
            if let Some(prev) = prev_unresolved {
                if unresolved >= prev {
                    return Err(Error::NoExpansionProgress {
                        first: 0,
                        last: unresolved,
                    });
                }
            }
            prev_unresolved = Some(unresolved);

            let old_rect = self.tree.root_rect(lazy_id);
            let local_band = (band.start - old_rect.top)..(band.end - old_rect.top);
            let parent = self.tree[lazy_id].parent;

            let mut scope = self.suspend_layout();
            let inner = &mut *scope;
            let outcome = expand_lazy(&mut inner.tree, &mut inner.styles, lazy_id, local_band)?;
            let dirty: Vec<BoxId> = if outcome.replacement.is_empty() {
                parent.into_iter().collect()
            } else {
                outcome.replacement.clone()
            };
            scope.relayout_suspended(&dirty)?;

            let actual: i32 = outcome
                .built
                .iter()
                .map(|&id| scope.tree[id].height)
                .sum();
            let delta = actual - (outcome.est_bottom - outcome.est_top);
            if delta != 0 {
                let change = SizeChange {
                    est_top: old_rect.top + outcome.est_top,
                    est_bottom: old_rect.top + outcome.est_bottom,
                    delta,
                };
                trace!(?change, "lazy expansion changed extent");
                scope.pending_size_changes.push(change);
                let reveal = Rect::new(
                    old_rect.left,
                    old_rect.top + outcome.est_top,
                    old_rect.right,
                    old_rect.top + outcome.est_bottom + delta.max(0),
                );
                scope.invalidate(reveal);
            }
        }
    }

    /// The first lazy box whose extent overlaps the band, plus the total
    /// number of unresolved items overlapping it.
    fn first_lazy_in_band(&self, band: &Range<i32>) -> Option<(BoxId, usize)> {
        let mut first = None;
        let mut unresolved = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, base)) = stack.pop() {
            let node = &self.tree[id];
            let top = base + node.top;
            let bottom = top + node.height;
            if id != self.root && (bottom <= band.start || top >= band.end) {
                continue;
            }
            if let BoxKind::Lazy(lazy) = &node.kind {
                if first.is_none() {
                    first = Some(id);
                }
                unresolved += lazy.items().len();
                continue;
            }
            for child in self.tree.children(id) {
                stack.push((child, top));
            }
        }
        first.map(|id| (id, unresolved))
    }

    // ---- painting --------------------------------------------------------

    /// Paints the tree onto `surface`: background, then foreground, then
    /// selection, always in that order.
    ///
    /// A paint that arrives while layout is suspended records `clip_device`
    /// as pending and draws nothing.
    pub fn paint(
        &mut self,
        surface: &mut dyn DrawingSurface,
        transform: &PaintTransform,
        clip_device: Rect,
    ) -> Result<(), Error> {
        if self.suspend_depth > 0 {
            trace!("paint while suspended; recording pending region");
            self.pending_paint = Some(
                self.pending_paint
                    .map(|r| r.union(&clip_device))
                    .unwrap_or(clip_device),
            );
            return Ok(());
        }
        let clip_root = clip_device.translate(
            transform.scroll.x - transform.origin.x,
            transform.scroll.y - transform.origin.y,
        );
        self.prepare_to_paint(clip_root.top..clip_root.bottom)?;
        self.paint_box(surface, transform, clip_root, self.root, Point::new(0, 0), Pass::Background)?;
        self.paint_box(surface, transform, clip_root, self.root, Point::new(0, 0), Pass::Foreground)?;
        self.paint_selection(surface, transform);
        Ok(())
    }

    fn paint_box(
        &mut self,
        surface: &mut dyn DrawingSurface,
        transform: &PaintTransform,
        clip_root: Rect,
        id: BoxId,
        origin: Point,
        pass: Pass,
    ) -> Result<(), Error> {
        let rect = {
            let node = &self.tree[id];
            node.rect().translate(origin.x, origin.y)
        };
        if rect.height() == 0 || !rect.intersects(&clip_root) {
            return Ok(());
        }

        match pass {
            Pass::Background => {
                let bundle = self.styles.get(self.tree[id].style).clone();
                if let Some(back) = bundle.back_color {
                    surface.fill_rect(transform.rect_to_device(rect), color(back));
                }
                let borders = bundle.borders_px(&self.transform);
                if borders.left > 0 || borders.top > 0 || borders.right > 0 || borders.bottom > 0 {
                    let b = color(bundle.border_color);
                    let device = transform.rect_to_device(rect);
                    if borders.left > 0 {
                        surface.fill_rect(
                            Rect::new(device.left, device.top, device.left + borders.left, device.bottom),
                            b,
                        );
                    }
                    if borders.right > 0 {
                        surface.fill_rect(
                            Rect::new(device.right - borders.right, device.top, device.right, device.bottom),
                            b,
                        );
                    }
                    if borders.top > 0 {
                        surface.fill_rect(
                            Rect::new(device.left, device.top, device.right, device.top + borders.top),
                            b,
                        );
                    }
                    if borders.bottom > 0 {
                        surface.fill_rect(
                            Rect::new(device.left, device.bottom - borders.bottom, device.right, device.bottom),
                            b,
                        );
                    }
                }
            }
            Pass::Foreground => {
                enum Fg {
                    Block(Rgba8),
                    Image(peniko::ImageData),
                    Para,
                    None,
                }
                let fg = match &self.tree[id].kind {
                    BoxKind::Block(block) => Fg::Block(block.color),
                    BoxKind::Image(image) => Fg::Image(image.image.clone()),
                    BoxKind::Para(_) => Fg::Para,
                    _ => Fg::None,
                };
                match fg {
                    Fg::Block(fill) => {
                        let bundle = self.styles.get(self.tree[id].style);
                        let content = inset_content(rect, bundle, &self.transform);
                        surface.fill_rect(transform.rect_to_device(content), color(fill));
                    }
                    Fg::Image(img) => {
                        let bundle = self.styles.get(self.tree[id].style);
                        let content = inset_content(rect, bundle, &self.transform);
                        surface.draw_image(&img, transform.rect_to_device(content));
                    }
                    Fg::Para => {
                        self.paint_para(surface, transform, id, Point::new(rect.left, rect.top));
                    }
                    Fg::None => {}
                }
            }
        }

        let children: Vec<BoxId> = self.tree.children(id).collect();
        for child in children {
            self.paint_box(
                surface,
                transform,
                clip_root,
                child,
                Point::new(rect.left, rect.top),
                pass,
            )?;
        }
        Ok(())
    }

    fn paint_para(
        &mut self,
        surface: &mut dyn DrawingSurface,
        transform: &PaintTransform,
        id: BoxId,
        origin: Point,
    ) {
        struct TextDraw {
            seg: Seg,
            line_top: i32,
            line_height: i32,
            baseline: i32,
            text: String,
        }
        let draws: Vec<TextDraw> = {
            let Some(para) = para_mut(&mut self.tree, id) else {
                return;
            };
            let lines = para.lines().to_vec();
            let mut draws = Vec::new();
            for line in &lines {
                for seg in &line.segs {
                    if seg.ren_len == 0 || !matches!(seg.kind, SegKind::Text) {
                        continue;
                    }
                    draws.push(TextDraw {
                        seg: seg.clone(),
                        line_top: line.top,
                        line_height: line.height,
                        baseline: line.top + line.ascent,
                        text: para.seg_text(seg),
                    });
                }
            }
            draws
        };
        for draw in draws {
            let bundle = self.styles.get(draw.seg.style);
            let seg_rect = Rect::new(
                origin.x + draw.seg.left,
                origin.y + draw.line_top,
                origin.x + draw.seg.left + draw.seg.width,
                origin.y + draw.line_top + draw.line_height,
            );
            if let Some(back) = bundle.back_color {
                surface.fill_rect(transform.rect_to_device(seg_rect), color(back));
            }
            let offset = self.transform.to_px_y(bundle.baseline_offset);
            let baseline = origin.y + draw.baseline - offset;
            let device = transform.to_device(Point::new(origin.x + draw.seg.left, baseline));
            let ws = bundle.ws.unwrap_or(crate::style::WsId(0));
            surface.draw_text(device, &draw.text, bundle, ws);
            if bundle.underline != UnderlineKind::None {
                let ul = color(bundle.effective_underline_color());
                let strip = Rect::new(seg_rect.left, baseline + 1, seg_rect.right, baseline + 2);
                surface.fill_rect(transform.rect_to_device(strip), ul);
                if bundle.underline == UnderlineKind::Double {
                    let second =
                        Rect::new(seg_rect.left, baseline + 3, seg_rect.right, baseline + 4);
                    surface.fill_rect(transform.rect_to_device(second), ul);
                }
            }
        }
    }

    fn paint_selection(&mut self, surface: &mut dyn DrawingSurface, transform: &PaintTransform) {
        match self.selection {
            None => {}
            Some(Selection::Insertion(ip)) => {
                let caret = {
                    let Self {
                        tree,
                        styles,
                        renderers,
                        ..
                    } = self;
                    ip.caret_rect_root(tree, styles, renderers.as_ref())
                };
                if let Some(rect) = caret {
                    let fore = {
                        let p = para_mut(&mut self.tree, ip.para);
                        p.map(|p| p.source.style_at_ren(ip.ren))
                            .map(|s| self.styles.get(s).fore_color)
                            .unwrap_or(Rgba8 {
                                r: 0,
                                g: 0,
                                b: 0,
                                a: 255,
                            })
                    };
                    surface.fill_rect(transform.rect_to_device(rect), color(fore));
                }
            }
            Some(Selection::Range(range)) => {
                let rects = {
                    let Self {
                        tree,
                        styles,
                        renderers,
                        ..
                    } = self;
                    let mut rects = Vec::new();
                    range.geometry(tree, styles, renderers.as_ref(), |r| rects.push(r));
                    rects
                };
                for r in rects {
                    surface.fill_rect(transform.rect_to_device(r), SELECTION_HIGHLIGHT);
                }
            }
        }
    }

    // ---- hit testing and mouse ------------------------------------------

    /// The deepest box at a root-relative point.
    ///
    /// A box whose bounds contain the point wins; if no child on the
    /// matching line contains it, the nearest child on that line by
    /// horizontal distance is descended instead.
    pub fn find_box_at(&self, p: Point) -> Option<BoxId> {
        let mut id = self.root;
        let mut local = p;
        if !self.tree[id].rect().contains(local) && self.tree[id].height > 0 {
            // Points outside the root vertically have no target; horizontal
            // misses still resolve through the nearest-on-line rule.
            if local.y < 0 || local.y >= self.tree[id].height {
                return None;
            }
        }
        loop {
            let mut next: Option<BoxId> = None;
            for child in self.tree.children(id) {
                if self.tree[child].rect().contains(local) {
                    next = Some(child);
                    break;
                }
            }
            if next.is_none() {
                let mut best: Option<(i32, BoxId)> = None;
                for child in self.tree.children(id) {
                    let r = self.tree[child].rect();
                    if local.y < r.top || local.y >= r.bottom {
                        continue;
                    }
                    let dist = if local.x < r.left {
                        r.left - local.x
                    } else if local.x >= r.right {
                        local.x - r.right + 1
                    } else {
                        0
                    };
                    if best.map(|(d, _)| dist < d).unwrap_or(true) {
                        best = Some((dist, child));
                    }
                }
                next = best.map(|(_, child)| child);
            }
            match next {
                Some(child) => {
                    let r = self.tree[child].rect();
                    local = Point::new(local.x - r.left, local.y - r.top);
                    id = child;
                }
                None => return Some(id),
            }
        }
    }

    /// Resolves a root-relative point to an insertion point, if any text is
    /// there.
    pub fn insertion_at(&mut self, p: Point) -> Result<Option<InsertionPoint>, Error> {
        let Some(hit) = self.find_box_at(p) else {
            return Ok(None);
        };
        let Some(para) = self
            .tree
            .self_and_ancestors(hit)
            .find(|&id| matches!(self.tree[id].kind, BoxKind::Para(_)))
        else {
            return Ok(None);
        };
        let origin = self.tree.root_origin(para);
        let local = Point::new(p.x - origin.x, p.y - origin.y);
        let target = {
            let Self {
                tree,
                styles,
                renderers,
                ..
            } = self;
            let Some(pb) = para_mut(tree, para) else {
                return Ok(None);
            };
            pb.hit_test(local, styles, renderers.as_ref())
        };
        let Some((ren, assoc_prev)) = target else {
            return Ok(None);
        };
        InsertionPoint::from_render(&mut self.tree, para, ren, assoc_prev)
    }

    /// Handles a left-button press at a root-relative point.
    ///
    /// A press inside an existing range selection arms a drag-copy instead
    /// of relocating the caret; otherwise the caret moves (or the selection
    /// extends, with shift).
    pub fn mouse_down(&mut self, p: Point, mods: Modifiers) -> Result<(), Error> {
        if let Some(Selection::Range(range)) = self.selection {
            if !mods.shift {
                let inside = {
                    let Self {
                        tree,
                        styles,
                        renderers,
                        ..
                    } = self;
                    range.contains_point(tree, styles, renderers.as_ref(), p)
                };
                if inside {
                    let (start, end) = range.ordered(&self.tree);
                    if start.para == end.para {
                        let tag = self.para_tag(start.para);
                        self.mouse = MouseState::DragPending {
                            src: DragSource {
                                para: start.para,
                                tag,
                                range: start.ren..end.ren,
                            },
                            origin: p,
                        };
                        return Ok(());
                    }
                }
            }
        }
        let Some(ip) = self.insertion_at(p)? else {
            self.set_selection(None);
            self.mouse = MouseState::Idle;
            return Ok(());
        };
        let next = if mods.shift {
            match self.selection {
                Some(sel) => sel.extended_to(ip),
                None => ip.into(),
            }
        } else {
            ip.into()
        };
        self.set_selection(Some(next));
        self.mouse = MouseState::Selecting;
        Ok(())
    }

    /// Handles mouse movement with the left button held.
    pub fn mouse_move(&mut self, p: Point, _mods: Modifiers) -> Result<(), Error> {
        match self.mouse.clone() {
            MouseState::Selecting => {
                if let Some(ip) = self.insertion_at(p)? {
                    if let Some(sel) = self.selection {
                        self.set_selection(Some(sel.extended_to(ip)));
                    }
                }
            }
            MouseState::DragPending { src, origin } => {
                if (p.x - origin.x).abs() + (p.y - origin.y).abs() >= DRAG_THRESHOLD {
                    debug!("drag started");
                    self.mouse = MouseState::Dragging { src };
                }
            }
            MouseState::Dragging { .. } | MouseState::Idle => {}
        }
        Ok(())
    }

    /// Handles left-button release.
    ///
    /// Completing a drag yields the ordered drop operations for the
    /// document layer; modifier-key state picks move versus copy. A press
    /// inside the selection that never moved relocates the caret here.
    pub fn mouse_up(&mut self, p: Point, mods: Modifiers) -> Result<Option<DropRequest>, Error> {
        let state = core::mem::replace(&mut self.mouse, MouseState::Idle);
        match state {
            MouseState::Dragging { src } => {
                let Some(ip) = self.insertion_at(p)? else {
                    return Ok(None);
                };
                let dst = DropTarget {
                    para: ip.para,
                    tag: self.para_tag(ip.para),
                    ren: ip.ren,
                };
                let text = drag_text(&mut self.tree, &src);
                let effect = drop_effect(mods);
                let actions = drop_actions(&src, &dst, text.clone(), effect);
                Ok(Some(DropRequest {
                    actions,
                    effect,
                    text,
                }))
            }
            MouseState::DragPending { .. } => {
                if let Some(ip) = self.insertion_at(p)? {
                    self.set_selection(Some(ip.into()));
                }
                Ok(None)
            }
            MouseState::Selecting | MouseState::Idle => Ok(None),
        }
    }

    /// Applies a drop whose edits stay inside single client runs, with
    /// incremental relayout of the touched paragraphs.
    pub fn perform_drop(&mut self, request: &DropRequest) -> Result<Vec<TextChange>, Error> {
        let mut scope = self.suspend_layout();
        let changes = apply_drop(&mut scope.tree, &request.actions)?;
        let mut dirty: Vec<BoxId> = Vec::new();
        for action in &request.actions {
            let para = match action {
                DropAction::Delete { para, .. } | DropAction::Insert { para, .. } => *para,
            };
            if !dirty.contains(&para) {
                dirty.push(para);
            }
        }
        scope.relayout_suspended(&dirty)?;
        Ok(changes)
    }

    fn para_tag(&self, id: BoxId) -> Option<PropTag> {
        match &self.tree[id].kind {
            BoxKind::Para(para) => para.tag,
            _ => None,
        }
    }

    /// Caret rectangle of an insertion point, root-relative.
    pub fn caret_rect(&mut self, ip: &InsertionPoint) -> Option<Rect> {
        let Self {
            tree,
            styles,
            renderers,
            ..
        } = self;
        ip.caret_rect_root(tree, styles, renderers.as_ref())
    }

    /// Replaces the selection, invalidating old and new geometry.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let old = self.selection_bounds();
        self.selection = selection;
        let new = self.selection_bounds();
        match (old, new) {
            (Some(a), Some(b)) => self.invalidate(a.union(&b)),
            (Some(r), None) | (None, Some(r)) => self.invalidate(r),
            (None, None) => {}
        }
    }

    fn selection_bounds(&mut self) -> Option<Rect> {
        let sel = self.selection?;
        let Self {
            tree,
            styles,
            renderers,
            ..
        } = self;
        sel.bounds(tree, styles, renderers.as_ref())
    }

    // ---- scrolling -------------------------------------------------------

    /// Scrolls the minimal distance to bring the selection into view.
    ///
    /// Prefers a small slack margin, else fits the whole selection, else
    /// shows only the selection's active edge. Returns the applied delta.
    pub fn scroll_to_show_selection(&mut self, viewport: Size) -> Option<Point> {
        let bounds = self.selection_bounds()?;
        let scroll = self.host.scroll_position();
        let view_top = scroll.y;
        let view_bottom = scroll.y + viewport.height;

        let dy = if bounds.top >= view_top && bounds.bottom <= view_bottom {
            0
        } else if bounds.height() + 2 * SCROLL_SLACK <= viewport.height {
            if bounds.top < view_top {
                bounds.top - SCROLL_SLACK - view_top
            } else {
                bounds.bottom + SCROLL_SLACK - view_bottom
            }
        } else {
            // Selection taller than the viewport: show the active edge only.
            let focus = self.selection.map(|s| s.focus());
            let edge = focus
                .and_then(|ip| {
                    let Self {
                        tree,
                        styles,
                        renderers,
                        ..
                    } = self;
                    ip.caret_rect_root(tree, styles, renderers.as_ref())
                })
                .unwrap_or(bounds);
            if edge.top < view_top {
                edge.top - SCROLL_SLACK - view_top
            } else if edge.bottom > view_bottom {
                edge.bottom + SCROLL_SLACK - view_bottom
            } else {
                0
            }
        };
        if dy != 0 {
            let next = Point::new(scroll.x, (scroll.y + dy).max(0));
            self.host.set_scroll_position(next);
        }
        Some(Point::new(0, dy))
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Pass {
    Background,
    Foreground,
}

fn inset_content(
    rect: Rect,
    bundle: &crate::style::AssembledStyles,
    transform: &LayoutTransform,
) -> Rect {
    let borders = bundle.borders_px(transform);
    let padding = bundle.padding_px(transform);
    Rect::new(
        rect.left + borders.left + padding.left,
        rect.top + borders.top + padding.top,
        rect.right - borders.right - padding.right,
        rect.bottom - borders.bottom - padding.bottom,
    )
}

/// RAII guard for a paint-suspension scope; releasing the outermost guard
/// flushes queued invalidations and size-change notifications.
pub struct LayoutScope<'a> {
    root: &'a mut RootBox,
}

impl core::fmt::Debug for LayoutScope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutScope")
            .field("depth", &self.root.suspend_depth)
            .finish()
    }
}

impl Deref for LayoutScope<'_> {
    type Target = RootBox;

    fn deref(&self) -> &RootBox {
        self.root
    }
}

impl DerefMut for LayoutScope<'_> {
    fn deref_mut(&mut self) -> &mut RootBox {
        self.root
    }
}

impl Drop for LayoutScope<'_> {
    fn drop(&mut self) {
        self.root.resume_suspend();
    }
}
