// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::RefCell;
use std::rc::Rc;

use super::utils::{mp, HostEvent, TestEnv};
use crate::layout::leaf::BlockBox;
use crate::lazy::{BuildContext, ItemBuilder, ItemId, LazyBox};
use crate::style::Style;
use crate::tree::{BoxId, BoxKind};
use crate::{Error, LayoutTransform};

/// Materializes each item as a fixed block and records which items it was
/// asked for.
struct BlockBuilder {
    est: i32,
    block_height_mp: i32,
    built: Rc<RefCell<Vec<ItemId>>>,
}

impl ItemBuilder for BlockBuilder {
    fn estimated_height(&self, _transform: &LayoutTransform) -> i32 {
        self.est
    }

    fn build_items(&mut self, cx: &mut BuildContext<'_>, items: &[ItemId]) -> Vec<BoxId> {
        self.built.borrow_mut().extend_from_slice(items);
        items
            .iter()
            .map(|_| {
                cx.tree.alloc(
                    Style::DEFAULT,
                    BoxKind::Block(BlockBox {
                        width: mp(20),
                        height: self.block_height_mp,
                        color: peniko::color::Rgba8 {
                            r: 0,
                            g: 0,
                            b: 0,
                            a: 255,
                        },
                    }),
                )
            })
            .collect()
    }
}

fn lazy_env(
    item_count: u64,
    est: i32,
    block_height_mp: i32,
) -> (TestEnv, BoxId, Rc<RefCell<Vec<ItemId>>>) {
    let mut env = TestEnv::new();
    let built = Rc::new(RefCell::new(Vec::new()));
    let builder = Rc::new(RefCell::new(BlockBuilder {
        est,
        block_height_mp,
        built: built.clone(),
    }));
    let items = (0..item_count).map(ItemId).collect();
    let lazy = env
        .root
        .tree_mut()
        .alloc(Style::DEFAULT, BoxKind::Lazy(LazyBox::new(items, builder)));
    let root = env.root.root_id();
    env.root.tree_mut().append_child(root, lazy);
    env.layout(200);
    (env, lazy, built)
}

#[test]
fn lazy_sizes_from_estimate() {
    let (env, lazy, built) = lazy_env(1000, 10, mp(10));
    assert_eq!(env.root.tree()[lazy].height, 10_000);
    assert!(built.borrow().is_empty(), "layout must not materialize");
}

#[test]
fn prepare_materializes_only_the_band() {
    let (mut env, _lazy, built) = lazy_env(1000, 10, mp(10));
    env.root.prepare_to_paint(7000..7050).expect("prepare");

    let built = built.borrow();
    assert!(!built.is_empty());
    assert!(
        built.iter().all(|item| item.0 >= 500),
        "a band below item 500's estimated position must not touch items 0..500"
    );
    assert!(built.iter().all(|item| (700..=705).contains(&item.0)));

    // The lazy box split around the expansion.
    let root = env.root.root_id();
    let first = env.root.tree()[root].first_child.expect("first child");
    match &env.root.tree()[first].kind {
        BoxKind::Lazy(lazy) => assert_eq!(lazy.items().len(), 700),
        other => panic!("expected a leading lazy remainder, got {other:?}"),
    }
    let last = env.root.tree()[root].last_child.expect("last child");
    match &env.root.tree()[last].kind {
        BoxKind::Lazy(lazy) => assert_eq!(lazy.items().len(), 295),
        other => panic!("expected a trailing lazy remainder, got {other:?}"),
    }
}

#[test]
fn expansion_reports_size_delta() {
    // Estimated 10px per item, real blocks are 30px tall.
    let (mut env, _lazy, _built) = lazy_env(1000, 10, mp(30));
    env.take_events();
    env.root.prepare_to_paint(0..50).expect("prepare");

    let events = env.take_events();
    let change = events
        .iter()
        .find_map(|e| match e {
            HostEvent::SizeChanged(c) => Some(*c),
            _ => None,
        })
        .expect("expansion must report its size delta");
    assert_eq!(change.est_top, 0);
    assert_eq!(change.est_bottom, 50);
    assert_eq!(change.delta, 5 * 30 - 50);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, HostEvent::InvalidateRoot(_))),
        "the revealed delta must be invalidated"
    );
}

#[test]
fn remove_items_defers_re_estimation() {
    let (mut env, lazy, _built) = lazy_env(100, 10, mp(10));
    assert_eq!(env.root.tree()[lazy].height, 1000);

    match &mut env.root.tree_mut()[lazy].kind {
        BoxKind::Lazy(l) => l.remove_items(0..50),
        _ => unreachable!(),
    }
    env.root.tree_mut()[lazy].height = 0;
    env.root.relayout(&[lazy]).expect("relayout");
    assert_eq!(env.root.tree()[lazy].height, 500);
}

/// A builder that "materializes" a lazy run into an identical lazy run,
/// shrinking nothing.
struct StubbornBuilder;

impl ItemBuilder for StubbornBuilder {
    fn estimated_height(&self, _transform: &LayoutTransform) -> i32 {
        10
    }

    fn build_items(&mut self, cx: &mut BuildContext<'_>, items: &[ItemId]) -> Vec<BoxId> {
        let again = LazyBox::new(items.to_vec(), Rc::new(RefCell::new(StubbornBuilder)));
        vec![cx.tree.alloc(Style::DEFAULT, BoxKind::Lazy(again))]
    }
}

#[test]
fn expansion_without_progress_faults() {
    let mut env = TestEnv::new();
    let items = (0..1000).map(ItemId).collect();
    let lazy = env.root.tree_mut().alloc(
        Style::DEFAULT,
        BoxKind::Lazy(LazyBox::new(items, Rc::new(RefCell::new(StubbornBuilder)))),
    );
    let root = env.root.root_id();
    env.root.tree_mut().append_child(root, lazy);
    env.layout(200);

    let err = env.root.prepare_to_paint(0..50).expect_err("must fault");
    assert!(matches!(err, Error::NoExpansionProgress { .. }));
}
