// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scheduler driving incremental scene changes.

use std::cell::{Cell, OnceCell};
use std::rc::Rc;
use std::sync::Arc;

use kurbo::{Size, Vec2};
use trellis_core::flow::{FillDirection, FillFlow};
use trellis_core::geometry::Axes;
use trellis_core::node::{Scene, SceneConfig};
use trellis_core::resource::ResourceRegistry;
use trellis_core::scheduler::{ScheduledTask, Scheduler};
use trellis_core::time::{ClockTime, Duration};

#[test]
fn repeating_task_grows_flow_list_until_cancelled() {
    let mut scene = Scene::new(
        SceneConfig::new(Size::new(800.0, 600.0)),
        Arc::new(ResourceRegistry::default()),
    );
    let root = scene.root();
    let list = scene.create_node();
    scene.set_auto_size_axes(list, Axes::Both).unwrap();
    scene
        .set_fill_flow(
            list,
            Some(FillFlow::new(FillDirection::Horizontal).with_spacing(Vec2::new(2.0, 0.0))),
        )
        .unwrap();
    scene.add_child(root, list).unwrap();

    let mut scheduler: Scheduler<Scene> = Scheduler::default();
    let added = Rc::new(Cell::new(0_u32));
    let faded = Rc::new(Cell::new(0_u32));
    let token = Rc::new(OnceCell::<ScheduledTask>::new());

    let handle = scheduler.schedule_repeating(Duration::from_millis(100), Duration::from_millis(100), {
        let added = Rc::clone(&added);
        let faded = Rc::clone(&faded);
        let token = Rc::clone(&token);
        move |scene: &mut Scene, scheduler: &mut Scheduler<Scene>| {
            let item = scene.create_node();
            scene.set_size(item, Vec2::new(10.0, 20.0)).unwrap();
            scene.add_child(list, item).unwrap();
            added.set(added.get() + 1);

            // Follow-up work runs on a later update, never inline.
            let faded = Rc::clone(&faded);
            scheduler.add(move |scene: &mut Scene, _: &mut Scheduler<Scene>| {
                scene.set_alpha(item, 0.5).unwrap();
                faded.set(faded.get() + 1);
            });

            if added.get() == 3 {
                if let Some(token) = token.get() {
                    token.cancel();
                }
            }
        }
    });
    assert!(token.set(handle.clone()).is_ok(), "token is set once");

    let mut widths = Vec::new();
    for step in 0..10 {
        scheduler.update(ClockTime::from_millis(step * 50), &mut scene);
        let _ = scene.update();
        assert!(faded.get() + 1 >= added.get(), "at most one fade pending");
        widths.push(scene.draw_size(list).unwrap().width);
    }

    assert_eq!(added.get(), 3, "cancelled from inside its third run");
    assert_eq!(faded.get(), 3, "every follow-up ran");
    assert!(handle.is_cancelled(), "handle observes the cancellation");
    assert_eq!(
        widths,
        [0.0, 0.0, 10.0, 10.0, 22.0, 22.0, 34.0, 34.0, 34.0, 34.0],
        "list grows by one item plus spacing per run"
    );
    assert_eq!(scene.draw_size(list).unwrap().height, 20.0, "one row");
    assert_eq!(scheduler.pending(), 0, "cancelled task was swept");
}
