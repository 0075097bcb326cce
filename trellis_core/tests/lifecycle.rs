// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node destruction, stale handles and resource disposal.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kurbo::{Size, Vec2};
use trellis_core::error::SceneError;
use trellis_core::node::{Payload, Scene, SceneConfig};
use trellis_core::resource::ResourceRegistry;

fn counting_registry() -> (Arc<ResourceRegistry>, Arc<AtomicUsize>) {
    let disposed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&disposed);
    let registry = ResourceRegistry::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (Arc::new(registry), disposed)
}

#[test]
fn destroyed_handles_are_rejected() {
    let mut scene = Scene::new(
        SceneConfig::new(Size::new(100.0, 100.0)),
        Arc::new(ResourceRegistry::default()),
    );
    let root = scene.root();
    let parent = scene.create_node();
    let child = scene.create_node();
    scene.add_child(root, parent).unwrap();
    scene.add_child(parent, child).unwrap();
    scene.destroy_node(parent).unwrap();

    for id in [parent, child] {
        assert!(!scene.is_alive(id), "subtree is gone");
        assert_eq!(scene.draw_size(id), Err(SceneError::Destroyed(id)), "read");
        assert_eq!(scene.screen_space_transform(id), Err(SceneError::Destroyed(id)), "transform");
        assert_eq!(scene.set_position(id, Vec2::ZERO), Err(SceneError::Destroyed(id)), "write");
        assert_eq!(scene.destroy_node(id), Err(SceneError::Destroyed(id)), "double destroy");
    }

    // A recycled slot hands out a new generation.
    let fresh = scene.create_node();
    assert!(scene.is_alive(fresh), "new node is live");
    assert_ne!(fresh, parent, "stale handle does not alias the new node");
    assert!(scene.draw_size(parent).is_err(), "stale handle still rejected");
    assert_eq!(scene.destroy_node(root), Err(SceneError::RootNode), "root is permanent");
}

#[test]
fn shared_texture_is_disposed_after_last_holder() {
    let (registry, disposed) = counting_registry();
    let key = registry.register(Size::new(32.0, 16.0));
    let mut scene = Scene::new(SceneConfig::new(Size::new(100.0, 100.0)), Arc::clone(&registry));
    let root = scene.root();

    let a = scene.create_node();
    let b = scene.create_node();
    for node in [a, b] {
        scene.set_texture(node, Some(key)).unwrap();
        scene.add_child(root, node).unwrap();
    }
    assert_eq!(scene.draw_size(a).unwrap(), Size::new(32.0, 16.0), "sized to the texture");

    scene.destroy_node(a).unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 0, "b still holds it");
    scene.destroy_node(b).unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 1, "last holder gone");

    drop(scene);
    assert_eq!(registry.shutdown(), 0, "nothing left to dispose");
    assert_eq!(disposed.load(Ordering::SeqCst), 1, "disposed exactly once");
}

#[test]
fn replaced_and_dropped_textures_are_released() {
    let (registry, disposed) = counting_registry();
    let first = registry.register(Size::new(8.0, 8.0));
    let second = registry.register(Size::new(16.0, 16.0));
    let mut scene = Scene::new(SceneConfig::new(Size::new(100.0, 100.0)), Arc::clone(&registry));

    let sprite = scene.create_node();
    scene.set_texture(sprite, Some(first)).unwrap();
    scene.set_texture(sprite, Some(second)).unwrap();
    assert!(!registry.is_live(first), "replaced texture released");
    assert_eq!(disposed.load(Ordering::SeqCst), 1, "first disposed");

    // Switching payload kind releases the texture too.
    let other = scene.create_node();
    scene.set_texture(other, Some(second)).unwrap();
    scene.set_payload(other, Payload::Box).unwrap();
    assert!(registry.is_live(second), "sprite still holds it");

    drop(scene);
    assert!(!registry.is_live(second), "dropping the scene releases live sprites");
    assert_eq!(disposed.load(Ordering::SeqCst), 2, "each resource disposed once");
}
