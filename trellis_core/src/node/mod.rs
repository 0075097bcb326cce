// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph data model and layout engine.
//!
//! A *node* is an element of the scene graph. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed. Every operation on a stale handle fails with
//!   [`SceneError::Destroyed`](crate::error::SceneError::Destroyed).
//! - Topology: parent, first-child and sibling links forming an ordered tree.
//!   A node exclusively owns its subtree: [`destroy_node`](Scene::destroy_node)
//!   destroys it whole.
//! - **Inputs** set by the caller: anchor, origin, position, size, the
//!   relative/auto axis selectors, margin, padding, scale, rotation, shear,
//!   depth, appearance, [`Payload`] and an optional [`FillFlow`](crate::flow::FillFlow).
//! - **Derived quantities** resolved on demand and memoized: draw size,
//!   local and screen-space transforms, bounding box and flow positions.
//!
//! # Invalidation
//!
//! Mutations go through the scene's setters, which skip no-op writes and
//! start one invalidation wave per effective write. Size changes travel
//! downward to relatively sized children and upward to auto-sizing or flowing
//! parents; transform changes travel downward through screen-space caches.
//!
//! # Change reporting
//!
//! Alongside the caches, mutations mark the [`dirty`](crate::dirty) channels,
//! which [`update`](Scene::update) drains into [`FrameChanges`].

mod evaluate;
mod id;
mod invalidate;
mod layout;
mod props;
mod store;
mod traverse;

pub use evaluate::FrameChanges;
pub use id::{INVALID, NodeId};
pub use props::{BlendMode, Colour, Payload, SpriteContent};
pub use store::{CacheStats, Scene, SceneConfig};
pub use traverse::Children;
