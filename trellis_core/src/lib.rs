// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode scene graph with pull-based layout and a cross-thread
//! draw-snapshot pipeline.
//!
//! `trellis_core` computes, every frame, the size, placement and transform
//! of each node in a tree of drawable nodes, and hands an immutable copy of
//! the result to a render thread that runs on its own cadence.
//!
//! # Architecture
//!
//! ```text
//!   Scheduler::update() ──► tasks mutate the Scene (setters, add/remove)
//!                                   │
//!                                   ▼ invalidation waves
//!   Scene::update() ──► resolve caches ──► FrameChanges (+ LayoutWarnings)
//!                                   │
//!                                   ▼
//!   Scene::draw(&mut SnapshotWriter) ──► publish Frame
//!                                   ┆  (atomic slot index)
//!   ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ┆─ ─ ─ ─ ─ ─ ─ ─ render thread
//!                                   ▼
//!   SnapshotReader::acquire() ──► FrameGuard ──► Vec<DrawNode>
//! ```
//!
//! **[`node`]**: the scene arena with generational handles. Inputs (anchor,
//! origin, size, position, axis selectors, margins, transform components,
//! appearance, payload) are set by the caller; draw sizes and transforms are
//! resolved lazily and memoized.
//!
//! **[`cache`]**: the memoizing [`Cached`](cache::Cached) cell behind every
//! derived quantity.
//!
//! **[`geometry`]** / **[`transform`]**: anchors, axes, margins and quads,
//! and the composition of transform components into a `kurbo::Affine`.
//!
//! **[`flow`]**: fill-flow arrangement of a container's children.
//!
//! **[`dirty`]**: multi-channel change reporting via `understory_dirty`.
//!
//! **[`draw`]**: draw records and the triple-slot snapshot channel.
//!
//! **[`scheduler`]** / **[`time`]**: deferred and repeating logic-thread
//! work on a virtual clock.
//!
//! **[`resource`]**: the explicit, holder-counted resource registry.
//!
//! **[`error`]**: [`SceneError`](error::SceneError) for rejected operations
//! and [`LayoutWarning`](error::LayoutWarning) for degraded layout.
//!
//! # Threading
//!
//! Everything except the [`draw::SnapshotReader`] belongs to the logic
//! thread. The reader is `Send` and may be cloned into any number of render
//! threads.

pub mod cache;
pub mod dirty;
pub mod draw;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod node;
pub mod resource;
pub mod scheduler;
pub mod time;
pub mod transform;
