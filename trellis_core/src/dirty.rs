// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scene reports per-frame changes through multi-channel dirty tracking
//! (via [`understory_dirty`]). Each channel is an independent category of
//! change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`LAYOUT`] and [`APPEARANCE`] have dependency edges
//!   from child to parent and are marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy). A node's screen-space
//!   geometry and effective alpha are inherited, so marking a node marks its
//!   whole subtree.
//!
//! - **Local-only**: [`CONTENT`] is marked with the default policy. Payload
//!   changes (texture, sprite options) only concern the node itself.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on add/remove/destroy. It
//!   triggers a draw-order rebuild but does not propagate.
//!
//! # Consumption
//!
//! Dirty channels are a change *report*, not the memoization mechanism: the
//! derived geometry lives in per-node [`Cached`](crate::cache::Cached) cells.
//! [`Scene::update`](crate::node::Scene::update) drains all channels into
//! [`FrameChanges`](crate::node::FrameChanges).

use understory_dirty::Channel;

/// Geometry changed: size, placement or transform of the node or an ancestor.
pub const LAYOUT: Channel = Channel::new(0);

/// Colour, alpha, blend mode or hidden flag changed.
pub const APPEARANCE: Channel = Channel::new(1);

/// Node payload changed.
pub const CONTENT: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
