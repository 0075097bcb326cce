// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-node snapshots and their hand-off to the render thread.
//!
//! [`Scene::draw`](crate::node::Scene::draw) copies the resolved state of
//! every visible node into a [`Frame`] of [`DrawNode`]s and publishes it
//! through a [`SnapshotWriter`]. The render thread acquires the latest
//! complete frame through a [`SnapshotReader`]; see [`snapshot`] for the
//! protocol.

mod node;
mod pass;
pub mod snapshot;

pub use node::{DrawNode, DrawPayload, Frame};
pub use snapshot::{FrameGuard, FrameWriter, SnapshotReader, SnapshotWriter, snapshot_channel};
