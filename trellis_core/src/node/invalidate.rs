// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation waves.
//!
//! Every mutating write starts one wave. A wave flows from the field that
//! changed to every cache that reads it:
//!
//! - **Placement** (anchor, origin, position, scale, rotation, shear,
//!   margin): the node's local transform and bounding box, plus the
//!   screen-space transforms of its whole subtree.
//! - **Size**: the node's draw size on the changed axes, then *downward* to
//!   children (relative sizes on those axes, and every child's placement,
//!   since anchors resolve against the parent), then *upward* to the parent
//!   when the parent auto-sizes or arranges its children in a flow.
//! - **Content** (children added, removed, hidden or resized): the node's
//!   flow positions and, if it auto-sizes, its size.
//!
//! Each node's size and content are visited at most once per wave, so a
//! sibling cycle through a shared auto-sized parent terminates and every cell
//! makes at most one valid-to-invalid transition per write.

use understory_dirty::EagerPolicy;

use super::id::INVALID;
use super::store::Scene;
use crate::dirty;
use crate::geometry::{Axes, Axis};

impl Scene {
    /// A placement input of `idx` changed.
    pub(crate) fn transform_changed(&mut self, idx: u32) {
        self.begin_wave();
        self.invalidate_placement(idx);
        self.notify_parent(idx);
    }

    /// The size of `idx` may have changed on `axes`.
    pub(crate) fn size_changed(&mut self, idx: u32, axes: Axes) {
        self.begin_wave();
        self.size_wave(idx, axes);
    }

    /// The set of children of `idx` that contribute to its layout changed.
    pub(crate) fn content_changed(&mut self, idx: u32) {
        self.begin_wave();
        self.content_wave(idx);
    }

    /// The fill flow of `idx` was set, changed or removed.
    pub(crate) fn flow_changed(&mut self, idx: u32) {
        self.begin_wave();
        // Children switch between flow and anchor placement.
        for child in self.child_indices(idx) {
            self.invalidate_placement(child);
        }
        self.content_wave(idx);
    }

    /// `idx` was attached to or detached from a parent.
    pub(crate) fn reparented(&mut self, idx: u32) {
        self.begin_wave();
        let relative = self.props[idx as usize].relative_size_axes;
        if relative.is_empty() {
            self.invalidate_placement(idx);
            self.notify_parent(idx);
        } else {
            self.size_wave(idx, relative);
        }
    }

    fn begin_wave(&mut self) {
        self.wave += 1;
    }

    fn invalidate_placement(&mut self, idx: u32) {
        let caches = &mut self.caches[idx as usize];
        caches.local.invalidate();
        caches.bounds.invalidate();
        self.invalidate_screen_subtree(idx);
        self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
    }

    /// Invalidates screen-space transforms of `idx` and its descendants.
    ///
    /// A valid screen-space transform implies valid ancestors, so the walk
    /// stops below any descendant that is already invalid.
    fn invalidate_screen_subtree(&mut self, idx: u32) {
        self.caches[idx as usize].screen.invalidate();
        let mut stack = self.child_indices(idx);
        while let Some(node) = stack.pop() {
            if self.caches[node as usize].screen.invalidate() {
                stack.extend(self.child_indices(node));
            }
        }
    }

    /// Propagates a layout change of `idx` to a parent that depends on its
    /// children.
    fn notify_parent(&mut self, idx: u32) {
        let parent = self.parent[idx as usize];
        if parent == INVALID {
            return;
        }
        let props = &self.props[parent as usize];
        if !props.auto_size_axes.is_empty() || props.fill_flow.is_some() {
            self.content_wave(parent);
        }
    }

    fn size_wave(&mut self, idx: u32, axes: Axes) {
        let wave = self.wave;
        let caches = &mut self.caches[idx as usize];
        if caches.size_wave == wave {
            if axes.intersection(caches.size_wave_axes) == axes {
                return;
            }
            caches.size_wave_axes = caches.size_wave_axes | axes;
        } else {
            caches.size_wave = wave;
            caches.size_wave_axes = axes;
        }

        for axis in Axis::ALL {
            if axes.contains(axis) {
                caches.size[axis.index()].invalidate();
            }
        }
        // Wrapping depends on the container's own width.
        caches.flow.invalidate();
        // The origin point depends on the size.
        self.invalidate_placement(idx);

        for child in self.child_indices(idx) {
            let relative = self.props[child as usize]
                .relative_size_axes
                .intersection(axes);
            if relative.is_empty() {
                self.invalidate_placement(child);
            } else {
                self.size_wave(child, relative);
            }
        }

        self.notify_parent(idx);
    }

    fn content_wave(&mut self, idx: u32) {
        let wave = self.wave;
        let caches = &mut self.caches[idx as usize];
        if caches.content_wave == wave {
            return;
        }
        caches.content_wave = wave;
        caches.flow.invalidate();

        if self.props[idx as usize].fill_flow.is_some() {
            for child in self.child_indices(idx) {
                self.invalidate_placement(child);
            }
        }
        let auto = self.props[idx as usize].auto_size_axes;
        if !auto.is_empty() {
            self.size_wave(idx, auto);
        }
    }
}
