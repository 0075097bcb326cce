// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame update and change reporting.
//!
//! [`Scene::update`] is the logic thread's per-frame pass:
//!
//! 1. Rebuild the draw order if topology or a depth changed.
//! 2. Resolve every invalid cache of every node reachable from the root,
//!    parents before children.
//! 3. Drain the dirty channels into a [`FrameChanges`] report, together with
//!    the lifecycle lists and any layout warnings raised since the last
//!    update.
//!
//! Like the dirty channels, [`FrameChanges`] uses raw slot indices (`u32`).
//! [`Scene::node_at`] turns one back into a handle.

use core::mem;

use super::id::NodeId;
use super::store::Scene;
use crate::dirty;
use crate::error::LayoutWarning;

/// The set of changes produced by a single [`Scene::update`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Nodes whose geometry (or an ancestor's) changed.
    pub layout: Vec<u32>,
    /// Nodes whose appearance (or an ancestor's inherited appearance)
    /// changed.
    pub appearance: Vec<u32>,
    /// Nodes whose payload changed.
    pub content: Vec<u32>,
    /// Nodes created since the last update.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last update.
    pub removed: Vec<u32>,
    /// Whether the draw order was rebuilt.
    pub topology_changed: bool,
    /// Layout degradations raised since the last update.
    pub warnings: Vec<LayoutWarning>,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.layout.clear();
        self.appearance.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
        self.warnings.clear();
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
            && self.appearance.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
            && self.warnings.is_empty()
    }
}

impl Scene {
    /// Resolves all layout and returns what changed since the last call.
    pub fn update(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.update_into(&mut changes);
        changes
    }

    /// Like [`update`](Self::update), but reuses a caller-provided buffer.
    pub fn update_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        if self.draw_order_dirty {
            self.rebuild_draw_order();
            changes.topology_changed = true;
        }

        for i in 0..self.draw_order.len() {
            let idx = self.draw_order[i];
            self.resolve_screen(idx);
            self.resolve_bounds(idx);
        }

        changes.layout = self
            .dirty
            .drain(dirty::LAYOUT)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.appearance = self
            .dirty
            .drain(dirty::APPEARANCE)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        mem::swap(&mut self.pending_added, &mut changes.added);
        mem::swap(&mut self.pending_removed, &mut changes.removed);
        mem::swap(&mut self.warnings, &mut changes.warnings);
    }

    /// The depth-first draw order from the root, as of the last update.
    #[must_use]
    pub fn draw_order(&self) -> &[u32] {
        &self.draw_order
    }

    /// Returns the handle of the live node in slot `idx`, if any.
    #[must_use]
    pub fn node_at(&self, idx: u32) -> Option<NodeId> {
        let live = self.alive.get(idx as usize).copied().unwrap_or(false);
        live.then(|| self.id_at(idx))
    }
}
