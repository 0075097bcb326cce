// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::Scene;

/// An iterator over the direct children of a node, in insertion order.
///
/// Created by [`Scene::children`].
#[derive(Debug)]
pub struct Children<'a> {
    scene: &'a Scene,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(scene: &'a Scene, first: u32) -> Self {
        Self {
            scene,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.scene.next_sibling[idx as usize];
        Some(self.scene.id_at(idx))
    }
}

impl Scene {
    /// Raw slot indices of the children of `idx`, in insertion order.
    pub(crate) fn child_indices(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            out.push(child);
            child = self.next_sibling[child as usize];
        }
        out
    }

    /// Children of `idx` in draw order: higher depth first, ties in
    /// insertion order.
    pub(crate) fn children_in_draw_order(&self, idx: u32) -> Vec<u32> {
        let mut out = self.child_indices(idx);
        out.sort_by(|&a, &b| {
            self.props[b as usize]
                .depth
                .total_cmp(&self.props[a as usize].depth)
        });
        out
    }

    /// Rebuilds the depth-first pre-order draw order from the root.
    pub(crate) fn rebuild_draw_order(&mut self) {
        let mut order = Vec::with_capacity(self.draw_order.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            // Push in reverse so the first child in draw order pops first.
            stack.extend(self.children_in_draw_order(idx).into_iter().rev());
        }
        self.draw_order = order;
        self.draw_order_dirty = false;
    }

    /// Returns whether `ancestor` is `idx` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: u32, idx: u32) -> bool {
        let mut current = idx;
        while current != INVALID {
            if current == ancestor {
                return true;
            }
            current = self.parent[current as usize];
        }
        false
    }
}
