// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use std::collections::{HashMap, HashSet};

use kurbo::Rect;
use trellis_core::draw::DrawNode;
use trellis_core::node::NodeId;

/// A region of the output that needs re-rendering.
///
/// Backends can use this to minimize GPU work by only redrawing areas
/// that changed since the last frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// A list of screen-space rectangles that need redrawing.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Above this many damage rectangles the whole output is redrawn.
    pub const MAX_RECTS: usize = 64;

    /// Computes the damage between two consecutive frames' records.
    ///
    /// A record counts as changed when it is new, gone, or differs in any
    /// field. Each changed record damages its old and new screen bounds;
    /// a change in draw order damages the bounds of every record involved.
    #[must_use]
    pub fn between(previous: &[DrawNode], current: &[DrawNode]) -> Self {
        let before: HashMap<NodeId, (usize, &DrawNode)> = previous
            .iter()
            .enumerate()
            .map(|(order, node)| (node.node, (order, node)))
            .collect();

        let mut rects = Vec::new();
        let mut seen = 0;
        let mut last_order = None;
        for node in current {
            match before.get(&node.node) {
                Some(&(order, old)) => {
                    seen += 1;
                    let reordered = last_order.is_some_and(|last| order < last);
                    last_order = Some(order);
                    if old != node || reordered {
                        rects.push(old.quad.bounding_box());
                        rects.push(node.quad.bounding_box());
                    }
                }
                None => rects.push(node.quad.bounding_box()),
            }
        }
        if seen < previous.len() {
            let current_ids: HashSet<NodeId> = current.iter().map(|node| node.node).collect();
            rects.extend(
                previous
                    .iter()
                    .filter(|node| !current_ids.contains(&node.node))
                    .map(|node| node.quad.bounding_box()),
            );
        }

        rects.retain(|rect| rect.area() > 0.0);
        if rects.is_empty() {
            Self::None
        } else if rects.len() > Self::MAX_RECTS {
            Self::Full
        } else {
            Self::Rects(rects)
        }
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Smallest rectangle covering all damage, or `None` for no damage or
    /// full damage.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = if merged.len() > Self::MAX_RECTS {
                    Self::Full
                } else {
                    Self::Rects(merged)
                };
            }
        }
    }
}
