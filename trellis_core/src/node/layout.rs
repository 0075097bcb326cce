// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pull-based layout resolution.
//!
//! Derived quantities are resolved on demand and memoized in the node's
//! [`Cached`](crate::cache::Cached) cells. A relatively sized node pulls its
//! parent's size; an auto-sized node pulls its children's sizes and
//! placements. Each size axis carries a re-entrancy flag while it is being
//! resolved: asking for it again means the configuration is cyclic, and the
//! inner request is answered with the axis' last-known-good value (zero if it
//! was never resolved) plus a [`LayoutWarning::DependencyCycle`].
//!
//! Recursion is additionally bounded by
//! [`SceneConfig::max_resolve_depth`](super::SceneConfig::max_resolve_depth).
//! Hitting the bound is not a property of the configuration but of where the
//! pull started, so anything resolved on top of a depth-degraded value is
//! returned without being cached; a later pull from a shallower start (such
//! as the top-down [`update`](Scene::update) pass) resolves it properly.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use tracing::warn;

use super::id::{INVALID, NodeId};
use super::store::Scene;
use crate::error::{LayoutWarning, SceneError};
use crate::geometry::{Axis, Quad};
use crate::transform::TransformParts;

impl Scene {
    // -- Public getters --

    /// The node's resolved draw size.
    pub fn draw_size(&mut self, id: NodeId) -> Result<Size, SceneError> {
        let idx = self.index(id)?;
        Ok(self.resolve_draw_size(idx, 0).to_size())
    }

    /// The node's draw size plus its margin.
    pub fn layout_size(&mut self, id: NodeId) -> Result<Size, SceneError> {
        let idx = self.index(id)?;
        let size = self.resolve_draw_size(idx, 0) + self.props[idx as usize].margin.total();
        Ok(size.to_size())
    }

    /// The size of the space the node's children are laid out in: the draw
    /// size minus padding.
    pub fn child_size(&mut self, id: NodeId) -> Result<Size, SceneError> {
        let idx = self.index(id)?;
        Ok(Size::new(
            self.child_extent(idx, Axis::X, 0),
            self.child_extent(idx, Axis::Y, 0),
        ))
    }

    /// Transform from the node's draw space to its parent's child space.
    pub fn local_transform(&mut self, id: NodeId) -> Result<Affine, SceneError> {
        let idx = self.index(id)?;
        Ok(self.resolve_local(idx, 0))
    }

    /// Transform from the node's draw space to screen space.
    pub fn screen_space_transform(&mut self, id: NodeId) -> Result<Affine, SceneError> {
        let idx = self.index(id)?;
        Ok(self.resolve_screen(idx))
    }

    /// Axis-aligned bounds of the node's draw box in its parent's child
    /// space.
    pub fn bounding_box(&mut self, id: NodeId) -> Result<Rect, SceneError> {
        let idx = self.index(id)?;
        Ok(self.resolve_bounds(idx))
    }

    /// The node's draw box in screen space.
    pub fn screen_space_quad(&mut self, id: NodeId) -> Result<Quad, SceneError> {
        let idx = self.index(id)?;
        Ok(self.screen_quad(idx))
    }

    // -- Resolver --

    pub(crate) fn screen_quad(&mut self, idx: u32) -> Quad {
        let size = self.resolve_draw_size(idx, 0);
        let screen = self.resolve_screen(idx);
        Quad::from_rect(Rect::from_origin_size(Point::ZERO, size.to_size()), screen)
    }

    pub(crate) fn resolve_draw_size(&mut self, idx: u32, depth: u32) -> Vec2 {
        Vec2::new(
            self.resolve_size(idx, Axis::X, depth),
            self.resolve_size(idx, Axis::Y, depth),
        )
    }

    pub(crate) fn resolve_size(&mut self, idx: u32, axis: Axis, depth: u32) -> f64 {
        let a = axis.index();
        let caches = &self.caches[idx as usize];
        if let Some(&value) = caches.size[a].get() {
            return value;
        }
        if caches.resolving[a] {
            let last = *caches.size[a].last_known();
            self.report(LayoutWarning::DependencyCycle {
                node: self.id_at(idx),
                axis,
            });
            return last;
        }
        if depth > self.config.max_resolve_depth {
            let last = *caches.size[a].last_known();
            self.depth_exceeded += 1;
            self.report(LayoutWarning::DepthExceeded {
                node: self.id_at(idx),
                axis,
            });
            return last;
        }

        let degraded = self.depth_exceeded;
        self.caches[idx as usize].resolving[a] = true;
        let props = &self.props[idx as usize];
        let value = if props.auto_size_axes.contains(axis) {
            let padding = axis.of(props.padding.total());
            self.auto_extent(idx, axis, depth + 1) + padding
        } else if props.relative_size_axes.contains(axis) {
            let fraction = axis.of(props.size);
            fraction * self.parent_extent(idx, axis, depth + 1)
        } else {
            axis.of(props.size)
        };
        let caches = &mut self.caches[idx as usize];
        caches.resolving[a] = false;
        if self.depth_exceeded != degraded {
            return value;
        }
        *caches.size[a].set(value)
    }

    /// Size of `idx`'s child space on `axis`.
    fn child_extent(&mut self, idx: u32, axis: Axis, depth: u32) -> f64 {
        let padding = axis.of(self.props[idx as usize].padding.total());
        (self.resolve_size(idx, axis, depth) - padding).max(0.0)
    }

    /// Size of the space `idx` is laid out in. The root fills the viewport;
    /// detached nodes see an empty space.
    fn parent_extent(&mut self, idx: u32, axis: Axis, depth: u32) -> f64 {
        let parent = self.parent[idx as usize];
        if parent != INVALID {
            self.child_extent(parent, axis, depth)
        } else if idx == self.root {
            axis.of(self.config.viewport.to_vec2())
        } else {
            0.0
        }
    }

    /// Resolved position of `idx` on `axis`, relative to its anchor point.
    fn resolved_position(&mut self, idx: u32, axis: Axis, depth: u32) -> f64 {
        let props = &self.props[idx as usize];
        let position = axis.of(props.position);
        if props.relative_position_axes.contains(axis) {
            position * self.parent_extent(idx, axis, depth)
        } else {
            position
        }
    }

    /// Transform parts of `idx` with the given placement.
    fn transform_parts(&mut self, idx: u32, placement: Vec2, depth: u32) -> TransformParts {
        let size = self.resolve_draw_size(idx, depth);
        let props = &self.props[idx as usize];
        TransformParts {
            placement,
            origin: props.origin.resolve(size + props.margin.total()),
            margin: props.margin.top_left(),
            scale: props.scale,
            shear: props.shear,
            rotation: props.rotation,
        }
    }

    pub(crate) fn resolve_local(&mut self, idx: u32, depth: u32) -> Affine {
        if let Some(&local) = self.caches[idx as usize].local.get() {
            return local;
        }
        let degraded = self.depth_exceeded;

        let parent = self.parent[idx as usize];
        let in_flow = parent != INVALID && self.props[parent as usize].fill_flow.is_some();
        let parts = if in_flow {
            self.ensure_flow(parent, depth + 1);
            let mut parts = self.transform_parts(idx, Vec2::ZERO, depth + 1);
            // Put the scaled layout box's top-left on the flow position.
            let scaled_origin = Vec2::new(parts.origin.x * parts.scale.x, parts.origin.y * parts.scale.y);
            parts.placement = self.caches[idx as usize].flow_offset + scaled_origin;
            parts
        } else {
            let fraction = self.props[idx as usize].anchor.fraction();
            let mut placement = Vec2::ZERO;
            for axis in Axis::ALL {
                let mut value = self.resolved_position(idx, axis, depth + 1);
                if axis.of(fraction) != 0.0 {
                    value += axis.of(fraction) * self.parent_extent(idx, axis, depth + 1);
                }
                placement = axis.with(placement, value);
            }
            self.transform_parts(idx, placement, depth + 1)
        };

        let local = parts.to_affine();
        if self.depth_exceeded != degraded {
            return local;
        }
        *self.caches[idx as usize].local.set(local)
    }

    pub(crate) fn resolve_screen(&mut self, idx: u32) -> Affine {
        if let Some(&screen) = self.caches[idx as usize].screen.get() {
            return screen;
        }
        let degraded = self.depth_exceeded;
        let local = self.resolve_local(idx, 0);
        let parent = self.parent[idx as usize];
        let screen = if parent == INVALID {
            local
        } else {
            let padding = self.props[parent as usize].padding.top_left();
            self.resolve_screen(parent) * Affine::translate(padding) * local
        };
        if self.depth_exceeded != degraded {
            return screen;
        }
        *self.caches[idx as usize].screen.set(screen)
    }

    pub(crate) fn resolve_bounds(&mut self, idx: u32) -> Rect {
        if let Some(&bounds) = self.caches[idx as usize].bounds.get() {
            return bounds;
        }
        let degraded = self.depth_exceeded;
        let size = self.resolve_draw_size(idx, 0);
        let local = self.resolve_local(idx, 0);
        let bounds = local.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, size.to_size()));
        if self.depth_exceeded != degraded {
            return bounds;
        }
        *self.caches[idx as usize].bounds.set(bounds)
    }

    /// Extent `idx` needs on `axis` to contain its visible children, without
    /// padding.
    fn auto_extent(&mut self, idx: u32, axis: Axis, depth: u32) -> f64 {
        let in_flow = self.props[idx as usize].fill_flow.is_some();
        if in_flow {
            self.ensure_flow(idx, depth);
        }

        let mut required = 0.0_f64;
        for child in self.child_indices(idx) {
            if self.props[child as usize].hidden {
                continue;
            }
            let needed = if in_flow {
                let extent = self.flow_extent(child, depth);
                axis.of(self.caches[child as usize].flow_offset) + axis.of(extent)
            } else {
                self.anchored_requirement(child, axis, depth)
            };
            required = required.max(needed);
        }
        required
    }

    /// Parent extent on `axis` needed to contain the layout box of an
    /// anchor-placed `child`.
    fn anchored_requirement(&mut self, child: u32, axis: Axis, depth: u32) -> f64 {
        let position = self.resolved_position(child, axis, depth);
        let parts = self.transform_parts(child, axis.with(Vec2::ZERO, position), depth);
        let size = self.resolve_draw_size(child, depth);
        let props = &self.props[child as usize];
        let margin = props.margin;
        let anchor = axis.of(props.anchor.fraction());

        // Layout box in draw space: the draw box grown by the margin.
        let layout = Rect::new(
            -margin.left,
            -margin.top,
            size.x + margin.right,
            size.y + margin.bottom,
        );
        let occupied = parts.to_affine().transform_rect_bbox(layout);
        let (lo, hi) = match axis {
            Axis::X => (occupied.x0, occupied.x1),
            Axis::Y => (occupied.y0, occupied.y1),
        };

        let mut needed = 0.0_f64;
        if anchor < 1.0 {
            needed = needed.max(hi / (1.0 - anchor));
        }
        if anchor > 0.0 {
            needed = needed.max(-lo / anchor);
        }
        needed
    }

    /// Scaled layout-box extent of a flow child.
    fn flow_extent(&mut self, child: u32, depth: u32) -> Vec2 {
        let size = self.resolve_draw_size(child, depth);
        let props = &self.props[child as usize];
        let layout = size + props.margin.total();
        Vec2::new(layout.x * props.scale.x.abs(), layout.y * props.scale.y.abs())
    }

    /// Recomputes the flow positions of `idx`'s children if they are stale.
    fn ensure_flow(&mut self, idx: u32, depth: u32) {
        if self.caches[idx as usize].flow.is_valid() {
            return;
        }
        let Some(flow) = self.props[idx as usize].fill_flow else {
            return;
        };
        let degraded = self.depth_exceeded;

        let children: Vec<u32> = self
            .child_indices(idx)
            .into_iter()
            .filter(|&child| !self.props[child as usize].hidden)
            .collect();
        let extents: Vec<Vec2> = children
            .iter()
            .map(|&child| self.flow_extent(child, depth + 1))
            .collect();
        let anchors: Vec<Vec2> = children
            .iter()
            .map(|&child| self.props[child as usize].anchor.fraction())
            .collect();
        // Auto-sized axes are derived from the flow, so they cannot bound it.
        let auto = self.props[idx as usize].auto_size_axes;
        let mut area = Vec2::new(f64::INFINITY, f64::INFINITY);
        for axis in Axis::ALL {
            if !auto.contains(axis) {
                area = axis.with(area, self.child_extent(idx, axis, depth + 1));
            }
        }

        let positions = flow.arrange_aligned(&extents, &anchors, area);
        for (&child, position) in children.iter().zip(positions) {
            self.caches[child as usize].flow_offset = position;
        }
        if self.depth_exceeded == degraded {
            self.caches[idx as usize].flow.set(());
        }
    }

    fn report(&mut self, warning: LayoutWarning) {
        warn!(?warning, "layout degraded to last-known-good value");
        self.warnings.push(warning);
    }
}
