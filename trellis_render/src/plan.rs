// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use kurbo::{Affine, Size};
use trellis_core::draw::{DrawNode, DrawPayload, Frame};
use trellis_core::geometry::Quad;
use trellis_core::node::{BlendMode, Colour, NodeId};
use trellis_core::resource::ResourceKey;

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the frame's draw
/// order. Container nodes produce no item.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The node this item originates from.
    pub node: NodeId,
    /// Draw-space to screen-space transform as `[a, b, c, d, e, f]`
    /// (`kurbo::Affine` coefficient order).
    pub transform: [f32; 6],
    /// Screen-space quad of the draw box.
    pub quad: Quad,
    /// Colour with effective alpha applied.
    pub colour: Colour,
    /// Blend mode.
    pub blend: BlendMode,
    /// Texture to sample (`None` draws a solid fill).
    pub texture: Option<ResourceKey>,
    /// Repeat the texture instead of stretching it.
    pub wrap_texture: bool,
    /// Corner rounding radius.
    pub radius: f32,
    /// Whether the quad may be snapped to the pixel grid.
    pub pixel_snap: bool,
}

impl RenderItem {
    /// Builds the item for a draw record, or `None` for a container.
    #[must_use]
    pub fn from_draw_node(node: &DrawNode) -> Option<Self> {
        let (texture, wrap_texture, radius, pixel_snap) = match node.payload {
            DrawPayload::Group => return None,
            DrawPayload::Box => (None, false, 0.0, false),
            DrawPayload::Sprite {
                texture,
                wrap_texture,
                radius,
                pixel_snap,
                ..
            } => (texture, wrap_texture, radius, pixel_snap),
        };
        Some(Self {
            node: node.node,
            transform: affine_to_f32(node.transform),
            quad: node.quad,
            colour: node.colour,
            blend: node.blend,
            texture,
            wrap_texture,
            radius,
            pixel_snap,
        })
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "GPU-facing transforms are single precision"
)]
fn affine_to_f32(affine: Affine) -> [f32; 6] {
    affine.as_coeffs().map(|c| c as f32)
}

/// An ordered list of draw commands for a single frame.
///
/// Backends translate this into GPU draw calls or native compositor
/// operations depending on their rendering strategy.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Sequence number of the frame the plan was built from.
    pub sequence: u64,
    /// Viewport size of that frame.
    pub viewport: Size,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Builds a plan from a published frame.
    #[must_use]
    pub fn from_frame(frame: &Frame) -> Self {
        let mut plan = Self::default();
        plan.fill_from(frame);
        plan
    }

    /// Rebuilds the plan in place from a published frame, reusing its
    /// allocation.
    pub fn fill_from(&mut self, frame: &Frame) {
        self.sequence = frame.sequence;
        self.viewport = frame.viewport;
        self.items.clear();
        self.items
            .extend(frame.nodes.iter().filter_map(RenderItem::from_draw_node));
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
