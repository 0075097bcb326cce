// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable per-frame draw records.

use kurbo::{Affine, Size, Vec2};

use crate::geometry::Quad;
use crate::node::{BlendMode, Colour, NodeId};
use crate::resource::ResourceKey;

/// Node-kind-specific part of a [`DrawNode`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawPayload {
    /// A container; draws nothing itself.
    Group,
    /// A solid box in the node's colour.
    Box,
    /// A sprite.
    Sprite {
        /// Texture to sample, if any.
        texture: Option<ResourceKey>,
        /// Repeat rather than stretch the texture.
        wrap_texture: bool,
        /// Corner rounding radius.
        radius: f32,
        /// Node size times scale.
        size: Vec2,
        /// Whether the quad is axis-aligned with (near-)integral extents and
        /// can be snapped to the pixel grid.
        pixel_snap: bool,
    },
}

/// Everything the render thread needs to draw one node.
///
/// All fields are plain values copied out of the scene during the draw
/// pass; nothing refers back into logic-thread state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawNode {
    /// The node this record was produced from.
    pub node: NodeId,
    /// Draw space to screen space.
    pub transform: Affine,
    /// The draw box in screen space.
    pub quad: Quad,
    /// The resolved draw size.
    pub draw_size: Size,
    /// Colour with the effective (inherited) alpha applied.
    pub colour: Colour,
    /// Blend mode.
    pub blend: BlendMode,
    /// Node-kind-specific data.
    pub payload: DrawPayload,
}

/// One published frame: the draw records of all visible nodes in draw order.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Monotonic frame number assigned by the writer.
    pub sequence: u64,
    /// Viewport size the frame was laid out for.
    pub viewport: Size,
    /// Visible nodes, back to front.
    pub nodes: Vec<DrawNode>,
    /// Set when the writer finished filling the slot.
    pub(crate) complete: bool,
}

impl Frame {
    pub(crate) fn reset(&mut self, sequence: u64) {
        self.sequence = sequence;
        self.viewport = Size::ZERO;
        self.nodes.clear();
        self.complete = false;
    }
}
