// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node inputs and derived caches.

use kurbo::{Affine, Rect, Vec2};

use crate::cache::Cached;
use crate::flow::FillFlow;
use crate::geometry::{Anchor, Axes, MarginPadding};
use crate::resource::ResourceKey;

/// Straight (non-premultiplied) RGBA colour with `f32` channels in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Colour {
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Builds a colour from its four channels.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the colour with its alpha multiplied by `alpha`.
    #[must_use]
    pub fn multiply_alpha(self, alpha: f32) -> Self {
        Self {
            a: self.a * alpha,
            ..self
        }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How a node's pixels combine with what is already drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    #[default]
    Alpha,
    /// Source is added to the destination.
    Additive,
    /// Source multiplies the destination.
    Multiply,
}

/// Options of a textured sprite node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpriteContent {
    /// The texture to draw, if any. Without one the sprite draws as a
    /// coloured box.
    pub texture: Option<ResourceKey>,
    /// Repeat the texture instead of stretching it over the draw box.
    pub wrap_texture: bool,
    /// Corner rounding radius in local units.
    pub radius: f32,
}

/// What a node draws.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Payload {
    /// Draws nothing itself; only groups children.
    #[default]
    Container,
    /// A solid box filled with the node's colour.
    Box,
    /// A (possibly textured) sprite.
    Sprite(SpriteContent),
}

impl Payload {
    /// The texture held by this payload, if any.
    #[must_use]
    pub const fn texture(&self) -> Option<ResourceKey> {
        match self {
            Self::Sprite(sprite) => sprite.texture,
            Self::Container | Self::Box => None,
        }
    }
}

/// Geometry and appearance inputs of a node, set through the scene's
/// mutation operations.
#[derive(Clone, Debug)]
pub(crate) struct NodeProps {
    pub(crate) anchor: Anchor,
    pub(crate) origin: Anchor,
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) relative_size_axes: Axes,
    pub(crate) relative_position_axes: Axes,
    pub(crate) auto_size_axes: Axes,
    pub(crate) margin: MarginPadding,
    pub(crate) padding: MarginPadding,
    pub(crate) scale: Vec2,
    pub(crate) shear: Vec2,
    pub(crate) rotation: f64,
    pub(crate) depth: f32,
    pub(crate) colour: Colour,
    pub(crate) alpha: f32,
    pub(crate) blend: BlendMode,
    pub(crate) hidden: bool,
    pub(crate) payload: Payload,
    pub(crate) fill_flow: Option<FillFlow>,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            anchor: Anchor::TopLeft,
            origin: Anchor::TopLeft,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            relative_size_axes: Axes::None,
            relative_position_axes: Axes::None,
            auto_size_axes: Axes::None,
            margin: MarginPadding::ZERO,
            padding: MarginPadding::ZERO,
            scale: Vec2::new(1.0, 1.0),
            shear: Vec2::ZERO,
            rotation: 0.0,
            depth: 0.0,
            colour: Colour::WHITE,
            alpha: 1.0,
            blend: BlendMode::Alpha,
            hidden: false,
            payload: Payload::Container,
            fill_flow: None,
        }
    }
}

/// Derived quantities of a node.
///
/// Every cell is invalidated by the mutation that changes one of its inputs
/// and recomputed lazily by the resolver.
#[derive(Clone, Debug)]
pub(crate) struct NodeCaches {
    /// Resolved draw size per axis.
    pub(crate) size: [Cached<f64>; 2],
    /// Per-axis re-entrancy guard for the resolver.
    pub(crate) resolving: [bool; 2],
    /// Draw space to parent child space.
    pub(crate) local: Cached<Affine>,
    /// Draw space to screen.
    pub(crate) screen: Cached<Affine>,
    /// Draw box in parent child space.
    pub(crate) bounds: Cached<Rect>,
    /// For flow containers: whether the children's `flow_offset`s are current.
    pub(crate) flow: Cached<()>,
    /// Top-left of this node's layout box as placed by a flow parent.
    pub(crate) flow_offset: Vec2,
    /// Invalidation-wave bookkeeping: last wave that visited this node's size
    /// and which axes it covered.
    pub(crate) size_wave: u64,
    pub(crate) size_wave_axes: Axes,
    /// Last wave that visited this node's content.
    pub(crate) content_wave: u64,
}

impl Default for NodeCaches {
    fn default() -> Self {
        Self {
            size: [Cached::new(0.0), Cached::new(0.0)],
            resolving: [false; 2],
            local: Cached::new(Affine::IDENTITY),
            screen: Cached::new(Affine::IDENTITY),
            bounds: Cached::new(Rect::ZERO),
            flow: Cached::new(()),
            flow_offset: Vec2::ZERO,
            size_wave: 0,
            size_wave_axes: Axes::None,
            content_wave: 0,
        }
    }
}
