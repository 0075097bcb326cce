// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition of a node's transform components into a 2-D affine.
//!
//! A node's local-to-parent transform is built from the resolved placement
//! (anchor point plus position), the node's own scale, shear and rotation
//! (all applied about the origin point), and the margin offset of its draw
//! box inside its layout box:
//!
//! ```text
//! local = T(placement) · R(rotation) · K(shear) · S(scale) · T(margin − origin)
//! ```

use kurbo::{Affine, Vec2};

/// The independent components of a node's local transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParts {
    /// Where the origin point lands in the parent's child space.
    pub placement: Vec2,
    /// Point on the node's layout box that scale/shear/rotation pivot around.
    pub origin: Vec2,
    /// Offset of the draw box inside the layout box (the top-left margin).
    pub margin: Vec2,
    /// Per-axis scale factors.
    pub scale: Vec2,
    /// Shear factors (`x' = x + shear.x · y`, `y' = y + shear.y · x`).
    pub shear: Vec2,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
}

impl Default for TransformParts {
    fn default() -> Self {
        Self {
            placement: Vec2::ZERO,
            origin: Vec2::ZERO,
            margin: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            shear: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl TransformParts {
    /// Composes the components into a single affine.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let mut affine = Affine::translate(self.margin - self.origin);
        if self.scale != Vec2::new(1.0, 1.0) {
            affine = Affine::scale_non_uniform(self.scale.x, self.scale.y) * affine;
        }
        if self.shear != Vec2::ZERO {
            affine = Affine::skew(self.shear.x, self.shear.y) * affine;
        }
        if self.rotation != 0.0 {
            affine = Affine::rotate(self.rotation.to_radians()) * affine;
        }
        Affine::translate(self.placement) * affine
    }
}
