// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stateless geometry vocabulary: anchors, axes, margins and quads.
//!
//! Everything here is plain data. The scene combines these values with the
//! `kurbo` primitives to resolve sizes and transforms.

use core::ops::BitOr;

use kurbo::{Affine, Point, Rect, Vec2};

/// A single layout axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

impl Axis {
    /// Both axes, in index order.
    pub const ALL: [Self; 2] = [Self::X, Self::Y];

    /// Returns 0 for `X` and 1 for `Y`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    /// Reads this axis' component of `v`.
    #[inline]
    #[must_use]
    pub const fn of(self, v: Vec2) -> f64 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
        }
    }

    /// Returns `v` with this axis' component replaced by `value`.
    #[inline]
    #[must_use]
    pub const fn with(self, v: Vec2, value: f64) -> Vec2 {
        match self {
            Self::X => Vec2::new(value, v.y),
            Self::Y => Vec2::new(v.x, value),
        }
    }
}

/// A set of axes, used for the relative-size, relative-position and
/// auto-size selectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axes {
    /// Neither axis.
    #[default]
    None,
    /// Horizontal only.
    X,
    /// Vertical only.
    Y,
    /// Both axes.
    Both,
}

impl Axes {
    /// Returns whether `axis` is part of this set.
    #[inline]
    #[must_use]
    pub const fn contains(self, axis: Axis) -> bool {
        matches!(
            (self, axis),
            (Self::Both, _) | (Self::X, Axis::X) | (Self::Y, Axis::Y)
        )
    }

    /// Returns the axes present in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        let x = self.contains(Axis::X) && other.contains(Axis::X);
        let y = self.contains(Axis::Y) && other.contains(Axis::Y);
        Self::from_flags(x, y)
    }

    /// Returns whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::None)
    }

    const fn from_flags(x: bool, y: bool) -> Self {
        match (x, y) {
            (false, false) => Self::None,
            (true, false) => Self::X,
            (false, true) => Self::Y,
            (true, true) => Self::Both,
        }
    }
}

impl BitOr for Axes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::from_flags(
            self.contains(Axis::X) || rhs.contains(Axis::X),
            self.contains(Axis::Y) || rhs.contains(Axis::Y),
        )
    }
}

impl From<Axis> for Axes {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
        }
    }
}

/// One of the nine compass points of a box.
///
/// Used both as an *anchor* (a point on the parent's child-space box) and as
/// an *origin* (a point on the node's own box).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Top-left corner.
    #[default]
    TopLeft,
    /// Middle of the top edge.
    TopCentre,
    /// Top-right corner.
    TopRight,
    /// Middle of the left edge.
    CentreLeft,
    /// Centre of the box.
    Centre,
    /// Middle of the right edge.
    CentreRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    BottomCentre,
    /// Bottom-right corner.
    BottomRight,
}

impl Anchor {
    /// All nine points, row by row.
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCentre,
        Self::TopRight,
        Self::CentreLeft,
        Self::Centre,
        Self::CentreRight,
        Self::BottomLeft,
        Self::BottomCentre,
        Self::BottomRight,
    ];

    /// Returns the point as a fraction `(0 | 0.5 | 1, 0 | 0.5 | 1)` of a
    /// box's width and height.
    #[must_use]
    pub const fn fraction(self) -> Vec2 {
        let x = match self {
            Self::TopLeft | Self::CentreLeft | Self::BottomLeft => 0.0,
            Self::TopCentre | Self::Centre | Self::BottomCentre => 0.5,
            Self::TopRight | Self::CentreRight | Self::BottomRight => 1.0,
        };
        let y = match self {
            Self::TopLeft | Self::TopCentre | Self::TopRight => 0.0,
            Self::CentreLeft | Self::Centre | Self::CentreRight => 0.5,
            Self::BottomLeft | Self::BottomCentre | Self::BottomRight => 1.0,
        };
        Vec2::new(x, y)
    }

    /// Resolves the point on a box of the given extent.
    #[inline]
    #[must_use]
    pub fn resolve(self, extent: Vec2) -> Vec2 {
        let f = self.fraction();
        Vec2::new(f.x * extent.x, f.y * extent.y)
    }
}

/// Insets on the four sides of a box, used for both margin and padding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarginPadding {
    /// Top inset.
    pub top: f64,
    /// Left inset.
    pub left: f64,
    /// Bottom inset.
    pub bottom: f64,
    /// Right inset.
    pub right: f64,
}

impl MarginPadding {
    /// No inset on any side.
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    /// The same inset on all four sides.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    /// Offset of the inner box's top-left corner.
    #[inline]
    #[must_use]
    pub const fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Combined horizontal and vertical insets.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> Vec2 {
        Vec2::new(self.left + self.right, self.top + self.bottom)
    }
}

/// A transformed rectangle, stored as its four corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    /// Image of the rectangle's top-left corner.
    pub top_left: Point,
    /// Image of the rectangle's top-right corner.
    pub top_right: Point,
    /// Image of the rectangle's bottom-left corner.
    pub bottom_left: Point,
    /// Image of the rectangle's bottom-right corner.
    pub bottom_right: Point,
}

impl Quad {
    /// Maps `rect` through `transform`.
    #[must_use]
    pub fn from_rect(rect: Rect, transform: Affine) -> Self {
        Self {
            top_left: transform * Point::new(rect.x0, rect.y0),
            top_right: transform * Point::new(rect.x1, rect.y0),
            bottom_left: transform * Point::new(rect.x0, rect.y1),
            bottom_right: transform * Point::new(rect.x1, rect.y1),
        }
    }

    /// Length of the top edge.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.top_left.distance(self.top_right)
    }

    /// Length of the left edge.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.top_left.distance(self.bottom_left)
    }

    /// Smallest axis-aligned rectangle containing all four corners.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::from_points(self.top_left, self.bottom_right)
            .union_pt(self.top_right)
            .union_pt(self.bottom_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_fractions_cover_the_grid() {
        let mut seen = Vec::new();
        for anchor in Anchor::ALL {
            let f = anchor.fraction();
            assert!(!seen.contains(&(f.x.to_bits(), f.y.to_bits())), "duplicate fraction for {anchor:?}");
            seen.push((f.x.to_bits(), f.y.to_bits()));
        }
        assert_eq!(Anchor::BottomRight.resolve(Vec2::new(200.0, 100.0)), Vec2::new(200.0, 100.0));
        assert_eq!(Anchor::Centre.resolve(Vec2::new(200.0, 100.0)), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn axes_set_operations() {
        assert!(Axes::Both.contains(Axis::X));
        assert!(!Axes::Y.contains(Axis::X));
        assert_eq!(Axes::X | Axes::Y, Axes::Both);
        assert_eq!(Axes::Both.intersection(Axes::Y), Axes::Y);
        assert!(Axes::X.intersection(Axes::Y).is_empty());
    }

    #[test]
    fn padding_totals() {
        let p = MarginPadding {
            top: 1.0,
            left: 2.0,
            bottom: 3.0,
            right: 4.0,
        };
        assert_eq!(p.total(), Vec2::new(6.0, 4.0));
        assert_eq!(p.top_left(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn quad_of_rotated_square() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let quad = Quad::from_rect(rect, Affine::rotate(core::f64::consts::FRAC_PI_4));
        assert!((quad.width() - 10.0).abs() < 1e-9, "rotation preserves edge length");
        let bbox = quad.bounding_box();
        let diagonal = 10.0 * core::f64::consts::SQRT_2;
        assert!((bbox.width() - diagonal).abs() < 1e-9, "bbox spans the diagonal");
    }
}
