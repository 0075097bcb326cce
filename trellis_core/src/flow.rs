// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill-flow arrangement of a container's children.
//!
//! A flow container ignores its children's positions and lays their scaled
//! layout boxes out one after another. A child's anchor no longer picks a
//! point on the container; it aligns the child's row (or column) instead.
//! The arrangement itself is a pure function over box extents; the scene
//! caches its result per container.

use kurbo::Vec2;

use crate::geometry::Axis;

/// The direction children are laid out in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillDirection {
    /// Left to right, wrapping to a new row when the available width is
    /// exhausted.
    #[default]
    Full,
    /// Left to right on a single row.
    Horizontal,
    /// Top to bottom on a single column.
    Vertical,
}

/// Fill-flow parameters of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FillFlow {
    /// Layout direction.
    pub direction: FillDirection,
    /// Gap between neighbouring boxes (x) and between rows (y).
    pub spacing: Vec2,
}

impl FillFlow {
    /// A flow in `direction` with no spacing.
    #[must_use]
    pub const fn new(direction: FillDirection) -> Self {
        Self {
            direction,
            spacing: Vec2::ZERO,
        }
    }

    /// Returns the same flow with the given spacing.
    #[must_use]
    pub const fn with_spacing(mut self, spacing: Vec2) -> Self {
        self.spacing = spacing;
        self
    }

    /// Places boxes of the given extents, returning the top-left corner of
    /// each box.
    ///
    /// `available_width` bounds rows for [`FillDirection::Full`]; pass
    /// `f64::INFINITY` when the container's width is itself derived from its
    /// children. A box wider than the available width still gets a row of its
    /// own.
    #[must_use]
    pub fn arrange(&self, extents: &[Vec2], available_width: f64) -> Vec<Vec2> {
        self.place(extents, available_width).0
    }

    /// Places boxes like [`arrange`](Self::arrange) within `area`, then
    /// aligns each box by its anchor fraction (one per box).
    ///
    /// Along the flow a box moves by its fraction of the free space left in
    /// its own line, so centre-anchored boxes give centred rows. Across the
    /// flow it moves by its fraction of the space left by the whole block,
    /// plus its fraction of the space its line leaves beside it, so
    /// bottom-anchored boxes in a row share a bottom edge. An infinite `area`
    /// component aligns against the content itself.
    #[must_use]
    pub fn arrange_aligned(&self, extents: &[Vec2], anchors: &[Vec2], area: Vec2) -> Vec<Vec2> {
        let (mut positions, lines) = self.place(extents, area.x);
        let (main, cross) = match self.direction {
            FillDirection::Vertical => (Axis::Y, Axis::X),
            FillDirection::Full | FillDirection::Horizontal => (Axis::X, Axis::Y),
        };

        let line_count = lines.last().map_or(0, |&line| line + 1);
        let mut line_extents = vec![0.0_f64; line_count];
        let mut line_thickness = vec![0.0_f64; line_count];
        let mut block = 0.0_f64;
        for ((&position, &extent), &line) in positions.iter().zip(extents).zip(&lines) {
            line_extents[line] = line_extents[line].max(main.of(position) + main.of(extent));
            line_thickness[line] = line_thickness[line].max(cross.of(extent));
            block = block.max(cross.of(position) + cross.of(extent));
        }
        let widest = line_extents.iter().copied().fold(0.0_f64, f64::max);
        let main_space = finite_or(main.of(area), widest);
        let cross_space = finite_or(cross.of(area), block);

        for (((position, &extent), &anchor), &line) in
            positions.iter_mut().zip(extents).zip(anchors).zip(&lines)
        {
            let along = main.of(*position) + main.of(anchor) * (main_space - line_extents[line]);
            let slack = (cross_space - block) + (line_thickness[line] - cross.of(extent));
            let across = cross.of(*position) + cross.of(anchor) * slack;
            *position = cross.with(main.with(*position, along), across);
        }
        positions
    }

    /// Top-left corners plus the line each box landed on.
    fn place(&self, extents: &[Vec2], available_width: f64) -> (Vec<Vec2>, Vec<usize>) {
        // Tolerance so boxes that exactly fill a row do not wrap on rounding.
        const EPSILON: f64 = 1e-9;

        let mut positions = Vec::with_capacity(extents.len());
        let mut lines = Vec::with_capacity(extents.len());
        let mut line = 0;
        let mut cursor = Vec2::ZERO;
        let mut row_height = 0.0_f64;
        for &extent in extents {
            match self.direction {
                FillDirection::Horizontal => {
                    positions.push(cursor);
                    cursor.x += extent.x + self.spacing.x;
                }
                FillDirection::Vertical => {
                    positions.push(cursor);
                    cursor.y += extent.y + self.spacing.y;
                }
                FillDirection::Full => {
                    if cursor.x > 0.0 && cursor.x + extent.x > available_width + EPSILON {
                        cursor.x = 0.0;
                        cursor.y += row_height + self.spacing.y;
                        row_height = 0.0;
                        line += 1;
                    }
                    positions.push(cursor);
                    cursor.x += extent.x + self.spacing.x;
                    row_height = row_height.max(extent.y);
                }
            }
            lines.push(line);
        }
        (positions, lines)
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: Vec2 = Vec2::new(30.0, 20.0);

    #[test]
    fn horizontal_ignores_width() {
        let flow = FillFlow::new(FillDirection::Horizontal).with_spacing(Vec2::new(5.0, 5.0));
        let placed = flow.arrange(&[BOX, BOX, BOX], 40.0);
        assert_eq!(
            placed,
            vec![Vec2::ZERO, Vec2::new(35.0, 0.0), Vec2::new(70.0, 0.0)]
        );
    }

    #[test]
    fn vertical_stacks() {
        let flow = FillFlow::new(FillDirection::Vertical);
        let placed = flow.arrange(&[BOX, Vec2::new(10.0, 50.0), BOX], f64::INFINITY);
        assert_eq!(
            placed,
            vec![Vec2::ZERO, Vec2::new(0.0, 20.0), Vec2::new(0.0, 70.0)]
        );
    }

    #[test]
    fn full_wraps_rows() {
        let flow = FillFlow::new(FillDirection::Full).with_spacing(Vec2::new(0.0, 4.0));
        let tall = Vec2::new(30.0, 40.0);
        let placed = flow.arrange(&[BOX, tall, BOX, BOX], 60.0);
        assert_eq!(placed[0], Vec2::ZERO);
        assert_eq!(placed[1], Vec2::new(30.0, 0.0), "exactly fills the row");
        assert_eq!(placed[2], Vec2::new(0.0, 44.0), "row height is the tallest box");
        assert_eq!(placed[3], Vec2::new(30.0, 44.0));
    }

    #[test]
    fn full_without_width_never_wraps() {
        let flow = FillFlow::new(FillDirection::Full);
        let placed = flow.arrange(&[BOX; 4], f64::INFINITY);
        assert!(placed.iter().all(|p| p.y == 0.0), "single row");
    }

    #[test]
    fn centre_anchors_centre_each_row() {
        let flow = FillFlow::new(FillDirection::Full);
        let centre = Vec2::new(0.5, 0.5);
        let placed = flow.arrange_aligned(&[BOX; 4], &[centre; 4], Vec2::new(100.0, 100.0));
        // Rows of 90 and 30 in a width of 100; a block of 40 in a height of 100.
        assert_eq!(placed[0], Vec2::new(5.0, 30.0));
        assert_eq!(placed[2], Vec2::new(65.0, 30.0));
        assert_eq!(placed[3], Vec2::new(35.0, 50.0), "short row centred on its own");
    }

    #[test]
    fn right_anchors_align_against_widest_row_when_unbounded() {
        let flow = FillFlow::new(FillDirection::Vertical);
        let wide = Vec2::new(50.0, 10.0);
        let right = Vec2::new(1.0, 0.0);
        let placed = flow.arrange_aligned(
            &[wide, BOX],
            &[right, right],
            Vec2::new(f64::INFINITY, f64::INFINITY),
        );
        assert_eq!(placed[0], Vec2::ZERO, "widest box fills the column");
        assert_eq!(placed[1], Vec2::new(20.0, 10.0), "narrow box flush right");
    }

    #[test]
    fn bottom_anchors_share_a_baseline() {
        let flow = FillFlow::new(FillDirection::Horizontal);
        let tall = Vec2::new(30.0, 40.0);
        let bottom = Vec2::new(0.0, 1.0);
        let placed = flow.arrange_aligned(&[tall, BOX], &[bottom, bottom], Vec2::new(200.0, 100.0));
        assert_eq!(placed[0], Vec2::new(0.0, 60.0));
        assert_eq!(placed[1], Vec2::new(30.0, 80.0), "bottom edges at 100");
    }

    #[test]
    fn top_left_anchors_match_plain_arrangement() {
        let flow = FillFlow::new(FillDirection::Full).with_spacing(Vec2::new(2.0, 2.0));
        let extents = [BOX, Vec2::new(50.0, 5.0), BOX];
        assert_eq!(
            flow.arrange_aligned(&extents, &[Vec2::ZERO; 3], Vec2::new(70.0, 200.0)),
            flow.arrange(&extents, 70.0),
            "no free-space shift"
        );
    }

    #[test]
    fn oversized_box_gets_own_row() {
        let flow = FillFlow::new(FillDirection::Full);
        let wide = Vec2::new(100.0, 10.0);
        let placed = flow.arrange(&[wide, wide], 50.0);
        assert_eq!(placed[0], Vec2::ZERO, "first box never wraps");
        assert_eq!(placed[1], Vec2::new(0.0, 10.0));
    }
}
