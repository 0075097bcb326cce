// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The draw pass: resolved scene → published [`Frame`](super::Frame).

use kurbo::Vec2;

use super::node::{DrawNode, DrawPayload};
use super::snapshot::SnapshotWriter;
use crate::node::{Payload, Scene};

/// How far from an integer a quad extent may be and still snap.
const PIXEL_SNAP_TOLERANCE: f64 = 0.1;

impl Scene {
    /// Walks the tree from the root in draw order, writes a record for every
    /// visible node into a new frame and publishes it.
    ///
    /// A node is skipped together with its subtree when it is hidden, its
    /// effective alpha is zero, or either scale component is zero. Nodes not
    /// attached to the root are never drawn.
    ///
    /// Returns the sequence number of the published frame.
    pub fn draw(&mut self, writer: &mut SnapshotWriter) -> u64 {
        let mut frame = writer.begin();
        frame.set_viewport(self.config.viewport);

        let mut stack = vec![(self.root, 1.0_f32)];
        while let Some((idx, inherited_alpha)) = stack.pop() {
            let props = &self.props[idx as usize];
            let alpha = inherited_alpha * props.alpha;
            if props.hidden || alpha <= 0.0 || props.scale.x == 0.0 || props.scale.y == 0.0 {
                continue;
            }
            frame.push(self.draw_node(idx, alpha));
            // Reverse so the first child in draw order pops first.
            for child in self.children_in_draw_order(idx).into_iter().rev() {
                stack.push((child, alpha));
            }
        }

        frame.publish()
    }

    fn draw_node(&mut self, idx: u32, alpha: f32) -> DrawNode {
        let size = self.resolve_draw_size(idx, 0);
        let transform = self.resolve_screen(idx);
        let quad = self.screen_quad(idx);
        let props = &self.props[idx as usize];

        let payload = match props.payload {
            Payload::Container => DrawPayload::Group,
            Payload::Box => DrawPayload::Box,
            Payload::Sprite(sprite) => DrawPayload::Sprite {
                texture: sprite.texture,
                wrap_texture: sprite.wrap_texture,
                radius: sprite.radius,
                size: Vec2::new(size.x * props.scale.x, size.y * props.scale.y),
                pixel_snap: props.rotation == 0.0
                    && near_integer(quad.width())
                    && near_integer(quad.height()),
            },
        };

        DrawNode {
            node: self.id_at(idx),
            transform,
            quad,
            draw_size: size.to_size(),
            colour: props.colour.multiply_alpha(alpha),
            blend: props.blend,
            payload,
        }
    }
}

fn near_integer(value: f64) -> bool {
    (value - value.round()).abs() < PIXEL_SNAP_TOLERANCE
}
