// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-thread frame consumption.

use kurbo::Size;
use tracing::trace;
use trellis_core::draw::{DrawNode, SnapshotReader};

use crate::{DamageRegion, RenderPlan};

/// A render backend.
///
/// Implementations issue the GPU (or compositor) work for one frame. The
/// plan and damage are owned by the [`FrameConsumer`]; the frame slot they
/// were built from has already been released when `render` is called.
pub trait Renderer {
    /// Renders one frame.
    fn render(&mut self, plan: &RenderPlan, damage: &DamageRegion);
}

/// Pulls published frames from a [`SnapshotReader`] and feeds them to a
/// [`Renderer`], tracking damage between consecutive frames.
///
/// Call [`consume`](Self::consume) once per render-thread frame.
#[derive(Debug)]
pub struct FrameConsumer {
    reader: SnapshotReader,
    plan: RenderPlan,
    last_sequence: Option<u64>,
    last_viewport: Size,
    last_nodes: Vec<DrawNode>,
}

impl FrameConsumer {
    /// Creates a consumer reading from `reader`.
    #[must_use]
    pub fn new(reader: SnapshotReader) -> Self {
        Self {
            reader,
            plan: RenderPlan::default(),
            last_sequence: None,
            last_viewport: Size::ZERO,
            last_nodes: Vec::new(),
        }
    }

    /// Renders the latest published frame if it is newer than the last one
    /// rendered.
    ///
    /// Returns the sequence number of the rendered frame, or `None` if there
    /// was nothing new.
    pub fn consume<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Option<u64> {
        let damage = {
            let frame = self.reader.acquire()?;
            if self.last_sequence == Some(frame.sequence) {
                return None;
            }
            let damage = if self.last_sequence.is_none() || frame.viewport != self.last_viewport {
                DamageRegion::Full
            } else {
                DamageRegion::between(&self.last_nodes, &frame.nodes)
            };
            self.plan.fill_from(&frame);
            self.last_sequence = Some(frame.sequence);
            self.last_viewport = frame.viewport;
            self.last_nodes.clear();
            self.last_nodes.extend_from_slice(&frame.nodes);
            damage
        };

        trace!(sequence = self.plan.sequence, items = self.plan.items.len(), "rendering frame");
        renderer.render(&self.plan, &damage);
        self.last_sequence
    }

    /// Sequence number of the last rendered frame.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// The plan of the last rendered frame.
    #[must_use]
    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }
}
