// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-thread side of trellis.
//!
//! This crate sits between [`trellis_core`]'s published draw snapshots and a
//! backend's draw calls. It defines:
//!
//! - [`RenderItem`]: a single draw command in the render plan
//! - [`RenderPlan`]: an ordered list of draw commands for one frame
//! - [`DamageRegion`]: spatial damage between two frames for partial
//!   re-rendering
//! - [`Renderer`]: the trait render backends implement
//! - [`FrameConsumer`]: acquires the latest frame once per render-thread
//!   frame and drives a [`Renderer`] with it

mod consumer;
mod damage;
mod plan;

pub use consumer::{FrameConsumer, Renderer};
pub use damage::DamageRegion;
pub use plan::{RenderItem, RenderPlan};
