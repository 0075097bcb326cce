// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error and warning types.
//!
//! [`SceneError`] covers everything that is rejected synchronously at the
//! point of mutation or access. [`LayoutWarning`] covers resolution problems
//! that degrade an axis to its last-known-good value without failing the
//! frame.

use thiserror::Error;

use crate::geometry::{Axes, Axis};
use crate::node::NodeId;
use crate::resource::ResourceKey;

/// A rejected scene operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The handle refers to a node that has been destroyed (or never existed).
    #[error("{0:?} refers to a destroyed node")]
    Destroyed(NodeId),
    /// An axis would be both relatively sized and auto-sized.
    #[error("{node:?}: axes {axes:?} cannot be both relatively sized and auto-sized")]
    AxisConflict {
        /// The node being configured.
        node: NodeId,
        /// The conflicting axes.
        axes: Axes,
    },
    /// The child is already attached somewhere.
    #[error("{child:?} already has a parent")]
    AlreadyParented {
        /// The node that was being attached.
        child: NodeId,
    },
    /// Attaching would make a node its own ancestor.
    #[error("cannot attach {child:?} beneath {parent:?}: it is an ancestor of (or equal to) the parent")]
    WouldCreateCycle {
        /// The requested parent.
        parent: NodeId,
        /// The requested child.
        child: NodeId,
    },
    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The presumed parent.
        parent: NodeId,
        /// The presumed child.
        child: NodeId,
    },
    /// The scene root cannot be attached, detached or destroyed.
    #[error("the scene root cannot be re-parented or destroyed")]
    RootNode,
    /// The resource key is not registered.
    #[error("{0:?} is not a registered resource")]
    UnknownResource(ResourceKey),
}

/// A recoverable layout degradation reported by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutWarning {
    /// Resolving the axis required its own value; the last-known-good value
    /// was used instead.
    DependencyCycle {
        /// The node whose axis was re-entered.
        node: NodeId,
        /// The affected axis.
        axis: Axis,
    },
    /// The resolver exceeded its recursion bound; the last-known-good value
    /// was used instead.
    DepthExceeded {
        /// The node being resolved when the bound was hit.
        node: NodeId,
        /// The affected axis.
        axis: Axis,
    },
}

impl LayoutWarning {
    /// The node the warning is about.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        match *self {
            Self::DependencyCycle { node, .. } | Self::DepthExceeded { node, .. } => node,
        }
    }
}
