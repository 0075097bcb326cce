// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage for scene nodes: allocation, topology and property
//! mutation.

use std::sync::Arc;

use kurbo::{Size, Vec2};
use tracing::{debug, warn};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId};
use super::props::{BlendMode, Colour, NodeCaches, NodeProps, Payload, SpriteContent};
use super::traverse::Children;
use crate::dirty;
use crate::error::{LayoutWarning, SceneError};
use crate::flow::FillFlow;
use crate::geometry::{Anchor, Axes, MarginPadding};
use crate::resource::{ResourceKey, ResourceRegistry};

/// Scene-wide configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Size of the area the root node fills.
    pub viewport: Size,
    /// Recursion bound of the layout resolver. Resolution deeper than this
    /// degrades to the last-known-good value and reports
    /// [`LayoutWarning::DepthExceeded`].
    pub max_resolve_depth: u32,
}

impl SceneConfig {
    /// Default recursion bound of the layout resolver.
    pub const DEFAULT_MAX_RESOLVE_DEPTH: u32 = 256;

    /// Configuration for a viewport of the given size.
    #[must_use]
    pub const fn new(viewport: Size) -> Self {
        Self {
            viewport,
            max_resolve_depth: Self::DEFAULT_MAX_RESOLVE_DEPTH,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

/// Cache counters of a node, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Times the draw size was recomputed, per axis.
    pub size_computations: [u64; 2],
    /// Valid-to-invalid transitions of the draw size, per axis.
    pub size_invalidations: [u64; 2],
    /// Times the local transform was recomputed.
    pub local_computations: u64,
    /// Times the screen-space transform was recomputed.
    pub screen_computations: u64,
}

/// The scene graph.
///
/// Nodes are addressed by [`NodeId`] handles. Internally each node occupies a
/// slot in parallel arrays; destroyed nodes are recycled via a free list, and
/// generation counters turn stale handles into [`SceneError::Destroyed`].
///
/// The scene owns a root node that fills the viewport. Only nodes attached
/// (transitively) to the root are drawn; detached nodes keep their state and
/// can be resolved, but their relative quantities resolve against zero.
#[derive(Debug)]
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Inputs and derived state --
    pub(crate) props: Vec<NodeProps>,
    pub(crate) caches: Vec<NodeCaches>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Change reporting --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) draw_order: Vec<u32>,
    pub(crate) draw_order_dirty: bool,
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
    pub(crate) warnings: Vec<LayoutWarning>,
    /// Times the resolver hit its depth bound. Values resolved while this
    /// moves are returned but not cached.
    pub(crate) depth_exceeded: u64,

    /// Counter identifying the current invalidation wave.
    pub(crate) wave: u64,

    pub(crate) config: SceneConfig,
    pub(crate) resources: Arc<ResourceRegistry>,
}

impl Scene {
    /// Creates a scene containing only its root node.
    pub fn new(config: SceneConfig, resources: Arc<ResourceRegistry>) -> Self {
        let mut scene = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            props: Vec::new(),
            caches: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            draw_order: Vec::new(),
            draw_order_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            warnings: Vec::new(),
            depth_exceeded: 0,
            wave: 0,
            config,
            resources,
        };
        let root = scene.create_node();
        scene.root = root.idx;
        let props = &mut scene.props[root.idx as usize];
        props.relative_size_axes = Axes::Both;
        props.size = Vec2::new(1.0, 1.0);
        scene
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.id_at(self.root)
    }

    /// The scene configuration.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The resource registry shared with this scene.
    #[must_use]
    pub fn resources(&self) -> &Arc<ResourceRegistry> {
        &self.resources
    }

    /// Resizes the viewport the root node fills.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.config.viewport == viewport {
            return;
        }
        self.config.viewport = viewport;
        self.size_changed(self.root, Axes::Both);
    }

    // -- Allocation API --

    /// Creates a new detached node and returns its handle.
    ///
    /// The node starts as a zero-sized container anchored top-left, with unit
    /// scale, full alpha and no parent.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.props[i] = NodeProps::default();
            self.caches[i] = NodeCaches::default();
            self.alive[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.props.push(NodeProps::default());
            self.caches.push(NodeCaches::default());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.draw_order_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.id_at(idx)
    }

    /// Destroys a node together with its whole subtree.
    ///
    /// The node is detached from its parent first, which invalidates the
    /// parent's auto-size and flow caches once. Textures held by destroyed
    /// sprites are released to the registry.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if idx == self.root {
            return Err(SceneError::RootNode);
        }

        let parent = self.parent[idx as usize];
        if parent != INVALID {
            self.unlink_from_parent(idx);
            self.content_changed(parent);
            self.dirty.mark(parent, dirty::TOPOLOGY);
        }

        let mut subtree = vec![idx];
        let mut cursor = 0;
        while cursor < subtree.len() {
            let node = subtree[cursor];
            subtree.extend(self.child_indices(node));
            cursor += 1;
        }

        for &node in subtree.iter().rev() {
            let i = node as usize;
            if let Some(key) = self.props[i].payload.texture() {
                self.release_texture(key);
            }
            self.dirty.remove_key(node);
            // Bump generation so old handles immediately fail validation.
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.alive[i] = false;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.free_list.push(node);
            self.pending_removed.push(node);
        }

        self.draw_order_dirty = true;
        debug!(node = ?id, count = subtree.len(), "destroyed subtree");
        Ok(())
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s children.
    ///
    /// Fails if `child` already has a parent, is the root, or is `parent`
    /// itself or one of its ancestors.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let (p, c) = self.check_attach(parent, child)?;

        let last = self.last_child(p);
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = last;
        self.next_sibling[c as usize] = INVALID;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }

        self.attached(p, c);
        Ok(())
    }

    /// Inserts `child` into `parent`'s children immediately before `before`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), SceneError> {
        let b = self.index(before)?;
        let p = self.index(parent)?;
        if self.parent[b as usize] != p {
            return Err(SceneError::NotAChild {
                parent,
                child: before,
            });
        }
        let (p, c) = self.check_attach(parent, child)?;

        let prev = self.prev_sibling[b as usize];
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = prev;
        self.next_sibling[c as usize] = b;
        self.prev_sibling[b as usize] = c;
        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }

        self.attached(p, c);
        Ok(())
    }

    /// Detaches `child` from `parent`. The child stays alive; destroying it
    /// is up to the caller.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let p = self.index(parent)?;
        let c = self.index(child)?;
        if self.parent[c as usize] != p {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(c);
        Ok(())
    }

    /// Detaches `child` from whatever parent it has. Does nothing for a
    /// detached node.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Result<(), SceneError> {
        let c = self.index(child)?;
        if c == self.root {
            return Err(SceneError::RootNode);
        }
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        Ok(())
    }

    /// Returns the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        let idx = self.index(id)?;
        let parent = self.parent[idx as usize];
        Ok((parent != INVALID).then(|| self.id_at(parent)))
    }

    /// Iterates over the children of a node in insertion order.
    pub fn children(&self, id: NodeId) -> Result<Children<'_>, SceneError> {
        let idx = self.index(id)?;
        Ok(Children::new(self, self.first_child[idx as usize]))
    }

    /// Returns whether the node is attached (transitively) to the root.
    pub fn is_in_scene(&self, id: NodeId) -> Result<bool, SceneError> {
        let idx = self.index(id)?;
        Ok(self.is_ancestor_or_self(self.root, idx))
    }

    // -- Geometry inputs --

    /// Sets the point on the parent's child space the node is anchored to.
    pub fn set_anchor(&mut self, id: NodeId, anchor: Anchor) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].anchor, anchor) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the point on the node's own box that coincides with its anchor.
    pub fn set_origin(&mut self, id: NodeId, origin: Anchor) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].origin, origin) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the offset from the anchor point. Axes in the relative-position
    /// set are fractions of the parent's child-space size.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].position, position) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the size. Axes in the relative-size set are fractions of the
    /// parent's child-space size; auto-sized axes ignore this value.
    pub fn set_size(&mut self, id: NodeId, size: Vec2) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].size, size) {
            self.size_changed(idx, Axes::Both);
        }
        Ok(())
    }

    /// Selects which axes of the size are relative.
    ///
    /// Fails with [`SceneError::AxisConflict`] if an axis is also auto-sized.
    pub fn set_relative_size_axes(&mut self, id: NodeId, axes: Axes) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        let props = &mut self.props[idx as usize];
        let conflict = axes.intersection(props.auto_size_axes);
        if !conflict.is_empty() {
            return Err(SceneError::AxisConflict {
                node: id,
                axes: conflict,
            });
        }
        let previous = props.relative_size_axes;
        if replace(&mut props.relative_size_axes, axes) {
            self.size_changed(idx, previous | axes);
        }
        Ok(())
    }

    /// Selects which axes of the position are relative.
    pub fn set_relative_position_axes(
        &mut self,
        id: NodeId,
        axes: Axes,
    ) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].relative_position_axes, axes) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Selects which axes derive their size from the children.
    ///
    /// Fails with [`SceneError::AxisConflict`] if an axis is also relatively
    /// sized.
    pub fn set_auto_size_axes(&mut self, id: NodeId, axes: Axes) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        let props = &mut self.props[idx as usize];
        let conflict = axes.intersection(props.relative_size_axes);
        if !conflict.is_empty() {
            return Err(SceneError::AxisConflict {
                node: id,
                axes: conflict,
            });
        }
        let previous = props.auto_size_axes;
        if replace(&mut props.auto_size_axes, axes) {
            self.size_changed(idx, previous | axes);
        }
        Ok(())
    }

    /// Sets the inset between the node's layout box and its draw box.
    pub fn set_margin(&mut self, id: NodeId, margin: MarginPadding) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].margin, margin) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the inset between the node's draw box and its children's space.
    pub fn set_padding(&mut self, id: NodeId, padding: MarginPadding) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].padding, padding) {
            // Auto-sized axes include the padding; children see a new space.
            self.size_changed(idx, Axes::Both);
        }
        Ok(())
    }

    /// Sets the per-axis scale, applied about the origin.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].scale, scale) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the clockwise rotation in degrees, applied about the origin.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].rotation, degrees) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the shear, applied about the origin.
    pub fn set_shear(&mut self, id: NodeId, shear: Vec2) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].shear, shear) {
            self.transform_changed(idx);
        }
        Ok(())
    }

    /// Sets the sibling ordering key. Higher depth draws first (further
    /// back); equal depths keep insertion order.
    pub fn set_depth(&mut self, id: NodeId, depth: f32) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].depth, depth) {
            self.draw_order_dirty = true;
            self.dirty.mark(idx, dirty::TOPOLOGY);
        }
        Ok(())
    }

    /// Arranges the node's children with a fill flow, or restores anchor
    /// placement with `None`. Flowed children ignore their position; their
    /// anchor aligns them within the flow.
    pub fn set_fill_flow(&mut self, id: NodeId, flow: Option<FillFlow>) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].fill_flow, flow) {
            self.flow_changed(idx);
        }
        Ok(())
    }

    // -- Appearance --

    /// Sets the node's colour.
    pub fn set_colour(&mut self, id: NodeId, colour: Colour) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].colour, colour) {
            self.dirty.mark(idx, dirty::APPEARANCE);
        }
        Ok(())
    }

    /// Sets the node's alpha. Descendants inherit it multiplicatively.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].alpha, alpha) {
            self.dirty.mark_with(idx, dirty::APPEARANCE, &EagerPolicy);
        }
        Ok(())
    }

    /// Sets the node's blend mode.
    pub fn set_blend(&mut self, id: NodeId, blend: BlendMode) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].blend, blend) {
            self.dirty.mark(idx, dirty::APPEARANCE);
        }
        Ok(())
    }

    /// Hides or shows the node and its subtree.
    ///
    /// Hidden nodes take no part in their parent's auto-size or flow.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        if replace(&mut self.props[idx as usize].hidden, hidden) {
            self.dirty.mark_with(idx, dirty::APPEARANCE, &EagerPolicy);
            let parent = self.parent[idx as usize];
            if parent != INVALID {
                self.content_changed(parent);
            }
        }
        Ok(())
    }

    // -- Payload --

    /// Replaces what the node draws.
    ///
    /// A sprite texture is retained in the registry; the texture previously
    /// held by this node (if different) is released.
    pub fn set_payload(&mut self, id: NodeId, payload: Payload) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        let old = self.props[idx as usize].payload;
        if old == payload {
            return Ok(());
        }
        let (old_texture, new_texture) = (old.texture(), payload.texture());
        if old_texture != new_texture {
            if let Some(key) = new_texture {
                self.resources.retain(key)?;
            }
            if let Some(key) = old_texture {
                self.release_texture(key);
            }
        }
        self.props[idx as usize].payload = payload;
        self.dirty.mark(idx, dirty::CONTENT);
        Ok(())
    }

    /// Sets the texture of a sprite node (turning the node into a sprite if
    /// needed) and sizes it to the texture's display size, or to zero when
    /// the texture is cleared.
    pub fn set_texture(&mut self, id: NodeId, texture: Option<ResourceKey>) -> Result<(), SceneError> {
        let idx = self.index(id)?;
        let size = texture
            .map(|key| self.resources.display_size(key))
            .transpose()?
            .map_or(Vec2::ZERO, Size::to_vec2);
        let mut sprite = match self.props[idx as usize].payload {
            Payload::Sprite(sprite) => sprite,
            Payload::Container | Payload::Box => SpriteContent::default(),
        };
        sprite.texture = texture;
        self.set_payload(id, Payload::Sprite(sprite))?;
        self.set_size(id, size)
    }

    // -- Input getters --

    /// The node's anchor.
    pub fn anchor(&self, id: NodeId) -> Result<Anchor, SceneError> {
        Ok(self.props_of(id)?.anchor)
    }

    /// The node's origin.
    pub fn origin(&self, id: NodeId) -> Result<Anchor, SceneError> {
        Ok(self.props_of(id)?.origin)
    }

    /// The node's position as set (fractions on relative axes).
    pub fn position(&self, id: NodeId) -> Result<Vec2, SceneError> {
        Ok(self.props_of(id)?.position)
    }

    /// The node's size as set (fractions on relative axes).
    pub fn size(&self, id: NodeId) -> Result<Vec2, SceneError> {
        Ok(self.props_of(id)?.size)
    }

    /// The node's scale.
    pub fn scale(&self, id: NodeId) -> Result<Vec2, SceneError> {
        Ok(self.props_of(id)?.scale)
    }

    /// The node's rotation in degrees.
    pub fn rotation(&self, id: NodeId) -> Result<f64, SceneError> {
        Ok(self.props_of(id)?.rotation)
    }

    /// The node's depth.
    pub fn depth(&self, id: NodeId) -> Result<f32, SceneError> {
        Ok(self.props_of(id)?.depth)
    }

    /// The node's own alpha.
    pub fn alpha(&self, id: NodeId) -> Result<f32, SceneError> {
        Ok(self.props_of(id)?.alpha)
    }

    /// Whether the node itself is hidden.
    pub fn is_hidden(&self, id: NodeId) -> Result<bool, SceneError> {
        Ok(self.props_of(id)?.hidden)
    }

    /// What the node draws.
    pub fn payload(&self, id: NodeId) -> Result<Payload, SceneError> {
        Ok(self.props_of(id)?.payload)
    }

    /// The node's fill flow, if it arranges its children.
    pub fn fill_flow(&self, id: NodeId) -> Result<Option<FillFlow>, SceneError> {
        Ok(self.props_of(id)?.fill_flow)
    }

    /// Product of the alphas of the node and all its ancestors.
    pub fn effective_alpha(&self, id: NodeId) -> Result<f32, SceneError> {
        let mut current = self.index(id)?;
        let mut alpha = 1.0;
        while current != INVALID {
            alpha *= self.props[current as usize].alpha;
            current = self.parent[current as usize];
        }
        Ok(alpha)
    }

    /// Cache counters of a node.
    pub fn cache_stats(&self, id: NodeId) -> Result<CacheStats, SceneError> {
        let caches = &self.caches[self.index(id)? as usize];
        Ok(CacheStats {
            size_computations: [caches.size[0].computations(), caches.size[1].computations()],
            size_invalidations: [
                caches.size[0].invalidations(),
                caches.size[1].invalidations(),
            ],
            local_computations: caches.local.computations(),
            screen_computations: caches.screen.computations(),
        })
    }

    // -- Internal helpers --

    /// Validates a handle and returns its slot index.
    pub(crate) fn index(&self, id: NodeId) -> Result<u32, SceneError> {
        if self.is_alive(id) {
            Ok(id.idx)
        } else {
            Err(SceneError::Destroyed(id))
        }
    }

    /// Builds a handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn props_of(&self, id: NodeId) -> Result<&NodeProps, SceneError> {
        Ok(&self.props[self.index(id)? as usize])
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(u32, u32), SceneError> {
        let p = self.index(parent)?;
        let c = self.index(child)?;
        if c == self.root {
            return Err(SceneError::RootNode);
        }
        if self.parent[c as usize] != INVALID {
            return Err(SceneError::AlreadyParented { child });
        }
        if self.is_ancestor_or_self(c, p) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }
        Ok((p, c))
    }

    fn last_child(&self, parent: u32) -> u32 {
        let mut child = self.first_child[parent as usize];
        if child == INVALID {
            return INVALID;
        }
        while self.next_sibling[child as usize] != INVALID {
            child = self.next_sibling[child as usize];
        }
        child
    }

    /// Bookkeeping after `child` has been linked beneath `parent`.
    fn attached(&mut self, parent: u32, child: u32) {
        let _ = self.dirty.add_dependency(child, parent, dirty::LAYOUT);
        let _ = self.dirty.add_dependency(child, parent, dirty::APPEARANCE);
        self.draw_order_dirty = true;
        self.dirty.mark(child, dirty::TOPOLOGY);
        self.dirty.mark_with(child, dirty::APPEARANCE, &EagerPolicy);
        self.reparented(child);
    }

    fn detach(&mut self, child: u32) {
        let parent = self.parent[child as usize];
        self.unlink_from_parent(child);
        self.draw_order_dirty = true;
        self.dirty.mark(child, dirty::TOPOLOGY);
        self.content_changed(parent);
        self.reparented(child);
    }

    /// Removes `idx` from its parent's child list and drops the dirty
    /// dependencies on the parent.
    fn unlink_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let parent = self.parent[i];
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev == INVALID {
            self.first_child[parent as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.dirty.remove_dependency(idx, parent, dirty::LAYOUT);
        self.dirty.remove_dependency(idx, parent, dirty::APPEARANCE);
        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }

    fn release_texture(&self, key: ResourceKey) {
        if let Err(err) = self.resources.release(key) {
            warn!(%err, "texture release failed");
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for idx in 0..self.len as usize {
            if !self.alive[idx] {
                continue;
            }
            if let Some(key) = self.props[idx].payload.texture() {
                self.release_texture(key);
            }
        }
    }
}

/// Stores `value` in `slot`, returning whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn scene() -> Scene {
        Scene::new(
            SceneConfig::new(Size::new(800.0, 600.0)),
            Arc::new(ResourceRegistry::default()),
        )
    }

    #[test]
    fn create_and_destroy() {
        let mut scene = scene();
        let id = scene.create_node();
        assert!(scene.is_alive(id));
        assert_eq!(scene.node_count(), 2, "root plus one");
        scene.destroy_node(id).unwrap();
        assert!(!scene.is_alive(id));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut scene = scene();
        let first = scene.create_node();
        scene.destroy_node(first).unwrap();
        let second = scene.create_node();
        assert_eq!(first.index(), second.index(), "slot reused");
        assert_ne!(first, second);
        assert_eq!(scene.position(first), Err(SceneError::Destroyed(first)));
        assert_eq!(
            scene.set_position(first, Vec2::new(1.0, 1.0)),
            Err(SceneError::Destroyed(first)),
            "stale writes are rejected too"
        );
        assert!(scene.position(second).is_ok());
    }

    #[test]
    fn add_child_and_query() {
        let mut scene = scene();
        let root = scene.root();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();

        assert_eq!(scene.children(root).unwrap().collect::<Vec<_>>(), [a, b]);
        assert_eq!(scene.parent(a), Ok(Some(root)));
        assert_eq!(scene.parent(root), Ok(None));
        assert_eq!(scene.is_in_scene(b), Ok(true));
    }

    #[test]
    fn insert_before_works() {
        let mut scene = scene();
        let root = scene.root();
        let a = scene.create_node();
        let b = scene.create_node();
        let c = scene.create_node();
        scene.add_child(root, a).unwrap();
        scene.add_child(root, c).unwrap();
        scene.insert_before(root, b, c).unwrap();
        assert_eq!(scene.children(root).unwrap().collect::<Vec<_>>(), [a, b, c]);

        let d = scene.create_node();
        let stranger = scene.create_node();
        assert_eq!(
            scene.insert_before(root, d, stranger),
            Err(SceneError::NotAChild {
                parent: root,
                child: stranger
            })
        );
    }

    #[test]
    fn remove_and_reattach() {
        let mut scene = scene();
        let root = scene.root();
        let p1 = scene.create_node();
        let p2 = scene.create_node();
        let child = scene.create_node();
        scene.add_child(root, p1).unwrap();
        scene.add_child(p1, child).unwrap();

        assert_eq!(
            scene.remove_child(p2, child),
            Err(SceneError::NotAChild {
                parent: p2,
                child
            })
        );
        scene.remove_child(p1, child).unwrap();
        assert!(scene.is_alive(child), "removal does not destroy");
        assert_eq!(scene.is_in_scene(child), Ok(false));
        scene.add_child(p2, child).unwrap();
        assert_eq!(scene.parent(child), Ok(Some(p2)));
        scene.remove_from_parent(child).unwrap();
        scene.remove_from_parent(child).unwrap();
        assert_eq!(scene.parent(child), Ok(None), "second removal is a no-op");
    }

    #[test]
    fn structural_errors() {
        let mut scene = scene();
        let root = scene.root();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.add_child(root, a).unwrap();
        scene.add_child(a, b).unwrap();

        assert_eq!(scene.add_child(root, b), Err(SceneError::AlreadyParented { child: b }));
        assert_eq!(
            scene.add_child(b, b),
            Err(SceneError::AlreadyParented { child: b }),
            "attached nodes are rejected before the cycle check"
        );
        scene.remove_from_parent(a).unwrap();
        assert_eq!(
            scene.add_child(b, a),
            Err(SceneError::WouldCreateCycle { parent: b, child: a })
        );
        let lone = scene.create_node();
        assert_eq!(
            scene.add_child(lone, lone),
            Err(SceneError::WouldCreateCycle {
                parent: lone,
                child: lone
            })
        );
        assert_eq!(scene.add_child(a, root), Err(SceneError::RootNode));
        assert_eq!(scene.destroy_node(root), Err(SceneError::RootNode));
        assert_eq!(scene.remove_from_parent(root), Err(SceneError::RootNode));
    }

    #[test]
    fn destroy_removes_subtree() {
        let mut scene = scene();
        let root = scene.root();
        let parent = scene.create_node();
        let a = scene.create_node();
        let b = scene.create_node();
        let grandchild = scene.create_node();
        scene.add_child(root, parent).unwrap();
        scene.add_child(parent, a).unwrap();
        scene.add_child(parent, b).unwrap();
        scene.add_child(a, grandchild).unwrap();

        scene.destroy_node(parent).unwrap();
        for id in [parent, a, b, grandchild] {
            assert!(!scene.is_alive(id), "{id:?} destroyed with its owner");
        }
        assert_eq!(scene.children(root).unwrap().count(), 0);
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn axis_conflict_rejected() {
        let mut scene = scene();
        let node = scene.create_node();
        scene.set_relative_size_axes(node, Axes::X).unwrap();
        assert_eq!(
            scene.set_auto_size_axes(node, Axes::Both),
            Err(SceneError::AxisConflict {
                node,
                axes: Axes::X
            })
        );
        assert_eq!(scene.set_auto_size_axes(node, Axes::Y), Ok(()));
        assert_eq!(
            scene.set_relative_size_axes(node, Axes::Y),
            Err(SceneError::AxisConflict {
                node,
                axes: Axes::Y
            })
        );
        assert_eq!(
            scene.size(node).map(|_| ()),
            Ok(()),
            "failed configuration leaves the node usable"
        );
    }

    #[test]
    fn texture_released_once_on_destroy() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&disposed);
        let registry = Arc::new(ResourceRegistry::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        let texture = registry.register(Size::new(32.0, 16.0));
        registry.retain(texture).unwrap();

        let mut scene = Scene::new(SceneConfig::default(), Arc::clone(&registry));
        let sprite = scene.create_node();
        scene.set_texture(sprite, Some(texture)).unwrap();
        assert_eq!(scene.size(sprite), Ok(Vec2::new(32.0, 16.0)), "sized to the texture");

        scene.destroy_node(sprite).unwrap();
        assert_eq!(disposed.load(Ordering::SeqCst), 0, "external holder remains");
        assert!(registry.release(texture).unwrap());
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        drop(scene);
        assert_eq!(disposed.load(Ordering::SeqCst), 1, "no second disposal");
    }

    #[test]
    fn replacing_texture_releases_previous() {
        let registry = Arc::new(ResourceRegistry::default());
        let first = registry.register(Size::new(8.0, 8.0));
        let second = registry.register(Size::new(16.0, 16.0));

        let mut scene = Scene::new(SceneConfig::default(), Arc::clone(&registry));
        let sprite = scene.create_node();
        scene.set_texture(sprite, Some(first)).unwrap();
        scene.set_texture(sprite, Some(second)).unwrap();
        assert!(!registry.is_live(first), "sole holder released it");
        assert!(registry.is_live(second));
        assert_eq!(scene.size(sprite), Ok(Vec2::new(16.0, 16.0)), "sized to the new texture");

        assert_eq!(
            scene.set_texture(sprite, Some(first)),
            Err(SceneError::UnknownResource(first))
        );
        assert_eq!(scene.payload(sprite).unwrap().texture(), Some(second), "unchanged on error");

        drop(scene);
        assert!(!registry.is_live(second), "dropping the scene releases held textures");
    }

    #[test]
    fn clearing_texture_zeroes_size() {
        let registry = Arc::new(ResourceRegistry::default());
        let texture = registry.register(Size::new(24.0, 12.0));
        let mut scene = Scene::new(SceneConfig::default(), Arc::clone(&registry));
        let sprite = scene.create_node();
        scene.set_texture(sprite, Some(texture)).unwrap();
        assert_eq!(scene.draw_size(sprite), Ok(Size::new(24.0, 12.0)));

        scene.set_texture(sprite, None).unwrap();
        assert_eq!(scene.size(sprite), Ok(Vec2::ZERO), "no texture, no size");
        assert_eq!(scene.draw_size(sprite), Ok(Size::ZERO), "resolved size follows");
        assert!(!registry.is_live(texture), "cleared texture released");
        assert_eq!(
            scene.payload(sprite).unwrap(),
            Payload::Sprite(SpriteContent::default()),
            "still a sprite"
        );
    }

    #[test]
    fn no_op_writes_do_not_mark() {
        let mut scene = scene();
        let node = scene.create_node();
        scene.update();
        scene.set_position(node, Vec2::ZERO).unwrap();
        scene.set_alpha(node, 1.0).unwrap();
        assert!(scene.update().is_empty(), "writing current values changes nothing");
    }
}
