//! The composite world: arenas, ownership, and neighbor queries
//!
//! Bodies and nodes live in slotmap arenas and refer to each other by
//! handle, so a removed node can never leave a dangling parent pointer
//! behind; a stale key simply fails to resolve.

mod body;
mod bounds;
mod factory;
mod node;

pub use body::{Body, BodyFlags, NearestObstacle, RenderableRef};
pub use bounds::Aabb;
pub use factory::{BorderScale, RoomHandle, WorldFactory};
pub use node::{Node, NodeKind};

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::physics::Border;
use crate::spatial::Grid;

new_key_type! {
    /// Handle to a body in the world arena
    pub struct BodyKey;
}

new_key_type! {
    /// Handle to a composite node in the world arena
    pub struct NodeKey;
}

/// Errors raised by world mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// A node handle did not resolve (node removed or foreign key)
    #[error("unknown node handle")]
    UnknownNode,
}

/// The world: a tree of composite nodes over arenas of nodes and bodies
///
/// The universe root always owns a grid, so the upward delegation chain of
/// `find_collision_neighbors_of` terminates.
pub struct World {
    bodies: SlotMap<BodyKey, Body>,
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl World {
    /// Create a world whose universe root owns the given grid
    pub fn new(universe_grid: Grid) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Universe, None, Some(universe_grid)));
        Self {
            bodies: SlotMap::with_key(),
            nodes,
            root,
        }
    }

    /// Handle of the universe root node
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Body arena, read-only
    pub fn bodies(&self) -> &SlotMap<BodyKey, Body> {
        &self.bodies
    }

    /// Body arena, mutable
    ///
    /// Callers that change a committed location directly must follow up
    /// with [`World::refresh_occupancy`].
    pub fn bodies_mut(&mut self) -> &mut SlotMap<BodyKey, Body> {
        &mut self.bodies
    }

    /// Look up a body
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Look up a body mutably
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    /// Look up a node
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Add a composite node under `parent`
    pub fn add_node(
        &mut self,
        parent: NodeKey,
        kind: NodeKind,
        grid: Option<Grid>,
    ) -> Result<NodeKey, WorldError> {
        if !self.nodes.contains_key(parent) {
            return Err(WorldError::UnknownNode);
        }
        let key = self.nodes.insert(Node::new(kind, Some(parent), grid));
        self.nodes[parent].add_child_node(key);
        Ok(key)
    }

    /// Add a body under `node` and register it with the region's grid
    pub fn add_body(
        &mut self,
        node: NodeKey,
        border: Border,
        flags: BodyFlags,
    ) -> Result<BodyKey, WorldError> {
        if !self.nodes.contains_key(node) {
            return Err(WorldError::UnknownNode);
        }
        let key = self.bodies.insert(Body::new(border, flags, node));
        self.nodes[node].add_child(key);

        if let Some(grid_node) = self.grid_node_for(node) {
            let border = self.bodies[key].border().clone();
            if let Some(grid) = self.nodes[grid_node].grid_mut() {
                grid.insert(key, &border);
            }
        }
        Ok(key)
    }

    /// Remove a body from its owning node and from its region's grid
    ///
    /// Returns the removed body, or `None` for a stale handle.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key)?;
        let owner = body.node();
        if let Some(node) = self.nodes.get_mut(owner) {
            node.remove_child(key);
        }
        if let Some(grid_node) = self.grid_node_for(owner) {
            if let Some(grid) = self.nodes[grid_node].grid_mut() {
                grid.remove(key);
            }
        }
        Some(body)
    }

    /// Enumerate collision candidates for `target`
    ///
    /// The owning node answers from its grid; a node without a grid
    /// delegates to its parent chain, which terminates at the universe
    /// root. The result never contains `target` and never crosses a
    /// room boundary (each room's bodies live only in that room's grid).
    pub fn find_collision_neighbors_of(&self, target: BodyKey) -> Vec<BodyKey> {
        let Some(body) = self.bodies.get(target) else {
            return Vec::new();
        };
        match self.grid_node_for(body.node()) {
            Some(grid_node) => self.nodes[grid_node]
                .grid()
                .map(|grid| grid.neighbors_of(target))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Recompute a body's grid occupancy after its location changed
    pub fn refresh_occupancy(&mut self, key: BodyKey) {
        let Some(body) = self.bodies.get(key) else {
            return;
        };
        let owner = body.node();
        let border = body.border().clone();
        if let Some(grid_node) = self.grid_node_for(owner) {
            if let Some(grid) = self.nodes[grid_node].grid_mut() {
                grid.update(key, &border);
            }
        }
    }

    /// Keys of all bodies with a pending non-zero movement, in arena order
    pub fn moving_bodies(&self) -> Vec<BodyKey> {
        self.bodies
            .iter()
            .filter(|(_, body)| !body.border().is_stationary())
            .map(|(key, _)| key)
            .collect()
    }

    /// Nearest ancestor (including `node` itself) that owns a grid
    fn grid_node_for(&self, node: NodeKey) -> Option<NodeKey> {
        let mut current = Some(node);
        while let Some(key) = current {
            let node = self.nodes.get(key)?;
            if node.has_grid() {
                return Some(key);
            }
            current = node.parent();
        }
        None
    }
}
