//! Composite nodes of the world tree
//!
//! Following Game Engine Architecture Chapter 11.2.7.4 - Scene Graphs.
//! The universe root and each room are nodes; walls, things, and
//! characters are body leaves owned by a node. Parent links are slotmap
//! handles, never owning references.

use crate::spatial::Grid;
use crate::world::{BodyKey, NodeKey};

/// Role of a composite node in the world tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The world root; always owns the universe-scale grid
    Universe,
    /// A room; owns a room-scale grid and its furniture/walls
    Room,
    /// A plain grouping node with no grid of its own
    Group,
}

/// One node of the composite world tree
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<BodyKey>,
    child_nodes: Vec<NodeKey>,
    grid: Option<Grid>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeKey>, grid: Option<Grid>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            child_nodes: Vec::new(),
            grid,
        }
    }

    /// Role of this node
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent node handle; `None` only for the universe root
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Bodies directly owned by this node, in insertion order
    pub fn children(&self) -> &[BodyKey] {
        &self.children
    }

    /// Child nodes (rooms under the universe, groups under rooms)
    pub fn child_nodes(&self) -> &[NodeKey] {
        &self.child_nodes
    }

    /// The node's own grid, if it answers neighbor queries directly
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub(crate) fn grid_mut(&mut self) -> Option<&mut Grid> {
        self.grid.as_mut()
    }

    /// Whether this node owns a grid
    pub fn has_grid(&self) -> bool {
        self.grid.is_some()
    }

    pub(crate) fn add_child(&mut self, body: BodyKey) {
        self.children.push(body);
    }

    pub(crate) fn remove_child(&mut self, body: BodyKey) {
        self.children.retain(|&k| k != body);
    }

    pub(crate) fn add_child_node(&mut self, node: NodeKey) {
        self.child_nodes.push(node);
    }
}
