//! Bodies: the leaves of the composite world tree
//!
//! A body is anything that occupies space: a wall, a movable thing, a
//! character, or a camera-bearing actor. The distinction is carried by
//! capability flags rather than downcasts, so collaborators ask what a body
//! can do instead of what concrete type it is.

use bitflags::bitflags;

use crate::foundation::math::Vec3;
use crate::physics::Border;
use crate::world::{BodyKey, NodeKey};

bitflags! {
    /// Capability flags for a body
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BodyFlags: u32 {
        /// Carries the player camera; exempt from the last-obstacle skip rule
        const CAMERA = 1 << 0;
        /// May be assigned a movement vector (walls never are)
        const MOVABLE = 1 << 1;
        /// Eligible to receive a door or window opening
        const ACCEPTS_OPENINGS = 1 << 2;
    }
}

/// Opaque handle to a renderable polygon descriptor
///
/// The core never interprets these; they ride along so the rendering layer
/// can find its geometry again after the resolver has moved a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderableRef(pub u64);

/// Running minimum of the narrow phase for one simulation step
///
/// Transient working state: reset when the step's movement is committed.
#[derive(Debug, Clone, Copy)]
pub struct NearestObstacle {
    /// Smallest safe movement fraction found so far
    pub fraction: f32,
    /// The obstacle that produced it, if any pair test came up short of 1.0
    pub obstacle: Option<BodyKey>,
}

impl Default for NearestObstacle {
    fn default() -> Self {
        Self {
            fraction: 1.0,
            obstacle: None,
        }
    }
}

/// A body in the world: bounding volume, capabilities, and per-step
/// collision working state
#[derive(Debug, Clone)]
pub struct Body {
    border: Border,
    flags: BodyFlags,
    node: NodeKey,
    renderables: Vec<RenderableRef>,
    nearest: NearestObstacle,
    /// Obstacle resolved in the previous step; feeds the narrow-phase skip
    /// rule for one step, then is replaced
    last_obstacle: Option<BodyKey>,
}

impl Body {
    /// Create a body owned by the given composite node
    pub fn new(border: Border, flags: BodyFlags, node: NodeKey) -> Self {
        Self {
            border,
            flags,
            node,
            renderables: Vec::new(),
            nearest: NearestObstacle::default(),
            last_obstacle: None,
        }
    }

    /// Attach renderable polygon descriptors
    pub fn with_renderables(mut self, renderables: Vec<RenderableRef>) -> Self {
        self.renderables = renderables;
        self
    }

    /// The body's bounding volume and motion state
    pub fn border(&self) -> &Border {
        &self.border
    }

    /// Mutable access to the border; movement commits go through the
    /// movement resolver, which refreshes grid occupancy afterwards
    pub fn border_mut(&mut self) -> &mut Border {
        &mut self.border
    }

    /// Pending movement vector
    pub fn movement(&self) -> Vec3 {
        self.border.movement()
    }

    /// Set the pending movement vector for the next step
    pub fn set_movement(&mut self, movement: Vec3) {
        self.border.set_movement(movement);
    }

    /// Capability flags
    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    /// Whether this body carries the player camera
    pub fn is_camera(&self) -> bool {
        self.flags.contains(BodyFlags::CAMERA)
    }

    /// Whether this body may be assigned movement
    pub fn is_movable(&self) -> bool {
        self.flags.contains(BodyFlags::MOVABLE)
    }

    /// Whether this body can receive a door or window opening
    pub fn supports_openings(&self) -> bool {
        self.flags.contains(BodyFlags::ACCEPTS_OPENINGS)
    }

    /// Owning composite node
    pub fn node(&self) -> NodeKey {
        self.node
    }

    /// Renderable descriptors attached to this body
    pub fn renderables(&self) -> &[RenderableRef] {
        &self.renderables
    }

    /// Whether `obstacle` is the obstacle resolved in the previous step
    pub fn is_last_obstacle(&self, obstacle: BodyKey) -> bool {
        self.last_obstacle == Some(obstacle)
    }

    /// Current narrow-phase running minimum
    pub fn nearest(&self) -> NearestObstacle {
        self.nearest
    }

    /// Record `obstacle` as the nearest so far if its fraction is smaller
    ///
    /// Returns whether the running minimum changed. The reduction is a plain
    /// minimum, so evaluation order across obstacles cannot change the
    /// committed fraction.
    pub fn update_obstacle_if_nearer(&mut self, obstacle: BodyKey, fraction: f32) -> bool {
        if fraction < self.nearest.fraction {
            self.nearest = NearestObstacle {
                fraction,
                obstacle: Some(obstacle),
            };
            true
        } else {
            false
        }
    }

    /// Take the step's resolution and reset the working state
    ///
    /// The resolved obstacle identity persists as `last_obstacle` for the
    /// next step's skip rule; everything else is cleared.
    pub fn take_step_result(&mut self) -> NearestObstacle {
        let result = self.nearest;
        self.last_obstacle = result.obstacle;
        self.nearest = NearestObstacle::default();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys() -> (NodeKey, BodyKey, BodyKey) {
        let mut nodes: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let mut bodies: SlotMap<BodyKey, ()> = SlotMap::with_key();
        (nodes.insert(()), bodies.insert(()), bodies.insert(()))
    }

    #[test]
    fn test_running_minimum() {
        let (node, a, b) = keys();
        let mut body = Body::new(
            Border::with_uniform_scale(Vec3::zeros(), 1.0),
            BodyFlags::MOVABLE,
            node,
        );

        assert!(body.update_obstacle_if_nearer(a, 0.6));
        assert!(!body.update_obstacle_if_nearer(b, 0.8));
        assert!(body.update_obstacle_if_nearer(b, 0.2));

        let nearest = body.nearest();
        assert_eq!(nearest.obstacle, Some(b));
        assert_eq!(nearest.fraction, 0.2);
    }

    #[test]
    fn test_take_step_result_persists_last_obstacle() {
        let (node, a, _) = keys();
        let mut body = Body::new(
            Border::with_uniform_scale(Vec3::zeros(), 1.0),
            BodyFlags::MOVABLE,
            node,
        );

        body.update_obstacle_if_nearer(a, 0.3);
        let result = body.take_step_result();

        assert_eq!(result.fraction, 0.3);
        assert!(body.is_last_obstacle(a));
        // Working state is reset for the next tick.
        assert_eq!(body.nearest().fraction, 1.0);
        assert!(body.nearest().obstacle.is_none());
    }

    #[test]
    fn test_capability_flags() {
        let (node, _, _) = keys();
        let actor = Body::new(
            Border::with_uniform_scale(Vec3::zeros(), 1.0),
            BodyFlags::CAMERA | BodyFlags::MOVABLE,
            node,
        );
        let wall = Body::new(
            Border::with_uniform_scale(Vec3::zeros(), 1.0),
            BodyFlags::ACCEPTS_OPENINGS,
            node,
        );

        assert!(actor.is_camera());
        assert!(actor.is_movable());
        assert!(!actor.supports_openings());
        assert!(wall.supports_openings());
        assert!(!wall.is_movable());
    }
}
