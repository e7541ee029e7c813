//! Body bounding volume and the swept-intersection predicate
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.4:
//! narrow-phase tests operate on bounding volumes, not render geometry.
//!
//! A `Border` is a body's axis-aligned bounding volume together with its
//! current location and pending movement vector. The collision engine only
//! ever reads a `Border`; the movement resolver alone commits movement.

use crate::foundation::math::Vec3;
use crate::world::Aabb;

/// A body's bounding volume plus its motion state
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    /// Current location (box center) in world space
    location: Vec3,

    /// Per-axis half-extents of the box
    half_extents: Vec3,

    /// Pending movement vector for the current simulation step
    movement: Vec3,
}

impl Border {
    /// Create a border with per-axis half-extents
    pub fn new(location: Vec3, half_extents: Vec3) -> Self {
        Self {
            location,
            half_extents,
            movement: Vec3::zeros(),
        }
    }

    /// Create a border with a uniform half-extent on all axes
    pub fn with_uniform_scale(location: Vec3, scale: f32) -> Self {
        Self::new(location, Vec3::new(scale, scale, scale))
    }

    /// Current location (box center)
    pub fn location(&self) -> Vec3 {
        self.location
    }

    /// Per-axis half-extents
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Pending movement vector
    pub fn movement(&self) -> Vec3 {
        self.movement
    }

    /// Set the pending movement vector for the next step
    pub fn set_movement(&mut self, movement: Vec3) {
        self.movement = movement;
    }

    /// Whether the pending movement is exactly zero
    pub fn is_stationary(&self) -> bool {
        self.movement == Vec3::zeros()
    }

    /// Bounding box after applying `fraction` of the pending movement
    pub fn aabb_at(&self, fraction: f32) -> Aabb {
        Aabb::from_center_extents(
            self.location + self.movement * fraction,
            self.half_extents,
        )
    }

    /// Bounding box at the current location, movement ignored
    pub fn aabb(&self) -> Aabb {
        self.aabb_at(0.0)
    }

    /// Swept-intersection predicate
    ///
    /// Returns whether, after scaling this border's movement by
    /// `fraction` and leaving `other` fixed, the two volumes intersect.
    /// Symmetric resolution is performed by the caller swapping roles.
    pub fn overlaps(&self, other: &Border, fraction: f32) -> bool {
        self.aabb_at(fraction).intersects(&other.aabb())
    }

    /// Commit the pending movement scaled by the resolved safe fraction
    ///
    /// Consumes the pending movement; called only by the movement resolver
    /// once the narrow phase has produced the fraction.
    pub fn compute_new_location(&mut self, fraction: f32) {
        self.location += self.movement * fraction;
        self.movement = Vec3::zeros();
    }
}
