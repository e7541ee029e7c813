//! Per-step movement resolution
//!
//! Based on Game Engine Architecture 3rd Edition, Section 16.6:
//! "Game object updates are typically performed once per frame."
//!
//! One step is a bounded batch of independent per-body resolutions:
//! gather candidates, run the narrow phase, then commit every scaled
//! movement at once. Grid occupancy is only rewritten in the commit
//! phase, after the last narrow-phase read has finished.

use thiserror::Error;

use crate::foundation::logging::debug;
use crate::physics::{CandidateSet, CollisionEngine};
use crate::world::World;

/// Why a simulation step was aborted before commit
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// A moving body's handle stopped resolving mid-step
    #[error("body handle vanished during step resolution")]
    MissingBody,
}

/// Counters for one resolved simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSummary {
    /// Bodies that had a pending movement this step
    pub moved: usize,
    /// Of those, how many were shortened by an obstacle
    pub blocked: usize,
}

/// Orchestrates one simulation step over the whole world
pub struct MovementResolver {
    engine: Box<dyn CollisionEngine>,
}

impl MovementResolver {
    /// Create a resolver around an injected narrow-phase strategy
    pub fn new(engine: Box<dyn CollisionEngine>) -> Self {
        Self { engine }
    }

    /// The injected narrow-phase strategy
    pub fn engine(&self) -> &dyn CollisionEngine {
        self.engine.as_ref()
    }

    /// Resolve and commit one simulation step
    ///
    /// For every body with a pending movement: collect its broad-phase
    /// candidates, run the narrow phase, then scale the movement by the
    /// resolved fraction and commit the new location. Commits are
    /// all-or-nothing: an error aborts before the first location is
    /// written, leaving the previously committed state authoritative.
    pub fn step(&self, world: &mut World) -> Result<StepSummary, StepError> {
        let movers = world.moving_bodies();
        let batch: Vec<CandidateSet> = movers
            .iter()
            .map(|&target| CandidateSet {
                target,
                candidates: world.find_collision_neighbors_of(target),
            })
            .collect();

        self.engine.resolve_batch(world.bodies_mut(), &batch);

        // Validate every mover before touching any location, so a failure
        // cannot leave the step half-committed.
        if movers.iter().any(|&key| world.body(key).is_none()) {
            return Err(StepError::MissingBody);
        }

        let mut blocked = 0;
        for &key in &movers {
            // Presence was checked above; a stale key here is unreachable.
            let Some(body) = world.body_mut(key) else {
                return Err(StepError::MissingBody);
            };
            let result = body.take_step_result();
            if result.obstacle.is_some() {
                blocked += 1;
            }
            body.border_mut().compute_new_location(result.fraction);
            world.refresh_occupancy(key);
        }

        debug!(
            "step resolved {} moving bodies, {} blocked",
            movers.len(),
            blocked
        );
        Ok(StepSummary {
            moved: movers.len(),
            blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::{Border, ParallelCollisionEngine, SerialCollisionEngine};
    use crate::spatial::{Grid, GridConfig};
    use crate::world::{BodyFlags, BodyKey, NodeKind, World};
    use approx::assert_relative_eq;

    fn test_world() -> (World, crate::world::NodeKey) {
        let mut world = World::new(Grid::new(GridConfig::universe(Vec3::new(
            -64.0, -64.0, -64.0,
        ))));
        let room = world
            .add_node(
                world.root(),
                NodeKind::Room,
                Some(Grid::new(GridConfig::room(Vec3::zeros()))),
            )
            .unwrap();
        (world, room)
    }

    fn resolver(granularity: u32) -> MovementResolver {
        MovementResolver::new(Box::new(SerialCollisionEngine::new(granularity).unwrap()))
    }

    #[test]
    fn test_unobstructed_movement_commits_fully() {
        let (mut world, room) = test_world();
        let mover = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(2.0, 2.0, 2.0), 0.5),
                BodyFlags::MOVABLE,
            )
            .unwrap();
        world
            .body_mut(mover)
            .unwrap()
            .set_movement(Vec3::new(1.0, 0.0, 0.0));

        let summary = resolver(10).step(&mut world).unwrap();

        assert_eq!(summary, StepSummary { moved: 1, blocked: 0 });
        assert_eq!(
            world.body(mover).unwrap().border().location(),
            Vec3::new(3.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_blocked_movement_is_scaled() {
        let (mut world, room) = test_world();
        // The mover reaches the obstacle's face at fraction 0.25 of its
        // 4-unit movement; granularity 10 quantizes the commit to 0.2.
        let mover = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(2.0, 2.0, 2.0), 0.5),
                BodyFlags::MOVABLE,
            )
            .unwrap();
        let obstacle = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(4.0, 2.0, 2.0), 0.5),
                BodyFlags::empty(),
            )
            .unwrap();
        world
            .body_mut(mover)
            .unwrap()
            .set_movement(Vec3::new(4.0, 0.0, 0.0));

        let summary = resolver(10).step(&mut world).unwrap();

        assert_eq!(summary.blocked, 1);
        let body = world.body(mover).unwrap();
        assert_relative_eq!(body.border().location().x, 2.8);
        // The resolved obstacle persists for the next step's skip rule.
        assert!(body.is_last_obstacle(obstacle));
        // Working state is cleared once committed.
        assert!(body.nearest().obstacle.is_none());
    }

    #[test]
    fn test_immediate_contact_commits_nothing() {
        let (mut world, room) = test_world();
        let mover = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(2.0, 2.0, 2.0), 0.5),
                BodyFlags::MOVABLE,
            )
            .unwrap();
        let _wall = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(3.0, 2.0, 2.0), 0.5),
                BodyFlags::empty(),
            )
            .unwrap();
        world
            .body_mut(mover)
            .unwrap()
            .set_movement(Vec3::new(2.0, 0.0, 0.0));

        resolver(10).step(&mut world).unwrap();

        // Touching at rest: the first sample already overlaps.
        assert_eq!(
            world.body(mover).unwrap().border().location(),
            Vec3::new(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_stationary_bodies_are_untouched() {
        let (mut world, room) = test_world();
        let still = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(2.0, 2.0, 2.0), 0.5),
                BodyFlags::MOVABLE,
            )
            .unwrap();

        let summary = resolver(10).step(&mut world).unwrap();

        assert_eq!(summary, StepSummary { moved: 0, blocked: 0 });
        assert_eq!(
            world.body(still).unwrap().border().location(),
            Vec3::new(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_commit_refreshes_grid_occupancy() {
        let (mut world, room) = test_world();
        let mover = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(1.0, 1.0, 1.0), 0.5),
                BodyFlags::MOVABLE,
            )
            .unwrap();
        let witness = world
            .add_body(
                room,
                Border::with_uniform_scale(Vec3::new(9.0, 1.0, 1.0), 0.5),
                BodyFlags::empty(),
            )
            .unwrap();

        // Far apart: different cells, no neighbors yet.
        assert!(world.find_collision_neighbors_of(witness).is_empty());

        world
            .body_mut(mover)
            .unwrap()
            .set_movement(Vec3::new(7.5, 0.0, 0.0));
        resolver(10).step(&mut world).unwrap();

        // After the commit the mover's occupancy follows it into the
        // witness's cell.
        assert!(world.find_collision_neighbors_of(witness).contains(&mover));
    }

    #[test]
    fn test_serial_and_parallel_steps_agree() {
        fn populate(world: &mut World, room: crate::world::NodeKey) -> Vec<BodyKey> {
            let mut keys = Vec::new();
            for i in 0..5 {
                let x = 2.0 + 2.5 * i as f32;
                let key = world
                    .add_body(
                        room,
                        Border::with_uniform_scale(Vec3::new(x, 3.0, 8.0), 0.5),
                        BodyFlags::MOVABLE,
                    )
                    .unwrap();
                world
                    .body_mut(key)
                    .unwrap()
                    .set_movement(Vec3::new(3.0 - x, 0.0, 0.0));
                keys.push(key);
            }
            keys
        }

        let (mut serial_world, serial_room) = test_world();
        let (mut parallel_world, parallel_room) = test_world();
        let serial_keys = populate(&mut serial_world, serial_room);
        let parallel_keys = populate(&mut parallel_world, parallel_room);

        MovementResolver::new(Box::new(SerialCollisionEngine::new(20).unwrap()))
            .step(&mut serial_world)
            .unwrap();
        MovementResolver::new(Box::new(ParallelCollisionEngine::new(20).unwrap()))
            .step(&mut parallel_world)
            .unwrap();

        for (&s, &p) in serial_keys.iter().zip(&parallel_keys) {
            assert_eq!(
                serial_world.body(s).unwrap().border().location(),
                parallel_world.body(p).unwrap().border().location(),
            );
        }
    }
}
