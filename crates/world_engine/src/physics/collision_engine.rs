//! Narrow-phase collision engines
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.4:
//! "The narrow phase performs detailed shape-to-shape tests."
//!
//! Both engines implement the same contract: given a target and an
//! obstacle, find the largest fraction of the target's pending movement
//! that can be applied without the borders overlapping, discretized by a
//! fixed sample count. The serial engine walks pairs sequentially; the
//! parallel engine fans per-target candidate sets across a work-stealing
//! pool with task-local minimum accumulation, so both produce identical
//! results for the same inputs.

use rayon::prelude::*;
use slotmap::SlotMap;

use crate::config::ConfigError;
use crate::foundation::logging::trace;
use crate::physics::Border;
use crate::world::{Body, BodyKey};

/// The body arena the narrow phase operates on
pub type BodyMap = SlotMap<BodyKey, Body>;

/// One target body and its broad-phase collision candidates
#[derive(Debug, Clone)]
pub struct CandidateSet {
    /// The moving body being resolved
    pub target: BodyKey,
    /// Candidate obstacles from the broad phase; never contains `target`
    pub candidates: Vec<BodyKey>,
}

/// Largest safe fraction of `target`'s pending movement against `obstacle`
///
/// Linear scan: for `step = 1..=granularity`, test overlap at
/// `step / granularity`; the first overlapping step yields
/// `(step - 1) / granularity`, and a clean scan yields `1.0`. Precision is
/// quantized to `1 / granularity`; the scan is deliberately linear rather
/// than bisecting, so downstream consumers see the exact quantized values.
pub fn compute_collision(target: &Border, obstacle: &Border, granularity: u32) -> f32 {
    debug_assert!(granularity > 0, "granularity is validated at construction");

    if target.is_stationary() {
        return 1.0;
    }

    let samples = granularity as f32;
    for step in 1..=granularity {
        if target.overlaps(obstacle, step as f32 / samples) {
            return (step - 1) as f32 / samples;
        }
    }
    1.0
}

/// Narrow-phase execution strategy
///
/// Injected at construction by the factory; callers hold a
/// `Box<dyn CollisionEngine>` and never care which strategy runs.
pub trait CollisionEngine: Send + Sync {
    /// Number of movement samples per pair test
    fn granularity(&self) -> u32;

    /// Test one (target, obstacle) pair and fold the result into the
    /// target's nearest-obstacle running minimum
    ///
    /// Skips the pair when the target is not a camera-bearing actor and
    /// the obstacle is the one it already resolved against last step;
    /// re-testing the same blocker every frame buys nothing.
    fn detect_collision(&self, bodies: &mut BodyMap, target: BodyKey, obstacle: BodyKey) {
        debug_assert_ne!(target, obstacle, "callers exclude self-pairs");

        let (Some(target_body), Some(obstacle_body)) = (bodies.get(target), bodies.get(obstacle))
        else {
            return;
        };

        if !target_body.is_camera() && target_body.is_last_obstacle(obstacle) {
            trace!("skipping re-test against last obstacle {obstacle:?}");
            return;
        }

        let fraction = compute_collision(
            target_body.border(),
            obstacle_body.border(),
            self.granularity(),
        );
        if let Some(target_body) = bodies.get_mut(target) {
            target_body.update_obstacle_if_nearer(obstacle, fraction);
        }
    }

    /// Run the narrow phase for a whole batch of candidate sets
    ///
    /// After this returns, every target body holds the minimum fraction
    /// and nearest obstacle across its candidates. Only scheduling may
    /// differ between implementations, never the result.
    fn resolve_batch(&self, bodies: &mut BodyMap, batch: &[CandidateSet]);
}

/// Task-local evaluation of one candidate set against a read-only arena
///
/// Shared by the parallel strategy (and equivalent to what the serial
/// strategy accumulates through `detect_collision`): a running strict
/// minimum starting at 1.0, first-found obstacle winning ties.
fn evaluate_set(
    bodies: &BodyMap,
    set: &CandidateSet,
    granularity: u32,
) -> Option<(BodyKey, f32)> {
    let target = bodies.get(set.target)?;
    let mut nearest: Option<(BodyKey, f32)> = None;

    for &obstacle_key in &set.candidates {
        debug_assert_ne!(set.target, obstacle_key, "callers exclude self-pairs");
        let Some(obstacle) = bodies.get(obstacle_key) else {
            continue;
        };
        if !target.is_camera() && target.is_last_obstacle(obstacle_key) {
            continue;
        }

        let fraction = compute_collision(target.border(), obstacle.border(), granularity);
        let current = nearest.map_or(1.0, |(_, best)| best);
        if fraction < current {
            nearest = Some((obstacle_key, fraction));
        }
    }
    nearest
}

/// Sequential narrow phase: every pair evaluated on the calling thread
#[derive(Debug, Clone)]
pub struct SerialCollisionEngine {
    granularity: u32,
}

impl SerialCollisionEngine {
    /// Create a serial engine; a zero granularity is a configuration error
    pub fn new(granularity: u32) -> Result<Self, ConfigError> {
        if granularity == 0 {
            return Err(ConfigError::Invalid(
                "collision granularity must be positive".to_string(),
            ));
        }
        Ok(Self { granularity })
    }
}

impl CollisionEngine for SerialCollisionEngine {
    fn granularity(&self) -> u32 {
        self.granularity
    }

    fn resolve_batch(&self, bodies: &mut BodyMap, batch: &[CandidateSet]) {
        for set in batch {
            for &obstacle in &set.candidates {
                self.detect_collision(bodies, set.target, obstacle);
            }
        }
    }
}

/// Parallel narrow phase: candidate sets fan out across rayon tasks
///
/// Pairs are partitioned by target, not by sample step, so each task
/// reads the shared arena and accumulates a private minimum; the single
/// write into each target's nearest-obstacle slot happens afterwards on
/// the calling thread. No two tasks ever race on one slot.
#[derive(Debug, Clone)]
pub struct ParallelCollisionEngine {
    granularity: u32,
}

impl ParallelCollisionEngine {
    /// Create a parallel engine; a zero granularity is a configuration error
    pub fn new(granularity: u32) -> Result<Self, ConfigError> {
        if granularity == 0 {
            return Err(ConfigError::Invalid(
                "collision granularity must be positive".to_string(),
            ));
        }
        Ok(Self { granularity })
    }
}

impl CollisionEngine for ParallelCollisionEngine {
    fn granularity(&self) -> u32 {
        self.granularity
    }

    fn resolve_batch(&self, bodies: &mut BodyMap, batch: &[CandidateSet]) {
        let shared: &BodyMap = bodies;
        let outcomes: Vec<(BodyKey, Option<(BodyKey, f32)>)> = batch
            .par_iter()
            .map(|set| (set.target, evaluate_set(shared, set, self.granularity)))
            .collect();

        // Sequential reduction into the per-body slots; the barrier above
        // guarantees no narrow-phase read is still in flight.
        for (target, outcome) in outcomes {
            if let Some((obstacle, fraction)) = outcome {
                if let Some(body) = bodies.get_mut(target) {
                    body.update_obstacle_if_nearer(obstacle, fraction);
                }
            }
        }
    }
}
