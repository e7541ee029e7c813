//! Collision resolution: narrow phase and per-step orchestration
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase." The broad phase lives in
//! [`crate::spatial`]; this module owns the narrow phase and the movement
//! resolver that commits its results.

mod border;
mod collision_engine;
mod movement_resolver;

pub use border::Border;
pub use collision_engine::{
    compute_collision, BodyMap, CandidateSet, CollisionEngine, ParallelCollisionEngine,
    SerialCollisionEngine,
};
pub use movement_resolver::{MovementResolver, StepError, StepSummary};
