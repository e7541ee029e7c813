//! # World Engine
//!
//! A partitioned 3D world simulation core with swept collision resolution.
//!
//! Every simulation step, each moving body is resolved against its
//! neighborhood: how far may it travel before it strikes another body or a
//! wall? The answer is a fraction of its pending movement, found by a
//! two-phase pipeline:
//!
//! - **Broad phase**: a uniform [`spatial::Grid`] per region culls the
//!   pairs that cannot possibly collide.
//! - **Narrow phase**: a [`physics::CollisionEngine`] samples the swept
//!   [`physics::Border`] pair test at a fixed granularity, keeping the
//!   nearest obstacle per body.
//! - **Commit**: the [`physics::MovementResolver`] scales each movement by
//!   its resolved fraction and refreshes grid occupancy, all-or-nothing.
//!
//! Serial and parallel narrow-phase strategies are interchangeable and
//! produce identical results; the [`world::WorldFactory`] picks one from
//! configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use world_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = WorldFactory::new(SimulationConfig::default())?;
//!     let mut world = factory.create_world();
//!     let room = factory.add_room(&mut world, Vec3::new(8.0, 6.0, 8.0))?;
//!
//!     let actor = factory.add_actor(
//!         &mut world,
//!         room.node,
//!         Vec3::new(8.0, 6.0, 8.0),
//!         BorderScale::Uniform(0.5),
//!     )?;
//!     world.body_mut(actor).unwrap().set_movement(Vec3::new(1.0, 0.0, 0.0));
//!
//!     let resolver = factory.create_resolver()?;
//!     resolver.step(&mut world)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;
pub mod world;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineStrategy, SimulationConfig},
        foundation::math::Vec3,
        physics::{
            Border, CollisionEngine, MovementResolver, ParallelCollisionEngine,
            SerialCollisionEngine, StepError, StepSummary,
        },
        spatial::{Grid, GridConfig},
        world::{
            Body, BodyFlags, BodyKey, BorderScale, NodeKey, World, WorldError, WorldFactory,
        },
    };
}
