//! Factory for worlds, borders, and collision engines
//!
//! Collaborators never construct engine strategies or grids directly;
//! the factory reads the validated configuration and wires the concrete
//! pieces, so swapping serial for parallel execution is a config change.

use crate::config::{ConfigError, EngineStrategy, SimulationConfig};
use crate::foundation::math::Vec3;
use crate::physics::{
    Border, CollisionEngine, MovementResolver, ParallelCollisionEngine, SerialCollisionEngine,
};
use crate::spatial::Grid;
use crate::world::{BodyFlags, BodyKey, NodeKey, NodeKind, World, WorldError};

/// Wall slab thickness used when enclosing a room
const WALL_THICKNESS: f32 = 0.5;

/// Bounding-volume scale, uniform or per-axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderScale {
    /// Same half-extent on all three axes
    Uniform(f32),
    /// Explicit half-extents per axis
    PerAxis(Vec3),
}

/// Handles to a room built by the factory
#[derive(Debug, Clone)]
pub struct RoomHandle {
    /// The room's composite node
    pub node: NodeKey,
    /// The six enclosing wall bodies, in ±X, ±Y, ±Z order
    pub walls: [BodyKey; 6],
}

/// Builds worlds and their collaborators from a validated configuration
pub struct WorldFactory {
    config: SimulationConfig,
}

impl WorldFactory {
    /// Create a factory; the configuration is validated up front
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Create a border at `location` with the given scale
    pub fn create_border(&self, location: Vec3, scale: BorderScale) -> Border {
        match scale {
            BorderScale::Uniform(half_extent) => Border::with_uniform_scale(location, half_extent),
            BorderScale::PerAxis(half_extents) => Border::new(location, half_extents),
        }
    }

    /// Create the configured narrow-phase strategy
    pub fn create_engine(&self) -> Result<Box<dyn CollisionEngine>, ConfigError> {
        let granularity = self.config.granularity;
        Ok(match self.config.strategy {
            EngineStrategy::Serial => Box::new(SerialCollisionEngine::new(granularity)?),
            EngineStrategy::Parallel => Box::new(ParallelCollisionEngine::new(granularity)?),
        })
    }

    /// Create a movement resolver around the configured strategy
    pub fn create_resolver(&self) -> Result<MovementResolver, ConfigError> {
        Ok(MovementResolver::new(self.create_engine()?))
    }

    /// Create a world whose universe grid is centered on the origin
    pub fn create_world(&self) -> World {
        let span = self.config.universe_grid.span();
        let anchor = -span * 0.5;
        World::new(Grid::new(self.config.universe_grid.to_grid_config(anchor)))
    }

    /// Add a room centered at `center`, enclosed by six wall slabs
    ///
    /// The room's extent is exactly what its grid covers; the walls sit
    /// just inside that region so their occupancy never overflows it.
    pub fn add_room(&self, world: &mut World, center: Vec3) -> Result<RoomHandle, WorldError> {
        let settings = &self.config.room_grid;
        let half = settings.span() * 0.5;
        let anchor = center - half;

        let node = world.add_node(
            world.root(),
            NodeKind::Room,
            Some(Grid::new(settings.to_grid_config(anchor))),
        )?;

        let half_thickness = WALL_THICKNESS * 0.5;
        let mut walls = [BodyKey::default(); 6];
        let mut wall_index = 0;
        for axis in 0..3 {
            for sign in [1.0_f32, -1.0] {
                let mut location = center;
                location[axis] += sign * (half[axis] - half_thickness);

                // Slab: thin along its axis, inset on the other two so it
                // stays inside the room's grid region.
                let mut half_extents = half - Vec3::new(half_thickness, half_thickness, half_thickness);
                half_extents[axis] = half_thickness;

                walls[wall_index] = world.add_body(
                    node,
                    Border::new(location, half_extents),
                    BodyFlags::ACCEPTS_OPENINGS,
                )?;
                wall_index += 1;
            }
        }

        Ok(RoomHandle { node, walls })
    }

    /// Add a movable thing to a room
    pub fn add_thing(
        &self,
        world: &mut World,
        room: NodeKey,
        location: Vec3,
        scale: BorderScale,
    ) -> Result<BodyKey, WorldError> {
        world.add_body(room, self.create_border(location, scale), BodyFlags::MOVABLE)
    }

    /// Add an autonomous character to a room
    pub fn add_character(
        &self,
        world: &mut World,
        room: NodeKey,
        location: Vec3,
        scale: BorderScale,
    ) -> Result<BodyKey, WorldError> {
        world.add_body(room, self.create_border(location, scale), BodyFlags::MOVABLE)
    }

    /// Add the camera-bearing player actor to a room
    pub fn add_actor(
        &self,
        world: &mut World,
        room: NodeKey,
        location: Vec3,
        scale: BorderScale,
    ) -> Result<BodyKey, WorldError> {
        world.add_body(
            room,
            self.create_border(location, scale),
            BodyFlags::CAMERA | BodyFlags::MOVABLE,
        )
    }
}
