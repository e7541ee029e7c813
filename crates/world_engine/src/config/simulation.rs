//! Simulation configuration: narrow-phase and grid parameters
//!
//! Grid dimensions are configuration, not compile-time constants, so
//! room-scale and universe-scale grids share one implementation.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::foundation::math::Vec3;
use crate::spatial::GridConfig;

/// Which narrow-phase execution strategy the factory should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStrategy {
    /// Evaluate all (target, obstacle) pairs sequentially
    Serial,
    /// Fan candidate sets out across a work-stealing thread pool
    Parallel,
}

/// Cell counts and cell dimensions for one grid instantiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Cell counts along X, Y, Z
    pub cell_counts: [usize; 3],
    /// Per-axis cell dimensions
    pub cell_size: [f32; 3],
}

impl GridSettings {
    /// Total world-space extent covered by the grid
    pub fn span(&self) -> Vec3 {
        Vec3::new(
            self.cell_size[0] * self.cell_counts[0] as f32,
            self.cell_size[1] * self.cell_counts[1] as f32,
            self.cell_size[2] * self.cell_counts[2] as f32,
        )
    }

    /// Concrete grid construction parameters anchored at `anchor`
    pub fn to_grid_config(&self, anchor: Vec3) -> GridConfig {
        GridConfig {
            cell_counts: self.cell_counts,
            cell_size: Vec3::new(self.cell_size[0], self.cell_size[1], self.cell_size[2]),
            anchor,
        }
    }

    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        if self.cell_counts.iter().any(|&n| n == 0) {
            return Err(ConfigError::Invalid(format!(
                "{label} grid cell counts must be positive, got {:?}",
                self.cell_counts
            )));
        }
        if self.cell_size.iter().any(|&s| s <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "{label} grid cell size must be positive, got {:?}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of movement samples per narrow-phase pair test
    pub granularity: u32,

    /// Narrow-phase execution strategy
    pub strategy: EngineStrategy,

    /// Room-scale grid parameters
    pub room_grid: GridSettings,

    /// Universe-scale grid parameters
    pub universe_grid: GridSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            granularity: 10,
            strategy: EngineStrategy::Serial,
            room_grid: GridSettings {
                cell_counts: [8, 6, 8],
                cell_size: [2.0, 2.0, 2.0],
            },
            universe_grid: GridSettings {
                cell_counts: [16, 16, 16],
                cell_size: [8.0, 8.0, 8.0],
            },
        }
    }
}

impl SimulationConfig {
    /// Reject invalid values before any engine or grid is built
    ///
    /// A non-positive granularity or degenerate grid is a configuration
    /// error; continuing with it cannot be made safe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.granularity == 0 {
            return Err(ConfigError::Invalid(
                "collision granularity must be positive".to_string(),
            ));
        }
        self.room_grid.validate("room")?;
        self.universe_grid.validate("universe")?;
        Ok(())
    }
}

impl crate::config::Config for SimulationConfig {}
