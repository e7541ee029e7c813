//! Uniform grid spatial partitioning
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! A `Grid` divides a bounded region into a dense 3D array of fixed-size
//! cells and tracks which bodies overlap each cell. Room-scale and
//! universe-scale grids are the same type built from different
//! `GridConfig` values.

use slotmap::SecondaryMap;
use std::collections::HashSet;

use crate::foundation::logging::warn;
use crate::foundation::math::Vec3;
use crate::physics::Border;
use crate::world::{Aabb, BodyKey};

/// Construction parameters for a grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Cell counts along X, Y, Z
    pub cell_counts: [usize; 3],

    /// Per-axis cell dimensions
    pub cell_size: Vec3,

    /// World location of the grid's minimum corner
    pub anchor: Vec3,
}

impl GridConfig {
    /// Room-scale grid: 8×6×8 cells of 2.0 units
    pub fn room(anchor: Vec3) -> Self {
        Self {
            cell_counts: [8, 6, 8],
            cell_size: Vec3::new(2.0, 2.0, 2.0),
            anchor,
        }
    }

    /// Universe-scale grid: 16×16×16 cells of 8.0 units
    pub fn universe(anchor: Vec3) -> Self {
        Self {
            cell_counts: [16, 16, 16],
            cell_size: Vec3::new(8.0, 8.0, 8.0),
            anchor,
        }
    }

    /// World-space region covered by the grid
    pub fn bounds(&self) -> Aabb {
        let span = Vec3::new(
            self.cell_size.x * self.cell_counts[0] as f32,
            self.cell_size.y * self.cell_counts[1] as f32,
            self.cell_size.z * self.cell_counts[2] as f32,
        );
        Aabb::new(self.anchor, self.anchor + span)
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.cell_counts[0] * self.cell_counts[1] * self.cell_counts[2]
    }

    fn box_index(&self, coords: [usize; 3]) -> usize {
        let [nx, ny, _] = self.cell_counts;
        coords[0] + coords[1] * nx + coords[2] * nx * ny
    }
}

/// One fixed-size cell of the grid, tracking its occupants
#[derive(Debug, Clone)]
pub struct GridBox {
    /// Integer coordinates of this cell within the grid
    pub coords: [usize; 3],

    occupants: Vec<BodyKey>,
}

impl GridBox {
    fn new(coords: [usize; 3]) -> Self {
        Self {
            coords,
            occupants: Vec::new(),
        }
    }

    /// Bodies whose border currently overlaps this cell
    pub fn occupants(&self) -> &[BodyKey] {
        &self.occupants
    }
}

/// Dense 3D grid of cells over a bounded world region
#[derive(Debug, Clone)]
pub struct Grid {
    config: GridConfig,
    boxes: Vec<GridBox>,
    /// Box indices currently occupied per body; keeps removal proportional
    /// to the cells a body overlaps rather than the grid size
    occupancy: SecondaryMap<BodyKey, Vec<usize>>,
}

impl Grid {
    /// Create an empty grid from its configuration
    pub fn new(config: GridConfig) -> Self {
        debug_assert!(config.cell_counts.iter().all(|&n| n > 0));
        debug_assert!(config.cell_size.iter().all(|&s| s > 0.0));

        let [nx, ny, nz] = config.cell_counts;
        let mut boxes = Vec::with_capacity(config.cell_count());
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    boxes.push(GridBox::new([x, y, z]));
                }
            }
        }

        Self {
            config,
            boxes,
            occupancy: SecondaryMap::new(),
        }
    }

    /// Grid configuration
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// The cell at the given coordinates, if within range
    pub fn box_at(&self, coords: [usize; 3]) -> Option<&GridBox> {
        let [nx, ny, nz] = self.config.cell_counts;
        if coords[0] < nx && coords[1] < ny && coords[2] < nz {
            Some(&self.boxes[self.config.box_index(coords)])
        } else {
            None
        }
    }

    /// Coordinates of every cell the border's volume overlaps
    ///
    /// Coordinates are the floor of the border's location relative to the
    /// anchor, divided by the cell size; bounds spanning several cells
    /// yield each of them. Locations outside the grid clamp to the boundary
    /// cells (partial overflow) or yield nothing (fully outside).
    pub fn boxes_overlapping(&self, border: &Border) -> Vec<[usize; 3]> {
        let Some((lo, hi)) = self.coord_range(&border.aabb()) else {
            return Vec::new();
        };

        let mut coords = Vec::new();
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    coords.push([x, y, z]);
                }
            }
        }
        coords
    }

    /// Place a body into every cell its border overlaps
    ///
    /// Re-inserting an already-present body refreshes its occupancy.
    pub fn insert(&mut self, key: BodyKey, border: &Border) {
        self.remove(key);

        let indices: Vec<usize> = self
            .boxes_overlapping(border)
            .into_iter()
            .map(|coords| self.config.box_index(coords))
            .collect();

        for &index in &indices {
            self.boxes[index].occupants.push(key);
        }
        if !indices.is_empty() {
            self.occupancy.insert(key, indices);
        }
    }

    /// Clear a body from every cell it occupies
    pub fn remove(&mut self, key: BodyKey) {
        if let Some(indices) = self.occupancy.remove(key) {
            for index in indices {
                self.boxes[index].occupants.retain(|&k| k != key);
            }
        }
    }

    /// Recompute a body's occupancy after its committed location changed
    pub fn update(&mut self, key: BodyKey, border: &Border) {
        self.insert(key, border);
    }

    /// Union of occupants of all cells the body overlaps, excluding the
    /// body itself
    ///
    /// A body the grid does not know about has no neighbors; that is a
    /// soft "no interaction" outcome, not an error.
    pub fn neighbors_of(&self, key: BodyKey) -> Vec<BodyKey> {
        let Some(indices) = self.occupancy.get(key) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();
        for &index in indices {
            for &occupant in self.boxes[index].occupants() {
                if occupant != key && seen.insert(occupant) {
                    neighbors.push(occupant);
                }
            }
        }
        neighbors
    }

    /// Number of bodies tracked by the grid
    pub fn body_count(&self) -> usize {
        self.occupancy.len()
    }

    /// Remove all bodies from the grid
    pub fn clear(&mut self) {
        for grid_box in &mut self.boxes {
            grid_box.occupants.clear();
        }
        self.occupancy.clear();
    }

    /// Clamped cell-coordinate range covered by an AABB
    ///
    /// Returns `None` when the volume lies entirely outside the grid;
    /// partial overflow clamps to the boundary cells. Either case is
    /// logged so misplaced bodies are visible without corrupting
    /// neighboring cell data.
    fn coord_range(&self, aabb: &Aabb) -> Option<([usize; 3], [usize; 3])> {
        if !self.config.bounds().intersects(aabb) {
            warn!(
                "body bounds {:?}..{:?} lie outside grid region {:?}; skipped",
                aabb.min,
                aabb.max,
                self.config.bounds(),
            );
            return None;
        }

        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        let mut clamped = false;
        for axis in 0..3 {
            let count = self.config.cell_counts[axis] as isize;
            let local_min = (aabb.min[axis] - self.config.anchor[axis]) / self.config.cell_size[axis];
            let local_max = (aabb.max[axis] - self.config.anchor[axis]) / self.config.cell_size[axis];

            let raw_lo = local_min.floor() as isize;
            let raw_hi = local_max.floor() as isize;
            if raw_lo < 0 || raw_hi >= count {
                clamped = true;
            }
            lo[axis] = raw_lo.clamp(0, count - 1) as usize;
            hi[axis] = raw_hi.clamp(0, count - 1) as usize;
        }

        if clamped {
            warn!(
                "body bounds {:?}..{:?} overflow grid region; clamped to boundary cells",
                aabb.min, aabb.max,
            );
        }
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn body_keys(n: usize) -> Vec<BodyKey> {
        let mut map: SlotMap<BodyKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn room_grid() -> Grid {
        Grid::new(GridConfig::room(Vec3::zeros()))
    }

    #[test]
    fn test_box_coordinates_from_location() {
        let grid = room_grid();
        // Local coordinate (3.5, 1.0, 0.5) with 2.0 cells lands in cell
        // floor(3.5/2) = 1 on X, 0 on Y, 0 on Z.
        let border = Border::with_uniform_scale(Vec3::new(3.5, 1.0, 0.5), 0.25);

        let boxes = grid.boxes_overlapping(&border);
        assert_eq!(boxes, vec![[1, 0, 0]]);
    }

    #[test]
    fn test_body_spanning_cells_occupies_each() {
        let mut grid = room_grid();
        let keys = body_keys(1);
        // Centered on the boundary between cells 0 and 1 on X.
        let border = Border::with_uniform_scale(Vec3::new(2.0, 1.0, 1.0), 0.5);

        grid.insert(keys[0], &border);

        assert!(grid.box_at([0, 0, 0]).unwrap().occupants().contains(&keys[0]));
        assert!(grid.box_at([1, 0, 0]).unwrap().occupants().contains(&keys[0]));
    }

    #[test]
    fn test_occupancy_invariant_insert_remove() {
        let mut grid = room_grid();
        let keys = body_keys(2);
        let border_a = Border::with_uniform_scale(Vec3::new(1.0, 1.0, 1.0), 0.5);
        let border_b = Border::with_uniform_scale(Vec3::new(1.5, 1.0, 1.0), 0.5);

        grid.insert(keys[0], &border_a);
        grid.insert(keys[1], &border_b);
        assert!(grid.neighbors_of(keys[1]).contains(&keys[0]));

        grid.remove(keys[0]);
        assert!(!grid.neighbors_of(keys[1]).contains(&keys[0]));
    }

    #[test]
    fn test_neighbors_exclude_self_and_deduplicate() {
        let mut grid = room_grid();
        let keys = body_keys(2);
        // Both bodies span the same two cells; the neighbor must still be
        // reported once.
        let border = Border::with_uniform_scale(Vec3::new(2.0, 1.0, 1.0), 0.5);

        grid.insert(keys[0], &border);
        grid.insert(keys[1], &border);

        let neighbors = grid.neighbors_of(keys[0]);
        assert_eq!(neighbors, vec![keys[1]]);
    }

    #[test]
    fn test_out_of_bounds_is_clamped_not_lost() {
        let mut grid = room_grid();
        let keys = body_keys(1);
        // Pokes past the maximum X face; occupancy clamps to the last cell.
        let border = Border::with_uniform_scale(Vec3::new(16.5, 1.0, 1.0), 1.0);

        grid.insert(keys[0], &border);

        assert!(grid.box_at([7, 0, 0]).unwrap().occupants().contains(&keys[0]));
        assert_eq!(grid.body_count(), 1);
    }

    #[test]
    fn test_fully_outside_is_skipped() {
        let mut grid = room_grid();
        let keys = body_keys(1);
        let border = Border::with_uniform_scale(Vec3::new(100.0, 100.0, 100.0), 0.5);

        grid.insert(keys[0], &border);

        assert_eq!(grid.body_count(), 0);
        assert!(grid.neighbors_of(keys[0]).is_empty());
    }

    #[test]
    fn test_update_moves_occupancy() {
        let mut grid = room_grid();
        let keys = body_keys(1);
        let mut border = Border::with_uniform_scale(Vec3::new(1.0, 1.0, 1.0), 0.5);
        grid.insert(keys[0], &border);
        assert!(grid.box_at([0, 0, 0]).unwrap().occupants().contains(&keys[0]));

        border.set_movement(Vec3::new(4.0, 0.0, 0.0));
        border.compute_new_location(1.0);
        grid.update(keys[0], &border);

        assert!(!grid.box_at([0, 0, 0]).unwrap().occupants().contains(&keys[0]));
        assert!(grid.box_at([2, 0, 0]).unwrap().occupants().contains(&keys[0]));
    }
}
