use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Integer cell coordinate. `y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Voxel {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Horizontal 4-neighbourhood in a fixed order (+x, +z, -x, -z).
    pub fn horizontal_neighbors(self) -> [Voxel; 4] {
        [
            self.offset(1, 0, 0),
            self.offset(0, 0, 1),
            self.offset(-1, 0, 0),
            self.offset(0, 0, -1),
        ]
    }

    /// The 8 cells surrounding `self` on its horizontal plane.
    pub fn ring(self) -> [Voxel; 8] {
        [
            self.offset(1, 0, 0),
            self.offset(1, 0, 1),
            self.offset(0, 0, 1),
            self.offset(-1, 0, 1),
            self.offset(-1, 0, 0),
            self.offset(-1, 0, -1),
            self.offset(0, 0, -1),
            self.offset(1, 0, -1),
        ]
    }

    /// Bottom-centre of the cell, where an agent standing in it is placed.
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f32 + 0.5, self.y as f32, self.z as f32 + 0.5)
    }

    /// Cell containing a world-space position produced by [`Voxel::center`].
    pub fn containing(p: Vec3) -> Self {
        Self::new(p.x.floor() as i32, p.y.round() as i32, p.z.floor() as i32)
    }

    pub fn distance(self, other: Voxel) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn manhattan(self, other: Voxel) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }
}

impl fmt::Display for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive axis-aligned cell box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: Voxel,
    pub max: Voxel,
}

impl Bounds {
    pub const fn new(min: Voxel, max: Voxel) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn contains(&self, cell: Voxel) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x)
            && (self.min.y..=self.max.y).contains(&cell.y)
            && (self.min.z..=self.max.z).contains(&cell.z)
    }

    /// Horizontal distance from `cell` to the nearest side wall of the box (0 on the edge).
    pub fn distance_to_edge(&self, cell: Voxel) -> u32 {
        let dx = cell.x.abs_diff(self.min.x).min(cell.x.abs_diff(self.max.x));
        let dz = cell.z.abs_diff(self.min.z).min(cell.z.abs_diff(self.max.z));
        dx.min(dz)
    }

    /// True for cells inside the box on one of its four side walls.
    pub fn is_on_edge(&self, cell: Voxel) -> bool {
        self.contains(cell) && self.distance_to_edge(cell) == 0
    }
}
