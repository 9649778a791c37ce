#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Bounds, Voxel};

/// Describes "arrived" for a class of destinations.
///
/// The heuristic is not required to be a true lower bound: searches run weighted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum GoalRegion {
    /// Exactly this cell.
    SingleCell { cell: Voxel },
    /// Any of the 8 cells around `cell` on its horizontal plane (not `cell` itself).
    AdjacentRing { cell: Voxel },
    /// Within `radius` of `center`.
    Sphere { center: Voxel, radius: f32 },
    /// Any cell on a side wall of `bounds`.
    EdgeOfWorld { bounds: Bounds },
}

impl GoalRegion {
    pub fn single(cell: Voxel) -> Self {
        GoalRegion::SingleCell { cell }
    }

    pub fn adjacent(cell: Voxel) -> Self {
        GoalRegion::AdjacentRing { cell }
    }

    pub fn sphere(center: Voxel, radius: f32) -> Self {
        GoalRegion::Sphere { center, radius }
    }

    pub fn is_satisfied_by(&self, cell: Voxel) -> bool {
        match *self {
            GoalRegion::SingleCell { cell: target } => cell == target,
            GoalRegion::AdjacentRing { cell: target } => {
                cell.y == target.y
                    && cell != target
                    && cell.x.abs_diff(target.x) <= 1
                    && cell.z.abs_diff(target.z) <= 1
            }
            GoalRegion::Sphere { center, radius } => cell.distance(center) <= radius,
            GoalRegion::EdgeOfWorld { bounds } => bounds.is_on_edge(cell),
        }
    }

    pub fn heuristic(&self, cell: Voxel) -> f32 {
        match *self {
            GoalRegion::SingleCell { cell: target } => cell.manhattan(target) as f32,
            GoalRegion::AdjacentRing { cell: target } => {
                let planar = cell.x.abs_diff(target.x).max(cell.z.abs_diff(target.z));
                (planar.saturating_sub(1) + cell.y.abs_diff(target.y)) as f32
            }
            GoalRegion::Sphere { center, radius } => (cell.distance(center) - radius).max(0.0),
            GoalRegion::EdgeOfWorld { bounds } => bounds.distance_to_edge(cell) as f32,
        }
    }

    /// The cell this region is anchored on, if it has one.
    pub fn target(&self) -> Option<Voxel> {
        match *self {
            GoalRegion::SingleCell { cell } | GoalRegion::AdjacentRing { cell } => Some(cell),
            GoalRegion::Sphere { center, .. } => Some(center),
            GoalRegion::EdgeOfWorld { .. } => None,
        }
    }

    /// Whether the region can ever be satisfied at all.
    pub fn is_well_formed(&self) -> bool {
        match *self {
            GoalRegion::Sphere { radius, .. } => radius.is_finite() && radius >= 0.0,
            GoalRegion::EdgeOfWorld { bounds } => !bounds.is_empty(),
            GoalRegion::SingleCell { .. } | GoalRegion::AdjacentRing { .. } => true,
        }
    }
}
