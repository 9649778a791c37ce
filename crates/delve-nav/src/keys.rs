//! Blackboard keys shared by the navigation nodes and task-specific leaves.

use delve_core::BbKey;

use crate::{GoalRegion, MoveAction, PlanResultCode, Voxel};

/// Where the current movement should end up.
pub const GOAL: BbKey<GoalRegion> = BbKey::new("GoalRegion");
/// Target cell picked by an earlier leaf (dig site, build site, bed).
pub const ACTION_VOXEL: BbKey<Voxel> = BbKey::new("ActionVoxel");
/// Path produced by the planner or the greedy walker, consumed by the executor.
pub const PATH: BbKey<Vec<MoveAction>> = BbKey::new("PathToVoxel");
/// Set when planning failed for a reason retrying will not fix.
pub const NO_PATH: BbKey<bool> = BbKey::new("NoPath");
/// Result code of the last plan response the planner acted on.
pub const PLAN_RESULT: BbKey<PlanResultCode> = BbKey::new("PlanResult");
/// Index of the step the executor is running.
pub const PATH_PROGRESS: BbKey<usize> = BbKey::new("PathProgress");
/// Transport object whose ride slot the agent holds between boarding and alighting.
pub const HELD_RIDE: BbKey<crate::ObjectId> = BbKey::new("HeldRide");
