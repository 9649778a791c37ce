//! Plan request/response messages exchanged with the pathfinding service.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{GoalRegion, Mobility, MoveAction, ObjectId, Voxel};

/// Unique per service; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanResultCode {
    Success,
    NoSolution,
    MaxExpansionsReached,
    Cancelled,
    Invalid,
}

impl PlanResultCode {
    /// Codes after which retrying the same search is pointless.
    pub fn is_unrecoverable(self) -> bool {
        matches!(
            self,
            PlanResultCode::NoSolution | PlanResultCode::Invalid | PlanResultCode::Cancelled
        )
    }

    pub fn as_u64(self) -> u64 {
        match self {
            PlanResultCode::Success => 0,
            PlanResultCode::NoSolution => 1,
            PlanResultCode::MaxExpansionsReached => 2,
            PlanResultCode::Cancelled => 3,
            PlanResultCode::Invalid => 4,
        }
    }
}

/// Parameters of one best-first search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathQuery {
    pub start: Voxel,
    pub goal: GoalRegion,
    pub mobility: Mobility,
    pub max_expansions: u32,
    pub heuristic_weight: f32,
    pub excluded: Vec<ObjectId>,
}

impl PathQuery {
    pub fn new(start: Voxel, goal: GoalRegion) -> Self {
        Self {
            start,
            goal,
            mobility: Mobility::default(),
            max_expansions: u32::MAX,
            heuristic_weight: 1.0,
            excluded: Vec::new(),
        }
    }

    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: u32) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_heuristic_weight(mut self, weight: f32) -> Self {
        self.heuristic_weight = weight;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub id: RequestId,
    /// Stable id of the issuing agent, for logs.
    pub agent: u64,
    pub query: PathQuery,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanResponse {
    pub request_id: RequestId,
    pub result: PlanResultCode,
    pub path: Vec<MoveAction>,
    pub expansions: u32,
}

impl PlanResponse {
    /// Cell the path ends in, or `start` for an empty path.
    pub fn end_cell(&self, start: Voxel) -> Voxel {
        self.path.last().map(|m| m.dest).unwrap_or(start)
    }
}
