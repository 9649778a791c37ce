//! Voxel navigation for delve agents: movement graphs, goal regions, the pathfinding
//! service, and the behavior-tree nodes that plan and walk paths.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod follow;
pub mod goal;
pub mod goto;
pub mod graph;
pub mod greedy;
pub mod grid;
pub mod keys;
pub mod math;
pub mod moves;
pub mod planner;
pub mod protocol;
pub mod search;
pub mod service;
pub mod sim;
pub mod steps;
mod trace;
pub mod voxel;
pub mod world;

pub use config::{GotoConfig, GreedyConfig, ModeSpeeds, MotionConfig, NavConfig, PlannerConfig};
pub use error::NavError;
pub use follow::FollowPath;
pub use goal::GoalRegion;
pub use goto::{approach_action_voxel, GoTo, GoToPhase};
pub use graph::{AgentState, MovementGraph};
pub use greedy::{greedy_walk, GreedyEpisode, GreedyNode};
pub use grid::{Barricade, Cell, Elevator, Rail, Teleporter, VoxelGrid};
pub use math::Vec3;
pub use moves::{Interact, Mobility, MoveAction, MoveType, ObjectId, Route};
pub use planner::PlanNode;
pub use protocol::{PathQuery, PlanRequest, PlanResponse, PlanResultCode, RequestId};
pub use search::{search, SearchOutcome};
pub use service::{PathfindingService, PlanChannel, ServiceMode};
pub use sim::{Body, GridWorld};
pub use steps::{JumpStep, MoveStepFactory, RideStep, TeleportStep, TraverseStep, WorkStep};
pub use voxel::{Bounds, Voxel};
pub use world::{Effect, MotionMode, NavWorldMut, NavWorldView};
