//! Kernel primitives for the delve agent behavior runtime.
//!
//! Everything here is engine-agnostic and deterministic given the same inputs: the
//! interpreter (`delve-bt`) and the navigation stack (`delve-nav`) build on these types.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod blackboard;
pub mod clock;
pub mod error;
pub mod reservation;
pub mod rng;
pub mod status;
pub mod tick;
pub mod world;

pub use action::{Action, ActionFactory, ActionPlan, ActionPlanExecutor};
pub use blackboard::{BbKey, Blackboard};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, Timer};
pub use error::CoreError;
pub use reservation::Reservation;
pub use rng::{DeterministicRng, SplitMix64};
pub use status::{Outcome, Status};
pub use tick::TickContext;
pub use world::{AgentId, ReservationWorld, WorldMut, WorldView};
