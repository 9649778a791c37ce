//! Behavior tree interpreter built on `delve-core`.
//!
//! Trees are ticked cooperatively once per simulation step. A node that returns
//! [`Status::Running`] is re-entered on the next tick with its state intact; a node that
//! returns a terminal status must be reset before it is ticked again. Composites own their
//! children exclusively and are rebuilt per behavior instantiation.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod brain;
pub mod composite;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod node;
pub mod reserve;
pub mod tree;

pub use brain::{tick_brains, Brain};
pub use composite::{Parallel, ParallelPolicy, Selector, Sequence};
pub use decorator::{Guard, Inverter, Repeat, RepeatUntil, Succeeder, WhileLoop};
pub use error::BtError;
pub use leaf::{ClearBlackboard, Condition, Leaf, RunAction, SetBlackboard, Wait};
pub use node::{BoxedNode, BtNode};
pub use reserve::{Release, Reserve, WithReservation};
pub use tree::BehaviorTree;

pub use delve_core::Status;
