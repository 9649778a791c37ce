use std::sync::Arc;

use crate::{Bounds, Mobility, MoveAction, ObjectId, Voxel};

/// The searching agent as the movement graph sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentState {
    pub cell: Voxel,
    pub mobility: Mobility,
}

impl AgentState {
    pub fn new(cell: Voxel, mobility: Mobility) -> Self {
        Self { cell, mobility }
    }
}

/// Movement graph provider: enumerates the legal steps out of a cell.
///
/// Implementations must be deterministic: the same state yields the same actions in the same
/// order, so searches replay identically.
pub trait MovementGraph {
    /// Legal steps out of `state.cell`. Steps interacting with an object in `excluded` are
    /// omitted.
    fn move_actions(&self, state: &AgentState, excluded: &[ObjectId]) -> Vec<MoveAction>;

    /// The cell exists and a body can occupy it.
    fn is_valid_cell(&self, cell: Voxel) -> bool;

    fn bounds(&self) -> Bounds;
}

impl<G: MovementGraph + ?Sized> MovementGraph for &G {
    fn move_actions(&self, state: &AgentState, excluded: &[ObjectId]) -> Vec<MoveAction> {
        (**self).move_actions(state, excluded)
    }

    fn is_valid_cell(&self, cell: Voxel) -> bool {
        (**self).is_valid_cell(cell)
    }

    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }
}

impl<G: MovementGraph + ?Sized> MovementGraph for Arc<G> {
    fn move_actions(&self, state: &AgentState, excluded: &[ObjectId]) -> Vec<MoveAction> {
        (**self).move_actions(state, excluded)
    }

    fn is_valid_cell(&self, cell: Voxel) -> bool {
        (**self).is_valid_cell(cell)
    }

    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }
}
