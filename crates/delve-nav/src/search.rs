//! Weighted A* over a [`MovementGraph`].

use core::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::{AgentState, MoveAction, MovementGraph, PathQuery, PlanResultCode, Voxel};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub result: PlanResultCode,
    pub path: Vec<MoveAction>,
    pub expansions: u32,
}

impl SearchOutcome {
    fn empty(result: PlanResultCode, expansions: u32) -> Self {
        Self {
            result,
            path: Vec::new(),
            expansions,
        }
    }
}

#[derive(Debug)]
struct OpenNode {
    f: f32,
    g: f32,
    cell: Voxel,
    tie: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest f; ties prefer deeper nodes, then FIFO.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

/// Best-first search from `query.start` to any cell satisfying `query.goal`.
///
/// `f = g + weight * h`. A weight above 1 trades optimality for fewer expansions. The start
/// already satisfying the goal is a success with an empty path.
pub fn search<G: MovementGraph + ?Sized>(graph: &G, query: &PathQuery) -> SearchOutcome {
    let weight = query.heuristic_weight;
    if !weight.is_finite() || weight <= 0.0 || !query.goal.is_well_formed() {
        return SearchOutcome::empty(PlanResultCode::Invalid, 0);
    }
    if !graph.is_valid_cell(query.start) {
        return SearchOutcome::empty(PlanResultCode::Invalid, 0);
    }
    if query.goal.is_satisfied_by(query.start) {
        return SearchOutcome::empty(PlanResultCode::Success, 0);
    }

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<Voxel, f32> = HashMap::new();
    let mut came_from: HashMap<Voxel, MoveAction> = HashMap::new();
    let mut tie: u64 = 0;
    let mut expansions: u32 = 0;

    g_score.insert(query.start, 0.0);
    open.push(OpenNode {
        f: weight * query.goal.heuristic(query.start),
        g: 0.0,
        cell: query.start,
        tie,
    });

    while let Some(node) = open.pop() {
        if g_score.get(&node.cell).is_some_and(|g| node.g > *g) {
            // Stale heap entry.
            continue;
        }
        if query.goal.is_satisfied_by(node.cell) {
            return SearchOutcome {
                result: PlanResultCode::Success,
                path: reconstruct(&came_from, query.start, node.cell),
                expansions,
            };
        }
        if expansions >= query.max_expansions {
            return SearchOutcome::empty(PlanResultCode::MaxExpansionsReached, expansions);
        }
        expansions += 1;

        let state = AgentState::new(node.cell, query.mobility);
        for action in graph.move_actions(&state, &query.excluded) {
            let tentative = node.g + action.cost.max(0.0);
            if g_score.get(&action.dest).is_some_and(|g| tentative >= *g) {
                continue;
            }
            g_score.insert(action.dest, tentative);
            tie += 1;
            open.push(OpenNode {
                f: tentative + weight * query.goal.heuristic(action.dest),
                g: tentative,
                cell: action.dest,
                tie,
            });
            came_from.insert(action.dest, action);
        }
    }

    SearchOutcome::empty(PlanResultCode::NoSolution, expansions)
}

fn reconstruct(
    came_from: &HashMap<Voxel, MoveAction>,
    start: Voxel,
    end: Voxel,
) -> Vec<MoveAction> {
    let mut path = Vec::new();
    let mut current = end;
    while current != start {
        let Some(action) = came_from.get(&current) else {
            break;
        };
        current = action.source;
        path.push(action.clone());
    }
    path.reverse();
    path
}
