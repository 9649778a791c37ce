//! Greedy fallback walker.
//!
//! Used when a full search runs out of expansions: extend a short path one hop at a time by
//! local heuristic descent, steering away from cells explored earlier in the same episode, so
//! the agent keeps making progress instead of freezing.

use core::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use delve_bt::BtNode;
use delve_core::{Blackboard, DeterministicRng, Status, TickContext, WorldMut};

use crate::keys::{GOAL, PATH};
use crate::trace::record;
use crate::{AgentState, GoalRegion, GreedyConfig, MoveAction, MovementGraph, NavWorldView, Voxel};

/// RNG stream id for greedy jitter.
pub const GREEDY_STREAM: u64 = 0x6772_6565_6479;

/// Cells and steps visited while walking greedily towards one goal.
#[derive(Debug, Clone, Default)]
pub struct GreedyEpisode {
    goal: Option<GoalRegion>,
    visits: HashMap<Voxel, u32>,
    used: HashSet<(Voxel, Voxel)>,
}

impl GreedyEpisode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue the episode for `goal`, starting a fresh one if the goal changed.
    pub fn begin(&mut self, goal: GoalRegion) {
        if self.goal != Some(goal) {
            self.clear();
            self.goal = Some(goal);
        }
    }

    pub fn clear(&mut self) {
        self.goal = None;
        self.visits.clear();
        self.used.clear();
    }

    pub fn visits(&self, cell: Voxel) -> u32 {
        self.visits.get(&cell).copied().unwrap_or(0)
    }

    pub fn is_explored(&self, cell: Voxel) -> bool {
        self.visits(cell) > 0
    }

    fn visit(&mut self, cell: Voxel) {
        *self.visits.entry(cell).or_insert(0) += 1;
    }
}

/// Walk up to `config.max_hops` steps from `state.cell` towards `goal`.
///
/// Each candidate scores `heuristic(dest) * jitter + cost`, multiplied by
/// `revisit_penalty ^ visits(dest)`. Unexplored destinations always win over explored ones, and
/// a step already taken this episode is never taken again. Stops early inside the goal region
/// or when no step is left.
pub fn greedy_walk<G, R>(
    graph: &G,
    state: AgentState,
    goal: &GoalRegion,
    config: &GreedyConfig,
    episode: &mut GreedyEpisode,
    rng: &mut R,
) -> Vec<MoveAction>
where
    G: MovementGraph + ?Sized,
    R: DeterministicRng,
{
    episode.begin(*goal);
    if !episode.is_explored(state.cell) {
        episode.visit(state.cell);
    }

    let mut cell = state.cell;
    let mut path = Vec::new();
    for _ in 0..config.max_hops {
        if goal.is_satisfied_by(cell) {
            break;
        }

        let mut best: Option<(bool, f32, MoveAction)> = None;
        let here = AgentState::new(cell, state.mobility);
        for action in graph.move_actions(&here, &[]) {
            if episode.used.contains(&(action.source, action.dest)) {
                continue;
            }
            let visits = episode.visits(action.dest);
            let base = goal.heuristic(action.dest) * rng.jitter(config.jitter) + action.cost;
            let score = base * config.revisit_penalty.powi(visits.min(i32::MAX as u32) as i32);
            let explored = visits > 0;
            let better = match &best {
                None => true,
                Some((best_explored, best_score, _)) => match explored.cmp(best_explored) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => score.total_cmp(best_score).is_lt(),
                },
            };
            if better {
                best = Some((explored, score, action));
            }
        }

        let Some((_, _, action)) = best else {
            break;
        };
        episode.used.insert((action.source, action.dest));
        episode.visit(action.dest);
        cell = action.dest;
        path.push(action);
    }
    path
}

/// Writes a greedy partial path under [`PATH`]; fails when no step is available.
///
/// The episode survives `reset` so repeated fallbacks towards the same goal keep avoiding
/// explored cells; it starts over when the goal changes or the node is cancelled.
pub struct GreedyNode {
    config: GreedyConfig,
    episode: GreedyEpisode,
}

impl GreedyNode {
    pub fn new(config: GreedyConfig) -> Self {
        Self {
            config,
            episode: GreedyEpisode::new(),
        }
    }

    pub fn episode(&self) -> &GreedyEpisode {
        &self.episode
    }
}

/// Shared by [`GreedyNode`] and the `GoTo` compound.
pub(crate) fn walk_for_agent<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &W,
    blackboard: &mut Blackboard,
    config: &GreedyConfig,
    episode: &mut GreedyEpisode,
) -> Status
where
    W: NavWorldView,
{
    let (Some(goal), Some(cell)) = (blackboard.get(GOAL).copied(), world.cell_of(agent)) else {
        return Status::Failure;
    };
    let mut rng = ctx.rng_for_agent(agent, GREEDY_STREAM);
    let state = AgentState::new(cell, world.mobility(agent));
    let path = greedy_walk(world.graph(), state, &goal, config, episode, &mut rng);
    for (hop, action) in path.iter().enumerate() {
        record(
            blackboard,
            ctx,
            agent,
            "greedy.hop",
            hop as u64,
            episode.visits(action.dest) as u64,
        );
    }
    tracing::debug!(?agent, hops = path.len(), "greedy fallback walk");
    if path.is_empty() {
        return Status::Failure;
    }
    blackboard.set(PATH, path);
    Status::Success
}

impl<W> BtNode<W> for GreedyNode
where
    W: NavWorldView + WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        walk_for_agent(ctx, agent, &*world, blackboard, &self.config, &mut self.episode)
    }

    fn reset(&mut self) {}

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
        self.episode.clear();
    }
}
