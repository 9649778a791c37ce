//! Plan, follow, replan: the compound every movement behavior is built from.
//!
//! Trace tags: `goto.fallback` (a = replans so far), `goto.replan` (a = replans so far).

use delve_bt::{BtNode, Leaf};
use delve_core::{Blackboard, SharedClock, Status, TickContext, Timer, WorldMut};

use crate::greedy::walk_for_agent;
use crate::keys::{ACTION_VOXEL, GOAL, NO_PATH, PLAN_RESULT};
use crate::trace::record;
use crate::{
    FollowPath, GoalRegion, GreedyConfig, GreedyEpisode, NavConfig, NavError, NavWorldMut,
    PlanChannel, PlanNode, PlanResultCode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoToPhase {
    Planning,
    Following,
    GreedyFollowing,
}

/// Move the agent into the [`GOAL`] region.
///
/// Plans with [`PlanNode`] and executes with [`FollowPath`]. A failed path (blocked step, dig,
/// stale start) is replanned up to `goto.max_replans` times. When the search runs out of
/// expansions the agent walks a greedy partial path and plans again, until the greedy window
/// closes. A "no path" verdict fails immediately.
pub struct GoTo<W>
where
    W: NavWorldMut + 'static,
{
    goal: Option<GoalRegion>,
    max_replans: u32,
    greedy_config: GreedyConfig,
    clock: SharedClock,
    planner: PlanNode,
    follow: FollowPath<W>,
    episode: GreedyEpisode,
    window: Timer,
    phase: GoToPhase,
    replans: u32,
}

impl<W> GoTo<W>
where
    W: NavWorldMut + 'static,
{
    /// Moves towards whatever goal is stored under [`GOAL`] when the node starts.
    pub fn new(
        config: &NavConfig,
        clock: SharedClock,
        channel: PlanChannel,
    ) -> Result<Self, NavError> {
        config.validate()?;
        Ok(Self {
            goal: None,
            max_replans: config.goto.max_replans,
            greedy_config: config.greedy.clone(),
            planner: PlanNode::new(config.planner.clone(), clock.clone(), channel)?,
            follow: FollowPath::new(config.motion.clone()),
            episode: GreedyEpisode::new(),
            window: Timer::new(config.greedy.window_seconds)?,
            clock,
            phase: GoToPhase::Planning,
            replans: 0,
        })
    }

    /// Writes `goal` under [`GOAL`] when the node starts.
    pub fn with_goal(mut self, goal: GoalRegion) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn phase(&self) -> GoToPhase {
        self.phase
    }

    pub fn replans(&self) -> u32 {
        self.replans
    }

    fn replan(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        blackboard: &mut Blackboard,
    ) -> Status {
        self.replans += 1;
        if self.replans > self.max_replans {
            tracing::debug!(?agent, replans = self.replans, "giving up after replans");
            return Status::Failure;
        }
        tracing::debug!(?agent, replans = self.replans, "replanning");
        record(blackboard, ctx, agent, "goto.replan", self.replans as u64, 0);
        <PlanNode as BtNode<W>>::reset(&mut self.planner);
        self.follow.reset();
        self.phase = GoToPhase::Planning;
        Status::Running
    }

    fn fall_back(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if self.window.poll_expired(&*self.clock) {
            tracing::debug!(?agent, "greedy window closed");
            blackboard.set(NO_PATH, true);
            return Status::Failure;
        }
        self.replans += 1;
        if self.replans > self.max_replans {
            return Status::Failure;
        }
        record(blackboard, ctx, agent, "goto.fallback", self.replans as u64, 0);
        let walked = walk_for_agent(
            ctx,
            agent,
            &*world,
            blackboard,
            &self.greedy_config,
            &mut self.episode,
        );
        if walked != Status::Success {
            blackboard.set(NO_PATH, true);
            return Status::Failure;
        }
        <PlanNode as BtNode<W>>::reset(&mut self.planner);
        self.follow.reset();
        self.phase = GoToPhase::GreedyFollowing;
        Status::Running
    }
}

impl<W> BtNode<W> for GoTo<W>
where
    W: NavWorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if let (Some(goal), GoToPhase::Planning, 0) = (self.goal, self.phase, self.replans) {
            blackboard.set(GOAL, goal);
        }

        loop {
            match self.phase {
                GoToPhase::Planning => match self.planner.tick(ctx, agent, world, blackboard) {
                    Status::Running => return Status::Running,
                    Status::Success => {
                        self.follow.reset();
                        self.phase = GoToPhase::Following;
                    }
                    Status::Failure => {
                        if blackboard.get_or(NO_PATH, false) {
                            return Status::Failure;
                        }
                        let result = blackboard.get(PLAN_RESULT).copied();
                        if result != Some(PlanResultCode::MaxExpansionsReached) {
                            return Status::Failure;
                        }
                        let status = self.fall_back(ctx, agent, world, blackboard);
                        if status.is_terminal() {
                            return status;
                        }
                    }
                },
                GoToPhase::Following => {
                    return match self.follow.tick(ctx, agent, world, blackboard) {
                        Status::Running => Status::Running,
                        Status::Success => Status::Success,
                        Status::Failure => self.replan(ctx, agent, blackboard),
                    };
                }
                GoToPhase::GreedyFollowing => {
                    return match self.follow.tick(ctx, agent, world, blackboard) {
                        Status::Running => Status::Running,
                        Status::Failure => self.replan(ctx, agent, blackboard),
                        Status::Success => {
                            let arrived = match (blackboard.get(GOAL), world.cell_of(agent)) {
                                (Some(goal), Some(cell)) => goal.is_satisfied_by(cell),
                                _ => false,
                            };
                            if arrived {
                                Status::Success
                            } else {
                                <PlanNode as BtNode<W>>::reset(&mut self.planner);
                                self.phase = GoToPhase::Planning;
                                Status::Running
                            }
                        }
                    };
                }
            }
        }
    }

    fn reset(&mut self) {
        <PlanNode as BtNode<W>>::reset(&mut self.planner);
        self.follow.reset();
        self.episode.clear();
        self.window.reset();
        self.phase = GoToPhase::Planning;
        self.replans = 0;
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.follow.cancel(ctx, agent, world, blackboard);
        <GoTo<W> as BtNode<W>>::reset(self);
    }
}

/// Aim the next [`GoTo`] at the cells around [`ACTION_VOXEL`], the usual way to approach a work
/// site. Fails when no action voxel is set.
pub fn approach_action_voxel<W: WorldMut + 'static>() -> Leaf<W> {
    Leaf::from_fn("ApproachActionVoxel", |_ctx, _agent, _world, blackboard| {
        match blackboard.get(ACTION_VOXEL).copied() {
            Some(cell) => {
                blackboard.set(GOAL, GoalRegion::adjacent(cell));
                Status::Success
            }
            None => Status::Failure,
        }
    })
}
