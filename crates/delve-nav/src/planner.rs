//! Path planner node: asks the pathfinding service and waits for the answer across ticks.
//!
//! Trace tags: `plan.request` (a = request id, b = weight bits), `plan.timeout`
//! (a = timeouts so far), `plan.stale_accepted` (a = response id), `plan.result`
//! (a = request id, b = result code).

use delve_bt::BtNode;
use delve_core::{AgentId, Blackboard, SharedClock, Status, TickContext, Timer, WorldMut};

use crate::keys::{GOAL, NO_PATH, PATH, PLAN_RESULT};
use crate::trace::record;
use crate::{
    GoalRegion, NavError, NavWorldView, PathQuery, PlanChannel, PlanResponse, PlanResultCode,
    PlannerConfig, RequestId, Voxel,
};

/// Plans from the agent's cell to the [`GOAL`] region and stores the path under [`PATH`].
///
/// `Idle -> RequestSent -> Success | Retry | Fail`. Each timeout re-issues with the next heuristic
/// weight; after `max_timeouts` the node fails with [`NO_PATH`] set. Unrecoverable result codes
/// also set [`NO_PATH`]; `MaxExpansionsReached` only records [`PLAN_RESULT`] so the caller can fall
/// back to greedy walking.
pub struct PlanNode {
    config: PlannerConfig,
    clock: SharedClock,
    channel: PlanChannel,
    timer: Timer,
    pending: Option<RequestId>,
    timeouts: u32,
}

impl PlanNode {
    pub fn new(
        config: PlannerConfig,
        clock: SharedClock,
        channel: PlanChannel,
    ) -> Result<Self, NavError> {
        config.validate()?;
        let timer = Timer::new(config.timeout_seconds)?;
        Ok(Self {
            config,
            clock,
            channel,
            timer,
            pending: None,
            timeouts: 0,
        })
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    /// Latest request still awaiting an answer.
    pub fn pending(&self) -> Option<RequestId> {
        self.pending
    }

    fn issue<A: AgentId>(
        &mut self,
        ctx: &TickContext,
        agent: A,
        query: PathQuery,
        blackboard: &mut Blackboard,
    ) -> Status {
        let weight = query.heuristic_weight;
        match self.channel.submit(query) {
            Ok(id) => {
                tracing::debug!(?agent, request_id = id.0, weight, "plan requested");
                record(blackboard, ctx, agent, "plan.request", id.0, weight.to_bits() as u64);
                self.pending = Some(id);
                self.timer.restart(&*self.clock);
                Status::Running
            }
            Err(err) => {
                tracing::error!(?agent, %err, "cannot submit plan request");
                self.pending = None;
                blackboard.set(NO_PATH, true);
                Status::Failure
            }
        }
    }

    fn finish<A: AgentId>(
        &mut self,
        ctx: &TickContext,
        agent: A,
        response: PlanResponse,
        blackboard: &mut Blackboard,
    ) -> Status {
        self.pending = None;
        self.timer.reset();
        let result = response.result;
        tracing::debug!(
            ?agent,
            request_id = response.request_id.0,
            ?result,
            steps = response.path.len(),
            "plan finished"
        );
        record(
            blackboard,
            ctx,
            agent,
            "plan.result",
            response.request_id.0,
            result.as_u64(),
        );
        blackboard.set(PLAN_RESULT, result);
        match result {
            PlanResultCode::Success => {
                blackboard.set(PATH, response.path);
                blackboard.set(NO_PATH, false);
                Status::Success
            }
            code if code.is_unrecoverable() => {
                blackboard.set(NO_PATH, true);
                Status::Failure
            }
            _ => Status::Failure,
        }
    }

    /// Pick the response to act on: the latest request's, or a stale success that starts at the
    /// agent's cell and still ends in the current goal.
    fn take_response<A: AgentId>(
        &mut self,
        ctx: &TickContext,
        agent: A,
        goal: &GoalRegion,
        cell: Voxel,
        blackboard: &mut Blackboard,
    ) -> Option<PlanResponse> {
        for response in self.channel.drain() {
            if Some(response.request_id) == self.pending {
                return Some(response);
            }
            let starts_here = response.path.first().map_or(true, |m| m.source == cell);
            let usable = response.result == PlanResultCode::Success
                && starts_here
                && goal.is_satisfied_by(response.end_cell(cell));
            if usable {
                tracing::debug!(?agent, request_id = response.request_id.0, "stale plan accepted");
                record(
                    blackboard,
                    ctx,
                    agent,
                    "plan.stale_accepted",
                    response.request_id.0,
                    0,
                );
                return Some(response);
            }
            tracing::trace!(?agent, request_id = response.request_id.0, "stale plan discarded");
        }
        None
    }
}

fn fail_no_path(blackboard: &mut Blackboard) -> Status {
    blackboard.set(NO_PATH, true);
    Status::Failure
}

impl<W> BtNode<W> for PlanNode
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
        let Some(goal) = blackboard.get(GOAL).copied() else {
            tracing::warn!(?agent, "planner ticked without a goal");
            return fail_no_path(blackboard);
        };
        let bounds = world.graph().bounds();
        if !goal.is_well_formed() || goal.target().is_some_and(|t| !bounds.contains(t)) {
            tracing::debug!(?agent, ?goal, "goal does not exist");
            return fail_no_path(blackboard);
        }
        let Some(cell) = world.cell_of(agent) else {
            return fail_no_path(blackboard);
        };

        if self.pending.is_none() && self.timeouts == 0 {
            blackboard.set(NO_PATH, false);
        }

        if let Some(response) = self.take_response(ctx, agent, &goal, cell, blackboard) {
            return self.finish(ctx, agent, response, blackboard);
        }

        let query = PathQuery::new(cell, goal)
            .with_mobility(world.mobility(agent))
            .with_max_expansions(self.config.max_expansions)
            .with_heuristic_weight(self.config.weight_for(self.timeouts));

        if self.pending.is_none() {
            return self.issue(ctx, agent, query, blackboard);
        }

        if !self.timer.poll_expired(&*self.clock) {
            return Status::Running;
        }

        self.timeouts += 1;
        tracing::debug!(?agent, timeouts = self.timeouts, "plan request timed out");
        record(blackboard, ctx, agent, "plan.timeout", self.timeouts as u64, 0);
        if self.timeouts >= self.config.max_timeouts {
            self.pending = None;
            self.timer.reset();
            return fail_no_path(blackboard);
        }
        let query = query.with_heuristic_weight(self.config.weight_for(self.timeouts));
        self.issue(ctx, agent, query, blackboard)
    }

    fn reset(&mut self) {
        self.pending = None;
        self.timeouts = 0;
        self.timer.reset();
    }
}
