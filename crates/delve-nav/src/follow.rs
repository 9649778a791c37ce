//! Path executor node.
//!
//! Trace tags: `path.step` (a = index of the completed step, b = move type),
//! `path.failed` (a = index of the failing step, b = move type, or `u64::MAX` for a stale start).

use delve_bt::BtNode;
use delve_core::reservation::release;
use delve_core::{Action, ActionPlan, ActionPlanExecutor, Blackboard, Status, TickContext};

use crate::keys::{HELD_RIDE, PATH, PATH_PROGRESS};
use crate::trace::record;
use crate::{MotionConfig, MotionMode, MoveStepFactory, NavWorldMut};

/// Executes the path stored under [`PATH`] one step at a time.
///
/// Fails without moving if the agent is not at the path's first source. On failure or
/// cancellation any ride slot the agent still holds is released and it is shown idle again.
pub struct FollowPath<W>
where
    W: NavWorldMut + 'static,
{
    motion: MotionConfig,
    executor: Option<ActionPlanExecutor<W, MoveStepFactory>>,
}

impl<W> FollowPath<W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(motion: MotionConfig) -> Self {
        Self {
            motion,
            executor: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.executor.is_some()
    }

    fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &W,
        blackboard: &mut Blackboard,
    ) -> Option<Status> {
        let Some(path) = blackboard.get(PATH).cloned() else {
            tracing::warn!(?agent, "no path to follow");
            return Some(Status::Failure);
        };
        let Some(first) = path.first() else {
            return Some(Status::Success);
        };
        let Some(position) = world.position(agent) else {
            return Some(Status::Failure);
        };
        let offset = position.distance(first.source.center());
        if offset > self.motion.arrival_tolerance {
            tracing::debug!(?agent, offset, start = %first.source, "path starts elsewhere");
            record(blackboard, ctx, agent, "path.failed", 0, u64::MAX);
            return Some(Status::Failure);
        }
        let factory = MoveStepFactory::new(self.motion.clone());
        self.executor = Some(ActionPlanExecutor::new(ActionPlan::new(path), factory));
        blackboard.set(PATH_PROGRESS, 0);
        None
    }

    fn settle(&mut self, agent: W::Agent, world: &mut W, blackboard: &mut Blackboard) {
        if let Some(vehicle) = blackboard.remove(HELD_RIDE) {
            release(world, vehicle, agent);
        }
        world.set_motion_mode(agent, MotionMode::Idle);
        self.executor = None;
    }
}

impl<W> BtNode<W> for FollowPath<W>
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
        if self.executor.is_none() {
            if let Some(status) = self.start(ctx, agent, &*world, blackboard) {
                if status.is_terminal() {
                    world.set_motion_mode(agent, MotionMode::Idle);
                }
                return status;
            }
        }
        let Some(executor) = self.executor.as_mut() else {
            return Status::Failure;
        };

        let before = executor.current_index();
        let status = executor.tick(ctx, agent, world, blackboard);
        let after = executor.current_index();
        for index in before..after {
            let move_type = executor.plan().steps[index].move_type;
            tracing::trace!(?agent, index, %move_type, "path step done");
            record(blackboard, ctx, agent, "path.step", index as u64, move_type as u64);
        }
        blackboard.set(PATH_PROGRESS, after);

        match status {
            Status::Running => Status::Running,
            Status::Success => {
                self.settle(agent, world, blackboard);
                Status::Success
            }
            Status::Failure => {
                if let Some(failed) = executor.current_spec() {
                    let move_type = failed.move_type;
                    tracing::debug!(?agent, index = after, %move_type, "path step failed");
                    record(blackboard, ctx, agent, "path.failed", after as u64, move_type as u64);
                }
                self.settle(agent, world, blackboard);
                Status::Failure
            }
        }
    }

    fn reset(&mut self) {
        self.executor = None;
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(mut executor) = self.executor.take() {
            executor.cancel(ctx, agent, world, blackboard);
            self.settle(agent, world, blackboard);
        }
    }
}
