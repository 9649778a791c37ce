use delve_core::{AgentId, Blackboard, Status, TickContext, WorldMut};

use crate::{BehaviorTree, BoxedNode, BtError};

/// One agent's behavior slot: its blackboard plus the tree for the task it is working on.
///
/// This is the surface a task manager drives: assign a tree, tick every step, react to the
/// terminal status, or cancel. A tree is dropped as soon as it finishes.
pub struct Brain<W>
where
    W: WorldMut + 'static,
{
    pub agent: W::Agent,
    pub blackboard: Blackboard,
    tree: Option<BehaviorTree<W>>,
    last_status: Option<Status>,
    ticks_on_task: u64,
}

impl<W> Brain<W>
where
    W: WorldMut + 'static,
{
    pub fn new(agent: W::Agent) -> Self {
        Self {
            agent,
            blackboard: Blackboard::new(),
            tree: None,
            last_status: None,
            ticks_on_task: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tree.is_none()
    }

    pub fn task_name(&self) -> Option<&str> {
        self.tree.as_ref().map(|t| t.name())
    }

    /// Status of the most recent tick; survives the tree being dropped.
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn ticks_on_task(&self) -> u64 {
        self.ticks_on_task
    }

    /// Replace the current task, cancelling it first if it is still running.
    pub fn assign(&mut self, tree: BehaviorTree<W>, ctx: &TickContext, world: &mut W) {
        self.cancel(ctx, world);
        tracing::debug!(agent = ?self.agent, task = tree.name(), "task assigned");
        self.tree = Some(tree);
        self.last_status = None;
        self.ticks_on_task = 0;
    }

    /// Build and assign a tree. A malformed tree leaves the agent idle and reports why.
    pub fn try_assign(
        &mut self,
        name: impl Into<String>,
        root: BoxedNode<W>,
        ctx: &TickContext,
        world: &mut W,
    ) -> Result<(), BtError> {
        match BehaviorTree::new(name, root) {
            Ok(tree) => {
                self.assign(tree, ctx, world);
                Ok(())
            }
            Err(err) => {
                tracing::error!(agent = ?self.agent, %err, "refusing malformed behavior tree");
                self.cancel(ctx, world);
                Err(err)
            }
        }
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> Option<Status> {
        let tree = self.tree.as_mut()?;
        let status = tree.tick(ctx, self.agent, world, &mut self.blackboard);
        self.ticks_on_task += 1;
        self.last_status = Some(status);
        if status.is_terminal() {
            tracing::debug!(agent = ?self.agent, task = tree.name(), ?status, "task finished");
            self.tree = None;
        }
        Some(status)
    }

    pub fn cancel(&mut self, ctx: &TickContext, world: &mut W) {
        if let Some(mut tree) = self.tree.take() {
            tree.cancel(ctx, self.agent, world, &mut self.blackboard);
        }
    }
}

/// Tick every brain in stable agent order.
pub fn tick_brains<W>(ctx: &TickContext, world: &mut W, brains: &mut [Brain<W>])
where
    W: WorldMut + 'static,
{
    brains.sort_by_key(|b| b.agent.stable_id());
    for brain in brains.iter_mut() {
        brain.tick(ctx, world);
    }
}
