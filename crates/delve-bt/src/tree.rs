use delve_core::{Blackboard, Status, TickContext, WorldMut};

use crate::{BoxedNode, BtError};

/// A validated behavior tree root.
///
/// The root is reset automatically after it reports a terminal status, so the tree can be
/// ticked again for another run.
pub struct BehaviorTree<W>
where
    W: WorldMut + 'static,
{
    name: String,
    root: BoxedNode<W>,
    last: Option<Status>,
}

impl<W> BehaviorTree<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<String>, root: BoxedNode<W>) -> Result<Self, BtError> {
        root.validate()?;
        Ok(Self {
            name: name.into(),
            root,
            last: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last
    }

    pub fn is_running(&self) -> bool {
        self.last == Some(Status::Running)
    }

    pub fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if self.last.is_some_and(Status::is_terminal) {
            self.root.reset();
        }
        let status = self.root.tick(ctx, agent, world, blackboard);
        self.last = Some(status);
        status
    }

    /// Abort a running tree, giving every running node its cleanup.
    pub fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.is_running() {
            tracing::debug!(tree = %self.name, ?agent, "cancelling running tree");
            self.root.cancel(ctx, agent, world, blackboard);
        }
        self.root.reset();
        self.last = None;
    }
}
