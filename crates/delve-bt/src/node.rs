use delve_core::{Blackboard, Status, TickContext, WorldMut};

use crate::BtError;

/// A unit of the interpreter tree.
///
/// Contract:
/// - `tick` may be called repeatedly while it returns `Running`.
/// - After a terminal status the parent calls `reset` before ticking again.
/// - `cancel` aborts a `Running` subtree: it must cancel the running descendants first, release
///   whatever the node holds, and leave the node in its reset state.
pub trait BtNode<W>: 'static
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status;

    fn reset(&mut self);

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
        self.reset();
    }

    /// Structural check run once when the tree is built.
    fn validate(&self) -> Result<(), BtError> {
        Ok(())
    }
}

pub type BoxedNode<W> = Box<dyn BtNode<W>>;
