use delve_core::{Blackboard, Status, TickContext, WorldMut};

use crate::{BoxedNode, BtError, BtNode};

/// Re-validates a precondition every tick before ticking its child.
///
/// When the predicate is false the child is not ticked (a running child is cancelled) and the
/// guard returns its bypass status, `Success` unless configured otherwise.
pub struct Guard<W, F>
where
    W: WorldMut + 'static,
{
    predicate: F,
    child: BoxedNode<W>,
    bypass: Status,
    child_running: bool,
}

impl<W, F> Guard<W, F>
where
    W: WorldMut + 'static,
    F: FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
{
    pub fn new(predicate: F, child: BoxedNode<W>) -> Self {
        Self {
            predicate,
            child,
            bypass: Status::Success,
            child_running: false,
        }
    }

    pub fn with_bypass(mut self, bypass: Status) -> Self {
        self.bypass = bypass;
        self
    }
}

impl<W, F> BtNode<W> for Guard<W, F>
where
    W: WorldMut + 'static,
    F: FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if !(self.predicate)(ctx, agent, &*world, &*blackboard) {
            if self.child_running {
                self.child.cancel(ctx, agent, world, blackboard);
                self.child_running = false;
            }
            return self.bypass;
        }

        let status = self.child.tick(ctx, agent, world, blackboard);
        self.child_running = status == Status::Running;
        status
    }

    fn reset(&mut self) {
        self.child_running = false;
        self.child.reset();
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.child_running {
            self.child.cancel(ctx, agent, world, blackboard);
        }
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        self.child.validate()
    }
}

/// Which child outcome stops a [`Repeat`] early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatUntil {
    /// Retry loop: stop on the first success, fail after `limit` failures.
    Success,
    /// Loop: stop on the first failure, succeed after `limit` successes.
    Failure,
    /// Run exactly `limit` times regardless of outcome, then succeed.
    Never,
}

/// Ticks its child up to `limit` times or until the stop outcome.
///
/// Completed iterations restart the child within the same tick, so a child that finishes
/// instantly is bounded by `limit`, not by the tick rate.
pub struct Repeat<W>
where
    W: WorldMut + 'static,
{
    child: BoxedNode<W>,
    limit: u32,
    until: RepeatUntil,
    completed: u32,
    child_running: bool,
}

impl<W> Repeat<W>
where
    W: WorldMut + 'static,
{
    pub fn new(child: BoxedNode<W>, limit: u32, until: RepeatUntil) -> Self {
        Self {
            child,
            limit,
            until,
            completed: 0,
            child_running: false,
        }
    }

    /// Retry `child` until it succeeds, at most `attempts` times.
    pub fn retry(child: BoxedNode<W>, attempts: u32) -> Self {
        Self::new(child, attempts, RepeatUntil::Success)
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}

impl<W> BtNode<W> for Repeat<W>
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        loop {
            let status = self.child.tick(ctx, agent, world, blackboard);
            let Some(outcome) = status.outcome() else {
                self.child_running = true;
                return Status::Running;
            };

            self.child_running = false;
            self.completed += 1;

            let stop = match self.until {
                RepeatUntil::Success => status == Status::Success,
                RepeatUntil::Failure => status == Status::Failure,
                RepeatUntil::Never => false,
            };
            if stop {
                self.reset();
                return outcome.into();
            }

            if self.completed >= self.limit {
                self.reset();
                return match self.until {
                    RepeatUntil::Success => Status::Failure,
                    RepeatUntil::Failure | RepeatUntil::Never => Status::Success,
                };
            }

            self.child.reset();
        }
    }

    fn reset(&mut self) {
        self.completed = 0;
        self.child_running = false;
        self.child.reset();
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.child_running {
            self.child.cancel(ctx, agent, world, blackboard);
        }
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        if self.limit == 0 {
            return Err(BtError::ZeroRepeat);
        }
        self.child.validate()
    }
}

/// Ticks its child over and over while an external condition holds.
///
/// The condition is checked every tick, including while the child is running. When it turns
/// false the loop cancels the child and succeeds; a failing child fails the loop. One
/// iteration completes per tick at most.
pub struct WhileLoop<W, F>
where
    W: WorldMut + 'static,
{
    condition: F,
    child: BoxedNode<W>,
    child_running: bool,
    iterations: u64,
}

impl<W, F> WhileLoop<W, F>
where
    W: WorldMut + 'static,
    F: FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
{
    pub fn new(condition: F, child: BoxedNode<W>) -> Self {
        Self {
            condition,
            child,
            child_running: false,
            iterations: 0,
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl<W, F> BtNode<W> for WhileLoop<W, F>
where
    W: WorldMut + 'static,
    F: FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if !(self.condition)(ctx, agent, &*world, &*blackboard) {
            if self.child_running {
                self.child.cancel(ctx, agent, world, blackboard);
            }
            self.reset();
            return Status::Success;
        }

        match self.child.tick(ctx, agent, world, blackboard) {
            Status::Running => {
                self.child_running = true;
                Status::Running
            }
            Status::Failure => {
                self.reset();
                Status::Failure
            }
            Status::Success => {
                self.child_running = false;
                self.iterations += 1;
                self.child.reset();
                Status::Running
            }
        }
    }

    fn reset(&mut self) {
        self.child_running = false;
        self.iterations = 0;
        self.child.reset();
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.child_running {
            self.child.cancel(ctx, agent, world, blackboard);
        }
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        self.child.validate()
    }
}

/// Swaps `Success` and `Failure`.
pub struct Inverter<W>
where
    W: WorldMut + 'static,
{
    child: BoxedNode<W>,
}

impl<W> Inverter<W>
where
    W: WorldMut + 'static,
{
    pub fn new(child: BoxedNode<W>) -> Self {
        Self { child }
    }
}

impl<W> BtNode<W> for Inverter<W>
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        self.child.tick(ctx, agent, world, blackboard).invert()
    }

    fn reset(&mut self) {
        self.child.reset();
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.child.cancel(ctx, agent, world, blackboard);
    }

    fn validate(&self) -> Result<(), BtError> {
        self.child.validate()
    }
}

/// Turns any terminal status of its child into `Success`.
pub struct Succeeder<W>
where
    W: WorldMut + 'static,
{
    child: BoxedNode<W>,
}

impl<W> Succeeder<W>
where
    W: WorldMut + 'static,
{
    pub fn new(child: BoxedNode<W>) -> Self {
        Self { child }
    }
}

impl<W> BtNode<W> for Succeeder<W>
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        match self.child.tick(ctx, agent, world, blackboard) {
            Status::Running => Status::Running,
            Status::Success | Status::Failure => Status::Success,
        }
    }

    fn reset(&mut self) {
        self.child.reset();
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.child.cancel(ctx, agent, world, blackboard);
    }

    fn validate(&self) -> Result<(), BtError> {
        self.child.validate()
    }
}
