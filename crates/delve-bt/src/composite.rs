use delve_core::{Blackboard, Outcome, Status, TickContext, WorldMut};

use crate::{BoxedNode, BtError, BtNode};

fn validate_children<W>(node: &'static str, children: &[BoxedNode<W>]) -> Result<(), BtError>
where
    W: WorldMut + 'static,
{
    if children.is_empty() {
        return Err(BtError::EmptyComposite { node });
    }
    children.iter().try_for_each(|c| c.validate())
}

/// Ticks children left to right until one fails.
///
/// A `Running` child is resumed on the next tick without re-ticking the children that already
/// succeeded.
pub struct Sequence<W>
where
    W: WorldMut + 'static,
{
    children: Vec<BoxedNode<W>>,
    index: usize,
    running: bool,
}

impl<W> Sequence<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<BoxedNode<W>>) -> Self {
        Self {
            children,
            index: 0,
            running: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.index
    }
}

impl<W> BtNode<W> for Sequence<W>
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
        while let Some(child) = self.children.get_mut(self.index) {
            match child.tick(ctx, agent, world, blackboard) {
                Status::Running => {
                    self.running = true;
                    return Status::Running;
                }
                Status::Failure => {
                    self.reset();
                    return Status::Failure;
                }
                Status::Success => {
                    self.running = false;
                    self.index += 1;
                }
            }
        }

        self.reset();
        Status::Success
    }

    fn reset(&mut self) {
        self.index = 0;
        self.running = false;
        for c in self.children.iter_mut() {
            c.reset();
        }
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.running {
            if let Some(child) = self.children.get_mut(self.index) {
                child.cancel(ctx, agent, world, blackboard);
            }
        }
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        validate_children("Sequence", &self.children)
    }
}

/// Ticks children left to right until one succeeds.
pub struct Selector<W>
where
    W: WorldMut + 'static,
{
    children: Vec<BoxedNode<W>>,
    index: usize,
    running: bool,
}

impl<W> Selector<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<BoxedNode<W>>) -> Self {
        Self {
            children,
            index: 0,
            running: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.index
    }
}

impl<W> BtNode<W> for Selector<W>
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
        while let Some(child) = self.children.get_mut(self.index) {
            match child.tick(ctx, agent, world, blackboard) {
                Status::Running => {
                    self.running = true;
                    return Status::Running;
                }
                Status::Success => {
                    self.reset();
                    return Status::Success;
                }
                Status::Failure => {
                    self.running = false;
                    self.index += 1;
                }
            }
        }

        self.reset();
        Status::Failure
    }

    fn reset(&mut self) {
        self.index = 0;
        self.running = false;
        for c in self.children.iter_mut() {
            c.reset();
        }
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.running {
            if let Some(child) = self.children.get_mut(self.index) {
                child.cancel(ctx, agent, world, blackboard);
            }
        }
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        validate_children("Selector", &self.children)
    }
}

/// Completion policy for [`Parallel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelPolicy {
    /// First child to succeed wins; fails once every child failed.
    SucceedOnAny,
    /// Every child must succeed; the first failure fails the whole node.
    #[default]
    RequireAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildState {
    Idle,
    Running,
    Done(Outcome),
}

/// Ticks every unfinished child each cycle.
///
/// When the policy decides, children still running are cancelled.
pub struct Parallel<W>
where
    W: WorldMut + 'static,
{
    children: Vec<BoxedNode<W>>,
    states: Vec<ChildState>,
    policy: ParallelPolicy,
}

impl<W> Parallel<W>
where
    W: WorldMut + 'static,
{
    pub fn new(policy: ParallelPolicy, children: Vec<BoxedNode<W>>) -> Self {
        let states = vec![ChildState::Idle; children.len()];
        Self {
            children,
            states,
            policy,
        }
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }

    fn decided(&self) -> Option<Status> {
        let done = |o: Outcome| self.states.iter().filter(|s| **s == ChildState::Done(o)).count();
        let total = self.states.len();
        match self.policy {
            ParallelPolicy::RequireAll => {
                if done(Outcome::Failure) > 0 {
                    Some(Status::Failure)
                } else if done(Outcome::Success) == total {
                    Some(Status::Success)
                } else {
                    None
                }
            }
            ParallelPolicy::SucceedOnAny => {
                if done(Outcome::Success) > 0 {
                    Some(Status::Success)
                } else if done(Outcome::Failure) == total {
                    Some(Status::Failure)
                } else {
                    None
                }
            }
        }
    }

    fn cancel_running(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        for (child, state) in self.children.iter_mut().zip(self.states.iter()) {
            if *state == ChildState::Running {
                child.cancel(ctx, agent, world, blackboard);
            }
        }
    }
}

impl<W> BtNode<W> for Parallel<W>
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
        for i in 0..self.children.len() {
            if matches!(self.states[i], ChildState::Done(_)) {
                continue;
            }

            let status = self.children[i].tick(ctx, agent, world, blackboard);
            self.states[i] = match status.outcome() {
                Some(outcome) => ChildState::Done(outcome),
                None => ChildState::Running,
            };

            if let Some(result) = self.decided() {
                self.cancel_running(ctx, agent, world, blackboard);
                self.reset();
                return result;
            }
        }

        Status::Running
    }

    fn reset(&mut self) {
        self.states.fill(ChildState::Idle);
        for c in self.children.iter_mut() {
            c.reset();
        }
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.cancel_running(ctx, agent, world, blackboard);
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        validate_children("Parallel", &self.children)
    }
}
