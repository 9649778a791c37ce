//! Resumable step functions.
//!
//! An [`Action`] is a step function with explicit local state: it is ticked until it returns a
//! terminal [`Status`], and everything it needs to resume lives in `self`. Long-running work
//! (walking one cell, riding a cart, waiting for a timer) is written this way.

use crate::{Blackboard, Status, TickContext, WorldMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub trait Action<W>: 'static
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

    /// Seconds of the finishing tick's `dt_seconds` this action needed, read right after `tick`
    /// returned `Success`. Instant actions need none.
    fn used_seconds(&self) -> f32 {
        0.0
    }

    /// Undo partial effects when a Running action is aborted.
    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
    }
}

/// Serializable list of step specs, executed in order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionPlan<S> {
    pub steps: Vec<S>,
}

impl<S> ActionPlan<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<S> Default for ActionPlan<S> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

/// Build runtime [`Action`]s from immutable specs, one step at a time.
pub trait ActionFactory<W>: 'static
where
    W: WorldMut + 'static,
{
    type Spec: Clone + 'static;

    fn build(
        &self,
        spec: &Self::Spec,
        ctx: &TickContext,
        agent: W::Agent,
        world: &W,
        blackboard: &Blackboard,
    ) -> Box<dyn Action<W>>;
}

/// Execute an [`ActionPlan`] by instantiating each step lazily through an [`ActionFactory`].
///
/// A step that succeeds hands whatever it left of the tick's `dt_seconds` to the next step, so a
/// plan never covers more simulated time than the tick. Instant steps chain freely. A step that
/// fails ends the whole plan; there is no partial resume past a failure.
pub struct ActionPlanExecutor<W, F>
where
    W: WorldMut + 'static,
    F: ActionFactory<W>,
{
    plan: ActionPlan<F::Spec>,
    factory: F,
    index: usize,
    current: Option<Box<dyn Action<W>>>,
}

impl<W, F> ActionPlanExecutor<W, F>
where
    W: WorldMut + 'static,
    F: ActionFactory<W>,
{
    pub fn new(plan: ActionPlan<F::Spec>, factory: F) -> Self {
        Self {
            plan,
            factory,
            index: 0,
            current: None,
        }
    }

    pub fn plan(&self) -> &ActionPlan<F::Spec> {
        &self.plan
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Index of the step currently executing (or `len()` once finished).
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_spec(&self) -> Option<&F::Spec> {
        self.plan.steps.get(self.index)
    }

    pub fn is_step_active(&self) -> bool {
        self.current.is_some()
    }
}

impl<W, F> Action<W> for ActionPlanExecutor<W, F>
where
    W: WorldMut + 'static,
    F: ActionFactory<W>,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        let mut step_ctx = *ctx;
        while let Some(spec) = self.plan.steps.get(self.index) {
            if self.current.is_none() {
                let built = self.factory.build(spec, &step_ctx, agent, &*world, &*blackboard);
                self.current = Some(built);
            }

            let Some(action) = self.current.as_mut() else {
                return Status::Failure;
            };

            match action.tick(&step_ctx, agent, world, blackboard) {
                Status::Running => return Status::Running,
                Status::Failure => {
                    self.current = None;
                    return Status::Failure;
                }
                Status::Success => {
                    let used = action.used_seconds();
                    self.current = None;
                    self.index += 1;
                    if used > 0.0 {
                        step_ctx.dt_seconds = (step_ctx.dt_seconds - used).max(0.0);
                        if step_ctx.dt_seconds <= 0.0 && self.index < self.plan.steps.len() {
                            return Status::Running;
                        }
                    }
                }
            }
        }

        Status::Success
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(mut current) = self.current.take() {
            current.cancel(ctx, agent, world, blackboard);
        }
    }
}
