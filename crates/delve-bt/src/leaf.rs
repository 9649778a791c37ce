use std::borrow::Cow;

use delve_core::{
    Action, BbKey, Blackboard, Clock, SharedClock, Status, TickContext, Timer, WorldMut, WorldView,
};

use crate::{BtError, BtNode};

/// Predicate leaf: `Success` when true, `Failure` otherwise.
pub struct Condition<F> {
    cond: F,
}

impl<F> Condition<F> {
    pub fn new(cond: F) -> Self {
        Self { cond }
    }
}

impl<F, W> BtNode<W> for Condition<F>
where
    F: FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        (self.cond)(ctx, agent, &*world, &*blackboard).into()
    }

    fn reset(&mut self) {}
}

type StepFn<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &mut W, &mut Blackboard) -> Status>;
type CancelFn<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &mut W, &mut Blackboard)>;

/// Step-function leaf backed by a boxed closure.
///
/// `make` produces a fresh closure whose captured variables are the step function's locals.
/// The same closure is called every tick until it returns a terminal status, so a `Running`
/// step resumes with its locals intact; `reset` drops it and the next tick starts over.
pub struct Leaf<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    make: Box<dyn FnMut() -> StepFn<W>>,
    step: Option<StepFn<W>>,
    on_cancel: Option<CancelFn<W>>,
}

impl<W> Leaf<W>
where
    W: WorldMut + 'static,
{
    pub fn new<M, S>(name: impl Into<Cow<'static, str>>, mut make: M) -> Self
    where
        M: FnMut() -> S + 'static,
        S: FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) -> Status + 'static,
    {
        Self {
            name: name.into(),
            make: Box::new(move || Box::new(make()) as StepFn<W>),
            step: None,
            on_cancel: None,
        }
    }

    /// Leaf without locals: the same function is called every tick.
    pub fn from_fn<S>(name: impl Into<Cow<'static, str>>, step: S) -> Self
    where
        S: FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) -> Status + Clone + 'static,
    {
        Self::new(name, move || step.clone())
    }

    /// Cleanup run when the leaf is aborted while running.
    pub fn on_cancel<C>(mut self, cleanup: C) -> Self
    where
        C: FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) + 'static,
    {
        self.on_cancel = Some(Box::new(cleanup));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_started(&self) -> bool {
        self.step.is_some()
    }
}

impl<W> BtNode<W> for Leaf<W>
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
        let step = self.step.get_or_insert_with(|| (self.make)());
        step(ctx, agent, world, blackboard)
    }

    fn reset(&mut self) {
        self.step = None;
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.step.is_some() {
            tracing::trace!(leaf = %self.name, "leaf cancelled");
            if let Some(cleanup) = self.on_cancel.as_mut() {
                cleanup(ctx, agent, world, blackboard);
            }
        }
        self.reset();
    }
}

type MakeAction<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &W, &Blackboard) -> Box<dyn Action<W>>>;

/// Adapts an explicit-state [`Action`] into a tree leaf.
///
/// The action is built lazily on the first tick from the current world and blackboard, ticked
/// until terminal, and cancelled if the subtree is aborted.
pub struct RunAction<W>
where
    W: WorldMut + 'static,
{
    make: MakeAction<W>,
    current: Option<Box<dyn Action<W>>>,
}

impl<W> RunAction<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        make: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> Box<dyn Action<W>> + 'static,
    ) -> Self {
        Self {
            make: Box::new(make),
            current: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl<W> BtNode<W> for RunAction<W>
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
        if self.current.is_none() {
            let built = (self.make)(ctx, agent, &*world, &*blackboard);
            self.current = Some(built);
        }

        let Some(action) = self.current.as_mut() else {
            return Status::Failure;
        };

        let status = action.tick(ctx, agent, world, blackboard);
        if status.is_terminal() {
            self.current = None;
        }
        status
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(mut action) = self.current.take() {
            action.cancel(ctx, agent, world, blackboard);
        }
    }
}

enum WaitMode {
    /// Accumulates `TickContext::dt_seconds`.
    Simulated { elapsed: f32, duration: f32 },
    /// Measured on an injected clock.
    RealTime { clock: SharedClock, timer: Timer },
}

/// Returns `Running` until the wait elapses, then `Success`.
pub struct Wait {
    mode: WaitMode,
}

impl Wait {
    /// Wait in simulated time.
    pub fn seconds(duration: f32) -> Self {
        Self {
            mode: WaitMode::Simulated {
                elapsed: 0.0,
                duration: duration.max(0.0),
            },
        }
    }

    /// Wait in real time measured on `clock`.
    pub fn real(clock: SharedClock, duration_seconds: f64) -> Result<Self, BtError> {
        let timer = Timer::new(duration_seconds)?;
        Ok(Self {
            mode: WaitMode::RealTime { clock, timer },
        })
    }
}

impl<W> BtNode<W> for Wait
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Status {
        let done = match &mut self.mode {
            WaitMode::Simulated { elapsed, duration } => {
                *elapsed += ctx.dt_seconds.max(0.0);
                *elapsed >= *duration
            }
            WaitMode::RealTime { clock, timer } => {
                let clock: &dyn Clock = clock.as_ref();
                timer.poll_expired(clock)
            }
        };
        if done {
            Status::Success
        } else {
            Status::Running
        }
    }

    fn reset(&mut self) {
        match &mut self.mode {
            WaitMode::Simulated { elapsed, .. } => *elapsed = 0.0,
            WaitMode::RealTime { timer, .. } => timer.reset(),
        }
    }
}

/// Writes a fixed value into the blackboard and succeeds.
pub struct SetBlackboard<T: Clone + 'static> {
    key: BbKey<T>,
    value: T,
}

impl<T: Clone + 'static> SetBlackboard<T> {
    pub fn new(key: BbKey<T>, value: T) -> Self {
        Self { key, value }
    }
}

impl<T, W> BtNode<W> for SetBlackboard<T>
where
    T: Clone + 'static,
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        blackboard.set(self.key, self.value.clone());
        Status::Success
    }

    fn reset(&mut self) {}
}

/// Erases a blackboard key and succeeds, whether or not it was present.
pub struct ClearBlackboard {
    name: Cow<'static, str>,
}

impl ClearBlackboard {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }
}

impl<W> BtNode<W> for ClearBlackboard
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        blackboard.erase(&self.name);
        Status::Success
    }

    fn reset(&mut self) {}
}
