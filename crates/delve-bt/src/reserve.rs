//! Reservation leaves.
//!
//! Every behavior that reserves an object must release it on all of its exits. [`Reserve`] and
//! [`Release`] are the explicit pair for hand-built sequences; [`WithReservation`] scopes the
//! reservation to a child subtree and releases it on success, failure and cancellation alike.

use delve_core::reservation::{acquire, release};
use delve_core::{BbKey, Blackboard, ReservationWorld, Status, TickContext, WorldView};

use crate::{BoxedNode, BtError, BtNode};

type ObjectFn<W> = Box<
    dyn FnMut(
        &TickContext,
        <W as WorldView>::Agent,
        &W,
        &Blackboard,
    ) -> Option<<W as ReservationWorld>::Object>,
>;

fn fixed<W: ReservationWorld>(object: W::Object) -> ObjectFn<W> {
    Box::new(move |_, _, _, _| Some(object))
}

/// Reserve an object for the ticking agent. Fails when it is held by another living agent.
pub struct Reserve<W>
where
    W: ReservationWorld + 'static,
{
    object: ObjectFn<W>,
    store: Option<BbKey<W::Object>>,
}

impl<W> Reserve<W>
where
    W: ReservationWorld + 'static,
{
    pub fn object(object: W::Object) -> Self {
        Self {
            object: fixed::<W>(object),
            store: None,
        }
    }

    pub fn select(
        select: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> Option<W::Object> + 'static,
    ) -> Self {
        Self {
            object: Box::new(select),
            store: None,
        }
    }

    /// Also record the reserved object under `key` so a later [`Release`] can find it.
    pub fn store_in(mut self, key: BbKey<W::Object>) -> Self {
        self.store = Some(key);
        self
    }
}

impl<W> BtNode<W> for Reserve<W>
where
    W: ReservationWorld + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        let Some(object) = (self.object)(ctx, agent, &*world, &*blackboard) else {
            return Status::Failure;
        };
        if !acquire(world, object, agent) {
            tracing::debug!(?agent, ?object, "reservation refused");
            return Status::Failure;
        }
        if let Some(key) = self.store {
            blackboard.set(key, object);
        }
        Status::Success
    }

    fn reset(&mut self) {}
}

/// Release an object if the ticking agent holds it. Always succeeds.
pub struct Release<W>
where
    W: ReservationWorld + 'static,
{
    object: ObjectFn<W>,
}

impl<W> Release<W>
where
    W: ReservationWorld + 'static,
{
    pub fn object(object: W::Object) -> Self {
        Self {
            object: fixed::<W>(object),
        }
    }

    /// Release whatever object is recorded under `key`.
    pub fn stored_in(key: BbKey<W::Object>) -> Self {
        Self {
            object: Box::new(move |_, _, _, bb| bb.get(key).copied()),
        }
    }
}

impl<W> BtNode<W> for Release<W>
where
    W: ReservationWorld + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if let Some(object) = (self.object)(ctx, agent, &*world, &*blackboard) {
            release(world, object, agent);
        }
        Status::Success
    }

    fn reset(&mut self) {}
}

/// Hold a reservation for the lifetime of `child`.
///
/// Acquires on the first tick (failing if the object is taken), ticks the child while held, and
/// releases as soon as the child finishes or the subtree is cancelled. `reset` has no world to
/// release into, so a reservation held at reset is released on the next tick or cancel.
pub struct WithReservation<W>
where
    W: ReservationWorld + 'static,
{
    object: ObjectFn<W>,
    child: BoxedNode<W>,
    held: Option<W::Object>,
    orphaned: Option<W::Object>,
}

impl<W> WithReservation<W>
where
    W: ReservationWorld + 'static,
{
    pub fn new(object: W::Object, child: BoxedNode<W>) -> Self {
        Self {
            object: fixed::<W>(object),
            child,
            held: None,
            orphaned: None,
        }
    }

    pub fn select(
        select: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> Option<W::Object> + 'static,
        child: BoxedNode<W>,
    ) -> Self {
        Self {
            object: Box::new(select),
            child,
            held: None,
            orphaned: None,
        }
    }

    pub fn held(&self) -> Option<W::Object> {
        self.held
    }

    /// Object left held by a `reset`, awaiting release.
    pub fn orphaned(&self) -> Option<W::Object> {
        self.orphaned
    }

    fn release_held(&mut self, agent: W::Agent, world: &mut W) {
        for object in [self.held.take(), self.orphaned.take()].into_iter().flatten() {
            release(world, object, agent);
        }
    }
}

impl<W> BtNode<W> for WithReservation<W>
where
    W: ReservationWorld + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        if let Some(object) = self.orphaned.take() {
            release(world, object, agent);
        }
        if self.held.is_none() {
            let Some(object) = (self.object)(ctx, agent, &*world, &*blackboard) else {
                return Status::Failure;
            };
            if !acquire(world, object, agent) {
                return Status::Failure;
            }
            self.held = Some(object);
        }

        let status = self.child.tick(ctx, agent, world, blackboard);
        if status.is_terminal() {
            self.release_held(agent, world);
        }
        status
    }

    fn reset(&mut self) {
        if let Some(object) = self.held.take() {
            tracing::debug!(?object, "reservation scope reset while held; release deferred");
            self.orphaned = Some(object);
        }
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
        self.release_held(agent, world);
        self.reset();
    }

    fn validate(&self) -> Result<(), BtError> {
        self.child.validate()
    }
}
