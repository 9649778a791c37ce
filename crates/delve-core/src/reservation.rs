//! Advisory single-owner reservations.

use crate::{AgentId, ReservationWorld};

/// The "reserved-for" field of a reservable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reservation<A> {
    holder: Option<A>,
}

impl<A> Default for Reservation<A> {
    fn default() -> Self {
        Self { holder: None }
    }
}

impl<A: AgentId> Reservation<A> {
    pub const fn free() -> Self {
        Self { holder: None }
    }

    pub fn holder(&self) -> Option<A> {
        self.holder
    }

    pub fn is_free(&self) -> bool {
        self.holder.is_none()
    }

    pub fn is_held_by(&self, agent: A) -> bool {
        self.holder == Some(agent)
    }

    /// Claim the object. Re-acquiring an object already held by `agent` succeeds.
    pub fn try_acquire(&mut self, agent: A) -> bool {
        match self.holder {
            None => {
                self.holder = Some(agent);
                true
            }
            Some(holder) => holder == agent,
        }
    }

    /// Release the object if `agent` holds it.
    pub fn release(&mut self, agent: A) -> bool {
        if self.holder == Some(agent) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    pub fn force_clear(&mut self) -> Option<A> {
        self.holder.take()
    }

    /// Drop a reservation whose holder no longer exists.
    pub fn clear_if_dead(&mut self, is_alive: impl FnOnce(A) -> bool) -> Option<A> {
        let holder = self.holder?;
        if is_alive(holder) {
            return None;
        }
        self.holder = None;
        Some(holder)
    }
}

/// Acquire `object` for `agent`, first clearing a reservation leaked by a dead holder.
///
/// Returns `false` when the object does not exist or is held by a living agent.
pub fn acquire<W: ReservationWorld>(world: &mut W, object: W::Object, agent: W::Agent) -> bool {
    let Some(holder) = world.reservation(object).map(|r| r.holder()) else {
        return false;
    };

    if let Some(holder) = holder {
        if holder != agent && !world.is_alive(holder) {
            tracing::warn!(?object, ?holder, "clearing reservation leaked by dead holder");
            if let Some(reservation) = world.reservation_mut(object) {
                reservation.force_clear();
            }
        }
    }

    world
        .reservation_mut(object)
        .map(|r| r.try_acquire(agent))
        .unwrap_or(false)
}

/// Release `object` if `agent` holds it.
pub fn release<W: ReservationWorld>(world: &mut W, object: W::Object, agent: W::Agent) -> bool {
    world
        .reservation_mut(object)
        .map(|r| r.release(agent))
        .unwrap_or(false)
}
