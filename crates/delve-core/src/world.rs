use core::fmt::Debug;

use crate::Reservation;

/// Stable identifier for an agent.
///
/// Deterministic simulation needs a stable ordering (`Ord`) and a stable numeric id for
/// seeding, channel routing and logs.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl AgentId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Read-only world access.
///
/// The kernel does not prescribe which queries a world exposes; subsystems (navigation,
/// reservations) define extension traits on top of this one.
pub trait WorldView {
    type Agent: AgentId;
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {}

/// Worlds holding reservable objects (beds, chairs, ride slots, build sites).
///
/// Reservation is advisory: the world only stores the holder, behaviors are responsible for
/// acquiring and releasing on every exit path.
pub trait ReservationWorld: WorldMut {
    type Object: Copy + Eq + Debug + 'static;

    fn reservation(&self, object: Self::Object) -> Option<&Reservation<Self::Agent>>;

    fn reservation_mut(&mut self, object: Self::Object) -> Option<&mut Reservation<Self::Agent>>;

    fn is_alive(&self, agent: Self::Agent) -> bool;
}
