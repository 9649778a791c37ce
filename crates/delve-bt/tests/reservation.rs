use std::collections::BTreeMap;

use delve_bt::{
    BehaviorTree, Brain, BtNode, Leaf, Release, Reserve, Sequence, WithReservation,
};
use delve_core::{
    BbKey, Blackboard, Reservation, ReservationWorld, Status, TickContext, WorldMut, WorldView,
};

const CHAIR: u32 = 7;
const RESERVED: BbKey<u32> = BbKey::new("ReservedObject");

#[derive(Debug, Default)]
struct Furniture {
    reservations: BTreeMap<u32, Reservation<u64>>,
    dead: Vec<u64>,
    sitting: Vec<u64>,
}

impl Furniture {
    fn with_chair() -> Self {
        let mut world = Self::default();
        world.reservations.insert(CHAIR, Reservation::free());
        world
    }

    fn holder(&self, object: u32) -> Option<u64> {
        self.reservations.get(&object).and_then(|r| r.holder())
    }
}

impl WorldView for Furniture {
    type Agent = u64;
}

impl WorldMut for Furniture {}

impl ReservationWorld for Furniture {
    type Object = u32;

    fn reservation(&self, object: u32) -> Option<&Reservation<u64>> {
        self.reservations.get(&object)
    }

    fn reservation_mut(&mut self, object: u32) -> Option<&mut Reservation<u64>> {
        self.reservations.get_mut(&object)
    }

    fn is_alive(&self, agent: u64) -> bool {
        !self.dead.contains(&agent)
    }
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1)
}

fn sit_forever() -> Leaf<Furniture> {
    Leaf::from_fn(
        "sit",
        |_: &TickContext, agent: u64, world: &mut Furniture, _: &mut Blackboard| {
            if !world.sitting.contains(&agent) {
                world.sitting.push(agent);
            }
            Status::Running
        },
    )
    .on_cancel(|_, agent, world: &mut Furniture, _| world.sitting.retain(|a| *a != agent))
}

#[test]
fn cancelling_mid_sit_clears_the_chair_immediately() {
    let mut world = Furniture::with_chair();
    let mut brain = Brain::new(1u64);
    let tree = BehaviorTree::<Furniture>::new(
        "sit-on-chair",
        Box::new(WithReservation::<Furniture>::new(CHAIR, Box::new(sit_forever()))),
    )
    .unwrap();
    brain.assign(tree, &ctx(0), &mut world);

    assert_eq!(brain.tick(&ctx(0), &mut world), Some(Status::Running));
    assert_eq!(world.holder(CHAIR), Some(1));
    assert_eq!(world.sitting, vec![1]);

    brain.cancel(&ctx(1), &mut world);

    assert_eq!(world.holder(CHAIR), None);
    assert!(world.sitting.is_empty());
    assert!(brain.is_idle());
}

#[test]
fn scoped_reservation_is_released_on_child_failure() {
    let mut world = Furniture::with_chair();
    let mut bb = Blackboard::new();
    let failing = Leaf::from_fn(
        "broken",
        |_: &TickContext, _: u64, _: &mut Furniture, _: &mut Blackboard| Status::Failure,
    );
    let mut scope = WithReservation::<Furniture>::new(CHAIR, Box::new(failing));

    assert_eq!(scope.tick(&ctx(0), 1, &mut world, &mut bb), Status::Failure);
    assert_eq!(world.holder(CHAIR), None);
}

#[test]
fn second_agent_cannot_take_a_held_chair() {
    let mut world = Furniture::with_chair();
    let mut first = Brain::new(1u64);
    let mut second = Brain::new(2u64);

    for brain in [&mut first, &mut second] {
        let tree = BehaviorTree::<Furniture>::new(
            "sit",
            Box::new(WithReservation::<Furniture>::new(CHAIR, Box::new(sit_forever()))),
        )
        .unwrap();
        brain.assign(tree, &ctx(0), &mut world);
    }

    assert_eq!(first.tick(&ctx(0), &mut world), Some(Status::Running));
    assert_eq!(second.tick(&ctx(0), &mut world), Some(Status::Failure));
    assert_eq!(world.holder(CHAIR), Some(1));
}

#[test]
fn reservation_leaked_by_dead_agent_self_heals() {
    let mut world = Furniture::with_chair();
    assert!(world.reservations.get_mut(&CHAIR).unwrap().try_acquire(99));
    world.dead.push(99);

    let mut brain = Brain::new(1u64);
    let tree = BehaviorTree::<Furniture>::new(
        "reserve-then-release",
        Box::new(Sequence::<Furniture>::new(vec![
            Box::new(Reserve::<Furniture>::object(CHAIR).store_in(RESERVED)),
            Box::new(Release::<Furniture>::stored_in(RESERVED)),
        ])),
    )
    .unwrap();
    brain.assign(tree, &ctx(0), &mut world);

    assert_eq!(brain.tick(&ctx(0), &mut world), Some(Status::Success));
    assert_eq!(brain.blackboard.get(RESERVED).copied(), Some(CHAIR));
    assert_eq!(world.holder(CHAIR), None);
}

#[test]
fn living_holder_is_respected() {
    let mut world = Furniture::with_chair();
    assert!(world.reservations.get_mut(&CHAIR).unwrap().try_acquire(5));

    let mut bb = Blackboard::new();
    let mut reserve = Reserve::<Furniture>::object(CHAIR);

    assert_eq!(reserve.tick(&ctx(0), 1, &mut world, &mut bb), Status::Failure);
    assert_eq!(world.holder(CHAIR), Some(5));
}

#[test]
fn reset_while_held_releases_on_the_next_tick() {
    let mut world = Furniture::with_chair();
    let mut bb = Blackboard::new();
    bb.set(RESERVED, CHAIR);
    let mut scope = WithReservation::<Furniture>::select(
        |_, _, _, bb| bb.get(RESERVED).copied(),
        Box::new(sit_forever()),
    );

    assert_eq!(scope.tick(&ctx(0), 1, &mut world, &mut bb), Status::Running);
    scope.reset();
    assert_eq!(scope.held(), None);
    assert_eq!(scope.orphaned(), Some(CHAIR));
    assert_eq!(world.holder(CHAIR), Some(1));

    bb.remove(RESERVED);
    assert_eq!(scope.tick(&ctx(1), 1, &mut world, &mut bb), Status::Failure);
    assert_eq!(scope.orphaned(), None);
    assert_eq!(world.holder(CHAIR), None);
}

#[test]
fn cancel_after_reset_releases_the_orphan() {
    let mut world = Furniture::with_chair();
    let mut bb = Blackboard::new();
    let mut scope = WithReservation::<Furniture>::new(CHAIR, Box::new(sit_forever()));

    assert_eq!(scope.tick(&ctx(0), 1, &mut world, &mut bb), Status::Running);
    scope.reset();
    scope.cancel(&ctx(1), 1, &mut world, &mut bb);

    assert_eq!(world.holder(CHAIR), None);
    assert_eq!(scope.orphaned(), None);
}
