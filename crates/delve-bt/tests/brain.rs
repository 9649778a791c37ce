use delve_bt::{
    tick_brains, BehaviorTree, Brain, BtError, Leaf, Repeat, Selector, Sequence, Wait,
};
use delve_core::{Blackboard, ManualClock, Status, TickContext, WorldMut, WorldView};

#[derive(Debug, Default)]
struct LogWorld {
    order: Vec<u64>,
    canceled: u32,
}

impl WorldView for LogWorld {
    type Agent = u64;
}

impl WorldMut for LogWorld {}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.5)
}

fn record_agent() -> Leaf<LogWorld> {
    Leaf::from_fn(
        "record",
        |_: &TickContext, agent: u64, world: &mut LogWorld, _: &mut Blackboard| {
            world.order.push(agent);
            Status::Running
        },
    )
    .on_cancel(|_, _, world: &mut LogWorld, _| world.canceled += 1)
}

#[test]
fn empty_composite_is_rejected_and_agent_stays_idle() {
    let mut world = LogWorld::default();
    let mut brain = Brain::new(3u64);

    let err = brain
        .try_assign(
            "broken",
            Box::new(Sequence::<LogWorld>::new(Vec::new())),
            &ctx(0),
            &mut world,
        )
        .unwrap_err();
    assert_eq!(err, BtError::EmptyComposite { node: "Sequence" });
    assert!(brain.is_idle());
    assert_eq!(brain.tick(&ctx(0), &mut world), None);
}

#[test]
fn nested_malformed_node_is_found() {
    let retry = Repeat::<LogWorld>::retry(Box::new(record_agent()), 0);
    let root = Selector::<LogWorld>::new(vec![Box::new(retry)]);
    assert_eq!(
        BehaviorTree::<LogWorld>::new("zero", Box::new(root)).err(),
        Some(BtError::ZeroRepeat)
    );
}

#[test]
fn finished_tree_is_dropped() {
    let mut world = LogWorld::default();
    let mut brain = Brain::new(1u64);
    let tree = BehaviorTree::<LogWorld>::new("nap", Box::new(Wait::seconds(1.0))).unwrap();
    brain.assign(tree, &ctx(0), &mut world);

    assert_eq!(brain.tick(&ctx(0), &mut world), Some(Status::Running));
    assert_eq!(brain.tick(&ctx(1), &mut world), Some(Status::Success));
    assert!(brain.is_idle());
    assert_eq!(brain.last_status(), Some(Status::Success));
    assert_eq!(brain.ticks_on_task(), 2);
}

#[test]
fn reassigning_cancels_the_running_task() {
    let mut world = LogWorld::default();
    let mut brain = Brain::new(1u64);
    let first = BehaviorTree::<LogWorld>::new("a", Box::new(record_agent())).unwrap();
    brain.assign(first, &ctx(0), &mut world);
    brain.tick(&ctx(0), &mut world);

    let second = BehaviorTree::<LogWorld>::new("b", Box::new(record_agent())).unwrap();
    brain.assign(second, &ctx(1), &mut world);
    assert_eq!(world.canceled, 1);
    assert_eq!(brain.task_name(), Some("b"));
}

#[test]
fn real_time_wait_follows_the_injected_clock() {
    let clock = ManualClock::new();
    let mut world = LogWorld::default();
    let mut brain = Brain::new(1u64);
    let wait = Wait::real(clock.shared(), 3.0).unwrap();
    let tree = BehaviorTree::<LogWorld>::new("wait", Box::new(wait)).unwrap();
    brain.assign(tree, &ctx(0), &mut world);

    for tick in 0..10 {
        assert_eq!(brain.tick(&ctx(tick), &mut world), Some(Status::Running));
    }
    clock.advance(3.0);
    assert_eq!(brain.tick(&ctx(10), &mut world), Some(Status::Success));
}

#[test]
fn brains_tick_in_stable_agent_order() {
    let mut world = LogWorld::default();
    let mut brains: Vec<Brain<LogWorld>> = [5u64, 2, 9]
        .into_iter()
        .map(|agent| {
            let mut brain = Brain::new(agent);
            let tree = BehaviorTree::<LogWorld>::new("record", Box::new(record_agent())).unwrap();
            brain.assign(tree, &ctx(0), &mut LogWorld::default());
            brain
        })
        .collect();

    tick_brains(&ctx(0), &mut world, &mut brains);
    assert_eq!(world.order, vec![2, 5, 9]);
}
