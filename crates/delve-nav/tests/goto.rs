use delve_bt::{Brain, BtNode, Sequence};
use delve_core::{ManualClock, Status, TickContext};
use delve_nav::keys::{
    ACTION_VOXEL, GOAL, HELD_RIDE, NO_PATH, PATH, PATH_PROGRESS, PLAN_RESULT,
};
use delve_nav::{
    approach_action_voxel, Barricade, Elevator, GoTo, GoalRegion, GridWorld, Mobility, MotionMode,
    MoveType, NavConfig, NavWorldMut, ObjectId, PathfindingService, PlanResultCode, Rail,
    Teleporter, Voxel, VoxelGrid,
};
use delve_tools::{TraceLog, TRACE_LOG};

const AGENT: u64 = 1;

struct Sim {
    world: GridWorld,
    service: PathfindingService,
    clock: ManualClock,
    brain: Brain<GridWorld>,
    ctx: TickContext,
}

impl Sim {
    fn new(grid: VoxelGrid, start: Voxel, mobility: Mobility, dt: f32) -> Self {
        let mut world = GridWorld::new(grid);
        world.spawn(AGENT, start, mobility);
        let mut brain = Brain::new(AGENT);
        brain.blackboard.set(TRACE_LOG, TraceLog::default());
        Self {
            world,
            service: PathfindingService::inline(4),
            clock: ManualClock::new(),
            brain,
            ctx: TickContext::new(0, dt),
        }
    }

    fn corridor(row: &str, mobility: Mobility) -> Self {
        let grid = VoxelGrid::from_layers(&[[row]]).unwrap();
        Self::new(grid, Voxel::new(0, 0, 0), mobility, 0.5)
    }

    fn go_to(&mut self, goal: GoalRegion, config: &NavConfig) {
        let node = GoTo::new(config, self.clock.shared(), self.service.channel(AGENT))
            .unwrap()
            .with_goal(goal);
        self.brain
            .try_assign("goto", Box::new(node), &self.ctx, &mut self.world)
            .unwrap();
    }

    /// One simulation step; the service answers afterwards when `pump` is set.
    fn step(&mut self, pump: bool, seconds: f64) -> Option<Status> {
        let status = self.brain.tick(&self.ctx, &mut self.world);
        if pump {
            self.service.pump(self.world.grid());
        }
        self.clock.advance(seconds);
        self.ctx = self.ctx.next();
        status
    }

    fn run(&mut self, max_ticks: u32) -> Status {
        let dt = f64::from(self.ctx.dt_seconds);
        for _ in 0..max_ticks {
            match self.step(true, dt) {
                Some(status) if status.is_terminal() => return status,
                Some(_) => {}
                None => panic!("brain went idle without a terminal status"),
            }
        }
        panic!("still running after {max_ticks} ticks");
    }

    fn cell(&self) -> Voxel {
        Voxel::containing(self.world.body(AGENT).unwrap().position)
    }

    fn trace(&self) -> &TraceLog {
        self.brain.blackboard.get(TRACE_LOG).unwrap()
    }

    fn path_kinds(&self) -> Vec<MoveType> {
        let path = self.brain.blackboard.get(PATH).unwrap();
        path.iter().map(|m| m.move_type).collect()
    }
}

const LIFT: ObjectId = ObjectId(6);

/// A shaft at x = 1 between two ledges; the agent starts at the bottom left.
fn lift_sim() -> Sim {
    let mut grid = VoxelGrid::from_layers(&[["..."], ["#.#"], ["..."]]).unwrap();
    grid.add_elevator(Elevator {
        id: LIFT,
        bottom: Voxel::new(1, 0, 0),
        top: Voxel::new(1, 2, 0),
    });
    let mobility = Mobility {
        ride: true,
        ..Mobility::walker()
    };
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), mobility, 0.25);
    sim.go_to(GoalRegion::single(Voxel::new(2, 2, 0)), &NavConfig::default());
    sim
}

/// Step until the walk to the shaft is done, then one more tick into the ride.
fn board_lift(sim: &mut Sim) {
    for _ in 0..40 {
        sim.step(true, 0.25);
        if sim.brain.blackboard.get(PATH_PROGRESS) == Some(&1) {
            break;
        }
    }
    sim.step(true, 0.25);
}

#[test]
fn corridor_walk_takes_five_steps() {
    let mut sim = Sim::corridor("......", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(5, 0, 0));

    let path = sim.brain.blackboard.get(PATH).unwrap();
    assert_eq!(path.len(), 5);
    assert!(path.iter().all(|m| m.move_type == MoveType::Walk));
    assert_eq!(sim.trace().count("path.step"), 5);
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&false));
    assert_eq!(sim.world.body(AGENT).unwrap().mode, MotionMode::Idle);
}

#[test]
fn walled_corridor_fails_with_no_path() {
    let mut sim = Sim::corridor("..#...", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(10), Status::Failure);
    assert_eq!(
        sim.brain.blackboard.get(PLAN_RESULT),
        Some(&PlanResultCode::NoSolution)
    );
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&true));
    assert_eq!(sim.cell(), Voxel::new(0, 0, 0));
    assert_eq!(sim.trace().count("path.step"), 0);
}

#[test]
fn goal_outside_the_world_fails_at_once() {
    let mut sim = Sim::corridor("...", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(40, 0, 0)), &NavConfig::default());

    assert_eq!(sim.step(true, 0.5), Some(Status::Failure));
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&true));
    assert_eq!(sim.trace().count("plan.request"), 0);
}

#[test]
fn unanswered_requests_escalate_the_weight_then_give_up() {
    let mut sim = Sim::corridor("......", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    let mut last = None;
    for _ in 0..5 {
        last = sim.step(false, 2.0);
    }
    assert_eq!(last, Some(Status::Failure));
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&true));

    let weights: Vec<f32> = sim
        .trace()
        .with_tag("plan.request")
        .map(|e| f32::from_bits(e.b as u32))
        .collect();
    assert_eq!(weights, vec![1.0, 2.0, 5.0, 10.0]);
    assert_eq!(sim.trace().count("plan.timeout"), 4);
}

#[test]
fn late_answer_to_an_earlier_request_is_used() {
    let mut sim = Sim::corridor("......", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.step(false, 2.0), Some(Status::Running));
    assert_eq!(sim.step(true, 0.5), Some(Status::Running));
    assert_eq!(sim.trace().count("plan.request"), 2);

    assert_eq!(sim.run(100), Status::Success);
    let accepted: Vec<u64> = sim
        .trace()
        .with_tag("plan.stale_accepted")
        .map(|e| e.a)
        .collect();
    let first_request = sim.trace().with_tag("plan.request").next().unwrap().a;
    assert_eq!(accepted, vec![first_request]);
    assert_eq!(sim.cell(), Voxel::new(5, 0, 0));
}

#[test]
fn digging_ends_the_path_and_forces_a_replan() {
    let mobility = Mobility {
        dig: true,
        ..Mobility::walker()
    };
    let mut sim = Sim::corridor(".%...", mobility);
    sim.go_to(GoalRegion::single(Voxel::new(4, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(4, 0, 0));
    assert!(!sim.world.grid().is_solid(Voxel::new(1, 0, 0)));

    let failed: Vec<u64> = sim.trace().with_tag("path.failed").map(|e| e.b).collect();
    assert_eq!(failed, vec![MoveType::Dig as u64]);
    assert_eq!(sim.trace().count("goto.replan"), 1);
    assert_eq!(sim.trace().count("plan.request"), 2);
}

#[test]
fn destroyed_barricade_is_gone_from_the_world() {
    let mobility = Mobility {
        destroy: true,
        ..Mobility::walker()
    };
    let mut grid = VoxelGrid::from_layers(&[["....."]]).unwrap();
    grid.add_barricade(Barricade {
        id: ObjectId(8),
        cell: Voxel::new(2, 0, 0),
    });
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), mobility, 0.5);
    sim.go_to(GoalRegion::single(Voxel::new(4, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.world.grid().barricade_at(Voxel::new(2, 0, 0)), None);
    let failed: Vec<u64> = sim.trace().with_tag("path.failed").map(|e| e.b).collect();
    assert_eq!(failed, vec![MoveType::DestroyObject as u64]);
}

#[test]
fn exhausted_search_falls_back_to_greedy_walking() {
    let mut config = NavConfig::default();
    config.planner.max_expansions = 2;
    let mut sim = Sim::corridor("........", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(7, 0, 0)), &config);

    assert_eq!(sim.run(200), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(7, 0, 0));
    assert_eq!(
        sim.brain.blackboard.get(PLAN_RESULT),
        Some(&PlanResultCode::MaxExpansionsReached)
    );
    assert!(sim.trace().count("goto.fallback") >= 1);
    assert!(sim.trace().count("greedy.hop") >= 7);
}

#[test]
fn cancelling_mid_ride_frees_the_cart() {
    const CART: ObjectId = ObjectId(3);
    let mut grid = VoxelGrid::from_layers(&[["........"]]).unwrap();
    grid.add_rail(Rail {
        cart: CART,
        start: Voxel::new(1, 0, 0),
        end: Voxel::new(6, 0, 0),
        control: None,
    });
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), Mobility::settler(), 0.25);
    sim.go_to(GoalRegion::single(Voxel::new(7, 0, 0)), &NavConfig::default());

    for _ in 0..40 {
        sim.step(true, 0.25);
        if sim.brain.blackboard.get(PATH_PROGRESS) == Some(&1) {
            break;
        }
    }
    sim.step(true, 0.25);

    let kinds: Vec<MoveType> = sim
        .brain
        .blackboard
        .get(PATH)
        .unwrap()
        .iter()
        .map(|m| m.move_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            MoveType::EnterVehicle,
            MoveType::RideVehicle,
            MoveType::ExitVehicle
        ]
    );
    assert_eq!(sim.world.slot_holder(CART), Some(AGENT));
    assert_eq!(sim.brain.blackboard.get(HELD_RIDE), Some(&CART));
    assert_ne!(
        sim.world.object_position(CART),
        Some(Voxel::new(1, 0, 0).center())
    );

    sim.brain.cancel(&sim.ctx, &mut sim.world);

    assert!(sim.brain.is_idle());
    assert_eq!(sim.world.slot_holder(CART), None);
    assert_eq!(sim.brain.blackboard.get(HELD_RIDE), None);
    assert_eq!(sim.world.body(AGENT).unwrap().mode, MotionMode::Idle);
}

#[test]
fn finished_ride_leaves_the_cart_free() {
    const CART: ObjectId = ObjectId(3);
    let mut grid = VoxelGrid::from_layers(&[["........"]]).unwrap();
    grid.add_rail(Rail {
        cart: CART,
        start: Voxel::new(1, 0, 0),
        end: Voxel::new(6, 0, 0),
        control: None,
    });
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), Mobility::settler(), 0.25);
    sim.go_to(GoalRegion::single(Voxel::new(7, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(7, 0, 0));
    assert_eq!(sim.world.slot_holder(CART), None);
}

#[test]
fn teleport_spends_a_charge_and_flashes() {
    const PAD: ObjectId = ObjectId(5);
    let mut grid = VoxelGrid::from_layers(&[["...#.."]]).unwrap();
    grid.add_teleporter(Teleporter {
        id: PAD,
        pad: Voxel::new(0, 0, 0),
        target: Voxel::new(5, 0, 0),
    });
    let mobility = Mobility {
        teleport: true,
        ..Mobility::walker()
    };
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), mobility, 0.5);
    sim.world.set_teleport_charges(PAD, 2);
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(20), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(5, 0, 0));
    assert_eq!(sim.world.teleport_charges(PAD), Some(1));
    assert_eq!(sim.world.effects().len(), 1);
}

#[test]
fn empty_teleporter_exhausts_the_replans() {
    const PAD: ObjectId = ObjectId(5);
    let mut grid = VoxelGrid::from_layers(&[["...#.."]]).unwrap();
    grid.add_teleporter(Teleporter {
        id: PAD,
        pad: Voxel::new(0, 0, 0),
        target: Voxel::new(5, 0, 0),
    });
    let mobility = Mobility {
        teleport: true,
        ..Mobility::walker()
    };
    let mut sim = Sim::new(grid, Voxel::new(0, 0, 0), mobility, 0.5);
    sim.world.set_teleport_charges(PAD, 0);
    let mut config = NavConfig::default();
    config.goto.max_replans = 2;
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &config);

    assert_eq!(sim.run(50), Status::Failure);
    assert_eq!(sim.cell(), Voxel::new(0, 0, 0));
    assert_eq!(sim.trace().count("goto.replan"), 2);
    assert_eq!(sim.trace().count("path.failed"), 3);
    assert!(sim.world.effects().is_empty());
}

#[test]
fn goal_on_the_blackboard_is_used_without_with_goal() {
    let mut sim = Sim::corridor("....", Mobility::walker());
    sim.brain
        .blackboard
        .set(GOAL, GoalRegion::adjacent(Voxel::new(3, 0, 0)));
    let node = GoTo::new(
        &NavConfig::default(),
        sim.clock.shared(),
        sim.service.channel(AGENT),
    )
    .unwrap();
    sim.brain
        .try_assign("goto", Box::new(node), &sim.ctx, &mut sim.world)
        .unwrap();

    assert_eq!(sim.run(50), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(2, 0, 0));
}

#[test]
fn work_site_is_approached_from_the_side() {
    let mut sim = Sim::corridor(".....", Mobility::walker());
    sim.brain.blackboard.set(ACTION_VOXEL, Voxel::new(4, 0, 0));
    let goto = GoTo::new(
        &NavConfig::default(),
        sim.clock.shared(),
        sim.service.channel(AGENT),
    )
    .unwrap();
    let root: Vec<Box<dyn BtNode<GridWorld>>> =
        vec![Box::new(approach_action_voxel()), Box::new(goto)];
    sim.brain
        .try_assign("approach", Box::new(Sequence::new(root)), &sim.ctx, &mut sim.world)
        .unwrap();

    assert_eq!(sim.run(50), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(3, 0, 0));
    assert_eq!(
        sim.brain.blackboard.get(GOAL),
        Some(&GoalRegion::adjacent(Voxel::new(4, 0, 0)))
    );
}

#[test]
fn elevator_slot_is_held_for_the_ride_only() {
    let mut sim = lift_sim();
    board_lift(&mut sim);

    assert_eq!(
        sim.path_kinds(),
        vec![MoveType::Walk, MoveType::RideElevator, MoveType::Walk]
    );
    assert_eq!(sim.world.slot_holder(LIFT), Some(AGENT));
    assert_eq!(sim.brain.blackboard.get(HELD_RIDE), Some(&LIFT));
    assert!(sim.world.object_position(LIFT).unwrap().y > 0.0);

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(2, 2, 0));
    assert_eq!(sim.world.slot_holder(LIFT), None);
    assert_eq!(sim.brain.blackboard.get(HELD_RIDE), None);
}

#[test]
fn cancelling_mid_lift_frees_the_slot() {
    let mut sim = lift_sim();
    board_lift(&mut sim);
    assert_eq!(sim.world.slot_holder(LIFT), Some(AGENT));

    sim.brain.cancel(&sim.ctx, &mut sim.world);

    assert!(sim.brain.is_idle());
    assert_eq!(sim.world.slot_holder(LIFT), None);
    assert_eq!(sim.brain.blackboard.get(HELD_RIDE), None);
    assert_eq!(sim.world.body(AGENT).unwrap().mode, MotionMode::Idle);
}

#[test]
fn swimmer_crosses_the_channel() {
    let swimmer = Mobility {
        swim: true,
        ..Mobility::walker()
    };
    let mut sim = Sim::corridor("..~~..", swimmer);
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(5, 0, 0));
    assert_eq!(
        sim.path_kinds(),
        vec![
            MoveType::Walk,
            MoveType::Swim,
            MoveType::Swim,
            MoveType::Walk,
            MoveType::Walk
        ]
    );
    assert_eq!(sim.world.cues().len(), 0);
}

#[test]
fn walker_cannot_cross_the_channel() {
    let mut sim = Sim::corridor("..~~..", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.run(10), Status::Failure);
    assert_eq!(
        sim.brain.blackboard.get(PLAN_RESULT),
        Some(&PlanResultCode::NoSolution)
    );
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&true));
}

#[test]
fn closed_greedy_window_fails_between_cycles() {
    let mut config = NavConfig::default();
    config.planner.max_expansions = 2;
    config.greedy.max_hops = 3;
    config.greedy.window_seconds = 2.0;
    let row = ".".repeat(40);
    let mut sim = Sim::corridor(&row, Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(39, 0, 0)), &config);

    assert_eq!(sim.run(100), Status::Failure);
    assert_eq!(sim.brain.blackboard.get(NO_PATH), Some(&true));
    // The greedy leg outlasts the window but is walked to its end before the check.
    assert_eq!(sim.cell(), Voxel::new(3, 0, 0));
    assert_eq!(sim.trace().count("goto.fallback"), 1);
    assert_eq!(sim.trace().count("greedy.hop"), 3);
    assert_eq!(sim.trace().count("plan.request"), 2);
}

#[test]
fn late_answer_for_an_old_goal_is_discarded() {
    let mut sim = Sim::corridor("......", Mobility::walker());
    sim.brain
        .blackboard
        .set(GOAL, GoalRegion::single(Voxel::new(5, 0, 0)));
    let node = GoTo::new(
        &NavConfig::default(),
        sim.clock.shared(),
        sim.service.channel(AGENT),
    )
    .unwrap();
    sim.brain
        .try_assign("goto", Box::new(node), &sim.ctx, &mut sim.world)
        .unwrap();

    assert_eq!(sim.step(false, 2.0), Some(Status::Running));
    sim.brain
        .blackboard
        .set(GOAL, GoalRegion::single(Voxel::new(3, 0, 0)));
    assert_eq!(sim.step(true, 0.5), Some(Status::Running));

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(3, 0, 0));
    assert_eq!(sim.brain.blackboard.get(PATH).unwrap().len(), 3);
    assert_eq!(sim.trace().count("plan.stale_accepted"), 0);

    let second_request = sim.trace().with_tag("plan.request").nth(1).unwrap().a;
    let answered: Vec<u64> = sim.trace().with_tag("plan.result").map(|e| e.a).collect();
    assert_eq!(answered, vec![second_request]);
}

#[test]
fn late_answer_from_another_cell_is_discarded() {
    let mut sim = Sim::corridor("......", Mobility::walker());
    sim.go_to(GoalRegion::single(Voxel::new(5, 0, 0)), &NavConfig::default());

    assert_eq!(sim.step(false, 2.0), Some(Status::Running));
    sim.world.set_position(AGENT, Voxel::new(1, 0, 0).center());
    assert_eq!(sim.step(true, 0.5), Some(Status::Running));

    assert_eq!(sim.run(100), Status::Success);
    assert_eq!(sim.cell(), Voxel::new(5, 0, 0));
    let path = sim.brain.blackboard.get(PATH).unwrap();
    assert_eq!(path.len(), 4);
    assert_eq!(path[0].source, Voxel::new(1, 0, 0));
    assert_eq!(sim.trace().count("plan.stale_accepted"), 0);
    assert_eq!(sim.trace().count("goto.replan"), 0);
    assert_eq!(sim.trace().count("path.failed"), 0);
}
