//! One resumable [`Action`] per transport mode.
//!
//! Every step owns its elapsed-time accumulator, so a step suspended with `Running` resumes
//! exactly where it left off. A step either completes or fails; there is no partial resume
//! past a failure.

use delve_core::reservation::{acquire, release};
use delve_core::{Action, ActionFactory, Blackboard, Status, TickContext};

use crate::keys::HELD_RIDE;
use crate::{
    Effect, Interact, MotionConfig, MotionMode, MoveAction, MoveType, NavWorldMut, ObjectId, Vec3,
};

/// Fraction of a step of `length` covered after `elapsed` seconds at `speed`.
fn progress(elapsed: f32, length: f32, speed: f32) -> f32 {
    if length <= f32::EPSILON {
        return 1.0;
    }
    (elapsed * speed / length).clamp(0.0, 1.0)
}

/// Seconds a step needs to cover `length` at `speed`.
fn duration(length: f32, speed: f32) -> f32 {
    if length <= f32::EPSILON {
        0.0
    } else {
        length / speed
    }
}

/// Share of the finishing tick's `dt` needed to reach `duration`; the rest belongs to the next
/// step.
fn used_of_tick(elapsed: f32, dt: f32, duration: f32) -> f32 {
    (dt - (elapsed - duration).max(0.0)).clamp(0.0, dt)
}

/// Walk, Swim, Fall, Climb, ClimbWalls and Fly: interpolate along the route.
///
/// Climbing and flying emit a cue every `cue_interval` seconds, and any step with an interact
/// target fails as soon as that target disappears.
pub struct TraverseStep {
    action: MoveAction,
    speed: f32,
    cue_interval: Option<f32>,
    elapsed: f32,
    since_cue: f32,
    used: f32,
    started: bool,
}

impl TraverseStep {
    pub fn new(action: MoveAction, speed: f32, cue_interval: Option<f32>) -> Self {
        Self {
            action,
            speed,
            cue_interval,
            elapsed: 0.0,
            since_cue: 0.0,
            used: 0.0,
            started: false,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl<W: NavWorldMut + 'static> Action<W> for TraverseStep {
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Status {
        if !self.started {
            self.started = true;
            world.set_motion_mode(agent, MotionMode::Moving(self.action.move_type));
        }
        if let Some(interact) = self.action.interact {
            if !world.interact_valid(interact) {
                tracing::debug!(?agent, ?interact, "support lost mid-step");
                return Status::Failure;
            }
        }
        if self.speed <= 0.0 {
            return Status::Failure;
        }

        let dt = ctx.dt_seconds.max(0.0);
        self.elapsed += dt;
        if let Some(interval) = self.cue_interval {
            self.since_cue += dt;
            while self.since_cue >= interval {
                self.since_cue -= interval;
                world.emit_cue(agent, self.action.move_type);
            }
        }

        let from = self.action.source.center();
        let to = self.action.dest.center();
        let length = self.action.route.length(from, to);
        let t = progress(self.elapsed, length, self.speed);
        world.set_position(agent, self.action.route.point(from, to, t));
        if t < 1.0 {
            return Status::Running;
        }
        self.used = used_of_tick(self.elapsed, dt, duration(length, self.speed));
        Status::Success
    }

    fn used_seconds(&self) -> f32 {
        self.used
    }
}

/// Jump and HighJump: horizontal lerp plus a parabolic lift over `1 / speed` seconds.
pub struct JumpStep {
    action: MoveAction,
    speed: f32,
    apex: f32,
    elapsed: f32,
    used: f32,
    started: bool,
}

impl JumpStep {
    pub fn new(action: MoveAction, speed: f32, apex: f32) -> Self {
        Self {
            action,
            speed,
            apex,
            elapsed: 0.0,
            used: 0.0,
            started: false,
        }
    }
}

impl<W: NavWorldMut + 'static> Action<W> for JumpStep {
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Status {
        if !self.started {
            if world.is_occupied(self.action.dest, agent)
                || world.is_solid(self.action.source.above())
                || self.speed <= 0.0
            {
                return Status::Failure;
            }
            self.started = true;
            world.set_motion_mode(agent, MotionMode::Moving(self.action.move_type));
        }

        let dt = ctx.dt_seconds.max(0.0);
        self.elapsed += dt;
        let t = (self.elapsed * self.speed).clamp(0.0, 1.0);
        let base = self.action.source.center().lerp(self.action.dest.center(), t);
        let lift = self.apex * 4.0 * t * (1.0 - t);
        world.set_position(agent, base + Vec3::UP * lift);
        if t < 1.0 {
            return Status::Running;
        }
        self.used = used_of_tick(self.elapsed, dt, 1.0 / self.speed);
        Status::Success
    }

    fn used_seconds(&self) -> f32 {
        self.used
    }
}

/// Dig and DestroyObject: apply work until the target is gone, then fail the rest of the path.
///
/// The world changed under the plan, so whatever follows must be replanned from scratch.
pub struct WorkStep {
    action: MoveAction,
    work_rate: f32,
    started: bool,
}

impl WorkStep {
    pub fn new(action: MoveAction, work_rate: f32) -> Self {
        Self {
            action,
            work_rate,
            started: false,
        }
    }
}

impl<W: NavWorldMut + 'static> Action<W> for WorkStep {
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Status {
        let Some(target) = self.action.interact else {
            return Status::Failure;
        };
        if !self.started {
            self.started = true;
            world.set_motion_mode(agent, MotionMode::Moving(self.action.move_type));
        }
        if !world.interact_valid(target) {
            return Status::Failure;
        }
        let amount = ctx.dt_seconds.max(0.0) * self.work_rate;
        if world.apply_work(agent, target, amount) {
            tracing::debug!(?agent, ?target, "obstacle cleared; remaining path is stale");
            return Status::Failure;
        }
        Status::Running
    }
}

/// EnterVehicle, RideVehicle, ExitVehicle and RideElevator.
///
/// The step acquires the transport's ride slot before moving and fails if it is taken or the
/// transport is gone. Boarding and riding keep the slot (recorded under [`HELD_RIDE`]) for the
/// following step; alighting and elevator rides release it. Failure and cancellation always
/// release.
pub struct RideStep {
    action: MoveAction,
    vehicle: Option<ObjectId>,
    speed: f32,
    elapsed: f32,
    used: f32,
    holding: bool,
}

impl RideStep {
    pub fn new(action: MoveAction, speed: f32) -> Self {
        let vehicle = action.interact.and_then(Interact::object);
        Self {
            action,
            vehicle,
            speed,
            elapsed: 0.0,
            used: 0.0,
            holding: false,
        }
    }

    fn keeps_slot(&self) -> bool {
        matches!(
            self.action.move_type,
            MoveType::EnterVehicle | MoveType::RideVehicle
        )
    }

    fn drop_slot<W: NavWorldMut>(
        &mut self,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(vehicle) = self.vehicle {
            if self.holding || blackboard.get(HELD_RIDE) == Some(&vehicle) {
                release(world, vehicle, agent);
                blackboard.remove(HELD_RIDE);
            }
        }
        self.holding = false;
    }
}

impl<W: NavWorldMut + 'static> Action<W> for RideStep {
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Status {
        let Some(vehicle) = self.vehicle else {
            return Status::Failure;
        };
        if !world.interact_valid(Interact::Object(vehicle)) || self.speed <= 0.0 {
            self.drop_slot(agent, world, blackboard);
            return Status::Failure;
        }
        if !self.holding {
            if !acquire(world, vehicle, agent) {
                tracing::debug!(?agent, ?vehicle, "ride slot taken");
                self.drop_slot(agent, world, blackboard);
                return Status::Failure;
            }
            self.holding = true;
            blackboard.set(HELD_RIDE, vehicle);
            world.set_motion_mode(agent, MotionMode::Moving(self.action.move_type));
        }

        let dt = ctx.dt_seconds.max(0.0);
        self.elapsed += dt;
        let from = self.action.source.center();
        let to = self.action.dest.center();
        let length = self.action.route.length(from, to);
        let t = progress(self.elapsed, length, self.speed);
        let position = self.action.route.point(from, to, t);
        world.set_position(agent, position);
        if matches!(
            self.action.move_type,
            MoveType::RideVehicle | MoveType::RideElevator
        ) {
            world.move_object(vehicle, position);
        }

        if t < 1.0 {
            return Status::Running;
        }
        self.used = used_of_tick(self.elapsed, dt, duration(length, self.speed));
        if self.keeps_slot() {
            // Ownership of the slot passes to whichever step comes next.
            self.holding = false;
        } else {
            self.drop_slot(agent, world, blackboard);
        }
        Status::Success
    }

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.drop_slot(agent, world, blackboard);
    }

    fn used_seconds(&self) -> f32 {
        self.used
    }
}

/// Teleport: spend one charge, flash at the source and relocate instantly.
pub struct TeleportStep {
    action: MoveAction,
}

impl TeleportStep {
    pub fn new(action: MoveAction) -> Self {
        Self { action }
    }
}

impl<W: NavWorldMut + 'static> Action<W> for TeleportStep {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Status {
        let Some(pad) = self.action.interact.and_then(Interact::object) else {
            return Status::Failure;
        };
        if !world.interact_valid(Interact::Object(pad)) {
            return Status::Failure;
        }
        if !world.consume_teleport_charge(pad) {
            tracing::debug!(?agent, ?pad, "teleporter out of charges");
            return Status::Failure;
        }
        world.set_motion_mode(agent, MotionMode::Moving(MoveType::Teleport));
        world.spawn_effect(self.action.source.center(), Effect::TeleportFlash);
        world.set_position(agent, self.action.dest.center());
        Status::Success
    }
}

/// Builds the step for each [`MoveAction`] of a path.
#[derive(Debug, Clone, Default)]
pub struct MoveStepFactory {
    motion: MotionConfig,
}

impl MoveStepFactory {
    pub fn new(motion: MotionConfig) -> Self {
        Self { motion }
    }
}

impl<W: NavWorldMut + 'static> ActionFactory<W> for MoveStepFactory {
    type Spec = MoveAction;

    fn build(
        &self,
        spec: &MoveAction,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &W,
        _blackboard: &Blackboard,
    ) -> Box<dyn Action<W>> {
        let speed = self
            .motion
            .effective_speed(world.base_speed(agent), spec.move_type);
        let action = spec.clone();
        let cues = Some(self.motion.cue_interval_seconds);
        match spec.move_type {
            MoveType::Walk | MoveType::Swim | MoveType::Fall => {
                Box::new(TraverseStep::new(action, speed, None))
            }
            MoveType::Climb | MoveType::ClimbWalls | MoveType::Fly => {
                Box::new(TraverseStep::new(action, speed, cues))
            }
            MoveType::Jump => Box::new(JumpStep::new(action, speed, self.motion.jump_height)),
            MoveType::HighJump => {
                Box::new(JumpStep::new(action, speed, 2.0 * self.motion.jump_height))
            }
            MoveType::Dig | MoveType::DestroyObject => {
                Box::new(WorkStep::new(action, self.motion.work_rate))
            }
            MoveType::EnterVehicle
            | MoveType::RideVehicle
            | MoveType::ExitVehicle
            | MoveType::RideElevator => Box::new(RideStep::new(action, speed)),
            MoveType::Teleport => Box::new(TeleportStep::new(action)),
        }
    }
}
