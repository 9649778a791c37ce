use delve_core::{ReservationWorld, WorldMut, WorldView};

use crate::{Interact, Mobility, MoveType, MovementGraph, ObjectId, Vec3, Voxel};

/// Visual/physical mode an agent is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Idle,
    Moving(MoveType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    TeleportFlash,
}

/// What the navigation nodes read from the world.
pub trait NavWorldView: WorldView {
    fn position(&self, agent: Self::Agent) -> Option<Vec3>;

    fn mobility(&self, agent: Self::Agent) -> Mobility;

    /// Speed in cells per second before mode and global multipliers.
    fn base_speed(&self, agent: Self::Agent) -> f32;

    /// Current movement graph, used for greedy walking.
    fn graph(&self) -> &dyn MovementGraph;

    fn is_solid(&self, cell: Voxel) -> bool;

    /// Another body stands in `cell`.
    fn is_occupied(&self, cell: Voxel, except: Self::Agent) -> bool;

    /// The ladder, wall, vehicle or pad a step depends on still exists.
    fn interact_valid(&self, interact: Interact) -> bool;

    fn cell_of(&self, agent: Self::Agent) -> Option<Voxel> {
        self.position(agent).map(Voxel::containing)
    }
}

/// Effects the path executor applies. Ride slots are reservations on transport objects.
pub trait NavWorldMut: WorldMut + NavWorldView + ReservationWorld<Object = ObjectId> {
    fn set_position(&mut self, agent: Self::Agent, position: Vec3);

    fn set_motion_mode(&mut self, agent: Self::Agent, mode: MotionMode);

    /// Periodic audible/visual cue while climbing or flying.
    fn emit_cue(&mut self, agent: Self::Agent, move_type: MoveType);

    /// Apply `amount` of dig/attack work to `target`. Returns true once the target is gone.
    fn apply_work(&mut self, agent: Self::Agent, target: Interact, amount: f32) -> bool;

    /// Keep a transport object in sync with its rider.
    fn move_object(&mut self, object: ObjectId, position: Vec3);

    /// Use one charge of a teleporter. False when it has none left.
    fn consume_teleport_charge(&mut self, object: ObjectId) -> bool;

    fn spawn_effect(&mut self, at: Vec3, effect: Effect);
}
