//! In-memory world over a [`VoxelGrid`], used by the scenario runner and tests.

use std::collections::{BTreeMap, BTreeSet};

use delve_core::{Reservation, ReservationWorld, WorldMut, WorldView};

use crate::{
    Cell, Effect, Interact, Mobility, MotionMode, MoveType, MovementGraph, NavWorldMut,
    NavWorldView, ObjectId, Vec3, Voxel, VoxelGrid,
};

pub const DEFAULT_TELEPORT_CHARGES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub mobility: Mobility,
    pub speed: f32,
    pub mode: MotionMode,
    pub alive: bool,
}

#[derive(Debug, Clone)]
pub struct GridWorld {
    grid: VoxelGrid,
    bodies: BTreeMap<u64, Body>,
    slots: BTreeMap<ObjectId, Reservation<u64>>,
    object_positions: BTreeMap<ObjectId, Vec3>,
    charges: BTreeMap<ObjectId, u32>,
    removed: BTreeSet<ObjectId>,
    work: BTreeMap<Interact, f32>,
    hardness: f32,
    revision: u64,
    cues: Vec<(u64, MoveType)>,
    effects: Vec<(Vec3, Effect)>,
}

impl GridWorld {
    /// Registers a ride slot for every cart and elevator and charges every teleporter.
    pub fn new(grid: VoxelGrid) -> Self {
        let mut slots = BTreeMap::new();
        let mut object_positions = BTreeMap::new();
        for rail in grid.rails() {
            slots.insert(rail.cart, Reservation::free());
            object_positions.insert(rail.cart, rail.start.center());
        }
        for elevator in grid.elevators() {
            slots.insert(elevator.id, Reservation::free());
            object_positions.insert(elevator.id, elevator.bottom.center());
        }
        let charges = grid
            .teleporters()
            .iter()
            .map(|t| (t.id, DEFAULT_TELEPORT_CHARGES))
            .collect();
        Self {
            grid,
            bodies: BTreeMap::new(),
            slots,
            object_positions,
            charges,
            removed: BTreeSet::new(),
            work: BTreeMap::new(),
            hardness: 1.0,
            revision: 0,
            cues: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut VoxelGrid {
        self.revision += 1;
        &mut self.grid
    }

    /// Bumped whenever the terrain may have changed; graph snapshots older than this are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn spawn(&mut self, agent: u64, cell: Voxel, mobility: Mobility) {
        self.bodies.insert(
            agent,
            Body {
                position: cell.center(),
                mobility,
                speed: 1.0,
                mode: MotionMode::Idle,
                alive: true,
            },
        );
    }

    pub fn set_speed(&mut self, agent: u64, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.speed = speed;
        }
    }

    pub fn body(&self, agent: u64) -> Option<&Body> {
        self.bodies.get(&agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = u64> + '_ {
        self.bodies.keys().copied()
    }

    pub fn kill(&mut self, agent: u64) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.alive = false;
        }
    }

    /// Work needed to clear one soil cell or barricade.
    pub fn set_hardness(&mut self, hardness: f32) {
        self.hardness = hardness;
    }

    pub fn set_teleport_charges(&mut self, pad: ObjectId, charges: u32) {
        self.charges.insert(pad, charges);
    }

    pub fn teleport_charges(&self, pad: ObjectId) -> Option<u32> {
        self.charges.get(&pad).copied()
    }

    /// Destroy a transport, pad or barricade; steps depending on it fail.
    pub fn remove_object(&mut self, id: ObjectId) {
        self.removed.insert(id);
        if self.grid.remove_barricade(id) {
            self.revision += 1;
        }
    }

    pub fn slot_holder(&self, object: ObjectId) -> Option<u64> {
        self.slots.get(&object).and_then(|s| s.holder())
    }

    pub fn object_position(&self, object: ObjectId) -> Option<Vec3> {
        self.object_positions.get(&object).copied()
    }

    pub fn cues(&self) -> &[(u64, MoveType)] {
        &self.cues
    }

    pub fn effects(&self) -> &[(Vec3, Effect)] {
        &self.effects
    }

    fn object_exists(&self, id: ObjectId) -> bool {
        !self.removed.contains(&id)
            && (self.slots.contains_key(&id)
                || self.charges.contains_key(&id)
                || self.grid.barricade_cell(id).is_some())
    }
}

impl WorldView for GridWorld {
    type Agent = u64;
}

impl WorldMut for GridWorld {}

impl ReservationWorld for GridWorld {
    type Object = ObjectId;

    fn reservation(&self, object: ObjectId) -> Option<&Reservation<u64>> {
        self.slots.get(&object)
    }

    fn reservation_mut(&mut self, object: ObjectId) -> Option<&mut Reservation<u64>> {
        self.slots.get_mut(&object)
    }

    fn is_alive(&self, agent: u64) -> bool {
        self.bodies.get(&agent).is_some_and(|b| b.alive)
    }
}

impl NavWorldView for GridWorld {
    fn position(&self, agent: u64) -> Option<Vec3> {
        self.bodies.get(&agent).map(|b| b.position)
    }

    fn mobility(&self, agent: u64) -> Mobility {
        self.bodies
            .get(&agent)
            .map(|b| b.mobility)
            .unwrap_or_else(Mobility::walker)
    }

    fn base_speed(&self, agent: u64) -> f32 {
        self.bodies.get(&agent).map(|b| b.speed).unwrap_or(0.0)
    }

    fn graph(&self) -> &dyn MovementGraph {
        &self.grid
    }

    fn is_solid(&self, cell: Voxel) -> bool {
        self.grid.is_solid(cell)
    }

    fn is_occupied(&self, cell: Voxel, except: u64) -> bool {
        self.bodies
            .iter()
            .any(|(id, b)| *id != except && b.alive && Voxel::containing(b.position) == cell)
    }

    fn interact_valid(&self, interact: Interact) -> bool {
        match interact {
            Interact::Object(id) => self.object_exists(id),
            Interact::Voxel(cell) => {
                matches!(self.grid.cell(cell), Cell::Ladder | Cell::Solid | Cell::Soil)
            }
        }
    }
}

impl NavWorldMut for GridWorld {
    fn set_position(&mut self, agent: u64, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.position = position;
        }
    }

    fn set_motion_mode(&mut self, agent: u64, mode: MotionMode) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.mode = mode;
        }
    }

    fn emit_cue(&mut self, agent: u64, move_type: MoveType) {
        self.cues.push((agent, move_type));
    }

    fn apply_work(&mut self, _agent: u64, target: Interact, amount: f32) -> bool {
        let done = self.work.entry(target).or_insert(0.0);
        *done += amount;
        if *done < self.hardness {
            return false;
        }
        self.work.remove(&target);
        match target {
            Interact::Voxel(cell) => {
                if self.grid.cell(cell) != Cell::Soil {
                    return false;
                }
                self.grid.set_cell(cell, Cell::Air);
                self.revision += 1;
            }
            Interact::Object(id) => self.remove_object(id),
        }
        true
    }

    fn move_object(&mut self, object: ObjectId, position: Vec3) {
        self.object_positions.insert(object, position);
    }

    fn consume_teleport_charge(&mut self, object: ObjectId) -> bool {
        match self.charges.get_mut(&object) {
            Some(charges) if *charges > 0 => {
                *charges -= 1;
                true
            }
            _ => false,
        }
    }

    fn spawn_effect(&mut self, at: Vec3, effect: Effect) {
        self.effects.push((at, effect));
    }
}

#[cfg(test)]
mod tests {
    use delve_core::reservation::acquire;

    use super::*;
    use crate::Rail;

    fn world() -> GridWorld {
        let mut grid = VoxelGrid::from_layers(&[[".%..."]]).unwrap();
        grid.add_rail(Rail {
            cart: ObjectId(2),
            start: Voxel::new(2, 0, 0),
            end: Voxel::new(4, 0, 0),
            control: None,
        });
        let mut world = GridWorld::new(grid);
        world.spawn(1, Voxel::new(0, 0, 0), Mobility::walker());
        world.spawn(2, Voxel::new(3, 0, 0), Mobility::walker());
        world
    }

    #[test]
    fn digging_takes_hardness_worth_of_work() {
        let mut world = world();
        world.set_hardness(2.0);
        let soil = Interact::Voxel(Voxel::new(1, 0, 0));

        assert!(!world.apply_work(1, soil, 1.5));
        assert_eq!(world.revision(), 0);
        assert!(world.apply_work(1, soil, 0.5));
        assert_eq!(world.grid().cell(Voxel::new(1, 0, 0)), Cell::Air);
        assert_eq!(world.revision(), 1);
        assert!(!world.interact_valid(soil));
    }

    #[test]
    fn dead_riders_lose_their_cart() {
        let mut world = world();
        let cart = ObjectId(2);
        assert!(acquire(&mut world, cart, 2));
        assert!(!acquire(&mut world, cart, 1));

        world.kill(2);
        assert!(acquire(&mut world, cart, 1));
        assert_eq!(world.slot_holder(cart), Some(1));
    }

    #[test]
    fn occupancy_ignores_self_and_the_dead() {
        let mut world = world();
        let cell = Voxel::new(3, 0, 0);
        assert!(world.is_occupied(cell, 1));
        assert!(!world.is_occupied(cell, 2));
        world.kill(2);
        assert!(!world.is_occupied(cell, 1));
    }

    #[test]
    fn removed_objects_are_no_longer_valid() {
        let mut world = world();
        let cart = Interact::Object(ObjectId(2));
        assert!(world.interact_valid(cart));
        world.remove_object(ObjectId(2));
        assert!(!world.interact_valid(cart));
        assert!(!world.interact_valid(Interact::Object(ObjectId(40))));
    }
}
