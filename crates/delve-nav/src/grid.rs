//! Reference voxel world and its movement graph.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AgentState, Bounds, Interact, Mobility, MoveAction, MoveType, MovementGraph, NavError,
    ObjectId, Route, Vec3, Voxel,
};

const WALK_COST: f32 = 1.0;
const SWIM_COST: f32 = 2.0;
const JUMP_COST: f32 = 2.0;
const HIGH_JUMP_COST: f32 = 3.0;
const CLIMB_COST: f32 = 2.0;
const CLIMB_WALL_COST: f32 = 3.0;
const FLY_COST: f32 = 1.5;
const DIG_COST: f32 = 5.0;
const DESTROY_COST: f32 = 4.0;
const BOARD_COST: f32 = 0.5;
const TELEPORT_COST: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cell {
    #[default]
    Air,
    Solid,
    /// Solid that can be dug out.
    Soil,
    Water,
    Ladder,
}

impl Cell {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '.' | ' ' => Cell::Air,
            '#' => Cell::Solid,
            '%' => Cell::Soil,
            '~' => Cell::Water,
            'H' => Cell::Ladder,
            _ => return None,
        })
    }

    pub fn is_solid(self) -> bool {
        matches!(self, Cell::Solid | Cell::Soil)
    }
}

/// Breakable object filling a cell (door, crate, barricade).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Barricade {
    pub id: ObjectId,
    pub cell: Voxel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Teleporter {
    pub id: ObjectId,
    pub pad: Voxel,
    pub target: Voxel,
}

/// Vertical shaft; riders board at either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Elevator {
    pub id: ObjectId,
    pub bottom: Voxel,
    pub top: Voxel,
}

/// One-way cart line from `start` to `end`, optionally bent through `control`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rail {
    pub cart: ObjectId,
    pub start: Voxel,
    pub end: Voxel,
    #[cfg_attr(feature = "serde", serde(default))]
    pub control: Option<Vec3>,
}

impl Rail {
    pub fn route(&self) -> Route {
        match self.control {
            Some(control) => Route::Curve { control },
            None => Route::Linear,
        }
    }
}

/// Dense voxel grid anchored at the origin. Below `y = 0` is bedrock.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    width: i32,
    height: i32,
    depth: i32,
    cells: Vec<Cell>,
    barricades: BTreeMap<Voxel, ObjectId>,
    teleporters: Vec<Teleporter>,
    elevators: Vec<Elevator>,
    rails: Vec<Rail>,
}

impl VoxelGrid {
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self, NavError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(NavError::InvalidGrid(format!(
                "grid must be non-empty, got {width}x{height}x{depth}"
            )));
        }
        let len = width as usize * height as usize * depth as usize;
        Ok(Self {
            width: width as i32,
            height: height as i32,
            depth: depth as i32,
            cells: vec![Cell::Air; len],
            barricades: BTreeMap::new(),
            teleporters: Vec::new(),
            elevators: Vec::new(),
            rails: Vec::new(),
        })
    }

    /// Parse horizontal layers, bottom first. Each layer is a list of rows along `z`, each row
    /// a string along `x`: `.` air, `#` solid, `%` soil, `~` water, `H` ladder.
    pub fn from_layers<L, R>(layers: &[L]) -> Result<Self, NavError>
    where
        L: AsRef<[R]>,
        R: AsRef<str>,
    {
        let depth = layers.first().map(|l| l.as_ref().len()).unwrap_or(0);
        let width = layers
            .iter()
            .flat_map(|l| l.as_ref().iter())
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let mut grid = Self::new(width as u32, layers.len() as u32, depth as u32)?;

        for (y, layer) in layers.iter().enumerate() {
            let rows = layer.as_ref();
            if rows.len() != depth {
                return Err(NavError::InvalidGrid(format!(
                    "layer {y} has {} rows, expected {depth}",
                    rows.len()
                )));
            }
            for (z, row) in rows.iter().enumerate() {
                for (x, c) in row.as_ref().chars().enumerate() {
                    let cell = Cell::from_char(c).ok_or_else(|| {
                        NavError::InvalidGrid(format!("unknown cell {c:?} at ({x}, {y}, {z})"))
                    })?;
                    grid.set_cell(Voxel::new(x as i32, y as i32, z as i32), cell);
                }
            }
        }
        Ok(grid)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            Voxel::new(0, 0, 0),
            Voxel::new(self.width - 1, self.height - 1, self.depth - 1),
        )
    }

    fn idx(&self, cell: Voxel) -> Option<usize> {
        if !self.bounds().contains(cell) {
            return None;
        }
        Some(((cell.y * self.depth + cell.z) * self.width + cell.x) as usize)
    }

    /// Out-of-bounds cells read as solid.
    pub fn cell(&self, cell: Voxel) -> Cell {
        self.idx(cell).map(|i| self.cells[i]).unwrap_or(Cell::Solid)
    }

    pub fn set_cell(&mut self, cell: Voxel, value: Cell) {
        if let Some(i) = self.idx(cell) {
            self.cells[i] = value;
        }
    }

    pub fn add_barricade(&mut self, barricade: Barricade) {
        self.barricades.insert(barricade.cell, barricade.id);
    }

    pub fn barricade_at(&self, cell: Voxel) -> Option<ObjectId> {
        self.barricades.get(&cell).copied()
    }

    pub fn barricade_cell(&self, id: ObjectId) -> Option<Voxel> {
        self.barricades
            .iter()
            .find_map(|(cell, b)| (*b == id).then_some(*cell))
    }

    pub fn remove_barricade(&mut self, id: ObjectId) -> bool {
        let before = self.barricades.len();
        self.barricades.retain(|_, b| *b != id);
        self.barricades.len() != before
    }

    pub fn add_teleporter(&mut self, teleporter: Teleporter) {
        self.teleporters.push(teleporter);
    }

    pub fn add_elevator(&mut self, elevator: Elevator) {
        self.elevators.push(elevator);
    }

    pub fn add_rail(&mut self, rail: Rail) {
        self.rails.push(rail);
    }

    pub fn teleporters(&self) -> &[Teleporter] {
        &self.teleporters
    }

    pub fn elevators(&self) -> &[Elevator] {
        &self.elevators
    }

    pub fn rails(&self) -> &[Rail] {
        &self.rails
    }

    pub fn is_solid(&self, cell: Voxel) -> bool {
        self.cell(cell).is_solid()
    }

    /// A body can occupy the cell.
    pub fn is_passable(&self, cell: Voxel) -> bool {
        self.idx(cell).is_some() && !self.is_solid(cell) && self.barricade_at(cell).is_none()
    }

    fn is_supported(&self, cell: Voxel) -> bool {
        cell.y == 0 || self.is_solid(cell.below())
    }

    /// A walking body can stand in the cell.
    pub fn is_stand_point(&self, cell: Voxel) -> bool {
        if !self.is_passable(cell) {
            return false;
        }
        match self.cell(cell) {
            Cell::Ladder => true,
            Cell::Water => false,
            _ => self.is_supported(cell),
        }
    }

    fn is_water(&self, cell: Voxel) -> bool {
        self.is_passable(cell) && self.cell(cell) == Cell::Water
    }

    fn is_ladder(&self, cell: Voxel) -> bool {
        self.is_passable(cell) && self.cell(cell) == Cell::Ladder
    }

    /// Where a body stepping off into `cell` comes to rest, and how far it dropped.
    fn landing(&self, cell: Voxel, max_fall: u8) -> Option<(Voxel, u8)> {
        let mut current = cell;
        for drop in 0..=max_fall {
            if !self.is_passable(current) {
                return None;
            }
            if self.is_stand_point(current) || self.is_water(current) {
                return Some((current, drop));
            }
            current = current.below();
        }
        None
    }
}

struct Moves<'a> {
    mobility: &'a Mobility,
    excluded: &'a [ObjectId],
    out: Vec<MoveAction>,
}

impl Moves<'_> {
    fn push(&mut self, action: MoveAction) {
        if !self.mobility.allows(action.move_type) {
            return;
        }
        if let Some(id) = action.interact.and_then(Interact::object) {
            if self.excluded.contains(&id) {
                return;
            }
        }
        self.out.push(action);
    }
}

impl MovementGraph for VoxelGrid {
    fn move_actions(&self, state: &AgentState, excluded: &[ObjectId]) -> Vec<MoveAction> {
        let s = state.cell;
        let mut moves = Moves {
            mobility: &state.mobility,
            excluded,
            out: Vec::new(),
        };
        // Dig and DestroyObject end inside the obstacle; search on as if it were cleared.
        let cleared = self.idx(s).is_some()
            && (self.cell(s) == Cell::Soil || self.barricade_at(s).is_some());
        if !self.is_passable(s) && !cleared {
            return moves.out;
        }
        let headroom = self.is_passable(s.above());
        let in_water = self.is_water(s);

        for n in s.horizontal_neighbors() {
            if self.is_stand_point(n) {
                moves.push(MoveAction::new(s, n, MoveType::Walk, WALK_COST));
            } else if self.is_water(n) {
                moves.push(MoveAction::new(s, n, MoveType::Swim, SWIM_COST));
            } else if self.is_passable(n) {
                if let Some((landing, drop)) = self.landing(n.below(), state.mobility.max_fall) {
                    let cost = WALK_COST + 0.5 * (drop + 1) as f32;
                    moves.push(MoveAction::new(s, landing, MoveType::Fall, cost));
                }
            }

            if let Some(id) = self.barricade_at(n) {
                moves.push(
                    MoveAction::new(s, n, MoveType::DestroyObject, DESTROY_COST)
                        .with_interact(Interact::Object(id)),
                );
            }
            if self.cell(n) == Cell::Soil {
                moves.push(
                    MoveAction::new(s, n, MoveType::Dig, DIG_COST)
                        .with_interact(Interact::Voxel(n)),
                );
            }

            if headroom && !in_water {
                let up = n.above();
                if self.is_stand_point(up) && !self.is_stand_point(n) {
                    moves.push(MoveAction::new(s, up, MoveType::Jump, JUMP_COST));
                } else if !self.is_passable(up)
                    && self.is_passable(s.offset(0, 2, 0))
                    && self.is_stand_point(up.above())
                {
                    moves.push(MoveAction::new(s, up.above(), MoveType::HighJump, HIGH_JUMP_COST));
                }
            }
        }

        // One wall climb per cell, against the first solid side wall.
        if headroom {
            let wall = s
                .horizontal_neighbors()
                .into_iter()
                .find(|n| self.idx(*n).is_some() && self.is_solid(*n));
            if let Some(wall) = wall {
                moves.push(
                    MoveAction::new(s, s.above(), MoveType::ClimbWalls, CLIMB_WALL_COST)
                        .with_interact(Interact::Voxel(wall)),
                );
            }
        }

        let up = s.above();
        if self.is_ladder(s) && (self.is_ladder(up) || self.is_stand_point(up)) {
            moves.push(
                MoveAction::new(s, up, MoveType::Climb, CLIMB_COST)
                    .with_interact(Interact::Voxel(s)),
            );
        } else if self.is_ladder(up) {
            moves.push(
                MoveAction::new(s, up, MoveType::Climb, CLIMB_COST)
                    .with_interact(Interact::Voxel(up)),
            );
        }
        if self.is_ladder(s.below()) {
            let below = s.below();
            moves.push(
                MoveAction::new(s, below, MoveType::Climb, CLIMB_COST)
                    .with_interact(Interact::Voxel(below)),
            );
        }

        if in_water {
            for n in [s.above(), s.below()] {
                if self.is_water(n) || (n == s.above() && self.is_stand_point(n)) {
                    moves.push(MoveAction::new(s, n, MoveType::Swim, SWIM_COST));
                }
            }
        }

        if self.cell(s.below()) == Cell::Soil && s.y > 0 {
            let below = s.below();
            moves.push(
                MoveAction::new(s, below, MoveType::Dig, DIG_COST)
                    .with_interact(Interact::Voxel(below)),
            );
        }

        if state.mobility.fly {
            for n in s
                .horizontal_neighbors()
                .into_iter()
                .chain([s.above(), s.below()])
            {
                if self.is_passable(n) {
                    moves.push(MoveAction::new(s, n, MoveType::Fly, FLY_COST));
                }
            }
        }

        for t in self.teleporters.iter().filter(|t| t.pad == s) {
            moves.push(
                MoveAction::new(s, t.target, MoveType::Teleport, TELEPORT_COST)
                    .with_interact(Interact::Object(t.id)),
            );
        }

        for e in &self.elevators {
            let dest = if s == e.bottom {
                e.top
            } else if s == e.top {
                e.bottom
            } else {
                continue;
            };
            let cost = 0.5 * s.y.abs_diff(dest.y) as f32;
            moves.push(
                MoveAction::new(s, dest, MoveType::RideElevator, cost)
                    .with_interact(Interact::Object(e.id)),
            );
        }

        for rail in &self.rails {
            let interact = Interact::Object(rail.cart);
            if s.horizontal_neighbors().contains(&rail.start) {
                moves.push(
                    MoveAction::new(s, rail.start, MoveType::EnterVehicle, BOARD_COST)
                        .with_interact(interact),
                );
            }
            if s == rail.start {
                let route = rail.route();
                let cost = 0.3 * route.length(rail.start.center(), rail.end.center());
                moves.push(
                    MoveAction::new(s, rail.end, MoveType::RideVehicle, cost)
                        .with_interact(interact)
                        .with_route(route),
                );
            }
            if s == rail.end {
                for n in s.horizontal_neighbors() {
                    if self.is_stand_point(n) {
                        moves.push(
                            MoveAction::new(s, n, MoveType::ExitVehicle, BOARD_COST)
                                .with_interact(interact),
                        );
                    }
                }
            }
        }

        moves.out
    }

    fn is_valid_cell(&self, cell: Voxel) -> bool {
        self.is_passable(cell)
    }

    fn bounds(&self) -> Bounds {
        VoxelGrid::bounds(self)
    }
}
