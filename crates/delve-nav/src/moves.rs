//! Atomic transport steps between cells.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Vec3, Voxel};

/// Transport mode of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MoveType {
    Walk,
    Swim,
    Fall,
    Jump,
    HighJump,
    Climb,
    ClimbWalls,
    Fly,
    Dig,
    DestroyObject,
    EnterVehicle,
    RideVehicle,
    ExitVehicle,
    RideElevator,
    Teleport,
}

impl MoveType {
    pub const ALL: [MoveType; 15] = [
        MoveType::Walk,
        MoveType::Swim,
        MoveType::Fall,
        MoveType::Jump,
        MoveType::HighJump,
        MoveType::Climb,
        MoveType::ClimbWalls,
        MoveType::Fly,
        MoveType::Dig,
        MoveType::DestroyObject,
        MoveType::EnterVehicle,
        MoveType::RideVehicle,
        MoveType::ExitVehicle,
        MoveType::RideElevator,
        MoveType::Teleport,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MoveType::Walk => "walk",
            MoveType::Swim => "swim",
            MoveType::Fall => "fall",
            MoveType::Jump => "jump",
            MoveType::HighJump => "high_jump",
            MoveType::Climb => "climb",
            MoveType::ClimbWalls => "climb_walls",
            MoveType::Fly => "fly",
            MoveType::Dig => "dig",
            MoveType::DestroyObject => "destroy_object",
            MoveType::EnterVehicle => "enter_vehicle",
            MoveType::RideVehicle => "ride_vehicle",
            MoveType::ExitVehicle => "exit_vehicle",
            MoveType::RideElevator => "ride_elevator",
            MoveType::Teleport => "teleport",
        }
    }

    /// Steps that change the world; the rest of a path is stale once one of these runs.
    pub fn modifies_world(self) -> bool {
        matches!(self, MoveType::Dig | MoveType::DestroyObject)
    }

    /// Steps that need an exclusive slot on a shared transport object.
    pub fn uses_ride_slot(self) -> bool {
        matches!(
            self,
            MoveType::EnterVehicle
                | MoveType::RideVehicle
                | MoveType::ExitVehicle
                | MoveType::RideElevator
        )
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a world object (ladder, door, cart, elevator, teleporter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectId(pub u32);

/// What a step interacts with while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interact {
    Object(ObjectId),
    Voxel(Voxel),
}

impl Interact {
    pub fn object(self) -> Option<ObjectId> {
        match self {
            Interact::Object(id) => Some(id),
            Interact::Voxel(_) => None,
        }
    }
}

/// Shape of the motion between source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Route {
    #[default]
    Linear,
    /// Quadratic curve through a control point, e.g. a rail bend.
    Curve { control: Vec3 },
}

impl Route {
    pub fn point(self, from: Vec3, to: Vec3, t: f32) -> Vec3 {
        match self {
            Route::Linear => from.lerp(to, t),
            Route::Curve { control } => from.quadratic_bezier(control, to, t),
        }
    }

    /// Approximate arc length, used to derive step duration.
    pub fn length(self, from: Vec3, to: Vec3) -> f32 {
        match self {
            Route::Linear => from.distance(to),
            Route::Curve { control } => {
                const SAMPLES: usize = 8;
                let mut prev = from;
                let mut total = 0.0;
                for i in 1..=SAMPLES {
                    let p = from.quadratic_bezier(control, to, i as f32 / SAMPLES as f32);
                    total += prev.distance(p);
                    prev = p;
                }
                total
            }
        }
    }
}

/// One atomic step produced by a movement graph. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoveAction {
    pub source: Voxel,
    pub dest: Voxel,
    pub move_type: MoveType,
    pub cost: f32,
    pub interact: Option<Interact>,
    pub route: Route,
}

impl MoveAction {
    pub fn new(source: Voxel, dest: Voxel, move_type: MoveType, cost: f32) -> Self {
        Self {
            source,
            dest,
            move_type,
            cost,
            interact: None,
            route: Route::Linear,
        }
    }

    pub fn with_interact(mut self, interact: Interact) -> Self {
        self.interact = Some(interact);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }
}

/// Movement capabilities of an agent; gates which steps a graph offers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Mobility {
    /// Cells the agent can jump up: 0 none, 1 jump, 2 high jump.
    pub jump_height: u8,
    /// Deepest drop the agent survives.
    pub max_fall: u8,
    pub climb: bool,
    pub climb_walls: bool,
    pub swim: bool,
    pub fly: bool,
    pub dig: bool,
    pub destroy: bool,
    pub teleport: bool,
    pub ride: bool,
}

impl Mobility {
    /// Walks and drops a few cells; nothing else.
    pub const fn walker() -> Self {
        Self {
            jump_height: 0,
            max_fall: 3,
            climb: false,
            climb_walls: false,
            swim: false,
            fly: false,
            dig: false,
            destroy: false,
            teleport: false,
            ride: false,
        }
    }

    /// The usual settler: jumps, climbs ladders, swims and uses transport.
    pub const fn settler() -> Self {
        Self {
            jump_height: 1,
            climb: true,
            swim: true,
            teleport: true,
            ride: true,
            ..Self::walker()
        }
    }

    pub const fn allows(&self, move_type: MoveType) -> bool {
        match move_type {
            MoveType::Walk => true,
            MoveType::Fall => self.max_fall > 0,
            MoveType::Jump => self.jump_height >= 1,
            MoveType::HighJump => self.jump_height >= 2,
            MoveType::Climb => self.climb,
            MoveType::ClimbWalls => self.climb_walls,
            MoveType::Swim => self.swim,
            MoveType::Fly => self.fly,
            MoveType::Dig => self.dig,
            MoveType::DestroyObject => self.destroy,
            MoveType::Teleport => self.teleport,
            MoveType::EnterVehicle
            | MoveType::RideVehicle
            | MoveType::ExitVehicle
            | MoveType::RideElevator => self.ride,
        }
    }
}

impl Default for Mobility {
    fn default() -> Self {
        Self::settler()
    }
}
