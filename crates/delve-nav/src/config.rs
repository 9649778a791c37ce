//! Tunables for planning, fallback walking and path execution.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{MoveType, NavError};

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    pub planner: PlannerConfig,
    pub greedy: GreedyConfig,
    pub goto: GotoConfig,
    pub motion: MotionConfig,
}

impl NavConfig {
    pub fn validate(&self) -> Result<(), NavError> {
        self.planner.validate()?;
        self.greedy.validate()?;
        self.motion.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Heuristic weight per attempt; the last one is reused once exhausted.
    pub weights: Vec<f32>,
    /// Timeouts tolerated before the planner gives up.
    pub max_timeouts: u32,
    /// Real time to wait for a response before re-issuing.
    pub timeout_seconds: f64,
    pub max_expansions: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weights: vec![1.0, 2.0, 5.0, 10.0],
            max_timeouts: 4,
            timeout_seconds: 2.0,
            max_expansions: 1000,
        }
    }
}

impl PlannerConfig {
    /// Weight for the attempt following `timeouts` timeouts.
    pub fn weight_for(&self, timeouts: u32) -> f32 {
        let idx = (timeouts as usize).min(self.weights.len().saturating_sub(1));
        self.weights.get(idx).copied().unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), NavError> {
        if self.weights.is_empty() {
            return Err(invalid("planner.weights must not be empty"));
        }
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(invalid(format!("planner.weights contains non-positive weight {w}")));
        }
        if self.max_timeouts == 0 {
            return Err(invalid("planner.max_timeouts must be at least 1"));
        }
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Err(invalid("planner.timeout_seconds must be positive"));
        }
        if self.max_expansions == 0 {
            return Err(invalid("planner.max_expansions must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GreedyConfig {
    pub max_hops: u32,
    /// Score multiplier applied once per earlier visit of a cell.
    pub revisit_penalty: f32,
    /// Relative jitter on the heuristic term.
    pub jitter: f32,
    /// Real time the plan/greedy cycle may run before the whole move gives up.
    pub window_seconds: f64,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            max_hops: 10,
            revisit_penalty: 10.0,
            jitter: 0.1,
            window_seconds: 10.0,
        }
    }
}

impl GreedyConfig {
    pub fn validate(&self) -> Result<(), NavError> {
        if self.max_hops == 0 {
            return Err(invalid("greedy.max_hops must be at least 1"));
        }
        if !(self.revisit_penalty.is_finite() && self.revisit_penalty >= 1.0) {
            return Err(invalid("greedy.revisit_penalty must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(invalid("greedy.jitter must be in [0, 1)"));
        }
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(invalid("greedy.window_seconds must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GotoConfig {
    pub max_replans: u32,
}

impl Default for GotoConfig {
    fn default() -> Self {
        Self { max_replans: 10 }
    }
}

/// Per-mode speed multipliers, applied on top of the agent's base speed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModeSpeeds {
    pub walk: f32,
    pub swim: f32,
    pub fall: f32,
    pub jump: f32,
    pub climb: f32,
    pub fly: f32,
    pub vehicle: f32,
    pub elevator: f32,
}

impl Default for ModeSpeeds {
    fn default() -> Self {
        Self {
            walk: 1.0,
            swim: 0.5,
            fall: 2.0,
            jump: 1.0,
            climb: 0.5,
            fly: 1.2,
            vehicle: 3.0,
            elevator: 1.5,
        }
    }
}

impl ModeSpeeds {
    pub fn multiplier(&self, move_type: MoveType) -> f32 {
        match move_type {
            MoveType::Walk | MoveType::Teleport | MoveType::Dig | MoveType::DestroyObject => {
                self.walk
            }
            MoveType::Swim => self.swim,
            MoveType::Fall => self.fall,
            MoveType::Jump | MoveType::HighJump => self.jump,
            MoveType::Climb | MoveType::ClimbWalls => self.climb,
            MoveType::Fly => self.fly,
            MoveType::EnterVehicle | MoveType::ExitVehicle => self.walk,
            MoveType::RideVehicle => self.vehicle,
            MoveType::RideElevator => self.elevator,
        }
    }

    fn all(&self) -> [f32; 8] {
        [
            self.walk,
            self.swim,
            self.fall,
            self.jump,
            self.climb,
            self.fly,
            self.vehicle,
            self.elevator,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Global game-speed factor.
    pub speed_setting: f32,
    pub modes: ModeSpeeds,
    pub cue_interval_seconds: f32,
    /// Apex of a jump arc above the straight line, in cells; doubled for high jumps.
    pub jump_height: f32,
    /// How far an agent may be from a path's first source and still follow it.
    pub arrival_tolerance: f32,
    /// Work applied per second by dig and destroy steps.
    pub work_rate: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_setting: 1.0,
            modes: ModeSpeeds::default(),
            cue_interval_seconds: 0.25,
            jump_height: 0.5,
            arrival_tolerance: 0.75,
            work_rate: 1.0,
        }
    }
}

impl MotionConfig {
    /// Base speed x mode multiplier x global speed setting.
    pub fn effective_speed(&self, base_speed: f32, move_type: MoveType) -> f32 {
        base_speed * self.modes.multiplier(move_type) * self.speed_setting
    }

    pub fn validate(&self) -> Result<(), NavError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.speed_setting) {
            return Err(invalid("motion.speed_setting must be positive"));
        }
        if !self.modes.all().into_iter().all(positive) {
            return Err(invalid("motion.modes multipliers must be positive"));
        }
        if !positive(self.cue_interval_seconds) {
            return Err(invalid("motion.cue_interval_seconds must be positive"));
        }
        if !positive(self.work_rate) {
            return Err(invalid("motion.work_rate must be positive"));
        }
        if !(self.arrival_tolerance.is_finite() && self.arrival_tolerance >= 0.0) {
            return Err(invalid("motion.arrival_tolerance must not be negative"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> NavError {
    NavError::InvalidConfig(msg.into())
}
