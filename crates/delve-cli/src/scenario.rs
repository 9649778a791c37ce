//! YAML scenario files: a voxel world, its transport objects, agents with goals, and the
//! navigation tunables they run with.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use delve_nav::{
    Barricade, Elevator, GoalRegion, GridWorld, Mobility, MovementGraph, NavConfig, Rail,
    Teleporter, Voxel, VoxelGrid,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Simulated seconds per tick.
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub seed: u64,
    /// Tick limit when the command line does not give one.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Searches answered per tick by the inline service.
    #[serde(default = "default_searches_per_tick")]
    pub searches_per_tick: usize,
    /// Work needed to dig a soil cell or break a barricade.
    #[serde(default = "default_hardness")]
    pub hardness: f32,
    /// Horizontal layers, bottom first; see [`VoxelGrid::from_layers`].
    pub layers: Vec<Vec<String>>,
    #[serde(default)]
    pub objects: Objects,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub config: NavConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Objects {
    pub barricades: Vec<Barricade>,
    pub teleporters: Vec<Teleporter>,
    pub elevators: Vec<Elevator>,
    pub rails: Vec<Rail>,
    /// Charges per teleporter; the world default applies when unset.
    pub teleport_charges: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: u64,
    pub start: Voxel,
    pub goal: GoalRegion,
    #[serde(default)]
    pub mobility: Mobility,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_dt() -> f32 {
    0.25
}

fn default_ticks() -> u64 {
    2000
}

fn default_searches_per_tick() -> usize {
    4
}

fn default_hardness() -> f32 {
    1.0
}

fn default_speed() -> f32 {
    1.0
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn grid(&self) -> Result<VoxelGrid> {
        let mut grid = VoxelGrid::from_layers(&self.layers).context("invalid layers")?;
        for barricade in &self.objects.barricades {
            grid.add_barricade(*barricade);
        }
        for teleporter in &self.objects.teleporters {
            grid.add_teleporter(*teleporter);
        }
        for elevator in &self.objects.elevators {
            grid.add_elevator(*elevator);
        }
        for rail in &self.objects.rails {
            grid.add_rail(*rail);
        }
        Ok(grid)
    }

    /// Check everything a run depends on without running it.
    pub fn validate(&self) -> Result<VoxelGrid> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            bail!("dt must be positive, got {}", self.dt);
        }
        if self.hardness <= 0.0 {
            bail!("hardness must be positive, got {}", self.hardness);
        }
        self.config.validate().context("invalid nav config")?;
        let grid = self.grid()?;
        let bounds = grid.bounds();

        let mut ids = BTreeSet::new();
        for agent in &self.agents {
            if !ids.insert(agent.id) {
                bail!("agent {} is listed twice", agent.id);
            }
            if !grid.is_valid_cell(agent.start) {
                bail!("agent {} starts inside solid ground at {}", agent.id, agent.start);
            }
            if !agent.goal.is_well_formed() {
                bail!("agent {} has a malformed goal {:?}", agent.id, agent.goal);
            }
            if agent.goal.target().is_some_and(|t| !bounds.contains(t)) {
                tracing::warn!(agent = agent.id, goal = ?agent.goal, "goal lies outside the world");
            }
            if !agent.speed.is_finite() || agent.speed <= 0.0 {
                bail!("agent {} has a non-positive speed", agent.id);
            }
        }
        Ok(grid)
    }

    /// The world at tick zero, with every agent placed at its start.
    pub fn build(&self) -> Result<GridWorld> {
        let grid = self.validate()?;
        let mut world = GridWorld::new(grid);
        world.set_hardness(self.hardness);
        if let Some(charges) = self.objects.teleport_charges {
            for teleporter in &self.objects.teleporters {
                world.set_teleport_charges(teleporter.id, charges);
            }
        }
        for agent in &self.agents {
            world.spawn(agent.id, agent.start, agent.mobility);
            world.set_speed(agent.id, agent.speed);
        }
        Ok(world)
    }
}
