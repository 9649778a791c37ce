//! Drive every agent of a scenario with a `GoTo` tree until all of them finish.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use delve_bt::{tick_brains, Brain};
use delve_core::{ManualClock, SharedClock, Status, SystemClock, TickContext};
use delve_nav::keys::NO_PATH;
use delve_nav::{GoTo, GridWorld, PathfindingService, Voxel};
use delve_tools::{TraceLog, TRACE_LOG};

use crate::scenario::Scenario;

/// Wall time given to worker threads per tick in threaded runs.
const THREADED_PACE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the scenario's tick limit.
    pub ticks: Option<u64>,
    /// Answer plan requests on worker threads against the wall clock instead of inline.
    pub threaded: bool,
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOutcome {
    Arrived,
    Failed,
    Unfinished,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub agent: u64,
    pub outcome: AgentOutcome,
    /// Ticks until the agent's task finished, or the whole run if it never did.
    pub ticks: u64,
    pub final_cell: Option<Voxel>,
    pub no_path: bool,
    pub plan_requests: usize,
    pub replans: usize,
    pub steps: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub scenario: String,
    pub threaded: bool,
    pub ticks: u64,
    pub agents: Vec<AgentReport>,
}

impl RunReport {
    pub fn all_arrived(&self) -> bool {
        self.agents
            .iter()
            .all(|a| a.outcome == AgentOutcome::Arrived)
    }

    pub fn summary(&self) -> String {
        let arrived = self
            .agents
            .iter()
            .filter(|a| a.outcome == AgentOutcome::Arrived)
            .count();
        format!(
            "{}: {arrived}/{} agents arrived in {} ticks",
            self.scenario,
            self.agents.len(),
            self.ticks
        )
    }
}

pub fn run(scenario: &Scenario, options: &RunOptions) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut world = scenario.build()?;

    let service = if options.threaded {
        PathfindingService::threaded(Arc::new(world.grid().clone()), options.workers.max(1))
    } else {
        PathfindingService::inline(scenario.searches_per_tick)
    };
    let manual = ManualClock::new();
    let clock: SharedClock = if options.threaded {
        SystemClock::shared()
    } else {
        manual.shared()
    };

    let mut ctx = TickContext::new(0, scenario.dt).with_seed(scenario.seed);
    let mut brains: Vec<Brain<GridWorld>> = Vec::with_capacity(scenario.agents.len());
    for agent in &scenario.agents {
        let node = GoTo::new(&scenario.config, clock.clone(), service.channel(agent.id))
            .with_context(|| format!("cannot build the goto node for agent {}", agent.id))?
            .with_goal(agent.goal);
        let mut brain = Brain::new(agent.id);
        brain.blackboard.set(TRACE_LOG, TraceLog::default());
        brain
            .try_assign(format!("goto-{}", agent.id), Box::new(node), &ctx, &mut world)
            .with_context(|| format!("cannot assign a task to agent {}", agent.id))?;
        brains.push(brain);
    }

    let limit = options.ticks.unwrap_or(scenario.ticks);
    tracing::info!(
        %run_id,
        scenario = %scenario.name,
        agents = brains.len(),
        limit,
        threaded = options.threaded,
        "run started"
    );

    let mut finished: BTreeMap<u64, u64> = BTreeMap::new();
    let mut revision = world.revision();
    let mut ticks = 0;
    while ticks < limit && brains.iter().any(|b| !b.is_idle()) {
        tick_brains(&ctx, &mut world, &mut brains);
        ticks += 1;
        for brain in brains.iter().filter(|b| b.is_idle()) {
            finished.entry(brain.agent).or_insert(ticks);
        }

        if world.revision() != revision {
            revision = world.revision();
            service.publish_graph(Arc::new(world.grid().clone()));
        }
        service.pump(world.grid());
        manual.advance(f64::from(scenario.dt));
        ctx = ctx.next();
        if options.threaded {
            thread::sleep(THREADED_PACE);
        }
    }

    let agents = brains
        .iter()
        .map(|brain| report_agent(brain, &world, finished.get(&brain.agent).copied(), ticks))
        .collect();
    let report = RunReport {
        run_id,
        started_at,
        scenario: scenario.name.clone(),
        threaded: options.threaded,
        ticks,
        agents,
    };
    tracing::info!(%run_id, summary = %report.summary(), "run finished");
    Ok(report)
}

fn report_agent(
    brain: &Brain<GridWorld>,
    world: &GridWorld,
    finished_at: Option<u64>,
    ticks: u64,
) -> AgentReport {
    let outcome = match (finished_at, brain.last_status()) {
        (Some(_), Some(Status::Success)) => AgentOutcome::Arrived,
        (Some(_), _) => AgentOutcome::Failed,
        (None, _) => AgentOutcome::Unfinished,
    };
    let trace = brain.blackboard.get(TRACE_LOG);
    let count = |tag: &str| trace.map(|t| t.count(tag)).unwrap_or(0);
    AgentReport {
        agent: brain.agent,
        outcome,
        ticks: finished_at.unwrap_or(ticks),
        final_cell: world.body(brain.agent).map(|b| Voxel::containing(b.position)),
        no_path: brain.blackboard.get_or(NO_PATH, false),
        plan_requests: count("plan.request"),
        replans: count("goto.replan"),
        steps: count("path.step"),
    }
}
