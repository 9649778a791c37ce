//! Per-agent trace events.
//!
//! Every event carries the tick and agent it belongs to, a dotted tag naming what happened
//! (`plan.request`, `path.step`, ...) and two numeric payload slots whose meaning each emitting
//! module documents next to its tags. Events land in the agent's blackboard, so a replay with the
//! same inputs yields the same log.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use delve_core::{AgentId, BbKey, Blackboard, TickContext};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    /// Stable id of the agent, or 0 for world-level events.
    pub agent: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            agent: 0,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    /// Event stamped with the current tick and `agent`.
    pub fn at<A: AgentId>(ctx: &TickContext, agent: A, tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ctx.tick, tag).with_agent(agent.stable_id())
    }

    pub fn with_agent(mut self, agent: u64) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }
}

/// Streaming destination for events, stored under [`TRACE_SINK`].
///
/// Any `FnMut(TraceEvent)` closure is a sink.
pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

impl<F> TraceSink for F
where
    F: FnMut(TraceEvent),
{
    fn emit(&mut self, event: TraceEvent) {
        self(event)
    }
}

/// Events an agent produced, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn count(&self, tag: &str) -> usize {
        self.with_tag(tag).count()
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.tag == tag)
    }
}

pub const TRACE_LOG: BbKey<TraceLog> = BbKey::new("TraceLog");
pub const TRACE_SINK: BbKey<Box<dyn TraceSink>> = BbKey::new("TraceSink");

/// Append `event` to the agent's [`TRACE_LOG`] and hand it to its [`TRACE_SINK`], whichever
/// exist. Agents with neither pay nothing.
pub fn emit(blackboard: &mut Blackboard, event: TraceEvent) {
    let has_sink = blackboard.contains(TRACE_SINK);
    if let Some(log) = blackboard.get_mut(TRACE_LOG) {
        if !has_sink {
            log.push(event);
            return;
        }
        log.push(event.clone());
    }
    if let Some(sink) = blackboard.get_mut(TRACE_SINK) {
        sink.emit(event);
    }
}
