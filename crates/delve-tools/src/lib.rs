//! Tooling primitives for deterministic agent behavior.
//!
//! Trace events are recorded into the agent's blackboard, so replays of the same inputs produce
//! the same trace. Rendering and inspection belong to whatever consumes the log.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{emit, TraceEvent, TraceLog, TraceSink, TRACE_LOG, TRACE_SINK};
