use delve_core::{AgentId, Blackboard, TickContext};
use delve_tools::{emit, TraceEvent};

pub(crate) fn record<A: AgentId>(
    blackboard: &mut Blackboard,
    ctx: &TickContext,
    agent: A,
    tag: &'static str,
    a: u64,
    b: u64,
) {
    emit(blackboard, TraceEvent::at(ctx, agent, tag).with_a(a).with_b(b));
}
