//! Optimization agent traits.
//!
//! `OptimizationAgent` is the collaborator the orchestrator dispatches one
//! task per provider to. `AgentSink` receives the intermediate events an
//! agent reports while it works; the orchestrator relays them into the
//! event log in arrival order.

use parking_lot::Mutex;

use crate::log::LogKind;
use crate::outcome::ProviderOutcome;
use crate::progress::CancellationToken;
use crate::provider::ProviderId;

/// What an agent is asked to do for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationRequest {
    pub run_id: u64,
    pub provider: ProviderId,
    pub prompt: String,
    pub preserve_structure: bool,
    pub verbose_changelog: bool,
}

/// Kind of an intermediate agent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEventKind {
    /// Reasoning or planning.
    Thinking,
    /// A tool invocation, e.g. reading provider docs.
    Tool,
}

impl From<AgentEventKind> for LogKind {
    fn from(kind: AgentEventKind) -> Self {
        match kind {
            AgentEventKind::Thinking => LogKind::Thinking,
            AgentEventKind::Tool => LogKind::Tool,
        }
    }
}

/// An intermediate, log-worthy event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    pub kind: AgentEventKind,
    pub message: String,
}

impl AgentEvent {
    #[must_use]
    pub fn thinking(message: impl Into<String>) -> Self {
        Self {
            kind: AgentEventKind::Thinking,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn tool(message: impl Into<String>) -> Self {
        Self {
            kind: AgentEventKind::Tool,
            message: message.into(),
        }
    }
}

/// Receiver of intermediate agent events.
pub trait AgentSink: Send + Sync {
    fn emit(&self, event: AgentEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl AgentSink for NullSink {
    fn emit(&self, _event: AgentEvent) {}
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    #[must_use]
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().clone()
    }
}

impl AgentSink for CollectingSink {
    fn emit(&self, event: AgentEvent) {
        self.events.lock().push(event);
    }
}

/// Optimizes a prompt for a single provider.
///
/// Runs on its own worker thread. Failures are reported as
/// [`ProviderOutcome::Failed`], never by panicking; the orchestrator still
/// contains panics and reports them the same way.
pub trait OptimizationAgent: Send + Sync {
    fn optimize(
        &self,
        request: &OptimizationRequest,
        sink: &dyn AgentSink,
        cancel: &CancellationToken,
    ) -> ProviderOutcome;

    /// Name of this agent implementation.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_map_to_log_kinds() {
        assert_eq!(LogKind::from(AgentEventKind::Thinking), LogKind::Thinking);
        assert_eq!(LogKind::from(AgentEventKind::Tool), LogKind::Tool);
    }

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.emit(AgentEvent::thinking("plan"));
        sink.emit(AgentEvent::tool("list_provider_docs"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AgentEventKind::Thinking);
        assert_eq!(events[1].message, "list_provider_docs");
    }

    #[test]
    fn null_sink() {
        NullSink.emit(AgentEvent::thinking("ignored"));
    }
}
