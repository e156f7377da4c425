//! Messages sent from provider tasks to the store.

use std::time::Duration;

use rosetta_core::{AgentEvent, ProviderId, ProviderOutcome};

/// What a provider task reports.
#[derive(Debug, Clone)]
pub enum TaskPayload {
    /// Intermediate thinking/tool event.
    Event(AgentEvent),
    /// The task finished. Sent exactly once per task.
    Settled {
        outcome: ProviderOutcome,
        elapsed: Duration,
    },
}

/// A message tagged with the run and provider it belongs to.
#[derive(Debug, Clone)]
pub struct RunMessage {
    pub run_id: u64,
    pub provider: ProviderId,
    pub payload: TaskPayload,
}

impl RunMessage {
    #[must_use]
    pub fn event(run_id: u64, provider: ProviderId, event: AgentEvent) -> Self {
        Self {
            run_id,
            provider,
            payload: TaskPayload::Event(event),
        }
    }

    #[must_use]
    pub fn settled(
        run_id: u64,
        provider: ProviderId,
        outcome: ProviderOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id,
            provider,
            payload: TaskPayload::Settled { outcome, elapsed },
        }
    }

    #[must_use]
    pub fn is_settlement(&self) -> bool {
        matches!(self.payload, TaskPayload::Settled { .. })
    }
}
