//! Per-provider worker tasks.
//!
//! Each task runs the agent on its own thread and only ever talks to the
//! store through the run channel.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::debug;

use rosetta_core::{
    AgentEvent, AgentSink, CancellationToken, OptimizationAgent, OptimizationRequest, ProviderId,
    ProviderOutcome,
};

use crate::messages::RunMessage;

/// Forwards agent events onto the run channel, tagged with run and provider.
pub(crate) struct ChannelSink {
    run_id: u64,
    provider: ProviderId,
    tx: Sender<RunMessage>,
}

impl ChannelSink {
    pub(crate) fn new(run_id: u64, provider: ProviderId, tx: Sender<RunMessage>) -> Self {
        Self {
            run_id,
            provider,
            tx,
        }
    }
}

impl AgentSink for ChannelSink {
    fn emit(&self, event: AgentEvent) {
        // The store may have been dropped; nobody is listening then.
        let _ = self
            .tx
            .send(RunMessage::event(self.run_id, self.provider.clone(), event));
    }
}

/// Start the worker thread for one provider.
pub(crate) fn spawn_provider_task(
    agent: Arc<dyn OptimizationAgent>,
    request: OptimizationRequest,
    cancel: CancellationToken,
    tx: Sender<RunMessage>,
) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name(format!("rosetta-{}", request.provider))
        .spawn(move || run_provider_task(agent.as_ref(), &request, &cancel, &tx))
        .map(|_| ())
}

fn run_provider_task(
    agent: &dyn OptimizationAgent,
    request: &OptimizationRequest,
    cancel: &CancellationToken,
    tx: &Sender<RunMessage>,
) {
    let start = Instant::now();
    let sink = ChannelSink::new(request.run_id, request.provider.clone(), tx.clone());

    let outcome = catch_unwind(AssertUnwindSafe(|| agent.optimize(request, &sink, cancel)))
        .unwrap_or_else(|payload| {
            ProviderOutcome::failed(format!(
                "optimization agent panicked: {}",
                panic_message(payload.as_ref())
            ))
        });
    let elapsed = start.elapsed();

    debug!(
        run_id = request.run_id,
        provider = %request.provider,
        success = outcome.is_success(),
        "provider task finished"
    );
    let _ = tx.send(RunMessage::settled(
        request.run_id,
        request.provider.clone(),
        outcome,
        elapsed,
    ));
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
