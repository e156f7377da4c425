//! Scripted optimization agent for tests and demos.
//!
//! Each provider gets a fixed script: events to emit, an optional gate to
//! wait on, a delay and a final step. Gates let a test decide exactly when
//! a task settles, which is how completion order and stale-run handling are
//! exercised deterministically.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::agent::{AgentEvent, AgentSink, OptimizationAgent, OptimizationRequest};
use crate::constants::CANCEL_POLL_INTERVAL;
use crate::outcome::{PromptChange, ProviderOutcome};
use crate::progress::{Cancelled, CancellationToken};
use crate::provider::ProviderId;

#[derive(Debug, Clone)]
enum Step {
    Succeed {
        prompt: String,
        changes: Vec<PromptChange>,
    },
    Fail(String),
    Panic,
}

#[derive(Debug, Clone)]
struct Script {
    step: Step,
    events: Vec<AgentEvent>,
    delay: Duration,
    gate: Option<Receiver<()>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            step: Step::Fail("no script for provider".into()),
            events: Vec::new(),
            delay: Duration::ZERO,
            gate: None,
        }
    }
}

/// Agent whose behaviour is fixed per provider in advance.
///
/// # Example
/// ```
/// use rosetta_core::{CancellationToken, OptimizationAgent, OptimizationRequest, ScriptedAgent};
/// use rosetta_core::agent::NullSink;
///
/// let mut agent = ScriptedAgent::new();
/// agent.succeed("openai", "better prompt", Vec::new());
///
/// let request = OptimizationRequest {
///     run_id: 1,
///     provider: "openai".into(),
///     prompt: "prompt".into(),
///     preserve_structure: true,
///     verbose_changelog: false,
/// };
/// let outcome = agent.optimize(&request, &NullSink, &CancellationToken::new());
/// assert_eq!(outcome.prompt(), Some("better prompt"));
/// ```
#[derive(Default)]
pub struct ScriptedAgent {
    scripts: HashMap<ProviderId, Script>,
    calls: Mutex<Vec<OptimizationRequest>>,
}

impl ScriptedAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&mut self, provider: impl Into<ProviderId>) -> &mut Script {
        self.scripts.entry(provider.into()).or_default()
    }

    /// Settle `provider` with an optimized prompt.
    pub fn succeed(
        &mut self,
        provider: impl Into<ProviderId>,
        prompt: impl Into<String>,
        changes: Vec<PromptChange>,
    ) -> &mut Self {
        self.script(provider).step = Step::Succeed {
            prompt: prompt.into(),
            changes,
        };
        self
    }

    /// Settle `provider` with a failure.
    pub fn fail(&mut self, provider: impl Into<ProviderId>, error: impl Into<String>) -> &mut Self {
        self.script(provider).step = Step::Fail(error.into());
        self
    }

    /// Panic inside the task for `provider`.
    pub fn panics(&mut self, provider: impl Into<ProviderId>) -> &mut Self {
        self.script(provider).step = Step::Panic;
        self
    }

    /// Sleep before settling `provider`.
    pub fn delay(&mut self, provider: impl Into<ProviderId>, delay: Duration) -> &mut Self {
        self.script(provider).delay = delay;
        self
    }

    /// Emit `event` when the task for `provider` starts.
    pub fn event(&mut self, provider: impl Into<ProviderId>, event: AgentEvent) -> &mut Self {
        self.script(provider).events.push(event);
        self
    }

    /// Hold the task for `provider` until the returned sender fires or is
    /// dropped. The gate is shared by every run of that provider.
    pub fn gate(&mut self, provider: impl Into<ProviderId>) -> Sender<()> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.script(provider).gate = Some(rx);
        tx
    }

    /// Requests received so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<OptimizationRequest> {
        self.calls.lock().clone()
    }

    fn wait_gate(gate: &Receiver<()>, cancel: &CancellationToken) -> Result<(), Cancelled> {
        loop {
            cancel.check_cancelled()?;
            match gate.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn run_script(
        script: &Script,
        provider: &ProviderId,
        sink: &dyn AgentSink,
        cancel: &CancellationToken,
    ) -> Result<ProviderOutcome, Cancelled> {
        for event in &script.events {
            sink.emit(event.clone());
        }
        if let Some(gate) = &script.gate {
            Self::wait_gate(gate, cancel)?;
        }
        cancel.sleep(script.delay)?;

        Ok(match &script.step {
            Step::Succeed { prompt, changes } => {
                ProviderOutcome::optimized(prompt.clone(), changes.clone())
            }
            Step::Fail(error) => ProviderOutcome::failed(error.clone()),
            Step::Panic => panic!("scripted panic for {provider}"),
        })
    }
}

impl OptimizationAgent for ScriptedAgent {
    fn optimize(
        &self,
        request: &OptimizationRequest,
        sink: &dyn AgentSink,
        cancel: &CancellationToken,
    ) -> ProviderOutcome {
        self.calls.lock().push(request.clone());
        let fallback = Script::default();
        let script = self.scripts.get(&request.provider).unwrap_or(&fallback);
        Self::run_script(script, &request.provider, sink, cancel)
            .unwrap_or_else(|e| ProviderOutcome::failed(e.to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
