//! Offline optimization agent.
//!
//! Walks through the same visible steps as a documentation-reading agent
//! (plan, list docs, read docs, submit) with configurable latency, and
//! rewrites the prompt with a fixed per-provider formatting convention.
//! It performs no network I/O.

use std::collections::HashMap;
use std::time::Duration;

use crate::agent::{AgentEvent, AgentSink, OptimizationAgent, OptimizationRequest};
use crate::constants::DEFAULT_SIMULATED_LATENCY;
use crate::outcome::{PromptChange, ProviderOutcome};
use crate::progress::{Cancelled, CancellationToken};
use crate::provider::ProviderId;

/// Formatting convention applied for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptStyle {
    XmlTags,
    Markdown,
    LabeledSections,
    Plain,
}

impl PromptStyle {
    fn for_provider(provider: &ProviderId) -> Self {
        match provider.as_str() {
            "anthropic" => Self::XmlTags,
            "openai" | "mistral" | "deepseek" => Self::Markdown,
            "google" | "meta" => Self::LabeledSections,
            _ => Self::Plain,
        }
    }

    fn apply(self, prompt: &str) -> (String, PromptChange) {
        match self {
            Self::XmlTags => (
                format!("<instructions>\n{prompt}\n</instructions>"),
                PromptChange::new("formatting", "Wrapped the instructions in XML tags"),
            ),
            Self::Markdown => (
                format!("## Task\n\n{prompt}"),
                PromptChange::new("formatting", "Added a markdown task heading"),
            ),
            Self::LabeledSections => (
                format!("Task:\n{prompt}\n\nOutput:\nA clear, direct answer."),
                PromptChange::new("structure", "Split the prompt into labeled sections"),
            ),
            Self::Plain => (
                format!("Instructions:\n{prompt}"),
                PromptChange::new("formatting", "Prefixed an explicit instructions label"),
            ),
        }
    }
}

/// Deterministic offline agent with injectable latency and failures.
pub struct SimulatedAgent {
    latency: Duration,
    latency_overrides: HashMap<ProviderId, Duration>,
    failures: HashMap<ProviderId, String>,
}

impl SimulatedAgent {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            latency_overrides: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Use a different latency for one provider.
    #[must_use]
    pub fn with_latency_for(mut self, provider: impl Into<ProviderId>, latency: Duration) -> Self {
        self.latency_overrides.insert(provider.into(), latency);
        self
    }

    /// Make one provider fail with `error`.
    #[must_use]
    pub fn with_failure(
        mut self,
        provider: impl Into<ProviderId>,
        error: impl Into<String>,
    ) -> Self {
        self.failures.insert(provider.into(), error.into());
        self
    }

    fn latency_for(&self, provider: &ProviderId) -> Duration {
        self.latency_overrides
            .get(provider)
            .copied()
            .unwrap_or(self.latency)
    }


    fn run_steps(
        &self,
        request: &OptimizationRequest,
        sink: &dyn AgentSink,
        cancel: &CancellationToken,
    ) -> Result<ProviderOutcome, Cancelled> {
        let provider = &request.provider;
        let step = self.latency_for(provider) / 3;
        let prompt = request.prompt.trim();

        sink.emit(AgentEvent::thinking(format!(
            "Analyzing prompt for {} ({} chars)",
            provider.display_name(),
            prompt.chars().count()
        )));
        cancel.sleep(step)?;

        sink.emit(AgentEvent::tool(format!("list_provider_docs(provider={provider})")));
        cancel.sleep(step)?;

        sink.emit(AgentEvent::tool(format!(
            "read_provider_doc(provider={provider}, doc_name=prompting.md)"
        )));
        cancel.sleep(step)?;

        if let Some(error) = self.failures.get(provider) {
            return Ok(ProviderOutcome::failed(error.clone()));
        }

        let (mut optimized, mut style_change) = PromptStyle::for_provider(provider).apply(prompt);
        let mut changes = Vec::new();

        if request.verbose_changelog {
            let before = prompt.lines().next().unwrap_or_default().to_string();
            let after = optimized.lines().next().unwrap_or_default().to_string();
            style_change = style_change.with_snippets(before, after);
        }
        changes.push(style_change);

        if !request.preserve_structure {
            optimized.push_str("\n\nThink through the problem step by step before answering.");
            changes.push(PromptChange::new(
                "clarity",
                "Added an explicit step-by-step reasoning cue",
            ));
        }

        changes.push(PromptChange::new(
            "provider_pattern",
            format!("Applied guidelines from {provider}/prompting.md"),
        ));

        sink.emit(AgentEvent::thinking("Submitting optimization"));
        Ok(ProviderOutcome::optimized(optimized, changes))
    }
}

impl Default for SimulatedAgent {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_LATENCY)
    }
}

impl OptimizationAgent for SimulatedAgent {
    fn optimize(
        &self,
        request: &OptimizationRequest,
        sink: &dyn AgentSink,
        cancel: &CancellationToken,
    ) -> ProviderOutcome {
        self.run_steps(request, sink, cancel)
            .unwrap_or_else(|e| ProviderOutcome::failed(e.to_string()))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentEventKind, CollectingSink, NullSink};
    use std::time::Instant;

    fn request(provider: &str) -> OptimizationRequest {
        OptimizationRequest {
            run_id: 1,
            provider: provider.into(),
            prompt: "Explain recursion".into(),
            preserve_structure: true,
            verbose_changelog: false,
        }
    }

    #[test]
    fn anthropic_gets_xml_tags() {
        let agent = SimulatedAgent::new(Duration::ZERO);
        let outcome = agent.optimize(&request("anthropic"), &NullSink, &CancellationToken::new());
        assert!(outcome.is_success());
        assert!(outcome.prompt().unwrap().starts_with("<instructions>"));
        assert_eq!(outcome.changes().len(), 2);
    }

    #[test]
    fn emits_thinking_and_tool_events() {
        let agent = SimulatedAgent::new(Duration::ZERO);
        let sink = CollectingSink::new();
        agent.optimize(&request("openai"), &sink, &CancellationToken::new());
        let events = sink.events();
        assert!(events.iter().any(|e| e.kind == AgentEventKind::Thinking));
        assert_eq!(
            events.iter().filter(|e| e.kind == AgentEventKind::Tool).count(),
            2
        );
    }

    #[test]
    fn injected_failure() {
        let agent = SimulatedAgent::new(Duration::ZERO).with_failure("kimi", "rate limited");
        let outcome = agent.optimize(&request("kimi"), &NullSink, &CancellationToken::new());
        assert_eq!(outcome.error(), Some("rate limited"));
    }

    #[test]
    fn restructuring_adds_clarity_change() {
        let agent = SimulatedAgent::new(Duration::ZERO);
        let mut req = request("google");
        req.preserve_structure = false;
        req.verbose_changelog = true;
        let outcome = agent.optimize(&req, &NullSink, &CancellationToken::new());
        let changes = outcome.changes();
        assert_eq!(changes.len(), 3);
        assert!(changes.iter().any(|c| c.category == "clarity"));
        assert_eq!(changes[0].before.as_deref(), Some("Explain recursion"));
    }

    #[test]
    fn cancelled_before_start() {
        let agent = SimulatedAgent::new(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = Instant::now();
        let outcome = agent.optimize(&request("openai"), &NullSink, &cancel);
        assert_eq!(outcome.error(), Some("optimization cancelled"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn per_provider_latency_override() {
        let agent = SimulatedAgent::new(Duration::from_secs(10))
            .with_latency_for("openai", Duration::ZERO);
        let started = Instant::now();
        let outcome = agent.optimize(&request("openai"), &NullSink, &CancellationToken::new());
        assert!(outcome.is_success());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
