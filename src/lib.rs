//! Scenario fixtures for the workspace integration tests.
//!
//! A scenario file describes a provider list, a sequence of selection
//! toggles, a prompt and the scripted outcome of every provider, together
//! with what a completed run is expected to look like.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use rosetta_core::{ProviderOutcome, ScriptedAgent};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub description: String,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub providers: Vec<String>,
    /// Toggled in order; toggling a provider twice deselects it.
    pub toggles: Vec<String>,
    pub prompt: String,
    #[serde(default)]
    pub outcomes: BTreeMap<String, ProviderOutcome>,
    /// Providers whose task panics instead of settling.
    #[serde(default)]
    pub panics: Vec<String>,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
pub struct Expected {
    /// Rejection message when the run must not start.
    #[serde(default)]
    pub rejection: Option<String>,
    /// Selection after all toggles, in selection order.
    pub selected: Vec<String>,
    /// Providers in the result set, in dispatch order.
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub succeeded: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub total_changes: usize,
    /// Expected error text per failed provider.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl Scenario {
    /// Agent scripted with this scenario's outcomes.
    #[must_use]
    pub fn agent(&self) -> ScriptedAgent {
        let mut agent = ScriptedAgent::new();
        for (provider, outcome) in &self.outcomes {
            match outcome {
                ProviderOutcome::Optimized { prompt, changes } => {
                    agent.succeed(provider.as_str(), prompt.clone(), changes.clone());
                }
                ProviderOutcome::Failed { error } => {
                    agent.fail(provider.as_str(), error.clone());
                }
            }
        }
        for provider in &self.panics {
            agent.panics(provider.as_str());
        }
        agent
    }
}

/// Load a scenario file.
pub fn load(path: &Path) -> Result<ScenarioFile, FixtureError> {
    let data = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&data)?)
}
