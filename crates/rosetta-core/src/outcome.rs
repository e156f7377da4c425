//! Per-provider outcomes and the run's result set.

use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::provider::ProviderId;

/// A single change an agent made to the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptChange {
    /// e.g. "structure", "formatting", "clarity".
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl PromptChange {
    #[must_use]
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            before: None,
            after: None,
        }
    }

    /// Attach the original and rewritten snippets.
    #[must_use]
    pub fn with_snippets(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self.after = Some(after.into());
        self
    }
}

/// Terminal record of one provider's optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Optimized {
        prompt: String,
        changes: Vec<PromptChange>,
    },
    Failed {
        error: String,
    },
}

impl ProviderOutcome {
    #[must_use]
    pub fn optimized(prompt: impl Into<String>, changes: Vec<PromptChange>) -> Self {
        Self::Optimized {
            prompt: prompt.into(),
            changes,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Optimized { .. })
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::Optimized { prompt, .. } => Some(prompt),
            Self::Failed { .. } => None,
        }
    }

    /// Changes applied; empty for a failed outcome.
    #[must_use]
    pub fn changes(&self) -> &[PromptChange] {
        match self {
            Self::Optimized { changes, .. } => changes,
            Self::Failed { .. } => &[],
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Optimized { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }

    /// Short summary used in log lines: "3 changes" or the error text.
    #[must_use]
    pub fn synopsis(&self) -> String {
        match self {
            Self::Optimized { changes, .. } if changes.len() == 1 => "1 change".to_string(),
            Self::Optimized { changes, .. } => format!("{} changes", changes.len()),
            Self::Failed { error } => error.clone(),
        }
    }
}

/// One provider's entry in a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResult {
    pub provider: ProviderId,
    pub outcome: ProviderOutcome,
    /// Time from dispatch to settlement.
    pub elapsed: Duration,
}

/// Final, immutable outcome of a run.
///
/// Iterates in dispatch order. Serializes as
/// `{"original": ..., "optimized": {provider: outcome, ...}}`, where each
/// outcome carries `provider`, `success` and `elapsed_ms` next to its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    original: String,
    optimized: Vec<ProviderResult>,
}

impl ResultSet {
    #[must_use]
    pub fn new(original: impl Into<String>, optimized: Vec<ProviderResult>) -> Self {
        Self {
            original: original.into(),
            optimized,
        }
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[must_use]
    pub fn get(&self, provider: &ProviderId) -> Option<&ProviderOutcome> {
        self.result(provider).map(|r| &r.outcome)
    }

    #[must_use]
    pub fn result(&self, provider: &ProviderId) -> Option<&ProviderResult> {
        self.optimized.iter().find(|r| &r.provider == provider)
    }

    #[must_use]
    pub fn contains(&self, provider: &ProviderId) -> bool {
        self.result(provider).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderResult> {
        self.optimized.iter()
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderId> {
        self.optimized.iter().map(|r| &r.provider)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.optimized.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.optimized.is_empty()
    }

    /// Sum of changes across all successful providers.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.optimized.iter().map(|r| r.outcome.changes().len()).sum()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.optimized
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    #[must_use]
    pub fn all_failed(&self) -> bool {
        !self.is_empty() && self.succeeded() == 0
    }
}

#[derive(Serialize)]
struct SerializedResult<'a> {
    provider: &'a str,
    success: bool,
    #[serde(flatten)]
    outcome: &'a ProviderOutcome,
    elapsed_ms: u64,
}

struct SerializedOptimized<'a>(&'a [ProviderResult]);

impl Serialize for SerializedOptimized<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for r in self.0 {
            let elapsed_ms = u64::try_from(r.elapsed.as_millis()).unwrap_or(u64::MAX);
            map.serialize_entry(
                r.provider.as_str(),
                &SerializedResult {
                    provider: r.provider.as_str(),
                    success: r.outcome.is_success(),
                    outcome: &r.outcome,
                    elapsed_ms,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("original", &self.original)?;
        map.serialize_entry("optimized", &SerializedOptimized(&self.optimized))?;
        map.end()
    }
}
