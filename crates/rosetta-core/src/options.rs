//! Optimization options.

use std::time::Duration;

/// Options applied to every provider in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Keep the overall structure of the prompt. Forwarded to agents.
    pub preserve_structure: bool,
    /// Ask agents for a detailed changelog. Forwarded to agents.
    pub verbose_changelog: bool,
    /// Relay intermediate agent events (thinking/tool) into the event log.
    pub include_logs: bool,
    /// Settle a provider as failed if it runs longer than this.
    pub provider_timeout: Option<Duration>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            preserve_structure: true,
            verbose_changelog: false,
            include_logs: true,
            provider_timeout: None,
        }
    }
}

impl OptimizeOptions {
    /// Normalize options: a zero timeout means no timeout.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.provider_timeout == Some(Duration::ZERO) {
            self.provider_timeout = None;
        }
        self
    }
}
