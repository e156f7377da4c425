//! Defaults and limits shared across the workspace.

use std::time::Duration;

/// Providers offered when no source is configured.
pub const DEFAULT_PROVIDERS: [&str; 4] = ["anthropic", "google", "kimi", "openai"];

/// Intermediate agent messages longer than this are truncated before they
/// reach the event log.
pub const MAX_LOG_MESSAGE_CHARS: usize = 500;

/// Default latency of the simulated optimization agent.
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(400);

/// How often long-running agents should poll their cancellation token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Documentation file extension that marks a directory as a provider.
pub const PROVIDER_DOC_EXTENSION: &str = "md";

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// The provider list could not be loaded.
    pub const ERROR_REGISTRY: i32 = 2;
    /// Every dispatched provider failed.
    pub const ERROR_ALL_FAILED: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// Interrupted with Ctrl+C.
    pub const ERROR_CANCELED: i32 = 130;
}
