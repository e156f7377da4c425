//! # rosetta-core
//!
//! Domain model for the Rosetta prompt optimizer: provider identifiers and
//! the provider registry, the append-only event log, run progress,
//! per-provider outcomes and the collaborator traits that the orchestrator
//! fans work out to.

pub mod agent;
pub mod constants;
pub mod log;
pub mod options;
pub mod outcome;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod screen;
pub mod scripted;
pub mod selection;
pub mod simulated;

// Re-exports
pub use agent::{AgentEvent, AgentEventKind, AgentSink, OptimizationAgent, OptimizationRequest};
pub use constants::exit_codes;
pub use log::{EventLog, LogEntry, LogKind};
pub use options::OptimizeOptions;
pub use outcome::{PromptChange, ProviderOutcome, ProviderResult, ResultSet};
pub use progress::{CancellationToken, Progress};
pub use provider::ProviderId;
pub use registry::{
    DocsDirectoryProviderSource, FailingProviderSource, FetchStatus, ProviderRegistry,
    ProviderSource, RegistryError, StaticProviderSource,
};
pub use screen::{RunPhase, Screen};
pub use scripted::ScriptedAgent;
pub use selection::{SelectionSet, Toggle};
pub use simulated::SimulatedAgent;
