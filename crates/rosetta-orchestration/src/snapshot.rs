//! Owned, read-only copy of the store state.

use serde::Serialize;

use rosetta_core::{LogEntry, Progress, ProviderId, ResultSet, RunPhase, Screen};

/// Everything the presentation layer can read, detached from the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub screen: Screen,
    pub phase: RunPhase,
    /// Id of the most recent run, 0 before the first.
    pub run_id: u64,
    pub prompt: String,
    pub available_providers: Vec<ProviderId>,
    pub providers_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_error: Option<String>,
    pub selected_providers: Vec<ProviderId>,
    /// Providers still awaited in the current run, in dispatch order.
    pub pending_providers: Vec<ProviderId>,
    pub logs: Vec<LogEntry>,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_card: Option<ProviderId>,
    pub show_popup: bool,
}

