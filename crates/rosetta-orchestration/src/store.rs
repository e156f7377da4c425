//! The orchestration state store.
//!
//! `OrchestrationStore` is the single source of truth for a session: the
//! provider registry, the selection, the prompt, the event log, progress,
//! the published result set and the popup sub-state. All mutation goes
//! through `&mut self` entry points on the owning thread. Provider tasks
//! run on worker threads and send [`RunMessage`]s back; the owner applies
//! them in [`OrchestrationStore::pump`] or
//! [`OrchestrationStore::wait_for_results`].
//!
//! Every run gets a fresh id. Messages tagged with any other id are
//! discarded, so an abandoned run can never touch the state of a later one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use rosetta_core::constants::MAX_LOG_MESSAGE_CHARS;
use rosetta_core::{
    CancellationToken, EventLog, FetchStatus, LogEntry, LogKind, OptimizationAgent,
    OptimizationRequest, OptimizeOptions, Progress, ProviderId, ProviderOutcome, ProviderRegistry,
    ProviderResult, ProviderSource, RegistryError, ResultSet, RunPhase, Screen, SelectionSet,
    Toggle,
};

use crate::dispatch::spawn_provider_task;
use crate::interfaces::{StoreObserver, StoreSubject};
use crate::messages::{RunMessage, TaskPayload};
use crate::popup::PopupState;
use crate::snapshot::StoreSnapshot;

/// Why [`OrchestrationStore::optimize_prompt`] refused to start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchRejection {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("no providers selected")]
    EmptySelection,
    #[error("an optimization run is already in flight")]
    RunInFlight,
    #[error("provider list has not been loaded")]
    ProvidersNotLoaded,
}

/// Returned when a run has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub run_id: u64,
    /// Dispatched providers, in dispatch order.
    pub providers: Vec<ProviderId>,
}

struct PendingTask {
    dispatched_at: Instant,
    cancel: CancellationToken,
}

/// Book-keeping for the run in flight.
struct ActiveRun {
    run_id: u64,
    original: String,
    options: OptimizeOptions,
    dispatched: Vec<ProviderId>,
    pending: HashMap<ProviderId, PendingTask>,
    settled: HashMap<ProviderId, ProviderResult>,
}

impl ActiveRun {
    fn total(&self) -> usize {
        self.dispatched.len()
    }

    /// Earliest instant at which a pending task times out.
    fn next_deadline(&self) -> Option<Instant> {
        let timeout = self.options.provider_timeout?;
        self.pending
            .values()
            .map(|task| task.dispatched_at + timeout)
            .min()
    }

    /// Pending providers past their timeout, in dispatch order.
    fn overdue(&self, now: Instant) -> Vec<ProviderId> {
        let Some(timeout) = self.options.provider_timeout else {
            return Vec::new();
        };
        self.dispatched
            .iter()
            .filter(|p| {
                self.pending
                    .get(*p)
                    .is_some_and(|task| now.duration_since(task.dispatched_at) >= timeout)
            })
            .cloned()
            .collect()
    }

    fn cancel_pending(&self) {
        for task in self.pending.values() {
            task.cancel.cancel();
        }
    }

    fn into_results(mut self) -> ResultSet {
        let optimized = self
            .dispatched
            .iter()
            .filter_map(|p| self.settled.remove(p))
            .collect();
        ResultSet::new(self.original, optimized)
    }
}

/// Single-writer orchestration state store.
pub struct OrchestrationStore {
    source: Arc<dyn ProviderSource>,
    agent: Arc<dyn OptimizationAgent>,
    options: OptimizeOptions,
    registry: ProviderRegistry,
    selection: SelectionSet,
    prompt: String,
    log: EventLog,
    progress: Progress,
    screen: Screen,
    phase: RunPhase,
    results: Option<ResultSet>,
    popup: PopupState,
    run_counter: u64,
    active: Option<ActiveRun>,
    tx: Sender<RunMessage>,
    rx: Receiver<RunMessage>,
    observers: StoreSubject,
}

impl OrchestrationStore {
    #[must_use]
    pub fn new(source: Arc<dyn ProviderSource>, agent: Arc<dyn OptimizationAgent>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            source,
            agent,
            options: OptimizeOptions::default(),
            registry: ProviderRegistry::new(),
            selection: SelectionSet::new(),
            prompt: String::new(),
            log: EventLog::new(),
            progress: Progress::new(),
            screen: Screen::Input,
            phase: RunPhase::Idle,
            results: None,
            popup: PopupState::new(),
            run_counter: 0,
            active: None,
            tx,
            rx,
            observers: StoreSubject::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: OptimizeOptions) -> Self {
        self.set_options(options);
        self
    }

    /// Options for subsequent runs. A run in flight keeps the options it
    /// was dispatched with.
    pub fn set_options(&mut self, options: OptimizeOptions) {
        self.options = options.normalize();
    }

    /// Register a push observer.
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.register(observer);
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Load the provider list. A no-op once loaded.
    ///
    /// On failure the registry stays unloaded, the message is kept in
    /// [`Self::registry_error`] and the call can be retried.
    pub fn fetch_providers(&mut self) -> Result<FetchStatus, RegistryError> {
        let status = self.registry.load(self.source.as_ref())?;
        if let FetchStatus::Loaded(count) = status {
            info!(count, "providers loaded");
        }
        Ok(status)
    }

    /// Add `id` to the selection, or remove it if already selected.
    ///
    /// Unknown ids are ignored, and so is every toggle while a run is in
    /// flight.
    pub fn toggle_provider(&mut self, id: impl Into<ProviderId>) -> Toggle {
        let id = id.into();
        if self.phase.is_in_flight() {
            debug!(provider = %id, "toggle ignored while a run is in flight");
            return Toggle::Ignored;
        }
        let effect = self.selection.toggle(&id, self.registry.providers());
        if effect == Toggle::Ignored {
            debug!(provider = %id, "toggle ignored for unknown provider");
        }
        effect
    }

    /// Replace the prompt text used by the next run.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Fan the prompt out to every selected provider.
    ///
    /// Returns as soon as all tasks are dispatched; completions are applied
    /// by [`Self::pump`] and [`Self::wait_for_results`]. A rejected call
    /// changes nothing and logs nothing.
    pub fn optimize_prompt(&mut self) -> Result<RunTicket, DispatchRejection> {
        if self.phase.is_in_flight() {
            return Self::reject(DispatchRejection::RunInFlight);
        }
        if self.prompt.trim().is_empty() {
            return Self::reject(DispatchRejection::EmptyPrompt);
        }
        if !self.registry.is_loaded() {
            return Self::reject(DispatchRejection::ProvidersNotLoaded);
        }
        if self.selection.is_empty() {
            return Self::reject(DispatchRejection::EmptySelection);
        }

        self.run_counter += 1;
        let run_id = self.run_counter;
        let providers = self.selection.as_slice().to_vec();
        let total = providers.len();
        info!(run_id, providers = total, agent = self.agent.name(), "dispatching optimization run");

        self.results = None;
        self.popup.reset();
        self.log.clear();
        self.progress.reset();
        self.phase = RunPhase::Dispatching;
        self.set_screen(self.phase.screen());
        self.notify_progress();

        let options = self.options.clone();
        self.active = Some(ActiveRun {
            run_id,
            original: self.prompt.clone(),
            options: options.clone(),
            dispatched: providers.clone(),
            pending: HashMap::with_capacity(total),
            settled: HashMap::with_capacity(total),
        });
        self.append(
            run_id,
            LogKind::System,
            format!("Initializing optimization for {total} provider(s)"),
            None,
        );

        for provider in &providers {
            self.append(
                run_id,
                LogKind::Spawn,
                format!("Spawning {} optimization agent", provider.display_name()),
                Some(provider.clone()),
            );

            let cancel = CancellationToken::new();
            if let Some(run) = self.active.as_mut() {
                run.pending.insert(
                    provider.clone(),
                    PendingTask {
                        dispatched_at: Instant::now(),
                        cancel: cancel.clone(),
                    },
                );
            }

            let request = OptimizationRequest {
                run_id,
                provider: provider.clone(),
                prompt: self.prompt.clone(),
                preserve_structure: options.preserve_structure,
                verbose_changelog: options.verbose_changelog,
            };
            if let Err(e) =
                spawn_provider_task(Arc::clone(&self.agent), request, cancel, self.tx.clone())
            {
                warn!(run_id, provider = %provider, error = %e, "failed to start provider task");
                // Settles through the channel like any other failure.
                let _ = self.tx.send(RunMessage::settled(
                    run_id,
                    provider.clone(),
                    ProviderOutcome::failed(format!("failed to start optimization task: {e}")),
                    Duration::ZERO,
                ));
            }
        }

        self.phase = RunPhase::Settling;
        self.progress
            .advance(0, total, format!("Optimizing with {total} provider(s)"));
        self.notify_progress();

        Ok(RunTicket { run_id, providers })
    }

    /// Apply every queued task message without blocking, then settle any
    /// provider past its timeout. Returns the number of messages drained.
    pub fn pump(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.apply(msg);
            drained += 1;
        }
        self.expire_overdue(Instant::now());
        drained
    }

    /// Block until the run in flight completes or `timeout` elapses.
    ///
    /// Returns `true` if the store holds a completed run's results.
    pub fn wait_for_results(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if !self.phase.is_in_flight() {
                return self.phase == RunPhase::Done;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let mut wake = deadline;
            if let Some(next) = self.active.as_ref().and_then(ActiveRun::next_deadline) {
                wake = wake.min(next);
            }

            match self.rx.recv_timeout(wake.saturating_duration_since(now)) {
                Ok(msg) => self.apply(msg),
                Err(RecvTimeoutError::Timeout) => {}
                // The store holds a sender, so this cannot happen.
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    /// Open the detail popup for `id`. A no-op unless `id` is in the
    /// current result set.
    pub fn select_card(&mut self, id: impl Into<ProviderId>) -> bool {
        let id = id.into();
        let opened = self.popup.select(&id, self.results.as_ref());
        if !opened {
            debug!(provider = %id, "select_card ignored");
        }
        opened
    }

    /// Hide the popup, keeping the last selected card.
    pub fn close_popup(&mut self) {
        self.popup.close();
    }

    /// Return to the input screen, abandoning any run in flight.
    ///
    /// Clears everything except the provider registry.
    pub fn reset(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel_pending();
            info!(run_id = run.run_id, pending = run.pending.len(), "abandoning run");
        }
        while self.rx.try_recv().is_ok() {}

        self.log.clear();
        self.progress.reset();
        self.selection.clear();
        self.popup.reset();
        self.results = None;
        self.prompt.clear();
        self.phase = RunPhase::Idle;
        self.notify_progress();
        self.set_screen(Screen::Input);
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase.is_in_flight()
    }

    /// Id of the most recent run, 0 before the first.
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run_counter
    }

    #[must_use]
    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn available_providers(&self) -> &[ProviderId] {
        self.registry.providers()
    }

    #[must_use]
    pub fn providers_loaded(&self) -> bool {
        self.registry.is_loaded()
    }

    #[must_use]
    pub fn registry_error(&self) -> Option<&str> {
        self.registry.last_error()
    }

    #[must_use]
    pub fn selected_providers(&self) -> &[ProviderId] {
        self.selection.as_slice()
    }

    /// Providers still awaited in the current run, in dispatch order.
    #[must_use]
    pub fn pending_providers(&self) -> Vec<ProviderId> {
        self.active
            .as_ref()
            .map(|run| {
                run.dispatched
                    .iter()
                    .filter(|p| run.pending.contains_key(*p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        self.log.entries()
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn selected_card(&self) -> Option<&ProviderId> {
        self.popup.selected_card()
    }

    #[must_use]
    pub fn show_popup(&self) -> bool {
        self.popup.is_open()
    }

    /// Result behind the open popup, if any.
    #[must_use]
    pub fn popup_result(&self) -> Option<&ProviderResult> {
        if !self.popup.is_open() {
            return None;
        }
        let card = self.popup.selected_card()?;
        self.results.as_ref()?.result(card)
    }

    /// Owned copy of every readable field.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            screen: self.screen,
            phase: self.phase,
            run_id: self.run_counter,
            prompt: self.prompt.clone(),
            available_providers: self.registry.providers().to_vec(),
            providers_loaded: self.registry.is_loaded(),
            registry_error: self.registry.last_error().map(str::to_string),
            selected_providers: self.selection.as_slice().to_vec(),
            pending_providers: self.pending_providers(),
            logs: self.log.entries().to_vec(),
            progress: self.progress.clone(),
            results: self.results.clone(),
            selected_card: self.popup.selected_card().cloned(),
            show_popup: self.popup.is_open(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn reject<T>(reason: DispatchRejection) -> Result<T, DispatchRejection> {
        debug!(%reason, "optimization rejected");
        Err(reason)
    }

    fn append(
        &mut self,
        run_id: u64,
        kind: LogKind,
        message: impl Into<String>,
        provider: Option<ProviderId>,
    ) {
        let entry = self.log.append(run_id, kind, message, provider);
        self.observers.notify_log(entry);
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.observers.notify_screen(screen);
        }
    }

    fn notify_progress(&self) {
        self.observers.notify_progress(&self.progress);
    }

    fn apply(&mut self, msg: RunMessage) {
        let Some(run) = self.active.as_ref().filter(|r| r.run_id == msg.run_id) else {
            debug!(
                run_id = msg.run_id,
                provider = %msg.provider,
                settlement = msg.is_settlement(),
                "discarding stale run message"
            );
            return;
        };
        if !run.pending.contains_key(&msg.provider) {
            debug!(
                run_id = msg.run_id,
                provider = %msg.provider,
                settlement = msg.is_settlement(),
                "discarding message for settled provider"
            );
            return;
        }
        let include_logs = run.options.include_logs;

        match msg.payload {
            TaskPayload::Event(event) => {
                if include_logs {
                    self.append(
                        msg.run_id,
                        event.kind.into(),
                        truncate_message(&event.message),
                        Some(msg.provider),
                    );
                }
            }
            TaskPayload::Settled { outcome, elapsed } => {
                self.settle(msg.provider, outcome, elapsed);
            }
        }
    }

    fn settle(&mut self, provider: ProviderId, outcome: ProviderOutcome, elapsed: Duration) {
        let Some(run) = self.active.as_mut() else {
            return;
        };
        if run.pending.remove(&provider).is_none() {
            return;
        }

        let run_id = run.run_id;
        let total = run.total();
        let name = provider.display_name();
        let success = outcome.is_success();
        let (kind, message) = match &outcome {
            ProviderOutcome::Optimized { .. } => (
                LogKind::Success,
                format!("{name}: optimization complete ({})", outcome.synopsis()),
            ),
            ProviderOutcome::Failed { error } => (LogKind::Error, format!("{name}: {error}")),
        };
        run.settled.insert(
            provider.clone(),
            ProviderResult {
                provider: provider.clone(),
                outcome,
                elapsed,
            },
        );
        let settled = run.settled.len();
        let all_settled = run.pending.is_empty();

        debug!(run_id, provider = %provider, success, settled, total, ?elapsed, "provider settled");
        self.append(run_id, kind, message, Some(provider));

        if all_settled {
            self.finish();
        } else {
            let verb = if success { "finished" } else { "failed" };
            self.progress
                .advance(settled, total, format!("{name} {verb} ({settled}/{total})"));
            self.notify_progress();
        }
    }

    fn finish(&mut self) {
        let Some(run) = self.active.take() else {
            return;
        };
        let run_id = run.run_id;
        let results = run.into_results();

        self.append(
            run_id,
            LogKind::Result,
            format!(
                "{} succeeded, {} failed, {} total change(s)",
                results.succeeded(),
                results.failed(),
                results.total_changes()
            ),
            None,
        );
        self.append(run_id, LogKind::Agent, "Optimization complete", None);
        info!(
            run_id,
            succeeded = results.succeeded(),
            failed = results.failed(),
            "optimization run complete"
        );

        self.results = Some(results);
        self.progress.complete("Complete");
        self.phase = RunPhase::Done;
        self.notify_progress();
        if let Some(results) = &self.results {
            self.observers.notify_results(results);
        }
        self.set_screen(self.phase.screen());
    }

    fn expire_overdue(&mut self, now: Instant) {
        let Some(run) = self.active.as_ref() else {
            return;
        };
        let Some(timeout) = run.options.provider_timeout else {
            return;
        };
        let run_id = run.run_id;

        for provider in run.overdue(now) {
            if let Some(task) = self.active.as_ref().and_then(|r| r.pending.get(&provider)) {
                task.cancel.cancel();
            }
            warn!(run_id, provider = %provider, ?timeout, "provider timed out");
            self.settle(
                provider,
                ProviderOutcome::failed(format!("timed out after {timeout:?}")),
                timeout,
            );
        }
    }
}

impl Drop for OrchestrationStore {
    fn drop(&mut self) {
        if let Some(run) = &self.active {
            run.cancel_pending();
        }
    }
}

/// Cap intermediate agent messages at [`MAX_LOG_MESSAGE_CHARS`].
fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_LOG_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}
