//! End-to-end runs through the orchestration store with scripted agents.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use proptest::prelude::*;

use rosetta_core::{
    AgentEvent, LogEntry, LogKind, OptimizeOptions, Progress, PromptChange, ProviderId,
    ResultSet, RunPhase, Screen, ScriptedAgent, StaticProviderSource,
};
use rosetta_orchestration::{OrchestrationStore, StoreObserver};

const WAIT: Duration = Duration::from_secs(10);

fn store(providers: &[&str], agent: ScriptedAgent) -> OrchestrationStore {
    let mut store = OrchestrationStore::new(
        Arc::new(StaticProviderSource::new(providers.iter().copied())),
        Arc::new(agent),
    );
    store.fetch_providers().unwrap();
    store
}

fn three_changes() -> Vec<PromptChange> {
    vec![
        PromptChange::new("structure", "Added a task heading"),
        PromptChange::new("formatting", "Used markdown lists"),
        PromptChange::new("clarity", "Named the audience"),
    ]
}

#[test]
fn recursion_example() {
    let mut agent = ScriptedAgent::new();
    agent
        .succeed("openai", "## Task\nExplain recursion", three_changes())
        .fail("anthropic", "rate limited");
    let mut store = store(&["anthropic", "openai"], agent);

    store.toggle_provider("openai");
    store.toggle_provider("anthropic");
    store.set_prompt("Explain recursion");
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));

    let results = store.results().unwrap();
    assert_eq!(results.original(), "Explain recursion");
    assert_eq!(results.len(), 2);

    let openai = results.get(&"openai".into()).unwrap();
    assert!(openai.is_success());
    assert_eq!(openai.changes().len(), 3);

    let anthropic = results.get(&"anthropic".into()).unwrap();
    assert!(!anthropic.is_success());
    assert_eq!(anthropic.error(), Some("rate limited"));

    assert_eq!(results.total_changes(), 3);
    assert_eq!(store.progress().percent, 100);
    assert_eq!(store.screen(), Screen::Results);
    assert_eq!(store.phase(), RunPhase::Done);
}

#[test]
fn failures_are_isolated_and_tasks_run_concurrently() {
    let delay = Duration::from_millis(400);
    let mut agent = ScriptedAgent::new();
    agent
        .fail("a", "boom")
        .delay("a", delay)
        .succeed("b", "B", three_changes())
        .delay("b", delay)
        .succeed("c", "C", Vec::new())
        .delay("c", delay);
    let mut store = store(&["a", "b", "c"], agent);
    for id in ["a", "b", "c"] {
        store.toggle_provider(id);
    }
    store.set_prompt("prompt");

    let started = Instant::now();
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));
    let elapsed = started.elapsed();

    assert!(elapsed >= delay);
    assert!(elapsed < delay * 3, "tasks ran sequentially: {elapsed:?}");

    let results = store.results().unwrap();
    assert_eq!(results.get(&"a".into()).unwrap().error(), Some("boom"));
    assert_eq!(results.get(&"b".into()).unwrap().prompt(), Some("B"));
    assert_eq!(results.get(&"b".into()).unwrap().changes().len(), 3);
    assert_eq!(results.get(&"c".into()).unwrap().prompt(), Some("C"));
}

#[test]
fn reset_discards_abandoned_run() {
    let mut agent = ScriptedAgent::new();
    agent
        .event("openai", AgentEvent::thinking("planning"))
        .succeed("openai", "late", Vec::new());
    let gate = agent.gate("openai");
    let mut store = store(&["openai"], agent);
    store.toggle_provider("openai");
    store.set_prompt("prompt");
    store.optimize_prompt().unwrap();
    store.pump();

    store.reset();
    let after_reset = store.snapshot();

    let _ = gate.send(());
    std::thread::sleep(Duration::from_millis(100));
    store.pump();

    let now = store.snapshot();
    assert_eq!(now.screen, Screen::Input);
    assert_eq!(now.phase, after_reset.phase);
    assert!(now.logs.is_empty());
    assert!(now.results.is_none());
    assert_eq!(now.progress, Progress::default());
    assert!(now.selected_providers.is_empty());
}

#[test]
fn stale_completion_cannot_leak_into_next_run() {
    let mut agent = ScriptedAgent::new();
    agent
        .succeed("openai", "from run 1", Vec::new())
        .succeed("google", "from run 2", Vec::new());
    let gate = agent.gate("openai");
    let mut store = store(&["google", "openai"], agent);

    store.toggle_provider("openai");
    store.set_prompt("first");
    let first = store.optimize_prompt().unwrap();
    store.reset();

    store.toggle_provider("google");
    store.set_prompt("second");
    let second = store.optimize_prompt().unwrap();
    assert!(second.run_id > first.run_id);
    assert!(store.wait_for_results(WAIT));

    drop(gate);
    std::thread::sleep(Duration::from_millis(100));
    store.pump();

    let results = store.results().unwrap();
    assert_eq!(results.original(), "second");
    assert_eq!(results.len(), 1);
    assert!(!results.contains(&"openai".into()));
    assert!(store.logs().iter().all(|e| e.run_id == second.run_id));
}

#[test]
fn slow_provider_times_out() {
    let mut agent = ScriptedAgent::new();
    agent
        .succeed("slow", "too late", Vec::new())
        .delay("slow", Duration::from_secs(30))
        .succeed("fast", "fast", Vec::new());
    let mut store = store(&["fast", "slow"], agent).with_options(OptimizeOptions {
        provider_timeout: Some(Duration::from_millis(100)),
        ..OptimizeOptions::default()
    });
    store.toggle_provider("slow");
    store.toggle_provider("fast");
    store.set_prompt("prompt");

    let started = Instant::now();
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));
    assert!(started.elapsed() < Duration::from_secs(5));

    let results = store.results().unwrap();
    let slow = results.get(&"slow".into()).unwrap();
    assert!(slow.error().unwrap().starts_with("timed out after"));
    assert!(results.get(&"fast".into()).unwrap().is_success());

    // The cancelled task still reports back; it must be ignored.
    std::thread::sleep(Duration::from_millis(100));
    store.pump();
    assert_eq!(store.logs().iter().filter(|e| e.kind == LogKind::Error).count(), 1);
    assert_eq!(store.results().unwrap().len(), 2);
}

#[test]
fn panicking_agent_is_contained() {
    let mut agent = ScriptedAgent::new();
    agent
        .panics("kimi")
        .succeed("openai", "fine", Vec::new());
    let mut store = store(&["kimi", "openai"], agent);
    store.toggle_provider("kimi");
    store.toggle_provider("openai");
    store.set_prompt("prompt");
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));

    let results = store.results().unwrap();
    let kimi = results.get(&"kimi".into()).unwrap();
    assert!(kimi.error().unwrap().starts_with("optimization agent panicked"));
    assert!(results.get(&"openai".into()).unwrap().is_success());
}

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Log(u64),
    Progress(u8),
    Screen(Screen),
    Results(usize),
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Seen>>,
}

impl StoreObserver for Recorder {
    fn on_log(&self, entry: &LogEntry) {
        self.seen.lock().push(Seen::Log(entry.id));
    }

    fn on_progress(&self, progress: &Progress) {
        self.seen.lock().push(Seen::Progress(progress.percent));
    }

    fn on_screen(&self, screen: Screen) {
        self.seen.lock().push(Seen::Screen(screen));
    }

    fn on_results(&self, results: &ResultSet) {
        self.seen.lock().push(Seen::Results(results.len()));
    }
}

#[test]
fn observers_see_monotonic_progress_and_final_transition() {
    let mut agent = ScriptedAgent::new();
    agent
        .succeed("a", "A", Vec::new())
        .delay("b", Duration::from_millis(30))
        .fail("b", "no")
        .succeed("c", "C", Vec::new());
    let mut store = store(&["a", "b", "c"], agent);
    let recorder = Arc::new(Recorder::default());
    store.subscribe(recorder.clone());

    for id in ["a", "b", "c"] {
        store.toggle_provider(id);
    }
    store.set_prompt("prompt");
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));

    let seen = recorder.seen.lock().clone();
    assert_eq!(seen.first(), Some(&Seen::Screen(Screen::Processing)));
    assert_eq!(seen.last(), Some(&Seen::Screen(Screen::Results)));

    let percents: Vec<u8> = seen
        .iter()
        .filter_map(|s| match s {
            Seen::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.iter().filter(|p| **p == 100).count(), 1);
    assert_eq!(percents.last(), Some(&100));

    let ids: Vec<u64> = seen
        .iter()
        .filter_map(|s| match s {
            Seen::Log(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids.len(), store.logs().len());
    assert!(seen.contains(&Seen::Results(3)));
}

#[test]
fn new_run_replaces_results_and_keeps_ids_increasing() {
    let mut agent = ScriptedAgent::new();
    agent.succeed("a", "A", Vec::new()).succeed("b", "B", Vec::new());
    let mut store = store(&["a", "b"], agent);
    store.toggle_provider("a");
    store.set_prompt("one");
    store.optimize_prompt().unwrap();
    assert!(store.wait_for_results(WAIT));
    let last_id = store.logs().last().unwrap().id;
    store.select_card("a");

    store.toggle_provider("b");
    store.set_prompt("two");
    store.optimize_prompt().unwrap();
    assert!(!store.show_popup());
    assert!(store.logs().first().unwrap().id > last_id);
    assert!(store.wait_for_results(WAIT));

    let results = store.results().unwrap();
    assert_eq!(results.original(), "two");
    let providers: Vec<&ProviderId> = results.providers().collect();
    assert_eq!(providers.len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every dispatched provider ends up in the result set, whatever fails.
    #[test]
    fn result_set_covers_every_dispatched_provider(
        outcomes in proptest::collection::vec(any::<bool>(), 1..6),
    ) {
        let names: Vec<String> = (0..outcomes.len()).map(|i| format!("p{i}")).collect();
        let mut agent = ScriptedAgent::new();
        for (name, ok) in names.iter().zip(&outcomes) {
            if *ok {
                agent.succeed(name.as_str(), "done", three_changes());
            } else {
                agent.fail(name.as_str(), "failed");
            }
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut store = store(&refs, agent);
        for name in &refs {
            store.toggle_provider(*name);
        }
        store.set_prompt("prompt");
        store.optimize_prompt().unwrap();
        prop_assert!(store.wait_for_results(WAIT));

        let results = store.results().unwrap();
        prop_assert_eq!(results.len(), outcomes.len());
        let ok = outcomes.iter().filter(|o| **o).count();
        prop_assert_eq!(results.succeeded(), ok);
        prop_assert_eq!(results.failed(), outcomes.len() - ok);
        prop_assert_eq!(results.total_changes(), ok * 3);
        prop_assert_eq!(store.progress().percent, 100);
        prop_assert_eq!(store.screen(), Screen::Results);
    }
}
