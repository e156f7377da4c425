//! Presentation-side interfaces.

use std::sync::Arc;

use parking_lot::RwLock;

use rosetta_core::{LogEntry, Progress, ProviderResult, ResultSet, Screen};

/// Push notifications from the store.
///
/// Called on the thread that owns the store, right after the change.
pub trait StoreObserver: Send + Sync {
    /// A log entry was appended.
    fn on_log(&self, _entry: &LogEntry) {}

    /// Progress changed.
    fn on_progress(&self, _progress: &Progress) {}

    /// The active screen changed.
    fn on_screen(&self, _screen: Screen) {}

    /// A run finished and its results were published.
    fn on_results(&self, _results: &ResultSet) {}
}

/// Observer that ignores everything.
pub struct NullObserver;

impl StoreObserver for NullObserver {}

/// Registered store observers.
pub struct StoreSubject {
    observers: RwLock<Vec<Arc<dyn StoreObserver>>>,
}

impl StoreSubject {
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.write().push(observer);
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.observers.read().len()
    }

    pub fn notify_log(&self, entry: &LogEntry) {
        for observer in self.observers.read().iter() {
            observer.on_log(entry);
        }
    }

    pub fn notify_progress(&self, progress: &Progress) {
        for observer in self.observers.read().iter() {
            observer.on_progress(progress);
        }
    }

    pub fn notify_screen(&self, screen: Screen) {
        for observer in self.observers.read().iter() {
            observer.on_screen(screen);
        }
    }

    pub fn notify_results(&self, results: &ResultSet) {
        for observer in self.observers.read().iter() {
            observer.on_results(results);
        }
    }
}

impl Default for StoreSubject {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders finished runs for the user.
pub trait ResultPresenter: Send + Sync {
    /// Present the whole result set.
    fn present_results(&self, results: &ResultSet);

    /// Present one provider's result (the detail popup).
    fn present_detail(&self, original: &str, result: &ProviderResult);

    /// Present an error.
    fn present_error(&self, error: &str);
}
