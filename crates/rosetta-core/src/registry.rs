//! Provider sources and the provider registry cache.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{DEFAULT_PROVIDERS, PROVIDER_DOC_EXTENSION};
use crate::provider::ProviderId;

/// Error raised when the provider list cannot be obtained.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The source could not be reached.
    #[error("provider source unavailable: {0}")]
    Unavailable(String),

    /// The documentation directory could not be read.
    #[error("failed to read provider docs at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the available provider list.
pub trait ProviderSource: Send + Sync {
    /// List the providers that prompts can be optimized for.
    fn list_providers(&self) -> Result<Vec<ProviderId>, RegistryError>;
}

/// A fixed provider list.
pub struct StaticProviderSource {
    providers: Vec<ProviderId>,
}

impl StaticProviderSource {
    #[must_use]
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        Self {
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticProviderSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDERS)
    }
}

impl ProviderSource for StaticProviderSource {
    fn list_providers(&self) -> Result<Vec<ProviderId>, RegistryError> {
        Ok(self.providers.clone())
    }
}

/// Detects providers from a documentation directory.
///
/// Every sub-directory holding at least one `.md` file is a provider; the
/// result is sorted by name.
pub struct DocsDirectoryProviderSource {
    root: PathBuf,
}

impl DocsDirectoryProviderSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn has_docs(dir: &Path) -> Result<bool, std::io::Error> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == PROVIDER_DOC_EXTENSION)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl ProviderSource for DocsDirectoryProviderSource {
    fn list_providers(&self) -> Result<Vec<ProviderId>, RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: self.root.clone(),
            source,
        };

        let mut providers = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_dir() {
                continue;
            }
            if !Self::has_docs(&path).map_err(|source| RegistryError::Io {
                path: path.clone(),
                source,
            })? {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                providers.push(ProviderId::from(name));
            }
        }
        providers.sort();
        debug!(root = %self.root.display(), count = providers.len(), "scanned provider docs");
        Ok(providers)
    }
}

/// A source that always fails. Useful for exercising the "loading" state.
pub struct FailingProviderSource {
    reason: String,
}

impl FailingProviderSource {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ProviderSource for FailingProviderSource {
    fn list_providers(&self) -> Result<Vec<ProviderId>, RegistryError> {
        Err(RegistryError::Unavailable(self.reason.clone()))
    }
}

/// Result of a [`ProviderRegistry::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The registry was populated with this many providers.
    Loaded(usize),
    /// The registry was already loaded; nothing was fetched.
    AlreadyLoaded,
}

/// Cached provider list. Loaded once per session and never cleared.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    available: Vec<ProviderId>,
    loaded: bool,
    last_error: Option<String>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the registry from `source`.
    ///
    /// A second call once loaded is a no-op. On failure the registry stays
    /// unloaded and the error message is kept for display.
    pub fn load(&mut self, source: &dyn ProviderSource) -> Result<FetchStatus, RegistryError> {
        if self.loaded {
            return Ok(FetchStatus::AlreadyLoaded);
        }

        match source.list_providers() {
            Ok(providers) => {
                let mut seen = HashSet::new();
                self.available = providers
                    .into_iter()
                    .filter(|p| {
                        if p.as_str().trim().is_empty() {
                            warn!("ignoring blank provider id");
                            return false;
                        }
                        seen.insert(p.clone())
                    })
                    .collect();
                self.loaded = true;
                self.last_error = None;
                Ok(FetchStatus::Loaded(self.available.len()))
            }
            Err(e) => {
                warn!(error = %e, "provider list unavailable");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn providers(&self) -> &[ProviderId] {
        &self.available
    }

    #[must_use]
    pub fn contains(&self, id: &ProviderId) -> bool {
        self.available.contains(id)
    }

    /// Message of the most recent failed load, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
