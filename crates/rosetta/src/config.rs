//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use rosetta_core::{OptimizeOptions, ProviderId};

use crate::errors::AppError;

/// Error message given to providers listed with `--fail` and no message.
const DEFAULT_FAILURE: &str = "simulated failure";

/// Rosetta: optimize one prompt for several AI providers concurrently.
#[derive(Parser, Debug)]
#[command(name = "rosetta", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Prompt to optimize. Read from --prompt-file or stdin when omitted.
    #[arg(env = "ROSETTA_PROMPT")]
    pub prompt: Option<String>,

    /// Read the prompt from a file.
    #[arg(long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Providers to optimize for, comma-separated. Defaults to all.
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Optimize for every available provider.
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Static provider list, comma-separated.
    #[arg(long, value_delimiter = ',', env = "ROSETTA_PROVIDERS")]
    pub providers: Vec<String>,

    /// Detect providers from a documentation directory (one sub-directory
    /// of markdown files per provider).
    #[arg(long, env = "ROSETTA_DOCS_DIR", conflicts_with = "providers")]
    pub docs_dir: Option<PathBuf>,

    /// Latency of the simulated agent (e.g. "400ms", "2s").
    #[arg(long, default_value = "400ms")]
    pub latency: String,

    /// Latency of one provider: PROVIDER=DURATION. Repeatable.
    #[arg(long, value_name = "PROVIDER=DURATION")]
    pub latency_for: Vec<String>,

    /// Make a provider fail: PROVIDER or PROVIDER=MESSAGE. Repeatable.
    #[arg(long, value_name = "PROVIDER[=MESSAGE]")]
    pub fail: Vec<String>,

    /// Per-provider timeout (e.g. "30s", "5m"). Unset means no timeout.
    #[arg(long)]
    pub timeout: Option<String>,

    /// Do not relay agent thinking/tool events into the log.
    #[arg(long)]
    pub no_agent_logs: bool,

    /// Keep the overall structure of the prompt.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_structure: bool,

    /// Ask agents for before/after snippets for each change.
    #[arg(long)]
    pub verbose_changelog: bool,

    /// Show the detail view of one provider's result.
    #[arg(long, value_name = "PROVIDER")]
    pub show: Option<String>,

    /// Print the results as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON results to a file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quiet mode (no log stream or progress bar).
    #[arg(short, long)]
    pub quiet: bool,

    /// List available providers and exit.
    #[arg(long)]
    pub list_providers: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,

    /// Log filter (e.g. "info", "rosetta_orchestration=debug").
    #[arg(long)]
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Simulated agent latency.
    pub fn latency_duration(&self) -> Result<Duration, AppError> {
        parse_duration(&self.latency)
            .ok_or_else(|| AppError::Config(format!("invalid --latency '{}'", self.latency)))
    }

    /// Per-provider latency overrides.
    pub fn latency_overrides(&self) -> Result<Vec<(ProviderId, Duration)>, AppError> {
        self.latency_for
            .iter()
            .map(|arg| {
                let invalid = || AppError::Config(format!("invalid --latency-for '{arg}'"));
                let (provider, latency) = arg.split_once('=').ok_or_else(invalid)?;
                let provider = provider.trim();
                if provider.is_empty() {
                    return Err(invalid());
                }
                let latency = parse_duration(latency).ok_or_else(invalid)?;
                Ok((ProviderId::from(provider), latency))
            })
            .collect()
    }

    /// Per-provider timeout, if any.
    pub fn timeout_duration(&self) -> Result<Option<Duration>, AppError> {
        self.timeout
            .as_deref()
            .map(|t| {
                parse_duration(t)
                    .ok_or_else(|| AppError::Config(format!("invalid --timeout '{t}'")))
            })
            .transpose()
    }

    /// Providers to fail, with their error messages.
    pub fn failures(&self) -> Result<Vec<(ProviderId, String)>, AppError> {
        self.fail
            .iter()
            .map(|arg| {
                let (provider, message) = match arg.split_once('=') {
                    Some((p, m)) => (p.trim(), m.trim()),
                    None => (arg.trim(), DEFAULT_FAILURE),
                };
                if provider.is_empty() {
                    return Err(AppError::Config(format!("invalid --fail '{arg}'")));
                }
                let message = if message.is_empty() {
                    DEFAULT_FAILURE
                } else {
                    message
                };
                Ok((ProviderId::from(provider), message.to_string()))
            })
            .collect()
    }

    /// Options for the optimization run.
    pub fn optimize_options(&self) -> Result<OptimizeOptions, AppError> {
        Ok(OptimizeOptions {
            preserve_structure: self.preserve_structure,
            verbose_changelog: self.verbose_changelog,
            include_logs: !self.no_agent_logs,
            provider_timeout: self.timeout_duration()?,
        }
        .normalize())
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "1h". A bare number
/// is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.trim().parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.trim().parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.trim().parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.trim().parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}
