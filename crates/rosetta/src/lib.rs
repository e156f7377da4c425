//! Rosetta library: configuration and application logic for the `rosetta`
//! binary.

pub mod app;
pub mod config;
pub mod errors;

/// Initialize tracing on stderr.
///
/// `level` (from `--log-level`) replaces the `RUST_LOG` filter when given.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match level.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(_)) | None => {
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
