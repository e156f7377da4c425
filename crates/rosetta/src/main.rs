//! Rosetta: optimize one prompt for several AI providers concurrently.

use std::process::ExitCode;

use rosetta_cli::CliResultPresenter;
use rosetta_lib::{app, config, errors, init_tracing};
use rosetta_orchestration::ResultPresenter;

fn main() -> ExitCode {
    let config = config::AppConfig::parse();
    init_tracing(config.log_level.as_deref());

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliResultPresenter::new(config.quiet).present_error(&format!("{err:#}"));
            ExitCode::from(u8::try_from(errors::exit_code(&err)).unwrap_or(1))
        }
    }
}
