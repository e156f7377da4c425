//! # rosetta-cli
//!
//! Terminal presentation for the orchestration store: a store observer that
//! streams the event log under a progress bar, result and detail rendering,
//! JSON output and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod ui;

pub use presenter::{CliResultPresenter, CliStoreObserver};
