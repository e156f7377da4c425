//! # rosetta-orchestration
//!
//! The orchestration state store. A single owner mutates it through named
//! entry points; provider tasks run on worker threads and report back over
//! a channel that the owner drains with [`OrchestrationStore::pump`].

mod dispatch;
pub mod interfaces;
pub mod messages;
pub mod popup;
pub mod snapshot;
pub mod store;

pub use interfaces::{NullObserver, ResultPresenter, StoreObserver, StoreSubject};
pub use popup::PopupState;
pub use snapshot::StoreSnapshot;
pub use store::{DispatchRejection, OrchestrationStore, RunTicket};
