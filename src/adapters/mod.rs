//! Delivery adapters - how callers receive orchestration results.
//!
//! Three thin adapters over the same orchestration engine:
//!
//! - **Sync** - call and block for the full response
//! - **Polling** - dispatch to a background worker, retrieve later by
//!   analysis id or by display-log cursor
//! - **Streaming** - receive discrete run events as they occur,
//!   terminated by a `done` sentinel
//!
//! # Adding a New Delivery Mode
//!
//! 1. Create a new file (e.g., `webhook.rs`)
//! 2. Take an `Arc<Assistant>` and drive `Orchestrator::run`
//! 3. Re-export it here

pub mod polling;
pub mod streaming;
pub mod sync;

pub use polling::{AnalysisTicket, PollingDelivery};
pub use streaming::{EventStream, StreamingDelivery};
pub use sync::SyncDelivery;
