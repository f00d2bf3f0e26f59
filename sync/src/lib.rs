//! AMMSim Synchronization Controller
//!
//! Mediates between the two linked amount fields of a swap or add-liquidity
//! form: tracks the driving side, schedules quotes, drops superseded results
//! and publishes snapshots to subscribers.

pub mod config;
pub mod controller;
pub mod error;
pub mod state;
pub mod submission;

pub use config::ControllerConfig;
pub use controller::{Completion, PendingQuote, SyncController};
pub use error::SyncError;
pub use state::{ControllerStats, QuoteSnapshot, Readiness, SyncPhase};
pub use submission::SubmissionReceipt;
