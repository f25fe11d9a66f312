//! The query engine: retrying jobs on a per-session background worker.
//!
//! A [`QuerySession`] owns one background worker task that executes
//! [`RetryingJob`]s strictly one at a time, and one event channel (the
//! serialized callback sink) on which every job delivers
//! `PreExecute → exactly one terminal outcome → PostExecute`.

mod error;
mod job;
mod outcome;
mod session;

pub use error::EngineError;
pub use job::{CancelHandle, JobRequest, RetryConfig, RetryingJob};
pub use outcome::{JobEvent, JobEventKind, JobId, JobOutcome};
pub use session::{JobTicket, QuerySession};
