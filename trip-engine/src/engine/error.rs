//! Engine error types.

use crate::provider::IoFailure;

/// Fatal errors surfaced by the engine.
///
/// These are distinct from classified provider outcomes: an
/// `EngineError` means the job could not produce a terminal callback and
/// the failure must not be swallowed.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// All attempts failed and the final error was not a known-benign
    /// I/O kind
    #[error("provider kept failing after {tries} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made
        tries: u32,
        /// The final I/O failure
        #[source]
        source: IoFailure,
    },

    /// The provider raised an unclassified fault
    #[error("unclassified provider fault: {0}")]
    Fault(String),

    /// The session's worker is gone; no further jobs can be submitted
    #[error("query session is closed")]
    SessionClosed,

    /// The worker task panicked
    #[error("query worker panicked: {0}")]
    Worker(String),
}
