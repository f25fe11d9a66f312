//! Job events delivered on the session's callback sink.

use crate::provider::Response;
use crate::query::Query;

/// Identifier of a job within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

/// The terminal outcome of a job. Exactly one is delivered per job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The provider answered; the response may still carry a non-Ok
    /// domain status (see [`crate::classify`])
    Result {
        /// The provider's response
        response: Response,
        /// Snapshot of the request that produced it, for persistence
        /// and manual reload by the consuming layer
        query: Query,
    },
    /// The provider unexpectedly redirected the request
    Redirect {
        /// Redirect target
        url: String,
    },
    /// The provider refused to serve the request
    Blocked {
        /// Blocking URL
        url: String,
    },
    /// The provider reported an internal error
    InternalError {
        /// Failing URL
        url: String,
    },
    /// TLS handshake or certificate failure
    TlsFailure {
        /// Failure detail
        message: String,
    },
    /// The job was cancelled before its outcome could be delivered
    Cancelled,
}

/// What a [`JobEvent`] announces.
#[derive(Debug)]
pub enum JobEventKind {
    /// The job body is about to run
    PreExecute,
    /// The job's terminal outcome
    Finished(JobOutcome),
    /// The job body has finished, regardless of outcome
    PostExecute,
}

/// An event on the session's serialized callback sink.
#[derive(Debug)]
pub struct JobEvent {
    /// The job this event belongs to
    pub job: JobId,
    /// What happened
    pub kind: JobEventKind,
}
