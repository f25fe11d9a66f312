//! Provider error taxonomy.
//!
//! Errors split into four classes, each handled differently by the
//! retry loop:
//!
//! - classified terminal errors (`Redirect`, `Blocked`, `Internal`,
//!   `Tls`) surface immediately and are never retried,
//! - I/O failures (`Io`) are retried with linear backoff; at exhaustion
//!   the benign kinds degrade to a `ServiceDown` result,
//! - everything else (`Fault`) is fatal and propagates.

use std::fmt;

/// Kind of an I/O failure, as far as the provider could classify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    /// The request timed out
    Timeout,
    /// DNS resolution failed
    HostUnresolved,
    /// The connection could not be established or broke
    Connection,
    /// The requested resource does not exist
    NotFound,
    /// A TLS failure during I/O
    Tls,
    /// An I/O failure the provider could not classify further
    Other,
}

impl IoKind {
    /// Whether exhausting all retries on this kind degrades to a
    /// `ServiceDown` result instead of propagating.
    pub fn is_benign(self) -> bool {
        !matches!(self, IoKind::Other)
    }
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoKind::Timeout => "timeout",
            IoKind::HostUnresolved => "host unresolved",
            IoKind::Connection => "connection",
            IoKind::NotFound => "not found",
            IoKind::Tls => "tls",
            IoKind::Other => "unclassified",
        };
        f.write_str(name)
    }
}

/// A transient I/O failure talking to the provider.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} i/o failure: {message}")]
pub struct IoFailure {
    /// Classified failure kind
    pub kind: IoKind,
    /// Human-readable detail
    pub message: String,
}

impl IoFailure {
    /// Create an I/O failure of the given kind.
    pub fn new(kind: IoKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Error raised by a [`ProviderClient`](super::ProviderClient) operation.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider unexpectedly redirected the request
    #[error("provider redirected to {url}")]
    Redirect {
        /// Redirect target
        url: String,
    },

    /// The provider refused to serve the request
    #[error("provider blocked the request at {url}")]
    Blocked {
        /// Blocking URL
        url: String,
    },

    /// The provider reported an internal error
    #[error("provider internal error at {url}")]
    Internal {
        /// Failing URL
        url: String,
    },

    /// TLS handshake or certificate failure
    #[error("tls failure: {0}")]
    Tls(String),

    /// Transient I/O failure, subject to retry
    #[error(transparent)]
    Io(#[from] IoFailure),

    /// A fault the provider could not classify; always fatal
    #[error("unclassified provider fault: {0}")]
    Fault(String),
}

impl ProviderError {
    /// Whether the retry loop may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Io(_))
    }
}
