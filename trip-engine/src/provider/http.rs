//! Mapping of `reqwest` errors onto the provider error taxonomy.
//!
//! Concrete HTTP providers call [`classify_error`] on every failed
//! request so that the retry loop sees a uniform classification
//! regardless of the underlying network. Status-code classification
//! requires the provider to have called `Response::error_for_status`.

use std::error::Error as _;

use reqwest::StatusCode;

use super::error::{IoFailure, IoKind, ProviderError};

/// Classify a `reqwest` error into a [`ProviderError`].
pub fn classify_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return io(IoKind::Timeout, &err);
    }

    if err.is_redirect() {
        return ProviderError::Redirect { url: url_of(&err) };
    }

    if let Some(status) = err.status() {
        return classify_status(status, &err);
    }

    if err.is_connect() {
        // reqwest folds DNS failures into connect errors; tell them apart
        // by inspecting the source chain.
        let kind = if chain_mentions(&err, &["dns", "resolve", "name or service"]) {
            IoKind::HostUnresolved
        } else {
            IoKind::Connection
        };
        return io(kind, &err);
    }

    if chain_mentions(&err, &["tls", "ssl", "certificate", "handshake"]) {
        return ProviderError::Tls(err.to_string());
    }

    io(IoKind::Other, &err)
}

fn classify_status(status: StatusCode, err: &reqwest::Error) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => io(IoKind::NotFound, err),
        StatusCode::FORBIDDEN
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => ProviderError::Blocked { url: url_of(err) },
        s if s.is_server_error() => ProviderError::Internal { url: url_of(err) },
        _ => io(IoKind::Other, err),
    }
}

fn io(kind: IoKind, err: &reqwest::Error) -> ProviderError {
    ProviderError::Io(IoFailure::new(kind, err.to_string()))
}

fn url_of(err: &reqwest::Error) -> String {
    err.url().map(|u| u.to_string()).unwrap_or_default()
}

/// Case-insensitive search for any needle in the error's source chain.
fn chain_mentions(err: &reqwest::Error, needles: &[&str]) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if needles.iter().any(|needle| text.contains(needle)) {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    // Classifying real reqwest errors requires producing them; a refused
    // loopback connection is the one failure mode that needs no network.
    #[tokio::test]
    async fn connect_refused_maps_to_connection_io() {
        let client = reqwest::Client::new();
        let err = client
            .get("http://127.0.0.1:9")
            .send()
            .await
            .expect_err("discard port should refuse connections");

        match classify_error(err) {
            ProviderError::Io(failure) => {
                assert!(
                    matches!(failure.kind, IoKind::Connection | IoKind::HostUnresolved),
                    "unexpected kind: {:?}",
                    failure.kind
                );
            }
            other => panic!("expected Io error, got: {other:?}"),
        }
    }
}
