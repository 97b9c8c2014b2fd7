//! API error taxonomy
//!
//! Classifies request pipeline failures so callers can distinguish "log in
//! first" from "the session just died" from ordinary HTTP errors.

use reportmax_auth::AuthError;
use thiserror::Error;

/// Errors surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid credential existed before the call; nothing was sent.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The server rejected the credential and refresh could not recover it.
    /// Always accompanied by a store clear and a session-expired
    /// notification.
    #[error("session expired")]
    SessionExpired,

    /// Any other non-2xx outcome. Not retried.
    #[error("request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    /// Network-level failure (DNS, timeout, reset). Not retried here.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Body(#[from] serde_json::Error),

    /// Failure from the auth layer before or during the call (e.g. secure
    /// storage unavailable). Propagated unmodified.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// True for both authentication failures: missing credentials and
    /// terminal session loss.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }
}
