//! Error type for session and token operations

use thiserror::Error;

use crate::types::ProviderError;

/// Errors surfaced by the auth crate.
///
/// Refresh failures never escape the token manager as raw provider errors;
/// they are converted to session loss (store cleared, listeners notified).
/// Everything here propagates unmodified to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Underlying secure storage is unavailable or misbehaving
    #[error("secure storage error: {0}")]
    Storage(String),

    /// The identity provider rejected a token request
    #[error("identity provider error: {0}")]
    Provider(ProviderError),

    /// Network-level failure talking to the identity provider
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider returned 2xx but the body was not a valid token document
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// A refresh was requested but no refresh token is available
    #[error("no refresh token available")]
    NoRefreshToken,
}
