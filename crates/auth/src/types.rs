//! Core credential types
//!
//! Defines the persisted credential bundle, the wire-level token response
//! returned by the identity provider, and the provider error payload.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime assumed when the provider omits `expires_in` (seconds).
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 900;

/// Safety margin subtracted from expiry so tokens are refreshed before an
/// in-flight request can hit the server with an already-expired credential.
pub const EXPIRY_BUFFER_MS: i64 = 30_000;

/// The full credential bundle persisted in secure storage.
///
/// A bundle is always complete: access token, refresh token, and an absolute
/// expiry computed once at issue time. Partial reads from storage collapse to
/// "absent" rather than producing a half-filled bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer credential attached to API calls
    pub access_token: String,

    /// Credential used to mint a new access token without re-authentication
    pub refresh_token: String,

    /// ID token (OpenID Connect), used only for the end-session redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Absolute expiration instant, derived from `expires_in` at write time
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Build a bundle from a provider response, stamping `expires_at` from the
    /// current time.
    ///
    /// Refresh responses may omit the refresh token (issuers do not always
    /// rotate it); pass the previously stored one as `retained_refresh_token`
    /// so it is carried forward. Returns `None` only when neither the
    /// response nor the caller supplies a refresh token.
    #[must_use]
    pub fn from_response(
        response: TokenResponse,
        retained_refresh_token: Option<String>,
    ) -> Option<Self> {
        let refresh_token = response.refresh_token.or(retained_refresh_token)?;

        Some(Self {
            access_token: response.access_token,
            refresh_token,
            id_token: response.id_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        })
    }

    /// Check whether the access token is expired or inside the buffer window.
    ///
    /// `buffer_ms` is subtracted from the expiry instant, so a token that is
    /// technically still valid but about to lapse counts as expired.
    #[must_use]
    pub fn is_expired(&self, buffer_ms: i64) -> bool {
        Utc::now() + Duration::milliseconds(buffer_ms) >= self.expires_at
    }
}

/// Token response from the identity provider (RFC 6749 §5.1).
///
/// Deserialized from the token endpoint for all three grants
/// (authorization_code, refresh_token, password).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Absent when the issuer does not rotate refresh tokens
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub id_token: Option<String>,

    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// Error payload returned by the identity provider (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    pub error: String,

    #[serde(default)]
    pub error_description: Option<String>,
}

impl ProviderError {
    /// Fallback for non-2xx responses whose body is not a standard error
    /// document.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self {
            error: format!("request failed with status {status}"),
            error_description: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ProviderError {}
