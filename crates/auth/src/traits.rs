//! Identity provider abstraction
//!
//! Enables dependency injection so the token manager and session manager can
//! be exercised against in-memory doubles instead of a live Keycloak server.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::types::TokenResponse;

/// Token-issuing operations against the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for tokens (authorization_code grant).
    ///
    /// The PKCE verifier is supplied by the caller; challenge generation and
    /// browser orchestration belong to the UI layer.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError>;

    /// Direct credential login (password grant).
    async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError>;

    /// Mint a new access token (refresh_token grant).
    ///
    /// The response may omit a new refresh token; callers retain the previous
    /// one.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    /// Revoke a refresh token. Best-effort: failures are logged and swallowed
    /// so logout never blocks on revocation.
    async fn revoke(&self, refresh_token: &str);

    /// Build the browser end-session redirect URL.
    fn end_session_url(&self, id_token_hint: Option<&str>, post_logout_redirect_uri: &str)
        -> String;
}
