//! Keycloak endpoint configuration
//!
//! Derives the token, revocation, and end-session endpoints from a base URL
//! and realm, matching Keycloak's `protocol/openid-connect` layout.

use std::env;

/// Configuration for the Keycloak identity provider.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Server base URL without trailing slash (e.g., "https://id.example.com")
    pub base_url: String,

    /// Keycloak realm name
    pub realm: String,

    /// Public OAuth client id
    pub client_id: String,

    /// Redirect URI registered for the authorization-code flow
    pub redirect_uri: String,

    /// Scopes requested on every grant
    pub scopes: Vec<String>,
}

impl KeycloakConfig {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            realm: realm.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }

    /// Read configuration from `REPORTMAX_KEYCLOAK_*` environment variables,
    /// falling back to local development defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var("REPORTMAX_KEYCLOAK_URL").unwrap_or_else(|_| "http://localhost:8080".into()),
            env::var("REPORTMAX_KEYCLOAK_REALM").unwrap_or_else(|_| "reportmaxxing".into()),
            env::var("REPORTMAX_CLIENT_ID").unwrap_or_else(|_| "mobile-app".into()),
            env::var("REPORTMAX_REDIRECT_URI").unwrap_or_else(|_| "reportmax://callback".into()),
            vec!["openid".to_string(), "profile".to_string(), "email".to_string()],
        )
    }

    /// Token endpoint (all three grants POST here).
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/realms/{}/protocol/openid-connect/token", self.base_url, self.realm)
    }

    /// Revocation endpoint.
    #[must_use]
    pub fn revocation_url(&self) -> String {
        format!("{}/realms/{}/protocol/openid-connect/revoke", self.base_url, self.realm)
    }

    /// End-session (browser logout) endpoint, without query parameters.
    #[must_use]
    pub fn end_session_base_url(&self) -> String {
        format!("{}/realms/{}/protocol/openid-connect/logout", self.base_url, self.realm)
    }

    /// Scopes as the space-separated string the token endpoint expects.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
