//! Keycloak identity provider client
//!
//! Performs the token-issuing network calls: authorization-code exchange,
//! password login, refresh, and best-effort revocation. All token requests
//! are form-encoded POSTs against the realm's token endpoint; non-2xx
//! responses map to [`AuthError::Provider`] carrying the provider's error
//! description when one is present.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::KeycloakConfig;
use crate::error::AuthError;
use crate::traits::IdentityProvider;
use crate::types::{ProviderError, TokenResponse};

/// HTTP client for the Keycloak token and revocation endpoints.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http: Client,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(std::time::Duration::from_secs(30)).build()?;

        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let scope = self.config.scope_string();
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
        ];

        self.token_request(&params).await
    }

    /// Login with username/password (Resource Owner Password Credentials).
    pub async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        let scope = self.config.scope_string();
        let params = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
            ("scope", scope.as_str()),
        ];

        self.token_request(&params).await
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::NoRefreshToken);
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        self.token_request(&params).await
    }

    /// Revoke a refresh token. Failures are logged and swallowed so logout
    /// always succeeds locally.
    pub async fn revoke(&self, refresh_token: &str) {
        if refresh_token.is_empty() {
            return;
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("token", refresh_token),
            ("token_type_hint", "refresh_token"),
        ];

        match self.http.post(self.config.revocation_url()).form(&params).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Refresh token revoked");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Token revocation rejected");
            }
            Err(err) => {
                warn!(error = %err, "Token revocation request failed");
            }
        }
    }

    /// Build the browser logout redirect URL for the end-session endpoint.
    #[must_use]
    pub fn end_session_url(
        &self,
        id_token_hint: Option<&str>,
        post_logout_redirect_uri: &str,
    ) -> String {
        let mut params = vec![
            ("post_logout_redirect_uri", post_logout_redirect_uri.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];
        if let Some(hint) = id_token_hint {
            params.insert(0, ("id_token_hint", hint.to_string()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.end_session_base_url(), query)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self.http.post(self.config.token_url()).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let provider = response
                .json::<ProviderError>()
                .await
                .unwrap_or_else(|_| ProviderError::from_status(status));
            return Err(AuthError::Provider(provider));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.exchange_code(code, code_verifier, redirect_uri).await
    }

    async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.login_with_password(username, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.refresh(refresh_token).await
    }

    async fn revoke(&self, refresh_token: &str) {
        self.revoke(refresh_token).await;
    }

    fn end_session_url(
        &self,
        id_token_hint: Option<&str>,
        post_logout_redirect_uri: &str,
    ) -> String {
        self.end_session_url(id_token_hint, post_logout_redirect_uri)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(server: &MockServer) -> KeycloakConfig {
        KeycloakConfig::new(
            server.uri(),
            "reportmaxxing",
            "mobile-app",
            "reportmax://callback",
            vec!["openid".to_string(), "profile".to_string(), "email".to_string()],
        )
    }

    #[tokio::test]
    async fn refresh_posts_refresh_grant_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/reportmaxxing/protocol/openid-connect/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("client_id=mobile-app"))
            .and(body_string_contains("refresh_token=R1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A2",
                "refresh_token": "R2",
                "expires_in": 900
            })))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(config_for(&server)).unwrap();
        let response = client.refresh("R1").await.unwrap();

        assert_eq!(response.access_token, "A2");
        assert_eq!(response.refresh_token.as_deref(), Some("R2"));
        assert_eq!(response.expires_in, 900);
    }

    #[tokio::test]
    async fn password_login_posts_credentials_and_scope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/reportmaxxing/protocol/openid-connect/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("scope=openid+profile+email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A1",
                "refresh_token": "R1",
                "id_token": "I1",
                "expires_in": 300
            })))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(config_for(&server)).unwrap();
        let response = client.login_with_password("alice", "s3cret").await.unwrap();

        assert_eq!(response.access_token, "A1");
        assert_eq!(response.id_token.as_deref(), Some("I1"));
    }

    #[tokio::test]
    async fn provider_error_carries_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/reportmaxxing/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token is not active"
            })))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(config_for(&server)).unwrap();
        let err = client.refresh("R1").await.unwrap_err();

        match err {
            AuthError::Provider(provider) => {
                assert_eq!(provider.error, "invalid_grant");
                assert_eq!(provider.error_description.as_deref(), Some("Token is not active"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/reportmaxxing/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(config_for(&server)).unwrap();
        let err = client.refresh("R1").await.unwrap_err();

        assert!(matches!(err, AuthError::Provider(p) if p.error.contains("503")));
    }

    #[tokio::test]
    async fn refresh_with_empty_token_fails_without_network() {
        let server = MockServer::start().await;
        let client = KeycloakClient::new(config_for(&server)).unwrap();

        let err = client.refresh("").await.unwrap_err();
        assert!(matches!(err, AuthError::NoRefreshToken));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revoke_swallows_failures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/reportmaxxing/protocol/openid-connect/revoke"))
            .and(body_string_contains("token_type_hint=refresh_token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(config_for(&server)).unwrap();

        // Must not panic or surface an error
        client.revoke("R1").await;
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn end_session_url_encodes_query_params() {
        let config = KeycloakConfig::new(
            "http://localhost:8080",
            "reportmaxxing",
            "mobile-app",
            "reportmax://callback",
            vec!["openid".to_string()],
        );
        let client = KeycloakClient::new(config).unwrap();

        let url = client.end_session_url(Some("ID.TOKEN"), "reportmax://logged-out");

        assert!(url.starts_with(
            "http://localhost:8080/realms/reportmaxxing/protocol/openid-connect/logout?"
        ));
        assert!(url.contains("id_token_hint=ID.TOKEN"));
        assert!(url.contains("post_logout_redirect_uri=reportmax%3A%2F%2Flogged-out"));
        assert!(url.contains("client_id=mobile-app"));
    }
}
