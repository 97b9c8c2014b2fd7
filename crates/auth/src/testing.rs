//! In-memory doubles for the store and identity provider
//!
//! Used by this crate's unit tests and, behind the `test-utils` feature, by
//! downstream crates exercising the request pipeline without a live Keycloak
//! server or platform keychain.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::AuthError;
use crate::store::TokenStore;
use crate::traits::IdentityProvider;
use crate::types::{ProviderError, TokenResponse, TokenSet};

/// In-memory [`TokenStore`] with an optional injected load failure.
///
/// Clones share the same underlying slot.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<Mutex<Option<TokenSet>>>,
    fail_next_load: Arc<AtomicBool>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a bundle directly into the store, bypassing `save`.
    pub fn seed(&self, tokens: TokenSet) {
        *self.tokens.lock() = Some(tokens);
    }

    /// Inspect the stored bundle without going through the trait.
    #[must_use]
    pub fn snapshot(&self) -> Option<TokenSet> {
        self.tokens.lock().clone()
    }

    /// Make the next `load` fail with a storage error.
    pub fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Storage("injected failure".to_string()));
        }
        Ok(self.tokens.lock().clone())
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        *self.tokens.lock() = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        *self.tokens.lock() = None;
        Ok(())
    }
}

enum ScriptedRefresh {
    Success(TokenResponse),
    Failure,
}

/// Scripted [`IdentityProvider`].
///
/// Refresh outcomes are queued with [`push_refresh_success`] /
/// [`push_refresh_failure`]; an empty queue fails the call. Clones share
/// state so tests can keep a probe after handing the mock to a manager.
///
/// [`push_refresh_success`]: MockIdentityProvider::push_refresh_success
/// [`push_refresh_failure`]: MockIdentityProvider::push_refresh_failure
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    login_response: Arc<Mutex<Option<TokenResponse>>>,
    refresh_script: Arc<Mutex<VecDeque<ScriptedRefresh>>>,
    refresh_calls: Arc<AtomicUsize>,
    refresh_tokens_seen: Arc<Mutex<Vec<String>>>,
    revoked: Arc<Mutex<Vec<String>>>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Response returned by both login grants.
    pub fn set_login_response(&self, response: TokenResponse) {
        *self.login_response.lock() = Some(response);
    }

    pub fn push_refresh_success(&self, response: TokenResponse) {
        self.refresh_script.lock().push_back(ScriptedRefresh::Success(response));
    }

    pub fn push_refresh_failure(&self) {
        self.refresh_script.lock().push_back(ScriptedRefresh::Failure);
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.refresh_tokens_seen.lock().last().cloned()
    }

    #[must_use]
    pub fn revoked_tokens(&self) -> Vec<String> {
        self.revoked.lock().clone()
    }

    fn login(&self) -> Result<TokenResponse, AuthError> {
        self.login_response.lock().clone().ok_or_else(|| {
            AuthError::Provider(ProviderError {
                error: "invalid_grant".to_string(),
                error_description: Some("no login response scripted".to_string()),
            })
        })
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: &str,
        _redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.login()
    }

    async fn login_with_password(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.login()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen.lock().push(refresh_token.to_string());

        match self.refresh_script.lock().pop_front() {
            Some(ScriptedRefresh::Success(response)) => Ok(response),
            Some(ScriptedRefresh::Failure) | None => Err(AuthError::Provider(ProviderError {
                error: "invalid_grant".to_string(),
                error_description: Some("Token is not active".to_string()),
            })),
        }
    }

    async fn revoke(&self, refresh_token: &str) {
        self.revoked.lock().push(refresh_token.to_string());
    }

    fn end_session_url(
        &self,
        id_token_hint: Option<&str>,
        post_logout_redirect_uri: &str,
    ) -> String {
        let mut url = format!(
            "http://localhost:8080/realms/test/protocol/openid-connect/logout?post_logout_redirect_uri={}&client_id=mobile-app",
            urlencoding::encode(post_logout_redirect_uri)
        );
        if let Some(hint) = id_token_hint {
            url = format!("{url}&id_token_hint={}", urlencoding::encode(hint));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_a_bundle() {
        let store = MemoryTokenStore::new();
        let tokens = TokenSet {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            id_token: Some("I1".to_string()),
            expires_at: Utc::now() + Duration::seconds(900),
        };

        store.save(&tokens).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(tokens));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        // Clearing twice is a no-op
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn injected_load_failure_fires_once() {
        let store = MemoryTokenStore::new();
        store.fail_next_load();

        assert!(matches!(store.load().await, Err(AuthError::Storage(_))));
        assert!(store.load().await.unwrap().is_none());
    }
}
