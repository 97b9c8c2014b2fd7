//! High-level session manager
//!
//! Single entry point the rest of the application talks to: login (code
//! exchange or credentials), logout, token retrieval, and the session event
//! bus. Constructed once at process start with injected store and identity
//! provider, then shared by `Arc` — no hidden global state.

use std::sync::Arc;

use tracing::info;

use crate::error::AuthError;
use crate::events::{SessionEvents, SessionSubscription};
use crate::manager::TokenManager;
use crate::store::TokenStore;
use crate::traits::IdentityProvider;
use crate::types::{TokenResponse, TokenSet};

/// Orchestrates identity provider, token store, and event bus.
pub struct SessionManager<C, S> {
    identity: Arc<C>,
    tokens: TokenManager<C, S>,
}

impl<C, S> SessionManager<C, S>
where
    C: IdentityProvider,
    S: TokenStore,
{
    #[must_use]
    pub fn new(identity: C, store: S) -> Self {
        let identity = Arc::new(identity);
        let store = Arc::new(store);
        let events = SessionEvents::new();
        let tokens = TokenManager::new(Arc::clone(&identity), store, events);

        Self { identity, tokens }
    }

    /// Complete a browser authorization-code flow.
    ///
    /// The UI layer runs the browser leg and hands over the code plus the
    /// PKCE verifier it generated.
    pub async fn login_with_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError> {
        let response = self.identity.exchange_code(code, code_verifier, redirect_uri).await?;
        self.persist_login(response).await
    }

    /// Direct username/password login (password grant).
    pub async fn login_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenSet, AuthError> {
        let response = self.identity.login_with_password(username, password).await?;
        self.persist_login(response).await
    }

    /// Logout: best-effort revocation, then local credential wipe.
    ///
    /// Revocation failures are swallowed so logout always succeeds locally.
    /// No session-expired event fires; the user asked for this.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Ok(Some(tokens)) = self.tokens.current_tokens().await {
            self.identity.revoke(&tokens.refresh_token).await;
        }

        self.tokens.clear_tokens().await?;
        info!("Logged out");
        Ok(())
    }

    /// See [`TokenManager::get_valid_access_token`].
    pub async fn get_valid_access_token(&self) -> Result<Option<String>, AuthError> {
        self.tokens.get_valid_access_token().await
    }

    /// See [`TokenManager::force_refresh`].
    pub async fn force_refresh(&self) -> Result<Option<String>, AuthError> {
        self.tokens.force_refresh().await
    }

    /// See [`TokenManager::end_session`].
    pub async fn end_session(&self) -> Result<(), AuthError> {
        self.tokens.end_session().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated().await
    }

    /// Browser end-session redirect URL, with the stored ID token as hint
    /// when one exists.
    pub async fn end_session_url(
        &self,
        post_logout_redirect_uri: &str,
    ) -> Result<String, AuthError> {
        let tokens = self.tokens.current_tokens().await?;
        let hint = tokens.as_ref().and_then(|t| t.id_token.as_deref());
        Ok(self.identity.end_session_url(hint, post_logout_redirect_uri))
    }

    /// Subscribe to session-expired notifications.
    pub fn on_session_expired(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> SessionSubscription {
        self.tokens.events().subscribe(listener)
    }

    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        self.tokens.events()
    }

    async fn persist_login(&self, response: TokenResponse) -> Result<TokenSet, AuthError> {
        let tokens =
            TokenSet::from_response(response, None).ok_or(AuthError::NoRefreshToken)?;
        self.tokens.store_tokens(&tokens).await?;
        info!("Login completed");
        Ok(tokens)
    }
}
