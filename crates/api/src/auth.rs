//! Token supply for the request pipeline
//!
//! Abstracts the session layer behind a small trait so the pipeline can be
//! tested with scripted providers.

use async_trait::async_trait;
use reportmax_auth::{IdentityProvider, SessionManager, TokenStore};

use crate::errors::ApiError;

/// What the request pipeline needs from the session layer.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Pre-flight token retrieval (proactive refresh path). `None` means not
    /// authenticated.
    async fn access_token(&self) -> Result<Option<String>, ApiError>;

    /// Refresh after the server rejected a token with 401, bypassing the
    /// expiry check. `None` means the session is terminally lost; the
    /// provider has already cleared storage and notified listeners.
    async fn refresh_after_rejection(&self) -> Result<Option<String>, ApiError>;

    /// Terminate the session (clear storage, notify listeners). Called when
    /// the retry budget is exhausted.
    async fn end_session(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl<C, S> AccessTokenProvider for SessionManager<C, S>
where
    C: IdentityProvider + 'static,
    S: TokenStore + 'static,
{
    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.get_valid_access_token().await?)
    }

    async fn refresh_after_rejection(&self) -> Result<Option<String>, ApiError> {
        Ok(self.force_refresh().await?)
    }

    async fn end_session(&self) -> Result<(), ApiError> {
        SessionManager::end_session(self).await?;
        Ok(())
    }
}
