//! Token lifecycle manager
//!
//! Owns the expiry-buffer logic: decides when a stored token is usable as-is
//! and when it must be refreshed, and converts refresh failure into session
//! loss (store cleared, event bus notified) in exactly one place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::events::SessionEvents;
use crate::store::TokenStore;
use crate::traits::IdentityProvider;
use crate::types::{TokenSet, EXPIRY_BUFFER_MS};

/// Manages the credential bundle lifecycle.
///
/// The manager is the sole writer of the token store. Two refresh entry
/// points exist:
///
/// - [`get_valid_access_token`]: the pre-flight fast path. Returns the stored
///   token without I/O beyond the store read when it is still outside the
///   expiry buffer, refreshing only when needed.
/// - [`force_refresh`]: used after the server rejected a token with 401, so
///   the expiry check is skipped.
///
/// Both paths coalesce behind one async lock: a caller that waited on a
/// concurrent refresh re-reads the store and reuses the bundle the winner
/// just wrote instead of spending the refresh token again.
///
/// [`get_valid_access_token`]: TokenManager::get_valid_access_token
/// [`force_refresh`]: TokenManager::force_refresh
pub struct TokenManager<C, S> {
    identity: Arc<C>,
    store: Arc<S>,
    events: SessionEvents,
    buffer_ms: i64,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl<C, S> TokenManager<C, S>
where
    C: IdentityProvider,
    S: TokenStore,
{
    #[must_use]
    pub fn new(identity: Arc<C>, store: Arc<S>, events: SessionEvents) -> Self {
        Self {
            identity,
            store,
            events,
            buffer_ms: EXPIRY_BUFFER_MS,
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Override the expiry buffer (milliseconds). Intended for tests.
    #[must_use]
    pub fn with_expiry_buffer(mut self, buffer_ms: i64) -> Self {
        self.buffer_ms = buffer_ms;
        self
    }

    /// Return a usable access token, refreshing proactively when the stored
    /// one is expired or inside the buffer window.
    ///
    /// `Ok(None)` means "not authenticated": either no bundle is stored, or
    /// the refresh failed terminally (store cleared, listeners notified).
    /// Storage failures surface as errors.
    pub async fn get_valid_access_token(&self) -> Result<Option<String>, AuthError> {
        let Some(tokens) = self.store.load().await? else {
            return Ok(None);
        };

        if !tokens.is_expired(self.buffer_ms) {
            return Ok(Some(tokens.access_token));
        }

        debug!("Access token expired or inside buffer, refreshing");
        self.refresh_coalesced(true).await
    }

    /// Refresh unconditionally, skipping the expiry fast path.
    ///
    /// Called by the request pipeline when the server has just proven the
    /// current token invalid with a 401.
    pub async fn force_refresh(&self) -> Result<Option<String>, AuthError> {
        self.refresh_coalesced(false).await
    }

    /// Persist a freshly issued bundle (login or code exchange).
    pub async fn store_tokens(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.store.save(tokens).await?;
        info!("Credential bundle stored");
        Ok(())
    }

    /// Remove the stored bundle without firing the session-expired event
    /// (user-initiated logout is not a session loss).
    pub async fn clear_tokens(&self) -> Result<(), AuthError> {
        self.store.clear().await?;
        info!("Credential bundle cleared");
        Ok(())
    }

    /// Current bundle, if any. No refresh.
    pub async fn current_tokens(&self) -> Result<Option<TokenSet>, AuthError> {
        self.store.load().await
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(_)))
    }

    /// Terminate the session: clear the store and notify listeners.
    ///
    /// Used when a request still comes back 401 after a successful refresh
    /// (retry budget exhausted).
    pub async fn end_session(&self) -> Result<(), AuthError> {
        self.store.clear().await?;
        self.events.notify_expired();
        Ok(())
    }

    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Single refresh attempt. `proactive` marks the pre-flight path, which
    /// may discover after taking the lock that a concurrent caller already
    /// refreshed and skip the network call entirely.
    async fn refresh_coalesced(&self, proactive: bool) -> Result<Option<String>, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        // Re-read under the lock: a concurrent refresh may have replaced the
        // bundle (or failed and cleared it) while we waited.
        let Some(current) = self.store.load().await? else {
            return Ok(None);
        };

        if proactive && !current.is_expired(self.buffer_ms) {
            debug!("Token already refreshed by concurrent caller");
            return Ok(Some(current.access_token));
        }

        match self.identity.refresh(&current.refresh_token).await {
            Ok(response) => {
                let next = TokenSet::from_response(response, Some(current.refresh_token))
                    .ok_or(AuthError::NoRefreshToken)?;
                self.store.save(&next).await?;
                info!("Access token refreshed");
                Ok(Some(next.access_token))
            }
            Err(err) => {
                // Terminal: any refresh failure ends the session. The error
                // is never surfaced raw; callers observe "not authenticated".
                warn!(error = %err, "Token refresh failed, ending session");
                self.store.clear().await?;
                self.events.notify_expired();
                Ok(None)
            }
        }
    }
}
