//! Secure token storage
//!
//! Persists the credential bundle as four string entries in the platform
//! keychain (macOS Keychain, Windows Credential Manager, Linux Secret
//! Service). Reads are all-or-nothing: if any required entry is missing or
//! unparseable the bundle is treated as fully absent, never partially
//! returned.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::types::TokenSet;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const ID_TOKEN_KEY: &str = "id_token";
const TOKEN_EXPIRY_KEY: &str = "token_expiry";

/// Storage contract for the credential bundle.
///
/// Implementations must guarantee that `load` never observes a bundle with
/// some fields from an old write and some from a new one: a partial read
/// collapses to `None`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored bundle, or `None` when absent or incomplete.
    async fn load(&self) -> Result<Option<TokenSet>, AuthError>;

    /// Replace the stored bundle wholesale.
    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError>;

    /// Remove the stored bundle. Idempotent.
    async fn clear(&self) -> Result<(), AuthError>;
}

/// Keychain-backed token store.
pub struct KeychainTokenStore {
    service: String,
}

impl KeychainTokenStore {
    /// Create a store scoped to a keychain service name (e.g.
    /// "ReportMax.session").
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, key: &str) -> Result<Entry, AuthError> {
        Entry::new(&self.service, key)
            .map_err(|e| AuthError::Storage(format!("cannot open keychain entry {key}: {e}")))
    }

    fn read(&self, key: &str) -> Result<Option<String>, AuthError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("cannot read {key}: {e}"))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| AuthError::Storage(format!("cannot write {key}: {e}")))
    }

    fn delete(&self, key: &str) -> Result<(), AuthError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::Storage(format!("cannot delete {key}: {e}"))),
        }
    }
}

#[async_trait]
impl TokenStore for KeychainTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        let access_token = self.read(ACCESS_TOKEN_KEY)?;
        let refresh_token = self.read(REFRESH_TOKEN_KEY)?;
        let id_token = self.read(ID_TOKEN_KEY)?;
        let expiry = self.read(TOKEN_EXPIRY_KEY)?;

        let (Some(access_token), Some(refresh_token), Some(expiry)) =
            (access_token, refresh_token, expiry)
        else {
            return Ok(None);
        };

        let Some(expires_at) = decode_expiry(&expiry) else {
            warn!("Stored token expiry is unreadable, treating bundle as absent");
            return Ok(None);
        };

        Ok(Some(TokenSet { access_token, refresh_token, id_token, expires_at }))
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.write(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.write(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        match &tokens.id_token {
            Some(id_token) => self.write(ID_TOKEN_KEY, id_token)?,
            None => self.delete(ID_TOKEN_KEY)?,
        }
        self.write(TOKEN_EXPIRY_KEY, &encode_expiry(tokens.expires_at))?;

        debug!(service = %self.service, "Credential bundle stored");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.delete(ACCESS_TOKEN_KEY)?;
        self.delete(REFRESH_TOKEN_KEY)?;
        self.delete(ID_TOKEN_KEY)?;
        self.delete(TOKEN_EXPIRY_KEY)?;

        debug!(service = %self.service, "Credential bundle cleared");
        Ok(())
    }
}

/// Expiry is persisted as epoch milliseconds in string form.
fn encode_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.timestamp_millis().to_string()
}

fn decode_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
