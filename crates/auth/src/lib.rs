//! Session and token management for the ReportMax mobile client
//!
//! This crate owns the OAuth2/OIDC credential lifecycle against Keycloak:
//! secure token persistence, expiry detection with a proactive refresh
//! buffer, refresh-or-fail orchestration, and the session-expired event bus
//! the UI subscribes to for navigation back to login.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  SessionManager  │  High-level orchestrator (login, logout)
//! └────────┬─────────┘
//!          │
//!          ├──► KeycloakClient     (token endpoint HTTP calls)
//!          ├──► TokenManager       (expiry buffer + refresh-or-fail)
//!          │         │
//!          │         ├──► TokenStore      (platform keychain)
//!          │         └──► SessionEvents   (session-expired listeners)
//! ```
//!
//! The request pipeline lives in `reportmax-api` and consumes this crate
//! through the [`SessionManager`] surface.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::KeycloakClient;
pub use config::KeycloakConfig;
pub use error::AuthError;
pub use events::{SessionEvents, SessionSubscription};
pub use manager::TokenManager;
pub use service::SessionManager;
pub use store::{KeychainTokenStore, TokenStore};
pub use traits::IdentityProvider;
pub use types::{ProviderError, TokenResponse, TokenSet, EXPIRY_BUFFER_MS};

/// Session manager wired for production: Keycloak over HTTP, platform
/// keychain storage.
pub type KeycloakSessionManager = SessionManager<KeycloakClient, KeychainTokenStore>;
