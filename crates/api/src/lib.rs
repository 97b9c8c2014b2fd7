//! Authenticated HTTP layer for the ReportMax mobile client
//!
//! Sits on top of `reportmax-auth`: every request goes out with a valid
//! bearer token (refreshed proactively when near expiry), a 401 response
//! triggers exactly one forced refresh and retry, and an unrecoverable
//! rejection terminates the session through the shared event bus.
//!
//! Typed wrappers for the backend routes (`/api/profile`, `/api/reports`)
//! live in [`profile`] and [`reports`].

pub mod auth;
pub mod client;
pub mod errors;
pub mod profile;
pub mod reports;

pub use auth::AccessTokenProvider;
pub use client::{ApiClient, ApiClientConfig, ApiEnvelope, RequestOptions};
pub use errors::ApiError;
pub use profile::UserProfile;
pub use reports::{
    CreateReportInput, Report, ReportCategory, ReportStatus, ReportUpdate, ReportVisibility,
};
