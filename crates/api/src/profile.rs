//! Profile endpoint

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::errors::ApiError;

/// Profile as served by `/api/profile`. The report counters are computed
/// server-side from the caller's Keycloak subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Primary role used for display ("CITIZEN", "OFFICIAL")
    pub role: String,
    /// All realm roles on the token
    pub roles: Vec<String>,
    pub open_reports: u32,
    pub resolved_reports: u32,
}

impl ApiClient {
    /// Fetch the authenticated user's profile.
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get_data("/api/profile").await
    }
}
