//! Report types and endpoints
//!
//! Wire shapes mirror the report management service: report payloads are
//! camelCase, the create request is snake_case, enums are
//! SCREAMING_SNAKE_CASE strings.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportVisibility {
    Public,
    Private,
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCategory {
    Crime,
    Sanitation,
    Health,
}

/// One entry in a report's status timeline. `date` is a display label, not a
/// timestamp ("Dec 30, 09:00" or "Pending").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportUpdate {
    pub date: String,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub status: ReportStatus,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    pub visibility: ReportVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    /// Whether the authenticated caller filed this report
    pub is_mine: bool,
    pub updates: Vec<ReportUpdate>,
}

/// Body for `POST /api/reports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReportInput {
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub visibility: ReportVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ApiClient {
    /// All reports visible to the caller. The server already scopes the list
    /// by role, so no client-side visibility filtering happens here.
    pub async fn list_reports(&self) -> Result<Vec<Report>, ApiError> {
        self.get_data("/api/reports").await
    }

    /// Only the reports the caller filed.
    pub async fn my_reports(&self) -> Result<Vec<Report>, ApiError> {
        let reports = self.list_reports().await?;
        Ok(reports.into_iter().filter(|report| report.is_mine).collect())
    }

    /// A single report by ID. An unknown ID surfaces as
    /// [`ApiError::Request`] with status 404.
    pub async fn get_report(&self, id: &str) -> Result<Report, ApiError> {
        self.get_data(&format!("/api/reports/{id}")).await
    }

    /// File a new report. The server assigns the ID, stamps the creation
    /// time, and seeds the update timeline.
    pub async fn create_report(&self, input: &CreateReportInput) -> Result<Report, ApiError> {
        self.post_data("/api/reports", input).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use reportmax_auth::testing::{MemoryTokenStore, MockIdentityProvider};
    use reportmax_auth::{SessionManager, TokenSet};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ApiClientConfig;

    async fn authenticated_client(server: &MockServer) -> ApiClient {
        let store = MemoryTokenStore::new();
        store.seed(TokenSet {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            id_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        });
        let session = Arc::new(SessionManager::new(MockIdentityProvider::new(), store));
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        ApiClient::new(config, session).unwrap()
    }

    fn report_json(id: &str, is_mine: bool) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": "Overflowing trash bin near park entrance",
            "description": "Litter is spreading across the sidewalk.",
            "category": "SANITATION",
            "status": "IN_PROGRESS",
            "createdAt": "2025-12-30T14:30:00.000Z",
            "visibility": "PUBLIC",
            "isMine": is_mine,
            "updates": [
                { "date": "Dec 30, 09:00", "title": "Report Received", "active": true },
                { "date": "Pending", "title": "Issue Resolved", "active": false }
            ]
        })
    }

    #[tokio::test]
    async fn list_reports_parses_camel_case_payloads() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [report_json("R-2025-001", true)]
            })))
            .mount(&server)
            .await;

        let reports = client.list_reports().await.unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.id, "R-2025-001");
        assert_eq!(report.category, ReportCategory::Sanitation);
        assert_eq!(report.status, ReportStatus::InProgress);
        assert_eq!(report.created_at, "2025-12-30T14:30:00.000Z");
        assert!(report.is_mine);
        assert_eq!(report.image_uri, None);
        assert_eq!(report.updates.len(), 2);
    }

    #[tokio::test]
    async fn my_reports_filters_out_other_peoples_reports() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [
                    report_json("R-2025-001", true),
                    report_json("R-2025-002", false),
                    report_json("R-2025-003", true)
                ]
            })))
            .mount(&server)
            .await;

        let mine = client.my_reports().await.unwrap();
        let ids: Vec<&str> = mine.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R-2025-001", "R-2025-003"]);
    }

    #[tokio::test]
    async fn get_report_hits_the_id_route() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/reports/R-2025-002"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": report_json("R-2025-002", false)
            })))
            .mount(&server)
            .await;

        let report = client.get_report("R-2025-002").await.unwrap();
        assert_eq!(report.id, "R-2025-002");
    }

    #[tokio::test]
    async fn create_report_sends_the_snake_case_body() {
        let server = MockServer::start().await;
        let client = authenticated_client(&server).await;

        let input = CreateReportInput {
            title: "Broken streetlight outside clinic".to_string(),
            description: "Out for two nights.".to_string(),
            category: ReportCategory::Health,
            visibility: ReportVisibility::Private,
            image_url: None,
        };

        Mock::given(method("POST"))
            .and(path("/api/reports"))
            .and(header("Authorization", "Bearer A1"))
            .and(body_json(serde_json::json!({
                "title": "Broken streetlight outside clinic",
                "description": "Out for two nights.",
                "category": "HEALTH",
                "visibility": "PRIVATE"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": report_json("R-2025-005", true)
            })))
            .mount(&server)
            .await;

        let created = client.create_report(&input).await.unwrap();
        assert_eq!(created.id, "R-2025-005");
        assert!(created.is_mine);
    }

    #[test]
    fn enums_use_screaming_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_value(ReportStatus::InProgress).unwrap(),
            serde_json::json!("IN_PROGRESS")
        );
        assert_eq!(
            serde_json::to_value(ReportVisibility::Anonymous).unwrap(),
            serde_json::json!("ANONYMOUS")
        );
        assert_eq!(
            serde_json::from_value::<ReportCategory>(serde_json::json!("CRIME")).unwrap(),
            ReportCategory::Crime
        );
    }
}
