//! HTTP client for the analysis backend.
//!
//! Every call is fire-once: no retry, no backoff, no caching. A 401 from any
//! endpoint clears the stored token and fires the auth-expired hook before
//! the error is returned.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::token_store::TokenStore;
use crate::domain::{
    Alert, AlertConfig, Analysis, AuditLog, ConnectionTestResult, CostTracking,
    GraphRagPerformanceMetrics, JobHistory, QueueFilters, ReviewDecision, ReviewQueueItem,
    SystemConfig, SystemHealthMetrics, TriggerResponse, UserInfo,
};

/// Header carrying the unpaged size of the review queue.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to parse response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse>;
}

/// Blocking reqwest transport. Called from worker threads only.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(ref token) = request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Invoked once for every call that came back 401.
pub type AuthExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// One page of the review queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuePage {
    pub items: Vec<ReviewQueueItem>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueQuery {
    pub filters: QueueFilters,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub event_type: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_reindex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTriggerParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_reanalysis: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigValueBody<'a> {
    config_value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    quality_rating: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectBody<'a> {
    rejection_reason: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAndApproveBody<'a> {
    edited_analysis: &'a Analysis,
    edit_notes: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality_rating: Option<u8>,
}

#[derive(Serialize)]
struct GraphRagQueryBody<'a> {
    query: &'a str,
}

/// Typed client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    on_auth_expired: Option<AuthExpiredHook>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
            on_auth_expired: None,
        }
    }

    /// Registers the callback raised when the backend rejects the token.
    pub fn on_auth_expired(mut self, hook: AuthExpiredHook) -> Self {
        self.on_auth_expired = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // System configuration

    pub fn get_system_configs(&self, category: Option<&str>) -> ApiResult<Vec<SystemConfig>> {
        let query: Vec<(&str, String)> = category
            .map(|c| vec![("category", c.to_string())])
            .unwrap_or_default();
        self.get(&["systemconfig"], &query)
    }

    pub fn update_system_config(&self, id: i64, value: &str) -> ApiResult<()> {
        let body = ConfigValueBody {
            config_value: value,
        };
        self.send_empty(HttpMethod::Put, &["systemconfig", &id.to_string()], Some(&body))
    }

    // Monitoring and metrics

    pub fn get_system_health(&self) -> ApiResult<SystemHealthMetrics> {
        self.get(&["monitoring", "system-health"], &[])
    }

    pub fn get_recent_jobs(&self, limit: u32) -> ApiResult<Vec<JobHistory>> {
        self.get(&["jobs", "recent"], &[("limit", limit.to_string())])
    }

    pub fn get_job_status(&self, job_id: &str) -> ApiResult<JobHistory> {
        self.get(&["jobs", job_id], &[])
    }

    pub fn get_graphrag_metrics(&self, days: u32) -> ApiResult<Vec<GraphRagPerformanceMetrics>> {
        self.get(&["metrics", "graphrag"], &[("days", days.to_string())])
    }

    pub fn get_cost_tracking(&self, days: u32) -> ApiResult<Vec<CostTracking>> {
        self.get(&["metrics", "costs"], &[("days", days.to_string())])
    }

    // Manual triggers

    pub fn trigger_indexing(&self, params: &IndexingParams) -> ApiResult<TriggerResponse> {
        self.post(&["admin", "trigger-indexing"], Some(params))
    }

    pub fn trigger_analysis(&self, params: &AnalysisTriggerParams) -> ApiResult<TriggerResponse> {
        self.post(&["admin", "trigger-analysis"], Some(params))
    }

    pub fn trigger_similarity_update(&self) -> ApiResult<TriggerResponse> {
        self.post::<_, ()>(&["admin", "trigger-similarity-update"], None)
    }

    pub fn test_sql_sentry(&self) -> ApiResult<ConnectionTestResult> {
        self.post::<_, ()>(&["admin", "test-sql-sentry"], None)
    }

    pub fn test_zendesk(&self) -> ApiResult<ConnectionTestResult> {
        self.post::<_, ()>(&["admin", "test-zendesk"], None)
    }

    pub fn test_openai(&self) -> ApiResult<ConnectionTestResult> {
        self.post::<_, ()>(&["admin", "test-openai"], None)
    }

    pub fn test_graphrag(&self, query: &str) -> ApiResult<ConnectionTestResult> {
        self.post(&["admin", "test-graphrag"], Some(&GraphRagQueryBody { query }))
    }

    // Audit and alerts

    pub fn get_audit_logs(&self, query: &AuditQuery) -> ApiResult<Vec<AuditLog>> {
        let mut pairs = Vec::new();
        if let Some(ref v) = query.start_date {
            pairs.push(("startDate", v.clone()));
        }
        if let Some(ref v) = query.end_date {
            pairs.push(("endDate", v.clone()));
        }
        if let Some(ref v) = query.user_id {
            pairs.push(("userId", v.clone()));
        }
        if let Some(ref v) = query.event_type {
            pairs.push(("eventType", v.clone()));
        }
        if let Some(limit) = query.limit {
            pairs.push(("limit", limit.to_string()));
        }
        self.get(&["audit"], &pairs)
    }

    pub fn get_alerts(&self, acknowledged: Option<bool>) -> ApiResult<Vec<Alert>> {
        let query: Vec<(&str, String)> = acknowledged
            .map(|a| vec![("acknowledged", a.to_string())])
            .unwrap_or_default();
        self.get(&["alerts"], &query)
    }

    pub fn acknowledge_alert(&self, id: i64) -> ApiResult<()> {
        self.send_empty::<()>(
            HttpMethod::Post,
            &["alerts", &id.to_string(), "acknowledge"],
            None,
        )
    }

    pub fn get_alert_configs(&self) -> ApiResult<Vec<AlertConfig>> {
        self.get(&["alerts", "config"], &[])
    }

    pub fn update_alert_config(&self, config: &AlertConfig) -> ApiResult<()> {
        self.send_empty(
            HttpMethod::Put,
            &["alerts", "config", &config.id.to_string()],
            Some(config),
        )
    }

    // Review queue

    pub fn get_review_queue(&self, query: &QueueQuery) -> ApiResult<QueuePage> {
        let mut pairs = Vec::new();
        if let Some(status) = query.filters.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = query.filters.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(ref customer) = query.filters.customer {
            pairs.push(("customer", customer.clone()));
        }
        if let Some(page) = query.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = query.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }

        let url = self.endpoint(&["reviewqueue"], &pairs)?;
        let response = self.execute(HttpMethod::Get, url, None)?;
        let total = response
            .header(TOTAL_COUNT_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let items = decode(&response)?;
        Ok(QueuePage { items, total })
    }

    pub fn get_review_queue_item(&self, id: i64) -> ApiResult<ReviewQueueItem> {
        self.get(&["reviewqueue", &id.to_string()], &[])
    }

    pub fn approve_analysis(&self, id: i64, quality_rating: Option<u8>) -> ApiResult<()> {
        self.send_empty(
            HttpMethod::Post,
            &["reviewqueue", &id.to_string(), "approve"],
            Some(&ApproveBody { quality_rating }),
        )
    }

    pub fn reject_analysis(&self, id: i64, rejection_reason: &str) -> ApiResult<()> {
        self.send_empty(
            HttpMethod::Post,
            &["reviewqueue", &id.to_string(), "reject"],
            Some(&RejectBody { rejection_reason }),
        )
    }

    pub fn update_and_approve_analysis(
        &self,
        id: i64,
        edited_analysis: &Analysis,
        edit_notes: &str,
        quality_rating: Option<u8>,
    ) -> ApiResult<()> {
        let body = UpdateAndApproveBody {
            edited_analysis,
            edit_notes,
            quality_rating,
        };
        self.send_empty(
            HttpMethod::Post,
            &["reviewqueue", &id.to_string(), "update-and-approve"],
            Some(&body),
        )
    }

    /// Sends a review decision to whichever endpoint handles it.
    pub fn submit_decision(&self, decision: &ReviewDecision) -> ApiResult<()> {
        match decision {
            ReviewDecision::Approve {
                queue_id,
                quality_rating,
            } => self.approve_analysis(*queue_id, *quality_rating),
            ReviewDecision::UpdateAndApprove {
                queue_id,
                edited_analysis,
                edit_notes,
                quality_rating,
            } => self.update_and_approve_analysis(
                *queue_id,
                edited_analysis,
                edit_notes,
                *quality_rating,
            ),
            ReviewDecision::Reject {
                queue_id,
                rejection_reason,
            } => self.reject_analysis(*queue_id, rejection_reason),
        }
    }

    // Analyses and user

    pub fn get_analysis(&self, id: i64) -> ApiResult<Analysis> {
        self.get(&["analyses", &id.to_string()], &[])
    }

    pub fn get_analysis_by_ticket(&self, ticket_id: &str) -> ApiResult<Analysis> {
        self.get(&["analyses", "ticket", ticket_id], &[])
    }

    pub fn get_current_user(&self) -> ApiResult<UserInfo> {
        self.get(&["auth", "user"], &[])
    }

    // Helpers

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<T> {
        let url = self.endpoint(segments, query)?;
        let response = self.execute(HttpMethod::Get, url, None)?;
        decode(&response)
    }

    fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = self.endpoint(segments, &[])?;
        let response = self.execute(HttpMethod::Post, url, encode(body)?)?;
        decode(&response)
    }

    fn send_empty<B: Serialize>(
        &self,
        method: HttpMethod,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<()> {
        let url = self.endpoint(segments, &[])?;
        self.execute(method, url, encode(body)?)?;
        Ok(())
    }

    fn execute(
        &self,
        method: HttpMethod,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> ApiResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            bearer_token: self.tokens.load(),
            body,
        };
        debug!(?method, url = %request.url, "Sending request");

        let response = self.transport.send(&request)?;

        if response.status == 401 {
            warn!(url = %request.url, "Backend rejected credentials, clearing stored token");
            if let Err(e) = self.tokens.clear() {
                warn!(error = %e, "Failed to clear stored token");
            }
            if let Some(ref hook) = self.on_auth_expired {
                hook();
            }
            return Err(ApiError::Unauthorized);
        }

        if !response.is_success() {
            let message = error_message(&response.body);
            debug!(status = response.status, %message, "Request failed");
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        Ok(response)
    }
}

fn encode<B: Serialize>(body: Option<&B>) -> ApiResult<Option<serde_json::Value>> {
    body.map(|b| serde_json::to_value(b).map_err(|e| ApiError::Decode(e.to_string())))
        .transpose()
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> ApiResult<T> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Best-effort human message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "title", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures;
    use crate::domain::{Priority, QueueStatus};
    use crate::infrastructure::mock::MockTransport;
    use crate::infrastructure::token_store::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(transport: &Arc<MockTransport>, tokens: &Arc<MemoryTokenStore>) -> ApiClient {
        ApiClient::new("http://backend.test/api/", transport.clone(), tokens.clone())
    }

    #[test]
    fn test_bearer_token_is_attached_when_stored() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, "[]");
        transport.push_json(200, "[]");
        let tokens = Arc::new(MemoryTokenStore::with_token("secret"));
        let api = client(&transport, &tokens);

        api.get_recent_jobs(10).unwrap();
        tokens.clear().unwrap();
        api.get_recent_jobs(10).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].bearer_token.as_deref(), Some("secret"));
        assert_eq!(requests[0].url, "http://backend.test/api/jobs/recent?limit=10");
        assert!(requests[1].bearer_token.is_none());
    }

    #[test]
    fn test_unauthorized_clears_token_and_fires_hook_once_per_call() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(401, "");
        transport.push_json(401, "");
        let tokens = Arc::new(MemoryTokenStore::with_token("expired"));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let api = client(&transport, &tokens).on_auth_expired(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(api.get_system_health(), Err(ApiError::Unauthorized));
        assert!(tokens.load().is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert_eq!(api.acknowledge_alert(4), Err(ApiError::Unauthorized));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_other_errors_do_not_fire_hook() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(500, r#"{"message":"database offline"}"#);
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let api = client(&transport, &tokens).on_auth_expired(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let err = api.get_system_configs(None).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "database offline".to_string()
            }
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(tokens.load().as_deref(), Some("t"));
    }

    #[test]
    fn test_review_queue_query_and_total_header() {
        let transport = Arc::new(MockTransport::new());
        let body = serde_json::to_string(&vec![fixtures::queue_item(1)]).unwrap();
        transport.push(HttpResponse {
            status: 200,
            headers: vec![("X-Total-Count".to_string(), "57".to_string())],
            body,
        });
        let tokens = Arc::new(MemoryTokenStore::new());
        let api = client(&transport, &tokens);

        let query = QueueQuery {
            filters: QueueFilters {
                status: Some(QueueStatus::InReview),
                priority: Some(Priority::Urgent),
                customer: Some("Contoso Ltd".to_string()),
            },
            page: Some(2),
            page_size: Some(20),
        };
        let page = api.get_review_queue(&query).unwrap();

        assert_eq!(page.total, 57);
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            transport.requests()[0].url,
            "http://backend.test/api/reviewqueue?status=in_review&priority=urgent&customer=Contoso+Ltd&page=2&pageSize=20"
        );
    }

    #[test]
    fn test_missing_total_header_defaults_to_zero() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, "[]");
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));

        let page = api.get_review_queue(&QueueQuery::default()).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(transport.requests()[0].url, "http://backend.test/api/reviewqueue");
    }

    #[test]
    fn test_approve_sends_rating_only() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, "");
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));

        api.submit_decision(&ReviewDecision::Approve {
            queue_id: 12,
            quality_rating: Some(4),
        })
        .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://backend.test/api/reviewqueue/12/approve");
        assert_eq!(request.body, Some(serde_json::json!({"qualityRating": 4})));
    }

    #[test]
    fn test_update_and_approve_sends_edited_analysis() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(204, "");
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));
        let mut edited = fixtures::analysis();
        edited.issue_type = Some("Deadlock".to_string());

        api.submit_decision(&ReviewDecision::UpdateAndApprove {
            queue_id: 3,
            edited_analysis: Box::new(edited),
            edit_notes: "Corrected type".to_string(),
            quality_rating: None,
        })
        .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.url, "http://backend.test/api/reviewqueue/3/update-and-approve");
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["editedAnalysis"]["issueType"], "Deadlock");
        assert_eq!(body["editNotes"], "Corrected type");
        assert!(body.get("qualityRating").is_none());
    }

    #[test]
    fn test_reject_and_config_update_bodies() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, "");
        transport.push_json(200, "");
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));

        api.reject_analysis(8, "Wrong database").unwrap();
        api.update_system_config(5, "0.85").unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].body,
            Some(serde_json::json!({"rejectionReason": "Wrong database"}))
        );
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].url, "http://backend.test/api/systemconfig/5");
        assert_eq!(requests[1].body, Some(serde_json::json!({"configValue": "0.85"})));
    }

    #[test]
    fn test_ticket_id_is_path_encoded() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &serde_json::to_string(&fixtures::analysis()).unwrap(),
        );
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));

        let analysis = api.get_analysis_by_ticket("ZD/1001").unwrap();
        assert_eq!(analysis.ticket_id, "ZD-1001");
        assert_eq!(
            transport.requests()[0].url,
            "http://backend.test/api/analyses/ticket/ZD%2F1001"
        );
    }

    #[test]
    fn test_trigger_bodies_skip_unset_fields() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, r#"{"jobId":"job-1"}"#);
        transport.push_json(200, r#"{"jobId":"job-2"}"#);
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));

        let job = api
            .trigger_indexing(&IndexingParams {
                full_reindex: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(job.job_id, "job-1");
        api.trigger_similarity_update().unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].body, Some(serde_json::json!({"fullReindex": true})));
        assert!(requests[1].body.is_none());
    }

    #[test]
    fn test_decode_error_is_reported() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, "<html>");
        let api = client(&transport, &Arc::new(MemoryTokenStore::new()));
        assert!(matches!(api.get_current_user(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(""), "Unknown error");
        assert_eq!(error_message(r#"{"title":"Not Found"}"#), "Not Found");
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
