use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{DomainError, DomainResult};

/// Workflow state of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 4] = [
        QueueStatus::Pending,
        QueueStatus::InReview,
        QueueStatus::Approved,
        QueueStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::InReview => "in_review",
            QueueStatus::Approved => "approved",
            QueueStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected items accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Approved | QueueStatus::Rejected)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Normal, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ConfidenceLevel::High),
            "medium" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(()),
        }
    }
}

/// Urgency label derived from the SLA deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlaStatus {
    Overdue,
    #[serde(rename = "Due Soon")]
    DueSoon,
    #[default]
    #[serde(rename = "On Time")]
    OnTime,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::Overdue => "Overdue",
            SlaStatus::DueSoon => "Due Soon",
            SlaStatus::OnTime => "On Time",
        }
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI-generated analysis of a single ticket.
///
/// The six `*_json` fields carry JSON-encoded sub-sections exactly as the
/// backend stores them; see [`crate::domain::AnalysisSections`] for the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: i64,
    pub ticket_id: String,
    #[serde(with = "timestamp")]
    pub analysis_timestamp: DateTime<Utc>,
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: Option<f64>,
    pub issue_type: Option<String>,
    pub severity_assessment: Option<Severity>,
    pub executive_summary: Option<String>,
    pub symptom_analysis_json: Option<String>,
    pub data_correlations_json: Option<String>,
    pub root_cause_analysis_json: Option<String>,
    pub immediate_remediation_json: Option<String>,
    pub prevention_recommendations_json: Option<String>,
    pub similar_tickets_json: Option<String>,
    pub processing_time_ms: Option<i64>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub status: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub server_names: Option<String>,
    pub database_names: Option<String>,
}

/// Fields a reviewer may change while editing an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisField {
    IssueType,
    SeverityAssessment,
    ExecutiveSummary,
    ConfidenceLevel,
    ConfidenceScore,
    SymptomAnalysisJson,
    DataCorrelationsJson,
    RootCauseAnalysisJson,
    ImmediateRemediationJson,
    PreventionRecommendationsJson,
    SimilarTicketsJson,
}

impl AnalysisField {
    pub const ALL: [AnalysisField; 11] = [
        AnalysisField::IssueType,
        AnalysisField::SeverityAssessment,
        AnalysisField::ExecutiveSummary,
        AnalysisField::ConfidenceLevel,
        AnalysisField::ConfidenceScore,
        AnalysisField::SymptomAnalysisJson,
        AnalysisField::DataCorrelationsJson,
        AnalysisField::RootCauseAnalysisJson,
        AnalysisField::ImmediateRemediationJson,
        AnalysisField::PreventionRecommendationsJson,
        AnalysisField::SimilarTicketsJson,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisField::IssueType => "Issue Type",
            AnalysisField::SeverityAssessment => "Severity Assessment",
            AnalysisField::ExecutiveSummary => "Executive Summary",
            AnalysisField::ConfidenceLevel => "Confidence Level",
            AnalysisField::ConfidenceScore => "Confidence Score (%)",
            AnalysisField::SymptomAnalysisJson => "Symptom Analysis (JSON)",
            AnalysisField::DataCorrelationsJson => "Data Correlations (JSON)",
            AnalysisField::RootCauseAnalysisJson => "Root Cause Analysis (JSON)",
            AnalysisField::ImmediateRemediationJson => "Immediate Remediation (JSON)",
            AnalysisField::PreventionRecommendationsJson => "Prevention Recommendations (JSON)",
            AnalysisField::SimilarTicketsJson => "Similar Tickets (JSON)",
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(
            self,
            AnalysisField::SymptomAnalysisJson
                | AnalysisField::DataCorrelationsJson
                | AnalysisField::RootCauseAnalysisJson
                | AnalysisField::ImmediateRemediationJson
                | AnalysisField::PreventionRecommendationsJson
                | AnalysisField::SimilarTicketsJson
        )
    }
}

impl FromStr for AnalysisField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issueType" => Ok(AnalysisField::IssueType),
            "severityAssessment" => Ok(AnalysisField::SeverityAssessment),
            "executiveSummary" => Ok(AnalysisField::ExecutiveSummary),
            "confidenceLevel" => Ok(AnalysisField::ConfidenceLevel),
            "confidenceScore" => Ok(AnalysisField::ConfidenceScore),
            "symptomAnalysisJson" => Ok(AnalysisField::SymptomAnalysisJson),
            "dataCorrelationsJson" => Ok(AnalysisField::DataCorrelationsJson),
            "rootCauseAnalysisJson" => Ok(AnalysisField::RootCauseAnalysisJson),
            "immediateRemediationJson" => Ok(AnalysisField::ImmediateRemediationJson),
            "preventionRecommendationsJson" => Ok(AnalysisField::PreventionRecommendationsJson),
            "similarTicketsJson" => Ok(AnalysisField::SimilarTicketsJson),
            other => Err(DomainError::UnknownField(other.to_string())),
        }
    }
}

impl Analysis {
    /// Text shown in the editor for `field`.
    pub fn field_text(&self, field: AnalysisField) -> String {
        let text = match field {
            AnalysisField::IssueType => self.issue_type.clone(),
            AnalysisField::SeverityAssessment => self.severity_assessment.map(|s| s.to_string()),
            AnalysisField::ExecutiveSummary => self.executive_summary.clone(),
            AnalysisField::ConfidenceLevel => Some(self.confidence_level.to_string()),
            AnalysisField::ConfidenceScore => self.confidence_score.map(|s| s.to_string()),
            AnalysisField::SymptomAnalysisJson => self.symptom_analysis_json.clone(),
            AnalysisField::DataCorrelationsJson => self.data_correlations_json.clone(),
            AnalysisField::RootCauseAnalysisJson => self.root_cause_analysis_json.clone(),
            AnalysisField::ImmediateRemediationJson => self.immediate_remediation_json.clone(),
            AnalysisField::PreventionRecommendationsJson => {
                self.prevention_recommendations_json.clone()
            }
            AnalysisField::SimilarTicketsJson => self.similar_tickets_json.clone(),
        };
        text.unwrap_or_default()
    }

    /// Parses `value` for `field` and stores it. An empty value clears
    /// optional fields.
    pub fn set_field(&mut self, field: AnalysisField, value: &str) -> DomainResult<()> {
        let invalid = || DomainError::InvalidFieldValue {
            field: field.label().to_string(),
            value: value.to_string(),
        };
        let optional = |v: &str| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        };

        match field {
            AnalysisField::IssueType => self.issue_type = optional(value),
            AnalysisField::ExecutiveSummary => self.executive_summary = optional(value),
            AnalysisField::SeverityAssessment => {
                self.severity_assessment = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                };
            }
            AnalysisField::ConfidenceLevel => {
                self.confidence_level = value.parse().map_err(|_| invalid())?;
            }
            AnalysisField::ConfidenceScore => {
                self.confidence_score = if value.trim().is_empty() {
                    None
                } else {
                    let score: f64 = value.trim().parse().map_err(|_| invalid())?;
                    if !(0.0..=100.0).contains(&score) {
                        return Err(invalid());
                    }
                    Some(score)
                };
            }
            AnalysisField::SymptomAnalysisJson => self.symptom_analysis_json = optional(value),
            AnalysisField::DataCorrelationsJson => self.data_correlations_json = optional(value),
            AnalysisField::RootCauseAnalysisJson => self.root_cause_analysis_json = optional(value),
            AnalysisField::ImmediateRemediationJson => {
                self.immediate_remediation_json = optional(value)
            }
            AnalysisField::PreventionRecommendationsJson => {
                self.prevention_recommendations_json = optional(value)
            }
            AnalysisField::SimilarTicketsJson => self.similar_tickets_json = optional(value),
        }
        Ok(())
    }
}

/// A review-workflow wrapper around one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueItem {
    pub id: i64,
    pub analysis_id: i64,
    pub ticket_id: String,
    pub queue_status: QueueStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub reviewed_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub was_edited: bool,
    pub quality_rating: Option<u8>,
    #[serde(with = "timestamp")]
    pub entered_queue_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub sla_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_overdue: bool,
    pub edit_notes: Option<String>,
    pub rejection_reason: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub analysis: Option<Analysis>,
    #[serde(default)]
    pub age_minutes: i64,
    #[serde(default)]
    pub sla_status: SlaStatus,
}

impl ReviewQueueItem {
    pub fn customer_name(&self) -> Option<&str> {
        self.analysis.as_ref().and_then(|a| a.customer_name.as_deref())
    }

    pub fn severity(&self) -> Option<Severity> {
        self.analysis.as_ref().and_then(|a| a.severity_assessment)
    }

    pub fn confidence_score(&self) -> Option<f64> {
        self.analysis.as_ref().and_then(|a| a.confidence_score)
    }
}

/// Filters applied to the review queue listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueFilters {
    pub status: Option<QueueStatus>,
    pub priority: Option<Priority>,
    pub customer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub id: i64,
    pub category: String,
    pub config_key: String,
    pub config_value: Option<String>,
    pub description: Option<String>,
    pub data_type: String,
    pub validation_rule: Option<String>,
    #[serde(default)]
    pub is_secret: bool,
    pub updated_by: Option<String>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl SystemConfig {
    /// Value as it may be shown on screen; secrets are masked.
    pub fn display_value(&self) -> String {
        match (&self.config_value, self.is_secret) {
            (Some(_), true) => "********".to_string(),
            (Some(value), false) => value.clone(),
            (None, _) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHistory {
    pub id: i64,
    pub job_id: String,
    pub job_type: String,
    pub status: JobStatus,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub items_processed: Option<i64>,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthMetrics {
    pub indexing_jobs_success_7d: Option<i64>,
    pub indexing_jobs_failed_7d: Option<i64>,
    #[serde(default, with = "timestamp::option")]
    pub last_indexing_run: Option<DateTime<Utc>>,
    pub analysis_jobs_success_7d: Option<i64>,
    pub analysis_jobs_failed_7d: Option<i64>,
    #[serde(default, with = "timestamp::option")]
    pub last_analysis_run: Option<DateTime<Utc>>,
    pub total_analyses_24h: Option<i64>,
    pub approved_analyses_24h: Option<i64>,
    pub rejected_analyses_24h: Option<i64>,
    pub avg_processing_time_ms_24h: Option<f64>,
    pub avg_confidence_score_24h: Option<f64>,
    pub total_errors_24h: Option<i64>,
    pub pending_reviews: Option<i64>,
    pub in_review: Option<i64>,
    pub overdue_reviews: Option<i64>,
}

impl SystemHealthMetrics {
    /// Error count above which the dashboard shows a warning banner.
    pub const HIGH_ERROR_THRESHOLD: i64 = 10;

    pub fn has_high_error_rate(&self) -> bool {
        self.total_errors_24h.unwrap_or(0) > Self::HIGH_ERROR_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRagPerformanceMetrics {
    pub sync_type: String,
    pub status: String,
    pub tickets_indexed: Option<i64>,
    pub embeddings_generated: Option<i64>,
    pub relationships_created: Option<i64>,
    pub entities_extracted: Option<i64>,
    pub fetch_time_ms: Option<i64>,
    pub indexing_time_ms: Option<i64>,
    pub total_time_ms: Option<i64>,
    pub avg_time_per_ticket_ms: Option<f64>,
    pub errors_count: Option<i64>,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostTracking {
    pub cost_date: String,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_tokens: i64,
    pub analyses_count: i64,
    #[serde(rename = "estimatedOpenAICostUsd")]
    pub estimated_openai_cost_usd: f64,
    pub mtd_cost_usd: f64,
    pub cost_per_analysis_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i64,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub source: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub id: i64,
    pub alert_type: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_recipients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_recipients: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub action: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_description: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_role: Option<String>,
    pub ip_address: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "DBChief")]
    DbChief,
    #[serde(rename = "DBNinja")]
    DbNinja,
    SystemAdmin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserRole::DbChief => "DBChief",
            UserRole::DbNinja => "DBNinja",
            UserRole::SystemAdmin => "SystemAdmin",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub email: String,
}

/// Response of the manual trigger endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub job_id: String,
}

/// Response of the connection test endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub latency_ms: Option<f64>,
    pub rate_limit: Option<String>,
    pub model: Option<String>,
    pub results: Option<serde_json::Value>,
}

impl ConnectionTestResult {
    pub fn summary(&self) -> String {
        let mut text = self.message.clone();
        if let Some(latency) = self.latency_ms {
            text.push_str(&format!(" ({latency}ms)"));
        }
        if let Some(ref rate_limit) = self.rate_limit {
            text.push_str(&format!(" [rate limit {rate_limit}]"));
        }
        if let Some(ref model) = self.model {
            text.push_str(&format!(" [model {model}]"));
        }
        text
    }
}

/// Timestamps as the backend writes them: RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.is_empty() => Ok(None),
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {raw}"))
                }),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn analysis() -> Analysis {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Analysis {
            id: 7,
            ticket_id: "ZD-1001".to_string(),
            analysis_timestamp: at,
            confidence_level: ConfidenceLevel::High,
            confidence_score: Some(87.5),
            issue_type: Some("Blocking".to_string()),
            severity_assessment: Some(Severity::High),
            executive_summary: Some("Long-running query blocks the order table.".to_string()),
            symptom_analysis_json: Some(
                r#"{"issueType":"Blocking","affectedComponents":["orders","tempdb"],"severityAssessment":"High"}"#
                    .to_string(),
            ),
            data_correlations_json: None,
            root_cause_analysis_json: Some("not json".to_string()),
            immediate_remediation_json: None,
            prevention_recommendations_json: None,
            similar_tickets_json: None,
            processing_time_ms: Some(1830),
            input_tokens: Some(1200),
            output_tokens: Some(640),
            total_tokens: Some(1840),
            status: "completed".to_string(),
            created_at: at,
            updated_at: at,
            customer_name: Some("Contoso".to_string()),
            server_names: Some("SQL01".to_string()),
            database_names: Some("Orders".to_string()),
        }
    }

    pub fn queue_item(id: i64) -> ReviewQueueItem {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 31, 0).unwrap();
        ReviewQueueItem {
            id,
            analysis_id: 7,
            ticket_id: format!("ZD-{}", 1000 + id),
            queue_status: QueueStatus::Pending,
            priority: Priority::Normal,
            assigned_to: None,
            reviewed_by: None,
            reviewed_at: None,
            was_edited: false,
            quality_rating: None,
            entered_queue_at: at,
            sla_deadline: None,
            is_overdue: false,
            edit_notes: None,
            rejection_reason: None,
            created_at: at,
            updated_at: at,
            analysis: Some(analysis()),
            age_minutes: 0,
            sla_status: SlaStatus::OnTime,
        }
    }

    pub fn system_config(id: i64, category: &str, key: &str) -> SystemConfig {
        SystemConfig {
            id,
            category: category.to_string(),
            config_key: key.to_string(),
            config_value: None,
            description: None,
            data_type: "string".to_string(),
            validation_rule: None,
            is_secret: false,
            updated_by: None,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    pub fn job(job_id: &str, status: JobStatus) -> JobHistory {
        JobHistory {
            id: 1,
            job_id: job_id.to_string(),
            job_type: "Indexing".to_string(),
            status,
            started_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            completed_at: None,
            duration_seconds: Some(12.5),
            items_processed: Some(40),
            error_message: None,
            metadata: None,
        }
    }

    pub fn cost(date: &str) -> CostTracking {
        CostTracking {
            cost_date: date.to_string(),
            total_input_tokens: 1000,
            total_output_tokens: 500,
            total_tokens: 1500,
            analyses_count: 4,
            estimated_openai_cost_usd: 0.25,
            mtd_cost_usd: 0.25,
            cost_per_analysis_usd: 0.0625,
        }
    }

    pub fn user() -> UserInfo {
        UserInfo {
            user_id: "u-1".to_string(),
            user_name: "Dana Reviewer".to_string(),
            role: UserRole::DbNinja,
            email: "dana@example.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_item_deserializes_backend_payload() {
        let json = r#"{
            "id": 3,
            "analysisId": 9,
            "ticketId": "ZD-77",
            "queueStatus": "in_review",
            "priority": "urgent",
            "wasEdited": false,
            "enteredQueueAt": "2024-03-01T08:00:00",
            "slaDeadline": "2024-03-01T12:00:00Z",
            "isOverdue": false,
            "createdAt": "2024-03-01T08:00:00.123",
            "updatedAt": "2024-03-01T08:00:00+00:00",
            "ageMinutes": 15,
            "slaStatus": "Due Soon"
        }"#;

        let item: ReviewQueueItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.queue_status, QueueStatus::InReview);
        assert_eq!(item.priority, Priority::Urgent);
        assert_eq!(item.sla_status, SlaStatus::DueSoon);
        assert!(item.analysis.is_none());
        assert!(item.sla_deadline.is_some());
        assert_eq!(item.entered_queue_at.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_sla_status_defaults_to_on_time() {
        assert_eq!(SlaStatus::default(), SlaStatus::OnTime);
        assert_eq!(serde_json::to_string(&SlaStatus::OnTime).unwrap(), "\"On Time\"");
    }

    #[test]
    fn test_analysis_round_trips_camel_case() {
        let analysis = fixtures::analysis();
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["ticketId"], "ZD-1001");
        assert_eq!(value["confidenceLevel"], "High");
        assert_eq!(value["severityAssessment"], "High");
        let back: Analysis = serde_json::from_value(value).unwrap();
        assert_eq!(back, analysis);
    }

    #[test]
    fn test_set_field_parses_and_clears() {
        let mut analysis = fixtures::analysis();

        analysis.set_field(AnalysisField::SeverityAssessment, "critical").unwrap();
        assert_eq!(analysis.severity_assessment, Some(Severity::Critical));

        analysis.set_field(AnalysisField::ConfidenceScore, "42.5").unwrap();
        assert_eq!(analysis.confidence_score, Some(42.5));

        analysis.set_field(AnalysisField::IssueType, "   ").unwrap();
        assert!(analysis.issue_type.is_none());

        analysis.set_field(AnalysisField::ConfidenceLevel, "low").unwrap();
        assert_eq!(analysis.confidence_level, ConfidenceLevel::Low);
        assert_eq!(analysis.field_text(AnalysisField::ConfidenceLevel), "Low");
    }

    #[test]
    fn test_set_field_rejects_bad_values() {
        let mut analysis = fixtures::analysis();
        let before = analysis.clone();

        assert!(matches!(
            analysis.set_field(AnalysisField::ConfidenceScore, "120"),
            Err(DomainError::InvalidFieldValue { .. })
        ));
        assert!(analysis.set_field(AnalysisField::ConfidenceScore, "high").is_err());
        assert!(analysis.set_field(AnalysisField::SeverityAssessment, "meh").is_err());
        assert!(analysis.set_field(AnalysisField::ConfidenceLevel, "").is_err());
        assert_eq!(analysis, before);
    }

    #[test]
    fn test_analysis_field_from_str() {
        assert_eq!("issueType".parse::<AnalysisField>().unwrap(), AnalysisField::IssueType);
        assert_eq!(
            "bogus".parse::<AnalysisField>(),
            Err(DomainError::UnknownField("bogus".to_string()))
        );
    }

    #[test]
    fn test_secret_config_is_masked() {
        let mut config = SystemConfig {
            id: 1,
            category: "OpenAI".to_string(),
            config_key: "ApiKey".to_string(),
            config_value: Some("sk-123".to_string()),
            description: None,
            data_type: "string".to_string(),
            validation_rule: None,
            is_secret: true,
            updated_by: None,
            updated_at: Utc::now(),
        };
        assert_eq!(config.display_value(), "********");
        config.is_secret = false;
        assert_eq!(config.display_value(), "sk-123");
    }

    #[test]
    fn test_high_error_rate_threshold() {
        let mut health = SystemHealthMetrics::default();
        assert!(!health.has_high_error_rate());
        health.total_errors_24h = Some(10);
        assert!(!health.has_high_error_rate());
        health.total_errors_24h = Some(11);
        assert!(health.has_high_error_rate());
    }

    #[test]
    fn test_user_role_names() {
        let user: UserInfo = serde_json::from_str(
            r#"{"userId":"u1","userName":"Dana","role":"DBChief","email":"d@example.com"}"#,
        )
        .unwrap();
        assert_eq!(user.role, UserRole::DbChief);
        assert_eq!(user.role.to_string(), "DBChief");
    }

    #[test]
    fn test_timestamp_parse_rejects_garbage() {
        assert!(timestamp::parse("yesterday").is_none());
        assert!(timestamp::parse("2024-03-01 10:00:00").is_some());
    }
}
