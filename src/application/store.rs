//! In-memory store, one slice per concern.
//!
//! Slices are plain structs mutated only through their `reduce` function.
//! `SetLoading` sets the loading flag, data actions clear it, and `SetError`
//! records the error and clears it.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::domain::{
    Alert, AlertConfig, AnalysisField, AuditLog, CostTracking, DomainResult,
    GraphRagPerformanceMetrics, JobHistory, QueueFilters, QueueStatus, ReviewDecision,
    ReviewQueueItem, ReviewSession, SlaStatus, SystemConfig, SystemHealthMetrics, UserInfo,
};

// Config

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSlice {
    pub configs: Vec<SystemConfig>,
    pub selected_id: Option<i64>,
    /// Only this category is fetched when set.
    pub category: Option<String>,
    /// Every category seen so far, in first-seen order.
    pub known_categories: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    SetLoading(bool),
    SetError(Option<String>),
    Loaded(Vec<SystemConfig>),
    Updated { id: i64, value: String },
    Select(Option<i64>),
    SetCategory(Option<String>),
}

impl ConfigSlice {
    pub fn reduce(&mut self, action: ConfigAction) {
        match action {
            ConfigAction::SetLoading(loading) => self.loading = loading,
            ConfigAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            ConfigAction::Loaded(configs) => {
                self.error = None;
                for config in &configs {
                    if !self.known_categories.contains(&config.category) {
                        self.known_categories.push(config.category.clone());
                    }
                }
                self.configs = configs;
                self.loading = false;
            }
            ConfigAction::Updated { id, value } => {
                if let Some(config) = self.configs.iter_mut().find(|c| c.id == id) {
                    config.config_value = Some(value);
                }
            }
            ConfigAction::Select(id) => self.selected_id = id,
            ConfigAction::SetCategory(category) => self.category = category,
        }
    }

    pub fn selected(&self) -> Option<&SystemConfig> {
        let id = self.selected_id?;
        self.configs.iter().find(|c| c.id == id)
    }

    /// Category after the current filter; `None` wraps back to all.
    pub fn next_category(&self) -> Option<String> {
        match &self.category {
            None => self.known_categories.first().cloned(),
            Some(current) => self
                .known_categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| self.known_categories.get(i + 1).cloned()),
        }
    }
}

// Monitoring

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringSlice {
    pub health: Option<SystemHealthMetrics>,
    pub recent_jobs: Vec<JobHistory>,
    pub graphrag_metrics: Vec<GraphRagPerformanceMetrics>,
    pub cost_tracking: Vec<CostTracking>,
    /// Last job looked up by id from the triggers screen.
    pub job_lookup: Option<JobHistory>,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitoringAction {
    SetLoading(bool),
    SetError(Option<String>),
    HealthLoaded(SystemHealthMetrics, DateTime<Utc>),
    RecentJobsLoaded(Vec<JobHistory>),
    GraphRagLoaded(Vec<GraphRagPerformanceMetrics>),
    CostsLoaded(Vec<CostTracking>),
    JobLoaded(JobHistory),
}

/// Month-to-date totals shown under the cost table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostSummary {
    pub analyses: i64,
    pub tokens: i64,
    pub mtd_cost_usd: f64,
}

impl MonitoringSlice {
    pub fn reduce(&mut self, action: MonitoringAction) {
        match action {
            MonitoringAction::SetLoading(loading) => self.loading = loading,
            MonitoringAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            MonitoringAction::HealthLoaded(health, at) => {
                self.error = None;
                self.health = Some(health);
                self.last_refreshed = Some(at);
                self.loading = false;
            }
            MonitoringAction::RecentJobsLoaded(jobs) => {
                self.error = None;
                self.recent_jobs = jobs;
                self.loading = false;
            }
            MonitoringAction::GraphRagLoaded(metrics) => {
                self.error = None;
                self.graphrag_metrics = metrics;
                self.loading = false;
            }
            MonitoringAction::CostsLoaded(costs) => {
                self.error = None;
                self.cost_tracking = costs;
                self.loading = false;
            }
            MonitoringAction::JobLoaded(job) => {
                self.error = None;
                self.job_lookup = Some(job);
                self.loading = false;
            }
        }
    }

    /// Sums analyses and tokens over the loaded days; MTD cost comes from the
    /// most recent row.
    pub fn cost_summary(&self) -> CostSummary {
        let latest = self.cost_tracking.iter().max_by(|a, b| a.cost_date.cmp(&b.cost_date));
        CostSummary {
            analyses: self.cost_tracking.iter().map(|c| c.analyses_count).sum(),
            tokens: self.cost_tracking.iter().map(|c| c.total_tokens).sum(),
            mtd_cost_usd: latest.map(|c| c.mtd_cost_usd).unwrap_or(0.0),
        }
    }
}

// Alerts

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertsSlice {
    pub alerts: Vec<Alert>,
    pub configs: Vec<AlertConfig>,
    pub unacknowledged_count: usize,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertsAction {
    SetLoading(bool),
    SetError(Option<String>),
    Loaded(Vec<Alert>),
    ConfigsLoaded(Vec<AlertConfig>),
    Acknowledged { id: i64, at: DateTime<Utc> },
    ConfigUpdated(AlertConfig),
}

impl AlertsSlice {
    pub fn reduce(&mut self, action: AlertsAction) {
        match action {
            AlertsAction::SetLoading(loading) => self.loading = loading,
            AlertsAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            AlertsAction::Loaded(alerts) => {
                self.error = None;
                self.unacknowledged_count = alerts.iter().filter(|a| !a.acknowledged).count();
                self.alerts = alerts;
                self.loading = false;
            }
            AlertsAction::ConfigsLoaded(configs) => {
                self.error = None;
                self.configs = configs;
                self.loading = false;
            }
            AlertsAction::Acknowledged { id, at } => {
                if let Some(alert) = self.alerts.iter_mut().find(|a| a.id == id) {
                    if !alert.acknowledged {
                        alert.acknowledged = true;
                        alert.acknowledged_at = Some(at);
                        self.unacknowledged_count = self.unacknowledged_count.saturating_sub(1);
                    }
                }
            }
            AlertsAction::ConfigUpdated(config) => {
                if let Some(existing) = self.configs.iter_mut().find(|c| c.id == config.id) {
                    *existing = config;
                }
            }
        }
    }
}

// Audit

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditSlice {
    pub logs: Vec<AuditLog>,
    pub event_type: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditAction {
    SetLoading(bool),
    SetError(Option<String>),
    Loaded(Vec<AuditLog>),
    SetEventType(Option<String>),
}

impl AuditSlice {
    pub fn reduce(&mut self, action: AuditAction) {
        match action {
            AuditAction::SetLoading(loading) => self.loading = loading,
            AuditAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            AuditAction::Loaded(logs) => {
                self.error = None;
                self.logs = logs;
                self.loading = false;
            }
            AuditAction::SetEventType(event_type) => self.event_type = event_type,
        }
    }
}

// User

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSlice {
    pub user: Option<UserInfo>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SetLoading(bool),
    SetError(Option<String>),
    Loaded(UserInfo),
    Cleared,
}

impl UserSlice {
    pub fn reduce(&mut self, action: UserAction) {
        match action {
            UserAction::SetLoading(loading) => self.loading = loading,
            UserAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            UserAction::Loaded(user) => {
                self.error = None;
                self.user = Some(user);
                self.is_authenticated = true;
                self.loading = false;
            }
            UserAction::Cleared => *self = Self::default(),
        }
    }
}

// Queue

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    Confidence,
    Severity,
    #[default]
    Date,
    Customer,
}

impl SortBy {
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Confidence => "confidence",
            SortBy::Severity => "severity",
            SortBy::Date => "date",
            SortBy::Customer => "customer",
        }
    }

    pub fn next(&self) -> SortBy {
        match self {
            SortBy::Confidence => SortBy::Severity,
            SortBy::Severity => SortBy::Date,
            SortBy::Date => SortBy::Customer,
            SortBy::Customer => SortBy::Confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(&self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Counts over the visible page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    pub overdue: usize,
    pub pending: usize,
    pub in_review: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueSlice {
    pub items: Vec<ReviewQueueItem>,
    /// Unpaged total reported by the backend.
    pub total: u64,
    pub filters: QueueFilters,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for QueueSlice {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            filters: QueueFilters::default(),
            page: 1,
            page_size: 20,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueAction {
    SetLoading(bool),
    SetError(Option<String>),
    Loaded {
        items: Vec<ReviewQueueItem>,
        total: u64,
        now: DateTime<Utc>,
    },
    SetFilters(QueueFilters),
    SetPage(u32),
    SetPageSize(u32),
    SetSorting { sort_by: SortBy, sort_order: SortOrder },
    UpdateStatus { id: i64, status: QueueStatus },
    /// Re-derives age and SLA status against the clock.
    Tick(DateTime<Utc>),
}

impl QueueSlice {
    pub fn reduce(&mut self, action: QueueAction) {
        match action {
            QueueAction::SetLoading(loading) => self.loading = loading,
            QueueAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            QueueAction::Loaded { items, total, now } => {
                self.error = None;
                self.items = items;
                self.total = total;
                self.loading = false;
                self.refresh_derived(now);
                self.sort();
            }
            QueueAction::SetFilters(filters) => {
                self.filters = filters;
                self.page = 1;
            }
            QueueAction::SetPage(page) => self.page = page.clamp(1, self.page_count()),
            QueueAction::SetPageSize(size) => {
                self.page_size = size.max(1);
                self.page = 1;
            }
            QueueAction::SetSorting {
                sort_by,
                sort_order,
            } => {
                self.sort_by = sort_by;
                self.sort_order = sort_order;
                self.sort();
            }
            QueueAction::UpdateStatus { id, status } => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                    item.queue_status = status;
                }
            }
            QueueAction::Tick(now) => self.refresh_derived(now),
        }
    }

    fn refresh_derived(&mut self, now: DateTime<Utc>) {
        for item in &mut self.items {
            item.refresh_derived(now);
        }
    }

    fn sort(&mut self) {
        let sort_by = self.sort_by;
        self.items.sort_by(|a, b| compare_items(a, b, sort_by));
        if self.sort_order == SortOrder::Desc {
            self.items.reverse();
        }
    }

    pub fn page_count(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            total: self.items.len(),
            overdue: self
                .items
                .iter()
                .filter(|i| i.sla_status == SlaStatus::Overdue)
                .count(),
            pending: self
                .items
                .iter()
                .filter(|i| i.queue_status == QueueStatus::Pending)
                .count(),
            in_review: self
                .items
                .iter()
                .filter(|i| i.queue_status == QueueStatus::InReview)
                .count(),
        }
    }
}

fn compare_items(a: &ReviewQueueItem, b: &ReviewQueueItem, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Confidence => a
            .confidence_score()
            .partial_cmp(&b.confidence_score())
            .unwrap_or(Ordering::Equal),
        SortBy::Severity => a
            .severity()
            .map(|s| s.rank())
            .cmp(&b.severity().map(|s| s.rank())),
        SortBy::Date => a.entered_queue_at.cmp(&b.entered_queue_at),
        SortBy::Customer => a
            .customer_name()
            .map(str::to_lowercase)
            .cmp(&b.customer_name().map(str::to_lowercase)),
    }
}

// Analysis

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSlice {
    pub session: Option<ReviewSession>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisAction {
    SetLoading(bool),
    SetError(Option<String>),
    Opened(ReviewQueueItem),
    BeginEdit,
    EditField { field: AnalysisField, value: String },
    CancelEdits,
    SetQualityRating(u8),
    SetEditNotes(String),
    SetRejectionReason(String),
    Completed(ReviewDecision),
    Closed,
}

impl AnalysisSlice {
    /// Applies `action`. Workflow violations are returned and leave the
    /// session untouched.
    pub fn reduce(&mut self, action: AnalysisAction) -> DomainResult<()> {
        match action {
            AnalysisAction::SetLoading(loading) => self.loading = loading,
            AnalysisAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            AnalysisAction::Opened(item) => {
                self.loading = false;
                self.session = Some(ReviewSession::open(item)?);
            }
            AnalysisAction::Closed => self.session = None,
            other => {
                let Some(session) = self.session.as_mut() else {
                    return Ok(());
                };
                match other {
                    AnalysisAction::BeginEdit => session.begin_edit()?,
                    AnalysisAction::EditField { field, value } => {
                        session.edit_field(field, &value)?
                    }
                    AnalysisAction::CancelEdits => session.cancel_edits(),
                    AnalysisAction::SetQualityRating(rating) => {
                        session.set_quality_rating(rating)?
                    }
                    AnalysisAction::SetEditNotes(notes) => session.edit_notes = notes,
                    AnalysisAction::SetRejectionReason(reason) => {
                        session.rejection_reason = reason
                    }
                    AnalysisAction::Completed(decision) => {
                        if decision.queue_id() == session.queue_id() {
                            session.complete(&decision)?;
                        }
                        self.loading = false;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Every slice of client state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    pub config: ConfigSlice,
    pub monitoring: MonitoringSlice,
    pub alerts: AlertsSlice,
    pub audit: AuditSlice,
    pub user: UserSlice,
    pub queue: QueueSlice,
    pub analysis: AnalysisSlice,
}

impl Store {
    /// Drops everything tied to the expired session.
    pub fn auth_expired(&mut self) {
        self.user.reduce(UserAction::Cleared);
        self.analysis = AnalysisSlice::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures;
    use crate::domain::{AlertSeverity, Severity};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
    }

    fn alert(id: i64, acknowledged: bool) -> Alert {
        Alert {
            id,
            alert_type: "HighErrorRate".to_string(),
            severity: AlertSeverity::Warning,
            message: "errors".to_string(),
            source: "worker".to_string(),
            created_at: now(),
            acknowledged,
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }

    #[test]
    fn test_loading_and_error_flags() {
        let mut slice = AuditSlice::default();
        slice.reduce(AuditAction::SetLoading(true));
        assert!(slice.loading);

        slice.reduce(AuditAction::SetError(Some("boom".to_string())));
        assert!(!slice.loading);
        assert_eq!(slice.error.as_deref(), Some("boom"));

        slice.reduce(AuditAction::SetLoading(true));
        slice.reduce(AuditAction::Loaded(Vec::new()));
        assert!(!slice.loading);
    }

    #[test]
    fn test_unacknowledged_count() {
        let mut slice = AlertsSlice::default();
        slice.reduce(AlertsAction::Loaded(vec![alert(1, false), alert(2, true), alert(3, false)]));
        assert_eq!(slice.unacknowledged_count, 2);

        slice.reduce(AlertsAction::Acknowledged { id: 1, at: now() });
        assert_eq!(slice.unacknowledged_count, 1);
        assert!(slice.alerts[0].acknowledged);

        // acknowledging twice does not double count
        slice.reduce(AlertsAction::Acknowledged { id: 1, at: now() });
        slice.reduce(AlertsAction::Acknowledged { id: 2, at: now() });
        assert_eq!(slice.unacknowledged_count, 1);
    }

    #[test]
    fn test_config_update_replaces_value() {
        let mut slice = ConfigSlice::default();
        let mut config = fixtures::system_config(5, "Thresholds", "MinConfidence");
        config.config_value = Some("0.7".to_string());
        slice.reduce(ConfigAction::Loaded(vec![config]));
        slice.reduce(ConfigAction::Select(Some(5)));

        slice.reduce(ConfigAction::Updated {
            id: 5,
            value: "0.9".to_string(),
        });

        assert_eq!(slice.selected().unwrap().config_value.as_deref(), Some("0.9"));
        assert_eq!(slice.known_categories, vec!["Thresholds".to_string()]);
    }

    #[test]
    fn test_category_cycle_wraps() {
        let mut slice = ConfigSlice::default();
        slice.reduce(ConfigAction::Loaded(vec![
            fixtures::system_config(1, "Indexing", "BatchSize"),
            fixtures::system_config(2, "OpenAI", "Model"),
        ]));

        assert_eq!(slice.next_category().as_deref(), Some("Indexing"));
        slice.reduce(ConfigAction::SetCategory(Some("Indexing".to_string())));
        // a filtered load does not forget the other categories
        slice.reduce(ConfigAction::Loaded(vec![fixtures::system_config(1, "Indexing", "BatchSize")]));
        assert_eq!(slice.next_category().as_deref(), Some("OpenAI"));
        slice.reduce(ConfigAction::SetCategory(Some("OpenAI".to_string())));
        assert_eq!(slice.next_category(), None);
    }

    #[test]
    fn test_queue_loaded_derives_and_sorts() {
        let mut slice = QueueSlice::default();
        let mut old = fixtures::queue_item(1);
        old.entered_queue_at = now() - Duration::minutes(1500);
        old.sla_deadline = Some(now() - Duration::minutes(5));
        let mut fresh = fixtures::queue_item(2);
        fresh.entered_queue_at = now() - Duration::minutes(3);
        fresh.sla_deadline = None;

        slice.reduce(QueueAction::Loaded {
            items: vec![old, fresh],
            total: 2,
            now: now(),
        });

        // default is newest first
        assert_eq!(slice.items[0].id, 2);
        assert_eq!(slice.items[1].age_minutes, 1500);
        assert_eq!(slice.items[1].sla_status, SlaStatus::Overdue);

        let stats = slice.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.in_review, 0);
    }

    #[test]
    fn test_queue_sort_by_severity() {
        let mut slice = QueueSlice::default();
        let mut low = fixtures::queue_item(1);
        if let Some(a) = low.analysis.as_mut() {
            a.severity_assessment = Some(Severity::Low);
        }
        let critical = {
            let mut item = fixtures::queue_item(2);
            if let Some(a) = item.analysis.as_mut() {
                a.severity_assessment = Some(Severity::Critical);
            }
            item
        };
        slice.reduce(QueueAction::Loaded {
            items: vec![low, critical],
            total: 2,
            now: now(),
        });

        slice.reduce(QueueAction::SetSorting {
            sort_by: SortBy::Severity,
            sort_order: SortOrder::Desc,
        });
        assert_eq!(slice.items[0].id, 2);

        slice.reduce(QueueAction::SetSorting {
            sort_by: SortBy::Severity,
            sort_order: SortOrder::Asc,
        });
        assert_eq!(slice.items[0].id, 1);
    }

    #[test]
    fn test_queue_paging_and_filters() {
        let mut slice = QueueSlice::default();
        slice.reduce(QueueAction::Loaded {
            items: Vec::new(),
            total: 45,
            now: now(),
        });
        assert_eq!(slice.page_count(), 3);

        slice.reduce(QueueAction::SetPage(9));
        assert_eq!(slice.page, 3);

        slice.reduce(QueueAction::SetFilters(QueueFilters {
            status: Some(QueueStatus::Pending),
            ..Default::default()
        }));
        assert_eq!(slice.page, 1);
    }

    #[test]
    fn test_queue_status_update() {
        let mut slice = QueueSlice::default();
        slice.reduce(QueueAction::Loaded {
            items: vec![fixtures::queue_item(4)],
            total: 1,
            now: now(),
        });
        slice.reduce(QueueAction::UpdateStatus {
            id: 4,
            status: QueueStatus::Approved,
        });
        assert_eq!(slice.items[0].queue_status, QueueStatus::Approved);
    }

    #[test]
    fn test_analysis_slice_workflow() {
        let mut slice = AnalysisSlice::default();
        slice.reduce(AnalysisAction::Opened(fixtures::queue_item(3))).unwrap();
        slice.reduce(AnalysisAction::BeginEdit).unwrap();
        slice
            .reduce(AnalysisAction::EditField {
                field: AnalysisField::IssueType,
                value: "Deadlock".to_string(),
            })
            .unwrap();
        slice.reduce(AnalysisAction::CancelEdits).unwrap();

        let session = slice.session.as_ref().unwrap();
        assert_eq!(session.edited_analysis, session.current_analysis);
        assert!(!session.is_editing);
    }

    #[test]
    fn test_analysis_slice_reports_domain_errors() {
        let mut slice = AnalysisSlice::default();
        slice.reduce(AnalysisAction::Opened(fixtures::queue_item(3))).unwrap();
        assert!(slice.reduce(AnalysisAction::SetQualityRating(9)).is_err());
        assert_eq!(slice.session.as_ref().unwrap().quality_rating, 0);
    }

    #[test]
    fn test_cost_summary() {
        let mut slice = MonitoringSlice::default();
        let mut day1 = fixtures::cost("2024-03-01");
        day1.mtd_cost_usd = 1.5;
        let mut day2 = fixtures::cost("2024-03-02");
        day2.mtd_cost_usd = 3.25;
        slice.reduce(MonitoringAction::CostsLoaded(vec![day2, day1]));

        let summary = slice.cost_summary();
        assert_eq!(summary.analyses, 8);
        assert_eq!(summary.mtd_cost_usd, 3.25);
    }

    #[test]
    fn test_auth_expired_clears_user() {
        let mut store = Store::default();
        store.user.reduce(UserAction::Loaded(fixtures::user()));
        store.analysis.reduce(AnalysisAction::Opened(fixtures::queue_item(1))).unwrap();

        store.auth_expired();

        assert!(!store.user.is_authenticated);
        assert!(store.user.user.is_none());
        assert!(store.analysis.session.is_none());
    }
}
