//! Table layouts shared by the screens and the CSV export.
//!
//! Every table is built once as plain strings so that what is exported is
//! exactly what is on screen.

use chrono::{DateTime, Utc};
use ratatui::layout::Constraint;
use ratatui::style::{Color, Style};

use crate::application::{App, AlertsSlice, AuditSlice, ConfigSlice, MonitoringSlice, Pane, QueueSlice, Screen};
use crate::domain::{AlertSeverity, JobStatus, Priority, SlaStatus};

/// One rendered table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub widths: Vec<Constraint>,
    pub rows: Vec<Vec<String>>,
    /// Per-row style, same length as `rows`.
    pub styles: Vec<Style>,
    /// Last load error of the slice the rows came from.
    pub error: Option<String>,
}

impl TableData {
    fn new(title: impl Into<String>, columns: &[(&'static str, Constraint)]) -> Self {
        Self {
            title: title.into(),
            headers: columns.iter().map(|(h, _)| *h).collect(),
            widths: columns.iter().map(|(_, w)| *w).collect(),
            rows: Vec::new(),
            styles: Vec::new(),
            error: None,
        }
    }

    fn with_error(mut self, error: &Option<String>) -> Self {
        self.error = error.clone();
        self
    }

    fn push(&mut self, row: Vec<String>, style: Style) {
        self.rows.push(row);
        self.styles.push(style);
    }

    pub fn header_strings(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_string()).collect()
    }
}

/// The table the selection and export apply to, if the screen has one.
pub fn focused_table(app: &App) -> Option<TableData> {
    let store = &app.store;
    match (app.screen, app.pane) {
        (Screen::Dashboard, _) => Some(recent_jobs_table(&store.monitoring)),
        (Screen::Configuration, _) => Some(config_table(&store.config)),
        (Screen::Monitoring, Pane::Primary) => Some(graphrag_table(&store.monitoring)),
        (Screen::Monitoring, Pane::Secondary) => Some(cost_table(&store.monitoring)),
        (Screen::Logs, _) => Some(audit_table(&store.audit)),
        (Screen::Alerts, Pane::Primary) => Some(alerts_table(&store.alerts)),
        (Screen::Alerts, Pane::Secondary) => Some(alert_config_table(&store.alerts)),
        (Screen::Queue, _) => Some(queue_table(&store.queue)),
        (Screen::Triggers, _) | (Screen::Review, _) => None,
    }
}

pub fn recent_jobs_table(monitoring: &MonitoringSlice) -> TableData {
    let mut table = TableData::new(
        "Recent Jobs",
        &[
            ("Job ID", Constraint::Length(14)),
            ("Type", Constraint::Length(14)),
            ("Status", Constraint::Length(10)),
            ("Started", Constraint::Length(16)),
            ("Duration", Constraint::Length(9)),
            ("Items", Constraint::Length(7)),
            ("Error", Constraint::Min(10)),
        ],
    );
    for job in &monitoring.recent_jobs {
        table.push(
            vec![
                job.job_id.clone(),
                job.job_type.clone(),
                job.status.to_string(),
                format_time(job.started_at),
                job.duration_seconds
                    .map(|s| format!("{s:.1}s"))
                    .unwrap_or_default(),
                opt(job.items_processed),
                job.error_message.clone().unwrap_or_default(),
            ],
            Style::default().fg(job_status_color(job.status)),
        );
    }
    table.with_error(&monitoring.error)
}

pub fn config_table(config: &ConfigSlice) -> TableData {
    let title = match &config.category {
        Some(category) => format!("System Configuration [{category}]"),
        None => "System Configuration [all]".to_string(),
    };
    let mut table = TableData::new(
        title,
        &[
            ("Category", Constraint::Length(14)),
            ("Key", Constraint::Length(26)),
            ("Value", Constraint::Min(16)),
            ("Type", Constraint::Length(8)),
            ("Description", Constraint::Min(16)),
            ("Updated By", Constraint::Length(12)),
            ("Updated", Constraint::Length(16)),
        ],
    );
    for c in &config.configs {
        let style = if c.is_secret {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        table.push(
            vec![
                c.category.clone(),
                c.config_key.clone(),
                c.display_value(),
                c.data_type.clone(),
                c.description.clone().unwrap_or_default(),
                c.updated_by.clone().unwrap_or_default(),
                format_time(c.updated_at),
            ],
            style,
        );
    }
    table.with_error(&config.error)
}

pub fn graphrag_table(monitoring: &MonitoringSlice) -> TableData {
    let mut table = TableData::new(
        "GraphRAG Performance",
        &[
            ("Sync", Constraint::Length(12)),
            ("Status", Constraint::Length(10)),
            ("Tickets", Constraint::Length(8)),
            ("Embeddings", Constraint::Length(10)),
            ("Relations", Constraint::Length(10)),
            ("Entities", Constraint::Length(9)),
            ("Total", Constraint::Length(9)),
            ("Per Ticket", Constraint::Length(10)),
            ("Errors", Constraint::Length(7)),
            ("Started", Constraint::Min(16)),
        ],
    );
    for m in &monitoring.graphrag_metrics {
        let style = if m.errors_count.unwrap_or(0) > 0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        table.push(
            vec![
                m.sync_type.clone(),
                m.status.clone(),
                opt(m.tickets_indexed),
                opt(m.embeddings_generated),
                opt(m.relationships_created),
                opt(m.entities_extracted),
                m.total_time_ms.map(format_ms).unwrap_or_default(),
                m.avg_time_per_ticket_ms
                    .map(|ms| format!("{ms:.0}ms"))
                    .unwrap_or_default(),
                opt(m.errors_count),
                format_time(m.started_at),
            ],
            style,
        );
    }
    table.with_error(&monitoring.error)
}

pub fn cost_table(monitoring: &MonitoringSlice) -> TableData {
    let mut table = TableData::new(
        "Cost Tracking",
        &[
            ("Date", Constraint::Length(12)),
            ("Analyses", Constraint::Length(9)),
            ("Input Tokens", Constraint::Length(13)),
            ("Output Tokens", Constraint::Length(13)),
            ("Total Tokens", Constraint::Length(13)),
            ("Cost (USD)", Constraint::Length(11)),
            ("Per Analysis", Constraint::Length(12)),
            ("MTD (USD)", Constraint::Min(10)),
        ],
    );
    for c in &monitoring.cost_tracking {
        table.push(
            vec![
                c.cost_date.clone(),
                c.analyses_count.to_string(),
                c.total_input_tokens.to_string(),
                c.total_output_tokens.to_string(),
                c.total_tokens.to_string(),
                format!("{:.2}", c.estimated_openai_cost_usd),
                format!("{:.4}", c.cost_per_analysis_usd),
                format!("{:.2}", c.mtd_cost_usd),
            ],
            Style::default(),
        );
    }
    table.with_error(&monitoring.error)
}

pub fn audit_table(audit: &AuditSlice) -> TableData {
    let title = match &audit.event_type {
        Some(event_type) => format!("Audit Log [{event_type}]"),
        None => "Audit Log".to_string(),
    };
    let mut table = TableData::new(
        title,
        &[
            ("Time", Constraint::Length(16)),
            ("Event", Constraint::Length(16)),
            ("Action", Constraint::Length(10)),
            ("Entity", Constraint::Length(18)),
            ("User", Constraint::Length(16)),
            ("Role", Constraint::Length(11)),
            ("Description", Constraint::Min(20)),
        ],
    );
    for log in &audit.logs {
        let entity = match (&log.entity_type, &log.entity_id) {
            (Some(t), Some(id)) => format!("{t} {id}"),
            (Some(t), None) => t.clone(),
            (None, Some(id)) => id.clone(),
            (None, None) => String::new(),
        };
        table.push(
            vec![
                format_time(log.created_at),
                log.event_type.clone(),
                log.action.clone(),
                entity,
                log.user_name.clone(),
                log.user_role.clone().unwrap_or_default(),
                log.change_description.clone().unwrap_or_default(),
            ],
            Style::default(),
        );
    }
    table.with_error(&audit.error)
}

pub fn alerts_table(alerts: &AlertsSlice) -> TableData {
    let mut table = TableData::new(
        format!("Alerts ({} unacknowledged)", alerts.unacknowledged_count),
        &[
            ("Time", Constraint::Length(16)),
            ("Severity", Constraint::Length(9)),
            ("Type", Constraint::Length(18)),
            ("Source", Constraint::Length(14)),
            ("Message", Constraint::Min(20)),
            ("Ack", Constraint::Length(12)),
        ],
    );
    for alert in &alerts.alerts {
        let ack = if alert.acknowledged {
            alert.acknowledged_by.clone().unwrap_or_else(|| "yes".to_string())
        } else {
            String::new()
        };
        let mut style = Style::default().fg(alert_severity_color(alert.severity));
        if alert.acknowledged {
            style = style.fg(Color::DarkGray);
        }
        table.push(
            vec![
                format_time(alert.created_at),
                alert.severity.to_string(),
                alert.alert_type.clone(),
                alert.source.clone(),
                alert.message.clone(),
                ack,
            ],
            style,
        );
    }
    table.with_error(&alerts.error)
}

pub fn alert_config_table(alerts: &AlertsSlice) -> TableData {
    let mut table = TableData::new(
        "Alert Configuration",
        &[
            ("Type", Constraint::Length(20)),
            ("Enabled", Constraint::Length(8)),
            ("Threshold", Constraint::Length(10)),
            ("Email", Constraint::Min(16)),
            ("Slack", Constraint::Length(6)),
            ("SMS", Constraint::Min(10)),
        ],
    );
    for config in &alerts.configs {
        let style = if config.enabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        table.push(
            vec![
                config.alert_type.clone(),
                if config.enabled { "yes" } else { "no" }.to_string(),
                config.threshold.map(|t| t.to_string()).unwrap_or_default(),
                config
                    .email_recipients
                    .as_ref()
                    .map(|r| r.join(", "))
                    .unwrap_or_default(),
                if config.slack_webhook.is_some() { "yes" } else { "" }.to_string(),
                config
                    .sms_recipients
                    .as_ref()
                    .map(|r| r.join(", "))
                    .unwrap_or_default(),
            ],
            style,
        );
    }
    table.with_error(&alerts.error)
}

pub fn queue_table(queue: &QueueSlice) -> TableData {
    let mut table = TableData::new(
        format!(
            "Review Queue (page {}/{}, {} total)",
            queue.page,
            queue.page_count(),
            queue.total
        ),
        &[
            ("Ticket", Constraint::Length(12)),
            ("Customer", Constraint::Length(18)),
            ("Issue Type", Constraint::Min(14)),
            ("Severity", Constraint::Length(9)),
            ("Confidence", Constraint::Length(10)),
            ("Status", Constraint::Length(10)),
            ("Priority", Constraint::Length(8)),
            ("SLA", Constraint::Length(9)),
            ("Age", Constraint::Length(5)),
        ],
    );
    for item in &queue.items {
        let analysis = item.analysis.as_ref();
        table.push(
            vec![
                item.ticket_id.clone(),
                item.customer_name().unwrap_or_default().to_string(),
                analysis
                    .and_then(|a| a.issue_type.clone())
                    .unwrap_or_default(),
                item.severity().map(|s| s.to_string()).unwrap_or_default(),
                item.confidence_score()
                    .map(|s| format!("{s:.0}%"))
                    .unwrap_or_default(),
                item.queue_status.to_string(),
                item.priority.to_string(),
                item.sla_status.to_string(),
                format_age(item.age_minutes),
            ],
            Style::default().fg(sla_color(item.sla_status)),
        );
    }
    table.with_error(&queue.error)
}

/// `45m`, `3h`, `2d`.
pub fn format_age(minutes: i64) -> String {
    match minutes {
        m if m < 60 => format!("{m}m"),
        m if m < 1440 => format!("{}h", m / 60),
        m => format!("{}d", m / 1440),
    }
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_ms(ms: i64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

fn opt(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn sla_color(status: SlaStatus) -> Color {
    match status {
        SlaStatus::Overdue => Color::Red,
        SlaStatus::DueSoon => Color::Yellow,
        SlaStatus::OnTime => Color::Reset,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => Color::Red,
        Priority::High => Color::LightRed,
        Priority::Normal | Priority::Low => Color::Reset,
    }
}

pub fn job_status_color(status: JobStatus) -> Color {
    match status {
        JobStatus::Completed => Color::Green,
        JobStatus::Failed => Color::Red,
        JobStatus::Running => Color::Cyan,
        JobStatus::Pending => Color::Reset,
    }
}

pub fn alert_severity_color(severity: AlertSeverity) -> Color {
    match severity {
        AlertSeverity::Critical => Color::LightRed,
        AlertSeverity::Error => Color::Red,
        AlertSeverity::Warning => Color::Yellow,
        AlertSeverity::Info => Color::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{MonitoringAction, QueueAction};
    use crate::domain::models::fixtures;
    use chrono::TimeZone;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(0), "0m");
        assert_eq!(format_age(59), "59m");
        assert_eq!(format_age(60), "1h");
        assert_eq!(format_age(1439), "23h");
        assert_eq!(format_age(1500), "1d");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(850), "850ms");
        assert_eq!(format_ms(1830), "1.8s");
    }

    #[test]
    fn test_queue_table_rows_match_headers() {
        let mut queue = QueueSlice::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 31, 0).unwrap();
        queue.reduce(QueueAction::Loaded {
            items: vec![fixtures::queue_item(1), fixtures::queue_item(2)],
            total: 2,
            now,
        });

        let table = queue_table(&queue);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.styles.len(), 2);
        assert!(table.rows.iter().all(|r| r.len() == table.headers.len()));
        assert_eq!(table.headers.len(), table.widths.len());

        let row = &table.rows[0];
        assert_eq!(row[1], "Contoso");
        assert_eq!(row[4], "88%");
        assert_eq!(row[8], "3h");
        assert!(table.title.contains("page 1/1"));
    }

    #[test]
    fn test_secret_config_values_are_masked() {
        let mut config = ConfigSlice::default();
        let mut secret = fixtures::system_config(1, "OpenAI", "ApiKey");
        secret.is_secret = true;
        secret.config_value = Some("sk-live".to_string());
        config.configs.push(secret);

        let table = config_table(&config);
        assert_eq!(table.rows[0][2], "********");
        assert!(!table.rows[0].iter().any(|cell| cell.contains("sk-live")));
    }

    #[test]
    fn test_recent_jobs_table() {
        let mut monitoring = MonitoringSlice::default();
        monitoring.reduce(MonitoringAction::RecentJobsLoaded(vec![fixtures::job(
            "job-1",
            JobStatus::Failed,
        )]));

        let table = recent_jobs_table(&monitoring);
        assert_eq!(table.rows[0][0], "job-1");
        assert_eq!(table.rows[0][2], "failed");
        assert_eq!(table.rows[0][4], "12.5s");
        assert_eq!(table.styles[0], Style::default().fg(Color::Red));
    }

    #[test]
    fn test_load_error_follows_slice() {
        let mut queue = QueueSlice::default();
        queue.reduce(QueueAction::SetError(Some("HTTP 500: boom".to_string())));
        assert_eq!(queue_table(&queue).error.as_deref(), Some("HTTP 500: boom"));

        queue.reduce(QueueAction::Loaded {
            items: vec![fixtures::queue_item(1)],
            total: 1,
            now: Utc::now(),
        });
        assert!(queue_table(&queue).error.is_none());
    }

    #[test]
    fn test_focused_table_follows_pane() {
        let mut app = App::default();
        app.screen = Screen::Monitoring;
        assert_eq!(focused_table(&app).unwrap().title, "GraphRAG Performance");
        app.toggle_pane();
        assert_eq!(focused_table(&app).unwrap().title, "Cost Tracking");
        app.screen = Screen::Triggers;
        assert!(focused_table(&app).is_none());
    }
}
