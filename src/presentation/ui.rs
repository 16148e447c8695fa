use crate::application::{
    App, AppMode, Console, Pane, Prompt, Screen, StatusLevel, TriggerAction, METRICS_DAY_CHOICES,
};
use crate::domain::{
    AnalysisField, AnalysisSections, ReviewSession, SystemHealthMetrics, MAX_QUALITY_RATING,
};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use super::columns::{self, format_age, format_ms, format_time, TableData};

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    match app.screen {
        Screen::Dashboard => render_dashboard(f, app, chunks[2]),
        Screen::Configuration => {
            render_table(f, &columns::config_table(&app.store.config), app.selected_row, true, chunks[2])
        }
        Screen::Triggers => render_triggers(f, app, chunks[2]),
        Screen::Monitoring => render_monitoring(f, app, chunks[2]),
        Screen::Logs => {
            render_table(f, &columns::audit_table(&app.store.audit), app.selected_row, true, chunks[2])
        }
        Screen::Alerts => render_alerts(f, app, chunks[2]),
        Screen::Queue => render_queue(f, app, chunks[2]),
        Screen::Review => render_review(f, app, chunks[2]),
    }
    render_status_bar(f, app, chunks[3]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.console, app.help_scroll),
        AppMode::Input(prompt) => render_prompt(f, app, prompt),
        AppMode::Approve => render_approve_dialog(f, app),
        AppMode::Reject => render_reject_dialog(f, app),
        AppMode::Login => render_login_dialog(f, app),
        AppMode::Normal => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let user = match &app.store.user.user {
        Some(user) => format!("{} ({})", user.user_name, user.role),
        None => "not signed in".to_string(),
    };
    let loading = if is_loading(app) { " | loading..." } else { "" };
    let header = Paragraph::new(format!(
        "reviewdesk - {} | {} | {}{}",
        app.console.title(),
        app.screen.title(),
        user,
        loading
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn is_loading(app: &App) -> bool {
    let store = &app.store;
    store.config.loading
        || store.monitoring.loading
        || store.alerts.loading
        || store.audit.loading
        || store.queue.loading
        || store.analysis.loading
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let screens = app.console.screens();
    let titles: Vec<String> = screens
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i + 1, s.title()))
        .collect();
    let selected = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

/// Draws `table` with the row at `selected` highlighted when `focused`.
fn render_table(f: &mut Frame, table: &TableData, selected: usize, focused: bool, area: Rect) {
    let header = Row::new(
        table
            .headers
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
    )
    .height(1);

    let rows: Vec<Row> = table
        .rows
        .iter()
        .zip(&table.styles)
        .map(|(cells, style)| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))).style(*style))
        .collect();

    let (title, border_style) = match &table.error {
        Some(error) => (
            format!("{} - {}", table.title, error),
            Style::default().fg(Color::Red),
        ),
        None if focused => (table.title.clone(), Style::default().fg(Color::Cyan)),
        None => (table.title.clone(), Style::default()),
    };
    let widget = Table::new(rows, table.widths.clone())
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    let mut state = TableState::default();
    if focused && !table.rows.is_empty() {
        state.select(Some(selected.min(table.rows.len() - 1)));
    }
    f.render_stateful_widget(widget, area, &mut state);
}

// Admin screens

fn render_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let monitoring = &app.store.monitoring;
    let health = monitoring.health.clone().unwrap_or_default();
    let banner = health.has_high_error_rate();

    let mut constraints = vec![Constraint::Length(7)];
    if banner {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(chunks[0]);

    f.render_widget(card("Last 24 Hours", activity_lines(&health)), cards[0]);
    f.render_widget(card("Jobs (7 days)", job_lines(&health)), cards[1]);
    f.render_widget(
        card("Services", service_lines(&health, monitoring.last_refreshed)),
        cards[2],
    );

    let mut next = 1;
    if banner {
        let text = format!(
            "High error rate: {} errors in the last 24 hours",
            health.total_errors_24h.unwrap_or(0)
        );
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::White).bg(Color::Red)),
            chunks[1],
        );
        next = 2;
    }

    render_table(
        f,
        &columns::recent_jobs_table(monitoring),
        app.selected_row,
        true,
        chunks[next],
    );
}

fn card<'a>(title: &'a str, lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title))
}

fn stat<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<18}"), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn count(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// `12/14 (86%)`
fn success_ratio(success: Option<i64>, failed: Option<i64>) -> String {
    let ok = success.unwrap_or(0);
    let total = ok + failed.unwrap_or(0);
    if total == 0 {
        return "-".to_string();
    }
    format!("{ok}/{total} ({:.0}%)", ok as f64 * 100.0 / total as f64)
}

fn activity_lines(health: &SystemHealthMetrics) -> Vec<Line<'static>> {
    vec![
        stat("Analyses", count(health.total_analyses_24h)),
        stat("Approved", count(health.approved_analyses_24h)),
        stat("Rejected", count(health.rejected_analyses_24h)),
        stat(
            "Avg confidence",
            health
                .avg_confidence_score_24h
                .map(|c| format!("{c:.1}%"))
                .unwrap_or_else(|| "-".to_string()),
        ),
        stat(
            "Avg processing",
            health
                .avg_processing_time_ms_24h
                .map(|ms| format_ms(ms.round() as i64))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]
}

fn job_lines(health: &SystemHealthMetrics) -> Vec<Line<'static>> {
    vec![
        stat(
            "Indexing success",
            success_ratio(health.indexing_jobs_success_7d, health.indexing_jobs_failed_7d),
        ),
        stat(
            "Analysis success",
            success_ratio(health.analysis_jobs_success_7d, health.analysis_jobs_failed_7d),
        ),
        stat("Pending reviews", count(health.pending_reviews)),
        stat("In review", count(health.in_review)),
        stat("Overdue reviews", count(health.overdue_reviews)),
    ]
}

fn service_lines(
    health: &SystemHealthMetrics,
    refreshed: Option<DateTime<Utc>>,
) -> Vec<Line<'static>> {
    let last = |at: Option<DateTime<Utc>>| at.map(format_time).unwrap_or_else(|| "never".to_string());
    let service = |failed: Option<i64>| {
        if failed.unwrap_or(0) > 0 {
            Span::styled("degraded", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("ok", Style::default().fg(Color::Green))
        }
    };
    vec![
        Line::from(vec![
            Span::styled(format!("{:<18}", "Indexing"), Style::default().fg(Color::Gray)),
            service(health.indexing_jobs_failed_7d),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<18}", "Analysis"), Style::default().fg(Color::Gray)),
            service(health.analysis_jobs_failed_7d),
        ]),
        stat("Last indexing", last(health.last_indexing_run)),
        stat("Last analysis", last(health.last_analysis_run)),
        stat("Refreshed", last(refreshed)),
    ]
}

fn render_triggers(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(area);

    let mut table = TableData {
        title: "Manual Triggers".to_string(),
        headers: vec!["Action"],
        widths: vec![Constraint::Min(20)],
        rows: Vec::new(),
        styles: Vec::new(),
        error: None,
    };
    for action in TriggerAction::ALL {
        table.rows.push(vec![action.label().to_string()]);
        table.styles.push(Style::default());
    }
    render_table(f, &table, app.selected_row, true, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(chunks[1]);

    let job_lines: Vec<Line> = match &app.store.monitoring.job_lookup {
        Some(job) => vec![
            stat("Job", job.job_id.clone()),
            stat("Type", job.job_type.clone()),
            Line::from(vec![
                Span::styled(format!("{:<18}", "Status"), Style::default().fg(Color::Gray)),
                Span::styled(
                    job.status.to_string(),
                    Style::default().fg(columns::job_status_color(job.status)),
                ),
            ]),
            stat("Started", format_time(job.started_at)),
            stat(
                "Error",
                job.error_message.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ],
        None => vec![Line::from("Select \"Look up job status\" and enter a job id")],
    };
    f.render_widget(card("Job Status", job_lines), right[0]);

    let activity: Vec<Line> = app
        .activity
        .iter()
        .map(|m| Line::styled(m.text.clone(), Style::default().fg(level_color(m.level))))
        .collect();
    f.render_widget(
        Paragraph::new(activity)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Activity")),
        right[1],
    );
}

fn render_monitoring(f: &mut Frame, app: &App, area: Rect) {
    let monitoring = &app.store.monitoring;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let mut graphrag = columns::graphrag_table(monitoring);
    graphrag.title = format!("{} (last {} days)", graphrag.title, app.options.metrics_days);
    render_table(f, &graphrag, app.selected_row, app.pane == Pane::Primary, chunks[0]);

    let mut costs = columns::cost_table(monitoring);
    costs.title = format!("{} (last {} days)", costs.title, app.options.metrics_days);
    render_table(f, &costs, app.selected_row, app.pane == Pane::Secondary, chunks[1]);

    let summary = monitoring.cost_summary();
    let choices = METRICS_DAY_CHOICES.map(|d| d.to_string()).join("/");
    f.render_widget(
        Paragraph::new(format!(
            "Analyses: {} | Tokens: {} | MTD cost: ${:.2} | window {choices} days (d)",
            summary.analyses, summary.tokens, summary.mtd_cost_usd
        ))
        .style(Style::default().fg(Color::Cyan)),
        chunks[2],
    );
}

fn render_alerts(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Min(0)])
        .split(area);
    render_table(
        f,
        &columns::alerts_table(&app.store.alerts),
        app.selected_row,
        app.pane == Pane::Primary,
        chunks[0],
    );
    render_table(
        f,
        &columns::alert_config_table(&app.store.alerts),
        app.selected_row,
        app.pane == Pane::Secondary,
        chunks[1],
    );
}

// Review screens

fn render_queue(f: &mut Frame, app: &App, area: Rect) {
    let queue = &app.store.queue;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let stats = queue.stats();
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(chunks[0]);
    let cards_data = [
        ("Total in Queue", stats.total, Color::White),
        ("Overdue", stats.overdue, Color::Red),
        ("Pending", stats.pending, Color::Blue),
        ("In Review", stats.in_review, Color::Green),
    ];
    for (i, (title, value, color)) in cards_data.into_iter().enumerate() {
        f.render_widget(
            Paragraph::new(value.to_string())
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .block(Block::default().borders(Borders::ALL).title(title)),
            cards[i],
        );
    }

    let filters = &queue.filters;
    let filter_line = format!(
        "Status: {} | Priority: {} | Customer: {} | Sort: {} | Page size: {}",
        filters.status.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string()),
        filters.priority.map(|p| p.to_string()).unwrap_or_else(|| "all".to_string()),
        filters.customer.as_deref().unwrap_or("all"),
        app.sort_label(),
        queue.page_size,
    );
    f.render_widget(
        Paragraph::new(filter_line).style(Style::default().fg(Color::Gray)),
        chunks[1],
    );

    render_table(f, &columns::queue_table(queue), app.selected_row, true, chunks[2]);
}

fn render_review(f: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.store.analysis.session.as_ref() else {
        f.render_widget(
            Paragraph::new("No analysis loaded. Press Esc to return to the queue.")
                .block(Block::default().borders(Borders::ALL).title("Analysis Review")),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);
    render_review_header(f, session, chunks[0]);

    if session.is_editing {
        render_edit_form(f, app, session, chunks[1]);
    } else {
        let lines = analysis_lines(session);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((app.detail_scroll, 0))
                .block(Block::default().borders(Borders::ALL).title("Analysis")),
            chunks[1],
        );
    }
}

fn render_review_header(f: &mut Frame, session: &ReviewSession, area: Rect) {
    let item = &session.item;
    let analysis = &session.current_analysis;
    let rating = if session.quality_rating > 0 {
        stars(session.quality_rating)
    } else {
        "-".to_string()
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{}  ", item.ticket_id),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("Status: {}  ", item.queue_status)),
            Span::styled(
                format!("Priority: {}  ", item.priority),
                Style::default().fg(columns::priority_color(item.priority)),
            ),
            Span::styled(
                format!("SLA: {}  ", item.sla_status),
                Style::default().fg(columns::sla_color(item.sla_status)),
            ),
            Span::raw(format!("Age: {}", format_age(item.age_minutes))),
        ]),
        Line::from(format!(
            "Customer: {}  Servers: {}  Databases: {}",
            analysis.customer_name.as_deref().unwrap_or("-"),
            analysis.server_names.as_deref().unwrap_or("-"),
            analysis.database_names.as_deref().unwrap_or("-"),
        )),
        Line::from(format!(
            "Confidence: {} ({})  Severity: {}  Issue: {}",
            analysis.confidence_level,
            analysis
                .confidence_score
                .map(|s| format!("{s:.1}%"))
                .unwrap_or_else(|| "-".to_string()),
            analysis
                .severity_assessment
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            analysis.issue_type.as_deref().unwrap_or("-"),
        )),
        Line::from(format!(
            "Analyzed: {}  Tokens: {}  Processing: {}  Rating: {}",
            format_time(analysis.analysis_timestamp),
            analysis
                .total_tokens
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            analysis
                .processing_time_ms
                .map(format_ms)
                .unwrap_or_else(|| "-".to_string()),
            rating,
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Ticket")),
        area,
    );
}

fn heading(text: &str) -> Line<'static> {
    Line::styled(
        text.to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )
}

fn bullet(text: impl Into<String>) -> Line<'static> {
    Line::from(format!("  • {}", text.into()))
}

/// Summary plus every section that parsed.
fn analysis_lines(session: &ReviewSession) -> Vec<Line<'static>> {
    let analysis = &session.current_analysis;
    let sections = AnalysisSections::parse(analysis);
    let mut lines = vec![heading("Executive Summary")];
    lines.push(Line::from(
        analysis
            .executive_summary
            .clone()
            .unwrap_or_else(|| "No summary".to_string()),
    ));

    if let Some(symptoms) = sections.symptoms {
        lines.push(Line::default());
        lines.push(heading("Symptom Analysis"));
        lines.push(bullet(format!("Issue type: {}", symptoms.issue_type)));
        lines.push(bullet(format!("Severity: {}", symptoms.severity_assessment)));
        if !symptoms.affected_components.is_empty() {
            lines.push(bullet(format!(
                "Affected: {}",
                symptoms.affected_components.join(", ")
            )));
        }
    }
    if let Some(correlations) = sections.correlations {
        lines.push(Line::default());
        lines.push(heading("Data Correlations"));
        for c in correlations {
            lines.push(bullet(format!(
                "{}: {} (baseline {}, {})",
                c.metric, c.observation, c.baseline, c.significance
            )));
        }
    }
    if let Some(root_cause) = sections.root_cause {
        lines.push(Line::default());
        lines.push(heading("Root Cause Analysis"));
        lines.push(bullet(format!("Primary cause: {}", root_cause.primary_cause)));
        for factor in root_cause.contributing_factors {
            lines.push(bullet(format!("Contributing: {factor}")));
        }
        for evidence in root_cause.evidence {
            lines.push(bullet(format!("Evidence: {evidence}")));
        }
    }
    if let Some(remediation) = sections.remediation {
        lines.push(Line::default());
        lines.push(heading("Immediate Remediation"));
        for (i, step) in remediation.steps.iter().enumerate() {
            lines.push(Line::from(format!(
                "  {}. {} [risk: {}]",
                i + 1,
                step.action,
                step.risk_level
            )));
        }
        if !remediation.estimated_impact.is_empty() {
            lines.push(bullet(format!(
                "Estimated impact: {}",
                remediation.estimated_impact
            )));
        }
    }
    if let Some(prevention) = sections.prevention {
        lines.push(Line::default());
        lines.push(heading("Prevention Recommendations"));
        for r in prevention.short_term {
            lines.push(bullet(format!("Short term: {r}")));
        }
        for r in prevention.long_term {
            lines.push(bullet(format!("Long term: {r}")));
        }
    }
    if let Some(similar) = sections.similar_tickets {
        lines.push(Line::default());
        lines.push(heading("Similar Tickets"));
        for t in similar {
            lines.push(bullet(format!(
                "{} ({}): {}",
                t.ticket_id, t.relevance, t.resolution
            )));
        }
    }
    lines
}

fn render_edit_form(f: &mut Frame, app: &App, session: &ReviewSession, area: Rect) {
    let mut table = TableData {
        title: "Edit Analysis (Enter: edit field, a: approve, Esc: cancel edits)".to_string(),
        headers: vec!["Field", "Value"],
        widths: vec![Constraint::Length(34), Constraint::Min(20)],
        rows: Vec::new(),
        styles: Vec::new(),
        error: None,
    };
    for field in AnalysisField::ALL {
        let value = session.edited_analysis.field_text(field);
        let changed = value != session.current_analysis.field_text(field);
        let style = if changed {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        table.rows.push(vec![field.label().to_string(), value.replace('\n', " ")]);
        table.styles.push(style);
    }
    render_table(f, &table, app.selected_row, true, area);
}

fn stars(rating: u8) -> String {
    (1..=MAX_QUALITY_RATING)
        .map(|i| if i <= rating { '★' } else { '☆' })
        .collect()
}

// Status bar and popups

fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::Cyan,
        StatusLevel::Success => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    }
}

fn key_hints(app: &App) -> &'static str {
    match app.screen {
        Screen::Dashboard => "r: refresh | Ctrl+E: export | Tab: next screen | ?: help | q: quit",
        Screen::Configuration => "Enter: edit value | c: category | r: refresh | Ctrl+E: export | ?: help",
        Screen::Triggers => "Enter: run | Tab: next screen | ?: help | q: quit",
        Screen::Monitoring => "d: days | ←→: switch table | r: refresh | Ctrl+E: export | ?: help",
        Screen::Logs => "f: event type | r: refresh | Ctrl+E: export | ?: help",
        Screen::Alerts => "a: acknowledge | Space: toggle config | ←→: switch table | ?: help",
        Screen::Queue => "Enter: review | s/p/c: filters | o/O: sort | n/b: page | g: ticket | y: copy | ?: help",
        Screen::Review => {
            if app.is_editing() {
                "Enter: edit field | a: approve | Esc: cancel edits | ?: help"
            } else {
                "e: edit | a: approve | x: reject | y: copy | Esc: back | Ctrl+E: save JSON | ?: help"
            }
        }
    }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match (&app.status_message, app.mode) {
        (_, AppMode::Help) => (
            "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
            Style::default().fg(Color::Cyan),
        ),
        (Some(status), _) => (
            status.text.clone(),
            Style::default().fg(level_color(status.level)),
        ),
        (None, _) => (key_hints(app).to_string(), Style::default()),
    };
    let bar = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(bar, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Input line with a block cursor at `cursor` (in chars).
fn input_line(input: &str, cursor: usize, masked: bool) -> Line<'static> {
    let shown: String = if masked {
        "•".repeat(input.chars().count())
    } else {
        input.to_string()
    };
    let before: String = shown.chars().take(cursor).collect();
    let at: String = shown.chars().nth(cursor).map(String::from).unwrap_or_else(|| " ".to_string());
    let after: String = shown.chars().skip(cursor + 1).collect();
    Line::from(vec![
        Span::raw(before),
        Span::styled(at, Style::default().bg(Color::White).fg(Color::Black)),
        Span::raw(after),
    ])
}

fn render_prompt(f: &mut Frame, app: &App, prompt: Prompt) {
    let area = centered(f.area(), f.area().width * 3 / 4, 5);
    f.render_widget(Clear, area);
    let hint = match prompt {
        Prompt::EditField(field) if field.is_json() => "Enter: apply (JSON) | Esc: cancel",
        Prompt::ExportPath => "Enter: write file | Esc: cancel",
        _ => "Enter: apply | Esc: cancel",
    };
    let lines = vec![
        input_line(&app.input, app.cursor_position, false),
        Line::default(),
        Line::styled(hint, Style::default().fg(Color::Gray)),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.title())
                .style(Style::default().fg(Color::Yellow)),
        ),
        area,
    );
}

fn render_approve_dialog(f: &mut Frame, app: &App) {
    let Some(session) = app.store.analysis.session.as_ref() else {
        return;
    };
    let area = centered(f.area(), 64, if session.is_editing { 9 } else { 7 });
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!("Approve analysis for {}?", session.item.ticket_id)),
        Line::from(vec![
            Span::raw("Quality rating: "),
            Span::styled(stars(session.quality_rating), Style::default().fg(Color::Yellow)),
            Span::styled("  (←/→)", Style::default().fg(Color::Gray)),
        ]),
    ];
    if session.is_editing {
        lines.push(Line::from("Edit notes:"));
        lines.push(input_line(&app.input, app.cursor_position, false));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        "Enter: approve | Esc: cancel",
        Style::default().fg(Color::Gray),
    ));

    let title = if session.is_editing {
        "Update and Approve"
    } else {
        "Approve"
    };
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(Color::Green)),
        ),
        area,
    );
}

fn render_reject_dialog(f: &mut Frame, app: &App) {
    let ticket = app
        .store
        .analysis
        .session
        .as_ref()
        .map(|s| s.item.ticket_id.clone())
        .unwrap_or_default();
    let area = centered(f.area(), 64, 7);
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(format!("Reject analysis for {ticket}. Reason:")),
        input_line(&app.input, app.cursor_position, false),
        Line::default(),
        Line::styled("Enter: reject | Esc: cancel", Style::default().fg(Color::Gray)),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Reject")
                .style(Style::default().fg(Color::Red)),
        ),
        area,
    );
}

fn render_login_dialog(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 64, 7);
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from("Paste a bearer token to sign in:"),
        input_line(&app.input, app.cursor_position, true),
        Line::default(),
        Line::styled(
            "Enter: save token | Esc: continue without",
            Style::default().fg(Color::Gray),
        ),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Sign In")
                .style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

fn render_help_popup(f: &mut Frame, console: Console, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text(console);
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    "{} Help (Line {}/{})",
                    console.title(),
                    start_line + 1,
                    help_lines.len()
                ))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

/// Number of lines in the help text, for scroll clamping.
pub fn help_line_count(console: Console) -> usize {
    get_help_text(console).lines().count()
}

fn get_help_text(console: Console) -> String {
    let screens = match console {
        Console::Admin => ADMIN_HELP,
        Console::Review => REVIEW_HELP,
    };
    format!("{COMMON_HELP}\n{screens}")
}

const COMMON_HELP: &str = r#"=== NAVIGATION ===
Tab / Shift+Tab   Next / previous screen
1-6               Jump to screen
↑↓ or j/k         Move selection
PgUp/PgDn         Move selection by 10
r                 Reload the current screen
Ctrl+E            Export the focused table to CSV (analysis to JSON)
L                 Enter a new bearer token
F1 or ?           Show this help
q / Ctrl+C        Quit

=== PROMPTS ===
Enter             Apply
Esc               Cancel
←→                Move cursor
Backspace         Delete before cursor
"#;

const ADMIN_HELP: &str = r#"=== DASHBOARD ===
Health for the last 24 hours and 7 days, refreshed every 30 seconds.
A red banner appears when more than 10 errors were logged in 24 hours.

=== CONFIGURATION ===
Enter / e         Edit the selected value (secrets start blank)
c                 Cycle the category filter

=== MANUAL TRIGGERS ===
Enter             Run the selected action
                  Re-analysis asks for ticket ids (comma separated)
                  and always forces a new analysis

=== MONITORING ===
d                 Cycle the window (7 / 30 / 90 days)
←→ or h/l         Switch between GraphRAG and cost tables

=== AUDIT LOGS ===
f                 Filter by event type (empty clears)

=== ALERTS ===
a                 Acknowledge the selected alert
Space / e         Enable or disable the selected alert rule
←→ or h/l         Switch between alerts and alert rules
"#;

const REVIEW_HELP: &str = r#"=== REVIEW QUEUE ===
Enter             Review the selected item
s / p             Cycle status / priority filter
c                 Filter by customer (empty clears)
x                 Clear all filters
o / O             Cycle sort field / flip sort order
n / b             Next / previous page
z                 Cycle page size
g                 Open a ticket by id
y                 Copy the ticket id

=== ANALYSIS REVIEW ===
e                 Start editing the analysis
Enter             Edit the selected field (while editing)
a                 Approve; while editing, approve with your changes
x                 Reject (a reason is required)
y                 Copy the ticket id
Esc / b           Cancel edits, or go back to the queue
↑↓                Scroll the analysis

Approved and rejected items cannot be reopened.
"#;
