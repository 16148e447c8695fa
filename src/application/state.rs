//! Application state management for the review desk consoles.
//!
//! This module contains the main application state, the console screens and
//! mode management for the terminal user interface. Network work is never
//! done here: actions queue [`Request`]s in an outbox that the event loop
//! hands to the dispatcher, and results come back through
//! [`App::apply_completion`].

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::requests::{Completion, ConnectionTarget, Outcome, Request, RequestKind};
use super::store::{
    AlertsAction, AnalysisAction, AuditAction, ConfigAction, MonitoringAction, QueueAction, Store,
    UserAction,
};
use crate::domain::{
    is_valid_section_json, AlertConfig, AnalysisField, DomainError, Priority, QueueFilters,
    QueueStatus, ReviewQueueItem, SystemConfig, MAX_QUALITY_RATING,
};
use crate::infrastructure::{
    ApiError, AuditQuery, MemoryTokenStore, QueueQuery, Settings, TokenStore,
};

/// Which of the two consoles is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Admin,
    Review,
}

impl Console {
    pub fn title(&self) -> &'static str {
        match self {
            Console::Admin => "Admin Panel",
            Console::Review => "Review Dashboard",
        }
    }

    /// Screens reachable with Tab, in order.
    pub fn screens(&self) -> &'static [Screen] {
        match self {
            Console::Admin => &[
                Screen::Dashboard,
                Screen::Configuration,
                Screen::Triggers,
                Screen::Monitoring,
                Screen::Logs,
                Screen::Alerts,
            ],
            Console::Review => &[Screen::Queue, Screen::Review],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Configuration,
    Triggers,
    Monitoring,
    Logs,
    Alerts,
    Queue,
    Review,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Configuration => "Configuration",
            Screen::Triggers => "Manual Triggers",
            Screen::Monitoring => "Monitoring",
            Screen::Logs => "Audit Logs",
            Screen::Alerts => "Alerts",
            Screen::Queue => "Review Queue",
            Screen::Review => "Analysis Review",
        }
    }
}

/// Which table has focus on screens that show two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Primary,
    Secondary,
}

/// Single-line prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    CustomerFilter,
    ConfigValue,
    JobId,
    GraphRagQuery,
    TicketIds,
    AuditEventType,
    GoToTicket,
    EditField(AnalysisField),
    ExportPath,
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::CustomerFilter => "Filter by customer",
            Prompt::ConfigValue => "New value",
            Prompt::JobId => "Job id",
            Prompt::GraphRagQuery => "GraphRAG test query",
            Prompt::TicketIds => "Ticket ids to re-analyze (comma separated)",
            Prompt::AuditEventType => "Filter by event type",
            Prompt::GoToTicket => "Open ticket",
            Prompt::EditField(field) => field.label(),
            Prompt::ExportPath => "Export to file",
        }
    }
}

/// Represents the current mode of the application.
///
/// The mode determines how key presses are interpreted and which popup,
/// if any, is drawn over the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation and screen shortcuts
    Normal,
    /// Help screen is displayed
    Help,
    /// A single-line prompt is open
    Input(Prompt),
    /// Approve dialog: rating and, while editing, notes
    Approve,
    /// Reject dialog: rejection reason
    Reject,
    /// Token prompt shown when no valid token is stored
    Login,
}

/// Actions on the triggers screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    FullIndexing,
    IncrementalIndexing,
    Reanalysis,
    SimilarityUpdate,
    TestSqlSentry,
    TestZendesk,
    TestOpenAi,
    TestGraphRag,
    JobStatus,
}

impl TriggerAction {
    pub const ALL: [TriggerAction; 9] = [
        TriggerAction::FullIndexing,
        TriggerAction::IncrementalIndexing,
        TriggerAction::Reanalysis,
        TriggerAction::SimilarityUpdate,
        TriggerAction::TestSqlSentry,
        TriggerAction::TestZendesk,
        TriggerAction::TestOpenAi,
        TriggerAction::TestGraphRag,
        TriggerAction::JobStatus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TriggerAction::FullIndexing => "Run full indexing",
            TriggerAction::IncrementalIndexing => "Run incremental indexing",
            TriggerAction::Reanalysis => "Re-analyze tickets",
            TriggerAction::SimilarityUpdate => "Update similarity index",
            TriggerAction::TestSqlSentry => "Test SQL Sentry connection",
            TriggerAction::TestZendesk => "Test Zendesk connection",
            TriggerAction::TestOpenAi => "Test OpenAI connection",
            TriggerAction::TestGraphRag => "Test GraphRAG query",
            TriggerAction::JobStatus => "Look up job status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// Look-back windows offered on the monitoring screen.
pub const METRICS_DAY_CHOICES: [u32; 3] = [7, 30, 90];

/// Page sizes offered on the queue screen.
pub const PAGE_SIZE_CHOICES: [u32; 4] = [10, 20, 50, 100];

const MAX_ACTIVITY_LINES: usize = 50;

/// Tunables taken from the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct AppOptions {
    pub refresh_interval_secs: u64,
    pub queue_page_size: u32,
    pub recent_jobs_limit: u32,
    pub metrics_days: u32,
    pub audit_limit: u32,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            refresh_interval_secs: settings.refresh_interval_secs,
            queue_page_size: settings.queue_page_size,
            recent_jobs_limit: settings.recent_jobs_limit,
            metrics_days: settings.metrics_days,
            audit_limit: settings.audit_limit,
        }
    }
}

impl AppOptions {
    fn refresh_interval(&self) -> Duration {
        Duration::seconds(self.refresh_interval_secs.clamp(1, 86_400) as i64)
    }
}

/// Main application state: the store plus everything the UI needs.
///
/// # Examples
///
/// ```
/// use reviewdesk::application::{App, AppMode, Screen};
///
/// let app = App::default();
/// assert_eq!(app.screen, Screen::Queue);
/// assert_eq!(app.mode, AppMode::Normal);
/// ```
#[derive(Debug)]
pub struct App {
    pub console: Console,
    pub screen: Screen,
    pub mode: AppMode,
    pub store: Store,
    pub options: AppOptions,
    /// Selected row in the focused table (or field while editing)
    pub selected_row: usize,
    pub pane: Pane,
    /// Scroll offset of the analysis display
    pub detail_scroll: u16,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Input buffer for prompts and dialogs
    pub input: String,
    /// Cursor position within the input buffer, in chars
    pub cursor_position: usize,
    pub status_message: Option<StatusMessage>,
    /// Trigger and connection-test results, newest first
    pub activity: Vec<StatusMessage>,
    pub should_quit: bool,
    tokens: Arc<dyn TokenStore>,
    outbox: Vec<Request>,
    last_poll: Option<DateTime<Utc>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(
            Console::Review,
            AppOptions::default(),
            Arc::new(MemoryTokenStore::new()),
        )
    }
}

impl App {
    /// Creates the state for one console, positioned on its first screen.
    ///
    /// Nothing is requested until [`App::start`] is called.
    ///
    /// # Arguments
    ///
    /// * `console` - Which console to run
    /// * `options` - Tunables taken from the settings file
    /// * `tokens` - Where the bearer token is read from and saved to
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use reviewdesk::application::{App, AppOptions, Console};
    /// use reviewdesk::infrastructure::MemoryTokenStore;
    ///
    /// let app = App::new(Console::Admin, AppOptions::default(), Arc::new(MemoryTokenStore::new()));
    /// assert!(!app.should_quit);
    /// ```
    pub fn new(console: Console, options: AppOptions, tokens: Arc<dyn TokenStore>) -> Self {
        let mut store = Store::default();
        store.queue.page_size = options.queue_page_size.max(1);
        Self {
            console,
            screen: console.screens()[0],
            mode: AppMode::Normal,
            store,
            options,
            selected_row: 0,
            pane: Pane::Primary,
            detail_scroll: 0,
            help_scroll: 0,
            input: String::new(),
            cursor_position: 0,
            status_message: None,
            activity: Vec::new(),
            should_quit: false,
            tokens,
            outbox: Vec::new(),
            last_poll: None,
        }
    }

    /// Loads the user and the first screen, or asks for a token first.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.tokens.load().is_none() {
            self.begin_login();
            return;
        }
        self.request(Request::LoadCurrentUser);
        self.enter_screen(self.screen, now);
    }

    // Outbox

    fn request(&mut self, request: Request) {
        let kind = request.kind();
        match kind {
            RequestKind::Configs => self.store.config.reduce(ConfigAction::SetLoading(true)),
            RequestKind::Health
            | RequestKind::RecentJobs
            | RequestKind::Job
            | RequestKind::GraphRag
            | RequestKind::Costs => self.store.monitoring.reduce(MonitoringAction::SetLoading(true)),
            RequestKind::AuditLogs => self.store.audit.reduce(AuditAction::SetLoading(true)),
            RequestKind::Alerts | RequestKind::AlertConfigs => {
                self.store.alerts.reduce(AlertsAction::SetLoading(true))
            }
            RequestKind::Queue => self.store.queue.reduce(QueueAction::SetLoading(true)),
            RequestKind::QueueItem | RequestKind::Decision | RequestKind::FindTicket => {
                // only flag changes, cannot fail
                let _ = self.store.analysis.reduce(AnalysisAction::SetLoading(true));
            }
            RequestKind::CurrentUser => self.store.user.reduce(UserAction::SetLoading(true)),
            _ => {}
        }
        debug!(?kind, "Queued request");
        self.outbox.push(request);
    }

    /// Hands queued requests to the caller.
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    // Status

    /// Replaces the message shown in the status bar.
    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            level,
            text: text.into(),
        });
    }

    fn report_error(&mut self, context: &str, error: &ApiError) {
        warn!(%error, "{context}");
        // the login prompt already tells the user what happened
        if *error != ApiError::Unauthorized {
            self.set_status(StatusLevel::Error, format!("{context}: {error}"));
        }
    }

    fn log_activity(&mut self, level: StatusLevel, text: String) {
        self.set_status(level, text.clone());
        self.activity.insert(0, StatusMessage { level, text });
        self.activity.truncate(MAX_ACTIVITY_LINES);
    }

    // Navigation

    /// Switches to `screen` and requests its data.
    ///
    /// Resets the selection, the focused pane and the analysis scroll.
    ///
    /// # Arguments
    ///
    /// * `screen` - Screen to show
    /// * `now` - Current time, used to schedule dashboard polling
    pub fn enter_screen(&mut self, screen: Screen, now: DateTime<Utc>) {
        self.screen = screen;
        self.selected_row = 0;
        self.pane = Pane::Primary;
        self.detail_scroll = 0;
        self.refresh_screen(now);
    }

    /// Moves to the next screen of the console, wrapping around.
    pub fn next_screen(&mut self, now: DateTime<Utc>) {
        self.cycle_screen(1, now);
    }

    /// Moves to the previous screen of the console, wrapping around.
    pub fn previous_screen(&mut self, now: DateTime<Utc>) {
        self.cycle_screen(-1, now);
    }

    fn cycle_screen(&mut self, step: isize, now: DateTime<Utc>) {
        let screens = self.console.screens();
        let current = screens.iter().position(|s| *s == self.screen).unwrap_or(0) as isize;
        let len = screens.len() as isize;
        let mut index = (current + step).rem_euclid(len) as usize;
        // the review screen is only reachable by opening an item
        if screens[index] == Screen::Review && self.store.analysis.session.is_none() {
            index = (index as isize + step).rem_euclid(len) as usize;
        }
        self.go_to_screen(screens[index], now);
    }

    /// Jumps to the n-th screen (0-based) of the console.
    pub fn select_screen(&mut self, index: usize, now: DateTime<Utc>) {
        if let Some(screen) = self.console.screens().get(index).copied() {
            if screen == Screen::Review && self.store.analysis.session.is_none() {
                self.set_status(StatusLevel::Info, "Open a queue item to review it");
                return;
            }
            self.go_to_screen(screen, now);
        }
    }

    fn go_to_screen(&mut self, screen: Screen, now: DateTime<Utc>) {
        if screen == self.screen {
            return;
        }
        if self.screen == Screen::Review && self.is_editing() {
            self.set_status(StatusLevel::Warning, "Approve or cancel your edits first");
            return;
        }
        self.enter_screen(screen, now);
    }

    /// Reloads whatever the current screen shows.
    pub fn refresh_screen(&mut self, now: DateTime<Utc>) {
        match self.screen {
            Screen::Dashboard => self.poll_dashboard(now),
            Screen::Configuration => self.request(Request::LoadConfigs {
                category: self.store.config.category.clone(),
            }),
            Screen::Triggers => {}
            Screen::Monitoring => {
                let days = self.options.metrics_days;
                self.request(Request::LoadGraphRagMetrics { days });
                self.request(Request::LoadCosts { days });
            }
            Screen::Logs => self.request(Request::LoadAuditLogs(AuditQuery {
                event_type: self.store.audit.event_type.clone(),
                limit: Some(self.options.audit_limit),
                ..Default::default()
            })),
            Screen::Alerts => {
                self.request(Request::LoadAlerts);
                self.request(Request::LoadAlertConfigs);
            }
            Screen::Queue => self.load_queue(),
            Screen::Review => {}
        }
    }

    fn poll_dashboard(&mut self, now: DateTime<Utc>) {
        self.last_poll = Some(now);
        self.request(Request::LoadHealth);
        self.request(Request::LoadRecentJobs {
            limit: self.options.recent_jobs_limit,
        });
    }

    fn load_queue(&mut self) {
        let queue = &self.store.queue;
        let query = QueueQuery {
            filters: queue.filters.clone(),
            page: Some(queue.page),
            page_size: Some(queue.page_size),
        };
        self.request(Request::LoadQueue(query));
    }

    /// Re-derives clock-based fields and polls the dashboard when due.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.store.queue.reduce(QueueAction::Tick(now));
        if let Some(session) = self.store.analysis.session.as_mut() {
            session.item.refresh_derived(now);
        }
        if self.screen == Screen::Dashboard && self.mode != AppMode::Login {
            let due = self
                .last_poll
                .map(|last| now - last >= self.options.refresh_interval())
                .unwrap_or(true);
            if due {
                debug!("Polling dashboard");
                self.poll_dashboard(now);
            }
        }
    }

    // Selection

    /// Number of selectable rows on the current screen.
    pub fn row_count(&self) -> usize {
        match (self.screen, self.pane) {
            (Screen::Dashboard, _) => self.store.monitoring.recent_jobs.len(),
            (Screen::Configuration, _) => self.store.config.configs.len(),
            (Screen::Triggers, _) => TriggerAction::ALL.len(),
            (Screen::Monitoring, Pane::Primary) => self.store.monitoring.graphrag_metrics.len(),
            (Screen::Monitoring, Pane::Secondary) => self.store.monitoring.cost_tracking.len(),
            (Screen::Logs, _) => self.store.audit.logs.len(),
            (Screen::Alerts, Pane::Primary) => self.store.alerts.alerts.len(),
            (Screen::Alerts, Pane::Secondary) => self.store.alerts.configs.len(),
            (Screen::Queue, _) => self.store.queue.items.len(),
            (Screen::Review, _) => {
                if self.is_editing() {
                    AnalysisField::ALL.len()
                } else {
                    0
                }
            }
        }
    }

    /// Moves the selected row by `delta`, clamped to the focused table.
    ///
    /// On the review screen outside edit mode there are no rows, so the
    /// analysis text scrolls instead.
    pub fn move_selection(&mut self, delta: isize) {
        let count = self.row_count();
        if count == 0 {
            if self.screen == Screen::Review {
                self.scroll_detail(delta);
            }
            self.selected_row = 0;
            return;
        }
        let next = self.selected_row as isize + delta;
        self.selected_row = next.clamp(0, count as isize - 1) as usize;
    }

    fn scroll_detail(&mut self, delta: isize) {
        let next = self.detail_scroll as isize + delta;
        self.detail_scroll = next.clamp(0, u16::MAX as isize) as u16;
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_row >= count {
            self.selected_row = count.saturating_sub(1);
        }
    }

    /// Moves focus between the two tables of the monitoring and alerts screens.
    pub fn toggle_pane(&mut self) {
        if matches!(self.screen, Screen::Monitoring | Screen::Alerts) {
            self.pane = match self.pane {
                Pane::Primary => Pane::Secondary,
                Pane::Secondary => Pane::Primary,
            };
            self.selected_row = 0;
        }
    }

    /// Queue item under the cursor.
    pub fn selected_queue_item(&self) -> Option<&ReviewQueueItem> {
        self.store.queue.items.get(self.selected_row)
    }

    pub fn selected_config(&self) -> Option<&SystemConfig> {
        self.store.config.configs.get(self.selected_row)
    }

    pub fn selected_trigger(&self) -> Option<TriggerAction> {
        TriggerAction::ALL.get(self.selected_row).copied()
    }

    /// Analysis field under the cursor in the edit form.
    pub fn selected_field(&self) -> Option<AnalysisField> {
        AnalysisField::ALL.get(self.selected_row).copied()
    }

    /// Ticket id of the selected queue item or the item under review.
    pub fn selected_ticket_id(&self) -> Option<String> {
        match self.screen {
            Screen::Queue => self.selected_queue_item().map(|i| i.ticket_id.clone()),
            Screen::Review => self
                .store
                .analysis
                .session
                .as_ref()
                .map(|s| s.item.ticket_id.clone()),
            _ => None,
        }
    }

    /// True while the open analysis is in edit mode.
    pub fn is_editing(&self) -> bool {
        self.store
            .analysis
            .session
            .as_ref()
            .is_some_and(|s| s.is_editing)
    }

    // Prompt input

    fn open_prompt(&mut self, prompt: Prompt, initial: String) {
        self.mode = AppMode::Input(prompt);
        self.cursor_position = initial.chars().count();
        self.input = initial;
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Inserts a character at the cursor.
    pub fn input_insert(&mut self, c: char) {
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Deletes the character before the cursor.
    pub fn input_backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index();
            self.input.remove(index);
        }
    }

    pub fn input_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn input_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count());
    }

    fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    /// Closes any prompt or dialog without acting on it.
    pub fn cancel_input(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Acts on the open prompt. Export is handled by the caller, which owns
    /// the table layout.
    pub fn submit_prompt(&mut self, now: DateTime<Utc>) {
        let AppMode::Input(prompt) = self.mode else {
            return;
        };
        let value = self.input.trim().to_string();
        let non_empty = (!value.is_empty()).then(|| value.clone());

        match prompt {
            Prompt::CustomerFilter => {
                let mut filters = self.store.queue.filters.clone();
                filters.customer = non_empty;
                self.apply_queue_filters(filters);
            }
            Prompt::ConfigValue => {
                let Some(id) = self.store.config.selected_id else {
                    self.cancel_input();
                    return;
                };
                self.request(Request::UpdateConfig { id, value });
            }
            Prompt::JobId => match non_empty {
                Some(job_id) => self.request(Request::LoadJob { job_id }),
                None => return self.set_status(StatusLevel::Warning, "Enter a job id"),
            },
            Prompt::GraphRagQuery => match non_empty {
                Some(query) => {
                    self.request(Request::TestConnection(ConnectionTarget::GraphRag { query }))
                }
                None => return self.set_status(StatusLevel::Warning, "Enter a test query"),
            },
            Prompt::TicketIds => {
                let ticket_ids = parse_ticket_ids(&value);
                if ticket_ids.is_empty() {
                    return self.set_status(StatusLevel::Warning, "Enter at least one ticket id");
                }
                self.request(Request::TriggerAnalysis { ticket_ids });
            }
            Prompt::AuditEventType => {
                self.store.audit.reduce(AuditAction::SetEventType(non_empty));
                self.selected_row = 0;
                self.refresh_screen(now);
            }
            Prompt::GoToTicket => match non_empty {
                Some(ticket_id) => self.request(Request::FindTicket { ticket_id }),
                None => return self.set_status(StatusLevel::Warning, "Enter a ticket id"),
            },
            Prompt::EditField(field) => {
                // keep the prompt open on invalid input so it can be fixed
                let raw = self.input.clone();
                match self
                    .store
                    .analysis
                    .reduce(AnalysisAction::EditField { field, value: raw.clone() })
                {
                    Ok(()) if field.is_json() && !is_valid_section_json(&raw) => {
                        self.set_status(
                            StatusLevel::Warning,
                            format!("{} is not valid JSON and will not be displayed", field.label()),
                        );
                    }
                    Ok(()) => self.set_status(StatusLevel::Info, format!("{} updated", field.label())),
                    Err(e) => return self.set_status(StatusLevel::Warning, e.to_string()),
                }
            }
            Prompt::ExportPath => {}
        }
        self.cancel_input();
    }

    // Queue screen

    fn apply_queue_filters(&mut self, filters: QueueFilters) {
        self.store.queue.reduce(QueueAction::SetFilters(filters));
        self.selected_row = 0;
        self.load_queue();
    }

    /// Steps the status filter through every queue status, then back to
    /// all statuses, and reloads the queue.
    pub fn cycle_status_filter(&mut self) {
        let mut filters = self.store.queue.filters.clone();
        filters.status = cycle_option(&QueueStatus::ALL, filters.status);
        self.apply_queue_filters(filters);
    }

    /// Steps the priority filter the same way as the status filter.
    pub fn cycle_priority_filter(&mut self) {
        let mut filters = self.store.queue.filters.clone();
        filters.priority = cycle_option(&Priority::ALL, filters.priority);
        self.apply_queue_filters(filters);
    }

    /// Opens the customer filter prompt with the current filter.
    pub fn start_customer_filter(&mut self) {
        let current = self.store.queue.filters.customer.clone().unwrap_or_default();
        self.open_prompt(Prompt::CustomerFilter, current);
    }

    /// Drops every queue filter and reloads.
    pub fn clear_queue_filters(&mut self) {
        self.apply_queue_filters(QueueFilters::default());
    }

    /// Sorts the loaded page by the next column. No request is made.
    pub fn cycle_sort(&mut self) {
        let queue = &self.store.queue;
        let action = QueueAction::SetSorting {
            sort_by: queue.sort_by.next(),
            sort_order: queue.sort_order,
        };
        self.store.queue.reduce(action);
    }

    pub fn toggle_sort_order(&mut self) {
        let queue = &self.store.queue;
        let action = QueueAction::SetSorting {
            sort_by: queue.sort_by,
            sort_order: queue.sort_order.toggled(),
        };
        self.store.queue.reduce(action);
    }

    /// Moves `delta` pages forward or back and reloads the queue.
    ///
    /// The page is clamped to the available pages; when it does not change
    /// no request is made.
    ///
    /// # Arguments
    ///
    /// * `delta` - Pages to move, negative to go back
    pub fn change_page(&mut self, delta: i64) {
        let current = self.store.queue.page;
        let target = (i64::from(current) + delta).clamp(1, i64::from(u32::MAX)) as u32;
        self.store.queue.reduce(QueueAction::SetPage(target));
        if self.store.queue.page != current {
            self.selected_row = 0;
            self.load_queue();
        }
    }

    /// Switches to the next larger entry of [`PAGE_SIZE_CHOICES`],
    /// wrapping to the smallest, and reloads the queue.
    pub fn cycle_page_size(&mut self) {
        let current = self.store.queue.page_size;
        let next = PAGE_SIZE_CHOICES
            .iter()
            .copied()
            .find(|size| *size > current)
            .unwrap_or(PAGE_SIZE_CHOICES[0]);
        self.store.queue.reduce(QueueAction::SetPageSize(next));
        self.selected_row = 0;
        self.load_queue();
    }

    /// Requests the selected queue item so it can be reviewed.
    ///
    /// The review screen is entered once the item arrives.
    pub fn open_selected_item(&mut self) {
        match self.selected_queue_item() {
            Some(item) => {
                let id = item.id;
                self.request(Request::OpenQueueItem { id });
            }
            None => self.set_status(StatusLevel::Info, "No queue item selected"),
        }
    }

    /// Opens the prompt for jumping to a ticket id.
    pub fn start_go_to_ticket(&mut self) {
        self.open_prompt(Prompt::GoToTicket, String::new());
    }

    // Review screen

    /// Puts the open analysis into edit mode.
    ///
    /// Decided items cannot be edited; the refusal is shown as a warning.
    pub fn begin_edit(&mut self) {
        match self.store.analysis.reduce(AnalysisAction::BeginEdit) {
            Ok(()) if self.store.analysis.session.is_some() => {
                self.selected_row = 0;
                self.set_status(StatusLevel::Info, "Editing analysis");
            }
            Ok(()) => {}
            Err(e) => self.set_status(StatusLevel::Warning, e.to_string()),
        }
    }

    /// Leaves edit mode and discards every field change.
    pub fn cancel_edits(&mut self) {
        if self.is_editing() {
            let _ = self.store.analysis.reduce(AnalysisAction::CancelEdits);
            self.selected_row = 0;
            self.set_status(StatusLevel::Info, "Edits discarded");
        }
    }

    /// Opens the prompt for the selected field, prefilled with its
    /// current edited value. Does nothing outside edit mode.
    pub fn edit_selected_field(&mut self) {
        let Some(field) = self.selected_field() else {
            return;
        };
        let Some(session) = self.store.analysis.session.as_ref() else {
            return;
        };
        if !session.is_editing {
            return;
        }
        let text = session.edited_analysis.field_text(field);
        self.open_prompt(Prompt::EditField(field), text);
    }

    /// Closes the analysis and returns to the queue.
    ///
    /// Refused while editing so changes are not lost silently.
    pub fn back_to_queue(&mut self, now: DateTime<Utc>) {
        if self.is_editing() {
            self.set_status(StatusLevel::Warning, "Approve or cancel your edits first");
            return;
        }
        let _ = self.store.analysis.reduce(AnalysisAction::Closed);
        self.enter_screen(Screen::Queue, now);
    }

    /// True from the moment a decision is queued until its completion
    /// arrives, and while the analysis itself is still loading.
    pub fn decision_pending(&self) -> bool {
        self.store.analysis.loading
            || self
                .outbox
                .iter()
                .any(|r| matches!(r, Request::SubmitDecision(_)))
    }

    fn warn_decision_pending(&mut self) {
        self.set_status(
            StatusLevel::Warning,
            "Waiting for the previous request on this item to finish",
        );
    }

    /// Opens the approve dialog for the current analysis.
    ///
    /// Refused with a warning when the item is already approved or rejected,
    /// or while another decision for it is still in flight.
    pub fn begin_approve(&mut self) {
        if self.decision_pending() {
            return self.warn_decision_pending();
        }
        let Some(session) = self.store.analysis.session.as_ref() else {
            return;
        };
        if session.status().is_terminal() {
            let message = DomainError::AlreadyFinalized(session.status()).to_string();
            return self.set_status(StatusLevel::Warning, message);
        }
        let notes = session.edit_notes.clone();
        self.mode = AppMode::Approve;
        self.cursor_position = notes.chars().count();
        self.input = notes;
    }

    /// Changes the quality rating by `delta` within `0..=MAX_QUALITY_RATING`.
    pub fn adjust_rating(&mut self, delta: i8) {
        let Some(session) = self.store.analysis.session.as_ref() else {
            return;
        };
        let rating = (session.quality_rating as i8 + delta).clamp(0, MAX_QUALITY_RATING as i8) as u8;
        let _ = self
            .store
            .analysis
            .reduce(AnalysisAction::SetQualityRating(rating));
    }

    /// Queues the approval built from the dialog.
    ///
    /// While editing, the dialog input becomes the edit notes and the edited
    /// analysis is sent along. Otherwise only the quality rating is sent.
    pub fn confirm_approve(&mut self) {
        if self.decision_pending() {
            self.cancel_input();
            return self.warn_decision_pending();
        }
        if self.is_editing() {
            let notes = self.input.trim().to_string();
            let _ = self.store.analysis.reduce(AnalysisAction::SetEditNotes(notes));
        }
        let Some(session) = self.store.analysis.session.as_ref() else {
            return self.cancel_input();
        };
        match session.approve() {
            Ok(decision) => {
                info!(queue_id = decision.queue_id(), "Submitting approval");
                self.request(Request::SubmitDecision(decision));
                self.set_status(StatusLevel::Info, "Submitting approval...");
                self.cancel_input();
            }
            Err(e) => self.set_status(StatusLevel::Warning, e.to_string()),
        }
    }

    /// Opens the reject dialog, prefilled with any reason typed earlier.
    pub fn begin_reject(&mut self) {
        if self.decision_pending() {
            return self.warn_decision_pending();
        }
        let Some(session) = self.store.analysis.session.as_ref() else {
            return;
        };
        if session.status().is_terminal() {
            let message = DomainError::AlreadyFinalized(session.status()).to_string();
            return self.set_status(StatusLevel::Warning, message);
        }
        let reason = session.rejection_reason.clone();
        self.mode = AppMode::Reject;
        self.cursor_position = reason.chars().count();
        self.input = reason;
    }

    /// Sends the rejection. A blank reason only raises a warning.
    pub fn confirm_reject(&mut self) {
        if self.decision_pending() {
            self.cancel_input();
            return self.warn_decision_pending();
        }
        let reason = self.input.clone();
        let _ = self
            .store
            .analysis
            .reduce(AnalysisAction::SetRejectionReason(reason));
        let Some(session) = self.store.analysis.session.as_ref() else {
            return self.cancel_input();
        };
        match session.reject() {
            Ok(decision) => {
                info!(queue_id = decision.queue_id(), "Submitting rejection");
                self.request(Request::SubmitDecision(decision));
                self.set_status(StatusLevel::Info, "Submitting rejection...");
                self.cancel_input();
            }
            Err(e) => self.set_status(StatusLevel::Warning, e.to_string()),
        }
    }

    // Configuration screen

    /// Opens the value prompt for the selected setting.
    ///
    /// Secret settings start with an empty input.
    pub fn start_config_edit(&mut self) {
        let Some(config) = self.selected_config() else {
            return;
        };
        let id = config.id;
        // secrets start blank rather than showing the stored value
        let initial = if config.is_secret {
            String::new()
        } else {
            config.config_value.clone().unwrap_or_default()
        };
        self.store.config.reduce(ConfigAction::Select(Some(id)));
        self.open_prompt(Prompt::ConfigValue, initial);
    }

    /// Steps the category filter through every category seen, then back to
    /// all categories.
    pub fn cycle_config_category(&mut self, now: DateTime<Utc>) {
        let next = self.store.config.next_category();
        self.store.config.reduce(ConfigAction::SetCategory(next));
        self.selected_row = 0;
        self.refresh_screen(now);
    }

    // Alerts screen

    /// Acknowledges the selected alert. Only applies to the alerts pane.
    pub fn acknowledge_selected_alert(&mut self) {
        if self.pane != Pane::Primary {
            return;
        }
        let Some(alert) = self.store.alerts.alerts.get(self.selected_row) else {
            return;
        };
        if alert.acknowledged {
            return self.set_status(StatusLevel::Info, "Alert already acknowledged");
        }
        let id = alert.id;
        self.request(Request::AcknowledgeAlert { id });
    }

    /// Enables or disables the selected alert rule.
    pub fn toggle_selected_alert_config(&mut self) {
        if self.pane != Pane::Secondary {
            return;
        }
        let Some(config) = self.store.alerts.configs.get(self.selected_row) else {
            return;
        };
        let updated = AlertConfig {
            enabled: !config.enabled,
            ..config.clone()
        };
        self.request(Request::UpdateAlertConfig(updated));
    }

    // Triggers screen

    /// Runs the selected trigger or connection test.
    ///
    /// Actions that need an argument (ticket ids, a GraphRAG query or a job
    /// id) open a prompt first.
    pub fn run_selected_trigger(&mut self) {
        let Some(action) = self.selected_trigger() else {
            return;
        };
        match action {
            TriggerAction::FullIndexing => self.request(Request::TriggerIndexing { full: true }),
            TriggerAction::IncrementalIndexing => {
                self.request(Request::TriggerIndexing { full: false })
            }
            TriggerAction::Reanalysis => self.open_prompt(Prompt::TicketIds, String::new()),
            TriggerAction::SimilarityUpdate => self.request(Request::TriggerSimilarityUpdate),
            TriggerAction::TestSqlSentry => {
                self.request(Request::TestConnection(ConnectionTarget::SqlSentry))
            }
            TriggerAction::TestZendesk => {
                self.request(Request::TestConnection(ConnectionTarget::Zendesk))
            }
            TriggerAction::TestOpenAi => {
                self.request(Request::TestConnection(ConnectionTarget::OpenAi))
            }
            TriggerAction::TestGraphRag => self.open_prompt(Prompt::GraphRagQuery, String::new()),
            TriggerAction::JobStatus => self.open_prompt(Prompt::JobId, String::new()),
        }
        if self.mode == AppMode::Normal {
            self.set_status(StatusLevel::Info, format!("{}...", action.label()));
        }
    }

    // Monitoring and logs screens

    /// Steps through [`METRICS_DAY_CHOICES`] and reloads the metrics.
    pub fn cycle_metrics_days(&mut self, now: DateTime<Utc>) {
        let index = METRICS_DAY_CHOICES
            .iter()
            .position(|d| *d == self.options.metrics_days);
        self.options.metrics_days = match index {
            Some(i) => METRICS_DAY_CHOICES[(i + 1) % METRICS_DAY_CHOICES.len()],
            None => METRICS_DAY_CHOICES[0],
        };
        self.refresh_screen(now);
    }

    /// Opens the audit log event type prompt.
    pub fn start_event_type_filter(&mut self) {
        let current = self.store.audit.event_type.clone().unwrap_or_default();
        self.open_prompt(Prompt::AuditEventType, current);
    }

    // Export

    /// Base name for an export of the focused table, if it has one.
    pub fn export_stem(&self) -> Option<&'static str> {
        match (self.screen, self.pane) {
            (Screen::Dashboard, _) => Some("recent-jobs"),
            (Screen::Configuration, _) => Some("system-config"),
            (Screen::Triggers, _) => None,
            (Screen::Monitoring, Pane::Primary) => Some("graphrag-metrics"),
            (Screen::Monitoring, Pane::Secondary) => Some("cost-tracking"),
            (Screen::Logs, _) => Some("audit-log"),
            (Screen::Alerts, Pane::Primary) => Some("alerts"),
            (Screen::Alerts, Pane::Secondary) => Some("alert-config"),
            (Screen::Queue, _) => Some("review-queue"),
            (Screen::Review, _) => self.store.analysis.session.as_ref().map(|_| "analysis"),
        }
    }

    /// Opens the export prompt prefilled with `default_path`.
    pub fn start_export(&mut self, default_path: PathBuf) {
        self.open_prompt(Prompt::ExportPath, default_path.display().to_string());
    }

    /// Path typed into the export prompt.
    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(self.input.trim())
    }

    /// Processes the result of an export.
    ///
    /// Sets the status message and closes the prompt.
    ///
    /// # Arguments
    ///
    /// * `result` - Written path, or the error message
    pub fn set_export_result(&mut self, result: Result<PathBuf, String>) {
        match result {
            Ok(path) => self.set_status(
                StatusLevel::Success,
                format!("Exported to {}", path.display()),
            ),
            Err(error) => self.set_status(StatusLevel::Error, format!("Export failed: {error}")),
        }
        self.cancel_input();
    }

    /// Reports whether copying `ticket_id` to the clipboard worked.
    pub fn set_copy_result(&mut self, ticket_id: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.set_status(StatusLevel::Success, format!("Copied {ticket_id}")),
            Err(error) => self.set_status(StatusLevel::Error, error),
        }
    }

    // Authentication

    /// Opens the token prompt with an empty input.
    pub fn begin_login(&mut self) {
        self.mode = AppMode::Login;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Stores the typed token and reloads the current screen.
    pub fn submit_login(&mut self, now: DateTime<Utc>) {
        let token = self.input.trim().to_string();
        if token.is_empty() {
            return self.set_status(StatusLevel::Warning, "Token must not be empty");
        }
        if let Err(e) = self.tokens.save(&token) {
            return self.set_status(StatusLevel::Error, format!("Failed to store token: {e}"));
        }
        info!("Token stored");
        self.take_input();
        self.mode = AppMode::Normal;
        self.set_status(StatusLevel::Success, "Token saved");
        self.start(now);
    }

    /// Closes the token prompt without storing anything.
    pub fn skip_login(&mut self) {
        self.cancel_input();
        self.set_status(StatusLevel::Warning, "No token stored, requests may be rejected");
    }

    /// Called when the backend rejected the token. The client has already
    /// cleared it; drop session state and ask for a new one.
    pub fn handle_auth_expired(&mut self) {
        warn!("Authentication expired");
        self.store.auth_expired();
        if self.screen == Screen::Review {
            self.screen = Screen::Queue;
            self.selected_row = 0;
        }
        self.begin_login();
        self.set_status(StatusLevel::Warning, ApiError::Unauthorized.to_string());
    }

    // Help

    /// Shows the help popup scrolled to the top.
    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    // Completions

    /// Reduces one finished request into the store.
    pub fn apply_completion(&mut self, completion: Completion, now: DateTime<Utc>) {
        debug!(kind = ?completion.kind, seq = completion.seq, "Applying completion");
        match completion.outcome {
            Outcome::Configs(result) => match result {
                Ok(configs) => self.store.config.reduce(ConfigAction::Loaded(configs)),
                Err(e) => {
                    self.store.config.reduce(ConfigAction::SetError(Some(e.to_string())));
                    self.report_error("Failed to load configuration", &e);
                }
            },
            Outcome::ConfigUpdated { id, value, result } => match result {
                Ok(()) => {
                    self.store.config.reduce(ConfigAction::Updated { id, value });
                    self.set_status(StatusLevel::Success, "Configuration updated");
                }
                Err(e) => self.report_error("Failed to update configuration", &e),
            },
            Outcome::Health(result) => match result {
                Ok(health) => self
                    .store
                    .monitoring
                    .reduce(MonitoringAction::HealthLoaded(health, now)),
                Err(e) => self.monitoring_failed("Failed to load system health", e),
            },
            Outcome::RecentJobs(result) => match result {
                Ok(jobs) => self.store.monitoring.reduce(MonitoringAction::RecentJobsLoaded(jobs)),
                Err(e) => self.monitoring_failed("Failed to load recent jobs", e),
            },
            Outcome::Job(result) => match result {
                Ok(job) => {
                    let text = format!("Job {}: {}", job.job_id, job.status);
                    self.store.monitoring.reduce(MonitoringAction::JobLoaded(job));
                    self.log_activity(StatusLevel::Info, text);
                }
                Err(e) => self.monitoring_failed("Failed to look up job", e),
            },
            Outcome::GraphRag(result) => match result {
                Ok(metrics) => self.store.monitoring.reduce(MonitoringAction::GraphRagLoaded(metrics)),
                Err(e) => self.monitoring_failed("Failed to load GraphRAG metrics", e),
            },
            Outcome::Costs(result) => match result {
                Ok(costs) => self.store.monitoring.reduce(MonitoringAction::CostsLoaded(costs)),
                Err(e) => self.monitoring_failed("Failed to load cost tracking", e),
            },
            Outcome::Triggered { trigger, result } => match result {
                Ok(response) => self.log_activity(
                    StatusLevel::Success,
                    format!("{} started (job {})", trigger.label(), response.job_id),
                ),
                Err(e) => {
                    self.report_error(&format!("{} failed", trigger.label()), &e);
                    if e != ApiError::Unauthorized {
                        self.log_activity(StatusLevel::Error, format!("{} failed: {e}", trigger.label()));
                    }
                }
            },
            Outcome::ConnectionTested { target, result } => match result {
                Ok(test) => {
                    let level = if test.success {
                        StatusLevel::Success
                    } else {
                        StatusLevel::Warning
                    };
                    self.log_activity(level, format!("{}: {}", target.label(), test.summary()));
                }
                Err(e) => {
                    self.report_error(&format!("{} test failed", target.label()), &e);
                    if e != ApiError::Unauthorized {
                        self.log_activity(
                            StatusLevel::Error,
                            format!("{} test failed: {e}", target.label()),
                        );
                    }
                }
            },
            Outcome::AuditLogs(result) => match result {
                Ok(logs) => self.store.audit.reduce(AuditAction::Loaded(logs)),
                Err(e) => {
                    self.store.audit.reduce(AuditAction::SetError(Some(e.to_string())));
                    self.report_error("Failed to load audit logs", &e);
                }
            },
            Outcome::Alerts(result) => match result {
                Ok(alerts) => self.store.alerts.reduce(AlertsAction::Loaded(alerts)),
                Err(e) => self.alerts_failed("Failed to load alerts", e),
            },
            Outcome::AlertAcknowledged { id, result } => match result {
                Ok(()) => {
                    self.store.alerts.reduce(AlertsAction::Acknowledged { id, at: now });
                    self.set_status(StatusLevel::Success, "Alert acknowledged");
                }
                Err(e) => self.report_error("Failed to acknowledge alert", &e),
            },
            Outcome::AlertConfigs(result) => match result {
                Ok(configs) => self.store.alerts.reduce(AlertsAction::ConfigsLoaded(configs)),
                Err(e) => self.alerts_failed("Failed to load alert configuration", e),
            },
            Outcome::AlertConfigUpdated { config, result } => match result {
                Ok(()) => {
                    let state = if config.enabled { "enabled" } else { "disabled" };
                    let text = format!("Alert {} {state}", config.alert_type);
                    self.store.alerts.reduce(AlertsAction::ConfigUpdated(config));
                    self.set_status(StatusLevel::Success, text);
                }
                Err(e) => self.report_error("Failed to update alert configuration", &e),
            },
            Outcome::Queue(result) => match result {
                Ok(page) => self.store.queue.reduce(QueueAction::Loaded {
                    items: page.items,
                    total: page.total,
                    now,
                }),
                Err(e) => {
                    self.store.queue.reduce(QueueAction::SetError(Some(e.to_string())));
                    self.report_error("Failed to load review queue", &e);
                }
            },
            Outcome::QueueItem(result) => match result {
                Ok(mut item) => {
                    item.refresh_derived(now);
                    let id = item.id;
                    match self.store.analysis.reduce(AnalysisAction::Opened(item)) {
                        Ok(()) => {
                            info!(queue_id = id, "Opened queue item for review");
                            self.screen = Screen::Review;
                            self.selected_row = 0;
                            self.detail_scroll = 0;
                        }
                        Err(e) => {
                            let _ = self
                                .store
                                .analysis
                                .reduce(AnalysisAction::SetError(Some(e.to_string())));
                            self.set_status(StatusLevel::Warning, e.to_string());
                        }
                    }
                }
                Err(e) => self.analysis_failed("Failed to load queue item", e),
            },
            Outcome::DecisionSubmitted { decision, result } => match result {
                Ok(()) => {
                    info!(queue_id = decision.queue_id(), "Review decision accepted");
                    self.store.queue.reduce(QueueAction::UpdateStatus {
                        id: decision.queue_id(),
                        status: decision.resulting_status(),
                    });
                    let message = decision.success_message();
                    if let Err(e) = self
                        .store
                        .analysis
                        .reduce(AnalysisAction::Completed(decision))
                    {
                        warn!(error = %e, "Decision accepted for an already finalized session");
                    }
                    let _ = self.store.analysis.reduce(AnalysisAction::Closed);
                    let _ = self.store.analysis.reduce(AnalysisAction::SetLoading(false));
                    if self.screen == Screen::Review {
                        self.enter_screen(Screen::Queue, now);
                    }
                    self.set_status(StatusLevel::Success, message);
                }
                Err(e) => self.analysis_failed("Failed to submit review", e),
            },
            Outcome::TicketFound { ticket_id, result } => match result {
                Ok(analysis) => {
                    let _ = self.store.analysis.reduce(AnalysisAction::SetLoading(false));
                    let item = self
                        .store
                        .queue
                        .items
                        .iter()
                        .find(|i| i.analysis_id == analysis.id || i.ticket_id == ticket_id);
                    match item {
                        Some(item) => {
                            let id = item.id;
                            self.request(Request::OpenQueueItem { id });
                        }
                        None => self.set_status(
                            StatusLevel::Warning,
                            format!("Ticket {ticket_id} is not on the current queue page"),
                        ),
                    }
                }
                Err(e) => self.analysis_failed(&format!("Failed to find ticket {ticket_id}"), e),
            },
            Outcome::CurrentUser(result) => match result {
                Ok(user) => self.store.user.reduce(UserAction::Loaded(user)),
                Err(e) => {
                    self.store.user.reduce(UserAction::SetError(Some(e.to_string())));
                    self.report_error("Failed to load user", &e);
                }
            },
        }
        self.clamp_selection();
    }

    fn monitoring_failed(&mut self, context: &str, error: ApiError) {
        self.store
            .monitoring
            .reduce(MonitoringAction::SetError(Some(error.to_string())));
        self.report_error(context, &error);
    }

    fn alerts_failed(&mut self, context: &str, error: ApiError) {
        self.store
            .alerts
            .reduce(AlertsAction::SetError(Some(error.to_string())));
        self.report_error(context, &error);
    }

    fn analysis_failed(&mut self, context: &str, error: ApiError) {
        let _ = self
            .store
            .analysis
            .reduce(AnalysisAction::SetError(Some(error.to_string())));
        self.report_error(context, &error);
    }

    /// Sort label for the queue header, e.g. `date desc`.
    pub fn sort_label(&self) -> String {
        let queue = &self.store.queue;
        format!("{} {}", queue.sort_by.label(), queue.sort_order.label())
    }
}

/// Next value in `all` after `current`; `None` follows the last value.
fn cycle_option<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => all
            .iter()
            .position(|v| *v == value)
            .and_then(|i| all.get(i + 1).copied()),
    }
}

fn parse_ticket_ids(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
