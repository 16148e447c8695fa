use crate::application::{App, AppMode, Prompt, Screen, StatusLevel};
use crate::infrastructure::{clipboard, FileRepository};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyModifiers};
use std::path::PathBuf;
use tracing::info;

use super::columns;
use super::ui::help_line_count;

const PAGE_STEP: isize = 10;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            app.should_quit = true;
            return;
        }
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::Input(prompt) => Self::handle_prompt_mode(app, key, prompt),
            AppMode::Approve => Self::handle_approve_mode(app, key),
            AppMode::Reject => Self::handle_reject_mode(app, key),
            AppMode::Login => Self::handle_login_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        let now = Utc::now();
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('e') {
                Self::start_export(app);
            }
            return;
        }

        app.status_message = None;

        match key {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::F(1) | KeyCode::Char('?') => app.show_help(),
            KeyCode::Tab => app.next_screen(now),
            KeyCode::BackTab => app.previous_screen(now),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                app.select_screen(index, now);
            }
            KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
            KeyCode::PageUp => app.move_selection(-PAGE_STEP),
            KeyCode::PageDown => app.move_selection(PAGE_STEP),
            KeyCode::Char('r') => app.refresh_screen(now),
            KeyCode::Char('L') => app.begin_login(),
            KeyCode::Char('y') => Self::copy_ticket_id(app),
            _ => match app.screen {
                Screen::Dashboard => {}
                Screen::Configuration => Self::handle_configuration_keys(app, key),
                Screen::Triggers => {
                    if key == KeyCode::Enter {
                        app.run_selected_trigger();
                    }
                }
                Screen::Monitoring => Self::handle_monitoring_keys(app, key),
                Screen::Logs => {
                    if key == KeyCode::Char('f') {
                        app.start_event_type_filter();
                    }
                }
                Screen::Alerts => Self::handle_alerts_keys(app, key),
                Screen::Queue => Self::handle_queue_keys(app, key),
                Screen::Review => Self::handle_review_keys(app, key),
            },
        }
    }

    fn handle_configuration_keys(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char('e') => app.start_config_edit(),
            KeyCode::Char('c') => app.cycle_config_category(Utc::now()),
            _ => {}
        }
    }

    fn handle_monitoring_keys(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('d') => app.cycle_metrics_days(Utc::now()),
            KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                app.toggle_pane()
            }
            _ => {}
        }
    }

    fn handle_alerts_keys(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('a') => app.acknowledge_selected_alert(),
            KeyCode::Char(' ') | KeyCode::Char('e') => app.toggle_selected_alert_config(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                app.toggle_pane()
            }
            _ => {}
        }
    }

    fn handle_queue_keys(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.open_selected_item(),
            KeyCode::Char('s') => app.cycle_status_filter(),
            KeyCode::Char('p') => app.cycle_priority_filter(),
            KeyCode::Char('c') => app.start_customer_filter(),
            KeyCode::Char('x') => app.clear_queue_filters(),
            KeyCode::Char('o') => app.cycle_sort(),
            KeyCode::Char('O') => app.toggle_sort_order(),
            KeyCode::Char('n') | KeyCode::Right => app.change_page(1),
            KeyCode::Char('b') | KeyCode::Left => app.change_page(-1),
            KeyCode::Char('z') => app.cycle_page_size(),
            KeyCode::Char('g') => app.start_go_to_ticket(),
            _ => {}
        }
    }

    fn handle_review_keys(app: &mut App, key: KeyCode) {
        let editing = app.is_editing();
        match key {
            KeyCode::Char('e') if !editing => app.begin_edit(),
            KeyCode::Enter if editing => app.edit_selected_field(),
            KeyCode::Char('a') => app.begin_approve(),
            KeyCode::Char('x') if !editing => app.begin_reject(),
            KeyCode::Esc if editing => app.cancel_edits(),
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                app.back_to_queue(Utc::now())
            }
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        let max_scroll = help_line_count(app.console).saturating_sub(1);
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.close_help();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = (app.help_scroll + 1).min(max_scroll);
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll = (app.help_scroll + 5).min(max_scroll);
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    /// Keys shared by every text field.
    fn handle_text_key(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char(c) => app.input_insert(c),
            KeyCode::Backspace => app.input_backspace(),
            KeyCode::Left => app.input_left(),
            KeyCode::Right => app.input_right(),
            _ => {}
        }
    }

    fn handle_prompt_mode(app: &mut App, key: KeyCode, prompt: Prompt) {
        match key {
            KeyCode::Enter if prompt == Prompt::ExportPath => Self::finish_export(app),
            KeyCode::Enter => app.submit_prompt(Utc::now()),
            KeyCode::Esc => app.cancel_input(),
            other => Self::handle_text_key(app, other),
        }
    }

    fn handle_approve_mode(app: &mut App, key: KeyCode) {
        let editing = app.is_editing();
        match key {
            KeyCode::Enter => app.confirm_approve(),
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Left | KeyCode::Char('-') if !editing => app.adjust_rating(-1),
            KeyCode::Right | KeyCode::Char('+') if !editing => app.adjust_rating(1),
            KeyCode::Up => app.adjust_rating(1),
            KeyCode::Down => app.adjust_rating(-1),
            // notes are only sent with edits
            other if editing => Self::handle_text_key(app, other),
            _ => {}
        }
    }

    fn handle_reject_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.confirm_reject(),
            KeyCode::Esc => app.cancel_input(),
            other => Self::handle_text_key(app, other),
        }
    }

    fn handle_login_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.submit_login(Utc::now()),
            KeyCode::Esc => app.skip_login(),
            other => Self::handle_text_key(app, other),
        }
    }

    fn copy_ticket_id(app: &mut App) {
        let Some(ticket_id) = app.selected_ticket_id() else {
            return;
        };
        let result = clipboard::copy_text(&ticket_id);
        app.set_copy_result(&ticket_id, result);
    }

    fn start_export(app: &mut App) {
        let Some(stem) = app.export_stem() else {
            app.set_status(StatusLevel::Warning, "Nothing to export");
            return;
        };
        let ext = if app.screen == Screen::Review { "json" } else { "csv" };
        let path = FileRepository::timestamped_path(&PathBuf::new(), stem, ext, Utc::now());
        app.start_export(path);
    }

    /// Writes the focused table (or the analysis under review) to the path
    /// typed into the export prompt.
    fn finish_export(app: &mut App) {
        let path = app.export_path();
        if path.as_os_str().is_empty() {
            app.set_status(StatusLevel::Warning, "Enter a file name");
            return;
        }

        let result = if app.screen == Screen::Review {
            match app.store.analysis.session.as_ref() {
                Some(session) => FileRepository::save_analysis(&session.edited_analysis, &path)
                    .map_err(|e| e.to_string()),
                None => Err("No analysis loaded".to_string()),
            }
        } else {
            match columns::focused_table(app) {
                Some(table) => FileRepository::export_csv(&table.header_strings(), &table.rows, &path)
                    .map_err(|e| e.to_string()),
                None => Err("Nothing to export".to_string()),
            }
        };
        if let Ok(ref written) = result {
            info!(path = %written.display(), screen = ?app.screen, "Exported");
        }
        app.set_export_result(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        AppOptions, Completion, Console, Outcome, Pane, QueueAction, Request, RequestKind,
    };
    use crate::domain::models::fixtures;
    use crate::infrastructure::{MemoryTokenStore, QueuePage, TokenStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn review_app() -> App {
        App::new(
            Console::Review,
            AppOptions::default(),
            Arc::new(MemoryTokenStore::with_token("t")),
        )
    }

    fn load_queue(app: &mut App) {
        app.apply_completion(
            Completion {
                kind: RequestKind::Queue,
                seq: 1,
                outcome: Outcome::Queue(Ok(QueuePage {
                    items: vec![fixtures::queue_item(1), fixtures::queue_item(2)],
                    total: 2,
                })),
            },
            Utc::now(),
        );
        app.take_requests();
    }

    #[test]
    fn test_quit_keys() {
        let mut app = review_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = review_app();
        app.start_customer_filter();
        InputHandler::handle_key_event(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_q_in_prompt_is_text() {
        let mut app = review_app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, AppMode::Input(Prompt::CustomerFilter));
        type_text(&mut app, "quux");
        assert!(!app.should_quit);
        assert_eq!(app.input, "quux");
    }

    #[test]
    fn test_prompt_editing_keys() {
        let mut app = review_app();
        press(&mut app, KeyCode::Char('g'));
        type_text(&mut app, "ZD-1");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "ZD1");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.input.is_empty());
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_help_toggle_and_scroll() {
        let mut app = review_app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.help_scroll, 6);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.help_scroll, 0);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_queue_navigation_and_open() {
        let mut app = review_app();
        load_queue(&mut app);

        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_row, 1);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_row, 1);

        let id = app.selected_queue_item().map(|i| i.id);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.take_requests(),
            vec![Request::OpenQueueItem { id: id.unwrap() }]
        );
    }

    #[test]
    fn test_queue_filter_keys_reload() {
        let mut app = review_app();
        press(&mut app, KeyCode::Char('p'));
        assert!(app.store.queue.filters.priority.is_some());
        press(&mut app, KeyCode::Char('x'));
        assert!(app.store.queue.filters.priority.is_none());
        assert_eq!(app.take_requests().len(), 2);
    }

    #[test]
    fn test_reject_flow_requires_reason() {
        let mut app = review_app();
        load_queue(&mut app);
        app.apply_completion(
            Completion {
                kind: RequestKind::QueueItem,
                seq: 1,
                outcome: Outcome::QueueItem(Ok(fixtures::queue_item(1))),
            },
            Utc::now(),
        );

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, AppMode::Reject);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Reject);
        assert_eq!(
            app.status_message.as_ref().map(|s| s.level),
            Some(StatusLevel::Warning)
        );
        assert!(app.take_requests().is_empty());

        type_text(&mut app, "Wrong root cause");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(matches!(
            app.take_requests().as_slice(),
            [Request::SubmitDecision(_)]
        ));
    }

    #[test]
    fn test_approve_rating_keys() {
        let mut app = review_app();
        load_queue(&mut app);
        app.apply_completion(
            Completion {
                kind: RequestKind::QueueItem,
                seq: 1,
                outcome: Outcome::QueueItem(Ok(fixtures::queue_item(2))),
            },
            Utc::now(),
        );

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.mode, AppMode::Approve);
        for _ in 0..7 {
            press(&mut app, KeyCode::Right);
        }
        press(&mut app, KeyCode::Left);
        let rating = app.store.analysis.session.as_ref().map(|s| s.quality_rating);
        assert_eq!(rating, Some(4));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn test_login_input_is_submitted() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let mut app = App::new(Console::Review, AppOptions::default(), tokens.clone());
        app.start(Utc::now());
        assert_eq!(app.mode, AppMode::Login);

        type_text(&mut app, "abc");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(tokens.load().as_deref(), Some("abc"));
    }

    #[test]
    fn test_export_queue_to_csv() {
        let dir = TempDir::new().unwrap();
        let mut app = review_app();
        load_queue(&mut app);
        app.store.queue.reduce(QueueAction::SetLoading(false));

        InputHandler::handle_key_event(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::Input(Prompt::ExportPath));
        assert!(app.input.starts_with("review-queue-"));
        assert!(app.input.ends_with(".csv"));

        let path = dir.path().join("queue.csv");
        app.input = path.display().to_string();
        app.cursor_position = app.input.chars().count();
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(
            app.status_message.as_ref().map(|s| s.level),
            Some(StatusLevel::Success)
        );
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Ticket,Customer,Issue Type,Severity,Confidence,Status,Priority,SLA,Age")
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_export_on_triggers_screen_warns() {
        let mut app = App::new(
            Console::Admin,
            AppOptions::default(),
            Arc::new(MemoryTokenStore::with_token("t")),
        );
        app.screen = Screen::Triggers;
        InputHandler::handle_key_event(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(
            app.status_message.as_ref().map(|s| s.text.as_str()),
            Some("Nothing to export")
        );
    }

    #[test]
    fn test_alert_keys_follow_pane() {
        let mut app = App::new(
            Console::Admin,
            AppOptions::default(),
            Arc::new(MemoryTokenStore::with_token("t")),
        );
        app.screen = Screen::Alerts;
        press(&mut app, KeyCode::Right);
        assert_eq!(app.pane, Pane::Secondary);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.pane, Pane::Primary);
    }
}
