//! reviewdesk - terminal consoles for AI ticket analyses
//!
//! Runs either the admin console (health, configuration, triggers,
//! monitoring, audit logs and alerts) or the review console (queue and
//! analysis review) against the backend API.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use reviewdesk::application::{App, AppOptions, Console, Dispatcher};
use reviewdesk::infrastructure::{
    logging, ApiClient, FileTokenStore, ReqwestTransport, Settings, TokenStore,
};
use reviewdesk::presentation::{render_ui, InputHandler};

/// How long the loop waits for a key before polling completions again.
const TICK: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "reviewdesk", version, about = "Admin and review consoles for AI ticket analyses")]
struct Cli {
    /// Settings file (default: <config dir>/reviewdesk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the settings file and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the admin console
    Admin,
    /// Open the review console (default)
    Review,
    /// Store a bearer token
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Write the effective settings to the settings file
    InitConfig,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings =
        Settings::resolve(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
        settings.validate()?;
    }

    let _guard = logging::init(&settings.log_dir, cli.verbose)
        .with_context(|| format!("Failed to set up logging in {}", settings.log_dir.display()))?;
    info!(api = %settings.api_base_url, "Starting reviewdesk");

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&settings.token_file));

    match cli.command.unwrap_or(Command::Review) {
        Command::Admin => run_console(Console::Admin, &settings, tokens),
        Command::Review => run_console(Console::Review, &settings, tokens),
        Command::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                bail!("Token must not be empty");
            }
            tokens
                .save(token)
                .with_context(|| format!("Failed to write {}", settings.token_file.display()))?;
            println!("Token saved to {}", settings.token_file.display());
            Ok(())
        }
        Command::Logout => {
            tokens
                .clear()
                .with_context(|| format!("Failed to remove {}", settings.token_file.display()))?;
            println!("Signed out");
            Ok(())
        }
        Command::InitConfig => {
            let path = cli.config.unwrap_or_else(Settings::default_path);
            settings.save(&path)?;
            println!("Settings written to {}", path.display());
            Ok(())
        }
    }
}

/// Sets up the terminal, runs one console until the user quits and restores
/// the terminal even when the loop failed.
fn run_console(console: Console, settings: &Settings, tokens: Arc<dyn TokenStore>) -> Result<()> {
    let auth_expired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&auth_expired);

    let transport = ReqwestTransport::new(Duration::from_secs(settings.request_timeout_secs))
        .context("Failed to build HTTP client")?;
    let api = ApiClient::new(&settings.api_base_url, Arc::new(transport), Arc::clone(&tokens))
        .on_auth_expired(Arc::new(move || flag.store(true, Ordering::SeqCst)));
    let mut dispatcher = Dispatcher::new(api);

    let mut app = App::new(console, AppOptions::from(settings), tokens);
    app.start(Utc::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &mut dispatcher, &auth_expired);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref err) = res {
        error!(error = %err, "Console exited with an error");
    }
    info!(in_flight = dispatcher.in_flight(), "Console closed");
    res.map_err(Into::into)
}

/// Main event loop: apply finished requests, dispatch new ones, draw, then
/// wait briefly for a key.
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    auth_expired: &AtomicBool,
) -> io::Result<()> {
    loop {
        for completion in dispatcher.drain() {
            app.apply_completion(completion, Utc::now());
        }
        if auth_expired.swap(false, Ordering::SeqCst) {
            app.handle_auth_expired();
        }
        app.tick(Utc::now());
        for request in app.take_requests() {
            dispatcher.dispatch(request);
        }

        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    InputHandler::handle_key_event(app, key.code, key.modifiers);
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}
