use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chauffeur::app::{App, InputMode, PromptKind, StatusLevel, Tab};
use chauffeur::config::{self, Config};
use chauffeur::core::{Identity, Module, Signal};
use chauffeur::infrastructure::runtime::forward_triggers;
use chauffeur::infrastructure::{HttpApi, RuntimeBridge};
use chauffeur::ui;

#[derive(Debug, Parser)]
#[command(
    name = "chauffeur",
    version,
    about = "Chauffeur: terminal dashboard for drivers and employers"
)]
struct Args {
    /// Marketplace API base URL (e.g. http://localhost:5000/api)
    #[arg(long)]
    api: Option<String>,

    /// Bearer token; CHAUFFEUR_TOKEN is used when absent
    #[arg(long)]
    token: Option<String>,

    /// Signed-in user id, used to tell own messages apart
    #[arg(long)]
    user: Option<String>,

    /// Log file (defaults to the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(api) = &self.api {
            config.api_url = api.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(user) = &self.user {
            config.user_id = user.clone();
        }
        config.api_url = config::normalize_api_url(&config.api_url);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = init_logging(args.log_file.clone().or_else(config::log_path));

    let mut config = config::load();
    args.apply(&mut config);
    info!(api = %config.api_url, user = %config.user_id, "starting");

    let api = HttpApi::new(&config.api_url, config.token.clone())?;
    let runtime = RuntimeBridge::new(Arc::new(api), config.sync_settings())?;

    let mut app = App::new(
        Identity {
            user_id: config.user_id.clone(),
            role: config.role,
        },
        config.notifications,
        config.api_url.clone(),
    );
    let _triggers = forward_triggers(&app.bus, runtime.sender());

    if config.token.is_none() {
        app.set_status(
            "No API token: set CHAUFFEUR_TOKEN or pass --token",
            StatusLevel::Warn,
        );
    } else {
        app.set_status("Connecting…", StatusLevel::Info);
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &runtime);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
        if let Some(path) = log_path {
            eprintln!("log: {}", path.display());
        }
    }

    Ok(())
}

/// Log to a file; stdout belongs to the terminal UI
fn init_logging(path: Option<PathBuf>) -> Option<PathBuf> {
    let path = path?;
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chauffeur=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Some(path)
}

fn run_app<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(app, runtime);
        app.sync_context();
        terminal.draw(|f| ui::draw(f, app))?;
        if app.notifier.take_bell() {
            execute!(terminal.backend_mut(), Print('\x07'))?;
        }
        if app.should_quit {
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(app, key),
                Event::FocusGained => app.emit(Signal::WindowFocused),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        flush_commands(app, runtime);
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
    flush_commands(app, runtime);
}

fn flush_commands(app: &mut App, runtime: &RuntimeBridge) {
    for cmd in app.take_runtime_commands() {
        if let Err(err) = runtime.send(cmd) {
            warn!(error = %err, "sync worker unavailable");
            app.set_status(format!("Sync stopped: {err}"), StatusLevel::Error);
            break;
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Prompt(kind) => handle_prompt_mode(app, key, kind),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if app.capturing_text() {
        route_to_module(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.help_open = true,
        KeyCode::Char(':') => app.enter_command(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('m') => {
            if !app.open_notification() {
                app.set_status("No new messages", StatusLevel::Info);
            }
        }
        KeyCode::Char(ch @ '1'..='4') => {
            if let Some(tab) = Tab::from_shortcut(ch) {
                app.emit(Signal::ChangeTab {
                    tab,
                    open_create: false,
                });
            }
        }
        _ => route_to_module(app, key),
    }
}

fn route_to_module(app: &mut App, key: KeyEvent) {
    let action = match app.current_tab {
        Tab::Overview => app.dashboard.handle_key(key, &mut app.ctx),
        Tab::Offers => app.offers.handle_key(key, &mut app.ctx),
        Tab::Messages => match app.chat.as_mut() {
            Some(chat) => chat.handle_key(key, &mut app.ctx),
            None => app.inbox.handle_key(key, &mut app.ctx),
        },
        Tab::Profile => return,
    };
    app.apply_action(action);
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_prompt_mode(app: &mut App, key: KeyEvent, kind: PromptKind) {
    match kind {
        PromptKind::NotificationPermission => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.answer_permission(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_permission(false),
            _ => {}
        },
    }
}
