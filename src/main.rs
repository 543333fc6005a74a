mod app;
mod catalog;
mod config;
mod contact;
mod form;
mod loader;
mod modal;
mod model;
mod resolver;
mod source;
mod theme;
mod ui;
mod view;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::catalog::Catalog;
use crate::config::{AppConfig, AppPaths};

/// Browse a static product catalog in the terminal.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about)]
struct Cli {
    /// Catalog location: an http(s) base URL or a local directory.
    #[arg(long)]
    source: Option<String>,

    /// Configuration file to use instead of ~/.local/vitrine/config.json.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the loaded catalog as JSON and exit.
    #[arg(long)]
    export: bool,

    /// Log file; defaults to vitrine.log next to the configuration.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::new(cli.config.clone())?;
    init_tracing(cli.log_file.as_deref().unwrap_or(&paths.log_file))?;

    let mut config = AppConfig::load(&paths.config_file)?;
    if let Some(source) = cli.source {
        config.catalog.source = source;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Unable to start async runtime")?;
    let source = source::open_source(&config.catalog.source)
        .with_context(|| format!("Invalid catalog source {:?}", config.catalog.source))?;
    info!(source = %source.describe(), "loading catalog");
    let catalog = runtime.block_on(Catalog::load(source, config.catalog.clone()));

    if cli.export {
        let data = serde_json::to_string_pretty(&catalog.export())?;
        println!("{data}");
        return Ok(());
    }

    let mut app = AppState::new(catalog, config, paths, runtime);
    run_app(&mut app)
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Unable to open log file {}", log_file.display()))?;
    let filter = EnvFilter::try_from_env("VITRINE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn run_app(app: &mut AppState) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    let tick_rate = Duration::from_millis(200);
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    app.handle_mouse(mouse, size);
                }
                Event::Resize(_, _) => {}
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            };
        }

        app.tick(Instant::now());

        if let Some(link) = app.take_pending_link() {
            match open::that(&link) {
                Ok(()) => info!(%link, "opened link"),
                Err(err) => {
                    warn!(%link, error = %err, "unable to open link");
                    app.set_status(Some(format!("Unable to open {link}: {err}")));
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
