//! npsites - Browse national park sites by state and find places nearby
//!
//! A terminal UI application that lists the national park service sites of a
//! US state and looks up points of interest around a chosen site.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use npsites::app::App;
use npsites::cache::{Fetcher, RequestCache};
use npsites::cli::{Cli, StartupConfig};
use npsites::data::{Credentials, ParksClient, VicinityClient};
use npsites::net::{HttpTransport, Transport};
use npsites::ui;

/// Log filter used when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = "npsites=info";

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Sends log output to `path`; the terminal belongs to the UI.
fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config.with_credentials(Credentials::from_env()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_path)?;
    info!(cache = %config.cache_path.display(), "npsites starting up");

    let cache = RequestCache::with_path(&config.cache_path);
    if config.clear_cache {
        cache.clear()?;
        info!("cache cleared");
    }

    let fetcher = Arc::new(Fetcher::new(cache).with_policy(config.cache_policy));
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.timeout)?);
    let parks = ParksClient::new(fetcher.clone(), transport.clone(), config.base_url.clone());
    let vicinity = match config.credentials.clone() {
        Some(credentials) => Some(
            VicinityClient::new(fetcher, transport, credentials)
                .with_endpoint(config.vicinity_url.clone()),
        ),
        None => {
            info!("no API key set; nearby lookups disabled");
            None
        }
    };

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(parks, vicinity, config.initial_state.clone());

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| ui::render(f, &app))?;

        // Queued work runs to completion before the next key is read
        if app.pending.is_some() {
            app.run_pending().await;
            continue;
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("npsites shutting down");
    Ok(())
}
