mod app;
mod browser;
mod clbr;
mod components;
mod config;
mod dump;
mod error;
mod event;
mod fs;
mod handler;
mod logging;
mod session;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, WatcherConfig};
use crate::dump::DumpOptions;
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::fs::watcher::FsWatcher;
use crate::logging::LogTarget;
use crate::session::Session;
use crate::tui::{install_panic_hook, TerminalModes, Tui};

/// A terminal class browser for Python source trees.
#[derive(Parser, Debug)]
#[command(name = "cb", version, about)]
struct Cli {
    /// Top-level directories to browse (defaults to the last session, then
    /// the current directory)
    paths: Vec<PathBuf>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Print the tree as JSON instead of starting the interface
    #[arg(long)]
    dump: bool,

    /// Levels below the top-level entries to include in the dump
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Include the contents of sys.path in the dump
    #[arg(long)]
    with_sys_path: bool,

    /// Directory of the program being debugged
    #[arg(long)]
    program: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show hidden files and directories
    #[arg(long)]
    show_hidden: bool,
}

impl Cli {
    /// Config values set on the command line.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: self.show_hidden.then_some(true),
                ..GeneralConfig::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..WatcherConfig::default()
            },
            ..AppConfig::default()
        }
    }
}

fn canonical_dir(path: &Path) -> error::Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;
    if !canonical.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Directories from the command line, else the saved session, else the
/// current directory.
fn resolve_dirs(cli: &Cli, session: Option<&Session>) -> error::Result<Vec<PathBuf>> {
    if !cli.paths.is_empty() {
        return cli.paths.iter().map(|p| canonical_dir(p)).collect();
    }
    if let Some(dirs) = session.map(Session::existing_dirs) {
        if !dirs.is_empty() {
            return Ok(dirs);
        }
    }
    Ok(vec![std::env::current_dir()?])
}

fn run_dump(cli: &Cli, config: &AppConfig) -> error::Result<()> {
    logging::init(
        &cli.log_file
            .clone()
            .map_or(LogTarget::Stderr, LogTarget::File),
        "warn",
    )?;
    let dirs = resolve_dirs(cli, None)?;
    let mut model = browser::BrowserModel::new(config.browser_settings(), &dirs);
    if let Some(program) = &cli.program {
        model.program_change(&canonical_dir(program)?)?;
    }
    let options = DumpOptions {
        depth: cli.depth,
        sort_order: config.sort_order(),
        include_sys_path: cli.with_sys_path,
    };
    println!("{}", dump::run(&mut model, &options)?);
    Ok(())
}

/// Watch exactly the model's current top-level directories.
fn sync_watched(watcher: &mut FsWatcher, watched: &mut Vec<PathBuf>, wanted: &[PathBuf]) {
    for dir in watched.iter().filter(|d| !wanted.contains(d)) {
        if let Err(err) = watcher.unwatch(dir) {
            tracing::debug!(%err, dir = %dir.display(), "unwatch failed");
        }
    }
    watched.retain(|d| wanted.contains(d));
    for dir in wanted {
        if watched.contains(dir) {
            continue;
        }
        match watcher.watch(dir) {
            Ok(()) => watched.push(dir.clone()),
            Err(err) => tracing::warn!(%err, dir = %dir.display(), "cannot watch directory"),
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if cli.dump {
        return run_dump(&cli, &config);
    }

    logging::init(
        &cli.log_file
            .clone()
            .map_or(LogTarget::Disabled, LogTarget::File),
        "info",
    )?;

    let session_path = Session::default_path();
    let session = session_path.as_deref().and_then(Session::load);
    let dirs = resolve_dirs(&cli, session.as_ref())?;
    let program = cli.program.as_deref().map(canonical_dir).transpose()?;

    let mut app = App::new(&config, &dirs);
    if let Some(path) = session_path {
        app = app.with_session_path(path);
    }
    if let Some(program) = program {
        app.program_change(&program);
    }
    tracing::info!(dirs = dirs.len(), "browser started");

    let modes = TerminalModes::from_config(&config);
    install_panic_hook(modes);
    let mut tui = Tui::new(modes)?;
    let result = run(&mut tui, &mut app, &config).await;
    let restored = tui.restore();
    result.and(restored)
}

/// Event loop: draw, dispatch one event, keep the watcher in step.
async fn run(tui: &mut Tui, app: &mut App, config: &AppConfig) -> error::Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));
    let event_tx = events.sender();

    // Initialize filesystem watcher (unless disabled)
    let mut watched: Vec<PathBuf> = Vec::new();
    let mut watcher = if config.watcher_enabled() {
        let ignore_patterns: Vec<String> = fs::watcher::DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        match FsWatcher::new(
            &[],
            Duration::from_millis(config.debounce_ms()),
            ignore_patterns,
            fs::watcher::DEFAULT_FLOOD_THRESHOLD,
            event_tx.clone(),
        ) {
            Ok(mut watcher) => {
                sync_watched(&mut watcher, &mut watched, app.model.toplevel_dirs());
                Some(watcher)
            }
            Err(e) => {
                app.watcher_active = false;
                app.set_error_message(format!("Watcher unavailable: {}", e));
                None
            }
        }
    } else {
        app.watcher_active = false;
        None
    };

    loop {
        tui.draw(app)?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::FsChange(paths) => app.handle_fs_change(paths),
        }

        if let Some(watcher) = watcher.as_mut() {
            if app.watcher_active && !watcher.is_active() {
                watcher.resume();
            } else if !app.watcher_active && watcher.is_active() {
                watcher.pause();
            }
            sync_watched(watcher, &mut watched, app.model.toplevel_dirs());
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
