//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--show-hidden`, `--no-watcher`)
//! 2. `$CB_TUI_CONFIG` environment variable (path to config file)
//! 3. Project-local `.cb-tui.toml` in the current working directory
//! 4. Global `~/.config/cb-tui/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::browser::model::{default_sys_path, BrowserSettings};
use crate::browser::{SortOrder, SortPolicy};
use crate::clbr::SourceExtensions;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Show hidden files and directories.
    pub show_hidden: Option<bool>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Color scheme: "dark" or "light".
    pub theme: Option<String>,
}

/// Browser ordering and presentation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BrowserConfig {
    /// Directories listed before files.
    pub folders_first: Option<bool>,
    /// Order class contents by line number instead of by name.
    pub contents_by_occurrence: Option<bool>,
    /// "ascending" or "descending".
    pub sort_order: Option<String>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Source file recognition.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Extensions (with leading dot) read as Python sources.
    pub python_extensions: Option<Vec<String>>,
    /// Extensions (with leading dot) read as Python 3 sources.
    pub python3_extensions: Option<Vec<String>>,
    /// Entries of the `sys.path` node; `""` is the current directory.
    pub sys_path: Option<Vec<String>>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Repopulate changed files and directories automatically.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub browser: BrowserConfig,
    pub source: SourceConfig,
    pub watcher: WatcherConfig,
}

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("CB_TUI_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".cb-tui.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("cb-tui").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: other.general.show_hidden.or(self.general.show_hidden),
                mouse: other.general.mouse.or(self.general.mouse),
                theme: other.general.theme.clone().or(self.general.theme),
            },
            browser: BrowserConfig {
                folders_first: other.browser.folders_first.or(self.browser.folders_first),
                contents_by_occurrence: other
                    .browser
                    .contents_by_occurrence
                    .or(self.browser.contents_by_occurrence),
                sort_order: other
                    .browser
                    .sort_order
                    .clone()
                    .or(self.browser.sort_order),
                use_icons: other.browser.use_icons.or(self.browser.use_icons),
            },
            source: SourceConfig {
                python_extensions: other
                    .source
                    .python_extensions
                    .clone()
                    .or(self.source.python_extensions),
                python3_extensions: other
                    .source
                    .python3_extensions
                    .clone()
                    .or(self.source.python3_extensions),
                sys_path: other.source.sys_path.clone().or(self.source.sys_path),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so that higher-priority files overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn show_hidden(&self) -> bool {
        self.general.show_hidden.unwrap_or(false)
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn theme_scheme(&self) -> &str {
        self.general.theme.as_deref().unwrap_or("dark")
    }

    pub fn folders_first(&self) -> bool {
        self.browser.folders_first.unwrap_or(true)
    }

    pub fn contents_by_occurrence(&self) -> bool {
        self.browser.contents_by_occurrence.unwrap_or(true)
    }

    /// Sort direction; unknown values fall back to ascending.
    pub fn sort_order(&self) -> SortOrder {
        self.browser
            .sort_order
            .as_deref()
            .and_then(SortOrder::from_name)
            .unwrap_or_default()
    }

    pub fn use_icons(&self) -> bool {
        self.browser.use_icons.unwrap_or(true)
    }

    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    pub fn sort_policy(&self) -> SortPolicy {
        SortPolicy {
            folders_first: self.folders_first(),
            by_occurrence: self.contents_by_occurrence(),
        }
    }

    /// Source extensions, normalised to lowercase with a leading dot.
    pub fn source_extensions(&self) -> SourceExtensions {
        let defaults = SourceExtensions::default();
        SourceExtensions {
            python: self
                .source
                .python_extensions
                .as_deref()
                .map(normalize_extensions)
                .unwrap_or(defaults.python),
            python3: self
                .source
                .python3_extensions
                .as_deref()
                .map(normalize_extensions)
                .unwrap_or(defaults.python3),
        }
    }

    pub fn sys_path(&self) -> Vec<PathBuf> {
        match &self.source.sys_path {
            Some(entries) => entries.iter().map(PathBuf::from).collect(),
            None => default_sys_path(),
        }
    }

    /// Everything the browser model needs from the configuration.
    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            sort: self.sort_policy(),
            extensions: self.source_extensions(),
            sys_path: self.sys_path(),
            show_hidden: self.show_hidden(),
        }
    }
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
