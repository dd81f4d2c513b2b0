use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::browser::{
    BrowserModel, BrowserView, ItemType, ModelChange, SortPolicy, TraceObserver,
};
use crate::config::AppConfig;
use crate::error::Result;
use crate::session::Session;
use crate::theme::{resolve_theme, ThemeColors};

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub model: BrowserModel,
    pub view: BrowserView,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub should_quit: bool,
    pub show_help: bool,
    pub watcher_active: bool,
    /// Message, creation time, error flag.
    pub status_message: Option<(String, Instant, bool)>,
    session_path: Option<PathBuf>,
}

impl App {
    /// Create an App browsing `toplevel_dirs` with settings from `config`.
    pub fn new(config: &AppConfig, toplevel_dirs: &[PathBuf]) -> Self {
        let mut model = BrowserModel::new(config.browser_settings(), toplevel_dirs);
        model.connect(Box::new(TraceObserver));
        let view = BrowserView::new(&mut model, config.sort_order());
        Self {
            model,
            view,
            theme: resolve_theme(config.theme_scheme()),
            use_icons: config.use_icons(),
            should_quit: false,
            show_help: false,
            watcher_active: config.watcher_enabled(),
            status_message: None,
            session_path: None,
        }
    }

    /// Persist the top-level directories to `path` on quit.
    pub fn with_session_path(mut self, path: PathBuf) -> Self {
        self.session_path = Some(path);
        self
    }

    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now(), false));
    }

    pub fn set_error_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now(), true));
    }

    /// Clear the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, created, _)) = &self.status_message {
            if created.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        if let Some(path) = &self.session_path {
            let session = Session::from_model(&self.model);
            if let Err(err) = session.save(path) {
                tracing::warn!(%err, path = %path.display(), "failed to save session");
            }
        }
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_watcher(&mut self) {
        self.watcher_active = !self.watcher_active;
        self.set_status_message(if self.watcher_active {
            "Watcher resumed"
        } else {
            "Watcher paused"
        });
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        self.view.select_next();
    }

    pub fn select_previous(&mut self) {
        self.view.select_previous();
    }

    pub fn select_first(&mut self) {
        self.view.select_first();
    }

    pub fn select_last(&mut self) {
        self.view.select_last();
    }

    pub fn expand_selected(&mut self) {
        self.view.expand_selected(&mut self.model);
    }

    pub fn collapse_selected(&mut self) {
        self.view.collapse_selected(&mut self.model);
    }

    pub fn toggle_selected(&mut self) {
        self.view.toggle_selected(&mut self.model);
    }

    /// Filesystem path and line of the selected item, for the status bar.
    pub fn selected_location(&self) -> String {
        let Some(row) = self.view.selected() else {
            return String::new();
        };
        let mut current = Some(row.id);
        while let Some(id) = current {
            let Some(item) = self.model.tree().get(id) else {
                break;
            };
            if let Some(path) = item.path() {
                return match row.line_number {
                    Some(line) => format!("{}:{}", path.display(), line),
                    None => path.display().to_string(),
                };
            }
            current = item.parent();
        }
        row.label.clone()
    }

    /// Short summary of the ordering flags.
    pub fn flags_summary(&self) -> String {
        let policy = self.model.settings().sort;
        let mut flags = vec![self.view.sort_order.label()];
        if policy.folders_first {
            flags.push("folders");
        }
        if policy.by_occurrence {
            flags.push("occurrence");
        }
        if self.model.settings().show_hidden {
            flags.push("hidden");
        }
        flags.join(" ")
    }

    // ── Model operations ────────────────────────────────────────────────

    fn report(&mut self, result: Result<Vec<ModelChange>>, success: &str) {
        match result {
            Ok(_) => self.set_status_message(success),
            Err(err) => self.set_error_message(err.to_string()),
        }
    }

    /// Re-read the selected item from disk.
    pub fn repopulate_selected(&mut self) {
        let Some(id) = self.view.selected().map(|row| row.id) else {
            return;
        };
        let lazy = self
            .model
            .tree()
            .get(id)
            .map_or(false, |item| item.is_lazy_populated());
        if !lazy {
            self.set_status_message("Nothing to reload");
            return;
        }
        let result = self
            .view
            .mutate(&mut self.model, |model| model.repopulate_item(id));
        self.report(result, "Reloaded");
    }

    /// Drop everything read so far and rebuild the tree from the top-level
    /// entries, keeping what was expanded.
    pub fn reload_all(&mut self) {
        let result = self.view.mutate(&mut self.model, |model| model.reload());
        self.report(result, "Reloaded all entries");
    }

    /// Add the selected directory as a top-level entry.
    pub fn add_selected_as_toplevel(&mut self) {
        let Some(row) = self.view.selected() else {
            return;
        };
        let path = match self.model.tree().get(row.id) {
            Some(item) if item.item_type() == ItemType::Directory => item.path().map(Path::to_path_buf),
            _ => None,
        };
        let Some(path) = path else {
            self.set_error_message("Not a directory");
            return;
        };
        self.add_toplevel_dir(&path);
    }

    pub fn add_toplevel_dir(&mut self, path: &Path) {
        if !path.is_dir() {
            self.set_error_message(format!("Not a directory: {}", path.display()));
            return;
        }
        let result = self
            .view
            .mutate(&mut self.model, |model| model.add_toplevel_dir(path));
        match result {
            Ok(changes) if changes.is_empty() => self.set_status_message("Already a top-level entry"),
            other => self.report(other, "Added top-level directory"),
        }
    }

    /// Remove the selected top-level directory entry.
    pub fn remove_selected_toplevel(&mut self) {
        let Some(id) = self.view.selected().map(|row| row.id) else {
            return;
        };
        let result = self
            .view
            .mutate(&mut self.model, |model| model.remove_toplevel_dir(id));
        match result {
            Ok(changes) if changes.is_empty() => {
                self.set_error_message("Only top-level directories can be removed")
            }
            other => self.report(other, "Removed top-level directory"),
        }
    }

    /// Show `dir` as the program directory.
    pub fn program_change(&mut self, dir: &Path) {
        let result = self
            .view
            .mutate(&mut self.model, |model| model.program_change(dir));
        if let Err(err) = result {
            self.set_error_message(err.to_string());
        }
    }

    pub fn toggle_sort_order(&mut self) {
        let order = self.view.sort_order.toggle();
        self.view.set_sort_order(&mut self.model, order);
        self.set_status_message(format!("Sort: {}", order.label()));
    }

    fn update_policy(&mut self, update: impl FnOnce(&mut SortPolicy)) {
        let mut policy = self.model.settings().sort;
        update(&mut policy);
        self.model.set_sort_policy(policy);
        self.view.flatten(&mut self.model);
    }

    pub fn toggle_folders_first(&mut self) {
        self.update_policy(|p| p.folders_first = !p.folders_first);
        let on = self.model.settings().sort.folders_first;
        self.set_status_message(format!("Folders first: {}", if on { "on" } else { "off" }));
    }

    pub fn toggle_by_occurrence(&mut self) {
        self.update_policy(|p| p.by_occurrence = !p.by_occurrence);
        let on = self.model.settings().sort.by_occurrence;
        self.set_status_message(format!(
            "Order by occurrence: {}",
            if on { "on" } else { "off" }
        ));
    }

    pub fn toggle_hidden(&mut self) {
        let show = !self.model.settings().show_hidden;
        let result = self
            .view
            .mutate(&mut self.model, |model| model.set_show_hidden(show));
        self.report(result, if show { "Showing hidden files" } else { "Hiding hidden files" });
    }

    /// Repopulate items affected by filesystem changes under `paths`.
    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        if !self.watcher_active {
            return;
        }
        let mut targets: Vec<PathBuf> = Vec::new();
        for path in paths {
            if let Some(parent) = path.parent() {
                if !targets.iter().any(|t| t == parent) {
                    targets.push(parent.to_path_buf());
                }
            }
            if !targets.contains(&path) {
                targets.push(path);
            }
        }
        let result = self.view.mutate(&mut self.model, |model| {
            let mut changes = Vec::new();
            for target in &targets {
                changes.extend(model.repopulate_path(target)?);
            }
            Ok(changes)
        });
        match result {
            Ok(changes) if !changes.is_empty() => {
                tracing::debug!(changes = changes.len(), "refreshed after filesystem change")
            }
            Ok(_) => {}
            Err(err) => self.set_error_message(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.source.sys_path = Some(Vec::new());
        config
    }

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg").join("mod.py"), "def helper():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("app.py"),
            "class Window:\n    def show(self):\n        pass\n",
        )
        .unwrap();
        fs::write(dir.path().join(".hidden.py"), "x = 1\n").unwrap();
        let app = App::new(&test_config(), &[dir.path().to_path_buf()]);
        (dir, app)
    }

    fn labels(app: &App) -> Vec<String> {
        app.view.rows.iter().map(|r| r.label.clone()).collect()
    }

    #[test]
    fn starts_with_directory_and_sys_path() {
        let (dir, app) = setup_app();
        let rows = labels(&app);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], dir.path().display().to_string());
        assert_eq!(rows[1], "sys.path");
    }

    #[test]
    fn select_next_clamps_at_end() {
        let (_dir, mut app) = setup_app();
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.view.selected_index, 1);
        app.select_first();
        assert_eq!(app.view.selected_index, 0);
    }

    #[test]
    fn expand_directory_shows_children() {
        let (_dir, mut app) = setup_app();
        app.expand_selected();
        let rows = labels(&app);
        assert_eq!(&rows[1..3], &["pkg".to_string(), "app.py".to_string()]);
    }

    #[test]
    fn collapse_selected_folds_expanded_directory() {
        let (_dir, mut app) = setup_app();
        app.expand_selected();
        assert_eq!(app.view.rows.len(), 4);
        assert!(app.view.rows[0].is_expanded);

        app.view.selected_index = 2;
        app.collapse_selected();
        assert_eq!(app.view.selected_index, 0);
        assert_eq!(app.view.rows.len(), 4);

        app.collapse_selected();
        assert_eq!(app.view.rows.len(), 2);
        assert!(!app.view.rows[0].is_expanded);
    }

    #[test]
    fn reload_all_rereads_and_keeps_entries() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        app.program_change(&dir.path().join("pkg"));
        fs::write(dir.path().join("late.py"), "").unwrap();
        assert!(!labels(&app).contains(&"late.py".to_string()));

        app.reload_all();
        assert!(labels(&app).contains(&"late.py".to_string()));
        assert_eq!(app.model.toplevel_dirs(), &[dir.path().to_path_buf()]);
        assert!(app.model.program_dir().is_some());
        assert!(labels(&app).contains(&dir.path().join("pkg").display().to_string()));
        let (msg, _, is_error) = app.status_message.clone().unwrap();
        assert!(!is_error);
        assert_eq!(msg, "Reloaded all entries");
    }

    #[test]
    fn toggle_hidden_shows_dotfiles() {
        let (_dir, mut app) = setup_app();
        app.expand_selected();
        assert!(!labels(&app).contains(&".hidden.py".to_string()));
        app.toggle_hidden();
        assert!(app.model.settings().show_hidden);
        assert!(labels(&app).contains(&".hidden.py".to_string()));
        assert!(app.view.rows[0].is_expanded);
    }

    #[test]
    fn fs_change_picks_up_new_file() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        fs::write(dir.path().join("new.py"), "").unwrap();
        app.handle_fs_change(vec![dir.path().join("new.py")]);
        assert!(labels(&app).contains(&"new.py".to_string()));
        assert_eq!(app.view.selected_index, 0);
    }

    #[test]
    fn fs_change_ignored_while_paused() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        app.toggle_watcher();
        fs::write(dir.path().join("new.py"), "").unwrap();
        app.handle_fs_change(vec![dir.path().join("new.py")]);
        assert!(!labels(&app).contains(&"new.py".to_string()));
    }

    #[test]
    fn repopulate_keeps_expansion() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        app.view.selected_index = 2;
        app.expand_selected();
        assert!(labels(&app).contains(&"Window".to_string()));
        fs::write(
            dir.path().join("app.py"),
            "class Window:\n    def show(self):\n        pass\n    def hide(self):\n        pass\n",
        )
        .unwrap();
        app.view.selected_index = 0;
        app.repopulate_selected();
        assert!(app.view.rows[0].is_expanded);
        assert!(labels(&app).contains(&"app.py".to_string()));
        assert!(app.status_message.as_ref().map_or(false, |(_, _, err)| !err));
    }

    #[test]
    fn add_and_remove_toplevel_dir() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        app.view.selected_index = 1;
        assert_eq!(app.view.selected().unwrap().label, "pkg");
        app.add_selected_as_toplevel();
        assert_eq!(app.model.toplevel_dirs().len(), 2);
        let pkg = dir.path().join("pkg").display().to_string();
        let index = labels(&app).iter().position(|l| *l == pkg).unwrap();
        app.view.selected_index = index;
        app.remove_selected_toplevel();
        assert_eq!(app.model.toplevel_dirs().len(), 1);
        assert!(!labels(&app).contains(&pkg));
    }

    #[test]
    fn remove_non_toplevel_reports_error() {
        let (_dir, mut app) = setup_app();
        app.view.selected_index = 1;
        app.remove_selected_toplevel();
        let (msg, _, is_error) = app.status_message.clone().unwrap();
        assert!(is_error);
        assert!(msg.contains("top-level"));
    }

    #[test]
    fn toggle_sort_order_reverses_rows() {
        let (_dir, mut app) = setup_app();
        let before = labels(&app);
        app.toggle_sort_order();
        let mut after = labels(&app);
        after.reverse();
        assert_eq!(before, after);
    }

    #[test]
    fn toggle_folders_first_updates_flags() {
        let (_dir, mut app) = setup_app();
        assert!(app.flags_summary().contains("folders"));
        app.toggle_folders_first();
        assert!(!app.flags_summary().contains("folders"));
        app.toggle_by_occurrence();
        assert!(!app.flags_summary().contains("occurrence"));
    }

    #[test]
    fn selected_location_includes_line() {
        let (dir, mut app) = setup_app();
        app.expand_selected();
        app.view.selected_index = 2;
        app.expand_selected();
        app.view.selected_index = 3;
        assert_eq!(
            app.selected_location(),
            format!("{}:1", dir.path().join("app.py").display())
        );
    }

    #[test]
    fn program_change_adds_entry() {
        let (dir, mut app) = setup_app();
        app.program_change(&dir.path().join("pkg"));
        assert!(app.model.program_dir().is_some());
        assert_eq!(app.view.rows.len(), 3);
    }

    #[test]
    fn quit_saves_session() {
        let (dir, app) = setup_app();
        let session_file = dir.path().join("state").join("session.toml");
        let mut app = app.with_session_path(session_file.clone());
        app.quit();
        assert!(app.should_quit);
        let session = Session::load(&session_file).unwrap();
        assert_eq!(session.toplevel_dirs, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn status_message_expires() {
        let (_dir, mut app) = setup_app();
        app.set_status_message("hello");
        app.clear_expired_status();
        assert!(app.status_message.is_some());
        app.status_message = Some(("old".into(), Instant::now() - STATUS_TIMEOUT, false));
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
