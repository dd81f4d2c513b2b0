//! Top-level directories remembered between runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::BrowserModel;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub toplevel_dirs: Vec<PathBuf>,
}

impl Session {
    pub fn from_model(model: &BrowserModel) -> Self {
        Self {
            toplevel_dirs: model.toplevel_dirs().to_vec(),
        }
    }

    /// `<data dir>/cb-tui/session.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("cb-tui").join("session.toml"))
    }

    /// Read a session file. A missing or unreadable file yields `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Session>(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string(self)?)?;
        tracing::debug!(path = %path.display(), dirs = self.toplevel_dirs.len(), "session saved");
        Ok(())
    }

    /// Remembered directories that still exist.
    pub fn existing_dirs(&self) -> Vec<PathBuf> {
        self.toplevel_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.toml");
        let session = Session {
            toplevel_dirs: vec![dir.path().to_path_buf(), PathBuf::from("/opt/project")],
        };
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path), Some(session));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Session::load(&dir.path().join("absent.toml")).is_none());
    }

    #[test]
    fn malformed_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "toplevel_dirs = 42").unwrap();
        assert!(Session::load(&path).is_none());
    }

    #[test]
    fn empty_file_is_empty_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(Session::load(&path), Some(Session::default()));
    }

    #[test]
    fn existing_dirs_drops_vanished_paths() {
        let dir = TempDir::new().unwrap();
        let session = Session {
            toplevel_dirs: vec![dir.path().to_path_buf(), dir.path().join("gone")],
        };
        assert_eq!(session.existing_dirs(), vec![dir.path().to_path_buf()]);
    }
}
