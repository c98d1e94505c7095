use directories::ProjectDirs;
use std::path::PathBuf;

use crate::backend::BackendKind;

const APP_NAME: &str = "interview-board";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where the board's storage lives by default
    pub fn data_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }

    /// SQLite database file inside `data_dir`
    pub fn sqlite_path(data_dir: &std::path::Path) -> PathBuf {
        data_dir.join("board.db")
    }

    pub fn log_path(data_dir: &std::path::Path) -> PathBuf {
        data_dir.join(format!("{APP_NAME}.log"))
    }

    pub fn describe(data_dir: &std::path::Path, backend: BackendKind) -> PathBuf {
        match backend {
            BackendKind::File => data_dir.to_path_buf(),
            BackendKind::Sqlite => Self::sqlite_path(data_dir),
        }
    }
}
