use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::backend::BackendKind;
use crate::candidate::{DEFAULT_ROLE, ROLES};
use crate::store::CorruptPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub backend: BackendKind,
    pub on_corrupt: CorruptPolicy,
    pub default_role: String,
    pub roles: Vec<String>,
    pub watch_interval_ms: u64,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendKind::File,
            on_corrupt: CorruptPolicy::Fail,
            default_role: DEFAULT_ROLE.to_string(),
            roles: ROLES.iter().map(|r| r.to_string()).collect(),
            watch_interval_ms: 500,
            tick_rate_ms: 1000,
        }
    }
}

/// Floor for the polling and tick intervals; zero would busy-loop.
const MIN_INTERVAL_MS: u64 = 10;

impl Config {
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(MIN_INTERVAL_MS))
    }

    /// Explicit `data_dir`, else the platform state directory, else the cwd.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(AppDirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("interview_board.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            data_dir: Some(dir.path().join("data")),
            backend: BackendKind::Sqlite,
            on_corrupt: CorruptPolicy::Reseed,
            default_role: "QA Engineer".into(),
            roles: vec!["QA Engineer".into()],
            watch_interval_ms: 50,
            tick_rate_ms: 250,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_garbled_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ nope").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"backend":"sqlite","on_corrupt":"reseed"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.backend, BackendKind::Sqlite);
        assert_eq!(cfg.on_corrupt, CorruptPolicy::Reseed);
        assert_eq!(cfg.default_role, DEFAULT_ROLE);
        assert_eq!(cfg.roles.len(), ROLES.len());
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let cfg = Config {
            watch_interval_ms: 0,
            tick_rate_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.watch_interval(), Duration::from_millis(MIN_INTERVAL_MS));
        assert_eq!(cfg.tick_rate(), Duration::from_millis(MIN_INTERVAL_MS));
        assert_eq!(Config::default().watch_interval(), Duration::from_millis(500));
        assert_eq!(Config::default().tick_rate(), Duration::from_millis(1000));
    }

    #[test]
    fn store_reports_its_path() {
        let store = FileConfigStore::with_path("/tmp/board/config.json");
        assert_eq!(store.path(), Path::new("/tmp/board/config.json"));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/board")),
            ..Config::default()
        };
        assert_eq!(cfg.resolved_data_dir(), PathBuf::from("/tmp/board"));
    }
}
