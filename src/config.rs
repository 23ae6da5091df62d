//! Layered defaults read from configuration files.
//!
//! The global file is read first, then the user's own file. Values from a
//! later layer replace those of an earlier one, and command line flags are
//! applied on top by the caller.

use crate::common::Result;
use crate::error::HaproxyError;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const GLOBAL_CONFIG: &str = "/etc/haproxyctl.toml";
const USER_CONFIG_DIR: &str = "haproxyctl";
const USER_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub socket: Option<String>,
    pub backend: Option<String>,
    pub verbose: Option<bool>,
    /// Socket timeout in seconds.
    pub timeout: Option<u64>,
}

impl Settings {
    /// Reads one layer. A file that does not exist is not an error.
    pub fn load(path: &Path) -> Result<Option<Settings>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|cause| HaproxyError::Config {
                path: path.display().to_string(),
                cause,
            })
    }

    pub fn layered<P: AsRef<Path>>(paths: &[P]) -> Result<Settings> {
        let mut settings = Settings::default();
        for path in paths {
            if let Some(layer) = Settings::load(path.as_ref())? {
                settings = settings.merge(layer);
            }
        }
        Ok(settings)
    }

    /// Field by field, values set in `over` win.
    pub fn merge(self, over: Settings) -> Settings {
        Settings {
            socket: over.socket.or(self.socket),
            backend: over.backend.or(self.backend),
            verbose: over.verbose.or(self.verbose),
            timeout: over.timeout.or(self.timeout),
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// The global file followed by the user file, if a config directory exists.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(GLOBAL_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Settings::load(&dir.path().join("none.toml")).unwrap(), None);
    }

    #[test]
    fn load_all_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "global.toml",
            "socket = \"tcp://127.0.0.1:9999\"\nbackend = \"web\"\nverbose = true\ntimeout = 3\n",
        );
        let settings = Settings::load(&path).unwrap().unwrap();
        assert_eq!(settings.socket.as_deref(), Some("tcp://127.0.0.1:9999"));
        assert_eq!(settings.backend.as_deref(), Some("web"));
        assert!(settings.verbose());
        assert_eq!(settings.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn later_layers_override() {
        let dir = TempDir::new().unwrap();
        let global = write(
            &dir,
            "global.toml",
            "socket = \"/var/run/haproxy.sock\"\nbackend = \"web\"\n",
        );
        let user = write(&dir, "user.toml", "backend = \"api\"\nverbose = true\n");
        let missing = dir.path().join("missing.toml");

        let settings = Settings::layered(&[global, missing, user]).unwrap();
        assert_eq!(
            settings,
            Settings {
                socket: Some("/var/run/haproxy.sock".to_string()),
                backend: Some("api".to_string()),
                verbose: Some(true),
                timeout: None,
            }
        );
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.toml", "socket = \n");
        match Settings::load(&path) {
            Err(HaproxyError::Config { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string())
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "typo.toml", "sokcet = \"/tmp/haproxy.sock\"\n");
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn user_file_follows_global() {
        let paths = default_paths();
        assert_eq!(paths[0], PathBuf::from(GLOBAL_CONFIG));
        if let Some(user) = paths.get(1) {
            assert!(user.ends_with("haproxyctl/config.toml"));
        }
    }
}
