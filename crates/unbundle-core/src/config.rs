//! Dev server configuration.
//!
//! Layered as defaults ← `unbundle.config.json` ← CLI overrides.
//!
//! ```json
//! {
//!   "host": "localhost",
//!   "port": 3000,
//!   "index": "index.html",
//!   "modulesDir": "node_modules",
//!   "requestTimeoutSecs": 30,
//!   "componentCache": true
//! }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the project root when none is given explicitly.
pub const CONFIG_FILE: &str = "unbundle.config.json";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration for the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DevConfig {
    /// Project root. Request paths are joined onto this directory.
    pub root: PathBuf,

    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Entry HTML file, relative to the root.
    pub index: PathBuf,

    /// Directory holding installed packages, relative to the root.
    pub modules_dir: PathBuf,

    /// Per-request timeout. `None` disables it.
    pub request_timeout_secs: Option<u64>,

    /// Hand parsed component descriptors from the script request to the
    /// template request instead of parsing the source twice.
    pub component_cache: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            index: PathBuf::from("index.html"),
            modules_dir: PathBuf::from("node_modules"),
            request_timeout_secs: None,
            component_cache: true,
        }
    }
}

/// Values supplied on the command line. `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub index: Option<PathBuf>,
    pub modules_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub no_component_cache: bool,
}

impl DevConfig {
    /// Create a config rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load configuration for `root`.
    ///
    /// If `explicit` is `Some`, that file must exist. Otherwise
    /// `unbundle.config.json` is used when present and defaults apply when not.
    /// The `root` argument always wins over a `root` key in the file.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) if p.is_absolute() => Some(p.to_path_buf()),
            Some(p) => Some(root.join(p)),
            None => {
                let candidate = root.join(CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str::<Self>(&text)
                    .map_err(|source| ConfigError::Parse { path, source })?
            }
            None => Self::default(),
        };

        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn merge_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(index) = overrides.index {
            self.index = index;
        }
        if let Some(modules_dir) = overrides.modules_dir {
            self.modules_dir = modules_dir;
        }
        if overrides.request_timeout_secs.is_some() {
            self.request_timeout_secs = overrides.request_timeout_secs;
        }
        if overrides.no_component_cache {
            self.component_cache = false;
        }
        self
    }

    /// Absolute path of the entry HTML file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }

    /// Absolute path of the installed-packages directory.
    #[must_use]
    pub fn modules_path(&self) -> PathBuf {
        self.root.join(&self.modules_dir)
    }

    /// Enable or disable the component descriptor hand-off.
    #[must_use]
    pub fn with_component_cache(mut self, enabled: bool) -> Self {
        self.component_cache = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DevConfig::new(PathBuf::from("/project"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.index_path(), PathBuf::from("/project/index.html"));
        assert_eq!(
            config.modules_path(),
            PathBuf::from("/project/node_modules")
        );
        assert!(config.component_cache);
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = DevConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_load_discovers_config_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"port": 4000, "modulesDir": "vendor", "componentCache": false}"#,
        )
        .unwrap();

        let config = DevConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.modules_dir, PathBuf::from("vendor"));
        assert!(!config.component_cache);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = tempdir().unwrap();
        let err = DevConfig::load(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"prot": 4000}"#).unwrap();
        let err = DevConfig::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides_win() {
        let config = DevConfig::new(PathBuf::from("/project")).merge_overrides(ConfigOverrides {
            port: Some(8080),
            request_timeout_secs: Some(5),
            no_component_cache: true,
            ..Default::default()
        });
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout_secs, Some(5));
        assert!(!config.component_cache);
        assert_eq!(config.host, "localhost");
    }
}
