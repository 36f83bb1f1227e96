//! Configuration file store
//!
//! The configuration file is INI-style text, usually `~/.swiftly.conf`:
//!
//! ```ini
//! [swiftly]
//! auth_url = https://identity.example.com/v2.0
//! auth_user = test:tester
//! retries = 2
//! ```
//!
//! A missing, unreadable or malformed file is never fatal; the store just
//! comes up empty and every lookup falls through to the built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};

use crate::error::{Error, Result};
use crate::options::Environment;

/// Section holding the main options
pub const SECTION: &str = "swiftly";

/// Environment variable naming the configuration file
pub const CONF_ENV: &str = "SWIFTLY_CONF";

/// Used when neither `--conf` nor `SWIFTLY_CONF` is given
pub const DEFAULT_CONF_PATH: &str = "~/.swiftly.conf";

/// Section name to key/value mapping loaded from the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigStore {
    /// Load the store from `path`, degrading to an empty store on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::debug!("ignoring configuration file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }

        let raw = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        let tables: HashMap<String, config::Value> = raw
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;

        let mut sections = HashMap::new();
        for (name, value) in tables {
            // Keys outside of any section are not addressable; skip them.
            let Ok(table) = value.into_table() else {
                continue;
            };
            let mut entries = HashMap::new();
            for (key, value) in table {
                let value = value
                    .into_string()
                    .map_err(|e| Error::Config(format!("[{name}] {key}: {e}")))?;
                entries.insert(key, value);
            }
            sections.insert(name, entries);
        }

        Ok(Self { sections })
    }

    /// Build a store from in-memory sections
    pub fn from_sections<I, S, K, V>(sections: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<(K, V)>)>,
        S: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        let sections = sections
            .into_iter()
            .map(|(name, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect();
                (name.into(), entries)
            })
            .collect();
        Self { sections }
    }

    /// Look up `key` in `section`
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Resolve the configuration file path: flag, then `SWIFTLY_CONF`, then the default
pub fn resolve_conf_path(flag: Option<&str>, env: &Environment) -> PathBuf {
    let raw = flag
        .or_else(|| env.get(CONF_ENV))
        .unwrap_or(DEFAULT_CONF_PATH);
    expand_home(raw)
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_conf(content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("swiftly.conf");
        std::fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_load_sections() {
        let (_temp_dir, path) = write_conf(
            "[swiftly]\nauth_url = http://127.0.0.1:8080/auth/v1.0\nretries = 2\n\n[other]\nkey = value\n",
        );
        let store = ConfigStore::load(&path);
        assert_eq!(
            store.get("swiftly", "auth_url"),
            Some("http://127.0.0.1:8080/auth/v1.0")
        );
        assert_eq!(store.get("swiftly", "retries"), Some("2"));
        assert_eq!(store.get("other", "key"), Some("value"));
        assert_eq!(store.get("swiftly", "missing"), None);
        assert_eq!(store.get("missing", "key"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::load(&temp_dir.path().join("nope.conf"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let (_temp_dir, path) = write_conf("[swiftly\nthis is = not [valid\n");
        let store = ConfigStore::load(&path);
        assert_eq!(store.get("swiftly", "this is"), None);
    }

    #[test]
    fn test_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::load(temp_dir.path());
        assert!(store.is_empty());
    }

    #[test]
    fn test_resolve_conf_path_precedence() {
        let env = Environment::from_pairs([(CONF_ENV, "/etc/swiftly.conf")]);
        assert_eq!(
            resolve_conf_path(Some("/tmp/flag.conf"), &env),
            PathBuf::from("/tmp/flag.conf")
        );
        assert_eq!(
            resolve_conf_path(None, &env),
            PathBuf::from("/etc/swiftly.conf")
        );

        let empty = Environment::default();
        let default = resolve_conf_path(None, &empty);
        assert!(default.ends_with(".swiftly.conf"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.conf"), home.join("x.conf"));
        }
    }
}
