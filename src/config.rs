//! Configuration discovery and melding.
//!
//! Options come from up to three YAML files (home directory, working
//! directory, `--config`) melded in that order, with command-line flags
//! applied last. An unreadable or invalid file is logged and treated as
//! empty; a half-broken config should degrade, not abort the run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::error;

/// Config file name searched for in the home and working directories.
pub const CONFIG_FILENAME: &str = "apkfetch.yml";

/// Tool options; everything is optional until [`Config::resolve`] runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub android_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Catalog store path.
    pub store: Option<PathBuf>,
    /// Output directory for downloaded artifacts.
    pub directory: Option<PathBuf>,
    /// Packages to keep current.
    pub apks: Vec<String>,
}

/// Fully resolved options; every mandatory field present.
#[derive(Debug, Clone)]
pub struct Settings {
    pub android_id: String,
    pub email: String,
    pub password: String,
    pub store: PathBuf,
    pub directory: PathBuf,
    pub apks: Vec<String>,
}

/// Mandatory options that were not provided anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingOptions(pub Vec<&'static str>);

impl fmt::Display for MissingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl Config {
    /// Meld `other` over `self`: set scalars override, package lists
    /// union (first occurrence wins the position).
    pub fn meld(&mut self, other: Config) {
        if other.android_id.is_some() {
            self.android_id = other.android_id;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        for apk in other.apks {
            if !self.apks.contains(&apk) {
                self.apks.push(apk);
            }
        }
    }

    /// Names of required options that are still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.android_id.is_none() {
            missing.push("android_id");
        }
        if self.email.is_none() {
            missing.push("email");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        if self.store.is_none() {
            missing.push("store");
        }
        if self.directory.is_none() {
            missing.push("directory");
        }
        if self.apks.is_empty() {
            missing.push("apks");
        }
        missing
    }

    /// Check every mandatory option and produce the resolved settings.
    pub fn resolve(self) -> Result<Settings, MissingOptions> {
        let missing = self.missing();
        let (Some(android_id), Some(email), Some(password), Some(store), Some(directory)) = (
            self.android_id,
            self.email,
            self.password,
            self.store,
            self.directory,
        ) else {
            return Err(MissingOptions(missing));
        };
        if self.apks.is_empty() {
            return Err(MissingOptions(missing));
        }
        Ok(Settings {
            android_id,
            email,
            password,
            store,
            directory,
            apks: self.apks,
        })
    }
}

/// Read one config file. Unreadable or invalid files are logged and
/// treated as empty.
pub fn read_config(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            error!("failed to read config {}: {err}", path.display());
            return Config::default();
        }
    };
    match serde_yaml::from_str(&text) {
        Ok(config) => config,
        Err(err) => {
            error!("failed to parse config {}: {err}", path.display());
            Config::default()
        }
    }
}

/// Candidate config files that exist, in meld order: home directory,
/// working directory, then an explicit `--config` path.
pub fn config_files(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(home) = dirs::home_dir() {
        files.push(home.join(CONFIG_FILENAME));
    }
    files.push(PathBuf::from(CONFIG_FILENAME));
    if let Some(path) = explicit {
        files.push(path.to_path_buf());
    }
    files.into_iter().filter(|p| p.is_file()).collect()
}

/// Load and meld every discovered config file.
pub fn load(explicit: Option<&Path>) -> Config {
    let mut config = Config::default();
    for path in config_files(explicit) {
        config.meld(read_config(&path));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn meld_scalars_override_and_lists_union() {
        let mut base = Config {
            android_id: Some("one".to_string()),
            email: None,
            apks: vec!["com.a".to_string(), "com.b".to_string()],
            ..Config::default()
        };
        base.meld(Config {
            android_id: Some("two".to_string()),
            email: Some("user@example.com".to_string()),
            apks: vec!["com.b".to_string(), "com.c".to_string()],
            ..Config::default()
        });

        assert_eq!(base.android_id.as_deref(), Some("two"));
        assert_eq!(base.email.as_deref(), Some("user@example.com"));
        assert_eq!(base.apks, vec!["com.a", "com.b", "com.c"]);
    }

    #[test]
    fn meld_skips_unset_values() {
        let mut base = Config {
            android_id: Some("one".to_string()),
            ..Config::default()
        };
        base.meld(Config::default());
        assert_eq!(base.android_id.as_deref(), Some("one"));
    }

    #[test]
    fn missing_names_every_absent_option() {
        let config = Config::default();
        assert_eq!(
            config.missing(),
            vec!["android_id", "email", "password", "store", "directory", "apks"]
        );
        assert!(config.resolve().is_err());
    }

    #[test]
    fn resolve_succeeds_when_complete() {
        let config = Config {
            android_id: Some("3c67a4bb8d2a3e50".to_string()),
            email: Some("user@example.com".to_string()),
            password: Some("secret".to_string()),
            store: Some(PathBuf::from("apks.db")),
            directory: Some(PathBuf::from(".")),
            apks: vec!["com.a".to_string()],
        };
        let settings = config.resolve().unwrap();
        assert_eq!(settings.android_id, "3c67a4bb8d2a3e50");
        assert_eq!(settings.apks, vec!["com.a"]);
    }

    #[test]
    fn unreadable_config_is_empty() {
        let config = read_config(Path::new("/nonexistent/apkfetch.yml"));
        assert!(config.android_id.is_none());
        assert!(config.apks.is_empty());
    }

    #[test]
    fn invalid_yaml_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apks: [unterminated").unwrap();
        let config = read_config(file.path());
        assert!(config.apks.is_empty());
    }

    #[test]
    fn yaml_fields_deserialize() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "android_id: 3c67a4bb8d2a3e50\nemail: user@example.com\napks:\n  - com.a\n  - com.b"
        )
        .unwrap();
        let config = read_config(file.path());
        assert_eq!(config.android_id.as_deref(), Some("3c67a4bb8d2a3e50"));
        assert_eq!(config.apks, vec!["com.a", "com.b"]);
    }
}
