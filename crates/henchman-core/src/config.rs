use crate::error::ConfigError;
use crate::target::DEFAULT_SSH_PORT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
/// Loaded from ~/.config/henchman/config.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Connection defaults. Command-line flags take precedence over these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub private_keyfile: Option<PathBuf>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            user: None,
            private_keyfile: None,
            port: default_port(),
            password: false,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl Config {
    /// Load config from the default path, or an empty config if none exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        // An empty file is a valid, empty config.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("henchman")
            .join("config.yaml")
    }
}

impl Defaults {
    /// Private key to use: configured path, else ~/.ssh/id_rsa.
    pub fn keyfile(&self) -> PathBuf {
        self.private_keyfile.clone().unwrap_or_else(default_keyfile)
    }
}

/// ~/.ssh/id_rsa
pub fn default_keyfile() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(".ssh")
        .join("id_rsa")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "defaults:\n  user: deploy").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.user.as_deref(), Some("deploy"));
        assert_eq!(config.defaults.port, 22);
        assert!(!config.defaults.password);
        assert_eq!(config.defaults.keyfile(), default_keyfile());
    }

    #[test]
    fn reads_all_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "defaults:\n  user: ops\n  private_keyfile: /keys/ops\n  port: 2222\n  password: true"
        )
        .unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.port, 2222);
        assert!(config.defaults.password);
        assert_eq!(config.defaults.keyfile(), PathBuf::from("/keys/ops"));
    }

    #[test]
    fn empty_file_is_default_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.port, DEFAULT_SSH_PORT);
    }

    #[test]
    fn invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "defaults: [").unwrap();
        assert!(matches!(Config::load_from(file.path()), Err(ConfigError::Yaml(_))));
    }
}
