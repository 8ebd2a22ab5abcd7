//! Server configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the trained artifact set
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Review corpus read by `POST /load-data`
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Origins allowed to call the API with credentials
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Load the review corpus before serving
    #[serde(default)]
    pub load_on_startup: bool,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: impl AsRef<Path>, cli: &Cli) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();

        // Try to load from file, or use defaults
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(dir) = &cli.artifacts {
            config.artifacts_dir = dir.clone();
        }
        if let Some(path) = &cli.dataset {
            config.dataset_path = path.clone();
        }
        if !cli.allow_origin.is_empty() {
            config.allowed_origins = cli.allow_origin.clone();
        }
        if cli.load_on_startup {
            config.load_on_startup = true;
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            dataset_path: default_dataset_path(),
            allowed_origins: default_allowed_origins(),
            load_on_startup: false,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("dataset/reviews.csv")
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_without_file() {
        let cli = Cli::parse_from(["reviewsense-server"]);
        let config = ServerConfig::load("/nonexistent/server.yaml", &cli).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert!(!config.load_on_startup);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(
            &path,
            "port: 9000\nartifacts_dir: /srv/models\nallowed_origins: [\"https://a.example\"]\n",
        )
        .unwrap();

        let cli = Cli::parse_from(["reviewsense-server", "-P", "9100", "--load-on-startup"]);
        let config = ServerConfig::load(&path, &cli).unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.allowed_origins, vec!["https://a.example"]);
        assert!(config.load_on_startup);
    }
}
