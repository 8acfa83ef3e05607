//! Configuration loading for the server binary.

mod file;

pub use file::{FileConfig, LiveConfig, ServerConfig};

use anyhow::Context;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Loads the TOML configuration, applying CLI overrides.
pub struct ConfigLoader {
    path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(path: &Path, listen_override: Option<SocketAddr>) -> Self {
        Self {
            path: path.to_owned(),
            listen_override,
        }
    }

    /// Read the TOML file; a missing file yields the built-in defaults.
    pub fn load(&self) -> anyhow::Result<FileConfig> {
        let mut config = if self.path.exists() {
            let raw = std::fs::read_to_string(&self.path)
                .with_context(|| format!("failed to read config file {:?}", self.path))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {:?}", self.path))?
        } else {
            tracing::info!(path = ?self.path, "config file not found, using defaults");
            FileConfig::default()
        };
        if let Some(listen) = self.listen_override {
            config.server.listen = listen;
        }
        Ok(config)
    }
}

/// The database URL comes from the environment, never from the file.
pub fn get_database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")
}
