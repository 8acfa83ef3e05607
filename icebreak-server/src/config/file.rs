//! TOML file configuration structures.
//!
//! These structs directly map to the `icebreak-config.toml` file format.
//! Every field has a default, so a missing file or an empty file is valid.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Live join-feed tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Broadcast buffer size; observers that fall further behind are told
    /// they lagged and re-snapshot.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            channel_buffer: default_channel_buffer(),
        }
    }
}

fn default_channel_buffer() -> usize {
    icebreak_core::live::DEFAULT_CHANNEL_BUFFER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[live]
channel_buffer = 64
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.live.channel_buffer, 64);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(
            config.live.channel_buffer,
            icebreak_core::live::DEFAULT_CHANNEL_BUFFER
        );
    }

    #[test]
    fn test_partial_config_fills_missing_sections() {
        let config: FileConfig = toml::from_str("[server]\nlisten = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(
            config.live.channel_buffer,
            icebreak_core::live::DEFAULT_CHANNEL_BUFFER
        );
    }
}
