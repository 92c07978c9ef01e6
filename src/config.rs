use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";

fn default_server_url() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Websocket URL of the chat relay.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Optional preset identity; the stored one wins when both exist.
    #[serde(default)]
    pub user_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            user_name: None,
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

/// Remember a relay URL passed on the command line so the next plain start
/// reuses it.
pub fn persist_server_url(path: &str, url: &str) {
    let mut config = load_config(path);
    config.server_url = url.to_string();

    if let Err(err) = save_config(path, &config) {
        log::error!("Failed to write config {path}: {err}");
    } else {
        log::info!("Persisted relay url {url} to {path}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("config/definitely-not-here.json");
        assert_eq!(config.server_url, default_server_url());
        assert_eq!(config.user_name, None);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("rust_private_chat_bad_config.json");
        fs::write(&path, "{not json").unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.server_url, default_server_url());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"user_name":"alice"}"#).unwrap();
        assert_eq!(config.user_name.as_deref(), Some("alice"));
        assert_eq!(config.server_url, default_server_url());
    }
}
