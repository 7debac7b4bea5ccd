use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENVIRONMENT: &str = "demo";
pub const DEFAULT_AUTH_URL: &str = "https://pronto.getstream.io/api/auth/create-token";
pub const DEFAULT_MEET_API_URL: &str = "https://meet.huddle.app/api/v1.0/";

const CONFIG_FILE: &str = "config.json";

/// Client configuration, read once at startup from `<data_dir>/config.json`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_meet_api_url")]
    pub meet_api_url: String,
    #[serde(default = "default_sign_out_grace_ms")]
    pub sign_out_grace_ms: u64,
    #[serde(default = "default_true")]
    pub mic_enabled_on_join: bool,
    #[serde(default)]
    pub camera_enabled_on_join: bool,
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_meet_api_url() -> String {
    DEFAULT_MEET_API_URL.to_string()
}

fn default_sign_out_grace_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            auth_url: default_auth_url(),
            meet_api_url: default_meet_api_url(),
            sign_out_grace_ms: default_sign_out_grace_ms(),
            mic_enabled_on_join: true,
            camera_enabled_on_join: false,
        }
    }
}

impl ClientConfig {
    /// Load the config from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring invalid config at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn sign_out_grace(&self) -> Duration {
        Duration::from_millis(self.sign_out_grace_ms)
    }
}
