//! Configuration management for rulesd.
//!
//! Loads settings from a TOML file or uses defaults, then applies
//! environment overrides (`PORT` being the one most deployments set).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RULESD_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_PATH: &str = "rulesd.toml";

/// System-wide fallback config file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rulesd/config.toml";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Listen port, overridable with `PORT`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 // long inputs pass through; the model enforces its own limits
}

fn default_cors_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: default_cors_enabled(),
        }
    }
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model the rules are evaluated with. Matched as a substring of the
    /// backend's model names, so "llama3" accepts "llama3:latest".
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for the model listing call in seconds
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,

    /// Timeout for the chat completion call in seconds
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_list_timeout() -> u64 {
    5
}

fn default_chat_timeout() -> u64 {
    120 // local inference on CPU-only hosts is slow
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            list_timeout_secs: default_list_timeout(),
            chat_timeout_secs: default_chat_timeout(),
        }
    }
}

/// Rule set location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("rules.txt")
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub rules: RulesConfig,
}

impl Config {
    /// Load config from the first file found, or return defaults.
    /// Environment overrides are applied in both cases.
    pub fn load() -> Self {
        let mut config = Self::candidate_paths()
            .into_iter()
            .find_map(|path| match Self::load_from_path(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    if path.exists() {
                        warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    }
                    None
                }
            })
            .unwrap_or_else(|| {
                warn!("Config not found, using defaults");
                Config::default()
            });

        config.apply_env_overrides();
        config
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
        paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
        paths
    }

    /// Load config from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (env in production, a map in tests)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!("Ignoring invalid PORT value: {:?}", port),
            }
        }
        if let Some(path) = lookup("RULESD_RULES_PATH") {
            self.rules.path = PathBuf::from(path);
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.endpoint = normalize_endpoint(&host);
        }
        if let Some(model) = lookup("RULESD_MODEL") {
            self.ollama.model = model;
        }
    }

    /// Socket address string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }
}

/// `OLLAMA_HOST` is commonly given as a bare `host:port`
fn normalize_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
