//! Configuration loading and validation.
//!
//! Loads configuration from `$RISKSCAN_CONFIG_PATH`, else `./riskscan.toml`,
//! else `~/.riskscan/riskscan.toml`.
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::chat::render::DEFAULT_BOOKING_URL;
use crate::chat::DEFAULT_THINKING_DELAY_MS;
use crate::gateway::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "RISKSCAN_CONFIG_PATH";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "riskscan.toml";

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation endpoint settings.
    pub gateway: GatewayConfig,
    /// Chat assistant settings.
    pub chat: ChatConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// If the file does not exist, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = config_dir().ok();
        let path = config_path_with(&env, home.as_deref());
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(&env);
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides. A missing file yields defaults.
    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config at {}", path.display()))
            }
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("RISKSCAN_API_KEY") {
            self.gateway.api_key = v;
        }
        if let Some(v) = env("RISKSCAN_MODEL") {
            self.gateway.model = v;
        }
        if let Some(v) = env("RISKSCAN_BASE_URL") {
            self.gateway.base_url = v;
        }
        if let Some(v) = env("RISKSCAN_BOOKING_URL") {
            self.chat.booking_url = v;
        }
        if let Some(v) = env("RISKSCAN_THINKING_DELAY_MS") {
            match v.parse() {
                Ok(n) => self.chat.thinking_delay_ms = n,
                Err(_) => tracing::warn!(
                    var = "RISKSCAN_THINKING_DELAY_MS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("RISKSCAN_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("RISKSCAN_LOGS_DIR") {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }
    }

    /// Check URLs and numeric limits.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.gateway.base_url)
            .with_context(|| format!("invalid gateway.base_url {:?}", self.gateway.base_url))?;
        url::Url::parse(&self.chat.booking_url)
            .with_context(|| format!("invalid chat.booking_url {:?}", self.chat.booking_url))?;
        if self.gateway.model.trim().is_empty() {
            anyhow::bail!("gateway.model must be non-empty");
        }
        if self.gateway.timeout_seconds == 0 {
            anyhow::bail!("gateway.timeout_seconds must be greater than zero");
        }
        Ok(())
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }
}

/// Resolve config file path using a custom env resolver.
///
/// The working-directory file wins over the per-user one in `home` when it
/// exists; with neither present the working-directory path is returned.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>, home: Option<&Path>) -> PathBuf {
    if let Some(p) = env(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    match home {
        Some(dir) if !local.exists() && dir.join(DEFAULT_CONFIG_FILE).exists() => {
            dir.join(DEFAULT_CONFIG_FILE)
        }
        _ => local,
    }
}

/// Resolve the default per-user data directory (`~/.riskscan/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".riskscan"))
}

// ── Gateway config ──────────────────────────────────────────────

/// Generation endpoint settings (`[gateway]`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Models collection URL; the model and `:generateContent` are appended.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key. Empty means unauthenticated; the endpoint will reject calls.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl GatewayConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field(
                "api_key",
                &if self.api_key.is_empty() {
                    "<unset>"
                } else {
                    "__REDACTED__"
                },
            )
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            api_key: String::new(),
            timeout_seconds: 30,
        }
    }
}

// ── Chat config ─────────────────────────────────────────────────

/// Chat assistant settings (`[chat]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Scheduling URL behind the booking call-to-action.
    pub booking_url: String,
    /// Simulated thinking delay before the personalized greeting.
    pub thinking_delay_ms: u64,
}

impl ChatConfig {
    /// Thinking delay as a duration.
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            booking_url: DEFAULT_BOOKING_URL.to_owned(),
            thinking_delay_ms: DEFAULT_THINKING_DELAY_MS,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Logging settings (`[logging]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for JSON log files; console only when unset.
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            logs_dir: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
