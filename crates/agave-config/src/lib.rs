//! Configuration for agave sensors.
//!
//! TOML file + `AGAVE_*` environment layering, broker secret resolution
//! (env + keyring + plaintext), and translation to the runtime types of
//! `agave_core` and `agave_feed`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agave_core::SensorConfig;
use agave_feed::Endpoint;

/// Keyring service name; entries are keyed `"{ident}/secret"`.
pub const KEYRING_SERVICE: &str = "agave";

/// Environment prefix for overrides, e.g. `AGAVE_FEED__PORT=10001`.
pub const ENV_PREFIX: &str = "AGAVE_";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no broker secret configured for ident '{ident}'")]
    NoCredentials { ident: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorSection,

    #[serde(default)]
    pub feed: FeedSection,
}

/// Identity stamped on every event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SensorSection {
    #[serde(default = "default_app")]
    pub app: String,

    /// Channel tag written into events (not the publish channel).
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Sensor GUID; `config init` generates one.
    pub guid: Option<String>,

    /// Address the sensor is reachable on.
    #[serde(default = "default_sensor_ip")]
    pub ip: String,

    #[serde(default = "default_sensor_port")]
    pub port: u16,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            app: default_app(),
            channel: default_channel(),
            guid: None,
            ip: default_sensor_ip(),
            port: default_sensor_port(),
        }
    }
}

/// Broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSection {
    #[serde(default = "default_feed_host")]
    pub host: String,

    #[serde(default = "default_feed_port")]
    pub port: u16,

    /// Identity the sensor authenticates as.
    pub ident: Option<String>,

    /// Broker secret (plaintext, prefer keyring or env var).
    pub secret: Option<String>,

    /// Environment variable holding the broker secret.
    pub secret_env: Option<String>,

    /// Channel events are published to.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            host: default_feed_host(),
            port: default_feed_port(),
            ident: None,
            secret: None,
            secret_env: None,
            channel: default_channel(),
        }
    }
}

fn default_app() -> String {
    "agave".into()
}
fn default_channel() -> String {
    "agave.events".into()
}
fn default_sensor_ip() -> String {
    "0.0.0.0".into()
}
fn default_sensor_port() -> u16 {
    8080
}
fn default_feed_host() -> String {
    "127.0.0.1".into()
}
fn default_feed_port() -> u16 {
    10000
}

impl Config {
    /// Starter config for `config init`: defaults plus a fresh GUID and an
    /// ident derived from it.
    pub fn starter() -> Self {
        let guid = uuid::Uuid::new_v4();
        let short = guid.simple().to_string();
        let short = short.get(..8).unwrap_or(&short);

        let mut cfg = Self::default();
        cfg.sensor.guid = Some(guid.to_string());
        cfg.feed.ident = Some(format!("agave-{short}"));
        cfg.feed.secret_env = Some("AGAVE_FEED_SECRET".into());
        cfg
    }

    /// Check every field the runtime needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_sensor()?;
        self.validate_feed()
    }

    pub fn validate_sensor(&self) -> Result<(), ConfigError> {
        require_text("sensor.app", &self.sensor.app)?;
        require_text("sensor.channel", &self.sensor.channel)?;
        require_text("sensor.ip", &self.sensor.ip)?;
        require_port("sensor.port", self.sensor.port)?;
        match self.sensor.guid.as_deref() {
            Some(guid) => require_text("sensor.guid", guid),
            None => Err(missing("sensor.guid")),
        }
    }

    pub fn validate_feed(&self) -> Result<(), ConfigError> {
        require_text("feed.host", &self.feed.host)?;
        require_port("feed.port", self.feed.port)?;
        require_text("feed.channel", &self.feed.channel)?;
        match self.feed.ident.as_deref() {
            Some(ident) => require_text("feed.ident", ident),
            None => Err(missing("feed.ident")),
        }
    }

    /// Event identity for `agave_core::Sensor`.
    pub fn sensor_config(&self) -> Result<SensorConfig, ConfigError> {
        self.validate_sensor()?;
        let guid = self.sensor.guid.clone().ok_or_else(|| missing("sensor.guid"))?;
        Ok(SensorConfig::new(
            self.sensor.app.clone(),
            self.sensor.channel.clone(),
            guid,
            self.sensor.ip.clone(),
            self.sensor.port,
        ))
    }

    /// Broker endpoint with its secret resolved.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        self.validate_feed()?;
        let ident = self.feed.ident.clone().ok_or_else(|| missing("feed.ident"))?;
        let secret = resolve_secret(&self.feed)?;
        Ok(Endpoint::new(
            self.feed.host.clone(),
            self.feed.port,
            ident,
            secret,
        ))
    }

    /// Copy safe to print: the plaintext secret is masked.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.feed.secret.is_some() {
            cfg.feed.secret = Some(REDACTED.into());
        }
        cfg
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: "is required".into(),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

fn require_port(field: &str, port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be between 1 and 65535".into(),
        });
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "agave", "agave").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("agave");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults
/// (still subject to environment overrides).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    tracing::debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml_string()?)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve the broker secret: `secret_env` variable, then the OS keyring,
/// then the plaintext `secret`.
pub fn resolve_secret(feed: &FeedSection) -> Result<SecretString, ConfigError> {
    resolve_secret_with(feed, keyring_secret)
}

/// [`resolve_secret`] with a pluggable keyring lookup.
pub fn resolve_secret_with(
    feed: &FeedSection,
    keyring_lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let ident = feed.ident.as_deref().unwrap_or_default();

    // 1. Named env var
    if let Some(ref env_name) = feed.secret_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                tracing::debug!(source = "env", var = %env_name, "resolved broker secret");
                return Ok(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if !ident.is_empty() {
        if let Some(secret) = keyring_lookup(ident) {
            tracing::debug!(source = "keyring", ident, "resolved broker secret");
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = feed.secret {
        tracing::debug!(source = "config", ident, "resolved broker secret");
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        ident: ident.into(),
    })
}

fn keyring_entry(ident: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{ident}/secret"))?)
}

fn keyring_secret(ident: &str) -> Option<String> {
    keyring_entry(ident).ok()?.get_password().ok()
}

/// Store the broker secret for `ident` in the OS keyring.
pub fn store_secret(ident: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(ident)?.set_password(secret)?;
    Ok(())
}
