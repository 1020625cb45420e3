//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use agave_config::ConfigError;
use agave_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file not found")]
    #[diagnostic(
        code(agave::no_config),
        help(
            "Create one with: agave config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(agave::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(
        code(agave::config),
        help("Check the TOML syntax and any AGAVE_* environment overrides.")
    )]
    ConfigLoad { message: String },

    // ── Credentials ──────────────────────────────────────────────────

    #[error("No broker secret configured for ident '{ident}'")]
    #[diagnostic(
        code(agave::no_credentials),
        help(
            "Store one with: agave config set-secret\n\
             Or set feed.secret_env to a variable holding the secret."
        )
    )]
    NoCredentials { ident: String },

    #[error("Keyring error: {reason}")]
    #[diagnostic(code(agave::keyring))]
    Keyring { reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(agave::validation))]
    Validation { field: String, reason: String },

    // ── Events ───────────────────────────────────────────────────────

    #[error("Could not build event: {0}")]
    #[diagnostic(code(agave::event))]
    Event(#[source] CoreError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render event JSON: {0}")]
    #[diagnostic(code(agave::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { ident } => CliError::NoCredentials { ident },
            ConfigError::Keyring(reason) => CliError::Keyring { reason },
            ConfigError::Io(e) => CliError::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                CliError::ConfigLoad {
                    message: other.to_string(),
                }
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedAddress { addr, reason } => CliError::Validation {
                field: "remote".into(),
                reason: format!("'{addr}': {reason}"),
            },
            CoreError::Serialization(e) => CliError::Json(e),
            other => CliError::Event(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(
            CliError::NoCredentials { ident: "s".into() }.exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::NoConfig { path: "/x".into() }.exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::ConfigExists { path: "/x".into() }.exit_code(),
            exit_code::CONFLICT
        );
        assert_eq!(
            CliError::Keyring { reason: "locked".into() }.exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn malformed_address_is_a_usage_error() {
        let err = CliError::from(CoreError::MalformedAddress {
            addr: "nope".into(),
            reason: "missing port in address".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(
            err.to_string(),
            "Invalid value for remote: 'nope': missing port in address"
        );
    }

    #[test]
    fn config_validation_keeps_the_field() {
        let err = CliError::from(ConfigError::Validation {
            field: "sensor.guid".into(),
            reason: "is required".into(),
        });
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "sensor.guid"));
    }
}
