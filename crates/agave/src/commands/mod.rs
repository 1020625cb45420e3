//! Subcommand handlers.

pub mod config_cmd;
pub mod event_cmd;

use std::path::PathBuf;

use agave_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config path from `--config` / `AGAVE_CONFIG`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(agave_config::config_path)
}

/// Load the config, failing if the file does not exist.
pub fn load_existing(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    if !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(agave_config::load_config_from(&path)?)
}
