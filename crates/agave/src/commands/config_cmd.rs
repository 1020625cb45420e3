//! Config subcommand handlers.

use agave_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::{config_path, load_existing};
use crate::error::CliError;

/// Map an interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config_path(global).display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = load_existing(global)?;
            print!("{}", cfg.redacted().to_toml_string()?);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { force } => {
            let path = config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = Config::starter();
            agave_config::save_config_to(&cfg, &path)?;

            eprintln!("✓ Configuration written to {}", path.display());
            if let Some(guid) = &cfg.sensor.guid {
                eprintln!("  Sensor GUID: {guid}");
            }
            if let Some(ident) = &cfg.feed.ident {
                eprintln!("  Broker ident: {ident}");
            }
            eprintln!("\n  Next: agave config set-secret");
            Ok(())
        }

        // ── Check ───────────────────────────────────────────────────
        ConfigCommand::Check => {
            let cfg = load_existing(global)?;
            let sensor = cfg.sensor_config()?;
            let endpoint = cfg.endpoint()?;

            println!(
                "sensor  {} ({}/{}) at {}:{}",
                sensor.guid, sensor.app, sensor.channel, sensor.ip, sensor.port
            );
            println!("feed    {endpoint} -> {}", cfg.feed.channel);
            eprintln!("✓ Configuration is valid");
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret => {
            let cfg = load_existing(global)?;
            cfg.validate_feed()?;
            let ident = cfg.feed.ident.unwrap_or_default();

            let secret = rpassword::prompt_password(format!("Broker secret for '{ident}': "))
                .map_err(prompt_err)?;

            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            agave_config::store_secret(&ident, &secret)?;
            eprintln!("✓ Secret stored in system keyring for ident '{ident}'");
            Ok(())
        }
    }
}
