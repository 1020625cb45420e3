//! Clap derive structures for the `agave` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// agave -- honeypot sensor configuration and event tooling
#[derive(Debug, Parser)]
#[command(
    name = "agave",
    version,
    about = "Configure agave sensors and inspect the events they publish",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "AGAVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and bootstrap the configuration file
    Config(ConfigArgs),

    /// Build attack events locally and print their JSON
    Event(EventArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective config with secrets masked
    Show,

    /// Write a starter config with a fresh sensor GUID
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config and resolve the broker secret
    Check,

    /// Store the broker secret in the system keyring
    SetSecret,
}

// ── Event ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventArgs {
    /// Print compact single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: EventCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// Build an HTTP attack event
    Http(HttpEventArgs),

    /// Build a credential event
    Credentials(CredentialEventArgs),
}

#[derive(Debug, Args)]
pub struct HttpEventArgs {
    /// Peer address, "ip:port"
    #[arg(long)]
    pub remote: String,

    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Request target as sent on the request line
    #[arg(long, default_value = "/")]
    pub target: String,

    /// Host the client asked for
    #[arg(long)]
    pub host: Option<String>,

    /// Header as "Name: value" (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Request body
    #[arg(long, short = 'd')]
    pub body: Option<String>,

    /// Signature to stamp on the event
    #[arg(long, default_value = "")]
    pub signature: String,

    /// Mark these source IPs as previously seen (repeatable)
    #[arg(long = "seen")]
    pub seen: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CredentialEventArgs {
    /// Peer address, "ip:port"
    #[arg(long)]
    pub remote: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}
