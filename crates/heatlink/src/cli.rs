//! Clap derive structures for the `heatlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// heatlink -- frame tools and device profiles for HBU1S parking heaters
#[derive(Debug, Parser)]
#[command(
    name = "heatlink",
    version,
    about = "Build and inspect HBU1S heater frames, manage device profiles",
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
    /// Device profile to use
    #[arg(long, short = 'd', env = "HEATLINK_DEVICE", global = true)]
    pub device: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HEATLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "plain", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Pretty-printed JSON
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode a command frame as hex
    #[command(alias = "enc")]
    Encode(EncodeArgs),

    /// Decode a status notification frame
    #[command(alias = "dec")]
    Decode(DecodeArgs),

    /// Manage device profiles
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Encode ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub frame: EncodeFrame,
}

#[derive(Debug, Subcommand)]
pub enum EncodeFrame {
    /// Wake/handshake frame
    Init,
    /// Keepalive/status refresh frame (honours the device's override)
    StatusQuery,
    /// Power on or off
    Power {
        #[arg(value_enum)]
        state: PowerState,
    },
    /// Set target temperature; values outside 8-36 are clamped
    Temp {
        #[arg(allow_negative_numbers = true)]
        celsius: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

// ── Decode ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Frame as hex; spaces and colons are ignored
    pub frame: String,

    /// Override the layout (auto, live-target, stored-target)
    #[arg(long, short = 'l')]
    pub layout: Option<String>,
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
    /// Print the effective configuration as TOML
    Show,
    /// List configured devices
    #[command(alias = "ls")]
    List,
    /// Add or replace a device profile
    Add(AddDeviceArgs),
    /// Remove a device profile
    #[command(alias = "rm")]
    Remove {
        name: String,
    },
    /// Make a device the default
    Use {
        name: String,
    },
    /// Validate a device profile and print the resolved session settings
    Check {
        /// Device name (defaults to --device or default_device)
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct AddDeviceArgs {
    /// Profile name
    pub name: String,

    /// BLE address (AA:BB:CC:DD:EE:FF or platform UUID)
    #[arg(long, short = 'a')]
    pub address: String,

    /// Friendly name used in logs
    #[arg(long)]
    pub label: Option<String>,

    /// Firmware layout
    #[arg(long, short = 'l', default_value = "auto")]
    pub layout: String,

    /// Replacement keepalive frame as hex
    #[arg(long)]
    pub status_query: Option<String>,

    /// Also make this the default device
    #[arg(long)]
    pub default: bool,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
