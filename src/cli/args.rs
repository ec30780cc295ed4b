//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::application::Exchange;

/// PoaBot Panel - host administration for the PoaBot trading bot
#[derive(Parser, Debug)]
#[command(name = "poabot-panel")]
#[command(version)]
#[command(about = "Configure, run, update and expose the PoaBot container")]
#[command(long_about = None)]
pub struct Cli {
    /// Panel settings file
    #[arg(long, global = true, env = "POABOT_PANEL_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View and edit the bot configuration (env file)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Validate and persist the configuration, syncing the proxy whitelist
    Save {
        /// Allowed IPs, separated by commas, semicolons or spaces (default: current list)
        #[arg(short = 'w', long, value_name = "IPS")]
        whitelist: Option<String>,
    },
    /// Control the bot container
    Bot {
        #[command(subcommand)]
        action: BotAction,
    },
    /// DNS check and domain connection
    Domain {
        #[command(subcommand)]
        action: DomainAction,
    },
    /// Send a test order to the running bot
    Trigger(TriggerArgs),
    /// Manage the panel's own settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

/// Bot configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// List all values (secrets masked)
    Show {
        /// Print secrets in full
        #[arg(long)]
        reveal: bool,
    },
    /// Print one value
    Get {
        /// Config key, e.g. PASSWORD
        key: String,
    },
    /// Set one value and save
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// List the keys the bot understands
    Keys,
    /// Validate whitelist input without saving
    CheckWhitelist {
        /// Allowed IPs, separated by commas, semicolons or spaces
        input: String,
    },
}

/// Bot container actions
#[derive(Subcommand, Debug)]
pub enum BotAction {
    /// Replace the container with a fresh one from the latest image
    Start,
    /// Show container status and version
    Status,
    /// Show the running image version
    Version,
    /// List published versions, newest first
    Versions,
    /// Pull a version and make it the latest image
    Update {
        /// Version to install (default: newest published)
        version: Option<String>,
    },
    /// Check status now and periodically until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 30, value_name = "SECS")]
        interval: u64,
    },
}

/// Domain actions
#[derive(Subcommand, Debug)]
pub enum DomainAction {
    /// Show this server's primary address
    Ip,
    /// Check that the configured domain resolves to this server
    Check,
    /// Check DNS, save, and bind the proxy and dashboard to the domain
    Connect {
        /// Allowed IPs (default: current list)
        #[arg(short = 'w', long, value_name = "IPS")]
        whitelist: Option<String>,
    },
}

/// Panel settings actions
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Create the settings file with defaults
    Init,
    /// Show effective settings
    Show,
    /// Show settings file path
    Path,
}

/// Test order arguments
#[derive(Args, Debug)]
pub struct TriggerArgs {
    #[arg(short = 'e', long, value_name = "EXCHANGE")]
    pub exchange: ExchangeArg,

    /// Trading pair, e.g. BTC/USDT
    #[arg(short = 's', long)]
    pub symbol: String,

    /// Order signal, e.g. buy or sell
    #[arg(long)]
    pub signal: String,

    #[arg(short = 'a', long)]
    pub amount: f64,

    /// Extra payload field as KEY=VALUE (repeatable)
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

/// Exchange argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExchangeArg {
    Binance,
    Bybit,
    Bitget,
    Okx,
}

impl From<ExchangeArg> for Exchange {
    fn from(arg: ExchangeArg) -> Self {
        match arg {
            ExchangeArg::Binance => Exchange::Binance,
            ExchangeArg::Bybit => Exchange::Bybit,
            ExchangeArg::Bitget => Exchange::Bitget,
            ExchangeArg::Okx => Exchange::Okx,
        }
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
