//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use lodgewire::config::{ChainNetwork, PlatformConfig};
use std::path::PathBuf;

/// Cross-chain payment verification tools for the booking platform.
#[derive(Parser, Debug)]
#[command(name = "lodgewire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Attesting-chain network.
    #[arg(long, value_enum, default_value = "flare", env = "LODGEWIRE_NETWORK")]
    pub network: CliNetwork,

    /// Attesting-chain RPC URL override.
    #[arg(long, env = "LODGEWIRE_RPC_URL")]
    pub rpc_url: Option<String>,

    /// XRPL JSON-RPC endpoints, tried in order.
    #[arg(long, env = "LODGEWIRE_XRPL_ENDPOINT")]
    pub xrpl_endpoint: Vec<String>,

    /// Booking escrow contract address (e.g., "0x...").
    #[arg(long, env = "LODGEWIRE_BOOKING_CONTRACT")]
    pub booking_contract: Option<String>,

    /// Log level.
    #[arg(long, value_enum, default_value = "info", env = "RUST_LOG")]
    pub log_level: CliLogLevel,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the latest oracle price for a feed symbol.
    Price {
        /// Feed symbol, e.g. "XRP/USD".
        symbol: String,
    },
    /// Convert an amount between currencies via oracle feeds.
    Convert {
        /// Amount in the source currency.
        amount: f64,
        /// Source currency code, e.g. "USD".
        from: String,
        /// Target currency code, e.g. "XRP".
        to: String,
    },
    /// Look up an XRPL account balance.
    Balance {
        /// XRPL account address (r...).
        address: String,
    },
    /// Score a wallet address against the fraud engine.
    CheckWallet {
        /// Wallet address on the booking chain (0x...).
        address: String,
        /// Days since the wallet's first activity.
        #[arg(long, default_value_t = 0)]
        age_days: u32,
        /// Completed bookings. Read from the booking contract when
        /// omitted and a contract is configured.
        #[arg(long)]
        bookings: Option<u32>,
    },
    /// Check an XRPL address format.
    ValidateAddress {
        /// Address to check.
        address: String,
    },
}

/// Chain network CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum CliNetwork {
    /// Flare mainnet.
    #[default]
    Flare,
    /// Coston2 testnet.
    Coston2,
}

/// Log level CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum CliLogLevel {
    /// Error messages only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages (default).
    #[default]
    Info,
    /// Debug messages.
    Debug,
    /// Trace messages (verbose).
    Trace,
}

impl Cli {
    /// Convert CLI arguments into a `PlatformConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be
    /// loaded.
    pub fn into_config(self) -> color_eyre::Result<PlatformConfig> {
        // Start with the network preset or load from file
        let mut config = if let Some(ref path) = self.config {
            PlatformConfig::from_file(path)?
        } else {
            match self.network {
                CliNetwork::Flare => PlatformConfig::default(),
                CliNetwork::Coston2 => PlatformConfig::testnet(),
            }
        };

        // Override with CLI arguments
        config.chain.network = self.network.into();
        if let Some(rpc_url) = self.rpc_url {
            config.chain.rpc_url = Some(rpc_url);
        }
        if let Some(booking_contract) = self.booking_contract {
            config.chain.booking_contract = Some(booking_contract);
        }
        if !self.xrpl_endpoint.is_empty() {
            config.ledger.endpoints = self.xrpl_endpoint;
        }
        config.log_level = self.log_level.into();

        Ok(config)
    }
}

impl From<CliNetwork> for ChainNetwork {
    fn from(n: CliNetwork) -> Self {
        match n {
            CliNetwork::Flare => Self::Flare,
            CliNetwork::Coston2 => Self::Coston2,
        }
    }
}

impl From<CliLogLevel> for String {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => "error".to_string(),
            CliLogLevel::Warn => "warn".to_string(),
            CliLogLevel::Info => "info".to_string(),
            CliLogLevel::Debug => "debug".to_string(),
            CliLogLevel::Trace => "trace".to_string(),
        }
    }
}
