//! lodgewire CLI entry point.

mod cli;

use async_trait::async_trait;
use clap::Parser;
use cli::{Cli, Command};
use lodgewire::config::OracleConfig;
use lodgewire::fraud::{assess, FraudEngine, WalletIntel};
use lodgewire::ledger::validate_address;
use lodgewire::{ChainClient, PriceOracle, XrplRpcClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(String::from(cli.log_level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("lodgewire v{}", env!("CARGO_PKG_VERSION"));

    let command = cli.command.clone();
    let mut config = cli.into_config()?;

    match command {
        Command::Price { symbol } => {
            let symbol = symbol.to_ascii_uppercase();
            ensure_tracked(&mut config.oracle, &symbol);
            let oracle = connect_oracle(&config).await?;
            let feed = oracle
                .get_price(&symbol)
                .ok_or_else(|| color_eyre::eyre::eyre!("no live feed for {symbol}"))?;
            let freshness = if feed.is_fresh(config.oracle.max_feed_age_ms) {
                "fresh"
            } else {
                "stale"
            };
            println!(
                "{}: {:.6} (voting round {}, {freshness})",
                feed.symbol, feed.value, feed.voting_round
            );
        }
        Command::Convert { amount, from, to } => {
            ensure_pair(&mut config.oracle, &from);
            ensure_pair(&mut config.oracle, &to);
            let oracle = connect_oracle(&config).await?;
            let converted = oracle.convert(amount, &from, &to);
            if converted.abs() < f64::EPSILON
                && amount.abs() >= f64::EPSILON
                && !from.eq_ignore_ascii_case(&to)
            {
                return Err(color_eyre::eyre::eyre!(
                    "conversion unavailable: no live feed for {from} or {to}"
                ));
            }
            println!("{amount} {from} = {converted:.6} {to}");
        }
        Command::Balance { address } => {
            let client = XrplRpcClient::new(&config.ledger);
            let balance = client.account_balance(&address).await?;
            println!(
                "{}: {} ({} drops)",
                balance.address,
                balance.display(),
                balance.drops
            );
        }
        Command::CheckWallet {
            address,
            age_days,
            bookings,
        } => {
            let bookings = match bookings {
                Some(count) => count,
                None if config.chain.booking_contract.is_some() => {
                    let chain = ChainClient::connect(&config.chain).await?;
                    let ids = chain.user_bookings(&address).await?;
                    u32::try_from(ids.len()).unwrap_or(u32::MAX)
                }
                None => 0,
            };
            let engine = FraudEngine::new(
                Arc::new(CliIntel { age_days, bookings }),
                config.fraud.clone(),
            );
            let verification = engine.verify_wallet(&address).await?;
            let assessment = assess(verification.risk_score);
            println!("wallet:   {}", verification.address);
            println!("age:      {} day(s)", verification.age_days);
            println!("bookings: {}", verification.completed_bookings);
            println!("score:    {}", verification.risk_score);
            println!("banned:   {}", if verification.is_banned { "yes" } else { "no" });
            println!("verified: {}", if verification.is_verified { "yes" } else { "no" });
            println!("band:     {}", assessment.description);
        }
        Command::ValidateAddress { address } => match validate_address(&address) {
            Ok(()) => println!("{address} is a well-formed XRPL address"),
            Err(e) => return Err(color_eyre::eyre::eyre!("{e}")),
        },
    }

    Ok(())
}

/// Connect the attesting chain and refresh the oracle once.
async fn connect_oracle(
    config: &lodgewire::PlatformConfig,
) -> color_eyre::Result<PriceOracle> {
    let chain = ChainClient::connect(&config.chain).await?;
    let oracle = PriceOracle::new(Arc::new(chain), config.oracle.clone());
    let live = oracle.refresh().await;
    info!(feeds = live, "price feeds refreshed");
    Ok(oracle)
}

/// Track `symbol` if it is not already configured.
fn ensure_tracked(config: &mut OracleConfig, symbol: &str) {
    if !config
        .symbols
        .iter()
        .any(|tracked| tracked.eq_ignore_ascii_case(symbol))
    {
        config.symbols.push(symbol.to_string());
    }
}

/// Track the USD pair for a currency code.
fn ensure_pair(config: &mut OracleConfig, code: &str) {
    if code.eq_ignore_ascii_case("USD") {
        return;
    }
    ensure_tracked(config, &format!("{}/USD", code.to_ascii_uppercase()));
}

/// Intel for one-shot CLI checks: facts supplied by the operator,
/// with bookings optionally read from the booking contract first.
struct CliIntel {
    age_days: u32,
    bookings: u32,
}

#[async_trait]
impl WalletIntel for CliIntel {
    async fn wallet_age_days(&self, _address: &str) -> lodgewire::Result<u32> {
        Ok(self.age_days)
    }

    async fn completed_bookings(&self, _address: &str) -> lodgewire::Result<u32> {
        Ok(self.bookings)
    }

    async fn device_hash(&self, _address: &str) -> lodgewire::Result<Option<String>> {
        Ok(None)
    }

    async fn last_ip(&self, _address: &str) -> lodgewire::Result<Option<String>> {
        Ok(None)
    }
}
