//! Live network tests against public Flare and XRPL endpoints.
//!
//! These tests hit real infrastructure and are ignored by default.
//! Run them with `cargo test --test live_network -- --ignored`.
//! Endpoints can be overridden through environment variables.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_precision_loss
)]

use lodgewire::config::{ChainConfig, LedgerConfig, OracleConfig, PlatformConfig};
use lodgewire::ledger::XrplRpcClient;
use lodgewire::{ChainClient, PriceOracle};
use std::env;
use std::sync::Arc;

/// Payments at this address are irrecoverable, so its balance only
/// ever grows; a fine fixture for a read-only balance probe.
const BURN_ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

/// Flare chain config from `LODGEWIRE_TEST_RPC_URL` or the mainnet default.
fn chain_config() -> ChainConfig {
    let mut config = ChainConfig::default();
    if let Ok(url) = env::var("LODGEWIRE_TEST_RPC_URL") {
        config.rpc_url = Some(url);
    }
    config
}

/// XRPL config from `LODGEWIRE_TEST_XRPL_ENDPOINT` (comma-separated)
/// or the public cluster defaults.
fn ledger_config() -> LedgerConfig {
    let mut config = LedgerConfig::default();
    if let Ok(endpoints) = env::var("LODGEWIRE_TEST_XRPL_ENDPOINT") {
        config.endpoints = endpoints
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    config
}

/// Environment variables:
/// - `LODGEWIRE_TEST_RPC_URL`: Flare RPC endpoint override
#[tokio::test]
#[ignore = "Live network test - reads FTSO feeds on Flare mainnet"]
async fn live_flare_feed_refresh() {
    let config = chain_config();
    println!("Connecting to Flare via: {}", config.endpoint());
    let chain = ChainClient::connect(&config)
        .await
        .expect("Failed to connect to Flare");

    let oracle_config = OracleConfig::default();
    let max_age_ms = oracle_config.max_feed_age_ms;
    let symbols = oracle_config.symbols.clone();
    let oracle = PriceOracle::new(Arc::new(chain), oracle_config);

    let live = oracle.refresh().await;
    println!("Refreshed {live}/{} feeds", symbols.len());
    assert!(live > 0, "no live feeds on mainnet");

    for symbol in &symbols {
        match oracle.get_price(symbol) {
            Some(feed) => println!(
                "  {symbol}: {:.6} (round {}, fresh: {})",
                feed.value,
                feed.voting_round,
                feed.is_fresh(max_age_ms)
            ),
            None => println!("  {symbol}: no live value"),
        }
    }

    // Mainnet XRP/USD has never been worthless.
    let xrp = oracle.get_price("XRP/USD").expect("XRP/USD feed");
    assert!(xrp.value > 0.0);
}

/// Environment variables:
/// - `LODGEWIRE_TEST_RPC_URL`: Flare RPC endpoint override
#[tokio::test]
#[ignore = "Live network test - reads the FDC voting round on Flare mainnet"]
async fn live_flare_voting_round() {
    let chain = ChainClient::connect(&chain_config())
        .await
        .expect("Failed to connect to Flare");

    let block = chain.block_number().await.expect("block number");
    let round = chain.voting_round().await.expect("voting round");
    println!("Flare block {block}, voting round {round}");
    assert!(block > 0);
    assert!(round > 0);
}

/// Environment variables:
/// - `LODGEWIRE_TEST_XRPL_ENDPOINT`: comma-separated XRPL JSON-RPC endpoints
/// - `LODGEWIRE_TEST_XRPL_ACCOUNT`: account to look up (default: burn account)
#[tokio::test]
#[ignore = "Live network test - queries an account balance on the public XRPL cluster"]
async fn live_xrpl_balance_lookup() {
    let account =
        env::var("LODGEWIRE_TEST_XRPL_ACCOUNT").unwrap_or_else(|_| BURN_ACCOUNT.to_string());
    let client = XrplRpcClient::new(&ledger_config());

    let balance = client
        .account_balance(&account)
        .await
        .expect("balance lookup");
    println!("{}: {}", balance.address, balance.display());
    assert_eq!(balance.address, account);
    assert!(balance.drops > 0);
}

/// Coston2 is the public test network the `testnet` preset targets.
#[tokio::test]
#[ignore = "Live network test - connects to the Coston2 testnet"]
async fn live_coston2_preset_connects() {
    let config = PlatformConfig::testnet();
    println!("Connecting to Coston2 via: {}", config.chain.endpoint());
    let chain = ChainClient::connect(&config.chain)
        .await
        .expect("Failed to connect to Coston2");

    let block = chain.block_number().await.expect("block number");
    println!("Coston2 block {block}");
    assert!(block > 0);
}
