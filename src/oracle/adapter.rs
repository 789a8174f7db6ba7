//! Price feed adapter over the on-chain oracle.
//!
//! The adapter keeps one observation per tracked symbol and converts
//! amounts between currencies by routing through USD. Pricing is
//! best-effort: a feed the oracle cannot serve is absent, and a
//! conversion touching an absent feed is 0.0, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::oracle::feed::{feed_id, scale_value, PriceFeed};

/// Raw feed observation from the oracle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedObservation {
    /// Voting round the observation was produced in.
    pub voting_round: u32,
    /// Raw integer mantissa, signed upstream. Anything non-positive
    /// means the oracle has no usable price.
    pub mantissa: i32,
    /// Decimal exponent.
    pub decimals: i8,
}

/// Source of raw feed observations.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the latest observation for a symbol.
    async fn fetch(&self, symbol: &str) -> crate::Result<FeedObservation>;

    /// Current oracle voting round.
    async fn current_round(&self) -> crate::Result<u32>;
}

/// Price feed adapter.
pub struct PriceOracle {
    source: Arc<dyn FeedSource>,
    config: OracleConfig,
    feeds: RwLock<HashMap<String, PriceFeed>>,
    latest_round: RwLock<u32>,
}

impl PriceOracle {
    /// Create an adapter over a feed source.
    #[must_use]
    pub fn new(source: Arc<dyn FeedSource>, config: OracleConfig) -> Self {
        Self {
            source,
            config,
            feeds: RwLock::new(HashMap::new()),
            latest_round: RwLock::new(0),
        }
    }

    /// Latest price feed for a symbol, if the last refresh produced one.
    #[must_use]
    pub fn get_price(&self, symbol: &str) -> Option<PriceFeed> {
        self.feeds.read().get(symbol).cloned()
    }

    /// Whether the feed for `symbol` exists and is younger than
    /// `max_age_ms`.
    #[must_use]
    pub fn is_fresh(&self, symbol: &str, max_age_ms: u64) -> bool {
        self.get_price(symbol)
            .is_some_and(|feed| feed.is_fresh(max_age_ms))
    }

    /// Oracle voting round observed by the last successful refresh.
    #[must_use]
    pub fn latest_round(&self) -> u32 {
        *self.latest_round.read()
    }

    /// USD value of one unit of `currency`, if priced.
    fn usd_value(&self, currency: &str) -> Option<f64> {
        let code = currency.to_ascii_uppercase();
        if code == "USD" {
            return Some(1.0);
        }
        self.get_price(&format!("{code}/USD")).map(|feed| feed.value)
    }

    /// Convert `amount` of `from` into `to`, routing through USD.
    ///
    /// Returns `amount` unchanged for a same-currency conversion and
    /// 0.0 when either leg is unpriced.
    #[must_use]
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if from.eq_ignore_ascii_case(to) {
            return amount;
        }
        let (Some(from_usd), Some(to_usd)) = (self.usd_value(from), self.usd_value(to)) else {
            warn!(%from, %to, "conversion leg unpriced, returning 0");
            return 0.0;
        };
        if from_usd <= 0.0 || to_usd <= 0.0 {
            warn!(%from, %to, "non-positive leg price, returning 0");
            return 0.0;
        }
        amount * from_usd / to_usd
    }

    /// Refresh every tracked feed and swap the feed map atomically.
    ///
    /// Returns the number of live feeds after the refresh.
    pub async fn refresh(&self) -> usize {
        self.refresh_at(chrono::Utc::now().timestamp_millis()).await
    }

    async fn refresh_at(&self, now_ms: i64) -> usize {
        let fetches = self.config.symbols.iter().map(|symbol| async move {
            (symbol.clone(), self.source.fetch(symbol).await)
        });
        let results = futures::future::join_all(fetches).await;

        match self.source.current_round().await {
            Ok(round) => *self.latest_round.write() = round,
            Err(e) => debug!(error = %e, "voting round read failed, keeping last"),
        }

        let prior = self.feeds.read().clone();
        let mut next = HashMap::with_capacity(results.len());
        for (symbol, outcome) in results {
            match outcome {
                Ok(obs) if obs.mantissa > 0 => {
                    let Ok(id) = feed_id(&symbol) else {
                        warn!(%symbol, "feed symbol not encodable, dropping");
                        continue;
                    };
                    // An unchanged round carries the prior stamp so
                    // staleness keeps accruing.
                    let entry = match prior.get(&symbol) {
                        Some(prev) if prev.voting_round == obs.voting_round => prev.clone(),
                        _ => PriceFeed {
                            id,
                            symbol: symbol.clone(),
                            value: scale_value(obs.mantissa, obs.decimals),
                            updated_ms: now_ms,
                            voting_round: obs.voting_round,
                        },
                    };
                    next.insert(symbol, entry);
                }
                Ok(_) => warn!(%symbol, "oracle reported no usable price, dropping feed"),
                Err(e) => warn!(%symbol, error = %e, "feed fetch failed, dropping feed"),
            }
        }

        let live = next.len();
        *self.feeds.write() = next;
        debug!(feeds = live, "price feeds refreshed");
        live
    }

    /// Refresh feeds on the configured interval until shutdown.
    ///
    /// The loop also stops when the shutdown sender is dropped.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let interval = std::time::Duration::from_secs(self.config.refresh_interval_secs);
        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("price oracle refresh loop stopping");
                        break;
                    }
                }
                live = self.refresh() => {
                    if live == 0 {
                        warn!("no live price feeds after refresh");
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}
