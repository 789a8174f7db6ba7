//! Configuration for lodgewire.

use serde::{Deserialize, Serialize};

/// Attesting-chain network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainNetwork {
    /// Flare mainnet.
    #[default]
    Flare,
    /// Coston2 testnet.
    Coston2,
}

impl ChainNetwork {
    /// Default public RPC endpoint for the network.
    #[must_use]
    pub const fn default_rpc(&self) -> &'static str {
        match self {
            Self::Flare => "https://flare-api.flare.network/ext/C/rpc",
            Self::Coston2 => "https://coston2-api.flare.network/ext/C/rpc",
        }
    }
}

/// Attesting-chain (EVM) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Network to attest against.
    #[serde(default)]
    pub network: ChainNetwork,

    /// RPC endpoint override. When unset, the network's public
    /// endpoint is used.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Contract registry address. The registry lives at the same
    /// address on every Flare network.
    #[serde(default = "default_registry_address")]
    pub registry_address: String,

    /// Deployed booking escrow contract address, if any.
    #[serde(default)]
    pub booking_contract: Option<String>,
}

impl ChainConfig {
    /// Resolve the effective RPC endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.default_rpc().to_string())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: ChainNetwork::default(),
            rpc_url: None,
            registry_address: default_registry_address(),
            booking_contract: None,
        }
    }
}

fn default_registry_address() -> String {
    "0xaD67FE66660Fb8dFE9d6b1b4240d8650e30F6019".to_string()
}

/// Price feed adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Feed symbols to track, in "BASE/QUOTE" form.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Background refresh interval in seconds. Matches the oracle's
    /// voting round cadence.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Maximum feed age in milliseconds before a price is considered
    /// stale.
    #[serde(default = "default_max_feed_age_ms")]
    pub max_feed_age_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            refresh_interval_secs: default_refresh_interval(),
            max_feed_age_ms: default_max_feed_age_ms(),
        }
    }
}

fn default_symbols() -> Vec<String> {
    vec![
        "FLR/USD".to_string(),
        "BTC/USD".to_string(),
        "ETH/USD".to_string(),
        "XRP/USD".to_string(),
    ]
}

const fn default_refresh_interval() -> u64 {
    90
}

const fn default_max_feed_age_ms() -> u64 {
    60_000
}

/// Settlement-ledger (XRPL) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoints in fallback order. The first endpoint that
    /// answers wins.
    #[serde(default = "default_ledger_endpoints")]
    pub endpoints: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_ledger_timeout")]
    pub query_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoints: default_ledger_endpoints(),
            query_timeout_secs: default_ledger_timeout(),
        }
    }
}

fn default_ledger_endpoints() -> Vec<String> {
    vec![
        "https://xrplcluster.com".to_string(),
        "https://s1.ripple.com:51234".to_string(),
        "https://s2.ripple.com:51234".to_string(),
    ]
}

const fn default_ledger_timeout() -> u64 {
    10
}

/// Attestation pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationConfig {
    /// Oracle voting round duration in seconds.
    #[serde(default = "default_round_duration")]
    pub round_duration_secs: u64,

    /// Ledger poll interval while waiting for a transaction to
    /// validate, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum ledger polls before a pending attestation is marked
    /// failed.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Ceiling in seconds that a record may stay pending before the
    /// expiry sweep marks it failed.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_secs: u64,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: default_round_duration(),
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            pending_ttl_secs: default_pending_ttl(),
        }
    }
}

const fn default_round_duration() -> u64 {
    90
}

const fn default_poll_interval() -> u64 {
    5
}

const fn default_max_poll_attempts() -> u32 {
    120
}

const fn default_pending_ttl() -> u64 {
    600
}

/// Fraud engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudConfig {
    /// Cooldown window between booking attempts from the same wallet,
    /// in seconds.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Capacity of the wallet verification cache.
    #[serde(default = "default_fraud_cache_capacity")]
    pub cache_capacity: usize,

    /// Wallet addresses banned from the platform.
    #[serde(default)]
    pub banned_wallets: Vec<String>,

    /// Device fingerprint hashes flagged by prior abuse.
    #[serde(default)]
    pub flagged_devices: Vec<String>,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            cache_capacity: default_fraud_cache_capacity(),
            banned_wallets: Vec::new(),
            flagged_devices: Vec::new(),
        }
    }
}

const fn default_cooldown() -> u64 {
    7_200
}

const fn default_fraud_cache_capacity() -> usize {
    10_000
}

/// Platform configuration.
///
/// `log_level` stays ahead of the table-valued sections so the TOML
/// serializer emits it before them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Attesting-chain configuration.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Price feed adapter configuration.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Settlement-ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Attestation pipeline configuration.
    #[serde(default)]
    pub attestation: AttestationConfig,

    /// Fraud engine configuration.
    #[serde(default)]
    pub fraud: FraudConfig,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            chain: ChainConfig::default(),
            oracle: OracleConfig::default(),
            ledger: LedgerConfig::default(),
            attestation: AttestationConfig::default(),
            fraud: FraudConfig::default(),
        }
    }
}

impl PlatformConfig {
    /// Create a testnet configuration preset.
    ///
    /// Points the attesting chain at Coston2 and the ledger at the
    /// XRPL test net, leaving everything else at defaults.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            chain: ChainConfig {
                network: ChainNetwork::Coston2,
                ..ChainConfig::default()
            },
            ledger: LedgerConfig {
                endpoints: vec!["https://s.altnet.rippletest.net:51234".to_string()],
                ..LedgerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Check whether this configuration targets test networks.
    #[must_use]
    pub fn is_testnet(&self) -> bool {
        matches!(self.chain.network, ChainNetwork::Coston2)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
