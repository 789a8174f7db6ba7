//! Wallet and booking risk scoring.
//!
//! Scores are additive weights over facts supplied by a
//! [`WalletIntel`] collaborator, clamped to `[0, 100]`. The engine
//! never denies by raising: callers read the returned verification or
//! check and decide. Ban and flagged-device lists come from
//! configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::config::FraudConfig;
use crate::fraud::cache::{CacheStats, VerificationCache};
use crate::{Error, Result};

/// Wallets younger than this many days carry extra risk.
const YOUNG_WALLET_DAYS: u32 = 7;
/// Wallets younger than this many days carry the most risk.
const BRAND_NEW_DAYS: u32 = 1;
/// Highest review rating a guest can leave.
const MAX_RATING: u8 = 5;
/// Scores at or above this bar fail verification.
const VERIFIED_SCORE_BAR: u8 = 70;

const YOUNG_WALLET_WEIGHT: u32 = 30;
const BRAND_NEW_WEIGHT: u32 = 50;
const FLAGGED_DEVICE_WEIGHT: u32 = 70;
const NO_HISTORY_WEIGHT: u32 = 20;

const WALLET_CARRY_FACTOR: f64 = 0.5;
const SELF_BOOKING_WEIGHT: f64 = 90.0;
const DEVICE_COLLISION_WEIGHT: f64 = 40.0;
const IP_COLLISION_WEIGHT: f64 = 30.0;
const COOLDOWN_WEIGHT: f64 = 25.0;
const BRAND_NEW_BOOKING_WEIGHT: f64 = 30.0;

/// Source of per-wallet facts used for scoring.
///
/// Implementations answer from whatever record they have; the engine
/// owns the scoring formulas.
#[async_trait]
pub trait WalletIntel: Send + Sync {
    /// Days since the wallet's first observed activity.
    async fn wallet_age_days(&self, address: &str) -> Result<u32>;

    /// Completed bookings attributed to the wallet.
    async fn completed_bookings(&self, address: &str) -> Result<u32>;

    /// Device fingerprint most recently associated with the wallet.
    async fn device_hash(&self, address: &str) -> Result<Option<String>>;

    /// IP most recently associated with the wallet.
    async fn last_ip(&self, address: &str) -> Result<Option<String>>;
}

/// Client session facts accompanying a booking attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Device fingerprint of the session, if collected.
    pub device_hash: Option<String>,
    /// IP the session connected from, if known.
    pub ip: Option<String>,
}

/// Risk verdict for a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletVerification {
    /// The verified wallet address.
    pub address: String,
    /// Days since first observed activity.
    pub age_days: u32,
    /// Whether the address is on the ban list.
    pub is_banned: bool,
    /// Composite risk score, clamped to `[0, 100]`.
    pub risk_score: u8,
    /// Completed bookings attributed to the wallet.
    pub completed_bookings: u32,
    /// Device fingerprint associated with the wallet, if any.
    pub device_hash: Option<String>,
    /// Whether the wallet passes verification outright.
    pub is_verified: bool,
}

/// Risk verdict for a single booking attempt. Ephemeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingFraudCheck {
    /// Verification of the guest wallet.
    pub verification: WalletVerification,
    /// Property the booking targets.
    pub property_id: u64,
    /// Guest and host are the same wallet.
    pub self_booking: bool,
    /// Session device matches the host's device.
    pub device_collision: bool,
    /// Session IP matches the host's last IP.
    pub ip_collision: bool,
    /// Attempt landed within the cooldown window of the previous one.
    pub cooldown_violation: bool,
    /// Composite booking risk score, clamped to `[0, 100]`.
    pub risk_score: u8,
}

impl BookingFraudCheck {
    /// Band the booking score.
    #[must_use]
    pub const fn assessment(&self) -> RiskAssessment {
        assess(self.risk_score)
    }
}

/// Risk band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    /// Score 80 and above.
    High,
    /// Score 50 to 79.
    Medium,
    /// Score 20 to 49.
    Low,
    /// Score below 20.
    Verified,
}

impl RiskLevel {
    /// Band a score. Lower bounds are inclusive.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::High
        } else if score >= 50 {
            Self::Medium
        } else if score >= 20 {
            Self::Low
        } else {
            Self::Verified
        }
    }

    /// Human-readable description of the band.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::High => "High Risk (blocked from automated settlement)",
            Self::Medium => "Medium Risk (additional verification recommended)",
            Self::Low => "Low Risk (minor signals observed)",
            Self::Verified => "Verified User (no significant risk signals)",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
            Self::Verified => "Verified User",
        };
        write!(f, "{name}")
    }
}

/// A banded score with its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// The band the score falls in.
    pub level: RiskLevel,
    /// Description of the band.
    pub description: &'static str,
}

/// Band a risk score.
#[must_use]
pub const fn assess(score: u8) -> RiskAssessment {
    let level = RiskLevel::from_score(score);
    RiskAssessment {
        level,
        description: level.description(),
    }
}

/// Fraud and risk scoring engine.
pub struct FraudEngine {
    intel: Arc<dyn WalletIntel>,
    config: FraudConfig,
    cache: VerificationCache,
    /// Last booking attempt per wallet, milliseconds since epoch.
    attempts: RwLock<HashMap<String, i64>>,
}

impl FraudEngine {
    /// Create an engine over an intel source.
    #[must_use]
    pub fn new(intel: Arc<dyn WalletIntel>, config: FraudConfig) -> Self {
        let cache = VerificationCache::new(config.cache_capacity);
        Self {
            intel,
            config,
            cache,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Verify a wallet address, deriving its risk score from intel.
    ///
    /// Band weights: age under 7 days +30, under 1 day a further +50,
    /// flagged device +70, no completed bookings +20; a banned
    /// address scores 100 outright.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty address and
    /// propagates intel failures.
    pub async fn verify_wallet(&self, address: &str) -> Result<WalletVerification> {
        if address.is_empty() {
            return Err(Error::Validation(
                "wallet address must not be empty".to_string(),
            ));
        }
        if let Some(cached) = self.cache.get(address) {
            return Ok(cached);
        }
        let verification = self.derive_verification(address).await?;
        self.cache.insert(verification.clone());
        Ok(verification)
    }

    async fn derive_verification(&self, address: &str) -> Result<WalletVerification> {
        let age_days = self.intel.wallet_age_days(address).await?;
        let completed_bookings = self.intel.completed_bookings(address).await?;
        let device_hash = self.intel.device_hash(address).await?;
        let is_banned = listed(&self.config.banned_wallets, address);

        let risk_score = if is_banned {
            100
        } else {
            let mut score = 0u32;
            if age_days < YOUNG_WALLET_DAYS {
                score += YOUNG_WALLET_WEIGHT;
                if age_days < BRAND_NEW_DAYS {
                    score += BRAND_NEW_WEIGHT;
                }
            }
            if device_hash
                .as_deref()
                .is_some_and(|hash| listed(&self.config.flagged_devices, hash))
            {
                score += FLAGGED_DEVICE_WEIGHT;
            }
            if completed_bookings == 0 {
                score += NO_HISTORY_WEIGHT;
            }
            clamp_score(score)
        };

        let is_verified = risk_score < VERIFIED_SCORE_BAR && !is_banned;
        debug!(%address, risk_score, is_banned, "wallet verification derived");
        Ok(WalletVerification {
            address: address.to_string(),
            age_days,
            is_banned,
            risk_score,
            completed_bookings,
            device_hash,
            is_verified,
        })
    }

    /// Score a single booking attempt.
    ///
    /// Starts from half the guest's wallet score and adds:
    /// self-booking +90, device collision with the host +40, IP
    /// collision +30, attempt within the cooldown window +25, wallet
    /// under a day old +30. Every call stamps the attempt time for
    /// the next cooldown evaluation.
    ///
    /// # Errors
    ///
    /// Propagates wallet verification and intel failures.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub async fn check_booking_fraud(
        &self,
        guest: &str,
        host: &str,
        property_id: u64,
        session: &SessionContext,
    ) -> Result<BookingFraudCheck> {
        let verification = self.verify_wallet(guest).await?;
        let host_device = self.intel.device_hash(host).await?;
        let host_ip = self.intel.last_ip(host).await?;

        let self_booking = guest.eq_ignore_ascii_case(host);
        let device_collision = matches!(
            (&session.device_hash, &host_device),
            (Some(session_hash), Some(host_hash)) if session_hash == host_hash
        );
        let ip_collision = matches!(
            (&session.ip, &host_ip),
            (Some(session_ip), Some(host_ip)) if session_ip == host_ip
        );
        let cooldown_violation = self.record_attempt(guest);

        let mut score = f64::from(verification.risk_score) * WALLET_CARRY_FACTOR;
        if self_booking {
            score += SELF_BOOKING_WEIGHT;
        }
        if device_collision {
            score += DEVICE_COLLISION_WEIGHT;
        }
        if ip_collision {
            score += IP_COLLISION_WEIGHT;
        }
        if cooldown_violation {
            score += COOLDOWN_WEIGHT;
        }
        if verification.age_days < BRAND_NEW_DAYS {
            score += BRAND_NEW_BOOKING_WEIGHT;
        }
        let risk_score = score.round().clamp(0.0, 100.0) as u8;
        debug!(
            %guest, %host, property_id, risk_score,
            self_booking, device_collision, ip_collision, cooldown_violation,
            "booking attempt scored"
        );

        Ok(BookingFraudCheck {
            verification,
            property_id,
            self_booking,
            device_collision,
            ip_collision,
            cooldown_violation,
            risk_score,
        })
    }

    /// Whether a review looks fraudulent.
    ///
    /// Flags a maximum rating from a wallet under 7 days old, and any
    /// review from a wallet with no completed bookings.
    ///
    /// # Errors
    ///
    /// Propagates wallet verification failures.
    pub async fn check_review_fraud(&self, wallet: &str, rating: u8) -> Result<bool> {
        let verification = self.verify_wallet(wallet).await?;
        let burst_review = verification.age_days < YOUNG_WALLET_DAYS && rating == MAX_RATING;
        Ok(burst_review || verification.completed_bookings == 0)
    }

    /// Whether a wallet qualifies for promotional raffles.
    ///
    /// Requires all of: age at least 7 days, at least one completed
    /// booking, not banned, score under 70.
    ///
    /// # Errors
    ///
    /// Propagates wallet verification failures.
    pub async fn can_participate_in_raffle(&self, address: &str) -> Result<bool> {
        let verification = self.verify_wallet(address).await?;
        Ok(verification.age_days >= YOUNG_WALLET_DAYS
            && verification.completed_bookings >= 1
            && !verification.is_banned
            && verification.risk_score < VERIFIED_SCORE_BAR)
    }

    /// Verification cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Record a booking attempt; returns whether it fell inside the
    /// cooldown window of the previous one.
    fn record_attempt(&self, wallet: &str) -> bool {
        let now = now_ms();
        let cooldown_ms = i64::try_from(self.config.cooldown_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let mut attempts = self.attempts.write();
        let key = wallet.to_lowercase();
        let violation = attempts
            .get(&key)
            .is_some_and(|last| now.saturating_sub(*last) < cooldown_ms);
        attempts.insert(key, now);
        violation
    }
}

fn listed(list: &[String], value: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(value))
}

#[allow(clippy::cast_possible_truncation)]
const fn clamp_score(total: u32) -> u8 {
    if total > 100 {
        100
    } else {
        total as u8
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
