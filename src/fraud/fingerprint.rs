//! Device fingerprinting from client-reported signals.
//!
//! A fingerprint is the SHA-256 hex digest over the stable signals a
//! client session reports. No single signal is authoritative; the
//! digest only distinguishes sessions that differ in at least one.

use sha2::{Digest, Sha256};

/// Client signals collected at session start.
///
/// All fields are free-form strings exactly as the client reported
/// them. Missing signals stay empty rather than being dropped, so the
/// digest covers the same positions for every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSignals {
    /// Agent string of the client software.
    pub agent: String,
    /// Screen geometry, e.g. `1920x1080x24`.
    pub screen: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Preferred language tag.
    pub language: String,
    /// Operating platform identifier.
    pub platform: String,
    /// Rendering-surface signature.
    pub surface: String,
}

impl ClientSignals {
    /// Compute the device fingerprint for these signals.
    ///
    /// Signals are joined with a separator before hashing so that
    /// adjacent fields cannot be shifted into each other.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let joined = [
            self.agent.as_str(),
            self.screen.as_str(),
            self.timezone.as_str(),
            self.language.as_str(),
            self.platform.as_str(),
            self.surface.as_str(),
        ]
        .join("\u{1f}");
        hex::encode(Sha256::digest(joined.as_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn signals() -> ClientSignals {
        ClientSignals {
            agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            screen: "1920x1080x24".to_string(),
            timezone: "Europe/Lisbon".to_string(),
            language: "en-GB".to_string(),
            platform: "Linux x86_64".to_string(),
            surface: "webgl:amd-radeon".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = signals().fingerprint();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(signals().fingerprint(), signals().fingerprint());
    }

    #[test]
    fn test_any_signal_changes_the_fingerprint() {
        let base = signals().fingerprint();

        let mut other = signals();
        other.timezone = "America/Bogota".to_string();
        assert_ne!(base, other.fingerprint());

        let mut other = signals();
        other.screen = "2560x1440x24".to_string();
        assert_ne!(base, other.fingerprint());
    }

    #[test]
    fn test_fields_cannot_shift_between_positions() {
        let a = ClientSignals {
            agent: "abc".to_string(),
            ..ClientSignals::default()
        };
        let b = ClientSignals {
            screen: "abc".to_string(),
            ..ClientSignals::default()
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
