//! Ledger address format validation.
//!
//! Checks the classic XRPL address shape only: a leading `r`, a
//! length between 25 and 35 characters, and the Ripple base58
//! alphabet. Whether the account exists on the ledger is a network
//! question and deliberately not asked here.

use crate::error::{Error, Result};

/// Minimum length of a classic ledger address.
pub const MIN_ADDRESS_LEN: usize = 25;

/// Maximum length of a classic ledger address.
pub const MAX_ADDRESS_LEN: usize = 35;

/// Validate the format of a ledger address.
///
/// # Errors
///
/// Returns `Error::Validation` naming the first failed check.
pub fn validate_address(address: &str) -> Result<()> {
    if !address.starts_with('r') {
        return Err(Error::Validation(format!(
            "ledger address must start with 'r', got: {address}"
        )));
    }

    if address.len() < MIN_ADDRESS_LEN || address.len() > MAX_ADDRESS_LEN {
        return Err(Error::Validation(format!(
            "ledger address length must be {MIN_ADDRESS_LEN}-{MAX_ADDRESS_LEN} characters, got {}",
            address.len()
        )));
    }

    // A failed base58 decode means a character outside the Ripple
    // alphabet.
    bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|_| {
            Error::Validation(format!(
                "ledger address contains characters outside the Ripple alphabet: {address}"
            ))
        })?;

    Ok(())
}

/// Check whether an address is a well-formed ledger address.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"));
        assert!(is_valid_address("rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH"));
        assert!(is_valid_address("rN7n3473SaZBCG4dFL83w7a1RXtXtbk2D9"));
    }

    #[test]
    fn test_missing_prefix() {
        let result = validate_address("sHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
        assert!(result.is_err());
    }

    #[test]
    fn test_too_short() {
        assert!(validate_address("rShortAddr").is_err());
    }

    #[test]
    fn test_too_long() {
        assert!(validate_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyThXX").is_err());
    }

    #[test]
    fn test_characters_outside_alphabet() {
        // '0', 'O', 'I' and 'l' are not in the Ripple alphabet.
        assert!(validate_address("r0b9CJAWyB4rj91VRWn96DkukG4bwdtyTh").is_err());
        assert!(validate_address("rOb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").is_err());
        assert!(validate_address("rlb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").is_err());
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(!is_valid_address(""));
    }
}
