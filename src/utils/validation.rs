//! Validation utilities

use crate::assertions::AssertionError;

/// Length of a canonical account address
pub const ADDRESS_LENGTH: usize = 58;

/// Symbols a canonical address is drawn from (RFC 4648 base32)
pub const ADDRESS_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Whether `address` has the canonical length and alphabet.
///
/// The ledger itself accepts any address; this is for tests that want to
/// check generated accounts look like real ones.
pub fn is_canonical_address(address: &str) -> bool {
    address.len() == ADDRESS_LENGTH && address.bytes().all(|b| ADDRESS_ALPHABET.contains(&b))
}

/// Validate that an address is canonical
pub fn validate_address(address: &str) -> Result<(), AssertionError> {
    if address.len() != ADDRESS_LENGTH {
        return Err(AssertionError(format!(
            "Address '{}' has length {}, expected {}",
            address,
            address.len(),
            ADDRESS_LENGTH
        )));
    }

    if let Some(c) = address.chars().find(|c| !c.is_ascii() || !ADDRESS_ALPHABET.contains(&(*c as u8))) {
        return Err(AssertionError(format!(
            "Address '{}' contains invalid character '{}'",
            address, c
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_address() {
        let address = "A".repeat(58);
        assert!(is_canonical_address(&address));
        assert!(validate_address(&address).is_ok());
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!is_canonical_address("ADDR1"));
        let err = validate_address("ADDR1").unwrap_err();
        assert!(err.to_string().contains("length 5"));
    }

    #[test]
    fn test_rejects_lowercase_and_digits_outside_alphabet() {
        let mut address = "A".repeat(57);
        address.push('1');
        assert!(!is_canonical_address(&address));
        assert!(validate_address(&address).unwrap_err().to_string().contains("'1'"));

        let lower = "a".repeat(58);
        assert!(validate_address(&lower).is_err());
    }
}
