//! Minimal ABI plumbing for the sale contract.
//!
//! Every call the page makes is a no-argument function with a single-word
//! return (or no return at all), so the full ABI machinery is unnecessary:
//! call data is just a 4-byte selector, and results are one 32-byte word.

use ethers_core::types::{Address, U256};
use ethers_core::utils::id;

use crate::error::ReadError;

/// Hex call data for a no-argument function, e.g. `call_data("mint()")`.
pub fn call_data(signature: &str) -> String {
    format!("0x{}", hex::encode(id(signature)))
}

fn decode_word(result: &str) -> Result<[u8; 32], ReadError> {
    let stripped = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(stripped)
        .map_err(|e| ReadError::Decode(format!("invalid hex in call result: {e}")))?;
    if bytes.len() != 32 {
        return Err(ReadError::Decode(format!(
            "expected a 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

pub fn decode_bool(result: &str) -> Result<bool, ReadError> {
    let word = decode_word(result)?;
    Ok(word[31] != 0)
}

pub fn decode_uint(result: &str) -> Result<U256, ReadError> {
    let word = decode_word(result)?;
    Ok(U256::from_big_endian(&word))
}

pub fn decode_address(result: &str) -> Result<Address, ReadError> {
    let word = decode_word(result)?;
    Ok(Address::from_slice(&word[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn selectors_match_known_values() {
        // Canonical selectors for the two functions shared with every
        // ERC-721 sale contract out there.
        assert_eq!(call_data("mint()"), "0x1249c58b");
        assert_eq!(call_data("owner()"), "0x8da5cb5b");
    }

    #[test]
    fn bool_words_decode() {
        let true_word = format!("0x{}{}", "00".repeat(31), "01");
        let false_word = format!("0x{}", "00".repeat(32));
        assert!(decode_bool(&true_word).unwrap());
        assert!(!decode_bool(&false_word).unwrap());
    }

    #[test]
    fn uint_decoding_keeps_full_precision() {
        // 2^128, comfortably past u64.
        let word = format!("0x{}01{}", "00".repeat(15), "00".repeat(16));
        let n = decode_uint(&word).unwrap();
        assert_eq!(n.to_string(), "340282366920938463463374607431768211456");
    }

    #[test]
    fn small_counter_decodes_to_decimal_string() {
        let word = format!("0x{}14", "00".repeat(31));
        assert_eq!(decode_uint(&word).unwrap().to_string(), "20");
    }

    #[test]
    fn address_decoding_is_case_insensitive() {
        let word = format!(
            "0x{}AbCdEf0123456789abcdef0123456789ABCDEF01",
            "00".repeat(12)
        );
        let decoded = decode_address(&word).unwrap();
        let expected =
            Address::from_str("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn truncated_words_are_rejected() {
        assert!(matches!(decode_bool("0x01"), Err(ReadError::Decode(_))));
        assert!(matches!(decode_uint("0xzz"), Err(ReadError::Decode(_))));
    }
}
