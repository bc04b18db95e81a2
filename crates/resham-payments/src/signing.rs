//! # Signing Helpers
//!
//! ```text
//! Wallet X-VERIFY:     sha256_hex(base64(payload) + "/pg/v1/pay" + salt) + "###" + index
//! Wallet callback:     sha256_hex(transactionId + "/pg/v1/status" + salt)
//! Card webhook (v1):   hex(HMAC-SHA256(webhook_secret, "<t>.<raw body>"))
//! ```

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{GatewayError, GatewayResult};

type HmacSha256 = Hmac<Sha256>;

/// Separator between the digest and the salt index in wallet checksums.
pub const CHECKSUM_SEPARATOR: &str = "###";

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Wallet checksum: `sha256(message + salt_key)###salt_index`.
///
/// `message` is already the concatenation the endpoint requires (e.g. the
/// base64 payload followed by the pay path).
pub fn wallet_checksum(message: &str, salt_key: &str, salt_index: u32) -> String {
    format!(
        "{}{}{}",
        sha256_hex(&format!("{}{}", message, salt_key)),
        CHECKSUM_SEPARATOR,
        salt_index
    )
}

/// Splits `digest###index` into its parts. The index is optional.
pub fn split_checksum(checksum: &str) -> (&str, Option<&str>) {
    match checksum.split_once(CHECKSUM_SEPARATOR) {
        Some((digest, index)) => (digest, Some(index)),
        None => (checksum, None),
    }
}

/// Lowercase hex HMAC-SHA256.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> GatewayResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::NotConfigured(format!("webhook secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compares two strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_wallet_checksum_format() {
        let checksum = wallet_checksum("eyJhIjoxfQ==/pg/v1/pay", "salt", 1);
        let (digest, index) = split_checksum(&checksum);

        assert_eq!(digest, sha256_hex("eyJhIjoxfQ==/pg/v1/paysalt"));
        assert_eq!(digest.len(), 64);
        assert_eq!(index, Some("1"));
    }

    #[test]
    fn test_split_checksum_without_index() {
        assert_eq!(split_checksum("abcdef"), ("abcdef", None));
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        let mac = hmac_sha256_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
