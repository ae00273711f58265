//! Key material generation and hashing
//!
//! Secrets are random bytes from the operating system rendered in base62.
//! Only the SHA-256 digest of a secret is ever stored.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

const BASE62_ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Separator between a key's prefix and its secret part
pub const PREFIX_DELIMITER: char = '_';

/// Number of secret characters kept in a key's display `start`
const START_SECRET_CHARS: usize = 4;

/// A freshly generated key. `key` is the only copy of the plaintext.
#[derive(Clone)]
pub struct GeneratedKey {
    pub key: String,
    pub start: String,
    pub hash: String,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("start", &self.start)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Generator for key secrets
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate `prefix "_" base62(byte_length random bytes)` from the OS entropy source
    pub fn generate(&self, prefix: Option<&str>, byte_length: usize) -> Result<GeneratedKey, DomainError> {
        self.generate_with(&mut OsRng, prefix, byte_length)
    }

    /// Same as [`generate`](Self::generate) with a caller supplied entropy source
    pub fn generate_with<R: RngCore>(
        &self,
        rng: &mut R,
        prefix: Option<&str>,
        byte_length: usize,
    ) -> Result<GeneratedKey, DomainError> {
        let mut bytes = vec![0u8; byte_length];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| DomainError::generation(format!("Entropy source failed: {}", e)))?;

        let secret = encode_base62(&bytes);
        let secret_start: String = secret.chars().take(START_SECRET_CHARS).collect();

        // The delimiter is always present, even when the prefix is empty
        let prefix = prefix.unwrap_or_default();
        let key = format!("{}{}{}", prefix, PREFIX_DELIMITER, secret);
        let start = format!("{}{}{}", prefix, PREFIX_DELIMITER, secret_start);

        let hash = digest(&key);

        Ok(GeneratedKey { key, start, hash })
    }
}

/// SHA-256 of the plaintext, base64 encoded. No salt, so lookups by digest work.
pub fn digest(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Big-endian base62. Leading zero bytes each become one `'0'`.
fn encode_base62(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|b| **b == 0).count();

    // Little-endian base62 digits of the non-zero tail
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 62) as u8;
            carry /= 62;
        }
        while carry > 0 {
            digits.push((carry % 62) as u8);
            carry /= 62;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('0').take(zeros));
    out.extend(digits.iter().rev().map(|d| BASE62_ALPHABET[*d as usize] as char));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("no entropy")))
        }
    }

    fn is_base62(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn test_base62_known_values() {
        assert_eq!(encode_base62(&[]), "");
        assert_eq!(encode_base62(&[0]), "0");
        assert_eq!(encode_base62(&[61]), "z");
        assert_eq!(encode_base62(&[62]), "10");
        assert_eq!(encode_base62(&[1, 0]), "48");
        assert_eq!(encode_base62(&[0, 0, 1]), "001");
        assert_eq!(encode_base62(&[255, 255]), "H31");
    }

    #[test]
    fn test_generate_with_prefix() {
        let generated = KeyGenerator::new().generate(Some("pk"), 16).unwrap();

        let secret = generated.key.strip_prefix("pk_").unwrap();
        assert!(is_base62(secret));
        assert_eq!(generated.start, format!("pk_{}", &secret[..4]));
        assert_eq!(generated.hash, digest(&generated.key));
    }

    #[test]
    fn test_generate_without_prefix_keeps_delimiter() {
        let generated = KeyGenerator::new().generate(None, 16).unwrap();

        let secret = generated.key.strip_prefix('_').unwrap();
        assert!(is_base62(secret));
        assert_eq!(generated.start, format!("_{}", &secret[..4]));
        assert_eq!(generated.start.len(), 1 + START_SECRET_CHARS);
        assert_eq!(generated.hash, digest(&generated.key));

        let empty = KeyGenerator::new().generate(Some(""), 16).unwrap();
        assert!(empty.key.starts_with('_'));
        assert!(is_base62(&empty.key[1..]));
    }

    #[test]
    fn test_start_does_not_reveal_secret() {
        let generated = KeyGenerator::new().generate(Some("pk"), 32).unwrap();
        assert_eq!(generated.start.len(), "pk_".len() + START_SECRET_CHARS);
        assert!(generated.key.len() > generated.start.len() + 20);
    }

    #[test]
    fn test_entropy_failure_fails_closed() {
        let result = KeyGenerator::new().generate_with(&mut BrokenRng, Some("pk"), 16);
        assert!(matches!(result, Err(DomainError::Generation { .. })));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest("pk_abc"), digest("pk_abc"));
        assert_ne!(digest("pk_abc"), digest("pk_abd"));
        // 32 bytes, base64 with padding
        assert_eq!(digest("").len(), 44);
        assert_eq!(digest(""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test]
    fn test_no_collisions_in_many_secrets() {
        let generator = KeyGenerator::new();
        let mut seen = HashSet::new();

        for _ in 0..10_000 {
            let generated = generator.generate(None, 16).unwrap();
            assert!(seen.insert(generated.key));
        }
    }

    #[test]
    fn test_debug_hides_plaintext() {
        let generated = KeyGenerator::new().generate(Some("pk"), 16).unwrap();
        assert!(!format!("{:?}", generated).contains(&generated.key));
    }
}
