//! Process-wide token signing key

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use std::fmt;
use thiserror::Error;

/// Minimum key length after decoding, in bytes
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("signing key must be at least {MIN_KEY_LEN} bytes after decoding, got {0}")]
    TooShort(usize),
}

/// Symmetric key used to both sign and verify tokens.
///
/// Constructed once at startup from configuration and passed by reference
/// into the authority; never mutated afterwards. The gatekeeper never holds
/// one.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Build a key from the configured secret string.
    ///
    /// Accepts standard base64, base64url without padding, or the raw bytes
    /// of the string itself, whichever first decodes to enough material.
    pub fn from_config(raw: &str) -> Result<Self, KeyError> {
        let trimmed = raw.trim();

        if let Ok(bytes) = STANDARD.decode(trimmed) {
            if bytes.len() >= MIN_KEY_LEN {
                return Ok(Self { bytes });
            }
        }

        if let Ok(bytes) = URL_SAFE_NO_PAD.decode(trimmed) {
            if bytes.len() >= MIN_KEY_LEN {
                return Ok(Self { bytes });
            }
        }

        let raw_bytes = trimmed.as_bytes();
        if raw_bytes.len() >= MIN_KEY_LEN {
            return Ok(Self {
                bytes: raw_bytes.to_vec(),
            });
        }

        Err(KeyError::TooShort(raw_bytes.len()))
    }

    /// Build a key directly from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort(bytes.len()));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_raw_string() {
        let key = SigningKey::from_config("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn test_key_from_base64() {
        let encoded = STANDARD.encode([7u8; 48]);
        let key = SigningKey::from_config(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; 48]);
    }

    #[test]
    fn test_key_from_base64url() {
        let encoded = URL_SAFE_NO_PAD.encode([9u8; 32]);
        let key = SigningKey::from_config(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[9u8; 32]);
    }

    #[test]
    fn test_key_too_short() {
        let result = SigningKey::from_config("short");
        assert!(matches!(result, Err(KeyError::TooShort(5))));
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = SigningKey::from_bytes(vec![1u8; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "SigningKey([REDACTED])");
    }
}
