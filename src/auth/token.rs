//! Token encode/decode and signature verification

use crate::auth::keys::SigningKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header prefix for bearer credentials
pub const BEARER_PREFIX: &str = "Bearer ";

/// Fixed token lifetime: 24 hours
pub const TOKEN_TTL_SECS: u64 = 86_400;

const TOKEN_ALG: &str = "HS256";
const TOKEN_TYP: &str = "JWT";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    SignatureInvalid,

    #[error("unsupported algorithm: {0}")]
    Algorithm(String),

    #[error("token decode error: {0}")]
    Decode(String),
}

/// Signed claims carried in a token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account email
    pub sub: String,
    /// Role claim, copied verbatim from the credential
    pub role: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: u64,
    /// Expiry, always `iat + TOKEN_TTL_SECS`
    pub exp: u64,
}

impl Claims {
    /// Build claims for a fresh token issued at `now`
    pub fn issue(sub: impl Into<String>, role: impl Into<String>, now: u64) -> Self {
        Self {
            sub: sub.into(),
            role: role.into(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Current time in seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}

/// Strip the `"Bearer "` prefix from an Authorization header value
pub fn strip_bearer(header: &str) -> Option<&str> {
    header.strip_prefix(BEARER_PREFIX)
}

/// Encode and sign claims into the compact wire format.
///
/// Deterministic: the same claims and key always produce the same token.
pub fn encode(claims: &Claims, key: &SigningKey) -> String {
    let header = Header {
        alg: TOKEN_ALG.to_string(),
        typ: TOKEN_TYP.to_string(),
    };

    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("serialize header"));
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("serialize claims"));

    let signature = sign(&header_b64, &payload_b64, key);
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

    format!("{}.{}.{}", header_b64, payload_b64, signature_b64)
}

/// Verify a token's signature and decode its claims.
///
/// The signature comparison is constant-time. Any mismatch, wrong segment
/// count, or undecodable segment yields an error, never claims.
pub fn decode(token: &str, key: &SigningKey) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let (header_b64, payload_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| TokenError::Decode(e.to_string()))?;

    // Verify before parsing anything attacker-controlled
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::SignatureInvalid)?;

    let header_json = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| TokenError::Decode(e.to_string()))?;
    let header: Header =
        serde_json::from_slice(&header_json).map_err(|e| TokenError::Decode(e.to_string()))?;

    if header.alg != TOKEN_ALG {
        return Err(TokenError::Algorithm(header.alg));
    }

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| TokenError::Decode(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&payload_json).map_err(|e| TokenError::Decode(e.to_string()))?;

    Ok(claims)
}

fn sign(header_b64: &str, payload_b64: &str, key: &SigningKey) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SigningKey {
        SigningKey::from_bytes(b"test-secret-key-for-token-codec!".to_vec()).unwrap()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "DOCTOR", 1_700_000_000);

        let token = encode(&claims, &key);
        assert_eq!(token.split('.').count(), 3);

        let decoded = decode(&token, &key).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp, decoded.iat + TOKEN_TTL_SECS);
    }

    #[test]
    fn test_encode_deterministic() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "NURSE", 1_700_000_000);

        assert_eq!(encode(&claims, &key), encode(&claims, &key));
    }

    #[test]
    fn test_decode_wrong_key() {
        let claims = Claims::issue("a@test.com", "DOCTOR", 1_700_000_000);
        let token = encode(&claims, &test_key());

        let other = SigningKey::from_bytes(b"another-secret-key-entirely-----".to_vec()).unwrap();
        let result = decode(&token, &other);
        assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }

    #[test]
    fn test_decode_wrong_segment_count() {
        let key = test_key();
        assert!(matches!(decode("abc.def", &key), Err(TokenError::Malformed)));
        assert!(matches!(
            decode("a.b.c.d", &key),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(decode("", &key), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_decode_non_base64_signature() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "DOCTOR", 1_700_000_000);
        let token = encode(&claims, &key);

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[2] = "!!!not-base64!!!";
        let tampered = parts.join(".");

        assert!(matches!(decode(&tampered, &key), Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "NURSE", 1_700_000_000);
        let token = encode(&claims, &key);

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = Claims::issue("a@test.com", "ADMIN", 1_700_000_000);
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = parts.join(".");

        assert!(matches!(
            decode(&tampered, &key),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_every_signature_bit_flip_rejected() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "DOCTOR", 1_700_000_000);
        let token = encode(&claims, &key);

        let parts: Vec<&str> = token.split('.').collect();
        let mut signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                signature[byte] ^= 1 << bit;
                let tampered = format!(
                    "{}.{}.{}",
                    parts[0],
                    parts[1],
                    URL_SAFE_NO_PAD.encode(&signature)
                );
                assert!(
                    matches!(decode(&tampered, &key), Err(TokenError::SignatureInvalid)),
                    "bit flip at byte {} bit {} was accepted",
                    byte,
                    bit
                );
                signature[byte] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let key = test_key();
        let claims = Claims::issue("a@test.com", "DOCTOR", 1_700_000_000);

        // Hand-build a token with a forged header, signed correctly
        let header_b64 = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let signature_b64 = URL_SAFE_NO_PAD.encode(sign(&header_b64, &payload_b64, &key));
        let token = format!("{}.{}.{}", header_b64, payload_b64, signature_b64);

        assert!(matches!(
            decode(&token, &key),
            Err(TokenError::Algorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(strip_bearer("bearer abc"), None);
        assert_eq!(strip_bearer("Basic dXNlcg=="), None);
        assert_eq!(strip_bearer(""), None);
    }
}
