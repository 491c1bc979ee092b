//! Token codec and signing key
//!
//! Wire format: three base64url segments joined by `.`:
//! - header: algorithm metadata (`{"alg":"HS256","typ":"JWT"}`)
//! - payload: claims (`sub`, `role`, `iat`, `exp`)
//! - signature: HMAC-SHA256 over `header.payload`
//!
//! The codec is pure: it knows nothing about accounts or expiry policy
//! beyond carrying the `iat`/`exp` claims. Expiry is enforced by the
//! authority, signing-key construction by the binaries.

mod keys;
mod token;

pub use keys::{KeyError, SigningKey};
pub use token::{
    decode, encode, strip_bearer, unix_now, Claims, TokenError, BEARER_PREFIX, TOKEN_TTL_SECS,
};
