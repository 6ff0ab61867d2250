//! Token encoding: `<accessKeyId>:<signature>:<encodedPolicy>`.
//!
//! - `encodedPolicy` is URL-safe base64 (no padding) of the policy JSON,
//!   e.g. `{"deadline":1767225600}`.
//! - `signature` is URL-safe base64 (no padding) of
//!   `HMAC-SHA256(secret, encodedPolicy)`.
//!
//! Neither base64 field can contain `:`, so splitting on it is unambiguous.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Number of `:`-separated fields in a well-formed token.
pub const ENCODED_FIELDS: usize = 3;

/// What a token grants, signed along with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Unix seconds after which the token is rejected.
    pub deadline: u64,
}

impl Policy {
    /// A policy valid until `deadline` (unix seconds).
    pub fn new(deadline: u64) -> Self {
        Self { deadline }
    }

    /// A policy valid for `ttl` from `now`.
    pub fn expires_in(now: u64, ttl: Duration) -> Self {
        Self::new(now.saturating_add(ttl.as_secs()))
    }

    /// Whether the deadline has passed at `now`.
    ///
    /// A token is still valid during the deadline second itself.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.deadline
    }

    /// Serialize and base64-encode the policy.
    pub fn encode(&self) -> Result<String, AuthError> {
        let json =
            serde_json::to_vec(self).map_err(|e| AuthError::MalformedPolicy(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a base64 policy field.
    pub fn decode(encoded: &str) -> Result<Self, AuthError> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| AuthError::MalformedPolicy(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| AuthError::MalformedPolicy(e.to_string()))
    }
}

/// The three fields of a token, borrowed from the token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessToken<'a> {
    /// Who the token claims to be.
    pub access_key_id: &'a str,
    /// Base64 HMAC over `encoded_policy`.
    pub signature: &'a str,
    /// Base64 policy JSON, exactly as signed.
    pub encoded_policy: &'a str,
}

impl<'a> AccessToken<'a> {
    /// Split a token into its fields.
    ///
    /// Fails with [`AuthError::IllegalAccessToken`] unless there are exactly
    /// [`ENCODED_FIELDS`] non-empty fields.
    pub fn parse(token: &'a str) -> Result<Self, AuthError> {
        let fields: Vec<&str> = token.split(':').collect();
        if fields.len() != ENCODED_FIELDS || fields.iter().any(|f| f.is_empty()) {
            return Err(AuthError::IllegalAccessToken);
        }
        Ok(Self {
            access_key_id: fields[0],
            signature: fields[1],
            encoded_policy: fields[2],
        })
    }
}

/// Produce a token for `access_key_id`, signed with `secret`.
pub fn sign(access_key_id: &str, secret: &str, policy: &Policy) -> Result<String, AuthError> {
    if access_key_id.is_empty() || access_key_id.contains(':') {
        return Err(AuthError::IllegalAccessToken);
    }
    let encoded_policy = policy.encode()?;
    let signature = signature(secret, &encoded_policy);
    Ok(format!("{access_key_id}:{signature}:{encoded_policy}"))
}

/// Base64 `HMAC-SHA256(secret, encoded_policy)`.
pub(crate) fn signature(secret: &str, encoded_policy: &str) -> String {
    URL_SAFE_NO_PAD.encode(hmac_sha256(secret.as_bytes(), encoded_policy.as_bytes()))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Current time in unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
