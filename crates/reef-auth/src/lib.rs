//! Access tokens for the Reef HTTP API.
//!
//! A token is `<accessKeyId>:<signature>:<encodedPolicy>`. The server looks
//! up the secret for `accessKeyId` through a [`KeyLookup`], recomputes the
//! HMAC-SHA256 signature over the encoded policy, compares it in constant
//! time, then checks the policy deadline. See [`token`] for the encoding.

mod error;
mod keys;
pub mod token;
mod verifier;

pub use error::AuthError;
pub use keys::{AccessKey, KeyLookup, MemoryKeyStore};
pub use token::{AccessToken, ENCODED_FIELDS, Policy, sign, unix_now};
pub use verifier::{Principal, TokenVerifier};
