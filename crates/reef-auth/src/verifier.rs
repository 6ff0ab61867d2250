//! Token verification against a [`KeyLookup`].

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;
use crate::keys::KeyLookup;
use crate::token::{self, AccessToken, Policy};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The access key the token was signed with.
    pub access_key_id: String,
    /// The user owning that key.
    pub user_id: String,
    /// Role names granted to the user.
    pub roles: Vec<String>,
    /// The policy the token carried.
    pub policy: Policy,
}

/// Checks access tokens against registered keys.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeyLookup>,
}

impl TokenVerifier {
    /// Create a verifier over a key source.
    pub fn new(keys: Arc<dyn KeyLookup>) -> Self {
        Self { keys }
    }

    /// Verify `token` at time `now` (unix seconds).
    ///
    /// Checks, in order: field count, key lookup, signature (constant-time),
    /// policy decode, deadline.
    pub async fn verify(&self, token: &str, now: u64) -> Result<Principal, AuthError> {
        let parsed = AccessToken::parse(token)?;

        let key = self
            .keys
            .lookup(parsed.access_key_id)
            .await?
            .ok_or_else(|| AuthError::UnknownAccessKey(parsed.access_key_id.to_string()))?;

        let expected = token::signature(&key.secret, parsed.encoded_policy);
        let matches: bool = expected
            .as_bytes()
            .ct_eq(parsed.signature.as_bytes())
            .into();
        if !matches {
            return Err(AuthError::SignatureMismatch(
                parsed.access_key_id.to_string(),
            ));
        }

        let policy = Policy::decode(parsed.encoded_policy)?;
        if policy.is_expired(now) {
            return Err(AuthError::Expired {
                deadline: policy.deadline,
                now,
            });
        }

        debug!(
            access_key_id = parsed.access_key_id,
            user_id = %key.user_id,
            "access token verified"
        );

        Ok(Principal {
            access_key_id: parsed.access_key_id.to_string(),
            user_id: key.user_id,
            roles: key.roles,
            policy,
        })
    }

    /// Verify `token` against the current wall clock.
    pub async fn verify_now(&self, token: &str) -> Result<Principal, AuthError> {
        self.verify(token, token::unix_now()).await
    }
}
