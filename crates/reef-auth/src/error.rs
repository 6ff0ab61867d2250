//! Error types for token verification.

/// Errors that can occur while signing or verifying an access token.
///
/// Callers facing the network should collapse every variant into one
/// generic "access denied"; the variants exist for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The token does not split into the expected number of fields.
    #[error("illegal access token")]
    IllegalAccessToken,

    /// No key is registered under the token's access key id.
    #[error("unknown access key: {0}")]
    UnknownAccessKey(String),

    /// The signature does not match the one computed from the secret.
    #[error("signature mismatch for access key {0}")]
    SignatureMismatch(String),

    /// The policy's deadline has passed.
    #[error("token expired at {deadline} (now {now})")]
    Expired {
        /// Deadline carried by the policy, in unix seconds.
        deadline: u64,
        /// Verification time, in unix seconds.
        now: u64,
    },

    /// The policy field is not base64-encoded JSON of the expected shape.
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),

    /// The key lookup backend failed.
    #[error("key lookup failed: {0}")]
    Lookup(String),
}
