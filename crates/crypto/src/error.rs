use thiserror::Error;

/// Errors surfaced by digest validation and signature checks.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Malformed hash: expected 64 lowercase hex characters, got {0:?}")]
    MalformedHash(String),

    #[error("Malformed public key: {0:?}")]
    MalformedPubKey(String),

    #[error("Malformed signature: {0:?}")]
    MalformedSignature(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Unsupported token version: {0:?}")]
    UnsupportedTokenVersion(String),
}
