//! The fixed 32-byte digest and hex validation helpers.

use sha2::{Digest, Sha256};

use relaymesh_core::Aat;

use crate::error::CryptoError;

/// Digest size in bytes (SHA-256).
pub const HASH_SIZE: usize = 32;

/// Hash arbitrary bytes with the protocol's fixed digest.
///
/// Used for leaf encodings, parent-node preimages, and token digests alike.
pub fn merkle_hash(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Digest of a token's signable bytes. This is what the application signs.
pub fn token_hash(token: &Aat) -> [u8; HASH_SIZE] {
    merkle_hash(&token.signable_bytes())
}

/// Validate a hex string claimed to be a node or root digest.
///
/// Wire digests are exactly 64 lowercase hex characters; anything else is
/// rejected before it can reach the verifier.
pub fn hash_verification(hash: &str) -> Result<(), CryptoError> {
    if !is_lowercase_hex(hash, HASH_SIZE) {
        return Err(CryptoError::MalformedHash(hash.to_string()));
    }
    Ok(())
}

/// Validate a hex string claimed to be an ed25519 public key.
pub fn pub_key_verification(pub_key: &str) -> Result<(), CryptoError> {
    decode_pub_key(pub_key).map(|_| ())
}

/// Decode a lowercase hex pubkey string into its 32 raw bytes, requiring a
/// valid ed25519 point.
pub(crate) fn decode_pub_key(pub_key: &str) -> Result<[u8; 32], CryptoError> {
    if !is_lowercase_hex(pub_key, 32) {
        return Err(CryptoError::MalformedPubKey(pub_key.to_string()));
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(pub_key, &mut bytes)
        .map_err(|_| CryptoError::MalformedPubKey(pub_key.to_string()))?;
    ed25519_dalek::VerifyingKey::from_bytes(&bytes)
        .map_err(|_| CryptoError::MalformedPubKey(pub_key.to_string()))?;
    Ok(bytes)
}

/// Decode a lowercase hex signature string into its 64 raw bytes.
pub(crate) fn decode_signature(signature: &str) -> Result<[u8; 64], CryptoError> {
    if !is_lowercase_hex(signature, 64) {
        return Err(CryptoError::MalformedSignature(signature.to_string()));
    }
    let mut bytes = [0u8; 64];
    hex::decode_to_slice(signature, &mut bytes)
        .map_err(|_| CryptoError::MalformedSignature(signature.to_string()))?;
    Ok(bytes)
}

fn is_lowercase_hex(s: &str, raw_len: usize) -> bool {
    s.len() == 2 * raw_len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
