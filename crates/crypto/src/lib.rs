//! RelayMesh Crypto
//!
//! The fixed digest and signature primitives shared by the evidence engine
//! and its collaborators: SHA-256 hashing of canonical encodings, hex
//! validation for digests and pubkeys on the wire, and ed25519 signing of
//! relay proofs and application-auth tokens.
//!
//! The hash function is not negotiable at runtime. Every participant must
//! re-derive identical roots from identical proof batches, so the digest,
//! like the canonical encodings it consumes, is part of the protocol's
//! compatibility surface.

pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use hash::{hash_verification, merkle_hash, pub_key_verification, token_hash, HASH_SIZE};
pub use keys::SigningKeypair;
pub use sign::{
    sign_data, sign_relay_proof, sign_token, verify_relay_proof, verify_signature, verify_token,
};
