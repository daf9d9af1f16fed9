//! Ed25519 signing keypairs.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// An ed25519 keypair used by servicers and applications to sign proofs
/// and tokens.
///
/// Key persistence and enclave handling live outside this layer; callers
/// hold the keypair in memory for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SigningKeypair {
    pub(crate) signing_key: SigningKey,
}

impl SigningKeypair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret key.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// The 32-byte secret key.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The public key as lowercase hex, the form it takes in proofs and
    /// tokens.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}
