use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use relaymesh_core::{Aat, RelayProof, SUPPORTED_TOKEN_VERSION};

use crate::error::CryptoError;
use crate::hash::{decode_pub_key, decode_signature, token_hash};
use crate::keys::SigningKeypair;

/// Sign raw bytes, returning the 64-byte ed25519 signature.
pub fn sign_data(keypair: &SigningKeypair, data: &[u8]) -> [u8; 64] {
    keypair.signing_key.sign(data).to_bytes()
}

/// Check an ed25519 signature over raw bytes.
///
/// A pubkey that is not a valid curve point verifies as `false` rather
/// than erroring; callers that need the distinction run
/// `pub_key_verification` first.
pub fn verify_signature(pubkey: &[u8; 32], data: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(pubkey) else {
        return false;
    };
    verifying_key
        .verify(data, &Signature::from_bytes(signature))
        .is_ok()
}

/// Sign a relay proof's signable bytes and store the hex signature on the
/// proof. The servicer pubkey field must already be set by the caller.
pub fn sign_relay_proof(keypair: &SigningKeypair, proof: &mut RelayProof) {
    let signature = sign_data(keypair, &proof.signable_bytes());
    proof.signature = hex::encode(signature);
}

/// Verify a relay proof's servicer signature against its own pubkey field.
pub fn verify_relay_proof(proof: &RelayProof) -> Result<(), CryptoError> {
    let pubkey = decode_pub_key(&proof.servicer_pub_key)?;
    let signature = decode_signature(&proof.signature)?;
    if verify_signature(&pubkey, &proof.signable_bytes(), &signature) {
        Ok(())
    } else {
        Err(CryptoError::InvalidSignature)
    }
}

/// Sign a token's digest with the application key and store the hex
/// signature on the token.
pub fn sign_token(keypair: &SigningKeypair, token: &mut Aat) {
    let signature = sign_data(keypair, &token_hash(token));
    token.application_signature = hex::encode(signature);
}

/// Verify a token: supported version, well-formed application pubkey, and
/// a valid application signature over the token digest.
pub fn verify_token(token: &Aat) -> Result<(), CryptoError> {
    if token.version != SUPPORTED_TOKEN_VERSION {
        return Err(CryptoError::UnsupportedTokenVersion(token.version.clone()));
    }
    let pubkey = decode_pub_key(&token.app_pub_key)?;
    let signature = decode_signature(&token.application_signature)?;
    if verify_signature(&pubkey, &token_hash(token), &signature) {
        Ok(())
    } else {
        Err(CryptoError::InvalidSignature)
    }
}
