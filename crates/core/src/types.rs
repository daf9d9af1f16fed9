use serde::{Deserialize, Serialize};

/// Application-auth token version accepted by the current protocol.
///
/// The version participates in the canonical token bytes, so bumping it
/// changes every leaf encoding downstream. That is the intended upgrade
/// switch for the evidence wire format.
pub const SUPPORTED_TOKEN_VERSION: &str = "0.0.1";

/// Append a variable-width field as `len (u64 LE) || bytes`.
///
/// The length prefix keeps concatenated encodings injective: two field
/// lists can never collide by shifting bytes across a field boundary.
fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Identifies one time-bounded service relationship between an application
/// and the servicers assigned to it.
///
/// Evidence is collected and committed per session header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHeader {
    /// Application the session belongs to (lowercase hex pubkey)
    pub application_pub_key: String,
    /// Blockchain the relays were served for (lowercase hex identifier)
    pub chain: String,
    /// Block height the session was dispatched at
    pub session_block_height: u64,
}

impl SessionHeader {
    /// Canonical byte encoding used to key evidence by session.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(24 + self.application_pub_key.len() + self.chain.len());
        put_str(&mut data, &self.application_pub_key);
        put_str(&mut data, &self.chain);
        data.extend_from_slice(&self.session_block_height.to_le_bytes());
        data
    }
}

/// Application-auth token: the application's standing authorization for a
/// client to consume relays on its behalf.
///
/// The application signs the digest of the signable fields; the full token,
/// signature included, rides inside every relay proof.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aat {
    /// Token format version (see [`SUPPORTED_TOKEN_VERSION`])
    pub version: String,
    /// Application's lowercase hex pubkey
    pub app_pub_key: String,
    /// Client's lowercase hex pubkey
    pub client_pub_key: String,
    /// Application's lowercase hex signature over the token digest
    pub application_signature: String,
}

impl Aat {
    pub fn new(version: &str, app_pub_key: String, client_pub_key: String) -> Self {
        Self {
            version: version.to_string(),
            app_pub_key,
            client_pub_key,
            application_signature: String::new(),
        }
    }

    /// Bytes the application signs: every field except the signature itself.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            24 + self.version.len() + self.app_pub_key.len() + self.client_pub_key.len(),
        );
        put_str(&mut data, &self.version);
        put_str(&mut data, &self.app_pub_key);
        put_str(&mut data, &self.client_pub_key);
        data
    }

    /// Full canonical encoding, signature included.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut data = self.signable_bytes();
        put_str(&mut data, &self.application_signature);
        data
    }
}

/// One attested unit of service delivery: the servicer's claim that it
/// answered a single relay request during a session.
///
/// Relay proofs are the leaves of the evidence Merkle tree. Every field
/// that distinguishes two service events contributes to the canonical
/// encoding, in fixed order; equal-meaning proofs always produce identical
/// bytes, and the duplicate filter upstream rejects exact repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayProof {
    /// Entropy nonce tying the proof to one relay request
    pub entropy: u64,
    /// Block height of the session the relay was served in
    pub session_block_height: u64,
    /// Servicer's lowercase hex pubkey
    pub servicer_pub_key: String,
    /// Digest of the relay request this proof answers
    pub request_hash: String,
    /// Blockchain the relay was served for (lowercase hex identifier)
    pub blockchain: String,
    /// Application-auth token presented with the request
    pub token: Aat,
    /// Servicer's lowercase hex signature over the signable bytes
    pub signature: String,
}

impl RelayProof {
    /// Bytes the servicer signs: the canonical encoding minus the servicer
    /// signature itself.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let token = self.token.canonical_bytes();
        let mut data = Vec::with_capacity(
            56 + self.servicer_pub_key.len()
                + self.request_hash.len()
                + self.blockchain.len()
                + token.len(),
        );
        data.extend_from_slice(&self.entropy.to_le_bytes());
        data.extend_from_slice(&self.session_block_height.to_le_bytes());
        put_str(&mut data, &self.servicer_pub_key);
        put_str(&mut data, &self.request_hash);
        put_str(&mut data, &self.blockchain);
        data.extend_from_slice(&(token.len() as u64).to_le_bytes());
        data.extend_from_slice(&token);
        data
    }

    /// Canonical leaf encoding: all fields, fixed order, variable-width
    /// fields length prefixed. This layout is part of the protocol's
    /// compatibility surface and only changes with a token version bump.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut data = self.signable_bytes();
        put_str(&mut data, &self.signature);
        data
    }

    /// Session header this proof belongs to, as claimed by its own fields.
    pub fn session_header(&self) -> SessionHeader {
        SessionHeader {
            application_pub_key: self.token.app_pub_key.clone(),
            chain: self.blockchain.clone(),
            session_block_height: self.session_block_height,
        }
    }
}
