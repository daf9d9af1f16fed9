//! RelayMesh Aggregator
//!
//! Per-session collection of relay proofs on the servicer side. Incoming
//! proofs are validated (session binding, token, servicer signature) and
//! screened against a per-session duplicate filter before they are stored.
//! When the session ends, the aggregator seals an immutable [`Evidence`]
//! snapshot for the Merkle engine; the engine itself never re-checks
//! duplicates, so the filter here is authoritative.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use relaymesh_core::{RelayProof, SessionHeader};
use relaymesh_crypto::{merkle_hash, pub_key_verification, verify_relay_proof, verify_token, CryptoError};
use relaymesh_evidence::Evidence;

/// Maximum number of proofs held for a single session.
/// Prevents unbounded memory growth from a misbehaving dispatcher.
const MAX_PROOFS_PER_SESSION: usize = 1 << 20;

/// Duplicate-detection filter over canonical leaf digests.
///
/// An exact membership set: a proof is a duplicate exactly when its leaf
/// encoding has been admitted before. Stands behind the same interface a
/// probabilistic filter would.
#[derive(Debug, Clone, Default)]
pub struct LeafFilter {
    seen: HashSet<[u8; 32]>,
}

impl LeafFilter {
    pub fn contains(&self, leaf_hash: &[u8; 32]) -> bool {
        self.seen.contains(leaf_hash)
    }

    pub fn insert(&mut self, leaf_hash: [u8; 32]) {
        self.seen.insert(leaf_hash);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Proofs and filter state for one open session.
#[derive(Debug, Clone, Default)]
struct OpenSession {
    filter: LeafFilter,
    proofs: Vec<RelayProof>,
}

/// Collects validated relay proofs per session and seals evidence
/// snapshots for commitment.
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    sessions: HashMap<SessionHeader, OpenSession>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and admit one relay proof into the session identified by
    /// `header`.
    ///
    /// Checks, in order: the proof's own fields bind it to the session,
    /// every pubkey is well formed, the token carries a supported version
    /// and a valid application signature, the servicer signature covers
    /// the signable bytes, and the leaf encoding has not been seen before.
    pub fn add_proof(
        &mut self,
        header: &SessionHeader,
        proof: RelayProof,
    ) -> Result<(), AggregatorError> {
        if proof.session_header() != *header {
            warn!(
                servicer = short(&proof.servicer_pub_key),
                height = proof.session_block_height,
                "proof does not bind to session header"
            );
            return Err(AggregatorError::SessionMismatch);
        }

        pub_key_verification(&proof.token.client_pub_key).map_err(AggregatorError::InvalidToken)?;

        verify_token(&proof.token).map_err(|e| {
            warn!(
                app = short(&proof.token.app_pub_key),
                "token rejected: {e}"
            );
            AggregatorError::InvalidToken(e)
        })?;

        verify_relay_proof(&proof).map_err(|e| {
            warn!(
                servicer = short(&proof.servicer_pub_key),
                "proof signature rejected: {e}"
            );
            AggregatorError::InvalidProof(e)
        })?;

        let leaf_hash = merkle_hash(&proof.canonical_bytes());
        let session = self.sessions.entry(header.clone()).or_default();
        if session.filter.contains(&leaf_hash) {
            return Err(AggregatorError::DuplicateProof);
        }
        if session.proofs.len() >= MAX_PROOFS_PER_SESSION {
            warn!(
                height = header.session_block_height,
                "session is full, rejecting proof"
            );
            return Err(AggregatorError::SessionFull(MAX_PROOFS_PER_SESSION));
        }

        session.filter.insert(leaf_hash);
        session.proofs.push(proof);
        debug!(
            height = header.session_block_height,
            proofs = session.proofs.len(),
            "admitted relay proof"
        );
        Ok(())
    }

    /// Seal an immutable evidence snapshot for a session, leaving the
    /// session open for further proofs.
    ///
    /// Returns `None` for an unknown session.
    pub fn seal(&self, header: &SessionHeader) -> Option<Evidence> {
        self.sessions
            .get(header)
            .map(|s| Evidence::new(header.clone(), s.proofs.clone()))
    }

    /// Seal a session's evidence and drop its state.
    pub fn close_session(&mut self, header: &SessionHeader) -> Option<Evidence> {
        self.sessions
            .remove(header)
            .map(|s| Evidence::new(header.clone(), s.proofs))
    }

    /// Number of proofs admitted for a session so far.
    pub fn proof_count(&self, header: &SessionHeader) -> usize {
        self.sessions.get(header).map_or(0, |s| s.proofs.len())
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Truncate a hex key for log lines.
fn short(key: &str) -> &str {
    key.get(..16).unwrap_or(key)
}

/// Aggregator errors
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Proof does not bind to the session header")]
    SessionMismatch,

    #[error("Duplicate proof for this session")]
    DuplicateProof,

    #[error("Session is full ({0} proofs)")]
    SessionFull(usize),

    #[error("Invalid token: {0}")]
    InvalidToken(CryptoError),

    #[error("Invalid proof signature: {0}")]
    InvalidProof(CryptoError),
}
