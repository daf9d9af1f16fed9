//! Sealed session evidence and the engine entry points.

use serde::{Deserialize, Serialize};

use relaymesh_core::{RelayProof, SessionHeader};

use crate::error::EvidenceError;
use crate::merkle::{sort_and_structure, EvidenceTree, MerkleBranch};
use crate::range::HashRange;

/// A sealed batch of relay proofs for one session.
///
/// The aggregator seals the batch; the engine only ever sees an immutable
/// snapshot. `num_of_proofs` is the leaf count verifiers are told on the
/// challenge boundary. Duplicate detection happens before sealing, never
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Session this batch commits work for
    pub session_header: SessionHeader,
    /// Declared leaf count, equal to `proofs.len()` at seal time
    pub num_of_proofs: u64,
    /// The proofs, in the order they were admitted
    pub proofs: Vec<RelayProof>,
}

impl Evidence {
    pub fn new(session_header: SessionHeader, proofs: Vec<RelayProof>) -> Self {
        Self {
            session_header,
            num_of_proofs: proofs.len() as u64,
            proofs,
        }
    }

    /// Commit the batch to a single range-augmented Merkle root.
    ///
    /// Any two holders of the same proof multiset derive the same root.
    pub fn generate_merkle_root(&self) -> Result<HashRange, EvidenceError> {
        Ok(self.tree()?.root())
    }

    /// Produce the inclusion branch for sorted position `index`, together
    /// with the proof that lands there.
    pub fn generate_merkle_proof(
        &self,
        index: usize,
    ) -> Result<(MerkleBranch, RelayProof), EvidenceError> {
        if self.proofs.is_empty() {
            return Err(EvidenceError::EmptyBatch);
        }
        let (leaves, sorted) = sort_and_structure(&self.proofs);
        let tree = EvidenceTree::from_sorted_leaves(leaves);
        let branch = tree.branch(index).ok_or(EvidenceError::IndexOutOfRange {
            index,
            leaf_count: sorted.len(),
        })?;
        Ok((branch, sorted[index].clone()))
    }

    /// Build the full tree, levels cached, for serving many branches from
    /// one sort.
    pub fn tree(&self) -> Result<EvidenceTree, EvidenceError> {
        if self.proofs.is_empty() {
            return Err(EvidenceError::EmptyBatch);
        }
        let (leaves, _) = sort_and_structure(&self.proofs);
        Ok(EvidenceTree::from_sorted_leaves(leaves))
    }

    /// Serialize to bytes (bincode)
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Evidence serialization should not fail")
    }

    /// Deserialize from bytes (bincode)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
