//! RelayMesh Evidence
//!
//! The range-augmented Merkle engine behind evidence commitment. A servicer
//! seals the relay proofs it accumulated during a session into an
//! [`Evidence`] batch, commits the batch as a single Merkle root on chain,
//! and later answers challenges with compact inclusion branches. Verifiers
//! re-derive the root from a leaf, a branch, and the declared leaf count
//! alone; any tampering with hashes, ranges, or the declared size surfaces
//! as a root mismatch.
//!
//! Construction is deterministic: leaves are ordered by digest with the
//! insertion index as tie-break, so any two parties holding the same proof
//! multiset derive byte-identical trees.

pub mod bundle;
pub mod error;
pub mod merkle;
pub mod range;

pub use bundle::Evidence;
pub use error::EvidenceError;
pub use merkle::{
    sort_and_structure, BranchStep, EvidenceTree, MerkleBranch, Side, EMPTY_LEAF_HASH,
};
pub use range::{HashRange, Range};
