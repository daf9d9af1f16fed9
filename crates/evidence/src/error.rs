use thiserror::Error;

/// Errors from evidence commitment and branch generation.
///
/// Branch *verification* never errors; it reports plain `false` so callers
/// on the challenge boundary cannot learn which check rejected a claim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("Empty batch: evidence contains no proofs")]
    EmptyBatch,

    #[error("Index {index} out of range for {leaf_count} proofs")]
    IndexOutOfRange { index: usize, leaf_count: usize },
}
