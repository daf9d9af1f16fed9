//! RelayMesh Core
//!
//! Shared domain types for the RelayMesh relay-service protocol: session
//! headers, application-auth tokens, and the relay proofs that become
//! Merkle leaves when a servicer commits its session evidence.

pub mod types;

pub use types::{Aat, RelayProof, SessionHeader, SUPPORTED_TOKEN_VERSION};
