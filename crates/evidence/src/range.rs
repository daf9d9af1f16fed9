//! Numeric intervals carried by every tree node.
//!
//! Each leaf owns a uniform slot of the 64-bit number line; interior nodes
//! carry the union of their children's slots. The interval is bound into
//! every parent digest, so a verifier holding only the root detects range
//! tampering the same way it detects hash tampering.

use serde::{Deserialize, Serialize};

/// A closed interval `[lower, upper]` over the 64-bit domain.
///
/// Invariant: `lower <= upper` everywhere in a well-formed tree. Padding
/// sentinels carry the distinguished zero-width `[0, 0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub lower: u64,
    pub upper: u64,
}

impl Range {
    /// The interval of the zero-width padding sentinel.
    pub const EMPTY: Range = Range { lower: 0, upper: 0 };

    /// The full 64-bit domain; every root carries this after ascent.
    pub const FULL: Range = Range {
        lower: 0,
        upper: u64::MAX,
    };

    pub fn is_valid(&self) -> bool {
        self.lower <= self.upper
    }

    /// Whether this is the sentinel interval marking an all-padding subtree.
    pub fn is_sentinel(&self) -> bool {
        self.lower == 0 && self.upper == 0
    }

    /// Fixed 16-byte encoding bound into parent digests: `lower LE || upper LE`.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.lower.to_le_bytes());
        bytes[8..].copy_from_slice(&self.upper.to_le_bytes());
        bytes
    }
}

/// A tree node: 32-byte digest plus the interval it covers.
///
/// On the wire the digest is lowercase hex (64 chars) and the interval is
/// two decimal u64 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRange {
    #[serde(with = "hex::serde")]
    pub hash: [u8; 32],
    pub range: Range,
}

impl HashRange {
    pub fn is_valid_range(&self) -> bool {
        self.range.is_valid()
    }

    /// The digest as lowercase hex, its wire form.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// The slot of the 64-bit domain owned by leaf `index` in a batch of
/// `count` real leaves.
///
/// With `W = floor(u64::MAX / count)`, slot `i` gets `[i*W, (i+1)*W - 1]`;
/// the final slot absorbs the division remainder up to `u64::MAX`. That
/// asymmetry is observable in committed roots and must not be rebalanced.
pub(crate) fn slot_range(index: u64, count: u64) -> Range {
    let width = u64::MAX / count;
    Range {
        lower: index * width,
        upper: if index == count - 1 {
            u64::MAX
        } else {
            (index + 1) * width - 1
        },
    }
}

/// Assign each of `hash_ranges.len()` real leaves its uniform slot.
pub(crate) fn assign_slot_ranges(hash_ranges: &mut [HashRange]) {
    let count = hash_ranges.len() as u64;
    for (i, hr) in hash_ranges.iter_mut().enumerate() {
        hr.range = slot_range(i as u64, count);
    }
}
