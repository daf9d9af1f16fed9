//! Range-augmented binary Merkle tree over sorted relay-proof leaves.
//!
//! Leaf digests are ordered ascending, each carrying one slot of the
//! 64-bit number line. Parents hash `left || right || range_bytes`, where
//! the range is the union of the children's slots. The leaf layer is
//! padded to a power of two with a reserved empty leaf whose preimage is
//! the zero-length byte string.

use serde::{Deserialize, Serialize};
use tracing::debug;

use relaymesh_core::RelayProof;
use relaymesh_crypto::merkle_hash;

use crate::range::{assign_slot_ranges, slot_range, HashRange, Range};

/// Digest of the empty-leaf preimage, `SHA256("")`.
///
/// Padding slots carry this hash with the zero-width `[0, 0]` interval.
/// Real leaf encodings always contain a version tag and public keys, so
/// they can never be zero-length. The value is frozen; cross-implementation
/// roots depend on it.
pub const EMPTY_LEAF_HASH: [u8; 32] = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9,
    0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52,
    0xb8, 0x55,
];

/// The padding sentinel: empty-leaf digest with the zero-width interval.
fn empty_leaf() -> HashRange {
    HashRange {
        hash: EMPTY_LEAF_HASH,
        range: Range::EMPTY,
    }
}

/// Width of the padded leaf layer for `leaf_count` real leaves.
///
/// A single proof is still paired with one sentinel, so the minimum padded
/// width is 2 and every batch produces at least one combination step.
pub(crate) fn padded_width(leaf_count: usize) -> usize {
    leaf_count.next_power_of_two().max(2)
}

/// Number of siblings on any branch of a tree with `leaf_count` real leaves.
fn expected_branch_len(leaf_count: u64) -> usize {
    padded_width(leaf_count as usize).trailing_zeros() as usize
}

/// Which side of the running node a branch sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One level of a branch: the sibling node and its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStep {
    pub sibling: HashRange,
    pub side: Side,
}

/// An inclusion branch: the target leaf's node plus the sibling path from
/// leaf level toward the root.
///
/// The side sequence doubles as the binary encoding of the leaf index
/// (least-significant bit first), which the verifier uses to decide where
/// padding subtrees are legitimate under the declared leaf count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleBranch {
    /// The leaf node this branch proves inclusion of
    pub target: HashRange,
    /// Siblings from leaf level up, with their sides
    pub steps: Vec<BranchStep>,
}

/// Merge two child intervals into the parent's.
///
/// An empty right child leaves the left interval untouched. Without that
/// rule, padding at a non-power-of-two boundary would pull the parent's
/// upper bound down to zero and the root would no longer cover the domain.
fn parent_range(left: Range, right: Range) -> Range {
    if right.is_sentinel() {
        left
    } else {
        Range {
            lower: left.lower,
            upper: right.upper,
        }
    }
}

/// Parent digest: `H(left.hash || right.hash || range_bytes)`.
///
/// Binding the interval into the digest is what lets a verifier holding
/// only the root detect range tampering.
fn parent_hash(left: &HashRange, right: &HashRange, range: Range) -> [u8; 32] {
    let mut preimage = [0u8; 80];
    preimage[..32].copy_from_slice(&left.hash);
    preimage[32..64].copy_from_slice(&right.hash);
    preimage[64..].copy_from_slice(&range.to_bytes());
    merkle_hash(&preimage)
}

/// Combine two children into their parent node.
///
/// Panics if the merged interval is inverted; that can only happen through
/// memory corruption or a bug in slot assignment, never through caller
/// input, and a tree built on it would be unverifiable.
fn combine(left: &HashRange, right: &HashRange) -> HashRange {
    let range = parent_range(left.range, right.range);
    assert!(
        range.is_valid(),
        "range invariant violated: {} > {}",
        range.lower,
        range.upper
    );
    HashRange {
        hash: parent_hash(left, right, range),
        range,
    }
}

/// Hash every proof, order the leaves by digest ascending, and assign each
/// final position its slot of the 64-bit domain.
///
/// Returns the leaf layer and the proofs permuted into the same order, so
/// index `i` of either output refers to the same service event. Digest
/// ties fall back to the original insertion index; the output is a pure
/// function of the input multiset.
pub fn sort_and_structure(proofs: &[RelayProof]) -> (Vec<HashRange>, Vec<RelayProof>) {
    let mut order: Vec<(usize, [u8; 32])> = proofs
        .iter()
        .map(|p| merkle_hash(&p.canonical_bytes()))
        .enumerate()
        .collect();
    order.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut hash_ranges = Vec::with_capacity(order.len());
    let mut sorted_proofs = Vec::with_capacity(order.len());
    for (original_index, hash) in order {
        hash_ranges.push(HashRange {
            hash,
            range: Range::EMPTY,
        });
        sorted_proofs.push(proofs[original_index].clone());
    }
    assign_slot_ranges(&mut hash_ranges);
    (hash_ranges, sorted_proofs)
}

/// A built evidence tree with every level cached.
///
/// Levels are stored bottom-up, `levels[0]` holding the padded leaf layer.
/// One build serves the root and any number of inclusion branches; each
/// level is a single contiguous buffer of copyable nodes.
#[derive(Debug, Clone)]
pub struct EvidenceTree {
    levels: Vec<Vec<HashRange>>,
    real_leaves: usize,
}

impl EvidenceTree {
    /// Build the padded tree over an already sorted, range-assigned leaf
    /// layer.
    pub fn from_sorted_leaves(leaves: Vec<HashRange>) -> Self {
        let real_leaves = leaves.len();
        let mut level = leaves;
        level.resize(padded_width(real_leaves), empty_leaf());

        let mut levels = vec![level];
        while levels.last().map_or(false, |l| l.len() > 1) {
            let prev = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity(prev.len() / 2);
            for pair in prev.chunks(2) {
                next.push(combine(&pair[0], &pair[1]));
            }
            levels.push(next);
        }

        debug!(
            leaves = real_leaves,
            padded = levels[0].len(),
            height = levels.len() - 1,
            "built evidence tree"
        );

        Self {
            levels,
            real_leaves,
        }
    }

    /// The committed root node.
    pub fn root(&self) -> HashRange {
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of levels above the leaf layer; equals the branch length.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// Number of real (non-padding) leaves.
    pub fn leaf_count(&self) -> usize {
        self.real_leaves
    }

    /// Generate the inclusion branch for the leaf at sorted position
    /// `index`.
    ///
    /// Returns `None` for indices at or beyond the real leaf count;
    /// padding slots have no proof to challenge.
    pub fn branch(&self, index: usize) -> Option<MerkleBranch> {
        if index >= self.real_leaves {
            return None;
        }

        let mut steps = Vec::with_capacity(self.height());
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_idx, side) = if idx % 2 == 0 {
                (idx + 1, Side::Right)
            } else {
                (idx - 1, Side::Left)
            };
            steps.push(BranchStep {
                sibling: level[sibling_idx],
                side,
            });
            idx /= 2;
        }

        Some(MerkleBranch {
            target: self.levels[0][index],
            steps,
        })
    }
}

impl MerkleBranch {
    /// Re-derive a root from the target leaf and sibling path, then compare
    /// hash and range against `root` under the declared leaf count.
    ///
    /// Every failure mode returns `false`: wrong root, wrong leaf, wrong
    /// declared size, wrong branch length, inverted ranges, and padding
    /// claims that contradict the declared size. The caller cannot learn
    /// which check rejected the claim.
    pub fn validate(&self, root: &HashRange, leaf: &RelayProof, leaf_count: u64) -> bool {
        if leaf_count == 0 {
            return false;
        }
        if self.steps.len() != expected_branch_len(leaf_count) {
            return false;
        }
        if self.target.hash != merkle_hash(&leaf.canonical_bytes()) {
            return false;
        }

        // Recover the leaf index from the side bits: a left sibling means
        // the running node was the right child at that level.
        let mut index: u64 = 0;
        for (depth, step) in self.steps.iter().enumerate() {
            if step.side == Side::Left {
                index |= 1 << depth;
            }
        }
        if index >= leaf_count {
            return false;
        }
        // The target must carry exactly the slot that `index` owns under
        // the declared leaf count. A declared size that merely shares the
        // padded width of the true one still changes the slot layout.
        if self.target.range != slot_range(index, leaf_count) {
            return false;
        }

        let mut running = self.target;
        let mut idx = index;
        for (depth, step) in self.steps.iter().enumerate() {
            if !step.sibling.range.is_valid() {
                return false;
            }

            // The sibling subtree holds only padding exactly when its first
            // leaf slot is at or past the declared leaf count.
            let sibling_idx = idx ^ 1;
            let subtree_is_padding = sibling_idx << depth >= leaf_count;
            if step.sibling.range.is_sentinel() != subtree_is_padding {
                return false;
            }

            let (left, right) = match step.side {
                Side::Left => (&step.sibling, &running),
                Side::Right => (&running, &step.sibling),
            };
            let range = parent_range(left.range, right.range);
            if !range.is_valid() {
                return false;
            }
            running = HashRange {
                hash: parent_hash(left, right, range),
                range,
            };
            idx /= 2;
        }

        running.hash == root.hash && running.range == root.range
    }

    /// Serialize to bytes (bincode)
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("MerkleBranch serialization should not fail")
    }

    /// Deserialize from bytes (bincode)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymesh_core::{Aat, RelayProof};

    fn test_proof(entropy: u64) -> RelayProof {
        RelayProof {
            entropy,
            session_block_height: 1,
            servicer_pub_key: "dd".repeat(32),
            request_hash: "ee".repeat(32),
            blockchain: "0021".to_string(),
            token: Aat::new("0.0.1", "aa".repeat(32), "bb".repeat(32)),
            signature: "ff".repeat(64),
        }
    }

    fn build(proofs: &[RelayProof]) -> (EvidenceTree, Vec<RelayProof>) {
        let (leaves, sorted) = sort_and_structure(proofs);
        (EvidenceTree::from_sorted_leaves(leaves), sorted)
    }

    #[test]
    fn test_empty_leaf_hash_matches_preimage() {
        assert_eq!(EMPTY_LEAF_HASH, merkle_hash(&[]));
    }

    #[test]
    fn test_padded_width() {
        assert_eq!(padded_width(1), 2);
        assert_eq!(padded_width(2), 2);
        assert_eq!(padded_width(3), 4);
        assert_eq!(padded_width(5), 8);
        assert_eq!(padded_width(8), 8);
        assert_eq!(padded_width(9), 16);
    }

    #[test]
    fn test_expected_branch_len() {
        assert_eq!(expected_branch_len(1), 1);
        assert_eq!(expected_branch_len(2), 1);
        assert_eq!(expected_branch_len(5), 3);
        assert_eq!(expected_branch_len(9), 4);
        assert_eq!(expected_branch_len(16), 4);
    }

    #[test]
    fn test_combine_orders_and_binds_range() {
        let left = HashRange {
            hash: [1u8; 32],
            range: Range { lower: 0, upper: 4 },
        };
        let right = HashRange {
            hash: [2u8; 32],
            range: Range { lower: 5, upper: 9 },
        };

        let parent = combine(&left, &right);
        assert_eq!(parent.range, Range { lower: 0, upper: 9 });

        // Child order matters
        let swapped = combine(&right, &left);
        assert_ne!(parent.hash, swapped.hash);

        // Same child hashes, different child range: different parent digest
        let mut right_shifted = right;
        right_shifted.range.upper = 10;
        assert_ne!(parent.hash, combine(&left, &right_shifted).hash);
    }

    #[test]
    fn test_combine_sentinel_right_keeps_left_range() {
        let left = HashRange {
            hash: [1u8; 32],
            range: Range {
                lower: 7,
                upper: u64::MAX,
            },
        };
        let parent = combine(&left, &empty_leaf());
        assert_eq!(parent.range, left.range);
    }

    #[test]
    #[should_panic(expected = "range invariant violated")]
    fn test_combine_panics_on_inverted_range() {
        let left = HashRange {
            hash: [1u8; 32],
            range: Range { lower: 9, upper: 9 },
        };
        let right = HashRange {
            hash: [2u8; 32],
            range: Range { lower: 1, upper: 3 },
        };
        combine(&left, &right);
    }

    #[test]
    fn test_sort_and_structure_orders_by_digest() {
        let proofs: Vec<RelayProof> = (0..8).map(test_proof).collect();
        let (leaves, sorted) = sort_and_structure(&proofs);

        assert_eq!(leaves.len(), proofs.len());
        assert_eq!(sorted.len(), proofs.len());
        for w in leaves.windows(2) {
            assert!(w[0].hash < w[1].hash);
        }
        for (leaf, proof) in leaves.iter().zip(&sorted) {
            assert_eq!(leaf.hash, merkle_hash(&proof.canonical_bytes()));
        }
    }

    #[test]
    fn test_sort_and_structure_order_independent() {
        let proofs: Vec<RelayProof> = (0..16).map(test_proof).collect();
        let mut reversed = proofs.clone();
        reversed.reverse();

        let (leaves_a, sorted_a) = sort_and_structure(&proofs);
        let (leaves_b, sorted_b) = sort_and_structure(&reversed);
        assert_eq!(leaves_a, leaves_b);
        assert_eq!(sorted_a, sorted_b);
    }

    #[test]
    fn test_tree_root_covers_domain() {
        for count in [1usize, 2, 3, 5, 9, 17, 64] {
            let proofs: Vec<RelayProof> = (0..count as u64).map(test_proof).collect();
            let (tree, _) = build(&proofs);
            let root = tree.root();
            assert_eq!(root.range.lower, 0, "count={count}");
            assert_eq!(root.range.upper, u64::MAX, "count={count}");
        }
    }

    #[test]
    fn test_tree_all_nodes_have_valid_ranges() {
        let proofs: Vec<RelayProof> = (0..9).map(test_proof).collect();
        let (leaves, _) = sort_and_structure(&proofs);
        let tree = EvidenceTree::from_sorted_leaves(leaves);
        for level in &tree.levels {
            for node in level {
                assert!(node.is_valid_range());
            }
        }
    }

    #[test]
    fn test_tree_deterministic() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree_a, _) = build(&proofs);
        let (tree_b, _) = build(&proofs);
        assert_eq!(tree_a.root(), tree_b.root());
    }

    #[test]
    fn test_single_leaf_combines_with_sentinel() {
        let proofs = vec![test_proof(7)];
        let (leaves, _) = sort_and_structure(&proofs);
        let leaf = leaves[0];
        let tree = EvidenceTree::from_sorted_leaves(leaves);

        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root(), combine(&leaf, &empty_leaf()));
    }

    #[test]
    fn test_branch_structure() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (leaves, _) = sort_and_structure(&proofs);
        let tree = EvidenceTree::from_sorted_leaves(leaves.clone());

        let branch = tree.branch(0).unwrap();
        assert_eq!(branch.steps.len(), 3);
        assert_eq!(branch.target, leaves[0]);
        // First sibling on the path is the adjacent leaf
        assert_eq!(branch.steps[0].sibling, leaves[1]);
        assert_eq!(branch.steps[0].side, Side::Right);

        // Index 4 pairs with the first padding slot
        let branch = tree.branch(4).unwrap();
        assert!(branch.steps[0].sibling.range.is_sentinel());
    }

    #[test]
    fn test_branch_out_of_range() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, _) = build(&proofs);
        assert!(tree.branch(5).is_none());
        // Padding slots exist in the tree but are not challengeable
        assert!(tree.branch(7).is_none());
    }

    #[test]
    fn test_validate_round_trip_all_indices() {
        for count in [1usize, 2, 3, 5, 9, 16, 17] {
            let proofs: Vec<RelayProof> = (0..count as u64).map(test_proof).collect();
            let (tree, sorted) = build(&proofs);
            let root = tree.root();
            for (i, proof) in sorted.iter().enumerate() {
                let branch = tree.branch(i).unwrap();
                assert!(
                    branch.validate(&root, proof, count as u64),
                    "count={count} index={i}"
                );
            }
        }
    }

    #[test]
    fn test_validate_rejects_wrong_root() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let branch = tree.branch(2).unwrap();

        let mut wrong_root = tree.root();
        wrong_root.hash[0] ^= 1;
        assert!(!branch.validate(&wrong_root, &sorted[2], 5));

        let mut wrong_range = tree.root();
        wrong_range.range.upper -= 1;
        assert!(!branch.validate(&wrong_range, &sorted[2], 5));
    }

    #[test]
    fn test_validate_rejects_wrong_leaf() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let branch = tree.branch(2).unwrap();
        assert!(!branch.validate(&tree.root(), &sorted[3], 5));
    }

    #[test]
    fn test_validate_rejects_wrong_declared_size() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let branch = tree.branch(2).unwrap();
        let root = tree.root();

        // Different padded width: branch length check fires
        assert!(!branch.validate(&root, &sorted[2], 9));
        assert!(!branch.validate(&root, &sorted[2], 2));
        assert!(!branch.validate(&root, &sorted[2], 0));
        // Same padded width but different real count: slot layout differs
        assert!(!branch.validate(&root, &sorted[2], 8));
    }

    #[test]
    fn test_validate_rejects_sentinel_contamination() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let root = tree.root();

        // Claim a real sibling slot is padding
        let mut branch = tree.branch(2).unwrap();
        branch.steps[0].sibling = empty_leaf();
        assert!(!branch.validate(&root, &sorted[2], 5));

        // Claim a padding slot holds a real node
        let mut branch = tree.branch(4).unwrap();
        branch.steps[0].sibling.range = Range { lower: 1, upper: 2 };
        assert!(!branch.validate(&root, &sorted[4], 5));
    }

    #[test]
    fn test_validate_rejects_inverted_sibling_range() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let mut branch = tree.branch(1).unwrap();
        branch.steps[1].sibling.range = Range { lower: 9, upper: 3 };
        assert!(!branch.validate(&tree.root(), &sorted[1], 5));
    }

    #[test]
    fn test_validate_rejects_truncated_branch() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, sorted) = build(&proofs);
        let mut branch = tree.branch(2).unwrap();
        branch.steps.pop();
        assert!(!branch.validate(&tree.root(), &sorted[2], 5));
    }

    #[test]
    fn test_branch_bincode_roundtrip() {
        let proofs: Vec<RelayProof> = (0..5).map(test_proof).collect();
        let (tree, _) = build(&proofs);
        let branch = tree.branch(3).unwrap();

        let bytes = branch.to_bytes();
        let restored = MerkleBranch::from_bytes(&bytes).unwrap();
        assert_eq!(branch, restored);
    }
}
