// Merkle commitments over claimable schedule tuples.
//
// Internal nodes use the sorted-pair combine: parent = keccak(min(a,b) || max(a,b)).
// Sorting makes proofs position-agnostic, so a proof is just the list of
// sibling digests from leaf to root with no direction bits.

use super::{keccak, Hash, HASH_SIZE};

/// Combine two child digests into their parent
#[inline]
pub fn combine(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut data = [0u8; HASH_SIZE * 2];
    data[..HASH_SIZE].copy_from_slice(lo.as_bytes());
    data[HASH_SIZE..].copy_from_slice(hi.as_bytes());
    keccak(&data)
}

/// Fold a proof from the leaf upward and compare against the expected root.
///
/// An empty proof accepts iff the leaf is itself the root (single-leaf tree).
pub fn verify_proof(leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    let mut acc = *leaf;
    for sibling in proof {
        acc = combine(&acc, sibling);
    }
    acc == *root
}

/// In-memory Merkle tree over a fixed leaf set.
///
/// The engine only verifies proofs; this builder exists so administrators and
/// tests can compute the root (and the proofs handed out off-line) with the
/// exact combine the verifier uses. A level with an odd node count duplicates
/// its last node.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    // levels[0] is the leaf level, last level holds the single root
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    pub fn from_leaves(leaves: Vec<Hash>) -> Self {
        let mut levels = Vec::new();
        let mut current = leaves;
        while current.len() > 1 {
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                next.push(combine(left, right));
            }
            levels.push(current);
            current = next;
        }
        levels.push(current);
        Self { levels }
    }

    /// Root of the tree; `Hash::zero()` for an empty leaf set
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::zero())
    }

    /// Sibling path for the leaf at `index`, ordered leaf to root
    pub fn proof(&self, index: usize) -> Option<Vec<Hash>> {
        if index >= self.levels[0].len() {
            return None;
        }

        let mut proof = Vec::new();
        let mut position = index;
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling = position ^ 1;
            // Odd tail pairs with itself
            let digest = level.get(sibling).unwrap_or(&level[position]);
            proof.push(*digest);
            position /= 2;
        }
        Some(proof)
    }
}
