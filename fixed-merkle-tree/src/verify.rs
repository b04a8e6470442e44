//! Proof verification.
//!
//! Pure functions, no tree required: the root is replayed from the leaf
//! digest and the sibling chain and compared with the claimed root.

use crate::{constants::DIGEST_SIZE, hash::node_hash, proof::MerklePath};

impl MerklePath {
    /// Replay the fold from the leaf digest up through every sibling.
    ///
    /// At each level an even index means the running digest is the left
    /// child, an odd index means it is the right child.
    pub fn compute_root(&self) -> [u8; DIGEST_SIZE] {
        let mut index = self.leaf_index;
        let mut hash = self.leaf_hash;
        for sibling in &self.nodes {
            hash = if index & 1 == 0 {
                node_hash(&hash, sibling)
            } else {
                node_hash(sibling, &hash)
            };
            index /= 2;
        }
        hash
    }

    /// Whether the sibling chain reproduces the claimed root.
    ///
    /// `false` means the leaf content, the index or the root is not what the
    /// commitment says; it is an integrity failure, not a transient one.
    pub fn verify(&self) -> bool {
        // Index bits beyond the path length would alias another leaf.
        let depth = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        if self.leaf_index.checked_shr(depth).unwrap_or(0) != 0 {
            return false;
        }
        self.compute_root() == self.root_hash
    }

    /// Like [`verify`](Self::verify), but also requires the claimed root to
    /// be `expected_root`, a commitment the caller already trusts.
    pub fn verify_against(&self, expected_root: &[u8; DIGEST_SIZE]) -> bool {
        &self.root_hash == expected_root && self.verify()
    }
}
