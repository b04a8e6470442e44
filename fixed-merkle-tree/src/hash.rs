//! Hash primitives for the fixed Merkle tree.
//!
//! Hash domain separation:
//! - Leaf accumulators: `blake3(0x00 || chunk_0 || chunk_1 || ...)`
//! - Internal nodes:    `blake3(0x01 || left_hash || right_hash)`
//!
//! The tags keep a leaf digest from ever colliding with an internal node
//! built from the same bytes.

use crate::constants::DIGEST_SIZE;

/// Domain tag seeding every leaf accumulator.
pub const LEAF_DOMAIN_TAG: u8 = 0x00;
/// Domain tag prepended to internal node inputs.
pub const NODE_DOMAIN_TAG: u8 = 0x01;

/// Append-only hash state backing one leaf of the tree.
///
/// `Default` must produce the zero-byte state. Implementations must be order
/// sensitive and must not depend on how the input was split across `update`
/// calls.
pub trait LeafHasher: Default {
    /// Append `bytes` to the running state.
    fn update(&mut self, bytes: &[u8]);

    /// Digest over everything written so far. Does not disturb the state, so
    /// further updates continue from where they left off.
    fn digest(&self) -> [u8; DIGEST_SIZE];
}

/// Leaf accumulator using Blake3 seeded with [`LEAF_DOMAIN_TAG`].
#[derive(Clone, Debug)]
pub struct Blake3LeafHasher {
    state: blake3::Hasher,
}

impl Default for Blake3LeafHasher {
    fn default() -> Self {
        let mut state = blake3::Hasher::new();
        state.update(&[LEAF_DOMAIN_TAG]);
        Self { state }
    }
}

impl LeafHasher for Blake3LeafHasher {
    fn update(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    fn digest(&self) -> [u8; DIGEST_SIZE] {
        *self.state.finalize().as_bytes()
    }
}

/// Combine two child digests into their parent: `blake3(0x01 || left ||
/// right)`.
pub fn node_hash(left: &[u8; DIGEST_SIZE], right: &[u8; DIGEST_SIZE]) -> [u8; DIGEST_SIZE] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[NODE_DOMAIN_TAG]);
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}
