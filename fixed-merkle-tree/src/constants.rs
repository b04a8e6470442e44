//! Fixed tree geometry.

/// Bytes of a window assigned to a single leaf.
pub const CHUNK_SIZE: usize = 64;

/// Number of leaf accumulators in every tree.
pub const LEAF_COUNT: usize = 1024;

/// Bytes dispatched to the leaves at once: one chunk per leaf.
pub const WINDOW_SIZE: usize = LEAF_COUNT * CHUNK_SIZE;

/// Upper bound on fold rounds. `log2(LEAF_COUNT)` is 10; the extra round is
/// headroom for the odd-node rule.
pub const FIXED_MT_DEPTH: usize = 11;

/// Size of leaf and node digests.
pub const DIGEST_SIZE: usize = 32;
