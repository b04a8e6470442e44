use thiserror::Error;

/// Alias for `core::result::Result<T, FixedMerkleError>`.
pub type Result<T> = core::result::Result<T, FixedMerkleError>;

/// Errors from fixed Merkle tree operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixedMerkleError {
    /// `finalize` was called on a tree that is already finalized.
    #[error("already finalized")]
    AlreadyFinalized,
    /// `write` or `reload` was called on a finalized tree.
    #[error("cannot modify: tree is already finalized")]
    TreeFinalized,
    /// A root or proof was requested before the tree was finalized.
    #[error("tree is not finalized: root and proofs are only available after finalize")]
    NotFinalized,
    /// A window longer than the fixed window size was dispatched to the
    /// leaves.
    #[error("window of {len} bytes exceeds the window size of {max} bytes")]
    WindowTooLarge {
        /// Length of the rejected window.
        len: usize,
        /// Largest accepted window length.
        max: usize,
    },
    /// A short window was dispatched to the leaves before finalization. Only
    /// the last window of a stream may be shorter than the window size.
    #[error("invalid leaf write: partial window of {len} bytes before finalize (expected {expected})")]
    PartialWindow {
        /// Length of the rejected window.
        len: usize,
        /// Required length of a non-terminal window.
        expected: usize,
    },
    /// A leaf index at or beyond the leaf count was requested.
    #[error("leaf index {index} is out of range (leaf count {leaf_count})")]
    LeafIndexOutOfRange {
        /// Requested leaf index.
        index: usize,
        /// Number of leaves in the tree.
        leaf_count: usize,
    },
    /// A leaf set that cannot be folded into a root.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A proof that cannot be encoded, or bytes that do not decode to a
    /// well-formed proof.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// Error surfaced by the byte source during a reload.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A writer panicked while holding the state lock.
    #[error("tree state lock poisoned by a panicking writer")]
    LockPoisoned,
}
