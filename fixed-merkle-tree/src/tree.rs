use std::{
    fmt,
    io::{self, Read},
    sync::{Mutex, MutexGuard, OnceLock},
};

use tracing::{debug, trace};

use crate::{
    FixedMerkleError, MerklePath, Result,
    constants::{CHUNK_SIZE, DIGEST_SIZE, LEAF_COUNT, WINDOW_SIZE},
    fold::{Levels, fold_levels, root_of},
    hash::{Blake3LeafHasher, LeafHasher},
};

/// A fixed-topology Merkle tree over a byte stream.
///
/// The stream is cut into windows of [`WINDOW_SIZE`] bytes. Each window is
/// split into [`LEAF_COUNT`] chunks of [`CHUNK_SIZE`] bytes and chunk `i`
/// is appended to leaf `i`, so every leaf accumulates a fixed-stride slice
/// of the whole stream. The shape of the tree never depends on the stream
/// length.
///
/// Writes are serialized by an internal lock and the tree can be shared
/// between threads. Once [`finalize`](Self::finalize) succeeds, the root and
/// inclusion proofs become available and are computed at most once.
pub struct FixedMerkleTree<H = Blake3LeafHasher> {
    state: Mutex<WriteState<H>>,
    levels: OnceLock<Levels>,
}

/// Everything guarded by the write lock.
pub(crate) struct WriteState<H> {
    leaves: Vec<H>,
    buffer: Box<[u8]>,
    /// Bytes staged in `buffer`, always below `WINDOW_SIZE` between calls.
    pub(crate) staged: usize,
    pub(crate) finalized: bool,
    windows: u64,
}

impl<H: LeafHasher> WriteState<H> {
    fn new() -> Self {
        Self {
            leaves: new_leaves(),
            buffer: vec![0u8; WINDOW_SIZE].into_boxed_slice(),
            staged: 0,
            finalized: false,
            windows: 0,
        }
    }

    /// Dispatch the staged bytes to the leaves. The staged count is only
    /// cleared if the dispatch is accepted.
    pub(crate) fn flush_window(&mut self) -> Result<()> {
        let len = self.staged;
        write_to_leaves(&mut self.leaves, &self.buffer[..len], self.finalized)?;
        self.staged = 0;
        self.windows += 1;
        trace!(len, window = self.windows, "dispatched window to leaves");
        Ok(())
    }

    fn leaf_digests(&self) -> Vec<[u8; DIGEST_SIZE]> {
        self.leaves.iter().map(LeafHasher::digest).collect()
    }
}

fn new_leaves<H: LeafHasher>() -> Vec<H> {
    (0..LEAF_COUNT).map(|_| H::default()).collect()
}

/// Feed one window to the leaves, chunk `i` to leaf `i`.
///
/// A window must be exactly [`WINDOW_SIZE`] bytes unless the tree is
/// finalized, in which case it is the terminal window and may be shorter.
pub(crate) fn write_to_leaves<H: LeafHasher>(
    leaves: &mut [H],
    window: &[u8],
    finalized: bool,
) -> Result<()> {
    if window.len() > WINDOW_SIZE {
        return Err(FixedMerkleError::WindowTooLarge {
            len: window.len(),
            max: WINDOW_SIZE,
        });
    }
    if window.len() < WINDOW_SIZE && !finalized {
        return Err(FixedMerkleError::PartialWindow {
            len: window.len(),
            expected: WINDOW_SIZE,
        });
    }

    for (leaf, chunk) in leaves.iter_mut().zip(window.chunks(CHUNK_SIZE)) {
        leaf.update(chunk);
    }
    Ok(())
}

impl FixedMerkleTree {
    /// Create an empty tree using the default Blake3 leaf hasher.
    pub fn new() -> Self {
        Self::with_leaf_hasher()
    }

    /// Build and finalize a tree from everything `reader` yields.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut tree = Self::new();
        tree.reload(reader)?;
        tree.finalize()?;
        Ok(tree)
    }
}

impl<H: LeafHasher> Default for FixedMerkleTree<H> {
    fn default() -> Self {
        Self::with_leaf_hasher()
    }
}

impl<H: LeafHasher> FixedMerkleTree<H> {
    /// Create an empty tree whose leaves use `H`. All leaves start at the
    /// zero-byte state of `H`.
    pub fn with_leaf_hasher() -> Self {
        Self {
            state: Mutex::new(WriteState::new()),
            levels: OnceLock::new(),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, WriteState<H>>> {
        self.state.lock().map_err(|_| FixedMerkleError::LockPoisoned)
    }

    /// Append `data` to the stream.
    ///
    /// Bytes are staged until a full window is available; each full window
    /// is dispatched to the leaves immediately. Returns the number of bytes
    /// accepted, which is always `data.len()` on success.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let mut state = self.lock()?;
        if state.finalized {
            debug!(len = data.len(), "rejected write to finalized tree");
            return Err(FixedMerkleError::TreeFinalized);
        }

        let mut remaining = data;
        while !remaining.is_empty() {
            let start = state.staged;
            let take = (WINDOW_SIZE - start).min(remaining.len());
            state.buffer[start..start + take].copy_from_slice(&remaining[..take]);
            state.staged += take;
            remaining = &remaining[take..];

            if state.staged == WINDOW_SIZE {
                state.flush_window()?;
            }
        }
        Ok(data.len())
    }

    /// Close the stream. Any staged remainder is dispatched as the final,
    /// possibly short, window. Succeeds exactly once.
    pub fn finalize(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.finalized {
            debug!("rejected repeated finalize");
            return Err(FixedMerkleError::AlreadyFinalized);
        }
        state.finalized = true;

        let remainder = state.staged;
        if remainder > 0 {
            state.flush_window()?;
        }
        debug!(remainder, windows = state.windows, "finalized fixed merkle tree");
        Ok(())
    }

    /// Whether [`finalize`](Self::finalize) has succeeded.
    pub fn is_finalized(&self) -> Result<bool> {
        Ok(self.lock()?.finalized)
    }

    /// Current digest of every leaf, in leaf order.
    ///
    /// Reading a digest never disturbs accumulation, so this is available
    /// before finalization too.
    pub fn leaf_hashes(&self) -> Result<Vec<[u8; DIGEST_SIZE]>> {
        Ok(self.lock()?.leaf_digests())
    }

    /// Current digest of the leaf at `index`.
    pub fn leaf_hash(&self, index: usize) -> Result<[u8; DIGEST_SIZE]> {
        let state = self.lock()?;
        state
            .leaves
            .get(index)
            .map(LeafHasher::digest)
            .ok_or(FixedMerkleError::LeafIndexOutOfRange {
                index,
                leaf_count: LEAF_COUNT,
            })
    }

    /// All folded levels, computed on first use after finalization.
    pub(crate) fn node_levels(&self) -> Result<&Levels> {
        if let Some(levels) = self.levels.get() {
            return Ok(levels);
        }

        let digests = {
            let state = self.lock()?;
            if !state.finalized {
                return Err(FixedMerkleError::NotFinalized);
            }
            state.leaf_digests()
        };
        let levels = fold_levels(&digests)?;
        let levels = self.levels.get_or_init(|| levels);
        debug!(root = %hex::encode(root_of(levels)), "computed fixed merkle root");
        Ok(levels)
    }

    /// Root digest as raw bytes. Fails before finalization.
    pub fn root_bytes(&self) -> Result<[u8; DIGEST_SIZE]> {
        self.node_levels().map(root_of)
    }

    /// Root digest as 64 lowercase hex characters. Fails before
    /// finalization.
    pub fn root(&self) -> Result<String> {
        self.root_bytes().map(hex::encode)
    }

    /// Inclusion proof for the leaf at `leaf_index`. Fails before
    /// finalization.
    pub fn build_path(&self, leaf_index: usize) -> Result<MerklePath> {
        MerklePath::generate(self, leaf_index)
    }

    /// Reset the tree and rebuild its leaves from the raw bytes of
    /// `reader`.
    ///
    /// The source is read one window at a time until end of input. Leaves
    /// and staged bytes are discarded first. A finalized tree is never
    /// reset: it fails with [`FixedMerkleError::TreeFinalized`] and keeps
    /// its root. The tree is left open; call [`finalize`](Self::finalize)
    /// afterwards.
    pub fn reload<R: Read>(&mut self, mut reader: R) -> Result<()> {
        {
            let state = self
                .state
                .get_mut()
                .map_err(|_| FixedMerkleError::LockPoisoned)?;
            if state.finalized {
                debug!("rejected reload of finalized tree");
                return Err(FixedMerkleError::TreeFinalized);
            }
            state.leaves = new_leaves();
            state.staged = 0;
            state.windows = 0;
        }

        let mut window = Vec::with_capacity(WINDOW_SIZE);
        let mut total = 0u64;
        loop {
            window.clear();
            let read = reader
                .by_ref()
                .take(WINDOW_SIZE as u64)
                .read_to_end(&mut window)?;
            if read == 0 {
                break;
            }
            self.write(&window)?;
            total += read as u64;
        }

        debug!(bytes = total, "reloaded fixed merkle tree from reader");
        Ok(())
    }
}

impl<H: LeafHasher> io::Write for FixedMerkleTree<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FixedMerkleTree::write(self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<H: LeafHasher> io::Write for &FixedMerkleTree<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FixedMerkleTree::write(*self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<H> fmt::Debug for FixedMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (staged, finalized) = match self.state.try_lock() {
            Ok(state) => (Some(state.staged), Some(state.finalized)),
            Err(_) => (None, None),
        };
        f.debug_struct("FixedMerkleTree")
            .field("staged", &staged)
            .field("finalized", &finalized)
            .field("root", &self.levels.get().map(|l| hex::encode(root_of(l))))
            .finish()
    }
}
