//! Folding leaf digests into a root, level by level.
//!
//! Level 0 holds the leaf digests; every following level combines
//! consecutive pairs of the previous one with [`node_hash`]. An odd tail is
//! paired with itself. The last level holds the single root digest.

use crate::{
    FixedMerkleError, Result,
    constants::{DIGEST_SIZE, FIXED_MT_DEPTH},
    hash::node_hash,
};

/// Every level of a folded tree, leaves first, root level last.
pub(crate) type Levels = Vec<Vec<[u8; DIGEST_SIZE]>>;

/// Fold `leaves` into all intermediate levels.
///
/// At least one round always runs, so a single leaf folds to
/// `node_hash(leaf, leaf)`. Fails if `leaves` is empty or does not reduce to
/// one node within [`FIXED_MT_DEPTH`] rounds.
pub(crate) fn fold_levels(leaves: &[[u8; DIGEST_SIZE]]) -> Result<Levels> {
    if leaves.is_empty() {
        return Err(FixedMerkleError::InvalidInput(
            "cannot fold an empty leaf set".into(),
        ));
    }

    let mut levels: Levels = Vec::with_capacity(FIXED_MT_DEPTH + 1);
    levels.push(leaves.to_vec());

    for _ in 0..FIXED_MT_DEPTH {
        let nodes = &levels[levels.len() - 1];
        let next: Vec<[u8; DIGEST_SIZE]> = nodes
            .chunks(2)
            .map(|pair| {
                // odd tail: duplicate the last node
                let right = pair.get(1).unwrap_or(&pair[0]);
                node_hash(&pair[0], right)
            })
            .collect();
        let done = next.len() == 1;
        levels.push(next);
        if done {
            return Ok(levels);
        }
    }

    Err(FixedMerkleError::InvalidInput(format!(
        "{} leaves do not fold to a single root within {} levels",
        leaves.len(),
        FIXED_MT_DEPTH
    )))
}

/// Sibling digests for `leaf_index`, leaf level first, root level excluded.
pub(crate) fn sibling_path(levels: &Levels, leaf_index: usize) -> Result<Vec<[u8; DIGEST_SIZE]>> {
    let leaf_count = levels.first().map_or(0, Vec::len);
    if leaf_index >= leaf_count {
        return Err(FixedMerkleError::LeafIndexOutOfRange {
            index: leaf_index,
            leaf_count,
        });
    }

    let mut index = leaf_index;
    let mut path = Vec::with_capacity(levels.len().saturating_sub(1));
    for level in &levels[..levels.len() - 1] {
        // A node without a right neighbour was paired with itself.
        let sibling = level.get(index ^ 1).unwrap_or(&level[index]);
        path.push(*sibling);
        index /= 2;
    }
    Ok(path)
}

/// Root digest of an arbitrary, non-empty set of leaf digests.
pub fn merkle_root(leaves: &[[u8; DIGEST_SIZE]]) -> Result<[u8; DIGEST_SIZE]> {
    let levels = fold_levels(leaves)?;
    Ok(root_of(&levels))
}

/// Sibling path proving `leaf_index` within an arbitrary set of leaf digests.
pub fn merkle_path(
    leaves: &[[u8; DIGEST_SIZE]],
    leaf_index: usize,
) -> Result<Vec<[u8; DIGEST_SIZE]>> {
    let levels = fold_levels(leaves)?;
    sibling_path(&levels, leaf_index)
}

/// The single digest on the last level. `levels` must come from
/// [`fold_levels`].
pub(crate) fn root_of(levels: &Levels) -> [u8; DIGEST_SIZE] {
    levels[levels.len() - 1][0]
}
