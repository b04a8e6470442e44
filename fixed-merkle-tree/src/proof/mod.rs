//! Inclusion proofs for the fixed Merkle tree.
//!
//! A `MerklePath` proves that a leaf digest is committed to by a root. It
//! carries the sibling digest of every level between the leaf and the root,
//! so for a 1024-leaf tree the proof is ten digests long regardless of how
//! much content the tree covers.

use bincode::{Decode, Encode};

use crate::{
    FixedMerkleError, FixedMerkleTree, Result,
    constants::{DIGEST_SIZE, FIXED_MT_DEPTH, LEAF_COUNT},
    fold::{root_of, sibling_path},
    hash::LeafHasher,
};


/// Upper bound on the size of an encoded proof accepted by
/// [`MerklePath::decode_from_slice`].
const MAX_ENCODED_PROOF_SIZE: usize = 4 * 1024;

/// An inclusion proof for one leaf of a fixed Merkle tree.
///
/// Use [`FixedMerkleTree::build_path`] to create one from a finalized tree,
/// [`MerklePath::new`] to rebuild one received from elsewhere, and
/// [`verify`](MerklePath::verify) to check it.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerklePath {
    /// Digest of the proved leaf.
    #[cfg_attr(feature = "serde", serde(with = "hex_digest"))]
    pub(crate) leaf_hash: [u8; DIGEST_SIZE],
    /// Root the proof claims to reach.
    #[cfg_attr(feature = "serde", serde(with = "hex_digest"))]
    pub(crate) root_hash: [u8; DIGEST_SIZE],
    /// Sibling digests, leaf level first.
    #[cfg_attr(feature = "serde", serde(with = "hex_digest::list"))]
    pub(crate) nodes: Vec<[u8; DIGEST_SIZE]>,
    pub(crate) leaf_index: usize,
}

impl MerklePath {
    /// Assemble a proof from its parts, e.g. after receiving it over the
    /// wire. Nothing is checked until [`verify`](Self::verify).
    pub fn new(
        leaf_hash: [u8; DIGEST_SIZE],
        root_hash: [u8; DIGEST_SIZE],
        nodes: Vec<[u8; DIGEST_SIZE]>,
        leaf_index: usize,
    ) -> Self {
        Self {
            leaf_hash,
            root_hash,
            nodes,
            leaf_index,
        }
    }

    /// Generate the proof for `leaf_index` from a finalized tree.
    pub fn generate<H: LeafHasher>(tree: &FixedMerkleTree<H>, leaf_index: usize) -> Result<Self> {
        if leaf_index >= LEAF_COUNT {
            return Err(FixedMerkleError::LeafIndexOutOfRange {
                index: leaf_index,
                leaf_count: LEAF_COUNT,
            });
        }
        let levels = tree.node_levels()?;
        let nodes = sibling_path(levels, leaf_index)?;

        Ok(Self {
            leaf_hash: levels[0][leaf_index],
            root_hash: root_of(levels),
            nodes,
            leaf_index,
        })
    }

    /// Digest of the proven leaf.
    pub fn leaf_hash(&self) -> &[u8; DIGEST_SIZE] {
        &self.leaf_hash
    }

    /// Root the path claims to reach.
    pub fn root_hash(&self) -> &[u8; DIGEST_SIZE] {
        &self.root_hash
    }

    /// Sibling digests, leaf level first.
    pub fn nodes(&self) -> &[[u8; DIGEST_SIZE]] {
        &self.nodes
    }

    /// Position of the proven leaf, which also selects each sibling's side.
    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    /// Leaf digest as lowercase hex.
    pub fn leaf_hex(&self) -> String {
        hex::encode(self.leaf_hash)
    }

    /// Claimed root as lowercase hex, comparable with
    /// [`FixedMerkleTree::root`].
    pub fn root_hex(&self) -> String {
        hex::encode(self.root_hash)
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| FixedMerkleError::InvalidProof(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// Rejects trailing bytes, more than [`FIXED_MT_DEPTH`] siblings and leaf
    /// indexes outside the tree.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_ENCODED_PROOF_SIZE>();
        let (path, read): (Self, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| FixedMerkleError::InvalidProof(format!("decode error: {}", e)))?;
        if read != bytes.len() {
            return Err(FixedMerkleError::InvalidProof(format!(
                "{} trailing bytes after proof",
                bytes.len() - read
            )));
        }
        if path.nodes.len() > FIXED_MT_DEPTH {
            return Err(FixedMerkleError::InvalidProof(format!(
                "proof has {} sibling nodes (max {})",
                path.nodes.len(),
                FIXED_MT_DEPTH
            )));
        }
        if path.leaf_index >= LEAF_COUNT {
            return Err(FixedMerkleError::InvalidProof(format!(
                "leaf index {} is out of range (leaf count {})",
                path.leaf_index, LEAF_COUNT
            )));
        }
        Ok(path)
    }
}

/// Serde helpers writing digests as lowercase hex strings, the shape used
/// when proofs travel as JSON (`leaf_hash`, `root_hash`, `nodes`,
/// `leaf_index`).
#[cfg(feature = "serde")]
mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use crate::constants::DIGEST_SIZE;

    fn decode(s: &str) -> Result<[u8; DIGEST_SIZE], String> {
        let mut out = [0u8; DIGEST_SIZE];
        hex::decode_to_slice(s, &mut out).map_err(|e| format!("invalid digest {:?}: {}", s, e))?;
        Ok(out)
    }

    pub fn serialize<S: Serializer>(digest: &[u8; DIGEST_SIZE], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; DIGEST_SIZE], D::Error> {
        let s = String::deserialize(d)?;
        decode(&s).map_err(D::Error::custom)
    }

    pub mod list {
        use super::*;

        pub fn serialize<S: Serializer>(
            digests: &[[u8; DIGEST_SIZE]],
            s: S,
        ) -> Result<S::Ok, S::Error> {
            s.collect_seq(digests.iter().map(hex::encode))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Vec<[u8; DIGEST_SIZE]>, D::Error> {
            Vec::<String>::deserialize(d)?
                .iter()
                .map(|s| decode(s).map_err(D::Error::custom))
                .collect()
        }
    }
}
