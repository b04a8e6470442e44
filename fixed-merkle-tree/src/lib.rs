//! Fixed-topology Merkle commitment over byte streams, using Blake3.
//!
//! A [`FixedMerkleTree`] commits to an arbitrarily long byte stream with a
//! single 32-byte root. The stream is cut into 64 KiB windows; every window
//! is spread over the same 1024 leaf accumulators, 64 bytes per leaf, and
//! the leaf digests are folded pairwise into the root:
//!
//! ```text
//! window 0: | c0 | c1 | ... | c1023 |
//! window 1: | c0 | c1 | ... | c1023 |      leaf i = H(0x00 || c_i of every window)
//!              |    |           |
//!             L0   L1   ...   L1023         node   = H(0x01 || left || right)
//!               \  /            ...
//!               ... 10 levels ...
//!                     root
//! ```
//!
//! Memory and tree shape stay constant whatever the stream length, and an
//! inclusion proof for any leaf ([`MerklePath`]) is ten sibling digests. A
//! client and a storage provider can agree on the root at upload time, and
//! the client can later challenge the provider for one leaf instead of
//! downloading the whole object.
//!
//! ```
//! use fixed_merkle_tree::FixedMerkleTree;
//!
//! let tree = FixedMerkleTree::new();
//! tree.write(b"some uploaded content").unwrap();
//! tree.finalize().unwrap();
//!
//! let root = tree.root().unwrap();
//! let path = tree.build_path(0).unwrap();
//! assert!(path.verify());
//! assert_eq!(path.root_hex(), root);
//! ```

#![deny(missing_docs)]

pub mod constants;
mod error;
mod fold;
pub mod hash;
mod proof;
mod tree;
mod verify;


pub use error::{FixedMerkleError, Result};
pub use fold::{merkle_path, merkle_root};
pub use hash::{Blake3LeafHasher, LeafHasher, node_hash};
pub use proof::MerklePath;
pub use tree::FixedMerkleTree;
