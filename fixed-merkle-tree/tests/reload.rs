//! Rebuilding trees from raw content: files, chunked readers and failing
//! sources.

use std::io::{self, Read, Seek, SeekFrom, Write};

use assert_matches::assert_matches;
use fixed_merkle_tree::{FixedMerkleError, FixedMerkleTree, constants::WINDOW_SIZE};

fn content(len: usize) -> Vec<u8> {
    (0..len as u64)
        .map(|i| (i.wrapping_mul(0x9e37_79b9) >> 7) as u8)
        .collect()
}

fn root_of(data: &[u8]) -> String {
    let tree = FixedMerkleTree::new();
    tree.write(data).expect("write");
    tree.finalize().expect("finalize");
    tree.root().expect("root")
}

/// Reader handing out at most `step` bytes per call.
struct Trickle<'a> {
    data: &'a [u8],
    step: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Reader yielding `good` bytes and then failing.
struct Failing {
    good: usize,
}

impl Read for Failing {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"));
        }
        let n = self.good.min(buf.len());
        buf[..n].fill(0xee);
        self.good -= n;
        Ok(n)
    }
}

#[test]
fn reload_from_file_matches_upload_root() {
    let data = content(4 * WINDOW_SIZE + 4321);
    let uploaded = root_of(&data);

    let mut file = tempfile::tempfile().expect("temp file");
    file.write_all(&data).expect("write file");
    file.seek(SeekFrom::Start(0)).expect("rewind");

    let rebuilt = FixedMerkleTree::from_reader(&mut file).expect("rebuild from file");
    assert_eq!(rebuilt.root().expect("root"), uploaded);
}

#[test]
fn short_reads_do_not_change_the_root() {
    let data = content(2 * WINDOW_SIZE + 77);
    for step in [1, 63, 64, 1000, WINDOW_SIZE - 1, WINDOW_SIZE + 1] {
        let tree = FixedMerkleTree::from_reader(Trickle { data: &data, step }).expect("rebuild");
        assert_eq!(tree.root().expect("root"), root_of(&data), "step {}", step);
    }
}

#[test]
fn exact_window_multiple_reloads_cleanly() {
    let data = vec![0u8; 2 * WINDOW_SIZE];
    let tree = FixedMerkleTree::from_reader(&data[..]).expect("rebuild");
    assert_eq!(tree.root().expect("root"), root_of(&data));
}

#[test]
fn read_errors_propagate_verbatim() {
    let mut tree = FixedMerkleTree::new();
    let err = tree
        .reload(Failing { good: WINDOW_SIZE + 10 })
        .expect_err("source fails");
    assert_matches!(
        &err,
        FixedMerkleError::Io(e) if e.kind() == io::ErrorKind::ConnectionReset
    );
    assert_eq!(err.to_string(), "source went away");
}

#[test]
fn tree_is_reusable_after_failed_reload() {
    let data = content(WINDOW_SIZE / 2);
    let mut tree = FixedMerkleTree::new();
    assert!(tree.reload(Failing { good: 5 }).is_err());

    tree.reload(&data[..]).expect("reload");
    tree.finalize().expect("finalize");
    assert_eq!(tree.root().expect("root"), root_of(&data));
}

#[test]
fn rebuilt_tree_refuses_a_second_reload() {
    let data = content(WINDOW_SIZE + 17);
    let mut tree = FixedMerkleTree::from_reader(&data[..]).expect("rebuild");
    let root = tree.root().expect("root");

    let err = tree
        .reload(&content(3 * WINDOW_SIZE)[..])
        .expect_err("finalized tree");
    assert_matches!(err, FixedMerkleError::TreeFinalized);
    assert!(tree.is_finalized().expect("state"));
    assert_eq!(tree.root().expect("root"), root);
    assert_eq!(root, root_of(&data));
}

#[test]
fn challenged_leaf_proof_from_rebuilt_tree_matches_commitment() {
    // Client commits at upload time, then rebuilds from the provider's copy.
    let data = content(3 * WINDOW_SIZE + 999);
    let committed = FixedMerkleTree::new();
    committed.write(&data).expect("write");
    committed.finalize().expect("finalize");
    let root = committed.root_bytes().expect("root");

    let provider_copy = FixedMerkleTree::from_reader(&data[..]).expect("rebuild");
    let path = provider_copy.build_path(617).expect("path");
    assert!(path.verify_against(&root));

    let mut tampered = data.clone();
    tampered[WINDOW_SIZE + 617 * 64] ^= 0x80;
    let tampered_copy = FixedMerkleTree::from_reader(&tampered[..]).expect("rebuild");
    let path = tampered_copy.build_path(617).expect("path");
    assert!(path.verify());
    assert!(!path.verify_against(&root));
}
