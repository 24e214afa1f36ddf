// Block record (component C3).
//
// Field order and naming mirror `block.go`'s `Block` struct; the shape is
// kept plain-Rust (no `repr(C)`/packed layout) since nothing here crosses an
// FFI boundary the way the teacher's `BlockHeader` did.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::{sha256, sha256_concat};
use crate::target::Target;

/// An opaque payload — transaction *contents* are out of scope; only their
/// byte representation and position in the Merkle tree matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction(pub Vec<u8>);

impl Transaction {
    pub fn hash(&self) -> [u8; 32] {
        sha256(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub timestamp: i64,
    pub prev_block_hash: [u8; 32],
    pub height: u64,
    pub target: Target,
    pub nonce: i64,
    pub hash: [u8; 32],
    pub transactions: Vec<Transaction>,
    /// Set only by the block that publishes a new problem graph — `None`
    /// for every other block, including ones that submit a solution
    /// against an already-published graph.
    pub problem_graph_hash: Option<[u8; 32]>,
    /// The hash of the problem graph this block's `solution` was checked
    /// against — `None` when the block submits no clique solution at all.
    pub solution_hash: Option<[u8; 32]>,
    pub solution: Vec<usize>,
}

impl Block {
    /// Binary Merkle root over transaction hashes, duplicating the last hash
    /// when a level has an odd count (same rule as `Block::compute_merkle_root`).
    /// Returns `None` for an empty transaction list — the PoW preimage treats
    /// that as "no Merkle bytes" rather than a fixed all-zero root.
    pub fn merkle_root(transactions: &[Transaction]) -> Option<[u8; 32]> {
        if transactions.is_empty() {
            return None;
        }
        let mut level: Vec<[u8; 32]> = transactions.iter().map(Transaction::hash).collect();
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                level.push(*level.last().unwrap());
            }
            level = level
                .chunks(2)
                .map(|pair| sha256_concat(&pair[0], &pair[1]))
                .collect();
        }
        Some(level[0])
    }

    pub fn merkle_root_bytes(&self) -> Vec<u8> {
        match Self::merkle_root(&self.transactions) {
            Some(root) => root.to_vec(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(bytes: &[u8]) -> Transaction {
        Transaction(bytes.to_vec())
    }

    #[test]
    fn test_merkle_root_empty_is_none() {
        assert_eq!(Block::merkle_root(&[]), None);
    }

    #[test]
    fn test_merkle_root_single() {
        let t = tx(b"a");
        assert_eq!(Block::merkle_root(&[t.clone()]), Some(t.hash()));
    }

    #[test]
    fn test_merkle_root_duplicates_last_on_odd_count() {
        let txs = vec![tx(b"a"), tx(b"b"), tx(b"c")];
        let even = Block::merkle_root(&txs).unwrap();

        let mut padded = txs.clone();
        padded.push(tx(b"c"));
        let padded_root = Block::merkle_root(&padded).unwrap();

        assert_eq!(even, padded_root);
    }

    #[test]
    fn test_merkle_root_deterministic() {
        let txs = vec![tx(b"a"), tx(b"b")];
        assert_eq!(Block::merkle_root(&txs), Block::merkle_root(&txs));
    }

    #[test]
    fn test_merkle_root_order_sensitive() {
        let a = vec![tx(b"a"), tx(b"b")];
        let b = vec![tx(b"b"), tx(b"a")];
        assert_ne!(Block::merkle_root(&a), Block::merkle_root(&b));
    }
}
