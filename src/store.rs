// Persistence store (component C5): RocksDB column families for blocks,
// problem graphs, and the height index, plus a single "tip" key.
//
// Layout follows `db_rocksdb.rs`'s `ChainDB`: one CF per logical table,
// atomic `WriteBatch` commits with `sync(true)` for block writes, a fixed
// metadata key for the chain tip. Account/governance/referral CFs have no
// counterpart here — there is no account model.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, WriteOptions, DB};

use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::problem::ProblemGraph;

const CF_BLOCKS: &str = "blocks";
const CF_HEIGHTS: &str = "heights";
const CF_PROBLEMS: &str = "problems";
const CF_META: &str = "meta";

const KEY_TIP: &[u8] = b"tip";

#[derive(Clone)]
pub struct ChainStore {
    db: Arc<DB>,
}

impl ChainStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_BLOCKS, opts.clone()),
            ColumnFamilyDescriptor::new(CF_HEIGHTS, opts.clone()),
            ColumnFamilyDescriptor::new(CF_PROBLEMS, opts.clone()),
            ColumnFamilyDescriptor::new(CF_META, opts.clone()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(ChainStore { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or(ChainError::ChainIntegrity("missing column family"))
    }

    /// Persists a block and its height index atomically, syncing the WAL so
    /// an accepted block survives a crash immediately after this call returns.
    pub fn put_block(&self, block: &Block) -> Result<()> {
        let cf_blocks = self.cf(CF_BLOCKS)?;
        let cf_heights = self.cf(CF_HEIGHTS)?;

        let bytes = serde_json::to_vec(block).map_err(|_| ChainError::ChainIntegrity("block encode failed"))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, block.hash, &bytes);
        batch.put_cf(cf_heights, block.height.to_be_bytes(), block.hash);

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    pub fn get_block(&self, hash: &[u8; 32]) -> Result<Option<Block>> {
        let cf = self.cf(CF_BLOCKS)?;
        match self.db.get_cf(cf, hash)? {
            Some(bytes) => {
                let block = serde_json::from_slice(&bytes)
                    .map_err(|_| ChainError::ChainIntegrity("block decode failed"))?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    pub fn get_block_hash_at_height(&self, height: u64) -> Result<Option<[u8; 32]>> {
        let cf = self.cf(CF_HEIGHTS)?;
        match self.db.get_cf(cf, height.to_be_bytes())? {
            Some(bytes) => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes);
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    pub fn get_block_at_height(&self, height: u64) -> Result<Option<Block>> {
        match self.get_block_hash_at_height(height)? {
            Some(hash) => self.get_block(&hash),
            None => Ok(None),
        }
    }

    pub fn put_problem(&self, hash: &[u8; 32], graph: &ProblemGraph) -> Result<()> {
        let cf = self.cf(CF_PROBLEMS)?;
        let bytes = serde_json::to_vec(graph.adjacency())
            .map_err(|_| ChainError::ChainIntegrity("problem encode failed"))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.put_cf_opt(cf, hash, &bytes, &write_opts)?;
        Ok(())
    }

    pub fn get_problem(&self, hash: &[u8; 32]) -> Result<Option<ProblemGraph>> {
        let cf = self.cf(CF_PROBLEMS)?;
        match self.db.get_cf(cf, hash)? {
            Some(bytes) => {
                let adjacency: Vec<Vec<usize>> = serde_json::from_slice(&bytes)
                    .map_err(|_| ChainError::ChainIntegrity("problem decode failed"))?;
                Ok(Some(ProblemGraph::from_adjacency(adjacency)))
            }
            None => Ok(None),
        }
    }

    pub fn set_tip(&self, hash: &[u8; 32]) -> Result<()> {
        let cf = self.cf(CF_META)?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.put_cf_opt(cf, KEY_TIP, hash, &write_opts)?;
        Ok(())
    }

    pub fn get_tip(&self) -> Result<Option<[u8; 32]>> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, KEY_TIP)? {
            Some(bytes) => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes);
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Transaction;
    use crate::target::target_from_bits;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store() -> (ChainStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = dir.path().join(format!("store-{n}"));
        (ChainStore::open(&path).unwrap(), dir)
    }

    fn sample_block(height: u64) -> Block {
        Block {
            timestamp: 1_700_000_000,
            prev_block_hash: [0u8; 32],
            height,
            target: target_from_bits(16),
            nonce: 0,
            hash: [height as u8; 32],
            transactions: vec![Transaction(b"tx".to_vec())],
            problem_graph_hash: Some([1u8; 32]),
            solution_hash: Some([2u8; 32]),
            solution: vec![0, 1],
        }
    }

    #[test]
    fn test_put_and_get_block_round_trips() {
        let (store, _dir) = temp_store();
        let block = sample_block(0);
        store.put_block(&block).unwrap();
        let fetched = store.get_block(&block.hash).unwrap().unwrap();
        assert_eq!(fetched.height, block.height);
        assert_eq!(fetched.hash, block.hash);
    }

    #[test]
    fn test_height_index_round_trips() {
        let (store, _dir) = temp_store();
        let block = sample_block(5);
        store.put_block(&block).unwrap();
        let fetched = store.get_block_at_height(5).unwrap().unwrap();
        assert_eq!(fetched.hash, block.hash);
        assert!(store.get_block_at_height(6).unwrap().is_none());
    }

    #[test]
    fn test_tip_round_trips() {
        let (store, _dir) = temp_store();
        assert!(store.get_tip().unwrap().is_none());
        store.set_tip(&[9u8; 32]).unwrap();
        assert_eq!(store.get_tip().unwrap(), Some([9u8; 32]));
    }

    #[test]
    fn test_problem_round_trips() {
        let (store, _dir) = temp_store();
        let graph = ProblemGraph::new(10, 20, 3).unwrap();
        store.put_problem(&graph.hash(), &graph).unwrap();
        let fetched = store.get_problem(&graph.hash()).unwrap().unwrap();
        assert_eq!(fetched.hash(), graph.hash());
        assert_eq!(fetched.adjacency(), graph.adjacency());
    }

    #[test]
    fn test_missing_block_is_none() {
        let (store, _dir) = temp_store();
        assert!(store.get_block(&[0u8; 32]).unwrap().is_none());
    }
}
