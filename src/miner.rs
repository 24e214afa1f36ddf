// Miner (component C9): assembles a block template and runs proof-of-work
// against it.
//
// Template assembly follows `mine_block`'s shape (pull transactions from the
// mempool, compute the target for the height about to be mined, run the
// nonce search) generalized with the dual-track target selection and the
// three block kinds this chain supports: a plain block, one that publishes a
// new problem graph, and one that submits an improving clique solution.

use crate::accept::Acceptor;
use crate::block::{Block, Transaction};
use crate::chain::Chain;
use crate::error::{ChainError, Result};
use crate::mempool::Mempool;
use crate::pow::{self, PowContext};
use crate::problem::ProblemGraph;
use crate::retarget::Retargeter;

const MAX_TXS_PER_BLOCK: usize = 100;

/// What a to-be-mined block should carry beyond its transactions.
pub enum BlockContent {
    /// No problem-graph activity at all.
    Plain,
    /// Publishes a new problem graph, becoming the chain's active instance.
    /// The sentinel `solution_hash == problem_graph_hash` marks this block
    /// as "no real solution", matching the original's publish convention.
    PublishProblem(ProblemGraph),
    /// Submits a clique solution against an already-known problem graph.
    /// This block does not itself publish anything, so its
    /// `problem_graph_hash` field is `None` — only `solution_hash` carries
    /// the graph being solved.
    SubmitSolution { graph_hash: [u8; 32], solution: Vec<usize> },
}

pub struct Miner<'a> {
    chain: &'a Chain,
}

impl<'a> Miner<'a> {
    pub fn new(chain: &'a Chain) -> Self {
        Miner { chain }
    }

    /// Assembles a template extending the current tip and mines it.
    pub fn mine_block(
        &self,
        mempool: &mut Mempool,
        content: BlockContent,
        timestamp: i64,
        max_nonce: i64,
    ) -> Result<Block> {
        let tip = self.chain.tip()?.ok_or(ChainError::NotFound("tip — mine genesis first"))?;
        let height = tip.height + 1;

        // `problem_graph_hash` marks "this block publishes a new graph" — it
        // is `None` on every other block, including ones that submit a
        // solution against an already-published graph (see DESIGN.md).
        let problem_graph_hash = match &content {
            BlockContent::PublishProblem(graph) => {
                self.chain.store().put_problem(&graph.hash(), graph)?;
                Some(graph.hash())
            }
            BlockContent::Plain | BlockContent::SubmitSolution { .. } => None,
        };

        let (solution_hash, solution) = match &content {
            BlockContent::PublishProblem(graph) => (Some(graph.hash()), Vec::new()),
            BlockContent::SubmitSolution { graph_hash, solution } => (Some(*graph_hash), solution.clone()),
            BlockContent::Plain => (None, Vec::new()),
        };

        let draft = Block {
            timestamp,
            prev_block_hash: tip.hash,
            height,
            target: primitive_types::U256::zero(),
            nonce: 0,
            hash: [0u8; 32],
            transactions: Vec::new(),
            problem_graph_hash,
            solution_hash,
            solution: solution.clone(),
        };
        let reduced = self.chain.has_valid_solution(&draft)?;

        let retargeter = Retargeter::new(self.chain);
        let target = retargeter.target_for_height(height, reduced)?;

        let transactions: Vec<Transaction> = mempool.take(MAX_TXS_PER_BLOCK);
        let merkle_root = Block::merkle_root(&transactions);

        let ctx = PowContext {
            prev_block_hash: tip.hash,
            merkle_root,
            timestamp,
            target,
            solution_hash,
            solution: &solution,
            problem_graph_hash,
        };
        let (nonce, hash) = pow::run_parallel(&ctx, max_nonce, 65_536)?;

        Ok(Block {
            timestamp,
            prev_block_hash: tip.hash,
            height,
            target,
            nonce,
            hash,
            transactions,
            problem_graph_hash,
            solution_hash,
            solution,
        })
    }

    /// Mines and accepts `count` plain blocks in sequence, returning their
    /// hashes in mining order.
    pub fn generate_blocks(
        &self,
        mempool: &mut Mempool,
        count: usize,
        mut timestamp: i64,
        max_nonce: i64,
    ) -> Result<Vec<[u8; 32]>> {
        let acceptor = Acceptor::new(self.chain);
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            let block = self.mine_block(mempool, BlockContent::Plain, timestamp, max_nonce)?;
            acceptor.add_block(block.clone())?;
            hashes.push(block.hash);
            timestamp += 1;
        }
        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::create_genesis_block;
    use crate::store::ChainStore;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_chain_with_genesis() -> (Chain, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = dir.path().join(format!("miner-{n}"));
        let chain = Chain::new(ChainStore::open(&path).unwrap());
        let genesis = create_genesis_block(Transaction(b"genesis".to_vec()), 5_000_000).unwrap();
        Acceptor::new(&chain).add_block(genesis).unwrap();
        (chain, dir)
    }

    #[test]
    fn test_mine_plain_block_extends_tip() {
        let (chain, _dir) = temp_chain_with_genesis();
        let miner = Miner::new(&chain);
        let mut mempool = Mempool::new();
        mempool.insert(Transaction(b"tx1".to_vec()));

        let block = miner.mine_block(&mut mempool, BlockContent::Plain, 1_700_000_100, 5_000_000).unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.transactions.len(), 1);
        assert!(block.solution_hash.is_none());
    }

    #[test]
    fn test_generate_blocks_advances_chain() {
        let (chain, _dir) = temp_chain_with_genesis();
        let miner = Miner::new(&chain);
        let mut mempool = Mempool::new();
        let hashes = miner.generate_blocks(&mut mempool, 3, 1_700_000_100, 5_000_000).unwrap();
        assert_eq!(hashes.len(), 3);
        assert_eq!(chain.tip().unwrap().unwrap().height, 4);
    }

    #[test]
    fn test_mine_publish_problem_sets_sentinel() {
        let (chain, _dir) = temp_chain_with_genesis();
        let miner = Miner::new(&chain);
        let mut mempool = Mempool::new();
        let graph = ProblemGraph::new(10, 20, 1).unwrap();
        let graph_hash = graph.hash();

        let block = miner
            .mine_block(&mut mempool, BlockContent::PublishProblem(graph), 1_700_000_100, 5_000_000)
            .unwrap();
        assert_eq!(block.problem_graph_hash, Some(graph_hash));
        assert_eq!(block.solution_hash, Some(graph_hash));
        assert!(block.solution.is_empty());
    }
}
