// Block acceptance (component C8).
//
// Mirrors `Block.Validate` + `Blockchain.AddBlock`: recompute the expected
// target from the retargeter (picking the reduced track when the block
// carries a valid improving solution), check PoW against it, then persist
// and swap the tip only on strict height increase — a fork that doesn't
// overtake the current tip is stored but never becomes canonical.

use crate::block::Block;
use crate::chain::Chain;
use crate::error::{ChainError, Result};
use crate::pow::{self, PowContext};
use crate::retarget::Retargeter;

pub struct Acceptor<'a> {
    chain: &'a Chain,
}

impl<'a> Acceptor<'a> {
    pub fn new(chain: &'a Chain) -> Self {
        Acceptor { chain }
    }

    /// Validates and, if valid, persists `block`. Returns whether it became
    /// the new tip (i.e. whether `block.height` strictly exceeds the
    /// previous tip's height).
    pub fn add_block(&self, block: Block) -> Result<bool> {
        self.validate(&block)?;

        self.chain.store().put_block(&block)?;

        let became_tip = match self.chain.tip()? {
            Some(current_tip) => block.height > current_tip.height,
            None => true,
        };
        if became_tip {
            self.chain.store().set_tip(&block.hash)?;
        }
        Ok(became_tip)
    }

    fn validate(&self, block: &Block) -> Result<()> {
        if block.height > 0 {
            let parent = self
                .chain
                .get_by_hash(&block.prev_block_hash)?
                .ok_or(ChainError::Invalid("prev block hash is unknown"))?;
            if block.height != parent.height + 1 {
                return Err(ChainError::Invalid("height does not follow parent"));
            }
        }

        let reduced = self.chain.has_valid_solution(block)?;

        // A block that claims a real solution (not the publish-block
        // sentinel) must actually carry one: `has_valid_solution` folding
        // into `reduced` only decides the *target track*, so an invalid or
        // non-improving claim would otherwise just lose the reduced-target
        // discount instead of being rejected outright.
        if let Some(solution_hash) = block.solution_hash {
            let is_sentinel = Some(solution_hash) == block.problem_graph_hash;
            if !is_sentinel && !reduced {
                return Err(ChainError::Invalid("solution is invalid or does not improve on the best known"));
            }
        }

        let retargeter = Retargeter::new(self.chain);
        let expected_target = retargeter.target_for_height(block.height, reduced)?;
        if block.target != expected_target {
            return Err(ChainError::Invalid("target does not match chain retarget schedule"));
        }

        let merkle_root = Block::merkle_root(&block.transactions);
        let ctx = PowContext {
            prev_block_hash: block.prev_block_hash,
            merkle_root,
            timestamp: block.timestamp,
            target: block.target,
            solution_hash: block.solution_hash,
            solution: &block.solution,
            problem_graph_hash: block.problem_graph_hash,
        };
        if !pow::validate(&ctx, block.nonce, &block.hash) {
            return Err(ChainError::Invalid("proof of work is invalid"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Transaction;
    use crate::store::ChainStore;
    use crate::target::target_from_bits;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_chain() -> (Chain, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = dir.path().join(format!("accept-{n}"));
        (Chain::new(ChainStore::open(&path).unwrap()), dir)
    }

    fn mined_genesis() -> Block {
        let target = target_from_bits(crate::target::INITIAL_TARGET_BITS);
        let ctx = PowContext {
            prev_block_hash: [0u8; 32],
            merkle_root: None,
            timestamp: 1_700_000_000,
            target,
            solution_hash: None,
            solution: &[],
            problem_graph_hash: None,
        };
        let (nonce, hash) = pow::run(&ctx, 2_000_000).unwrap();
        Block {
            timestamp: 1_700_000_000,
            prev_block_hash: [0u8; 32],
            height: 0,
            target,
            nonce,
            hash,
            transactions: vec![Transaction(b"genesis".to_vec())],
            problem_graph_hash: None,
            solution_hash: None,
            solution: vec![],
        }
    }

    #[test]
    fn test_accept_genesis_becomes_tip() {
        let (chain, _dir) = temp_chain();
        let acceptor = Acceptor::new(&chain);
        let genesis = mined_genesis();
        let became_tip = acceptor.add_block(genesis.clone()).unwrap();
        assert!(became_tip);
        assert_eq!(chain.tip().unwrap().unwrap().hash, genesis.hash);
    }

    #[test]
    fn test_accept_rejects_bad_pow() {
        let (chain, _dir) = temp_chain();
        let acceptor = Acceptor::new(&chain);
        let mut genesis = mined_genesis();
        genesis.nonce += 1; // invalidates the proof of work
        assert!(matches!(acceptor.add_block(genesis), Err(ChainError::Invalid(_))));
    }

    #[test]
    fn test_accept_rejects_unknown_parent() {
        let (chain, _dir) = temp_chain();
        let acceptor = Acceptor::new(&chain);
        let genesis = mined_genesis();
        acceptor.add_block(genesis.clone()).unwrap();

        let mut orphan = genesis.clone();
        orphan.height = 1;
        orphan.prev_block_hash = [0xaau8; 32];
        assert!(matches!(acceptor.add_block(orphan), Err(ChainError::Invalid(_))));
    }

    #[test]
    fn test_accept_rejects_wrong_target() {
        let (chain, _dir) = temp_chain();
        let acceptor = Acceptor::new(&chain);
        let mut genesis = mined_genesis();
        genesis.target = target_from_bits(8);
        assert!(matches!(acceptor.add_block(genesis), Err(ChainError::Invalid(_))));
    }

    #[test]
    fn test_accept_rejects_invalid_clique_solution() {
        let (chain, _dir) = temp_chain();
        let acceptor = Acceptor::new(&chain);
        let genesis = mined_genesis();
        acceptor.add_block(genesis.clone()).unwrap();

        // 10 edges can't possibly span a clique over all 8 vertices (K8
        // needs 28), so this solution is structurally invalid regardless of
        // which edges the random instance picked.
        let graph = crate::problem::ProblemGraph::new(8, 10, 3).unwrap();
        chain.store().put_problem(&graph.hash(), &graph).unwrap();

        let target = target_from_bits(crate::target::INITIAL_TARGET_BITS);
        let bogus_solution: Vec<usize> = (0..8).collect();
        let ctx = PowContext {
            prev_block_hash: genesis.hash,
            merkle_root: None,
            timestamp: 1_700_000_100,
            target,
            solution_hash: Some(graph.hash()),
            solution: &bogus_solution,
            problem_graph_hash: None,
        };
        let (nonce, hash) = pow::run(&ctx, 2_000_000).unwrap();
        let block = Block {
            timestamp: 1_700_000_100,
            prev_block_hash: genesis.hash,
            height: 1,
            target,
            nonce,
            hash,
            transactions: vec![],
            problem_graph_hash: None,
            solution_hash: Some(graph.hash()),
            solution: bogus_solution,
        };
        assert!(matches!(acceptor.add_block(block), Err(ChainError::Invalid(_))));
    }
}
