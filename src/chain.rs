// Chain queries (component C6): read-only traversals over the store.
//
// Mirrors `blockchain.go`'s iterator pattern (`BlockchainIterator` walking
// tip -> genesis via `PrevBlockHash`) and its `GetBestSolution`/
// `GetAllSolutions` helpers, generalized to start from an arbitrary block
// hash so acceptance can ask "what's the best solution along *this* fork's
// ancestry" rather than only the current tip's.

use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::store::ChainStore;

pub struct Chain {
    store: ChainStore,
}

/// Walks a fork from `start_hash` back to genesis, one block per `next()`.
pub struct BlockIterator<'a> {
    store: &'a ChainStore,
    cursor: Option<[u8; 32]>,
}

impl Iterator for BlockIterator<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.cursor?;
        match self.store.get_block(&hash) {
            Ok(Some(block)) => {
                self.cursor = if block.height == 0 { None } else { Some(block.prev_block_hash) };
                Some(Ok(block))
            }
            Ok(None) => {
                self.cursor = None;
                Some(Err(ChainError::ChainIntegrity("block referenced by hash is missing")))
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

impl Chain {
    pub fn new(store: ChainStore) -> Self {
        Chain { store }
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn tip(&self) -> Result<Option<Block>> {
        match self.store.get_tip()? {
            Some(hash) => self.store.get_block(&hash),
            None => Ok(None),
        }
    }

    pub fn get_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.store.get_block_at_height(height)
    }

    pub fn get_by_hash(&self, hash: &[u8; 32]) -> Result<Option<Block>> {
        self.store.get_block(hash)
    }

    /// Iterates a fork from `start_hash` back to and including genesis.
    pub fn iter_from(&self, start_hash: [u8; 32]) -> BlockIterator<'_> {
        BlockIterator { store: &self.store, cursor: Some(start_hash) }
    }

    pub fn iter_tip(&self) -> Result<BlockIterator<'_>> {
        let hash = self.store.get_tip()?.ok_or(ChainError::NotFound("tip"))?;
        Ok(self.iter_from(hash))
    }

    /// The largest solution submitted against problem graph `pg_hash` at or
    /// below `max_height`, searching this fork's ancestry back from
    /// `start_hash` (mirrors `GetBestSolution`, scoped to one fork instead of
    /// the unconditional global tip — see DESIGN.md).
    pub fn best_solution_for_graph(
        &self,
        start_hash: [u8; 32],
        pg_hash: [u8; 32],
        max_height: u64,
    ) -> Result<Vec<usize>> {
        let mut best: Vec<usize> = Vec::new();
        for block in self.iter_from(start_hash) {
            let block = block?;
            if block.height > max_height {
                continue;
            }
            if block.solution_hash == Some(pg_hash) && block.solution.len() > best.len() {
                best = block.solution;
            }
        }
        Ok(best)
    }

    /// Every solution submitted against problem graph `pg_hash` along this
    /// fork, oldest first (mirrors `GetAllSolutions`).
    pub fn all_solutions_for_graph(
        &self,
        start_hash: [u8; 32],
        pg_hash: [u8; 32],
    ) -> Result<Vec<(u64, Vec<usize>)>> {
        let mut out = Vec::new();
        for block in self.iter_from(start_hash) {
            let block = block?;
            if block.solution_hash == Some(pg_hash) {
                out.push((block.height, block.solution));
            }
        }
        out.reverse();
        Ok(out)
    }

    /// Whether `block` carries a solution that both validates against its
    /// referenced problem graph and strictly improves on the best solution
    /// known for that graph as of the block's parent (mirrors
    /// `Block.HasValidSolution`).
    pub fn has_valid_solution(&self, block: &Block) -> Result<bool> {
        let Some(solution_hash) = block.solution_hash else {
            return Ok(false);
        };
        if Some(solution_hash) == block.problem_graph_hash {
            // Sentinel set by the block that first publishes the graph, not
            // an actual solution submission.
            return Ok(false);
        }
        let Some(graph) = self.store.get_problem(&solution_hash)? else {
            return Ok(false);
        };
        if block.height == 0 {
            return Ok(false);
        }
        let best = self.best_solution_for_graph(block.prev_block_hash, solution_hash, block.height - 1)?;
        if block.solution.len() <= best.len() {
            return Ok(false);
        }
        Ok(graph.validate_clique(&block.solution))
    }

    /// All block hashes along this fork, oldest first.
    pub fn block_hashes_from(&self, start_hash: [u8; 32]) -> Result<Vec<[u8; 32]>> {
        let mut out = Vec::new();
        for block in self.iter_from(start_hash) {
            out.push(block?.hash);
        }
        out.reverse();
        Ok(out)
    }
}
