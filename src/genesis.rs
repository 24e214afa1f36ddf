// Genesis block construction.
//
// Grounded on the teacher's `create_genesis_block` helper: a fixed
// timestamp and an empty-parent hash, mined like any other block against
// the initial normal-track target (spec scenario 1).

use crate::block::{Block, Transaction};
use crate::error::Result;
use crate::pow::{self, PowContext};
use crate::target::{target_from_bits, INITIAL_TARGET_BITS};

/// Unix timestamp baked into every fresh chain, so independently created
/// chains with the same genesis parameters are byte-identical.
pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000;

/// Mines and returns the height-0 block. `coinbase` is the one transaction
/// genesis carries (its contents are opaque — see [`Transaction`]).
pub fn create_genesis_block(coinbase: Transaction, max_nonce: i64) -> Result<Block> {
    let target = target_from_bits(INITIAL_TARGET_BITS);
    let transactions = vec![coinbase];
    let merkle_root = Block::merkle_root(&transactions);

    let ctx = PowContext {
        prev_block_hash: [0u8; 32],
        merkle_root,
        timestamp: GENESIS_TIMESTAMP,
        target,
        solution_hash: None,
        solution: &[],
        problem_graph_hash: None,
    };
    let (nonce, hash) = pow::run(&ctx, max_nonce)?;

    Ok(Block {
        timestamp: GENESIS_TIMESTAMP,
        prev_block_hash: [0u8; 32],
        height: 0,
        target,
        nonce,
        hash,
        transactions,
        problem_graph_hash: None,
        solution_hash: None,
        solution: vec![],
    })
}
