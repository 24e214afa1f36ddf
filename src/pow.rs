// Proof-of-work engine (component C4).
//
// Preimage assembly mirrors `proofofwork.go`'s `prepareData`: the eight
// fields below, concatenated in this exact order, with no length prefixes or
// separators. Changing the order, the hex rendering of `target`, or the
// digit-concatenation rule for `solution` changes every hash this chain ever
// produces, so none of it is incidental.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use primitive_types::U256;
use rayon::prelude::*;

use crate::crypto::hash::sha256;
use crate::error::{ChainError, Result};
use crate::target::{target_to_hex_minimal, Target};

pub struct PowContext<'a> {
    pub prev_block_hash: [u8; 32],
    pub merkle_root: Option<[u8; 32]>,
    pub timestamp: i64,
    pub target: Target,
    pub solution_hash: Option<[u8; 32]>,
    pub solution: &'a [usize],
    pub problem_graph_hash: Option<[u8; 32]>,
}

fn solution_ascii(solution: &[usize]) -> String {
    solution.iter().map(|v| v.to_string()).collect()
}

/// Assembles the canonical preimage for a given `nonce`.
pub fn prepare_data(ctx: &PowContext, nonce: i64) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&ctx.prev_block_hash);
    if let Some(root) = ctx.merkle_root {
        data.extend_from_slice(&root);
    }
    data.extend_from_slice(&ctx.timestamp.to_be_bytes());
    data.extend_from_slice(target_to_hex_minimal(ctx.target).as_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    if let Some(solution_hash) = ctx.solution_hash {
        data.extend_from_slice(&solution_hash);
    }
    data.extend_from_slice(solution_ascii(ctx.solution).as_bytes());
    if let Some(problem_graph_hash) = ctx.problem_graph_hash {
        data.extend_from_slice(&problem_graph_hash);
    }
    data
}

fn hash_meets_target(hash: &[u8; 32], target: Target) -> bool {
    U256::from_big_endian(hash) < target
}

/// Single-threaded nonce search over `[0, max_nonce)`.
pub fn run(ctx: &PowContext, max_nonce: i64) -> Result<(i64, [u8; 32])> {
    for nonce in 0..max_nonce {
        let data = prepare_data(ctx, nonce);
        let hash = sha256(&data);
        if hash_meets_target(&hash, ctx.target) {
            return Ok((nonce, hash));
        }
    }
    Err(ChainError::ExhaustedNonce)
}

/// Parallel nonce search using rayon, stopping as soon as any worker finds a
/// hash under target. Workers cooperatively check `stop` between hashes, the
/// way the teacher's miner threads polled an `AtomicBool`.
pub fn run_parallel(ctx: &PowContext, max_nonce: i64, chunk: i64) -> Result<(i64, [u8; 32])> {
    let stop = AtomicBool::new(false);
    let winner = AtomicI64::new(-1);
    let winner_hash = std::sync::Mutex::new([0u8; 32]);

    let num_chunks = max_nonce.div_ceil(chunk.max(1));
    (0..num_chunks).into_par_iter().for_each(|chunk_idx| {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let start = chunk_idx * chunk;
        let end = (start + chunk).min(max_nonce);
        for nonce in start..end {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            let data = prepare_data(ctx, nonce);
            let hash = sha256(&data);
            if hash_meets_target(&hash, ctx.target) {
                if !stop.swap(true, Ordering::SeqCst) {
                    winner.store(nonce, Ordering::SeqCst);
                    *winner_hash.lock().unwrap() = hash;
                }
                return;
            }
        }
    });

    let nonce = winner.load(Ordering::SeqCst);
    if nonce < 0 {
        return Err(ChainError::ExhaustedNonce);
    }
    Ok((nonce, *winner_hash.lock().unwrap()))
}

/// Recomputes the hash for `nonce` and checks it both matches `hash` and
/// satisfies `ctx.target` — used when accepting a block mined elsewhere.
pub fn validate(ctx: &PowContext, nonce: i64, hash: &[u8; 32]) -> bool {
    let data = prepare_data(ctx, nonce);
    let recomputed = sha256(&data);
    &recomputed == hash && hash_meets_target(hash, ctx.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::target_from_bits;

    fn sample_ctx() -> PowContext<'static> {
        PowContext {
            prev_block_hash: [0u8; 32],
            merkle_root: None,
            timestamp: 1_700_000_000,
            target: target_from_bits(8), // easy target, finds quickly
            solution_hash: None,
            solution: &[],
            problem_graph_hash: None,
        }
    }

    #[test]
    fn test_solution_ascii_concatenates_without_separator() {
        assert_eq!(solution_ascii(&[1, 23, 4]), "1234");
        assert_eq!(solution_ascii(&[]), "");
    }

    #[test]
    fn test_prepare_data_changes_with_nonce() {
        let ctx = sample_ctx();
        assert_ne!(prepare_data(&ctx, 0), prepare_data(&ctx, 1));
    }

    #[test]
    fn test_run_finds_and_validates() {
        let ctx = sample_ctx();
        let (nonce, hash) = run(&ctx, 1_000_000).expect("easy target should be found quickly");
        assert!(validate(&ctx, nonce, &hash));
    }

    #[test]
    fn test_run_exhausts_on_impossible_target() {
        let mut ctx = sample_ctx();
        ctx.target = Target::zero();
        assert!(matches!(run(&ctx, 100), Err(ChainError::ExhaustedNonce)));
    }

    #[test]
    fn test_validate_rejects_wrong_hash() {
        let ctx = sample_ctx();
        let (nonce, _) = run(&ctx, 1_000_000).unwrap();
        assert!(!validate(&ctx, nonce, &[0xffu8; 32]));
    }

    #[test]
    fn test_run_parallel_agrees_with_run() {
        let ctx = sample_ctx();
        let (_, hash) = run_parallel(&ctx, 1_000_000, 4096).expect("should find a nonce");
        assert!(hash_meets_target(&hash, ctx.target));
    }
}
