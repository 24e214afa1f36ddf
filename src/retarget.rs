// Retargeter (component C7): jointly adjusts the normal and reduced-track
// targets every epoch, coupling them through the observed ratio of time
// spent mining on each track.
//
// This is a direct port of `blockchain.go`'s `CalculateTarget`: same epoch
// memoization strategy (a table keyed by `height / BLOCKS_PER_EPOCH`), same
// recursive structure, same constants. The one asymmetry worth flagging
// (and which is NOT a bug to fix) is that the normal track is *rescaled*
// (`diff * retarget`) while the reduced track is *shifted*
// (`diff + diff * retarget_reduced`) — see DESIGN.md for why this is kept.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::chain::Chain;
use crate::error::{ChainError, Result};
use crate::target::{
    difficulty_to_target, target_from_bits, target_to_difficulty, Target, INITIAL_REDUCED_TARGET_BITS,
    INITIAL_TARGET_BITS,
};

pub const BLOCKS_PER_EPOCH: u64 = 64;
pub const TARGET_SECONDS_PER_MINUTE: i64 = 60;
pub const TARGET_BLOCKS_PER_MINUTE: i64 = 6;
pub const MAX_TARGET_CHANGE: f64 = 4.0;
pub const ETA: f64 = 0.25;

pub struct Retargeter<'a> {
    chain: &'a Chain,
    cache: Mutex<HashMap<u64, (Target, Target)>>,
}

impl<'a> Retargeter<'a> {
    pub fn new(chain: &'a Chain) -> Self {
        let mut cache = HashMap::new();
        cache.insert(
            0,
            (target_from_bits(INITIAL_TARGET_BITS), target_from_bits(INITIAL_REDUCED_TARGET_BITS)),
        );
        Retargeter { chain, cache: Mutex::new(cache) }
    }

    /// Returns `(normal_target, reduced_target)` in effect for `height`.
    pub fn targets_for_height(&self, height: u64) -> Result<(Target, Target)> {
        let epoch = height / BLOCKS_PER_EPOCH;
        if let Some(targets) = self.cache.lock().unwrap().get(&epoch) {
            return Ok(*targets);
        }
        let targets = self.calculate_epoch(epoch)?;
        self.cache.lock().unwrap().insert(epoch, targets);
        Ok(targets)
    }

    pub fn target_for_height(&self, height: u64, reduced: bool) -> Result<Target> {
        let (normal, reduced_target) = self.targets_for_height(height)?;
        Ok(if reduced { reduced_target } else { normal })
    }

    /// Counts blocks in `(from, to]` whose solution status matches `reduced`.
    fn count_blocks(&self, from: u64, to: u64, reduced: bool) -> Result<u64> {
        let mut n = 0u64;
        for height in (from + 1)..=to {
            let block = self
                .chain
                .get_by_height(height)?
                .ok_or(ChainError::ChainIntegrity("missing block during retarget window"))?;
            let has_solution = self.chain.has_valid_solution(&block)?;
            if has_solution == reduced {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Sums inter-block time for `(from, to]` whose solution status matches `reduced`.
    fn time_for_blocks(&self, from: u64, to: u64, reduced: bool) -> Result<i64> {
        let mut t = 0i64;
        for height in (from + 1)..=to {
            let block = self
                .chain
                .get_by_height(height)?
                .ok_or(ChainError::ChainIntegrity("missing block during retarget window"))?;
            let has_solution = self.chain.has_valid_solution(&block)?;
            if has_solution == reduced {
                let prev = self
                    .chain
                    .get_by_height(height - 1)?
                    .ok_or(ChainError::ChainIntegrity("missing block during retarget window"))?;
                t += block.timestamp - prev.timestamp;
            }
        }
        Ok(t)
    }

    fn calculate_epoch(&self, epoch: u64) -> Result<(Target, Target)> {
        if epoch == 0 {
            return Ok((
                target_from_bits(INITIAL_TARGET_BITS),
                target_from_bits(INITIAL_REDUCED_TARGET_BITS),
            ));
        }

        // The stats window for epoch `N`'s target is epoch `N-1`'s blocks,
        // not epoch `N`'s own (those haven't been mined yet when this target
        // is needed). `saturating_sub` only bites for epoch 1, where there's
        // no block before genesis to anchor on; count_blocks/time_for_blocks
        // then simply start classifying from height 1 instead of height 0.
        let base = (epoch - 1) * BLOCKS_PER_EPOCH;
        let last = base + BLOCKS_PER_EPOCH - 1;
        let anchor = base.saturating_sub(1);

        let t_reduced = self.time_for_blocks(anchor, last, true)?;
        let t_normal = self.time_for_blocks(anchor, last, false)?;
        let eta_star = if t_normal == 0 { 0.0 } else { t_reduced as f64 / t_normal as f64 };

        let r = self.count_blocks(anchor, last, false)? as f64 / BLOCKS_PER_EPOCH as f64;

        let base_block = self.chain.get_by_height(anchor)?.ok_or(ChainError::ChainIntegrity("missing epoch boundary block"))?;
        let last_block = self.chain.get_by_height(last)?.ok_or(ChainError::ChainIntegrity("missing epoch boundary block"))?;
        let t = last_block.timestamp - base_block.timestamp;

        // `base` is already epoch-1's starting height, so its own target is
        // the baseline this epoch's retarget rescales from.
        let (prev_normal, prev_reduced) = self.targets_for_height(base)?;
        let prev_diff = target_to_difficulty(prev_normal);
        let prev_diff_reduced = target_to_difficulty(prev_reduced);

        let time_target = TARGET_SECONDS_PER_MINUTE * BLOCKS_PER_EPOCH as i64 / TARGET_BLOCKS_PER_MINUTE;

        let mut retarget = if t == 0 {
            MAX_TARGET_CHANGE
        } else {
            (r + (1.0 - r) * eta_star) / (r + (1.0 - r) * ETA) * (time_target as f64 / t as f64)
        };
        retarget = retarget.clamp(1.0 / MAX_TARGET_CHANGE, MAX_TARGET_CHANGE);

        let new_diff = scale_u256(prev_diff, retarget);
        let new_target = difficulty_to_target(new_diff);

        let mut retarget_reduced = ETA * retarget - eta_star;
        retarget_reduced = retarget_reduced.clamp(1.0 / MAX_TARGET_CHANGE, MAX_TARGET_CHANGE);

        // Deliberately additive, not multiplicative — the reduced track
        // drifts relative to the normal track's difficulty rather than
        // rescaling its own previous value.
        let new_diff_reduced = prev_diff_reduced + scale_u256(prev_diff, retarget_reduced);
        let new_target_reduced = difficulty_to_target(new_diff_reduced);

        Ok((new_target, new_target_reduced))
    }
}

/// Multiplies a `U256` difficulty by a floating-point factor via fixed-point
/// scaling (`factor * 2^32`), matching the precision the original's
/// `big.Float` multiply affords without pulling in an arbitrary-precision
/// float dependency.
fn scale_u256(value: primitive_types::U256, factor: f64) -> primitive_types::U256 {
    const SCALE_BITS: u32 = 32;
    let scale = 1u64 << SCALE_BITS;
    let factor_fixed = (factor.max(0.0) * scale as f64).round() as u128;
    let scaled = value.full_mul(primitive_types::U256::from(factor_fixed));
    let shifted = scaled >> SCALE_BITS;
    let max = primitive_types::U512::from(primitive_types::U256::MAX);
    let clamped = if shifted > max { max } else { shifted };
    let mut buf = [0u8; 64];
    clamped.to_little_endian(&mut buf);
    primitive_types::U256::from_little_endian(&buf[..32])
}
