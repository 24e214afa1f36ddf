// Hash & Target utilities (component C1).
//
// Targets and difficulties are unbounded-looking but in practice bounded to
// [1, 2^256) / (0, 2^256]; we lean on `primitive_types::U256` for the target
// itself and `U512` as scratch space for the one division that would
// otherwise need to represent 2^256 exactly (it doesn't fit in a U256).

use primitive_types::{U256, U512};

pub type Target = U256;
pub type Difficulty = U256;

/// `targetFromBits(b) = 2^(256-b)`. Valid for `1 <= bits <= 256`.
pub fn target_from_bits(bits: u32) -> Target {
    debug_assert!((1..=256).contains(&bits), "target bits out of range");
    U256::one() << (256 - bits as usize)
}

fn two_pow_256() -> U512 {
    U512::one() << 256
}

fn u512_to_u256_saturating(v: U512) -> U256 {
    let max = U512::from(U256::MAX);
    let clamped = if v > max { max } else { v };
    let mut buf = [0u8; 64];
    clamped.to_little_endian(&mut buf);
    U256::from_little_endian(&buf[..32])
}

/// `D = floor(2^256 / T)`.
pub fn target_to_difficulty(target: Target) -> Difficulty {
    if target.is_zero() {
        return U256::MAX;
    }
    u512_to_u256_saturating(two_pow_256() / U512::from(target))
}

/// Inverse of [`target_to_difficulty`]: `T = floor(2^256 / D)`.
pub fn difficulty_to_target(difficulty: Difficulty) -> Target {
    if difficulty.is_zero() {
        return U256::MAX;
    }
    u512_to_u256_saturating(two_pow_256() / U512::from(difficulty))
}

/// 64 lowercase hex digits, zero-padded — used for display, not the PoW preimage.
pub fn target_to_hex(target: Target) -> String {
    let mut buf = [0u8; 32];
    target.to_big_endian(&mut buf);
    hex::encode(buf)
}

/// Minimal lowercase hex rendering with no padding, matching the original
/// chain's `fmt.Sprintf("%x", target)` — see spec §9: this is the rendering
/// the PoW preimage uses, and changing it is consensus-breaking.
pub fn target_to_hex_minimal(target: Target) -> String {
    if target.is_zero() {
        return "0".to_string();
    }
    let padded = target_to_hex(target);
    let trimmed = padded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

pub const INITIAL_TARGET_BITS: u32 = 16;
pub const INITIAL_REDUCED_TARGET_BITS: u32 = 12;
