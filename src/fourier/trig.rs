//! Process-wide quarter-wave cosine tables.
//!
//! Every transform size shares one immutable table of
//! `cos((n + 1/2) * pi / (2 * len))` for `n` in `0..len`. Because
//! `sin((n + 1/2) * pi / (2 * len)) = table[len - 1 - n]`, the same table
//! serves as both the cosine and sine half of a rotation.

use std::sync::OnceLock;

/// One slot per power-of-two size up to 2^16 (the largest supported block).
const MAX_LOG2_SIZE: usize = 16;

static TABLES: [OnceLock<Box<[f32]>>; MAX_LOG2_SIZE + 1] =
    [const { OnceLock::new() }; MAX_LOG2_SIZE + 1];

/// Returns the quarter-wave cosine table for `len`.
///
/// `len` must be a power of two in `2..=65536`. The first caller for a given
/// size computes the table; concurrent first use is serialized by the slot's
/// `OnceLock`, and every later access is a lock-free read of the same bits.
pub fn quarter_wave(len: usize) -> &'static [f32] {
    debug_assert!(len.is_power_of_two() && len >= 2);
    let slot = len.trailing_zeros() as usize;
    assert!(slot <= MAX_LOG2_SIZE, "transform size {} out of range", len);
    TABLES[slot].get_or_init(|| compute(len))
}

fn compute(len: usize) -> Box<[f32]> {
    let scale = std::f64::consts::PI / (2.0 * len as f64);
    (0..len)
        .map(|n| ((n as f64 + 0.5) * scale).cos() as f32)
        .collect()
}
