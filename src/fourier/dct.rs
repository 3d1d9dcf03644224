//! Scaled DCT-II and DCT-IV kernels.
//!
//! Both transforms are the raw cosine-sum forms, i.e. the orthonormal
//! transform multiplied by `sqrt(len / 2)`:
//!
//! ```text
//! DCT2[k] = sum_n buf[n] * cos((n + 1/2) *  k        * pi / len)
//! DCT4[k] = sum_n buf[n] * cos((n + 1/2) * (k + 1/2) * pi / len)
//! ```
//!
//! The DCT-IV matrix is symmetric, so applying [`dct4`] twice multiplies the
//! input by `len / 2`; undoing that scale recovers the involution.
//!
//! The implementation is the stable radix-2 factorisation built from
//! orthogonal rotation stages: a DCT-IV of size `len` reduces to two DCT-IVs
//! of size `len / 2` behind one pass of Givens rotations drawn from the
//! shared quarter-wave table, and a DCT-II splits into a half-size DCT-II
//! (even outputs) and a half-size DCT-IV (odd outputs) behind an unscaled
//! butterfly. No stage amplifies roundoff, so accuracy stays flat in `len`.

use crate::fourier::trig::quarter_wave;

/// In-place scaled DCT-II.
///
/// `buf.len()` must be a power of two and at least 8; `tmp` is scratch of at
/// least the same length and must not alias `buf`.
pub fn dct2(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    debug_assert!(n.is_power_of_two() && n >= 8);
    debug_assert!(tmp.len() >= n);
    dct2_inner(buf, &mut tmp[..n]);
}

/// In-place scaled DCT-IV. Same contract as [`dct2`].
pub fn dct4(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    debug_assert!(n.is_power_of_two() && n >= 8);
    debug_assert!(tmp.len() >= n);
    dct4_inner(buf, &mut tmp[..n]);
}

/// Runs the scaled DCT-IV independently on both halves of `buf`, sharing one
/// scratch area of at least half the length. Used by the centered FFT.
pub(crate) fn dct4_halves(buf: &mut [f32], tmp: &mut [f32]) {
    let half = buf.len() / 2;
    debug_assert!(tmp.len() >= half);
    let (lo, hi) = buf.split_at_mut(half);
    dct4_inner(lo, &mut tmp[..half]);
    dct4_inner(hi, &mut tmp[..half]);
}

fn dct2_inner(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    if n == 2 {
        let (x0, x1) = (buf[0], buf[1]);
        buf[0] = x0 + x1;
        buf[1] = (x0 - x1) * std::f32::consts::FRAC_1_SQRT_2;
        return;
    }
    let half = n / 2;

    // Even outputs come from the folded sum, odd outputs from the folded
    // difference run through a DCT-IV.
    for k in 0..half {
        let a = buf[k];
        let b = buf[n - 1 - k];
        tmp[k] = a + b;
        tmp[half + k] = a - b;
    }
    {
        let (sums, diffs) = tmp.split_at_mut(half);
        dct2_inner(sums, &mut buf[..half]);
        dct4_inner(diffs, &mut buf[..half]);
    }
    for k in 0..half {
        buf[2 * k] = tmp[k];
        buf[2 * k + 1] = tmp[half + k];
    }
}

fn dct4_inner(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    if n == 2 {
        // 2-point DCT-IV is a single rotation by pi/8.
        let tw = quarter_wave(2);
        let (c, s) = (tw[0], tw[1]);
        let (x0, x1) = (buf[0], buf[1]);
        buf[0] = c * x0 + s * x1;
        buf[1] = s * x0 - c * x1;
        return;
    }
    let half = n / 2;
    let tw = quarter_wave(n);

    // Rotation stage. The second half holds the counter-rotated sequence in
    // reversed order, which turns its half-size DCT-IV into the DST-IV the
    // odd outputs need (up to the (-1)^m sign applied when recombining).
    for k in 0..half {
        let c = tw[k];
        let s = tw[n - 1 - k];
        let a = buf[k];
        let b = buf[n - 1 - k];
        tmp[k] = c * a - s * b;
        tmp[n - 1 - k] = s * a + c * b;
    }
    {
        let (lo, hi) = tmp.split_at_mut(half);
        dct4_inner(lo, &mut buf[..half]);
        dct4_inner(hi, &mut buf[..half]);
    }
    for m in 0..half {
        let p = tmp[m];
        let q = if m % 2 == 0 { tmp[half + m] } else { -tmp[half + m] };
        buf[2 * m] = p + q;
        buf[2 * m + 1] = p - q;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dct2(x: &[f32]) -> Vec<f64> {
        let n = x.len() as f64;
        (0..x.len())
            .map(|k| {
                x.iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        v as f64 * ((i as f64 + 0.5) * k as f64 * std::f64::consts::PI / n).cos()
                    })
                    .sum()
            })
            .collect()
    }

    fn naive_dct4(x: &[f32]) -> Vec<f64> {
        let n = x.len() as f64;
        (0..x.len())
            .map(|k| {
                x.iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        v as f64
                            * ((i as f64 + 0.5) * (k as f64 + 0.5) * std::f64::consts::PI / n)
                                .cos()
                    })
                    .sum()
            })
            .collect()
    }

    /// Deterministic pseudo-random fill, good enough to exercise every path.
    fn test_signal(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
            })
            .collect()
    }

    fn max_abs(v: &[f64]) -> f64 {
        v.iter().fold(0.0f64, |m, &x| m.max(x.abs()))
    }

    #[test]
    fn dct2_matches_direct_sum() {
        for &n in &[8usize, 16, 32, 64] {
            let x = test_signal(n, 7 + n as u32);
            let expect = naive_dct2(&x);
            let mut buf = x.clone();
            let mut tmp = vec![0.0f32; n];
            dct2(&mut buf, &mut tmp);
            let scale = max_abs(&expect).max(1.0);
            for k in 0..n {
                assert!(
                    (buf[k] as f64 - expect[k]).abs() / scale < 1e-3,
                    "n={} k={}: {} vs {}",
                    n,
                    k,
                    buf[k],
                    expect[k]
                );
            }
        }
    }

    #[test]
    fn dct4_matches_direct_sum() {
        for &n in &[8usize, 16, 32, 64] {
            let x = test_signal(n, 101 + n as u32);
            let expect = naive_dct4(&x);
            let mut buf = x.clone();
            let mut tmp = vec![0.0f32; n];
            dct4(&mut buf, &mut tmp);
            let scale = max_abs(&expect).max(1.0);
            for k in 0..n {
                assert!(
                    (buf[k] as f64 - expect[k]).abs() / scale < 1e-3,
                    "n={} k={}: {} vs {}",
                    n,
                    k,
                    buf[k],
                    expect[k]
                );
            }
        }
    }

    #[test]
    fn dct4_applied_twice_scales_by_half_len() {
        for &n in &[8usize, 64, 256] {
            let x = test_signal(n, 33);
            let mut buf = x.clone();
            let mut tmp = vec![0.0f32; n];
            dct4(&mut buf, &mut tmp);
            dct4(&mut buf, &mut tmp);
            let gain = n as f32 / 2.0;
            for k in 0..n {
                assert!(
                    (buf[k] / gain - x[k]).abs() < 1e-3,
                    "n={} k={}: {} vs {}",
                    n,
                    k,
                    buf[k] / gain,
                    x[k]
                );
            }
        }
    }

    #[test]
    fn dct2_constant_input_concentrates_in_dc() {
        let n = 32;
        let mut buf = vec![1.0f32; n];
        let mut tmp = vec![0.0f32; n];
        dct2(&mut buf, &mut tmp);
        assert!((buf[0] - n as f32).abs() < 1e-3);
        for k in 1..n {
            assert!(buf[k].abs() < 1e-3, "k={}: {}", k, buf[k]);
        }
    }
}
