//! Centered FFT built on two half-size DCT-IVs.
//!
//! The centered DFT indexes its samples symmetrically around the frame
//! midpoint, which shifts the frequency grid by half a bin: line `b` sits at
//! `(b + 1/2)` cycles per frame, so the spectrum of a real input is fully
//! described by `N/2` complex lines with no special-cased DC or Nyquist bin.
//! That symmetric grid is what lets per-bin phase arithmetic treat every
//! line identically.
//!
//! The factorisation folds the input around its midpoint into an
//! even-symmetric half (summed) and an odd-antisymmetric half (differenced,
//! with alternating signs to form a DST-IV-compatible sequence). A DCT-IV on
//! the symmetric half yields the real parts; a DCT-IV on the antisymmetric
//! half, read out in reverse, yields the imaginary parts. The inverse is the
//! exact structural dual.
//!
//! Both directions carry a factor `sqrt(2)` on top of the scaled DCT-IVs, so
//! the pair has the conventional unnormalised round trip
//! `ifft_centered(fft_centered(x)) = len * x`. Callers do not normalise
//! here; the STFT window normalisation absorbs the gain.

use crate::fourier::dct::dct4_halves;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Forward centered FFT.
///
/// On entry `buf` holds `len` real samples; on return it holds `len / 2`
/// complex lines packed as `[re0, im0, re1, im1, ...]`. `len` must be a
/// power of two and at least 16; `tmp` is scratch of at least `len` and must
/// not alias `buf`.
pub fn fft_centered(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    debug_assert!(n.is_power_of_two() && n >= 16);
    debug_assert!(tmp.len() >= n);
    let tmp = &mut tmp[..n];
    let half = n / 2;

    // Fold around the midpoint: sums feed the cosine half, alternating-sign
    // differences feed the sine half.
    for k in 0..half {
        let a = buf[half + k];
        let b = buf[half - 1 - k];
        tmp[k] = a + b;
        tmp[half + k] = if k % 2 == 0 { a - b } else { b - a };
    }
    dct4_halves(tmp, &mut buf[..half]);

    // Interleave {re, im}; the imaginary half is read in reverse per the
    // DST-IV convention.
    for k in 0..half {
        buf[2 * k] = SQRT_2 * tmp[k];
        buf[2 * k + 1] = SQRT_2 * tmp[n - 1 - k];
    }
}

/// Inverse centered FFT.
///
/// On entry `buf` holds `len / 2` packed complex lines as produced by
/// [`fft_centered`]; on return it holds `len` real samples scaled by `len`
/// relative to the original input. Same size and aliasing contract as the
/// forward direction.
pub fn ifft_centered(buf: &mut [f32], tmp: &mut [f32]) {
    let n = buf.len();
    debug_assert!(n.is_power_of_two() && n >= 16);
    debug_assert!(tmp.len() >= n);
    let tmp = &mut tmp[..n];
    let half = n / 2;

    for k in 0..half {
        tmp[k] = SQRT_2 * buf[2 * k];
        tmp[n - 1 - k] = SQRT_2 * buf[2 * k + 1];
    }
    dct4_halves(tmp, &mut buf[..half]);

    // Unfold: reverse of the forward fold, with the same sign alternation.
    for k in 0..half {
        let e = tmp[k];
        let o = tmp[half + k];
        if k % 2 == 0 {
            buf[half + k] = e + o;
            buf[half - 1 - k] = e - o;
        } else {
            buf[half + k] = e - o;
            buf[half - 1 - k] = e + o;
        }
    }
}
