//! Analysis/synthesis window tables.
//!
//! Only the first half of each window is stored; the full window is its even
//! extension (`full[n] = full[len - 1 - n] = half[n]`). Values are scaled so
//! that overlap-adding the squared full window at `n_hops` hops per block
//! reconstructs at exactly unit gain together with the centered FFT pair.

use crate::error::FreezeError;

/// Window shapes supported by the freeze engine.
///
/// Each shape needs a minimum hop count for its squared window to
/// overlap-add flat; narrower mainlobes get by with fewer hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Sine,
    Hann,
    Hamming,
    Blackman,
    /// Minimum 4-term window of Nuttall ("Some Windows with Very Good
    /// Sidelobe Behavior", DOI 10.1109/TASSP.1981.1163506, Eq. 37).
    Nuttall,
}

impl WindowKind {
    /// Smallest hop count for which squared-window overlap-add is flat.
    #[inline]
    pub fn min_hops(self) -> usize {
        match self {
            WindowKind::Sine => 2,
            WindowKind::Hann | WindowKind::Hamming => 3,
            WindowKind::Blackman => 5,
            WindowKind::Nuttall => 7,
        }
    }

    /// Lower-case name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Sine => "sine",
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
            WindowKind::Nuttall => "nuttall",
        }
    }

    /// Parses a window name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sine" => Some(WindowKind::Sine),
            "hann" => Some(WindowKind::Hann),
            "hamming" => Some(WindowKind::Hamming),
            "blackman" => Some(WindowKind::Blackman),
            "nuttall" => Some(WindowKind::Nuttall),
            _ => None,
        }
    }
}

/// Fills `half` with the first half of the normalized window for a block of
/// `2 * half.len()` samples overlapped at `n_hops` hops.
///
/// Fails with an invalid-configuration error when `n_hops` is below the
/// shape's minimum.
pub fn fill_half_window(
    kind: WindowKind,
    n_hops: usize,
    half: &mut [f32],
) -> Result<(), FreezeError> {
    if n_hops < kind.min_hops() {
        return Err(FreezeError::InvalidConfig(format!(
            "{} window requires at least {} hops, got {}",
            kind.name(),
            kind.min_hops(),
            n_hops
        )));
    }

    let block = 2 * half.len();
    let step = std::f64::consts::TAU / block as f64;
    let mut sum_sq = 0.0f64;
    for (n, w) in half.iter_mut().enumerate() {
        let x = (n as f64 + 0.5) * step;
        let v = match kind {
            WindowKind::Sine => (0.5 * x).sin(),
            WindowKind::Hann => 0.5 - 0.5 * x.cos(),
            WindowKind::Hamming => 25.0 / 46.0 - (21.0 / 46.0) * x.cos(),
            WindowKind::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            WindowKind::Nuttall => {
                0.363_581_9 - 0.489_177_5 * x.cos() + 0.136_599_5 * (2.0 * x).cos()
                    - 0.010_641_1 * (3.0 * x).cos()
            }
        };
        sum_sq += v * v;
        *w = v as f32;
    }

    let norm = (1.0 / (2.0 * sum_sq * n_hops as f64)).sqrt() as f32;
    for w in half.iter_mut() {
        *w *= norm;
    }
    Ok(())
}
