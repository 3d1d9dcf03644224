#![allow(dead_code)]

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::TAU;

/// Generates a mono sine wave with a per-sample amplitude function.
pub fn gen_sine<F>(freq_hz: f32, sr: u32, n: usize, amp_fn: F) -> Vec<f32>
where
    F: Fn(usize) -> f32,
{
    (0..n)
        .map(|i| {
            let phase = TAU * freq_hz * i as f32 / sr as f32;
            amp_fn(i) * phase.sin()
        })
        .collect()
}

/// Generates a linear chirp starting at `f0_hz` and rising by
/// `rate_hz_per_sample`, with phase integrated sample by sample.
pub fn gen_chirp(f0_hz: f32, rate_hz_per_sample: f32, sr: u32, n: usize) -> Vec<f32> {
    let mut phase = 0.0f64;
    (0..n)
        .map(|i| {
            let freq = f0_hz as f64 + rate_hz_per_sample as f64 * i as f64;
            phase += TAU as f64 * freq / sr as f64;
            phase.sin() as f32
        })
        .collect()
}

/// Root-mean-square of a signal.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f32>() / signal.len() as f32).sqrt()
}

/// RMS over a window of the signal.
pub fn windowed_rms(signal: &[f32], start: usize, len: usize) -> f32 {
    let end = (start + len).min(signal.len());
    if start >= end {
        return 0.0;
    }
    rms(&signal[start..end])
}

/// RMS of the difference of two equal-length signals.
pub fn rms_diff(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let sum: f32 = a[..len]
        .iter()
        .zip(&b[..len])
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    (sum / len as f32).sqrt()
}

/// Spectral energy at a single frequency via a direct DFT probe.
pub fn spectral_energy_at(signal: &[f32], sr: u32, target_freq: f32) -> f32 {
    let n = signal.len();
    if n == 0 {
        return 0.0;
    }
    let mut real = 0.0f64;
    let mut imag = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = TAU as f64 * target_freq as f64 * i as f64 / sr as f64;
        real += s as f64 * angle.cos();
        imag += s as f64 * angle.sin();
    }
    (((real * real + imag * imag) / n as f64).sqrt()) as f32
}

/// Hann-windowed magnitude spectrum (first half) via rustfft.
pub fn magnitude_spectrum(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    let mut buf: Vec<Complex<f32>> = signal
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 - 0.5 * (TAU * i as f32 / n as f32).cos();
            Complex::new(s * w, 0.0)
        })
        .collect();
    fft.process(&mut buf);
    buf[..n / 2].iter().map(|c| c.norm()).collect()
}

/// Dominant frequency of a signal segment, refined by parabolic
/// interpolation of the log-magnitude spectrum around the peak bin.
pub fn dominant_freq(signal: &[f32], sr: u32) -> f32 {
    let mags = magnitude_spectrum(signal);
    let n = signal.len();
    if mags.len() < 3 {
        return 0.0;
    }
    let mut peak = 1;
    for k in 1..mags.len() - 1 {
        if mags[k] > mags[peak] {
            peak = k;
        }
    }
    let alpha = (mags[peak - 1].max(1e-30) as f64).ln();
    let beta = (mags[peak].max(1e-30) as f64).ln();
    let gamma = (mags[peak + 1].max(1e-30) as f64).ln();
    let denom = alpha - 2.0 * beta + gamma;
    let p = if denom.abs() > 1e-12 {
        0.5 * (alpha - gamma) / denom
    } else {
        0.0
    };
    ((peak as f64 + p) * sr as f64 / n as f64) as f32
}
