#![forbid(unsafe_code)]
//! Pure Rust spectral freezing for building seamless sample loops.
//!
//! `spectrice` holds the short-time spectrum of an audio stream steady around
//! a chosen time point: as playback crosses the freeze point, the output
//! becomes a quasi-stationary signal whose per-bin magnitudes (and,
//! optionally, per-bin phase advances) match the spectrum observed there.
//! Analysis and synthesis run on a centered real DFT built from two DCT-IV
//! halves, so the frequency grid is symmetric about DC and every bin can be
//! frozen with the same arithmetic.
//!
//! # Quick start
//!
//! ```
//! use spectrice::{freeze, FreezeConfig, WindowKind};
//!
//! // 1 second of 440 Hz sine at 48 kHz.
//! let input: Vec<f32> = (0..48000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
//!     .collect();
//!
//! let config = FreezeConfig::new(24000)
//!     .with_block_size(1024)
//!     .with_hops(8)
//!     .with_window(WindowKind::Hann)
//!     .with_crossfade(8000);
//!
//! let output = freeze(&input, &config).unwrap();
//! assert_eq!(output.len(), input.len());
//! ```
//!
//! # Streaming
//!
//! For block-at-a-time use, drive a [`FreezeSession`] directly: create it
//! with a priming block (and optionally a spectrum snapshot), then call
//! [`FreezeSession::process`] once per block. The session performs no
//! allocation and no I/O after creation.

pub mod core;
pub mod error;
pub mod fourier;
pub mod freeze;
pub mod io;

pub use crate::core::types::{AudioBuffer, FreezeConfig, Sample};
pub use crate::core::window::WindowKind;
pub use crate::error::FreezeError;
pub use crate::freeze::FreezeSession;

/// Runs a whole interleaved signal through a freeze session.
///
/// The first block primes the analysis ring, the rest stream through the
/// engine, and a trailing zero block flushes the overlap, so `output[t]`
/// lines up with `input[t]` and the two have the same length. The config's
/// `freeze_start` / `freeze_point` are positions on this input.
///
/// # Errors
///
/// [`FreezeError::InvalidConfig`] / [`FreezeError::OutOfMemory`] from session
/// creation, and [`FreezeError::InputTooShort`] when the input holds less
/// than one block per channel.
///
/// # Example
///
/// ```
/// use spectrice::{freeze, FreezeConfig, WindowKind};
///
/// let input = vec![0.0f32; 4096];
/// let config = FreezeConfig::new(2048)
///     .with_block_size(256)
///     .with_hops(4)
///     .with_window(WindowKind::Sine);
/// let output = freeze(&input, &config).unwrap();
/// assert_eq!(output.len(), 4096);
/// ```
pub fn freeze(input: &[f32], config: &FreezeConfig) -> Result<Vec<f32>, FreezeError> {
    let block_len = config.block_size * config.channels;
    if input.len() < block_len {
        return Err(FreezeError::InputTooShort {
            provided: input.len(),
            minimum: block_len,
        });
    }

    let mut session = FreezeSession::new(config.clone(), Some(&input[..block_len]), None)?;

    let mut output = Vec::new();
    output
        .try_reserve_exact(input.len() + block_len)
        .map_err(|_| FreezeError::OutOfMemory {
            requested: (input.len() + block_len) * std::mem::size_of::<f32>(),
        })?;

    let mut block = vec![0.0f32; block_len];
    let mut out_block = vec![0.0f32; block_len];
    let mut pos = block_len;
    while pos < input.len() {
        let n = (input.len() - pos).min(block_len);
        block[..n].copy_from_slice(&input[pos..pos + n]);
        block[n..].fill(0.0);
        session.process(&block, Some(&mut out_block));
        output.extend_from_slice(&out_block);
        pos += n;
    }

    // One zero block drains the overlap that still covers the input tail.
    block.fill(0.0);
    session.process(&block, Some(&mut out_block));
    output.extend_from_slice(&out_block);

    output.truncate(input.len());
    Ok(output)
}

/// Freezes an [`AudioBuffer`], taking the channel count from the buffer.
///
/// The sample rate and channel layout of the result match the input.
///
/// # Errors
///
/// As for [`freeze`].
pub fn freeze_buffer(
    buffer: &AudioBuffer,
    config: &FreezeConfig,
) -> Result<AudioBuffer, FreezeError> {
    let mut effective = config.clone();
    effective.channels = buffer.channels as usize;
    let data = freeze(&buffer.data, &effective)?;
    Ok(AudioBuffer::new(data, buffer.sample_rate, buffer.channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> FreezeConfig {
        FreezeConfig::new(2048)
            .with_block_size(256)
            .with_hops(4)
            .with_window(WindowKind::Sine)
    }

    #[test]
    fn freeze_rejects_short_input() {
        let config = quiet_config();
        let result = freeze(&[0.0; 100], &config);
        assert!(matches!(
            result,
            Err(FreezeError::InputTooShort {
                provided: 100,
                minimum: 256
            })
        ));
    }

    #[test]
    fn freeze_preserves_length() {
        let config = quiet_config();
        for len in [256usize, 300, 1024, 1500] {
            let input = vec![0.25f32; len];
            let output = freeze(&input, &config).unwrap();
            assert_eq!(output.len(), len);
        }
    }

    #[test]
    fn freeze_of_silence_is_silent() {
        let config = quiet_config();
        let output = freeze(&vec![0.0f32; 2048], &config).unwrap();
        assert!(output.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn freeze_buffer_keeps_rate_and_channels() {
        let buffer = AudioBuffer::new(vec![0.0f32; 1024], 44100, 2);
        let config = quiet_config();
        let out = freeze_buffer(&buffer, &config).unwrap();
        assert_eq!(out.sample_rate, 44100);
        assert_eq!(out.channels, 2);
        assert_eq!(out.data.len(), 1024);
    }
}
