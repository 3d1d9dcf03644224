//! Core types shared across the crate: samples, buffers, and freeze
//! parameters.

use crate::core::window::WindowKind;

/// A single audio sample (32-bit float, nominal range -1.0 to 1.0).
pub type Sample = f32;

/// An audio buffer holding interleaved sample data.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved sample data (`data[frame * channels + channel]`).
    pub data: Vec<Sample>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels (1..=255).
    pub channels: u16,
}

impl AudioBuffer {
    /// Creates a new audio buffer.
    pub fn new(data: Vec<Sample>, sample_rate: u32, channels: u16) -> Self {
        Self {
            data,
            sample_rate,
            channels,
        }
    }

    /// Creates a mono buffer.
    pub fn from_mono(data: Vec<Sample>, sample_rate: u32) -> Self {
        Self::new(data, sample_rate, 1)
    }

    /// Returns the number of frames (samples per channel).
    #[inline]
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }

    /// Returns the duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Extracts a single channel from the interleaved data.
    pub fn channel(&self, ch: usize) -> Vec<Sample> {
        let nc = self.channels as usize;
        assert!(ch < nc, "channel index out of range");
        self.data.iter().skip(ch).step_by(nc).copied().collect()
    }
}

/// Parameters for a freeze session.
///
/// `freeze_start` and `freeze_point` are sample positions on the engine's
/// pre-framed input stream (the priming block occupies samples
/// `0..block_size`), measured against the trailing edge of the analysis
/// frame. The crossfade ramp rises from `freeze_start` and saturates at
/// `freeze_point`; `freeze_factor` scales the whole ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct FreezeConfig {
    /// Number of interleaved channels (1..=255).
    pub channels: usize,
    /// Transform block size `N` (power of two, 16..=65536).
    pub block_size: usize,
    /// STFT hops per block `H` (power of two, 2..=block_size).
    pub n_hops: usize,
    /// Analysis/synthesis window shape.
    pub window: WindowKind,
    /// Position where the crossfade toward the frozen spectrum begins.
    pub freeze_start: usize,
    /// Position where freezing reaches full strength.
    pub freeze_point: usize,
    /// Freeze strength in `[0, 1]`; 0 leaves the signal untouched.
    pub freeze_factor: f32,
    /// Freeze per-bin magnitudes.
    pub freeze_amp: bool,
    /// Freeze per-bin phase advance.
    pub freeze_phase: bool,
}

impl FreezeConfig {
    /// Creates a config that freezes hard at `freeze_point` with the
    /// defaults of the command-line tool: one channel, 8192-sample blocks,
    /// 8 hops, Nuttall window, amplitude freeze only, full strength.
    pub fn new(freeze_point: usize) -> Self {
        Self {
            channels: 1,
            block_size: 8192,
            n_hops: 8,
            window: WindowKind::Nuttall,
            freeze_start: freeze_point,
            freeze_point,
            freeze_factor: 1.0,
            freeze_amp: true,
            freeze_phase: false,
        }
    }

    /// Sets the channel count.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the transform block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the number of hops per block.
    pub fn with_hops(mut self, n_hops: usize) -> Self {
        self.n_hops = n_hops;
        self
    }

    /// Sets the window shape.
    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    /// Starts the crossfade `samples` before the freeze point.
    pub fn with_crossfade(mut self, samples: usize) -> Self {
        self.freeze_start = self.freeze_point.saturating_sub(samples);
        self
    }

    /// Sets the crossfade start position directly.
    pub fn with_freeze_start(mut self, freeze_start: usize) -> Self {
        self.freeze_start = freeze_start;
        self
    }

    /// Sets the freeze strength.
    pub fn with_freeze_factor(mut self, freeze_factor: f32) -> Self {
        self.freeze_factor = freeze_factor;
        self
    }

    /// Enables or disables amplitude freezing.
    pub fn with_freeze_amp(mut self, freeze_amp: bool) -> Self {
        self.freeze_amp = freeze_amp;
        self
    }

    /// Enables or disables phase-step freezing.
    pub fn with_freeze_phase(mut self, freeze_phase: bool) -> Self {
        self.freeze_phase = freeze_phase;
        self
    }

    /// Samples per hop.
    #[inline]
    pub fn hop_size(&self) -> usize {
        self.block_size / self.n_hops
    }

    /// Spectral lines per channel.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.block_size / 2
    }
}

impl std::fmt::Display for FreezeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}ch, block {}, {} hops, {} window, ramp {}..{}, factor {:.2}, amp={}, phase={}",
            self.channels,
            self.block_size,
            self.n_hops,
            self.window.name(),
            self.freeze_start,
            self.freeze_point,
            self.freeze_factor,
            self.freeze_amp,
            self.freeze_phase
        )
    }
}
