//! The freeze session: validation, buffer layout, snapshot pre-analysis,
//! priming, and the per-hop processing loop.
//!
//! Each hop windows the input ring, transforms it with the centered FFT,
//! blends every bin's magnitude and phase advance toward stored references
//! according to the crossfade ramp, transforms back, and overlap-adds into
//! the output ring. The ramp position `idx = (block + hop/H) * N` tracks the
//! trailing edge of the analysis frame, so a bin is fully frozen before any
//! content past the freeze point can reach it.
//!
//! Per bin the blend coefficient drives three regimes:
//!
//! * `mix = 0` — track: output follows the live spectrum and the stored
//!   references follow it too.
//! * `0 < mix < 1` — blend: convex combination of live and reference;
//!   without a snapshot the reference is re-written with the blend, so it
//!   glides into the hold.
//! * `mix = 1` — hold: output is driven entirely by the references; the
//!   synthesis phase advances only through the smoothed per-bin step.

use crate::core::types::FreezeConfig;
use crate::core::window::fill_half_window;
use crate::error::FreezeError;
use crate::fourier::centered::{fft_centered, ifft_centered};
use crate::fourier::trig::quarter_wave;

const MIN_CHANNELS: usize = 1;
const MAX_CHANNELS: usize = 255;
const MIN_BLOCK_SIZE: usize = 16;
const MAX_BLOCK_SIZE: usize = 65536;

/// All session buffers share one allocation whose working base is aligned to
/// this many bytes.
const SLAB_ALIGN_BYTES: usize = 64;
/// f32 elements per alignment unit; every sub-buffer offset is a multiple.
const ALIGN_FLOATS: usize = SLAB_ALIGN_BYTES / std::mem::size_of::<f32>();

const INV_TAU: f32 = 1.0 / std::f32::consts::TAU;

/// Start offsets (in floats, relative to the aligned base) of every named
/// buffer inside the session slab. Offsets are in carving order and each is
/// a multiple of [`ALIGN_FLOATS`].
#[derive(Debug, Clone, Copy)]
struct Layout {
    scratch: usize,
    inv_lap: usize,
    fwd_lap: usize,
    abs_ref: usize,
    arg_accum: usize,
    arg_prev: usize,
    arg_step: usize,
    total: usize,
}

impl Layout {
    fn of(cfg: &FreezeConfig) -> Self {
        let n = cfg.block_size;
        let c = cfg.channels;
        let half = n / 2;
        let phase_len = if cfg.freeze_phase { c * half } else { 0 };

        let mut off = 0usize;
        let mut section = |len: usize| {
            let start = off;
            off = (off + len).next_multiple_of(ALIGN_FLOATS);
            start
        };
        let _window = section(half);
        Layout {
            scratch: section(2 * n),
            inv_lap: section(c * n),
            fwd_lap: section(c * n),
            abs_ref: section(c * half),
            arg_accum: section(phase_len),
            arg_prev: section(phase_len),
            arg_step: section(phase_len),
            total: off,
        }
    }
}

/// Mutable views over the slab, one per named buffer.
struct Bufs<'a> {
    window: &'a mut [f32],
    scratch: &'a mut [f32],
    inv_lap: &'a mut [f32],
    fwd_lap: &'a mut [f32],
    abs_ref: &'a mut [f32],
    arg_accum: &'a mut [f32],
    arg_prev: &'a mut [f32],
    arg_step: &'a mut [f32],
}

/// A spectral freeze session.
///
/// Created with a config plus optional priming and snapshot blocks, mutated
/// only by [`process`](Self::process), and torn down by `Drop` (the single
/// backing allocation is released exactly once). Sessions own their state
/// exclusively, so independent sessions may run on different threads without
/// synchronization.
pub struct FreezeSession {
    cfg: FreezeConfig,
    hop_size: usize,
    block_idx: usize,
    have_snapshot: bool,
    /// Offset of the 64-byte-aligned working base inside `slab`.
    base: usize,
    layout: Layout,
    slab: Vec<f32>,
}

impl FreezeSession {
    /// Creates a session.
    ///
    /// `priming`, when given, is consumed as one input block with no output
    /// (shorter slices are zero-padded). `snapshot`, when given, must hold
    /// exactly one interleaved block; its per-bin magnitudes become the
    /// freeze reference instead of the last live spectrum.
    ///
    /// # Errors
    ///
    /// [`FreezeError::InvalidConfig`] for out-of-range or inconsistent
    /// parameters (including a snapshot combined with phase freezing), and
    /// [`FreezeError::OutOfMemory`] if the backing allocation fails.
    pub fn new(
        cfg: FreezeConfig,
        priming: Option<&[f32]>,
        snapshot: Option<&[f32]>,
    ) -> Result<Self, FreezeError> {
        validate(&cfg, snapshot)?;

        let layout = Layout::of(&cfg);
        let slab_len = layout.total + ALIGN_FLOATS;
        let mut slab: Vec<f32> = Vec::new();
        slab.try_reserve_exact(slab_len)
            .map_err(|_| FreezeError::OutOfMemory {
                requested: slab_len * std::mem::size_of::<f32>(),
            })?;
        slab.resize(slab_len, 0.0);
        let addr = slab.as_ptr() as usize;
        let base = (addr.next_multiple_of(SLAB_ALIGN_BYTES) - addr) / std::mem::size_of::<f32>();

        // Warm every twiddle table this block size will touch, so the hop
        // path never hits first-use initialization.
        let mut size = cfg.block_size / 2;
        while size >= 2 {
            let _ = quarter_wave(size);
            size /= 2;
        }

        let window_kind = cfg.window;
        let n_hops = cfg.n_hops;
        let mut session = Self {
            hop_size: cfg.block_size / cfg.n_hops,
            cfg,
            block_idx: 0,
            have_snapshot: false,
            base,
            layout,
            slab,
        };

        {
            let bufs = session.bufs();
            fill_half_window(window_kind, n_hops, bufs.window)?;
        }
        if let Some(snap) = snapshot {
            session.analyze_snapshot(snap);
        }
        if let Some(prime) = priming {
            session.prime(prime);
        }
        Ok(session)
    }

    /// The configuration this session was created with.
    #[inline]
    pub fn config(&self) -> &FreezeConfig {
        &self.cfg
    }

    /// Samples emitted per hop.
    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Index of the next block to process.
    #[inline]
    pub fn block_idx(&self) -> usize {
        self.block_idx
    }

    /// Whether a precaptured snapshot drives the amplitude reference.
    #[inline]
    pub fn have_snapshot(&self) -> bool {
        self.have_snapshot
    }

    /// Processes one block of `block_size * channels` interleaved samples.
    ///
    /// When `output` is `Some`, one block of processed samples is written to
    /// it; when `None`, the block is consumed silently (priming). This path
    /// never fails and never allocates.
    ///
    /// # Panics
    ///
    /// If `input` (or a provided `output`) does not hold exactly one block.
    pub fn process(&mut self, input: &[f32], mut output: Option<&mut [f32]>) {
        let n = self.cfg.block_size;
        let c = self.cfg.channels;
        let h = self.cfg.n_hops;
        let half = n / 2;
        let hop = self.hop_size;
        assert_eq!(input.len(), n * c, "input must hold exactly one block");
        if let Some(out) = output.as_deref() {
            assert_eq!(out.len(), n * c, "output must hold exactly one block");
        }

        let freeze_amp = self.cfg.freeze_amp;
        let freeze_phase = self.cfg.freeze_phase;
        let have_snapshot = self.have_snapshot;
        let block_idx = self.block_idx;
        let ramp_start = self.cfg.freeze_start as f32;
        let ramp_end = self.cfg.freeze_point as f32;
        let freeze_factor = self.cfg.freeze_factor;

        let bufs = self.bufs();
        for ch in 0..c {
            let fwd = &mut bufs.fwd_lap[ch * n..(ch + 1) * n];
            let inv = &mut bufs.inv_lap[ch * n..(ch + 1) * n];
            let abs_ref = &mut bufs.abs_ref[ch * half..(ch + 1) * half];
            // Phase buffers are zero-length unless phase freezing is on.
            let phase_range = if freeze_phase {
                ch * half..(ch + 1) * half
            } else {
                0..0
            };
            let accum = &mut bufs.arg_accum[phase_range.clone()];
            let prev = &mut bufs.arg_prev[phase_range.clone()];
            let step = &mut bufs.arg_step[phase_range];

            for hop_i in 0..h {
                let (frame, tmp) = bufs.scratch.split_at_mut(n);

                // Analysis windowing into the scratch frame.
                for k in 0..half {
                    let w = bufs.window[k];
                    frame[k] = w * fwd[k];
                    frame[n - 1 - k] = w * fwd[n - 1 - k];
                }
                fft_centered(frame, tmp);

                // Crossfade position for this hop.
                let mix = {
                    let idx = (block_idx as f32 + hop_i as f32 / h as f32) * n as f32;
                    let raw = if idx >= ramp_end {
                        1.0
                    } else if ramp_start >= ramp_end {
                        0.0
                    } else {
                        (idx - ramp_start) / (ramp_end - ramp_start)
                    };
                    (raw * freeze_factor).clamp(0.0, 1.0)
                };

                for bin in 0..half {
                    let re = frame[2 * bin];
                    let im = frame[2 * bin + 1];
                    let mut abs = (re * re + im * im).sqrt();
                    let mut arg = im.atan2(re) * INV_TAU;

                    if freeze_amp {
                        abs = mix * abs_ref[bin] + (1.0 - mix) * abs;
                        if !have_snapshot {
                            abs_ref[bin] = abs;
                        }
                    }

                    if freeze_phase {
                        // Expected advance of bin `bin` over one hop, in
                        // cycles. Adding it before the wrap picks the
                        // unwrapped representative the smoothing mixes in.
                        let expected = bin as f32 / h as f32;
                        let mut d = arg - prev[bin];
                        prev[bin] = wrap_cycles(arg);
                        d = wrap_cycles(d + expected);
                        let smoothed = mix * step[bin] + (1.0 - mix) * d;
                        step[bin] = smoothed;
                        d = smoothed - expected;
                        let acc = wrap_cycles(accum[bin] + d);
                        accum[bin] = acc;
                        arg = acc;
                    }

                    let (sin, cos) = (std::f32::consts::TAU * arg).sin_cos();
                    frame[2 * bin] = abs * cos;
                    frame[2 * bin + 1] = abs * sin;
                }

                ifft_centered(frame, tmp);

                // Synthesis windowing and overlap-add.
                for k in 0..half {
                    let w = bufs.window[k];
                    inv[k] += w * frame[k];
                    inv[n - 1 - k] += w * frame[n - 1 - k];
                }

                // Emit the completed hop, then slide both rings.
                if let Some(out) = output.as_deref_mut() {
                    for k in 0..hop {
                        out[(hop_i * hop + k) * c + ch] = inv[k];
                    }
                }
                fwd.copy_within(hop.., 0);
                inv.copy_within(hop.., 0);
                for k in 0..hop {
                    fwd[n - hop + k] = input[(hop_i * hop + k) * c + ch];
                    inv[n - hop + k] = 0.0;
                }
            }
        }
        self.block_idx += 1;
    }

    /// Windows and transforms the snapshot block, storing per-bin magnitudes
    /// as the amplitude reference.
    fn analyze_snapshot(&mut self, snapshot: &[f32]) {
        let n = self.cfg.block_size;
        let c = self.cfg.channels;
        let half = n / 2;
        let bufs = self.bufs();
        for ch in 0..c {
            let (frame, tmp) = bufs.scratch.split_at_mut(n);
            for k in 0..half {
                let w = bufs.window[k];
                frame[k] = w * snapshot[k * c + ch];
                frame[n - 1 - k] = w * snapshot[(n - 1 - k) * c + ch];
            }
            fft_centered(frame, tmp);
            let abs_ref = &mut bufs.abs_ref[ch * half..(ch + 1) * half];
            for bin in 0..half {
                let re = frame[2 * bin];
                let im = frame[2 * bin + 1];
                abs_ref[bin] = (re * re + im * im).sqrt();
            }
        }
        self.have_snapshot = true;
    }

    /// Consumes one priming block with no output, zero-padding short input.
    fn prime(&mut self, priming: &[f32]) {
        let want = self.cfg.block_size * self.cfg.channels;
        if priming.len() >= want {
            self.process(&priming[..want], None);
        } else {
            let mut padded = vec![0.0f32; want];
            padded[..priming.len()].copy_from_slice(priming);
            self.process(&padded, None);
        }
    }

    fn bufs(&mut self) -> Bufs<'_> {
        let n = self.cfg.block_size;
        let c = self.cfg.channels;
        let half = n / 2;
        let phase_len = if self.cfg.freeze_phase { c * half } else { 0 };
        let l = self.layout;

        let region = &mut self.slab[self.base..self.base + l.total];
        let (window, rest) = region.split_at_mut(l.scratch);
        let (scratch, rest) = rest.split_at_mut(l.inv_lap - l.scratch);
        let (inv_lap, rest) = rest.split_at_mut(l.fwd_lap - l.inv_lap);
        let (fwd_lap, rest) = rest.split_at_mut(l.abs_ref - l.fwd_lap);
        let (abs_ref, rest) = rest.split_at_mut(l.arg_accum - l.abs_ref);
        let (arg_accum, rest) = rest.split_at_mut(l.arg_prev - l.arg_accum);
        let (arg_prev, arg_step) = rest.split_at_mut(l.arg_step - l.arg_prev);
        Bufs {
            window: &mut window[..half],
            scratch: &mut scratch[..2 * n],
            inv_lap: &mut inv_lap[..c * n],
            fwd_lap: &mut fwd_lap[..c * n],
            abs_ref: &mut abs_ref[..c * half],
            arg_accum: &mut arg_accum[..phase_len],
            arg_prev: &mut arg_prev[..phase_len],
            arg_step: &mut arg_step[..phase_len],
        }
    }
}

impl std::fmt::Debug for FreezeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreezeSession")
            .field("config", &self.cfg)
            .field("block_idx", &self.block_idx)
            .field("have_snapshot", &self.have_snapshot)
            .finish()
    }
}

fn validate(cfg: &FreezeConfig, snapshot: Option<&[f32]>) -> Result<(), FreezeError> {
    let err = |msg: String| Err(FreezeError::InvalidConfig(msg));
    if cfg.channels < MIN_CHANNELS || cfg.channels > MAX_CHANNELS {
        return err(format!("channel count {} out of range 1..=255", cfg.channels));
    }
    if cfg.block_size < MIN_BLOCK_SIZE
        || cfg.block_size > MAX_BLOCK_SIZE
        || !cfg.block_size.is_power_of_two()
    {
        return err(format!(
            "block size {} must be a power of two in 16..=65536",
            cfg.block_size
        ));
    }
    if cfg.n_hops < 2 || cfg.n_hops > cfg.block_size || !cfg.n_hops.is_power_of_two() {
        return err(format!(
            "hop count {} must be a power of two in 2..={}",
            cfg.n_hops, cfg.block_size
        ));
    }
    if cfg.n_hops < cfg.window.min_hops() {
        return err(format!(
            "{} window requires at least {} hops, got {}",
            cfg.window.name(),
            cfg.window.min_hops(),
            cfg.n_hops
        ));
    }
    if !cfg.freeze_factor.is_finite() || !(0.0..=1.0).contains(&cfg.freeze_factor) {
        return err(format!(
            "freeze factor {} must lie in [0, 1]",
            cfg.freeze_factor
        ));
    }
    if cfg.freeze_start < cfg.block_size || cfg.freeze_point < cfg.freeze_start {
        return err(format!(
            "freeze ramp {}..{} must satisfy point >= start >= block size ({})",
            cfg.freeze_start, cfg.freeze_point, cfg.block_size
        ));
    }
    if let Some(snap) = snapshot {
        if cfg.freeze_phase {
            return err("snapshot cannot be combined with phase freezing".to_string());
        }
        let want = cfg.block_size * cfg.channels;
        if snap.len() != want {
            return err(format!(
                "snapshot holds {} samples, expected exactly {}",
                snap.len(),
                want
            ));
        }
    }
    Ok(())
}

/// Wraps a phase in cycles into `[0, 1)`.
#[inline]
fn wrap_cycles(x: f32) -> f32 {
    let w = x - x.floor();
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}
