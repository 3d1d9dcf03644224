//! Command-line front-end for the spectrice freeze engine.

use spectrice::io::wav::{self, SampleFormat, WavFile};
use spectrice::{FreezeConfig, FreezeError, FreezeSession, WindowKind};

struct ToolOptions {
    block_size: usize,
    n_hops: usize,
    window: WindowKind,
    freeze_xfade: i64,
    /// 0 means "take the freeze point from the file's loop start".
    freeze_point: i64,
    freeze_factor: f32,
    freeze_amp: bool,
    freeze_phase: bool,
    snapshot_pos: Option<usize>,
    snapshot_gain: f32,
    loop_process: bool,
    format: Option<SampleFormat>,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            block_size: 8192,
            n_hops: 8,
            window: WindowKind::Nuttall,
            freeze_xfade: 0,
            freeze_point: 0,
            freeze_factor: 1.0,
            freeze_amp: true,
            freeze_phase: false,
            snapshot_pos: None,
            snapshot_gain: 1.0,
            loop_process: true,
            format: None,
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let opts = match parse_options(&args[3..]) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("ERROR: {}", msg);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args[1], &args[2], opts) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!("spectrice - Spectral Freezing Tool");
    eprintln!("Usage:");
    eprintln!("  spectrice-cli Input.wav Output.wav [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -blocksize:8192   Coefficients per block (power of two, 16..65536).");
    eprintln!("  -nhops:8          Evenly-divided hops per block (power of two, >= 2).");
    eprintln!("  -window:nuttall   Window function. Possible values:");
    eprintln!("                      sine     (minimum hops: 2)");
    eprintln!("                      hann     (minimum hops: 3)");
    eprintln!("                      hamming  (minimum hops: 3)");
    eprintln!("                      blackman (minimum hops: 5)");
    eprintln!("                      nuttall  (minimum hops: 7)");
    eprintln!("  -freezexfade:0    Samples to crossfade/blend prior to freezing.");
    eprintln!("  -freezepoint:X    Freeze point in samples. When absent, the freeze");
    eprintln!("                    point becomes the waveform's loop start point (and");
    eprintln!("                    without a loop the tool exits with an error).");
    eprintln!("  -freezefactor:1.0 Amount of freezing (0.0 = no change, 1.0 = freeze).");
    eprintln!("  -nofreezeamp      Don't freeze amplitude.");
    eprintln!("  -freezephase      Freeze phase step.");
    eprintln!("  -snapshot:n       Capture the amplitude reference at a sample position");
    eprintln!("                    instead of blending toward the live spectrum.");
    eprintln!("                    'n' disables the snapshot.");
    eprintln!("  -snapshotgain:1.0 Snapshot gain, linear or in dB (eg. 1.0 == 0.0dB).");
    eprintln!("  -format:default   Output format (default, pcm8, pcm16, pcm24, float32).");
    eprintln!("                    'default' matches the input file.");
    eprintln!("  -loops:y          Enable (y) or disable (n) loop handling. When");
    eprintln!("                    enabled, reads past the loop end wrap back to the");
    eprintln!("                    loop start point.");
}

/// Parses the option arguments. Invalid values warn and keep the default,
/// except an invalid `-format:` which is fatal (matching the tool contract).
fn parse_options(args: &[String]) -> Result<ToolOptions, String> {
    let mut opt = ToolOptions::default();
    for arg in args {
        if let Some(v) = arg.strip_prefix("-blocksize:") {
            match v.parse::<usize>() {
                Ok(x) if (16..=65536).contains(&x) && x.is_power_of_two() => opt.block_size = x,
                _ => eprintln!("WARNING: Ignoring invalid parameter to block size ({})", v),
            }
        } else if let Some(v) = arg.strip_prefix("-nhops:") {
            match v.parse::<usize>() {
                Ok(x) if x >= 2 && x.is_power_of_two() => opt.n_hops = x,
                _ => eprintln!(
                    "WARNING: Ignoring invalid parameter to number of hops ({})",
                    v
                ),
            }
        } else if let Some(v) = arg.strip_prefix("-window:") {
            match WindowKind::parse(v) {
                Some(kind) => opt.window = kind,
                None => eprintln!("WARNING: Ignoring invalid parameter to window type ({})", v),
            }
        } else if let Some(v) = arg.strip_prefix("-freezexfade:") {
            match v.parse::<i64>() {
                Ok(x) if x >= 0 => opt.freeze_xfade = x,
                _ => eprintln!(
                    "WARNING: Ignoring invalid parameter to freeze crossfade ({})",
                    v
                ),
            }
        } else if let Some(v) = arg.strip_prefix("-freezepoint:") {
            match v.parse::<i64>() {
                Ok(x) if x > 0 => opt.freeze_point = x,
                _ => eprintln!("WARNING: Ignoring invalid parameter to freeze point ({})", v),
            }
        } else if let Some(v) = arg.strip_prefix("-freezefactor:") {
            match v.parse::<f32>() {
                Ok(x) if (0.0..=1.0).contains(&x) => opt.freeze_factor = x,
                _ => eprintln!(
                    "WARNING: Ignoring invalid parameter to freeze factor ({})",
                    v
                ),
            }
        } else if arg == "-nofreezeamp" {
            opt.freeze_amp = false;
        } else if arg == "-freezephase" {
            opt.freeze_phase = true;
        } else if let Some(v) = arg.strip_prefix("-snapshot:") {
            if v.eq_ignore_ascii_case("n") {
                opt.snapshot_pos = None;
            } else {
                match v.parse::<usize>() {
                    Ok(x) => opt.snapshot_pos = Some(x),
                    Err(_) => eprintln!(
                        "WARNING: Ignoring invalid parameter to snapshot position ({})",
                        v
                    ),
                }
            }
        } else if let Some(v) = arg.strip_prefix("-snapshotgain:") {
            match parse_gain(v) {
                Some(g) => opt.snapshot_gain = g,
                None => eprintln!(
                    "WARNING: Ignoring invalid parameter to snapshot gain ({})",
                    v
                ),
            }
        } else if let Some(v) = arg.strip_prefix("-loops:") {
            if v.eq_ignore_ascii_case("y") {
                opt.loop_process = true;
            } else if v.eq_ignore_ascii_case("n") {
                opt.loop_process = false;
            } else {
                eprintln!(
                    "WARNING: Ignoring invalid parameter to loop processing ({})",
                    v
                );
            }
        } else if let Some(v) = arg.strip_prefix("-format:") {
            if v.eq_ignore_ascii_case("default") {
                opt.format = None;
            } else {
                match SampleFormat::parse(v) {
                    Some(f) => opt.format = Some(f),
                    None => return Err(format!("Invalid output format ({}).", v)),
                }
            }
        } else {
            eprintln!("WARNING: Ignoring unknown argument ({})", arg);
        }
    }
    Ok(opt)
}

/// Reads a gain in linear form ("0.5") or dB form ("-6dB").
fn parse_gain(s: &str) -> Option<f32> {
    let t = s.trim();
    let lower = t.to_ascii_lowercase();
    if let Some(num) = lower.strip_suffix("db") {
        let v: f64 = num.trim().parse().ok()?;
        Some(10f64.powf(v / 20.0) as f32)
    } else {
        t.parse::<f32>().ok().filter(|g| g.is_finite())
    }
}

fn run(input_path: &str, output_path: &str, opt: ToolOptions) -> Result<(), FreezeError> {
    let input = WavFile::open(input_path)?;
    let n = opt.block_size;
    let channels = input.channels as usize;
    let frames = input.num_frames();

    eprintln!(
        "Input: {} frames, {} Hz, {} ch, {:?}",
        frames, input.sample_rate, input.channels, input.format
    );

    if frames < n {
        return Err(FreezeError::InvalidFormat(format!(
            "input has {} sample points, need at least one block ({})",
            frames, n
        )));
    }

    // Keep the snapshot inside the file.
    let snapshot_pos = opt.snapshot_pos.map(|pos| {
        if pos + n > frames {
            eprintln!("WARNING: Snapshot position too close to end of file; moving to last block.");
            frames - n
        } else {
            pos
        }
    });

    // Loop points from the sampler chunk.
    let file_loop = input.forward_loop().filter(|l| !l.is_empty());
    let mut loop_process = opt.loop_process && file_loop.is_some();
    let (loop_end, loop_len) = file_loop.map(|l| (l.end, l.len())).unwrap_or((0, 0));

    // Without an explicit freeze point, freeze at the loop start.
    let mut freeze_point: i64 = if opt.freeze_point > 0 {
        opt.freeze_point
    } else if loop_len > 0 {
        (loop_end - loop_len) as i64
    } else {
        return Err(FreezeError::InvalidConfig(
            "unable to find a freeze point (no -freezepoint and no loop in the file)".to_string(),
        ));
    };

    // The engine needs one whole block of priming plus half a block of
    // overlap history before the ramp can start.
    let priming_len = (n + n / 2) as i64;
    let mut freeze_start = freeze_point - opt.freeze_xfade;
    if freeze_start < priming_len {
        eprintln!(
            "WARNING: Freeze start point too early; moving to {}.",
            priming_len
        );
        freeze_start = priming_len;
        if freeze_point < freeze_start {
            freeze_point = freeze_start;
        }
    }
    let freeze_start = freeze_start as usize;
    let freeze_point = freeze_point as usize;

    let out_format = opt.format.unwrap_or(input.format);

    // Copy samples verbatim until one block before the freeze start, then
    // use that block to prime the processor.
    let copy_through = freeze_start - priming_len as usize;
    let mut out_samples: Vec<f32> = Vec::with_capacity(frames * channels);
    out_samples.resize(copy_through * channels, 0.0);
    input.read_at(0, &mut out_samples);

    let mut priming = vec![0.0f32; n * channels];
    input.read_at(copy_through, &mut priming);
    let mut read_pos = copy_through + n;

    let snapshot = snapshot_pos.map(|pos| {
        let mut snap = vec![0.0f32; n * channels];
        input.read_at(pos, &mut snap);
        if opt.snapshot_gain != 1.0 {
            for v in &mut snap {
                *v *= opt.snapshot_gain;
            }
        }
        snap
    });

    let config = FreezeConfig::new(n + freeze_point - freeze_start)
        .with_channels(channels)
        .with_block_size(n)
        .with_hops(opt.n_hops)
        .with_window(opt.window)
        .with_freeze_start(n)
        .with_freeze_factor(opt.freeze_factor)
        .with_freeze_amp(opt.freeze_amp)
        .with_freeze_phase(opt.freeze_phase);
    let mut session = FreezeSession::new(config, Some(&priming), snapshot.as_deref())?;

    // Stream the rest of the file through the engine, wrapping reads at the
    // loop point when loop handling is active.
    let mut samples_rem = frames as i64 - freeze_start as i64 + priming_len;
    let mut loop_rem = loop_end as i64 - freeze_start as i64;
    if loop_process && loop_rem <= 0 {
        eprintln!("WARNING: Loop ends before the freeze start; disabling loop handling.");
        loop_process = false;
    }

    let n_blocks = if samples_rem <= 0 {
        0
    } else {
        ((samples_rem - 1) / n as i64 + 1) as usize
    };
    let mut block = vec![0.0f32; n * channels];
    let mut out_block = vec![0.0f32; n * channels];
    for b in 0..n_blocks {
        eprint!(
            "\rBlock {}/{} ({:.2}%)",
            b + 1,
            n_blocks,
            b as f64 * 100.0 / n_blocks as f64
        );

        let n_out = (samples_rem.min(n as i64)) as usize;
        samples_rem -= n_out as i64;

        let mut filled = 0usize;
        while filled < n_out {
            if loop_process && loop_rem == 0 {
                // Rewind to the loop start.
                read_pos = read_pos.saturating_sub(loop_len);
                loop_rem += loop_len as i64;
            }
            let mut take = n_out - filled;
            if loop_process {
                take = take.min(loop_rem as usize);
            }
            input.read_at(read_pos, &mut block[filled * channels..(filled + take) * channels]);
            read_pos += take;
            loop_rem -= take as i64;
            filled += take;
        }
        block[n_out * channels..].fill(0.0);

        session.process(&block, Some(&mut out_block));
        out_samples.extend_from_slice(&out_block[..n_out * channels]);
    }
    eprintln!("\nOk.");

    wav::write_wav_file(
        output_path,
        input.sample_rate,
        input.channels,
        out_format,
        &out_samples,
        &input.extra_chunks,
    )?;
    eprintln!("Written to {}", output_path);
    Ok(())
}
