//! WAV container round trips and the file-to-file freeze pipeline.

mod common;

use common::{gen_sine, rms_diff};
use spectrice::io::wav::{encode_wav, write_wav_file, SampleFormat, SampleLoop, WavFile};
use spectrice::{freeze_buffer, AudioBuffer, FreezeConfig, WindowKind};

/// Builds a minimal `smpl` chunk holding one forward loop (inclusive end).
fn smpl_chunk(start: u32, end_inclusive: u32) -> ([u8; 4], Vec<u8>) {
    let mut body = vec![0u8; 36 + 24];
    body[28..32].copy_from_slice(&1u32.to_le_bytes()); // one loop
    body[36 + 8..36 + 12].copy_from_slice(&start.to_le_bytes());
    body[36 + 12..36 + 16].copy_from_slice(&end_inclusive.to_le_bytes());
    (*b"smpl", body)
}

#[test]
fn in_memory_round_trip_all_formats() {
    let samples = gen_sine(440.0, 44100, 512, |_| 0.8);
    for (format, tol) in [
        (SampleFormat::Pcm8, 2e-2f32),
        (SampleFormat::Pcm16, 1e-4),
        (SampleFormat::Pcm24, 1e-6),
        (SampleFormat::Float32, 0.0),
    ] {
        let bytes = encode_wav(44100, 1, format, &samples, &[]);
        let parsed = WavFile::parse(&bytes).unwrap();
        assert_eq!(parsed.format, format);
        assert_eq!(parsed.num_frames(), 512);
        assert!(
            rms_diff(&parsed.samples, &samples) <= tol,
            "{:?} round trip error",
            format
        );
    }
}

#[test]
fn file_round_trip_via_disk() {
    let samples = gen_sine(220.0, 48000, 256, |_| 0.5);
    let path = std::env::temp_dir().join("spectrice_wav_roundtrip_test.wav");
    let path = path.to_str().unwrap();

    write_wav_file(path, 48000, 1, SampleFormat::Float32, &samples, &[]).unwrap();
    let parsed = WavFile::open(path).unwrap();
    std::fs::remove_file(path).ok();

    assert_eq!(parsed.sample_rate, 48000);
    assert_eq!(parsed.samples, samples);
}

#[test]
fn loop_points_survive_the_container() {
    let samples = gen_sine(440.0, 44100, 4096, |_| 0.7);
    let bytes = encode_wav(44100, 1, SampleFormat::Pcm16, &samples, &[smpl_chunk(1024, 3071)]);
    let wav = WavFile::parse(&bytes).unwrap();
    assert_eq!(
        wav.forward_loop(),
        Some(SampleLoop {
            start: 1024,
            end: 3072
        })
    );

    // Re-encode with the retained chunks; the loop must still be there.
    let out = encode_wav(
        wav.sample_rate,
        wav.channels,
        SampleFormat::Pcm24,
        &wav.samples,
        &wav.extra_chunks,
    );
    let reread = WavFile::parse(&out).unwrap();
    assert_eq!(reread.format, SampleFormat::Pcm24);
    assert_eq!(
        reread.forward_loop(),
        Some(SampleLoop {
            start: 1024,
            end: 3072
        })
    );
}

#[test]
fn freeze_pipeline_preserves_layout_and_metadata() {
    // Stereo tone -> WAV -> parse -> freeze -> WAV -> parse.
    let frames = 4096usize;
    let left = gen_sine(440.0, 48000, frames, |_| 0.6);
    let right = gen_sine(660.0, 48000, frames, |_| 0.6);
    let interleaved: Vec<f32> = left
        .iter()
        .zip(&right)
        .flat_map(|(&l, &r)| [l, r])
        .collect();

    let bytes = encode_wav(
        48000,
        2,
        SampleFormat::Float32,
        &interleaved,
        &[smpl_chunk(2048, 4095)],
    );
    let wav = WavFile::parse(&bytes).unwrap();

    let config = FreezeConfig::new(2048)
        .with_block_size(256)
        .with_hops(8)
        .with_window(WindowKind::Nuttall)
        .with_crossfade(1024);
    let buffer = AudioBuffer::new(wav.samples.clone(), wav.sample_rate, wav.channels);
    let frozen = freeze_buffer(&buffer, &config).unwrap();
    assert_eq!(frozen.data.len(), interleaved.len());

    let out_bytes = encode_wav(
        frozen.sample_rate,
        frozen.channels,
        SampleFormat::Float32,
        &frozen.data,
        &wav.extra_chunks,
    );
    let reread = WavFile::parse(&out_bytes).unwrap();
    assert_eq!(reread.channels, 2);
    assert_eq!(reread.sample_rate, 48000);
    assert_eq!(reread.num_frames(), frames);
    assert!(reread.forward_loop().is_some());
}

#[test]
fn read_at_supports_block_streaming() {
    let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
    let bytes = encode_wav(44100, 2, SampleFormat::Float32, &samples, &[]);
    let wav = WavFile::parse(&bytes).unwrap();

    // 500 frames of 2 channels; read three overlapping windows.
    let mut block = vec![0.0f32; 256];
    wav.read_at(0, &mut block);
    assert_eq!(block[..256], samples[..256]);

    wav.read_at(400, &mut block);
    // 100 frames remain; the rest must be zero-filled.
    assert_eq!(block[..200], samples[800..1000]);
    assert!(block[200..].iter().all(|&v| v == 0.0));

    wav.read_at(5000, &mut block);
    assert!(block.iter().all(|&v| v == 0.0));
}
