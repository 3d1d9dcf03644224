//! In-memory WAV reading and writing.
//!
//! The reader walks the RIFF chunk list, decodes `fmt ` and `data`, and
//! keeps every other chunk as raw bytes so the writer can carry metadata
//! (loop points in particular) through to the output file.

use crate::error::FreezeError;
use std::io::Write;

const WAV_FORMAT_PCM: u16 = 1;
const WAV_FORMAT_IEEE_FLOAT: u16 = 3;

/// `smpl` chunk: byte offset of the loop count field.
const SMPL_LOOP_COUNT_OFFSET: usize = 28;
/// `smpl` chunk: byte offset of the first loop record.
const SMPL_LOOPS_OFFSET: usize = 36;
/// `smpl` chunk: size of one loop record.
const SMPL_LOOP_SIZE: usize = 24;
/// Loop type for a plain forward loop.
const SMPL_LOOP_FORWARD: u32 = 0;

/// Sample encodings supported for reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Pcm8,
    Pcm16,
    Pcm24,
    Float32,
}

impl SampleFormat {
    /// Bits per sample.
    #[inline]
    pub fn bits(self) -> u16 {
        match self {
            SampleFormat::Pcm8 => 8,
            SampleFormat::Pcm16 => 16,
            SampleFormat::Pcm24 => 24,
            SampleFormat::Float32 => 32,
        }
    }

    #[inline]
    fn format_code(self) -> u16 {
        match self {
            SampleFormat::Float32 => WAV_FORMAT_IEEE_FLOAT,
            _ => WAV_FORMAT_PCM,
        }
    }

    /// Parses a format name as accepted on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pcm8" => Some(SampleFormat::Pcm8),
            "pcm16" => Some(SampleFormat::Pcm16),
            "pcm24" => Some(SampleFormat::Pcm24),
            "float32" => Some(SampleFormat::Float32),
            _ => None,
        }
    }

    fn from_fmt(code: u16, bits: u16) -> Option<Self> {
        match (code, bits) {
            (WAV_FORMAT_PCM, 8) => Some(SampleFormat::Pcm8),
            (WAV_FORMAT_PCM, 16) => Some(SampleFormat::Pcm16),
            (WAV_FORMAT_PCM, 24) => Some(SampleFormat::Pcm24),
            (WAV_FORMAT_IEEE_FLOAT, 32) => Some(SampleFormat::Float32),
            _ => None,
        }
    }
}

/// A forward loop from a `smpl` chunk; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLoop {
    pub start: usize,
    pub end: usize,
}

impl SampleLoop {
    /// Loop length in frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded WAV file.
#[derive(Debug, Clone)]
pub struct WavFile {
    pub sample_rate: u32,
    pub channels: u16,
    /// Sample encoding of the source file.
    pub format: SampleFormat,
    /// Interleaved samples decoded to float.
    pub samples: Vec<f32>,
    /// Every chunk other than `fmt ` and `data`, in file order.
    pub extra_chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl WavFile {
    /// Parses a WAV file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self, FreezeError> {
        if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
            return Err(FreezeError::InvalidFormat(
                "missing RIFF/WAVE header".to_string(),
            ));
        }

        let mut cursor = 12;
        let mut fmt: Option<(u16, u16, u32, u16)> = None;
        let mut audio_data: Option<&[u8]> = None;
        let mut extra_chunks = Vec::new();

        while cursor + 8 <= data.len() {
            let mut id = [0u8; 4];
            id.copy_from_slice(&data[cursor..cursor + 4]);
            let size = read_u32_le(data, cursor + 4) as usize;
            cursor += 8;
            let end = (cursor + size).min(data.len());
            let body = &data[cursor..end];

            match &id {
                b"fmt " => {
                    if body.len() < 16 {
                        return Err(FreezeError::InvalidFormat(
                            "fmt chunk too short".to_string(),
                        ));
                    }
                    fmt = Some((
                        read_u16_le(body, 0),
                        read_u16_le(body, 2),
                        read_u32_le(body, 4),
                        read_u16_le(body, 14),
                    ));
                }
                b"data" => audio_data = Some(body),
                _ => extra_chunks.push((id, body.to_vec())),
            }

            cursor = end;
            if size % 2 == 1 {
                cursor += 1;
            }
        }

        let (code, channels, sample_rate, bits) =
            fmt.ok_or_else(|| FreezeError::InvalidFormat("no fmt chunk found".to_string()))?;
        if channels == 0 || channels > 255 {
            return Err(FreezeError::InvalidFormat(format!(
                "unsupported channel count: {}",
                channels
            )));
        }
        let format = SampleFormat::from_fmt(code, bits).ok_or_else(|| {
            FreezeError::InvalidFormat(format!(
                "unsupported WAV format: code={}, bits={}",
                code, bits
            ))
        })?;

        let samples = decode_samples(audio_data.unwrap_or(&[]), format);
        Ok(Self {
            sample_rate,
            channels,
            format,
            samples,
            extra_chunks,
        })
    }

    /// Reads and parses a WAV file from disk.
    pub fn open(path: &str) -> Result<Self, FreezeError> {
        let data = std::fs::read(path)
            .map_err(|e| FreezeError::IoError(format!("{}: {}", path, e)))?;
        Self::parse(&data)
    }

    /// Number of frames (samples per channel).
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// First forward loop found in a `smpl` chunk, if any.
    pub fn forward_loop(&self) -> Option<SampleLoop> {
        let smpl = self
            .extra_chunks
            .iter()
            .find(|(id, _)| id == b"smpl")
            .map(|(_, body)| body.as_slice())?;
        if smpl.len() < SMPL_LOOPS_OFFSET {
            return None;
        }
        let count = read_u32_le(smpl, SMPL_LOOP_COUNT_OFFSET) as usize;
        for i in 0..count {
            let at = SMPL_LOOPS_OFFSET + i * SMPL_LOOP_SIZE;
            if at + SMPL_LOOP_SIZE > smpl.len() {
                break;
            }
            if read_u32_le(smpl, at + 4) == SMPL_LOOP_FORWARD {
                let start = read_u32_le(smpl, at + 8) as usize;
                // dwEnd is inclusive; the engine wants exclusive.
                let end = read_u32_le(smpl, at + 12) as usize + 1;
                return Some(SampleLoop { start, end });
            }
        }
        None
    }

    /// Copies interleaved frames starting at `frame_pos` into `out`,
    /// zero-filling anything past the end of the file.
    pub fn read_at(&self, frame_pos: usize, out: &mut [f32]) {
        let nc = self.channels as usize;
        let begin = (frame_pos * nc).min(self.samples.len());
        let avail = (self.samples.len() - begin).min(out.len());
        out[..avail].copy_from_slice(&self.samples[begin..begin + avail]);
        out[avail..].fill(0.0);
    }
}

fn decode_samples(data: &[u8], format: SampleFormat) -> Vec<f32> {
    match format {
        SampleFormat::Pcm8 => data
            .iter()
            .map(|&b| (b as i32 - 128) as f32 / 128.0)
            .collect(),
        SampleFormat::Pcm16 => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
            .collect(),
        SampleFormat::Pcm24 => data
            .chunks_exact(3)
            .map(|c| {
                let raw = (c[0] as i32) | ((c[1] as i32) << 8) | ((c[2] as i32) << 16);
                let raw = if raw & 0x80_0000 != 0 {
                    raw | !0xFF_FFFF
                } else {
                    raw
                };
                raw as f32 / 8_388_608.0
            })
            .collect(),
        SampleFormat::Float32 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

/// Encodes a WAV file: `fmt `, the retained extra chunks, then `data`.
pub fn encode_wav(
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
    samples: &[f32],
    extra_chunks: &[([u8; 4], Vec<u8>)],
) -> Vec<u8> {
    let bytes_per_sample = format.bits() as u32 / 8;
    let data_size = samples.len() as u32 * bytes_per_sample;
    let extra_size: usize = extra_chunks
        .iter()
        .map(|(_, body)| 8 + body.len() + body.len() % 2)
        .sum();
    let riff_size = 4 + (8 + 16) + extra_size as u32 + 8 + data_size + data_size % 2;

    let mut out = Vec::with_capacity(riff_size as usize + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format.format_code().to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = channels * (format.bits() / 8);
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&format.bits().to_le_bytes());

    for (id, body) in extra_chunks {
        out.extend_from_slice(id);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
    }

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        let v = sample.clamp(-1.0, 1.0);
        match format {
            SampleFormat::Pcm8 => out.push(((v * 127.0) as i32 + 128) as u8),
            SampleFormat::Pcm16 => {
                out.extend_from_slice(&((v * 32767.0) as i16).to_le_bytes())
            }
            SampleFormat::Pcm24 => {
                let raw = (v * 8_388_607.0) as i32;
                out.extend_from_slice(&raw.to_le_bytes()[..3]);
            }
            SampleFormat::Float32 => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
    if data_size % 2 == 1 {
        out.push(0);
    }
    out
}

/// Encodes and writes a WAV file to disk.
pub fn write_wav_file(
    path: &str,
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
    samples: &[f32],
    extra_chunks: &[([u8; 4], Vec<u8>)],
) -> Result<(), FreezeError> {
    let bytes = encode_wav(sample_rate, channels, format, samples, extra_chunks);
    let mut file = std::fs::File::create(path)
        .map_err(|e| FreezeError::IoError(format!("{}: {}", path, e)))?;
    file.write_all(&bytes)
        .map_err(|e| FreezeError::IoError(format!("{}: {}", path, e)))?;
    Ok(())
}

#[inline]
fn read_u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

#[inline]
fn read_u32_le(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
