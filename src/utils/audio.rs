use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decodes a base64-encoded block of raw PCM samples.
///
/// The payload carries no format metadata; sample rate and channel layout are
/// agreed out-of-band between the provider and the caller.
pub fn decode_pcm_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(payload)
}

/// Wraps raw PCM bytes in a canonical 44-byte RIFF/WAVE header.
///
/// All multi-byte header fields are little-endian and the PCM payload is
/// appended unmodified, so the output is bit-exact for a given input and plays
/// in any standard WAV decoder.
pub fn encode_wav(
    pcm: &[u8],
    sample_rate: u32,
    num_channels: u16,
    bits_per_sample: u16,
) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = sample_rate * num_channels as u32 * bits_per_sample as u32 / 8;
    let block_align = num_channels * bits_per_sample / 8;

    let mut buf = Vec::with_capacity(44 + pcm.len());
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format code
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    buf.extend_from_slice(pcm);
    buf
}

/// Parsed view into an in-memory WAV container.
pub struct WavView<'a> {
    pub sample_rate: u32,
    pub num_channels: u16,
    pub bits_per_sample: u16,
    pub data: &'a [u8],
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Walks the chunk list of a WAV container, decoding the fmt chunk and locating
/// the data chunk. Unknown chunks are skipped.
pub fn parse_wav(bytes: &[u8]) -> Result<WavView<'_>> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" {
        return Err(anyhow!("not a RIFF container"));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(anyhow!("not a WAVE container"));
    }

    let mut fmt: Option<(u32, u16, u16)> = None;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_size = read_u32(bytes, pos + 4) as usize;
        let body = pos + 8;
        if body + chunk_size > bytes.len() {
            return Err(anyhow!("chunk overruns container ({} bytes declared)", chunk_size));
        }

        if chunk_id == b"fmt " {
            if chunk_size < 16 {
                return Err(anyhow!("fmt chunk too short: {} bytes", chunk_size));
            }
            let format_code = read_u16(bytes, body);
            if format_code != 1 {
                return Err(anyhow!("unsupported format code {} (expected PCM)", format_code));
            }
            fmt = Some((
                read_u32(bytes, body + 4),
                read_u16(bytes, body + 2),
                read_u16(bytes, body + 14),
            ));
        } else if chunk_id == b"data" {
            let (sample_rate, num_channels, bits_per_sample) =
                fmt.ok_or_else(|| anyhow!("data chunk before fmt chunk"))?;
            return Ok(WavView {
                sample_rate,
                num_channels,
                bits_per_sample,
                data: &bytes[body..body + chunk_size],
            });
        }

        pos = body + chunk_size;
    }

    Err(anyhow!("missing data chunk"))
}

/// Concatenates format-identical WAV clips into a single container.
///
/// Every clip must share sample rate, channel count and sample width; the data
/// chunks are joined in order and re-wrapped with a fresh header.
pub fn merge_wav_clips(clips: &[Vec<u8>]) -> Result<Vec<u8>> {
    let first = clips.first().ok_or_else(|| anyhow!("no clips to merge"))?;
    let base = parse_wav(first)?;

    let mut data = Vec::new();
    data.extend_from_slice(base.data);

    for clip in &clips[1..] {
        let view = parse_wav(clip)?;
        if (view.sample_rate, view.num_channels, view.bits_per_sample)
            != (base.sample_rate, base.num_channels, base.bits_per_sample)
        {
            return Err(anyhow!(
                "clip format mismatch: {} Hz/{} ch/{} bit vs {} Hz/{} ch/{} bit",
                view.sample_rate,
                view.num_channels,
                view.bits_per_sample,
                base.sample_rate,
                base.num_channels,
                base.bits_per_sample
            ));
        }
        data.extend_from_slice(view.data);
    }

    Ok(encode_wav(&data, base.sample_rate, base.num_channels, base.bits_per_sample))
}
