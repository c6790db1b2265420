use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};

use crate::core::error::PipelineError;
use crate::core::io::Storage;
use crate::core::state::{GeneratedAudio, Segment, SpeakerTable, SynthesisResultSet};
use crate::services::tts::TtsClient;
use crate::utils::audio::{decode_pcm_base64, encode_wav};

/// Shape of the PCM the voice backend returns.
pub const SAMPLE_RATE: u32 = 24_000;
pub const NUM_CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Synthesizes every segment in script order, one request at a time,
/// writing each finished clip under `clip_dir` as `clip_{id:04}.wav`.
///
/// Lines whose speaker has no voice assignment and lines the backend
/// answers without audio are skipped. A transport failure or a corrupt
/// payload aborts the run; clips written so far are released before
/// the error propagates, so a failed run leaves nothing behind.
pub async fn run_synthesis(
    segments: &[Segment],
    speakers: &SpeakerTable,
    tts: &dyn TtsClient,
    storage: &dyn Storage,
    clip_dir: &str,
) -> Result<SynthesisResultSet> {
    if segments.is_empty() || speakers.is_empty() {
        return Err(PipelineError::EmptyInput.into());
    }

    let mut results = SynthesisResultSet::default();
    if let Err(e) = synthesize_all(segments, speakers, tts, storage, clip_dir, &mut results).await {
        // The synthesis failure stays the root cause even when the
        // cleanup fails too.
        if let Err(cleanup) = results.release(storage).await {
            warn!("Failed to remove partial clips: {:#}", cleanup);
        }
        return Err(e);
    }

    if results.is_empty() {
        return Err(PipelineError::NoAudioProduced.into());
    }
    Ok(results)
}

async fn synthesize_all(
    segments: &[Segment],
    speakers: &SpeakerTable,
    tts: &dyn TtsClient,
    storage: &dyn Storage,
    clip_dir: &str,
    results: &mut SynthesisResultSet,
) -> Result<()> {
    let pb = ProgressBar::new(segments.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    // Strictly one request in flight; the backend rate-limits hard and
    // clips must land in script order.
    for segment in segments {
        let speaker = match speakers.get(&segment.speaker) {
            Some(s) => s,
            None => {
                warn!(
                    "No voice assigned for speaker '{}', skipping line {}",
                    segment.speaker, segment.id
                );
                pb.inc(1);
                continue;
            }
        };

        let prompt = match segment.tone.instruction_prefix() {
            Some(prefix) => format!("{}{}", prefix, segment.text),
            None => segment.text.clone(),
        };

        let payload = tts
            .synthesize(&prompt, speaker.voice)
            .await
            .with_context(|| {
                format!(
                    "Synthesis failed on line {} ({})",
                    segment.id, segment.speaker
                )
            })?;

        let payload = match payload {
            Some(p) => p,
            None => {
                debug!("No audio for line {}, skipping", segment.id);
                pb.inc(1);
                continue;
            }
        };

        let pcm = decode_pcm_base64(&payload)
            .map_err(PipelineError::from)
            .with_context(|| format!("Corrupt audio payload on line {}", segment.id))?;

        let wav = encode_wav(&pcm, SAMPLE_RATE, NUM_CHANNELS, BITS_PER_SAMPLE);
        let clip_path = format!("{}/clip_{:04}.wav", clip_dir, segment.id);
        storage.write(&clip_path, &wav).await?;

        results.push(GeneratedAudio {
            segment_id: segment.id,
            wav,
            clip_path,
        });
        pb.inc(1);
    }
    pb.finish_with_message("Synthesis complete");

    Ok(())
}
