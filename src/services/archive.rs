use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::state::{Segment, SynthesisResultSet};

/// Archive entry name for a clip: segment id, then the speaker name
/// with whitespace runs collapsed to single underscores.
pub fn clip_entry_name(segment: &Segment) -> String {
    let speaker = segment
        .speaker
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}.wav", segment.id, speaker)
}

/// Packs the clips of a finished run into one gzip-compressed tar, in
/// segment order, and returns the archive bytes. Segments without a
/// clip (skipped lines) simply have no entry.
pub fn package_clips(results: &SynthesisResultSet, segments: &[Segment]) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for segment in segments {
        let clip = match results.get(segment.id) {
            Some(clip) => clip,
            None => continue,
        };
        let mut header = tar::Header::new_gnu();
        header.set_size(clip.wav.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, clip_entry_name(segment), clip.wav.as_slice())?;
    }

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}
