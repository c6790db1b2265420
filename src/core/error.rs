use thiserror::Error;

/// Failures that end (or prevent) a synthesis run.
///
/// These travel inside `anyhow::Error` so call sites can attach context, while
/// tests and the CLI can still recover the variant with `downcast_ref`.
/// Transport failures from the speech provider are not enumerated here; they
/// stay plain `anyhow` errors carrying the provider's own message.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The provider returned an inline audio payload that is not valid base64.
    /// This is a broken wire contract, so the whole run is aborted rather than
    /// skipping the segment the way an absent payload is skipped.
    #[error("audio payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The script produced no segments, or no speakers are known. A run is
    /// never started in this state.
    #[error("nothing to synthesize: the script has no speakable lines")]
    EmptyInput,

    /// Every segment was processed but none yielded audio. Treated as a failed
    /// run even though individual requests may have succeeded.
    #[error("the run finished without producing any audio")]
    NoAudioProduced,
}
