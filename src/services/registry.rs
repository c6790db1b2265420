use crate::core::state::{Speaker, SpeakerTable, VoiceId};

/// Produces the speaker table for a freshly parsed script.
///
/// Names that survive keep their `Speaker` untouched, so manual voice
/// choices are never reset by an edit. New names draw from the fixed
/// voice wheel by their position in the new ordering, wrapping around
/// when the cast outgrows it; a clash with a carried-over assignment
/// is accepted. Names that disappeared are dropped, and a name that
/// later returns counts as new.
pub fn reconcile_speakers(previous: &SpeakerTable, order: &[String]) -> SpeakerTable {
    let mut next = SpeakerTable::default();
    for (position, name) in order.iter().enumerate() {
        let speaker = match previous.get(name) {
            Some(existing) => existing.clone(),
            None => Speaker {
                name: name.clone(),
                voice: VoiceId::ALL[position % VoiceId::ALL.len()],
            },
        };
        next.insert(speaker);
    }
    next
}
