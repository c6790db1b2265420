use std::collections::HashMap;
use std::fmt;

use anyhow::Result;

use crate::core::io::Storage;
use crate::services::registry::reconcile_speakers;
use crate::services::script::{parse_script, rename_speaker_in_script};

/// Delivery tone for a single line. Anything but `Neutral` is spelled
/// out to the voice model as a natural-language instruction in front
/// of the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Cheerful,
    Sad,
    Angry,
    Excited,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Neutral,
        Tone::Cheerful,
        Tone::Sad,
        Tone::Angry,
        Tone::Excited,
    ];

    /// Instruction prepended to the dialogue before synthesis.
    /// `Neutral` sends the text as written.
    pub fn instruction_prefix(&self) -> Option<&'static str> {
        match self {
            Tone::Neutral => None,
            Tone::Cheerful => Some("Say cheerfully: "),
            Tone::Sad => Some("Say sadly: "),
            Tone::Angry => Some("Say angrily: "),
            Tone::Excited => Some("Say with excitement: "),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Neutral => "Neutral",
            Tone::Cheerful => "Cheerful",
            Tone::Sad => "Sad",
            Tone::Angry => "Angry",
            Tone::Excited => "Excited",
        };
        write!(f, "{}", name)
    }
}

/// One of the prebuilt voices the synthesis backend ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceId {
    Zephyr,
    Puck,
    Charon,
    Kore,
    Fenrir,
    Leda,
    Orus,
    Aoede,
}

impl VoiceId {
    /// Assignment wheel for new speakers, in rotation order.
    pub const ALL: [VoiceId; 8] = [
        VoiceId::Zephyr,
        VoiceId::Puck,
        VoiceId::Charon,
        VoiceId::Kore,
        VoiceId::Fenrir,
        VoiceId::Leda,
        VoiceId::Orus,
        VoiceId::Aoede,
    ];

    /// Voice name as the backend API expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceId::Zephyr => "Zephyr",
            VoiceId::Puck => "Puck",
            VoiceId::Charon => "Charon",
            VoiceId::Kore => "Kore",
            VoiceId::Fenrir => "Fenrir",
            VoiceId::Leda => "Leda",
            VoiceId::Orus => "Orus",
            VoiceId::Aoede => "Aoede",
        }
    }

    /// Short character sketch shown next to the name in pickers.
    pub fn style(&self) -> &'static str {
        match self {
            VoiceId::Zephyr => "Bright",
            VoiceId::Puck => "Upbeat",
            VoiceId::Charon => "Informative",
            VoiceId::Kore => "Firm",
            VoiceId::Fenrir => "Excitable",
            VoiceId::Leda => "Youthful",
            VoiceId::Orus => "Firm",
            VoiceId::Aoede => "Breezy",
        }
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.style())
    }
}

/// One speakable line of the script.
///
/// The id is the zero-based index of the line in the raw text, not a
/// running counter, so a segment keeps its id across edits that leave
/// its line in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: usize,
    pub speaker: String,
    pub text: String,
    pub tone: Tone,
}

/// A named character and the voice currently assigned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Speaker {
    pub name: String,
    pub voice: VoiceId,
}

/// Current voice assignments, keyed by speaker name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerTable {
    pub speakers: HashMap<String, Speaker>,
}

impl SpeakerTable {
    pub fn get(&self, name: &str) -> Option<&Speaker> {
        self.speakers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Speaker> {
        self.speakers.get_mut(name)
    }

    pub fn insert(&mut self, speaker: Speaker) {
        self.speakers.insert(speaker.name.clone(), speaker);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.speakers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }
}

/// A finished clip: the WAV bytes plus the path of the preview file
/// written for it.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub segment_id: usize,
    pub wav: Vec<u8>,
    pub clip_path: String,
}

/// Clips produced by one synthesis run.
///
/// The set owns its preview files. `release` deletes them and empties
/// the set, and must run before the clips of a newer run land, because
/// clip paths are keyed by segment id and would otherwise collide.
#[derive(Debug, Default)]
pub struct SynthesisResultSet {
    clips: Vec<GeneratedAudio>,
}

impl SynthesisResultSet {
    pub fn push(&mut self, clip: GeneratedAudio) {
        self.clips.push(clip);
    }

    pub fn get(&self, segment_id: usize) -> Option<&GeneratedAudio> {
        self.clips.iter().find(|c| c.segment_id == segment_id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Deletes every preview file and empties the set.
    pub async fn release(&mut self, storage: &dyn Storage) -> Result<()> {
        for clip in self.clips.drain(..) {
            storage.delete(&clip.clip_path).await?;
        }
        Ok(())
    }
}

/// Everything a session knows about one script: the raw text, the
/// segments parsed from it, the voice cast, and the clips of the most
/// recent run.
#[derive(Default)]
pub struct ScriptProject {
    pub script_text: String,
    pub segments: Vec<Segment>,
    pub speaker_order: Vec<String>,
    pub speakers: SpeakerTable,
    pub results: Option<SynthesisResultSet>,
}

impl ScriptProject {
    /// Replaces the script text and re-derives segments and cast.
    ///
    /// Tones carry over for line indices that still parse, manual
    /// voice choices survive for names that still appear, and speakers
    /// no longer present are dropped.
    pub fn apply_script(&mut self, text: &str) {
        let parsed = parse_script(text, &self.segments);
        self.speakers = reconcile_speakers(&self.speakers, &parsed.speaker_order);
        self.segments = parsed.segments;
        self.speaker_order = parsed.speaker_order;
        self.script_text = text.to_string();
    }

    /// Sets the tone of the segment with the given id. Returns false
    /// when no such segment exists.
    pub fn set_tone(&mut self, id: usize, tone: Tone) -> bool {
        match self.segments.iter_mut().find(|s| s.id == id) {
            Some(segment) => {
                segment.tone = tone;
                true
            }
            None => false,
        }
    }

    /// Renames a speaker by rewriting their cue lines in the script,
    /// then re-applying the text. The rename is refused (returning
    /// false, with nothing changed) when the new name trims to empty,
    /// equals the old one, or already belongs to another speaker.
    pub fn rename_speaker(&mut self, old: &str, new: &str) -> bool {
        let new = new.trim();
        if new.is_empty() || new == old || self.speakers.contains(new) {
            return false;
        }
        if !self.speakers.contains(old) {
            return false;
        }
        let rewritten = rename_speaker_in_script(&self.script_text, old, new);
        self.apply_script(&rewritten);
        true
    }

    /// Drops the clips of the previous run, deleting their preview
    /// files.
    pub async fn release_results(&mut self, storage: &dyn Storage) -> Result<()> {
        if let Some(mut held) = self.results.take() {
            held.release(storage).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStorage;

    fn project_with(text: &str) -> ScriptProject {
        let mut project = ScriptProject::default();
        project.apply_script(text);
        project
    }

    #[test]
    fn tone_prefixes_are_spoken_instructions() {
        assert_eq!(Tone::Neutral.instruction_prefix(), None);
        assert_eq!(Tone::Cheerful.instruction_prefix(), Some("Say cheerfully: "));
        assert_eq!(Tone::Sad.instruction_prefix(), Some("Say sadly: "));
        assert_eq!(Tone::Angry.instruction_prefix(), Some("Say angrily: "));
        assert_eq!(
            Tone::Excited.instruction_prefix(),
            Some("Say with excitement: ")
        );
    }

    #[test]
    fn voice_wheel_has_eight_distinct_names() {
        let mut names: Vec<&str> = VoiceId::ALL.iter().map(|v| v.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
        assert_eq!(VoiceId::Zephyr.as_str(), "Zephyr");
        assert_eq!(VoiceId::Aoede.to_string(), "Aoede (Breezy)");
    }

    #[test]
    fn set_tone_matches_on_id_not_position() {
        let mut project = project_with("\n\nBob: late start\nAlice: reply");

        assert!(project.set_tone(2, Tone::Angry));
        assert_eq!(project.segments[0].tone, Tone::Angry);
        assert_eq!(project.segments[1].tone, Tone::Neutral);
        assert!(!project.set_tone(99, Tone::Sad));
    }

    #[test]
    fn manual_voice_choice_survives_an_edit() {
        let mut project = project_with("Bob: hello\nAlice: hi");
        project.speakers.get_mut("Bob").unwrap().voice = VoiceId::Orus;

        project.apply_script("Bob: hello again\nAlice: hi\nCarol: new here");

        assert_eq!(project.speakers.get("Bob").unwrap().voice, VoiceId::Orus);
        assert_eq!(project.speaker_order, vec!["Bob", "Alice", "Carol"]);
    }

    #[test]
    fn tones_carry_over_by_line_index() {
        let mut project = project_with("Bob: hello\nAlice: hi");
        project.set_tone(1, Tone::Excited);

        project.apply_script("Bob: hello\nAlice: hi there\nBob: more");

        assert_eq!(project.segments[1].tone, Tone::Excited);
        assert_eq!(project.segments[2].tone, Tone::Neutral);
    }

    #[test]
    fn rename_rewrites_script_and_recasts() {
        let mut project = project_with("Bob: hello\nAlice: hi\nBob: bye");

        assert!(project.rename_speaker("Bob", "Robert"));
        assert_eq!(project.script_text, "Robert: hello\nAlice: hi\nRobert: bye");
        assert!(project.speakers.contains("Robert"));
        assert!(!project.speakers.contains("Bob"));
        assert_eq!(project.segments[0].speaker, "Robert");
    }

    #[test]
    fn rename_refusals_change_nothing() {
        let mut project = project_with("Bob: hello\nAlice: hi");
        let before = project.script_text.clone();

        assert!(!project.rename_speaker("Bob", "   "));
        assert!(!project.rename_speaker("Bob", "Bob"));
        assert!(!project.rename_speaker("Bob", "Alice"));
        assert!(!project.rename_speaker("Nobody", "Somebody"));

        assert_eq!(project.script_text, before);
        assert!(project.speakers.contains("Bob"));
        assert!(project.speakers.contains("Alice"));
    }

    #[test]
    fn rename_trims_the_new_name() {
        let mut project = project_with("Bob: hello");

        assert!(project.rename_speaker("Bob", "  Robert  "));
        assert_eq!(project.script_text, "Robert: hello");
        assert!(project.speakers.contains("Robert"));
    }

    #[tokio::test]
    async fn release_results_deletes_preview_files() {
        let storage = MemoryStorage::new();
        storage.write("build/clip_0000.wav", b"a").await.unwrap();
        storage.write("build/clip_0001.wav", b"b").await.unwrap();

        let mut set = SynthesisResultSet::default();
        set.push(GeneratedAudio {
            segment_id: 0,
            wav: b"a".to_vec(),
            clip_path: "build/clip_0000.wav".to_string(),
        });
        set.push(GeneratedAudio {
            segment_id: 1,
            wav: b"b".to_vec(),
            clip_path: "build/clip_0001.wav".to_string(),
        });

        let mut project = ScriptProject::default();
        project.results = Some(set);
        project.release_results(&storage).await.unwrap();

        assert!(project.results.is_none());
        assert!(storage.paths().is_empty());
    }
}
