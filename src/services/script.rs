use std::collections::HashMap;

use crate::core::state::{Segment, Tone};

/// Output of one parsing pass: the speakable segments plus the
/// distinct speaker names in order of first appearance.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedScript {
    pub segments: Vec<Segment>,
    pub speaker_order: Vec<String>,
}

/// Derives segments from raw script text.
///
/// One utterance per line, `Name: dialogue`, split at the first colon.
/// Blank lines and lines without a colon produce nothing but still
/// occupy a line index, so segments keep their ids across edits that
/// leave their line in place. Tones carry over from `previous` for ids
/// that still exist; everything else starts neutral.
pub fn parse_script(text: &str, previous: &[Segment]) -> ParsedScript {
    let old_tones: HashMap<usize, Tone> = previous.iter().map(|s| (s.id, s.tone)).collect();

    let mut parsed = ParsedScript::default();
    for (id, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (name, dialogue) = match line.split_once(':') {
            Some(parts) => parts,
            // Stage directions and the like are skipped, not an error.
            None => continue,
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        if !parsed.speaker_order.iter().any(|n| n == name) {
            parsed.speaker_order.push(name.to_string());
        }
        parsed.segments.push(Segment {
            id,
            speaker: name.to_string(),
            text: dialogue.trim().to_string(),
            tone: old_tones.get(&id).copied().unwrap_or_default(),
        });
    }
    parsed
}

/// Rewrites the speaker-name portion of every cue line whose trimmed
/// name equals `old`, keeping the surrounding whitespace and the
/// dialogue bytes verbatim. Lines that do not parse as `Name: dialogue`
/// are left untouched.
pub fn rename_speaker_in_script(text: &str, old: &str, new: &str) -> String {
    text.split('\n')
        .map(|line| match line.split_once(':') {
            Some((head, rest)) if head.trim() == old => {
                let lead = &head[..head.len() - head.trim_start().len()];
                let trail = &head[head.trim_end().len()..];
                format!("{}{}{}:{}", lead, new, trail, rest)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_id_is_the_raw_line_index() {
        let text = "Bob: one\nAlice: two\nBob: three\nAlice: I found it!";
        let parsed = parse_script(text, &[]);

        assert_eq!(parsed.segments.len(), 4);
        assert_eq!(
            parsed.segments[3],
            Segment {
                id: 3,
                speaker: "Alice".to_string(),
                text: "I found it!".to_string(),
                tone: Tone::Neutral,
            }
        );
    }

    #[test]
    fn skipped_lines_still_occupy_an_index() {
        let text = "Alice: one\n\n(a door slams)\nBob: two";
        let parsed = parse_script(text, &[]);

        let ids: Vec<usize> = parsed.segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 3]);
        assert_eq!(parsed.speaker_order, vec!["Alice", "Bob"]);
    }

    #[test]
    fn splits_at_the_first_colon_only() {
        let parsed = parse_script("Narrator: He said: run!", &[]);

        assert_eq!(parsed.segments[0].speaker, "Narrator");
        assert_eq!(parsed.segments[0].text, "He said: run!");
    }

    #[test]
    fn trims_names_and_dialogue() {
        let parsed = parse_script("  Old Man  :   well now   ", &[]);

        assert_eq!(parsed.segments[0].speaker, "Old Man");
        assert_eq!(parsed.segments[0].text, "well now");
    }

    #[test]
    fn drops_lines_with_an_empty_name() {
        let parsed = parse_script(": orphaned\n   : also orphaned\nBob: kept", &[]);

        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].speaker, "Bob");
    }

    #[test]
    fn speaker_order_lists_each_name_once() {
        let text = "Bob: a\nAlice: b\nBob: c\nCarol: d\nAlice: e";
        let parsed = parse_script(text, &[]);

        assert_eq!(parsed.speaker_order, vec!["Bob", "Alice", "Carol"]);
    }

    #[test]
    fn reparsing_the_same_text_is_a_fixpoint() {
        let text = "Bob: a\n\nAlice: b";
        let first = parse_script(text, &[]);
        let second = parse_script(text, &first.segments);

        assert_eq!(first, second);
    }

    #[test]
    fn tones_follow_the_line_index_across_edits() {
        let mut segments = parse_script("Bob: a\nAlice: b", &[]).segments;
        segments[1].tone = Tone::Sad;

        let parsed = parse_script("Bob: reworded\nAlice: b\nBob: new", &segments);

        assert_eq!(parsed.segments[0].tone, Tone::Neutral);
        assert_eq!(parsed.segments[1].tone, Tone::Sad);
        assert_eq!(parsed.segments[2].tone, Tone::Neutral);
    }

    #[test]
    fn rename_preserves_whitespace_around_the_name() {
        let text = "  Bob : hi\nBob:   spaced out\nAlice: no";
        let renamed = rename_speaker_in_script(text, "Bob", "Robert");

        assert_eq!(renamed, "  Robert : hi\nRobert:   spaced out\nAlice: no");
    }

    #[test]
    fn rename_ignores_near_matches_and_prose() {
        let text = "Bobby: mine\nBob says hi\nBob: mine too";
        let renamed = rename_speaker_in_script(text, "Bob", "Robert");

        assert_eq!(renamed, "Bobby: mine\nBob says hi\nRobert: mine too");
    }

    #[test]
    fn rename_keeps_unrelated_lines_byte_for_byte() {
        let text = "\nAlice: one\n\nBob: two\n";
        let renamed = rename_speaker_in_script(text, "Carol", "Carl");

        assert_eq!(renamed, text);
    }
}
