use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use inquire::{Select, Text};
use log::{info, warn};

use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::state::{ScriptProject, Tone, VoiceId};
use crate::services::archive::package_clips;
use crate::services::synthesis::run_synthesis;
use crate::services::tts::TtsClient;
use crate::utils::audio::merge_wav_clips;

const ACTION_SYNTHESIZE: &str = "Start synthesis";
const ACTION_VOICE: &str = "Change a speaker's voice";
const ACTION_RENAME: &str = "Rename a speaker";
const ACTION_TONE: &str = "Set a line's tone";
const ACTION_QUIT: &str = "Quit";

pub struct WorkflowManager {
    config: Config,
    tts: Box<dyn TtsClient>,
    storage: Arc<dyn Storage>,
    project: ScriptProject,
}

impl WorkflowManager {
    pub fn new(config: Config, tts: Box<dyn TtsClient>, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            tts,
            storage,
            project: ScriptProject::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let outcome = self.run_session().await;

        // The build folder keeps nothing after a session, whether it
        // ended cleanly or on an error.
        if self.project.results.is_some() {
            println!("Cleaning up preview clips...");
            if let Err(cleanup) = self.project.release_results(self.storage.as_ref()).await {
                warn!("Failed to remove preview clips: {:#}", cleanup);
            }
        }

        outcome
    }

    async fn run_session(&mut self) -> Result<()> {
        let script_path = self.config.script_file.clone();
        if !self.storage.exists(&script_path).await? {
            anyhow::bail!(
                "Script file '{}' not found. Create it with one 'Name: dialogue' line per utterance.",
                script_path
            );
        }

        let bytes = self.storage.read(&script_path).await?;
        let text = String::from_utf8(bytes)?;
        self.project.apply_script(&text);

        if self.project.segments.is_empty() {
            anyhow::bail!(
                "No speakable lines found in '{}'. Script lines look like 'Name: dialogue'.",
                script_path
            );
        }

        println!(
            "Loaded {} speakable lines from '{}'.",
            self.project.segments.len(),
            script_path
        );
        self.print_cast();

        if self.config.unattended {
            self.synthesize_and_package().await?;
        } else {
            loop {
                let action = Select::new(
                    "What next?",
                    vec![
                        ACTION_SYNTHESIZE,
                        ACTION_VOICE,
                        ACTION_RENAME,
                        ACTION_TONE,
                        ACTION_QUIT,
                    ],
                )
                .prompt();

                match action {
                    Ok(ACTION_SYNTHESIZE) => {
                        self.synthesize_and_package().await?;
                        println!("You can adjust the cast and synthesize again, or quit.");
                    }
                    Ok(ACTION_VOICE) => self.prompt_change_voice()?,
                    Ok(ACTION_RENAME) => self.prompt_rename_speaker().await?,
                    Ok(ACTION_TONE) => self.prompt_set_tone()?,
                    Ok(ACTION_QUIT) => break,
                    Ok(_) => unreachable!(),
                    Err(_) => {
                        println!("Error reading input, stopping.");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// One synthesis run end to end: supersede the previous run's
    /// clips, synthesize every line, then package the archive and the
    /// optional combined WAV into the output folder.
    async fn synthesize_and_package(&mut self) -> Result<()> {
        self.project.release_results(self.storage.as_ref()).await?;

        println!("Synthesizing {} lines...", self.project.segments.len());
        let results = run_synthesis(
            &self.project.segments,
            &self.project.speakers,
            self.tts.as_ref(),
            self.storage.as_ref(),
            &self.config.build_folder,
        )
        .await?;

        let produced = results.len();
        let skipped = self.project.segments.len() - produced;
        if skipped > 0 {
            println!("{} lines produced no audio and were skipped.", skipped);
        }

        // Hand the clips to the project before the fallible packaging
        // writes; the session cleanup owns them from here.
        self.project.results = Some(results);

        let stem = Path::new(&self.config.script_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("script");

        println!("Packaging clips...");
        if let Some(results) = &self.project.results {
            let archive = package_clips(results, &self.project.segments)?;
            let archive_path = format!("{}/{}_clips.tar.gz", self.config.output_folder, stem);
            self.storage.write(&archive_path, &archive).await?;
            println!("Wrote {} clips to '{}'.", produced, archive_path);

            if self.config.combine_clips {
                let clips: Vec<Vec<u8>> = self
                    .project
                    .segments
                    .iter()
                    .filter_map(|s| results.get(s.id))
                    .map(|c| c.wav.clone())
                    .collect();
                let combined = merge_wav_clips(&clips)?;
                let combined_path = format!("{}/{}.wav", self.config.output_folder, stem);
                self.storage.write(&combined_path, &combined).await?;
                println!("Wrote combined audio to '{}'.", combined_path);
            }
        }

        info!("Synthesis run finished with {} clips", produced);
        Ok(())
    }

    fn print_cast(&self) {
        println!("Cast:");
        for name in &self.project.speaker_order {
            if let Some(speaker) = self.project.speakers.get(name) {
                println!("  {} -> {}", speaker.name, speaker.voice);
            }
        }
    }

    fn prompt_pick_speaker(&self, message: &str) -> Result<String> {
        let names = self.project.speaker_order.clone();
        Ok(Select::new(message, names).prompt()?)
    }

    fn prompt_change_voice(&mut self) -> Result<()> {
        let name = self.prompt_pick_speaker("Which speaker?")?;
        let voice = Select::new("Which voice?", VoiceId::ALL.to_vec()).prompt()?;
        if let Some(speaker) = self.project.speakers.get_mut(&name) {
            speaker.voice = voice;
        }
        self.print_cast();
        Ok(())
    }

    /// Renames a speaker and, when the rename applies, releases any
    /// held clips: the rename swaps in a new segment set, and clips of
    /// the old one are superseded.
    async fn apply_rename(&mut self, old: &str, new: &str) -> Result<bool> {
        if !self.project.rename_speaker(old, new) {
            return Ok(false);
        }
        self.project.release_results(self.storage.as_ref()).await?;
        Ok(true)
    }

    async fn prompt_rename_speaker(&mut self) -> Result<()> {
        let old = self.prompt_pick_speaker("Rename which speaker?")?;
        let new = Text::new("New name:").prompt()?;
        if self.apply_rename(&old, &new).await? {
            self.print_cast();
        } else {
            println!("Rename not applied (empty, unchanged, or name already in use).");
        }
        Ok(())
    }

    fn prompt_set_tone(&mut self) -> Result<()> {
        let options: Vec<String> = self
            .project
            .segments
            .iter()
            .map(|s| {
                let preview: String = s.text.chars().take(40).collect();
                format!("{}: {} ({}): {}", s.id, s.speaker, s.tone, preview)
            })
            .collect();
        let selection = Select::new("Which line?", options).prompt()?;
        let id: usize = selection
            .split(':')
            .next()
            .unwrap_or_default()
            .trim()
            .parse()?;

        let tone = Select::new("Which tone?", Tone::ALL.to_vec()).prompt()?;
        if self.project.set_tone(id, tone) {
            println!("Line {} will be delivered {}.", id, tone);
        }
        Ok(())
    }
}
