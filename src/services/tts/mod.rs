use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;

use crate::core::config::Config;
use crate::core::state::VoiceId;

pub mod gemini;

/// One call per segment. The prompt is the dialogue text, possibly
/// prefixed with a spoken delivery instruction.
///
/// Returns the base64-encoded raw PCM payload, or `None` when the
/// backend answered without audio (a declined or filtered prompt).
/// Transport and API failures are errors.
#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn synthesize(&self, prompt: &str, voice: VoiceId) -> Result<Option<String>>;
}

pub fn create_tts_client(config: &Config) -> Result<Box<dyn TtsClient>> {
    info!(
        "Initializing TTS client for provider: {}",
        config.audio.provider
    );
    match config.audio.provider.as_str() {
        "gemini" => {
            let gemini_config = config
                .audio
                .gemini
                .clone()
                .ok_or_else(|| anyhow!("Gemini TTS config missing"))?;
            Ok(Box::new(gemini::GeminiTtsClient::new(gemini_config)))
        }
        _ => Err(anyhow!("Unknown TTS provider: {}", config.audio.provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AudioConfig;

    fn config_with_provider(provider: &str) -> Config {
        serde_yaml_ng::from_str::<Config>("audio: {}")
            .map(|mut c| {
                c.audio = AudioConfig {
                    provider: provider.to_string(),
                    gemini: Some(gemini::GeminiTtsConfig {
                        api_key: "k".to_string(),
                        model: "m".to_string(),
                    }),
                };
                c
            })
            .unwrap()
    }

    #[test]
    fn factory_accepts_the_gemini_provider() {
        assert!(create_tts_client(&config_with_provider("gemini")).is_ok());
    }

    #[test]
    fn factory_rejects_unknown_providers() {
        let err = create_tts_client(&config_with_provider("espeak"))
            .err()
            .expect("unknown provider must be refused");
        assert!(err.to_string().contains("Unknown TTS provider"));
    }

    #[test]
    fn factory_requires_provider_settings() {
        let mut config = config_with_provider("gemini");
        config.audio.gemini = None;

        let err = create_tts_client(&config)
            .err()
            .expect("missing provider settings must be refused");
        assert!(err.to_string().contains("config missing"));
    }
}
