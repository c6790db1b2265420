use std::sync::Arc;

use anyhow::Result;
use script2speech::core::config::Config;
use script2speech::core::io::NativeStorage;
use script2speech::services::tts::create_tts_client;
use script2speech::services::workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with a Gemini API key under audio.gemini.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let tts = create_tts_client(&config)?;
    let storage = Arc::new(NativeStorage::new());

    let mut manager = WorkflowManager::new(config, tts, storage);
    if let Err(e) = manager.run().await {
        let message = format!("{:#}", e);
        if message.contains("RESOURCE_EXHAUSTED") || message.contains("429") {
            eprintln!("The voice backend is rate limiting this key. Wait a minute and run again.");
        }
        return Err(e);
    }

    Ok(())
}
