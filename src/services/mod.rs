pub mod archive;
pub mod registry;
pub mod script;
pub mod synthesis;
pub mod tts;
pub mod workflow;
