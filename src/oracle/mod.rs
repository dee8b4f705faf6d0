pub mod client;
pub mod gemini;
pub mod settings;

pub use client::{
    extract_coordinate_move, play_ticket, suggest_and_play, MoveOracle, MoveSuggestionClient, OracleRequest,
};
pub use gemini::GeminiOracle;
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore, DEFAULT_MODEL, MODEL_CHOICES};
