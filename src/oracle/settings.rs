//! Player settings: the API credential and the model used for each side.
//!
//! Settings live behind a [`SettingsStore`]. Reads return the last saved
//! value; a save replaces the whole record and is seen by later reads only.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::error::Result;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

pub const MODEL_CHOICES: [&str; 3] = ["gemini-2.0-flash-exp", "gemini-1.5-flash", "gemini-1.5-pro"];

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub white_model: String,
    #[serde(default = "default_model")]
    pub black_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: String::new(),
            white_model: default_model(),
            black_model: default_model(),
        }
    }
}

impl Settings {
    /// The configured credential, if any
    pub fn credential(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    pub fn model_for(&self, side: Color) -> &str {
        match side {
            Color::White => &self.white_model,
            Color::Black => &self.black_model,
        }
    }

    /// Credential with all but the last four characters hidden
    pub fn masked_key(&self) -> String {
        match self.credential() {
            None => "(not set)".to_string(),
            Some(key) => {
                let chars: Vec<char> = key.chars().collect();
                let visible = chars.len().saturating_sub(4);
                let tail: String = chars[visible..].iter().collect();
                format!("{}{}", "*".repeat(visible), tail)
            }
        }
    }

    pub fn is_known_model(model: &str) -> bool {
        MODEL_CHOICES.contains(&model)
    }
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings>;

    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: RwLock<Settings>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        MemoryStore {
            current: RwLock::new(settings),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.current.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        Ok(())
    }
}

/// Settings persisted as a JSON file, cached after the first read
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl JsonFileStore {
    /// Open the store; a missing file yields default settings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let settings: Settings = serde_json::from_str(&text)?;
            debug!("Loaded settings from {}", path.display());
            settings
        } else {
            info!("No settings file at {}, using defaults", path.display());
            Settings::default()
        };

        Ok(JsonFileStore {
            path,
            current: RwLock::new(settings),
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.current.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text)?;
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
