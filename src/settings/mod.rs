use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RecognitionEngine {
    #[default]
    Default,
    Offline,
    CloudKeyed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomCommand {
    pub intent: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceCommandSettings {
    pub enabled: bool,
    pub recognition_engine: RecognitionEngine,
    pub language: String,
    pub activation_phrase: String,
    pub command_timeout_secs: u64,
    pub confidence_threshold: f32,
    pub api_key: Option<String>,
    pub custom_commands: Vec<CustomCommand>,
}

impl Default for VoiceCommandSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            recognition_engine: RecognitionEngine::Default,
            language: "en-US".to_string(),
            activation_phrase: "hey journal".to_string(),
            command_timeout_secs: 5,
            confidence_threshold: 0.6,
            api_key: None,
            custom_commands: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(std::io::Error),
    #[error("failed to write settings file: {0}")]
    Write(std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Parse(serde_json::Error),
    #[error("cannot resolve app data directory")]
    AppData,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self, SettingsError> {
        let proj_dirs =
            ProjectDirs::from("com", "voicelog", "journal").ok_or(SettingsError::AppData)?;
        let path = proj_dirs.config_dir().join("voice_commands.json");
        Ok(Self { path })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<VoiceCommandSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(VoiceCommandSettings::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(SettingsError::Read)?;
        serde_json::from_str(&raw).map_err(SettingsError::Parse)
    }

    pub fn save(&self, settings: &VoiceCommandSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SettingsError::Write)?;
        }
        let raw = serde_json::to_string_pretty(settings).map_err(SettingsError::Parse)?;
        fs::write(&self.path, raw).map_err(SettingsError::Write)?;
        Ok(())
    }
}
