use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::editor::DEFAULT_HISTORY_CAPACITY;
use crate::recognition::gateway::MAX_CANDIDATES;

pub const CONFIG_FILE_NAME: &str = "config.json";

const MIN_UNDO_CAPACITY: usize = 1;
const MAX_UNDO_CAPACITY: usize = 500;
const MIN_MAX_SUGGESTIONS: usize = 1;
const MAX_MAX_SUGGESTIONS: usize = MAX_CANDIDATES;
const DEFAULT_MAX_SUGGESTIONS: usize = MAX_CANDIDATES;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(default = "default_language_tag")]
    pub language_tag: String,
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_suggestion_suffix")]
    pub suggestion_suffix: String,
    #[serde(default = "default_discard_stale_results")]
    pub discard_stale_results: bool,
    #[serde(default = "default_display_locale")]
    pub display_locale: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language_tag: default_language_tag(),
            undo_capacity: default_undo_capacity(),
            max_suggestions: default_max_suggestions(),
            suggestion_suffix: default_suggestion_suffix(),
            discard_stale_results: default_discard_stale_results(),
            display_locale: default_display_locale(),
        }
    }
}

fn default_language_tag() -> String {
    "en".to_string()
}

fn default_undo_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

fn default_suggestion_suffix() -> String {
    " ".to_string()
}

fn default_discard_stale_results() -> bool {
    true
}

fn default_display_locale() -> String {
    "en-US".to_string()
}

impl SessionSettings {
    /// Reads settings from `path`. A missing file yields defaults; bad values are reset.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!(path = %path.display(), "settings file not found; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str::<Self>(&content)?;
        Ok(settings.normalized())
    }

    /// Validates and writes pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<Self, SettingsError> {
        let validated = self.clone().validated()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let serialized = serde_json::to_string_pretty(&validated)?;
        fs::write(path, serialized)?;
        info!(path = %path.display(), "settings saved");
        Ok(validated)
    }

    fn normalized(mut self) -> Self {
        self.language_tag = self.language_tag.trim().to_string();
        if self.language_tag.is_empty() {
            warn!("loaded language tag is empty; resetting to default");
            self.language_tag = default_language_tag();
        }

        if !(MIN_UNDO_CAPACITY..=MAX_UNDO_CAPACITY).contains(&self.undo_capacity) {
            warn!(
                undo_capacity = self.undo_capacity,
                "loaded undo capacity is out of range; resetting to default"
            );
            self.undo_capacity = default_undo_capacity();
        }

        if !(MIN_MAX_SUGGESTIONS..=MAX_MAX_SUGGESTIONS).contains(&self.max_suggestions) {
            warn!(
                max_suggestions = self.max_suggestions,
                "loaded max suggestions is out of range; resetting to default"
            );
            self.max_suggestions = default_max_suggestions();
        }

        self.display_locale = self.display_locale.trim().to_string();
        if self.display_locale.is_empty() {
            self.display_locale = default_display_locale();
        }

        self
    }

    fn validated(mut self) -> Result<Self, SettingsError> {
        self.language_tag = self.language_tag.trim().to_string();
        if self.language_tag.is_empty() {
            return Err(SettingsError::Invalid(
                "languageTag cannot be empty".to_string(),
            ));
        }

        if !(MIN_UNDO_CAPACITY..=MAX_UNDO_CAPACITY).contains(&self.undo_capacity) {
            return Err(SettingsError::Invalid(format!(
                "undoCapacity must be between {MIN_UNDO_CAPACITY} and {MAX_UNDO_CAPACITY}"
            )));
        }

        if !(MIN_MAX_SUGGESTIONS..=MAX_MAX_SUGGESTIONS).contains(&self.max_suggestions) {
            return Err(SettingsError::Invalid(format!(
                "maxSuggestions must be between {MIN_MAX_SUGGESTIONS} and {MAX_MAX_SUGGESTIONS}"
            )));
        }

        self.display_locale = self.display_locale.trim().to_string();
        if self.display_locale.is_empty() {
            return Err(SettingsError::Invalid(
                "displayLocale cannot be empty".to_string(),
            ));
        }

        Ok(self)
    }
}
