use std::path::Path;

use super::LayerStack;
use crate::error::ConfigError;

impl LayerStack {
    /// Parses a stack from JSON of the form
    /// `{"layers": [{"layer": "core", "material": "si", "z_min": 0.0, "z_max": 0.22}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON; invalid entries
    /// surface as parse errors carrying the validation message.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON stack description from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes the stack to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
