//! Persisted user settings: a single JSON file holding the API key.
//!
//! ```json
//! { "apiKey": "AIza..." }
//! ```
//!
//! Loading is load-or-empty: a missing file is normal on first run and a
//! corrupt file is logged and treated as empty, so startup never fails on
//! settings alone.

use crate::error::PassportOcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "passport-ocr";

/// File name of the settings file.
pub const SETTINGS_FILE: &str = "settings.json";

/// Google AI Studio keys start with this prefix.
const GOOGLE_KEY_PREFIX: &str = "AIza";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.masked_key())
            .finish()
    }
}

impl Settings {
    /// `<config_dir>/passport-ocr/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from `path`, falling back to empty settings.
    ///
    /// # Errors
    /// Only when the file exists but cannot be read (permissions, I/O).
    pub fn load(path: &Path) -> Result<Self, PassportOcrError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PassportOcrError::SettingsReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        match serde_json::from_str::<Settings>(&text) {
            Ok(s) => Ok(s),
            Err(e) => {
                warn!("Failed to load settings from {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Write settings to `path` atomically (temp file in the same dir + rename).
    pub fn save(&self, path: &Path) -> Result<(), PassportOcrError> {
        let write_err = |detail: String| PassportOcrError::SettingsWriteFailed {
            path: path.to_path_buf(),
            detail,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| write_err(e.to_string()))?;

        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(&parent).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| write_err(e.to_string()))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Store a new API key (trimmed).
    ///
    /// Returns `false` when the key does not look like a Google AI key; it is
    /// stored anyway and the caller decides whether to warn.
    pub fn set_api_key(&mut self, key: &str) -> Result<bool, PassportOcrError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(PassportOcrError::InvalidConfig(
                "Please enter your API key".into(),
            ));
        }
        self.api_key = key.to_string();
        Ok(key.starts_with(GOOGLE_KEY_PREFIX))
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Key with everything but the first and last four characters hidden.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let s = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert!(!s.has_api_key());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        assert!(s.set_api_key("  AIzaSyExampleKey1234  ").unwrap());
        s.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"apiKey\""), "got: {raw}");
        assert_eq!(Settings::load(&path).unwrap().api_key, "AIzaSyExampleKey1234");
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut s = Settings::default();
        assert!(s.set_api_key("   ").is_err());
        assert!(!s.has_api_key());
    }

    #[test]
    fn non_google_key_is_flagged_but_kept() {
        let mut s = Settings::default();
        assert!(!s.set_api_key("sk-something").unwrap());
        assert_eq!(s.api_key, "sk-something");
    }

    #[test]
    fn debug_masks_key() {
        let s = Settings {
            api_key: "AIzaSyVerySecretValue".into(),
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("VerySecret"), "got: {dbg}");
        assert!(dbg.contains("AIza"));
        assert!(dbg.contains("alue"));
    }
}
