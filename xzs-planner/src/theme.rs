//! Theme selection and persistence
//!
//! The selected theme id lives under a fixed key in `preferences.json` in the
//! data folder. Retired theme ids are migrated to their replacements on load.
//! [`ThemeStore`] is built once at startup and handed to the view layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::error::{PlannerError, Result};

/// Key of the selected theme in durable client storage
pub const THEME_STORAGE_KEY: &str = "xzstudio-theme";

/// File in the data folder holding client preferences
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Retired theme ids and the themes that replaced them
const LEGACY_THEME_MAP: &[(&str, ThemeId)] = &[
    ("forest", ThemeId::Rosegold),
    ("dusk", ThemeId::Sand),
    ("latte", ThemeId::Aurora),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Space,
    Midnight,
    Rosegold,
    Sand,
    Aurora,
    Amber,
}

impl ThemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Space => "space",
            ThemeId::Midnight => "midnight",
            ThemeId::Rosegold => "rosegold",
            ThemeId::Sand => "sand",
            ThemeId::Aurora => "aurora",
            ThemeId::Amber => "amber",
        }
    }

    /// Class name the view layer applies to its root element
    pub fn css_class(&self) -> String {
        format!("theme-{}", self.as_str())
    }

    /// Resolve a stored value: current id, then legacy id, then default
    pub fn from_stored(raw: Option<&str>) -> ThemeId {
        let Some(raw) = raw else {
            return ThemeId::default();
        };

        if let Ok(theme) = raw.parse() {
            return theme;
        }

        LEGACY_THEME_MAP
            .iter()
            .find(|(legacy, _)| *legacy == raw)
            .map(|(_, theme)| *theme)
            .unwrap_or_default()
    }

    pub fn info(&self) -> &'static ThemeInfo {
        THEMES
            .iter()
            .find(|t| t.id == *self)
            .unwrap_or(&THEMES[0])
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = PlannerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        THEMES
            .iter()
            .map(|t| t.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PlannerError::Validation(format!("Unknown theme: {}", s)))
    }
}

/// Display metadata for a theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInfo {
    pub id: ThemeId,
    pub name: &'static str,
    pub emoji: &'static str,
    /// Background preview color
    pub preview_bg: &'static str,
    /// Accent preview color
    pub preview_accent: &'static str,
}

pub static THEMES: [ThemeInfo; 6] = [
    ThemeInfo {
        id: ThemeId::Space,
        name: "Deep space",
        emoji: "🌑",
        preview_bg: "#1a1a1a",
        preview_accent: "#e8993a",
    },
    ThemeInfo {
        id: ThemeId::Midnight,
        name: "Midnight blue",
        emoji: "🌙",
        preview_bg: "#0f1729",
        preview_accent: "#d4a853",
    },
    ThemeInfo {
        id: ThemeId::Rosegold,
        name: "Rose gold",
        emoji: "🌹",
        preview_bg: "#1c1618",
        preview_accent: "#e8b4b8",
    },
    ThemeInfo {
        id: ThemeId::Sand,
        name: "Warm sand",
        emoji: "🏜️",
        preview_bg: "#1a1714",
        preview_accent: "#dfc089",
    },
    ThemeInfo {
        id: ThemeId::Aurora,
        name: "Aurora grey",
        emoji: "❄️",
        preview_bg: "#141618",
        preview_accent: "#7dd3fc",
    },
    ThemeInfo {
        id: ThemeId::Amber,
        name: "Amber",
        emoji: "🌅",
        preview_bg: "#1a1610",
        preview_accent: "#f59e0b",
    },
];

/// Durable storage for the selected theme
pub trait ThemeStorage: Send + Sync {
    /// Stored theme, migrated and defaulted
    fn load(&self) -> ThemeId;

    fn save(&self, theme: ThemeId) -> Result<()>;
}

/// Theme persisted in `<data_folder>/preferences.json`
///
/// Other keys in the preferences file are preserved on save.
pub struct FileThemeStorage {
    path: PathBuf,
}

impl FileThemeStorage {
    pub fn new(data_folder: &Path) -> Self {
        Self {
            path: data_folder.join(PREFERENCES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_preferences(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PlannerError::Storage(format!("Read {} failed: {}", self.path.display(), e)))?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PlannerError::Storage(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(PlannerError::Storage(format!(
                "Parse {} failed: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl ThemeStorage for FileThemeStorage {
    fn load(&self) -> ThemeId {
        match self.read_preferences() {
            Ok(prefs) => ThemeId::from_stored(prefs.get(THEME_STORAGE_KEY).and_then(Value::as_str)),
            Err(e) => {
                warn!("{}; using default theme", e);
                ThemeId::default()
            }
        }
    }

    fn save(&self, theme: ThemeId) -> Result<()> {
        // An unreadable file is replaced rather than blocking the save
        let mut prefs = self.read_preferences().unwrap_or_default();
        prefs.insert(
            THEME_STORAGE_KEY.to_string(),
            Value::String(theme.as_str().to_string()),
        );

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlannerError::Storage(format!("Create {} failed: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(prefs))
            .map_err(|e| PlannerError::Storage(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .and_then(|_| std::fs::rename(&tmp_path, &self.path))
            .map_err(|e| PlannerError::Storage(format!("Write {} failed: {}", self.path.display(), e)))
    }
}

/// In-memory storage holding the raw stored string
#[derive(Default)]
pub struct InMemoryThemeStorage {
    raw: Mutex<Option<String>>,
}

impl InMemoryThemeStorage {
    /// Storage pre-seeded with a raw value (which may be a legacy id)
    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: Mutex::new(Some(raw.to_string())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }
}

impl ThemeStorage for InMemoryThemeStorage {
    fn load(&self) -> ThemeId {
        ThemeId::from_stored(self.raw().as_deref())
    }

    fn save(&self, theme: ThemeId) -> Result<()> {
        let mut raw = self
            .raw
            .lock()
            .map_err(|_| PlannerError::Storage("theme storage lock poisoned".to_string()))?;
        *raw = Some(theme.as_str().to_string());
        Ok(())
    }
}

/// Selected theme for the running application
pub struct ThemeStore {
    current: ThemeId,
    storage: Box<dyn ThemeStorage>,
}

impl ThemeStore {
    /// Load the stored theme and write back the resolved id
    ///
    /// Writing back replaces a legacy or unknown stored value with the
    /// resolved one.
    pub fn new(storage: Box<dyn ThemeStorage>) -> Self {
        let current = storage.load();
        if let Err(e) = storage.save(current) {
            warn!("Failed to persist theme {}: {}", current, e);
        }
        Self { current, storage }
    }

    pub fn current(&self) -> ThemeId {
        self.current
    }

    pub fn css_class(&self) -> String {
        self.current.css_class()
    }

    pub fn themes(&self) -> &'static [ThemeInfo] {
        &THEMES
    }

    /// Select and persist a theme; on storage failure the selection still changes
    pub fn set_theme(&mut self, theme: ThemeId) -> Result<()> {
        self.current = theme;
        info!(theme = %theme, "Theme selected");
        self.storage.save(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Storage wrapper so tests can inspect what the store wrote
    struct SharedStorage(Arc<InMemoryThemeStorage>);

    impl ThemeStorage for SharedStorage {
        fn load(&self) -> ThemeId {
            self.0.load()
        }

        fn save(&self, theme: ThemeId) -> Result<()> {
            self.0.save(theme)
        }
    }

    #[test]
    fn test_from_stored_current_ids() {
        for info in THEMES.iter() {
            assert_eq!(ThemeId::from_stored(Some(info.id.as_str())), info.id);
        }
    }

    #[test]
    fn test_from_stored_legacy_ids() {
        assert_eq!(ThemeId::from_stored(Some("forest")), ThemeId::Rosegold);
        assert_eq!(ThemeId::from_stored(Some("dusk")), ThemeId::Sand);
        assert_eq!(ThemeId::from_stored(Some("latte")), ThemeId::Aurora);
    }

    #[test]
    fn test_from_stored_unknown_or_missing_defaults() {
        assert_eq!(ThemeId::from_stored(Some("neon")), ThemeId::Space);
        assert_eq!(ThemeId::from_stored(None), ThemeId::Space);
    }

    #[test]
    fn test_css_class() {
        assert_eq!(ThemeId::Midnight.css_class(), "theme-midnight");
    }

    #[test]
    fn test_store_migrates_legacy_value() {
        let storage = Arc::new(InMemoryThemeStorage::with_raw("forest"));
        let store = ThemeStore::new(Box::new(SharedStorage(storage.clone())));

        assert_eq!(store.current(), ThemeId::Rosegold);
        assert_eq!(storage.raw().as_deref(), Some("rosegold"));
    }

    #[test]
    fn test_store_set_theme_persists() {
        let storage = Arc::new(InMemoryThemeStorage::default());
        let mut store = ThemeStore::new(Box::new(SharedStorage(storage.clone())));
        assert_eq!(store.current(), ThemeId::Space);

        store.set_theme(ThemeId::Amber).unwrap();
        assert_eq!(store.current(), ThemeId::Amber);
        assert_eq!(storage.raw().as_deref(), Some("amber"));
    }

    #[test]
    fn test_file_storage_round_trip_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let prefs_path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(&prefs_path, r#"{"other-key": 42, "xzstudio-theme": "dusk"}"#).unwrap();

        let storage = FileThemeStorage::new(dir.path());
        assert_eq!(storage.load(), ThemeId::Sand);

        storage.save(ThemeId::Aurora).unwrap();
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&prefs_path).unwrap()).unwrap();
        assert_eq!(saved["xzstudio-theme"], "aurora");
        assert_eq!(saved["other-key"], 42);
    }

    #[test]
    fn test_file_storage_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let storage = FileThemeStorage::new(&dir.path().join("nested"));
        assert_eq!(storage.load(), ThemeId::Space);

        storage.save(ThemeId::Midnight).unwrap();
        assert_eq!(storage.load(), ThemeId::Midnight);

        std::fs::write(storage.path(), "not json").unwrap();
        assert_eq!(storage.load(), ThemeId::Space);
    }
}
