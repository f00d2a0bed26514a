use crate::storage::{ LocalStore, StorageError, THEME_KEY, USER_NAME_KEY };
use log::{ info, warn };
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid theme: '{0}' (expected dark or light)")]
pub struct ThemeParseError(String);

impl FromStr for Theme {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ThemeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub display_name: String,
}

pub fn load_preferences(store: &dyn LocalStore) -> Preferences {
    let theme = match store.get(THEME_KEY) {
        Ok(Some(raw)) =>
            raw.parse::<Theme>().unwrap_or_else(|e| {
                warn!("{}; using default theme", e);
                Theme::default()
            }),
        Ok(None) => Theme::default(),
        Err(e) => {
            warn!("Could not read theme preference: {}", e);
            Theme::default()
        }
    };
    let display_name = store.get(USER_NAME_KEY).ok().flatten().unwrap_or_default();
    Preferences { theme, display_name }
}

pub fn save_preferences(
    store: &dyn LocalStore,
    theme: Theme,
    display_name: &str
) -> Result<Preferences, StorageError> {
    store.set_many(&[(THEME_KEY, theme.as_str()), (USER_NAME_KEY, display_name)])?;
    info!("Saved preferences: theme={}, name={:?}", theme, display_name);
    Ok(Preferences { theme, display_name: display_name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ FileStore, MemoryStore };
    use tempfile::TempDir;

    #[test]
    fn defaults_when_nothing_saved() {
        let prefs = load_preferences(&MemoryStore::new());
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.display_name, "");
    }

    #[test]
    fn saved_preferences_reload_from_fresh_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        save_preferences(&FileStore::new(&path), Theme::Light, "Ada").unwrap();
        let prefs = load_preferences(&FileStore::new(&path));

        assert_eq!(prefs, Preferences { theme: Theme::Light, display_name: "Ada".into() });
    }

    #[test]
    fn only_two_themes_parse() {
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert!("solarized".parse::<Theme>().is_err());
        assert!("Dark".parse::<Theme>().is_err());
        assert_eq!(
            "sepia".parse::<Theme>().unwrap_err().to_string(),
            "Invalid theme: 'sepia' (expected dark or light)"
        );
    }

    #[test]
    fn unknown_stored_theme_falls_back_to_dark() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(load_preferences(&store).theme, Theme::Dark);
    }
}
