use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::{get_config_dir, get_database_path};

pub const SETTINGS_FILE: &str = "settings.toml";

/// Applikationsinställningar som inte sparas i databasen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub dark_mode: bool,
    pub window_width: f32,
    pub window_height: f32,
    /// trace, debug, info, warn eller error
    pub log_level: String,
    /// Åsidosätter standardsökvägen till databasen
    pub database_path: Option<PathBuf>,
    /// Om satt skrivs rapportens HTML även hit för felsökning
    pub debug_html_path: Option<PathBuf>,
    /// Startkatalog för spara-dialogen
    pub report_directory: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            window_width: 1280.0,
            window_height: 860.0,
            log_level: "info".to_string(),
            database_path: None,
            debug_html_path: None,
            report_directory: None,
        }
    }
}

impl AppSettings {
    /// Ladda från config-katalogen, standardvärden om filen saknas eller är trasig
    pub fn load() -> Self {
        Self::load_from(&get_config_dir().join(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ogiltig inställningsfil {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&get_config_dir().join(SETTINGS_FILE))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(get_database_path)
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_settings_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let settings = AppSettings {
            dark_mode: true,
            debug_html_path: Some(PathBuf::from("debug_report.html")),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_app_settings_backwards_compat() {
        // Äldre fil utan loggnivå och sökvägar
        let old_toml = r#"
dark_mode = true
window_width = 1024.0
"#;
        let loaded: AppSettings = toml::from_str(old_toml).unwrap();
        assert!(loaded.dark_mode);
        assert_eq!(loaded.window_width, 1024.0);
        assert_eq!(loaded.log_level, "info");
        assert!(loaded.debug_html_path.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppSettings::load_from(&dir.path().join("nope.toml"));
        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn test_tracing_level() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.tracing_level(), tracing::Level::INFO);
        settings.log_level = "debug".into();
        assert_eq!(settings.tracing_level(), tracing::Level::DEBUG);
        settings.log_level = "loud".into();
        assert_eq!(settings.tracing_level(), tracing::Level::INFO);
    }
}
