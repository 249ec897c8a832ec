use std::path::{Path, PathBuf};

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "delivery", "DeliveryDashboard")
}

/// Hämta standardsökväg för databasen
pub fn get_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("delivery.db"))
        .unwrap_or_else(|| PathBuf::from("delivery.db"))
}

/// Hämta konfigurationskatalog
pub fn get_config_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Normalisera sökväg för visning
pub fn display_path(path: &Path) -> String {
    // Förkorta hemkatalogen till ~
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Skapa ett säkert filnamn från en sträng
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Weekly Report"), "Weekly Report");
        assert_eq!(sanitize_filename("Billing/Payments"), "Billing_Payments");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }

    #[test]
    fn test_database_path_has_file_name() {
        assert_eq!(
            get_database_path().file_name().and_then(|n| n.to_str()),
            Some("delivery.db")
        );
    }
}
