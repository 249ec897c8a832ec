use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::AppError;

/// Projektfas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectPhase {
    #[default]
    Build,
    Test,
    Uat,
    GoLive,
}

impl ProjectPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::Test => "Test",
            Self::Uat => "UAT",
            Self::GoLive => "Go-Live",
        }
    }

    /// Tolka lagrat värde, okända värden blir None
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Build" => Some(Self::Build),
            "Test" => Some(Self::Test),
            "UAT" => Some(Self::Uat),
            "Go-Live" => Some(Self::GoLive),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Build, Self::Test, Self::Uat, Self::GoLive]
    }
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<i64>,
    pub name: String,
    pub client_business_unit: String,
    pub project_manager: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub current_phase: ProjectPhase,
    pub created_at: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: None,
            name: name.into(),
            client_business_unit: String::new(),
            project_manager: String::new(),
            start_date,
            end_date,
            current_phase: ProjectPhase::default(),
            created_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Projektnamn krävs"));
        }

        if self.end_date < self.start_date {
            return Err(AppError::validation(format!(
                "Slutdatum {} ligger före startdatum {}",
                self.end_date, self.start_date
            )));
        }

        Ok(())
    }

    /// "2024-01-01 to 2024-06-30"
    pub fn duration_display(&self) -> String {
        format!("{} to {}", self.start_date, self.end_date)
    }
}

/// Kompakt rad för val i formulär
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip() {
        for phase in ProjectPhase::all() {
            assert_eq!(ProjectPhase::from_db_str(phase.display_name()), Some(*phase));
        }
        assert_eq!(ProjectPhase::from_db_str("Design"), None);
    }

    #[test]
    fn test_validate() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert!(Project::new("Billing", start, end).validate().is_ok());
        assert!(Project::new("  ", start, end).validate().is_err());
        assert!(Project::new("Billing", end, start).validate().is_err());
    }
}
