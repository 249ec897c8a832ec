use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::AppError;

/// Övergripande statusindikator för en veckouppdatering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusIndicator {
    #[default]
    OnTrack,
    Delayed,
}

impl StatusIndicator {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::Delayed => "Delayed",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "On Track" => Some(Self::OnTrack),
            "Delayed" => Some(Self::Delayed),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::OnTrack, Self::Delayed]
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// De fem fasta områdena som får en RAG-rad per uppdatering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RagArea {
    Scope,
    Timeline,
    Cost,
    Quality,
    Resources,
}

impl RagArea {
    pub const ALL: [RagArea; 5] = [
        Self::Scope,
        Self::Timeline,
        Self::Cost,
        Self::Quality,
        Self::Resources,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Scope => "Scope",
            Self::Timeline => "Timeline",
            Self::Cost => "Cost",
            Self::Quality => "Quality",
            Self::Resources => "Resources",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.display_name() == s)
    }
}

impl fmt::Display for RagArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Röd/gul/grön
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RagStatus {
    #[default]
    Green,
    Amber,
    Red,
}

impl RagStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Amber => "Amber",
            Self::Red => "Red",
        }
    }

    /// CSS/LaTeX-färgnamn
    pub fn color_name(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Amber => "orange",
            Self::Red => "red",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Green" => Some(Self::Green),
            "Amber" => Some(Self::Amber),
            "Red" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Green, Self::Amber, Self::Red]
    }
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagEntry {
    pub id: Option<i64>,
    pub area: RagArea,
    pub status: RagStatus,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskKind {
    Risk,
    Issue,
}

impl RiskKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Risk => "Risk",
            Self::Issue => "Issue",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Risk" => Some(Self::Risk),
            "Issue" => Some(Self::Issue),
            _ => None,
        }
    }
}

/// Ägare och ETA sätts till detta när formuläret inte anger något
pub const TO_BE_DECIDED: &str = "TBD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskIssue {
    pub id: Option<i64>,
    pub kind: RiskKind,
    pub description: String,
    pub owner: String,
    pub mitigation_eta: String,
}

impl RiskIssue {
    pub fn new(kind: RiskKind, description: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            description: description.into(),
            owner: TO_BE_DECIDED.to_string(),
            mitigation_eta: TO_BE_DECIDED.to_string(),
        }
    }
}

pub const ACTION_STATUS_PENDING: &str = "Pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: Option<i64>,
    pub description: String,
    pub status: String,
    pub client_input_required: bool,
}

impl ActionItem {
    pub fn pending(description: impl Into<String>, client_input_required: bool) -> Self {
        Self {
            id: None,
            description: description.into(),
            status: ACTION_STATUS_PENDING.to_string(),
            client_input_required,
        }
    }
}

/// QE-mätvärden för en veckouppdatering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QeMetrics {
    pub total_test_cases: i64,
    pub executed_test_cases: i64,
    pub passed_test_cases: i64,
    pub failed_test_cases: i64,
    pub blocked_test_cases: i64,
    pub open_defects: i64,
    pub closed_defects: i64,
    pub critical_defects: i64,
    /// 0-100
    pub progress_percent: f64,
}

impl QeMetrics {
    pub fn validate(&self) -> Result<(), AppError> {
        let counts = [
            self.total_test_cases,
            self.executed_test_cases,
            self.passed_test_cases,
            self.failed_test_cases,
            self.blocked_test_cases,
            self.open_defects,
            self.closed_defects,
            self.critical_defects,
        ];
        if counts.iter().any(|c| *c < 0) {
            return Err(AppError::validation("QE-värden kan inte vara negativa"));
        }

        if self.executed_test_cases > self.total_test_cases {
            return Err(AppError::validation(
                "Antal körda testfall överstiger totalt antal",
            ));
        }

        let outcomes = self
            .passed_test_cases
            .checked_add(self.failed_test_cases)
            .and_then(|sum| sum.checked_add(self.blocked_test_cases));
        if outcomes.map_or(true, |sum| sum > self.executed_test_cases) {
            return Err(AppError::validation(
                "Godkända + misslyckade + blockerade överstiger körda testfall",
            ));
        }

        if self.critical_defects > self.open_defects {
            return Err(AppError::validation(
                "Kritiska defekter överstiger öppna defekter",
            ));
        }

        if !(0.0..=100.0).contains(&self.progress_percent) {
            return Err(AppError::validation("Framsteg måste vara mellan 0 och 100"));
        }

        Ok(())
    }

    /// Andel godkända av körda testfall, None om inget körts
    pub fn pass_rate(&self) -> Option<f64> {
        if self.executed_test_cases == 0 {
            None
        } else {
            Some(self.passed_test_cases as f64 / self.executed_test_cases as f64)
        }
    }
}

/// En veckouppdatering med alla underliggande rader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyUpdate {
    pub id: Option<i64>,
    pub project_id: i64,
    pub week_ending_date: NaiveDate,
    pub accomplishments: String,
    pub decisions_needed: String,
    pub milestones: String,
    pub status_indicator: StatusIndicator,
    pub rag: Vec<RagEntry>,
    pub risks_issues: Vec<RiskIssue>,
    pub action_items: Vec<ActionItem>,
    pub qe_metrics: Option<QeMetrics>,
}

impl WeeklyUpdate {
    pub fn new(project_id: i64, week_ending_date: NaiveDate) -> Self {
        Self {
            id: None,
            project_id,
            week_ending_date,
            accomplishments: String::new(),
            decisions_needed: String::new(),
            milestones: String::new(),
            status_indicator: StatusIndicator::default(),
            rag: Vec::new(),
            risks_issues: Vec::new(),
            action_items: Vec::new(),
            qe_metrics: None,
        }
    }

    /// Exakt en rad per område krävs
    pub fn validate(&self) -> Result<(), AppError> {
        for area in RagArea::ALL {
            let count = self.rag.iter().filter(|r| r.area == area).count();
            if count != 1 {
                return Err(AppError::validation(format!(
                    "RAG-status för {} måste anges exakt en gång (fick {})",
                    area, count
                )));
            }
        }

        if let Some(ref qe) = self.qe_metrics {
            qe.validate()?;
        }

        Ok(())
    }
}

/// Dela upp fritext i unika, trimmade rader i ursprunglig ordning
pub fn unique_lines(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}
