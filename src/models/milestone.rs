use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::{date::days_between, AppError};

/// Gränser i procentenheter för hur långt efter plan en milstolpe får ligga
pub const CRITICAL_GAP_POINTS: f64 = 20.0;
pub const AT_RISK_GAP_POINTS: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Option<i64>,
    pub project_id: i64,
    /// Endast en nivå: en förälder har själv ingen förälder
    pub parent_id: Option<i64>,
    pub name: String,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    pub duration_days: i64,
    /// Andel 0.0-1.0
    pub weightage: f64,
}

impl Milestone {
    pub fn new(
        project_id: i64,
        name: impl Into<String>,
        planned_start: NaiveDate,
        planned_end: NaiveDate,
        weightage: f64,
    ) -> Self {
        Self {
            id: None,
            project_id,
            parent_id: None,
            name: name.into(),
            planned_start,
            planned_end,
            duration_days: days_between(planned_start, planned_end),
            weightage,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Milstolpen måste ha ett namn"));
        }

        if self.planned_end < self.planned_start {
            return Err(AppError::validation(
                "Planerat slutdatum ligger före planerat startdatum",
            ));
        }

        if !(0.0..=1.0).contains(&self.weightage) {
            return Err(AppError::validation(format!(
                "Vikt måste anges som andel mellan 0 och 1 (fick {})",
                self.weightage
            )));
        }

        Ok(())
    }

    pub fn expected_progress(&self, reference: NaiveDate) -> f64 {
        expected_progress(self.planned_start, self.planned_end, reference)
    }
}

/// Veckovis faktiskt framsteg för en milstolpe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneUpdate {
    pub milestone_id: i64,
    pub week_ending_date: NaiveDate,
    /// Alltid inom 0.0-1.0
    pub actual_progress: f64,
}

impl MilestoneUpdate {
    pub fn new(milestone_id: i64, week_ending_date: NaiveDate, actual_progress: f64) -> Self {
        Self {
            milestone_id,
            week_ending_date,
            actual_progress: clamp_progress(actual_progress),
        }
    }
}

/// Status härledd från faktiskt mot förväntat framsteg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    NotStarted,
    OnTrack,
    AtRisk,
    Critical,
}

impl MilestoneStatus {
    /// Tom etikett för ej påbörjade
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "",
            Self::OnTrack => "On Track",
            Self::AtRisk => "At Risk",
            Self::Critical => "Critical",
        }
    }

    pub fn color_name(&self) -> &'static str {
        match self {
            Self::NotStarted => "black",
            Self::OnTrack => "green",
            Self::AtRisk => "orange",
            Self::Critical => "red",
        }
    }

    /// Jämför med fasta trösklar (i procentenheter)
    pub fn derive(expected: f64, actual: f64) -> Self {
        if expected <= 0.0 {
            return Self::NotStarted;
        }

        let behind_points = (expected - actual) * 100.0;
        if behind_points > CRITICAL_GAP_POINTS {
            Self::Critical
        } else if behind_points > AT_RISK_GAP_POINTS {
            Self::AtRisk
        } else {
            Self::OnTrack
        }
    }
}

/// Linjär interpolation mellan planerad start och slut
pub fn expected_progress(start: NaiveDate, end: NaiveDate, reference: NaiveDate) -> f64 {
    if reference <= start {
        // Start == slut och referens på dagen räknas som klar
        return if reference >= end { 1.0 } else { 0.0 };
    }
    if reference >= end {
        return 1.0;
    }

    let total = days_between(start, end) as f64;
    let elapsed = days_between(start, reference) as f64;
    clamp_progress(elapsed / total)
}

pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
