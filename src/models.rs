//! Data models for the vineyard outlook engine.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::thresholds::{BLOOM_GDD, BUDBREAK_GDD};

// ---

/// One forecast sample, normally 3 hours apart.
///
/// The timestamp carries the vineyard's UTC offset so that
/// `timestamp.date_naive()` is the local calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    // ---
    pub timestamp: DateTime<FixedOffset>,
    pub temp_instant: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    /// Rain over the preceding 3 hours [mm]; absent means none reported.
    pub precip_3h: Option<f64>,
}

/// One row of the historical weather and phenology record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalRecord {
    // ---
    #[serde(rename = "Fecha", alias = "date")]
    pub date: NaiveDate,
    #[serde(rename = "Tmax", alias = "tmax")]
    pub tmax: f64,
    #[serde(rename = "Tmin", alias = "tmin")]
    pub tmin: f64,
    #[serde(rename = "Fenologia_Observada", alias = "phenology", default)]
    pub phenology: Option<String>,
}

/// Daily extremes for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAggregate {
    // ---
    pub date: NaiveDate,
    pub tmax: f64,
    pub tmin: f64,
}

/// Daily and running growing-degree-days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GddRecord {
    // ---
    pub date: NaiveDate,
    pub gdd: f64,
    pub gdd_cumulative: f64,
}

/// Disease risk classification.
///
/// There is deliberately no "unknown" level: an evaluation that cannot be
/// made is a `CoreError::Data`, never a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Downy mildew assessment over the first 24 hours of forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MildewAssessment {
    // ---
    pub level: RiskLevel,
    pub rain_mm: f64,
    pub temp_critical: bool,
    pub rain_critical: bool,
    pub samples_used: usize,
}

/// Powdery mildew assessment over the whole forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OidiumAssessment {
    // ---
    pub level: RiskLevel,
    pub samples_in_range: usize,
    pub hours_in_range: u32,
    pub samples_considered: usize,
}

/// Phenological stage that the back-tester knows a threshold for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhenologyKind {
    Budbreak,
    Bloom,
}

impl PhenologyKind {
    /// Cumulative GDD at which the stage is predicted.
    pub fn gdd_threshold(self) -> f64 {
        match self {
            PhenologyKind::Budbreak => BUDBREAK_GDD,
            PhenologyKind::Bloom => BLOOM_GDD,
        }
    }
}

/// A stage observed in the field on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhenologyEvent {
    // ---
    pub observed_date: NaiveDate,
    pub kind: PhenologyKind,
}

/// Whether the model called an event before or after it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Early,
    Exact,
    Late,
}

/// Back-test outcome for a single observed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestResult {
    Resolved {
        kind: PhenologyKind,
        threshold: f64,
        predicted_date: NaiveDate,
        observed_date: NaiveDate,
        /// `observed_date - predicted_date`; positive means the model ran late.
        error_days: i64,
        timing: Timing,
    },
    /// The cumulative series never reached the event's threshold.
    Unresolved {
        kind: PhenologyKind,
        threshold: f64,
        observed_date: NaiveDate,
    },
}

/// Aggregate error over a back-test run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestSummary {
    NoEvents,
    NoneResolved {
        unresolved: usize,
    },
    Resolved {
        mean_absolute_error: f64,
        resolved: usize,
        unresolved: usize,
    },
}
