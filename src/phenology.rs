//! Phenology event parsing and GDD model back-testing.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::models::{BacktestResult, BacktestSummary, GddRecord, PhenologyEvent, PhenologyKind, Timing};

/// Keywords matched (lower-cased) against free-text field labels.
const BUDBREAK_KEYWORDS: &[&str] = &["brotación", "brotacion", "budbreak", "bud break"];
const BLOOM_KEYWORDS: &[&str] = &["floración", "floracion", "bloom", "flowering"];

// ---

/// Recognise a phenological stage in a free-text label.
///
/// Budbreak is checked before bloom, so a label naming both counts as
/// budbreak.
pub fn parse_label(label: &str) -> Option<PhenologyKind> {
    // ---
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    if BUDBREAK_KEYWORDS.iter().any(|k| label.contains(k)) {
        Some(PhenologyKind::Budbreak)
    } else if BLOOM_KEYWORDS.iter().any(|k| label.contains(k)) {
        Some(PhenologyKind::Bloom)
    } else {
        None
    }
}

/// Per-event results plus the aggregate error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub results: Vec<BacktestResult>,
    pub summary: BacktestSummary,
}

impl BacktestReport {
    /// Mean absolute error in days over resolved events.
    ///
    /// Fails rather than reporting 0 when nothing was resolved.
    pub fn mean_absolute_error(&self) -> CoreResult<f64> {
        match self.summary {
            BacktestSummary::Resolved {
                mean_absolute_error, ..
            } => Ok(mean_absolute_error),
            BacktestSummary::NoEvents => Err(CoreError::EmptySeries("no phenology events to back-test")),
            BacktestSummary::NoneResolved { .. } => Err(CoreError::EmptySeries(
                "no phenology event reached its GDD threshold",
            )),
        }
    }
}

/// First date on which the cumulative series reaches `threshold`.
fn crossing_date(history: &[GddRecord], threshold: f64) -> Option<NaiveDate> {
    history
        .iter()
        .find(|r| r.gdd_cumulative >= threshold)
        .map(|r| r.date)
}

/// Compare predicted threshold crossings with observed events.
///
/// `history` is sorted by date here, so callers may pass it in any order.
pub fn backtest(history: &[GddRecord], events: &[PhenologyEvent]) -> BacktestReport {
    // ---
    let mut ordered = history.to_vec();
    ordered.sort_by_key(|r| r.date);

    let results: Vec<BacktestResult> = events
        .iter()
        .map(|event| {
            let threshold = event.kind.gdd_threshold();
            match crossing_date(&ordered, threshold) {
                Some(predicted_date) => {
                    let error_days = (event.observed_date - predicted_date).num_days();
                    let timing = match error_days {
                        0 => Timing::Exact,
                        d if d > 0 => Timing::Late,
                        _ => Timing::Early,
                    };
                    BacktestResult::Resolved {
                        kind: event.kind,
                        threshold,
                        predicted_date,
                        observed_date: event.observed_date,
                        error_days,
                        timing,
                    }
                }
                None => {
                    tracing::warn!(
                        "{:?} observed {} never predicted: cumulative GDD stays below {}",
                        event.kind,
                        event.observed_date,
                        threshold
                    );
                    BacktestResult::Unresolved {
                        kind: event.kind,
                        threshold,
                        observed_date: event.observed_date,
                    }
                }
            }
        })
        .collect();

    let errors: Vec<i64> = results
        .iter()
        .filter_map(|r| match r {
            BacktestResult::Resolved { error_days, .. } => Some(error_days.abs()),
            BacktestResult::Unresolved { .. } => None,
        })
        .collect();
    let unresolved = results.len() - errors.len();

    let summary = if results.is_empty() {
        BacktestSummary::NoEvents
    } else if errors.is_empty() {
        BacktestSummary::NoneResolved { unresolved }
    } else {
        BacktestSummary::Resolved {
            mean_absolute_error: errors.iter().sum::<i64>() as f64 / errors.len() as f64,
            resolved: errors.len(),
            unresolved,
        }
    };

    tracing::info!("Back-test over {} events: {:?}", results.len(), summary);

    BacktestReport { results, summary }
}
