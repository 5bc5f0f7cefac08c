//! Composes the core into the two reports the service exposes: the
//! forecast outlook and the historical validation.

use std::borrow::Borrow;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::forecast::{self, Forecast};
use crate::gdd::{accumulate, aggregate_daily, final_cumulative};
use crate::history::observed_events;
use crate::models::{GddRecord, HistoricalRecord, MildewAssessment, OidiumAssessment, PhenologyEvent};
use crate::phenology::{backtest, BacktestReport};
use crate::risk::{evaluate_mildew, evaluate_oidium};

// ---

/// A risk model result as exposed to presentation.
///
/// `DataError` is its own variant so "cannot assess" never reads as a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskReport<T> {
    Assessed(T),
    DataError { reason: String },
}

impl<T> From<CoreResult<T>> for RiskReport<T> {
    fn from(result: CoreResult<T>) -> Self {
        match result {
            Ok(assessment) => RiskReport::Assessed(assessment),
            Err(e) => RiskReport::DataError {
                reason: e.to_string(),
            },
        }
    }
}

/// Projected GDD and disease risk for the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutlook {
    pub location_name: Option<String>,
    pub base_temp_c: f64,
    pub daily: Vec<GddRecord>,
    /// `None` when the forecast produced no complete day.
    pub final_cumulative: Option<f64>,
    pub mildew: RiskReport<MildewAssessment>,
    pub oidium: RiskReport<OidiumAssessment>,
}

impl ForecastOutlook {
    /// Outlook for a forecast whose samples could not be read at all.
    fn unassessable(base_temp_c: f64, reason: &str) -> Self {
        ForecastOutlook {
            location_name: None,
            base_temp_c,
            daily: Vec::new(),
            final_cumulative: None,
            mildew: RiskReport::DataError {
                reason: reason.to_string(),
            },
            oidium: RiskReport::DataError {
                reason: reason.to_string(),
            },
        }
    }
}

/// Run aggregation, accumulation and both risk models over a forecast.
pub fn forecast_outlook(forecast: &Forecast, base_temp_c: f64) -> ForecastOutlook {
    // ---
    let daily = accumulate(&aggregate_daily(&forecast.samples), base_temp_c);
    let final_cumulative = final_cumulative(&daily).ok();

    tracing::info!(
        "Forecast outlook: {} samples, {} days, final GDD {:?}",
        forecast.samples.len(),
        daily.len(),
        final_cumulative
    );

    ForecastOutlook {
        location_name: forecast.location_name.clone(),
        base_temp_c,
        daily,
        final_cumulative,
        mildew: evaluate_mildew(&forecast.samples).into(),
        oidium: evaluate_oidium(&forecast.samples).into(),
    }
}

/// Outlook from a decode result.
///
/// Upstream failures pass through untouched; a data error becomes an
/// outlook whose risk models report that they could not assess.
pub fn resolve_outlook<F: Borrow<Forecast>>(
    decoded: CoreResult<F>,
    base_temp_c: f64,
) -> CoreResult<ForecastOutlook> {
    // ---
    match decoded {
        Ok(forecast) => Ok(forecast_outlook(forecast.borrow(), base_temp_c)),
        Err(CoreError::Data(reason)) => {
            tracing::warn!("Forecast unusable: {}", reason);
            Ok(ForecastOutlook::unassessable(base_temp_c, &reason))
        }
        Err(e) => Err(e),
    }
}

/// Decode a raw provider payload and build the outlook.
pub fn outlook_from_payload(payload: &Value, base_temp_c: f64) -> CoreResult<ForecastOutlook> {
    resolve_outlook(forecast::decode(payload), base_temp_c)
}

/// Historical GDD series with the back-test against observed phenology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub base_temp_c: f64,
    pub daily: Vec<GddRecord>,
    pub events: Vec<PhenologyEvent>,
    pub backtest: BacktestReport,
}

pub fn validation_report(records: &[HistoricalRecord], base_temp_c: f64) -> ValidationReport {
    // ---
    let daily = accumulate(&aggregate_daily(records), base_temp_c);
    let events = observed_events(records);
    let backtest = backtest(&daily, &events);

    ValidationReport {
        base_temp_c,
        daily,
        events,
        backtest,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{BacktestSummary, RiskLevel};
    use chrono::NaiveDate;
    use serde_json::json;

    fn forecast_payload() -> Value {
        // ---
        // Eight warm, wet samples starting 2025-01-15 00:00 UTC
        let list: Vec<Value> = (0..8)
            .map(|i| {
                json!({
                    "dt": 1736899200 + i * 10800,
                    "main": {"temp": 23.0, "temp_min": 14.0, "temp_max": 26.0},
                    "rain": {"3h": 2.0}
                })
            })
            .collect();
        json!({"cod": "200", "list": list, "city": {"name": "Ica", "timezone": 0}})
    }

    #[test]
    fn test_outlook_from_payload() {
        // ---
        let outlook = outlook_from_payload(&forecast_payload(), 10.0).unwrap();

        assert_eq!(outlook.location_name.as_deref(), Some("Ica"));
        assert_eq!(outlook.daily.len(), 1);
        assert_eq!(outlook.daily[0].gdd, 10.0);
        assert_eq!(outlook.final_cumulative, Some(10.0));
        match &outlook.mildew {
            RiskReport::Assessed(m) => assert_eq!(m.level, RiskLevel::High),
            other => panic!("unexpected mildew report {:?}", other),
        }
        match &outlook.oidium {
            RiskReport::Assessed(o) => assert_eq!(o.level, RiskLevel::High),
            other => panic!("unexpected oidium report {:?}", other),
        }
    }

    #[test]
    fn test_upstream_error_short_circuits() {
        // ---
        let payload = json!({"cod": "401", "message": "Invalid API key", "list": []});
        let err = outlook_from_payload(&payload, 10.0).unwrap_err();
        assert!(matches!(err, CoreError::Upstream { .. }));
    }

    #[test]
    fn test_missing_list_reports_data_error_not_low() {
        // ---
        let outlook = outlook_from_payload(&json!({"cod": "200"}), 10.0).unwrap();

        assert!(outlook.daily.is_empty());
        assert_eq!(outlook.final_cumulative, None);
        assert!(matches!(outlook.mildew, RiskReport::DataError { .. }));
        assert!(matches!(outlook.oidium, RiskReport::DataError { .. }));

        let value = serde_json::to_value(&outlook).unwrap();
        assert_eq!(value["mildew"]["status"], "data_error");
    }

    #[test]
    fn test_assessed_report_flattens_metrics() {
        // ---
        let outlook = outlook_from_payload(&forecast_payload(), 10.0).unwrap();
        let value = serde_json::to_value(&outlook).unwrap();

        assert_eq!(value["oidium"]["status"], "assessed");
        assert_eq!(value["oidium"]["level"], "HIGH");
        assert_eq!(value["oidium"]["hours_in_range"], 24);
        assert_eq!(value["mildew"]["rain_mm"], 16.0);
    }

    #[test]
    fn test_validation_report() {
        // ---
        let start = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        // 20 GDD a day: 100 reached on day index 4
        let records: Vec<HistoricalRecord> = (0..10)
            .map(|i| HistoricalRecord {
                date: start + chrono::Days::new(i),
                tmax: 35.0,
                tmin: 25.0,
                phenology: match i {
                    6 => Some("Brotación".to_string()),
                    8 => Some("Floración".to_string()),
                    _ => None,
                },
            })
            .collect();

        let report = validation_report(&records, 10.0);

        assert_eq!(report.daily.len(), 10);
        assert_eq!(report.events.len(), 2);
        assert_eq!(
            report.backtest.summary,
            BacktestSummary::Resolved { mean_absolute_error: 2.0, resolved: 1, unresolved: 1 }
        );
    }
}
