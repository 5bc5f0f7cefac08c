//! Growing-degree-day calculation, daily aggregation and accumulation.
//!
//! The same aggregation path serves forecast samples and historical rows
//! through the [`Observation`] trait.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::models::{DailyAggregate, GddRecord, HistoricalRecord, WeatherSample};

// ---

/// Daily GDD: mean of the extremes above `tbase`, never negative.
pub fn gdd(tmax: f64, tmin: f64, tbase: f64) -> f64 {
    // ---
    let mean = (tmax + tmin) / 2.0;
    (mean - tbase).max(0.0)
}

/// Anything that can contribute to a day's temperature extremes.
pub trait Observation {
    fn date(&self) -> NaiveDate;

    /// Candidate for the day's maximum.
    fn high(&self) -> Option<f64>;

    /// Candidate for the day's minimum.
    fn low(&self) -> Option<f64>;
}

impl Observation for WeatherSample {
    fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    fn high(&self) -> Option<f64> {
        self.temp_max.or(self.temp_instant)
    }

    fn low(&self) -> Option<f64> {
        self.temp_min.or(self.temp_instant)
    }
}

impl Observation for HistoricalRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn high(&self) -> Option<f64> {
        Some(self.tmax)
    }

    fn low(&self) -> Option<f64> {
        Some(self.tmin)
    }
}

/// Group observations by calendar date into ascending daily extremes.
///
/// A date for which no high or no low value was seen is left out.
pub fn aggregate_daily<'a, T, I>(observations: I) -> Vec<DailyAggregate>
where
    T: Observation + 'a,
    I: IntoIterator<Item = &'a T>,
{
    // ---
    let mut days: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for obs in observations {
        let entry = days.entry(obs.date()).or_insert((None, None));
        if let Some(high) = obs.high() {
            entry.0 = Some(entry.0.map_or(high, |h| h.max(high)));
        }
        if let Some(low) = obs.low() {
            entry.1 = Some(entry.1.map_or(low, |l| l.min(low)));
        }
    }

    days.into_iter()
        .filter_map(|(date, extremes)| match extremes {
            (Some(tmax), Some(tmin)) => Some(DailyAggregate { date, tmax, tmin }),
            _ => {
                tracing::debug!("Dropping {} from aggregation: incomplete extremes", date);
                None
            }
        })
        .collect()
}

/// Apply [`gdd`] per day and keep a running sum in ascending date order.
pub fn accumulate(daily: &[DailyAggregate], tbase: f64) -> Vec<GddRecord> {
    // ---
    let mut ordered = daily.to_vec();
    ordered.sort_by_key(|d| d.date);

    let mut running = 0.0;
    ordered
        .into_iter()
        .map(|day| {
            let value = gdd(day.tmax, day.tmin, tbase);
            running += value;
            GddRecord {
                date: day.date,
                gdd: value,
                gdd_cumulative: running,
            }
        })
        .collect()
}

/// Last cumulative value of a series.
pub fn final_cumulative(records: &[GddRecord]) -> CoreResult<f64> {
    records
        .last()
        .map(|r| r.gdd_cumulative)
        .ok_or(CoreError::EmptySeries("no GDD records to report a final cumulative value"))
}
