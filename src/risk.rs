//! Rule-based disease risk evaluators over raw forecast samples.
//!
//! Neither evaluator ever reports a risk level it could not compute: a
//! series without the fields a rule needs yields [`CoreError::Data`].

use crate::error::{CoreError, CoreResult};
use crate::models::{MildewAssessment, OidiumAssessment, RiskLevel, WeatherSample};
use crate::thresholds::{
    HOURS_PER_SAMPLE, MILDEW_MIN_TEMP_C, MILDEW_RAIN_MM, MILDEW_WINDOW_HOURS,
    MILDEW_WINDOW_SAMPLES, OIDIUM_HIGH_HOURS, OIDIUM_MEDIUM_HOURS, OIDIUM_OPTIMAL_HIGH_C,
    OIDIUM_OPTIMAL_LOW_C,
};

// ---

/// Downy mildew primary infection risk for the first 24 hours.
///
/// Two conditions are checked over the window:
/// - some sample has a minimum temperature of at least 10 °C
/// - accumulated rain reaches 10 mm
///
/// Both met is high, one is medium, none is low. The window holds at most
/// eight samples, all within 24 hours of the first one; a gappy or short
/// series is evaluated over what falls inside it.
pub fn evaluate_mildew(samples: &[WeatherSample]) -> CoreResult<MildewAssessment> {
    // ---
    let Some(first) = samples.first() else {
        return Err(CoreError::data("mildew: forecast contains no samples"));
    };
    let window_end = first.timestamp + chrono::Duration::hours(MILDEW_WINDOW_HOURS);
    let window_len = samples
        .iter()
        .take(MILDEW_WINDOW_SAMPLES)
        .take_while(|s| s.timestamp < window_end)
        .count();
    let window = &samples[..window_len];

    if window.len() < MILDEW_WINDOW_SAMPLES && samples.len() > window.len() {
        tracing::warn!(
            "Mildew: only {} samples within {} h of {}, forecast has gaps",
            window.len(),
            MILDEW_WINDOW_HOURS,
            first.timestamp
        );
    }
    if window.iter().all(|s| s.temp_min.is_none()) {
        return Err(CoreError::data("mildew: no minimum temperature in the first 24 hours"));
    }

    let temp_critical = window
        .iter()
        .filter_map(|s| s.temp_min)
        .any(|t| t >= MILDEW_MIN_TEMP_C);
    let rain_mm: f64 = window.iter().map(|s| s.precip_3h.unwrap_or(0.0)).sum();
    let rain_critical = rain_mm >= MILDEW_RAIN_MM;

    let level = match (temp_critical, rain_critical) {
        (true, true) => RiskLevel::High,
        (true, false) | (false, true) => RiskLevel::Medium,
        (false, false) => RiskLevel::Low,
    };

    tracing::debug!(
        "Mildew: {:?} (rain {:.1} mm, temp_critical={}, {} samples)",
        level,
        rain_mm,
        temp_critical,
        window.len()
    );

    Ok(MildewAssessment {
        level,
        rain_mm,
        temp_critical,
        rain_critical,
        samples_used: window.len(),
    })
}

/// Powdery mildew risk from hours spent in the 21-27 °C band.
///
/// Uses the whole horizon it is given; every sample stands for three hours.
pub fn evaluate_oidium(samples: &[WeatherSample]) -> CoreResult<OidiumAssessment> {
    // ---
    if samples.is_empty() {
        return Err(CoreError::data("oidium: forecast contains no samples"));
    }
    if samples.iter().all(|s| s.temp_instant.is_none()) {
        return Err(CoreError::data("oidium: forecast carries no instantaneous temperature"));
    }

    let samples_in_range = samples
        .iter()
        .filter_map(|s| s.temp_instant)
        .filter(|t| (OIDIUM_OPTIMAL_LOW_C..=OIDIUM_OPTIMAL_HIGH_C).contains(t))
        .count();
    let hours_in_range = samples_in_range as u32 * HOURS_PER_SAMPLE;

    let level = if hours_in_range >= OIDIUM_HIGH_HOURS {
        RiskLevel::High
    } else if hours_in_range >= OIDIUM_MEDIUM_HOURS {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    tracing::debug!(
        "Oidium: {:?} ({} h in optimal band over {} samples)",
        level,
        hours_in_range,
        samples.len()
    );

    Ok(OidiumAssessment {
        level,
        samples_in_range,
        hours_in_range,
        samples_considered: samples.len(),
    })
}
