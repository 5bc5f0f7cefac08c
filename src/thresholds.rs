//! Agronomic constants for the vine models.
//!
//! Every rule threshold used by the GDD, mildew, oidium and phenology code
//! lives here so recalibration touches one file.

/// Base temperature (Tb) for grapevine growing-degree-days [°C].
pub const VINE_BASE_TEMP_C: f64 = 10.0;

/// Nominal spacing of forecast samples [h].
pub const HOURS_PER_SAMPLE: u32 = 3;

// --- Downy mildew ("three tens" primary infection rule)

/// Span of the mildew window, counted from the first sample [h].
pub const MILDEW_WINDOW_HOURS: i64 = 24;

/// Samples covering the first 24 hours of a 3-hourly forecast.
pub const MILDEW_WINDOW_SAMPLES: usize = 8;

/// Minimum temperature that satisfies the temperature condition [°C].
pub const MILDEW_MIN_TEMP_C: f64 = 10.0;

/// Rain accumulated over the window that satisfies the rain condition [mm].
pub const MILDEW_RAIN_MM: f64 = 10.0;

// --- Powdery mildew (oidium)

/// Lower bound of the optimal development band, inclusive [°C].
pub const OIDIUM_OPTIMAL_LOW_C: f64 = 21.0;

/// Upper bound of the optimal development band, inclusive [°C].
pub const OIDIUM_OPTIMAL_HIGH_C: f64 = 27.0;

/// Hours in the optimal band at or above which risk is high.
pub const OIDIUM_HIGH_HOURS: u32 = 24;

/// Hours in the optimal band at or above which risk is medium.
pub const OIDIUM_MEDIUM_HOURS: u32 = 12;

// --- Phenology

/// Cumulative GDD at which budbreak is predicted.
pub const BUDBREAK_GDD: f64 = 100.0;

/// Cumulative GDD at which bloom is predicted.
pub const BLOOM_GDD: f64 = 500.0;
