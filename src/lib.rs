//! Vineyard outlook engine.
//!
//! Turns weather forecasts and historical records into growing-degree-days,
//! downy mildew and oidium risk, and a back-test of the GDD phenology model.
//!
//! The computational core (`gdd`, `risk`, `phenology`) is pure. `forecast`
//! and `history` are thin readers, `pipeline` composes the pieces, and
//! `routes` exposes them over HTTP.

pub mod config;
pub mod error;
pub mod forecast;
pub mod gdd;
pub mod history;
pub mod models;
pub mod phenology;
pub mod pipeline;
pub mod risk;
pub mod routes;
pub mod thresholds;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use forecast::{Forecast, ForecastService, Location, OpenWeatherClient};
pub use models::{
    BacktestResult, BacktestSummary, DailyAggregate, GddRecord, HistoricalRecord,
    MildewAssessment, OidiumAssessment, PhenologyEvent, PhenologyKind, RiskLevel, WeatherSample,
};
