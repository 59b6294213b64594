#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistical anomaly-detection engine for city temperature series.
//!
//! Three pipelines, all pure functions over an immutable [`CitySeries`]:
//! rolling trailing-window baselines with per-observation anomaly flags
//! ([`rolling`]), per-season historical baselines ([`seasonal`]), and the
//! live-reading classifier that checks one new temperature against the
//! current season's baseline ([`live`]).
//!
//! Nothing here reads the clock, performs I/O, or holds state across
//! calls; cities are independent, so callers may fan out per-city work
//! however they like.
//!
//! [`CitySeries`]: tempwatch_weather_models::CitySeries

pub mod live;
pub mod rolling;
pub mod seasonal;

/// Standard-deviation multiplier defining every anomaly band.
///
/// A reading is anomalous when it falls strictly outside
/// `mean ± SIGMA_MULTIPLIER * std_dev`.
pub const SIGMA_MULTIPLIER: f64 = 2.0;

/// Strict band check shared by the historical and live classifiers.
///
/// The bounds themselves are not anomalous: a temperature exactly at
/// `mean + k * std_dev` is inside the band.
pub(crate) const fn outside_band(temperature: f64, mean: f64, std_dev: f64, multiplier: f64) -> bool {
    let half_width = multiplier * std_dev;
    temperature < mean - half_width || temperature > mean + half_width
}
