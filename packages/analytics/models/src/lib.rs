#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived statistics and verdict types for temperature analytics.
//!
//! Everything here is a newly allocated output of the pure functions in
//! `tempwatch_analytics`; none of these types appear in stored history.

use serde::{Deserialize, Serialize};
use tempwatch_weather_models::{Observation, Season};

/// Tuning knobs for the rolling baseline and both anomaly classifiers.
///
/// The defaults reproduce the original monitoring behavior exactly: a
/// 30-sample trailing window, a mean from the very first sample onward,
/// and a 2-sigma anomaly band. Callers wanting different values construct
/// this directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingParams {
    /// Trailing window size in samples. Must be at least 1; a zero
    /// window is treated as 1.
    pub window: usize,
    /// Minimum window samples before a standard deviation (and with it
    /// an anomaly band) is produced. The mean is always defined, since
    /// the window never holds fewer than one sample.
    pub min_periods: usize,
    /// Standard-deviation multiplier defining the anomaly band.
    pub sigma_multiplier: f64,
}

impl Default for RollingParams {
    fn default() -> Self {
        Self {
            window: 30,
            min_periods: 1,
            sigma_multiplier: 2.0,
        }
    }
}

/// Trailing-window statistics for one position in a city's series.
///
/// The window is right-aligned and causal: position `i` sees only
/// observations at indices `max(0, i-window+1)..=i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingStat {
    /// Position in the time-sorted series this window ends at.
    pub index: usize,
    /// Arithmetic mean of temperatures in the window.
    pub mean: f64,
    /// Sample standard deviation (divisor n-1) of the window, or `None`
    /// when the window holds fewer than two samples.
    pub std_dev: Option<f64>,
}

/// An observation annotated with its rolling baseline and anomaly flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedObservation {
    /// The underlying observation.
    #[serde(flatten)]
    pub observation: Observation,
    /// Trailing-window statistics at this observation's position.
    pub rolling: RollingStat,
    /// Whether the temperature falls outside the rolling anomaly band.
    /// Always `false` when the band is undefined (`std_dev` is `None`).
    pub is_anomaly: bool,
}

/// Historical mean and spread of one city's temperatures in one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalBaseline {
    /// Season the statistics cover.
    pub season: Season,
    /// Number of historical observations in this city-season group.
    pub count: usize,
    /// Mean temperature across the group.
    pub mean: f64,
    /// Sample standard deviation (divisor n-1), or `None` when the group
    /// holds fewer than two observations.
    pub std_dev: Option<f64>,
}

/// Verdict for a single live temperature reading.
///
/// `InsufficientBaselineData` is a first-class outcome, not an error:
/// consumers must surface it distinctly and never collapse it into
/// `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveVerdict {
    /// Reading is within the seasonal anomaly band.
    Normal,
    /// Reading falls strictly outside the seasonal anomaly band.
    Anomalous,
    /// The city has fewer than two historical observations for the
    /// season, so no band can be established.
    InsufficientBaselineData,
}

impl std::fmt::Display for LiveVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Anomalous => write!(f, "anomalous"),
            Self::InsufficientBaselineData => write!(f, "insufficient baseline data"),
        }
    }
}
