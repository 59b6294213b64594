#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core weather observation types and the season taxonomy.
//!
//! This crate defines the canonical observation record and calendar-season
//! mapping used across the entire tempwatch system. All data sources
//! normalize their rows into these shared types before any statistics run.

use chrono::{DateTime, Datelike as _, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Calendar season of an observation.
///
/// The month mapping is fixed to meteorological Northern-hemisphere
/// seasons (Dec–Feb winter, Mar–May spring, Jun–Aug summer, Sep–Nov
/// autumn). Southern-hemisphere cities are not special-cased.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Season {
    /// December, January, February
    Winter,
    /// March, April, May
    Spring,
    /// June, July, August
    Summer,
    /// September, October, November
    Autumn,
}

impl Season {
    /// Derives the season from a calendar month number (1-12).
    ///
    /// # Errors
    ///
    /// Returns an error if the month is not in the range 1-12.
    pub const fn from_month(month: u8) -> Result<Self, InvalidMonthError> {
        match month {
            12 | 1 | 2 => Ok(Self::Winter),
            3..=5 => Ok(Self::Spring),
            6..=8 => Ok(Self::Summer),
            9..=11 => Ok(Self::Autumn),
            _ => Err(InvalidMonthError { month }),
        }
    }

    /// Derives the season from an observation timestamp.
    #[must_use]
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        // month() is always 1-12, so the range check cannot fail
        match timestamp.month() {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Winter, Self::Spring, Self::Summer, Self::Autumn]
    }
}

/// Error returned when attempting to create a [`Season`] from an invalid
/// month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMonthError {
    /// The invalid month value that was provided.
    pub month: u8,
}

impl std::fmt::Display for InvalidMonthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid month {}: expected 1-12", self.month)
    }
}

impl std::error::Error for InvalidMonthError {}

/// A single temperature reading for one city at one point in time.
///
/// Observations are immutable once constructed; every observation carries
/// exactly one season, derived from its timestamp when the source feed
/// does not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// City the reading belongs to.
    pub city: String,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Calendar season of the reading.
    pub season: Season,
}

impl Observation {
    /// Creates an observation, deriving the season from the timestamp.
    #[must_use]
    pub fn new(city: impl Into<String>, timestamp: DateTime<Utc>, temperature: f64) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
            season: Season::from_timestamp(timestamp),
        }
    }
}

/// The full time-ordered history of one city's observations.
///
/// Construction sorts ascending by timestamp with a stable sort, so rows
/// sharing a timestamp keep their input order. The sequence is never
/// mutated afterwards; all derived statistics are newly allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySeries {
    /// City every observation in the series belongs to.
    pub city: String,
    /// Observations sorted ascending by timestamp.
    pub observations: Vec<Observation>,
}

impl CitySeries {
    /// Builds a series from observations in any order.
    ///
    /// Observations for other cities are ignored rather than rejected, so
    /// callers can pass a mixed feed filtered only by intent.
    #[must_use]
    pub fn from_unsorted(city: impl Into<String>, observations: Vec<Observation>) -> Self {
        let city = city.into();
        let mut observations: Vec<Observation> = observations
            .into_iter()
            .filter(|obs| obs.city == city)
            .collect();
        observations.sort_by_key(|obs| obs.timestamp);
        Self { city, observations }
    }

    /// Number of observations in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Temperatures in timestamp order.
    #[must_use]
    pub fn temperatures(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.temperature).collect()
    }
}
