#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV boundary for historical temperature feeds.
//!
//! Feeds are tabular with columns `city,timestamp,temperature[,season]`;
//! rows may arrive in any order. Parsing normalizes every row into an
//! [`Observation`] (deriving the season from the timestamp when the
//! column is absent or empty) and groups rows into per-city time-sorted
//! series. Whether a malformed row drops the row or aborts the run is the
//! caller's choice: [`read_observations`] fails fast on the first bad
//! row, [`read_observations_lossy`] logs and skips.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;
use tempwatch_weather_models::{CitySeries, Observation, Season};
use thiserror::Error;

/// Errors that can occur while reading a historical feed.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A row is missing a required field or holds an unparseable value.
    #[error("Malformed record on line {line}: {message}")]
    MalformedRecord {
        /// 1-based line number of the offending row (header is line 1).
        line: u64,
        /// Description of what went wrong.
        message: String,
    },

    /// The underlying reader failed or the file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One raw CSV row before validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    city: String,
    timestamp: String,
    temperature: String,
    #[serde(default)]
    season: Option<String>,
}

/// Parses a feed timestamp: RFC 3339, `YYYY-MM-DDTHH:MM:SS` (with
/// optional fractional seconds), or a bare `YYYY-MM-DD` date at midnight.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_utc());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl RawRecord {
    /// Validates the row into an [`Observation`].
    fn into_observation(self, line: u64) -> Result<Observation, IngestError> {
        let malformed = |message: String| IngestError::MalformedRecord { line, message };

        let city = self.city.trim();
        if city.is_empty() {
            return Err(malformed("missing city".to_string()));
        }

        let timestamp = parse_timestamp(self.timestamp.trim())
            .ok_or_else(|| malformed(format!("invalid timestamp '{}'", self.timestamp)))?;

        let temperature: f64 = self
            .temperature
            .trim()
            .parse()
            .map_err(|_| malformed(format!("invalid temperature '{}'", self.temperature)))?;
        if !temperature.is_finite() {
            return Err(malformed(format!(
                "non-finite temperature '{}'",
                self.temperature
            )));
        }

        // An explicit season column wins over the derived one so feeds
        // with corrected labels round-trip unchanged.
        let season = match self.season.as_deref().map(str::trim) {
            None | Some("") => Season::from_timestamp(timestamp),
            Some(label) => label
                .parse::<Season>()
                .map_err(|_| malformed(format!("unknown season '{label}'")))?,
        };

        Ok(Observation {
            city: city.to_string(),
            timestamp,
            temperature,
            season,
        })
    }
}

/// Reads a historical feed, failing on the first malformed row.
///
/// # Errors
///
/// Returns [`IngestError::MalformedRecord`] for the first row with a
/// missing or unparseable field, or [`IngestError::Csv`] if the input is
/// not readable as CSV.
pub fn read_observations(reader: impl Read) -> Result<Vec<Observation>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut observations = Vec::new();
    // Header occupies line 1; the first record is line 2. Feeds are one
    // row per line (no quoted newlines), so counting records is enough.
    let mut line = 1u64;
    for result in csv_reader.deserialize::<RawRecord>() {
        line += 1;
        let record = result.map_err(|e| row_error(line, e))?;
        observations.push(record.into_observation(line)?);
    }

    Ok(observations)
}

/// Maps a per-row csv error: reader-level I/O failures stay [`IngestError::Csv`],
/// anything else (wrong field count, bad UTF-8) is a malformed record.
fn row_error(line: u64, e: csv::Error) -> IngestError {
    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
        IngestError::Csv(e)
    } else {
        IngestError::MalformedRecord {
            line,
            message: e.to_string(),
        }
    }
}

/// Reads a historical feed, logging and dropping malformed rows.
///
/// Returns the good observations and the number of rows dropped.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] only if the input itself is not readable
/// as CSV; per-row problems never abort.
pub fn read_observations_lossy(reader: impl Read) -> Result<(Vec<Observation>, u64), IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut observations = Vec::new();
    let mut dropped = 0u64;
    let mut line = 1u64;
    for result in csv_reader.deserialize::<RawRecord>() {
        line += 1;
        let record = match result.map_err(|e| row_error(line, e)) {
            Ok(r) => r,
            Err(e @ IngestError::Csv(_)) => return Err(e),
            Err(e) => {
                log::warn!("Skipping row: {e}");
                dropped += 1;
                continue;
            }
        };
        match record.into_observation(line) {
            Ok(obs) => observations.push(obs),
            Err(e) => {
                log::warn!("Skipping row: {e}");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} malformed row(s) from feed");
    }

    Ok((observations, dropped))
}

/// Groups a mixed feed into one time-sorted [`CitySeries`] per city,
/// ordered by city name.
#[must_use]
pub fn group_by_city(observations: Vec<Observation>) -> Vec<CitySeries> {
    let mut by_city: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        by_city.entry(obs.city.clone()).or_default().push(obs);
    }

    by_city
        .into_iter()
        .map(|(city, observations)| CitySeries::from_unsorted(city, observations))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
city,timestamp,temperature,season
Berlin,2024-07-02,28.5,summer
Oslo,2024-01-15T08:00:00,-6.0,
Berlin,2024-07-01,26.0,summer
Oslo,2024-01-16,-4.5,winter
";

    #[test]
    fn parses_rfc3339_timestamp() {
        let dt = parse_timestamp("2024-01-15T08:00:00Z").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 08:00:00 UTC");
    }

    #[test]
    fn parses_naive_datetime_with_fractional() {
        let dt = parse_timestamp("2024-01-15T08:00:00.250").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 08:00:00.250 UTC");
    }

    #[test]
    fn parses_bare_date_at_midnight() {
        let dt = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 00:00:00 UTC");
    }

    #[test]
    fn rejects_invalid_timestamp() {
        assert!(parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn reads_feed_and_derives_missing_season() {
        let observations = read_observations(FEED.as_bytes()).unwrap();
        assert_eq!(observations.len(), 4);

        let oslo_jan = &observations[1];
        assert_eq!(oslo_jan.city, "Oslo");
        assert_eq!(oslo_jan.season, Season::Winter);
    }

    #[test]
    fn explicit_season_column_wins() {
        let feed = "city,timestamp,temperature,season\nQuito,2024-07-01,12.0,winter\n";
        let observations = read_observations(feed.as_bytes()).unwrap();
        assert_eq!(observations[0].season, Season::Winter);
    }

    #[test]
    fn strict_read_fails_on_bad_temperature() {
        let feed = "city,timestamp,temperature\nOslo,2024-01-15,cold\n";
        let err = read_observations(feed.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRecord { line: 2, .. }
        ));
    }

    #[test]
    fn strict_read_fails_on_missing_city() {
        let feed = "city,timestamp,temperature\n,2024-01-15,3.0\n";
        assert!(read_observations(feed.as_bytes()).is_err());
    }

    #[test]
    fn strict_read_fails_on_unknown_season_label() {
        let feed = "city,timestamp,temperature,season\nOslo,2024-01-15,3.0,monsoon\n";
        assert!(read_observations(feed.as_bytes()).is_err());
    }

    #[test]
    fn lossy_read_drops_bad_rows_and_counts_them() {
        let feed = "\
city,timestamp,temperature
Oslo,2024-01-15,-6.0
Oslo,bad-date,1.0
Oslo,2024-01-16,abc
Oslo,2024-01-17,-4.0
";
        let (observations, dropped) = read_observations_lossy(feed.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn groups_by_city_and_sorts_within_each() {
        let observations = read_observations(FEED.as_bytes()).unwrap();
        let series = group_by_city(observations);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].city, "Berlin");
        assert_eq!(series[1].city, "Oslo");
        assert_eq!(series[0].temperatures(), vec![26.0, 28.5]);
        assert_eq!(series[1].temperatures(), vec![-6.0, -4.5]);
    }
}
