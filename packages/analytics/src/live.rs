//! Season-aware classification of a single live temperature reading.
//!
//! The current season is an explicit input; callers derive it from their
//! own clock (or a `--month` flag) so nothing in here ever reads wall
//! time.

use std::collections::BTreeMap;

use tempwatch_analytics_models::{LiveVerdict, SeasonalBaseline};
use tempwatch_weather_models::Season;

use crate::{SIGMA_MULTIPLIER, outside_band};

/// Classifies one live reading against the current season's baseline
/// using the default 2-sigma band.
#[must_use]
pub fn classify_reading(
    temperature: f64,
    season: Season,
    baselines: &BTreeMap<Season, SeasonalBaseline>,
) -> LiveVerdict {
    classify_reading_with(temperature, season, baselines, SIGMA_MULTIPLIER)
}

/// Classifies one live reading with an explicit sigma multiplier.
///
/// Returns [`LiveVerdict::InsufficientBaselineData`] when the city has no
/// baseline entry for the season, or when the entry's standard deviation
/// is undefined (a single historical sample). That verdict is a distinct
/// outcome consumers must not fold into `Normal`.
#[must_use]
pub fn classify_reading_with(
    temperature: f64,
    season: Season,
    baselines: &BTreeMap<Season, SeasonalBaseline>,
    sigma_multiplier: f64,
) -> LiveVerdict {
    let Some(baseline) = baselines.get(&season) else {
        log::debug!("No historical observations for {season}; cannot classify");
        return LiveVerdict::InsufficientBaselineData;
    };
    let Some(std_dev) = baseline.std_dev else {
        log::debug!(
            "Only {} historical observation(s) for {season}; cannot classify",
            baseline.count,
        );
        return LiveVerdict::InsufficientBaselineData;
    };

    if outside_band(temperature, baseline.mean, std_dev, sigma_multiplier) {
        LiveVerdict::Anomalous
    } else {
        LiveVerdict::Normal
    }
}
