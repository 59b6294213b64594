//! Per-season historical baselines for one city.

use std::collections::BTreeMap;

use tempwatch_analytics_models::SeasonalBaseline;
use tempwatch_weather_models::{CitySeries, Season};

/// Partitions a city's full history by season and computes each group's
/// mean and sample standard deviation.
///
/// Seasons with no observations produce no entry at all; absence is the
/// signal the live classifier turns into an insufficient-data verdict
/// rather than a default of zero. Groups with a single observation get a
/// mean but `std_dev: None`.
#[must_use]
pub fn seasonal_baselines(series: &CitySeries) -> BTreeMap<Season, SeasonalBaseline> {
    let mut groups: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for obs in &series.observations {
        groups.entry(obs.season).or_default().push(obs.temperature);
    }

    groups
        .into_iter()
        .map(|(season, temps)| {
            #[allow(clippy::cast_precision_loss)]
            let n = temps.len() as f64;
            let mean = temps.iter().sum::<f64>() / n;
            let std_dev = (temps.len() >= 2).then(|| {
                let ss = temps.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
                (ss / (n - 1.0)).sqrt()
            });
            let baseline = SeasonalBaseline {
                season,
                count: temps.len(),
                mean,
                std_dev,
            };
            (season, baseline)
        })
        .collect()
}
