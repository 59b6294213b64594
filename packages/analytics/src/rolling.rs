//! Trailing-window baselines and the historical anomaly classifier.
//!
//! The window is right-aligned and causal: the statistic at position `i`
//! covers indices `max(0, i - window + 1)..=i` and never looks ahead.
//! Baselines are maintained incrementally with a running sum and sum of
//! squares, evicting the sample that falls off the window's left edge,
//! so the whole series costs O(n) rather than O(n * window).

use tempwatch_analytics_models::{AnnotatedObservation, RollingParams, RollingStat};
use tempwatch_weather_models::CitySeries;

use crate::outside_band;

/// Incremental accumulator over the trailing window.
#[derive(Debug, Default)]
struct WindowAccumulator {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl WindowAccumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    fn evict(&mut self, value: f64) {
        self.count -= 1;
        self.sum -= value;
        self.sum_sq -= value * value;
    }

    fn mean(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        self.sum / n
    }

    /// Sample standard deviation (divisor n-1), `None` below 2 samples.
    ///
    /// Floating-point cancellation in `sum_sq - sum^2/n` can dip slightly
    /// negative for near-constant windows; clamp at zero before the root.
    fn sample_std_dev(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        Some(variance.max(0.0).sqrt())
    }
}

/// Computes a [`RollingStat`] for every position of a time-sorted series.
///
/// Every position produces a mean (the window always holds at least one
/// sample); the standard deviation is `None` until the window holds at
/// least two samples and at least `min_periods` samples, so no anomaly
/// band exists there by construction.
#[must_use]
pub fn rolling_stats(series: &CitySeries, params: &RollingParams) -> Vec<RollingStat> {
    let temps = series.temperatures();
    let mut acc = WindowAccumulator::default();
    let mut stats = Vec::with_capacity(temps.len());

    // A zero window would evict the sample it just pushed and divide by
    // zero; the smallest meaningful window is a single sample.
    let window = params.window.max(1);

    for (index, &temp) in temps.iter().enumerate() {
        acc.push(temp);
        if index >= window {
            acc.evict(temps[index - window]);
        }

        let std_dev = if acc.count < params.min_periods {
            None
        } else {
            acc.sample_std_dev()
        };
        stats.push(RollingStat {
            index,
            mean: acc.mean(),
            std_dev,
        });
    }

    stats
}

/// Annotates every observation of a series with its rolling baseline and
/// anomaly flag.
///
/// An observation is anomalous when its temperature falls strictly
/// outside `mean ± sigma_multiplier * std_dev` of its own trailing
/// window. Positions without a defined standard deviation are never
/// anomalous.
#[must_use]
pub fn annotate_series(series: &CitySeries, params: &RollingParams) -> Vec<AnnotatedObservation> {
    let stats = rolling_stats(series, params);

    let annotated: Vec<AnnotatedObservation> = series
        .observations
        .iter()
        .zip(stats)
        .map(|(observation, rolling)| {
            let is_anomaly = rolling.std_dev.is_some_and(|std_dev| {
                outside_band(
                    observation.temperature,
                    rolling.mean,
                    std_dev,
                    params.sigma_multiplier,
                )
            });
            AnnotatedObservation {
                observation: observation.clone(),
                rolling,
                is_anomaly,
            }
        })
        .collect();

    let anomalies = annotated.iter().filter(|a| a.is_anomaly).count();
    log::debug!(
        "Annotated {} observations for {}: {anomalies} anomalies",
        annotated.len(),
        series.city,
    );

    annotated
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone as _, Utc};
    use tempwatch_weather_models::Observation;

    use super::*;

    fn series(temps: &[f64]) -> CitySeries {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = temps
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let days = i64::try_from(i).unwrap();
                Observation::new("X", start + Duration::days(days), t)
            })
            .collect();
        CitySeries::from_unsorted("X", observations)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_sample_has_mean_but_no_std_dev() {
        let stats = rolling_stats(&series(&[21.5]), &RollingParams::default());
        assert_eq!(stats.len(), 1);
        assert_close(stats[0].mean, 21.5);
        assert!(stats[0].std_dev.is_none());
    }

    #[test]
    fn single_sample_is_never_anomalous() {
        let annotated = annotate_series(&series(&[21.5]), &RollingParams::default());
        assert!(!annotated[0].is_anomaly);
    }

    #[test]
    fn growing_window_matches_naive_recompute() {
        let temps = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.0, 6.0];
        let params = RollingParams {
            window: 4,
            ..RollingParams::default()
        };
        let stats = rolling_stats(&series(&temps), &params);

        for (i, stat) in stats.iter().enumerate() {
            let lo = i.saturating_sub(params.window - 1);
            let window = &temps[lo..=i];
            #[allow(clippy::cast_precision_loss)]
            let n = window.len() as f64;
            let mean = window.iter().sum::<f64>() / n;
            assert_close(stat.mean, mean);

            if window.len() < 2 {
                assert!(stat.std_dev.is_none());
            } else {
                let var =
                    window.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1.0);
                assert_close(stat.std_dev.unwrap(), var.sqrt());
            }
        }
    }

    #[test]
    fn window_is_causal() {
        // A wild value late in the series must not affect earlier stats.
        let base = [10.0, 11.0, 9.0, 10.5];
        let mut spiked = base.to_vec();
        spiked.push(1000.0);

        let params = RollingParams::default();
        let stats_base = rolling_stats(&series(&base), &params);
        let stats_spiked = rolling_stats(&series(&spiked), &params);

        for (a, b) in stats_base.iter().zip(&stats_spiked) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let temps = [5.0, 6.5, 4.2, 7.7, 5.5, 6.0];
        let s = series(&temps);
        let params = RollingParams::default();
        assert_eq!(rolling_stats(&s, &params), rolling_stats(&s, &params));
    }

    #[test]
    fn constant_window_has_zero_std_dev() {
        let stats = rolling_stats(&series(&[12.0; 40]), &RollingParams::default());
        for stat in stats.iter().skip(1) {
            assert_close(stat.mean, 12.0);
            assert_close(stat.std_dev.unwrap(), 0.0);
        }
    }

    #[test]
    fn band_edges_are_not_anomalous() {
        // Strict inequalities: a value exactly on mean +/- 2*sigma is
        // inside the band. All values here are exact in binary.
        assert!(!outside_band(29.5, 15.0, 7.25, 2.0));
        assert!(!outside_band(0.5, 15.0, 7.25, 2.0));
        assert!(outside_band(29.500_001, 15.0, 7.25, 2.0));
        assert!(outside_band(0.499_999, 15.0, 7.25, 2.0));
    }

    #[test]
    fn constant_band_stays_normal_and_flags_any_deviation() {
        // A constant window collapses the band to a single point, which
        // itself must not be flagged. The window contains the evaluated
        // sample, so a lone deviation among five constants still lands
        // outside the band it widens.
        let params = RollingParams {
            window: 6,
            ..RollingParams::default()
        };
        let annotated = annotate_series(&series(&[10.0; 6]), &params);
        assert!(!annotated[5].is_anomaly);

        let annotated =
            annotate_series(&series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.5]), &params);
        assert!(annotated[5].is_anomaly);
    }

    #[test]
    fn spike_outside_band_is_flagged() {
        let mut temps = vec![10.0; 29];
        temps.push(25.0);
        let annotated = annotate_series(&series(&temps), &RollingParams::default());
        assert!(annotated[29].is_anomaly);
        assert!(annotated[..29].iter().all(|a| !a.is_anomaly));
    }

    #[test]
    fn eviction_forgets_old_samples() {
        // After the window slides past the cold prefix, stats reflect
        // only the warm tail.
        let mut temps = vec![0.0; 5];
        temps.extend_from_slice(&[20.0; 10]);
        let params = RollingParams {
            window: 5,
            ..RollingParams::default()
        };
        let stats = rolling_stats(&series(&temps), &params);
        let last = stats.last().unwrap();
        assert_close(last.mean, 20.0);
        assert_close(last.std_dev.unwrap(), 0.0);
    }

    #[test]
    fn zero_window_behaves_like_single_sample_window() {
        let params = RollingParams {
            window: 0,
            ..RollingParams::default()
        };
        let stats = rolling_stats(&series(&[1.0, 2.0, 3.0]), &params);

        for (i, stat) in stats.iter().enumerate() {
            assert!(stat.mean.is_finite());
            #[allow(clippy::cast_precision_loss)]
            let expected = (i + 1) as f64;
            assert_close(stat.mean, expected);
            assert!(stat.std_dev.is_none());
        }
    }

    #[test]
    fn min_periods_gates_the_band() {
        let params = RollingParams {
            window: 10,
            min_periods: 4,
            ..RollingParams::default()
        };
        let stats = rolling_stats(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]), &params);
        assert!(stats[2].std_dev.is_none());
        assert!(stats[3].std_dev.is_some());
    }
}
