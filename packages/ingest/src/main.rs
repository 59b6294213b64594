#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for temperature anomaly analysis.
//!
//! The live reading for `check` is passed on the command line; fetching
//! it from a weather API is a separate concern that stays outside this
//! tool. The same goes for the current month, so runs are reproducible.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tempwatch_analytics::{live, rolling, seasonal};
use tempwatch_analytics_models::{AnnotatedObservation, RollingParams, SeasonalBaseline};
use tempwatch_ingest::{group_by_city, read_observations, read_observations_lossy};
use tempwatch_weather_models::{CitySeries, Observation, Season};

#[derive(Parser)]
#[command(name = "tempwatch", about = "Temperature anomaly analysis tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate historical series with rolling baselines and anomalies
    Analyze {
        /// CSV file with columns `city,timestamp,temperature[,season]`
        #[arg(long)]
        file: PathBuf,
        /// Only analyze this city (default: every city in the feed)
        #[arg(long)]
        city: Option<String>,
        /// Drop malformed rows instead of aborting on the first one
        #[arg(long)]
        skip_malformed: bool,
        /// Emit the annotated series and seasonal baselines as JSON
        /// instead of the text summary
        #[arg(long)]
        json: bool,
    },
    /// Check one live reading against a city's seasonal baseline
    Check {
        /// CSV file with the city's historical data
        #[arg(long)]
        file: PathBuf,
        /// City the reading belongs to
        #[arg(long)]
        city: String,
        /// Live temperature reading in degrees Celsius
        #[arg(long)]
        temperature: f64,
        /// Current calendar month (1-12), used to pick the season
        #[arg(long)]
        month: u8,
        /// Drop malformed rows instead of aborting on the first one
        #[arg(long)]
        skip_malformed: bool,
    },
    /// Print the month-to-season mapping
    Seasons,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            city,
            skip_malformed,
            json,
        } => {
            let observations = load(&file, skip_malformed)?;
            let mut series = group_by_city(observations);
            if let Some(city) = city {
                series.retain(|s| s.city == city);
                if series.is_empty() {
                    return Err(format!("No observations for city: {city}").into());
                }
            }

            let params = RollingParams::default();
            for s in &series {
                let report = build_report(s, &params);
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_analysis(s, &report.annotated);
                    print_baselines(&s.city, &report.seasonal_baselines);
                }
            }
        }
        Commands::Check {
            file,
            city,
            temperature,
            month,
            skip_malformed,
        } => {
            let season = Season::from_month(month)?;
            let observations = load(&file, skip_malformed)?;
            let series = group_by_city(observations)
                .into_iter()
                .find(|s| s.city == city)
                .ok_or_else(|| format!("No observations for city: {city}"))?;

            let baselines = seasonal::seasonal_baselines(&series);
            let table: Vec<SeasonalBaseline> = baselines.values().copied().collect();
            print_baselines(&series.city, &table);
            let verdict = live::classify_reading(temperature, season, &baselines);
            println!("{temperature} °C in {city} ({season}): {verdict}");
        }
        Commands::Seasons => {
            println!("{:<8} SEASON", "MONTH");
            println!("{}", "-".repeat(20));
            for month in 1..=12u8 {
                let season = Season::from_month(month)?;
                println!("{month:<8} {season}");
            }
        }
    }

    Ok(())
}

/// Everything `analyze` reports for one city: the annotated series plus
/// the per-season descriptive table, so display collaborators get both
/// from a single payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CityReport {
    city: String,
    annotated: Vec<AnnotatedObservation>,
    seasonal_baselines: Vec<SeasonalBaseline>,
}

fn build_report(series: &CitySeries, params: &RollingParams) -> CityReport {
    CityReport {
        city: series.city.clone(),
        annotated: rolling::annotate_series(series, params),
        seasonal_baselines: seasonal::seasonal_baselines(series)
            .into_values()
            .collect(),
    }
}

/// Loads observations from a feed file, strict or lossy per the
/// `--skip-malformed` flag.
fn load(
    file: &Path,
    skip_malformed: bool,
) -> Result<Vec<Observation>, Box<dyn std::error::Error>> {
    let reader = File::open(file)?;
    if skip_malformed {
        let (observations, dropped) = read_observations_lossy(reader)?;
        if dropped > 0 {
            log::info!("Continuing without {dropped} malformed row(s)");
        }
        Ok(observations)
    } else {
        Ok(read_observations(reader)?)
    }
}

fn print_analysis(series: &CitySeries, annotated: &[AnnotatedObservation]) {
    let anomalies: Vec<&AnnotatedObservation> =
        annotated.iter().filter(|a| a.is_anomaly).collect();

    println!(
        "{}: {} observations, {} anomalies",
        series.city,
        annotated.len(),
        anomalies.len()
    );
    for a in anomalies {
        let band = a
            .rolling
            .std_dev
            .map_or_else(String::new, |sd| format!(" (mean {:.2}, sd {sd:.2})", a.rolling.mean));
        println!(
            "  {}  {:.1} °C{band}",
            a.observation.timestamp.format("%Y-%m-%d %H:%M"),
            a.observation.temperature,
        );
    }
}

fn print_baselines(city: &str, baselines: &[SeasonalBaseline]) {
    println!("Seasonal baselines for {city}:");
    println!("{:<8} {:>6} {:>10} {:>10}", "SEASON", "COUNT", "MEAN", "STD DEV");
    for baseline in baselines {
        let sd = baseline
            .std_dev
            .map_or_else(|| "-".to_string(), |sd| format!("{sd:.2}"));
        println!(
            "{:<8} {:>6} {:>10.2} {:>10}",
            baseline.season, baseline.count, baseline.mean, sd,
        );
    }
}
