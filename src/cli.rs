//! # CLI Module
//!
//! This module provides the command-line interface for gridcache, including:
//! - Argument parsing with clap
//! - Job file loading (JSON/YAML) with command-line overrides
//! - Environment variable support with the GRIDCACHE_ prefix
//! - Subcommands for series, slice, info and shell completions

use crate::analysis::CorrelationMethod;
use crate::config::{AxisNames, JobConfig, SeriesJob, SliceJob};
use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cached multi-file queries over gridded NetCDF climate data
#[derive(Parser, Debug)]
#[command(name = "gridcache")]
#[command(about = "Query time series and time slices across daily NetCDF grid files")]
#[command(version)]
#[command(long_about = "
gridcache loads gridded climate datasets (time x lat x lon) from per-day NetCDF
files, flattens them into tables, and answers two kinds of queries across many
files: a time series at one coordinate and a spatial snapshot at one time.

EXAMPLES:
  # Time series at a grid point across three days
  gridcache series day1.nc4 day2.nc4 day3.nc4 --lat 32.5 --lon 35 \\
    -n total_precipitation -n surface_air_temperature

  # With correlation matrices
  gridcache series day1.nc4 --lat 32.5 --lon 35 -n a -n b --correlate pearson

  # Snapshot of one variable at time 30, written to Parquet
  gridcache slice day1.nc4 day2.nc4 --time 30 -n total_precipitation -o slice.parquet

  # Using a job file
  gridcache series --config job.yaml

  # File inspection
  gridcache info day1.nc4 --format json
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Job file path (JSON or YAML)
    #[arg(short, long, global = true, env = "GRIDCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Time series of variables at one coordinate across files
    Series(SeriesArgs),

    /// Snapshot of one variable at one time across files
    Slice(SliceArgs),

    /// Show dimensions, variables and valid coordinates of a grid file
    Info {
        /// Grid file path
        file: String,

        /// Output format for file information
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,

        #[command(flatten)]
        axes: AxisArgs,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SeriesArgs {
    /// Grid files, in the order their rows should appear
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Latitude of the grid point
    #[arg(long, allow_negative_numbers = true, env = "GRIDCACHE_LAT")]
    pub lat: Option<f64>,

    /// Longitude of the grid point
    #[arg(long, allow_negative_numbers = true, env = "GRIDCACHE_LON")]
    pub lon: Option<f64>,

    /// Long name of a variable to extract (repeatable)
    #[arg(short = 'n', long = "variable")]
    pub variables: Vec<String>,

    /// Evict each file from the cache after it has been queried
    #[arg(long)]
    pub no_cache: bool,

    /// Compute a correlation matrix between the variables (repeatable)
    #[arg(long = "correlate", value_enum)]
    pub correlations: Vec<CorrelationMethod>,

    /// Write the merged rows to a Parquet or CSV file
    #[arg(short, long, env = "GRIDCACHE_OUTPUT")]
    pub output: Option<String>,

    #[command(flatten)]
    pub axes: AxisArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SliceArgs {
    /// Grid files, in the order their rows should appear
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Time value to select
    #[arg(long, allow_negative_numbers = true)]
    pub time: Option<f64>,

    /// Long name of the variable to extract
    #[arg(short = 'n', long)]
    pub variable: Option<String>,

    /// Evict each file from the cache after it has been queried
    #[arg(long)]
    pub no_cache: bool,

    /// Write the merged rows to a Parquet or CSV file
    #[arg(short, long, env = "GRIDCACHE_OUTPUT")]
    pub output: Option<String>,

    #[command(flatten)]
    pub axes: AxisArgs,
}

/// Overrides for the names of the coordinate axes
#[derive(Args, Debug, Clone, Default)]
pub struct AxisArgs {
    /// Name of the time axis
    #[arg(long, env = "GRIDCACHE_TIME_AXIS")]
    pub time_axis: Option<String>,

    /// Name of the latitude axis
    #[arg(long, env = "GRIDCACHE_LAT_AXIS")]
    pub lat_axis: Option<String>,

    /// Name of the longitude axis
    #[arg(long, env = "GRIDCACHE_LON_AXIS")]
    pub lon_axis: Option<String>,
}

#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
}

impl AxisArgs {
    /// Applies the overrides on top of `base`.
    pub fn apply(self, base: AxisNames) -> AxisNames {
        AxisNames {
            time: self.time_axis.unwrap_or(base.time),
            lat: self.lat_axis.unwrap_or(base.lat),
            lon: self.lon_axis.unwrap_or(base.lon),
        }
    }
}

impl SeriesArgs {
    /// Builds a series job from these arguments, layered over a job file if one
    /// was given. Command-line values win; empty lists fall back to the file.
    pub fn into_job(self, base: Option<JobConfig>) -> Result<SeriesJob> {
        let base = match base {
            Some(JobConfig::Series(job)) => Some(job),
            Some(other) => bail!("Job file describes a '{}' job, expected 'series'", other.kind()),
            None => None,
        };

        let job = match base {
            Some(job) => SeriesJob {
                files: non_empty_or(self.files, job.files),
                lat: self.lat.unwrap_or(job.lat),
                lon: self.lon.unwrap_or(job.lon),
                variables: non_empty_or(self.variables, job.variables),
                cache: job.cache && !self.no_cache,
                correlations: non_empty_or(self.correlations, job.correlations),
                output: self.output.or(job.output),
                axes: self.axes.apply(job.axes),
            },
            None => {
                let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
                    bail!("Both --lat and --lon are required without a job file");
                };
                SeriesJob {
                    files: self.files,
                    lat,
                    lon,
                    variables: self.variables,
                    cache: !self.no_cache,
                    correlations: self.correlations,
                    output: self.output,
                    axes: self.axes.apply(AxisNames::default()),
                }
            }
        };

        if job.files.is_empty() {
            bail!("No input files given");
        }
        if job.variables.is_empty() {
            bail!("At least one variable is required (-n/--variable)");
        }
        Ok(job)
    }
}

impl SliceArgs {
    /// Builds a slice job from these arguments, layered over a job file if one
    /// was given. Command-line values win.
    pub fn into_job(self, base: Option<JobConfig>) -> Result<SliceJob> {
        let base = match base {
            Some(JobConfig::Slice(job)) => Some(job),
            Some(other) => bail!("Job file describes a '{}' job, expected 'slice'", other.kind()),
            None => None,
        };

        let job = match base {
            Some(job) => SliceJob {
                files: non_empty_or(self.files, job.files),
                time: self.time.unwrap_or(job.time),
                variable: self.variable.unwrap_or(job.variable),
                cache: job.cache && !self.no_cache,
                output: self.output.or(job.output),
                axes: self.axes.apply(job.axes),
            },
            None => {
                let Some(time) = self.time else {
                    bail!("--time is required without a job file");
                };
                let Some(variable) = self.variable else {
                    bail!("A variable is required (-n/--variable)");
                };
                SliceJob {
                    files: self.files,
                    time,
                    variable,
                    cache: !self.no_cache,
                    output: self.output,
                    axes: self.axes.apply(AxisNames::default()),
                }
            }
        };

        if job.files.is_empty() {
            bail!("No input files given");
        }
        Ok(job)
    }
}

fn non_empty_or<T>(preferred: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if preferred.is_empty() { fallback } else { preferred }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_base() -> JobConfig {
        JobConfig::Series(SeriesJob {
            files: vec!["a.nc4".to_string(), "b.nc4".to_string()],
            lat: 10.0,
            lon: 20.0,
            variables: vec!["total_precipitation".to_string()],
            cache: true,
            correlations: vec![CorrelationMethod::Pearson],
            output: Some("base.parquet".to_string()),
            axes: AxisNames::default(),
        })
    }

    #[test]
    fn test_series_args_without_config() {
        let args = SeriesArgs {
            files: vec!["day.nc4".to_string()],
            lat: Some(-33.5),
            lon: Some(151.25),
            variables: vec!["evaporation_from_turbulence".to_string()],
            no_cache: true,
            ..Default::default()
        };

        let job = args.into_job(None).unwrap();
        assert_eq!(job.lat, -33.5);
        assert_eq!(job.lon, 151.25);
        assert!(!job.cache);
        assert_eq!(job.axes, AxisNames::default());
    }

    #[test]
    fn test_series_args_require_coordinates() {
        let args = SeriesArgs {
            files: vec!["day.nc4".to_string()],
            lat: Some(1.0),
            variables: vec!["v".to_string()],
            ..Default::default()
        };
        assert!(args.into_job(None).is_err());
    }

    #[test]
    fn test_series_args_override_config() {
        let args = SeriesArgs {
            lat: Some(32.5),
            variables: vec!["surface_air_temperature".to_string()],
            no_cache: true,
            axes: AxisArgs {
                lat_axis: Some("latitude".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let job = args.into_job(Some(series_base())).unwrap();
        assert_eq!(job.files, vec!["a.nc4", "b.nc4"]);
        assert_eq!(job.lat, 32.5);
        assert_eq!(job.lon, 20.0);
        assert_eq!(job.variables, vec!["surface_air_temperature"]);
        assert!(!job.cache);
        assert_eq!(job.correlations, vec![CorrelationMethod::Pearson]);
        assert_eq!(job.output.as_deref(), Some("base.parquet"));
        assert_eq!(job.axes.lat, "latitude");
        assert_eq!(job.axes.lon, "lon");
    }

    #[test]
    fn test_series_args_reject_slice_config() {
        let slice = JobConfig::Slice(SliceJob {
            files: vec!["a.nc4".to_string()],
            time: 0.0,
            variable: "v".to_string(),
            cache: true,
            output: None,
            axes: AxisNames::default(),
        });
        assert!(SeriesArgs::default().into_job(Some(slice)).is_err());
    }

    #[test]
    fn test_slice_args_without_config() {
        let args = SliceArgs {
            files: vec!["a.nc4".to_string(), "b.nc4".to_string()],
            time: Some(30.0),
            variable: Some("total_precipitation".to_string()),
            ..Default::default()
        };

        let job = args.into_job(None).unwrap();
        assert_eq!(job.time, 30.0);
        assert!(job.cache);
        assert_eq!(job.files.len(), 2);
    }

    #[test]
    fn test_slice_args_require_files() {
        let args = SliceArgs {
            time: Some(0.0),
            variable: Some("v".to_string()),
            ..Default::default()
        };
        assert!(args.into_job(None).is_err());
    }
}
