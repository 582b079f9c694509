//! # gridcache
//!
//! A Rust library for querying gridded climate datasets stored as one NetCDF
//! file per day.
//!
//! ## Features
//!
//! - **Flattened tables**: each `(time, lat, lon)` grid becomes a polars `DataFrame`
//!   with one row per grid cell and one column per variable
//! - **Point time series**: rows at one coordinate across many files, in file order
//! - **Time slices**: the whole grid at one time value across many files, tagged by file
//! - **Lazy cache**: files load on first use and can be evicted per query
//! - **Correlation analysis**: Pearson and Spearman matrices over query results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridcache::cache::DatasetCache;
//!
//! let mut cache = DatasetCache::new();
//! let files = [
//!     "MERRA2_400.tavg1_2d_flx_Nx.20220429.nc4",
//!     "MERRA2_400.tavg1_2d_flx_Nx.20220430.nc4",
//! ];
//!
//! // Two days of hourly precipitation at one grid point
//! let series = cache.time_series(&files, 32.5, 35.0, &["total_precipitation"], true)?;
//!
//! // Precipitation over the whole grid at time 30, one block of rows per file
//! let slice = cache.time_slice_multi(&files, 30.0, "total_precipitation", true)?;
//! # Ok::<(), gridcache::error::GridError>(())
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod grid;
pub mod info;
pub mod log;
pub mod output;
pub mod source;


use crate::analysis::{CorrelationMethod, correlation_matrix};
use crate::cache::DatasetCache;
use crate::config::{SeriesJob, SliceJob};
use crate::output::write_dataframe;
use crate::source::GridSource;
use polars::prelude::DataFrame;

/// Rows and correlation matrices produced by a series job.
#[derive(Debug, Clone)]
pub struct SeriesReport {
    pub rows: DataFrame,
    pub correlations: Vec<(CorrelationMethod, DataFrame)>,
}

/// Runs a series job against `cache`.
///
/// Queries every file in the job, computes the requested correlation matrices
/// over the job's variables, and writes the merged rows when the job names an
/// output file.
///
/// # Errors
///
/// This function will return an error if:
/// - Any file cannot be loaded
/// - A variable is not a column of a loaded file
/// - The output file cannot be written
pub fn process_series_job<S: GridSource>(
    cache: &mut DatasetCache<S>,
    job: &SeriesJob,
) -> anyhow::Result<SeriesReport> {
    let rows = cache.time_series(&job.files, job.lat, job.lon, &job.variables, job.cache)?;

    let mut correlations = Vec::with_capacity(job.correlations.len());
    for &method in &job.correlations {
        correlations.push((method, correlation_matrix(&rows, &job.variables, method)?));
    }

    if let Some(output) = &job.output {
        write_dataframe(&rows, output)?;
    }

    Ok(SeriesReport { rows, correlations })
}

/// Runs a slice job against `cache`, writing the rows when the job names an output file.
pub fn process_slice_job<S: GridSource>(
    cache: &mut DatasetCache<S>,
    job: &SliceJob,
) -> anyhow::Result<DataFrame> {
    let rows = cache.time_slice_multi(&job.files, job.time, &job.variable, job.cache)?;

    if let Some(output) = &job.output {
        write_dataframe(&rows, output)?;
    }

    Ok(rows)
}
