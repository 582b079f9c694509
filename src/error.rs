//! # Error Types
//!
//! Errors raised while loading NetCDF grids and querying the resulting tables.
//!
//! Two layers exist:
//! - [`DataSourceError`]: the file could not be turned into a [`GridTable`](crate::grid::GridTable)
//!   (missing, unreadable, malformed, or a variable whose shape does not match the grid).
//! - [`GridError`]: anything that can go wrong while answering a query, which includes
//!   load failures of files touched by a multi-file query.
//!
//! Invalid coordinates and time values that match no rows are *not* errors; those
//! queries return empty tables.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failure to load a gridded dataset from its source file.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Failed to open NetCDF file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Coordinate axis '{axis}' not found in '{path}'")]
    MissingAxis { path: String, axis: String },

    #[error("Failed to read variable '{variable}' from '{path}': {source}")]
    Read {
        path: String,
        variable: String,
        #[source]
        source: netcdf::Error,
    },

    #[error(
        "Variable '{variable}' in '{path}' has dimensions {found_dims:?} with shape {found:?}, \
         expected {expected_dims:?} with shape {expected:?}"
    )]
    ShapeMismatch {
        path: String,
        variable: String,
        expected_dims: Vec<String>,
        expected: Vec<usize>,
        found_dims: Vec<String>,
        found: Vec<usize>,
    },

    #[error("Failed to build table for '{path}': {source}")]
    Table {
        path: String,
        #[source]
        source: PolarsError,
    },
}

/// Errors returned by table and cache queries.
#[derive(Error, Debug)]
pub enum GridError {
    #[error(transparent)]
    Source(#[from] DataSourceError),

    #[error("Variable '{0}' is not a column of the table")]
    UnknownVariable(String),

    #[error("Table for '{0}' has been released")]
    TableReleased(String),

    #[error("Polars error: {0}")]
    Frame(#[from] PolarsError),
}

/// Result type for grid and cache operations
pub type GridResult<T> = Result<T, GridError>;
