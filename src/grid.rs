//! # Grid Tables
//!
//! A [`GridTable`] is one gridded file flattened into a polars [`DataFrame`]:
//! one row per `(time, lat, lon)` combination, with time varying slowest and lon
//! fastest, and one `f64` column per data variable named by its long name.
//!
//! ## Key Components
//!
//! - [`GridTable`]: the flattened table plus the file's dimension and variable metadata
//! - [`CoordinateSet`]: the latitudes or longitudes a table accepts in point queries
//! - [`PointQuery`]: typed outcome of a point query, separating invalid coordinates
//!   from valid coordinates that happen to have no rows

use crate::error::{DataSourceError, GridError, GridResult};
use crate::source::{GridSource, NetCdfSource, RawGrid};
use log::{debug, warn};
use polars::prelude::*;
use std::collections::HashMap;

pub const TIME_COLUMN: &str = "time";
pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "lon";

const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Sorted, de-duplicated set of coordinate values.
///
/// Membership is exact float equality, with `-0.0` and `0.0` treated as the same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateSet {
    values: Vec<f64>,
}

impl CoordinateSet {
    /// Collects the values lying in `[min, max]`; NaN is never included.
    pub fn within<I>(values: I, min: f64, max: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values: Vec<f64> = values
            .into_iter()
            .filter(|v| *v >= min && *v <= max)
            .map(normalize_zero)
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        CoordinateSet { values }
    }

    pub fn contains(&self, value: f64) -> bool {
        let value = normalize_zero(value);
        self.values
            .binary_search_by(|probe| probe.total_cmp(&value))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Outcome of a point time-series query.
#[derive(Debug, Clone)]
pub enum PointQuery {
    /// The coordinate is valid; rows may still be empty.
    Rows(DataFrame),
    /// The coordinate is out of range or not on the grid.
    InvalidCoordinate { lat: f64, lon: f64 },
}

impl PointQuery {
    pub fn is_invalid_coordinate(&self) -> bool {
        matches!(self, PointQuery::InvalidCoordinate { .. })
    }
}

/// One gridded file as a queryable flat table.
#[derive(Debug, Clone)]
pub struct GridTable {
    path: String,
    dimensions: HashMap<String, usize>,
    variable_index: HashMap<String, String>,
    data_variables: Vec<String>,
    table: Option<DataFrame>,
    valid_latitudes: CoordinateSet,
    valid_longitudes: CoordinateSet,
}

impl GridTable {
    /// Loads a NetCDF file using the default axis names (`time`, `lat`, `lon`).
    pub fn open(path: &str) -> Result<Self, DataSourceError> {
        NetCdfSource::default().load(path)
    }

    /// Flattens a raw grid into a table.
    ///
    /// Every data variable must span exactly the `(time, lat, lon)` axes, in that
    /// order and with matching lengths; anything else fails with
    /// [`DataSourceError::ShapeMismatch`] instead of producing misaligned rows.
    pub fn from_raw(raw: RawGrid) -> Result<Self, DataSourceError> {
        let RawGrid {
            path,
            axes,
            dimensions,
            variable_index,
            time,
            lat,
            lon,
            variables,
        } = raw;

        let expected_dims = axes.as_vec();
        let expected = vec![time.len(), lat.len(), lon.len()];
        let rows = time.len() * lat.len() * lon.len();

        for var in &variables {
            let shape_ok = var.dimensions == expected_dims && var.shape == expected;
            if !shape_ok || var.values.len() != rows {
                return Err(DataSourceError::ShapeMismatch {
                    path,
                    variable: var.name.clone(),
                    expected_dims,
                    expected,
                    found_dims: var.dimensions.clone(),
                    found: if shape_ok {
                        vec![var.values.len()]
                    } else {
                        var.shape.clone()
                    },
                });
            }
        }

        let mut time_values = Vec::with_capacity(rows);
        let mut lat_values = Vec::with_capacity(rows);
        let mut lon_values = Vec::with_capacity(rows);
        for &t in &time {
            for &la in &lat {
                for &lo in &lon {
                    time_values.push(t);
                    lat_values.push(la);
                    lon_values.push(lo);
                }
            }
        }

        let mut columns: Vec<Column> = vec![
            Series::new(TIME_COLUMN.into(), time_values).into(),
            Series::new(LAT_COLUMN.into(), lat_values).into(),
            Series::new(LON_COLUMN.into(), lon_values).into(),
        ];
        let mut data_variables = Vec::with_capacity(variables.len());
        for var in variables {
            columns.push(Series::new(var.long_name.as_str().into(), var.values).into());
            data_variables.push(var.long_name);
        }

        let table = DataFrame::new(columns).map_err(|source| DataSourceError::Table {
            path: path.clone(),
            source,
        })?;

        let valid_latitudes = CoordinateSet::within(lat, LATITUDE_RANGE.0, LATITUDE_RANGE.1);
        let valid_longitudes = CoordinateSet::within(lon, LONGITUDE_RANGE.0, LONGITUDE_RANGE.1);

        debug!(
            "Built table for {}: {} rows, {} variables",
            path,
            table.height(),
            data_variables.len()
        );

        Ok(GridTable {
            path,
            dimensions,
            variable_index,
            data_variables,
            table: Some(table),
            valid_latitudes,
            valid_longitudes,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dimension sizes of the source file
    pub fn dimensions(&self) -> &HashMap<String, usize> {
        &self.dimensions
    }

    /// Long name to storage name, for every variable in the source file
    pub fn variable_index(&self) -> &HashMap<String, String> {
        &self.variable_index
    }

    /// Long names of the data columns, in file order
    pub fn data_variables(&self) -> &[String] {
        &self.data_variables
    }

    /// Valid `(latitudes, longitudes)` for point queries
    pub fn valid_coordinates(&self) -> (&CoordinateSet, &CoordinateSet) {
        (&self.valid_latitudes, &self.valid_longitudes)
    }

    /// The flattened table, or `None` once released.
    pub fn table(&self) -> Option<&DataFrame> {
        self.table.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.table.is_none()
    }

    /// Drops the row table and keeps the metadata. Calling it again does nothing.
    pub fn release(&mut self) {
        if self.table.take().is_some() {
            debug!("Released table for {}", self.path);
        }
    }

    /// Time series at an exact grid coordinate.
    ///
    /// Returns the `time` column plus the requested variables for every row at
    /// `(lat, lon)`, in table order. A coordinate outside the valid sets yields an
    /// empty table with the same columns.
    pub fn point_time_series<S: AsRef<str>>(
        &self,
        lat: f64,
        lon: f64,
        variables: &[S],
    ) -> GridResult<DataFrame> {
        match self.query_point(lat, lon, variables)? {
            PointQuery::Rows(rows) => Ok(rows),
            PointQuery::InvalidCoordinate { .. } => empty_frame(&series_schema(variables)),
        }
    }

    /// Like [`point_time_series`](Self::point_time_series), but reports invalid
    /// coordinates as [`PointQuery::InvalidCoordinate`].
    pub fn query_point<S: AsRef<str>>(
        &self,
        lat: f64,
        lon: f64,
        variables: &[S],
    ) -> GridResult<PointQuery> {
        if !(self.valid_latitudes.contains(lat) && self.valid_longitudes.contains(lon)) {
            warn!(
                "Incorrect coordinates ({}, {}) for {}, returning no rows",
                lat, lon, self.path
            );
            return Ok(PointQuery::InvalidCoordinate { lat, lon });
        }

        let table = self.loaded_table()?;
        self.require_variables(variables)?;

        let mut selection = vec![col(TIME_COLUMN)];
        selection.extend(variables.iter().map(|v| col(v.as_ref())));

        let rows = table
            .clone()
            .lazy()
            .filter(col(LAT_COLUMN).eq(lit(lat)).and(col(LON_COLUMN).eq(lit(lon))))
            .select(selection)
            .collect()?;
        Ok(PointQuery::Rows(rows))
    }

    /// Spatial snapshot at an exact time value: `lat`, `lon` and one variable.
    pub fn time_slice(&self, time: f64, variable: &str) -> GridResult<DataFrame> {
        let table = self.loaded_table()?;
        self.require_variables(&[variable])?;

        let rows = table
            .clone()
            .lazy()
            .filter(col(TIME_COLUMN).eq(lit(time)))
            .select([col(LAT_COLUMN), col(LON_COLUMN), col(variable)])
            .collect()?;
        Ok(rows)
    }

    fn loaded_table(&self) -> GridResult<&DataFrame> {
        self.table
            .as_ref()
            .ok_or_else(|| GridError::TableReleased(self.path.clone()))
    }

    fn require_variables<S: AsRef<str>>(&self, variables: &[S]) -> GridResult<()> {
        for name in variables {
            let name = name.as_ref();
            if !self.data_variables.iter().any(|v| v == name) {
                return Err(GridError::UnknownVariable(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Column layout of a point time-series result.
pub(crate) fn series_schema<S: AsRef<str>>(variables: &[S]) -> Vec<(String, DataType)> {
    let mut schema = vec![(TIME_COLUMN.to_string(), DataType::Float64)];
    schema.extend(
        variables
            .iter()
            .map(|v| (v.as_ref().to_string(), DataType::Float64)),
    );
    schema
}

/// Zero-row frame with the given columns.
pub(crate) fn empty_frame(schema: &[(String, DataType)]) -> GridResult<DataFrame> {
    let columns: Vec<Column> = schema
        .iter()
        .map(|(name, dtype)| Series::new_empty(name.as_str().into(), dtype).into())
        .collect();
    Ok(DataFrame::new(columns)?)
}
