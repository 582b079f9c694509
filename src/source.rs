//! # Grid Sources
//!
//! This module turns a file identifier into a [`GridTable`]. The default
//! [`NetCdfSource`] reads a NetCDF file into a [`RawGrid`] (dimensions, variable
//! index, coordinate axes and flattened variable values) and closes the file
//! before the table is built.
//!
//! [`GridSource`] is the seam used by [`DatasetCache`](crate::cache::DatasetCache):
//! any type (or closure) that can produce a `GridTable` for a file identifier can
//! back a cache.

use crate::config::AxisNames;
use crate::error::DataSourceError;
use crate::grid::GridTable;
use log::debug;
use std::collections::HashMap;

/// Produces a [`GridTable`] for a file identifier.
pub trait GridSource {
    fn load(&self, file_id: &str) -> Result<GridTable, DataSourceError>;
}

impl<F> GridSource for F
where
    F: Fn(&str) -> Result<GridTable, DataSourceError>,
{
    fn load(&self, file_id: &str) -> Result<GridTable, DataSourceError> {
        self(file_id)
    }
}

/// One non-axis variable as read from the source, values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub name: String,
    pub long_name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

/// Everything read from a gridded file, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    pub path: String,
    pub axes: AxisNames,
    pub dimensions: HashMap<String, usize>,
    pub variable_index: HashMap<String, String>,
    pub time: Vec<f64>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub variables: Vec<RawVariable>,
}

impl RawGrid {
    /// Creates a grid with default axis names and no data variables.
    ///
    /// The dimension map and variable index are filled in for the three axes,
    /// mirroring what a CF-style NetCDF file would report.
    pub fn new(path: &str, time: Vec<f64>, lat: Vec<f64>, lon: Vec<f64>) -> Self {
        let axes = AxisNames::default();
        let dimensions = HashMap::from([
            (axes.time.clone(), time.len()),
            (axes.lat.clone(), lat.len()),
            (axes.lon.clone(), lon.len()),
        ]);
        let variable_index = HashMap::from([
            ("time".to_string(), axes.time.clone()),
            ("latitude".to_string(), axes.lat.clone()),
            ("longitude".to_string(), axes.lon.clone()),
        ]);
        RawGrid {
            path: path.to_string(),
            axes,
            dimensions,
            variable_index,
            time,
            lat,
            lon,
            variables: Vec::new(),
        }
    }

    /// Adds a variable laid out on the full `(time, lat, lon)` grid.
    pub fn with_variable(self, name: &str, long_name: &str, values: Vec<f64>) -> Self {
        let dimensions = self.axes.as_vec();
        let shape = vec![self.time.len(), self.lat.len(), self.lon.len()];
        self.with_shaped_variable(name, long_name, dimensions, shape, values)
    }

    /// Adds a variable with explicit dimensions and shape.
    pub fn with_shaped_variable(
        mut self,
        name: &str,
        long_name: &str,
        dimensions: Vec<String>,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        self.variable_index
            .insert(long_name.to_string(), name.to_string());
        self.variables.push(RawVariable {
            name: name.to_string(),
            long_name: long_name.to_string(),
            dimensions,
            shape,
            values,
        });
        self
    }
}

/// Loads grids from NetCDF files on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct NetCdfSource {
    pub axes: AxisNames,
}

impl NetCdfSource {
    pub fn new(axes: AxisNames) -> Self {
        NetCdfSource { axes }
    }

    /// Reads a NetCDF file into a [`RawGrid`], closing the file before returning.
    pub fn read_raw(&self, path: &str) -> Result<RawGrid, DataSourceError> {
        debug!("Opening NetCDF file: {}", path);
        let file = netcdf::open(path).map_err(|source| DataSourceError::Open {
            path: path.to_string(),
            source,
        })?;

        let dimensions: HashMap<String, usize> = file
            .dimensions()
            .map(|dim| (dim.name().to_string(), dim.len()))
            .collect();

        let mut variable_index = HashMap::new();
        for var in file.variables() {
            let name = var.name().to_string();
            let long_name = long_name_of(&var).unwrap_or_else(|| name.clone());
            variable_index.insert(long_name, name);
        }

        let time = read_axis(&file, path, &self.axes.time)?;
        let lat = read_axis(&file, path, &self.axes.lat)?;
        let lon = read_axis(&file, path, &self.axes.lon)?;

        let mut variables = Vec::new();
        for var in file.variables() {
            let name = var.name().to_string();
            if self.axes.contains(&name) {
                continue;
            }
            let values = var
                .get_values::<f64, _>(..)
                .map_err(|source| DataSourceError::Read {
                    path: path.to_string(),
                    variable: name.clone(),
                    source,
                })?;
            variables.push(RawVariable {
                long_name: long_name_of(&var).unwrap_or_else(|| name.clone()),
                dimensions: var
                    .dimensions()
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect(),
                shape: var.dimensions().iter().map(|d| d.len()).collect(),
                name,
                values,
            });
        }

        file.close().map_err(|source| DataSourceError::Open {
            path: path.to_string(),
            source,
        })?;
        debug!(
            "Read {} variables on a {}x{}x{} grid from {}",
            variables.len(),
            time.len(),
            lat.len(),
            lon.len(),
            path
        );

        Ok(RawGrid {
            path: path.to_string(),
            axes: self.axes.clone(),
            dimensions,
            variable_index,
            time,
            lat,
            lon,
            variables,
        })
    }
}

impl GridSource for NetCdfSource {
    fn load(&self, file_id: &str) -> Result<GridTable, DataSourceError> {
        GridTable::from_raw(self.read_raw(file_id)?)
    }
}

fn read_axis(file: &netcdf::File, path: &str, axis: &str) -> Result<Vec<f64>, DataSourceError> {
    let var = file
        .variable(axis)
        .ok_or_else(|| DataSourceError::MissingAxis {
            path: path.to_string(),
            axis: axis.to_string(),
        })?;
    var.get_values::<f64, _>(..)
        .map_err(|source| DataSourceError::Read {
            path: path.to_string(),
            variable: axis.to_string(),
            source,
        })
}

fn long_name_of(var: &netcdf::Variable) -> Option<String> {
    var.attribute_value("long_name")
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}
