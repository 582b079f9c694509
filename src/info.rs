//! # Grid File Information Module
//!
//! Loads a gridded file and summarises what a query against it can use:
//! dimensions, the long-name to storage-name variable index, and the valid
//! coordinate ranges.

use crate::config::AxisNames;
use crate::grid::{CoordinateSet, GridTable};
use crate::source::{GridSource, NetCdfSource};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableInfo {
    pub long_name: String,
    pub name: String,
    /// Whether the variable is a data column of the table
    pub queryable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinateRange {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<&CoordinateSet> for CoordinateRange {
    fn from(set: &CoordinateSet) -> Self {
        CoordinateRange {
            count: set.len(),
            min: set.min(),
            max: set.max(),
        }
    }
}

/// Summary of one loaded grid file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridInfo {
    pub path: String,
    pub rows: usize,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub latitudes: CoordinateRange,
    pub longitudes: CoordinateRange,
}

impl From<&GridTable> for GridInfo {
    fn from(table: &GridTable) -> Self {
        let mut dimensions: Vec<DimensionInfo> = table
            .dimensions()
            .iter()
            .map(|(name, length)| DimensionInfo {
                name: name.clone(),
                length: *length,
            })
            .collect();
        dimensions.sort_by(|a, b| a.name.cmp(&b.name));

        let mut variables: Vec<VariableInfo> = table
            .variable_index()
            .iter()
            .map(|(long_name, name)| VariableInfo {
                long_name: long_name.clone(),
                name: name.clone(),
                queryable: table.data_variables().contains(long_name),
            })
            .collect();
        variables.sort_by(|a, b| a.name.cmp(&b.name));

        let (latitudes, longitudes) = table.valid_coordinates();
        GridInfo {
            path: table.path().to_string(),
            rows: table.table().map_or(0, |df| df.height()),
            dimensions,
            variables,
            latitudes: latitudes.into(),
            longitudes: longitudes.into(),
        }
    }
}

/// Loads `file_path` and describes it.
pub fn get_grid_info(file_path: &str, axes: &AxisNames) -> Result<GridInfo> {
    debug!("Inspecting grid file: {}", file_path);
    let table = NetCdfSource::new(axes.clone())
        .load(file_path)
        .with_context(|| format!("Failed to load grid file: {}", file_path))?;
    Ok(GridInfo::from(&table))
}

/// Print grid info in human-readable format
pub fn print_grid_info_human(info: &GridInfo) {
    println!("Grid File Information:");
    println!("  Path: {}", info.path);
    println!("  Rows: {}", info.rows);
    println!("  Dimensions:");
    for dim in &info.dimensions {
        println!("    {} ({})", dim.name, dim.length);
    }
    println!("  Variables:");
    for var in &info.variables {
        println!(
            "    {} -> {}{}",
            var.long_name,
            var.name,
            if var.queryable { "" } else { " (axis)" }
        );
    }
    println!("  Latitudes: {}", format_range(&info.latitudes));
    println!("  Longitudes: {}", format_range(&info.longitudes));
}

fn format_range(range: &CoordinateRange) -> String {
    match (range.min, range.max) {
        (Some(min), Some(max)) => format!("{} values in [{}, {}]", range.count, min, max),
        _ => "none".to_string(),
    }
}

/// Print grid info in JSON format
pub fn print_grid_info_json(info: &GridInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print grid info in YAML format
pub fn print_grid_info_yaml(info: &GridInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize grid info to YAML")?;
    println!("{}", yaml);
    Ok(())
}
