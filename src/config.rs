//! # Job Configuration
//!
//! Configuration parsing for gridcache jobs. A job file describes one multi-file
//! query, either a point time series or a time slice, in JSON or YAML.
//!
//! ## Example
//!
//! ```yaml
//! kind: series
//! files:
//!   - MERRA2_400.tavg1_2d_flx_Nx.20220429.nc4
//!   - MERRA2_400.tavg1_2d_flx_Nx.20220430.nc4
//! lat: 32.5
//! lon: 35.0
//! variables: [total_precipitation, surface_air_temperature]
//! correlations: [pearson, spearman]
//! ```

use crate::analysis::CorrelationMethod;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Names of the dimensions (and coordinate variables) that hold the grid axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisNames {
    pub time: String,
    pub lat: String,
    pub lon: String,
}

impl Default for AxisNames {
    fn default() -> Self {
        AxisNames {
            time: "time".to_string(),
            lat: "lat".to_string(),
            lon: "lon".to_string(),
        }
    }
}

impl AxisNames {
    pub fn contains(&self, name: &str) -> bool {
        self.time == name || self.lat == name || self.lon == name
    }

    /// Axis names in grid order: time, lat, lon.
    pub fn as_vec(&self) -> Vec<String> {
        vec![self.time.clone(), self.lat.clone(), self.lon.clone()]
    }
}

/// A multi-file query job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobConfig {
    Series(SeriesJob),
    Slice(SliceJob),
}

/// Time series at one coordinate across several files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesJob {
    pub files: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    /// Long names of the variables to extract
    pub variables: Vec<String>,
    /// Keep loaded files in the cache after the query
    #[serde(default = "default_cache")]
    pub cache: bool,
    #[serde(default)]
    pub correlations: Vec<CorrelationMethod>,
    /// Parquet or CSV path for the merged rows
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub axes: AxisNames,
}

/// Spatial snapshot at one time value across several files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceJob {
    pub files: Vec<String>,
    pub time: f64,
    /// Long name of the variable to extract
    pub variable: String,
    #[serde(default = "default_cache")]
    pub cache: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub axes: AxisNames,
}

fn default_cache() -> bool {
    true
}

impl JobConfig {
    /// Loads a job from a JSON or YAML file, chosen by extension (`.yaml`/`.yml` are YAML).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
        .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).context("Failed to parse JSON job config")
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).context("Failed to parse YAML job config")
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobConfig::Series(_) => "series",
            JobConfig::Slice(_) => "slice",
        }
    }
}
