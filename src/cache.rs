//! # Dataset Cache
//!
//! [`DatasetCache`] owns the [`GridTable`]s loaded so far, keyed by file
//! identifier, and answers multi-file queries by delegating to each table and
//! stacking the per-file results in file-list order.
//!
//! Files are loaded lazily on first use. A query run with `cache = false` evicts
//! every file it touched once that file has been queried, including files that
//! were already cached by an earlier call.
//!
//! ```rust,no_run
//! use gridcache::cache::DatasetCache;
//!
//! let mut cache = DatasetCache::new();
//! let files = ["MERRA2_400.tavg1_2d_flx_Nx.20220430.nc4"];
//! let rows = cache.time_series(&files, 32.5, 35.0, &["total_precipitation"], true)?;
//! println!("{}", rows);
//! # Ok::<(), gridcache::error::GridError>(())
//! ```

use crate::error::{DataSourceError, GridResult};
use crate::grid::{GridTable, LAT_COLUMN, LON_COLUMN, empty_frame, series_schema};
use crate::source::{GridSource, NetCdfSource};
use log::debug;
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Name of the column tagging time-slice rows with their source file.
pub const SOURCE_FILE_COLUMN: &str = "file_name";

/// Lazily loaded grid tables keyed by file identifier.
pub struct DatasetCache<S = NetCdfSource> {
    source: S,
    entries: HashMap<String, GridTable>,
    loads: usize,
}

impl DatasetCache<NetCdfSource> {
    /// Creates an empty cache that reads NetCDF files with the default axis names.
    pub fn new() -> Self {
        Self::with_source(NetCdfSource::default())
    }
}

impl Default for DatasetCache<NetCdfSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GridSource> DatasetCache<S> {
    pub fn with_source(source: S) -> Self {
        DatasetCache {
            source,
            entries: HashMap::new(),
            loads: 0,
        }
    }

    /// Returns the table for `file_id`, loading it on first request.
    ///
    /// A failed load leaves the cache unchanged.
    pub fn ensure_loaded(&mut self, file_id: &str) -> Result<&GridTable, DataSourceError> {
        let table: &GridTable = match self.entries.entry(file_id.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Cache hit: {}", file_id);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                debug!("Cache miss, loading: {}", file_id);
                let table = self.source.load(file_id)?;
                self.loads += 1;
                entry.insert(table)
            }
        };
        Ok(table)
    }

    /// Time series at `(lat, lon)` across `file_ids`, stacked in file-list order.
    ///
    /// Files whose valid coordinates do not include `(lat, lon)` contribute no rows.
    /// The first file that fails to load aborts the whole query.
    pub fn time_series<F, V>(
        &mut self,
        file_ids: &[F],
        lat: f64,
        lon: f64,
        variables: &[V],
        cache: bool,
    ) -> GridResult<DataFrame>
    where
        F: AsRef<str>,
        V: AsRef<str>,
    {
        let mut merged = None;
        for file_id in file_ids {
            let file_id = file_id.as_ref();
            let rows = self
                .ensure_loaded(file_id)?
                .point_time_series(lat, lon, variables);
            if !cache {
                self.evict(file_id);
            }
            append_rows(&mut merged, rows?)?;
        }

        match merged {
            Some(df) => Ok(df),
            None => empty_frame(&series_schema(variables)),
        }
    }

    /// Same rows as [`time_series`](Self::time_series) without column labels.
    ///
    /// Columns are `time` followed by `variables` in the order given.
    pub fn time_series_array<F, V>(
        &mut self,
        file_ids: &[F],
        lat: f64,
        lon: f64,
        variables: &[V],
        cache: bool,
    ) -> GridResult<Array2<f64>>
    where
        F: AsRef<str>,
        V: AsRef<str>,
    {
        let df = self.time_series(file_ids, lat, lon, variables, cache)?;
        Ok(df.to_ndarray::<Float64Type>(IndexOrder::C)?)
    }

    /// Snapshot of `variable` at `time` across `file_ids`.
    ///
    /// Each row carries its source file in the [`SOURCE_FILE_COLUMN`] column.
    pub fn time_slice_multi<F>(
        &mut self,
        file_ids: &[F],
        time: f64,
        variable: &str,
        cache: bool,
    ) -> GridResult<DataFrame>
    where
        F: AsRef<str>,
    {
        let mut merged = None;
        for file_id in file_ids {
            let file_id = file_id.as_ref();
            let rows = self.ensure_loaded(file_id)?.time_slice(time, variable);
            if !cache {
                self.evict(file_id);
            }
            let mut rows = rows?;
            let tags = Series::new(SOURCE_FILE_COLUMN.into(), vec![file_id; rows.height()]);
            rows.with_column(tags)?;
            append_rows(&mut merged, rows)?;
        }

        match merged {
            Some(df) => Ok(df),
            None => empty_frame(&[
                (LAT_COLUMN.to_string(), DataType::Float64),
                (LON_COLUMN.to_string(), DataType::Float64),
                (variable.to_string(), DataType::Float64),
                (SOURCE_FILE_COLUMN.to_string(), DataType::String),
            ]),
        }
    }

    /// Removes a file from the cache, returning its table if it was present.
    pub fn evict(&mut self, file_id: &str) -> Option<GridTable> {
        let removed = self.entries.remove(file_id);
        if removed.is_some() {
            debug!("Evicted from cache: {}", file_id);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, file_id: &str) -> Option<&GridTable> {
        self.entries.get(file_id)
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.entries.contains_key(file_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tables built by the source since the cache was created.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn file_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn append_rows(merged: &mut Option<DataFrame>, rows: DataFrame) -> GridResult<()> {
    match merged {
        Some(df) => {
            df.vstack_mut(&rows)?;
        }
        None => *merged = Some(rows),
    }
    Ok(())
}
