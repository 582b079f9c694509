//! # Result Output Module
//!
//! Writes query results to disk. The format follows the output path's extension:
//! `.csv` writes CSV, anything else writes Parquet.

use anyhow::{Context, Result};
use log::debug;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Parquet,
    Csv,
}

impl OutputKind {
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputKind::Csv,
            _ => OutputKind::Parquet,
        }
    }
}

/// Writes a query result to `output_path`.
///
/// # Errors
///
/// This function will return an error if:
/// - The output path is not writable
/// - The DataFrame contains unsupported data types for the chosen format
pub fn write_dataframe(df: &DataFrame, output_path: &str) -> Result<()> {
    debug!("Writing DataFrame to {}", output_path);
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("DataFrame schema:\n{:?}", df.schema());

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path))?;
    let mut df = df.clone();

    match OutputKind::from_path(output_path) {
        OutputKind::Parquet => {
            ParquetWriter::new(file)
                .finish(&mut df)
                .with_context(|| format!("Failed to write Parquet file: {}", output_path))?;
        }
        OutputKind::Csv => {
            CsvWriter::new(file)
                .include_header(true)
                .finish(&mut df)
                .with_context(|| format!("Failed to write CSV file: {}", output_path))?;
        }
    }

    debug!("Successfully wrote {}", output_path);
    Ok(())
}
