//! # Correlation Analysis
//!
//! Pairwise correlation matrices over columns of a query result, the way the
//! variable-exploration workflow inspects a day of point time series.

use crate::error::{GridError, GridResult};
use clap::ValueEnum;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the first column of a correlation matrix.
pub const VARIABLE_COLUMN: &str = "variable";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear (Pearson) correlation
    Pearson,
    /// Rank (Spearman) correlation, ties get their average rank
    Spearman,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => write!(f, "pearson"),
            CorrelationMethod::Spearman => write!(f, "spearman"),
        }
    }
}

/// Correlation matrix of `columns` in `df`.
///
/// The result has a leading [`VARIABLE_COLUMN`] holding the column names,
/// followed by one `f64` column per input column. Rows with a null or NaN in
/// any selected column are dropped first. Columns with zero variance correlate
/// as NaN.
pub fn correlation_matrix<S: AsRef<str>>(
    df: &DataFrame,
    columns: &[S],
    method: CorrelationMethod,
) -> GridResult<DataFrame> {
    let mut data: Vec<Vec<f64>> = Vec::with_capacity(columns.len());
    for name in columns {
        let name = name.as_ref();
        let column = df
            .column(name)
            .map_err(|_| GridError::UnknownVariable(name.to_string()))?;
        let values = column.cast(&DataType::Float64)?;
        let values: Vec<f64> = values
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        data.push(values);
    }

    let complete: Vec<usize> = (0..df.height())
        .filter(|&i| data.iter().all(|c| !c[i].is_nan()))
        .collect();
    let data: Vec<Vec<f64>> = data
        .into_iter()
        .map(|c| {
            let kept: Vec<f64> = complete.iter().map(|&i| c[i]).collect();
            match method {
                CorrelationMethod::Pearson => kept,
                CorrelationMethod::Spearman => average_ranks(&kept),
            }
        })
        .collect();

    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let mut out: Vec<Column> = vec![Series::new(VARIABLE_COLUMN.into(), names.clone()).into()];
    for (j, name) in names.iter().enumerate() {
        let coefficients: Vec<f64> = data.iter().map(|x| pearson(x, &data[j])).collect();
        out.push(Series::new((*name).into(), coefficients).into());
    }
    Ok(DataFrame::new(out)?)
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 { f64::NAN } else { cov / denom }
}

/// 1-based ranks; tied values share the mean of the ranks they span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficient(matrix: &DataFrame, column: &str, row: usize) -> f64 {
        matrix.column(column).unwrap().f64().unwrap().get(row).unwrap()
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let df = df! {
            "a" => [1.0, 2.0, 3.0, 4.0],
            "b" => [2.0, 4.0, 6.0, 8.0],
            "c" => [4.0, 3.0, 2.0, 1.0],
        }
        .unwrap();

        let matrix = correlation_matrix(&df, &["a", "b", "c"], CorrelationMethod::Pearson).unwrap();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(
            matrix.column(VARIABLE_COLUMN).unwrap().str().unwrap().get(2),
            Some("c")
        );
        assert!((coefficient(&matrix, "a", 0) - 1.0).abs() < 1e-12);
        assert!((coefficient(&matrix, "b", 0) - 1.0).abs() < 1e-12);
        assert!((coefficient(&matrix, "c", 0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spearman_is_rank_based() {
        // Monotonic but non-linear: Spearman is exactly 1, Pearson is not.
        let df = df! {
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "y" => [1.0, 4.0, 9.0, 16.0, 100.0],
        }
        .unwrap();

        let spearman = correlation_matrix(&df, &["x", "y"], CorrelationMethod::Spearman).unwrap();
        let pearson = correlation_matrix(&df, &["x", "y"], CorrelationMethod::Pearson).unwrap();
        assert!((coefficient(&spearman, "y", 0) - 1.0).abs() < 1e-12);
        assert!(coefficient(&pearson, "y", 0) < 0.99);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_constant_column_is_nan() {
        let df = df! {
            "flat" => [1.0, 1.0, 1.0],
            "rising" => [1.0, 2.0, 3.0],
        }
        .unwrap();

        let matrix = correlation_matrix(&df, &["flat", "rising"], CorrelationMethod::Pearson).unwrap();
        assert!(coefficient(&matrix, "rising", 0).is_nan());
        assert!((coefficient(&matrix, "rising", 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_with_nan_are_dropped() {
        let df = df! {
            "a" => [1.0, 2.0, f64::NAN, 3.0],
            "b" => [1.0, 2.0, 50.0, 3.0],
        }
        .unwrap();

        let matrix = correlation_matrix(&df, &["a", "b"], CorrelationMethod::Pearson).unwrap();
        assert!((coefficient(&matrix, "b", 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_column() {
        let df = df! { "a" => [1.0, 2.0] }.unwrap();
        let err = correlation_matrix(&df, &["a", "missing"], CorrelationMethod::Pearson).unwrap_err();
        assert!(matches!(err, GridError::UnknownVariable(name) if name == "missing"));
    }
}
