use crate::cache::DatasetCache;
use crate::config::{SeriesJob, SliceJob};
use crate::source::GridSource;
use polars::prelude::DataFrame;
use std::time::Duration;

pub fn show_greeting(command: &str) {
    println!("=== Grid Dataset Query ({}) ===", command);
}

pub fn series_echo(job: &SeriesJob) {
    println!("\nTime series query:");
    println!("  Coordinate: lat={}, lon={}", job.lat, job.lon);
    println!("  Variables: {}", job.variables.join(", "));
    println!("  Cache: {}", job.cache);
    println!("  Number of files: {}", job.files.len());
    for (i, file) in job.files.iter().enumerate() {
        println!("    File {}: {}", i + 1, file);
    }
}

pub fn slice_echo(job: &SliceJob) {
    println!("\nTime slice query:");
    println!("  Time: {}", job.time);
    println!("  Variable: {}", job.variable);
    println!("  Cache: {}", job.cache);
    println!("  Number of files: {}", job.files.len());
    for (i, file) in job.files.iter().enumerate() {
        println!("    File {}: {}", i + 1, file);
    }
}

pub fn show_frame(title: &str, df: &DataFrame) {
    println!("\n{} ({} rows):", title, df.height());
    println!("{}", df);
}

pub fn show_cache_summary<S: GridSource>(cache: &DatasetCache<S>) {
    println!(
        "\nCache: {} entries, {} loads",
        cache.len(),
        cache.load_count()
    );
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Query completed in {:.2?} ===", elapsed);
}
