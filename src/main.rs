use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use gridcache::cache::DatasetCache;
use gridcache::cli::{Cli, Commands, OutputFormat};
use gridcache::config::{AxisNames, JobConfig};
use gridcache::info::{get_grid_info, print_grid_info_human, print_grid_info_json, print_grid_info_yaml};
use gridcache::log::{
    series_echo, show_cache_summary, show_farewell_with_timing, show_frame, show_greeting,
    slice_echo,
};
use gridcache::source::NetCdfSource;
use gridcache::{process_series_job, process_slice_job};
use log::{LevelFilter, debug};
use std::io;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    run(cli)
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(LevelFilter::Error);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.init();
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();
    let base = cli
        .config
        .as_ref()
        .map(JobConfig::from_file)
        .transpose()?;
    if let Some(config) = &base {
        debug!("Loaded '{}' job file", config.kind());
    }

    match cli.command {
        Commands::Series(args) => {
            let job = args.into_job(base)?;
            if !cli.quiet {
                show_greeting("series");
                series_echo(&job);
            }

            let mut cache = DatasetCache::with_source(NetCdfSource::new(job.axes.clone()));
            let report = process_series_job(&mut cache, &job)?;

            if !cli.quiet {
                show_frame("Time series", &report.rows);
                for (method, matrix) in &report.correlations {
                    show_frame(&format!("Correlation ({})", method), matrix);
                }
                show_cache_summary(&cache);
                show_farewell_with_timing(start_time.elapsed());
            }
        }
        Commands::Slice(args) => {
            let job = args.into_job(base)?;
            if !cli.quiet {
                show_greeting("slice");
                slice_echo(&job);
            }

            let mut cache = DatasetCache::with_source(NetCdfSource::new(job.axes.clone()));
            let rows = process_slice_job(&mut cache, &job)?;

            if !cli.quiet {
                show_frame("Time slice", &rows);
                show_cache_summary(&cache);
                show_farewell_with_timing(start_time.elapsed());
            }
        }
        Commands::Info { file, format, axes } => {
            let axes = axes.apply(AxisNames::default());
            let info = get_grid_info(&file, &axes)
                .with_context(|| format!("Failed to inspect {}", file))?;
            match format {
                OutputFormat::Human => print_grid_info_human(&info),
                OutputFormat::Json => print_grid_info_json(&info)?,
                OutputFormat::Yaml => print_grid_info_yaml(&info)?,
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "gridcache", &mut io::stdout());
        }
    }

    Ok(())
}
