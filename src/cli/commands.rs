//! Command implementations for the API processor CLI
//!
//! Sets up logging, resolves configuration, runs the selected workflow and
//! prints a coloured summary of its report.

use crate::cli::args::{
    AlignArgs, Args, Commands, CorrelateArgs, DirectionsArgs, HistogramArgs, IndexArgs,
    ResampleArgs,
};
use crate::config::ProcessorConfig;
use crate::models::ProcessingStats;
use crate::pipeline::timeline::PeakMonth;
use crate::pipeline::{
    AlignmentProcessor, CorrelationProcessor, DirectionHistogramProcessor, IndexProcessor,
    ResampleProcessor, TimelineProcessor,
};
use anyhow::{Context, Result};
use colored::*;
use tracing::debug;

/// Main command runner
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args);
    debug!("Command line arguments: {:?}", args);

    let config = args
        .resolve_config()
        .context("Failed to load configuration")?;
    debug!("Resolved configuration: {:?}", config);

    match &args.command {
        Commands::Index(index) => run_index(index, &config),
        Commands::Resample(resample) => run_resample(resample, &config),
        Commands::Align(align) => run_align(align, &config),
        Commands::Directions(directions) => run_directions(directions, &config),
        Commands::Histogram(histogram) => run_histogram(histogram, &config),
        Commands::Correlate(correlate) => run_correlate(correlate, &config),
    }
}

fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("api_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

fn run_index(args: &IndexArgs, config: &ProcessorConfig) -> Result<()> {
    let mut processor = IndexProcessor::new(args.input_path.clone(), args.output_path.clone())
        .context("Cannot start index workflow")?
        .with_config(config.index.clone());
    if let Some(daily) = &args.daily_path {
        processor = processor.with_daily_output(daily.clone());
    }

    let report = processor
        .process()
        .with_context(|| format!("Index workflow failed for {}", args.input_path.display()))?;

    print_header("Antecedent Precipitation Index");
    print_stats(&report.stats);
    println!(
        "  {} {} (k = {})",
        "Observations:".bright_cyan(),
        report.observations.to_string().bright_white(),
        config.index.decay
    );
    println!(
        "  {} {} above {}",
        "High-API days:".bright_cyan(),
        report.high_days.to_string().bright_white().bold(),
        config.index.daily_high_threshold
    );
    println!(
        "  {} {} at or above {}",
        "High-API months:".bright_cyan(),
        report.high_months.len().to_string().bright_white().bold(),
        config.index.monthly_high_threshold
    );
    for month in &report.high_months {
        println!("    {}", month.to_string().bright_yellow());
    }
    if let Some(peak) = report.peak {
        println!(
            "  {} {:.2} on {}",
            "Peak index:".bright_cyan(),
            peak.value,
            peak.date
        );
    }
    if let Some(daily) = &report.daily_output {
        println!("  {} {}", "Daily series:".bright_cyan(), daily.display());
    }
    Ok(())
}

fn run_resample(args: &ResampleArgs, config: &ProcessorConfig) -> Result<()> {
    let report = ResampleProcessor::new(args.input_path.clone(), args.output_path.clone())
        .context("Cannot start resample workflow")?
        .with_config(config.resample.clone())
        .process()
        .with_context(|| format!("Resample workflow failed for {}", args.input_path.display()))?;

    print_header("Deformation Resampling");
    print_stats(&report.stats);
    println!(
        "  {} {} survey dates -> {} months",
        "Time columns:".bright_cyan(),
        report.source_columns.to_string().bright_white(),
        report.axis.len().to_string().bright_white().bold()
    );
    if let (Some(first), Some(last)) = (report.axis.first(), report.axis.last()) {
        println!(
            "  {} {} to {} ({:.3} years)",
            "Span:".bright_cyan(),
            first.month,
            last.month,
            last.offset
        );
    }
    Ok(())
}

fn run_align(args: &AlignArgs, config: &ProcessorConfig) -> Result<()> {
    let mut processor = AlignmentProcessor::new(
        args.api_path.clone(),
        args.deformation_path.clone(),
        args.output_path.clone(),
    )
    .context("Cannot start alignment workflow")?
    .with_config(config.clone());
    if let Some(id) = &args.point_id {
        processor = processor.with_point(id.clone());
    }
    if let Some(path) = &args.point_output {
        processor = processor.with_point_output(path.clone());
    }

    let report = processor.process().context("Alignment workflow failed")?;

    print_header("API / Survey Alignment");
    print_stats(&report.stats);
    println!(
        "  {} {} months within {} days of {} epochs",
        "Retained:".bright_cyan(),
        report.retained.len().to_string().bright_white().bold(),
        config.align.threshold_days,
        report.epochs
    );

    if let Some(point) = &report.point {
        println!("\n  {} {}", "Point:".bright_cyan(), point.id.bright_white().bold());
        println!(
            "  {} {} of {}",
            "Samples present:".bright_cyan(),
            point.present_samples,
            point.total_samples
        );
        println!(
            "  {} {} at or above {}",
            "High-API months:".bright_cyan(),
            point.high_api_months.to_string().bright_white(),
            config.align.display_threshold
        );
        match point.correlation {
            Some(r) => println!("  {} {:.4}", "Correlation:".bright_cyan(), r),
            None => println!("  {} {}", "Correlation:".bright_cyan(), "undefined".yellow()),
        }
    }
    Ok(())
}

fn run_directions(args: &DirectionsArgs, config: &ProcessorConfig) -> Result<()> {
    let report = DirectionHistogramProcessor::new(args.input_path.clone(), args.output_path.clone())
        .context("Cannot start direction histogram workflow")?
        .with_config(config.histogram.clone())
        .process()
        .with_context(|| format!("Direction histogram failed for {}", args.input_path.display()))?;

    print_header("Turning Point Directions");
    print_stats(&report.stats);
    println!(
        "  {:<10} {:>6} {:>9} {:>9}",
        "Bin".bright_cyan(),
        "Total".bright_cyan(),
        "Positive".bright_cyan(),
        "Negative".bright_cyan()
    );
    for bin in &report.histogram.bins {
        println!(
            "  {:<10} {:>6} {:>9} {:>9}",
            bin.label, bin.total, bin.positive, bin.negative
        );
    }
    if report.histogram.unbinned > 0 {
        println!(
            "  {} {}",
            "Without direction:".bright_red(),
            report.histogram.unbinned.to_string().bright_red().bold()
        );
    }
    Ok(())
}

fn run_histogram(args: &HistogramArgs, config: &ProcessorConfig) -> Result<()> {
    let report = TimelineProcessor::new(
        args.descending_path.clone(),
        args.ascending_path.clone(),
        args.output_path.clone(),
    )
    .context("Cannot start turning-point timeline workflow")?
    .with_config(config.histogram.clone())
    .process()
    .context("Turning-point timeline failed")?;

    print_header("Turning Point Timeline");
    print_stats(&report.stats);
    println!(
        "  {} descending {:?}, ascending {:?}",
        "Date formats:".bright_cyan(),
        report.descending_format.as_deref().unwrap_or("-"),
        report.ascending_format.as_deref().unwrap_or("-")
    );
    print_peak("Descending peak:", report.descending_peak);
    print_peak("Ascending peak:", report.ascending_peak);
    print_peak("Overall peak:", report.total_peak);
    if report.unparsed_dates > 0 {
        println!(
            "  {} {}",
            "Unparsed dates:".bright_red(),
            report.unparsed_dates.to_string().bright_red().bold()
        );
    }
    Ok(())
}

fn run_correlate(args: &CorrelateArgs, config: &ProcessorConfig) -> Result<()> {
    let report = CorrelationProcessor::new(
        args.precipitation_path.clone(),
        args.reference_path.clone(),
    )
    .context("Cannot start correlation workflow")?
    .with_config(config.index.clone())
    .process()
    .context("Correlation workflow failed")?;

    print_header("Precipitation Correlation");
    println!(
        "  {} {} station, {} reference, {} joined",
        "Months:".bright_cyan(),
        report.station_months,
        report.reference_months,
        report.pairs.len().to_string().bright_white().bold()
    );
    match report.coefficient {
        Some(r) => println!(
            "  {} {}",
            "Pearson r:".bright_cyan(),
            format!("{:.4}", r).bright_white().bold()
        ),
        None => println!("  {} {}", "Pearson r:".bright_cyan(), "undefined".yellow()),
    }
    Ok(())
}

fn print_header(title: &str) {
    println!("\n{}", title.bright_green().bold());
}

fn print_stats(stats: &ProcessingStats) {
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        stats.output_path.display()
    );
    println!(
        "  {} {} read, {} written",
        "Rows:".bright_cyan(),
        stats.rows_read.to_string().bright_white(),
        stats.rows_written.to_string().bright_white()
    );
    if stats.rows_dropped > 0 {
        println!(
            "  {} {}",
            "Rows dropped:".bright_red(),
            stats.rows_dropped.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
}

fn print_peak(label: &str, peak: Option<PeakMonth>) {
    match peak {
        Some(peak) => println!(
            "  {} {} ({})",
            label.bright_cyan(),
            peak.month.to_string().bright_white().bold(),
            peak.count
        ),
        None => println!("  {} {}", label.bright_cyan(), "none".yellow()),
    }
}
