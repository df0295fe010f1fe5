//! GPS Log Parser CLI Application
//!
//! Command-line front end for the gps-log-decoder library. It owns
//! everything the core deliberately does not: argument and profile
//! handling, output-directory creation, CSV file naming, Ctrl-C wiring,
//! and console/summary reporting.

use anyhow::{Context, Result};
use clap::Parser;
use gps_log_decoder::{MessageType, ParserConfig, Pipeline};
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod config;
mod sinks;

/// GPS Log Parser - split a receiver telemetry log into per-type CSV files
#[derive(Parser, Debug)]
#[command(name = "gps-log-cli")]
#[command(about = "Parse GPS receiver telemetry logs into per-message CSV files", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the receiver log file
    #[arg(value_name = "LOG")]
    log: PathBuf,

    /// Directory for the CSV output files (default: output)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Minimum byte offset before capture may begin
    #[arg(long, value_name = "BYTES")]
    offset_bytes: Option<u64>,

    /// Capture window length in seconds of receiver time
    #[arg(long, value_name = "SECONDS")]
    max_duration: Option<f64>,

    /// Target sampling rate per message type, in Hz
    #[arg(long, value_name = "HZ")]
    frequency: Option<f64>,

    /// Record raw lines scanned before the start position is reached
    #[arg(long)]
    raw_while_seeking: bool,

    /// Path to a TOML profile with the same options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("GPS Log Parser CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", gps_log_decoder::VERSION);

    let profile = match &args.config {
        Some(path) => config::load_profile(path)?,
        None => config::Profile::default(),
    };
    let parser_config = build_config(&args, &profile);

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| profile.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("output"));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let source = File::open(&args.log)
        .with_context(|| format!("Failed to open log file: {:?}", args.log))?;
    let mut sink_set = sinks::open_csv_sinks(&output_dir)?;

    // Ctrl-C requests a clean stop at the next line boundary
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::warn!("Interrupt received, stopping after the current line");
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl-C handler")?;

    if !args.quiet {
        println!("Parsing {:?}", args.log);
        println!("Output directory: {:?}", output_dir);
    }

    let pipeline = Pipeline::new(parser_config).with_cancel_flag(stop);
    let summary = pipeline
        .run(source, &mut sink_set)
        .context("Parsing run failed")?;

    if !args.quiet {
        println!("\nParsing complete ({} lines scanned)", summary.lines_scanned);
        if summary.encoding_failures > 0 {
            println!("Lines skipped for bad encoding: {}", summary.encoding_failures);
        }
        println!("\nMessages written:");
        for message_type in MessageType::ALL {
            let counts = summary.counts(message_type);
            println!(
                "  {:<10} {:>8} written  {:>8} filtered  {:>6} decode failures",
                message_type, counts.accepted, counts.filtered, counts.decode_failures
            );
        }
        println!("\nOutput files created in: {:?}", output_dir);
    }

    if let Some(path) = &args.summary_json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file: {:?}", path))?;
        serde_json::to_writer_pretty(file, &summary)
            .with_context(|| format!("Failed to write summary file: {:?}", path))?;
        log::info!("Summary written to {:?}", path);
    }

    Ok(())
}

/// Merge defaults, profile values and explicit flags (flags win)
fn build_config(args: &Args, profile: &config::Profile) -> ParserConfig {
    let mut parser_config = ParserConfig::new();
    if let Some(offset) = args.offset_bytes.or(profile.offset_bytes) {
        parser_config = parser_config.with_offset_bytes(offset);
    }
    if let Some(duration) = args.max_duration.or(profile.max_duration_seconds) {
        parser_config = parser_config.with_max_duration(duration);
    }
    if let Some(frequency) = args.frequency.or(profile.frequency_hz) {
        parser_config = parser_config.with_frequency(frequency);
    }
    if args.raw_while_seeking || profile.raw_while_seeking.unwrap_or(false) {
        parser_config = parser_config.with_raw_while_seeking(true);
    }
    parser_config
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_profile() {
        let args = Args::parse_from([
            "gps-log-cli",
            "receiver.log",
            "--offset-bytes",
            "2048",
            "--frequency",
            "5.0",
        ]);
        let profile = config::Profile {
            offset_bytes: Some(999),
            max_duration_seconds: Some(12.5),
            frequency_hz: Some(1.0),
            raw_while_seeking: Some(true),
            output_dir: None,
        };

        let parser_config = build_config(&args, &profile);
        assert_eq!(parser_config.offset_bytes, 2048); // flag wins
        assert_eq!(parser_config.max_duration_seconds, 12.5); // profile wins
        assert_eq!(parser_config.frequency_hz, 5.0);
        assert!(parser_config.raw_while_seeking);
    }

    #[test]
    fn test_defaults_without_profile() {
        let args = Args::parse_from(["gps-log-cli", "receiver.log"]);
        let parser_config = build_config(&args, &config::Profile::default());
        assert_eq!(parser_config.offset_bytes, 1_000_000);
        assert_eq!(parser_config.max_duration_seconds, 30.0);
        assert_eq!(parser_config.frequency_hz, 1.0);
        assert!(!parser_config.raw_while_seeking);
    }
}
