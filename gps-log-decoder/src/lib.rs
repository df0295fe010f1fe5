//! GPS Log Decoder Library
//!
//! A single-pass parser for mixed-format GPS receiver telemetry logs
//! (NovAtel OEM7-series ASCII logs interleaved with NMEA sentences and
//! free-form console output). The pipeline finds the correct start point
//! in the log, classifies each line by its marker, decodes the known
//! record formats, applies a per-type sampling-rate filter and a capture
//! duration limit, and routes the resulting rows to per-type output sinks.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on parsing:
//! - Locates the start position (byte offset or navigation lock)
//! - Classifies and decodes `#BESTXYZA`, `#TIMEA`, `#PSRDOPA`,
//!   `#HWMONITORA` and multi-sentence `$GPGSV` records
//! - Enforces the sampling rate and capture window on receiver time
//! - Records every line losslessly in a raw audit stream
//!
//! The library does NOT:
//! - Discover or validate file paths
//! - Create directories or name output files
//! - Print progress or summaries to the console
//!
//! All of that is in the application layer (gps-log-cli), which hands the
//! pipeline an input source and six row sinks and receives a summary.
//!
//! # Example Usage
//!
//! ```no_run
//! use gps_log_decoder::{MessageType, ParserConfig, Pipeline, SinkSet};
//! use std::fs::File;
//!
//! let config = ParserConfig::new()
//!     .with_offset_bytes(1_000_000)
//!     .with_max_duration(30.0)
//!     .with_frequency(1.0);
//!
//! let mut sinks = SinkSet::new();
//! // ... insert one RowSink per MessageType ...
//!
//! let source = File::open("receiver.log").unwrap();
//! let summary = Pipeline::new(config).run(source, &mut sinks).unwrap();
//!
//! for message_type in MessageType::ALL {
//!     let counts = summary.counts(message_type);
//!     println!("{}: {} rows", message_type, counts.accepted);
//! }
//! ```

// Public modules
pub mod classify;
pub mod config;
pub mod cursor;
pub mod filter;
pub mod formats;
pub mod pipeline;
pub mod timestamp;
pub mod types;

// Re-export main types for convenience
pub use config::ParserConfig;
pub use cursor::LogCursor;
pub use pipeline::{Pipeline, RowSink, SinkSet};
pub use timestamp::GpsTime;
pub use types::{
    DecodedRecord, DecoderError, MessageType, RawLine, Result, RunSummary, TypeCounts,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
