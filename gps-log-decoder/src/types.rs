//! Core types for the GPS log decoder library
//!
//! This module defines the fundamental types the parsing pipeline works with:
//! the message type enumeration, raw and decoded record representations,
//! the error taxonomy and the end-of-run summary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::timestamp::GpsTime;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that abort a parsing run
///
/// Only fatal conditions are represented here. Per-record problems
/// (unknown markers, short field lists, broken satellite-view groups)
/// are counted in the [`RunSummary`] and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Output sink not available for {0}")]
    SinkMissing(MessageType),

    #[error("Output sink failure: {0}")]
    SinkWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The closed set of message types the pipeline routes records to
///
/// Every line of the log is classified into exactly one of these;
/// `Raw` is the catch-all that never loses a line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MessageType {
    /// `#BESTXYZA` - best available Cartesian position/velocity solution
    PositionVelocity,
    /// `#TIMEA` - receiver clock and UTC time report
    Time,
    /// `#PSRDOPA` - pseudorange dilution of precision report
    DilutionOfPrecision,
    /// `#HWMONITORA` - hardware health readings (temperature, voltages)
    HardwareMonitor,
    /// `$GPGSV` - satellites in view, spanning several NMEA sentences
    SatelliteView,
    /// Everything else, recorded verbatim for audit purposes
    Raw,
}

impl MessageType {
    /// All message types, in output-stream order
    pub const ALL: [MessageType; 6] = [
        MessageType::PositionVelocity,
        MessageType::Time,
        MessageType::DilutionOfPrecision,
        MessageType::HardwareMonitor,
        MessageType::SatelliteView,
        MessageType::Raw,
    ];

    /// Short stream label, used for output naming and summaries
    pub fn label(&self) -> &'static str {
        match self {
            MessageType::PositionVelocity => "BESTXYZ",
            MessageType::Time => "TIME",
            MessageType::DilutionOfPrecision => "PSRDOP",
            MessageType::HardwareMonitor => "HWMONITOR",
            MessageType::SatelliteView => "GPGSV",
            MessageType::Raw => "RAW",
        }
    }

    /// The line marker that classifies a log line into this type
    ///
    /// Markers include the trailing field delimiter so that e.g.
    /// `#BESTXYZA2` can never match `#BESTXYZA`. `Raw` has no marker.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            MessageType::PositionVelocity => Some("#BESTXYZA,"),
            MessageType::Time => Some("#TIMEA,"),
            MessageType::DilutionOfPrecision => Some("#PSRDOPA,"),
            MessageType::HardwareMonitor => Some("#HWMONITORA,"),
            MessageType::SatelliteView => Some("$GPGSV,"),
            MessageType::Raw => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A logical line read from the log, plus its originating byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line content without the trailing line terminator
    pub text: String,
    /// Byte offset of the first byte of this line in the input
    pub offset: u64,
}

/// A decoded record ready for output routing
///
/// Created by a format decoder from one raw line (or, for
/// [`MessageType::SatelliteView`], a short run of lines). Immutable once
/// created; the field list has the fixed arity of the type's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub message_type: MessageType,
    /// Ordered field values, string-formatted exactly as the output schema
    /// requires. Arity is fixed per message type.
    pub fields: Vec<String>,
    /// Receiver timestamp, when the record (or a preceding record) carried one
    pub timestamp: Option<GpsTime>,
    /// Arrival order within the run, for tie-breaking records with equal
    /// timestamps
    pub sequence: u64,
}

/// Per-stream counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    /// Rows written to the output stream
    pub accepted: u64,
    /// Records rejected by the sampling filter
    pub filtered: u64,
    /// Records dropped because decoding failed
    pub decode_failures: u64,
}

/// End-of-run summary returned to the caller once the pipeline is Done
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Counters per message type
    pub per_type: BTreeMap<MessageType, TypeCounts>,
    /// Logical lines consumed after the start position
    pub lines_scanned: u64,
    /// Lines skipped because their bytes were not valid UTF-8
    pub encoding_failures: u64,
}

impl RunSummary {
    pub(crate) fn counts_mut(&mut self, message_type: MessageType) -> &mut TypeCounts {
        self.per_type.entry(message_type).or_default()
    }

    /// Counters for one message type (zero counts if nothing was seen)
    pub fn counts(&self, message_type: MessageType) -> TypeCounts {
        self.per_type.get(&message_type).copied().unwrap_or_default()
    }

    /// Total rows written across all streams
    pub fn total_accepted(&self) -> u64 {
        self.per_type.values().map(|c| c.accepted).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_are_distinct() {
        let markers: Vec<_> = MessageType::ALL.iter().filter_map(|t| t.marker()).collect();
        for (i, a) in markers.iter().enumerate() {
            for b in &markers[i + 1..] {
                assert!(!a.starts_with(*b) && !b.starts_with(*a));
            }
        }
    }

    #[test]
    fn test_raw_has_no_marker() {
        assert_eq!(MessageType::Raw.marker(), None);
    }

    #[test]
    fn test_summary_counts_default_to_zero() {
        let summary = RunSummary::default();
        assert_eq!(summary.counts(MessageType::Time).accepted, 0);
        assert_eq!(summary.total_accepted(), 0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(MessageType::PositionVelocity.to_string(), "BESTXYZ");
        assert_eq!(MessageType::SatelliteView.to_string(), "GPGSV");
    }

    #[test]
    fn test_total_accepted_sums_streams() {
        let mut summary = RunSummary::default();
        summary.counts_mut(MessageType::Raw).accepted = 3;
        summary.counts_mut(MessageType::Time).accepted = 2;
        assert_eq!(summary.total_accepted(), 5);
    }
}
