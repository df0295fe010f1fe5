//! `#HWMONITORA` decoder - hardware health readings
//!
//! The body is a repeat count followed by that many (value, status) pairs;
//! the status word encodes the reading type (temperature, antenna current,
//! supply voltages). The pairs are emitted flattened in wire order, padded
//! to a fixed arity. A mismatch between the declared count and the pairs
//! actually present is a decode failure.

use super::{row_prefix, split_novatel, NOVATEL_HEADER_FIELDS};

/// Maximum readings carried in one output row
pub(crate) const MAX_READINGS: usize = 16;

/// Decode one `#HWMONITORA` line into its output row
pub fn decode(timestamp: &str, line: &str) -> Option<Vec<String>> {
    let (marker, header, body) = split_novatel(line)?;

    let count: usize = body.first()?.parse().ok()?;
    if count > MAX_READINGS {
        log::warn!("HWMONITOR declares {count} readings, more than the schema holds");
        return None;
    }
    // Declared count must match the pairs actually present
    if body.len() != 1 + count * 2 {
        return None;
    }

    let mut row = row_prefix(timestamp, marker, &header);
    row.push(count.to_string());
    row.extend(body[1..].iter().map(|f| f.to_string()));
    row.resize(2 + NOVATEL_HEADER_FIELDS + 1 + MAX_READINGS * 2, String::new());
    Some(row)
}

/// Column names of the HWMONITOR output schema
pub(crate) fn columns() -> Vec<String> {
    let mut cols = vec!["reading_count".to_string()];
    for i in 1..=MAX_READINGS {
        cols.push(format!("reading_{i:02}_value"));
        cols.push(format!("reading_{i:02}_status"));
    }
    super::novatel_columns(&cols.iter().map(String::as_str).collect::<Vec<_>>())
}
