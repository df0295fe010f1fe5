//! `#PSRDOPA` decoder - pseudorange dilution of precision report
//!
//! The log's body continues with the count and list of satellites used in
//! the solution; only the six DOP figures are part of the output schema.

use super::{row_prefix, split_novatel};

/// Body field names of the PSRDOP output schema, in wire order
pub(crate) const BODY_COLUMNS: &[&str] = &[
    "gdop",
    "pdop",
    "hdop",
    "htdop",
    "tdop",
    "elevation_cutoff",
];

/// Decode one `#PSRDOPA` line into its output row
pub fn decode(timestamp: &str, line: &str) -> Option<Vec<String>> {
    let (marker, header, body) = split_novatel(line)?;
    if body.len() < BODY_COLUMNS.len() {
        return None;
    }

    let mut row = row_prefix(timestamp, marker, &header);
    row.extend(body[..BODY_COLUMNS.len()].iter().map(|f| f.to_string()));
    Some(row)
}
