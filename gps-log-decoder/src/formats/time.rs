//! `#TIMEA` decoder - receiver clock and UTC time report

use super::{row_prefix, split_novatel};

/// Body field names of the TIME log, in wire order
///
/// The clock offset fields are carried verbatim as decimal text; no
/// reformatting beyond what the receiver encoded.
pub(crate) const BODY_COLUMNS: &[&str] = &[
    "clock_status",
    "offset",
    "offset_std",
    "utc_offset",
    "utc_year",
    "utc_month",
    "utc_day",
    "utc_hour",
    "utc_minute",
    "utc_ms",
    "utc_status",
];

/// Decode one `#TIMEA` line into its output row
pub fn decode(timestamp: &str, line: &str) -> Option<Vec<String>> {
    let (marker, header, body) = split_novatel(line)?;
    if body.len() < BODY_COLUMNS.len() {
        return None;
    }

    let mut row = row_prefix(timestamp, marker, &header);
    row.extend(body[..BODY_COLUMNS.len()].iter().map(|f| f.to_string()));
    Some(row)
}
