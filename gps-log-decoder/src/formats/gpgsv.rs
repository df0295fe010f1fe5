//! `$GPGSV` decoder - satellites in view
//!
//! A visibility report spans up to several NMEA sentences, each carrying
//! up to four satellites as (prn, elevation, azimuth, snr) quadruples.
//! The grouped sentences of one report decode to a single row, padded with
//! `#NV` to a fixed satellite arity.

/// Maximum satellites carried in one output row
pub(crate) const MAX_SATELLITES: usize = 32;

/// Fields per satellite entry
const SAT_FIELDS: usize = 4;

/// Placeholder for satellite slots not present in the report
const NO_VALUE: &str = "#NV";

/// Decode one grouped `$GPGSV` report into its output row
///
/// `lines` is the ordered sentence group assembled by the classifier-side
/// accumulator; an empty group or a malformed sentence fails the decode.
pub fn decode(timestamp: &str, lines: &[String]) -> Option<Vec<String>> {
    if lines.is_empty() {
        return None;
    }

    let mut satellites_in_view = None;
    let mut sat_fields: Vec<String> = Vec::new();

    for line in lines {
        let fields = sentence_fields(line)?;
        // total, index, satellites in view, then the satellite quadruples
        if fields.len() < 3 {
            return None;
        }
        if satellites_in_view.is_none() {
            satellites_in_view = Some(fields[2].to_string());
        }
        sat_fields.extend(fields[3..].iter().map(|f| {
            let f = f.trim();
            if f.is_empty() {
                NO_VALUE.to_string()
            } else {
                f.to_string()
            }
        }));
    }

    if sat_fields.len() > MAX_SATELLITES * SAT_FIELDS {
        log::warn!("GPGSV report carries more satellites than the schema holds");
        return None;
    }

    let mut row = Vec::with_capacity(2 + MAX_SATELLITES * SAT_FIELDS);
    row.push(timestamp.to_string());
    row.push(satellites_in_view?);
    row.extend(sat_fields);
    row.resize(2 + MAX_SATELLITES * SAT_FIELDS, NO_VALUE.to_string());
    Some(row)
}

/// Column names of the GPGSV output schema
pub(crate) fn columns() -> Vec<String> {
    let mut cols = vec!["timestamp".to_string(), "satellites_in_view".to_string()];
    for i in 1..=MAX_SATELLITES {
        cols.push(format!("sat_{i:02}_prn"));
        cols.push(format!("sat_{i:02}_elevation"));
        cols.push(format!("sat_{i:02}_azimuth"));
        cols.push(format!("sat_{i:02}_snr"));
    }
    cols
}

/// Strip the `$GPGSV,` prefix and the `*checksum` trailer, split on commas
fn sentence_fields(line: &str) -> Option<Vec<&str>> {
    let rest = line.strip_prefix("$GPGSV,")?;
    let rest = rest.rsplit_once('*').map(|(body, _)| body).unwrap_or(rest);
    Some(rest.split(',').collect())
}
