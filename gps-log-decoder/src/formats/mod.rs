//! Per-message-type format decoders
//!
//! One decoder per message type, each a pure function from raw text (plus
//! the already-rendered timestamp) to the ordered field list of that
//! type's output schema, or `None` on a structurally invalid record.
//!
//! The `#`-prefixed types share the NovAtel ASCII framing: a marker, a
//! comma-separated header, a `;` header/body separator and a `*crc`
//! trailer. `$GPGSV` is a plain NMEA sentence.

pub mod bestxyz;
pub mod gpgsv;
pub mod hwmonitor;
pub mod psrdop;
pub mod time;

use crate::types::MessageType;

/// Header fields shared by all NovAtel ASCII logs, marker excluded
pub(crate) const NOVATEL_HEADER_FIELDS: usize = 9;

const NOVATEL_HEADER_COLUMNS: [&str; NOVATEL_HEADER_FIELDS] = [
    "port",
    "sequence",
    "idle_time",
    "time_status",
    "week",
    "seconds",
    "receiver_status",
    "reserved",
    "sw_version",
];

/// Decode a single-line record of the given type
///
/// Dispatches to the per-type decoder. [`MessageType::SatelliteView`] is
/// multi-line and decoded through [`gpgsv::decode`] instead;
/// [`MessageType::Raw`] has no decoder.
pub fn decode_single(
    message_type: MessageType,
    timestamp: &str,
    line: &str,
) -> Option<Vec<String>> {
    match message_type {
        MessageType::PositionVelocity => bestxyz::decode(timestamp, line),
        MessageType::Time => time::decode(timestamp, line),
        MessageType::DilutionOfPrecision => psrdop::decode(timestamp, line),
        MessageType::HardwareMonitor => hwmonitor::decode(timestamp, line),
        MessageType::SatelliteView | MessageType::Raw => None,
    }
}

/// Column names of a type's output schema, in row order
pub fn columns(message_type: MessageType) -> Vec<String> {
    match message_type {
        MessageType::PositionVelocity => novatel_columns(bestxyz::BODY_COLUMNS),
        MessageType::Time => novatel_columns(time::BODY_COLUMNS),
        MessageType::DilutionOfPrecision => novatel_columns(psrdop::BODY_COLUMNS),
        MessageType::HardwareMonitor => hwmonitor::columns(),
        MessageType::SatelliteView => gpgsv::columns(),
        MessageType::Raw => vec!["timestamp".to_string(), "line".to_string()],
    }
}

/// Fixed row arity of a type's output schema
pub fn arity(message_type: MessageType) -> usize {
    columns(message_type).len()
}

pub(crate) fn novatel_columns(body: &[&str]) -> Vec<String> {
    let mut cols = vec!["timestamp".to_string(), "message".to_string()];
    cols.extend(NOVATEL_HEADER_COLUMNS.iter().map(|c| c.to_string()));
    cols.extend(body.iter().map(|c| c.to_string()));
    cols
}

/// Split a NovAtel ASCII log line into header and body fields
///
/// The header runs from the marker to the `;` separator; the body from
/// there to the `*crc` trailer. Returns the marker (without its trailing
/// comma), the header fields after the marker, and the body fields.
/// Fails when the framing or the shared header arity is off.
pub(crate) fn split_novatel(line: &str) -> Option<(&str, Vec<&str>, Vec<&str>)> {
    if !line.starts_with('#') {
        return None;
    }
    let (header_part, rest) = line.split_once(';')?;
    let body_part = rest.rsplit_once('*').map(|(body, _crc)| body).unwrap_or(rest);

    let mut header_fields = header_part.split(',');
    let marker = header_fields.next()?;
    let header: Vec<&str> = header_fields.map(str::trim).collect();
    if header.len() < NOVATEL_HEADER_FIELDS {
        return None;
    }

    let body: Vec<&str> = body_part.split(',').map(str::trim).collect();
    Some((marker, header, body))
}

/// Assemble the common row prefix: timestamp, marker, header fields
pub(crate) fn row_prefix(timestamp: &str, marker: &str, header: &[&str]) -> Vec<String> {
    let mut row = Vec::with_capacity(2 + NOVATEL_HEADER_FIELDS);
    row.push(timestamp.to_string());
    row.push(marker.to_string());
    row.extend(
        header[..NOVATEL_HEADER_FIELDS]
            .iter()
            .map(|f| f.to_string()),
    );
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_novatel() {
        let line = "#PSRDOPA,COM1,0,49.5,FINESTEERING,2167,144140.000,02000000,bebf,32768;1.9695,1.7613,1.0155*cbca6e6c";
        let (marker, header, body) = split_novatel(line).unwrap();
        assert_eq!(marker, "#PSRDOPA");
        assert_eq!(header.len(), 9);
        assert_eq!(header[3], "FINESTEERING");
        assert_eq!(body, vec!["1.9695", "1.7613", "1.0155"]);
    }

    #[test]
    fn test_split_novatel_requires_framing() {
        assert!(split_novatel("$GPGSV,3,1,11*7C").is_none());
        assert!(split_novatel("#TIMEA,COM1,0,50.5 no separator").is_none());
        assert!(split_novatel("#TIMEA,COM1,0;VALID*00").is_none()); // short header
    }

    #[test]
    fn test_schema_arities_are_consistent() {
        for message_type in MessageType::ALL {
            assert_eq!(columns(message_type).len(), arity(message_type));
        }
        assert_eq!(arity(MessageType::PositionVelocity), 39);
        assert_eq!(arity(MessageType::Time), 22);
        assert_eq!(arity(MessageType::DilutionOfPrecision), 17);
        assert_eq!(arity(MessageType::Raw), 2);
    }
}
