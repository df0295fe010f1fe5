//! CSV output sinks
//!
//! One CSV file per message type, created in the chosen output directory.
//! The pipeline writes the header row and the data rows; this module only
//! adapts `csv::Writer` to the decoder's `RowSink` trait.

use anyhow::{Context, Result};
use gps_log_decoder::{DecoderError, MessageType, RowSink, SinkSet};
use std::fs::File;
use std::path::Path;

/// File name for a message type's CSV output
pub fn file_name(message_type: MessageType) -> String {
    match message_type {
        MessageType::PositionVelocity => "BESTXYZ.csv".to_string(),
        MessageType::Raw => "GPS RAW DATA.csv".to_string(),
        other => format!("GPS {}.csv", other.label()),
    }
}

/// A `RowSink` backed by a CSV writer
pub struct CsvRowSink {
    writer: csv::Writer<File>,
}

impl CsvRowSink {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl RowSink for CsvRowSink {
    fn write_header(&mut self, columns: &[String]) -> gps_log_decoder::Result<()> {
        self.writer
            .write_record(columns)
            .map_err(|e| DecoderError::SinkWrite(e.to_string()))
    }

    fn write_row(&mut self, fields: &[String]) -> gps_log_decoder::Result<()> {
        self.writer
            .write_record(fields)
            .map_err(|e| DecoderError::SinkWrite(e.to_string()))
    }

    fn flush(&mut self) -> gps_log_decoder::Result<()> {
        self.writer
            .flush()
            .map_err(|e| DecoderError::SinkWrite(e.to_string()))
    }
}

/// Create the six CSV sinks in `output_dir`
pub fn open_csv_sinks(output_dir: &Path) -> Result<SinkSet> {
    let mut sinks = SinkSet::new();
    for message_type in MessageType::ALL {
        let path = output_dir.join(file_name(message_type));
        log::debug!("Opening output file: {:?}", path);
        sinks.insert(message_type, Box::new(CsvRowSink::create(&path)?));
    }
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gps_log_decoder::{ParserConfig, Pipeline};
    use std::io::Cursor;

    #[test]
    fn test_file_names() {
        assert_eq!(file_name(MessageType::PositionVelocity), "BESTXYZ.csv");
        assert_eq!(file_name(MessageType::Time), "GPS TIME.csv");
        assert_eq!(file_name(MessageType::Raw), "GPS RAW DATA.csv");
    }

    #[test]
    fn test_csv_sinks_receive_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = open_csv_sinks(dir.path()).unwrap();

        // Empty input: headers only
        let pipeline = Pipeline::new(ParserConfig::new().with_offset_bytes(0));
        pipeline.run(Cursor::new(Vec::new()), &mut sinks).unwrap();

        for message_type in MessageType::ALL {
            let path = dir.path().join(file_name(message_type));
            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.lines().count(), 1, "header only in {:?}", path);
            assert!(content.starts_with("timestamp,"));
        }
    }

    #[test]
    fn test_rows_written_through_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = open_csv_sinks(dir.path()).unwrap();

        let log = "#PSRDOPA,COM1,0,49.5,FINESTEERING,2167,144140.000,02000000,bebf,32768;\
                   1.9695,1.7613,1.0155,1.0971,0.8800,5.0,12,2,5*cbca6e6c\n";
        let pipeline = Pipeline::new(ParserConfig::new().with_offset_bytes(0));
        pipeline
            .run(Cursor::new(log.as_bytes().to_vec()), &mut sinks)
            .unwrap();

        let content = std::fs::read_to_string(
            dir.path().join(file_name(MessageType::DilutionOfPrecision)),
        )
        .unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("1.9695"));
    }
}
