//! Log cursor: line-oriented reading with start-position search
//!
//! The cursor wraps the input source and yields logical lines together with
//! their byte offsets. It is forward-only except for one sanctioned seek:
//! when the configured byte offset turns out to be past end-of-file, the
//! pipeline may rewind to just after the first navigation-lock line seen
//! during the scan.
//!
//! Lines whose bytes are not valid UTF-8 are skipped and counted, never
//! turned into a run failure.

use crate::types::{RawLine, Result};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Receiver time status indicating a fully converged navigation solution
pub const LOCK_KEYWORD: &str = "FINESTEERING";

/// Line reader over the raw log
pub struct LogCursor<R: Read + Seek> {
    reader: BufReader<R>,
    position: u64,
    encoding_failures: u64,
}

impl<R: Read + Seek> LogCursor<R> {
    /// Wrap an input source positioned at its start
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
            position: 0,
            encoding_failures: 0,
        }
    }

    /// Byte offset of the next unread line
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Lines skipped so far because of malformed encoding
    pub fn encoding_failures(&self) -> u64 {
        self.encoding_failures
    }

    /// Read the next non-empty logical line
    ///
    /// Returns `Ok(None)` at end of input. Empty lines and lines with
    /// invalid UTF-8 are consumed silently (the latter counted).
    pub fn next_line(&mut self) -> Result<Option<RawLine>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let start = self.position;
            let read = self.reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.position += read as u64;

            match std::str::from_utf8(&buf) {
                Ok(text) => {
                    let text = text.trim_end_matches(['\r', '\n']);
                    if text.is_empty() {
                        continue;
                    }
                    return Ok(Some(RawLine {
                        text: text.to_string(),
                        offset: start,
                    }));
                }
                Err(_) => {
                    self.encoding_failures += 1;
                    log::debug!("Skipping line with invalid encoding at offset {}", start);
                    continue;
                }
            }
        }
    }

    /// Rewind to an absolute byte offset (the initial offset search only)
    pub fn rewind_to(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }
}

/// Start-condition tracker for the seeking phase
///
/// Capture begins at the first line boundary at or past the configured
/// offset. If end-of-file arrives first, the position just after the first
/// lock-reporting line (if one was seen) is the fallback start.
#[derive(Debug)]
pub struct StartCondition {
    offset_bytes: u64,
    lock_resume: Option<u64>,
}

impl StartCondition {
    pub fn new(offset_bytes: u64) -> Self {
        Self {
            offset_bytes,
            lock_resume: None,
        }
    }

    /// Feed one scanned line; returns true once the start offset is reached
    ///
    /// `end_offset` is the byte offset just past the line, the position the
    /// lock fallback would resume from.
    pub fn observe(&mut self, line: &RawLine, end_offset: u64) -> bool {
        if self.lock_resume.is_none() && line.text.contains(LOCK_KEYWORD) {
            log::info!("Navigation lock reported at offset {}", line.offset);
            self.lock_resume = Some(end_offset);
        }
        line.offset >= self.offset_bytes
    }

    /// Resume offset just past the first lock line, if one was seen
    pub fn lock_fallback(&self) -> Option<u64> {
        self.lock_resume
    }
}
