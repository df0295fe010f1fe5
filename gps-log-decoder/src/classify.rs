//! Record classification
//!
//! Maps a raw log line to its message type by the marker at the start of
//! the line. Classification is a pure function of line content; the one
//! stateful neighbor is the satellite-view accumulator, which groups the
//! consecutive `$GPGSV` sentences that make up a single visibility report.

use crate::types::{MessageType, RawLine};

/// Classify a raw line by its leading marker
///
/// Lines matching no known marker classify as [`MessageType::Raw`].
pub fn classify(line: &str) -> MessageType {
    for message_type in MessageType::ALL {
        if let Some(marker) = message_type.marker() {
            if line.starts_with(marker) {
                return message_type;
            }
        }
    }
    MessageType::Raw
}

/// Outcome of feeding one `$GPGSV` sentence to the accumulator
#[derive(Debug, PartialEq, Eq)]
pub enum GsvPush {
    /// Sentence joined the pending group; more sentences expected
    Pending,
    /// Sentence completed the group; take it with [`GsvAccumulator::take`]
    Complete,
    /// Sentence did not continue the pending group; the pending sentences
    /// were discarded (an incomplete group) and this sentence starts a new
    /// group, which may itself already be complete
    Restarted { complete: bool },
}

/// Accumulator for multi-sentence satellite-view reports
///
/// A report announces its sentence count in the first field
/// (`$GPGSV,<total>,<index>,...`); the group is complete when sentence
/// `total` of `total` has arrived. A sentence that breaks the expected
/// index sequence ends the pending group prematurely.
#[derive(Debug, Default)]
pub struct GsvAccumulator {
    lines: Vec<String>,
    expected_total: usize,
}

impl GsvAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Feed the next `$GPGSV` sentence
    pub fn push(&mut self, line: &RawLine) -> GsvPush {
        let (total, index) = match sentence_position(&line.text) {
            Some(position) => position,
            // Unparseable sentence counts: cannot be grouped, drop whatever
            // was pending and leave the accumulator empty.
            None => {
                self.lines.clear();
                self.expected_total = 0;
                return GsvPush::Restarted { complete: false };
            }
        };

        let continues = !self.lines.is_empty()
            && total == self.expected_total
            && index == self.lines.len() + 1;
        let starts = self.lines.is_empty() && index == 1;

        if continues || starts {
            self.expected_total = total;
            self.lines.push(line.text.clone());
            if self.lines.len() == self.expected_total {
                GsvPush::Complete
            } else {
                GsvPush::Pending
            }
        } else {
            let had_pending = !self.lines.is_empty();
            self.lines.clear();
            if index == 1 {
                self.expected_total = total;
                self.lines.push(line.text.clone());
                let complete = self.lines.len() == self.expected_total;
                if had_pending {
                    GsvPush::Restarted { complete }
                } else if complete {
                    GsvPush::Complete
                } else {
                    GsvPush::Pending
                }
            } else {
                // Mid-report sentence with no matching head; nothing usable.
                self.expected_total = 0;
                GsvPush::Restarted { complete: false }
            }
        }
    }

    /// Take the completed (or abandoned) group, resetting the accumulator
    pub fn take(&mut self) -> Vec<String> {
        self.expected_total = 0;
        std::mem::take(&mut self.lines)
    }
}

/// Parse `(total_sentences, sentence_index)` from a `$GPGSV` sentence
fn sentence_position(line: &str) -> Option<(usize, usize)> {
    let rest = line.strip_prefix("$GPGSV,")?;
    let mut fields = rest.split(',');
    let total: usize = fields.next()?.trim().parse().ok()?;
    let index: usize = fields.next()?.trim().parse().ok()?;
    if total == 0 || index == 0 || index > total {
        return None;
    }
    Some((total, index))
}
