//! Sampling filter and capture-window duration limiter
//!
//! Both operate on receiver time (the record's own timestamp), not on
//! wall-clock processing time. Filter rejection and window expiry are
//! expected outcomes of a run, surfaced only as counts and state.

use crate::timestamp::GpsTime;
use crate::types::MessageType;
use std::collections::HashMap;

/// Per-type sampling filter enforcing a minimum spacing between accepted
/// records
///
/// The first record of each type is accepted unconditionally; thereafter a
/// record passes only if its timestamp is at least one sampling interval
/// past the last accepted record of the same type. Rejected records are
/// dropped, not buffered. Raw records bypass this filter entirely.
#[derive(Debug)]
pub struct SamplingFilter {
    interval: f64,
    last_accepted: HashMap<MessageType, f64>,
}

impl SamplingFilter {
    /// Create a filter with the given spacing in seconds; a non-positive
    /// interval accepts everything
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last_accepted: HashMap::new(),
        }
    }

    /// Decide accept/reject for a record of `message_type` at `time`
    ///
    /// On accept, the per-type state advances to `time`. Records without a
    /// timestamp cannot be spaced and are accepted without advancing state.
    pub fn should_emit(&mut self, message_type: MessageType, time: Option<GpsTime>) -> bool {
        if message_type == MessageType::Raw {
            return true;
        }
        let time = match time {
            Some(t) => t.total_seconds(),
            None => return true,
        };

        match self.last_accepted.get(&message_type) {
            Some(last) if time - last < self.interval => false,
            _ => {
                self.last_accepted.insert(message_type, time);
                true
            }
        }
    }
}

/// The bounded time span during which records may be emitted
///
/// `start` is latched once, on the first record accepted into any output
/// stream, then read-only for the rest of the run.
#[derive(Debug)]
pub struct CaptureWindow {
    start: Option<f64>,
    max_duration: f64,
}

/// Signals pipeline termination once the capture window has closed
#[derive(Debug)]
pub struct DurationLimiter {
    window: CaptureWindow,
}

impl DurationLimiter {
    pub fn new(max_duration_seconds: f64) -> Self {
        Self {
            window: CaptureWindow {
                start: None,
                max_duration: max_duration_seconds,
            },
        }
    }

    /// Latch the window start; later calls are no-ops
    pub fn latch(&mut self, time: GpsTime) {
        if self.window.start.is_none() {
            log::info!("Capture window opened at {}", time);
            self.window.start = Some(time.total_seconds());
        }
    }

    pub fn is_started(&self) -> bool {
        self.window.start.is_some()
    }

    /// Seconds of receiver time elapsed since the latch, zero before it
    pub fn elapsed(&self, time: GpsTime) -> f64 {
        self.window
            .start
            .map(|start| time.total_seconds() - start)
            .unwrap_or(0.0)
    }

    /// True once `time` falls beyond the capture window
    ///
    /// Never true before the window is latched; a run that accepts nothing
    /// proceeds to natural end-of-file.
    pub fn expired(&self, time: GpsTime) -> bool {
        match self.window.start {
            Some(start) => time.total_seconds() - start > self.window.max_duration,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: f64) -> Option<GpsTime> {
        Some(GpsTime::new(2167, seconds))
    }

    #[test]
    fn test_first_record_always_accepted() {
        let mut filter = SamplingFilter::new(1.0);
        assert!(filter.should_emit(MessageType::PositionVelocity, at(100.0)));
    }

    #[test]
    fn test_sub_interval_record_rejected_then_later_accepted() {
        let mut filter = SamplingFilter::new(1.0);
        assert!(filter.should_emit(MessageType::PositionVelocity, at(100.0)));
        // 0.4 s after the first: rejected
        assert!(!filter.should_emit(MessageType::PositionVelocity, at(100.4)));
        // 1.1 s after the first: accepted
        assert!(filter.should_emit(MessageType::PositionVelocity, at(101.1)));
        // Spacing measured from the last *accepted* record
        assert!(!filter.should_emit(MessageType::PositionVelocity, at(102.0)));
    }

    #[test]
    fn test_types_are_filtered_independently() {
        let mut filter = SamplingFilter::new(1.0);
        assert!(filter.should_emit(MessageType::PositionVelocity, at(100.0)));
        assert!(filter.should_emit(MessageType::Time, at(100.2)));
        assert!(!filter.should_emit(MessageType::PositionVelocity, at(100.4)));
    }

    #[test]
    fn test_raw_bypasses_sampling() {
        let mut filter = SamplingFilter::new(1.0);
        assert!(filter.should_emit(MessageType::Raw, at(100.0)));
        assert!(filter.should_emit(MessageType::Raw, at(100.0)));
        assert!(filter.should_emit(MessageType::Raw, None));
    }

    #[test]
    fn test_zero_interval_accepts_everything() {
        let mut filter = SamplingFilter::new(0.0);
        assert!(filter.should_emit(MessageType::Time, at(100.0)));
        assert!(filter.should_emit(MessageType::Time, at(100.0)));
    }

    #[test]
    fn test_limiter_never_expires_before_latch() {
        let limiter = DurationLimiter::new(30.0);
        assert!(!limiter.is_started());
        assert!(!limiter.expired(GpsTime::new(2167, 1e6)));
    }

    #[test]
    fn test_limiter_expires_past_window() {
        let mut limiter = DurationLimiter::new(30.0);
        limiter.latch(GpsTime::new(2167, 100.0));
        limiter.latch(GpsTime::new(2167, 200.0)); // no-op, start already set

        assert!(!limiter.expired(GpsTime::new(2167, 130.0))); // exactly at the edge
        assert!(limiter.expired(GpsTime::new(2167, 130.5)));
        assert_eq!(limiter.elapsed(GpsTime::new(2167, 130.5)), 30.5);
    }
}
