//! # Motion script replay source
//!
//! Telemetry acquisition is the concern of the platform transport, which is
//! outside this executable. For development and testing the transport is
//! stood in for by replay sources: recorded motion scripts which are played
//! back as if a live device were emitting them.
//!
//! A motion script is a JSON file of the form:
//!
//! ```json
//! {
//!     "capabilities": 5,
//!     "records": [
//!         { "time_s": 0.0, "quaternionX": 0.0, ... },
//!         { "time_s": 0.1, "quaternionX": 0.01, ... }
//!     ]
//! }
//! ```
//!
//! `capabilities` is the device's reference frame capability bitmask and each
//! record carries the raw telemetry fields plus the offset from stream start
//! at which it is delivered. Records are delivered undecoded - a malformed
//! record in a script is rejected by the engine exactly like one from a live
//! device would be.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

// Internal
use crate::router::{SensorSource, SourceEvent};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// A raw telemetry record scheduled for delivery at a specific time.
struct TimedRecord {
    /// Offset from stream start at which to deliver the record
    time_s: f64,

    /// The raw record, delivered as-is
    record: Value,
}

/// A loaded motion script for one source.
pub struct MotionScript {
    _script_path: PathBuf,

    /// The reference frame capability bitmask reported by the recorded device
    pub capabilities: u32,

    records: VecDeque<TimedRecord>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("The script has no `capabilities` bitmask (or it is not a non-negative integer)")]
    MissingCapabilities,

    #[error("The script contains no records")]
    ScriptEmpty,

    #[error(
        "Record {0} has an invalid timestamp: `time_s` must be a non-negative \
        float no smaller than its predecessor's"
    )]
    InvalidTimestamp(usize),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MotionScript {
    /// Load a motion script from the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        let root: Value = match serde_json::from_str(&script) {
            Ok(v) => v,
            Err(e) => return Err(ScriptError::InvalidJson(e)),
        };

        Self::from_value(path, &root)
    }

    /// Build a script from an already parsed JSON value.
    fn from_value(path: PathBuf, root: &Value) -> Result<Self, ScriptError> {
        // The capability bitmask is any non-negative integer, unknown bits
        // are ignored by the frame catalog
        let capabilities = match root["capabilities"].as_u64() {
            Some(c) => c as u32,
            None => return Err(ScriptError::MissingCapabilities),
        };

        let raw_records = match root["records"].as_array() {
            Some(r) if !r.is_empty() => r,
            _ => return Err(ScriptError::ScriptEmpty),
        };

        // Validate the delivery times: non-negative and monotonically
        // non-decreasing. The records themselves stay unvalidated.
        let mut records: VecDeque<TimedRecord> = VecDeque::with_capacity(raw_records.len());
        let mut last_time_s = 0.0;

        for (i, record) in raw_records.iter().enumerate() {
            let time_s = match record["time_s"].as_f64() {
                Some(t) if t >= last_time_s => t,
                _ => return Err(ScriptError::InvalidTimestamp(i)),
            };

            last_time_s = time_s;

            records.push_back(TimedRecord {
                time_s,
                record: record.clone(),
            });
        }

        Ok(MotionScript {
            _script_path: path,
            capabilities,
            records,
        })
    }

    /// Get the number of records in the script
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Get the length of the script in seconds
    pub fn duration_s(&self) -> f64 {
        match self.records.back() {
            Some(r) => r.time_s,
            None => 0f64,
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Spawn the producer thread replaying the given script.
///
/// Each record is delivered into the event channel at its scheduled offset
/// from stream start, followed by a final [`SourceEvent::EndOfStream`]. The
/// thread stops early if the consumer has gone away.
pub fn spawn_replay(
    script: MotionScript,
    source: SensorSource,
    sender: SyncSender<SourceEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream_start = Instant::now();

        debug!(
            "Replay of {} records for {} source started",
            script.num_records(),
            source.name()
        );

        for timed in script.records {
            // Sleep until the record is due. A record which is already late
            // (the channel blocked us) is delivered immediately.
            let due = Duration::from_secs_f64(timed.time_s);
            if let Some(wait) = due.checked_sub(stream_start.elapsed()) {
                thread::sleep(wait);
            }

            trace!("Delivering {} record at {:.3} s", source.name(), timed.time_s);

            if sender.send(SourceEvent::Record(source, timed.record)).is_err() {
                // Consumer gone, nothing left to deliver to
                return;
            }
        }

        sender.send(SourceEvent::EndOfStream(source)).ok();

        debug!("Replay for {} source complete", source.name());
    })
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn load(root: &Value) -> Result<MotionScript, ScriptError> {
        MotionScript::from_value(PathBuf::from("test.json"), root)
    }

    #[test]
    fn test_valid_script_loads() {
        let script = load(&json!({
            "capabilities": 0b0101,
            "records": [
                { "time_s": 0.0, "quaternionW": 1.0 },
                { "time_s": 0.5, "quaternionW": 1.0 },
                { "time_s": 1.5, "quaternionW": 1.0 }
            ]
        }))
        .unwrap();

        assert_eq!(script.capabilities, 0b0101);
        assert_eq!(script.num_records(), 3);
        assert_eq!(script.duration_s(), 1.5);
    }

    #[test]
    fn test_missing_capabilities_rejected() {
        let result = load(&json!({
            "records": [{ "time_s": 0.0 }]
        }));

        assert!(matches!(result, Err(ScriptError::MissingCapabilities)));
    }

    #[test]
    fn test_empty_records_rejected() {
        let result = load(&json!({ "capabilities": 1, "records": [] }));

        assert!(matches!(result, Err(ScriptError::ScriptEmpty)));
    }

    #[test]
    fn test_non_monotonic_timestamps_rejected() {
        let result = load(&json!({
            "capabilities": 1,
            "records": [
                { "time_s": 1.0 },
                { "time_s": 0.5 }
            ]
        }));

        assert!(matches!(result, Err(ScriptError::InvalidTimestamp(1))));
    }

    #[test]
    fn test_replay_delivers_all_records_then_end_of_stream() {
        let script = load(&json!({
            "capabilities": 1,
            "records": [
                { "time_s": 0.0, "n": 1 },
                { "time_s": 0.0, "n": 2 }
            ]
        }))
        .unwrap();

        let (tx, rx) = crate::router::event_channel(8);
        let handle = spawn_replay(script, SensorSource::Secondary, tx);

        let mut records = 0;
        let mut ended = false;
        while let Ok(event) = rx.recv() {
            match event {
                SourceEvent::Record(source, _) => {
                    assert_eq!(source, SensorSource::Secondary);
                    records += 1;
                }
                SourceEvent::EndOfStream(_) => {
                    ended = true;
                    break;
                }
            }
        }

        handle.join().unwrap();
        assert_eq!(records, 2);
        assert!(ended);
    }
}
