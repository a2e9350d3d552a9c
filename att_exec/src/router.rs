//! Source event routing between the telemetry producers and the engine.
//!
//! The two motion sources are independent producers, but the engine's state
//! slots must only ever be written from one place. Producers therefore send
//! tagged events down a bounded channel and a single consumer (the main loop)
//! receives them one at a time, so each "write slot + recompute" step
//! finishes before the next event is accepted and no locking is needed.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Serialize;
use serde_json::Value;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Identifies which of the two motion sources an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorSource {
    /// The head-worn sensor
    Primary,

    /// The handheld device
    Secondary,
}

/// An event delivered by a telemetry producer.
#[derive(Debug)]
pub enum SourceEvent {
    /// A raw telemetry record was acquired from the given source. The record
    /// is undecoded, validation is the engine's job.
    Record(SensorSource, Value),

    /// The given source will produce no further records.
    EndOfStream(SensorSource),
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Create the bounded event channel joining the producers to the consumer.
///
/// Each producer gets a clone of the sender. A full channel blocks the
/// producer, never drops events.
pub fn event_channel(bound: usize) -> (SyncSender<SourceEvent>, Receiver<SourceEvent>) {
    sync_channel(bound)
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl SensorSource {
    /// Human readable name of the source, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SensorSource::Primary => "primary (head-worn)",
            SensorSource::Secondary => "secondary (handheld)",
        }
    }
}
