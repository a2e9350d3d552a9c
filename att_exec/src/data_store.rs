//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{
    rel_att::{self, RelativeAttitude},
    router::SensorSource,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Event accounting
    /// Number of telemetry events received from both sources
    pub num_events: u64,

    /// Number of events dropped as malformed
    pub num_malformed: u64,

    // Stream lifecycle
    /// True once the primary source has signalled end of stream
    pub primary_ended: bool,

    /// True once the secondary source has signalled end of stream
    pub secondary_ended: bool,

    // RelAtt
    pub rel_att: rel_att::RelAtt,
    pub rel_att_output: Option<RelativeAttitude>,
    pub rel_att_status_rpt: rel_att::StatusReport,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Record that the given source has ended its stream.
    pub fn mark_stream_ended(&mut self, source: SensorSource) {
        match source {
            SensorSource::Primary => self.primary_ended = true,
            SensorSource::Secondary => self.secondary_ended = true,
        }
    }

    /// True once both sources have ended their streams, at which point no
    /// further computation is possible.
    pub fn all_streams_ended(&self) -> bool {
        self.primary_ended && self.secondary_ended
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stream_lifecycle() {
        let mut ds = DataStore::default();
        assert!(!ds.all_streams_ended());

        ds.mark_stream_ended(SensorSource::Primary);
        assert!(!ds.all_streams_ended());

        // Marking the same stream twice changes nothing
        ds.mark_stream_ended(SensorSource::Primary);
        assert!(!ds.all_streams_ended());

        ds.mark_stream_ended(SensorSource::Secondary);
        assert!(ds.all_streams_ended());
    }
}
