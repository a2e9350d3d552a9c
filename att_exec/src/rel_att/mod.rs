//! Relative attitude engine module
//!
//! `RelAtt` holds the most recent sample from each of the two motion sources
//! and recomputes the orientation of the primary source relative to the
//! secondary whenever either source emits (a latest-value join, no history is
//! buffered).
//!
//! Malformed telemetry events surface as
//! [`motion_if::motion::MalformedSampleError`] from `proc` - the event is
//! dropped and the stream continues.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use state::*;
