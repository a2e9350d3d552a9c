//! # Attitude executable library.
//!
//! This library allows other crates in the workspace (and the executable's own
//! binary) to access the items defined inside the attitude executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Executable-level parameters
pub mod params;

/// Relative attitude engine module - joins the two telemetry streams and derives the orientation
/// of the primary source relative to the secondary
pub mod rel_att;

/// Replay telemetry source - replays recorded motion scripts as if they were live devices
pub mod replay;

/// Source event routing - carries raw telemetry events from the producer threads into the single
/// consumer which owns the engine
pub mod router;
