//! # Motion telemetry interface
//!
//! This library defines the telemetry types exchanged between the two motion
//! sources (the head-worn sensor and the handheld device) and the attitude
//! executable, along with the decoding of raw field-keyed records into typed
//! samples.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Reference frame capability bitmask and catalog
pub mod frame;

/// Motion samples and the raw record decoder
pub mod motion;

/// Quaternion and attitude types with the associated algebra
pub mod quat;
