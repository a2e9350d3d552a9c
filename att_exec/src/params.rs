//! Executable-level parameters

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Parameters controlling the attitude executable, loaded from
/// `params/att_exec.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Optional reference frame bit to activate both streams with. Absent
    /// means "use each device's default frame". A bit outside a device's
    /// capability bitmask falls back to that device's default with a warning.
    pub frame_request: Option<u32>,

    /// Bound of the source event channel. Producers block when the channel is
    /// full, events are never dropped.
    pub event_channel_bound: usize,
}
