//! # Reference frame catalog
//!
//! Devices report the set of orientation reference frames they support as a
//! capability bitmask with one bit per frame. A stream activation request
//! names at most one frame to activate; requesting a frame outside the
//! capability bitmask is resolved by falling back to the device default
//! rather than failing the stream.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Canonical frame ordering, used whenever frames are enumerated. The order
/// is fixed so that listings are deterministic.
pub static CANONICAL_FRAME_ORDER: [ReferenceFrame; 4] = [
    ReferenceFrame::Arbitrary,
    ReferenceFrame::ArbitraryCorrected,
    ReferenceFrame::MagneticNorth,
    ReferenceFrame::TrueNorth,
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An orientation reference frame, i.e. the external axis convention a
/// device's attitude quaternion is expressed against.
///
/// Each frame maps to one bit of the device capability bitmask. The Z axis is
/// vertical in all frames; they differ in how the X axis is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// X in an arbitrary direction, Z vertical
    Arbitrary,

    /// X arbitrary with magnetometer yaw-drift correction, Z vertical
    ArbitraryCorrected,

    /// X towards magnetic north, Z vertical
    MagneticNorth,

    /// X towards true north, Z vertical
    TrueNorth,
}

/// A stream activation request named a frame which is not in the device's
/// capability bitmask.
///
/// This is not fatal: callers resolve it by substituting the device default
/// frame (see [`default_frame`]).
#[derive(Debug, Clone, Copy, Error)]
#[error(
    "Requested reference frame {requested:?} (bit {:#06b}) is not in the \
    capability bitmask {bitmask:#06b}",
    .requested.bit()
)]
pub struct UnsupportedFrameRequest {
    /// The frame that was requested
    pub requested: ReferenceFrame,

    /// The device capability bitmask the request was checked against
    pub bitmask: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ReferenceFrame {
    /// Get the capability bit for this frame.
    pub fn bit(&self) -> u32 {
        match self {
            ReferenceFrame::Arbitrary => 0b0001,
            ReferenceFrame::ArbitraryCorrected => 0b0010,
            ReferenceFrame::MagneticNorth => 0b0100,
            ReferenceFrame::TrueNorth => 0b1000,
        }
    }

    /// Get the canonical name of this frame.
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceFrame::Arbitrary => "arbitrary",
            ReferenceFrame::ArbitraryCorrected => "arbitrary-corrected",
            ReferenceFrame::MagneticNorth => "magnetic-north",
            ReferenceFrame::TrueNorth => "true-north",
        }
    }

    /// Get the frame named by a single capability bit, or `None` if the bit
    /// does not name a known frame.
    pub fn from_bit(bit: u32) -> Option<Self> {
        CANONICAL_FRAME_ORDER.iter().copied().find(|f| f.bit() == bit)
    }

    /// True iff this frame's bit is set in the given capability bitmask.
    pub fn is_available(&self, bitmask: u32) -> bool {
        bitmask & self.bit() != 0
    }

    /// True if attitudes in this frame have an absolute heading reference.
    ///
    /// The heading field of a motion sample is only meaningful for these
    /// frames.
    pub fn has_absolute_reference(&self) -> bool {
        matches!(
            self,
            ReferenceFrame::MagneticNorth | ReferenceFrame::TrueNorth
        )
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Enumerate the frames present in a capability bitmask, in canonical order.
///
/// Bits which do not name a known frame are silently ignored.
pub fn available_frames(bitmask: u32) -> Vec<ReferenceFrame> {
    CANONICAL_FRAME_ORDER
        .iter()
        .copied()
        .filter(|f| f.is_available(bitmask))
        .collect()
}

/// Enumerate the names of the frames present in a capability bitmask, in
/// canonical order.
pub fn names_of(bitmask: u32) -> Vec<&'static str> {
    available_frames(bitmask).iter().map(|f| f.name()).collect()
}

/// Get the device default frame for a capability bitmask.
///
/// The default is the lowest-order supported frame. An empty bitmask defaults
/// to the arbitrary frame, which every known device supports.
pub fn default_frame(bitmask: u32) -> ReferenceFrame {
    available_frames(bitmask)
        .first()
        .copied()
        .unwrap_or(ReferenceFrame::Arbitrary)
}

/// Resolve a stream activation request against a capability bitmask.
///
/// `None` means "use the device default". A request for an unsupported frame
/// returns [`UnsupportedFrameRequest`]; it is the caller's decision to fall
/// back to [`default_frame`] (the executables do, with a warning).
pub fn select_frame(
    bitmask: u32,
    request: Option<ReferenceFrame>,
) -> Result<ReferenceFrame, UnsupportedFrameRequest> {
    match request {
        None => Ok(default_frame(bitmask)),
        Some(frame) => {
            if frame.is_available(bitmask) {
                Ok(frame)
            } else {
                Err(UnsupportedFrameRequest {
                    requested: frame,
                    bitmask,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_available() {
        assert!(ReferenceFrame::MagneticNorth.is_available(0b0101));
        assert!(!ReferenceFrame::ArbitraryCorrected.is_available(0b0101));
        assert!(!ReferenceFrame::TrueNorth.is_available(0));
    }

    #[test]
    fn test_names_of_full_mask_is_canonical() {
        assert_eq!(
            names_of(0b1111),
            vec![
                "arbitrary",
                "arbitrary-corrected",
                "magnetic-north",
                "true-north"
            ]
        );
    }

    #[test]
    fn test_names_of_empty_mask() {
        assert!(names_of(0).is_empty());
    }

    #[test]
    fn test_names_of_ignores_unknown_bits() {
        assert_eq!(names_of(0b10100), vec!["magnetic-north"]);
    }

    #[test]
    fn test_default_frame_is_lowest_supported() {
        assert_eq!(default_frame(0b1100), ReferenceFrame::MagneticNorth);
        assert_eq!(default_frame(0), ReferenceFrame::Arbitrary);
    }

    #[test]
    fn test_select_frame() {
        // No request uses the default
        assert_eq!(
            select_frame(0b0011, None).unwrap(),
            ReferenceFrame::Arbitrary
        );

        // Supported request is honoured
        assert_eq!(
            select_frame(0b0101, Some(ReferenceFrame::MagneticNorth)).unwrap(),
            ReferenceFrame::MagneticNorth
        );

        // Unsupported request is rejected, carrying the offending pair
        let err = select_frame(0b0001, Some(ReferenceFrame::TrueNorth)).unwrap_err();
        assert_eq!(err.requested, ReferenceFrame::TrueNorth);
        assert_eq!(err.bitmask, 0b0001);
    }
}
