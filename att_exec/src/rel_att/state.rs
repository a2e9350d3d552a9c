//! Implementations for the RelAtt state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use log::{info, trace};
use serde::Serialize;
use serde_json::Value;

// Internal
use crate::router::SensorSource;
use motion_if::{
    frame::ReferenceFrame,
    motion::{MalformedSampleError, MotionSample},
    quat::Attitude,
};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Relative attitude engine state.
///
/// The two latest-sample slots are private and only ever written by the
/// update entry points, which recompute synchronously before returning. With
/// updates serialized through the event channel there is no overlap and no
/// reentrancy hazard.
#[derive(Default)]
pub struct RelAtt {
    /// The reference frame both streams were activated with. Recorded for
    /// telemetry only, the engine never verifies the samples against it.
    frame: Option<ReferenceFrame>,

    /// Most recent sample from the primary (head-worn) source
    latest_primary: Option<MotionSample>,

    /// Most recent sample from the secondary (handheld) source
    latest_secondary: Option<MotionSample>,

    report: StatusReport,
}

/// Input data to the relative attitude engine: one raw telemetry event.
#[derive(Debug)]
pub struct InputData {
    /// The source the record was acquired from
    pub source: SensorSource,

    /// The raw, undecoded record
    pub record: Value,
}

/// Output of a successful recompute.
///
/// # Caller contract
///
/// The relative attitude is only physically meaningful if both sources report
/// their attitude against the *same* reference frame. The engine does not and
/// cannot verify this, it will happily produce a numerically valid but
/// meaningless result from mismatched frames. Activating both streams with
/// the same frame is the caller's obligation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RelativeAttitude {
    /// Attitude of the primary source expressed in the secondary source's
    /// frame. The quaternion is authoritative, pitch/roll/yaw are a
    /// projection.
    pub attitude: Attitude,

    /// UTC time of the recompute
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Output data from engine processing. `None` means the triggering event did
/// not complete the join (one of the slots is still empty), which is a no-op
/// rather than an error.
pub type OutputData = Option<RelativeAttitude>;

/// Status report for RelAtt processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// True once the primary slot holds a sample
    pub primary_populated: bool,

    /// True once the secondary slot holds a sample
    pub secondary_populated: bool,

    /// Decoded events accepted per source
    pub primary_accepted: u64,
    pub secondary_accepted: u64,

    /// Malformed events rejected per source
    pub primary_rejected: u64,
    pub secondary_rejected: u64,

    /// Number of relative attitudes emitted
    pub num_emitted: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for RelAtt {
    type InitData = ReferenceFrame;
    type InitError = std::convert::Infallible;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MalformedSampleError;

    /// Initialise the RelAtt module.
    ///
    /// Expected init data is the reference frame both streams were activated
    /// with.
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        self.frame = Some(init_data);

        info!(
            "RelAtt initialised, active reference frame: {}",
            init_data.name()
        );

        Ok(())
    }

    /// Process one raw telemetry event.
    ///
    /// The record is decoded, the corresponding slot replaced, and the
    /// relative attitude recomputed. A malformed record increments the
    /// rejected counter and is surfaced as an error without touching the
    /// slots - the stream continues with the next event.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let sample = match MotionSample::from_record(&input_data.record) {
            Ok(s) => s,
            Err(e) => {
                match input_data.source {
                    SensorSource::Primary => self.report.primary_rejected += 1,
                    SensorSource::Secondary => self.report.secondary_rejected += 1,
                };
                return Err(e);
            }
        };

        let output = match input_data.source {
            SensorSource::Primary => self.update_primary(sample),
            SensorSource::Secondary => self.update_secondary(sample),
        };

        Ok((output, self.report))
    }
}

impl RelAtt {
    /// Replace the primary slot with a newly arrived sample and recompute.
    pub fn update_primary(&mut self, sample: MotionSample) -> OutputData {
        self.latest_primary = Some(sample);
        self.report.primary_populated = true;
        self.report.primary_accepted += 1;

        self.recompute()
    }

    /// Replace the secondary slot with a newly arrived sample and recompute.
    pub fn update_secondary(&mut self, sample: MotionSample) -> OutputData {
        self.latest_secondary = Some(sample);
        self.report.secondary_populated = true;
        self.report.secondary_accepted += 1;

        self.recompute()
    }

    /// The frame the module was initialised with, if any.
    pub fn frame(&self) -> Option<ReferenceFrame> {
        self.frame
    }

    /// Derive the orientation of the primary source relative to the
    /// secondary from the two latest samples.
    ///
    /// With `p` and `s` the two attitude quaternions this is
    /// `p * conjugate(s)`, the attitude of the primary source as observed in
    /// the secondary source's frame. Operand order matters, the Hamilton
    /// product is non-commutative.
    ///
    /// Emits exactly one output per call when both slots are populated, and
    /// nothing otherwise. See [`RelativeAttitude`] for the same-frame caller
    /// contract.
    fn recompute(&mut self) -> OutputData {
        let primary = self.latest_primary.as_ref()?;
        let secondary = self.latest_secondary.as_ref()?;

        let relative = primary
            .attitude
            .quat
            .multiply(&secondary.attitude.quat.conjugate());

        self.report.num_emitted += 1;

        trace!(
            "Recompute {} -> relative quat ({:.6}, {:.6}, {:.6}, {:.6})",
            self.report.num_emitted,
            relative.x,
            relative.y,
            relative.z,
            relative.w
        );

        Some(RelativeAttitude {
            attitude: Attitude::from_quat(relative),
            timestamp: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    const TOL: f64 = 1e-9;

    /// Build a well formed record with the given quaternion.
    fn record_with_quat(x: f64, y: f64, z: f64, w: f64) -> Value {
        json!({
            "quaternionX": x,
            "quaternionY": y,
            "quaternionZ": z,
            "quaternionW": w,
            "pitch": 0.0,
            "roll": 0.0,
            "yaw": 0.0
        })
    }

    fn sample_with_quat(x: f64, y: f64, z: f64, w: f64) -> MotionSample {
        MotionSample::from_record(&record_with_quat(x, y, z, w)).unwrap()
    }

    #[test]
    fn test_single_slot_emits_nothing() {
        let mut engine = RelAtt::default();

        let out = engine.update_primary(sample_with_quat(0.0, 0.0, 0.0, 1.0));

        assert!(out.is_none());
        assert!(engine.report.primary_populated);
        assert!(!engine.report.secondary_populated);
        assert_eq!(engine.report.num_emitted, 0);
    }

    #[test]
    fn test_identical_sources_emit_identity() {
        let mut engine = RelAtt::default();

        let n = (0.1f64 * 0.1 + 0.3 * 0.3 + 0.2 * 0.2 + 0.5 * 0.5).sqrt();
        let sample = sample_with_quat(0.1 / n, -0.3 / n, 0.2 / n, 0.5 / n);

        engine.update_primary(sample);
        let out = engine.update_secondary(sample).unwrap();

        assert!(out.attitude.pitch_rad.abs() < TOL);
        assert!(out.attitude.roll_rad.abs() < TOL);
        assert!(out.attitude.yaw_rad.abs() < TOL);
        assert!((out.attitude.quat.w.abs() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_relative_yaw_quarter_turn() {
        let mut engine = RelAtt::default();

        // Primary rotated 90 degrees about Z, secondary at identity
        engine.update_primary(sample_with_quat(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2));
        let out = engine
            .update_secondary(sample_with_quat(0.0, 0.0, 0.0, 1.0))
            .unwrap();

        assert!((out.attitude.yaw_rad - FRAC_PI_2).abs() < TOL);
        assert!(out.attitude.pitch_rad.abs() < TOL);
        assert!(out.attitude.roll_rad.abs() < TOL);
    }

    #[test]
    fn test_latest_value_join_replaces_slot() {
        let mut engine = RelAtt::default();

        // The first primary sample must be fully superseded by the second
        engine.update_primary(sample_with_quat(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2));
        engine.update_primary(sample_with_quat(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2));
        let out = engine
            .update_secondary(sample_with_quat(0.0, 0.0, 0.0, 1.0))
            .unwrap();

        assert!((out.attitude.yaw_rad - FRAC_PI_2).abs() < TOL);
        assert!(out.attitude.roll_rad.abs() < TOL);
        assert_eq!(engine.report.primary_accepted, 2);
    }

    #[test]
    fn test_each_update_emits_once_both_populated() {
        let mut engine = RelAtt::default();

        engine.update_primary(sample_with_quat(0.0, 0.0, 0.0, 1.0));
        engine.update_secondary(sample_with_quat(0.0, 0.0, 0.0, 1.0));
        engine.update_primary(sample_with_quat(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2));

        assert_eq!(engine.report.num_emitted, 2);
    }

    #[test]
    fn test_proc_surfaces_malformed_and_continues() {
        let mut engine = RelAtt::default();

        let mut bad = record_with_quat(0.0, 0.0, 0.0, 1.0);
        bad.as_object_mut().unwrap().remove("quaternionW");

        let result = engine.proc(&InputData {
            source: SensorSource::Primary,
            record: bad,
        });

        match result {
            Err(MalformedSampleError::MissingField(name)) => assert_eq!(name, "quaternionW"),
            other => panic!("Expected MissingField error, got {:?}", other),
        }
        assert_eq!(engine.report.primary_rejected, 1);

        // The stream continues, a good event on the same source still works
        let (out, report) = engine
            .proc(&InputData {
                source: SensorSource::Primary,
                record: record_with_quat(0.0, 0.0, 0.0, 1.0),
            })
            .unwrap();

        assert!(out.is_none());
        assert_eq!(report.primary_accepted, 1);
        assert_eq!(report.primary_rejected, 1);
    }
}
