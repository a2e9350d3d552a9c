//! # Motion samples and the raw record decoder
//!
//! The external transport delivers one field-keyed JSON record per telemetry
//! event. This module decodes such records into immutable, strongly typed
//! [`MotionSample`]s, isolating malformed input behind
//! [`MalformedSampleError`] so nothing loosely typed crosses into the rest of
//! the pipeline.
//!
//! Decoding is a structural validation step only: no rounding, clamping or
//! unit conversion is performed beyond parsing each field as an `f64`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Internal
use crate::quat::{Attitude, Quaternion};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A three component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A single decoded motion telemetry sample.
///
/// Immutable once constructed, samples are plain value data and are freely
/// shared by copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// UTC timestamp at which the record was decoded
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Attitude of the device against its active reference frame
    pub attitude: Attitude,

    /// Gravity vector in g
    pub gravity_g: Vec3,

    /// User acceleration (gravity removed) in g
    pub user_accel_g: Vec3,

    /// Rotation rate vector in rad/s
    pub rotation_rate_rads: Vec3,

    /// Magnetic field vector in microtesla
    pub mag_field_ut: Vec3,

    /// Magnetometer calibration accuracy indicator. Negative values signal an
    /// uncalibrated magnetometer, which is valid data rather than an error.
    pub mag_accuracy: f64,

    /// Heading in degrees [0, 360). Only meaningful when the active reference
    /// frame has an absolute reference.
    pub heading_deg: f64,

    /// Which physical sensor produced this sample
    pub location: SensorLocation,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The physical sensor a sample originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorLocation {
    Default,
    Left,
    Right,
}

/// Errors raised while decoding a raw telemetry record.
///
/// A malformed record is dropped and the error surfaced to the consumer; it
/// never terminates the stream.
#[derive(Debug, Error)]
pub enum MalformedSampleError {
    #[error("Record is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Required field `{0}` is missing from the record")]
    MissingField(&'static str),

    #[error("Field `{0}` is not numeric")]
    NonNumericField(&'static str),

    #[error("The attitude quaternion has zero magnitude")]
    ZeroQuaternion,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorLocation {
    /// Map an integer location code to a sensor location.
    ///
    /// The mapping is closed over {0, 1, 2}; unknown codes map to `Default`
    /// so that records from newer device variants keep decoding.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SensorLocation::Default,
            1 => SensorLocation::Left,
            2 => SensorLocation::Right,
            _ => {
                log::trace!("Unknown sensor location code {}, using Default", code);
                SensorLocation::Default
            }
        }
    }
}

impl MotionSample {
    /// Decode a motion sample from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, MalformedSampleError> {
        let record: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(MalformedSampleError::InvalidJson(e)),
        };

        Self::from_record(&record)
    }

    /// Decode a motion sample from a field-keyed record.
    ///
    /// The quaternion components and the pitch/roll/yaw angles are required;
    /// a record missing any of them is malformed. All other fields default
    /// when absent (vectors to zero, the magnetometer accuracy to -1.0, i.e.
    /// uncalibrated) but are malformed if present and non-numeric.
    pub fn from_record(record: &Value) -> Result<Self, MalformedSampleError> {
        let quat = Quaternion::new(
            req_f64(record, "quaternionX")?,
            req_f64(record, "quaternionY")?,
            req_f64(record, "quaternionZ")?,
            req_f64(record, "quaternionW")?,
        );

        // A zero quaternion is no rotation at all, downstream algebra assumes
        // unit norm
        if quat.is_zero() {
            return Err(MalformedSampleError::ZeroQuaternion);
        }

        // The angles come from the record as-is rather than being rederived
        // from the quaternion, decoding must not transform the data
        let attitude = Attitude {
            pitch_rad: req_f64(record, "pitch")?,
            roll_rad: req_f64(record, "roll")?,
            yaw_rad: req_f64(record, "yaw")?,
            quat,
        };

        let location = SensorLocation::from_code(opt_f64(record, "sensorLocation", 0.0)? as i64);

        Ok(MotionSample {
            timestamp: Utc::now(),
            attitude,
            gravity_g: opt_vec3(record, "gravityX", "gravityY", "gravityZ")?,
            user_accel_g: opt_vec3(
                record,
                "accelerationX",
                "accelerationY",
                "accelerationZ",
            )?,
            rotation_rate_rads: opt_vec3(
                record,
                "rotationRateX",
                "rotationRateY",
                "rotationRateZ",
            )?,
            mag_field_ut: opt_vec3(
                record,
                "magneticFieldX",
                "magneticFieldY",
                "magneticFieldZ",
            )?,
            mag_accuracy: opt_f64(record, "magneticFieldAccuracy", -1.0)?,
            heading_deg: opt_f64(record, "heading", 0.0)?,
            location,
        })
    }

    /// True if the magnetometer reading in this sample is calibrated.
    pub fn is_mag_calibrated(&self) -> bool {
        self.mag_accuracy >= 0.0
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Read a field as an `f64`, accepting JSON numbers and numeric strings (the
/// transport is loose about which it produces).
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Parse a required numeric field.
fn req_f64(record: &Value, name: &'static str) -> Result<f64, MalformedSampleError> {
    match &record[name] {
        Value::Null => Err(MalformedSampleError::MissingField(name)),
        v => value_as_f64(v).ok_or(MalformedSampleError::NonNumericField(name)),
    }
}

/// Parse an optional numeric field, defaulting when absent. A field which is
/// present but non-numeric is still malformed.
fn opt_f64(
    record: &Value,
    name: &'static str,
    default: f64,
) -> Result<f64, MalformedSampleError> {
    match &record[name] {
        Value::Null => Ok(default),
        v => value_as_f64(v).ok_or(MalformedSampleError::NonNumericField(name)),
    }
}

/// Parse an optional vector from three component fields.
fn opt_vec3(
    record: &Value,
    x: &'static str,
    y: &'static str,
    z: &'static str,
) -> Result<Vec3, MalformedSampleError> {
    Ok(Vec3 {
        x: opt_f64(record, x, 0.0)?,
        y: opt_f64(record, y, 0.0)?,
        z: opt_f64(record, z, 0.0)?,
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    /// A fully populated, well formed record.
    fn full_record() -> Value {
        json!({
            "quaternionX": 0.0,
            "quaternionY": 0.0,
            "quaternionZ": 0.3826834,
            "quaternionW": 0.9238795,
            "pitch": 0.0,
            "roll": 0.0,
            "yaw": 0.7853982,
            "gravityX": 0.01,
            "gravityY": -0.02,
            "gravityZ": -0.99,
            "accelerationX": 0.001,
            "accelerationY": 0.002,
            "accelerationZ": 0.003,
            "rotationRateX": 0.1,
            "rotationRateY": -0.2,
            "rotationRateZ": 0.3,
            "magneticFieldX": 21.5,
            "magneticFieldY": -3.2,
            "magneticFieldZ": 44.1,
            "magneticFieldAccuracy": 2.0,
            "heading": 312.5,
            "sensorLocation": 1
        })
    }

    #[test]
    fn test_decode_full_record() {
        let sample = MotionSample::from_record(&full_record()).unwrap();

        // Fields must come through unconverted
        assert_eq!(sample.attitude.quat.z, 0.3826834);
        assert_eq!(sample.attitude.yaw_rad, 0.7853982);
        assert_eq!(sample.gravity_g.z, -0.99);
        assert_eq!(sample.user_accel_g.y, 0.002);
        assert_eq!(sample.rotation_rate_rads.x, 0.1);
        assert_eq!(sample.mag_field_ut.z, 44.1);
        assert_eq!(sample.heading_deg, 312.5);
        assert_eq!(sample.location, SensorLocation::Left);
        assert!(sample.is_mag_calibrated());
    }

    #[test]
    fn test_missing_quaternion_w_names_field() {
        let mut record = full_record();
        record.as_object_mut().unwrap().remove("quaternionW");

        match MotionSample::from_record(&record) {
            Err(MalformedSampleError::MissingField(name)) => {
                assert_eq!(name, "quaternionW")
            }
            other => panic!("Expected MissingField(quaternionW), got {:?}", other),
        }
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record = json!({
            "quaternionX": 0.0,
            "quaternionY": 0.0,
            "quaternionZ": 0.0,
            "quaternionW": 1.0,
            "pitch": 0.0,
            "roll": 0.0,
            "yaw": 0.0
        });

        let sample = MotionSample::from_record(&record).unwrap();

        assert_eq!(sample.gravity_g, Vec3::default());
        assert_eq!(sample.mag_accuracy, -1.0);
        assert!(!sample.is_mag_calibrated());
        assert_eq!(sample.heading_deg, 0.0);
        assert_eq!(sample.location, SensorLocation::Default);
    }

    #[test]
    fn test_unknown_sensor_location_maps_to_default() {
        let mut record = full_record();
        record["sensorLocation"] = json!(99);

        let sample = MotionSample::from_record(&record).unwrap();
        assert_eq!(sample.location, SensorLocation::Default);
    }

    #[test]
    fn test_negative_mag_accuracy_is_uncalibrated_not_error() {
        let mut record = full_record();
        record["magneticFieldAccuracy"] = json!(-1);

        let sample = MotionSample::from_record(&record).unwrap();
        assert!(!sample.is_mag_calibrated());
    }

    #[test]
    fn test_zero_quaternion_is_malformed() {
        let mut record = full_record();
        for name in &["quaternionX", "quaternionY", "quaternionZ", "quaternionW"] {
            record[*name] = json!(0.0);
        }

        assert!(matches!(
            MotionSample::from_record(&record),
            Err(MalformedSampleError::ZeroQuaternion)
        ));
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let mut record = full_record();
        record["pitch"] = json!(true);

        assert!(matches!(
            MotionSample::from_record(&record),
            Err(MalformedSampleError::NonNumericField("pitch"))
        ));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut record = full_record();
        record["pitch"] = json!("0.25");
        record["heading"] = json!("100.5");

        let sample = MotionSample::from_record(&record).unwrap();
        assert_eq!(sample.attitude.pitch_rad, 0.25);
        assert_eq!(sample.heading_deg, 100.5);
    }

    #[test]
    fn test_from_json_rejects_invalid_json() {
        assert!(matches!(
            MotionSample::from_json("not json"),
            Err(MalformedSampleError::InvalidJson(_))
        ));
    }
}
