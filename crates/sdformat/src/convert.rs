//! Conversions from SDF text fields to geometric and boolean values
//!
//! Two pose converters exist on purpose. [`pose_from_str`] follows the SDF
//! convention of radian angles and backs the public standalone conversion
//! entry point. [`pose_from_degrees_str`] interprets the angles as degrees
//! and is used only by the element-tree `pose` accessor, whose historical
//! callers rely on degree input. Do not unify them: either change would
//! silently re-scale rotations for one set of callers.

use glam::{DQuat, DVec3};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("malformed numeric field in {kind} string {input:?}: {reason}")]
    MalformedNumericField {
        kind: &'static str,
        input: String,
        reason: String,
    },
    #[error("cannot convert {0:?} to a boolean")]
    MalformedBoolean(String),
}

/// A rigid transform: translation plus orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Convert an SDF pose string "x y z roll pitch yaw" to a transform.
///
/// Angles are radians. A `None` input yields the identity transform.
/// See the module docs for the degree-unit sibling used by the element
/// `pose` accessor.
pub fn pose_from_str(pose: Option<&str>) -> Result<Pose, ConversionError> {
    let Some(pose) = pose else {
        return Ok(Pose::IDENTITY);
    };
    let values = parse_floats(pose, 6, "pose")?;
    Ok(build_pose(&values))
}

/// Convert an element pose string whose angles are degrees.
///
/// Identical layout to [`pose_from_str`], but the three rotation tokens are
/// scaled by pi/180 before composing the quaternion. Only the element-tree
/// `pose` accessor uses this variant.
pub fn pose_from_degrees_str(pose: Option<&str>) -> Result<Pose, ConversionError> {
    let Some(pose) = pose else {
        return Ok(Pose::IDENTITY);
    };
    let mut values = parse_floats(pose, 6, "pose")?;
    for v in &mut values[3..] {
        *v *= std::f64::consts::PI / 180.0;
    }
    Ok(build_pose(&values))
}

/// Convert an SDF vector string "x y z" to a vector. `None` yields zero.
pub fn vector3_from_str(vector3: Option<&str>) -> Result<DVec3, ConversionError> {
    let Some(vector3) = vector3 else {
        return Ok(DVec3::ZERO);
    };
    let values = parse_floats(vector3, 3, "vector3")?;
    Ok(DVec3::new(values[0], values[1], values[2]))
}

/// Convert an SDF boolean string ("true"/"false"/"1"/"0") to a bool.
pub fn to_boolean(text: &str) -> Result<bool, ConversionError> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConversionError::MalformedBoolean(other.to_string())),
    }
}

fn parse_floats(
    input: &str,
    expected: usize,
    kind: &'static str,
) -> Result<Vec<f64>, ConversionError> {
    let values = input
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                ConversionError::MalformedNumericField {
                    kind,
                    input: input.to_string(),
                    reason: format!("token {token:?} is not a number"),
                }
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() != expected {
        return Err(ConversionError::MalformedNumericField {
            kind,
            input: input.to_string(),
            reason: format!("expected {expected} fields, got {}", values.len()),
        });
    }
    Ok(values)
}

fn build_pose(values: &[f64]) -> Pose {
    let translation = DVec3::new(values[0], values[1], values[2]);
    // Yaw about Z, then pitch about Y, then roll about X (rightmost applied
    // first), matching the SDF roll-pitch-yaw convention.
    let rotation = DQuat::from_rotation_z(values[5])
        * DQuat::from_rotation_y(values[4])
        * DQuat::from_rotation_x(values[3]);
    Pose {
        translation,
        rotation,
    }
}
