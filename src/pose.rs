//! A rigid transform tagged with the name of the frame it is expressed in.
//!
//! SDF poses are written as six numbers (translation plus roll-pitch-yaw)
//! with an optional `relative_to` frame attribute. Poses that are identity
//! to within tolerance are suppressed at serialization time, so a link or
//! element without meaningful placement produces no `<pose>` at all.

use crate::transform::{Transform, TOLERANCE};
use nalgebra::Vector3;
use std::ops::Mul;

/// The implicit frame of the enclosing `<model>` element.
pub const MODEL_FRAME: &str = "__model__";

#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub transform: Transform,
    /// `None` is meaningful: the SDF inertial pose forbids a frame reference,
    /// and such poses are written without the `relative_to` attribute.
    pub relative_to: Option<String>,
}

impl Pose {
    /// Pose from a translation in meters and roll-pitch-yaw angles,
    /// expressed in the model frame.
    pub fn new(translation: Vector3<f64>, rpy: [f64; 3]) -> Self {
        Self::from_transform(Transform::from_translation_rpy(translation, rpy))
    }

    pub fn identity() -> Self {
        Self::from_transform(Transform::identity())
    }

    pub fn from_transform(transform: Transform) -> Self {
        Pose {
            transform,
            relative_to: Some(MODEL_FRAME.to_string()),
        }
    }

    /// Drops the frame tag. Used for inertial poses, where the target format
    /// forbids the `relative_to` attribute.
    pub fn without_frame(mut self) -> Self {
        self.relative_to = None;
        self
    }

    /// Inverts the underlying transform; the frame tag is kept as is.
    pub fn inverse(&self) -> Self {
        Pose {
            transform: self.transform.inverse(),
            relative_to: self.relative_to.clone(),
        }
    }

    /// Returns the six pose values `(translation, rpy)`, or `None` when every
    /// component is below tolerance and the pose would serialize as a
    /// redundant identity.
    pub fn values(&self) -> Option<([f64; 3], [f64; 3])> {
        let t = self.transform.translation();
        let translation = [t.x, t.y, t.z];
        let rpy = self.transform.rotation_rpy();
        if translation
            .iter()
            .chain(rpy.iter())
            .all(|v| v.abs() < TOLERANCE)
        {
            None
        } else {
            Some((translation, rpy))
        }
    }
}

impl Mul for &Pose {
    type Output = Pose;

    /// Composes the transforms; the left operand's frame tag wins.
    fn mul(self, rhs: &Pose) -> Pose {
        Pose {
            transform: self.transform * rhs.transform,
            relative_to: self.relative_to.clone(),
        }
    }
}
