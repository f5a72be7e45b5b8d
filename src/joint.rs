//! Joint records of the output tree.

use crate::pose::Pose;

/// SDF joint types this exporter can produce. Unsupported CAD joint types
/// degrade to `Fixed`; a revolute joint without enabled limits becomes
/// `Continuous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointType {
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
}

impl JointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JointType::Fixed => "fixed",
            JointType::Revolute => "revolute",
            JointType::Continuous => "continuous",
            JointType::Prismatic => "prismatic",
        }
    }
}

/// A directed edge of the kinematic tree. `parent` and `child` name links of
/// the same model; the axis, when present, is expressed in the model frame.
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub joint_type: JointType,
    pub pose: Option<Pose>,
    pub parent: String,
    pub child: String,
    pub axis_xyz: Option<[f64; 3]>,
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
}

impl Joint {
    pub fn fixed(name: impl Into<String>, parent: impl Into<String>, child: impl Into<String>) -> Self {
        Joint {
            name: name.into(),
            joint_type: JointType::Fixed,
            pose: None,
            parent: parent.into(),
            child: child.into(),
            axis_xyz: None,
            lower_limit: None,
            upper_limit: None,
        }
    }
}
