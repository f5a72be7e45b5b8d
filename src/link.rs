//! Link records of the output tree: visual/collision elements, geometry and
//! mass distribution. Pure data; markup emission lives in the writer.

use crate::pose::Pose;

/// Mesh scale factor written into every mesh geometry. The meshes are exported
/// in centimeters while SDF expects meters.
pub const MESH_SCALE_CM_TO_M: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkGeometry {
    Box { size: [f64; 3] },
    Mesh { uri: String, scale: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkElementKind {
    Visual,
    Collision,
}

impl LinkElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkElementKind::Visual => "visual",
            LinkElementKind::Collision => "collision",
        }
    }
}

/// One `<visual>` or `<collision>` child of a link.
#[derive(Debug, Clone)]
pub struct LinkElement {
    pub kind: LinkElementKind,
    pub name: String,
    pub pose: Option<Pose>,
    pub geometry: LinkGeometry,
}

/// Mass distribution of a link, expressed about the center of mass in the
/// link's local frame. The pose carries no frame reference because the SDF
/// inertial element forbids the `relative_to` attribute.
#[derive(Debug, Clone)]
pub struct LinkInertial {
    pub pose: Pose,
    pub mass: f64,
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

/// A rigid body of the output tree. Elements keep insertion order; that order
/// is also the emission order.
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    pub pose: Option<Pose>,
    pub visuals: Vec<LinkElement>,
    pub collisions: Vec<LinkElement>,
    pub inertial: Option<LinkInertial>,
}

impl Link {
    pub fn new(name: impl Into<String>) -> Self {
        Link {
            name: name.into(),
            pose: None,
            visuals: Vec::new(),
            collisions: Vec::new(),
            inertial: None,
        }
    }
}
