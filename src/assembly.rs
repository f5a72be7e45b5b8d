//! Snapshot of a CAD assembly as consumed by the exporter.
//!
//! The exporter does not talk to a live CAD session. It reads an assembly
//! snapshot: the occurrence hierarchy with local transforms, body geometry
//! references with oriented bounding boxes, rigid group declarations, joints
//! and precomputed mass properties. Lengths are in centimeters, masses in
//! kilograms and moments of inertia in kg·cm² about the model origin, which
//! is what CAD kernels typically report; all unit conversion happens during
//! tree building.

use crate::pose::Pose;
use crate::transform::Transform;
use crate::utils::{cm3_to_m, cm_to_m};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Local placement of an occurrence: translation in centimeters plus
/// roll-pitch-yaw in radians.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CadTransform {
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
}

impl CadTransform {
    /// Converts to a model-frame pose in meters.
    pub fn to_pose(&self) -> Pose {
        Pose::new(Vector3::from(cm3_to_m(self.translation)), self.rotation)
    }
}

/// Oriented minimum bounding box of a body, used as the default collision
/// approximation. The three direction vectors are the box axes in the model
/// frame, ordered the way the CAD kernel reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientedBox {
    pub center: [f64; 3],
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub height_direction: [f64; 3],
    pub width_direction: [f64; 3],
    pub length_direction: [f64; 3],
}

impl Default for OrientedBox {
    fn default() -> Self {
        OrientedBox {
            center: [0.0; 3],
            height: 1.0,
            width: 1.0,
            length: 1.0,
            height_direction: [1.0, 0.0, 0.0],
            width_direction: [0.0, 1.0, 0.0],
            length_direction: [0.0, 0.0, 1.0],
        }
    }
}

impl OrientedBox {
    /// Pose of the box center, with the box axes as the rotation columns.
    pub fn pose(&self) -> Pose {
        let rotation = Matrix3::from_columns(&[
            Vector3::from(self.height_direction),
            Vector3::from(self.width_direction),
            Vector3::from(self.length_direction),
        ]);
        Pose::from_transform(Transform::from_parts(
            Vector3::from(cm3_to_m(self.center)),
            rotation,
        ))
    }

    /// Box extents in meters, ordered to match the rotation columns.
    pub fn size_m(&self) -> [f64; 3] {
        [cm_to_m(self.height), cm_to_m(self.width), cm_to_m(self.length)]
    }
}

/// A geometric body of an occurrence. `mesh_source` points at the
/// pre-exported mesh file the mesh collaborator copies into the output tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub name: String,
    pub mesh_source: Option<PathBuf>,
    pub obb: OrientedBox,
}

/// Mass, center of mass (centimeters) and moments of inertia
/// `(xx, yy, zz, xy, yz, xz)` in kg·cm² about the model origin.
/// `moments = None` marks mass data the CAD kernel failed to compute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MassProperties {
    pub mass: f64,
    pub center_of_mass: [f64; 3],
    pub moments: Option<[f64; 6]>,
}

/// Several occurrences declared to move as one rigid body. Members name
/// sibling occurrences of the component the group is defined on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidGroup {
    pub name: String,
    pub members: Vec<String>,
}

/// Native CAD joint types. Only rigid, revolute and slider map onto SDF;
/// everything else degrades to a fixed joint with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadJointType {
    Rigid,
    Revolute,
    Slider,
    Ball,
    Planar,
    Cylindrical,
    PinSlot,
}

/// Motion limits as flag/value pairs, the way CAD kernels expose them.
/// Angular values are radians, linear values centimeters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CadJointLimits {
    pub minimum_enabled: bool,
    pub maximum_enabled: bool,
    pub minimum: f64,
    pub maximum: f64,
}

/// A mechanical joint between two occurrences. `occurrence_one` is the moving
/// (child) side, `occurrence_two` the parent side; the origin, when present,
/// is the joint anchor point in centimeters in the model frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyJoint {
    pub name: String,
    pub joint_type: CadJointType,
    #[serde(default)]
    pub axis: Option<[f64; 3]>,
    #[serde(default)]
    pub limits: Option<CadJointLimits>,
    #[serde(default)]
    pub origin: Option<[f64; 3]>,
    pub occurrence_one: String,
    pub occurrence_two: String,
}

/// One occurrence of the hierarchy. `rigid_groups` and `joints` are the ones
/// defined on this occurrence's component; `name` is the unique instance name
/// the side tables key on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Occurrence {
    pub name: String,
    pub transform: CadTransform,
    pub bodies: Vec<Body>,
    pub children: Vec<Occurrence>,
    pub rigid_groups: Vec<RigidGroup>,
    pub joints: Vec<AssemblyJoint>,
    pub mass_properties: Option<MassProperties>,
}

/// The root component: top-level occurrences plus the rigid groups and joints
/// declared directly on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Assembly {
    pub name: String,
    pub occurrences: Vec<Occurrence>,
    pub rigid_groups: Vec<RigidGroup>,
    pub joints: Vec<AssemblyJoint>,
}

/// Per-entity overrides, looked up by the deterministic names of the entities
/// they apply to: collision element names for `use_collision_mesh`, joint
/// names for `swap_parent_child`. These replace the `<name>_USE_MESH` and
/// `<name>_SWAP_PARENT_CHILD` user parameters of the CAD-side workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOverrides {
    pub use_collision_mesh: BTreeSet<String>,
    pub swap_parent_child: BTreeSet<String>,
}

/// An assembly snapshot file: the assembly itself plus the caller-supplied
/// overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub assembly: Assembly,
    pub overrides: ExportOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cad_transform_to_pose_converts_units() {
        let transform = CadTransform {
            translation: [100.0, 0.0, -50.0],
            rotation: [0.0, 0.0, 0.0],
        };
        let (translation, rpy) = transform.to_pose().values().unwrap();
        assert_eq!(translation, [1.0, 0.0, -0.5]);
        assert_eq!(rpy, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_obb_pose_uses_axes_as_rotation_columns() {
        // Box axes rotated 90° about z: height along +y, width along -x.
        let obb = OrientedBox {
            center: [10.0, 0.0, 0.0],
            height: 2.0,
            width: 4.0,
            length: 6.0,
            height_direction: [0.0, 1.0, 0.0],
            width_direction: [-1.0, 0.0, 0.0],
            length_direction: [0.0, 0.0, 1.0],
        };
        let (translation, rpy) = obb.pose().values().unwrap();
        assert_eq!(translation, [0.1, 0.0, 0.0]);
        assert!((rpy[2] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(obb.size_m(), [0.02, 0.04, 0.06]);
    }
}
