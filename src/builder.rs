//! Flattens the occurrence hierarchy of an assembly snapshot into a single
//! rooted tree of links and joints.
//!
//! The build is a strict two-phase pass. The first phase walks the hierarchy
//! depth first, creating links under a prefix-qualified flat namespace and
//! recording an explicit occurrence → link-name side table; rigid groups at a
//! level merge before any sibling is visited so group members are claimed
//! first. Joints accumulate unresolved during the walk and only resolve in the
//! second phase, when every link a joint could reference already has its name
//! binding. A synthetic `base_link` anchor is appended last so the selected
//! root link gets a parent joint to carry its placement.

use crate::assembly::{
    Assembly, AssemblyJoint, Body, CadJointType, CadTransform, ExportOverrides, MassProperties,
    Occurrence, RigidGroup,
};
use crate::joint::{Joint, JointType};
use crate::link::{Link, LinkElement, LinkElementKind, LinkGeometry, LinkInertial, MESH_SCALE_CM_TO_M};
use crate::pose::Pose;
use crate::utils::{cm3_to_m, cm_to_m, kg_cm2_to_kg_m2, normalize_name, name_to_path, origin_inertia_to_com_inertia};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::mem;
use tracing::{debug, warn};

/// Name of the synthetic anchor link injected at the end of every build.
pub const BASE_LINK: &str = "base_link";

/// One mesh file the persisted model references: the URI recorded in the
/// markup and the body whose geometry backs it.
#[derive(Debug, Clone)]
pub struct MeshJob {
    pub uri: String,
    pub body: Body,
}

/// The flattened model: links and joints in creation order plus the mesh
/// files the markup references.
#[derive(Debug, Default)]
pub struct SdfModel {
    pub name: String,
    links: Vec<Link>,
    link_index: HashMap<String, usize>,
    joints: Vec<Joint>,
    joint_index: HashMap<String, usize>,
    root_link: Option<String>,
    /// occurrence name → link name. Replaces the attribute annotations the
    /// CAD-side workflow writes onto occurrences.
    bindings: HashMap<String, String>,
    /// occurrence name → merged link name for rigid group members.
    grouped: HashMap<String, String>,
    mesh_jobs: Vec<MeshJob>,
}

impl SdfModel {
    /// Runs the full conversion over a snapshot.
    pub fn build(assembly: &Assembly, overrides: &ExportOverrides) -> SdfModel {
        let mut model = SdfModel {
            name: normalize_name(&assembly.name),
            ..SdfModel::default()
        };
        let mut deferred: Vec<(AssemblyJoint, String)> = Vec::new();

        for group in &assembly.rigid_groups {
            model.add_rigid_group(
                &assembly.occurrences,
                &CadTransform::default(),
                group,
                "",
                overrides,
            );
        }
        for occurrence in &assembly.occurrences {
            model.visit_occurrence(occurrence, "", overrides, &mut deferred);
        }

        // Root-level joints resolve first, then the ones accumulated during
        // the walk; on a duplicate name the earlier joint wins.
        for joint in &assembly.joints {
            model.add_joint(joint, "", overrides);
        }
        for (joint, prefix) in &deferred {
            model.add_joint(joint, prefix, overrides);
        }

        model.select_root();
        model.inject_anchor();
        model
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_index.get(name).map(|&i| &self.links[i])
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index.get(name).map(|&i| &self.joints[i])
    }

    pub fn root_link(&self) -> Option<&str> {
        self.root_link.as_deref()
    }

    pub fn mesh_jobs(&self) -> &[MeshJob] {
        &self.mesh_jobs
    }

    /// Link name an occurrence resolved to, if any. Rigid group members
    /// resolve to their merged link.
    pub fn binding(&self, occurrence_name: &str) -> Option<&str> {
        self.grouped
            .get(occurrence_name)
            .or_else(|| self.bindings.get(occurrence_name))
            .map(String::as_str)
    }

    fn visit_occurrence(
        &mut self,
        occurrence: &Occurrence,
        prefix: &str,
        overrides: &ExportOverrides,
        deferred: &mut Vec<(AssemblyJoint, String)>,
    ) {
        debug!("visit occurrence \"{}\" prefix \"{}\"", occurrence.name, prefix);
        self.add_link(occurrence, prefix, None, overrides);

        let children_prefix = format!("{prefix}{}__", normalize_name(&occurrence.name));

        // Rigid groups on this component merge before any child or sibling is
        // visited, so the member side table is populated first.
        let mut group_link = None;
        for group in &occurrence.rigid_groups {
            group_link = self.add_rigid_group(
                &occurrence.children,
                &occurrence.transform,
                group,
                &children_prefix,
                overrides,
            );
        }
        if let Some(link_name) = group_link {
            // Joints attached to this occurrence target the merged link.
            self.bindings.insert(occurrence.name.clone(), link_name);
        }

        for child in &occurrence.children {
            self.visit_occurrence(child, &children_prefix, overrides, deferred);
        }

        // Joints resolve only after the whole hierarchy is walked; any link
        // they reference must already have a name binding by then.
        for joint in &occurrence.joints {
            deferred.push((joint.clone(), children_prefix.clone()));
        }
    }

    /// Creates one link for an occurrence, or records why none is created:
    /// already merged into a rigid group, duplicate name, or no bodies
    /// (an organizational node that only contributes its name prefix).
    fn add_link(
        &mut self,
        occurrence: &Occurrence,
        prefix: &str,
        rigid_group_pose: Option<&Pose>,
        overrides: &ExportOverrides,
    ) -> Option<String> {
        let link_name = format!("{prefix}{}", normalize_name(&occurrence.name));
        debug!("add link \"{}\" -> \"{}\"", occurrence.name, link_name);

        if self.link_index.contains_key(&link_name) {
            warn!("link \"{}\" already exists, skipping", link_name);
            return None;
        }
        if let Some(group_link) = self.grouped.get(&occurrence.name) {
            debug!(
                "occurrence \"{}\" belongs to rigid group link \"{}\", skipping",
                occurrence.name, group_link
            );
            let group_link = group_link.clone();
            self.bindings.insert(occurrence.name.clone(), group_link);
            return None;
        }
        self.bindings
            .insert(occurrence.name.clone(), link_name.clone());

        if occurrence.bodies.is_empty() {
            debug!("link \"{}\" has no bodies, skipping", link_name);
            return None;
        }

        let mut link = Link::new(link_name.clone());
        link.pose = Some(match rigid_group_pose {
            Some(pose) => pose.clone(),
            None => occurrence.transform.to_pose(),
        });

        for body in &occurrence.bodies {
            let body_name = normalize_name(&body.name);

            let visual_name = format!("{}__{}_visual", link.name, body_name);
            let uri = format!("meshes/{}.obj", name_to_path(&visual_name));
            let visual = LinkElement {
                kind: LinkElementKind::Visual,
                name: visual_name,
                pose: rigid_group_pose.cloned(),
                geometry: LinkGeometry::Mesh {
                    uri: uri.clone(),
                    scale: MESH_SCALE_CM_TO_M,
                },
            };
            self.mesh_jobs.push(MeshJob {
                uri,
                body: body.clone(),
            });

            let collision_name = format!("{}__{}_collision", link.name, body_name);
            let collision = if overrides.use_collision_mesh.contains(&collision_name) {
                debug!("using mesh for \"{}\"", collision_name);
                LinkElement {
                    kind: LinkElementKind::Collision,
                    name: collision_name,
                    pose: visual.pose.clone(),
                    geometry: visual.geometry.clone(),
                }
            } else {
                debug!("using oriented minimum bounding box for \"{}\"", collision_name);
                let mut pose = body.obb.pose();
                if let Some(group_pose) = rigid_group_pose {
                    pose = group_pose * &pose;
                }
                LinkElement {
                    kind: LinkElementKind::Collision,
                    name: collision_name,
                    pose: Some(pose),
                    geometry: LinkGeometry::Box {
                        size: body.obb.size_m(),
                    },
                }
            };

            link.visuals.push(visual);
            link.collisions.push(collision);
        }

        link.inertial = Some(Self::link_inertial(
            &link.name,
            occurrence.mass_properties.as_ref(),
            link.pose.as_ref().expect("set above"),
            rigid_group_pose,
        ));

        self.push_link(link);
        Some(link_name)
    }

    /// Converts the occurrence's origin-referenced mass data into the
    /// COM-frame inertial record of the link: unit conversion, parallel-axis
    /// shift to the center of mass, then re-expression of the inertial pose
    /// through the link frame (and the rigid-group frame when merging).
    fn link_inertial(
        link_name: &str,
        mass_properties: Option<&MassProperties>,
        link_pose: &Pose,
        rigid_group_pose: Option<&Pose>,
    ) -> LinkInertial {
        let placeholder = MassProperties {
            mass: 1.0,
            center_of_mass: [0.0; 3],
            moments: None,
        };
        let properties = match mass_properties {
            Some(properties) if properties.mass > 0.0 => properties,
            _ => {
                warn!(
                    "no usable mass properties for \"{}\", using placeholder",
                    link_name
                );
                &placeholder
            }
        };
        // Moments arrive in kg·cm²; the unit-inertia fallback is already in
        // the output unit.
        let moments = match properties.moments {
            Some(moments) => moments.map(kg_cm2_to_kg_m2),
            None => {
                warn!(
                    "failed to get moments of inertia for \"{}\", using unit inertia",
                    link_name
                );
                [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]
            }
        };

        let center_of_mass = cm3_to_m(properties.center_of_mass);
        let [ixx, iyy, izz, ixy, iyz, ixz] =
            origin_inertia_to_com_inertia(moments, center_of_mass, properties.mass);

        let inertial_pose_model = Pose::new(Vector3::from(center_of_mass), [0.0; 3]);
        let link_inverse = link_pose.inverse();
        let pose = match rigid_group_pose {
            Some(group_pose) => &(&link_inverse * group_pose) * &inertial_pose_model,
            None => &link_inverse * &inertial_pose_model,
        };
        LinkInertial {
            // SDF forbids a frame reference on the inertial pose
            pose: pose.without_frame(),
            mass: properties.mass,
            ixx,
            ixy,
            ixz,
            iyy,
            iyz,
            izz,
        }
    }

    /// Merges all bodies of the group members into one synthetic occurrence
    /// and builds a single link from it, with the parent pose as an explicit
    /// override. Every member is recorded in the `grouped` side table so
    /// later visits skip it and joints retarget onto the merged link.
    fn add_rigid_group(
        &mut self,
        siblings: &[Occurrence],
        parent_transform: &CadTransform,
        group: &RigidGroup,
        prefix: &str,
        overrides: &ExportOverrides,
    ) -> Option<String> {
        let link_name = format!("{prefix}{}", normalize_name(&group.name));
        debug!("add rigid group \"{}\" -> \"{}\"", group.name, link_name);

        let mut bodies = Vec::new();
        for member in &group.members {
            match siblings.iter().find(|occurrence| &occurrence.name == member) {
                Some(occurrence) => bodies.extend(occurrence.bodies.iter().cloned()),
                None => warn!(
                    "rigid group \"{}\" member \"{}\" not found among sibling occurrences",
                    group.name, member
                ),
            }
        }

        let merged = Occurrence {
            name: link_name.clone(),
            bodies,
            mass_properties: Self::merged_mass_properties(siblings, group),
            ..Occurrence::default()
        };
        let created = self.add_link(&merged, "", Some(&parent_transform.to_pose()), overrides);

        for member in &group.members {
            self.grouped.insert(member.clone(), link_name.clone());
        }
        created
    }

    /// Mass properties of a rigid group: masses add, the center of mass is
    /// the mass-weighted mean, and origin-referenced inertia tensors are
    /// additive because every member tensor is taken about the same origin.
    fn merged_mass_properties(siblings: &[Occurrence], group: &RigidGroup) -> Option<MassProperties> {
        let mut mass = 0.0;
        let mut weighted_com = [0.0; 3];
        let mut moments = [0.0; 6];
        let mut moments_valid = true;

        for member in &group.members {
            let Some(properties) = siblings
                .iter()
                .find(|occurrence| &occurrence.name == member)
                .and_then(|occurrence| occurrence.mass_properties.as_ref())
            else {
                continue;
            };
            mass += properties.mass;
            for i in 0..3 {
                weighted_com[i] += properties.mass * properties.center_of_mass[i];
            }
            match properties.moments {
                Some(member_moments) => {
                    for i in 0..6 {
                        moments[i] += member_moments[i];
                    }
                }
                None => moments_valid = false,
            }
        }

        if mass <= 0.0 {
            return None;
        }
        Some(MassProperties {
            mass,
            center_of_mass: weighted_com.map(|v| v / mass),
            moments: moments_valid.then_some(moments),
        })
    }

    /// Resolves one CAD joint into a tree joint: type mapping, limit and unit
    /// handling, parent/child lookup through the side tables, and the
    /// optional parent/child swap override.
    fn add_joint(&mut self, cad: &AssemblyJoint, prefix: &str, overrides: &ExportOverrides) {
        let joint_name = format!("{prefix}{}", normalize_name(&cad.name));
        debug!("add joint \"{}\" -> \"{}\"", cad.name, joint_name);

        if self.joint_index.contains_key(&joint_name) {
            warn!("joint \"{}\" already exists, skipping", joint_name);
            return;
        }

        let mut joint_type = match cad.joint_type {
            CadJointType::Rigid => JointType::Fixed,
            CadJointType::Revolute => JointType::Revolute,
            CadJointType::Slider => JointType::Prismatic,
            unsupported => {
                warn!(
                    "unsupported joint type {:?} for \"{}\", using fixed",
                    unsupported, joint_name
                );
                JointType::Fixed
            }
        };

        let mut axis = None;
        let mut lower_limit = None;
        let mut upper_limit = None;
        match joint_type {
            JointType::Revolute => {
                axis = cad.axis;
                match &cad.limits {
                    Some(limits) if limits.minimum_enabled || limits.maximum_enabled => {
                        lower_limit = Some(limits.minimum);
                        upper_limit = Some(limits.maximum);
                    }
                    // An unlimited revolute joint is a continuous joint.
                    _ => joint_type = JointType::Continuous,
                }
            }
            JointType::Prismatic => {
                axis = cad.axis;
                if let Some(limits) = &cad.limits {
                    lower_limit = Some(cm_to_m(limits.minimum));
                    upper_limit = Some(cm_to_m(limits.maximum));
                }
            }
            _ => {}
        }

        let parent = self.binding(&cad.occurrence_two).map(str::to_string);
        let child = self.binding(&cad.occurrence_one).map(str::to_string);
        let (Some(mut parent), Some(mut child)) = (parent, child) else {
            warn!(
                "joint \"{}\" references unknown occurrence \"{}\" or \"{}\", skipping",
                joint_name, cad.occurrence_two, cad.occurrence_one
            );
            return;
        };

        if overrides.swap_parent_child.contains(&joint_name) {
            mem::swap(&mut parent, &mut child);
            if let Some(axis) = axis.as_mut() {
                for value in axis.iter_mut() {
                    *value = -*value;
                }
            }
        }

        if parent == child {
            warn!(
                "joint \"{}\" connects link \"{}\" to itself, skipping",
                joint_name, parent
            );
            return;
        }
        // A binding may point at an organizational occurrence that produced
        // no link; such a joint cannot be represented.
        for end in [&parent, &child] {
            if !self.link_index.contains_key(end) {
                warn!(
                    "joint \"{}\" references \"{}\" which has no link, skipping",
                    joint_name, end
                );
                return;
            }
        }

        // Position only; the joint frame carries no rotation.
        let pose = cad
            .origin
            .map(|origin| Pose::new(Vector3::from(cm3_to_m(origin)), [0.0; 3]));

        self.push_joint(Joint {
            name: joint_name,
            joint_type,
            pose,
            parent,
            child,
            axis_xyz: axis,
            lower_limit,
            upper_limit,
        });
    }

    /// A root candidate is a link that is no joint's child. Candidates are
    /// considered in link creation order and the first one wins, which makes
    /// the fallback pick deterministic when the assembly is disconnected.
    fn select_root(&mut self) {
        let children: std::collections::HashSet<&str> =
            self.joints.iter().map(|joint| joint.child.as_str()).collect();
        let candidates: Vec<&str> = self
            .links
            .iter()
            .map(|link| link.name.as_str())
            .filter(|name| !children.contains(name))
            .collect();
        match candidates.as_slice() {
            [] => warn!("no root link found"),
            [single] => self.root_link = Some(single.to_string()),
            [first, ..] => {
                warn!(
                    "multiple root links found: {:?}, using \"{}\"",
                    candidates, first
                );
                self.root_link = Some(first.to_string());
            }
        }
    }

    /// Appends the `base_link` anchor and a fixed joint down to the selected
    /// root. SDF expresses a link's placement on its parent joint; without
    /// the anchor the true top-level link would have nowhere to carry its
    /// pose. The placeholder inertia is tiny but non-zero to keep the model
    /// valid for downstream consumers.
    fn inject_anchor(&mut self) {
        let mut anchor = Link::new(BASE_LINK);
        anchor.inertial = Some(LinkInertial {
            pose: Pose::identity().without_frame(),
            mass: 1e-4,
            ixx: 1e-9,
            ixy: 0.0,
            ixz: 0.0,
            iyy: 1e-9,
            iyz: 0.0,
            izz: 1e-9,
        });
        match self.root_link.take() {
            Some(root) if root != BASE_LINK => {
                self.push_joint(Joint::fixed("base_link_joint", BASE_LINK, root));
            }
            Some(_) => warn!(
                "root link is already named \"{}\", anchor joint omitted",
                BASE_LINK
            ),
            None => warn!("no root link to anchor, \"base_link_joint\" omitted"),
        }
        self.push_link(anchor);
        self.root_link = Some(BASE_LINK.to_string());
    }

    fn push_link(&mut self, link: Link) {
        match self.link_index.get(&link.name) {
            Some(&index) => {
                // Only reachable when an assembly part is itself named
                // "base_link"; the anchor takes precedence.
                warn!("replacing existing link \"{}\"", link.name);
                self.links[index] = link;
            }
            None => {
                self.link_index.insert(link.name.clone(), self.links.len());
                self.links.push(link);
            }
        }
    }

    fn push_joint(&mut self, joint: Joint) {
        self.joint_index
            .insert(joint.name.clone(), self.joints.len());
        self.joints.push(joint);
    }
}
