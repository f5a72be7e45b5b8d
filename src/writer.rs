//! SDF 1.11 markup emission.
//!
//! Pure tree-to-markup projection: the root link is written first (SDF takes
//! the first link of a model as canonical), the remaining links follow in
//! creation order, then all joints. The only computation left at this stage
//! is the near-zero pose suppression performed by [`Pose::values`].

use crate::builder::SdfModel;
use crate::export_error::SdfExportError;
use crate::joint::Joint;
use crate::link::{Link, LinkElement, LinkGeometry, LinkInertial};
use crate::pose::Pose;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const SDF_VERSION: &str = "1.11";

type XmlWriter<'a> = Writer<Cursor<&'a mut Vec<u8>>>;

impl SdfModel {
    /// Renders the whole model as a pretty-printed SDF document.
    pub fn to_sdf_string(&self) -> Result<String, SdfExportError> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(Cursor::new(&mut buffer), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut sdf = BytesStart::new("sdf");
        sdf.push_attribute(("version", SDF_VERSION));
        writer.write_event(Event::Start(sdf))?;

        let mut model = BytesStart::new("model");
        model.push_attribute(("name", self.name.as_str()));
        writer.write_event(Event::Start(model))?;

        if let Some(root) = self.root_link() {
            if let Some(link) = self.link(root) {
                write_link(&mut writer, link)?;
            }
        }
        for link in self.links() {
            if Some(link.name.as_str()) == self.root_link() {
                continue; // already written as the canonical link
            }
            write_link(&mut writer, link)?;
        }
        for joint in self.joints() {
            write_joint(&mut writer, joint)?;
        }

        writer.write_event(Event::End(BytesEnd::new("model")))?;
        writer.write_event(Event::End(BytesEnd::new("sdf")))?;

        String::from_utf8(buffer).map_err(|e| SdfExportError::Markup(e.to_string()))
    }
}

fn write_link(writer: &mut XmlWriter, link: &Link) -> Result<(), SdfExportError> {
    let mut element = BytesStart::new("link");
    element.push_attribute(("name", link.name.as_str()));
    writer.write_event(Event::Start(element))?;

    if let Some(pose) = &link.pose {
        write_pose(writer, pose)?;
    }
    if let Some(inertial) = &link.inertial {
        write_inertial(writer, inertial)?;
    }
    for visual in &link.visuals {
        write_link_element(writer, visual)?;
    }
    for collision in &link.collisions {
        write_link_element(writer, collision)?;
    }

    writer.write_event(Event::End(BytesEnd::new("link")))?;
    Ok(())
}

fn write_link_element(writer: &mut XmlWriter, element: &LinkElement) -> Result<(), SdfExportError> {
    let tag = element.kind.as_str();
    let mut start = BytesStart::new(tag);
    start.push_attribute(("name", element.name.as_str()));
    writer.write_event(Event::Start(start))?;

    if let Some(pose) = &element.pose {
        write_pose(writer, pose)?;
    }
    write_geometry(writer, &element.geometry)?;

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_geometry(writer: &mut XmlWriter, geometry: &LinkGeometry) -> Result<(), SdfExportError> {
    writer.write_event(Event::Start(BytesStart::new("geometry")))?;
    match geometry {
        LinkGeometry::Mesh { uri, scale } => {
            writer.write_event(Event::Start(BytesStart::new("mesh")))?;
            write_text_element(writer, "scale", &join_floats(&[*scale, *scale, *scale]))?;
            write_text_element(writer, "uri", uri)?;
            writer.write_event(Event::End(BytesEnd::new("mesh")))?;
        }
        LinkGeometry::Box { size } => {
            writer.write_event(Event::Start(BytesStart::new("box")))?;
            write_text_element(writer, "size", &join_floats(size))?;
            writer.write_event(Event::End(BytesEnd::new("box")))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("geometry")))?;
    Ok(())
}

fn write_inertial(writer: &mut XmlWriter, inertial: &LinkInertial) -> Result<(), SdfExportError> {
    writer.write_event(Event::Start(BytesStart::new("inertial")))?;
    write_pose(writer, &inertial.pose)?;
    write_text_element(writer, "mass", &format_float(inertial.mass))?;
    writer.write_event(Event::Start(BytesStart::new("inertia")))?;
    write_text_element(writer, "ixx", &format_float(inertial.ixx))?;
    write_text_element(writer, "ixy", &format_float(inertial.ixy))?;
    write_text_element(writer, "ixz", &format_float(inertial.ixz))?;
    write_text_element(writer, "iyy", &format_float(inertial.iyy))?;
    write_text_element(writer, "iyz", &format_float(inertial.iyz))?;
    write_text_element(writer, "izz", &format_float(inertial.izz))?;
    writer.write_event(Event::End(BytesEnd::new("inertia")))?;
    writer.write_event(Event::End(BytesEnd::new("inertial")))?;
    Ok(())
}

fn write_joint(writer: &mut XmlWriter, joint: &Joint) -> Result<(), SdfExportError> {
    let mut element = BytesStart::new("joint");
    element.push_attribute(("name", joint.name.as_str()));
    element.push_attribute(("type", joint.joint_type.as_str()));
    writer.write_event(Event::Start(element))?;

    if let Some(pose) = &joint.pose {
        write_pose(writer, pose)?;
    }
    write_text_element(writer, "parent", &joint.parent)?;
    write_text_element(writer, "child", &joint.child)?;

    // The axis element is present on every joint, empty for fixed ones.
    writer.write_event(Event::Start(BytesStart::new("axis")))?;
    if let Some(axis) = &joint.axis_xyz {
        let mut xyz = BytesStart::new("xyz");
        xyz.push_attribute(("expressed_in", crate::pose::MODEL_FRAME));
        writer.write_event(Event::Start(xyz))?;
        writer.write_event(Event::Text(BytesText::new(&join_floats(axis))))?;
        writer.write_event(Event::End(BytesEnd::new("xyz")))?;
    }
    if let (Some(lower), Some(upper)) = (joint.lower_limit, joint.upper_limit) {
        writer.write_event(Event::Start(BytesStart::new("limit")))?;
        write_text_element(writer, "lower", &format_float(lower))?;
        write_text_element(writer, "upper", &format_float(upper))?;
        writer.write_event(Event::End(BytesEnd::new("limit")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("axis")))?;

    writer.write_event(Event::End(BytesEnd::new("joint")))?;
    Ok(())
}

fn write_pose(writer: &mut XmlWriter, pose: &Pose) -> Result<(), SdfExportError> {
    // Near-identity poses are suppressed entirely.
    let Some((translation, rpy)) = pose.values() else {
        return Ok(());
    };
    let mut element = BytesStart::new("pose");
    if let Some(frame) = &pose.relative_to {
        element.push_attribute(("relative_to", frame.as_str()));
    }
    writer.write_event(Event::Start(element))?;
    let values = [
        translation[0],
        translation[1],
        translation[2],
        rpy[0],
        rpy[1],
        rpy[2],
    ];
    writer.write_event(Event::Text(BytesText::new(&join_floats(&values))))?;
    writer.write_event(Event::End(BytesEnd::new("pose")))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), SdfExportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn format_float(value: f64) -> String {
    if value == 0.0 {
        // keeps a negative zero (common after RPY extraction) out of the output
        return "0".to_string();
    }
    format!("{}", value)
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_keeps_shortest_repr() {
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(-1.0), "-1");
        assert_eq!(format_float(1e-9), "0.000000001");
    }

    #[test]
    fn test_join_floats() {
        assert_eq!(join_floats(&[0.01, 0.01, 0.01]), "0.01 0.01 0.01");
    }
}
