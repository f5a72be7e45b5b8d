//! Converts a hierarchical CAD assembly snapshot into an SDF
//! (Simulation Description Format, version 1.11) robot model.
//!
//! A CAD assembly is a nested graph of occurrences: components placed with a
//! local transform, carrying geometric bodies, mechanical joints and "rigid
//! group" declarations that glue several occurrences into one rigid body.
//! Simulators want something much flatter: a single-root tree of named links
//! connected by joints, with poses and mass distribution re-expressed in the
//! conventions the format mandates. This crate performs that flattening.
//!
//! # Features
//!
//! - Homogeneous transform algebra with a deterministic roll-pitch-yaw
//!   representation, including the gimbal-lock case, so poses survive the
//!   compose/invert round trips of the flattening with 1e-6 accuracy.
//! - Prefix-qualified flat namespace: nested occurrences become links named
//!   `outer__inner__part`, with name normalization to `[a-z0-9_]+`.
//! - Rigid groups merge into a single link; joints referencing any member are
//!   retargeted onto the merged link.
//! - Inertia tensors given about the model origin are shifted to each link's
//!   center of mass (parallel axis theorem) and re-expressed in the link
//!   frame.
//! - Two-phase build: links first, then joint resolution, so joints may
//!   reference links in any traversal order.
//! - Deterministic root selection plus a synthetic `base_link` anchor so the
//!   top-level link always has a parent joint to carry its placement.
//! - Structural oddities (duplicate names, unsupported joint types, multiple
//!   roots, missing mass data) are logged and worked around, never fatal.
//!
//! The conversion is a single-threaded, synchronous batch run: one writer,
//! no shared state, abort-on-I/O-error only.
//!
//! # Example
//!
//! ```
//! use rs_sdf_export::assembly::{Assembly, Body, ExportOverrides, Occurrence};
//! use rs_sdf_export::builder::SdfModel;
//!
//! let assembly = Assembly {
//!     name: "Cart v7".to_string(),
//!     occurrences: vec![Occurrence {
//!         name: "Chassis:1".to_string(),
//!         bodies: vec![Body { name: "Plate".to_string(), ..Body::default() }],
//!         ..Occurrence::default()
//!     }],
//!     ..Assembly::default()
//! };
//! let model = SdfModel::build(&assembly, &ExportOverrides::default());
//! assert_eq!(model.root_link(), Some("base_link"));
//! println!("{}", model.to_sdf_string().unwrap());
//! ```

pub mod transform;
pub mod pose;

pub mod link;
pub mod joint;

pub mod assembly;
pub mod builder;
pub mod writer;

pub mod utils;
pub mod export_error;

#[cfg(feature = "allow_filesystem")]
pub mod export;

#[cfg(test)]
mod tests;
