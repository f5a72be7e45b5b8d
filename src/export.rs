//! Persisted output layout and the mesh collaborator interface.
//!
//! A saved model is a directory holding `model.sdf` plus a `meshes/`
//! subdirectory with one mesh file per visual, laid out along the flattened
//! link names (`__` becomes a directory separator). Mesh files themselves are
//! produced by a [`MeshExporter`]; the exporter shipped here copies meshes
//! that were already exported on the CAD side, optionally reusing a cache
//! directory from a previous run.

use crate::assembly::Body;
use crate::builder::SdfModel;
use crate::export_error::SdfExportError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Produces a mesh file for a body. `uri` is the path the markup references,
/// relative to the output directory; `destination` is the resolved absolute
/// target path. The exporter may be slow; it is called synchronously once per
/// visual.
pub trait MeshExporter {
    fn export(&mut self, body: &Body, uri: &str, destination: &Path) -> Result<(), SdfExportError>;
}

/// Copies pre-exported mesh files referenced by `Body::mesh_source`. When a
/// cache directory is configured and already holds the mesh (keyed by the URI
/// relative to `meshes/`), the cached file wins and a sibling `.mtl` material
/// file is carried along with it.
pub struct FileMeshExporter {
    pub cache_dir: Option<PathBuf>,
}

impl MeshExporter for FileMeshExporter {
    fn export(&mut self, body: &Body, uri: &str, destination: &Path) -> Result<(), SdfExportError> {
        if let Some(cache_dir) = &self.cache_dir {
            let cached = cache_dir.join(uri.strip_prefix("meshes/").unwrap_or(uri));
            if cached.exists() {
                debug!("using cached mesh \"{}\"", cached.display());
                fs::copy(&cached, destination)?;
                let material = cached.with_extension("mtl");
                if material.exists() {
                    fs::copy(&material, destination.with_extension("mtl"))?;
                }
                return Ok(());
            }
        }
        match &body.mesh_source {
            Some(source) => {
                fs::copy(source, destination)?;
                Ok(())
            }
            None => Err(SdfExportError::MissingMesh(destination.to_path_buf())),
        }
    }
}

/// Writes the model directory: `meshes/` first, then the pretty-printed
/// `model.sdf`. A failed mesh export is logged and skipped; the conversion
/// run only aborts on an unusable output location or a markup/IO failure on
/// the model file itself.
pub fn save(
    model: &SdfModel,
    exporter: &mut dyn MeshExporter,
    directory: &Path,
) -> Result<(), SdfExportError> {
    fs::create_dir_all(directory)?;
    if !directory.is_dir() {
        return Err(SdfExportError::OutputLocation(format!(
            "\"{}\" is not a directory",
            directory.display()
        )));
    }

    let meshes_dir = directory.join("meshes");
    if meshes_dir.exists() {
        fs::remove_dir_all(&meshes_dir)?;
    }

    for job in model.mesh_jobs() {
        let destination = directory.join(&job.uri);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Err(e) = exporter.export(&job.body, &job.uri, &destination) {
            error!("failed to export mesh \"{}\": {}", job.uri, e);
        }
    }

    let sdf_path = directory.join("model.sdf");
    info!("saving SDF to \"{}\"", sdf_path.display());
    fs::write(&sdf_path, model.to_sdf_string()?)?;
    Ok(())
}
