//! Error handling for the export pipeline

use std::io;
use std::path::PathBuf;

/// Unified error for conversion runs. Structural oddities in the assembly are
/// never errors (the builder warns and continues); these variants cover the
/// unrecoverable I/O and environment conditions that abort the whole run.
#[derive(Debug)]
pub enum SdfExportError {
    IoError(io::Error),
    Markup(String),
    OutputLocation(String),
    MissingMesh(PathBuf),
}

impl std::fmt::Display for SdfExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            SdfExportError::IoError(ref err) => write!(f, "IO Error: {}", err),
            SdfExportError::Markup(ref msg) => write!(f, "Markup Error: {}", msg),
            SdfExportError::OutputLocation(ref msg) => write!(f, "Output Location: {}", msg),
            SdfExportError::MissingMesh(ref path) => {
                write!(f, "Missing Mesh: no mesh source for \"{}\"", path.display())
            }
        }
    }
}

impl std::error::Error for SdfExportError {}

impl From<io::Error> for SdfExportError {
    fn from(err: io::Error) -> Self {
        SdfExportError::IoError(err)
    }
}

impl From<quick_xml::Error> for SdfExportError {
    fn from(err: quick_xml::Error) -> Self {
        SdfExportError::Markup(err.to_string())
    }
}
