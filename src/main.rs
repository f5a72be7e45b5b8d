//! Command line driver: reads an assembly snapshot and writes the SDF model
//! directory.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rs_sdf_export::assembly::Snapshot;
use rs_sdf_export::builder::SdfModel;
use rs_sdf_export::export::{save, FileMeshExporter};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Convert a CAD assembly snapshot (JSON) into an SDF 1.11 model directory
/// containing model.sdf and a meshes/ tree.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assembly snapshot JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for model.sdf and meshes/
    #[arg(short, long)]
    output: PathBuf,

    /// Reuse mesh files from this directory instead of the snapshot sources
    #[arg(long)]
    meshes_cache: Option<PathBuf>,

    /// Overwrite an existing model.sdf or meshes/ in the output directory
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rs_sdf_export=info".parse()?)
                .add_directive("sdf_export=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading snapshot \"{}\"", args.input.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot \"{}\"", args.input.display()))?;

    if !args.force
        && (args.output.join("model.sdf").exists() || args.output.join("meshes").exists())
    {
        bail!(
            "\"{}\" already contains an SDF model; pass --force to overwrite",
            args.output.display()
        );
    }

    let model = SdfModel::build(&snapshot.assembly, &snapshot.overrides);
    info!(
        "model \"{}\": {} links, {} joints, root \"{}\"",
        model.name,
        model.links().len(),
        model.joints().len(),
        model.root_link().unwrap_or("<none>")
    );

    let mut exporter = FileMeshExporter {
        cache_dir: args.meshes_cache,
    };
    save(&model, &mut exporter, &args.output)
        .with_context(|| format!("saving model to \"{}\"", args.output.display()))?;
    Ok(())
}
