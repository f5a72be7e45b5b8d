//! Persisted layout: output directory, meshes tree and snapshot parsing.

use super::fixtures::*;
use crate::assembly::{ExportOverrides, Snapshot};
use crate::builder::SdfModel;
use crate::export::{save, FileMeshExporter};
use std::fs;
use std::path::PathBuf;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "rs_sdf_export_{}_{}",
        tag,
        std::process::id()
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    dir
}

#[test]
fn test_save_writes_model_and_meshes() {
    let dir = scratch_dir("save");

    // Stand-in for meshes exported on the CAD side.
    let source_dir = scratch_dir("sources");
    fs::create_dir_all(&source_dir).unwrap();
    let mut assembly = simple_arm();
    for (occurrence, file) in assembly.occurrences.iter_mut().zip(["base.obj", "arm.obj"]) {
        let source = source_dir.join(file);
        fs::write(&source, "o mesh\n").unwrap();
        occurrence.bodies[0].mesh_source = Some(source);
    }

    let model = SdfModel::build(&assembly, &ExportOverrides::default());
    let mut exporter = FileMeshExporter { cache_dir: None };
    save(&model, &mut exporter, &dir).expect("save");

    let sdf = fs::read_to_string(dir.join("model.sdf")).unwrap();
    assert!(sdf.contains("<model name=\"simple_arm_v1\">"));
    assert!(dir.join("meshes/base_1/baseplate_visual.obj").is_file());
    assert!(dir.join("meshes/arm_1/upperarm_visual.obj").is_file());

    fs::remove_dir_all(&dir).unwrap();
    fs::remove_dir_all(&source_dir).unwrap();
}

#[test]
fn test_save_continues_past_missing_mesh_source() {
    let dir = scratch_dir("missing_mesh");

    // No mesh_source anywhere: every export fails, the model still saves.
    let model = SdfModel::build(&simple_arm(), &ExportOverrides::default());
    let mut exporter = FileMeshExporter { cache_dir: None };
    save(&model, &mut exporter, &dir).expect("save must not abort");

    assert!(dir.join("model.sdf").is_file());
    assert!(!dir.join("meshes/base_1/baseplate_visual.obj").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_mesh_cache_wins_over_source() {
    let dir = scratch_dir("cache");
    let cache_dir = scratch_dir("cache_src");
    fs::create_dir_all(cache_dir.join("base_1")).unwrap();
    fs::create_dir_all(cache_dir.join("arm_1")).unwrap();
    fs::write(cache_dir.join("base_1/baseplate_visual.obj"), "cached\n").unwrap();
    fs::write(cache_dir.join("arm_1/upperarm_visual.obj"), "cached\n").unwrap();

    let model = SdfModel::build(&simple_arm(), &ExportOverrides::default());
    let mut exporter = FileMeshExporter {
        cache_dir: Some(cache_dir.clone()),
    };
    save(&model, &mut exporter, &dir).expect("save");

    let copied = fs::read_to_string(dir.join("meshes/base_1/baseplate_visual.obj")).unwrap();
    assert_eq!(copied, "cached\n");

    fs::remove_dir_all(&dir).unwrap();
    fs::remove_dir_all(&cache_dir).unwrap();
}

#[test]
fn test_snapshot_parses_from_json() {
    let json = r#"{
        "assembly": {
            "name": "Mini Bot",
            "occurrences": [
                {
                    "name": "Chassis:1",
                    "transform": { "translation": [0, 0, 5], "rotation": [0, 0, 0] },
                    "bodies": [ { "name": "Plate" } ],
                    "mass_properties": { "mass": 0.5, "center_of_mass": [0, 0, 5] }
                }
            ],
            "joints": []
        },
        "overrides": {
            "swap_parent_child": ["some_joint"]
        }
    }"#;
    let snapshot: Snapshot = serde_json::from_str(json).expect("snapshot json");
    assert_eq!(snapshot.assembly.name, "Mini Bot");
    assert!(snapshot.overrides.swap_parent_child.contains("some_joint"));
    // moments omitted: the builder will fall back to unit inertia
    assert!(
        snapshot.assembly.occurrences[0]
            .mass_properties
            .as_ref()
            .unwrap()
            .moments
            .is_none()
    );

    let model = SdfModel::build(&snapshot.assembly, &snapshot.overrides);
    assert!(model.link("chassis_1").is_some());
}
