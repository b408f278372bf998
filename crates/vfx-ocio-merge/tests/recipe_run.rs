//! Runs recipes read from disk against config files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use vfx_ocio::Config;
use vfx_ocio_merge::{CollectingSink, ConfigMerger, MergeError, MergeRecipe};

const BASE: &str = r#"
ocio_profile_version: 2
name: base
roles:
  aces_interchange: ACES2065-1
  scene_linear: ACEScg
file_rules:
  - !<Rule> {name: Default, colorspace: ACEScg}
looks:
  - !<Look> {name: grade, process_space: ACEScg}
colorspaces:
  - !<ColorSpace>
    name: ACES2065-1
    family: ACES
  - !<ColorSpace>
    name: ACEScg
    family: ACES
    to_scene_reference: !<BuiltinTransform> {style: ACEScg_to_ACES2065-1}
"#;

const INPUT: &str = r#"
ocio_profile_version: 2.1
name: show
roles:
  aces_interchange: ACES2065-1
  color_timing: Show Log
colorspaces:
  - !<ColorSpace>
    name: ACES2065-1
  - !<ColorSpace>
    name: Show Log
    family: Camera
    to_scene_reference:
      - !<LogTransform> {base: 10, direction: inverse}
"#;

const EXTRA: &str = r#"
ocio_profile_version: 2
name: extra
looks:
  - !<Look> {name: grade, process_space: ACEScg}
colorspaces:
  - !<ColorSpace>
    name: Utility Raw
    isdata: true
"#;

const RECIPE: &str = r#"
ociom_version: 1.0
search_path: [".", more]
merge:
  show:
    base: base.ocio
    input: input.ocio
    options:
      input_family_prefix: "Show/"
      assume_common_reference_space: true
    overrides:
      name: show_merged
  final:
    base: SHOW
    input: extra.ocio
    options:
      assume_common_reference_space: true
    params:
      looks: {strategy: Remove}
"#;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("more")).unwrap();
    write(dir.path(), "base.ocio", BASE);
    write(dir.path(), "input.ocio", INPUT);
    write(&dir.path().join("more"), "extra.ocio", EXTRA);
    write(dir.path(), "show.ociom", RECIPE);
    dir
}

#[test]
fn chained_recipe() {
    let dir = workspace();
    let recipe = MergeRecipe::from_file(dir.path().join("show.ociom")).unwrap();
    assert_eq!(recipe.working_dir, dir.path());

    let sink = CollectingSink::new();
    let outputs = ConfigMerger::new(&recipe, &sink).run().unwrap();
    assert_eq!(outputs.len(), 2);

    let show = &outputs[0].config;
    assert_eq!(outputs[0].name, "show");
    assert_eq!(show.name(), "show_merged");
    assert_eq!(show.version().minor, 1);
    assert_eq!(show.colorspace("Show Log").unwrap().family(), "Show/Camera");
    assert_eq!(show.roles().get("color_timing"), Some("Show Log"));
    assert!(show.colorspace("ACEScg").is_some());

    let last = &outputs[1].config;
    assert_eq!(last.name(), "extra");
    assert!(last.looks().is_empty());
    assert!(last.colorspace("Utility Raw").unwrap().is_data());
    assert!(last.colorspace("Show Log").is_some());
}

#[test]
fn merged_config_survives_a_write() {
    let dir = workspace();
    let recipe = MergeRecipe::from_file(dir.path().join("show.ociom")).unwrap();
    let sink = CollectingSink::new();
    let outputs = ConfigMerger::new(&recipe, &sink).run().unwrap();

    let path = dir.path().join("final.ocio");
    outputs[1].config.write_to_file(&path).unwrap();
    let back = Config::from_file(&path).unwrap();
    let names: Vec<_> = back.colorspace_names().collect();
    let expected: Vec<_> = outputs[1].config.colorspace_names().collect();
    assert_eq!(names, expected);
}

#[test]
fn recipe_written_back_reads_the_same() {
    let dir = workspace();
    let recipe = MergeRecipe::from_file(dir.path().join("show.ociom")).unwrap();
    let copy = dir.path().join("copy.ociom");
    recipe.write_to_file(&copy).unwrap();
    assert_eq!(MergeRecipe::from_file(&copy).unwrap(), recipe);
}

#[test]
fn missing_config_stops_the_run() {
    let dir = workspace();
    fs::remove_file(dir.path().join("input.ocio")).unwrap();
    let recipe = MergeRecipe::from_file(dir.path().join("show.ociom")).unwrap();
    let sink = CollectingSink::new();
    let err = ConfigMerger::new(&recipe, &sink).run().unwrap_err();
    assert!(matches!(err, MergeError::ConfigLoad { ref name } if name == "input.ocio"));
}
