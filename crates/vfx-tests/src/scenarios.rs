//! End-to-end merges with known results.

use std::fs;

use approx::assert_relative_eq;
use tempfile::TempDir;
use vfx_ocio::primaries::{self, ACES_AP0, REC709};
use vfx_ocio::{builtin, ColorSpace, Config, Processor, ProcessorOp, Transform, TransformDirection};
use vfx_ocio_merge::refspace::reference_from_srgb_space;
use vfx_ocio_merge::{
    identify_interchange_space, merge_config_pair, CollectingSink, ConfigMerger, MergeError,
    MergeRecipe,
};

use crate::fixtures::{
    ap0_studio, matrix, rebase_params, rec709_show, show_params, srgb_encode, yaml, SHOW, STUDIO,
};

fn merge_show() -> (Config, CollectingSink) {
    let sink = CollectingSink::new();
    let merged = merge_config_pair(&show_params(), &yaml(STUDIO), &yaml(SHOW), &sink).unwrap();
    (merged, sink)
}

#[test]
fn roles_prefer_input() {
    let (merged, sink) = merge_show();
    let roles = merged.roles();
    assert_eq!(roles.get("aces_interchange"), Some("ACES2065-1"));
    assert_eq!(roles.get("texture_paint"), Some("ACEScct - SomeOtherName"));
    assert_eq!(roles.get("matte_paint"), Some("sRGB - Texture"));
    assert_eq!(roles.get("data"), Some("Raw"));
    assert_eq!(roles.iter().count(), 4);

    let role_warnings: Vec<String> = sink
        .warnings()
        .into_iter()
        .filter(|w| w.starts_with("The Input config contains a role"))
        .collect();
    assert_eq!(
        role_warnings,
        ["The Input config contains a role that would override Base config role 'texture_paint'."]
    );
}

#[test]
fn file_rules_prefer_input_input_first() {
    let (merged, sink) = merge_show();
    let rules = merged.file_rules();
    let names: Vec<&str> = rules.rules().iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        ["TIFF", "JPEG", "ColorSpaceNamePathSearch", "LogC", "OpenEXR", "Default"]
    );

    let tiff = rules.get("TIFF").unwrap();
    assert_eq!(tiff.colorspace(), "sRGB - Texture");
    assert_eq!(
        tiff.custom_keys(),
        [
            ("key1".to_string(), "value1".to_string()),
            ("key2".to_string(), "value2".to_string()),
        ]
    );
    assert_eq!(rules.get("JPEG").unwrap().colorspace(), "Linear Rec.2020");
    assert_eq!(rules.default_rule().unwrap().colorspace(), "ACEScct - SomeOtherName");

    let rule_warnings: Vec<String> = sink
        .warnings()
        .into_iter()
        .filter(|w| w.contains("file_rules: "))
        .collect();
    assert_eq!(
        rule_warnings,
        [
            "The Input config contains a value that would override the Base config: file_rules: TIFF",
            "The Input config contains a value that would override the Base config: file_rules: Default",
        ]
    );
}

#[test]
fn srgb_texture_reveals_rec709_reference() {
    // Round-tripping through AP0 keeps a primaries matrix in the chain
    // while leaving a plain sRGB curve over linear Rec.709.
    let mut src = Config::new();
    src.add_colorspace(ColorSpace::builder("scene_linear").build());
    src.add_colorspace(
        ColorSpace::builder("srgb_tx")
            .from_reference(Transform::group(vec![
                matrix(&REC709, &ACES_AP0),
                matrix(&ACES_AP0, &REC709),
                srgb_encode(),
            ]))
            .build(),
    );
    let builtin_config = builtin::reference();
    let cs = src.colorspace("srgb_tx").unwrap();
    assert_eq!(
        reference_from_srgb_space(&src, "scene_linear", cs, &builtin_config),
        Some(2)
    );

    let ic = identify_interchange_space(&src, "scene_linear", &builtin_config, "ACES2065-1").unwrap();
    assert_eq!(ic.src, "scene_linear");
    assert_eq!(ic.dst, builtin::LINEAR_SPACES[2]);
}

fn merge_rebased() -> (Config, CollectingSink) {
    let sink = CollectingSink::new();
    let merged = merge_config_pair(&rebase_params(), &ap0_studio(), &rec709_show(), &sink).unwrap();
    (merged, sink)
}

#[test]
fn duplicates_collapse_across_references() {
    let (merged, sink) = merge_rebased();
    let names: Vec<&str> = merged.colorspace_names().collect();
    assert_eq!(names, ["ACES2065-1", "sRGB", "rec709", "Raw", "ACEScg"]);

    assert_eq!(merged.colorspace("ACES2065-1").unwrap().aliases(), ["aces", "ap0"]);
    assert_eq!(merged.colorspace("sRGB").unwrap().aliases(), ["sRGB - Texture", "srgb_tx"]);
    assert_eq!(merged.colorspace("srgb_tx").unwrap().name(), "sRGB");
    assert!(merged.colorspace("Raw").unwrap().is_data());

    assert_eq!(
        sink.warnings(),
        [
            "Input color space 'ACES2065-1' is a duplicate of base color space 'ap0' and replaces it.",
            "Input color space 'sRGB' is a duplicate of base color space 'sRGB - Texture' and replaces it.",
        ]
    );
}

#[test]
fn reference_converter_reaches_merged_spaces() {
    let (merged, _) = merge_rebased();
    let to_ref = merged.colorspace("rec709").unwrap().to_reference().unwrap();
    let matrix = match to_ref {
        Transform::Group(group) => match group.transforms.as_slice() {
            [Transform::Matrix(m)] => m.matrix,
            other => panic!("expected one matrix, got {other:?}"),
        },
        other => panic!("expected a group, got {other:?}"),
    };
    let expected = primaries::rows(&primaries::rgb_to_rgb(&REC709, &ACES_AP0));
    for (row, want) in expected.iter().enumerate() {
        for (col, want) in want.iter().enumerate() {
            assert_relative_eq!(matrix[row * 4 + col], *want, epsilon = 1e-7);
        }
    }

    // Rec.709 to ACES2065-1, Bradford adapted.
    let proc = Processor::from_transform(to_ref, TransformDirection::Forward).unwrap();
    let m = match proc.ops() {
        [ProcessorOp::Matrix { matrix, .. }] => *matrix,
        other => panic!("expected one matrix, got {other:?}"),
    };
    assert_relative_eq!(m[0], 0.4396330, epsilon = 1e-5);
    assert_relative_eq!(m[1], 0.3829887, epsilon = 1e-5);
    assert_relative_eq!(m[5], 0.8134394, epsilon = 1e-5);
    assert_relative_eq!(m[10], 0.8709123, epsilon = 1e-5);
}

const SHARED_BASE: &str = r#"
ocio_profile_version: 2
name: base
shared_views:
  - !<View> {name: SHARED_1, colorspace: lin}
displays:
  DISP:
    - !<Views> [SHARED_1]
colorspaces:
  - !<ColorSpace>
    name: lin
"#;

const SHARED_INPUT: &str = r#"
ocio_profile_version: 2
name: input
shared_views:
  - !<View> {name: SHARED_1, colorspace: log}
displays:
  DISP:
    - !<Views> [SHARED_1]
colorspaces:
  - !<ColorSpace>
    name: lin
  - !<ColorSpace>
    name: log
    to_scene_reference: !<LogTransform> {base: 10, direction: inverse}
"#;

const FATAL_RECIPE: &str = r#"
ociom_version: 1.0
search_path: "."
merge:
  merged:
    base: base.ocio
    input: input.ocio
    options:
      error_on_conflict: true
      assume_common_reference_space: true
      default_strategy: PreferInput
"#;

#[test]
fn conflict_is_fatal() {
    let params = show_params().with_error_on_conflict(true);
    let sink = CollectingSink::new();
    let err = merge_config_pair(&params, &yaml(SHARED_BASE), &yaml(SHARED_INPUT), &sink).unwrap_err();
    match err {
        MergeError::Conflict(msg) => assert!(msg.contains("shared_views: SHARED_1")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(sink.fatal_message().unwrap().contains("shared_views: SHARED_1"));
    assert!(sink.warnings().is_empty());
}

#[test]
fn fatal_conflict_stops_recipe() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("base.ocio"), SHARED_BASE).unwrap();
    fs::write(dir.path().join("input.ocio"), SHARED_INPUT).unwrap();
    fs::write(dir.path().join("merge.ociom"), FATAL_RECIPE).unwrap();

    let recipe = MergeRecipe::from_file(dir.path().join("merge.ociom")).unwrap();
    assert!(recipe.merges[0].error_on_conflict);
    let sink = CollectingSink::new();
    let err = ConfigMerger::new(&recipe, &sink).run().unwrap_err();
    assert!(matches!(err, MergeError::Conflict(ref msg) if msg.contains("shared_views: SHARED_1")));
}
