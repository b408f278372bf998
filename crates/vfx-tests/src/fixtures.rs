//! Shared configs.

use std::path::PathBuf;

use vfx_ocio::primaries::{self, Primaries, ACES_AP0, ACES_AP1, REC709};
use vfx_ocio::{role_names, ColorSpace, Config, ExponentWithLinearTransform, Transform};
use vfx_ocio_merge::MergeParameters;

/// Studio config everything else is merged into.
pub const STUDIO: &str = r#"
ocio_profile_version: 2.1
name: studio
description: Studio base config
roles:
  aces_interchange: ACES2065-1
  texture_paint: ACEScct
  data: Raw
file_rules:
  - !<Rule> {name: LogC, colorspace: ARRI LogC, pattern: "*LogC*", extension: "*"}
  - !<Rule> {name: TIFF, colorspace: Gamma 2.2 AP1 - Texture, pattern: "*", extension: tif}
  - !<Rule> {name: OpenEXR, colorspace: ACEScg, pattern: "*", extension: exr}
  - !<Rule> {name: ColorSpaceNamePathSearch}
  - !<Rule> {name: Default, colorspace: Raw}
shared_views:
  - !<View> {name: SHARED_1, view_transform: Film, display_colorspace: sRGB - Display}
displays:
  sRGB:
    - !<View> {name: Raw, colorspace: Raw}
    - !<Views> [SHARED_1]
active_displays: [sRGB]
view_transforms:
  - !<ViewTransform>
    name: Film
    from_scene_reference: !<MatrixTransform> {}
looks:
  - !<Look> {name: warm, process_space: ACEScct}
inactive_colorspaces: [ARRI LogC]
display_colorspaces:
  - !<ColorSpace>
    name: sRGB - Display
    from_display_reference: !<MatrixTransform> {}
colorspaces:
  - !<ColorSpace>
    name: ACES2065-1
    aliases: [aces]
    family: ACES
  - !<ColorSpace>
    name: ACEScg
    family: ACES
    to_scene_reference: !<MatrixTransform> {matrix: [2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 1]}
  - !<ColorSpace>
    name: ACEScct
    family: ACES
    to_scene_reference: !<LogTransform> {base: 2, direction: inverse}
  - !<ColorSpace>
    name: ARRI LogC
    family: Input
    to_scene_reference: !<LogTransform> {base: 10, direction: inverse}
  - !<ColorSpace>
    name: Gamma 2.2 AP1 - Texture
    family: Utility
    to_scene_reference: !<ExponentTransform> {value: [2.2, 2.2, 2.2, 1]}
  - !<ColorSpace>
    name: Raw
    isdata: true
named_transforms:
  - !<NamedTransform>
    name: forward_nt
    aliases: [fnt]
    transform: !<MatrixTransform> {}
"#;

/// Show config: overrides a role and two file rules, and reuses names the
/// studio config already owns.
pub const SHOW: &str = r#"
ocio_profile_version: 2
name: show
roles:
  aces_interchange: ACES2065-1
  texture_paint: ACEScct - SomeOtherName
  matte_paint: sRGB - Texture
file_rules:
  - !<Rule> {name: TIFF, colorspace: sRGB - Texture, pattern: "*", extension: tif, custom: {key1: value1, key2: value2}}
  - !<Rule> {name: JPEG, colorspace: Linear Rec.2020, regex: ".*\\.jpeg$"}
  - !<Rule> {name: ColorSpaceNamePathSearch}
  - !<Rule> {name: Default, colorspace: ACEScct - SomeOtherName}
displays:
  sRGB:
    - !<View> {name: Show Look, view_transform: Film, display_colorspace: sRGB - Display, looks: grade}
view_transforms:
  - !<ViewTransform>
    name: Film
    from_scene_reference: !<MatrixTransform> {}
looks:
  - !<Look> {name: grade, process_space: ACEScct - SomeOtherName}
display_colorspaces:
  - !<ColorSpace>
    name: sRGB - Display
    from_display_reference: !<MatrixTransform> {}
colorspaces:
  - !<ColorSpace>
    name: ACES2065-1
    aliases: [aces]
    family: ACES
  - !<ColorSpace>
    name: ACEScct - SomeOtherName
    family: ACES
    to_scene_reference: !<LogTransform> {base: 4, direction: inverse}
  - !<ColorSpace>
    name: sRGB - Texture
    aliases: [fnt]
    family: Utility
    to_scene_reference: !<ExponentTransform> {value: [2.4, 2.4, 2.4, 1]}
  - !<ColorSpace>
    name: Linear Rec.2020
    family: Utility
    to_scene_reference: !<MatrixTransform> {matrix: [3, 0, 0, 0, 0, 3, 0, 0, 0, 0, 3, 0, 0, 0, 0, 1]}
named_transforms:
  - !<NamedTransform>
    name: show_nt
    aliases: [texture_paint, show_alias]
    transform: !<MatrixTransform> {}
"#;

pub fn yaml(text: &str) -> Config {
    Config::from_yaml_str(text, PathBuf::from(".")).unwrap()
}

/// Settings for the studio/show pair, which share a reference space.
pub fn show_params() -> MergeParameters {
    MergeParameters::new()
        .with_adjust_input_reference_space(false)
        .with_avoid_duplicates(false)
}

pub fn matrix(src: &Primaries, dst: &Primaries) -> Transform {
    Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(src, dst)))
}

pub fn srgb_encode() -> Transform {
    Transform::ExponentWithLinear(ExponentWithLinearTransform::srgb()).inverse()
}

/// Scene reference ACES2065-1, named `ap0`.
pub fn ap0_studio() -> Config {
    let mut config = Config::new();
    config.set_name("ap0 studio");
    config.add_colorspace(ColorSpace::builder("ap0").alias("ACES2065-1").family("ACES").build());
    config.add_colorspace(
        ColorSpace::builder("sRGB - Texture")
            .alias("srgb_tx")
            .family("Utility")
            .from_reference(Transform::group(vec![matrix(&ACES_AP0, &REC709), srgb_encode()]))
            .build(),
    );
    config.add_colorspace(ColorSpace::builder("Raw").is_data(true).build());
    config.add_colorspace(
        ColorSpace::builder("ACEScg")
            .family("ACES")
            .to_reference(matrix(&ACES_AP1, &ACES_AP0))
            .build(),
    );
    config.set_role(role_names::ACES_INTERCHANGE, "ACES2065-1");
    config.set_role("data", "Raw");
    config
}

/// Scene reference linear Rec.709, with its own ACES2065-1 and sRGB spaces.
pub fn rec709_show() -> Config {
    let mut config = Config::new();
    config.set_name("rec709 show");
    config.add_colorspace(
        ColorSpace::builder("ACES2065-1")
            .alias("aces")
            .family("ACES")
            .from_reference(matrix(&REC709, &ACES_AP0))
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("sRGB")
            .family("Utility")
            .from_reference(Transform::group(vec![
                Transform::matrix33([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
                srgb_encode(),
            ]))
            .build(),
    );
    config.add_colorspace(ColorSpace::builder("rec709").family("Utility").build());
    config.set_role(role_names::ACES_INTERCHANGE, "ACES2065-1");
    config
}

/// Merge settings for the ap0/rec709 pair.
pub fn rebase_params() -> MergeParameters {
    MergeParameters::new()
        .with_avoid_duplicates(true)
        .with_adjust_input_reference_space(true)
        .with_input_first(true)
}
