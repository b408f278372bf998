//! Built-in OCIO configurations.
//!
//! Provides the reference config used to identify unknown reference
//! spaces. It needs no external files and is addressable by URI.
//!
//! # Example
//!
//! ```
//! use vfx_ocio::builtin;
//!
//! let config = builtin::from_uri("ocio://default").unwrap();
//!
//! // The known linear spaces come first, in a fixed order
//! let names: Vec<_> = config.colorspace_names().take(5).collect();
//! assert_eq!(names, builtin::LINEAR_SPACES);
//! ```

use crate::colorspace::{ColorSpace, Encoding, ReferenceSpaceType};
use crate::config::{Config, ConfigVersion};
use crate::display::{Display, USE_DISPLAY_NAME, View, ViewTransform};
use crate::primaries::{self, ACES_AP0, P3_D65, REC709, REC2020};
use crate::role;
use crate::transform::*;

/// Known scene-linear spaces of the reference config, in order.
pub const LINEAR_SPACES: [&str; 5] = [
    "ACES2065-1",
    "ACEScg",
    "Linear Rec.709 (sRGB)",
    "Linear P3-D65",
    "Linear Rec.2020",
];

/// The sRGB texture space of the reference config.
pub const SRGB_TEXTURE: &str = "sRGB - Texture";

/// The display-referred interchange space of the reference config.
pub const CIE_XYZ_D65: &str = "CIE-XYZ-D65";

/// Studio config the reference config stands in for.
pub const STUDIO_CONFIG_NAME: &str = "cg-config-v2.1.0_aces-v1.3_ocio-v2.3";

const URI_SCHEME: &str = "ocio://";

/// Creates the built-in reference configuration.
///
/// Scene reference is ACES2065-1, display reference is CIE-XYZ-D65. Both
/// interchange roles are set.
pub fn reference() -> Config {
    let mut config = Config::new();
    config.set_name(STUDIO_CONFIG_NAME);
    config.set_description("Built-in reference config");
    config.set_version(ConfigVersion::new(2, 3));

    config.add_colorspace(
        ColorSpace::builder("ACES2065-1")
            .alias("aces2065_1")
            .alias("ACES - ACES2065-1")
            .alias("lin_ap0")
            .family("ACES")
            .encoding(Encoding::SceneLinear)
            .description("The Academy Color Encoding System reference color space")
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("ACEScg")
            .alias("ACES - ACEScg")
            .alias("lin_ap1")
            .family("ACES")
            .encoding(Encoding::SceneLinear)
            .to_reference(Transform::builtin("ACEScg_to_ACES2065-1"))
            .build(),
    );
    config.add_colorspace(linear_space(
        "Linear Rec.709 (sRGB)",
        &["lin_rec709_srgb", "Utility - Linear - Rec.709", "lin_srgb"],
        &REC709,
    ));
    config.add_colorspace(linear_space(
        "Linear P3-D65",
        &["lin_p3d65", "Utility - Linear - P3-D65"],
        &P3_D65,
    ));
    config.add_colorspace(linear_space(
        "Linear Rec.2020",
        &["lin_rec2020", "Utility - Linear - Rec.2020"],
        &REC2020,
    ));
    config.add_colorspace(
        ColorSpace::builder(SRGB_TEXTURE)
            .alias("srgb_tx")
            .alias("Utility - sRGB - Texture")
            .family("Utility")
            .encoding(Encoding::Sdr)
            .to_reference(Transform::group(vec![
                Transform::ExponentWithLinear(ExponentWithLinearTransform::srgb()),
                to_ap0(&REC709),
            ]))
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("ACEScct")
            .alias("ACES - ACEScct")
            .alias("acescct_ap1")
            .family("ACES")
            .encoding(Encoding::Log)
            .to_reference(Transform::builtin("ACEScct_to_ACES2065-1"))
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("Raw")
            .alias("Utility - Raw")
            .family("Utility")
            .encoding(Encoding::Data)
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder(CIE_XYZ_D65)
            .alias("cie_xyz_d65")
            .family("Display")
            .encoding(Encoding::DisplayLinear)
            .reference_space(ReferenceSpaceType::Display)
            .description("The CIE XYZ (D65) display connection color space")
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("sRGB - Display")
            .alias("srgb_display")
            .family("Display")
            .encoding(Encoding::Sdr)
            .reference_space(ReferenceSpaceType::Display)
            .from_reference(Transform::builtin("DISPLAY - CIE-XYZ-D65_to_sRGB"))
            .build(),
    );

    config.add_view_transform(
        ViewTransform::new("Un-tone-mapped")
            .with_family("Utility")
            .with_reference_space(ReferenceSpaceType::Scene)
            .with_from_reference(Transform::builtin("UTILITY - ACES-AP0_to_CIE-XYZ-D65_BFD")),
    );
    config.set_default_view_transform("Un-tone-mapped");

    config.add_shared_view(
        View::new("Un-tone-mapped", USE_DISPLAY_NAME).with_view_transform("Un-tone-mapped"),
    );
    let mut display = Display::new("sRGB - Display");
    display.add_shared_view("Un-tone-mapped");
    display.add_view(View::new("Raw", "Raw"));
    config.add_display(display);
    config.set_active_displays(vec!["sRGB - Display".into()]);
    config.set_active_views(vec!["Un-tone-mapped".into(), "Raw".into()]);

    config.set_role(role::names::ACES_INTERCHANGE, "ACES2065-1");
    config.set_role(role::names::CIE_XYZ_D65_INTERCHANGE, CIE_XYZ_D65);
    config.set_role(role::names::DATA, "Raw");
    config.set_role(role::names::DEFAULT, SRGB_TEXTURE);
    config.set_role(role::names::SCENE_LINEAR, "ACEScg");
    config.set_role(role::names::COLOR_TIMING, "ACEScct");
    config.set_role(role::names::COMPOSITING_LOG, "ACEScct");

    config
}

fn to_ap0(p: &primaries::Primaries) -> Transform {
    Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(p, &ACES_AP0)))
}

fn linear_space(name: &str, aliases: &[&str], p: &primaries::Primaries) -> ColorSpace {
    let mut b = ColorSpace::builder(name)
        .family("Utility")
        .encoding(Encoding::SceneLinear)
        .to_reference(to_ap0(p));
    for alias in aliases {
        b = b.alias(*alias);
    }
    b.build()
}

/// Names accepted by [`from_uri`], without the `ocio://` prefix.
pub fn available_configs() -> &'static [&'static str] {
    &["default", "reference", "cg-config-latest", STUDIO_CONFIG_NAME]
}

/// Resolves a built-in config URI such as `ocio://default`.
///
/// Returns `None` for anything that is not a built-in URI.
pub fn from_uri(uri: &str) -> Option<Config> {
    let name = uri.strip_prefix(URI_SCHEME)?;
    available_configs()
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name))
        .then(reference)
}

/// True if `s` uses the built-in URI scheme.
pub fn is_uri(s: &str) -> bool {
    s.starts_with(URI_SCHEME)
}
