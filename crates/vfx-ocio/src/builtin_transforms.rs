//! Built-in transform definitions for OCIO v2 BuiltinTransform.
//!
//! Each style expands into primitive transforms (matrices, curves) so the
//! processor never needs external files. Matrices are derived from
//! chromaticities in [`crate::primaries`].

use crate::primaries::{self, ACES_AP0, ACES_AP1, P3_D65, REC709};
use crate::transform::*;

/// Styles understood by [`get_builtin`], in canonical spelling.
pub const STYLES: &[&str] = &[
    "IDENTITY",
    "ACES-AP0_to_AP1",
    "ACEScg_to_ACES2065-1",
    "ACEScct_to_ACES2065-1",
    "ACEScc_to_ACES2065-1",
    "UTILITY - ACES-AP0_to_CIE-XYZ-D65_BFD",
    "UTILITY - ACES-AP1_to_CIE-XYZ-D65_BFD",
    "UTILITY - ACES-AP1_to_LINEAR-REC709_BFD",
    "DISPLAY - CIE-XYZ-D65_to_sRGB",
    "DISPLAY - CIE-XYZ-D65_to_REC.1886-REC.709",
    "DISPLAY - CIE-XYZ-D65_to_DisplayP3",
    "CURVE - LINEAR_to_SRGB",
];

// ACEScct: (log2(x) + 9.72) / 17.52 above the break, linear toe below.
fn acescct_curve() -> LogCameraTransform {
    LogCameraTransform {
        base: 2.0,
        log_side_slope: [1.0 / 17.52; 3],
        log_side_offset: [9.72 / 17.52; 3],
        lin_side_slope: [1.0; 3],
        lin_side_offset: [0.0; 3],
        lin_side_break: [0.0078125; 3],
        linear_slope: None,
        direction: TransformDirection::Forward,
    }
}

// ACEScc shares the log segment; the toe is approximated by a matching line.
fn acescc_curve() -> LogCameraTransform {
    LogCameraTransform {
        lin_side_break: [2f64.powi(-15); 3],
        ..acescct_curve()
    }
}

fn rec1886_encode() -> Transform {
    Transform::Exponent(ExponentTransform {
        value: [2.4, 2.4, 2.4, 1.0],
        negative_style: NegativeStyle::Clamp,
        direction: TransformDirection::Inverse,
    })
}

fn srgb_encode() -> Transform {
    Transform::ExponentWithLinear(ExponentWithLinearTransform::srgb()).inverse()
}

/// Get builtin transform definition by style name.
///
/// Matching ignores case, spaces, dashes and underscores. The result is
/// always a forward group of primitive transforms.
pub fn get_builtin(style: &str) -> Option<Transform> {
    let key = style.to_lowercase().replace(['-', '_', ' ', '.'], "");

    let ops = match key.as_str() {
        "identity" => vec![],
        "acesap0toap1" | "aces20651toacescg" => {
            vec![Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(
                &ACES_AP0, &ACES_AP1,
            )))]
        }
        "acescgtoaces20651" | "acesap1toap0" => {
            vec![Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(
                &ACES_AP1, &ACES_AP0,
            )))]
        }
        "acesccttoaces20651" => vec![
            Transform::LogCamera(acescct_curve()).inverse(),
            Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(&ACES_AP1, &ACES_AP0))),
        ],
        "acescctoaces20651" => vec![
            Transform::LogCamera(acescc_curve()).inverse(),
            Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(&ACES_AP1, &ACES_AP0))),
        ],
        "utilityacesap0tociexyzd65bfd" => {
            vec![Transform::matrix33(primaries::rows(&primaries::rgb_to_xyz_d65(&ACES_AP0)))]
        }
        "utilityacesap1tociexyzd65bfd" => {
            vec![Transform::matrix33(primaries::rows(&primaries::rgb_to_xyz_d65(&ACES_AP1)))]
        }
        "utilityacesap1tolinearrec709bfd" => {
            vec![Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(&ACES_AP1, &REC709)))]
        }
        "displayciexyzd65tosrgb" => vec![
            Transform::matrix33(primaries::rows(&primaries::rgb_to_xyz_d65(&REC709).inverse())),
            srgb_encode(),
        ],
        "displayciexyzd65torec1886rec709" => vec![
            Transform::matrix33(primaries::rows(&primaries::rgb_to_xyz_d65(&REC709).inverse())),
            rec1886_encode(),
        ],
        "displayciexyzd65todisplayp3" => vec![
            Transform::matrix33(primaries::rows(&primaries::rgb_to_xyz_d65(&P3_D65).inverse())),
            srgb_encode(),
        ],
        "curvelineartosrgb" => vec![srgb_encode()],
        _ => return None,
    };

    Some(Transform::group(ops))
}
