//! Chromaticities and RGB/XYZ matrix derivation.
//!
//! Built-in transforms derive their matrices from primaries rather than
//! carrying pre-baked tables. White point changes use Bradford adaptation.
//!
//! ```
//! use vfx_ocio::primaries::{self, REC709, ACES_AP0};
//!
//! let m = primaries::rgb_to_rgb(&REC709, &ACES_AP0);
//! // Neutral stays neutral across the adaptation.
//! let white = primaries::apply(&m, [1.0, 1.0, 1.0]);
//! assert!((white[0] - 1.0).abs() < 1e-6);
//! ```

use glam::{DMat3, DVec3};

/// RGB primaries and white point as CIE xy chromaticities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y).
    pub r: (f64, f64),
    /// Green primary (x, y).
    pub g: (f64, f64),
    /// Blue primary (x, y).
    pub b: (f64, f64),
    /// White point (x, y).
    pub w: (f64, f64),
}

/// D65 white point.
pub const D65: (f64, f64) = (0.3127, 0.3290);

/// ACES white point (approximately D60).
pub const D60_ACES: (f64, f64) = (0.32168, 0.33767);

/// Rec.709 / sRGB primaries.
pub const REC709: Primaries = Primaries {
    r: (0.64, 0.33),
    g: (0.30, 0.60),
    b: (0.15, 0.06),
    w: D65,
};

/// Rec.2020 primaries.
pub const REC2020: Primaries = Primaries {
    r: (0.708, 0.292),
    g: (0.170, 0.797),
    b: (0.131, 0.046),
    w: D65,
};

/// Display P3 / P3-D65 primaries.
pub const P3_D65: Primaries = Primaries {
    r: (0.680, 0.320),
    g: (0.265, 0.690),
    b: (0.150, 0.060),
    w: D65,
};

/// ACES AP0 primaries.
pub const ACES_AP0: Primaries = Primaries {
    r: (0.7347, 0.2653),
    g: (0.0, 1.0),
    b: (0.0001, -0.0770),
    w: D60_ACES,
};

/// ACES AP1 primaries.
pub const ACES_AP1: Primaries = Primaries {
    r: (0.713, 0.293),
    g: (0.165, 0.830),
    b: (0.128, 0.044),
    w: D60_ACES,
};

const BRADFORD: DMat3 = DMat3::from_cols(
    DVec3::new(0.8951, -0.7502, 0.0389),
    DVec3::new(0.2664, 1.7135, -0.0685),
    DVec3::new(-0.1614, 0.0367, 1.0296),
);

#[inline]
fn xy_to_xyz(xy: (f64, f64)) -> DVec3 {
    DVec3::new(xy.0 / xy.1, 1.0, (1.0 - xy.0 - xy.1) / xy.1)
}

/// RGB to XYZ matrix, with XYZ relative to the primaries' own white.
pub fn rgb_to_xyz(p: &Primaries) -> DMat3 {
    let r = xy_to_xyz(p.r);
    let g = xy_to_xyz(p.g);
    let b = xy_to_xyz(p.b);
    let m = DMat3::from_cols(r, g, b);
    let s = m.inverse() * xy_to_xyz(p.w);
    DMat3::from_cols(r * s.x, g * s.y, b * s.z)
}

/// Bradford adaptation from one white point to another.
pub fn bradford(src_white: (f64, f64), dst_white: (f64, f64)) -> DMat3 {
    if src_white == dst_white {
        return DMat3::IDENTITY;
    }
    let src = BRADFORD * xy_to_xyz(src_white);
    let dst = BRADFORD * xy_to_xyz(dst_white);
    let scale = DMat3::from_diagonal(dst / src);
    BRADFORD.inverse() * scale * BRADFORD
}

/// RGB to RGB matrix, adapting white points when they differ.
pub fn rgb_to_rgb(src: &Primaries, dst: &Primaries) -> DMat3 {
    let adapt = bradford(src.w, dst.w);
    rgb_to_xyz(dst).inverse() * adapt * rgb_to_xyz(src)
}

/// RGB to CIE XYZ with a D65 white, adapting from the primaries' white.
pub fn rgb_to_xyz_d65(p: &Primaries) -> DMat3 {
    bradford(p.w, D65) * rgb_to_xyz(p)
}

/// Row-major 3x3 rows of a matrix.
pub fn rows(m: &DMat3) -> [[f64; 3]; 3] {
    let t = m.transpose();
    [t.x_axis.to_array(), t.y_axis.to_array(), t.z_axis.to_array()]
}

/// Applies a matrix to an RGB triple.
pub fn apply(m: &DMat3, rgb: [f64; 3]) -> [f64; 3] {
    (*m * DVec3::from_array(rgb)).to_array()
}
