//! Transform definitions for color space conversions.
//!
//! Transforms define operations applied to pixel values:
//! - Matrix transforms (primaries conversion)
//! - Transfer functions (exponent, moncurve, log, camera log)
//! - LUT application (1D, 3D), inline or from file
//! - References to other config objects (color spaces, looks, views)
//!
//! Transforms can be chained via `GroupTransform`.

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Combines two directions (inverse of inverse is forward).
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        if self == other {
            Self::Forward
        } else {
            Self::Inverse
        }
    }
}

/// Interpolation method for LUTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest neighbor.
    Nearest,
    /// Linear interpolation (default for 1D).
    #[default]
    Linear,
    /// Tetrahedral interpolation (default for 3D).
    Tetrahedral,
    /// Best available (context-dependent).
    Best,
}

/// Discriminant of a [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// [`MatrixTransform`].
    Matrix,
    /// [`ExponentTransform`].
    Exponent,
    /// [`ExponentWithLinearTransform`].
    ExponentWithLinear,
    /// [`LogTransform`].
    Log,
    /// [`LogCameraTransform`].
    LogCamera,
    /// [`CdlTransform`].
    Cdl,
    /// [`RangeTransform`].
    Range,
    /// [`FileTransform`].
    File,
    /// [`ColorSpaceTransform`].
    ColorSpace,
    /// [`LookTransform`].
    Look,
    /// [`DisplayViewTransform`].
    DisplayView,
    /// [`BuiltinTransform`].
    Builtin,
    /// [`Lut1dTransform`].
    Lut1d,
    /// [`Lut3dTransform`].
    Lut3d,
    /// [`GroupTransform`].
    Group,
}

impl TransformKind {
    /// Name used for the YAML tag of this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Matrix => "MatrixTransform",
            Self::Exponent => "ExponentTransform",
            Self::ExponentWithLinear => "ExponentWithLinearTransform",
            Self::Log => "LogTransform",
            Self::LogCamera => "LogCameraTransform",
            Self::Cdl => "CDLTransform",
            Self::Range => "RangeTransform",
            Self::File => "FileTransform",
            Self::ColorSpace => "ColorSpaceTransform",
            Self::Look => "LookTransform",
            Self::DisplayView => "DisplayViewTransform",
            Self::Builtin => "BuiltinTransform",
            Self::Lut1d => "Lut1DTransform",
            Self::Lut3d => "Lut3DTransform",
            Self::Group => "GroupTransform",
        }
    }
}

/// Color transform definition.
///
/// This enum represents all transform types the library understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// 4x4 matrix transform.
    Matrix(MatrixTransform),

    /// Exponent/gamma.
    Exponent(ExponentTransform),

    /// Gamma with a linear segment near zero (moncurve).
    ExponentWithLinear(ExponentWithLinearTransform),

    /// Log transform.
    Log(LogTransform),

    /// Camera log curve with linear toe.
    LogCamera(LogCameraTransform),

    /// CDL (slope/offset/power/sat).
    Cdl(CdlTransform),

    /// Range remapping.
    Range(RangeTransform),

    /// LUT or matrix from file.
    File(FileTransform),

    /// Reference to named color space.
    ColorSpace(ColorSpaceTransform),

    /// Reference to named look.
    Look(LookTransform),

    /// Reference to display/view.
    DisplayView(DisplayViewTransform),

    /// Builtin transform by name (OCIO v2).
    Builtin(BuiltinTransform),

    /// Inline 1D LUT.
    Lut1d(Lut1dTransform),

    /// Inline 3D LUT.
    Lut3d(Lut3dTransform),

    /// Group of chained transforms.
    Group(GroupTransform),
}

impl Transform {
    /// Creates a matrix transform from a 4x4 array.
    pub fn matrix(m: [f64; 16]) -> Self {
        Self::Matrix(MatrixTransform {
            matrix: m,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a matrix transform from a row-major 3x3 RGB matrix.
    pub fn matrix33(m: [[f64; 3]; 3]) -> Self {
        Self::Matrix(MatrixTransform::from_rows(m))
    }

    /// Creates a group transform.
    pub fn group(transforms: Vec<Transform>) -> Self {
        Self::Group(GroupTransform {
            transforms,
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a file transform (LUT reference).
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(FileTransform {
            src: path.into(),
            ccc_id: None,
            interpolation: Interpolation::default(),
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a builtin transform by style name.
    pub fn builtin(style: impl Into<String>) -> Self {
        Self::Builtin(BuiltinTransform {
            style: style.into(),
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a color space transform between two named spaces.
    pub fn color_space(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self::ColorSpace(ColorSpaceTransform {
            src: src.into(),
            dst: dst.into(),
            data_bypass: true,
            direction: TransformDirection::Forward,
        })
    }

    /// Returns the kind of this transform.
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Matrix(_) => TransformKind::Matrix,
            Self::Exponent(_) => TransformKind::Exponent,
            Self::ExponentWithLinear(_) => TransformKind::ExponentWithLinear,
            Self::Log(_) => TransformKind::Log,
            Self::LogCamera(_) => TransformKind::LogCamera,
            Self::Cdl(_) => TransformKind::Cdl,
            Self::Range(_) => TransformKind::Range,
            Self::File(_) => TransformKind::File,
            Self::ColorSpace(_) => TransformKind::ColorSpace,
            Self::Look(_) => TransformKind::Look,
            Self::DisplayView(_) => TransformKind::DisplayView,
            Self::Builtin(_) => TransformKind::Builtin,
            Self::Lut1d(_) => TransformKind::Lut1d,
            Self::Lut3d(_) => TransformKind::Lut3d,
            Self::Group(_) => TransformKind::Group,
        }
    }

    /// Direction of this transform.
    pub fn direction(&self) -> TransformDirection {
        match self {
            Self::Matrix(t) => t.direction,
            Self::Exponent(t) => t.direction,
            Self::ExponentWithLinear(t) => t.direction,
            Self::Log(t) => t.direction,
            Self::LogCamera(t) => t.direction,
            Self::Cdl(t) => t.direction,
            Self::Range(t) => t.direction,
            Self::File(t) => t.direction,
            Self::ColorSpace(t) => t.direction,
            Self::Look(t) => t.direction,
            Self::DisplayView(t) => t.direction,
            Self::Builtin(t) => t.direction,
            Self::Lut1d(t) => t.direction,
            Self::Lut3d(t) => t.direction,
            Self::Group(t) => t.direction,
        }
    }

    fn direction_mut(&mut self) -> &mut TransformDirection {
        match self {
            Self::Matrix(t) => &mut t.direction,
            Self::Exponent(t) => &mut t.direction,
            Self::ExponentWithLinear(t) => &mut t.direction,
            Self::Log(t) => &mut t.direction,
            Self::LogCamera(t) => &mut t.direction,
            Self::Cdl(t) => &mut t.direction,
            Self::Range(t) => &mut t.direction,
            Self::File(t) => &mut t.direction,
            Self::ColorSpace(t) => &mut t.direction,
            Self::Look(t) => &mut t.direction,
            Self::DisplayView(t) => &mut t.direction,
            Self::Builtin(t) => &mut t.direction,
            Self::Lut1d(t) => &mut t.direction,
            Self::Lut3d(t) => &mut t.direction,
            Self::Group(t) => &mut t.direction,
        }
    }

    /// Returns the inverse of this transform.
    ///
    /// Leaf transforms flip their direction. A group keeps its direction,
    /// reverses its children and inverts each of them, so the result reads
    /// in application order.
    pub fn inverse(self) -> Self {
        match self {
            Self::Group(mut g) => {
                g.transforms = g.transforms.into_iter().rev().map(Transform::inverse).collect();
                Self::Group(g)
            }
            mut t => {
                let dir = t.direction_mut();
                *dir = dir.inverse();
                t
            }
        }
    }

    /// Returns true if `pred` holds for this transform or any nested one.
    pub fn any<F>(&self, pred: &mut F) -> bool
    where
        F: FnMut(&Transform) -> bool,
    {
        if pred(self) {
            return true;
        }
        match self {
            Self::Group(g) => g.transforms.iter().any(|t| t.any(pred)),
            _ => false,
        }
    }

    /// Calls `f` for this transform and every nested one, depth first.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&Transform),
    {
        f(self);
        if let Self::Group(g) = self {
            for t in &g.transforms {
                t.visit(f);
            }
        }
    }

    /// True for an empty group or a group made only of empty groups.
    pub fn is_empty_group(&self) -> bool {
        match self {
            Self::Group(g) => g.transforms.iter().all(Transform::is_empty_group),
            _ => false,
        }
    }
}

impl From<MatrixTransform> for Transform {
    fn from(t: MatrixTransform) -> Self {
        Self::Matrix(t)
    }
}

impl From<GroupTransform> for Transform {
    fn from(t: GroupTransform) -> Self {
        Self::Group(t)
    }
}

/// 4x4 matrix + offset transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTransform {
    /// 4x4 matrix in row-major order.
    pub matrix: [f64; 16],
    /// RGBA offset.
    pub offset: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl MatrixTransform {
    /// Identity matrix.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Self::IDENTITY,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        }
    }

    /// Builds a 4x4 transform from a row-major 3x3 RGB matrix.
    pub fn from_rows(m: [[f64; 3]; 3]) -> Self {
        let mut matrix = Self::IDENTITY;
        for (r, row) in m.iter().enumerate() {
            matrix[r * 4..r * 4 + 3].copy_from_slice(row);
        }
        Self {
            matrix,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        }
    }
}

/// Exponent/gamma transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentTransform {
    /// Per-channel exponents [R, G, B, A].
    pub value: [f64; 4],
    /// Negative handling style.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// Moncurve: a power function with a linear segment near zero.
///
/// Forward decodes (encoded to linear), which is how the sRGB and Rec.709
/// curves are expressed in configs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentWithLinearTransform {
    /// Per-channel gamma [R, G, B, A].
    pub gamma: [f64; 4],
    /// Per-channel offset [R, G, B, A].
    pub offset: [f64; 4],
    /// Negative handling style.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl ExponentWithLinearTransform {
    /// The sRGB piecewise curve (gamma 2.4, offset 0.055).
    pub fn srgb() -> Self {
        Self {
            gamma: [2.4, 2.4, 2.4, 1.0],
            offset: [0.055, 0.055, 0.055, 0.0],
            negative_style: NegativeStyle::Linear,
            direction: TransformDirection::Forward,
        }
    }
}

/// Negative value handling for power functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    /// Clamp negatives to zero.
    #[default]
    Clamp,
    /// Mirror: sign * pow(abs(x), exp).
    Mirror,
    /// Pass through unchanged.
    PassThru,
    /// Continue the linear segment (moncurve only).
    Linear,
}

/// Log transform (lin-to-log or log-to-lin).
#[derive(Debug, Clone, PartialEq)]
pub struct LogTransform {
    /// Base of logarithm (10 or 2).
    pub base: f64,
    /// Direction.
    pub direction: TransformDirection,
}

/// Camera log curve: `log_slope * log(lin_slope * x + lin_offset) + log_offset`
/// above the break, linear below it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCameraTransform {
    /// Log base.
    pub base: f64,
    /// Log side slope per channel.
    pub log_side_slope: [f64; 3],
    /// Log side offset per channel.
    pub log_side_offset: [f64; 3],
    /// Linear side slope per channel.
    pub lin_side_slope: [f64; 3],
    /// Linear side offset per channel.
    pub lin_side_offset: [f64; 3],
    /// Linear side break per channel.
    pub lin_side_break: [f64; 3],
    /// Explicit slope of the linear segment, derived when absent.
    pub linear_slope: Option<[f64; 3]>,
    /// Direction.
    pub direction: TransformDirection,
}

/// File-based transform (LUT, matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransform {
    /// Source file path, possibly containing `$VAR` references.
    pub src: String,
    /// CDL correction ID (for .ccc/.cdl files).
    pub ccc_id: Option<String>,
    /// Interpolation method.
    pub interpolation: Interpolation,
    /// Direction.
    pub direction: TransformDirection,
}

impl FileTransform {
    /// Lower-cased file extension including the dot, e.g. `.spi1d`.
    pub fn extension(&self) -> Option<String> {
        let name = self.src.rsplit(['/', '\\']).next()?;
        let dot = name.rfind('.')?;
        Some(name[dot..].to_ascii_lowercase())
    }
}

/// CDL (ASC Color Decision List) transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlTransform {
    /// Per-channel slope [R, G, B].
    pub slope: [f64; 3],
    /// Per-channel offset [R, G, B].
    pub offset: [f64; 3],
    /// Per-channel power [R, G, B].
    pub power: [f64; 3],
    /// Saturation (1.0 = no change).
    pub saturation: f64,
    /// CDL style.
    pub style: CdlStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// CDL style (order of operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdlStyle {
    /// ASC CDL v1.2 standard (default).
    #[default]
    AscCdl,
    /// No clamping.
    NoClamp,
}

impl Default for CdlTransform {
    fn default() -> Self {
        Self {
            slope: [1.0, 1.0, 1.0],
            offset: [0.0, 0.0, 0.0],
            power: [1.0, 1.0, 1.0],
            saturation: 1.0,
            style: CdlStyle::default(),
            direction: TransformDirection::Forward,
        }
    }
}

/// Range remapping transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTransform {
    /// Input min (None = no clamping).
    pub min_in: Option<f64>,
    /// Input max.
    pub max_in: Option<f64>,
    /// Output min.
    pub min_out: Option<f64>,
    /// Output max.
    pub max_out: Option<f64>,
    /// Style.
    pub style: RangeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// Range transform style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeStyle {
    /// Clamp values to range.
    #[default]
    Clamp,
    /// No clamping, just scale.
    NoClamp,
}

/// Reference to a named color space.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpaceTransform {
    /// Source color space name.
    pub src: String,
    /// Destination color space name.
    pub dst: String,
    /// Skip the conversion when either side is a data space.
    pub data_bypass: bool,
    /// Direction.
    pub direction: TransformDirection,
}

/// Reference to a named look.
#[derive(Debug, Clone, PartialEq)]
pub struct LookTransform {
    /// Source color space.
    pub src: String,
    /// Destination color space.
    pub dst: String,
    /// Look names (comma-separated for multiple).
    pub looks: String,
    /// Direction.
    pub direction: TransformDirection,
}

/// Display/view transform reference.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayViewTransform {
    /// Source color space.
    pub src: String,
    /// Display name.
    pub display: String,
    /// View name.
    pub view: String,
    /// Direction.
    pub direction: TransformDirection,
}

/// Group of chained transforms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupTransform {
    /// Ordered list of transforms.
    pub transforms: Vec<Transform>,
    /// Direction (affects iteration order).
    pub direction: TransformDirection,
}

/// Builtin transform by name (OCIO v2).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinTransform {
    /// Builtin name (e.g., "ACEScct_to_ACES2065-1").
    pub style: String,
    /// Direction.
    pub direction: TransformDirection,
}

/// Inline 1D LUT applied per channel over `[domain_min, domain_max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1dTransform {
    /// Input value mapped to the first entry.
    pub domain_min: f32,
    /// Input value mapped to the last entry.
    pub domain_max: f32,
    /// RGB entries.
    pub values: Vec<[f32; 3]>,
    /// Direction.
    pub direction: TransformDirection,
}

/// Inline 3D LUT on the unit cube, red varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3dTransform {
    /// Grid size per axis.
    pub size: usize,
    /// RGB entries, `size^3` of them.
    pub values: Vec<[f32; 3]>,
    /// Interpolation.
    pub interpolation: Interpolation,
    /// Direction.
    pub direction: TransformDirection,
}
