//! Transform processor for applying color conversions.
//!
//! The processor compiles a chain of transforms into a flat list of
//! primitive operations. References to config objects (color spaces, looks,
//! views, files, builtins) are expanded during compilation, so a processor
//! can be reflected back into a self-contained [`GroupTransform`].
//!
//! # Example
//!
//! ```ignore
//! use vfx_ocio::{Config, Processor};
//!
//! let config = Config::from_file("config.ocio")?;
//! let processor = config.processor("ACEScg", "sRGB - Texture")?;
//!
//! let mut pixels = [[0.18_f32, 0.18, 0.18, 1.0]; 100];
//! processor.apply_rgba(&mut pixels);
//! ```

use std::path::Path;

use glam::DMat4;

use crate::config::Config;
use crate::error::{OcioError, OcioResult};
use crate::transform::*;

const REC709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

// Nesting limit for reference expansion (color space -> look -> color space ...).
const MAX_DEPTH: usize = 32;

/// Optimization level for processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    /// No optimization.
    None,
    /// Lossless optimization only (matrix combination, identity removal).
    #[default]
    Lossless,
    /// Good quality.
    Good,
    /// Best quality.
    Best,
    /// Draft quality.
    Draft,
}

/// Compiled transform processor.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    ops: Vec<ProcessorOp>,
}

/// Primitive operation with its direction already resolved.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ProcessorOp {
    /// 4x4 matrix + offset, row-major.
    Matrix { matrix: [f64; 16], offset: [f64; 4] },
    /// Per-channel power.
    Exponent {
        value: [f64; 4],
        negative_style: NegativeStyle,
    },
    /// Moncurve; `forward` decodes.
    ExponentWithLinear {
        gamma: [f64; 4],
        offset: [f64; 4],
        negative_style: NegativeStyle,
        forward: bool,
    },
    /// Log base conversion; `forward` is lin to log.
    Log { base: f64, forward: bool },
    /// Camera log; `forward` is lin to log.
    LogCamera {
        base: f64,
        log_side_slope: [f64; 3],
        log_side_offset: [f64; 3],
        lin_side_slope: [f64; 3],
        lin_side_offset: [f64; 3],
        lin_side_break: [f64; 3],
        linear_slope: Option<[f64; 3]>,
        forward: bool,
    },
    /// ASC CDL.
    Cdl {
        slope: [f64; 3],
        offset: [f64; 3],
        power: [f64; 3],
        saturation: f64,
        style: CdlStyle,
        forward: bool,
    },
    /// Range remap, bounds already swapped for the inverse.
    Range {
        min_in: Option<f64>,
        max_in: Option<f64>,
        min_out: Option<f64>,
        max_out: Option<f64>,
        clamp: bool,
    },
    /// 1D LUT.
    Lut1d {
        domain_min: f32,
        domain_max: f32,
        values: Vec<[f32; 3]>,
        forward: bool,
    },
    /// 3D LUT.
    Lut3d { size: usize, values: Vec<[f32; 3]> },
}

impl ProcessorOp {
    /// Returns true if this operation is an identity (no-op).
    pub fn is_identity(&self) -> bool {
        const EPS: f64 = 1e-9;
        match self {
            ProcessorOp::Matrix { matrix, offset } => {
                matrix
                    .iter()
                    .zip(MatrixTransform::IDENTITY.iter())
                    .all(|(a, b)| (a - b).abs() < EPS)
                    && offset.iter().all(|v| v.abs() < EPS)
            }
            ProcessorOp::Exponent { value, .. } => value.iter().all(|v| (*v - 1.0).abs() < EPS),
            ProcessorOp::Cdl {
                slope,
                offset,
                power,
                saturation,
                style: CdlStyle::NoClamp,
                ..
            } => {
                slope.iter().all(|v| (*v - 1.0).abs() < EPS)
                    && offset.iter().all(|v| v.abs() < EPS)
                    && power.iter().all(|v| (*v - 1.0).abs() < EPS)
                    && (*saturation - 1.0).abs() < EPS
            }
            ProcessorOp::Range {
                min_in,
                max_in,
                min_out,
                max_out,
                clamp,
            } => !clamp && min_in == min_out && max_in == max_out,
            _ => false,
        }
    }

    /// True if this op has a matrix with an off-diagonal RGB coefficient
    /// larger than `threshold` in magnitude.
    pub fn has_significant_off_diagonal(&self, threshold: f64) -> bool {
        match self {
            ProcessorOp::Matrix { matrix, .. } => (0..3)
                .flat_map(|r| (0..3).map(move |c| (r, c)))
                .filter(|(r, c)| r != c)
                .any(|(r, c)| matrix[r * 4 + c].abs() > threshold),
            _ => false,
        }
    }
}

fn invert_matrix(matrix: &[f64; 16], offset: &[f64; 4]) -> OcioResult<([f64; 16], [f64; 4])> {
    let m = DMat4::from_cols_array(matrix).transpose();
    if m.determinant().abs() < 1e-10 {
        return Err(OcioError::Transform(
            "cannot invert singular matrix (determinant near zero)".into(),
        ));
    }
    let inv = m.inverse();
    let inv_offset = -(inv * glam::DVec4::from_array(*offset));
    Ok((inv.transpose().to_cols_array(), inv_offset.to_array()))
}

#[inline]
fn resolve_direction(own: TransformDirection, outer: TransformDirection) -> TransformDirection {
    if outer == TransformDirection::Inverse {
        own.inverse()
    } else {
        own
    }
}

impl Processor {
    /// Creates a processor from pre-compiled ops.
    pub fn from_ops(ops: Vec<ProcessorOp>) -> Self {
        Self { ops }
    }

    /// Returns the compiled operations.
    pub fn ops(&self) -> &[ProcessorOp] {
        &self.ops
    }

    /// Creates a processor from a context-free transform.
    ///
    /// Transforms that reference config objects fail; file paths are
    /// resolved relative to the current directory.
    pub fn from_transform(transform: &Transform, direction: TransformDirection) -> OcioResult<Self> {
        Self::from_transform_with_opts(transform, direction, OptimizationLevel::default())
    }

    /// Creates a processor from a transform with optimization level.
    pub fn from_transform_with_opts(
        transform: &Transform,
        direction: TransformDirection,
        optimization: OptimizationLevel,
    ) -> OcioResult<Self> {
        let mut processor = Self::default();
        processor.compile(transform, direction, None, 0)?;
        processor.optimize(optimization);
        Ok(processor)
    }

    /// Creates a processor resolving references through `config`.
    pub fn from_transform_in(
        config: &Config,
        transform: &Transform,
        direction: TransformDirection,
        optimization: OptimizationLevel,
    ) -> OcioResult<Self> {
        let mut processor = Self::default();
        processor.compile(transform, direction, Some(config), 0)?;
        processor.optimize(optimization);
        Ok(processor)
    }

    /// Appends the ops of `other` after the ops of `self`.
    pub fn concat(&self, other: &Processor) -> Processor {
        let mut ops = self.ops.clone();
        ops.extend(other.ops.iter().cloned());
        Self { ops }
    }

    /// Returns an optimized copy.
    pub fn optimized(&self, level: OptimizationLevel) -> Processor {
        let mut p = self.clone();
        p.optimize(level);
        p
    }

    /// Applies optimization to the operation chain.
    pub fn optimize(&mut self, level: OptimizationLevel) {
        if level == OptimizationLevel::None {
            return;
        }
        self.ops.retain(|op| !op.is_identity());
        self.combine_matrices();
        self.ops.retain(|op| !op.is_identity());
    }

    /// Combines adjacent matrix operations into single matrix.
    fn combine_matrices(&mut self) {
        if self.ops.len() < 2 {
            return;
        }

        let mut result = Vec::with_capacity(self.ops.len());
        let mut pending: Option<(DMat4, glam::DVec4)> = None;

        for op in self.ops.drain(..) {
            if let ProcessorOp::Matrix { matrix, offset } = &op {
                let m = DMat4::from_cols_array(matrix).transpose();
                let o = glam::DVec4::from_array(*offset);
                pending = Some(match pending.take() {
                    Some((pm, po)) => (m * pm, m * po + o),
                    None => (m, o),
                });
            } else {
                if let Some((m, o)) = pending.take() {
                    result.push(ProcessorOp::Matrix {
                        matrix: m.transpose().to_cols_array(),
                        offset: o.to_array(),
                    });
                }
                result.push(op);
            }
        }
        if let Some((m, o)) = pending {
            result.push(ProcessorOp::Matrix {
                matrix: m.transpose().to_cols_array(),
                offset: o.to_array(),
            });
        }

        self.ops = result;
    }

    /// Compiles a transform into operations.
    pub(crate) fn compile(
        &mut self,
        transform: &Transform,
        direction: TransformDirection,
        ctx: Option<&Config>,
        depth: usize,
    ) -> OcioResult<()> {
        if depth > MAX_DEPTH {
            return Err(OcioError::CircularReference {
                chain: format!("{:?} nested deeper than {MAX_DEPTH}", transform.kind()),
            });
        }
        let dir = resolve_direction(transform.direction(), direction);
        let forward = dir == TransformDirection::Forward;

        match transform {
            Transform::Matrix(m) => {
                let (matrix, offset) = if forward {
                    (m.matrix, m.offset)
                } else {
                    invert_matrix(&m.matrix, &m.offset)?
                };
                self.ops.push(ProcessorOp::Matrix { matrix, offset });
            }

            Transform::Exponent(exp) => {
                let value = if forward {
                    exp.value
                } else {
                    exp.value.map(|v| if v != 0.0 { 1.0 / v } else { 1.0 })
                };
                self.ops.push(ProcessorOp::Exponent {
                    value,
                    negative_style: exp.negative_style,
                });
            }

            Transform::ExponentWithLinear(e) => {
                self.ops.push(ProcessorOp::ExponentWithLinear {
                    gamma: e.gamma,
                    offset: e.offset,
                    negative_style: e.negative_style,
                    forward,
                });
            }

            Transform::Log(log) => {
                self.ops.push(ProcessorOp::Log { base: log.base, forward });
            }

            Transform::LogCamera(lc) => {
                self.ops.push(ProcessorOp::LogCamera {
                    base: lc.base,
                    log_side_slope: lc.log_side_slope,
                    log_side_offset: lc.log_side_offset,
                    lin_side_slope: lc.lin_side_slope,
                    lin_side_offset: lc.lin_side_offset,
                    lin_side_break: lc.lin_side_break,
                    linear_slope: lc.linear_slope,
                    forward,
                });
            }

            Transform::Cdl(cdl) => {
                self.ops.push(ProcessorOp::Cdl {
                    slope: cdl.slope,
                    offset: cdl.offset,
                    power: cdl.power,
                    saturation: cdl.saturation,
                    style: cdl.style,
                    forward,
                });
            }

            Transform::Range(r) => {
                let (min_in, max_in, min_out, max_out) = if forward {
                    (r.min_in, r.max_in, r.min_out, r.max_out)
                } else {
                    (r.min_out, r.max_out, r.min_in, r.max_in)
                };
                self.ops.push(ProcessorOp::Range {
                    min_in,
                    max_in,
                    min_out,
                    max_out,
                    clamp: r.style == RangeStyle::Clamp,
                });
            }

            Transform::Lut1d(lut) => {
                self.ops.push(ProcessorOp::Lut1d {
                    domain_min: lut.domain_min,
                    domain_max: lut.domain_max,
                    values: lut.values.clone(),
                    forward,
                });
            }

            Transform::Lut3d(lut) => {
                if !forward {
                    return Err(OcioError::Transform("3D LUT inversion is not supported".into()));
                }
                if lut.size < 2 || lut.values.len() != lut.size.pow(3) {
                    return Err(OcioError::InvalidTransform {
                        reason: format!("3D LUT of size {} has {} entries", lut.size, lut.values.len()),
                    });
                }
                self.ops.push(ProcessorOp::Lut3d {
                    size: lut.size,
                    values: lut.values.clone(),
                });
            }

            Transform::Group(g) => {
                if resolve_direction(g.direction, direction) == TransformDirection::Forward {
                    for t in &g.transforms {
                        self.compile(t, TransformDirection::Forward, ctx, depth + 1)?;
                    }
                } else {
                    for t in g.transforms.iter().rev() {
                        self.compile(t, TransformDirection::Inverse, ctx, depth + 1)?;
                    }
                }
            }

            Transform::Builtin(bt) => {
                let expanded = crate::builtin_transforms::get_builtin(&bt.style).ok_or_else(|| {
                    OcioError::UnknownBuiltin {
                        name: bt.style.clone(),
                    }
                })?;
                self.compile(&expanded, dir, ctx, depth + 1)?;
            }

            Transform::File(ft) => {
                let path = match ctx {
                    Some(cfg) => cfg.resolve_file(&ft.src)?,
                    None => Path::new(&ft.src).to_path_buf(),
                };
                let loaded = crate::file::load(&path)?;
                self.compile(&loaded, dir, ctx, depth + 1)?;
            }

            Transform::ColorSpace(cst) => {
                let cfg = require_config(ctx, transform)?;
                let (src, dst) = if forward {
                    (cst.src.as_str(), cst.dst.as_str())
                } else {
                    (cst.dst.as_str(), cst.src.as_str())
                };
                let expanded = cfg.color_space_conversion(src, dst, cst.data_bypass)?;
                self.compile(&expanded, TransformDirection::Forward, ctx, depth + 1)?;
            }

            Transform::Look(lt) => {
                let cfg = require_config(ctx, transform)?;
                let expanded = cfg.look_conversion(&lt.src, &lt.dst, &lt.looks)?;
                self.compile(&expanded, dir, ctx, depth + 1)?;
            }

            Transform::DisplayView(dv) => {
                let cfg = require_config(ctx, transform)?;
                let expanded = cfg.display_view_conversion(&dv.src, &dv.display, &dv.view)?;
                self.compile(&expanded, dir, ctx, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Reflects the op list into a forward group of primitive transforms.
    pub fn to_group_transform(&self) -> GroupTransform {
        let dir = |forward: bool| {
            if forward {
                TransformDirection::Forward
            } else {
                TransformDirection::Inverse
            }
        };
        let transforms = self
            .ops
            .iter()
            .map(|op| match op {
                ProcessorOp::Matrix { matrix, offset } => Transform::Matrix(MatrixTransform {
                    matrix: *matrix,
                    offset: *offset,
                    direction: TransformDirection::Forward,
                }),
                ProcessorOp::Exponent { value, negative_style } => {
                    Transform::Exponent(ExponentTransform {
                        value: *value,
                        negative_style: *negative_style,
                        direction: TransformDirection::Forward,
                    })
                }
                ProcessorOp::ExponentWithLinear {
                    gamma,
                    offset,
                    negative_style,
                    forward,
                } => Transform::ExponentWithLinear(ExponentWithLinearTransform {
                    gamma: *gamma,
                    offset: *offset,
                    negative_style: *negative_style,
                    direction: dir(*forward),
                }),
                ProcessorOp::Log { base, forward } => Transform::Log(LogTransform {
                    base: *base,
                    direction: dir(*forward),
                }),
                ProcessorOp::LogCamera {
                    base,
                    log_side_slope,
                    log_side_offset,
                    lin_side_slope,
                    lin_side_offset,
                    lin_side_break,
                    linear_slope,
                    forward,
                } => Transform::LogCamera(LogCameraTransform {
                    base: *base,
                    log_side_slope: *log_side_slope,
                    log_side_offset: *log_side_offset,
                    lin_side_slope: *lin_side_slope,
                    lin_side_offset: *lin_side_offset,
                    lin_side_break: *lin_side_break,
                    linear_slope: *linear_slope,
                    direction: dir(*forward),
                }),
                ProcessorOp::Cdl {
                    slope,
                    offset,
                    power,
                    saturation,
                    style,
                    forward,
                } => Transform::Cdl(CdlTransform {
                    slope: *slope,
                    offset: *offset,
                    power: *power,
                    saturation: *saturation,
                    style: *style,
                    direction: dir(*forward),
                }),
                ProcessorOp::Range {
                    min_in,
                    max_in,
                    min_out,
                    max_out,
                    clamp,
                } => Transform::Range(RangeTransform {
                    min_in: *min_in,
                    max_in: *max_in,
                    min_out: *min_out,
                    max_out: *max_out,
                    style: if *clamp { RangeStyle::Clamp } else { RangeStyle::NoClamp },
                    direction: TransformDirection::Forward,
                }),
                ProcessorOp::Lut1d {
                    domain_min,
                    domain_max,
                    values,
                    forward,
                } => Transform::Lut1d(Lut1dTransform {
                    domain_min: *domain_min,
                    domain_max: *domain_max,
                    values: values.clone(),
                    direction: dir(*forward),
                }),
                ProcessorOp::Lut3d { size, values } => Transform::Lut3d(Lut3dTransform {
                    size: *size,
                    values: values.clone(),
                    interpolation: Interpolation::Linear,
                    direction: TransformDirection::Forward,
                }),
            })
            .collect();
        GroupTransform {
            transforms,
            direction: TransformDirection::Forward,
        }
    }

    /// Applies the transform to RGB pixels in-place.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        for pixel in pixels.iter_mut() {
            let mut v = [pixel[0] as f64, pixel[1] as f64, pixel[2] as f64, 1.0];
            self.apply_one(&mut v);
            *pixel = [v[0] as f32, v[1] as f32, v[2] as f32];
        }
    }

    /// Applies the transform to interleaved RGBA pixels in-place.
    pub fn apply_rgba(&self, pixels: &mut [[f32; 4]]) {
        for pixel in pixels.iter_mut() {
            let mut v = pixel.map(|c| c as f64);
            self.apply_one(&mut v);
            *pixel = v.map(|c| c as f32);
        }
    }

    fn apply_one(&self, px: &mut [f64; 4]) {
        for op in &self.ops {
            match op {
                ProcessorOp::Matrix { matrix, offset } => {
                    let v = *px;
                    for (r, out) in px.iter_mut().enumerate() {
                        *out = matrix[r * 4] * v[0]
                            + matrix[r * 4 + 1] * v[1]
                            + matrix[r * 4 + 2] * v[2]
                            + matrix[r * 4 + 3] * v[3]
                            + offset[r];
                    }
                }
                ProcessorOp::Exponent { value, negative_style } => {
                    for (c, e) in px.iter_mut().zip(value) {
                        *c = power(*c, *e, *negative_style);
                    }
                }
                ProcessorOp::ExponentWithLinear {
                    gamma,
                    offset,
                    negative_style,
                    forward,
                } => {
                    for i in 0..4 {
                        px[i] = moncurve(px[i], gamma[i], offset[i], *negative_style, *forward);
                    }
                }
                ProcessorOp::Log { base, forward } => {
                    for c in px.iter_mut().take(3) {
                        *c = if *forward {
                            c.max(f64::MIN_POSITIVE).log(*base)
                        } else {
                            base.powf(*c)
                        };
                    }
                }
                ProcessorOp::LogCamera {
                    base,
                    log_side_slope,
                    log_side_offset,
                    lin_side_slope,
                    lin_side_offset,
                    lin_side_break,
                    linear_slope,
                    forward,
                } => {
                    for i in 0..3 {
                        let curve = CameraCurve::new(
                            *base,
                            log_side_slope[i],
                            log_side_offset[i],
                            lin_side_slope[i],
                            lin_side_offset[i],
                            lin_side_break[i],
                            linear_slope.map(|s| s[i]),
                        );
                        px[i] = if *forward { curve.encode(px[i]) } else { curve.decode(px[i]) };
                    }
                }
                ProcessorOp::Cdl {
                    slope,
                    offset,
                    power: pw,
                    saturation,
                    style,
                    forward,
                } => apply_cdl(px, slope, offset, pw, *saturation, *style, *forward),
                ProcessorOp::Range {
                    min_in,
                    max_in,
                    min_out,
                    max_out,
                    clamp,
                } => {
                    for c in px.iter_mut().take(3) {
                        *c = apply_range(*c, *min_in, *max_in, *min_out, *max_out, *clamp);
                    }
                }
                ProcessorOp::Lut1d {
                    domain_min,
                    domain_max,
                    values,
                    forward,
                } => {
                    for i in 0..3 {
                        px[i] = if *forward {
                            lut1d_eval(values, i, *domain_min as f64, *domain_max as f64, px[i])
                        } else {
                            lut1d_invert(values, i, *domain_min as f64, *domain_max as f64, px[i])
                        };
                    }
                }
                ProcessorOp::Lut3d { size, values } => {
                    let out = lut3d_trilinear(values, *size, [px[0], px[1], px[2]]);
                    px[..3].copy_from_slice(&out);
                }
            }
        }
    }

    /// Returns the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Checks if processor has any operations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Checks if processor is identity (no ops after optimization).
    pub fn is_identity(&self) -> bool {
        self.optimized(OptimizationLevel::Lossless).ops.is_empty()
    }
}

fn require_config<'a>(ctx: Option<&'a Config>, t: &Transform) -> OcioResult<&'a Config> {
    ctx.ok_or_else(|| OcioError::InvalidTransform {
        reason: format!("{} needs a config to be resolved", t.kind().tag()),
    })
}

fn power(x: f64, e: f64, style: NegativeStyle) -> f64 {
    if e == 1.0 {
        return x;
    }
    match style {
        NegativeStyle::Clamp => x.max(0.0).powf(e),
        NegativeStyle::Mirror | NegativeStyle::Linear => x.signum() * x.abs().powf(e),
        NegativeStyle::PassThru => {
            if x < 0.0 {
                x
            } else {
                x.powf(e)
            }
        }
    }
}

fn moncurve(x: f64, gamma: f64, offset: f64, style: NegativeStyle, decode: bool) -> f64 {
    if gamma <= 1.0 || offset <= 0.0 {
        return power(x, if decode { gamma } else { 1.0 / gamma }, style);
    }
    if style == NegativeStyle::Mirror && x < 0.0 {
        return -moncurve(-x, gamma, offset, style, decode);
    }
    let enc_break = offset / (gamma - 1.0);
    let lin_break = (offset * gamma / ((gamma - 1.0) * (1.0 + offset))).powf(gamma);
    let slope = lin_break / enc_break;
    if decode {
        if x <= enc_break {
            x * slope
        } else {
            ((x + offset) / (1.0 + offset)).powf(gamma)
        }
    } else if x <= lin_break {
        x / slope
    } else {
        (1.0 + offset) * x.powf(1.0 / gamma) - offset
    }
}

struct CameraCurve {
    base: f64,
    log_slope: f64,
    log_offset: f64,
    lin_slope: f64,
    lin_offset: f64,
    brk: f64,
    linear_slope: f64,
    linear_offset: f64,
}

impl CameraCurve {
    fn new(
        base: f64,
        log_slope: f64,
        log_offset: f64,
        lin_slope: f64,
        lin_offset: f64,
        brk: f64,
        linear_slope: Option<f64>,
    ) -> Self {
        let log_at_break = log_slope * (lin_slope * brk + lin_offset).log(base) + log_offset;
        let linear_slope = linear_slope
            .unwrap_or(log_slope * lin_slope / ((lin_slope * brk + lin_offset) * base.ln()));
        Self {
            base,
            log_slope,
            log_offset,
            lin_slope,
            lin_offset,
            brk,
            linear_slope,
            linear_offset: log_at_break - linear_slope * brk,
        }
    }

    fn encode(&self, x: f64) -> f64 {
        if x > self.brk {
            self.log_slope * (self.lin_slope * x + self.lin_offset).log(self.base) + self.log_offset
        } else {
            self.linear_slope * x + self.linear_offset
        }
    }

    fn decode(&self, y: f64) -> f64 {
        let log_break = self.linear_slope * self.brk + self.linear_offset;
        if y > log_break {
            (self.base.powf((y - self.log_offset) / self.log_slope) - self.lin_offset) / self.lin_slope
        } else {
            (y - self.linear_offset) / self.linear_slope
        }
    }
}

fn apply_cdl(
    px: &mut [f64; 4],
    slope: &[f64; 3],
    offset: &[f64; 3],
    pw: &[f64; 3],
    saturation: f64,
    style: CdlStyle,
    forward: bool,
) {
    let clamp = style == CdlStyle::AscCdl;
    let sat = |px: &mut [f64; 4], s: f64| {
        let luma = REC709_LUMA[0] * px[0] + REC709_LUMA[1] * px[1] + REC709_LUMA[2] * px[2];
        for c in px.iter_mut().take(3) {
            *c = luma + s * (*c - luma);
        }
    };
    if forward {
        for i in 0..3 {
            let v = px[i] * slope[i] + offset[i];
            px[i] = if clamp {
                v.max(0.0).powf(pw[i])
            } else {
                v.signum() * v.abs().powf(pw[i])
            };
        }
        sat(px, saturation);
        if clamp {
            for c in px.iter_mut().take(3) {
                *c = c.clamp(0.0, 1.0);
            }
        }
    } else {
        if clamp {
            for c in px.iter_mut().take(3) {
                *c = c.clamp(0.0, 1.0);
            }
        }
        if saturation != 0.0 {
            sat(px, 1.0 / saturation);
        }
        for i in 0..3 {
            let v = if clamp {
                px[i].max(0.0).powf(1.0 / pw[i])
            } else {
                px[i].signum() * px[i].abs().powf(1.0 / pw[i])
            };
            px[i] = if slope[i] != 0.0 { (v - offset[i]) / slope[i] } else { 0.0 };
        }
    }
}

fn apply_range(
    x: f64,
    min_in: Option<f64>,
    max_in: Option<f64>,
    min_out: Option<f64>,
    max_out: Option<f64>,
    clamp: bool,
) -> f64 {
    let mut v = match (min_in, max_in, min_out, max_out) {
        (Some(a), Some(b), Some(c), Some(d)) if (b - a).abs() > f64::EPSILON => {
            let scale = (d - c) / (b - a);
            (x - a) * scale + c
        }
        (Some(a), _, Some(c), _) => x - a + c,
        (_, Some(b), _, Some(d)) => x - b + d,
        _ => x,
    };
    if clamp {
        if let Some(lo) = min_out {
            v = v.max(lo);
        }
        if let Some(hi) = max_out {
            v = v.min(hi);
        }
    }
    v
}

fn lut1d_eval(values: &[[f32; 3]], ch: usize, min: f64, max: f64, x: f64) -> f64 {
    let n = values.len();
    if n == 0 {
        return x;
    }
    if n == 1 {
        return values[0][ch] as f64;
    }
    let t = ((x - min) / (max - min)).clamp(0.0, 1.0) * (n - 1) as f64;
    let i = (t.floor() as usize).min(n - 2);
    let f = t - i as f64;
    let a = values[i][ch] as f64;
    let b = values[i + 1][ch] as f64;
    a + (b - a) * f
}

fn lut1d_invert(values: &[[f32; 3]], ch: usize, min: f64, max: f64, y: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return y;
    }
    let at = |i: usize| values[i][ch] as f64;
    let increasing = at(n - 1) >= at(0);
    let key = |i: usize| if increasing { at(i) } else { -at(i) };
    let target = if increasing { y } else { -y };

    if target <= key(0) {
        return min;
    }
    if target >= key(n - 1) {
        return max;
    }
    // first index whose value exceeds the target
    let (mut lo, mut hi) = (0usize, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if key(mid) <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let (a, b) = (key(lo), key(hi));
    let f = if (b - a).abs() > f64::EPSILON { (target - a) / (b - a) } else { 0.0 };
    min + (lo as f64 + f) / (n - 1) as f64 * (max - min)
}

fn lut3d_trilinear(values: &[[f32; 3]], size: usize, rgb: [f64; 3]) -> [f64; 3] {
    let scale = (size - 1) as f64;
    let mut base = [0usize; 3];
    let mut frac = [0.0f64; 3];
    for i in 0..3 {
        let t = rgb[i].clamp(0.0, 1.0) * scale;
        base[i] = (t.floor() as usize).min(size - 2);
        frac[i] = t - base[i] as f64;
    }
    let idx = |r: usize, g: usize, b: usize| r + g * size + b * size * size;
    let mut out = [0.0f64; 3];
    for (dr, dg, db) in [
        (0, 0, 0),
        (1, 0, 0),
        (0, 1, 0),
        (1, 1, 0),
        (0, 0, 1),
        (1, 0, 1),
        (0, 1, 1),
        (1, 1, 1),
    ] {
        let w = (if dr == 1 { frac[0] } else { 1.0 - frac[0] })
            * (if dg == 1 { frac[1] } else { 1.0 - frac[1] })
            * (if db == 1 { frac[2] } else { 1.0 - frac[2] });
        let v = values[idx(base[0] + dr, base[1] + dg, base[2] + db)];
        for c in 0..3 {
            out[c] += w * v[c] as f64;
        }
    }
    out
}
