//! Reading and writing OCIO YAML configs.
//!
//! Parsing goes through `serde_yaml::Value` first. Verbatim tags are
//! rewritten to local ones, then structural tags such as
//! `!<ColorSpace>` or `!<View>` are dropped, while transform tags are kept
//! and decoded by [`transform_from_value`]. The remaining tree maps onto
//! plain serde structs.
//!
//! Writing runs the same path backwards and restores the verbatim
//! `!<Tag>` spelling OCIO expects.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

use crate::colorspace::{BitDepth, ColorSpace, Encoding, ReferenceSpaceType};
use crate::config::{Config, ConfigVersion};
use crate::display::{Display, View, ViewTransform};
use crate::error::{OcioError, OcioResult};
use crate::file_rules::{FileRule, FileRuleKind, FileRules};
use crate::look::Look;
use crate::named_transform::NamedTransform;
use crate::transform::*;
use crate::viewing_rules::{ViewingRule, ViewingRules};

const STRUCTURAL_TAGS: &[&str] = &[
    "ColorSpace",
    "View",
    "Views",
    "Rule",
    "Look",
    "ViewTransform",
    "NamedTransform",
];

static VERBATIM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!<([A-Za-z0-9_]+)>").unwrap_or_else(|_| unreachable!()));

static SHORT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(^|[\s\[,])!(ColorSpace|Views|View|Rule|Look|ViewTransform|NamedTransform|[A-Za-z0-9]+Transform)\b",
    )
    .unwrap_or_else(|_| unreachable!())
});

// ============================================================================
// Raw YAML structures
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawConfig {
    ocio_profile_version: Option<Value>,
    environment: Option<Mapping>,
    search_path: Option<StringOrList>,
    strictparsing: Option<bool>,
    family_separator: Option<String>,
    luma: Option<Vec<f64>>,
    name: Option<String>,
    description: Option<String>,
    roles: Option<Mapping>,
    file_rules: Option<Vec<RawFileRule>>,
    viewing_rules: Option<Vec<RawViewingRule>>,
    shared_views: Option<Vec<RawView>>,
    displays: Option<Mapping>,
    virtual_display: Option<Vec<RawDisplayEntry>>,
    active_displays: Option<StringOrList>,
    active_views: Option<StringOrList>,
    inactive_colorspaces: Option<StringOrList>,
    looks: Option<Vec<RawLook>>,
    default_view_transform: Option<String>,
    view_transforms: Option<Vec<RawViewTransform>>,
    display_colorspaces: Option<Vec<RawColorSpace>>,
    colorspaces: Option<Vec<RawColorSpace>>,
    named_transforms: Option<Vec<RawNamedTransform>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_vec(self, sep: char) -> Vec<String> {
        match self {
            Self::One(s) => s
                .split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
            Self::Many(v) => v,
        }
    }

    fn from_vec(v: &[String]) -> Option<Self> {
        match v {
            [] => None,
            [one] => Some(Self::One(one.clone())),
            many => Some(Self::Many(many.to_vec())),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawColorSpace {
    name: String,
    aliases: Option<Vec<String>>,
    family: Option<String>,
    equalitygroup: Option<String>,
    bitdepth: Option<String>,
    description: Option<String>,
    isdata: Option<bool>,
    categories: Option<Vec<String>>,
    encoding: Option<String>,
    to_reference: Option<Value>,
    from_reference: Option<Value>,
    to_scene_reference: Option<Value>,
    from_scene_reference: Option<Value>,
    to_display_reference: Option<Value>,
    from_display_reference: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawView {
    name: String,
    view_transform: Option<String>,
    display_colorspace: Option<String>,
    colorspace: Option<String>,
    looks: Option<String>,
    rule: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDisplayEntry {
    Shared(Vec<String>),
    View(RawView),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLook {
    name: String,
    process_space: Option<String>,
    description: Option<String>,
    transform: Option<Value>,
    inverse_transform: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawViewTransform {
    name: String,
    family: Option<String>,
    description: Option<String>,
    categories: Option<Vec<String>>,
    to_scene_reference: Option<Value>,
    from_scene_reference: Option<Value>,
    to_display_reference: Option<Value>,
    from_display_reference: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawNamedTransform {
    name: String,
    aliases: Option<Vec<String>>,
    family: Option<String>,
    description: Option<String>,
    categories: Option<Vec<String>>,
    encoding: Option<String>,
    transform: Option<Value>,
    inverse_transform: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawFileRule {
    name: String,
    colorspace: Option<String>,
    pattern: Option<String>,
    extension: Option<String>,
    regex: Option<String>,
    custom: Option<Mapping>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawViewingRule {
    name: String,
    colorspaces: Option<StringOrList>,
    encodings: Option<StringOrList>,
    custom: Option<Mapping>,
}

// ============================================================================
// Raw transform bodies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Components {
    One(f64),
    Many(Vec<f64>),
}

impl Components {
    /// Expands to `N` values; a 3-vector gains `fill` as its fourth.
    fn expand<const N: usize>(&self, fill: f64, what: &str) -> OcioResult<[f64; N]> {
        let mut out = [fill; N];
        match self {
            Self::One(v) => out.iter_mut().take(N.min(3)).for_each(|o| *o = *v),
            Self::Many(v) if v.len() == N => out.copy_from_slice(v),
            Self::Many(v) if N == 4 && v.len() == 3 => out[..3].copy_from_slice(v),
            Self::Many(v) => {
                return Err(OcioError::InvalidTransform {
                    reason: format!("{what}: expected {N} values, found {}", v.len()),
                });
            }
        }
        Ok(out)
    }

    fn collapse(values: &[f64], fill: f64) -> Self {
        let rgb_equal = values.iter().take(3).all(|v| *v == values[0]);
        let alpha_default = values.len() < 4 || values[3] == fill;
        if rgb_equal && alpha_default {
            Self::One(values[0])
        } else {
            Self::Many(values.to_vec())
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawMatrix {
    matrix: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawExponent {
    value: Option<Components>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawExponentWithLinear {
    gamma: Option<Components>,
    offset: Option<Components>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLog {
    base: Option<f64>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLogCamera {
    base: Option<f64>,
    log_side_slope: Option<Components>,
    log_side_offset: Option<Components>,
    lin_side_slope: Option<Components>,
    lin_side_offset: Option<Components>,
    lin_side_break: Option<Components>,
    linear_slope: Option<Components>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawCdl {
    slope: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    power: Option<Vec<f64>>,
    sat: Option<f64>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawRange {
    min_in_value: Option<f64>,
    max_in_value: Option<f64>,
    min_out_value: Option<f64>,
    max_out_value: Option<f64>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawFile {
    src: String,
    cccid: Option<String>,
    interpolation: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawColorSpaceRef {
    src: String,
    dst: String,
    data_bypass: Option<bool>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLookRef {
    src: String,
    dst: String,
    looks: String,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawDisplayViewRef {
    src: String,
    display: String,
    view: String,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawBuiltin {
    style: String,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawGroup {
    children: Vec<Value>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLut1d {
    domain: Option<Vec<f32>>,
    values: Vec<f32>,
    direction: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLut3d {
    size: usize,
    values: Vec<f32>,
    interpolation: Option<String>,
    direction: Option<String>,
}

// ============================================================================
// Transform decoding
// ============================================================================

fn invalid(reason: impl Into<String>) -> OcioError {
    OcioError::InvalidTransform { reason: reason.into() }
}

fn body<T: DeserializeOwned>(value: &Value) -> OcioResult<T> {
    let value = match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other.clone(),
    };
    Ok(serde_yaml::from_value(value)?)
}

fn parse_direction(d: Option<&str>) -> OcioResult<TransformDirection> {
    match d.map(str::to_ascii_lowercase).as_deref() {
        None | Some("forward") => Ok(TransformDirection::Forward),
        Some("inverse") => Ok(TransformDirection::Inverse),
        Some(other) => Err(invalid(format!("unknown direction '{other}'"))),
    }
}

fn write_direction(d: TransformDirection) -> Option<String> {
    (d == TransformDirection::Inverse).then(|| "inverse".to_string())
}

fn parse_negative_style(s: Option<&str>, default: NegativeStyle) -> OcioResult<NegativeStyle> {
    match s.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("clamp") => Ok(NegativeStyle::Clamp),
        Some("mirror") => Ok(NegativeStyle::Mirror),
        Some("pass_thru") => Ok(NegativeStyle::PassThru),
        Some("linear") => Ok(NegativeStyle::Linear),
        Some(other) => Err(invalid(format!("unknown negative style '{other}'"))),
    }
}

fn write_negative_style(s: NegativeStyle, default: NegativeStyle) -> Option<String> {
    if s == default {
        return None;
    }
    Some(
        match s {
            NegativeStyle::Clamp => "clamp",
            NegativeStyle::Mirror => "mirror",
            NegativeStyle::PassThru => "pass_thru",
            NegativeStyle::Linear => "linear",
        }
        .to_string(),
    )
}

fn parse_interpolation(s: Option<&str>) -> OcioResult<Interpolation> {
    match s.map(str::to_ascii_lowercase).as_deref() {
        None | Some("linear") | Some("default") => Ok(Interpolation::Linear),
        Some("nearest") => Ok(Interpolation::Nearest),
        Some("tetrahedral") => Ok(Interpolation::Tetrahedral),
        Some("best") => Ok(Interpolation::Best),
        Some(other) => Err(invalid(format!("unknown interpolation '{other}'"))),
    }
}

fn write_interpolation(i: Interpolation) -> Option<String> {
    match i {
        Interpolation::Linear => None,
        Interpolation::Nearest => Some("nearest".into()),
        Interpolation::Tetrahedral => Some("tetrahedral".into()),
        Interpolation::Best => Some("best".into()),
    }
}

fn fixed<const N: usize>(v: Option<Vec<f64>>, default: [f64; N], what: &str) -> OcioResult<[f64; N]> {
    match v {
        None => Ok(default),
        Some(v) => v
            .try_into()
            .map_err(|v: Vec<f64>| invalid(format!("{what}: expected {N} values, found {}", v.len()))),
    }
}

fn rgb_triples(values: Vec<f32>, what: &str) -> OcioResult<Vec<[f32; 3]>> {
    if values.len() % 3 != 0 {
        return Err(invalid(format!("{what}: value count is not a multiple of 3")));
    }
    Ok(values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Decodes a transform node: a tagged transform or a plain sequence,
/// which is read as a group.
pub fn transform_from_value(value: &Value) -> OcioResult<Transform> {
    match value {
        Value::Sequence(items) => Ok(Transform::group(
            items.iter().map(transform_from_value).collect::<OcioResult<_>>()?,
        )),
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            decode_tagged(tag.trim_start_matches('!'), &tagged.value)
        }
        other => Err(invalid(format!("expected a tagged transform, found {other:?}"))),
    }
}

fn decode_tagged(tag: &str, value: &Value) -> OcioResult<Transform> {
    let t = match tag {
        "MatrixTransform" => {
            let raw: RawMatrix = body(value)?;
            let matrix = match raw.matrix {
                Some(m) if m.len() == 9 => {
                    let mut out = MatrixTransform::IDENTITY;
                    for r in 0..3 {
                        for c in 0..3 {
                            out[r * 4 + c] = m[r * 3 + c];
                        }
                    }
                    out
                }
                other => fixed(other, MatrixTransform::IDENTITY, "matrix")?,
            };
            let offset = match raw.offset {
                Some(o) if o.len() == 3 => [o[0], o[1], o[2], 0.0],
                other => fixed(other, [0.0; 4], "offset")?,
            };
            Transform::Matrix(MatrixTransform {
                matrix,
                offset,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "ExponentTransform" => {
            let raw: RawExponent = body(value)?;
            Transform::Exponent(ExponentTransform {
                value: match raw.value {
                    Some(v) => v.expand::<4>(1.0, "value")?,
                    None => [1.0; 4],
                },
                negative_style: parse_negative_style(raw.style.as_deref(), NegativeStyle::Clamp)?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "ExponentWithLinearTransform" => {
            let raw: RawExponentWithLinear = body(value)?;
            let gamma = raw.gamma.ok_or_else(|| invalid("ExponentWithLinearTransform: missing gamma"))?;
            let offset = raw.offset.ok_or_else(|| invalid("ExponentWithLinearTransform: missing offset"))?;
            Transform::ExponentWithLinear(ExponentWithLinearTransform {
                gamma: gamma.expand::<4>(1.0, "gamma")?,
                offset: offset.expand::<4>(0.0, "offset")?,
                negative_style: parse_negative_style(raw.style.as_deref(), NegativeStyle::Linear)?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "LogTransform" => {
            let raw: RawLog = body(value)?;
            Transform::Log(LogTransform {
                base: raw.base.unwrap_or(2.0),
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "LogCameraTransform" => {
            let raw: RawLogCamera = body(value)?;
            let get = |c: &Option<Components>, default: f64, what: &str| -> OcioResult<[f64; 3]> {
                match c {
                    Some(c) => c.expand::<3>(default, what),
                    None => Ok([default; 3]),
                }
            };
            let lin_side_break = raw
                .lin_side_break
                .as_ref()
                .ok_or_else(|| invalid("LogCameraTransform: missing lin_side_break"))?
                .expand::<3>(0.0, "lin_side_break")?;
            Transform::LogCamera(LogCameraTransform {
                base: raw.base.unwrap_or(2.0),
                log_side_slope: get(&raw.log_side_slope, 1.0, "log_side_slope")?,
                log_side_offset: get(&raw.log_side_offset, 0.0, "log_side_offset")?,
                lin_side_slope: get(&raw.lin_side_slope, 1.0, "lin_side_slope")?,
                lin_side_offset: get(&raw.lin_side_offset, 0.0, "lin_side_offset")?,
                lin_side_break,
                linear_slope: raw
                    .linear_slope
                    .as_ref()
                    .map(|c| c.expand::<3>(1.0, "linear_slope"))
                    .transpose()?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "CDLTransform" => {
            let raw: RawCdl = body(value)?;
            Transform::Cdl(CdlTransform {
                slope: fixed(raw.slope, [1.0; 3], "slope")?,
                offset: fixed(raw.offset, [0.0; 3], "offset")?,
                power: fixed(raw.power, [1.0; 3], "power")?,
                saturation: raw.sat.unwrap_or(1.0),
                style: match raw.style.as_deref().map(str::to_ascii_lowercase).as_deref() {
                    None | Some("asc") => CdlStyle::AscCdl,
                    Some("noclamp") => CdlStyle::NoClamp,
                    Some(other) => return Err(invalid(format!("unknown CDL style '{other}'"))),
                },
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "RangeTransform" => {
            let raw: RawRange = body(value)?;
            Transform::Range(RangeTransform {
                min_in: raw.min_in_value,
                max_in: raw.max_in_value,
                min_out: raw.min_out_value,
                max_out: raw.max_out_value,
                style: match raw.style.as_deref().map(str::to_ascii_lowercase).as_deref() {
                    None | Some("clamp") => RangeStyle::Clamp,
                    Some("noclamp") => RangeStyle::NoClamp,
                    Some(other) => return Err(invalid(format!("unknown range style '{other}'"))),
                },
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "FileTransform" => {
            let raw: RawFile = body(value)?;
            Transform::File(FileTransform {
                src: raw.src,
                ccc_id: raw.cccid.filter(|s| !s.is_empty()),
                interpolation: parse_interpolation(raw.interpolation.as_deref())?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "ColorSpaceTransform" => {
            let raw: RawColorSpaceRef = body(value)?;
            Transform::ColorSpace(ColorSpaceTransform {
                src: raw.src,
                dst: raw.dst,
                data_bypass: raw.data_bypass.unwrap_or(true),
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "LookTransform" => {
            let raw: RawLookRef = body(value)?;
            Transform::Look(LookTransform {
                src: raw.src,
                dst: raw.dst,
                looks: raw.looks,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "DisplayViewTransform" => {
            let raw: RawDisplayViewRef = body(value)?;
            Transform::DisplayView(DisplayViewTransform {
                src: raw.src,
                display: raw.display,
                view: raw.view,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "BuiltinTransform" => {
            let raw: RawBuiltin = body(value)?;
            Transform::Builtin(BuiltinTransform {
                style: raw.style,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "GroupTransform" => {
            let raw: RawGroup = body(value)?;
            Transform::Group(GroupTransform {
                transforms: raw.children.iter().map(transform_from_value).collect::<OcioResult<_>>()?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "Lut1DTransform" => {
            let raw: RawLut1d = body(value)?;
            let (domain_min, domain_max) = match raw.domain.as_deref() {
                None => (0.0, 1.0),
                Some([lo, hi]) => (*lo, *hi),
                Some(_) => return Err(invalid("Lut1DTransform: domain needs two values")),
            };
            Transform::Lut1d(Lut1dTransform {
                domain_min,
                domain_max,
                values: rgb_triples(raw.values, "Lut1DTransform")?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        "Lut3DTransform" => {
            let raw: RawLut3d = body(value)?;
            let values = rgb_triples(raw.values, "Lut3DTransform")?;
            if values.len() != raw.size.pow(3) {
                return Err(invalid(format!(
                    "Lut3DTransform: size {} needs {} entries, found {}",
                    raw.size,
                    raw.size.pow(3),
                    values.len()
                )));
            }
            Transform::Lut3d(Lut3dTransform {
                size: raw.size,
                values,
                interpolation: parse_interpolation(raw.interpolation.as_deref())?,
                direction: parse_direction(raw.direction.as_deref())?,
            })
        }
        other => return Err(invalid(format!("unknown transform tag '!<{other}>'"))),
    };
    Ok(t)
}

// ============================================================================
// Transform encoding
// ============================================================================

fn tagged<T: Serialize>(tag: &str, body: &T) -> OcioResult<Value> {
    Ok(Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value: serde_yaml::to_value(body)?,
    })))
}

/// Encodes a transform as a tagged YAML node.
pub fn transform_to_value(t: &Transform) -> OcioResult<Value> {
    let tag = t.kind().tag();
    match t {
        Transform::Matrix(m) => {
            let offset = m.offset.iter().any(|v| *v != 0.0).then(|| m.offset.to_vec());
            tagged(tag, &RawMatrix {
                matrix: Some(m.matrix.to_vec()),
                offset,
                direction: write_direction(m.direction),
            })
        }
        Transform::Exponent(e) => tagged(tag, &RawExponent {
            value: Some(Components::collapse(&e.value, 1.0)),
            style: write_negative_style(e.negative_style, NegativeStyle::Clamp),
            direction: write_direction(e.direction),
        }),
        Transform::ExponentWithLinear(e) => tagged(tag, &RawExponentWithLinear {
            gamma: Some(Components::collapse(&e.gamma, 1.0)),
            offset: Some(Components::collapse(&e.offset, 0.0)),
            style: write_negative_style(e.negative_style, NegativeStyle::Linear),
            direction: write_direction(e.direction),
        }),
        Transform::Log(l) => tagged(tag, &RawLog {
            base: Some(l.base),
            direction: write_direction(l.direction),
        }),
        Transform::LogCamera(l) => tagged(tag, &RawLogCamera {
            base: Some(l.base),
            log_side_slope: Some(Components::collapse(&l.log_side_slope, 1.0)),
            log_side_offset: Some(Components::collapse(&l.log_side_offset, 0.0)),
            lin_side_slope: Some(Components::collapse(&l.lin_side_slope, 1.0)),
            lin_side_offset: Some(Components::collapse(&l.lin_side_offset, 0.0)),
            lin_side_break: Some(Components::collapse(&l.lin_side_break, 0.0)),
            linear_slope: l.linear_slope.map(|s| Components::collapse(&s, 1.0)),
            direction: write_direction(l.direction),
        }),
        Transform::Cdl(c) => tagged(tag, &RawCdl {
            slope: Some(c.slope.to_vec()),
            offset: Some(c.offset.to_vec()),
            power: Some(c.power.to_vec()),
            sat: Some(c.saturation),
            style: (c.style == CdlStyle::NoClamp).then(|| "noclamp".to_string()),
            direction: write_direction(c.direction),
        }),
        Transform::Range(r) => tagged(tag, &RawRange {
            min_in_value: r.min_in,
            max_in_value: r.max_in,
            min_out_value: r.min_out,
            max_out_value: r.max_out,
            style: (r.style == RangeStyle::NoClamp).then(|| "noClamp".to_string()),
            direction: write_direction(r.direction),
        }),
        Transform::File(f) => tagged(tag, &RawFile {
            src: f.src.clone(),
            cccid: f.ccc_id.clone(),
            interpolation: write_interpolation(f.interpolation),
            direction: write_direction(f.direction),
        }),
        Transform::ColorSpace(c) => tagged(tag, &RawColorSpaceRef {
            src: c.src.clone(),
            dst: c.dst.clone(),
            data_bypass: (!c.data_bypass).then_some(false),
            direction: write_direction(c.direction),
        }),
        Transform::Look(l) => tagged(tag, &RawLookRef {
            src: l.src.clone(),
            dst: l.dst.clone(),
            looks: l.looks.clone(),
            direction: write_direction(l.direction),
        }),
        Transform::DisplayView(d) => tagged(tag, &RawDisplayViewRef {
            src: d.src.clone(),
            display: d.display.clone(),
            view: d.view.clone(),
            direction: write_direction(d.direction),
        }),
        Transform::Builtin(b) => tagged(tag, &RawBuiltin {
            style: b.style.clone(),
            direction: write_direction(b.direction),
        }),
        Transform::Group(g) => tagged(tag, &RawGroup {
            children: g.transforms.iter().map(transform_to_value).collect::<OcioResult<_>>()?,
            direction: write_direction(g.direction),
        }),
        Transform::Lut1d(l) => tagged(tag, &RawLut1d {
            domain: Some(vec![l.domain_min, l.domain_max]),
            values: l.values.iter().flatten().copied().collect(),
            direction: write_direction(l.direction),
        }),
        Transform::Lut3d(l) => tagged(tag, &RawLut3d {
            size: l.size,
            values: l.values.iter().flatten().copied().collect(),
            interpolation: write_interpolation(l.interpolation),
            direction: write_direction(l.direction),
        }),
    }
}

fn opt_transform(v: Option<&Value>) -> OcioResult<Option<Transform>> {
    v.map(transform_from_value).transpose()
}

fn opt_value(t: Option<&Transform>) -> OcioResult<Option<Value>> {
    t.map(transform_to_value).transpose()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn non_empty_list(v: &[String]) -> Option<Vec<String>> {
    (!v.is_empty()).then(|| v.to_vec())
}

fn scalar_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => format!("{other:?}"),
    }
}

fn string_pairs(m: &Mapping) -> Vec<(String, String)> {
    m.iter()
        .map(|(k, v)| (scalar_string(k), scalar_string(v)))
        .collect()
}

fn pairs_mapping(pairs: &[(String, String)]) -> Option<Mapping> {
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
            .collect(),
    )
}

// ============================================================================
// Tag handling
// ============================================================================

fn strip_structural_tags(value: Value) -> Value {
    match value {
        Value::Tagged(t) => {
            let tag = t.tag.to_string();
            if STRUCTURAL_TAGS.contains(&tag.trim_start_matches('!')) {
                strip_structural_tags(t.value)
            } else {
                Value::Tagged(Box::new(TaggedValue {
                    tag: t.tag,
                    value: strip_structural_tags(t.value),
                }))
            }
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(strip_structural_tags).collect()),
        Value::Mapping(m) => Value::Mapping(m.into_iter().map(|(k, v)| (k, strip_structural_tags(v))).collect()),
        other => other,
    }
}

fn wrap(v: &mut Value, tag: &str) {
    let inner = std::mem::replace(v, Value::Null);
    *v = Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value: inner,
    }));
}

fn tag_items(root: &mut Mapping, key: &str, tag: &str) {
    if let Some(Value::Sequence(items)) = root.get_mut(key) {
        items.iter_mut().for_each(|item| wrap(item, tag));
    }
}

fn tag_display_entries(entries: &mut Value) {
    if let Value::Sequence(items) = entries {
        for item in items.iter_mut() {
            match item {
                Value::Mapping(_) => wrap(item, "View"),
                Value::Sequence(_) => wrap(item, "Views"),
                _ => {}
            }
        }
    }
}

fn tag_sections(root: &mut Mapping) {
    tag_items(root, "file_rules", "Rule");
    tag_items(root, "viewing_rules", "Rule");
    tag_items(root, "shared_views", "View");
    tag_items(root, "looks", "Look");
    tag_items(root, "view_transforms", "ViewTransform");
    tag_items(root, "display_colorspaces", "ColorSpace");
    tag_items(root, "colorspaces", "ColorSpace");
    tag_items(root, "named_transforms", "NamedTransform");
    if let Some(Value::Mapping(displays)) = root.get_mut("displays") {
        for (_, entries) in displays.iter_mut() {
            tag_display_entries(entries);
        }
    }
    if let Some(entries) = root.get_mut("virtual_display") {
        tag_display_entries(entries);
    }
}

fn prune_nulls(value: &mut Value) {
    match value {
        Value::Mapping(m) => {
            let kept: Mapping = std::mem::take(m)
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, mut v)| {
                    prune_nulls(&mut v);
                    (k, v)
                })
                .collect();
            *m = kept;
        }
        Value::Sequence(items) => items.iter_mut().for_each(prune_nulls),
        Value::Tagged(t) => prune_nulls(&mut t.value),
        _ => {}
    }
}

// ============================================================================
// Config <-> raw
// ============================================================================

fn colorspace_from_raw(raw: RawColorSpace, reference: ReferenceSpaceType) -> OcioResult<ColorSpace> {
    let mut b = ColorSpace::builder(raw.name).reference_space(reference);
    for alias in raw.aliases.unwrap_or_default() {
        b = b.alias(alias);
    }
    if let Some(family) = raw.family {
        b = b.family(family);
    }
    if let Some(group) = raw.equalitygroup {
        b = b.equality_group(group);
    }
    if let Some(depth) = raw.bitdepth {
        b = b.bit_depth(BitDepth::parse(&depth));
    }
    if let Some(desc) = raw.description {
        b = b.description(desc.trim_end());
    }
    if let Some(is_data) = raw.isdata {
        b = b.is_data(is_data);
    }
    for cat in raw.categories.unwrap_or_default() {
        b = b.category(cat);
    }
    if let Some(enc) = raw.encoding {
        b = b.encoding(Encoding::parse(&enc));
    }

    let (to, from) = match reference {
        ReferenceSpaceType::Scene => (
            raw.to_scene_reference.or(raw.to_reference),
            raw.from_scene_reference.or(raw.from_reference),
        ),
        ReferenceSpaceType::Display => (
            raw.to_display_reference.or(raw.to_reference),
            raw.from_display_reference.or(raw.from_reference),
        ),
    };
    if let Some(t) = opt_transform(to.as_ref())? {
        b = b.to_reference(t);
    }
    if let Some(t) = opt_transform(from.as_ref())? {
        b = b.from_reference(t);
    }
    Ok(b.build())
}

fn colorspace_to_raw(cs: &ColorSpace) -> OcioResult<RawColorSpace> {
    let to = opt_value(cs.to_reference())?;
    let from = opt_value(cs.from_reference())?;
    let mut raw = RawColorSpace {
        name: cs.name().to_string(),
        aliases: non_empty_list(cs.aliases()),
        family: non_empty(cs.family()),
        equalitygroup: non_empty(cs.equality_group()),
        bitdepth: non_empty(cs.bit_depth().as_str()),
        description: non_empty(cs.description()),
        isdata: cs.is_data().then_some(true),
        categories: non_empty_list(cs.categories()),
        encoding: non_empty(cs.encoding().as_str()),
        ..Default::default()
    };
    match cs.reference_space() {
        ReferenceSpaceType::Scene => {
            raw.to_scene_reference = to;
            raw.from_scene_reference = from;
        }
        ReferenceSpaceType::Display => {
            raw.to_display_reference = to;
            raw.from_display_reference = from;
        }
    }
    Ok(raw)
}

fn view_from_raw(raw: RawView) -> View {
    let cs = raw.display_colorspace.or(raw.colorspace).unwrap_or_default();
    View::new(raw.name, cs)
        .with_look(raw.looks.unwrap_or_default())
        .with_view_transform(raw.view_transform.unwrap_or_default())
        .with_rule(raw.rule.unwrap_or_default())
        .with_description(raw.description.unwrap_or_default())
}

fn view_to_raw(v: &View) -> RawView {
    let (display_colorspace, colorspace) = match v.view_transform() {
        Some(_) => (Some(v.colorspace().to_string()), None),
        None => (None, Some(v.colorspace().to_string())),
    };
    RawView {
        name: v.name().to_string(),
        view_transform: v.view_transform().map(String::from),
        display_colorspace,
        colorspace,
        looks: v.looks().map(String::from),
        rule: v.rule().map(String::from),
        description: non_empty(v.description()),
    }
}

fn fill_display(display: &mut Display, entries: Vec<RawDisplayEntry>) {
    for entry in entries {
        match entry {
            RawDisplayEntry::View(v) => display.add_view(view_from_raw(v)),
            RawDisplayEntry::Shared(names) => names.into_iter().for_each(|n| display.add_shared_view(n)),
        }
    }
}

fn display_entries(display: &Display) -> Vec<RawDisplayEntry> {
    let mut entries: Vec<RawDisplayEntry> = display
        .views()
        .iter()
        .map(|v| RawDisplayEntry::View(view_to_raw(v)))
        .collect();
    if !display.shared_views().is_empty() {
        entries.push(RawDisplayEntry::Shared(display.shared_views().to_vec()));
    }
    entries
}

fn file_rule_from_raw(raw: RawFileRule) -> FileRule {
    let cs = raw.colorspace.unwrap_or_default();
    let rule = if raw.name.eq_ignore_ascii_case(crate::file_rules::PATH_SEARCH_RULE_NAME) {
        FileRule::path_search()
    } else if raw.name.eq_ignore_ascii_case(crate::file_rules::DEFAULT_RULE_NAME) {
        FileRule::default_rule(cs)
    } else if let Some(regex) = raw.regex {
        FileRule::regex(raw.name, cs, regex)
    } else {
        FileRule::pattern(
            raw.name,
            cs,
            raw.pattern.unwrap_or_default(),
            raw.extension.unwrap_or_default(),
        )
    };
    raw.custom
        .as_ref()
        .map(string_pairs)
        .unwrap_or_default()
        .into_iter()
        .fold(rule, |r, (k, v)| r.with_custom_key(k, v))
}

fn file_rule_to_raw(rule: &FileRule) -> RawFileRule {
    let mut raw = RawFileRule {
        name: rule.name().to_string(),
        custom: pairs_mapping(rule.custom_keys()),
        ..Default::default()
    };
    match rule.kind() {
        FileRuleKind::Default => raw.colorspace = Some(rule.colorspace().to_string()),
        FileRuleKind::PathSearch => {}
        FileRuleKind::Pattern { pattern, extension } => {
            raw.colorspace = Some(rule.colorspace().to_string());
            raw.pattern = Some(pattern.clone());
            raw.extension = Some(extension.clone());
        }
        FileRuleKind::Regex(r) => {
            raw.colorspace = Some(rule.colorspace().to_string());
            raw.regex = Some(r.clone());
        }
    }
    raw
}

fn view_transform_from_raw(raw: RawViewTransform) -> OcioResult<ViewTransform> {
    let scene = raw.to_scene_reference.is_some() || raw.from_scene_reference.is_some();
    let (reference, to, from) = if scene {
        (ReferenceSpaceType::Scene, raw.to_scene_reference, raw.from_scene_reference)
    } else {
        (ReferenceSpaceType::Display, raw.to_display_reference, raw.from_display_reference)
    };
    let mut vt = ViewTransform::new(raw.name)
        .with_family(raw.family.unwrap_or_default())
        .with_description(raw.description.unwrap_or_default().trim_end())
        .with_reference_space(reference);
    for cat in raw.categories.unwrap_or_default() {
        vt = vt.with_category(cat);
    }
    vt.set_to_reference(opt_transform(to.as_ref())?);
    vt.set_from_reference(opt_transform(from.as_ref())?);
    Ok(vt)
}

fn view_transform_to_raw(vt: &ViewTransform) -> OcioResult<RawViewTransform> {
    let to = opt_value(vt.to_reference())?;
    let from = opt_value(vt.from_reference())?;
    let mut raw = RawViewTransform {
        name: vt.name().to_string(),
        family: non_empty(vt.family()),
        description: non_empty(vt.description()),
        categories: non_empty_list(vt.categories()),
        ..Default::default()
    };
    match vt.reference_space() {
        ReferenceSpaceType::Scene => {
            raw.to_scene_reference = to;
            raw.from_scene_reference = from;
        }
        ReferenceSpaceType::Display => {
            raw.to_display_reference = to;
            raw.from_display_reference = from;
        }
    }
    Ok(raw)
}

fn named_transform_from_raw(raw: RawNamedTransform) -> OcioResult<NamedTransform> {
    let mut nt = NamedTransform::default();
    if let Some(fwd) = opt_transform(raw.transform.as_ref())? {
        nt = NamedTransform::new(&raw.name, fwd);
    }
    if let Some(inv) = opt_transform(raw.inverse_transform.as_ref())? {
        if nt.forward().is_some() {
            nt.set_inverse(Some(inv));
        } else {
            nt = NamedTransform::with_inverse(&raw.name, inv);
        }
    }
    if nt.forward().is_none() && nt.inverse().is_none() {
        return Err(OcioError::Validation(format!(
            "named transform '{}' has no transform",
            raw.name
        )));
    }
    for alias in raw.aliases.unwrap_or_default() {
        nt.add_alias(alias);
    }
    nt.set_family(raw.family.unwrap_or_default());
    nt.set_description(raw.description.unwrap_or_default().trim_end());
    for cat in raw.categories.unwrap_or_default() {
        nt.add_category(cat);
    }
    nt.set_encoding(raw.encoding.unwrap_or_default());
    Ok(nt)
}

fn named_transform_to_raw(nt: &NamedTransform) -> OcioResult<RawNamedTransform> {
    Ok(RawNamedTransform {
        name: nt.name().to_string(),
        aliases: non_empty_list(nt.aliases()),
        family: non_empty(nt.family()),
        description: non_empty(nt.description()),
        categories: non_empty_list(nt.categories()),
        encoding: non_empty(nt.encoding()),
        transform: opt_value(nt.forward())?,
        inverse_transform: opt_value(nt.inverse())?,
    })
}

fn config_from_raw(raw: RawConfig, working_dir: PathBuf) -> OcioResult<Config> {
    let version = raw
        .ocio_profile_version
        .as_ref()
        .map(scalar_string)
        .ok_or_else(|| OcioError::UnsupportedVersion { version: String::new() })?;

    let mut config = Config::new();
    config.set_version(ConfigVersion::parse(&version)?);
    config.set_working_dir(working_dir);
    config.set_name(raw.name.unwrap_or_default());
    config.set_description(raw.description.unwrap_or_default().trim_end());
    config.set_strict_parsing(raw.strictparsing.unwrap_or(true));

    if let Some(env) = raw.environment {
        for (k, v) in string_pairs(&env) {
            config.set_env_var(k, v);
        }
    }
    if let Some(paths) = raw.search_path {
        config.set_search_paths(paths.into_vec(':'));
    }
    if let Some(sep) = raw.family_separator.and_then(|s| s.chars().next()) {
        config.set_family_separator(sep);
    }
    if let Some(luma) = raw.luma {
        let luma: [f64; 3] = luma
            .try_into()
            .map_err(|_| OcioError::Validation("luma needs three coefficients".into()))?;
        config.set_default_luma(luma);
    }
    if let Some(roles) = raw.roles {
        for (role, cs) in string_pairs(&roles) {
            config.set_role(role, cs);
        }
    }

    if let Some(rules) = raw.file_rules {
        let mut file_rules = FileRules::new();
        for raw_rule in rules {
            file_rules.push(file_rule_from_raw(raw_rule))?;
        }
        config.set_file_rules(file_rules);
    }
    if let Some(rules) = raw.viewing_rules {
        let mut viewing_rules = ViewingRules::new();
        for r in rules {
            let mut rule = ViewingRule::new(r.name);
            for cs in r.colorspaces.map(|c| c.into_vec(',')).unwrap_or_default() {
                rule = rule.with_colorspace(cs);
            }
            for enc in r.encodings.map(|e| e.into_vec(',')).unwrap_or_default() {
                rule = rule.with_encoding(enc);
            }
            for (k, v) in r.custom.as_ref().map(string_pairs).unwrap_or_default() {
                rule = rule.with_custom_key(k, v);
            }
            viewing_rules.add(rule);
        }
        config.set_viewing_rules(viewing_rules);
    }

    for v in raw.shared_views.unwrap_or_default() {
        config.add_shared_view(view_from_raw(v));
    }
    if let Some(displays) = raw.displays {
        for (name, entries) in displays {
            let entries: Vec<RawDisplayEntry> = serde_yaml::from_value(entries)?;
            let mut display = Display::new(scalar_string(&name));
            fill_display(&mut display, entries);
            config.add_display(display);
        }
    }
    if let Some(entries) = raw.virtual_display {
        fill_display(config.virtual_display_mut(), entries);
    }

    config.set_active_displays(raw.active_displays.map(|a| a.into_vec(',')).unwrap_or_default());
    config.set_active_views(raw.active_views.map(|a| a.into_vec(',')).unwrap_or_default());
    config.set_inactive_colorspaces(
        raw.inactive_colorspaces
            .map(|a| a.into_vec(','))
            .unwrap_or_default(),
    );

    for raw_look in raw.looks.unwrap_or_default() {
        let mut look = Look::new(raw_look.name)
            .process_space(raw_look.process_space.unwrap_or_default())
            .description(raw_look.description.unwrap_or_default().trim_end());
        if let Some(t) = opt_transform(raw_look.transform.as_ref())? {
            look = look.transform(t);
        }
        if let Some(t) = opt_transform(raw_look.inverse_transform.as_ref())? {
            look = look.inverse_transform(t);
        }
        config.add_look(look);
    }

    config.set_default_view_transform(raw.default_view_transform.unwrap_or_default());
    for raw_vt in raw.view_transforms.unwrap_or_default() {
        config.add_view_transform(view_transform_from_raw(raw_vt)?);
    }
    for raw_cs in raw.display_colorspaces.unwrap_or_default() {
        config.add_colorspace(colorspace_from_raw(raw_cs, ReferenceSpaceType::Display)?);
    }
    for raw_cs in raw.colorspaces.unwrap_or_default() {
        config.add_colorspace(colorspace_from_raw(raw_cs, ReferenceSpaceType::Scene)?);
    }
    for raw_nt in raw.named_transforms.unwrap_or_default() {
        config.add_named_transform(named_transform_from_raw(raw_nt)?);
    }
    Ok(config)
}

fn config_to_raw(config: &Config) -> OcioResult<RawConfig> {
    let version: Value = serde_yaml::from_str(&config.version().to_string())?;
    let displays: Mapping = config
        .displays()
        .iter()
        .map(|d| -> OcioResult<(Value, Value)> {
            Ok((Value::from(d.name()), serde_yaml::to_value(display_entries(d))?))
        })
        .collect::<OcioResult<_>>()?;
    let luma = config.default_luma();

    Ok(RawConfig {
        ocio_profile_version: Some(version),
        environment: pairs_mapping(config.environment()),
        search_path: StringOrList::from_vec(config.search_paths()),
        strictparsing: Some(config.strict_parsing()),
        family_separator: (config.family_separator() != '/').then(|| config.family_separator().to_string()),
        luma: Some(luma.to_vec()),
        name: non_empty(config.name()),
        description: non_empty(config.description()),
        roles: Some(
            config
                .roles()
                .iter()
                .map(|(r, cs)| (Value::from(r), Value::from(cs)))
                .collect(),
        ),
        file_rules: Some(config.file_rules().rules().iter().map(file_rule_to_raw).collect()),
        viewing_rules: (!config.viewing_rules().is_empty()).then(|| {
            config
                .viewing_rules()
                .rules()
                .iter()
                .map(|r| RawViewingRule {
                    name: r.name().to_string(),
                    colorspaces: StringOrList::from_vec(r.colorspaces()).map(|c| match c {
                        StringOrList::One(s) => StringOrList::Many(vec![s]),
                        many => many,
                    }),
                    encodings: StringOrList::from_vec(r.encodings()).map(|e| match e {
                        StringOrList::One(s) => StringOrList::Many(vec![s]),
                        many => many,
                    }),
                    custom: pairs_mapping(r.custom_keys()),
                })
                .collect()
        }),
        shared_views: (!config.shared_views().is_empty())
            .then(|| config.shared_views().iter().map(view_to_raw).collect()),
        displays: Some(displays),
        virtual_display: (!config.virtual_display().is_empty()).then(|| display_entries(config.virtual_display())),
        active_displays: Some(StringOrList::Many(config.active_displays().to_vec())),
        active_views: Some(StringOrList::Many(config.active_views().to_vec())),
        inactive_colorspaces: (!config.inactive_colorspaces().is_empty())
            .then(|| StringOrList::Many(config.inactive_colorspaces().to_vec())),
        looks: (!config.looks().is_empty())
            .then(|| {
                config
                    .looks()
                    .iter()
                    .map(|l| -> OcioResult<RawLook> {
                        Ok(RawLook {
                            name: l.name().to_string(),
                            process_space: non_empty(l.get_process_space()),
                            description: non_empty(l.get_description()),
                            transform: opt_value(l.get_transform())?,
                            inverse_transform: opt_value(l.get_inverse_transform())?,
                        })
                    })
                    .collect::<OcioResult<_>>()
            })
            .transpose()?,
        default_view_transform: non_empty(config.default_view_transform()),
        view_transforms: (!config.view_transforms().is_empty())
            .then(|| config.view_transforms().iter().map(view_transform_to_raw).collect::<OcioResult<_>>())
            .transpose()?,
        display_colorspaces: nonempty_vec(
            config
                .colorspaces_of(ReferenceSpaceType::Display)
                .map(colorspace_to_raw)
                .collect::<OcioResult<Vec<_>>>()?,
        ),
        colorspaces: nonempty_vec(
            config
                .colorspaces_of(ReferenceSpaceType::Scene)
                .map(colorspace_to_raw)
                .collect::<OcioResult<Vec<_>>>()?,
        ),
        named_transforms: nonempty_vec(
            config
                .named_transforms()
                .iter()
                .map(named_transform_to_raw)
                .collect::<OcioResult<Vec<_>>>()?,
        ),
    })
}

fn nonempty_vec<T>(v: Vec<T>) -> Option<Vec<T>> {
    (!v.is_empty()).then_some(v)
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> OcioResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OcioError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!("loading config {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let working_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_yaml_str(&content, working_dir)
    }

    /// Loads configuration from YAML string.
    pub fn from_yaml_str(yaml: &str, working_dir: PathBuf) -> OcioResult<Self> {
        // serde_yaml only reports local tags, so `!<Tag>` is read as `!Tag`.
        let yaml = VERBATIM_TAG.replace_all(yaml, "!$1");
        let value: Value = serde_yaml::from_str(&yaml)?;
        let raw: RawConfig = serde_yaml::from_value(strip_structural_tags(value))?;
        config_from_raw(raw, working_dir)
    }

    /// Serializes to OCIO YAML.
    pub fn to_yaml_string(&self) -> OcioResult<String> {
        let mut value = serde_yaml::to_value(config_to_raw(self)?)?;
        if let Value::Mapping(root) = &mut value {
            tag_sections(root);
        }
        prune_nulls(&mut value);
        let text = serde_yaml::to_string(&value)?;
        Ok(SHORT_TAG.replace_all(&text, "${1}!<${2}>").into_owned())
    }

    /// Writes the config as YAML.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> OcioResult<()> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_CONFIG: &str = r#"
ocio_profile_version: 2.1

environment:
  SHOT: sh010

search_path: "luts:shared"
roles:
  scene_linear: Linear
  default: sRGB

file_rules:
  - !<Rule> {name: LogC, colorspace: Linear, pattern: "*LogC*", extension: "*"}
  - !<Rule> {name: TIFF, colorspace: sRGB, regex: ".*\\.TIF?F$"}
  - !<Rule> {name: ColorSpaceNamePathSearch}
  - !<Rule> {name: Default, colorspace: Linear}

shared_views:
  - !<View> {name: Film, view_transform: Filmic, display_colorspace: <USE_DISPLAY_NAME>}

displays:
  sRGB:
    - !<View> {name: Raw, colorspace: Linear}
    - !<View> {name: sRGB, colorspace: sRGB}
    - !<Views> [Film]

active_displays: [sRGB]
active_views: []

view_transforms:
  - !<ViewTransform>
    name: Filmic
    from_scene_reference: !<ExponentTransform> {value: [0.5, 0.5, 0.5, 1]}

display_colorspaces:
  - !<ColorSpace>
    name: sRGB
    encoding: sdr-video
    from_display_reference: !<ExponentWithLinearTransform> {gamma: 2.4, offset: 0.055, direction: inverse}

colorspaces:
  - !<ColorSpace>
    name: Linear
    aliases: [lin]
    family: Scene
    encoding: scene-linear
    description: Linear reference

  - !<ColorSpace>
    name: Log
    to_scene_reference:
      - !<LogTransform> {base: 10, direction: inverse}
      - !<MatrixTransform> {matrix: [2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 1]}

named_transforms:
  - !<NamedTransform>
    name: Boost
    transform: !<CDLTransform> {slope: [2, 2, 2]}
"#;

    fn minimal() -> Config {
        Config::from_yaml_str(MINIMAL_CONFIG, PathBuf::from(".")).unwrap()
    }

    #[test]
    fn parse_minimal_config() {
        let config = minimal();

        assert_eq!(config.version(), ConfigVersion::new(2, 1));
        assert_eq!(config.colorspaces().len(), 3);
        assert_eq!(config.search_paths(), ["luts", "shared"]);
        assert_eq!(config.env_var("SHOT"), Some("sh010"));
        assert!(config.colorspace("lin").is_some());
        assert_eq!(config.colorspace("sRGB").unwrap().reference_space(), ReferenceSpaceType::Display);
        assert_eq!(config.named_transforms().len(), 1);
    }

    #[test]
    fn transforms_are_decoded() {
        let config = minimal();
        let log = config.colorspace("Log").unwrap();
        match log.to_reference() {
            Some(Transform::Group(g)) => {
                assert_eq!(g.transforms.len(), 2);
                assert_eq!(g.transforms[0].direction(), TransformDirection::Inverse);
            }
            other => panic!("expected group, got {other:?}"),
        }
        let srgb = config.colorspace("sRGB").unwrap();
        match srgb.from_reference() {
            Some(Transform::ExponentWithLinear(e)) => {
                assert_eq!(e.gamma, [2.4, 2.4, 2.4, 1.0]);
                assert_eq!(e.offset, [0.055, 0.055, 0.055, 0.0]);
            }
            other => panic!("expected moncurve, got {other:?}"),
        }
    }

    #[test]
    fn displays_and_rules_parsed() {
        let config = minimal();
        let display = config.display("sRGB").unwrap();
        assert_eq!(display.views().len(), 2);
        assert!(display.has_shared_view("Film"));
        assert_eq!(config.display_view_colorspace("sRGB", "Film").as_deref(), Some("sRGB"));

        let names: Vec<_> = config.file_rules().rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["LogC", "TIFF", "ColorSpaceNamePathSearch", "Default"]);
        assert_eq!(config.file_rules().default_rule().unwrap().colorspace(), "Linear");
    }

    #[test]
    fn roundtrip_preserves_sections() {
        let config = minimal();
        let text = config.to_yaml_string().unwrap();
        assert!(text.contains("!<ColorSpace>"));
        assert!(text.contains("!<LogTransform>"));

        let again = Config::from_yaml_str(&text, PathBuf::from(".")).unwrap();
        assert_eq!(again.version(), config.version());
        assert_eq!(again.colorspaces().len(), config.colorspaces().len());
        for (a, b) in again.colorspaces().iter().zip(config.colorspaces()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.to_reference(), b.to_reference());
            assert_eq!(a.from_reference(), b.from_reference());
        }
        assert_eq!(again.roles(), config.roles());
        assert_eq!(again.file_rules(), config.file_rules());
        assert_eq!(again.displays(), config.displays());
        assert_eq!(again.shared_views(), config.shared_views());
        assert_eq!(again.named_transforms(), config.named_transforms());
    }

    #[test]
    fn missing_version_is_rejected() {
        let result = Config::from_yaml_str("name: x\n", PathBuf::from("."));
        assert!(matches!(result, Err(OcioError::UnsupportedVersion { .. })));
    }

    #[test]
    fn unknown_transform_tag_is_rejected() {
        let yaml = "ocio_profile_version: 2\ncolorspaces:\n  - !<ColorSpace>\n    name: a\n    to_scene_reference: !<FancyTransform> {}\n";
        assert!(matches!(
            Config::from_yaml_str(yaml, PathBuf::from(".")),
            Err(OcioError::InvalidTransform { .. })
        ));
    }

    #[test]
    fn from_file_missing() {
        let result = Config::from_file("/nonexistent/config.ocio");
        assert!(matches!(result, Err(OcioError::ConfigNotFound { .. })));
    }
}
