//! Reference-space identification.
//!
//! Two configs rarely agree on their reference space. Before color spaces
//! can move from one config to another, the merge needs to know which
//! space of each config is the common hand-off point.
//!
//! The interchange roles answer that directly. Without them the
//! heuristics compare source spaces against the built-in reference config:
//! an sRGB texture space or a known linear space reveals the primaries of
//! the source reference.
//!
//! # Example
//!
//! ```
//! use vfx_ocio::{builtin, ReferenceSpaceType};
//! use vfx_ocio_merge::refspace::identify_interchange_space;
//!
//! let src = builtin::reference();
//! let reference = builtin::reference();
//! let ic = identify_interchange_space(&src, "ACEScg", &reference, "ACES2065-1")?;
//! assert_eq!(ic.src, "ACES2065-1");
//! assert_eq!(ic.reference, ReferenceSpaceType::Scene);
//! # Ok::<(), vfx_ocio_merge::MergeError>(())
//! ```

use tracing::{debug, trace};
use vfx_ocio::{
    builtin, role_names, ColorSpace, Config, OcioError, OptimizationLevel, Processor,
    ReferenceSpaceType, Transform, TransformDirection,
};

use crate::error::{MergeError, MergeResult, Side};

/// Tolerance of the identity probes.
pub const IDENTITY_TOLERANCE: f32 = 1e-3;

/// Minimum off-diagonal magnitude for a matrix to count as a primaries change.
pub const OFF_DIAGONAL_THRESHOLD: f64 = 0.1;

const SRGB_BREAK: f32 = 0.003_039_934_6;
const SRGB_SLOPE: f32 = 12.923_210;
const SRGB_SCALE: f32 = 1.055;
const SRGB_POWER: f32 = 1.0 / 2.4;
const SRGB_OFFSET: f32 = 0.055;

const GREY_RAMP: [f32; 6] = [0.5, 0.03, 0.25, 0.75, 0.0, 1.0];

/// Samples used to test whether a conversion is an identity.
///
/// Includes 0.02, which sits on the linear segment of the sRGB curve.
pub const STANDARD_PROBE: [[f32; 4]; 5] = [
    [0.7, 0.4, 0.02, 0.0],
    [0.02, 0.6, 0.2, 0.0],
    [0.3, 0.02, 0.5, 0.0],
    [0.0, 0.0, 0.0, 0.0],
    [1.0, 1.0, 1.0, 0.0],
];

// Wider gamut than the standard probe: a negative and an above-one value.
const LINEAR_PROBE: [[f32; 4]; 5] = [
    [0.7, 0.4, 0.02, 0.0],
    [0.02, 0.6, -0.2, 0.0],
    [0.3, 0.02, 1.5, 0.0],
    [0.0, 0.0, 0.0, 0.0],
    [1.0, 1.0, 1.0, 0.0],
];

/// Switches a config's processor cache off for the lifetime of the guard.
///
/// The previous flag is restored on drop, including on early returns.
pub struct CacheSuspension<'a> {
    config: &'a Config,
    was_enabled: bool,
}

impl<'a> CacheSuspension<'a> {
    /// Records the cache flag of `config` and disables the cache.
    pub fn new(config: &'a Config) -> Self {
        let was_enabled = config.processor_cache_enabled();
        config.set_processor_cache_enabled(false);
        Self { config, was_enabled }
    }
}

impl Drop for CacheSuspension<'_> {
    fn drop(&mut self) {
        self.config.set_processor_cache_enabled(self.was_enabled);
    }
}

/// A pair of interchange spaces, one in each config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interchange {
    /// Interchange space of the source config.
    pub src: String,
    /// Interchange space of the destination config.
    pub dst: String,
    /// Reference the two spaces belong to.
    pub reference: ReferenceSpaceType,
}

/// Role naming the interchange space of a reference type.
pub fn interchange_role(reference: ReferenceSpaceType) -> &'static str {
    match reference {
        ReferenceSpaceType::Scene => role_names::ACES_INTERCHANGE,
        ReferenceSpaceType::Display => role_names::CIE_XYZ_D65_INTERCHANGE,
    }
}

/// Resolves the interchange spaces through the interchange roles.
///
/// The display reference is used only if both color spaces are
/// display-referred. An empty `src_cs` leaves the decision to `dst_cs`.
/// Returns `Ok(None)` when either config lacks the role.
pub fn interchange_roles(
    src: &Config,
    src_cs: &str,
    dst: &Config,
    dst_cs: &str,
) -> MergeResult<Option<Interchange>> {
    let dst_space = dst
        .colorspace(dst_cs)
        .ok_or_else(|| OcioError::ColorSpaceNotFound { name: dst_cs.into() })?;

    let reference = if src_cs.is_empty() {
        dst_space.reference_space()
    } else {
        let src_space = src
            .colorspace(src_cs)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: src_cs.into() })?;
        if src_space.reference_space() == ReferenceSpaceType::Display
            && dst_space.reference_space() == ReferenceSpaceType::Display
        {
            ReferenceSpaceType::Display
        } else {
            ReferenceSpaceType::Scene
        }
    };

    let role = interchange_role(reference);
    let Some(src_ic) = resolve_role(src, role, Side::Source)? else {
        return Ok(None);
    };
    let Some(dst_ic) = resolve_role(dst, role, Side::Destination)? else {
        return Ok(None);
    };
    Ok(Some(Interchange {
        src: src_ic,
        dst: dst_ic,
        reference,
    }))
}

fn resolve_role(config: &Config, role: &str, side: Side) -> MergeResult<Option<String>> {
    if !config.has_role(role) {
        return Ok(None);
    }
    match config.colorspace(role) {
        Some(cs) => Ok(Some(cs.name().to_string())),
        None => Err(MergeError::MissingInterchangeRole {
            role: role.to_string(),
            side,
        }),
    }
}

/// First scene-referred, non-data space without transforms.
///
/// Inactive spaces count: sometimes the only reference space is inactive.
pub fn reference_space_name(config: &Config) -> Option<&str> {
    config
        .colorspaces_of(ReferenceSpaceType::Scene)
        .find(|cs| !cs.is_data() && cs.has_no_transforms())
        .map(ColorSpace::name)
}

/// True if a color space must not take part in the heuristics.
///
/// Data spaces, spaces of another reference type, and spaces whose
/// transform depends on something the probes cannot evaluate are
/// excluded. Spaces without transforms are excluded unless
/// `allow_reference` is set.
pub fn is_excluded(cs: &ColorSpace, reference: ReferenceSpaceType, allow_reference: bool) -> bool {
    if cs.is_data() || cs.reference_space() != reference {
        return true;
    }
    match cs.to_reference().or(cs.from_reference()) {
        Some(t) => contains_blocked_transform(t),
        None => !allow_reference,
    }
}

fn contains_blocked_transform(t: &Transform) -> bool {
    t.any(&mut |t| match t {
        Transform::File(f) => !matches!(f.extension().as_deref(), Some(".spi1d") | Some(".spimtx")),
        Transform::ColorSpace(_)
        | Transform::DisplayView(_)
        | Transform::Look(_)
        | Transform::Lut3d(_) => true,
        _ => false,
    })
}

fn contains_srgb(cs: &ColorSpace) -> bool {
    cs.name().to_ascii_lowercase().contains("srgb")
        || cs.aliases().iter().any(|a| a.to_ascii_lowercase().contains("srgb"))
}

/// True if `proc` leaves every sample of `probe` unchanged within `tolerance`.
pub fn is_identity_on(proc: &Processor, probe: &[[f32; 4]], tolerance: f32) -> bool {
    let mut out = probe.to_vec();
    proc.apply_rgba(&mut out);
    probe
        .iter()
        .flatten()
        .zip(out.iter().flatten())
        .all(|(a, b)| (a - b).abs() <= tolerance)
}

fn srgb_oetf(x: f32) -> f32 {
    if x <= SRGB_BREAK {
        x * SRGB_SLOPE
    } else {
        SRGB_SCALE * x.powf(SRGB_POWER) - SRGB_OFFSET
    }
}

/// Tests whether `cs` is an sRGB texture space over one of the built-in
/// linear primaries and returns the index of those primaries.
///
/// The to-reference transform must change primaries and must carry the
/// sRGB curve. Then, for each built-in linear space, the source space
/// followed by the built-in sRGB texture inverse must be an identity.
pub fn reference_from_srgb_space(
    src: &Config,
    src_ref: &str,
    cs: &ColorSpace,
    builtin_config: &Config,
) -> Option<usize> {
    if cs.reference_space() == ReferenceSpaceType::Display {
        return None;
    }
    let to_ref = cs.transform_to_reference()?;

    // Unoptimized: a primaries change must be visible even if it round-trips.
    let proc = match Processor::from_transform_in(
        src,
        &to_ref,
        TransformDirection::Forward,
        OptimizationLevel::None,
    ) {
        Ok(p) => p,
        Err(e) => {
            trace!(colorspace = cs.name(), "skipping sRGB candidate: {}", e);
            return None;
        }
    };
    if !proc
        .ops()
        .iter()
        .any(|op| op.has_significant_off_diagonal(OFF_DIAGONAL_THRESHOLD))
    {
        trace!(colorspace = cs.name(), "sRGB candidate has no primaries matrix");
        return None;
    }

    let mut greys: Vec<[f32; 4]> = GREY_RAMP.iter().map(|&v| [v, v, v, 0.0]).collect();
    proc.apply_rgba(&mut greys);
    let curve_matches = GREY_RAMP.iter().zip(&greys).all(|(&expected, px)| {
        px[..3]
            .iter()
            .all(|&lin| (srgb_oetf(lin) - expected).abs() <= IDENTITY_TOLERANCE)
    });
    if !curve_matches {
        trace!(colorspace = cs.name(), "sRGB candidate does not carry the sRGB curve");
        return None;
    }

    builtin::LINEAR_SPACES.iter().position(|linear| {
        Config::processor_between(src, cs.name(), src_ref, builtin_config, builtin::SRGB_TEXTURE, linear)
            .map(|p| is_identity_on(&p, &STANDARD_PROBE, IDENTITY_TOLERANCE))
            .unwrap_or(false)
    })
}

/// Tests whether `cs` is one of the built-in linear spaces expressed over
/// another built-in linear reference, and returns the reference index.
///
/// Pairs with both sides equal are skipped: if both the source and the
/// built-in side were identities the reference would look identified
/// without being so.
pub fn reference_from_linear_space(
    src: &Config,
    src_ref: &str,
    cs: &ColorSpace,
    builtin_config: &Config,
) -> Option<usize> {
    if cs.reference_space() == ReferenceSpaceType::Display || cs.is_data() || cs.has_no_transforms() {
        return None;
    }
    let n = builtin::LINEAR_SPACES.len();
    for i in 0..n {
        for j in (0..n).filter(|&j| j != i) {
            let proc = Config::processor_between(
                src,
                cs.name(),
                src_ref,
                builtin_config,
                builtin::LINEAR_SPACES[i],
                builtin::LINEAR_SPACES[j],
            );
            match proc {
                Ok(p) if is_identity_on(&p, &LINEAR_PROBE, IDENTITY_TOLERANCE) => return Some(j),
                Ok(_) => {}
                Err(e) => {
                    trace!(colorspace = cs.name(), "skipping linear candidate: {}", e);
                    return None;
                }
            }
        }
    }
    None
}

/// Finds the interchange spaces to convert between `src` and a built-in
/// reference config.
///
/// The interchange roles are used when both configs define them. Otherwise
/// the heuristics run on scene-referred spaces only.
pub fn identify_interchange_space(
    src: &Config,
    src_cs: &str,
    builtin_config: &Config,
    builtin_cs: &str,
) -> MergeResult<Interchange> {
    if let Some(ic) = interchange_roles(src, src_cs, builtin_config, builtin_cs)? {
        debug!(src = %ic.src, dst = %ic.dst, "interchange spaces from roles");
        return Ok(ic);
    }

    let target = builtin_config
        .colorspace(builtin_cs)
        .ok_or_else(|| OcioError::ColorSpaceNotFound { name: builtin_cs.into() })?;
    if target.reference_space() == ReferenceSpaceType::Display {
        return Err(MergeError::DisplayHeuristicsUnsupported);
    }

    let src_ref = reference_space_name(src)
        .ok_or_else(|| MergeError::NoReferenceSpace {
            config: src.name().to_string(),
        })?
        .to_string();

    let _src_guard = CacheSuspension::new(src);
    let _builtin_guard = CacheSuspension::new(builtin_config);

    let index = src
        .colorspaces()
        .iter()
        .filter(|cs| !is_excluded(cs, ReferenceSpaceType::Scene, false) && contains_srgb(cs))
        .find_map(|cs| {
            trace!(colorspace = cs.name(), "probing sRGB candidate");
            reference_from_srgb_space(src, &src_ref, cs, builtin_config)
        })
        .or_else(|| {
            src.colorspaces()
                .iter()
                .filter(|cs| {
                    !is_excluded(cs, ReferenceSpaceType::Scene, false)
                        && src.is_color_space_linear(cs.name(), ReferenceSpaceType::Scene)
                })
                .find_map(|cs| {
                    trace!(colorspace = cs.name(), "probing linear candidate");
                    reference_from_linear_space(src, &src_ref, cs, builtin_config)
                })
        });

    match index {
        Some(i) => {
            let dst = builtin::LINEAR_SPACES[i].to_string();
            debug!(src = %src_ref, dst = %dst, "interchange spaces from heuristics");
            Ok(Interchange {
                src: src_ref,
                dst,
                reference: ReferenceSpaceType::Scene,
            })
        }
        None => Err(MergeError::HeuristicsExhausted {
            name: src.name().to_string(),
        }),
    }
}

/// Finds the space of `src` equivalent to the built-in space `name`.
pub fn identify_builtin_color_space(src: &Config, builtin_config: &Config, name: &str) -> MergeResult<String> {
    let target = builtin_config.colorspace(name).ok_or_else(|| {
        MergeError::Ocio(OcioError::ColorSpaceNotFound { name: name.into() })
    })?;
    let reference = target.reference_space();

    let ic = identify_interchange_space(src, "", builtin_config, name)?;

    let _src_guard = CacheSuspension::new(src);
    let _builtin_guard = CacheSuspension::new(builtin_config);

    src.colorspaces()
        .iter()
        .filter(|cs| !cs.is_data() && cs.reference_space() == reference)
        .find(|cs| {
            Config::processor_between(src, cs.name(), &ic.src, builtin_config, name, &ic.dst)
                .map(|p| is_identity_on(&p, &STANDARD_PROBE, IDENTITY_TOLERANCE))
                .unwrap_or(false)
        })
        .map(|cs| cs.name().to_string())
        .ok_or_else(|| MergeError::HeuristicsExhausted { name: name.to_string() })
}
