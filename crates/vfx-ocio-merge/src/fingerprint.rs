//! Color-space fingerprints.
//!
//! A fingerprint is a fixed set of samples pushed through a color space's
//! from-reference transform. The samples start as known linear Rec.709
//! values and are first carried into the config's own reference, so two
//! spaces from configs with different references can still be compared
//! once the input has been adapted.
//!
//! Matching uses a loose tolerance: it absorbs the differences between
//! chromatic adaptation methods while keeping distinct primaries apart.

use tracing::{debug, trace};
use vfx_ocio::{
    builtin, role_names, ColorSpace, Config, ReferenceSpaceType, TransformDirection,
};

use crate::refspace::{identify_interchange_space, CacheSuspension};

/// Elementwise tolerance of a fingerprint match.
pub const FINGERPRINT_TOLERANCE: f32 = 5e-3;

const SAMPLES: [[f32; 4]; 5] = [
    [0.18, 0.18, 0.18, 1.0],
    [0.7, 0.4, 0.02, 1.0],
    [0.02, 0.6, 0.2, 1.0],
    [0.3, 0.02, 0.5, 1.0],
    [0.004, 0.004, 0.004, 1.0],
];

const SCENE_INTERCHANGE_NAMES: [&str; 3] = [role_names::ACES_INTERCHANGE, "ACES2065-1", "lin_ap0_scene"];
const DISPLAY_INTERCHANGE_NAMES: [&str; 3] =
    [role_names::CIE_XYZ_D65_INTERCHANGE, builtin::CIE_XYZ_D65, "CIE XYZ-D65"];

/// Samples expressed in a config's scene and display references.
#[derive(Debug, Clone, PartialEq)]
pub struct Probes {
    scene: Vec<[f32; 4]>,
    display: Vec<[f32; 4]>,
}

impl Probes {
    /// Computes the probes of `config`.
    ///
    /// Falls back to the raw samples for a reference that cannot be
    /// identified.
    pub fn for_config(config: &Config) -> Self {
        let builtin_config = builtin::reference();
        let _guard = CacheSuspension::new(config);

        let scene = scene_probe(config, &builtin_config).unwrap_or_else(|| SAMPLES.to_vec());
        let display = display_probe(config).unwrap_or_else(|| SAMPLES.to_vec());
        Self { scene, display }
    }

    /// Probe for spaces of the given reference type.
    pub fn get(&self, reference: ReferenceSpaceType) -> &[[f32; 4]] {
        match reference {
            ReferenceSpaceType::Scene => &self.scene,
            ReferenceSpaceType::Display => &self.display,
        }
    }
}

fn named_interchange<'a>(
    config: &'a Config,
    names: &[&str],
    reference: ReferenceSpaceType,
) -> Option<&'a ColorSpace> {
    names
        .iter()
        .filter_map(|n| config.colorspace(n))
        .find(|cs| cs.reference_space() == reference && !cs.is_data())
}

fn scene_probe(config: &Config, builtin_config: &Config) -> Option<Vec<[f32; 4]>> {
    let (config_ic, builtin_ic) =
        match named_interchange(config, &SCENE_INTERCHANGE_NAMES, ReferenceSpaceType::Scene) {
            Some(cs) => (cs.name().to_string(), "ACES2065-1".to_string()),
            None => {
                let ic = identify_interchange_space(config, "", builtin_config, "ACES2065-1").ok()?;
                (ic.src, ic.dst)
            }
        };

    let mut probe = SAMPLES.to_vec();
    builtin_config
        .processor(builtin::LINEAR_SPACES[2], &builtin_ic)
        .ok()?
        .apply_rgba(&mut probe);
    to_reference(config, &config_ic, &mut probe)?;
    trace!(interchange = %config_ic, "scene probe");
    Some(probe)
}

fn display_probe(config: &Config) -> Option<Vec<[f32; 4]>> {
    let cs = named_interchange(config, &DISPLAY_INTERCHANGE_NAMES, ReferenceSpaceType::Display)?;
    let mut probe = SAMPLES.to_vec();
    to_reference(config, cs.name(), &mut probe)?;
    trace!(interchange = cs.name(), "display probe");
    Some(probe)
}

fn to_reference(config: &Config, name: &str, probe: &mut [[f32; 4]]) -> Option<()> {
    if let Some(t) = config.colorspace(name)?.transform_to_reference() {
        config
            .processor_for_transform(&t, TransformDirection::Forward)
            .ok()?
            .apply_rgba(probe);
    }
    Some(())
}

/// Numeric signature of a color space.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    /// Color space name.
    pub name: String,
    /// Reference type of the space.
    pub reference: ReferenceSpaceType,
    /// RGB values of the probe after the from-reference transform.
    pub values: Vec<f32>,
}

impl Fingerprint {
    /// True if both belong to the same reference and agree within tolerance.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.reference == other.reference
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs() <= FINGERPRINT_TOLERANCE)
    }
}

/// Fingerprints of the color spaces of one config.
#[derive(Debug, Clone)]
pub struct FingerprintIndex {
    probes: Probes,
    entries: Vec<Fingerprint>,
    data: Vec<(String, ReferenceSpaceType)>,
}

impl FingerprintIndex {
    /// Fingerprints every eligible space of `config`.
    ///
    /// Data spaces are kept apart, spaces with both directions defined are
    /// skipped, and so are spaces whose transform fails to compile.
    pub fn build(config: &Config) -> Self {
        let probes = Probes::for_config(config);
        let _guard = CacheSuspension::new(config);

        let mut data = Vec::new();
        let mut entries = Vec::new();
        for cs in config.colorspaces() {
            if cs.is_data() {
                data.push((cs.name().to_string(), cs.reference_space()));
            } else if let Some(fp) = compute(&probes, config, cs) {
                entries.push(fp);
            }
        }
        debug!(
            config = config.name(),
            fingerprints = entries.len(),
            "built fingerprint index"
        );
        Self { probes, entries, data }
    }

    /// Probes used by this index.
    pub fn probes(&self) -> &Probes {
        &self.probes
    }

    /// Fingerprint of `cs`, resolving its transforms through `config`.
    ///
    /// `config` is the config the space comes from; the probes are the
    /// ones of the indexed config.
    pub fn fingerprint(&self, config: &Config, cs: &ColorSpace) -> Option<Fingerprint> {
        compute(&self.probes, config, cs)
    }

    /// Name of the first indexed space matching `fp`.
    pub fn find(&self, fp: &Fingerprint) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.matches(fp))
            .map(|e| e.name.as_str())
    }

    /// Name of the indexed space equivalent to `cs`.
    ///
    /// A data space is equivalent to the first indexed data space of the
    /// same reference type.
    pub fn find_equivalent(&self, config: &Config, cs: &ColorSpace) -> Option<&str> {
        if cs.is_data() {
            return self
                .data
                .iter()
                .find(|(_, r)| *r == cs.reference_space())
                .map(|(n, _)| n.as_str());
        }
        let fp = self.fingerprint(config, cs)?;
        self.find(&fp)
    }

    /// Drops a space from the index.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(name));
        self.data.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Number of fingerprinted spaces, data spaces excluded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no space was fingerprinted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compute(probes: &Probes, config: &Config, cs: &ColorSpace) -> Option<Fingerprint> {
    if cs.is_data() || (cs.to_reference().is_some() && cs.from_reference().is_some()) {
        return None;
    }
    let mut values = probes.get(cs.reference_space()).to_vec();
    if let Some(t) = cs.transform_from_reference() {
        match config.processor_for_transform(&t, TransformDirection::Forward) {
            Ok(p) => p.apply_rgba(&mut values),
            Err(e) => {
                trace!(colorspace = cs.name(), "no fingerprint: {}", e);
                return None;
            }
        }
    }
    Some(Fingerprint {
        name: cs.name().to_string(),
        reference: cs.reference_space(),
        values: values.iter().flat_map(|px| px[..3].iter().copied()).collect(),
    })
}

/// Finds the space of `config` equivalent to `cs`.
///
/// Only spaces of reference type `reference` are candidates; a data space
/// matches the first data space. Transforms of `cs` are resolved in
/// `config`, so both are assumed to share a reference.
pub fn find_equivalent_color_space(config: &Config, cs: &ColorSpace, reference: ReferenceSpaceType) -> Option<String> {
    if cs.reference_space() != reference {
        return None;
    }
    let index = FingerprintIndex::build(config);
    index.find_equivalent(config, cs).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfx_ocio::primaries::{self, ACES_AP0, ACES_AP1, REC709};
    use vfx_ocio::{ExponentTransform, ExponentWithLinearTransform, NegativeStyle, Transform};

    fn from_ap0(p: &primaries::Primaries) -> Transform {
        Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(&ACES_AP0, p)))
    }

    fn encode(gamma: f64) -> Transform {
        Transform::Exponent(ExponentTransform {
            value: [gamma, gamma, gamma, 1.0],
            negative_style: NegativeStyle::Clamp,
            direction: TransformDirection::Inverse,
        })
    }

    fn srgb_encode() -> Transform {
        Transform::ExponentWithLinear(ExponentWithLinearTransform::srgb()).inverse()
    }

    #[test]
    fn builtin_probes_are_aces() {
        let config = builtin::reference();
        let probes = Probes::for_config(&config);
        // Rec.709 grey stays grey in ACES2065-1.
        let grey = probes.get(ReferenceSpaceType::Scene)[0];
        assert!((grey[0] - 0.18).abs() < 1e-4);
        assert!((grey[2] - 0.18).abs() < 1e-4);
        // A saturated Rec.709 red gets mixed.
        let red = probes.get(ReferenceSpaceType::Scene)[1];
        assert!((red[0] - 0.7).abs() > 0.05);
        // The display interchange has no transform.
        assert_eq!(probes.get(ReferenceSpaceType::Display), SAMPLES.as_slice());
    }

    #[test]
    fn reference_matches_aces() {
        let base = builtin::reference();
        let reference = ColorSpace::builder("ref_space").build();
        assert_eq!(
            find_equivalent_color_space(&base, &reference, ReferenceSpaceType::Scene).as_deref(),
            Some("ACES2065-1")
        );
    }

    #[test]
    fn data_matches_first_data_space() {
        let base = builtin::reference();
        let unknown = ColorSpace::builder("Unknown").is_data(true).build();
        assert_eq!(
            find_equivalent_color_space(&base, &unknown, ReferenceSpaceType::Scene).as_deref(),
            Some("Raw")
        );
    }

    #[test]
    fn srgb_texture_matches_with_truncated_matrix() {
        let base = builtin::reference();
        let exact = ColorSpace::builder("standard RGB")
            .from_reference(Transform::group(vec![from_ap0(&REC709), srgb_encode()]))
            .build();
        assert_eq!(
            find_equivalent_color_space(&base, &exact, ReferenceSpaceType::Scene).as_deref(),
            Some("sRGB - Texture")
        );

        let truncated = ColorSpace::builder("approx. standard RGB")
            .from_reference(Transform::group(vec![
                Transform::matrix33([
                    [2.521686, -1.134131, -0.387555],
                    [-0.2764799, 1.372719, -0.09623917],
                    [-0.01537806, -0.152975, 1.168353],
                ]),
                srgb_encode(),
            ]))
            .build();
        assert_eq!(
            find_equivalent_color_space(&base, &truncated, ReferenceSpaceType::Scene).as_deref(),
            Some("sRGB - Texture")
        );
    }

    #[test]
    fn different_curve_does_not_match() {
        let base = builtin::reference();
        let gamma = ColorSpace::builder("gamma 2.2 rec709")
            .from_reference(Transform::group(vec![from_ap0(&REC709), encode(2.2)]))
            .build();
        assert_eq!(find_equivalent_color_space(&base, &gamma, ReferenceSpaceType::Scene), None);
    }

    #[test]
    fn matrix_matches_builtin_transform() {
        let base = builtin::reference();
        let acescg = ColorSpace::builder("ACES cg")
            .to_reference(Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(
                &ACES_AP1, &ACES_AP0,
            ))))
            .build();
        assert_eq!(
            find_equivalent_color_space(&base, &acescg, ReferenceSpaceType::Scene).as_deref(),
            Some("ACEScg")
        );
        assert_eq!(find_equivalent_color_space(&base, &acescg, ReferenceSpaceType::Display), None);
    }

    #[test]
    fn both_directions_are_skipped() {
        let base = builtin::reference();
        let both = ColorSpace::builder("both")
            .to_reference(Transform::builtin("ACEScg_to_ACES2065-1"))
            .from_reference(Transform::builtin("ACEScg_to_ACES2065-1").inverse())
            .build();
        assert_eq!(find_equivalent_color_space(&base, &both, ReferenceSpaceType::Scene), None);
    }

    #[test]
    fn removal() {
        let base = builtin::reference();
        let mut index = FingerprintIndex::build(&base);
        let n = index.len();
        assert!(n > 0);
        let reference = ColorSpace::builder("ref").build();
        assert_eq!(index.find_equivalent(&base, &reference), Some("ACES2065-1"));
        index.remove("aces2065-1");
        assert_eq!(index.len(), n - 1);
        assert_eq!(index.find_equivalent(&base, &reference), None);

        index.remove("Raw");
        let raw = ColorSpace::builder("raw").is_data(true).build();
        assert_eq!(index.find_equivalent(&base, &raw), None);
    }

    #[test]
    fn singular_matrix_is_skipped() {
        let mut config = builtin::reference();
        config.add_colorspace(
            ColorSpace::builder("flat")
                .to_reference(Transform::matrix33([[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]))
                .build(),
        );
        let index = FingerprintIndex::build(&config);
        assert_eq!(index.len(), builtin::reference().colorspaces().iter().filter(|c| !c.is_data()).count());
    }
}
