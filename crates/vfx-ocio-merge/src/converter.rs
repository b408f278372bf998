//! Reference-space converters.
//!
//! A converter takes values in one config's reference space to the
//! matching reference space of another config. Both sides are anchored on
//! the built-in reference config, so the result is
//! `src reference -> src interchange = builtin A -> builtin B = dst interchange -> dst reference`.
//!
//! Converters are spliced into every input color space and view transform
//! that moves into the merged config.

use tracing::{debug, warn};
use vfx_ocio::{
    builtin, ColorSpace, Config, OptimizationLevel, Processor, ReferenceSpaceType, Transform,
    TransformDirection, ViewTransform,
};

use crate::error::{MergeError, MergeResult};
use crate::refspace::identify_interchange_space;

fn builtin_anchor(reference: ReferenceSpaceType) -> &'static str {
    match reference {
        ReferenceSpaceType::Scene => "ACES2065-1",
        ReferenceSpaceType::Display => builtin::CIE_XYZ_D65,
    }
}

/// Builds the converter from the `reference` space of `src` to that of `dst`.
///
/// Returns an empty group when neither config has a color space of that
/// reference type, or when both configs already share the reference. File
/// references are resolved in their originating config, so the result does
/// not depend on either config's search paths.
pub fn build_reference_converter(
    src: &Config,
    dst: &Config,
    reference: ReferenceSpaceType,
) -> MergeResult<Transform> {
    let absent = |config: &Config| config.colorspaces_of(reference).next().is_none();
    if absent(src) && absent(dst) {
        debug!(reference = reference.as_str(), "no color spaces to convert");
        return Ok(Transform::group(Vec::new()));
    }

    let builtin_config = builtin::reference();
    let anchor = builtin_anchor(reference);
    let src_ic = identify_interchange_space(src, "", &builtin_config, anchor)?;
    let dst_ic = identify_interchange_space(dst, "", &builtin_config, anchor)?;
    debug!(
        src = %src_ic.src,
        src_builtin = %src_ic.dst,
        dst = %dst_ic.src,
        dst_builtin = %dst_ic.dst,
        "building reference converter"
    );

    let from_src = interchange_piece(src, &src_ic.src, ColorSpace::transform_from_reference)?;
    let across = builtin_config.processor(&src_ic.dst, &dst_ic.dst)?;
    let to_dst = interchange_piece(dst, &dst_ic.src, ColorSpace::transform_to_reference)?;

    let proc = from_src
        .concat(&across)
        .concat(&to_dst)
        .optimized(OptimizationLevel::Lossless);
    Ok(simplify(&proc))
}

fn interchange_piece(
    config: &Config,
    name: &str,
    pick: fn(&ColorSpace) -> Option<Transform>,
) -> MergeResult<Processor> {
    let t = config.colorspace(name).and_then(pick);
    match t {
        Some(t) => Ok(config.processor_for_transform(&t, TransformDirection::Forward)?),
        None => Ok(Processor::default()),
    }
}

fn simplify(proc: &Processor) -> Transform {
    let mut group = proc.to_group_transform();
    if group.transforms.len() == 1 {
        if let Some(only) = group.transforms.pop() {
            return only;
        }
    }
    Transform::Group(group)
}

/// Expands file references of `t` through `config`.
///
/// Transforms without files are returned unchanged.
pub fn bake_file_transforms(config: &Config, t: &Transform) -> MergeResult<Transform> {
    if !t.any(&mut |t| matches!(t, Transform::File(_))) {
        return Ok(t.clone());
    }
    let proc = config.processor_for_transform(t, TransformDirection::Forward)?;
    Ok(Transform::Group(proc.to_group_transform()))
}

/// Splices `converter` into a color space.
///
/// The to-reference side gets the converter appended, the from-reference
/// side gets its inverse prepended. A non-data space without transforms
/// gets a group holding just the converter.
pub fn update_reference_color_space(cs: &mut ColorSpace, converter: &Transform) {
    if converter.is_empty_group() || cs.is_data() {
        return;
    }
    if cs.has_no_transforms() {
        let group = match converter {
            Transform::Group(_) => converter.clone(),
            other => Transform::group(vec![other.clone()]),
        };
        cs.set_to_reference(Some(group));
        return;
    }
    if let Some(to_ref) = cs.to_reference().cloned() {
        cs.set_to_reference(Some(Transform::group(vec![to_ref, converter.clone()])));
    }
    if let Some(from_ref) = cs.from_reference().cloned() {
        cs.set_from_reference(Some(Transform::group(vec![converter.clone().inverse(), from_ref])));
    }
}

/// Splices the scene and display converters into a view transform.
///
/// A scene-referred view transform goes from the scene reference to the
/// display reference, so the scene converter sits on the scene side and
/// the display converter on the display side. A display-referred one uses
/// the display converter on both sides.
pub fn update_reference_view_transform(vt: &mut ViewTransform, scene: &Transform, display: &Transform) {
    let source = match vt.reference_space() {
        ReferenceSpaceType::Scene => scene,
        ReferenceSpaceType::Display => display,
    };
    if source.is_empty_group() && display.is_empty_group() {
        return;
    }

    if let Some(from_ref) = vt.from_reference().cloned() {
        let mut steps = Vec::with_capacity(3);
        if !source.is_empty_group() {
            steps.push(source.clone().inverse());
        }
        steps.push(from_ref);
        if !display.is_empty_group() {
            steps.push(display.clone());
        }
        vt.set_from_reference(Some(Transform::group(steps)));
    }
    if let Some(to_ref) = vt.to_reference().cloned() {
        let mut steps = Vec::with_capacity(3);
        if !display.is_empty_group() {
            steps.push(display.clone().inverse());
        }
        steps.push(to_ref);
        if !source.is_empty_group() {
            steps.push(source.clone());
        }
        vt.set_to_reference(Some(Transform::group(steps)));
    }
}

/// Scene and display converters for one input/base pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceConverters {
    /// Input scene reference to base scene reference.
    pub scene: Transform,
    /// Input display reference to base display reference.
    pub display: Transform,
}

impl Default for ReferenceConverters {
    fn default() -> Self {
        Self::none()
    }
}

impl ReferenceConverters {
    /// Converters that leave everything untouched.
    pub fn none() -> Self {
        Self {
            scene: Transform::group(Vec::new()),
            display: Transform::group(Vec::new()),
        }
    }

    /// Builds both converters from `input` to `base`.
    ///
    /// A side whose reference cannot be identified falls back to an empty
    /// converter with a warning; any other failure is returned.
    pub fn build(input: &Config, base: &Config) -> MergeResult<Self> {
        Ok(Self {
            scene: recoverable(build_reference_converter(input, base, ReferenceSpaceType::Scene))?,
            display: recoverable(build_reference_converter(input, base, ReferenceSpaceType::Display))?,
        })
    }

    /// Converter for a reference space type.
    pub fn for_reference(&self, reference: ReferenceSpaceType) -> &Transform {
        match reference {
            ReferenceSpaceType::Scene => &self.scene,
            ReferenceSpaceType::Display => &self.display,
        }
    }

    /// True when neither side converts anything.
    pub fn is_empty(&self) -> bool {
        self.scene.is_empty_group() && self.display.is_empty_group()
    }
}

fn recoverable(result: MergeResult<Transform>) -> MergeResult<Transform> {
    match result {
        Err(
            e @ (MergeError::HeuristicsExhausted { .. }
            | MergeError::NoReferenceSpace { .. }
            | MergeError::DisplayHeuristicsUnsupported),
        ) => {
            warn!("reference space not adjusted: {e}");
            Ok(Transform::group(Vec::new()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vfx_ocio::primaries::{self, ACES_AP0, REC709};
    use crate::error::Side;
    use vfx_ocio::{role_names, MatrixTransform, ProcessorOp};

    fn rec709_config() -> Config {
        let mut config = Config::new();
        config.add_colorspace(ColorSpace::builder("lin_709").build());
        config.add_colorspace(
            ColorSpace::builder("ACES2065-1")
                .from_reference(Transform::matrix33(primaries::rows(&primaries::rgb_to_rgb(
                    &REC709, &ACES_AP0,
                ))))
                .build(),
        );
        config.set_role(role_names::ACES_INTERCHANGE, "ACES2065-1");
        config
    }

    fn single_matrix(t: &Transform) -> [f64; 16] {
        let proc = Processor::from_transform(t, TransformDirection::Forward).unwrap();
        match proc.ops() {
            [ProcessorOp::Matrix { matrix, .. }] => *matrix,
            other => panic!("expected one matrix, got {other:?}"),
        }
    }

    #[test]
    fn same_reference_is_empty() {
        let a = builtin::reference();
        let t = build_reference_converter(&a, &a, ReferenceSpaceType::Scene).unwrap();
        assert!(t.is_empty_group());
        let t = build_reference_converter(&a, &a, ReferenceSpaceType::Display).unwrap();
        assert!(t.is_empty_group());
    }

    #[test]
    fn absent_reference_type_is_empty() {
        let display = ReferenceSpaceType::Display;
        let t = build_reference_converter(&rec709_config(), &rec709_config(), display).unwrap();
        assert!(t.is_empty_group());
        let t = build_reference_converter(&rec709_config(), &Config::new(), display).unwrap();
        assert!(t.is_empty_group());
    }

    #[test]
    fn one_sided_reference_type_still_resolves() {
        // Only the destination has display spaces, so the interchange
        // space is looked up instead of skipped.
        let display = ReferenceSpaceType::Display;
        let err = build_reference_converter(&rec709_config(), &builtin::reference(), display).unwrap_err();
        assert!(matches!(err, MergeError::DisplayHeuristicsUnsupported));

        let mut src = rec709_config();
        src.set_role(role_names::CIE_XYZ_D65_INTERCHANGE, "missing");
        let err = build_reference_converter(&src, &builtin::reference(), display).unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingInterchangeRole {
                side: Side::Source,
                ..
            }
        ));

        let c = ReferenceConverters::build(&rec709_config(), &builtin::reference()).unwrap();
        assert!(c.display.is_empty_group());
    }

    #[test]
    fn rec709_to_aces() {
        let t = build_reference_converter(&rec709_config(), &builtin::reference(), ReferenceSpaceType::Scene)
            .unwrap();
        assert!(matches!(t, Transform::Matrix(_)));
        let m = single_matrix(&t);
        assert_relative_eq!(m[0], 0.4396330, epsilon = 1e-5);
        assert_relative_eq!(m[1], 0.3829887, epsilon = 1e-5);
        assert_relative_eq!(m[5], 0.8134394, epsilon = 1e-5);
        assert_relative_eq!(m[10], 0.8709123, epsilon = 1e-5);
    }

    #[test]
    fn color_space_gets_converter() {
        let converter: Transform = MatrixTransform::from_rows([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]).into();

        let mut bare = ColorSpace::builder("bare").build();
        update_reference_color_space(&mut bare, &converter);
        assert_eq!(bare.to_reference(), Some(&Transform::group(vec![converter.clone()])));

        let mut data = ColorSpace::builder("raw").is_data(true).build();
        update_reference_color_space(&mut data, &converter);
        assert!(data.has_no_transforms());

        let mut both = ColorSpace::builder("both")
            .to_reference(MatrixTransform::identity().into())
            .from_reference(MatrixTransform::identity().into())
            .build();
        update_reference_color_space(&mut both, &converter);
        let to_ref = single_matrix(both.to_reference().unwrap());
        assert_relative_eq!(to_ref[0], 2.0);
        let from_ref = single_matrix(both.from_reference().unwrap());
        assert_relative_eq!(from_ref[0], 0.5);

        let mut untouched = ColorSpace::builder("x").to_reference(MatrixTransform::identity().into()).build();
        update_reference_color_space(&mut untouched, &Transform::group(Vec::new()));
        assert_eq!(untouched.to_reference(), Some(&MatrixTransform::identity().into()));
    }

    #[test]
    fn view_transform_sides() {
        let scale = |k: f64| -> Transform { MatrixTransform::from_rows([[k, 0.0, 0.0], [0.0, k, 0.0], [0.0, 0.0, k]]).into() };
        let mut vt = ViewTransform::new("vt")
            .with_reference_space(ReferenceSpaceType::Scene)
            .with_from_reference(MatrixTransform::identity().into());
        update_reference_view_transform(&mut vt, &scale(2.0), &scale(3.0));
        // scene^-1 then display: 1/2 * 3
        let m = single_matrix(vt.from_reference().unwrap());
        assert_relative_eq!(m[0], 1.5, epsilon = 1e-12);
        assert!(vt.to_reference().is_none());

        let mut dvt = ViewTransform::new("dvt")
            .with_reference_space(ReferenceSpaceType::Display)
            .with_to_reference(MatrixTransform::identity().into());
        update_reference_view_transform(&mut dvt, &scale(2.0), &scale(3.0));
        let proc = Processor::from_transform(dvt.to_reference().unwrap(), TransformDirection::Forward).unwrap();
        assert!(proc.is_identity());
        match dvt.to_reference() {
            Some(Transform::Group(g)) => assert_eq!(g.transforms.len(), 3),
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn files_are_left_alone_when_absent() {
        let config = Config::new();
        let t: Transform = MatrixTransform::identity().into();
        assert_eq!(bake_file_transforms(&config, &t).unwrap(), t);
    }

    #[test]
    fn converters_for_same_config_are_empty() {
        let a = builtin::reference();
        let c = ReferenceConverters::build(&a, &a).unwrap();
        assert!(c.is_empty());
        assert!(c.for_reference(ReferenceSpaceType::Display).is_empty_group());
        assert_eq!(ReferenceConverters::default(), ReferenceConverters::none());
    }

    #[test]
    fn unidentifiable_reference_falls_back_to_empty() {
        let mut input = Config::new();
        input.add_colorspace(ColorSpace::builder("ref").build());
        input.add_colorspace(
            ColorSpace::builder("odd")
                .to_reference(Transform::matrix33([[0.5, 0.3, 0.2], [0.1, 0.8, 0.1], [0.3, 0.3, 0.4]]))
                .build(),
        );
        let c = ReferenceConverters::build(&input, &builtin::reference()).unwrap();
        assert!(c.scene.is_empty_group());
    }
}
