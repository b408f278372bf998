//! View transforms and the default view transform.

use vfx_ocio::{Config, ViewTransform};

use super::{override_conflict, MergeContext, SectionMerger};
use crate::converter::{bake_file_transforms, update_reference_view_transform};
use crate::error::MergeResult;
use crate::params::{MergeStrategy, Section};

/// Merges `view_transforms` and `default_view_transform`.
///
/// Input view transforms moving into the merged config are rebased onto the
/// base reference spaces when `adjust_input_reference_space` is set.
/// Conflicts are detected on the transforms as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewTransformsMerger;

/// Family and description are not compared.
fn same_view_transform(a: &ViewTransform, b: &ViewTransform) -> bool {
    a.reference_space() == b.reference_space()
        && a.to_reference() == b.to_reference()
        && a.from_reference() == b.from_reference()
}

fn adapt(ctx: &MergeContext<'_>, vt: &ViewTransform, from_input: bool) -> MergeResult<ViewTransform> {
    let mut vt = vt.clone();
    if from_input && ctx.params.adjust_input_reference_space {
        if let Some(t) = vt.to_reference() {
            let baked = bake_file_transforms(ctx.input, t)?;
            vt.set_to_reference(Some(baked));
        }
        if let Some(t) = vt.from_reference() {
            let baked = bake_file_transforms(ctx.input, t)?;
            vt.set_from_reference(Some(baked));
        }
        update_reference_view_transform(&mut vt, &ctx.converters.scene, &ctx.converters.display);
    }
    Ok(vt)
}

fn merge_both(ctx: &MergeContext<'_>, merged: &mut Config, prefer_second: bool) -> MergeResult<()> {
    let (first, second) = ctx.ordered();
    let first_is_input = ctx.params.input_first;
    merged.clear_view_transforms();

    for vt in first.view_transforms() {
        let other = second.view_transform(vt.name());
        if let Some(other) = other {
            if !same_view_transform(vt, other) {
                ctx.notify(&override_conflict(&format!("view_transforms: {}", vt.name())))?;
            }
        }
        let adapted = match other {
            Some(other) if prefer_second => adapt(ctx, other, !first_is_input)?,
            _ => adapt(ctx, vt, first_is_input)?,
        };
        merged.add_view_transform(adapted);
    }
    for vt in second.view_transforms() {
        if merged.view_transform(vt.name()).is_none() {
            merged.add_view_transform(adapt(ctx, vt, !first_is_input)?);
        }
    }
    Ok(())
}

fn default_conflict(ctx: &MergeContext<'_>) -> MergeResult<()> {
    let base_name = ctx.base.default_view_transform();
    let input_name = ctx.input.default_view_transform();
    if !base_name.eq_ignore_ascii_case(input_name) {
        ctx.notify(&override_conflict(&format!("default_view_transform: {input_name}")))?;
    }
    Ok(())
}

impl SectionMerger for ViewTransformsMerger {
    fn name(&self) -> &'static str {
        "ViewTransforms"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::ViewTransforms)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_both(ctx, merged, !ctx.params.input_first)?;
        default_conflict(ctx)?;
        let input_name = ctx.input.default_view_transform();
        if !input_name.is_empty() {
            merged.set_default_view_transform(input_name);
        }
        Ok(())
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_both(ctx, merged, ctx.params.input_first)?;
        default_conflict(ctx)?;
        if ctx.base.default_view_transform().is_empty() {
            merged.set_default_view_transform(ctx.input.default_view_transform());
        }
        Ok(())
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_view_transforms();
        for vt in ctx.input.view_transforms() {
            merged.add_view_transform(adapt(ctx, vt, true)?);
        }
        merged.set_default_view_transform(ctx.input.default_view_transform());
        Ok(())
    }

    fn base_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_view_transforms();
        for vt in ctx.base.view_transforms() {
            if ctx.input.view_transform(vt.name()).is_none() {
                merged.add_view_transform(vt.clone());
            }
        }
        if merged.view_transform(ctx.base.default_view_transform()).is_none() {
            merged.set_default_view_transform("");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ReferenceConverters;
    use crate::mergers::test_util::{ctx, yaml};
    use crate::notify::CollectingSink;
    use crate::params::MergeParameters;
    use vfx_ocio::{MatrixTransform, ReferenceSpaceType, Transform};

    const BASE: &str = r#"
ocio_profile_version: 2
default_view_transform: SDR Video
view_transforms:
  - !<ViewTransform>
    name: SDR Video
    from_scene_reference: !<BuiltinTransform> {style: ACES-OUTPUT - ACES2065-1_to_CIE-XYZ-D65 - SDR-VIDEO_1.0}
  - !<ViewTransform>
    name: Un-tone-mapped
    from_scene_reference: !<MatrixTransform> {}
"#;

    const INPUT: &str = r#"
ocio_profile_version: 2
default_view_transform: Film
view_transforms:
  - !<ViewTransform>
    name: Film
    from_scene_reference: !<MatrixTransform> {}
  - !<ViewTransform>
    name: SDR Video
    description: same transform, new words
    from_scene_reference: !<BuiltinTransform> {style: ACES-OUTPUT - ACES2065-1_to_CIE-XYZ-D65 - SDR-VIDEO_1.0}
  - !<ViewTransform>
    name: Un-tone-mapped
    from_scene_reference: !<MatrixTransform> {offset: [0.1, 0, 0, 0]}
"#;

    fn run(params: &MergeParameters, converters: &ReferenceConverters) -> (Config, CollectingSink) {
        let base = yaml(BASE);
        let input = yaml(INPUT);
        let sink = CollectingSink::new();
        let mut merged = base.clone();
        ViewTransformsMerger
            .merge(&ctx(&base, &input, params, &sink, converters), &mut merged)
            .unwrap();
        (merged, sink)
    }

    fn names(config: &Config) -> Vec<&str> {
        config.view_transforms().iter().map(|vt| vt.name()).collect()
    }

    #[test]
    fn prefer_input_input_first() {
        let (merged, sink) = run(&MergeParameters::new(), &ReferenceConverters::none());
        assert_eq!(names(&merged), ["Film", "SDR Video", "Un-tone-mapped"]);
        assert_eq!(merged.default_view_transform(), "Film");
        assert_eq!(
            merged.view_transform("SDR Video").unwrap().description(),
            "same transform, new words"
        );
        assert_eq!(sink.warnings(), [
            "The Input config contains a value that would override the Base config: view_transforms: Un-tone-mapped",
            "The Input config contains a value that would override the Base config: default_view_transform: Film",
        ]);
    }

    #[test]
    fn prefer_base_keeps_base_default() {
        let params = MergeParameters::new()
            .with_strategy(Section::ViewTransforms, MergeStrategy::PreferBase)
            .with_input_first(false);
        let (merged, sink) = run(&params, &ReferenceConverters::none());
        assert_eq!(names(&merged), ["SDR Video", "Un-tone-mapped", "Film"]);
        assert_eq!(merged.default_view_transform(), "SDR Video");
        let untm = merged.view_transform("Un-tone-mapped").unwrap();
        assert_eq!(untm.from_reference(), Some(&Transform::from(MatrixTransform::identity())));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn input_transforms_get_converters() {
        let scale: Transform = MatrixTransform::from_rows([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]).into();
        let converters = ReferenceConverters {
            scene: scale,
            display: Transform::group(Vec::new()),
        };
        let (merged, _) = run(&MergeParameters::new(), &converters);
        let film = merged.view_transform("Film").unwrap();
        assert_eq!(film.reference_space(), ReferenceSpaceType::Scene);
        assert!(matches!(film.from_reference(), Some(Transform::Group(g)) if g.transforms.len() == 2));

        let params = MergeParameters::new().with_adjust_input_reference_space(false);
        let (merged, _) = run(&params, &converters);
        assert_eq!(
            merged.view_transform("Film").unwrap().from_reference(),
            Some(&Transform::from(MatrixTransform::identity()))
        );
    }

    #[test]
    fn input_only_and_remove() {
        let params = MergeParameters::new().with_strategy(Section::ViewTransforms, MergeStrategy::InputOnly);
        let (merged, _) = run(&params, &ReferenceConverters::none());
        assert_eq!(names(&merged), ["Film", "SDR Video", "Un-tone-mapped"]);
        assert_eq!(merged.default_view_transform(), "Film");

        let params = MergeParameters::new().with_strategy(Section::ViewTransforms, MergeStrategy::Remove);
        let (merged, _) = run(&params, &ReferenceConverters::none());
        assert!(names(&merged).is_empty());
        assert_eq!(merged.default_view_transform(), "");
    }
}
