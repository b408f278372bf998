//! Named transform merging.
//!
//! Runs after the color spaces. Named transforms lose every name clash
//! against a color space or a role; between themselves the section
//! strategy decides. Base transforms are merged again too, so that they
//! get checked against the merged color spaces.

use tracing::{debug, trace};
use vfx_ocio::{Config, NamedTransform};

use super::{clean_up_inactive_list, update_family, MergeContext, SectionMerger};
use crate::error::{MergeError, MergeResult};
use crate::params::{MergeStrategy, Section};

/// Merges named transforms and prunes the inactive list afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedTransformsMerger;

fn input_wins(strategy: MergeStrategy) -> bool {
    matches!(strategy, MergeStrategy::PreferInput | MergeStrategy::InputOnly)
}

/// Name arbitration of one transform against `target`.
fn may_be_merged(ctx: &MergeContext<'_>, target: &Config, nt: &NamedTransform, from_base: bool) -> MergeResult<bool> {
    let name = nt.name();
    if target.has_role(name) {
        ctx.notify(&format!(
            "Named transform '{name}' was not merged as it's identical to a role name."
        ))?;
        return Ok(false);
    }
    if let Some(idx) = target.colorspace_index(name) {
        if target.colorspaces()[idx].name().eq_ignore_ascii_case(name) {
            ctx.notify(&format!(
                "Named transform '{name}' was not merged as there's a color space with that name."
            ))?;
        } else {
            ctx.notify(&format!(
                "Named transform '{name}' was not merged as there's a color space alias with that name."
            ))?;
        }
        return Ok(false);
    }
    let Some(existing) = target.named_transform(name) else {
        return Ok(true);
    };
    if from_base {
        ctx.notify(&format!(
            "Named transform '{name}' was not merged as there's more than one with that name in the base config."
        ))?;
        return Ok(false);
    }

    let wins = input_wins(ctx.strategy(Section::NamedTransforms));
    if existing.name().eq_ignore_ascii_case(name) {
        if wins {
            ctx.notify(&format!("Named transform '{name}' will replace a named transform in the base config."))?;
        } else {
            ctx.notify(&format!(
                "Named transform '{name}' was not merged as it's already present in the base config."
            ))?;
        }
    } else if wins {
        ctx.notify(&format!(
            "The name of merged named transform '{name}' has a conflict with an alias in named transform '{}'.",
            existing.name()
        ))?;
    } else {
        ctx.notify(&format!(
            "Named transform '{name}' was not merged as it conflicts with an alias in named transform '{}'.",
            existing.name()
        ))?;
    }
    Ok(wins)
}

/// Adds `nt` to `target`, resolving what its name and aliases collide with.
fn merge_one(
    ctx: &MergeContext<'_>,
    target: &mut Config,
    mut nt: NamedTransform,
    from_base: bool,
    added: &mut Vec<String>,
) -> MergeResult<()> {
    let name = nt.name().to_string();
    target.remove_named_transform(&name);
    if let Some(existing) = target.named_transform_mut(&name) {
        if !existing.has_alias(&name) {
            return Err(MergeError::Internal(format!("Problem merging named transform: '{name}'.")));
        }
        existing.remove_alias(&name);
    }

    let wins = !from_base && input_wins(ctx.strategy(Section::NamedTransforms));
    let source = if from_base { "Base" } else { "Input" };

    for alias in nt.aliases().to_vec() {
        if let Some(idx) = target.colorspace_index(&alias) {
            let cs = target.colorspaces()[idx].name();
            let message = if cs.eq_ignore_ascii_case(&alias) {
                format!("Merged {source} named transform '{name}' has an alias '{alias}' that conflicts with color space '{cs}'.")
            } else {
                format!("Merged {source} named transform '{name}' has a conflict with alias '{alias}' in color space '{cs}'.")
            };
            nt.remove_alias(&alias);
            ctx.notify(&message)?;
            continue;
        }
        if target.has_role(&alias) {
            nt.remove_alias(&alias);
            ctx.notify(&format!(
                "Merged {source} named transform '{name}' has an alias '{alias}' that conflicts with a role."
            ))?;
            continue;
        }

        let Some(other) = target.named_transform(&alias).map(|o| o.name().to_string()) else {
            continue;
        };
        if other.eq_ignore_ascii_case(&alias) {
            ctx.notify(&format!(
                "Merged {source} named transform '{name}' has an alias '{alias}' that conflicts with named transform '{other}'."
            ))?;
            if wins {
                target.remove_named_transform(&other);
            } else {
                nt.remove_alias(&alias);
            }
        } else {
            ctx.notify(&format!(
                "Merged {source} named transform '{name}' has a conflict with alias '{alias}' in named transform '{other}'."
            ))?;
            if wins {
                if let Some(other) = target.named_transform_mut(&other) {
                    other.remove_alias(&alias);
                }
            } else {
                nt.remove_alias(&alias);
            }
        }
    }

    trace!(named_transform = %name, from_base, "adding named transform");
    target.add_named_transform(nt);
    if !from_base {
        added.push(name);
    }
    Ok(())
}

fn merge_from(
    ctx: &MergeContext<'_>,
    target: &mut Config,
    source: &[NamedTransform],
    from_base: bool,
    added: &mut Vec<String>,
) -> MergeResult<()> {
    for nt in source {
        if may_be_merged(ctx, target, nt, from_base)? {
            merge_one(ctx, target, nt.clone(), from_base, added)?;
        }
    }
    Ok(())
}

fn with_family(ctx: &MergeContext<'_>, sep: char, nt: &NamedTransform, from_base: bool) -> NamedTransform {
    let mut nt = nt.clone();
    let family = update_family(ctx, sep, nt.family(), from_base);
    nt.set_family(family);
    nt
}

fn add_named_transforms(ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
    merged.clear_named_transforms();
    let mut temp = merged.clone();
    let mut added = Vec::new();
    merge_from(ctx, &mut temp, ctx.base.named_transforms(), true, &mut added)?;
    merge_from(ctx, &mut temp, ctx.input.named_transforms(), false, &mut added)?;

    let sep = merged.family_separator();
    let is_added = |name: &str| added.iter().any(|a| a.eq_ignore_ascii_case(name));
    let all = temp.named_transforms();
    let mut out = Vec::with_capacity(all.len());
    if ctx.params.input_first {
        for name in &added {
            if let Some(nt) = all.iter().find(|nt| nt.name().eq_ignore_ascii_case(name)) {
                out.push(with_family(ctx, sep, nt, false));
            }
        }
        for nt in all.iter().filter(|nt| !is_added(nt.name())) {
            out.push(with_family(ctx, sep, nt, true));
        }
    } else {
        for nt in all {
            out.push(with_family(ctx, sep, nt, !is_added(nt.name())));
        }
    }
    debug!(added = added.len(), total = out.len(), "named transforms merged");
    merged.set_named_transforms(out);
    clean_up_inactive_list(merged);
    Ok(())
}

impl SectionMerger for NamedTransformsMerger {
    fn name(&self) -> &'static str {
        "NamedTransforms"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::NamedTransforms)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        add_named_transforms(ctx, merged)
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        add_named_transforms(ctx, merged)
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_named_transforms();
        merge_from(ctx, merged, ctx.input.named_transforms(), false, &mut Vec::new())?;
        clean_up_inactive_list(merged);
        Ok(())
    }

    fn base_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_named_transforms();
        merge_from(ctx, merged, ctx.base.named_transforms(), true, &mut Vec::new())?;
        clean_up_inactive_list(merged);
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_named_transforms();
        let kept: Vec<NamedTransform> = ctx
            .base
            .named_transforms()
            .iter()
            .filter(|nt| ctx.input.named_transform(nt.name()).is_none())
            .cloned()
            .collect();
        merge_from(ctx, merged, &kept, true, &mut Vec::new())?;
        clean_up_inactive_list(merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ReferenceConverters;
    use crate::mergers::test_util::ctx;
    use crate::notify::CollectingSink;
    use crate::params::MergeParameters;
    use vfx_ocio::{ColorSpace, Transform};

    fn nt(name: &str, aliases: &[&str], family: &str) -> NamedTransform {
        let mut nt = NamedTransform::new(name, Transform::matrix33([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]));
        for alias in aliases {
            nt.add_alias(*alias);
        }
        nt.set_family(family);
        nt
    }

    fn base() -> Config {
        let mut config = Config::new();
        config.add_colorspace(ColorSpace::builder("lin").alias("linear").build());
        config.set_role("scene_linear", "lin");
        config.add_named_transform(nt("grade", &["g"], "Looks"));
        config.add_named_transform(nt("curve", &["c"], ""));
        config.set_inactive_colorspaces(vec!["curve".into(), "missing".into()]);
        config
    }

    fn input() -> Config {
        let mut config = Config::new();
        config.add_named_transform(nt("grade", &[], "Input"));
        config.add_named_transform(nt("linear", &[], ""));
        config.add_named_transform(nt("fresh", &["c", "lin", "scene_linear"], ""));
        config
    }

    fn run(params: &MergeParameters) -> (Config, CollectingSink) {
        let base = base();
        let input = input();
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        NamedTransformsMerger
            .merge(&ctx(&base, &input, params, &sink, &conv), &mut merged)
            .unwrap();
        (merged, sink)
    }

    fn names(config: &Config) -> Vec<&str> {
        config.named_transforms().iter().map(|nt| nt.name()).collect()
    }

    #[test]
    fn prefer_input() {
        let params = MergeParameters::new().with_input_family_prefix("In/");
        let (merged, sink) = run(&params);
        assert_eq!(names(&merged), ["grade", "fresh", "curve"]);
        assert_eq!(merged.named_transform("grade").unwrap().family(), "In/Input");
        assert!(merged.named_transform("g").is_none());
        assert!(merged.named_transform("curve").unwrap().aliases().is_empty());
        assert_eq!(merged.named_transform("fresh").unwrap().aliases(), ["c"]);
        assert_eq!(merged.inactive_colorspaces(), ["curve"]);
        assert_eq!(sink.warnings(), [
            "Named transform 'grade' will replace a named transform in the base config.",
            "Named transform 'linear' was not merged as there's a color space alias with that name.",
            "Merged Input named transform 'fresh' has a conflict with alias 'c' in named transform 'curve'.",
            "Merged Input named transform 'fresh' has an alias 'lin' that conflicts with color space 'lin'.",
            "Merged Input named transform 'fresh' has an alias 'scene_linear' that conflicts with a role.",
        ]);
    }

    #[test]
    fn prefer_base_keeps_base_transforms() {
        let params = MergeParameters::new()
            .with_strategy(Section::NamedTransforms, MergeStrategy::PreferBase)
            .with_input_first(false);
        let (merged, sink) = run(&params);
        assert_eq!(names(&merged), ["grade", "curve", "fresh"]);
        assert_eq!(merged.named_transform("grade").unwrap().aliases(), ["g"]);
        assert_eq!(merged.named_transform("curve").unwrap().aliases(), ["c"]);
        assert!(merged.named_transform("fresh").unwrap().aliases().is_empty());
        assert!(sink.contains("Named transform 'grade' was not merged as it's already present in the base config."));
    }

    #[test]
    fn base_transforms_yield_to_color_spaces() {
        let mut base = base();
        base.add_named_transform(nt("lin", &[], ""));
        let input = Config::new();
        let params = MergeParameters::new();
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        NamedTransformsMerger
            .merge(&ctx(&base, &input, &params, &sink, &conv), &mut merged)
            .unwrap();
        assert_eq!(names(&merged), ["grade", "curve"]);
        assert!(sink.contains("Named transform 'lin' was not merged as there's a color space with that name."));
    }

    #[test]
    fn fatal_on_conflict() {
        let base = base();
        let input = input();
        let params = MergeParameters::new().with_error_on_conflict(true);
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        let err = NamedTransformsMerger
            .merge(&ctx(&base, &input, &params, &sink, &conv), &mut merged)
            .unwrap_err();
        assert!(matches!(err, MergeError::Conflict(_)));
        assert_eq!(
            sink.fatal_message().as_deref(),
            Some("Named transform 'grade' will replace a named transform in the base config.")
        );
    }

    #[test]
    fn other_strategies() {
        let only = MergeParameters::new().with_strategy(Section::NamedTransforms, MergeStrategy::InputOnly);
        let (merged, _) = run(&only);
        assert_eq!(names(&merged), ["grade", "fresh"]);
        assert_eq!(merged.named_transform("fresh").unwrap().aliases(), ["c"]);
        assert!(merged.inactive_colorspaces().is_empty());

        let keep = MergeParameters::new().with_strategy(Section::NamedTransforms, MergeStrategy::BaseOnly);
        let (merged, sink) = run(&keep);
        assert_eq!(names(&merged), ["grade", "curve"]);
        assert!(sink.is_empty());

        let remove = MergeParameters::new().with_strategy(Section::NamedTransforms, MergeStrategy::Remove);
        let (merged, _) = run(&remove);
        assert_eq!(names(&merged), ["curve"]);
        assert_eq!(merged.inactive_colorspaces(), ["curve"]);
    }
}
