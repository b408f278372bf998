//! Color space merging, plus the environment, search path, inactive list
//! and family separator.
//!
//! Input color spaces are rebased onto the base reference spaces first.
//! With `avoid_duplicates` an input space numerically equal to a base space
//! collapses with it: under `PreferInput` the input space survives and takes
//! the base names as aliases, under `PreferBase` it is the other way round.
//! Remaining spaces go through name arbitration and alias cleanup before
//! being added.

use tracing::{debug, trace};
use vfx_ocio::{ColorSpace, Config};

use super::{merge_lists, subtract_list, update_family, MergeContext, SectionMerger};
use crate::converter::update_reference_color_space;
use crate::error::{MergeError, MergeResult};
use crate::fingerprint::FingerprintIndex;
use crate::params::{MergeStrategy, Section};

/// Merges color spaces and the config-wide values tied to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorSpacesMerger;

fn set_environment(merged: &mut Config, vars: &[(String, String)]) {
    merged.clear_environment();
    for (name, value) in vars {
        merged.set_env_var(name.as_str(), value.as_str());
    }
}

fn merge_environment(ctx: &MergeContext<'_>, merged: &mut Config, strategy: MergeStrategy) {
    let overrides = &ctx.params.overrides.environment;
    if !overrides.is_empty() {
        set_environment(merged, overrides);
        return;
    }
    match strategy {
        MergeStrategy::PreferInput => {
            for (name, value) in ctx.input.environment() {
                merged.set_env_var(name.as_str(), value.as_str());
            }
        }
        MergeStrategy::PreferBase => {
            for (name, value) in ctx.input.environment() {
                if merged.env_var(name).is_none_or(str::is_empty) {
                    merged.set_env_var(name.as_str(), value.as_str());
                }
            }
        }
        MergeStrategy::InputOnly => set_environment(merged, ctx.input.environment()),
        MergeStrategy::Remove => {
            let kept: Vec<(String, String)> = merged
                .environment()
                .iter()
                .filter(|(name, _)| ctx.input.env_var(name).is_none())
                .cloned()
                .collect();
            set_environment(merged, &kept);
        }
        MergeStrategy::BaseOnly | MergeStrategy::Unset => {}
    }
}

fn merge_search_paths(ctx: &MergeContext<'_>, merged: &mut Config, strategy: MergeStrategy) {
    let overrides = &ctx.params.overrides.search_path;
    if !overrides.is_empty() {
        merged.set_search_paths(overrides.clone());
        return;
    }
    let contains = |list: &[String], path: &str| list.iter().any(|p| p.eq_ignore_ascii_case(path));
    let base = ctx.base.search_paths();
    let input = ctx.input.search_paths();
    let paths = match strategy {
        MergeStrategy::PreferInput | MergeStrategy::PreferBase => {
            let (first, second) = if ctx.params.input_first { (input, base) } else { (base, input) };
            let mut paths = first.to_vec();
            for path in second {
                if !contains(first, path) {
                    paths.push(path.clone());
                }
            }
            paths
        }
        MergeStrategy::InputOnly => input.to_vec(),
        MergeStrategy::Remove => base.iter().filter(|p| !contains(input, p)).cloned().collect(),
        MergeStrategy::BaseOnly | MergeStrategy::Unset => return,
    };
    merged.set_search_paths(paths);
}

fn merge_inactive(ctx: &MergeContext<'_>, merged: &mut Config, strategy: MergeStrategy) {
    let overrides = &ctx.params.overrides.inactive_colorspaces;
    if !overrides.is_empty() {
        merged.set_inactive_colorspaces(overrides.clone());
        return;
    }
    let (first, second) = ctx.ordered();
    let list = match strategy {
        MergeStrategy::PreferInput | MergeStrategy::PreferBase => {
            merge_lists(first.inactive_colorspaces(), second.inactive_colorspaces())
        }
        MergeStrategy::InputOnly => ctx.input.inactive_colorspaces().to_vec(),
        MergeStrategy::Remove => subtract_list(ctx.base.inactive_colorspaces(), ctx.input.inactive_colorspaces()),
        MergeStrategy::BaseOnly | MergeStrategy::Unset => return,
    };
    merged.set_inactive_colorspaces(list);
}

fn merge_config_values(ctx: &MergeContext<'_>, merged: &mut Config, strategy: MergeStrategy) {
    merge_environment(ctx, merged, strategy);
    merge_search_paths(ctx, merged, strategy);
    merge_inactive(ctx, merged, strategy);
    if matches!(strategy, MergeStrategy::PreferInput | MergeStrategy::InputOnly) {
        merged.set_family_separator(ctx.input.family_separator());
    }
}

/// Outcome of the duplicate check for one input space.
enum Duplicate {
    /// Carry on with the regular merge.
    Merge,
    /// The base space absorbed the input one.
    Absorbed,
}

fn handle_duplicate(
    ctx: &MergeContext<'_>,
    strategy: MergeStrategy,
    index: &mut FingerprintIndex,
    temp: &mut Config,
    cs: &mut ColorSpace,
) -> MergeResult<Duplicate> {
    let Some(dupe) = index.find_equivalent(ctx.input, cs).map(str::to_string) else {
        return Ok(Duplicate::Merge);
    };
    let Some(base_cs) = temp.colorspace_index(&dupe).map(|i| temp.colorspaces()[i].clone()) else {
        return Ok(Duplicate::Merge);
    };
    trace!(input = cs.name(), base = %dupe, "equivalent color spaces");

    match strategy {
        MergeStrategy::PreferInput => {
            cs.add_alias(base_cs.name());
            for alias in base_cs.aliases() {
                cs.add_alias(alias.as_str());
            }
            temp.remove_colorspace(base_cs.name());
            index.remove(base_cs.name());
            ctx.warn(&format!(
                "Input color space '{}' is a duplicate of base color space '{}' and replaces it.",
                cs.name(),
                base_cs.name()
            ));
            Ok(Duplicate::Merge)
        }
        MergeStrategy::PreferBase => {
            let mut kept = base_cs;
            let names: Vec<String> = std::iter::once(cs.name().to_string())
                .chain(cs.aliases().iter().cloned())
                .collect();
            for alias in names {
                if kept.matches_name(&alias) {
                    continue;
                }
                if let Some(other) = temp.colorspace(&alias) {
                    ctx.notify(&format!(
                        "Input color space '{}' is a duplicate of base color space '{}' but was unable to add alias '{}' since it conflicts with base color space '{}'.",
                        cs.name(),
                        kept.name(),
                        alias,
                        other.name()
                    ))?;
                    continue;
                }
                kept.add_alias(alias);
            }
            ctx.warn(&format!(
                "Input color space '{}' is a duplicate of base color space '{}' and was merged into it.",
                cs.name(),
                kept.name()
            ));
            temp.add_colorspace(kept);
            Ok(Duplicate::Absorbed)
        }
        _ => Ok(Duplicate::Merge),
    }
}

/// Name arbitration against the partial result.
fn may_be_merged(ctx: &MergeContext<'_>, strategy: MergeStrategy, temp: &Config, cs: &ColorSpace) -> MergeResult<bool> {
    let name = cs.name();
    if temp.has_role(name) {
        ctx.notify(&format!(
            "Color space '{name}' was not merged as it's identical to a role name."
        ))?;
        return Ok(false);
    }
    let Some(existing) = temp.colorspace_index(name).map(|i| &temp.colorspaces()[i]) else {
        return Ok(true);
    };
    let input_wins = strategy.input_wins();
    if existing.name().eq_ignore_ascii_case(name) {
        if input_wins {
            ctx.notify(&format!("Color space '{name}' will replace a color space in the base config."))?;
        } else {
            ctx.notify(&format!(
                "Color space '{name}' was not merged as it's already present in the base config."
            ))?;
        }
    } else if input_wins {
        ctx.notify(&format!(
            "The name of merged color space '{name}' has a conflict with an alias in color space '{}'.",
            existing.name()
        ))?;
    } else {
        ctx.notify(&format!(
            "Color space '{name}' was not merged as it conflicts with an alias in color space '{}'.",
            existing.name()
        ))?;
    }
    Ok(input_wins)
}

/// Adds `cs` to `temp`, resolving what its name and aliases collide with.
fn merge_one(
    ctx: &MergeContext<'_>,
    strategy: MergeStrategy,
    temp: &mut Config,
    mut cs: ColorSpace,
    added: &mut Vec<String>,
) -> MergeResult<()> {
    let name = cs.name().to_string();
    let input_wins = strategy.input_wins();

    if let Some(replaced) = temp.remove_colorspace(&name) {
        if replaced.reference_space() != cs.reference_space() {
            ctx.warn(&format!(
                "Merged color space '{name}' has a different reference space type than the color space it's replacing."
            ));
        }
    }
    if let Some(existing) = temp.colorspace_mut(&name) {
        if !existing.has_alias(&name) {
            return Err(MergeError::Internal(format!("Problem merging color space: '{name}'.")));
        }
        existing.remove_alias(&name);
    }

    for alias in cs.aliases().to_vec() {
        if let Some(idx) = temp.colorspace_index(&alias) {
            let other = temp.colorspaces()[idx].name().to_string();
            if other.eq_ignore_ascii_case(&alias) {
                ctx.notify(&format!(
                    "Merged color space '{name}' has an alias '{alias}' that conflicts with color space '{other}'."
                ))?;
                if input_wins {
                    temp.remove_colorspace(&other);
                } else {
                    cs.remove_alias(&alias);
                }
            } else {
                ctx.notify(&format!(
                    "Merged color space '{name}' has a conflict with alias '{alias}' in color space '{other}'."
                ))?;
                if input_wins {
                    if let Some(other) = temp.colorspace_mut(&other) {
                        other.remove_alias(&alias);
                    }
                } else {
                    cs.remove_alias(&alias);
                }
            }
        } else if temp.has_role(&alias) {
            ctx.notify(&format!(
                "Merged color space '{name}' has an alias '{alias}' that conflicts with a role."
            ))?;
            cs.remove_alias(&alias);
        }
    }

    trace!(colorspace = %name, "adding color space");
    temp.add_colorspace(cs);
    added.push(name);
    Ok(())
}

fn with_family(ctx: &MergeContext<'_>, sep: char, cs: &ColorSpace, from_base: bool) -> ColorSpace {
    let mut cs = cs.clone();
    let family = update_family(ctx, sep, cs.family(), from_base);
    cs.set_family(family);
    cs
}

/// Writes the spaces of `temp` into `merged`, ordered by `input_first`.
fn reorder(ctx: &MergeContext<'_>, merged: &mut Config, temp: &Config, added: &[String]) {
    let sep = merged.family_separator();
    let is_added = |name: &str| added.iter().any(|a| a.eq_ignore_ascii_case(name));
    let mut out = Vec::with_capacity(temp.colorspaces().len());
    if ctx.params.input_first {
        for name in added {
            if let Some(cs) = temp.colorspaces().iter().find(|cs| cs.name().eq_ignore_ascii_case(name)) {
                out.push(with_family(ctx, sep, cs, false));
            }
        }
        for cs in temp.colorspaces().iter().filter(|cs| !is_added(cs.name())) {
            out.push(with_family(ctx, sep, cs, true));
        }
    } else {
        for cs in temp.colorspaces() {
            out.push(with_family(ctx, sep, cs, !is_added(cs.name())));
        }
    }
    merged.set_colorspaces(out);
}

fn add_color_spaces(ctx: &MergeContext<'_>, merged: &mut Config, strategy: MergeStrategy) -> MergeResult<()> {
    merged.clear_named_transforms();
    let mut temp = merged.clone();
    let mut index = ctx.params.avoid_duplicates.then(|| FingerprintIndex::build(ctx.base));
    let mut added = Vec::new();

    for input_cs in ctx.input.colorspaces() {
        let mut cs = input_cs.clone();
        if ctx.params.adjust_input_reference_space {
            let reference = cs.reference_space();
            update_reference_color_space(&mut cs, ctx.converters.for_reference(reference));
        }
        if let Some(index) = index.as_mut() {
            if let Duplicate::Absorbed = handle_duplicate(ctx, strategy, index, &mut temp, &mut cs)? {
                continue;
            }
        }
        if may_be_merged(ctx, strategy, &temp, &cs)? {
            merge_one(ctx, strategy, &mut temp, cs, &mut added)?;
        }
    }
    debug!(added = added.len(), total = temp.colorspaces().len(), "color spaces merged");
    reorder(ctx, merged, &temp, &added);
    Ok(())
}

impl SectionMerger for ColorSpacesMerger {
    fn name(&self) -> &'static str {
        "ColorSpaces"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::ColorSpaces)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_config_values(ctx, merged, MergeStrategy::PreferInput);
        add_color_spaces(ctx, merged, MergeStrategy::PreferInput)
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_config_values(ctx, merged, MergeStrategy::PreferBase);
        add_color_spaces(ctx, merged, MergeStrategy::PreferBase)
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_config_values(ctx, merged, MergeStrategy::InputOnly);
        merged.clear_colorspaces();
        merged.clear_named_transforms();
        for cs in ctx.input.colorspaces() {
            merged.add_colorspace(cs.clone());
        }
        Ok(())
    }

    fn base_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_config_values(ctx, merged, MergeStrategy::BaseOnly);
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_config_values(ctx, merged, MergeStrategy::Remove);
        for cs in ctx.input.colorspaces() {
            merged.remove_colorspace(cs.name());
        }
        Ok(())
    }
}
