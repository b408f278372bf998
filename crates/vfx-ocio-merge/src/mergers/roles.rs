//! Role merging.

use tracing::trace;
use vfx_ocio::Config;

use super::{MergeContext, SectionMerger};
use crate::error::{MergeError, MergeResult};
use crate::params::{MergeStrategy, Section};

/// Merges the role table.
///
/// The strategy only decides between two definitions of the same role. An
/// input role never replaces a color space or named transform of the same
/// name; those are skipped with a conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolesMerger;

fn merge_input_roles(ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
    let strategy = ctx.strategy(Section::Roles);
    for (name, target) in ctx.input.roles().iter() {
        if let Some(current) = merged.roles().get(name) {
            if !current.eq_ignore_ascii_case(target) {
                if strategy.input_wins() {
                    merged.set_role(name, target);
                }
                ctx.notify(&format!(
                    "The Input config contains a role that would override Base config role '{name}'."
                ))?;
            }
            continue;
        }

        if let Some(cs) = merged.colorspace(name) {
            let message = if cs.name().eq_ignore_ascii_case(name) {
                format!(
                    "The Input config contains a role '{name}' that would override Base config color space '{}'.",
                    cs.name()
                )
            } else if cs.has_alias(name) {
                format!(
                    "The Input config contains a role '{name}' that would override an alias of Base config color space '{}'.",
                    cs.name()
                )
            } else {
                return Err(MergeError::Internal(format!(
                    "Problem merging role: '{name}' due to color space conflict."
                )));
            };
            ctx.notify(&message)?;
            continue;
        }

        if let Some(nt) = merged.named_transform(name) {
            let message = if nt.name().eq_ignore_ascii_case(name) {
                format!(
                    "The Input config contains a role '{name}' that would override Base config named transform: '{}'.",
                    nt.name()
                )
            } else {
                format!(
                    "The Input config contains a role '{name}' that would override an alias of Base config named transform: '{}'.",
                    nt.name()
                )
            };
            ctx.notify(&message)?;
            continue;
        }

        trace!(role = name, colorspace = target, "adding role");
        merged.set_role(name, target);
    }
    Ok(())
}

impl SectionMerger for RolesMerger {
    fn name(&self) -> &'static str {
        "Roles"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::Roles)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_input_roles(ctx, merged)
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_input_roles(ctx, merged)
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_roles();
        merge_input_roles(ctx, merged)
    }

    fn base_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        for (name, _) in ctx.input.roles().iter() {
            merged.unset_role(name);
        }
        Ok(())
    }
}
