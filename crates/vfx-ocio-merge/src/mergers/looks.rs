//! Look merging.

use vfx_ocio::{Config, Look};

use super::{MergeContext, SectionMerger};
use crate::error::MergeResult;
use crate::params::{MergeStrategy, Section};

/// Merges looks by name. Looks are not checked for conflicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksMerger;

fn add_missing(merged: &mut Config, looks: &[Look]) {
    for look in looks {
        if merged.look(look.name()).is_none() {
            merged.add_look(look.clone());
        }
    }
}

fn add_all(merged: &mut Config, looks: &[Look]) {
    for look in looks {
        merged.add_look(look.clone());
    }
}

impl SectionMerger for LooksMerger {
    fn name(&self) -> &'static str {
        "Looks"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::Looks)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_looks();
        if ctx.params.input_first {
            add_all(merged, ctx.input.looks());
            add_missing(merged, ctx.base.looks());
        } else {
            add_all(merged, ctx.base.looks());
            add_all(merged, ctx.input.looks());
        }
        Ok(())
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_looks();
        if ctx.params.input_first {
            add_all(merged, ctx.input.looks());
            add_all(merged, ctx.base.looks());
        } else {
            add_all(merged, ctx.base.looks());
            add_missing(merged, ctx.input.looks());
        }
        Ok(())
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.clear_looks();
        add_all(merged, ctx.input.looks());
        Ok(())
    }

    fn base_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        for look in ctx.input.looks() {
            merged.remove_look(look.name());
        }
        Ok(())
    }
}
