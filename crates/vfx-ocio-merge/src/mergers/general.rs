//! Config name, description, luma and profile version.

use vfx_ocio::{Config, ConfigVersion};

use super::{MergeContext, SectionMerger};
use crate::error::MergeResult;
use crate::params::MergeStrategy;

/// Merges the top-level scalars.
///
/// Always runs with the default strategy. The merged version is the larger
/// of the two, never below 2.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralMerger;

/// Profile version of a merge of `a` and `b`.
pub fn merged_version(a: ConfigVersion, b: ConfigVersion) -> ConfigVersion {
    a.max(b).max(ConfigVersion::V2_0)
}

fn apply(ctx: &MergeContext<'_>, merged: &mut Config, source: Option<&Config>) {
    let overrides = &ctx.params.overrides;
    if !overrides.name.is_empty() {
        merged.set_name(overrides.name.clone());
    } else if let Some(source) = source {
        merged.set_name(source.name());
    }
    if !overrides.description.is_empty() {
        merged.set_description(overrides.description.clone());
    } else if let Some(source) = source {
        merged.set_description(source.description());
    }
    if let Some(source) = source {
        merged.set_default_luma(source.default_luma());
    }
    merged.set_version(merged_version(ctx.base.version(), ctx.input.version()));
}

impl SectionMerger for GeneralMerger {
    fn name(&self) -> &'static str {
        "General"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.params.default_strategy
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply(ctx, merged, Some(ctx.input));
        Ok(())
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply(ctx, merged, Some(ctx.input));
        Ok(())
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply(ctx, merged, Some(ctx.base));
        Ok(())
    }

    fn base_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply(ctx, merged, Some(ctx.base));
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply(ctx, merged, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ReferenceConverters;
    use crate::mergers::test_util;
    use crate::notify::CollectingSink;
    use crate::params::{MergeParameters, Overrides};

    fn pair() -> (Config, Config) {
        let mut base = Config::new();
        base.set_name("base");
        base.set_description("base desc");
        base.set_default_luma([0.3, 0.6, 0.1]);
        let mut input = Config::new();
        input.set_name("input");
        input.set_description("input desc");
        input.set_version(ConfigVersion::new(2, 3));
        (base, input)
    }

    fn run(params: &MergeParameters) -> Config {
        let (base, input) = pair();
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let ctx = test_util::ctx(&base, &input, params, &sink, &conv);
        let mut merged = base.clone();
        GeneralMerger.merge(&ctx, &mut merged).unwrap();
        assert!(sink.is_empty());
        merged
    }

    #[test]
    fn prefer_input_takes_input_scalars() {
        let merged = run(&MergeParameters::new());
        assert_eq!(merged.name(), "input");
        assert_eq!(merged.description(), "input desc");
        assert_eq!(merged.default_luma(), vfx_ocio::DEFAULT_LUMA);
        assert_eq!(merged.version(), ConfigVersion::new(2, 3));
    }

    #[test]
    fn prefer_base_keeps_base_scalars_with_overrides() {
        let params = MergeParameters::new()
            .with_default_strategy(MergeStrategy::PreferBase)
            .with_overrides(Overrides {
                name: "forced".into(),
                ..Overrides::default()
            });
        let merged = run(&params);
        assert_eq!(merged.name(), "forced");
        assert_eq!(merged.description(), "base desc");
        assert_eq!(merged.default_luma(), [0.3, 0.6, 0.1]);
        assert_eq!(merged.version(), ConfigVersion::new(2, 3));
    }

    #[test]
    fn version_never_drops_below_two() {
        let v = merged_version(ConfigVersion::new(1, 0), ConfigVersion::new(1, 2));
        assert_eq!(v, ConfigVersion::V2_0);
        let v = merged_version(ConfigVersion::new(2, 4), ConfigVersion::new(2, 1));
        assert_eq!(v, ConfigVersion::new(2, 4));
    }
}
