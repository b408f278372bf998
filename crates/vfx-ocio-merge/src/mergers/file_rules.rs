//! File rule merging.
//!
//! The side listed first keeps its rule order. Rules only the other side
//! has are inserted just before `Default`.

use vfx_ocio::{Config, FileRules, DEFAULT_RULE_NAME};

use super::{override_conflict, MergeContext, SectionMerger};
use crate::error::MergeResult;
use crate::params::{MergeStrategy, Section};

/// Merges file rules and the strict-parsing flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRulesMerger;

fn conflict(ctx: &MergeContext<'_>, name: &str) -> MergeResult<()> {
    ctx.notify(&override_conflict(&format!("file_rules: {name}")))
}

/// Adds the rules of `other` that `merged` lacks; differing ones are
/// reported and left alone.
fn add_if_not_present(ctx: &MergeContext<'_>, other: &FileRules, merged: &mut FileRules) -> MergeResult<()> {
    for rule in other.rules() {
        match merged.get(rule.name()) {
            Some(existing) => {
                if !existing.is_equivalent(rule) {
                    conflict(ctx, rule.name())?;
                }
            }
            None => merged.push(rule.clone())?,
        }
    }
    Ok(())
}

/// Adds the rules of `other`, overwriting differing ones in place.
///
/// Only the color space of the `Default` rule is taken over; its custom
/// keys stay.
fn add_and_overwrite(ctx: &MergeContext<'_>, other: &FileRules, merged: &mut FileRules) -> MergeResult<()> {
    for rule in other.rules() {
        if rule.is_default() {
            let same = merged
                .default_rule()
                .is_some_and(|r| r.colorspace().eq_ignore_ascii_case(rule.colorspace()));
            if !same {
                merged.set_default_colorspace(rule.colorspace());
                conflict(ctx, rule.name())?;
            }
            continue;
        }
        match merged.index_of(rule.name()) {
            Some(idx) => {
                if !merged.rules()[idx].is_equivalent(rule) {
                    merged.replace_at(idx, rule.clone());
                    conflict(ctx, rule.name())?;
                }
            }
            None => merged.push(rule.clone())?,
        }
    }
    Ok(())
}

impl SectionMerger for FileRulesMerger {
    fn name(&self) -> &'static str {
        "FileRules"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::FileRules)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.set_strict_parsing(ctx.input.strict_parsing());
        let rules = if ctx.params.input_first {
            let mut rules = ctx.input.file_rules().clone();
            add_if_not_present(ctx, ctx.base.file_rules(), &mut rules)?;
            rules
        } else {
            let mut rules = ctx.base.file_rules().clone();
            add_and_overwrite(ctx, ctx.input.file_rules(), &mut rules)?;
            rules
        };
        merged.set_file_rules(rules);
        Ok(())
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        let rules = if ctx.params.input_first {
            let mut rules = ctx.input.file_rules().clone();
            add_and_overwrite(ctx, ctx.base.file_rules(), &mut rules)?;
            rules
        } else {
            let mut rules = ctx.base.file_rules().clone();
            add_if_not_present(ctx, ctx.input.file_rules(), &mut rules)?;
            rules
        };
        merged.set_file_rules(rules);
        Ok(())
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merged.set_strict_parsing(ctx.input.strict_parsing());
        merged.set_file_rules(ctx.input.file_rules().clone());
        Ok(())
    }

    fn base_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        let mut rules = ctx.base.file_rules().clone();
        for rule in ctx.input.file_rules().rules() {
            if !rule.name().eq_ignore_ascii_case(DEFAULT_RULE_NAME) {
                rules.remove(rule.name());
            }
        }
        merged.set_file_rules(rules);
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

    const BASE: &str = r#"
ocio_profile_version: 2
strictparsing: true
file_rules:
  - !<Rule> {name: LogC, colorspace: ARRI LogC, pattern: "*LogC*", extension: "*"}
  - !<Rule> {name: TIFF, colorspace: Gamma 2.2 AP1 - Texture, pattern: "*", extension: tif}
  - !<Rule> {name: OpenEXR, colorspace: ACEScg, pattern: "*", extension: exr}
  - !<Rule> {name: ColorSpaceNamePathSearch}
  - !<Rule> {name: Default, colorspace: Raw, custom: {owner: studio}}
"#;

    const INPUT: &str = r#"
ocio_profile_version: 2
strictparsing: false
file_rules:
  - !<Rule> {name: TIFF, colorspace: sRGB - Texture, pattern: "*", extension: tif, custom: {key1: value1, key2: value2}}
  - !<Rule> {name: JPEG, colorspace: Linear Rec.2020, regex: ".*\\.jpeg$"}
  - !<Rule> {name: ColorSpaceNamePathSearch}
  - !<Rule> {name: Default, colorspace: ACEScct - SomeOtherName}
"#;

    fn run(params: &MergeParameters) -> (Config, CollectingSink) {
        let base = yaml(BASE);
        let input = yaml(INPUT);
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        FileRulesMerger
            .merge(&ctx(&base, &input, params, &sink, &conv), &mut merged)
            .unwrap();
        (merged, sink)
    }

    fn names(config: &Config) -> Vec<&str> {
        config.file_rules().rules().iter().map(|r| r.name()).collect()
    }

    #[test]
    fn prefer_input_input_first() {
        let (merged, sink) = run(&MergeParameters::new());
        assert_eq!(
            names(&merged),
            ["TIFF", "JPEG", "ColorSpaceNamePathSearch", "LogC", "OpenEXR", "Default"]
        );
        let rules = merged.file_rules();
        let tiff = rules.get("TIFF").unwrap();
        assert_eq!(tiff.colorspace(), "sRGB - Texture");
        assert_eq!(tiff.custom_keys().len(), 2);
        assert_eq!(rules.default_rule().unwrap().colorspace(), "ACEScct - SomeOtherName");
        assert!(!merged.strict_parsing());
        assert_eq!(sink.warnings(), [
            "The Input config contains a value that would override the Base config: file_rules: TIFF",
            "The Input config contains a value that would override the Base config: file_rules: Default",
        ]);
    }

    #[test]
    fn prefer_input_base_first_overwrites_in_place() {
        let (merged, sink) = run(&MergeParameters::new().with_input_first(false));
        assert_eq!(
            names(&merged),
            ["LogC", "TIFF", "OpenEXR", "ColorSpaceNamePathSearch", "JPEG", "Default"]
        );
        assert_eq!(merged.file_rules().get("TIFF").unwrap().colorspace(), "sRGB - Texture");
        let default = merged.file_rules().default_rule().unwrap();
        assert_eq!(default.colorspace(), "ACEScct - SomeOtherName");
        assert_eq!(default.custom_keys(), [("owner".to_string(), "studio".to_string())]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn prefer_base_keeps_base_values() {
        let params = MergeParameters::new()
            .with_strategy(Section::FileRules, MergeStrategy::PreferBase)
            .with_input_first(false);
        let (merged, sink) = run(&params);
        assert_eq!(merged.file_rules().get("TIFF").unwrap().colorspace(), "Gamma 2.2 AP1 - Texture");
        assert_eq!(merged.file_rules().default_rule().unwrap().colorspace(), "Raw");
        assert!(merged.file_rules().get("JPEG").is_some());
        assert!(merged.strict_parsing());
        assert_eq!(sink.len(), 2);

        let params = params.with_input_first(true);
        let (merged, _) = run(&params);
        assert_eq!(names(&merged)[0], "TIFF");
        assert_eq!(merged.file_rules().get("TIFF").unwrap().colorspace(), "Gamma 2.2 AP1 - Texture");
        assert_eq!(merged.file_rules().default_rule().unwrap().colorspace(), "Raw");
    }

    #[test]
    fn input_only_and_remove() {
        let params = MergeParameters::new().with_strategy(Section::FileRules, MergeStrategy::InputOnly);
        let (merged, _) = run(&params);
        assert_eq!(names(&merged), ["TIFF", "JPEG", "ColorSpaceNamePathSearch", "Default"]);
        assert!(!merged.strict_parsing());

        let params = MergeParameters::new().with_strategy(Section::FileRules, MergeStrategy::Remove);
        let (merged, sink) = run(&params);
        assert_eq!(names(&merged), ["LogC", "OpenEXR", "Default"]);
        assert_eq!(merged.file_rules().default_rule().unwrap().colorspace(), "Raw");
        assert!(sink.is_empty());
    }
}
