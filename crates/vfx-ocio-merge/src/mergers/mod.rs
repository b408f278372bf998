//! Section mergers.
//!
//! Each config section has its own merger. A merger reads the base and
//! input configs from a [`MergeContext`] and writes into the merged config,
//! which starts out as a copy of the base. Mergers run in a fixed order
//! since later sections look at what earlier ones produced: named
//! transforms check against merged color spaces, color spaces check against
//! merged roles.

mod colorspaces;
mod display_views;
mod file_rules;
mod general;
mod looks;
mod named_transforms;
mod roles;
mod view_transforms;

pub use colorspaces::ColorSpacesMerger;
pub use display_views::DisplayViewsMerger;
pub use file_rules::FileRulesMerger;
pub use general::{merged_version, GeneralMerger};
pub use looks::LooksMerger;
pub use named_transforms::NamedTransformsMerger;
pub use roles::RolesMerger;
pub use view_transforms::ViewTransformsMerger;

use tracing::{debug, warn};
use vfx_ocio::Config;

use crate::converter::ReferenceConverters;
use crate::error::MergeResult;
use crate::notify::{notify, ConflictSink};
use crate::params::{MergeParameters, MergeStrategy, Section};

/// Everything a section merger reads.
pub struct MergeContext<'a> {
    /// Config merged into.
    pub base: &'a Config,
    /// Config merged from.
    pub input: &'a Config,
    /// Merge parameters.
    pub params: &'a MergeParameters,
    /// Conflict receiver.
    pub sink: &'a dyn ConflictSink,
    /// Input-to-base reference converters.
    pub converters: &'a ReferenceConverters,
}

impl<'a> MergeContext<'a> {
    /// Reports a conflict, failing when `error_on_conflict` is set.
    pub fn notify(&self, message: &str) -> MergeResult<()> {
        notify(self.sink, message, self.params.error_on_conflict)
    }

    /// Reports a conflict that never aborts the merge.
    pub fn warn(&self, message: &str) {
        self.sink.warn(message);
    }

    /// Effective strategy of a section.
    pub fn strategy(&self, section: Section) -> MergeStrategy {
        self.params.strategy(section)
    }

    /// The pair `(first, second)` in `input_first` order.
    pub fn ordered(&self) -> (&'a Config, &'a Config) {
        if self.params.input_first {
            (self.input, self.base)
        } else {
            (self.base, self.input)
        }
    }
}

/// Message for an input value that replaces a differing base value.
pub(crate) fn override_conflict(what: &str) -> String {
    format!("The Input config contains a value that would override the Base config: {what}")
}

/// Merges one config section.
///
/// Every strategy has its own handler. Handlers a section does not support
/// keep the default, which logs and leaves the merged config alone.
pub trait SectionMerger {
    /// Section name for messages.
    fn name(&self) -> &'static str;

    /// Strategy this merger runs with.
    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy;

    /// Both sides kept, input wins conflicts.
    fn prefer_input(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        unsupported(self.name(), MergeStrategy::PreferInput);
        Ok(())
    }

    /// Both sides kept, base wins conflicts.
    fn prefer_base(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        unsupported(self.name(), MergeStrategy::PreferBase);
        Ok(())
    }

    /// Only the input side is kept.
    fn input_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        unsupported(self.name(), MergeStrategy::InputOnly);
        Ok(())
    }

    /// Only the base side is kept.
    fn base_only(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        unsupported(self.name(), MergeStrategy::BaseOnly);
        Ok(())
    }

    /// Input items are removed from the base.
    fn remove(&self, _ctx: &MergeContext<'_>, _merged: &mut Config) -> MergeResult<()> {
        unsupported(self.name(), MergeStrategy::Remove);
        Ok(())
    }

    /// Runs the handler of the effective strategy.
    fn merge(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        let strategy = self.strategy(ctx);
        debug!(section = self.name(), %strategy, "merging section");
        match strategy {
            MergeStrategy::PreferInput => self.prefer_input(ctx, merged),
            MergeStrategy::PreferBase => self.prefer_base(ctx, merged),
            MergeStrategy::InputOnly => self.input_only(ctx, merged),
            MergeStrategy::BaseOnly => self.base_only(ctx, merged),
            MergeStrategy::Remove => self.remove(ctx, merged),
            MergeStrategy::Unset => {
                unsupported(self.name(), strategy);
                Ok(())
            }
        }
    }
}

fn unsupported(name: &str, strategy: MergeStrategy) {
    warn!("{name} section does not support strategy '{strategy}'");
}

/// The mergers in the order they run.
pub fn section_mergers() -> [&'static dyn SectionMerger; 8] {
    [
        &GeneralMerger,
        &RolesMerger,
        &FileRulesMerger,
        &DisplayViewsMerger,
        &ViewTransformsMerger,
        &LooksMerger,
        &ColorSpacesMerger,
        &NamedTransformsMerger,
    ]
}

/// Runs every section merger on `merged`.
pub fn merge_all(ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
    for merger in section_mergers() {
        merger.merge(ctx, merged)?;
    }
    Ok(())
}

/// Entries of `first` then the entries of `second` not already present.
///
/// Entries are trimmed and empty ones dropped. Matching is exact.
pub(crate) fn merge_lists(first: &[String], second: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in first.iter().chain(second) {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Entries of `base` absent from `input`, trimmed.
pub(crate) fn subtract_list(base: &[String], input: &[String]) -> Vec<String> {
    base.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && !input.iter().any(|i| i.trim() == *s))
        .map(str::to_string)
        .collect()
}

/// Family of a merged item, rewritten to the merged separator and prefixed.
///
/// Base items get the base prefix and input items the input prefix. The
/// side whose separator differs from the merged one has its family
/// rewritten.
pub(crate) fn update_family(ctx: &MergeContext<'_>, merged_sep: char, family: &str, from_base: bool) -> String {
    let strategy = ctx.strategy(Section::ColorSpaces);
    let (prefix, source_sep) = match (strategy, from_base) {
        (MergeStrategy::PreferInput, true) => (&ctx.params.base_family_prefix, Some(ctx.base.family_separator())),
        (MergeStrategy::PreferInput, false) => (&ctx.params.input_family_prefix, None),
        (MergeStrategy::PreferBase, true) => (&ctx.params.base_family_prefix, None),
        (MergeStrategy::PreferBase, false) => (&ctx.params.input_family_prefix, Some(ctx.input.family_separator())),
        _ => return family.to_string(),
    };
    let family = match source_sep {
        Some(sep) if sep != merged_sep => family.replace(sep, &merged_sep.to_string()),
        _ => family.to_string(),
    };
    let prefix = prefix.replace('/', &merged_sep.to_string());
    format!("{prefix}{family}")
}

/// Drops inactive entries that name neither a color space nor a named
/// transform of `merged`.
pub(crate) fn clean_up_inactive_list(merged: &mut Config) {
    let kept: Vec<String> = merged
        .inactive_colorspaces()
        .iter()
        .filter(|name| {
            merged.colorspaces().iter().any(|cs| cs.name().eq_ignore_ascii_case(name))
                || merged.named_transforms().iter().any(|nt| nt.name().eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect();
    if kept.len() != merged.inactive_colorspaces().len() {
        debug!(kept = kept.len(), "pruned inactive list");
        merged.set_inactive_colorspaces(kept);
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use vfx_ocio::Config;

    use super::MergeContext;
    use crate::converter::ReferenceConverters;
    use crate::notify::CollectingSink;
    use crate::params::MergeParameters;

    pub fn yaml(text: &str) -> Config {
        Config::from_yaml_str(text, ".".into()).unwrap()
    }

    pub fn ctx<'a>(
        base: &'a Config,
        input: &'a Config,
        params: &'a MergeParameters,
        sink: &'a CollectingSink,
        converters: &'a ReferenceConverters,
    ) -> MergeContext<'a> {
        MergeContext {
            base,
            input,
            params,
            sink,
            converters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingSink;
    use vfx_ocio::{ColorSpace, NamedTransform, Transform};

    #[test]
    fn lists_merge_in_order() {
        let a = vec!["A".to_string(), " B ".to_string(), String::new()];
        let b = vec!["C".to_string(), "A".to_string(), "b".to_string()];
        assert_eq!(merge_lists(&a, &b), ["A", "B", "C", "b"]);
        assert_eq!(subtract_list(&b, &a), ["C", "b"]);
    }

    #[test]
    fn family_prefixes() {
        let mut base = Config::new();
        base.set_family_separator('#');
        let input = Config::new();
        let params = MergeParameters::new()
            .with_base_family_prefix("Base/")
            .with_input_family_prefix("Input/");
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let ctx = test_util::ctx(&base, &input, &params, &sink, &conv);

        assert_eq!(update_family(&ctx, '/', "ACES#Utility", true), "Base/ACES/Utility");
        assert_eq!(update_family(&ctx, '/', "ACES", false), "Input/ACES");
        assert_eq!(update_family(&ctx, '/', "", false), "Input/");

        let params = params.clone().with_default_strategy(MergeStrategy::InputOnly);
        let ctx = test_util::ctx(&base, &input, &params, &sink, &conv);
        assert_eq!(update_family(&ctx, '/', "ACES", false), "ACES");
    }

    #[test]
    fn inactive_list_keeps_known_names() {
        let mut merged = Config::new();
        merged.add_colorspace(ColorSpace::builder("lin").alias("linear").build());
        merged.add_named_transform(NamedTransform::new("nt", Transform::group(Vec::new())));
        merged.set_inactive_colorspaces(vec!["LIN".into(), "linear".into(), "nt".into(), "gone".into()]);
        clean_up_inactive_list(&mut merged);
        assert_eq!(merged.inactive_colorspaces(), ["LIN", "nt"]);
    }

    #[test]
    fn unset_strategy_leaves_config_alone() {
        let base = Config::new();
        let mut input = Config::new();
        input.set_role("scene_linear", "lin");
        let params = MergeParameters::new().with_default_strategy(MergeStrategy::Unset);
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let ctx = test_util::ctx(&base, &input, &params, &sink, &conv);
        let mut merged = base.clone();
        RolesMerger.merge(&ctx, &mut merged).unwrap();
        assert!(merged.roles().is_empty());
    }
}
