//! Running merges.
//!
//! [`merge_config_pair`] merges two loaded configs. [`ConfigMerger`] runs a
//! whole [`MergeRecipe`], loading configs by name and feeding each result
//! to the merges after it.

use std::path::PathBuf;

use tracing::{debug, warn};
use vfx_ocio::{builtin, validate_config, ColorSpace, Config, Severity};

use crate::converter::ReferenceConverters;
use crate::error::{MergeError, MergeResult};
use crate::mergers::{merge_all, ColorSpacesMerger, MergeContext, NamedTransformsMerger, SectionMerger};
use crate::notify::{ConflictSink, TracingSink};
use crate::params::{MergeParameters, MergeStrategy, Section};
use crate::recipe::MergeRecipe;

/// Logs what a merge left dangling.
fn report_dangling(merged: &Config) {
    for issue in validate_config(merged) {
        if issue.severity != Severity::Info {
            warn!(config = merged.name(), "merged config: {}", issue.message);
        }
    }
}

/// Merges `input` into a copy of `base`.
///
/// Sections are merged in a fixed order, each seeing what the earlier ones
/// produced. A fatal conflict returns the error and drops the partial
/// result.
pub fn merge_config_pair(
    params: &MergeParameters,
    base: &Config,
    input: &Config,
    sink: &dyn ConflictSink,
) -> MergeResult<Config> {
    let converters = if params.adjust_input_reference_space {
        ReferenceConverters::build(input, base)?
    } else {
        ReferenceConverters::none()
    };
    debug!(
        base = base.name(),
        input = input.name(),
        adjusted = !converters.is_empty(),
        "merging configs"
    );

    let ctx = MergeContext {
        base,
        input,
        params,
        sink,
        converters: &converters,
    };
    let mut merged = base.clone();
    merge_all(&ctx, &mut merged)?;
    report_dangling(&merged);
    Ok(merged)
}

/// Merges a single color space into a copy of `base`.
///
/// The space is assumed to use the base reference spaces, so it is never
/// converted. Duplicate detection and name arbitration still apply. Base
/// named transforms are kept unless the new space claims one of their names.
pub fn merge_color_space(
    params: &MergeParameters,
    base: &Config,
    colorspace: &ColorSpace,
    sink: &dyn ConflictSink,
) -> MergeResult<Config> {
    let mut input = Config::new();
    input.add_colorspace(colorspace.clone());
    let params = params
        .clone()
        .with_adjust_input_reference_space(false)
        .with_strategy(Section::NamedTransforms, MergeStrategy::BaseOnly);
    let converters = ReferenceConverters::none();
    let ctx = MergeContext {
        base,
        input: &input,
        params: &params,
        sink,
        converters: &converters,
    };
    let mut merged = base.clone();
    ColorSpacesMerger.merge(&ctx, &mut merged)?;
    NamedTransformsMerger.merge(&ctx, &mut merged)?;
    Ok(merged)
}

/// Result of one recipe entry.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Output name of the entry.
    pub name: String,
    /// The merged config.
    pub config: Config,
}

/// Runs the merges of a recipe in order.
pub struct ConfigMerger<'a> {
    recipe: &'a MergeRecipe,
    sink: &'a dyn ConflictSink,
    outputs: Vec<MergedConfig>,
}

impl<'a> ConfigMerger<'a> {
    /// Merger reporting conflicts to `sink`.
    pub fn new(recipe: &'a MergeRecipe, sink: &'a dyn ConflictSink) -> Self {
        Self {
            recipe,
            sink,
            outputs: Vec::with_capacity(recipe.merges.len()),
        }
    }

    /// Resolves a config name.
    ///
    /// Tried in order: a file in each search path, a built-in URI, the
    /// output of an earlier merge.
    pub fn load_config(&self, name: &str) -> MergeResult<Config> {
        for dir in self.recipe.resolved_search_paths() {
            let path: PathBuf = dir.join(name);
            if path.is_file() {
                debug!(config = name, path = %path.display(), "loading config");
                return Ok(Config::from_file(&path)?);
            }
        }
        if let Some(config) = builtin::from_uri(name) {
            return Ok(config);
        }
        self.outputs
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.config.clone())
            .ok_or_else(|| MergeError::ConfigLoad { name: name.to_string() })
    }

    /// Runs every merge, stopping at the first failure.
    pub fn run(mut self) -> MergeResult<Vec<MergedConfig>> {
        for params in &self.recipe.merges {
            let base = self.load_config(&params.base)?;
            let input = self.load_config(&params.input)?;
            let config = merge_config_pair(params, &base, &input, self.sink)?;
            debug!(output = %params.output_name, "merge done");
            self.outputs.push(MergedConfig {
                name: params.output_name.clone(),
                config,
            });
        }
        Ok(self.outputs)
    }
}

/// Runs a recipe, logging conflicts through `tracing`.
pub fn merge_configs(recipe: &MergeRecipe) -> MergeResult<Vec<MergedConfig>> {
    ConfigMerger::new(recipe, &TracingSink).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingSink;
    use vfx_ocio::{NamedTransform, Transform};

    fn pair() -> (Config, Config) {
        let mut base = Config::new();
        base.set_name("base");
        base.add_colorspace(ColorSpace::builder("ref").build());
        base.add_colorspace(ColorSpace::builder("raw").is_data(true).build());
        base.set_role("data", "raw");

        let mut input = Config::new();
        input.set_name("input");
        input.add_colorspace(ColorSpace::builder("ref").build());
        input.add_colorspace(
            ColorSpace::builder("double")
                .to_reference(Transform::matrix33([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]))
                .build(),
        );
        input.set_role("data", "double");
        (base, input)
    }

    #[test]
    fn pair_merge_runs_every_section() {
        let (base, input) = pair();
        let params = MergeParameters::new().with_adjust_input_reference_space(false);
        let sink = CollectingSink::new();
        let merged = merge_config_pair(&params, &base, &input, &sink).unwrap();
        assert_eq!(merged.name(), "input");
        assert_eq!(merged.roles().get("data"), Some("double"));
        assert!(merged.colorspace("double").is_some());
        assert!(sink.contains("role"));
    }

    #[test]
    fn fatal_conflict_returns_error() {
        let (base, input) = pair();
        let params = MergeParameters::new()
            .with_adjust_input_reference_space(false)
            .with_error_on_conflict(true);
        let sink = CollectingSink::new();
        let err = merge_config_pair(&params, &base, &input, &sink).unwrap_err();
        assert!(matches!(err, MergeError::Conflict(_)));
        assert!(sink.fatal_message().is_some());
    }

    #[test]
    fn single_color_space() {
        let (mut base, _) = pair();
        base.add_named_transform(NamedTransform::new("look", Transform::group(Vec::new())));
        let cs = ColorSpace::builder("ref").alias("scene").build();
        let sink = CollectingSink::new();
        let merged = merge_color_space(&MergeParameters::new(), &base, &cs, &sink).unwrap();
        assert_eq!(merged.colorspaces().len(), 2);
        assert_eq!(merged.colorspace("scene").unwrap().name(), "ref");
        assert!(merged.named_transform("look").is_some());

        let params = MergeParameters::new().with_default_strategy(MergeStrategy::PreferBase);
        let cs = ColorSpace::builder("half")
            .to_reference(Transform::matrix33([[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5]]))
            .build();
        let merged = merge_color_space(&params, &base, &cs, &sink).unwrap();
        assert_eq!(merged.colorspace_names().collect::<Vec<_>>(), ["half", "ref", "raw"]);
    }

    #[test]
    fn unknown_config_name() {
        let recipe = MergeRecipe::new();
        let sink = CollectingSink::new();
        let merger = ConfigMerger::new(&recipe, &sink);
        let err = merger.load_config("nowhere.ocio").unwrap_err();
        assert!(matches!(err, MergeError::ConfigLoad { ref name } if name == "nowhere.ocio"));
        assert!(merger.load_config("ocio://default").is_ok());
    }
}
