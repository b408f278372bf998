//! Merge recipes (`.ociom` files).
//!
//! A recipe lists merges to run in order. Each entry is keyed by its output
//! name, which later entries can use as their base or input:
//!
//! ```yaml
//! ociom_version: 1.0
//! search_path: [configs]
//! merge:
//!   studio:
//!     base: base.ocio
//!     input: show.ocio
//!     options:
//!       input_family_prefix: "Show/"
//!       default_strategy: PreferInput
//!     overrides:
//!       name: studio
//!     params:
//!       roles: {strategy: PreferBase}
//! ```
//!
//! # Example
//!
//! ```
//! use vfx_ocio_merge::{MergeRecipe, MergeStrategy, Section};
//!
//! let recipe = MergeRecipe::from_yaml_str(
//!     "merge:\n  out:\n    base: a.ocio\n    input: b.ocio\n    params:\n      looks: {strategy: Remove}\n",
//!     ".".into(),
//! ).unwrap();
//! assert_eq!(recipe.merges[0].output_name, "out");
//! assert_eq!(recipe.merges[0].strategy(Section::Looks), MergeStrategy::Remove);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{MergeError, MergeResult};
use crate::params::{MergeParameters, MergeStrategy, Overrides, Section};

/// Ordered list of merges plus where to look for configs.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecipe {
    /// Recipe format version as (major, minor).
    pub version: (u32, u32),
    /// Directories searched for config files, relative to `working_dir`.
    pub search_paths: Vec<String>,
    /// Directory of the recipe file.
    pub working_dir: PathBuf,
    /// Merges in the order they run.
    pub merges: Vec<MergeParameters>,
}

impl Default for MergeRecipe {
    fn default() -> Self {
        Self {
            version: (1, 0),
            search_paths: Vec::new(),
            working_dir: PathBuf::from("."),
            merges: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// A single string is a colon-separated path list.
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => s
                .split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::Many(v) => v,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRecipe {
    ociom_version: Option<Value>,
    search_path: Option<StringOrList>,
    merge: Mapping,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMerge {
    base: String,
    input: String,
    options: RawOptions,
    overrides: RawOverrides,
    params: RawParams,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOptions {
    input_family_prefix: Option<String>,
    base_family_prefix: Option<String>,
    input_first: Option<bool>,
    error_on_conflict: Option<bool>,
    avoid_duplicates: Option<bool>,
    assume_common_reference_space: Option<bool>,
    default_strategy: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOverrides {
    name: Option<String>,
    description: Option<String>,
    search_path: Option<StringOrList>,
    environment: Mapping,
    active_displays: Option<StringOrList>,
    active_views: Option<StringOrList>,
    inactive_colorspaces: Option<StringOrList>,
}

#[derive(Deserialize)]
struct RawStrategy {
    strategy: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawParams {
    roles: Option<RawStrategy>,
    file_rules: Option<RawStrategy>,
    #[serde(rename = "display-views")]
    display_views: Option<RawStrategy>,
    view_transforms: Option<RawStrategy>,
    looks: Option<RawStrategy>,
    colorspaces: Option<RawStrategy>,
    named_transform: Option<RawStrategy>,
}

impl RawParams {
    fn get(&self, section: Section) -> Option<&RawStrategy> {
        match section {
            Section::Roles => self.roles.as_ref(),
            Section::FileRules => self.file_rules.as_ref(),
            Section::DisplayViews => self.display_views.as_ref(),
            Section::ViewTransforms => self.view_transforms.as_ref(),
            Section::Looks => self.looks.as_ref(),
            Section::ColorSpaces => self.colorspaces.as_ref(),
            Section::NamedTransforms => self.named_transform.as_ref(),
        }
    }
}

fn parse_strategy(name: &str, what: &str) -> MergeStrategy {
    let strategy = MergeStrategy::parse(name);
    if strategy == MergeStrategy::Unset && name.trim() != MergeStrategy::Unset.as_str() {
        warn!("unrecognized strategy '{name}' for {what}, left unspecified");
    }
    strategy
}

fn parse_version(value: Option<Value>) -> MergeResult<(u32, u32)> {
    let text = match value {
        None => return Ok((1, 0)),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(MergeError::Recipe(format!("invalid ociom_version: {other:?}"))),
    };
    let bad = || MergeError::Recipe(format!("invalid ociom_version: '{text}'"));
    let mut parts = text.trim().splitn(2, '.');
    let major = parts.next().unwrap_or_default().parse().map_err(|_| bad())?;
    let minor = match parts.next() {
        Some(m) => m.parse().map_err(|_| bad())?,
        None => 0,
    };
    Ok((major, minor))
}

fn env_pairs(map: Mapping) -> MergeResult<Vec<(String, String)>> {
    map.into_iter()
        .map(|(k, v)| {
            let key = scalar(k).ok_or_else(|| MergeError::Recipe("environment keys must be strings".into()))?;
            let value = scalar(v).unwrap_or_default();
            Ok((key, value))
        })
        .collect()
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_params(output_name: String, raw: RawMerge) -> MergeResult<MergeParameters> {
    let mut params = MergeParameters::new().with_configs(raw.base, raw.input);
    params.output_name = output_name;

    let o = raw.options;
    if let Some(v) = o.input_family_prefix {
        params.input_family_prefix = v;
    }
    if let Some(v) = o.base_family_prefix {
        params.base_family_prefix = v;
    }
    if let Some(v) = o.input_first {
        params.input_first = v;
    }
    if let Some(v) = o.error_on_conflict {
        params.error_on_conflict = v;
    }
    if let Some(v) = o.avoid_duplicates {
        params.avoid_duplicates = v;
    }
    if let Some(v) = o.assume_common_reference_space {
        params.adjust_input_reference_space = !v;
    }
    if let Some(v) = o.default_strategy {
        params.default_strategy = parse_strategy(&v, "default_strategy");
    }

    let ov = raw.overrides;
    params.overrides = Overrides {
        name: ov.name.unwrap_or_default(),
        description: ov.description.unwrap_or_default(),
        search_path: ov.search_path.map(StringOrList::into_vec).unwrap_or_default(),
        environment: env_pairs(ov.environment)?,
        active_displays: ov.active_displays.map(list_value).unwrap_or_default(),
        active_views: ov.active_views.map(list_value).unwrap_or_default(),
        inactive_colorspaces: ov.inactive_colorspaces.map(list_value).unwrap_or_default(),
    };

    for section in Section::ALL {
        if let Some(raw) = raw.params.get(section) {
            params.set_strategy(section, parse_strategy(&raw.strategy, section.key()));
        }
    }
    Ok(params)
}

/// Display, view and color space lists are comma separated.
fn list_value(v: StringOrList) -> Vec<String> {
    match v {
        StringOrList::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        StringOrList::Many(v) => v,
    }
}

fn str_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.clone())).collect())
}

fn entry(map: &mut Mapping, key: &str, value: Value) {
    map.insert(Value::String(key.to_string()), value);
}

fn strategy_node(strategy: MergeStrategy) -> Value {
    let mut m = Mapping::new();
    entry(&mut m, "strategy", Value::String(strategy.as_str().to_string()));
    Value::Mapping(m)
}

fn params_to_value(p: &MergeParameters) -> Value {
    let mut options = Mapping::new();
    entry(&mut options, "input_family_prefix", p.input_family_prefix.clone().into());
    entry(&mut options, "base_family_prefix", p.base_family_prefix.clone().into());
    entry(&mut options, "input_first", p.input_first.into());
    entry(&mut options, "error_on_conflict", p.error_on_conflict.into());
    entry(&mut options, "default_strategy", p.default_strategy.as_str().into());
    entry(&mut options, "avoid_duplicates", p.avoid_duplicates.into());
    entry(&mut options, "assume_common_reference_space", (!p.adjust_input_reference_space).into());

    let o = &p.overrides;
    let mut overrides = Mapping::new();
    entry(&mut overrides, "name", o.name.clone().into());
    entry(&mut overrides, "description", o.description.clone().into());
    entry(&mut overrides, "search_path", str_list(&o.search_path));
    let env: Mapping = o
        .environment
        .iter()
        .map(|(k, v)| (Value::String(k.clone()), Value::String(v.clone())))
        .collect();
    entry(&mut overrides, "environment", Value::Mapping(env));
    entry(&mut overrides, "active_displays", str_list(&o.active_displays));
    entry(&mut overrides, "active_views", str_list(&o.active_views));
    entry(&mut overrides, "inactive_colorspaces", str_list(&o.inactive_colorspaces));

    let mut sections = Mapping::new();
    for section in Section::ALL {
        entry(&mut sections, section.key(), strategy_node(p.raw_strategy(section)));
    }

    let mut m = Mapping::new();
    entry(&mut m, "base", p.base.clone().into());
    entry(&mut m, "input", p.input.clone().into());
    entry(&mut m, "options", Value::Mapping(options));
    entry(&mut m, "overrides", Value::Mapping(overrides));
    entry(&mut m, "params", Value::Mapping(sections));
    Value::Mapping(m)
}

impl MergeRecipe {
    /// Empty recipe with the current format version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a recipe file. Its directory becomes the working directory.
    pub fn from_file(path: impl AsRef<Path>) -> MergeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml_str(&text, dir)
    }

    /// Parses a recipe from YAML text.
    pub fn from_yaml_str(yaml: &str, working_dir: PathBuf) -> MergeResult<Self> {
        let raw: RawRecipe = serde_yaml::from_str(yaml)?;
        let mut merges = Vec::with_capacity(raw.merge.len());
        for (key, value) in raw.merge {
            let name = scalar(key).ok_or_else(|| MergeError::Recipe("merge keys must be strings".into()))?;
            let entry: RawMerge = serde_yaml::from_value(value)?;
            merges.push(to_params(name, entry)?);
        }
        let recipe = Self {
            version: parse_version(raw.ociom_version)?,
            search_paths: raw.search_path.map(StringOrList::into_vec).unwrap_or_default(),
            working_dir,
            merges,
        };
        debug!(merges = recipe.merges.len(), "read merge recipe");
        Ok(recipe)
    }

    /// Writes the recipe in the layout [`MergeRecipe::from_yaml_str`] reads.
    pub fn to_yaml_string(&self) -> MergeResult<String> {
        let mut merge = Mapping::new();
        for p in &self.merges {
            merge.insert(Value::String(p.output_name.clone()), params_to_value(p));
        }
        let mut root = Mapping::new();
        entry(
            &mut root,
            "ociom_version",
            Value::String(format!("{}.{}", self.version.0, self.version.1)),
        );
        entry(&mut root, "search_path", str_list(&self.search_paths));
        entry(&mut root, "merge", Value::Mapping(merge));
        Ok(serde_yaml::to_string(&Value::Mapping(root))?)
    }

    /// Writes the recipe to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> MergeResult<()> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    /// Appends a merge.
    pub fn push(&mut self, params: MergeParameters) {
        self.merges.push(params);
    }

    /// Directories a config name is looked up in, in order.
    ///
    /// Relative search paths are taken from the working directory. Without
    /// search paths only the working directory is used.
    pub fn resolved_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            return vec![self.working_dir.clone()];
        }
        self.search_paths
            .iter()
            .map(|p| self.working_dir.join(p.trim().trim_end_matches('/')))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = r#"
ociom_version: 1.0
search_path: [configs, /abs/configs/]
merge:
  first:
    base: base.ocio
    input: input.ocio
    options:
      input_family_prefix: "Input/"
      base_family_prefix: "Base/"
      input_first: false
      error_on_conflict: true
      default_strategy: PreferBase
      avoid_duplicates: false
      assume_common_reference_space: true
    overrides:
      name: merged
      search_path: "luts:more"
      environment:
        SHOT: "010"
        SEQ: ab
      active_displays: "sRGB, P3"
      inactive_colorspaces: [a, b]
    params:
      roles: {strategy: InputOnly}
      display-views: {strategy: Remove}
      named_transform: {strategy: BaseOnly}
      looks: {strategy: Mystery}
  second:
    base: first
    input: ocio://default
"#;

    #[test]
    fn reads_recipe() {
        let recipe = MergeRecipe::from_yaml_str(RECIPE, "/work".into()).unwrap();
        assert_eq!(recipe.version, (1, 0));
        assert_eq!(recipe.search_paths, ["configs", "/abs/configs/"]);
        assert_eq!(recipe.merges.len(), 2);

        let p = &recipe.merges[0];
        assert_eq!(p.output_name, "first");
        assert_eq!((p.base.as_str(), p.input.as_str()), ("base.ocio", "input.ocio"));
        assert_eq!(p.input_family_prefix, "Input/");
        assert!(!p.input_first);
        assert!(p.error_on_conflict);
        assert!(!p.avoid_duplicates);
        assert!(!p.adjust_input_reference_space);
        assert_eq!(p.default_strategy, MergeStrategy::PreferBase);
        assert_eq!(p.overrides.name, "merged");
        assert_eq!(p.overrides.search_path, ["luts", "more"]);
        assert_eq!(p.overrides.environment, [
            ("SHOT".to_string(), "010".to_string()),
            ("SEQ".to_string(), "ab".to_string()),
        ]);
        assert_eq!(p.overrides.active_displays, ["sRGB", "P3"]);
        assert_eq!(p.overrides.inactive_colorspaces, ["a", "b"]);
        assert_eq!(p.strategy(Section::Roles), MergeStrategy::InputOnly);
        assert_eq!(p.strategy(Section::DisplayViews), MergeStrategy::Remove);
        assert_eq!(p.strategy(Section::NamedTransforms), MergeStrategy::BaseOnly);
        assert_eq!(p.raw_strategy(Section::Looks), MergeStrategy::Unset);
        assert_eq!(p.strategy(Section::Looks), MergeStrategy::PreferBase);

        let q = &recipe.merges[1];
        assert_eq!(q.base, "first");
        assert!(q.input_first);
        assert!(q.adjust_input_reference_space);
    }

    #[test]
    fn search_paths_resolve_from_working_dir() {
        let recipe = MergeRecipe::from_yaml_str(RECIPE, "/work".into()).unwrap();
        assert_eq!(
            recipe.resolved_search_paths(),
            [PathBuf::from("/work/configs"), PathBuf::from("/abs/configs")]
        );
        let bare = MergeRecipe::from_yaml_str("merge: {}", "/work".into()).unwrap();
        assert_eq!(bare.resolved_search_paths(), [PathBuf::from("/work")]);
    }

    #[test]
    fn writes_what_it_reads() {
        let recipe = MergeRecipe::from_yaml_str(RECIPE, "/work".into()).unwrap();
        let text = recipe.to_yaml_string().unwrap();
        assert!(text.contains("display-views"));
        assert!(text.contains("assume_common_reference_space: true"));
        let back = MergeRecipe::from_yaml_str(&text, "/work".into()).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn rejects_bad_version() {
        let err = MergeRecipe::from_yaml_str("ociom_version: one\nmerge: {}", ".".into()).unwrap_err();
        assert!(matches!(err, MergeError::Recipe(_)));
    }
}
