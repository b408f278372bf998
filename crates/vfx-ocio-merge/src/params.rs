//! Merge parameters.
//!
//! One [`MergeParameters`] value describes a single merge: which configs
//! take part, the strategy of every section, the global options and the
//! override values that replace whatever the mergers would compute.
//!
//! # Example
//!
//! ```
//! use vfx_ocio_merge::{MergeParameters, MergeStrategy, Section};
//!
//! let params = MergeParameters::new()
//!     .with_default_strategy(MergeStrategy::PreferBase)
//!     .with_strategy(Section::Roles, MergeStrategy::InputOnly)
//!     .with_input_family_prefix("Input/");
//!
//! assert_eq!(params.strategy(Section::Roles), MergeStrategy::InputOnly);
//! assert_eq!(params.strategy(Section::Looks), MergeStrategy::PreferBase);
//! ```

use serde::{Deserialize, Serialize};

/// Policy of a section merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// Defer to the default strategy.
    #[default]
    Unset,
    /// Both sides contribute, input wins conflicts.
    PreferInput,
    /// Both sides contribute, base wins conflicts.
    PreferBase,
    /// Only the input section is kept.
    InputOnly,
    /// Only the base section is kept.
    BaseOnly,
    /// Items present in the input are removed from the base.
    Remove,
}

impl MergeStrategy {
    /// Parses a recipe name. Unknown names give [`MergeStrategy::Unset`].
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "PreferInput" => Self::PreferInput,
            "PreferBase" => Self::PreferBase,
            "InputOnly" => Self::InputOnly,
            "BaseOnly" => Self::BaseOnly,
            "Remove" => Self::Remove,
            _ => Self::Unset,
        }
    }

    /// Recipe name of the strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::PreferInput => "PreferInput",
            Self::PreferBase => "PreferBase",
            Self::InputOnly => "InputOnly",
            Self::BaseOnly => "BaseOnly",
            Self::Remove => "Remove",
        }
    }

    /// True for the strategies under which the input wins name conflicts.
    pub fn input_wins(self) -> bool {
        matches!(self, Self::PreferInput | Self::InputOnly)
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Config sections that carry their own strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Roles.
    Roles,
    /// File rules and strict parsing.
    FileRules,
    /// Displays, views, viewing rules and active lists.
    DisplayViews,
    /// View transforms and the default view transform.
    ViewTransforms,
    /// Looks.
    Looks,
    /// Color spaces, environment, search paths and the inactive list.
    ColorSpaces,
    /// Named transforms.
    NamedTransforms,
}

impl Section {
    /// All sections, in merge order.
    pub const ALL: [Section; 7] = [
        Section::Roles,
        Section::FileRules,
        Section::DisplayViews,
        Section::ViewTransforms,
        Section::Looks,
        Section::ColorSpaces,
        Section::NamedTransforms,
    ];

    /// Key of the section in a merge recipe.
    pub fn key(self) -> &'static str {
        match self {
            Section::Roles => "roles",
            Section::FileRules => "file_rules",
            Section::DisplayViews => "display-views",
            Section::ViewTransforms => "view_transforms",
            Section::Looks => "looks",
            Section::ColorSpaces => "colorspaces",
            Section::NamedTransforms => "named_transform",
        }
    }

    /// Section for a recipe key.
    pub fn from_key(key: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// Per-section strategies; `Unset` entries defer to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct SectionStrategies {
    pub roles: MergeStrategy,
    pub file_rules: MergeStrategy,
    pub display_views: MergeStrategy,
    pub view_transforms: MergeStrategy,
    pub looks: MergeStrategy,
    pub colorspaces: MergeStrategy,
    pub named_transforms: MergeStrategy,
}

impl SectionStrategies {
    fn get(&self, section: Section) -> MergeStrategy {
        match section {
            Section::Roles => self.roles,
            Section::FileRules => self.file_rules,
            Section::DisplayViews => self.display_views,
            Section::ViewTransforms => self.view_transforms,
            Section::Looks => self.looks,
            Section::ColorSpaces => self.colorspaces,
            Section::NamedTransforms => self.named_transforms,
        }
    }

    fn slot(&mut self, section: Section) -> &mut MergeStrategy {
        match section {
            Section::Roles => &mut self.roles,
            Section::FileRules => &mut self.file_rules,
            Section::DisplayViews => &mut self.display_views,
            Section::ViewTransforms => &mut self.view_transforms,
            Section::Looks => &mut self.looks,
            Section::ColorSpaces => &mut self.colorspaces,
            Section::NamedTransforms => &mut self.named_transforms,
        }
    }
}

/// Values that replace the merged result when non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    /// Config name.
    pub name: String,
    /// Config description.
    pub description: String,
    /// Search path entries.
    pub search_path: Vec<String>,
    /// Environment variables with their default values.
    pub environment: Vec<(String, String)>,
    /// Active displays.
    pub active_displays: Vec<String>,
    /// Active views.
    pub active_views: Vec<String>,
    /// Inactive color spaces.
    pub inactive_colorspaces: Vec<String>,
}

/// Parameters of one merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeParameters {
    /// Base config: path, built-in URI or earlier output name.
    pub base: String,
    /// Input config: path, built-in URI or earlier output name.
    pub input: String,
    /// Name under which the result is published to later merges.
    pub output_name: String,
    /// Prefix added to the family of input color spaces.
    pub input_family_prefix: String,
    /// Prefix added to the family of base color spaces.
    pub base_family_prefix: String,
    /// Input items come first in ordered collections.
    pub input_first: bool,
    /// Conflicts abort the merge instead of logging a warning.
    pub error_on_conflict: bool,
    /// Collapse input color spaces equivalent to base ones.
    pub avoid_duplicates: bool,
    /// Convert input color spaces to the base reference spaces.
    pub adjust_input_reference_space: bool,
    /// Strategy of sections left unset.
    pub default_strategy: MergeStrategy,
    /// Per-section strategies.
    pub strategies: SectionStrategies,
    /// Override values.
    pub overrides: Overrides,
}

impl Default for MergeParameters {
    fn default() -> Self {
        Self {
            base: String::new(),
            input: String::new(),
            output_name: String::new(),
            input_family_prefix: String::new(),
            base_family_prefix: String::new(),
            input_first: true,
            error_on_conflict: false,
            avoid_duplicates: true,
            adjust_input_reference_space: true,
            default_strategy: MergeStrategy::PreferInput,
            strategies: SectionStrategies::default(),
            overrides: Overrides::default(),
        }
    }
}

impl MergeParameters {
    /// Default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective strategy of a section.
    pub fn strategy(&self, section: Section) -> MergeStrategy {
        match self.strategies.get(section) {
            MergeStrategy::Unset => self.default_strategy,
            s => s,
        }
    }

    /// Strategy as set, without the default applied.
    pub fn raw_strategy(&self, section: Section) -> MergeStrategy {
        self.strategies.get(section)
    }

    /// Sets the strategy of one section.
    pub fn set_strategy(&mut self, section: Section, strategy: MergeStrategy) {
        *self.strategies.slot(section) = strategy;
    }

    /// Sets the strategy of one section.
    pub fn with_strategy(mut self, section: Section, strategy: MergeStrategy) -> Self {
        self.set_strategy(section, strategy);
        self
    }

    /// Sets the base and input config names.
    pub fn with_configs(mut self, base: impl Into<String>, input: impl Into<String>) -> Self {
        self.base = base.into();
        self.input = input.into();
        self
    }

    /// Sets the output name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Sets the default strategy.
    pub fn with_default_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Sets the input family prefix.
    pub fn with_input_family_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.input_family_prefix = prefix.into();
        self
    }

    /// Sets the base family prefix.
    pub fn with_base_family_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.base_family_prefix = prefix.into();
        self
    }

    /// Sets input-first ordering.
    pub fn with_input_first(mut self, enabled: bool) -> Self {
        self.input_first = enabled;
        self
    }

    /// Sets whether conflicts are fatal.
    pub fn with_error_on_conflict(mut self, enabled: bool) -> Self {
        self.error_on_conflict = enabled;
        self
    }

    /// Sets duplicate avoidance.
    pub fn with_avoid_duplicates(mut self, enabled: bool) -> Self {
        self.avoid_duplicates = enabled;
        self
    }

    /// Sets reference-space adaptation of the input.
    pub fn with_adjust_input_reference_space(mut self, enabled: bool) -> Self {
        self.adjust_input_reference_space = enabled;
        self
    }

    /// Replaces the overrides.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = MergeParameters::default();
        assert_eq!(p.default_strategy, MergeStrategy::PreferInput);
        assert!(p.input_first);
        assert!(!p.error_on_conflict);
        assert!(p.avoid_duplicates);
        assert!(p.adjust_input_reference_space);
        for s in Section::ALL {
            assert_eq!(p.raw_strategy(s), MergeStrategy::Unset);
            assert_eq!(p.strategy(s), MergeStrategy::PreferInput);
        }
    }

    #[test]
    fn unset_sections_follow_default() {
        let p = MergeParameters::new()
            .with_strategy(Section::Looks, MergeStrategy::Remove)
            .with_default_strategy(MergeStrategy::BaseOnly);
        assert_eq!(p.strategy(Section::Looks), MergeStrategy::Remove);
        assert_eq!(p.strategy(Section::ColorSpaces), MergeStrategy::BaseOnly);
    }

    #[test]
    fn strategy_names() {
        for s in [
            MergeStrategy::PreferInput,
            MergeStrategy::PreferBase,
            MergeStrategy::InputOnly,
            MergeStrategy::BaseOnly,
            MergeStrategy::Remove,
        ] {
            assert_eq!(MergeStrategy::parse(s.as_str()), s);
        }
        assert_eq!(MergeStrategy::parse("Whatever"), MergeStrategy::Unset);
        assert!(MergeStrategy::InputOnly.input_wins());
        assert!(!MergeStrategy::PreferBase.input_wins());
    }

    #[test]
    fn section_keys() {
        assert_eq!(Section::from_key("display-views"), Some(Section::DisplayViews));
        assert_eq!(Section::from_key("named_transform"), Some(Section::NamedTransforms));
        assert_eq!(Section::from_key("nope"), None);
    }

    #[test]
    fn serde_roundtrip() {
        let p = MergeParameters::new()
            .with_configs("base.ocio", "input.ocio")
            .with_strategy(Section::FileRules, MergeStrategy::PreferBase);
        let text = serde_yaml::to_string(&p).unwrap();
        let back: MergeParameters = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, p);

        let sparse: MergeParameters = serde_yaml::from_str("input_first: false").unwrap();
        assert!(!sparse.input_first);
        assert!(sparse.avoid_duplicates);
    }
}
