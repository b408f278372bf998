//! File rules: map file paths to color spaces.
//!
//! Rules are evaluated in order and the first match wins. The list always
//! ends with the `Default` rule, which matches everything. At most one
//! `ColorSpaceNamePathSearch` rule may be present; it looks for a color
//! space name inside the path itself.
//!
//! ```
//! use vfx_ocio::{FileRule, FileRules};
//!
//! let mut rules = FileRules::new();
//! rules.set_default_colorspace("Raw");
//! rules.push(FileRule::pattern("EXR", "ACEScg", "*", "exr"))?;
//!
//! assert_eq!(rules.colorspace_for_path("/shots/a.0001.EXR", |_| None), "ACEScg");
//! assert_eq!(rules.colorspace_for_path("/shots/a.dpx", |_| None), "Raw");
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use glob::{MatchOptions, Pattern};
use regex::Regex;

use crate::error::{OcioError, OcioResult};

/// Name of the terminal rule.
pub const DEFAULT_RULE_NAME: &str = "Default";
/// Name of the path-search rule.
pub const PATH_SEARCH_RULE_NAME: &str = "ColorSpaceNamePathSearch";

/// How a rule matches a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRuleKind {
    /// Terminal rule, matches everything.
    Default,
    /// Finds a color space name inside the path.
    PathSearch,
    /// Glob on the path before the last dot plus a glob on the extension.
    Pattern {
        /// Glob for the path without extension.
        pattern: String,
        /// Glob for the extension, case-insensitive.
        extension: String,
    },
    /// Regular expression over the whole path.
    Regex(String),
}

/// A single file rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRule {
    name: String,
    colorspace: String,
    kind: FileRuleKind,
    custom_keys: Vec<(String, String)>,
}

impl FileRule {
    /// Creates a pattern + extension rule. Empty globs become `*`.
    pub fn pattern(
        name: impl Into<String>,
        colorspace: impl Into<String>,
        pattern: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let star = |s: String| if s.is_empty() { "*".to_string() } else { s };
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
            kind: FileRuleKind::Pattern {
                pattern: star(pattern.into()),
                extension: star(extension.into()),
            },
            custom_keys: Vec::new(),
        }
    }

    /// Creates a regex rule.
    pub fn regex(name: impl Into<String>, colorspace: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
            kind: FileRuleKind::Regex(regex.into()),
            custom_keys: Vec::new(),
        }
    }

    /// Creates the path-search rule.
    pub fn path_search() -> Self {
        Self {
            name: PATH_SEARCH_RULE_NAME.into(),
            colorspace: String::new(),
            kind: FileRuleKind::PathSearch,
            custom_keys: Vec::new(),
        }
    }

    /// Creates the terminal default rule.
    pub fn default_rule(colorspace: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_RULE_NAME.into(),
            colorspace: colorspace.into(),
            kind: FileRuleKind::Default,
            custom_keys: Vec::new(),
        }
    }

    /// Adds or replaces a custom key.
    pub fn with_custom_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_custom_key(key, value);
        self
    }

    /// Rule name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color space assigned by the rule (empty for path search).
    #[inline]
    pub fn colorspace(&self) -> &str {
        &self.colorspace
    }

    /// Match kind.
    #[inline]
    pub fn kind(&self) -> &FileRuleKind {
        &self.kind
    }

    /// Glob pattern, for pattern rules.
    pub fn pattern_str(&self) -> &str {
        match &self.kind {
            FileRuleKind::Pattern { pattern, .. } => pattern,
            _ => "",
        }
    }

    /// Extension glob, for pattern rules.
    pub fn extension(&self) -> &str {
        match &self.kind {
            FileRuleKind::Pattern { extension, .. } => extension,
            _ => "",
        }
    }

    /// Regex, for regex rules.
    pub fn regex_str(&self) -> &str {
        match &self.kind {
            FileRuleKind::Regex(r) => r,
            _ => "",
        }
    }

    /// Custom keys in insertion order.
    #[inline]
    pub fn custom_keys(&self) -> &[(String, String)] {
        &self.custom_keys
    }

    /// Adds or replaces a custom key.
    pub fn set_custom_key(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.custom_keys.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.custom_keys.push((key, value)),
        }
    }

    /// Sets the color space.
    pub fn set_colorspace(&mut self, colorspace: impl Into<String>) {
        self.colorspace = colorspace.into();
    }

    /// True for the default rule.
    pub fn is_default(&self) -> bool {
        self.kind == FileRuleKind::Default
    }

    /// Compares everything but the name. Strings compare ignoring case and
    /// custom keys ignore order.
    pub fn is_equivalent(&self, other: &FileRule) -> bool {
        let same = |a: &str, b: &str| a.eq_ignore_ascii_case(b);
        if !same(&self.colorspace, &other.colorspace)
            || !same(self.pattern_str(), other.pattern_str())
            || !same(self.regex_str(), other.regex_str())
            || !same(self.extension(), other.extension())
            || self.custom_keys.len() != other.custom_keys.len()
        {
            return false;
        }
        other.custom_keys.iter().all(|(k, v)| {
            self.custom_keys
                .iter()
                .any(|(sk, sv)| sk == k && same(sv, v))
        })
    }

    fn matches(&self, path: &str) -> bool {
        match &self.kind {
            FileRuleKind::Default => true,
            FileRuleKind::PathSearch => false,
            FileRuleKind::Regex(r) => Regex::new(&format!("^(?:{r})$"))
                .map(|re| re.is_match(path))
                .unwrap_or(false),
            FileRuleKind::Pattern { pattern, extension } => {
                let Some((stem, ext)) = path.rsplit_once('.') else {
                    return false;
                };
                let strict = MatchOptions::new();
                let loose = MatchOptions {
                    case_sensitive: false,
                    ..MatchOptions::new()
                };
                let stem_ok = Pattern::new(pattern).map(|p| p.matches_with(stem, strict));
                let ext_ok = Pattern::new(extension).map(|p| p.matches_with(ext, loose));
                matches!((stem_ok, ext_ok), (Ok(true), Ok(true)))
            }
        }
    }
}

/// Ordered file rules, terminated by the default rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRules {
    rules: Vec<FileRule>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRules {
    /// Creates rules holding only the default rule, mapped to the `default` role.
    pub fn new() -> Self {
        Self {
            rules: vec![FileRule::default_rule(crate::role::names::DEFAULT)],
        }
    }

    /// All rules, default last.
    #[inline]
    pub fn rules(&self) -> &[FileRule] {
        &self.rules
    }

    /// Number of rules including the default.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Never true; the default rule is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when only the default rule is present.
    pub fn is_default_only(&self) -> bool {
        self.rules.len() == 1
    }

    /// Position of a rule by name (case-insensitive).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Rule by name.
    pub fn get(&self, name: &str) -> Option<&FileRule> {
        self.index_of(name).map(|i| &self.rules[i])
    }

    /// The terminal rule.
    pub fn default_rule(&self) -> Option<&FileRule> {
        self.rules.last()
    }

    /// Sets the color space of the default rule.
    pub fn set_default_colorspace(&mut self, colorspace: impl Into<String>) {
        if let Some(rule) = self.rules.last_mut() {
            rule.colorspace = colorspace.into();
        }
    }

    /// Inserts a rule at `index`, which must precede the default rule.
    ///
    /// Inserting a rule named `Default` updates the default rule's color
    /// space and custom keys instead.
    pub fn insert(&mut self, index: usize, rule: FileRule) -> OcioResult<()> {
        if rule.is_default() || rule.name.eq_ignore_ascii_case(DEFAULT_RULE_NAME) {
            if let Some(default) = self.rules.last_mut() {
                default.colorspace = rule.colorspace;
                for (k, v) in rule.custom_keys {
                    default.set_custom_key(k, v);
                }
            }
            return Ok(());
        }
        if rule.name.is_empty() {
            return Err(OcioError::Validation("file rules: rule name is empty".into()));
        }
        if self.index_of(&rule.name).is_some() {
            return Err(OcioError::Validation(format!(
                "file rules: a rule named '{}' already exists",
                rule.name
            )));
        }
        if rule.kind == FileRuleKind::PathSearch
            && self.rules.iter().any(|r| r.kind == FileRuleKind::PathSearch)
        {
            return Err(OcioError::Validation(
                "file rules: only one ColorSpaceNamePathSearch rule is allowed".into(),
            ));
        }
        if let FileRuleKind::Regex(r) = &rule.kind {
            Regex::new(r).map_err(|e| {
                OcioError::Validation(format!("file rules: invalid regex '{r}' in '{}': {e}", rule.name))
            })?;
        }
        let last = self.rules.len().saturating_sub(1);
        self.rules.insert(index.min(last), rule);
        Ok(())
    }

    /// Inserts a rule just before the default rule.
    pub fn push(&mut self, rule: FileRule) -> OcioResult<()> {
        self.insert(usize::MAX, rule)
    }

    /// Removes a rule by name. The default rule is never removed.
    pub fn remove(&mut self, name: &str) -> Option<FileRule> {
        let idx = self.index_of(name)?;
        if self.rules[idx].is_default() {
            return None;
        }
        Some(self.rules.remove(idx))
    }

    /// Replaces the rule at `index` keeping its position.
    pub fn replace_at(&mut self, index: usize, rule: FileRule) {
        if let Some(slot) = self.rules.get_mut(index) {
            if slot.is_default() {
                slot.colorspace = rule.colorspace;
            } else {
                *slot = rule;
            }
        }
    }

    /// Mutable access to a rule by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileRule> {
        let idx = self.index_of(name)?;
        self.rules.get_mut(idx)
    }

    /// Evaluates the rules for `path`.
    ///
    /// `search` finds a color space name inside the path for the
    /// path-search rule.
    pub fn colorspace_for_path<F>(&self, path: &str, search: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        for rule in &self.rules {
            if rule.kind == FileRuleKind::PathSearch {
                if let Some(cs) = search(path) {
                    return cs;
                }
            } else if rule.matches(path) {
                return rule.colorspace.clone();
            }
        }
        String::new()
    }
}
