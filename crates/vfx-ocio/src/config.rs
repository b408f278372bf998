//! OCIO configuration model.
//!
//! A [`Config`] owns every section of an OCIO v2 config as ordered
//! collections. Lookups by name are case-insensitive; color spaces are also
//! found through their aliases and through roles.
//!
//! # Example
//!
//! ```
//! use vfx_ocio::builtin;
//!
//! let config = builtin::reference();
//!
//! // Roles resolve to color spaces
//! let cs = config.colorspace("aces_interchange").unwrap();
//! assert_eq!(cs.name(), "ACES2065-1");
//!
//! // Processors resolve through the reference space
//! let proc = config.processor("ACEScg", "ACES2065-1")?;
//! let mut px = [[0.18_f32, 0.18, 0.18, 1.0]];
//! proc.apply_rgba(&mut px);
//! assert!((px[0][0] - 0.18).abs() < 1e-3);
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::cache::ProcessorCache;
use crate::colorspace::{ColorSpace, ReferenceSpaceType};
use crate::display::{Display, USE_DISPLAY_NAME, View, ViewTransform};
use crate::error::{OcioError, OcioResult};
use crate::file_rules::FileRules;
use crate::look::{Look, parse_looks};
use crate::named_transform::NamedTransform;
use crate::processor::{OptimizationLevel, Processor};
use crate::role::Roles;
use crate::transform::*;
use crate::viewing_rules::ViewingRules;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| unreachable!())
});

/// Default luma coefficients (Rec.709).
pub const DEFAULT_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Config profile version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl ConfigVersion {
    /// Version 2.0.
    pub const V2_0: ConfigVersion = ConfigVersion { major: 2, minor: 0 };

    /// Creates a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses `2`, `2.1` or `1.0`.
    pub fn parse(s: &str) -> OcioResult<Self> {
        let unsupported = || OcioError::UnsupportedVersion { version: s.to_string() };
        let mut parts = s.trim().splitn(2, '.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(unsupported)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| unsupported())?,
            None => 0,
        };
        if !(1..=2).contains(&major) {
            return Err(unsupported());
        }
        Ok(Self { major, minor })
    }
}

impl Default for ConfigVersion {
    fn default() -> Self {
        Self::V2_0
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minor == 0 {
            write!(f, "{}", self.major)
        } else {
            write!(f, "{}.{}", self.major, self.minor)
        }
    }
}

/// OCIO configuration.
///
/// The main entry point for color management. A config defines:
/// - Color spaces and named transforms
/// - Roles (semantic mappings)
/// - Displays, views, view transforms and viewing rules
/// - Looks (creative grades)
/// - File rules
#[derive(Debug, Clone)]
pub struct Config {
    name: String,
    description: String,
    version: ConfigVersion,
    working_dir: PathBuf,
    search_paths: Vec<String>,
    environment: Vec<(String, String)>,
    family_separator: char,
    strict_parsing: bool,
    default_luma: [f64; 3],
    default_view_transform: String,
    colorspaces: Vec<ColorSpace>,
    named_transforms: Vec<NamedTransform>,
    view_transforms: Vec<ViewTransform>,
    displays: Vec<Display>,
    shared_views: Vec<View>,
    virtual_display: Display,
    looks: Vec<Look>,
    file_rules: FileRules,
    viewing_rules: ViewingRules,
    roles: Roles,
    active_displays: Vec<String>,
    active_views: Vec<String>,
    inactive_colorspaces: Vec<String>,
    cache: ProcessorCache,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn find_ci<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    items.iter().find(|i| key(i).eq_ignore_ascii_case(name))
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &str) {
    let pos = items.iter().position(|i| key(i).eq_ignore_ascii_case(key(&item)));
    match pos {
        Some(idx) => items[idx] = item,
        None => items.push(item),
    }
}

fn take_ci<T>(items: &mut Vec<T>, name: &str, key: impl Fn(&T) -> &str) -> Option<T> {
    let idx = items.iter().position(|i| key(i).eq_ignore_ascii_case(name))?;
    Some(items.remove(idx))
}

impl Config {
    /// Creates a new empty v2.0 configuration.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            version: ConfigVersion::V2_0,
            working_dir: PathBuf::from("."),
            search_paths: Vec::new(),
            environment: Vec::new(),
            family_separator: '/',
            strict_parsing: true,
            default_luma: DEFAULT_LUMA,
            default_view_transform: String::new(),
            colorspaces: Vec::new(),
            named_transforms: Vec::new(),
            view_transforms: Vec::new(),
            displays: Vec::new(),
            shared_views: Vec::new(),
            virtual_display: Display::default(),
            looks: Vec::new(),
            file_rules: FileRules::new(),
            viewing_rules: ViewingRules::new(),
            roles: Roles::new(),
            active_displays: Vec::new(),
            active_views: Vec::new(),
            inactive_colorspaces: Vec::new(),
            cache: ProcessorCache::new(),
        }
    }

    fn touch(&mut self) {
        self.cache.clear();
    }

    // ---------------------------------------------------------------------
    // General
    // ---------------------------------------------------------------------

    /// Returns config name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the config name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, desc: impl Into<String>) {
        self.description = desc.into();
    }

    /// Returns config version.
    #[inline]
    pub fn version(&self) -> ConfigVersion {
        self.version
    }

    /// Sets the profile version.
    pub fn set_version(&mut self, version: ConfigVersion) {
        self.version = version;
    }

    /// Returns the working directory.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Sets the working directory used to resolve relative paths.
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
        self.touch();
    }

    /// Search paths as written, possibly relative or with `$VAR`s.
    #[inline]
    pub fn search_paths(&self) -> &[String] {
        &self.search_paths
    }

    /// Replaces the search paths.
    pub fn set_search_paths(&mut self, paths: Vec<String>) {
        self.search_paths = paths;
        self.touch();
    }

    /// Appends a search path.
    pub fn add_search_path(&mut self, path: impl Into<String>) {
        self.search_paths.push(path.into());
        self.touch();
    }

    /// Environment variable defaults, in order.
    #[inline]
    pub fn environment(&self) -> &[(String, String)] {
        &self.environment
    }

    /// Default value of a config environment variable.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Adds or replaces an environment variable default.
    pub fn set_env_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.environment.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.environment.push((name, value)),
        }
        self.touch();
    }

    /// Removes all environment variables.
    pub fn clear_environment(&mut self) {
        self.environment.clear();
        self.touch();
    }

    /// Family path separator.
    #[inline]
    pub fn family_separator(&self) -> char {
        self.family_separator
    }

    /// Sets the family path separator.
    pub fn set_family_separator(&mut self, sep: char) {
        self.family_separator = sep;
    }

    /// Strict parsing flag.
    #[inline]
    pub fn strict_parsing(&self) -> bool {
        self.strict_parsing
    }

    /// Sets the strict parsing flag.
    pub fn set_strict_parsing(&mut self, strict: bool) {
        self.strict_parsing = strict;
    }

    /// Default luma coefficients.
    #[inline]
    pub fn default_luma(&self) -> [f64; 3] {
        self.default_luma
    }

    /// Sets the default luma coefficients.
    pub fn set_default_luma(&mut self, luma: [f64; 3]) {
        self.default_luma = luma;
    }

    /// Default view transform name (may be empty).
    #[inline]
    pub fn default_view_transform(&self) -> &str {
        &self.default_view_transform
    }

    /// Sets the default view transform name.
    pub fn set_default_view_transform(&mut self, name: impl Into<String>) {
        self.default_view_transform = name.into();
        self.touch();
    }

    /// Active display names.
    #[inline]
    pub fn active_displays(&self) -> &[String] {
        &self.active_displays
    }

    /// Replaces the active displays list.
    pub fn set_active_displays(&mut self, list: Vec<String>) {
        self.active_displays = list;
    }

    /// Active view names.
    #[inline]
    pub fn active_views(&self) -> &[String] {
        &self.active_views
    }

    /// Replaces the active views list.
    pub fn set_active_views(&mut self, list: Vec<String>) {
        self.active_views = list;
    }

    /// Inactive color spaces and named transforms.
    #[inline]
    pub fn inactive_colorspaces(&self) -> &[String] {
        &self.inactive_colorspaces
    }

    /// Replaces the inactive list.
    pub fn set_inactive_colorspaces(&mut self, list: Vec<String>) {
        self.inactive_colorspaces = list;
    }

    // ---------------------------------------------------------------------
    // Color spaces
    // ---------------------------------------------------------------------

    /// Returns all color spaces, both reference types.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Color spaces of one reference type, in order.
    pub fn colorspaces_of(&self, r: ReferenceSpaceType) -> impl Iterator<Item = &ColorSpace> {
        self.colorspaces.iter().filter(move |cs| cs.reference_space() == r)
    }

    /// Returns color space names.
    pub fn colorspace_names(&self) -> impl Iterator<Item = &str> {
        self.colorspaces.iter().map(|cs| cs.name())
    }

    /// Gets a color space by name, alias or role.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        if name.is_empty() {
            return None;
        }
        self.colorspaces
            .iter()
            .find(|cs| cs.matches_name(name))
            .or_else(|| {
                let target = self.roles.get(name)?;
                self.colorspaces.iter().find(|cs| cs.matches_name(target))
            })
    }

    /// Position of a color space by name or alias (roles are not followed).
    pub fn colorspace_index(&self, name: &str) -> Option<usize> {
        self.colorspaces.iter().position(|cs| cs.matches_name(name))
    }

    /// Mutable color space by name or alias.
    pub fn colorspace_mut(&mut self, name: &str) -> Option<&mut ColorSpace> {
        self.touch();
        self.colorspaces.iter_mut().find(|cs| cs.matches_name(name))
    }

    /// Adds a color space, replacing one with the same name in place.
    pub fn add_colorspace(&mut self, cs: ColorSpace) {
        upsert(&mut self.colorspaces, cs, |c| c.name());
        self.touch();
    }

    /// Removes a color space by its name (aliases are not followed).
    pub fn remove_colorspace(&mut self, name: &str) -> Option<ColorSpace> {
        self.touch();
        take_ci(&mut self.colorspaces, name, |c| c.name())
    }

    /// Removes all color spaces.
    pub fn clear_colorspaces(&mut self) {
        self.colorspaces.clear();
        self.touch();
    }

    /// Replaces the whole color space list (used to reorder).
    pub fn set_colorspaces(&mut self, colorspaces: Vec<ColorSpace>) {
        self.colorspaces = colorspaces;
        self.touch();
    }

    // ---------------------------------------------------------------------
    // Named transforms
    // ---------------------------------------------------------------------

    /// Returns all named transforms.
    #[inline]
    pub fn named_transforms(&self) -> &[NamedTransform] {
        &self.named_transforms
    }

    /// Named transform by name or alias.
    pub fn named_transform(&self, name: &str) -> Option<&NamedTransform> {
        self.named_transforms.iter().find(|nt| nt.matches_name(name))
    }

    /// Mutable named transform by name or alias.
    pub fn named_transform_mut(&mut self, name: &str) -> Option<&mut NamedTransform> {
        self.touch();
        self.named_transforms.iter_mut().find(|nt| nt.matches_name(name))
    }

    /// Adds a named transform, replacing one with the same name in place.
    pub fn add_named_transform(&mut self, nt: NamedTransform) {
        upsert(&mut self.named_transforms, nt, |n| n.name());
        self.touch();
    }

    /// Removes a named transform by name.
    pub fn remove_named_transform(&mut self, name: &str) -> Option<NamedTransform> {
        self.touch();
        take_ci(&mut self.named_transforms, name, |n| n.name())
    }

    /// Removes all named transforms.
    pub fn clear_named_transforms(&mut self) {
        self.named_transforms.clear();
        self.touch();
    }

    /// Replaces the whole named transform list.
    pub fn set_named_transforms(&mut self, nts: Vec<NamedTransform>) {
        self.named_transforms = nts;
        self.touch();
    }

    // ---------------------------------------------------------------------
    // Roles
    // ---------------------------------------------------------------------

    /// Returns the roles mapping.
    #[inline]
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// True if the role is defined.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Sets a role mapping.
    pub fn set_role(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        self.roles.define(role, colorspace);
        self.touch();
    }

    /// Removes a role.
    pub fn unset_role(&mut self, role: &str) -> Option<String> {
        self.touch();
        self.roles.remove(role)
    }

    /// Removes all roles.
    pub fn clear_roles(&mut self) {
        self.roles.clear();
        self.touch();
    }

    // ---------------------------------------------------------------------
    // Displays and views
    // ---------------------------------------------------------------------

    /// Returns all displays.
    #[inline]
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// Display by name.
    pub fn display(&self, name: &str) -> Option<&Display> {
        find_ci(&self.displays, name, |d| d.name())
    }

    /// Mutable display by name.
    pub fn display_mut(&mut self, name: &str) -> Option<&mut Display> {
        self.touch();
        self.displays.iter_mut().find(|d| d.name().eq_ignore_ascii_case(name))
    }

    /// Adds a display, replacing one with the same name in place.
    pub fn add_display(&mut self, display: Display) {
        upsert(&mut self.displays, display, |d| d.name());
        self.touch();
    }

    /// Adds a display-defined view, creating the display if needed.
    pub fn add_display_view(&mut self, display: &str, view: View) {
        self.display_entry(display).add_view(view);
    }

    /// Adds a shared view reference, creating the display if needed.
    pub fn add_display_shared_view(&mut self, display: &str, view: &str) {
        self.display_entry(display).add_shared_view(view);
    }

    fn display_entry(&mut self, display: &str) -> &mut Display {
        self.touch();
        let idx = match self.displays.iter().position(|d| d.name().eq_ignore_ascii_case(display)) {
            Some(idx) => idx,
            None => {
                self.displays.push(Display::new(display));
                self.displays.len() - 1
            }
        };
        &mut self.displays[idx]
    }

    /// Removes a display.
    pub fn remove_display(&mut self, name: &str) -> Option<Display> {
        self.touch();
        take_ci(&mut self.displays, name, |d| d.name())
    }

    /// Removes all displays.
    pub fn clear_displays(&mut self) {
        self.displays.clear();
        self.touch();
    }

    /// Config-level shared views.
    #[inline]
    pub fn shared_views(&self) -> &[View] {
        &self.shared_views
    }

    /// Shared view by name.
    pub fn shared_view(&self, name: &str) -> Option<&View> {
        find_ci(&self.shared_views, name, |v| v.name())
    }

    /// Adds a shared view, replacing one with the same name in place.
    pub fn add_shared_view(&mut self, view: View) {
        upsert(&mut self.shared_views, view, |v| v.name());
        self.touch();
    }

    /// Removes a shared view definition.
    pub fn remove_shared_view(&mut self, name: &str) -> Option<View> {
        self.touch();
        take_ci(&mut self.shared_views, name, |v| v.name())
    }

    /// Removes all shared view definitions.
    pub fn clear_shared_views(&mut self) {
        self.shared_views.clear();
        self.touch();
    }

    /// The virtual display.
    #[inline]
    pub fn virtual_display(&self) -> &Display {
        &self.virtual_display
    }

    /// Mutable virtual display.
    pub fn virtual_display_mut(&mut self) -> &mut Display {
        &mut self.virtual_display
    }

    /// Resolves a view of a display, following shared view references.
    pub fn display_view(&self, display: &str, view: &str) -> Option<&View> {
        let d = self.display(display)?;
        d.view(view).or_else(|| {
            if d.has_shared_view(view) {
                self.shared_view(view)
            } else {
                None
            }
        })
    }

    /// Display color space of a view, with `<USE_DISPLAY_NAME>` resolved.
    pub fn display_view_colorspace(&self, display: &str, view: &str) -> Option<String> {
        let v = self.display_view(display, view)?;
        Some(if v.colorspace() == USE_DISPLAY_NAME {
            display.to_string()
        } else {
            v.colorspace().to_string()
        })
    }

    /// Returns all view transforms.
    #[inline]
    pub fn view_transforms(&self) -> &[ViewTransform] {
        &self.view_transforms
    }

    /// View transform by name.
    pub fn view_transform(&self, name: &str) -> Option<&ViewTransform> {
        find_ci(&self.view_transforms, name, |v| v.name())
    }

    /// Adds a view transform, replacing one with the same name in place.
    pub fn add_view_transform(&mut self, vt: ViewTransform) {
        upsert(&mut self.view_transforms, vt, |v| v.name());
        self.touch();
    }

    /// Removes a view transform.
    pub fn remove_view_transform(&mut self, name: &str) -> Option<ViewTransform> {
        self.touch();
        take_ci(&mut self.view_transforms, name, |v| v.name())
    }

    /// Removes all view transforms.
    pub fn clear_view_transforms(&mut self) {
        self.view_transforms.clear();
        self.touch();
    }

    /// Viewing rules.
    #[inline]
    pub fn viewing_rules(&self) -> &ViewingRules {
        &self.viewing_rules
    }

    /// Replaces the viewing rules.
    pub fn set_viewing_rules(&mut self, rules: ViewingRules) {
        self.viewing_rules = rules;
    }

    // ---------------------------------------------------------------------
    // Looks and file rules
    // ---------------------------------------------------------------------

    /// Returns all looks.
    #[inline]
    pub fn looks(&self) -> &[Look] {
        &self.looks
    }

    /// Look by name.
    pub fn look(&self, name: &str) -> Option<&Look> {
        find_ci(&self.looks, name, |l| l.name())
    }

    /// Adds a look, replacing one with the same name in place.
    pub fn add_look(&mut self, look: Look) {
        upsert(&mut self.looks, look, |l| l.name());
        self.touch();
    }

    /// Removes a look.
    pub fn remove_look(&mut self, name: &str) -> Option<Look> {
        self.touch();
        take_ci(&mut self.looks, name, |l| l.name())
    }

    /// Removes all looks.
    pub fn clear_looks(&mut self) {
        self.looks.clear();
        self.touch();
    }

    /// File rules.
    #[inline]
    pub fn file_rules(&self) -> &FileRules {
        &self.file_rules
    }

    /// Replaces the file rules.
    pub fn set_file_rules(&mut self, rules: FileRules) {
        self.file_rules = rules;
    }

    /// Color space for a file path according to the file rules.
    pub fn colorspace_from_filepath(&self, path: &str) -> String {
        self.file_rules
            .colorspace_for_path(path, |p| self.parse_colorspace_from_string(p).map(String::from))
    }

    /// Finds the color space whose name or alias occurs rightmost in `s`,
    /// preferring the longest match at equal positions.
    pub fn parse_colorspace_from_string(&self, s: &str) -> Option<&str> {
        let hay = s.to_ascii_lowercase();
        let mut best: Option<(usize, usize, &str)> = None;
        for cs in &self.colorspaces {
            for candidate in std::iter::once(cs.name()).chain(cs.aliases().iter().map(String::as_str)) {
                if candidate.is_empty() {
                    continue;
                }
                if let Some(pos) = hay.rfind(&candidate.to_ascii_lowercase()) {
                    let end = pos + candidate.len();
                    let better = match best {
                        None => true,
                        Some((b_end, b_len, _)) => end > b_end || (end == b_end && candidate.len() > b_len),
                    };
                    if better {
                        best = Some((end, candidate.len(), cs.name()));
                    }
                }
            }
        }
        best.map(|(_, _, name)| name)
    }

    // ---------------------------------------------------------------------
    // Files and environment
    // ---------------------------------------------------------------------

    /// Expands `$VAR` and `${VAR}` using the config environment, falling
    /// back to the process environment. Unknown variables stay as written.
    pub fn expand_env(&self, s: &str) -> String {
        ENV_VAR
            .replace_all(s, |caps: &regex::Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                std::env::var(name)
                    .ok()
                    .or_else(|| self.env_var(name).map(String::from))
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Resolves a transform file path: absolute paths as-is, otherwise the
    /// working directory and then each search path.
    pub fn resolve_file(&self, src: &str) -> OcioResult<PathBuf> {
        let expanded = self.expand_env(src);
        let path = PathBuf::from(&expanded);
        if path.is_absolute() {
            return if path.is_file() {
                Ok(path)
            } else {
                Err(OcioError::TransformFileNotFound { path })
            };
        }

        let direct = self.working_dir.join(&path);
        if direct.is_file() {
            return Ok(direct);
        }
        for sp in &self.search_paths {
            let sp = PathBuf::from(self.expand_env(sp));
            let base = if sp.is_absolute() { sp } else { self.working_dir.join(sp) };
            let candidate = base.join(&path);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(OcioError::TransformFileNotFound { path })
    }

    // ---------------------------------------------------------------------
    // Processors
    // ---------------------------------------------------------------------

    /// Whether the processor cache is in use.
    pub fn processor_cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Switches the processor cache on or off.
    pub fn set_processor_cache_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// Drops all cached processors.
    pub fn clear_processor_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached processors.
    pub fn processor_cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Creates a processor for conversion between two color spaces.
    pub fn processor(&self, src: &str, dst: &str) -> OcioResult<Processor> {
        self.cache.get_or_create(src, dst, || {
            let t = self.color_space_conversion(src, dst, true)?;
            Processor::from_transform_in(self, &t, TransformDirection::Forward, OptimizationLevel::default())
        })
    }

    /// Creates a processor for a transform, resolving references here.
    pub fn processor_for_transform(
        &self,
        transform: &Transform,
        direction: TransformDirection,
    ) -> OcioResult<Processor> {
        Processor::from_transform_in(self, transform, direction, OptimizationLevel::default())
    }

    /// Creates a processor for a display/view.
    pub fn display_processor(&self, src: &str, display: &str, view: &str) -> OcioResult<Processor> {
        let t = self.display_view_conversion(src, display, view)?;
        self.processor_for_transform(&t, TransformDirection::Forward)
    }

    /// Cross-config conversion: `src` to `src_interchange` in `src_config`,
    /// then `dst_interchange` to `dst` in `dst_config`.
    ///
    /// The two interchange spaces are assumed to be the same color.
    pub fn processor_between(
        src_config: &Config,
        src: &str,
        src_interchange: &str,
        dst_config: &Config,
        dst: &str,
        dst_interchange: &str,
    ) -> OcioResult<Processor> {
        let first = src_config.processor(src, src_interchange)?;
        let second = dst_config.processor(dst_interchange, dst)?;
        Ok(first.concat(&second).optimized(OptimizationLevel::Lossless))
    }

    /// Expands a color space conversion into the transforms it consists of.
    pub fn color_space_conversion(&self, src: &str, dst: &str, data_bypass: bool) -> OcioResult<Transform> {
        let s = self
            .colorspace(src)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: src.into() })?;
        let d = self
            .colorspace(dst)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: dst.into() })?;

        if s.name() == d.name() || (data_bypass && (s.is_data() || d.is_data())) {
            return Ok(Transform::group(Vec::new()));
        }

        let mut steps = Vec::new();
        steps.extend(s.transform_to_reference());
        steps.extend(self.reference_bridge(s.reference_space(), d.reference_space())?);
        steps.extend(d.transform_from_reference());
        Ok(Transform::group(steps))
    }

    /// Transform between the scene and display references, through the
    /// default view transform or the first scene-referred one.
    fn reference_bridge(&self, from: ReferenceSpaceType, to: ReferenceSpaceType) -> OcioResult<Option<Transform>> {
        if from == to {
            return Ok(None);
        }
        let vt = self
            .view_transform(&self.default_view_transform)
            .filter(|vt| vt.reference_space() == ReferenceSpaceType::Scene)
            .or_else(|| {
                self.view_transforms
                    .iter()
                    .find(|vt| vt.reference_space() == ReferenceSpaceType::Scene)
            })
            .ok_or_else(|| {
                OcioError::Transform("no scene view transform to convert between the scene and display references".into())
            })?;
        let forward = vt.transform_from_reference().unwrap_or_else(|| Transform::group(Vec::new()));
        Ok(Some(match from {
            ReferenceSpaceType::Scene => forward,
            ReferenceSpaceType::Display => forward.inverse(),
        }))
    }

    /// Expands a look application into color space and look transforms.
    pub fn look_conversion(&self, src: &str, dst: &str, looks: &str) -> OcioResult<Transform> {
        let mut steps = Vec::new();
        let mut current = src.to_string();
        for (name, forward) in parse_looks(looks) {
            let look = self
                .look(name)
                .ok_or_else(|| OcioError::LookNotFound { name: name.into() })?;
            let ps = look.get_process_space();
            if !ps.is_empty() {
                steps.push(Transform::color_space(current.as_str(), ps));
                current = ps.to_string();
            }
            steps.extend(look.directed_transform(forward));
        }
        steps.push(Transform::color_space(current, dst));
        Ok(Transform::group(steps))
    }

    /// Expands a display/view into the transforms it consists of.
    pub fn display_view_conversion(&self, src: &str, display: &str, view: &str) -> OcioResult<Transform> {
        if self.display(display).is_none() {
            return Err(OcioError::DisplayNotFound { name: display.into() });
        }
        let v = self.display_view(display, view).ok_or_else(|| OcioError::ViewNotFound {
            display: display.into(),
            view: view.into(),
        })?;
        let dst = self
            .display_view_colorspace(display, view)
            .unwrap_or_else(|| v.colorspace().to_string());

        let mut steps = Vec::new();
        if let Some(looks) = v.looks() {
            steps.push(self.look_conversion(src, src, looks)?);
        }

        match v.view_transform() {
            Some(vt_name) => {
                let vt = self.view_transform(vt_name).ok_or_else(|| {
                    OcioError::Validation(format!("view '{view}' references missing view transform '{vt_name}'"))
                })?;
                let s = self
                    .colorspace(src)
                    .ok_or_else(|| OcioError::ColorSpaceNotFound { name: src.into() })?;
                let d = self
                    .colorspace(&dst)
                    .ok_or_else(|| OcioError::ColorSpaceNotFound { name: dst.clone() })?;
                steps.extend(s.transform_to_reference());
                steps.extend(self.reference_bridge(s.reference_space(), vt.reference_space())?);
                steps.extend(vt.transform_from_reference());
                steps.extend(d.transform_from_reference());
            }
            None => steps.push(Transform::color_space(src, dst)),
        }
        Ok(Transform::group(steps))
    }

    /// Whether a color space is linear relative to the given reference.
    ///
    /// The encoding decides when set. Otherwise the to-reference transform
    /// is probed: zero must map to zero and scaling the input must scale
    /// the output by the same factor.
    pub fn is_color_space_linear(&self, name: &str, reference: ReferenceSpaceType) -> bool {
        let Some(cs) = self.colorspace(name) else {
            return false;
        };
        if cs.is_data() || cs.reference_space() != reference {
            return false;
        }
        match cs.encoding() {
            crate::Encoding::Unknown => {}
            crate::Encoding::SceneLinear => return reference == ReferenceSpaceType::Scene,
            crate::Encoding::DisplayLinear => return reference == ReferenceSpaceType::Display,
            _ => return false,
        }
        let Some(t) = cs.transform_to_reference() else {
            return true;
        };
        let Ok(proc) = self.processor_for_transform(&t, TransformDirection::Forward) else {
            return false;
        };

        const BASE: [f32; 3] = [0.18, 0.45, 0.9];
        const SCALES: [f32; 4] = [0.0, 0.25, 1.0, 4.0];
        let mut px: Vec<[f32; 4]> = SCALES
            .iter()
            .map(|k| [BASE[0] * k, BASE[1] * k, BASE[2] * k, 1.0])
            .collect();
        proc.apply_rgba(&mut px);

        let unit = px[2];
        SCALES.iter().zip(&px).all(|(k, out)| {
            (0..3).all(|c| {
                let expected = unit[c] * k;
                (out[c] - expected).abs() <= 1e-4 * expected.abs().max(1.0)
            })
        })
    }
}
