//! Color space definition and properties.
//!
//! A color space in OCIO defines:
//! - How to convert to/from its reference space (scene or display)
//! - Categorization (family, encoding, categories)
//! - Metadata (description, aliases)
//!
//! # Example
//!
//! ```
//! use vfx_ocio::{ColorSpace, Encoding, ReferenceSpaceType};
//!
//! let cs = ColorSpace::builder("ACEScg")
//!     .family("ACES")
//!     .encoding(Encoding::SceneLinear)
//!     .description("ACES CG working space")
//!     .build();
//!
//! assert_eq!(cs.name(), "ACEScg");
//! assert_eq!(cs.reference_space(), ReferenceSpaceType::Scene);
//! ```

use crate::transform::Transform;

/// Which reference a color space is defined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferenceSpaceType {
    /// Scene-referred reference.
    #[default]
    Scene,
    /// Display-referred reference.
    Display,
}

impl ReferenceSpaceType {
    /// Lower-case label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Display => "display",
        }
    }
}

/// Color encoding type.
///
/// Indicates the data encoding/interpretation of pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Scene-referred linear.
    SceneLinear,
    /// Display-referred linear.
    DisplayLinear,
    /// Logarithmic encoding.
    Log,
    /// OETF-encoded (sRGB, Rec.709, etc.).
    Sdr,
    /// HDR display encoding (PQ, HLG).
    Hdr,
    /// Non-color data (normals, masks).
    Data,
    /// Unknown/unspecified encoding.
    #[default]
    Unknown,
}

impl Encoding {
    /// Parses encoding from OCIO config string.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "scene-linear" | "scene_linear" | "linear" => Self::SceneLinear,
            "display-linear" | "display_linear" => Self::DisplayLinear,
            "log" => Self::Log,
            "sdr-video" | "sdr_video" | "sdr" => Self::Sdr,
            "hdr-video" | "hdr_video" | "hdr" => Self::Hdr,
            "data" => Self::Data,
            _ => Self::Unknown,
        }
    }

    /// Returns OCIO config string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SceneLinear => "scene-linear",
            Self::DisplayLinear => "display-linear",
            Self::Log => "log",
            Self::Sdr => "sdr-video",
            Self::Hdr => "hdr-video",
            Self::Data => "data",
            Self::Unknown => "",
        }
    }

    /// Checks if this is a linear encoding.
    #[inline]
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::SceneLinear | Self::DisplayLinear)
    }
}

/// Bit depth hint for the color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// Not specified.
    #[default]
    Unknown,
    /// 8-bit unsigned integer.
    Uint8,
    /// 10-bit unsigned integer.
    Uint10,
    /// 12-bit unsigned integer.
    Uint12,
    /// 16-bit unsigned integer.
    Uint16,
    /// 16-bit float.
    F16,
    /// 32-bit float.
    F32,
}

impl BitDepth {
    /// Parses the config spelling (`8ui`, `16f`, `32f`, ...).
    pub fn parse(s: &str) -> Self {
        match s {
            "8ui" => Self::Uint8,
            "10ui" => Self::Uint10,
            "12ui" => Self::Uint12,
            "16ui" => Self::Uint16,
            "16f" => Self::F16,
            "32f" => Self::F32,
            _ => Self::Unknown,
        }
    }

    /// Config spelling, empty when unknown.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Uint8 => "8ui",
            Self::Uint10 => "10ui",
            Self::Uint12 => "12ui",
            Self::Uint16 => "16ui",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }
}

/// Color space definition.
///
/// Represents a named color space with transforms to/from reference space.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpace {
    name: String,
    aliases: Vec<String>,
    description: String,
    family: String,
    equality_group: String,
    categories: Vec<String>,
    encoding: Encoding,
    bit_depth: BitDepth,
    is_data: bool,
    reference_space: ReferenceSpaceType,
    to_reference: Option<Transform>,
    from_reference: Option<Transform>,
}

impl ColorSpace {
    /// Creates a new scene-referred color space with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            family: String::new(),
            equality_group: String::new(),
            categories: Vec::new(),
            encoding: Encoding::default(),
            bit_depth: BitDepth::default(),
            is_data: false,
            reference_space: ReferenceSpaceType::Scene,
            to_reference: None,
            from_reference: None,
        }
    }

    /// Creates a builder for constructing color spaces.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ColorSpaceBuilder {
        ColorSpaceBuilder::new(name)
    }

    /// Returns the color space name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all aliases.
    #[inline]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the family path.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the equality group.
    #[inline]
    pub fn equality_group(&self) -> &str {
        &self.equality_group
    }

    /// Returns the categories.
    #[inline]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Returns the encoding type.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the bit depth hint.
    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Checks if this is a data (non-color) space.
    #[inline]
    pub fn is_data(&self) -> bool {
        self.is_data
    }

    /// Returns the reference space type.
    #[inline]
    pub fn reference_space(&self) -> ReferenceSpaceType {
        self.reference_space
    }

    /// Returns the transform to reference space.
    #[inline]
    pub fn to_reference(&self) -> Option<&Transform> {
        self.to_reference.as_ref()
    }

    /// Returns the transform from reference space.
    #[inline]
    pub fn from_reference(&self) -> Option<&Transform> {
        self.from_reference.as_ref()
    }

    /// True when neither direction is defined.
    #[inline]
    pub fn has_no_transforms(&self) -> bool {
        self.to_reference.is_none() && self.from_reference.is_none()
    }

    /// A transform in the to-reference direction, inverting
    /// `from_reference` when only that one exists.
    pub fn transform_to_reference(&self) -> Option<Transform> {
        self.to_reference
            .clone()
            .or_else(|| self.from_reference.clone().map(Transform::inverse))
    }

    /// A transform in the from-reference direction, inverting
    /// `to_reference` when only that one exists.
    pub fn transform_from_reference(&self) -> Option<Transform> {
        self.from_reference
            .clone()
            .or_else(|| self.to_reference.clone().map(Transform::inverse))
    }

    /// Checks if a name or alias matches (case-insensitive).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.has_alias(name)
    }

    /// Checks if an alias matches (case-insensitive).
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }

    /// Renames the color space.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds an alias unless it equals the name or an existing alias.
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if alias.is_empty() || self.matches_name(&alias) {
            return;
        }
        self.aliases.push(alias);
    }

    /// Removes an alias (case-insensitive).
    pub fn remove_alias(&mut self, alias: &str) {
        self.aliases.retain(|a| !a.eq_ignore_ascii_case(alias));
    }

    /// Removes all aliases.
    pub fn clear_aliases(&mut self) {
        self.aliases.clear();
    }

    /// Sets the family path.
    pub fn set_family(&mut self, family: impl Into<String>) {
        self.family = family.into();
    }

    /// Sets the description.
    pub fn set_description(&mut self, desc: impl Into<String>) {
        self.description = desc.into();
    }

    /// Sets the transform to reference space.
    pub fn set_to_reference(&mut self, t: Option<Transform>) {
        self.to_reference = t;
    }

    /// Sets the transform from reference space.
    pub fn set_from_reference(&mut self, t: Option<Transform>) {
        self.from_reference = t;
    }
}

/// Builder for constructing color spaces.
#[derive(Debug)]
pub struct ColorSpaceBuilder {
    inner: ColorSpace,
}

impl ColorSpaceBuilder {
    /// Creates a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: ColorSpace::new(name),
        }
    }

    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.inner.add_alias(alias);
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.inner.description = desc.into();
        self
    }

    /// Sets the family path.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.inner.family = family.into();
        self
    }

    /// Sets the equality group.
    pub fn equality_group(mut self, group: impl Into<String>) -> Self {
        self.inner.equality_group = group.into();
        self
    }

    /// Adds a category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.inner.categories.push(category.into());
        self
    }

    /// Sets the encoding.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.inner.encoding = encoding;
        if encoding == Encoding::Data {
            self.inner.is_data = true;
        }
        self
    }

    /// Sets the bit depth.
    pub fn bit_depth(mut self, depth: BitDepth) -> Self {
        self.inner.bit_depth = depth;
        self
    }

    /// Marks as data (non-color) space.
    pub fn is_data(mut self, is_data: bool) -> Self {
        self.inner.is_data = is_data;
        self
    }

    /// Sets the reference space type.
    pub fn reference_space(mut self, r: ReferenceSpaceType) -> Self {
        self.inner.reference_space = r;
        self
    }

    /// Sets the transform to reference space.
    pub fn to_reference(mut self, transform: Transform) -> Self {
        self.inner.to_reference = Some(transform);
        self
    }

    /// Sets the transform from reference space.
    pub fn from_reference(mut self, transform: Transform) -> Self {
        self.inner.from_reference = Some(transform);
        self
    }

    /// Builds the color space.
    pub fn build(self) -> ColorSpace {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{MatrixTransform, TransformDirection};

    #[test]
    fn build_colorspace() {
        let cs = ColorSpace::builder("ACEScg")
            .alias("ACES - ACEScg")
            .family("ACES")
            .encoding(Encoding::SceneLinear)
            .description("ACES CG working space")
            .build();

        assert_eq!(cs.name(), "ACEScg");
        assert_eq!(cs.family(), "ACES");
        assert!(cs.encoding().is_linear());
        assert!(cs.matches_name("acescg"));
        assert!(cs.matches_name("ACES - ACEScg"));
    }

    #[test]
    fn aliases_skip_duplicates() {
        let mut cs = ColorSpace::new("lin");
        cs.add_alias("LIN");
        cs.add_alias("linear");
        cs.add_alias("Linear");
        assert_eq!(cs.aliases(), ["linear"]);
        cs.remove_alias("LINEAR");
        assert!(cs.aliases().is_empty());
    }

    #[test]
    fn to_reference_falls_back_to_inverse() {
        let cs = ColorSpace::builder("x")
            .from_reference(Transform::Matrix(MatrixTransform::identity()))
            .build();
        let t = cs.transform_to_reference().unwrap();
        assert_eq!(t.direction(), TransformDirection::Inverse);
        assert!(ColorSpace::new("ref").transform_to_reference().is_none());
    }

    #[test]
    fn data_colorspace() {
        let cs = ColorSpace::builder("Raw").encoding(Encoding::Data).build();
        assert!(cs.is_data());
    }
}
