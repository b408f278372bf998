//! Named transforms.
//!
//! A named transform is a standalone transform that is not anchored to a
//! reference space. It shares the color space namespace: its name and
//! aliases must not collide with color spaces or roles.

use crate::transform::Transform;

/// Named transform definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedTransform {
    name: String,
    aliases: Vec<String>,
    family: String,
    description: String,
    categories: Vec<String>,
    encoding: String,
    forward: Option<Transform>,
    inverse: Option<Transform>,
}

impl NamedTransform {
    /// Creates a named transform with a forward transform.
    pub fn new(name: impl Into<String>, forward: Transform) -> Self {
        Self {
            name: name.into(),
            forward: Some(forward),
            ..Default::default()
        }
    }

    /// Creates a named transform with only an inverse transform.
    pub fn with_inverse(name: impl Into<String>, inverse: Transform) -> Self {
        Self {
            name: name.into(),
            inverse: Some(inverse),
            ..Default::default()
        }
    }

    /// Name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliases.
    #[inline]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Family path.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Categories.
    #[inline]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Encoding label.
    #[inline]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Forward transform.
    #[inline]
    pub fn forward(&self) -> Option<&Transform> {
        self.forward.as_ref()
    }

    /// Inverse transform.
    #[inline]
    pub fn inverse(&self) -> Option<&Transform> {
        self.inverse.as_ref()
    }

    /// The forward direction, inverting the inverse transform if needed.
    pub fn forward_transform(&self) -> Option<Transform> {
        self.forward
            .clone()
            .or_else(|| self.inverse.clone().map(Transform::inverse))
    }

    /// Checks if a name or alias matches (case-insensitive).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.has_alias(name)
    }

    /// Checks if an alias matches (case-insensitive).
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }

    /// Adds an alias unless it equals the name or an existing alias.
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if !alias.is_empty() && !self.matches_name(&alias) {
            self.aliases.push(alias);
        }
    }

    /// Removes an alias (case-insensitive).
    pub fn remove_alias(&mut self, alias: &str) {
        self.aliases.retain(|a| !a.eq_ignore_ascii_case(alias));
    }

    /// Sets the family path.
    pub fn set_family(&mut self, family: impl Into<String>) {
        self.family = family.into();
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Adds a category.
    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.push(category.into());
    }

    /// Sets the encoding label.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.encoding = encoding.into();
    }

    /// Sets the forward transform.
    pub fn set_forward(&mut self, t: Option<Transform>) {
        self.forward = t;
    }

    /// Sets the inverse transform.
    pub fn set_inverse(&mut self, t: Option<Transform>) {
        self.inverse = t;
    }
}
