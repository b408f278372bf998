//! Look definitions for creative color transforms.
//!
//! Looks are named creative transforms that can be applied on top of the
//! display pipeline. They're typically used for:
//! - Show/shot-specific color grades
//! - Creative LUTs
//! - Per-sequence adjustments
//!
//! # Example
//!
//! ```
//! use vfx_ocio::Look;
//!
//! let look = Look::new("Show LUT")
//!     .process_space("ACEScct")
//!     .description("Main show look");
//!
//! assert_eq!(look.name(), "Show LUT");
//! assert_eq!(look.get_process_space(), "ACEScct");
//! ```

use crate::transform::Transform;

/// A named creative look/grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Look {
    name: String,
    process_space: String,
    description: String,
    transform: Option<Transform>,
    inverse_transform: Option<Transform>,
}

impl Look {
    /// Creates a new look with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process_space: String::new(),
            description: String::new(),
            transform: None,
            inverse_transform: None,
        }
    }

    /// Sets the process space.
    pub fn process_space(mut self, space: impl Into<String>) -> Self {
        self.process_space = space.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Sets the forward transform.
    pub fn transform(mut self, t: Transform) -> Self {
        self.transform = Some(t);
        self
    }

    /// Sets the inverse transform.
    pub fn inverse_transform(mut self, t: Transform) -> Self {
        self.inverse_transform = Some(t);
        self
    }

    /// Returns the look name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the process space.
    #[inline]
    pub fn get_process_space(&self) -> &str {
        &self.process_space
    }

    /// Returns the description.
    #[inline]
    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// Returns the forward transform.
    #[inline]
    pub fn get_transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Returns the inverse transform.
    #[inline]
    pub fn get_inverse_transform(&self) -> Option<&Transform> {
        self.inverse_transform.as_ref()
    }

    /// The transform for the requested direction, deriving one from the
    /// other when only one is defined.
    pub fn directed_transform(&self, forward: bool) -> Option<Transform> {
        let (own, other) = if forward {
            (&self.transform, &self.inverse_transform)
        } else {
            (&self.inverse_transform, &self.transform)
        };
        own.clone().or_else(|| other.clone().map(Transform::inverse))
    }
}

/// Parses a comma-separated look string into individual look names.
///
/// Supports:
/// - Single look: `"ShowLUT"`
/// - Multiple looks: `"ShowLUT, ShotGrade"`
/// - Look with direction: `"+ShowLUT"` (forward), `"-ShowLUT"` (inverse)
///
/// Returns tuples of (name, is_forward).
pub fn parse_looks(looks_str: &str) -> Vec<(&str, bool)> {
    looks_str
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Some(name) = s.strip_prefix('-') {
                Some((name.trim(), false))
            } else if let Some(name) = s.strip_prefix('+') {
                Some((name.trim(), true))
            } else {
                Some((s, true))
            }
        })
        .collect()
}
