//! Display and View management.
//!
//! OCIO organizes output transforms through displays and views:
//! - **Display**: A physical or virtual display device (monitor, projector)
//! - **View**: A viewing condition for that display (SDR, HDR, Raw, etc.)
//! - **Shared view**: A view defined once at config level and referenced
//!   by name from any number of displays
//! - **View transform**: Converts between the scene and display references
//!
//! # Example
//!
//! ```
//! use vfx_ocio::{Display, View};
//!
//! let mut display = Display::new("sRGB Monitor");
//! display.add_view(View::new("Film", "sRGB").with_look("Show LUT"));
//! display.add_shared_view("Raw");
//!
//! assert_eq!(display.views().len(), 1);
//! assert!(display.has_view("raw"));
//! ```

use crate::colorspace::ReferenceSpaceType;
use crate::transform::Transform;

/// Name used by a shared view to mean "the display's own color space".
pub const USE_DISPLAY_NAME: &str = "<USE_DISPLAY_NAME>";

fn opt_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or("").eq_ignore_ascii_case(b.unwrap_or(""))
}

/// A view within a display, or a shared view.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    colorspace: String,
    looks: Option<String>,
    view_transform: Option<String>,
    rule: Option<String>,
    description: String,
}

impl View {
    /// Creates a new view.
    ///
    /// # Arguments
    ///
    /// * `name` - View name
    /// * `colorspace` - Target (display) color space name
    pub fn new(name: impl Into<String>, colorspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
            looks: None,
            view_transform: None,
            rule: None,
            description: String::new(),
        }
    }

    /// Adds a look to apply.
    pub fn with_look(mut self, looks: impl Into<String>) -> Self {
        self.looks = Some(looks.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Sets the view transform (OCIO v2).
    pub fn with_view_transform(mut self, vt: impl Into<String>) -> Self {
        self.view_transform = Some(vt.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Sets a viewing rule.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Sets description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Returns the view name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target color space.
    #[inline]
    pub fn colorspace(&self) -> &str {
        &self.colorspace
    }

    /// Returns the look(s) to apply.
    #[inline]
    pub fn looks(&self) -> Option<&str> {
        self.looks.as_deref()
    }

    /// Returns the view transform name.
    #[inline]
    pub fn view_transform(&self) -> Option<&str> {
        self.view_transform.as_deref()
    }

    /// Returns the viewing rule.
    #[inline]
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Compares every field except the name, ignoring case.
    pub fn is_equivalent(&self, other: &View) -> bool {
        self.colorspace.eq_ignore_ascii_case(&other.colorspace)
            && opt_eq(self.looks(), other.looks())
            && opt_eq(self.view_transform(), other.view_transform())
            && opt_eq(self.rule(), other.rule())
            && self.description.eq_ignore_ascii_case(&other.description)
    }
}

/// A display device configuration.
///
/// Holds display-defined views and references to shared views. A view
/// name appears at most once across both lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Display {
    name: String,
    views: Vec<View>,
    shared_views: Vec<String>,
}

impl Display {
    /// Creates a new display.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
            shared_views: Vec::new(),
        }
    }

    /// Returns the display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a display-defined view, replacing one with the same name.
    pub fn add_view(&mut self, view: View) {
        self.shared_views.retain(|s| !s.eq_ignore_ascii_case(&view.name));
        match self.views.iter_mut().find(|v| v.name.eq_ignore_ascii_case(&view.name)) {
            Some(existing) => *existing = view,
            None => self.views.push(view),
        }
    }

    /// Adds a reference to a shared view.
    pub fn add_shared_view(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.views.retain(|v| !v.name.eq_ignore_ascii_case(&name));
        if !self.has_shared_view(&name) {
            self.shared_views.push(name);
        }
    }

    /// Removes a view of either kind.
    pub fn remove_view(&mut self, name: &str) {
        self.views.retain(|v| !v.name.eq_ignore_ascii_case(name));
        self.shared_views.retain(|s| !s.eq_ignore_ascii_case(name));
    }

    /// Returns display-defined views.
    #[inline]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Returns shared view references.
    #[inline]
    pub fn shared_views(&self) -> &[String] {
        &self.shared_views
    }

    /// Gets a display-defined view by name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// True if the display references the shared view `name`.
    pub fn has_shared_view(&self, name: &str) -> bool {
        self.shared_views.iter().any(|s| s.eq_ignore_ascii_case(name))
    }

    /// True if a view of either kind is present.
    pub fn has_view(&self, name: &str) -> bool {
        self.view(name).is_some() || self.has_shared_view(name)
    }

    /// True when there are no views of either kind.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.shared_views.is_empty()
    }

    /// View names in order, display-defined first.
    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.shared_views.iter().map(String::as_str))
    }

    /// Removes all views.
    pub fn clear(&mut self) {
        self.views.clear();
        self.shared_views.clear();
    }
}

/// View transform definition (OCIO v2).
///
/// A scene view transform converts the scene reference to the display
/// reference; a display view transform maps the display reference onto
/// itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    name: String,
    family: String,
    description: String,
    categories: Vec<String>,
    reference_space: ReferenceSpaceType,
    to_reference: Option<Transform>,
    from_reference: Option<Transform>,
}

impl ViewTransform {
    /// Creates a scene-referred view transform without transforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: String::new(),
            description: String::new(),
            categories: Vec::new(),
            reference_space: ReferenceSpaceType::Scene,
            to_reference: None,
            from_reference: None,
        }
    }

    /// Returns the name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the family.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Sets the family.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Returns the categories.
    #[inline]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Adds a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Sets the reference the transforms start from.
    pub fn with_reference_space(mut self, r: ReferenceSpaceType) -> Self {
        self.reference_space = r;
        self
    }

    /// Sets the transform from the reference to the display reference.
    pub fn with_from_reference(mut self, t: Transform) -> Self {
        self.from_reference = Some(t);
        self
    }

    /// Sets the transform from the display reference back to the reference.
    pub fn with_to_reference(mut self, t: Transform) -> Self {
        self.to_reference = Some(t);
        self
    }

    /// Reference space the view transform starts from.
    #[inline]
    pub fn reference_space(&self) -> ReferenceSpaceType {
        self.reference_space
    }

    /// Transform from the reference to the display reference.
    #[inline]
    pub fn from_reference(&self) -> Option<&Transform> {
        self.from_reference.as_ref()
    }

    /// Transform from the display reference back to the reference.
    #[inline]
    pub fn to_reference(&self) -> Option<&Transform> {
        self.to_reference.as_ref()
    }

    /// Replaces the from-reference transform.
    pub fn set_from_reference(&mut self, t: Option<Transform>) {
        self.from_reference = t;
    }

    /// Replaces the to-reference transform.
    pub fn set_to_reference(&mut self, t: Option<Transform>) {
        self.to_reference = t;
    }

    /// The from-reference direction, inverting `to_reference` if needed.
    pub fn transform_from_reference(&self) -> Option<Transform> {
        self.from_reference
            .clone()
            .or_else(|| self.to_reference.clone().map(Transform::inverse))
    }
}
