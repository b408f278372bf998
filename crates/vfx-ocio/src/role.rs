//! Standard color space roles.
//!
//! Roles provide a consistent way to reference color spaces by their purpose
//! rather than their specific name. This enables config portability.
//!
//! # Standard Roles
//!
//! - `reference` - Scene-referred linear reference space
//! - `default` - Default input color space
//! - `data` - Non-color data (normals, masks, etc.)
//! - `scene_linear` - Scene-referred linear working space
//! - `aces_interchange` - ACES2065-1 hand-off between configs
//! - `cie_xyz_d65_interchange` - CIE XYZ D65 display-referred hand-off

/// Standard OCIO role names.
pub mod names {
    /// Scene-referred linear reference.
    pub const REFERENCE: &str = "reference";
    /// Default input color space.
    pub const DEFAULT: &str = "default";
    /// Non-color data (normals, masks).
    pub const DATA: &str = "data";
    /// Scene-referred linear working space.
    pub const SCENE_LINEAR: &str = "scene_linear";
    /// Rendering calculations space.
    pub const RENDERING: &str = "rendering";
    /// Compositing log space.
    pub const COMPOSITING_LOG: &str = "compositing_log";
    /// Color grading space.
    pub const COLOR_TIMING: &str = "color_timing";
    /// Texture painting space.
    pub const TEXTURE_PAINT: &str = "texture_paint";
    /// Matte painting space.
    pub const MATTE_PAINT: &str = "matte_paint";
    /// Color picker display space.
    pub const COLOR_PICKING: &str = "color_picking";
    /// ACES interchange scene-referred.
    pub const ACES_INTERCHANGE: &str = "aces_interchange";
    /// CIE XYZ interchange (D65).
    pub const CIE_XYZ_D65_INTERCHANGE: &str = "cie_xyz_d65_interchange";
}

/// Ordered role to color space mapping.
///
/// Role names compare case-insensitively. Redefining a role keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roles {
    entries: Vec<(String, String)>,
}

impl Roles {
    /// Creates an empty roles mapping.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a role mapping.
    ///
    /// # Arguments
    ///
    /// * `role` - Role name (e.g., "scene_linear")
    /// * `colorspace` - Color space name this role maps to
    pub fn define(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        let role = role.into();
        let colorspace = colorspace.into();
        match self.entries.iter_mut().find(|(r, _)| r.eq_ignore_ascii_case(&role)) {
            Some(entry) => entry.1 = colorspace,
            None => self.entries.push((role, colorspace)),
        }
    }

    /// Removes a role, returning the color space it mapped to.
    pub fn remove(&mut self, role: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(r, _)| r.eq_ignore_ascii_case(role))?;
        Some(self.entries.remove(idx).1)
    }

    /// Gets the color space name for a role.
    pub fn get(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| r.eq_ignore_ascii_case(role))
            .map(|(_, cs)| cs.as_str())
    }

    /// Checks if a role is defined.
    #[inline]
    pub fn contains(&self, role: &str) -> bool {
        self.get(role).is_some()
    }

    /// Returns all defined roles in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of defined roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if no roles are defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all roles.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Points every role targeting `from` at `to` instead.
    pub fn rename_target(&mut self, from: &str, to: &str) {
        for (_, cs) in &mut self.entries {
            if cs.eq_ignore_ascii_case(from) {
                *cs = to.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let mut roles = Roles::new();
        roles.define("scene_linear", "ACEScg");
        roles.define("reference", "ACES2065-1");

        assert_eq!(roles.get("SCENE_LINEAR"), Some("ACEScg"));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn redefine_keeps_order() {
        let mut roles = Roles::new();
        roles.define(names::DATA, "Raw");
        roles.define(names::TEXTURE_PAINT, "ACEScct");
        roles.define(names::DATA, "Utility - Raw");

        let order: Vec<_> = roles.iter().collect();
        assert_eq!(order, [("data", "Utility - Raw"), ("texture_paint", "ACEScct")]);
    }

    #[test]
    fn remove_and_retarget() {
        let mut roles = Roles::new();
        roles.define("a", "X");
        roles.define("b", "x");
        roles.rename_target("X", "Y");
        assert_eq!(roles.get("b"), Some("Y"));
        assert_eq!(roles.remove("A"), Some("Y".to_string()));
        assert!(!roles.contains("a"));
    }
}
