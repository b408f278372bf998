//! OpenColorIO-compatible color configuration model.
//!
//! This crate provides the config layer the merge tooling works on:
//! - Load and write `.ocio` configuration files
//! - Define and manage color spaces, displays, looks and rules
//! - Build transform chains and evaluate them on pixels
//! - A built-in reference config addressable by `ocio://` URI
//!
//! # Quick Start
//!
//! ```
//! use vfx_ocio::{Config, builtin};
//!
//! let config = builtin::reference();
//!
//! // Look up color spaces
//! let acescg = config.colorspace("ACEScg").unwrap();
//! println!("Working space: {}", acescg.name());
//!
//! // Create a processor
//! let processor = config.processor("ACEScg", "sRGB - Texture").unwrap();
//!
//! // Apply to pixels
//! let mut pixels = [[0.18_f32, 0.18, 0.18]];
//! processor.apply_rgb(&mut pixels);
//! ```
//!
//! # Loading External Configs
//!
//! ```ignore
//! use vfx_ocio::Config;
//!
//! let config = Config::from_file("path/to/config.ocio")?;
//!
//! for cs in config.colorspaces() {
//!     println!("{}: {:?}", cs.name(), cs.encoding());
//! }
//! ```
//!
//! # Roles
//!
//! ```
//! use vfx_ocio::builtin;
//!
//! let config = builtin::reference();
//! let linear = config.colorspace("scene_linear").unwrap();
//! assert_eq!(linear.name(), "ACEScg");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod config;
mod colorspace;
mod transform;
mod processor;
mod display;
mod look;
mod role;
mod named_transform;
mod file_rules;
mod viewing_rules;
mod cache;
mod builtin_transforms;
mod yaml;

pub mod builtin;
pub mod file;
pub mod primaries;
pub mod validate;

// Re-exports
pub use error::{OcioError, OcioResult};
pub use config::{Config, ConfigVersion, DEFAULT_LUMA};
pub use colorspace::{BitDepth, ColorSpace, ColorSpaceBuilder, Encoding, ReferenceSpaceType};
pub use transform::{
    Transform, TransformDirection, TransformKind, Interpolation,
    MatrixTransform, CdlTransform, CdlStyle,
    ExponentTransform, ExponentWithLinearTransform, NegativeStyle,
    LogTransform, LogCameraTransform, FileTransform,
    RangeTransform, RangeStyle,
    GroupTransform, BuiltinTransform,
    ColorSpaceTransform, LookTransform, DisplayViewTransform,
    Lut1dTransform, Lut3dTransform,
};
pub use processor::{Processor, ProcessorOp, OptimizationLevel};
pub use display::{Display, View, ViewTransform, USE_DISPLAY_NAME};
pub use look::{Look, parse_looks};
pub use role::{Roles, names as role_names};
pub use named_transform::NamedTransform;
pub use file_rules::{FileRule, FileRuleKind, FileRules, DEFAULT_RULE_NAME, PATH_SEARCH_RULE_NAME};
pub use viewing_rules::{ViewingRule, ViewingRules};
pub use cache::ProcessorCache;
pub use builtin_transforms::get_builtin;
pub use yaml::{transform_from_value, transform_to_value};
pub use validate::{check as validate_config, Issue, Severity, IssueCategory, has_errors, has_warnings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_start_example() {
        let config = builtin::reference();

        let acescg = config.colorspace("ACEScg").unwrap();
        assert_eq!(acescg.name(), "ACEScg");

        let processor = config.processor("ACEScg", "sRGB - Texture").unwrap();
        let mut pixels = [[0.18_f32, 0.18, 0.18]];
        processor.apply_rgb(&mut pixels);
        assert!(pixels[0][0] > 0.18);
    }

    #[test]
    fn role_access() {
        let config = builtin::reference();
        let linear = config.colorspace("scene_linear").unwrap();
        assert_eq!(linear.name(), "ACEScg");
    }

    #[test]
    fn transform_chain() {
        let cdl = Transform::Cdl(CdlTransform {
            slope: [1.1, 1.0, 0.9],
            offset: [0.0, 0.0, 0.0],
            power: [1.0, 1.0, 1.0],
            saturation: 1.0,
            style: CdlStyle::default(),
            direction: TransformDirection::Forward,
        });

        let processor = Processor::from_transform(&cdl, TransformDirection::Forward).unwrap();

        let mut pixels = [[0.5_f32, 0.5, 0.5]];
        processor.apply_rgb(&mut pixels);

        assert!((pixels[0][0] - 0.55).abs() < 0.01);
    }
}
