//! Merging of OpenColorIO-compatible color configurations.
//!
//! Takes a base config and an input config and produces a merged config.
//! Every section has its own strategy:
//! - `PreferInput` / `PreferBase` keep both sides and pick a winner on conflict
//! - `InputOnly` / `BaseOnly` keep one side
//! - `Remove` deletes from the base whatever the input names
//!
//! Input color spaces are rebased onto the base reference spaces before
//! they are merged, and numerically equivalent spaces can be collapsed.
//!
//! # Quick Start
//!
//! ```
//! use vfx_ocio::{builtin, ColorSpace, Config};
//! use vfx_ocio_merge::{merge_config_pair, CollectingSink, MergeParameters};
//!
//! let base = builtin::reference();
//! let mut input = Config::new();
//! input.add_colorspace(ColorSpace::builder("Camera Log").family("Input").build());
//!
//! let params = MergeParameters::new()
//!     .with_adjust_input_reference_space(false)
//!     .with_input_family_prefix("Show/");
//! let sink = CollectingSink::new();
//! let merged = merge_config_pair(&params, &base, &input, &sink)?;
//! assert!(merged.colorspace("ACEScg").is_some());
//! # Ok::<(), vfx_ocio_merge::MergeError>(())
//! ```
//!
//! # Recipes
//!
//! ```ignore
//! use vfx_ocio_merge::{merge_configs, MergeRecipe};
//!
//! let recipe = MergeRecipe::from_file("show.ociom")?;
//! for out in merge_configs(&recipe)? {
//!     out.config.write_to_file(format!("{}.ocio", out.name))?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod notify;
mod orchestrator;
mod params;
mod recipe;

pub mod converter;
pub mod fingerprint;
pub mod mergers;
pub mod refspace;

pub use converter::{
    build_reference_converter, update_reference_color_space, update_reference_view_transform,
    ReferenceConverters,
};
pub use error::{MergeError, MergeResult, Side};
pub use fingerprint::{find_equivalent_color_space, FingerprintIndex};
pub use mergers::SectionMerger;
pub use notify::{notify, CollectingSink, ConflictSink, TracingSink};
pub use orchestrator::{merge_color_space, merge_config_pair, merge_configs, ConfigMerger, MergedConfig};
pub use params::{MergeParameters, MergeStrategy, Overrides, Section, SectionStrategies};
pub use recipe::MergeRecipe;
pub use refspace::{identify_builtin_color_space, identify_interchange_space, Interchange};
