//! Integration tests for the color config merge crates.
//!
//! End-to-end merges of complete configs through `vfx-ocio-merge`, checked
//! with the `vfx-ocio` host library. Section-level behavior is covered by
//! the unit tests next to each merger; here whole configs go through every
//! section at once.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod properties;
