//! Transform file decoding.
//!
//! Only the Sony Imageworks formats are decoded:
//! - `.spi1d` - 1D LUT with 1 or 3 components
//! - `.spimtx` - 3x4 matrix with offsets in 16-bit code values
//!
//! Decoded files become inline primitive transforms, which is what lets a
//! processor bake file references into a self-contained group.

use std::fs;
use std::path::Path;

use crate::error::{OcioError, OcioResult};
use crate::transform::*;

/// Extensions this module decodes.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".spi1d", ".spimtx"];

/// Loads a transform file into a primitive transform.
pub fn load(path: &Path) -> OcioResult<Transform> {
    if !path.is_file() {
        return Err(OcioError::TransformFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let text = fs::read_to_string(path)?;
    match ext.as_str() {
        "spi1d" => parse_spi1d(&text).map(Transform::Lut1d),
        "spimtx" => parse_spimtx(&text).map(Transform::Matrix),
        _ => Err(OcioError::UnsupportedFileFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn invalid(reason: impl Into<String>) -> OcioError {
    OcioError::InvalidTransform {
        reason: reason.into(),
    }
}

fn parse_f32(s: &str) -> OcioResult<f32> {
    s.parse::<f32>()
        .map_err(|_| invalid(format!("bad number '{s}' in LUT file")))
}

/// Parses the text of a `.spi1d` file.
pub fn parse_spi1d(text: &str) -> OcioResult<Lut1dTransform> {
    let mut domain = (0.0f32, 1.0f32);
    let mut length: Option<usize> = None;
    let mut components = 1usize;
    let mut values = Vec::new();
    let mut in_body = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if in_body {
            if line.starts_with('}') {
                in_body = false;
                continue;
            }
            let nums = line
                .split_whitespace()
                .map(parse_f32)
                .collect::<OcioResult<Vec<_>>>()?;
            let entry = match (components, nums.as_slice()) {
                (1, [v]) => [*v; 3],
                (2, [r, g]) => [*r, *g, 0.0],
                (3, [r, g, b]) => [*r, *g, *b],
                _ => return Err(invalid(format!("spi1d row '{line}' has wrong component count"))),
            };
            values.push(entry);
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("Version") => {}
            Some("From") => {
                let lo = parts.next().map(parse_f32).transpose()?;
                let hi = parts.next().map(parse_f32).transpose()?;
                match (lo, hi) {
                    (Some(lo), Some(hi)) => domain = (lo, hi),
                    _ => return Err(invalid("spi1d 'From' needs two values")),
                }
            }
            Some("Length") => {
                length = parts.next().and_then(|v| v.parse().ok());
            }
            Some("Components") => {
                components = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .filter(|c| (1..=3).contains(c))
                    .ok_or_else(|| invalid("spi1d 'Components' must be 1, 2 or 3"))?;
            }
            Some("{") => in_body = true,
            _ => return Err(invalid(format!("unexpected spi1d line '{line}'"))),
        }
    }

    match length {
        Some(n) if n == values.len() && n >= 2 => Ok(Lut1dTransform {
            domain_min: domain.0,
            domain_max: domain.1,
            values,
            direction: TransformDirection::Forward,
        }),
        _ => Err(invalid(format!(
            "spi1d declares {length:?} entries but has {}",
            values.len()
        ))),
    }
}

/// Parses the text of a `.spimtx` file.
///
/// The file holds three rows of four values; the fourth column is an
/// offset expressed in 16-bit code values.
pub fn parse_spimtx(text: &str) -> OcioResult<MatrixTransform> {
    let nums = text
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(|_| invalid(format!("bad number '{s}' in spimtx"))))
        .collect::<OcioResult<Vec<_>>>()?;
    if nums.len() != 12 {
        return Err(invalid(format!("spimtx needs 12 values, found {}", nums.len())));
    }
    let mut t = MatrixTransform::identity();
    for r in 0..3 {
        t.matrix[r * 4..r * 4 + 3].copy_from_slice(&nums[r * 4..r * 4 + 3]);
        t.offset[r] = nums[r * 4 + 3] / 65535.0;
    }
    Ok(t)
}
