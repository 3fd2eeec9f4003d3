//! Region-of-interest and bounding-box parsing.
//!
//! Both shapes arrive as comma-separated strings and must decompose into
//! exactly four components. Anything else is a `MalformedGeometry` error.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Result, SubmitError};

/// Default region of interest for the thermal frame, as `y1,y2,x1,x2`.
pub const DEFAULT_ROI: &str = "74,308,192,412";

/// Rectangular sub-area of the thermal frame, in pixel rows/columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub y1: i64,
    pub y2: i64,
    pub x1: i64,
    pub x2: i64,
}

impl Roi {
    pub fn parse(input: &str) -> Result<Self> {
        let [y1, y2, x1, x2] = parse_components::<i64>("roi", input)?;
        Ok(Self { y1, y2, x1, x2 })
    }
}

impl FromStr for Roi {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Axis-aligned box in image coordinates, as `x1,y1,x2,y2`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Parse a box for the given input field name (used in error messages).
    pub fn parse_field(field: &'static str, input: &str) -> Result<Self> {
        let [x1, y1, x2, y2] = parse_components::<f64>(field, input)?;
        if [x1, y1, x2, y2].iter().any(|v| !v.is_finite()) {
            return Err(SubmitError::geometry(
                field,
                input,
                "components must be finite numbers",
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Halves are taken before summing so boxes near `f64::MAX` stay finite.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x1 / 2.0 + self.x2 / 2.0,
            self.y1 / 2.0 + self.y2 / 2.0,
        )
    }

    pub fn diagonal(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    /// Euclidean distance between the centres of two boxes.
    pub fn center_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

impl FromStr for BoundingBox {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_field("bbox", s)
    }
}

fn parse_components<T>(field: &'static str, input: &str) -> Result<[T; 4]>
where
    T: FromStr + Copy + Default,
    T::Err: Display,
{
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(SubmitError::geometry(
            field,
            input,
            format!("expected 4 comma-separated values, got {}", parts.len()),
        ));
    }

    let mut out = [T::default(); 4];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse::<T>()
            .map_err(|e| SubmitError::geometry(field, input, format!("{part:?}: {e}")))?;
    }
    Ok(out)
}
