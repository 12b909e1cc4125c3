#![warn(missing_docs)]

//! Error types for the geometry library.

use core::fmt;

/// Errors that can occur when constructing geometric values.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Error for a polygon with no vertices.
    /// A polygon is a closed loop and must contain at least one point.
    EmptyPolygon(&'static str),
    /// Error for a non-finite or negative size.
    /// This variant is returned when a bounding volume would be built from NaN, infinite or negative extents.
    InvalidExtent(&'static str),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::EmptyPolygon(msg) => write!(f, "Empty polygon: {}", msg),
            GeometryError::InvalidExtent(msg) => write!(f, "Invalid extent: {}", msg),
        }
    }
}

impl core::error::Error for GeometryError {}
