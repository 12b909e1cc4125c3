//! This module defines the error types used by the `rackyard-layout` crate.

#![warn(missing_docs)]

use crate::floor::FloorId;

/// Error type for layout operations.
///
/// Any error means nothing was placed. Running out of room is not an error;
/// the planner then returns fewer (or no) racks.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Error for unusable rack or clearance dimensions.
    /// This variant is returned when a size is not positive and finite or a clearance is negative.
    InvalidRack(&'static str),
    /// Error for a ceiling too low to hold a single rack level.
    CeilingTooLow {
        /// Ceiling height requested.
        ceiling_height: f64,
        /// Height of one rack.
        rack_height: f64,
    },
    /// Error for a floor id that is not in the registry.
    FloorNotFound(FloorId),
    /// Error for a floor whose center point was never recorded.
    MissingCenter(FloorId),
    /// Error for a floor outline that cannot form a polygon.
    InvalidFloor(FloorId, &'static str),
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LayoutError::InvalidRack(msg) => write!(f, "Invalid rack configuration: {}", msg),
            LayoutError::CeilingTooLow { ceiling_height, rack_height } => write!(
                f,
                "Ceiling height {:.2} is lower than rack height {:.2}, no rack level fits",
                ceiling_height, rack_height
            ),
            LayoutError::FloorNotFound(id) => write!(f, "Floor {} is not registered", id),
            LayoutError::MissingCenter(id) => write!(f, "Floor {} has no recorded center point", id),
            LayoutError::InvalidFloor(id, msg) => write!(f, "Floor {} has an invalid outline: {}", id, msg),
        }
    }
}

impl core::error::Error for LayoutError {}
