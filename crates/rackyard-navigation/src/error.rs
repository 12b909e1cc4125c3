//! This module defines the error types used by the `rackyard-navigation` crate.

#![warn(missing_docs)]

/// Error type for navigation operations.
///
/// This enum encapsulates the errors raised while setting up the planning
/// grid. Searching itself never fails; an unreachable goal is an empty path.
#[derive(Debug, PartialEq)]
pub enum NavigationError {
    /// Error for invalid grid spacing.
    /// This variant is returned when a spacing is provided that is not positive and finite.
    InvalidSpacing(&'static str),
    /// Error for invalid grid dimensions.
    /// This variant is returned when the grid length or width is zero or too large.
    InvalidDimensions(&'static str),
}

impl core::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NavigationError::InvalidSpacing(msg) => write!(f, "Invalid grid spacing: {}", msg),
            NavigationError::InvalidDimensions(msg) => write!(f, "Invalid grid dimensions: {}", msg),
        }
    }
}

impl core::error::Error for NavigationError {}
