#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` geometry library for warehouse layout."]
#![doc = ""]
#![doc = "This crate provides points, polygons, horizontal bounding volumes, scene"]
#![doc = "object snapshots and ear-clipping triangulation of floor outlines."]
#![doc = ""]
#![doc = "All coordinates are right-handed with Y up; the horizontal plane is XZ."]

extern crate alloc;

use core::fmt;
use core::ops::{Add, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod bounds;
pub mod error;
pub mod polygon;
pub mod scene;
pub mod triangulate;

pub use bounds::{Aabb, BoundingVolume, Rect, Sphere};
pub use error::GeometryError;
pub use polygon::Polygon;
pub use scene::{ObjectId, SceneObject};
pub use triangulate::{triangulate, triangulated_area};

/// A 3‑D world position `(x, y, z)` in scene units, Y pointing up.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// World‑frame x position.
    pub x: f64,
    /// World‑frame y position (height).
    pub y: f64,
    /// World‑frame z position.
    pub z: f64,
}

impl Point {
    /// Construct a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point { x, y, z }
    }

    /// A point on the horizontal plane at height `y = 0`.
    pub const fn flat(x: f64, z: f64) -> Self {
        Point { x, y: 0.0, z }
    }

    /// Up-axis (Y) component of the cross product `self x other`.
    ///
    /// Positive when `other` lies counter-clockwise of `self` seen from
    /// above, which is the turn direction of an up-facing triangle's edges.
    pub fn cross_y(self, other: Point) -> f64 {
        self.z * other.x - self.x * other.z
    }

    /// Distance to `other` measured on the horizontal plane only.
    pub fn horizontal_distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        libm::sqrt(dx * dx + dz * dz)
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    pub fn lerp(self, other: Point, t: f64) -> Point {
        self + (other - self) * t
    }

    /// Heading from `self` towards `other` as a rotation about +Y, in radians.
    ///
    /// Zero faces +Z; returns zero when the points coincide horizontally.
    pub fn heading_to(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        if dx == 0.0 && dz == 0.0 {
            return 0.0;
        }
        libm::atan2(dx, dz)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(1.0, 2.0, 3.0);
        let b = Point::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Point::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Point::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_cross_y_sign() {
        // +X then +Z: turning from +X towards +Z is clockwise seen from above.
        let x = Point::flat(1.0, 0.0);
        let z = Point::flat(0.0, 1.0);
        assert!(x.cross_y(z) < 0.0);
        assert!(z.cross_y(x) > 0.0);
        assert_eq!(x.cross_y(x), 0.0);
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 50.0, 4.0);
        assert!((a.horizontal_distance(b) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_lerp_and_heading() {
        let a = Point::flat(0.0, 0.0);
        let b = Point::flat(10.0, 0.0);
        assert_eq!(a.lerp(b, 0.25), Point::flat(2.5, 0.0));
        assert!((a.heading_to(b) - core::f64::consts::FRAC_PI_2).abs() < EPSILON);
        assert_eq!(a.heading_to(Point::flat(0.0, 5.0)), 0.0);
        assert_eq!(a.heading_to(a), 0.0);
    }

    #[test]
    fn test_display() {
        let p = Point::new(1.0, 2.5, -3.0);
        assert_eq!(format!("{}", p), "(1.00, 2.50, -3.00)");
    }
}
