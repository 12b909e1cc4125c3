//! Bounding volumes and the horizontal rectangle tests built on them.
//!
//! Scene objects report either an axis-aligned box or a sphere. Planning
//! happens on the horizontal (XZ) plane, so most tests project volumes down
//! to a [`Rect`] or a circle first.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::GeometryError;

/// Axis-aligned box in world space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
}

impl Aabb {
    /// Builds a box spanning two arbitrary corners.
    pub fn new(a: Point, b: Point) -> Self {
        Aabb {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Builds a box from its center and full size.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidExtent`] if any size component is
    /// negative or not finite.
    pub fn try_from_center(center: Point, size: Point) -> Result<Self, GeometryError> {
        for v in [size.x, size.y, size.z] {
            if !v.is_finite() || v < 0.0 {
                return Err(GeometryError::InvalidExtent("Box size must be finite and non-negative"));
            }
        }
        let half = size * 0.5;
        Ok(Aabb { min: center - half, max: center + half })
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Aabb { min: *first, max: *first };
        for p in rest {
            b.min = Point::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z));
            b.max = Point::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z));
        }
        Some(b)
    }

    /// Center of the box.
    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }

    /// Projection of the box onto the horizontal plane.
    pub fn footprint(&self) -> Rect {
        Rect::new(self.min.x, self.min.z, self.max.x, self.max.z)
    }
}

/// Bounding sphere in world space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Sphere center.
    pub center: Point,
    /// Sphere radius.
    pub radius: f64,
}

impl Sphere {
    /// Construct a sphere. Negative radii are treated as zero.
    pub fn new(center: Point, radius: f64) -> Self {
        Sphere { center, radius: radius.max(0.0) }
    }

    /// Box enclosing the sphere.
    pub fn to_aabb(&self) -> Aabb {
        let r = Point::new(self.radius, self.radius, self.radius);
        Aabb { min: self.center - r, max: self.center + r }
    }
}

/// World bounding volume of a scene object.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Axis-aligned box.
    Box(Aabb),
    /// Sphere.
    Sphere(Sphere),
}

impl BoundingVolume {
    /// The volume's axis-aligned bounding box.
    pub fn to_aabb(&self) -> Aabb {
        match self {
            BoundingVolume::Box(b) => *b,
            BoundingVolume::Sphere(s) => s.to_aabb(),
        }
    }

    /// Center of the volume.
    pub fn center(&self) -> Point {
        match self {
            BoundingVolume::Box(b) => b.center(),
            BoundingVolume::Sphere(s) => s.center,
        }
    }

    /// True if the volume's horizontal projection overlaps `rect`.
    ///
    /// Boxes use a box/box test, spheres a circle/box test. Touching edges do
    /// not count as overlap.
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        match self {
            BoundingVolume::Box(b) => b.footprint().overlaps(rect),
            BoundingVolume::Sphere(s) => rect.intersects_circle(s.center.x, s.center.z, s.radius),
        }
    }
}

/// Axis-aligned rectangle on the horizontal (XZ) plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum z.
    pub min_z: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum z.
    pub max_z: f64,
}

impl Rect {
    /// Construct a rectangle from its bounds.
    pub const fn new(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Self {
        Rect { min_x, min_z, max_x, max_z }
    }

    /// Rectangle of the given full extents around a center point.
    pub fn centered(center: Point, size_x: f64, size_z: f64) -> Self {
        let hx = size_x * 0.5;
        let hz = size_z * 0.5;
        Rect::new(center.x - hx, center.z - hz, center.x + hx, center.z + hz)
    }

    /// Grows the rectangle outward by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(self.min_x - margin, self.min_z - margin, self.max_x + margin, self.max_z + margin)
    }

    /// Extent along X.
    pub fn size_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along Z.
    pub fn size_z(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Center on the horizontal plane, at `y = 0`.
    pub fn center(&self) -> Point {
        Point::flat((self.min_x + self.max_x) * 0.5, (self.min_z + self.max_z) * 0.5)
    }

    /// The four corners, counter-clockwise seen from above.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::flat(self.min_x, self.min_z),
            Point::flat(self.min_x, self.max_z),
            Point::flat(self.max_x, self.max_z),
            Point::flat(self.max_x, self.min_z),
        ]
    }

    /// True if the interiors overlap. Shared edges or corners are not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_z < other.max_z
            && other.min_z < self.max_z
    }

    /// True if the circle at `(cx, cz)` reaches strictly inside the rectangle.
    pub fn intersects_circle(&self, cx: f64, cz: f64, radius: f64) -> bool {
        let nx = cx.max(self.min_x).min(self.max_x);
        let nz = cz.max(self.min_z).min(self.max_z);
        let dx = cx - nx;
        let dz = cz - nz;
        let inside = dx == 0.0 && dz == 0.0;
        inside || dx * dx + dz * dz < radius * radius
    }

    /// True if `other` lies completely within `self` (edges included).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_z >= self.min_z
            && other.max_z <= self.max_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_normalizes_corners() {
        let b = Aabb::new(Point::new(5.0, 1.0, -2.0), Point::new(-1.0, 0.0, 3.0));
        assert_eq!(b.min, Point::new(-1.0, 0.0, -2.0));
        assert_eq!(b.max, Point::new(5.0, 1.0, 3.0));
        assert_eq!(b.center(), Point::new(2.0, 0.5, 0.5));
    }

    #[test]
    fn test_aabb_from_center_rejects_bad_size() {
        assert!(matches!(
            Aabb::try_from_center(Point::default(), Point::new(-1.0, 1.0, 1.0)),
            Err(GeometryError::InvalidExtent(_))
        ));
        assert!(matches!(
            Aabb::try_from_center(Point::default(), Point::new(f64::NAN, 1.0, 1.0)),
            Err(GeometryError::InvalidExtent(_))
        ));
        let b = Aabb::try_from_center(Point::new(1.0, 1.0, 1.0), Point::new(2.0, 2.0, 4.0)).unwrap();
        assert_eq!(b.footprint(), Rect::new(0.0, -1.0, 2.0, 3.0));
    }

    #[test]
    fn test_enclosing() {
        assert!(Aabb::enclosing(&[]).is_none());
        let b = Aabb::enclosing(&[Point::flat(1.0, 4.0), Point::flat(-2.0, 0.5), Point::new(0.0, 7.0, 2.0)]).unwrap();
        assert_eq!(b.min, Point::new(-2.0, 0.0, 0.5));
        assert_eq!(b.max, Point::new(1.0, 7.0, 4.0));
    }

    #[test]
    fn test_rect_overlap_excludes_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 20.0, 10.0);
        let overlapping = Rect::new(9.9, 5.0, 20.0, 6.0);
        let apart = Rect::new(11.0, 11.0, 12.0, 12.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
        assert!(overlapping.overlaps(&a));
        assert!(!a.overlaps(&apart));
        assert!(a.inflate(0.5).overlaps(&touching));
    }

    #[test]
    fn test_rect_circle() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.intersects_circle(5.0, 5.0, 0.1));
        assert!(r.intersects_circle(12.0, 5.0, 2.5));
        assert!(!r.intersects_circle(12.0, 5.0, 2.0));
        // Corner distance is sqrt(2) ~ 1.414.
        assert!(!r.intersects_circle(11.0, 11.0, 1.4));
        assert!(r.intersects_circle(11.0, 11.0, 1.5));
    }

    #[test]
    fn test_bounding_volume_overlap_dispatch() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let sphere = BoundingVolume::Sphere(Sphere::new(Point::new(6.0, 100.0, 2.0), 2.5));
        let far_box = BoundingVolume::Box(Aabb::new(Point::flat(5.0, 5.0), Point::flat(6.0, 6.0)));
        assert!(sphere.overlaps_rect(&rect));
        assert!(!far_box.overlaps_rect(&rect));
        assert_eq!(sphere.to_aabb().footprint(), Rect::new(3.5, -0.5, 8.5, 4.5));
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::centered(Point::flat(2.0, 3.0), 4.0, 2.0);
        assert_eq!(r, Rect::new(0.0, 2.0, 4.0, 4.0));
        assert_eq!(r.size_x(), 4.0);
        assert_eq!(r.size_z(), 2.0);
        assert_eq!(r.center(), Point::flat(2.0, 3.0));
        assert!(r.inflate(1.0).contains_rect(&r));
        assert!(!r.contains_rect(&r.inflate(0.1)));
    }
}
