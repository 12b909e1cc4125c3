//! Closed vertex loops on the horizontal plane.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::bounds::{Aabb, Rect};
use crate::error::GeometryError;

/// An ordered, closed loop of vertices. The last vertex connects back to the
/// first.
///
/// Winding is never assumed; [`Polygon::signed_area`] tells which way the loop
/// turns when seen from above.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Point>", into = "Vec<Point>"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = GeometryError;

    fn try_from(vertices: Vec<Point>) -> Result<Self, Self::Error> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

impl Polygon {
    /// Creates a polygon from its vertex loop.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyPolygon`] if `vertices` is empty.
    pub fn new(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        if vertices.is_empty() {
            return Err(GeometryError::EmptyPolygon("Polygon needs at least one vertex"));
        }
        Ok(Polygon { vertices })
    }

    /// Builds a flat polygon at height `y` from `(x, z)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyPolygon`] if `xz` is empty.
    pub fn from_xz(xz: &[(f64, f64)], y: f64) -> Result<Self, GeometryError> {
        Polygon::new(xz.iter().map(|&(x, z)| Point::new(x, y, z)).collect())
    }

    /// The vertex loop.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; a polygon holds at least one vertex.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consumes the polygon, returning its vertices.
    pub fn into_vertices(self) -> Vec<Point> {
        self.vertices
    }

    /// Signed shoelace area on the XZ plane.
    ///
    /// Positive when the loop runs counter-clockwise seen from above (+Y
    /// towards the viewer), negative when clockwise.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    /// Unsigned area on the XZ plane.
    pub fn area(&self) -> f64 {
        libm::fabs(self.signed_area())
    }

    /// True if the loop runs counter-clockwise seen from above.
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> Aabb {
        let first = self.vertices[0];
        self.vertices.iter().skip(1).fold(Aabb { min: first, max: first }, |b, p| {
            Aabb::new(
                Point::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
                Point::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
            )
        })
    }

    /// Horizontal bounding rectangle.
    pub fn footprint(&self) -> Rect {
        self.bounds().footprint()
    }

    /// Average of the vertices.
    pub fn centroid(&self) -> Point {
        let sum = self.vertices.iter().fold(Point::default(), |acc, p| acc + *p);
        sum * (1.0 / self.vertices.len() as f64)
    }

    /// Copy of the polygon shifted by `offset`.
    pub fn translated(&self, offset: Point) -> Polygon {
        Polygon { vertices: self.vertices.iter().map(|p| *p + offset).collect() }
    }

    /// Copy of the polygon with its vertex order reversed.
    pub fn reversed(&self) -> Polygon {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Polygon { vertices }
    }

    /// Crossing-number (ray casting) containment test on the XZ plane.
    ///
    /// Casts a ray towards +X and counts edge crossings. Points exactly on an
    /// edge may land on either side.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.z > p.z) != (vj.z > p.z) {
                let x_cross = (vj.x - vi.x) * (p.z - vi.z) / (vj.z - vi.z) + vi.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// True if every corner and the center of `rect` lie inside the polygon.
    ///
    /// Corners are pulled in by `1e-9` so a rectangle flush with an edge of
    /// an axis-aligned floor still counts as inside.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        const SHRINK: f64 = 1e-9;
        let y = self.vertices[0].y;
        let shrunk = rect.inflate(-SHRINK);
        self.contains(Point::new(rect.center().x, y, rect.center().z))
            && shrunk.corners().iter().all(|c| self.contains(Point::new(c.x, y, c.z)))
    }
}

/// Signed shoelace area of a vertex loop on the XZ plane.
///
/// Positive for loops running counter-clockwise seen from above.
pub fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.z * b.x - a.x * b.z;
    }
    sum * 0.5
}
