//! Ear-clipping triangulation of floor outlines.
//!
//! An "ear" of a polygon is a triangle formed by three consecutive vertices
//! `(u, v, w)` such that:
//! 1. the corner at `v` is convex, and
//! 2. no other remaining vertex lies inside the triangle.
//!
//! The loop repeatedly cuts an ear, drops its tip `v` and continues until two
//! vertices remain. A simple polygon with `n` vertices yields `n - 2`
//! triangles. Self-intersecting input can run out of ears; the scan gives up
//! after `2 * remaining` consecutive misses and returns what it has.
//!
//! Time complexity is O(n^3) worst case, O(n^2) typical.

use alloc::vec::Vec;
use tracing::{debug, warn};

use crate::Point;
use crate::polygon::signed_area;

/// Cross products at or below this value are treated as collinear.
const EPSILON: f64 = 1e-10;

/// Triangulates a closed vertex loop into an index list.
///
/// Returns three indices per triangle into `vertices`. Every triangle is wound
/// so that its normal faces +Y (counter-clockwise seen from above), whatever
/// the winding of the input loop.
///
/// Fewer than three vertices produce an empty list.
pub fn triangulate(vertices: &[Point]) -> Vec<u32> {
    let n = vertices.len();
    let mut indices = Vec::new();
    if n < 3 {
        return indices;
    }

    // Walk the loop so that convex corners turn counter-clockwise.
    let mut work: Vec<u32> = if signed_area(vertices) > 0.0 {
        (0..n as u32).collect()
    } else {
        (0..n as u32).rev().collect()
    };
    indices.reserve(3 * (n - 2));

    let mut nv = n;
    let mut budget = 2 * nv;
    let mut v = nv - 1;
    while nv > 2 {
        if budget == 0 {
            warn!(
                vertices = n,
                remaining = nv,
                triangles = indices.len() / 3,
                "Ear clipping stalled, polygon is probably degenerate or self-intersecting"
            );
            break;
        }
        budget -= 1;

        let u = if v >= nv { 0 } else { v };
        v = if u + 1 >= nv { 0 } else { u + 1 };
        let w = if v + 1 >= nv { 0 } else { v + 1 };

        if is_ear(vertices, &work, u, v, w) {
            indices.extend_from_slice(&[work[u], work[v], work[w]]);
            work.remove(v);
            nv -= 1;
            budget = 2 * nv;
        }
    }

    debug!(vertices = n, triangles = indices.len() / 3, "Triangulated polygon");
    indices
}

/// Sum of the horizontal areas of the triangles in `indices`.
///
/// Trailing indices that do not form a whole triangle, and indices out of
/// range, are ignored.
pub fn triangulated_area(vertices: &[Point], indices: &[u32]) -> f64 {
    indices
        .chunks_exact(3)
        .filter_map(|t| {
            let a = vertices.get(t[0] as usize)?;
            let b = vertices.get(t[1] as usize)?;
            let c = vertices.get(t[2] as usize)?;
            Some(libm::fabs((*b - *a).cross_y(*c - *a)) * 0.5)
        })
        .sum()
}

fn is_ear(vertices: &[Point], work: &[u32], u: usize, v: usize, w: usize) -> bool {
    let a = vertices[work[u] as usize];
    let b = vertices[work[v] as usize];
    let c = vertices[work[w] as usize];

    if (b - a).cross_y(c - a) <= EPSILON {
        return false;
    }

    work.iter()
        .enumerate()
        .filter(|&(i, _)| i != u && i != v && i != w)
        .all(|(_, &idx)| !inside_triangle(a, b, c, vertices[idx as usize]))
}

/// Barycentric containment on the XZ plane.
///
/// Edges `ab` and `ac` are inside, edge `bc` is outside.
fn inside_triangle(a: Point, b: Point, c: Point, p: Point) -> bool {
    let (v0x, v0z) = (c.x - a.x, c.z - a.z);
    let (v1x, v1z) = (b.x - a.x, b.z - a.z);
    let (v2x, v2z) = (p.x - a.x, p.z - a.z);

    let dot00 = v0x * v0x + v0z * v0z;
    let dot01 = v0x * v1x + v0z * v1z;
    let dot02 = v0x * v2x + v0z * v2z;
    let dot11 = v1x * v1x + v1z * v1z;
    let dot12 = v1x * v2x + v1z * v2z;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 {
        return false;
    }
    let inv = 1.0 / denom;
    let s = (dot11 * dot02 - dot01 * dot12) * inv;
    let t = (dot00 * dot12 - dot01 * dot02) * inv;

    s >= 0.0 && t >= 0.0 && s + t < 1.0
}
