//! Floor records kept in an arena with stable integer handles.

use std::fmt;

use rackyard_geometry::{GeometryError, Point, Polygon};

use crate::error::LayoutError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable handle of a floor. Handles are never reused after removal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloorId(pub u32);

impl FloorId {
    /// Position of the floor in the arena tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FloorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "floor-{}", self.0)
    }
}

/// A drawn floor: its vertex loop relative to the center, area and center.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FloorRecord {
    /// Registry handle.
    pub id: FloorId,
    /// Vertex loop, relative to `center`.
    pub vertices: Vec<Point>,
    /// Horizontal area of the loop.
    pub area: f64,
    /// World position the vertices are relative to. Imported projects may
    /// lack one.
    pub center: Option<Point>,
}

impl FloorRecord {
    /// The vertex loop in world coordinates.
    ///
    /// # Errors
    ///
    /// [`LayoutError::MissingCenter`] when no center was recorded,
    /// [`LayoutError::InvalidFloor`] when the vertex loop is empty.
    pub fn absolute_polygon(&self) -> Result<Polygon, LayoutError> {
        let center = self.center.ok_or(LayoutError::MissingCenter(self.id))?;
        let vertices = self.vertices.iter().map(|v| *v + center).collect();
        Polygon::new(vertices).map_err(|err| match err {
            GeometryError::EmptyPolygon(msg) | GeometryError::InvalidExtent(msg) => {
                LayoutError::InvalidFloor(self.id, msg)
            }
        })
    }
}

/// Arena of floors indexed by [`FloorId`].
#[derive(Debug, Default, Clone)]
pub struct FloorRegistry {
    records: Vec<Option<FloorRecord>>,
}

impl FloorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a floor drawn in world coordinates.
    ///
    /// The vertex centroid becomes the floor's center and the stored loop is
    /// made relative to it.
    pub fn insert(&mut self, outline: &Polygon) -> FloorId {
        let center = outline.centroid();
        let vertices = outline.vertices().iter().map(|v| *v - center).collect();
        self.push(vertices, outline.area(), Some(center))
    }

    /// Registers a floor from stored data, possibly without a center.
    pub fn insert_relative(&mut self, vertices: Vec<Point>, center: Option<Point>) -> FloorId {
        let area = Polygon::new(vertices.clone()).map(|p| p.area()).unwrap_or(0.0);
        self.push(vertices, area, center)
    }

    fn push(&mut self, vertices: Vec<Point>, area: f64, center: Option<Point>) -> FloorId {
        let id = FloorId(self.records.len() as u32);
        self.records.push(Some(FloorRecord { id, vertices, area, center }));
        id
    }

    /// Removes a floor, returning its record. The handle stays retired.
    pub fn remove(&mut self, id: FloorId) -> Option<FloorRecord> {
        self.records.get_mut(id.index()).and_then(Option::take)
    }

    /// Looks up a floor.
    pub fn get(&self, id: FloorId) -> Option<&FloorRecord> {
        self.records.get(id.index()).and_then(Option::as_ref)
    }

    /// Looks up a floor, failing with [`LayoutError::FloorNotFound`].
    pub fn require(&self, id: FloorId) -> Result<&FloorRecord, LayoutError> {
        self.get(id).ok_or(LayoutError::FloorNotFound(id))
    }

    /// The floor's outline in world coordinates.
    pub fn absolute_polygon(&self, id: FloorId) -> Result<Polygon, LayoutError> {
        self.require(id)?.absolute_polygon()
    }

    /// Iterates live floors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FloorRecord> {
        self.records.iter().flatten()
    }

    /// Number of live floors.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if no floor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the arena, including retired slots. Index-keyed side tables
    /// should be at least this long.
    pub fn capacity_hint(&self) -> usize {
        self.records.len()
    }
}
