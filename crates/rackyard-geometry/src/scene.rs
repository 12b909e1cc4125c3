//! Snapshot types describing the objects currently in the scene.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::{BoundingVolume, Rect};

/// Stable integer handle of an object in the scene registry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One scene object as seen by the planners: its identity, world bounding
/// volume and whether it belongs to a floor.
///
/// Floor-related objects are never obstacles, neither for the pathfinder nor
/// for rack placement.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    /// Registry handle.
    pub id: ObjectId,
    /// World-space bounding volume.
    pub bounds: BoundingVolume,
    /// True for floor polygons and floor segments.
    pub floor_related: bool,
}

impl SceneObject {
    /// An obstacle-capable object.
    pub const fn solid(id: ObjectId, bounds: BoundingVolume) -> Self {
        SceneObject { id, bounds, floor_related: false }
    }

    /// A floor polygon or floor segment.
    pub const fn floor(id: ObjectId, bounds: BoundingVolume) -> Self {
        SceneObject { id, bounds, floor_related: true }
    }

    /// Horizontal footprint of the object's bounding box.
    pub fn footprint(&self) -> Rect {
        self.bounds.to_aabb().footprint()
    }
}

/// Iterates the objects that can block movement or placement.
pub fn obstacles(objects: &[SceneObject]) -> impl Iterator<Item = &SceneObject> {
    objects.iter().filter(|o| !o.floor_related)
}
