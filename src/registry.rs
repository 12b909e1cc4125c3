use parking_lot::RwLock;
use std::sync::Arc;

use rackyard_geometry::{Aabb, BoundingVolume, ObjectId, Point, Polygon, SceneObject, Sphere};
use rackyard_layout::{FloorId, FloorRegistry, LayoutError, RackFootprint};

/// What a registered object stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    Floor(FloorId),
    Rack { floor: FloorId, level: u32 },
    Obstacle,
    Vehicle,
    Marker,
}

impl ObjectKind {
    pub fn is_floor(&self) -> bool {
        matches!(self, ObjectKind::Floor(_))
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: ObjectKind,
    pub bounds: BoundingVolume,
}

/// Every object of the layout, addressed by stable [`ObjectId`] handles.
///
/// Side data lives in tables indexed by the handle: floor records in the
/// [`FloorRegistry`], and per floor the object drawing it and its racks.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: Vec<Option<Entry>>,
    floors: FloorRegistry,
    floor_objects: Vec<Option<ObjectId>>,
    floor_racks: Vec<Vec<ObjectId>>,
}

pub type SharedRegistry = Arc<RwLock<SceneRegistry>>;

pub fn shared(registry: SceneRegistry) -> SharedRegistry {
    Arc::new(RwLock::new(registry))
}

/// Copy of the scene the engine can work on without holding the lock.
pub fn snapshot(registry: &SharedRegistry) -> Vec<SceneObject> {
    registry.read().snapshot()
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: ObjectKind, bounds: BoundingVolume) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(Some(Entry { kind, bounds }));
        id
    }

    fn grow_floor_tables(&mut self) {
        let len = self.floors.capacity_hint();
        if self.floor_objects.len() < len {
            self.floor_objects.resize(len, None);
            self.floor_racks.resize_with(len, Vec::new);
        }
    }

    /// Registers a floor outline and the floor-related object drawing it.
    pub fn add_floor(&mut self, outline: &Polygon) -> (FloorId, ObjectId) {
        let floor = self.floors.insert(outline);
        let object = self.push(ObjectKind::Floor(floor), BoundingVolume::Box(outline.bounds()));
        self.grow_floor_tables();
        self.floor_objects[floor.index()] = Some(object);
        (floor, object)
    }

    /// Registers a solid object. Floors go through [`SceneRegistry::add_floor`].
    pub fn add_object(&mut self, kind: ObjectKind, bounds: BoundingVolume) -> ObjectId {
        self.push(kind, bounds)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Entry> {
        self.objects.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn position(&self, id: ObjectId) -> Option<Point> {
        self.get(id).map(|e| e.bounds.center())
    }

    pub fn floors(&self) -> &FloorRegistry {
        &self.floors
    }

    pub fn floor_object(&self, floor: FloorId) -> Option<ObjectId> {
        self.floor_objects.get(floor.index()).copied().flatten()
    }

    pub fn racks_on(&self, floor: FloorId) -> &[ObjectId] {
        self.floor_racks.get(floor.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    /// Removes an object. Removing a floor's object removes the floor and its racks.
    pub fn remove(&mut self, id: ObjectId) -> Option<Entry> {
        let entry = self.objects.get_mut(id.0 as usize).and_then(Option::take)?;
        match entry.kind {
            ObjectKind::Floor(floor) => {
                self.floors.remove(floor);
                self.floor_objects[floor.index()] = None;
                for rack in std::mem::take(&mut self.floor_racks[floor.index()]) {
                    self.objects[rack.0 as usize] = None;
                }
            }
            ObjectKind::Rack { floor, .. } => {
                if let Some(racks) = self.floor_racks.get_mut(floor.index()) {
                    racks.retain(|r| *r != id);
                }
            }
            _ => {}
        }
        Some(entry)
    }

    /// Moves an object so its horizontal center sits at `position`. Height is kept.
    pub fn move_object(&mut self, id: ObjectId, position: Point) -> bool {
        let Some(entry) = self.objects.get_mut(id.0 as usize).and_then(Option::as_mut) else {
            return false;
        };
        let center = entry.bounds.center();
        let delta = Point::new(position.x - center.x, 0.0, position.z - center.z);
        entry.bounds = match entry.bounds {
            BoundingVolume::Box(b) => BoundingVolume::Box(Aabb::new(b.min + delta, b.max + delta)),
            BoundingVolume::Sphere(s) => BoundingVolume::Sphere(Sphere::new(s.center + delta, s.radius)),
        };
        true
    }

    /// Replaces the racks of `floor` with one object per footprint.
    ///
    /// Returns the new rack ids in footprint order.
    pub fn commit_racks(&mut self, floor: FloorId, footprints: &[RackFootprint]) -> Result<Vec<ObjectId>, LayoutError> {
        self.floors.require(floor)?;
        self.grow_floor_tables();

        for old in std::mem::take(&mut self.floor_racks[floor.index()]) {
            self.objects[old.0 as usize] = None;
        }

        let ids: Vec<ObjectId> = footprints
            .iter()
            .map(|f| {
                let rect = f.rect();
                let bounds = Aabb::new(
                    Point::new(rect.min_x, f.base.y, rect.min_z),
                    Point::new(rect.max_x, f.base.y + f.rack.height, rect.max_z),
                );
                self.push(ObjectKind::Rack { floor, level: f.level }, BoundingVolume::Box(bounds))
            })
            .collect();
        self.floor_racks[floor.index()] = ids.clone();
        Ok(ids)
    }

    /// Engine view of every live object.
    pub fn snapshot(&self) -> Vec<SceneObject> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let e = e.as_ref()?;
                let id = ObjectId(i as u32);
                Some(if e.kind.is_floor() { SceneObject::floor(id, e.bounds) } else { SceneObject::solid(id, e.bounds) })
            })
            .collect()
    }
}
