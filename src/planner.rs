//! Layout operations on the application registry.
//!
//! Each operation takes a snapshot, runs the engine and describes the result
//! as a [`SceneChange`] for the scene thread.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use rackyard_geometry::{ObjectId, Point, triangulate, triangulated_area};
use rackyard_layout::{Clearance, FloorId, LayoutError, RackFootprint, RackSpec, plan_racks};
use rackyard_navigation::{Endpoint, GridConfig, PathFinder};

use crate::registry::{SceneRegistry, SharedRegistry};
use crate::scene::SceneHandle;

/// Triangulated floor surface. Vertices are relative to the floor center.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorMesh {
    pub floor: FloorId,
    pub center: Point,
    pub vertices: Vec<Point>,
    pub indices: Vec<u32>,
    pub area: f64,
}

impl FloorMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Racks planned for a floor, not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutChange {
    pub floor: FloorId,
    pub footprints: Vec<RackFootprint>,
    pub levels: u32,
    pub rotated: bool,
}

/// A mutation for the scene thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneChange {
    FloorMeshAttached { object: ObjectId, mesh: FloorMesh },
    RacksPlaced { floor: FloorId, racks: Vec<(ObjectId, RackFootprint)> },
    PathDrawn { from: ObjectId, to: ObjectId, waypoints: Vec<Point> },
    VehicleMoved { vehicle: ObjectId, position: Point, yaw: f64 },
}

/// Triangulates a registered floor.
pub fn floor_mesh(registry: &SceneRegistry, floor: FloorId) -> Result<FloorMesh, LayoutError> {
    let record = registry.floors().require(floor)?;
    let center = record.center.ok_or(LayoutError::MissingCenter(floor))?;
    let indices = triangulate(&record.vertices);
    let area = triangulated_area(&record.vertices, &indices);
    if indices.len() < 3 * record.vertices.len().saturating_sub(2) {
        warn!(%floor, vertices = record.vertices.len(), triangles = indices.len() / 3, "Floor mesh is incomplete");
    }
    Ok(FloorMesh { floor, center, vertices: record.vertices.clone(), indices, area })
}

/// Plans racks on `floor` against the current scene.
///
/// The registry lock is only held to take the snapshot.
pub fn auto_layout(
    registry: &SharedRegistry,
    floor: FloorId,
    rack: &RackSpec,
    clearance: &Clearance,
    ceiling_height: f64,
) -> Result<LayoutChange, LayoutError> {
    let (outline, objects) = {
        let guard = registry.read();
        let outline = guard.floors().absolute_polygon(floor)?;
        // Racks about to be replaced are not obstacles for their successors.
        let replaced = guard.racks_on(floor);
        let objects: Vec<_> = guard.snapshot().into_iter().filter(|o| !replaced.contains(&o.id)).collect();
        (outline, objects)
    };

    let plan = plan_racks(&outline, rack, ceiling_height, clearance, &objects)?;
    info!(
        %floor,
        racks = plan.len(),
        slots = plan.slots_accepted,
        levels = plan.levels,
        rotated = plan.rotated,
        "Planned automatic layout"
    );
    Ok(LayoutChange { floor, levels: plan.levels, rotated: plan.rotated, footprints: plan.footprints })
}

/// Commits a planned layout as one batch and waits until the scene shows it.
pub async fn apply_layout(registry: &SharedRegistry, scene: &SceneHandle, change: LayoutChange) -> Result<Vec<ObjectId>> {
    let ids = registry
        .write()
        .commit_racks(change.floor, &change.footprints)
        .with_context(|| format!("committing racks on {}", change.floor))?;

    let racks: Vec<(ObjectId, RackFootprint)> = ids.iter().copied().zip(change.footprints).collect();
    let floor = change.floor;
    let shown = scene
        .submit_and_wait(move |graph| {
            graph.apply(SceneChange::RacksPlaced { floor, racks });
            graph.racks(floor).len()
        })
        .await
        .context("placing racks in the scene")?;
    debug!(%floor, committed = ids.len(), shown, "Applied rack layout");
    Ok(ids)
}

/// Routes between two registered objects.
///
/// Returns an empty list when no route exists.
pub fn route(registry: &SceneRegistry, grid: GridConfig, avoidance: f64, from: ObjectId, to: ObjectId) -> Result<Vec<Point>> {
    let start = registry.position(from).ok_or_else(|| anyhow!("route start {} is not registered", from))?;
    let end = registry.position(to).ok_or_else(|| anyhow!("route end {} is not registered", to))?;
    let objects = registry.snapshot();

    let finder = PathFinder::new(grid, avoidance);
    Ok(finder.find_path(&objects, Endpoint::object(from, start), Endpoint::object(to, end)))
}
