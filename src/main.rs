mod bus;        // brings `bus.rs` in as `crate::bus`
mod config;     // brings `config.rs` in as `crate::config`
mod planner;    // brings `planner.rs` in as `crate::planner`
mod registry;   // brings `registry.rs` in as `crate::registry`
mod scene;      // brings `scene.rs` in as `crate::scene`
mod simulation; // brings `simulation.rs` in as `crate::simulation`

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{self, EnvFilter};

use rackyard_geometry::{BoundingVolume, ObjectId, Point, Sphere};
use rackyard_layout::FloorId;

use bus::Topic;
use config::Settings;
use planner::SceneChange;
use registry::{ObjectKind, SceneRegistry, SharedRegistry};
use scene::{SceneExecutor, SceneGraph, SceneHandle};
use simulation::{PlaybackOutcome, PlaybackProgress, PlaybackSettings};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Rackyard started.");
    let settings = config::load_settings().context("loading configuration")?;

    let executor = SceneExecutor::spawn(SceneGraph::new())?;
    let scene = executor.handle();
    let registry = registry::shared(SceneRegistry::new());

    let outcome = run(&settings, &registry, &scene).await;

    let graph = executor.shutdown()?;
    info!(nodes = graph.node_count(), changes = graph.applied(), "Scene closed.");
    if let Ok((floor, vehicle)) = &outcome {
        let triangles = graph.mesh(*floor).map(|m| m.triangle_count());
        let parked = graph.node(*vehicle).map(|n| n.position);
        info!(%floor, ?triangles, racks = graph.racks(*floor).len(), ?parked, "Final scene");
    }
    outcome.map(|_| ())
}

async fn run(settings: &Settings, registry: &SharedRegistry, scene: &SceneHandle) -> Result<(FloorId, ObjectId)> {
    let grid = settings.grid_config().context("building the planning grid")?;
    info!(%grid, "Planning grid ready.");

    let (floor, vehicle, target) = build_scene(settings, registry)?;

    let mesh = {
        let guard = registry.read();
        planner::floor_mesh(&guard, floor).with_context(|| format!("meshing {}", floor))?
    };
    let floor_object = registry.read().floor_object(floor).context("floor has no scene object")?;
    info!(%floor, triangles = mesh.triangle_count(), area = mesh.area, "Floor meshed.");
    scene.apply(SceneChange::FloorMeshAttached { object: floor_object, mesh })?;

    let change = planner::auto_layout(
        registry,
        floor,
        &settings.rack_spec(),
        &settings.clearance(),
        settings.racks.ceiling_height,
    )
    .context("planning racks")?;
    let racks = planner::apply_layout(registry, scene, change).await?;
    info!(%floor, racks = racks.len(), "Racks placed.");

    let waypoints = {
        let guard = registry.read();
        planner::route(&guard, grid, settings.navigation.avoidance, vehicle, target)?
    };
    if waypoints.is_empty() {
        warn!(%vehicle, %target, "No route to target, skipping playback.");
        return Ok((floor, vehicle));
    }
    info!(%vehicle, %target, waypoints = waypoints.len(), "Route found.");
    scene.apply(SceneChange::PathDrawn { from: vehicle, to: target, waypoints: waypoints.clone() })?;

    let outcome = play(settings, registry, scene, vehicle, waypoints).await?;
    info!(?outcome, "Playback finished.");

    let drawn = scene.submit_and_wait(|g| g.path().map(<[_]>::len)).await?;
    debug!(?drawn, "Scene path");
    Ok((floor, vehicle))
}

fn build_scene(settings: &Settings, registry: &SharedRegistry) -> Result<(FloorId, ObjectId, ObjectId)> {
    let outline = settings.scene.floor_outline().context("reading the floor outline")?;
    let mut guard = registry.write();
    let (floor, _) = guard.add_floor(&outline);

    for (i, obstacle) in settings.scene.obstacles.iter().enumerate() {
        let bounds = obstacle.bounds().with_context(|| format!("reading obstacle {}", i))?;
        let id = guard.add_object(ObjectKind::Obstacle, bounds);
        debug!(%id, ?bounds, "Added obstacle");
    }

    let vehicle = guard.add_object(
        ObjectKind::Vehicle,
        BoundingVolume::Sphere(Sphere::new(settings.scene.vehicle_position(), 0.5)),
    );
    let target = guard.add_object(
        ObjectKind::Marker,
        BoundingVolume::Sphere(Sphere::new(settings.scene.target_position(), 0.25)),
    );
    info!(%floor, objects = guard.len(), "Scene built.");
    Ok((floor, vehicle, target))
}

async fn play(
    settings: &Settings,
    registry: &SharedRegistry,
    scene: &SceneHandle,
    vehicle: ObjectId,
    waypoints: Vec<Point>,
) -> Result<PlaybackOutcome> {
    let progress: Topic<PlaybackProgress> = Topic::new(settings.simulation.progress_capacity);
    let mut progress_rx = progress.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last_percent = 0u32;
        loop {
            match progress_rx.recv().await {
                Ok(p) => {
                    let percent = if p.length > 0.0 { (p.travelled / p.length * 100.0) as u32 } else { 100 };
                    if percent >= last_percent + 25 || percent == 100 {
                        info!(vehicle = %p.vehicle, position = %p.position, percent, "Playback progress");
                        last_percent = percent;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Progress reporter lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let playback_settings = PlaybackSettings { tick: settings.tick(), speed: settings.simulation.speed };
    let handle = simulation::start_playback(vehicle, waypoints.clone(), playback_settings, scene.clone(), progress)?;

    let started = Instant::now();
    let mut poll = tokio::time::interval(Duration::from_millis(10));
    let mut cancelled = false;
    while !handle.is_finished() {
        poll.tick().await;
        if let Some(limit) = settings.playback_timeout() {
            if !cancelled && started.elapsed() > limit {
                warn!(?limit, "Playback is taking too long, cancelling.");
                handle.cancel();
                cancelled = true;
            }
        }
    }
    let outcome = handle.join()?;
    let _ = reporter.await;

    if outcome == PlaybackOutcome::Completed {
        if let Some(end) = waypoints.last() {
            registry.write().move_object(vehicle, *end);
        }
    }
    Ok(outcome)
}
