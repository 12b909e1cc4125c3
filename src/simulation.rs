//! Vehicle playback along a planned route.
//!
//! A named worker thread advances the vehicle at a fixed tick, queues each
//! transform on the scene thread and publishes progress. It stops at the end
//! of the route or when cancelled, whichever comes first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use spin_sleep::SpinSleeper;
use tracing::{debug, info, warn};

use rackyard_geometry::{ObjectId, Point};

use crate::bus::Topic;
use crate::planner::SceneChange;
use crate::scene::SceneHandle;

/// Polyline with cumulative horizontal lengths, sampled by distance.
#[derive(Debug, Clone)]
pub struct PathTrack {
    points: Vec<Point>,
    cumulative: Vec<f64>,
}

impl PathTrack {
    pub fn new(points: Vec<Point>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].horizontal_distance(*p);
            }
            cumulative.push(total);
        }
        PathTrack { points, cumulative }
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position and yaw after `distance` along the track, clamped to its ends.
    pub fn sample(&self, distance: f64) -> Option<(Point, f64)> {
        let first = *self.points.first()?;
        if self.points.len() == 1 {
            return Some((first, 0.0));
        }
        let d = distance.clamp(0.0, self.length());
        // First segment whose end reaches `d`.
        let end = self.cumulative.partition_point(|&c| c < d).clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[end - 1], self.points[end]);
        let span = self.cumulative[end] - self.cumulative[end - 1];
        let t = if span > 0.0 { (d - self.cumulative[end - 1]) / span } else { 1.0 };
        Some((a.lerp(b, t), a.heading_to(b)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackSettings {
    pub tick: Duration,
    /// World units per second.
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackProgress {
    pub vehicle: ObjectId,
    pub position: Point,
    pub yaw: f64,
    pub travelled: f64,
    pub length: f64,
}

pub struct PlaybackHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<PlaybackOutcome>,
}

impl PlaybackHandle {
    /// Asks the worker to stop at its next tick.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker. Blocks the calling thread.
    pub fn join(self) -> Result<PlaybackOutcome> {
        self.thread.join().map_err(|_| anyhow!("playback thread panicked"))
    }
}

/// Starts moving `vehicle` along `waypoints`.
pub fn start_playback(
    vehicle: ObjectId,
    waypoints: Vec<Point>,
    settings: PlaybackSettings,
    scene: SceneHandle,
    progress: Topic<PlaybackProgress>,
) -> Result<PlaybackHandle> {
    if !settings.speed.is_finite() || settings.speed <= 0.0 {
        bail!("playback speed must be positive, got {}", settings.speed);
    }
    if settings.tick.is_zero() {
        bail!("playback tick must be non-zero");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let track = PathTrack::new(waypoints);
    let step = settings.speed * settings.tick.as_secs_f64();

    info!(%vehicle, length = track.length(), tick = ?settings.tick, "Spawning playback thread...");
    let thread = std::thread::Builder::new()
        .name("playback".into())
        .spawn({
            let stop = Arc::clone(&stop);
            move || {
                let sleeper = SpinSleeper::new(100_000);
                let length = track.length();
                let mut travelled = 0.0;
                loop {
                    if stop.load(Ordering::Relaxed) {
                        info!(%vehicle, travelled, length, "Playback cancelled.");
                        return PlaybackOutcome::Cancelled;
                    }
                    let Some((position, yaw)) = track.sample(travelled) else {
                        return PlaybackOutcome::Completed;
                    };
                    if scene.apply(SceneChange::VehicleMoved { vehicle, position, yaw }).is_err() {
                        warn!(%vehicle, "Scene executor closed, stopping playback");
                        return PlaybackOutcome::Cancelled;
                    }
                    if progress.has_subscribers() {
                        progress.publish(PlaybackProgress { vehicle, position, yaw, travelled, length });
                    }
                    debug!(%vehicle, %position, yaw, travelled, "Playback tick");

                    if travelled >= length {
                        info!(%vehicle, length, "Playback completed.");
                        return PlaybackOutcome::Completed;
                    }
                    travelled = (travelled + step).min(length);
                    sleeper.sleep(settings.tick);
                }
            }
        })?;

    Ok(PlaybackHandle { stop, thread })
}
