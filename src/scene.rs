//! The scene thread.
//!
//! The [`SceneGraph`] is owned by one named thread; everybody else changes it
//! by queueing closures. Tasks run one at a time in submission order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use rackyard_geometry::{ObjectId, Point};
use rackyard_layout::FloorId;

use crate::planner::{FloorMesh, SceneChange};

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The scene thread has shut down.
    ExecutorClosed,
    /// The task was accepted but panicked before producing a value.
    TaskFailed,
    /// The scene thread panicked outside a task.
    ThreadPanicked,
    /// The scene thread could not be started.
    Spawn(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::ExecutorClosed => write!(f, "Scene executor is closed"),
            SceneError::TaskFailed => write!(f, "Scene task failed before returning a value"),
            SceneError::ThreadPanicked => write!(f, "Scene thread panicked"),
            SceneError::Spawn(msg) => write!(f, "Failed to start scene thread: {}", msg),
        }
    }
}

impl std::error::Error for SceneError {}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Rack { floor: FloorId, level: u32 },
    Vehicle,
}

/// A placed node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub position: Point,
    pub yaw: f64,
}

/// Render-side state. Only the scene thread touches it.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<ObjectId, SceneNode>,
    meshes: HashMap<FloorId, (ObjectId, FloorMesh)>,
    racks: HashMap<FloorId, Vec<ObjectId>>,
    path: Option<(ObjectId, ObjectId, Vec<Point>)>,
    applied: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, change: SceneChange) {
        self.applied += 1;
        match change {
            SceneChange::FloorMeshAttached { object, mesh } => {
                debug!(floor = %mesh.floor, %object, triangles = mesh.triangle_count(), "Attached floor mesh");
                self.meshes.insert(mesh.floor, (object, mesh));
            }
            SceneChange::RacksPlaced { floor, racks } => {
                for old in self.racks.remove(&floor).unwrap_or_default() {
                    self.nodes.remove(&old);
                }
                let ids = racks.iter().map(|(id, _)| *id).collect();
                for (id, footprint) in racks {
                    let node = SceneNode {
                        kind: NodeKind::Rack { floor, level: footprint.level },
                        position: footprint.center(),
                        yaw: footprint.yaw(),
                    };
                    self.nodes.insert(id, node);
                }
                self.racks.insert(floor, ids);
            }
            SceneChange::PathDrawn { from, to, waypoints } => {
                self.path = Some((from, to, waypoints));
            }
            SceneChange::VehicleMoved { vehicle, position, yaw } => {
                let node = self.nodes.entry(vehicle).or_insert(SceneNode { kind: NodeKind::Vehicle, position, yaw });
                node.position = position;
                node.yaw = yaw;
            }
        }
    }

    pub fn node(&self, id: ObjectId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn mesh(&self, floor: FloorId) -> Option<&FloorMesh> {
        self.meshes.get(&floor).map(|(_, mesh)| mesh)
    }

    pub fn racks(&self, floor: FloorId) -> &[ObjectId] {
        self.racks.get(&floor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn path(&self) -> Option<&[Point]> {
        self.path.as_ref().map(|(_, _, p)| p.as_slice())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of changes applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

type Task = Box<dyn FnOnce(&mut SceneGraph) + Send + 'static>;

enum Command {
    Run(Task),
    Shutdown,
}

/// Cloneable sender side of the scene queue.
#[derive(Clone)]
pub struct SceneHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SceneHandle {
    /// Queues a task and returns immediately.
    pub fn submit<F>(&self, task: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut SceneGraph) + Send + 'static,
    {
        self.tx.send(Command::Run(Box::new(task))).map_err(|_| SceneError::ExecutorClosed)
    }

    /// Queues a task and waits for its return value.
    pub async fn submit_and_wait<F, R>(&self, task: F) -> Result<R, SceneError>
    where
        F: FnOnce(&mut SceneGraph) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(move |graph| {
            let _ = reply_tx.send(task(graph));
        })?;
        reply_rx.await.map_err(|_| SceneError::TaskFailed)
    }

    /// Queues a scene change.
    pub fn apply(&self, change: SceneChange) -> Result<(), SceneError> {
        self.submit(move |graph| graph.apply(change))
    }
}

/// Owns the scene thread.
pub struct SceneExecutor {
    handle: SceneHandle,
    thread: Option<JoinHandle<SceneGraph>>,
}

impl SceneExecutor {
    pub fn spawn(graph: SceneGraph) -> Result<Self, SceneError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();

        info!("Spawning scene thread...");
        let thread = std::thread::Builder::new()
            .name("scene".into())
            .spawn(move || {
                info!("Scene thread started.");
                let mut graph = graph;
                let mut executed = 0u64;
                while let Some(command) = rx.blocking_recv() {
                    match command {
                        Command::Run(task) => {
                            executed += 1;
                            if panic::catch_unwind(AssertUnwindSafe(|| task(&mut graph))).is_err() {
                                error!(task = executed, "Scene task panicked, continuing with the next one");
                            }
                        }
                        Command::Shutdown => break,
                    }
                }
                info!(executed, "Scene thread stopped.");
                graph
            })
            .map_err(|e| SceneError::Spawn(e.to_string()))?;

        Ok(SceneExecutor { handle: SceneHandle { tx }, thread: Some(thread) })
    }

    pub fn handle(&self) -> SceneHandle {
        self.handle.clone()
    }

    /// Runs every task queued so far, stops the thread and returns the graph.
    /// Later submissions fail with [`SceneError::ExecutorClosed`].
    pub fn shutdown(mut self) -> Result<SceneGraph, SceneError> {
        let _ = self.handle.tx.send(Command::Shutdown);
        let thread = self.thread.take().ok_or(SceneError::ExecutorClosed)?;
        thread.join().map_err(|_| SceneError::ThreadPanicked)
    }
}

impl Drop for SceneExecutor {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.tx.send(Command::Shutdown);
            let _ = thread.join();
        }
    }
}
