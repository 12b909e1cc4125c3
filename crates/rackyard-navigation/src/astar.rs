/*

A* = f(n) = g(n) + h(n)

Where:
    n = a cell of the planning grid
    g(n) = actual cost from the start cell to n
    h(n) = estimated cost from n to the goal (heuristic)
    f(n) = total estimated cost of the cheapest route through n

Moves go to any of the 8 neighbours: 10 for a straight step, 14 for a
diagonal one (10 * sqrt(2), rounded).

The heuristic is |dx| + |dz| * 10. It weighs the axes unevenly but never
exceeds the true 8-directional cost and changes by at most one step cost per
move, so the first time the goal is popped its route is optimal.

*/

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

use rackyard_geometry::{Point, SceneObject};
use tracing::{debug, warn};

use crate::grid::{GridCell, GridConfig};
use crate::obstacle::{Endpoint, ObstacleField};

/// Cost of a move along X or Z.
pub const STRAIGHT_COST: u32 = 10;
/// Cost of a diagonal move.
pub const DIAGONAL_COST: u32 = 14;

/// Represents the result of an A* search with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult<T> {
    /// The route from start to goal; empty when no route exists.
    pub waypoints: Vec<T>,
    /// The total move cost of the route.
    pub total_cost: Option<u32>,
    /// The number of cells expanded during the search.
    pub nodes_explored: usize,
}

impl<T> PathResult<T> {
    /// Creates a new PathResult for a successful search.
    pub fn success(waypoints: Vec<T>, total_cost: u32, nodes_explored: usize) -> Self {
        Self { waypoints, total_cost: Some(total_cost), nodes_explored }
    }

    /// Creates a new PathResult for a failed search.
    pub fn failure(nodes_explored: usize) -> Self {
        Self { waypoints: Vec::new(), total_cost: None, nodes_explored }
    }

    /// Returns true if a route was found.
    pub fn is_success(&self) -> bool {
        self.total_cost.is_some()
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True when there is no route.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Returns the waypoints, empty if no route was found.
    pub fn into_path(self) -> Vec<T> {
        self.waypoints
    }

    /// Maps every waypoint, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PathResult<U> {
        PathResult {
            waypoints: self.waypoints.into_iter().map(f).collect(),
            total_cost: self.total_cost,
            nodes_explored: self.nodes_explored,
        }
    }
}

impl<T> fmt::Display for PathResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total_cost {
            Some(cost) => write!(
                f,
                "PathResult {{ success: true, path_length: {}, total_cost: {}, nodes_explored: {} }}",
                self.waypoints.len(),
                cost,
                self.nodes_explored
            ),
            None => write!(f, "PathResult {{ success: false, nodes_explored: {} }}", self.nodes_explored),
        }
    }
}

/// Per-search bookkeeping for one reached cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathNode {
    g: u32,
    h: u32,
    parent: Option<GridCell>,
}

impl PathNode {
    fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// Heuristic estimate from `a` to `goal`, in step-cost units.
pub fn heuristic(a: GridCell, goal: GridCell) -> u32 {
    let dx = a.col.abs_diff(goal.col) as u32;
    let dz = a.row.abs_diff(goal.row) as u32;
    dx + dz * 10
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct State {
    cost: u32,
    cell: GridCell,
}

// The priority queue depends on `Ord`.
// Flip the ordering on costs so the heap pops the lowest f first. Equal costs
// fall back to position, which is an arbitrary but stable order.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.cell.col.cmp(&other.cell.col))
            .then_with(|| self.cell.row.cmp(&other.cell.row))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reconstructs the route by following parent links back from `goal`.
fn reconstruct_path(nodes: &HashMap<GridCell, PathNode>, goal: GridCell) -> Vec<GridCell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(parent) = nodes.get(&current).and_then(|n| n.parent) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Finds a route between two cells of `grid` avoiding `field`.
///
/// Cells not in `field` are traversable; the search reaches them lazily.
///
/// # Arguments
/// * `grid` - The planning grid
/// * `field` - Blocked cells
/// * `start` - Starting cell
/// * `goal` - Goal cell
///
/// # Returns
/// * `PathResult<GridCell>` - The cell route (empty if unreachable) with metadata
pub fn astar_search(grid: &GridConfig, field: &ObstacleField, start: GridCell, goal: GridCell) -> PathResult<GridCell> {
    let mut nodes_explored = 0;

    if !grid.contains_cell(start) || !grid.contains_cell(goal) || field.is_blocked(start) || field.is_blocked(goal) {
        return PathResult::failure(nodes_explored);
    }

    let mut open_set = BinaryHeap::new();
    let mut closed_set: HashSet<GridCell> = HashSet::new();
    let mut nodes: HashMap<GridCell, PathNode> = HashMap::new();

    let start_node = PathNode { g: 0, h: heuristic(start, goal), parent: None };
    nodes.insert(start, start_node);
    open_set.push(State { cost: start_node.f(), cell: start });

    while let Some(State { cell: current, .. }) = open_set.pop() {
        // Stale heap entries for already expanded cells.
        if !closed_set.insert(current) {
            continue;
        }
        nodes_explored += 1;

        let current_g = nodes[&current].g;
        if current == goal {
            return PathResult::success(reconstruct_path(&nodes, goal), current_g, nodes_explored);
        }

        for (neighbor, diagonal) in grid.neighbours8(current) {
            if closed_set.contains(&neighbor) || field.is_blocked(neighbor) {
                continue;
            }
            let tentative_g = current_g + if diagonal { DIAGONAL_COST } else { STRAIGHT_COST };
            if nodes.get(&neighbor).is_some_and(|n| n.g <= tentative_g) {
                continue;
            }
            let node = PathNode { g: tentative_g, h: heuristic(neighbor, goal), parent: Some(current) };
            nodes.insert(neighbor, node);
            open_set.push(State { cost: node.f(), cell: neighbor });
        }
    }

    PathResult::failure(nodes_explored)
}

/// Routes vehicles around the objects of a scene.
///
/// Every call rebuilds its obstacle field from the snapshot it is given, so
/// a `PathFinder` holds no mutable state and can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFinder {
    grid: GridConfig,
    avoidance: f64,
}

impl PathFinder {
    /// Creates a pathfinder over `grid` keeping `avoidance` world units away
    /// from obstacles.
    pub fn new(grid: GridConfig, avoidance: f64) -> Self {
        Self { grid, avoidance: avoidance.max(0.0) }
    }

    /// The grid searched.
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Clearance kept around obstacles.
    pub fn avoidance(&self) -> f64 {
        self.avoidance
    }

    /// Obstacle field this pathfinder would search for the given endpoints.
    pub fn obstacle_field(&self, objects: &[SceneObject], start: &Endpoint, end: &Endpoint) -> ObstacleField {
        ObstacleField::build(&self.grid, objects, start, end, self.avoidance)
    }

    /// Finds a route from `start` to `end` as world waypoints.
    ///
    /// Returns cell centers at ground height, start first. An empty list
    /// means the goal cannot be reached; callers must check before animating.
    pub fn find_path(&self, objects: &[SceneObject], start: Endpoint, end: Endpoint) -> Vec<Point> {
        self.find_path_detailed(objects, start, end).into_path()
    }

    /// Finds a route from `start` to `end` with search metadata.
    ///
    /// Endpoints outside the grid are clamped onto its border.
    pub fn find_path_detailed(&self, objects: &[SceneObject], start: Endpoint, end: Endpoint) -> PathResult<Point> {
        let start_cell = self.grid.to_cell(start.position);
        let goal_cell = self.grid.to_cell(end.position);
        let field = self.obstacle_field(objects, &start, &end);

        let result = astar_search(&self.grid, &field, start_cell, goal_cell);
        if result.is_success() {
            debug!(
                start = %start_cell,
                goal = %goal_cell,
                waypoints = result.len(),
                cost = result.total_cost,
                explored = result.nodes_explored,
                "Route found"
            );
        } else {
            warn!(
                start = %start_cell,
                goal = %goal_cell,
                explored = result.nodes_explored,
                blocked = field.len(),
                "No route between start and goal"
            );
        }
        result.map(|cell| self.grid.to_world(cell))
    }
}
