//! Blocked-cell sets built from a snapshot of the scene.

use std::collections::HashSet;

use rackyard_geometry::{ObjectId, Point, SceneObject};
use tracing::debug;

use crate::grid::{GridCell, GridConfig};

/// One end of a route: a world position and, when the route starts or ends
/// at a scene object, that object's id so it is not treated as an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    /// World position.
    pub position: Point,
    /// The scene object standing at this endpoint, if any.
    pub object: Option<ObjectId>,
}

impl Endpoint {
    /// A bare world position.
    pub const fn at(position: Point) -> Self {
        Endpoint { position, object: None }
    }

    /// The position of a scene object.
    pub const fn object(id: ObjectId, position: Point) -> Self {
        Endpoint { position, object: Some(id) }
    }
}

/// Set of grid cells a vehicle may not enter.
///
/// Rebuilt from scratch for every query; never contains the start or end cell
/// it was built for.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    blocked: HashSet<GridCell>,
}

impl ObstacleField {
    /// Rasterizes every obstacle of the scene onto the grid.
    ///
    /// Floor-related objects and the objects standing at `start` or `end`
    /// are skipped. Each remaining bounding box is inflated by `avoidance` on
    /// X and Z, every covered cell is blocked together with its eight
    /// neighbours, and finally the start and end cells are left free.
    ///
    /// # Arguments
    /// * `grid` - The planning grid
    /// * `objects` - Snapshot of the scene
    /// * `start` - Route start
    /// * `end` - Route end
    /// * `avoidance` - Horizontal clearance added around each obstacle
    pub fn build(grid: &GridConfig, objects: &[SceneObject], start: &Endpoint, end: &Endpoint, avoidance: f64) -> Self {
        let protected = [grid.to_cell(start.position), grid.to_cell(end.position)];
        let excluded = [start.object, end.object];
        let margin = avoidance.max(0.0);

        let mut blocked = HashSet::new();
        let mut rasterized = 0usize;
        for object in objects {
            if object.floor_related || excluded.contains(&Some(object.id)) {
                continue;
            }
            let rect = object.footprint().inflate(margin);
            let Some((lo, hi)) = grid.cells_covering(&rect) else {
                continue;
            };
            rasterized += 1;
            for row in lo.row..=hi.row {
                for col in lo.col..=hi.col {
                    let cell = GridCell::new(col, row);
                    if !protected.contains(&cell) {
                        blocked.insert(cell);
                    }
                    for (n, _) in grid.neighbours8(cell) {
                        if !protected.contains(&n) {
                            blocked.insert(n);
                        }
                    }
                }
            }
        }

        debug!(
            objects = objects.len(),
            rasterized,
            blocked = blocked.len(),
            avoidance = margin,
            "Built obstacle field"
        );
        ObstacleField { blocked }
    }

    /// Builds a field from an explicit cell list, for tools and tests.
    pub fn from_cells<I: IntoIterator<Item = GridCell>>(cells: I) -> Self {
        ObstacleField { blocked: cells.into_iter().collect() }
    }

    /// True if the cell may not be entered.
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.blocked.contains(&cell)
    }

    /// Number of blocked cells.
    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    /// True if nothing is blocked.
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// Iterates the blocked cells in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.blocked.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackyard_geometry::{Aabb, BoundingVolume, Sphere};

    fn grid() -> GridConfig {
        GridConfig::new(1.0, 10, 10, 0.0).unwrap()
    }

    fn crate_box(id: u32, min: (f64, f64), max: (f64, f64)) -> SceneObject {
        SceneObject::solid(
            ObjectId(id),
            BoundingVolume::Box(Aabb::new(Point::new(min.0, 0.0, min.1), Point::new(max.0, 2.0, max.1))),
        )
    }

    fn far_endpoints() -> (Endpoint, Endpoint) {
        (Endpoint::at(Point::flat(-9.5, -9.5)), Endpoint::at(Point::flat(9.5, 9.5)))
    }

    #[test]
    fn test_single_cell_obstacle_dilates_to_3x3() {
        let grid = grid();
        let (start, end) = far_endpoints();
        let objects = [crate_box(1, (0.2, 0.2), (0.8, 0.8))];
        let field = ObstacleField::build(&grid, &objects, &start, &end, 0.0);

        assert_eq!(field.len(), 9);
        for row in 9..=11 {
            for col in 9..=11 {
                assert!(field.is_blocked(GridCell::new(col, row)), "cell ({col}, {row}) should be blocked");
            }
        }
        assert!(!field.is_blocked(GridCell::new(12, 10)));
    }

    #[test]
    fn test_avoidance_inflates_horizontally() {
        let grid = grid();
        let (start, end) = far_endpoints();
        let objects = [crate_box(1, (0.2, 0.2), (0.8, 0.8))];
        let field = ObstacleField::build(&grid, &objects, &start, &end, 1.0);

        // [-0.8, 1.8] covers columns 9..=11, dilation adds one more ring.
        assert_eq!(field.len(), 25);
        assert!(field.is_blocked(GridCell::new(8, 8)));
        assert!(field.is_blocked(GridCell::new(12, 12)));
        assert!(!field.is_blocked(GridCell::new(13, 10)));
    }

    #[test]
    fn test_floors_and_endpoint_objects_are_ignored() {
        let grid = grid();
        let floor = SceneObject::floor(
            ObjectId(1),
            BoundingVolume::Box(Aabb::new(Point::flat(-10.0, -10.0), Point::flat(10.0, 10.0))),
        );
        let vehicle = crate_box(2, (-3.0, -3.0), (-2.0, -2.0));
        let target = SceneObject::solid(ObjectId(3), BoundingVolume::Sphere(Sphere::new(Point::flat(4.0, 4.0), 0.5)));

        let start = Endpoint::object(ObjectId(2), Point::flat(-2.5, -2.5));
        let end = Endpoint::object(ObjectId(3), Point::flat(4.0, 4.0));
        let field = ObstacleField::build(&grid, &[floor, vehicle, target], &start, &end, 0.5);
        assert!(field.is_empty());
    }

    #[test]
    fn test_start_and_end_cells_never_blocked() {
        let grid = grid();
        let start = Endpoint::at(Point::flat(0.5, 0.5));
        let end = Endpoint::at(Point::flat(2.5, 0.5));
        let objects = [crate_box(1, (-1.0, -1.0), (3.0, 2.0))];
        let field = ObstacleField::build(&grid, &objects, &start, &end, 0.5);

        assert!(!field.is_blocked(grid.to_cell(start.position)));
        assert!(!field.is_blocked(grid.to_cell(end.position)));
        assert!(field.is_blocked(GridCell::new(11, 10)));
    }

    #[test]
    fn test_objects_outside_grid_are_skipped() {
        let grid = grid();
        let (start, end) = far_endpoints();
        let objects = [crate_box(1, (50.0, 50.0), (60.0, 60.0))];
        let field = ObstacleField::build(&grid, &objects, &start, &end, 1.0);
        assert!(field.is_empty());
    }

    #[test]
    fn test_from_cells() {
        let field = ObstacleField::from_cells([GridCell::new(1, 1), GridCell::new(1, 1), GridCell::new(2, 1)]);
        assert_eq!(field.len(), 2);
        assert_eq!(field.iter().count(), 2);
    }
}
