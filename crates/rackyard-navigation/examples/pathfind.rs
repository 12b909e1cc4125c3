use std::collections::HashSet;

use rackyard_geometry::{Aabb, BoundingVolume, ObjectId, Point, SceneObject};
use rackyard_navigation::{Endpoint, GridCell, GridConfig, PathFinder};

fn main() {
    // 24x16 cells of 1 unit, centered at the world origin
    let grid = GridConfig::new(1.0, 12, 8, 0.0).unwrap();
    let finder = PathFinder::new(grid, 0.5);

    // Two shelving blocks with a gap between them
    let objects = [
        SceneObject::solid(
            ObjectId(1),
            BoundingVolume::Box(Aabb::new(Point::new(-3.0, 0.0, -8.0), Point::new(-2.0, 4.0, 2.0))),
        ),
        SceneObject::solid(
            ObjectId(2),
            BoundingVolume::Box(Aabb::new(Point::new(3.0, 0.0, -2.0), Point::new(4.0, 4.0, 8.0))),
        ),
    ];

    let start = Endpoint::at(Point::flat(-10.5, -6.5));
    let end = Endpoint::at(Point::flat(10.5, 6.5));
    let start_cell = grid.to_cell(start.position);
    let goal_cell = grid.to_cell(end.position);

    let field = finder.obstacle_field(&objects, &start, &end);
    let result = finder.find_path_detailed(&objects, start, end);
    println!("{}", grid);
    println!("{}", result);

    let path_cells: HashSet<GridCell> = result.waypoints.iter().map(|p| grid.to_cell(*p)).collect();

    println!("\nGrid with path:");
    for row in (0..grid.rows()).rev() {
        for col in 0..grid.columns() {
            let cell = GridCell::new(col, row);
            if cell == start_cell {
                print!("S ");
            } else if cell == goal_cell {
                print!("G ");
            } else if path_cells.contains(&cell) {
                print!("* ");
            } else if field.is_blocked(cell) {
                print!("X ");
            } else {
                print!(". ");
            }
        }
        println!();
    }

    if result.is_empty() {
        println!("\nNo path found.");
    } else {
        println!("\nWaypoints:");
        for p in &result.waypoints {
            println!("  {}", p);
        }
    }
}
