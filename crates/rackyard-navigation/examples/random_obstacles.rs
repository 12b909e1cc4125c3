use rand::Rng;
use rackyard_geometry::{BoundingVolume, ObjectId, Point, SceneObject, Sphere};
use rackyard_navigation::{Endpoint, GridCell, GridConfig, PathFinder};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .init();

    // 40x40 cells of 0.5 units with 25 random pallets (spheres of radius up to 1 unit)
    let grid = GridConfig::new(0.5, 20, 20, 0.0).unwrap();
    let finder = PathFinder::new(grid, 0.25);
    let bounds = grid.world_bounds();

    let mut rng = rand::rng();
    let objects: Vec<SceneObject> = (0..25)
        .map(|i| {
            let center = Point::flat(
                rng.random_range(bounds.min_x..bounds.max_x),
                rng.random_range(bounds.min_z..bounds.max_z),
            );
            let radius = rng.random_range(0.2..1.0);
            SceneObject::solid(ObjectId(i), BoundingVolume::Sphere(Sphere::new(center, radius)))
        })
        .collect();

    let start = Endpoint::at(Point::flat(bounds.min_x + 0.1, bounds.min_z + 0.1));
    let end = Endpoint::at(Point::flat(bounds.max_x - 0.1, bounds.max_z - 0.1));

    let field = finder.obstacle_field(&objects, &start, &end);
    println!("{} of {} cells blocked", field.len(), grid.cell_count());

    let result = finder.find_path_detailed(&objects, start, end);
    println!("{}", result);

    let path: Vec<GridCell> = result.waypoints.iter().map(|p| grid.to_cell(*p)).collect();
    for row in (0..grid.rows()).rev() {
        let line: String = (0..grid.columns())
            .map(|col| {
                let cell = GridCell::new(col, row);
                if path.contains(&cell) {
                    '*'
                } else if field.is_blocked(cell) {
                    '#'
                } else {
                    '.'
                }
            })
            .collect();
        println!("{}", line);
    }
}
