use rackyard_geometry::{Aabb, BoundingVolume, ObjectId, Point, Polygon, Rect, SceneObject};
use rackyard_layout::{Clearance, FloorRegistry, RackSpec, place_racks_on_floor};

fn main() {
    // L-shaped hall with a pillar in the long wing
    let outline = Polygon::from_xz(
        &[(0.0, 0.0), (60.0, 0.0), (60.0, 25.0), (25.0, 25.0), (25.0, 40.0), (0.0, 40.0)],
        0.0,
    )
    .unwrap();
    let mut floors = FloorRegistry::new();
    let floor = floors.insert(&outline);

    let pillar = SceneObject::solid(
        ObjectId(1),
        BoundingVolume::Box(Aabb::new(Point::new(38.0, 0.0, 10.0), Point::new(40.0, 8.0, 12.0))),
    );
    let rack = RackSpec::new(2.7, 1.1, 2.0);
    let clearance = Clearance::new(1.0, 3.0);

    let plan = match place_racks_on_floor(&floors, floor, &rack, 6.5, &clearance, &[pillar]) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Layout failed: {}", e);
            return;
        }
    };

    println!(
        "{}: {} racks in {} slots ({} tried), {} levels, rows stacked along {}",
        floor,
        plan.len(),
        plan.slots_accepted,
        plan.slots_tried,
        plan.levels,
        if plan.rotated { "X" } else { "Z" }
    );

    // Top view, one character per 1x1 cell
    let bounds = outline.footprint();
    for z in (0..bounds.max_z as i32).rev() {
        for x in 0..bounds.max_x as i32 {
            let p = Point::flat(x as f64 + 0.5, z as f64 + 0.5);
            let c = if plan.footprints.iter().any(|f| f.level == 0 && contains(f.rect(), p)) {
                '#'
            } else if contains(pillar.footprint(), p) {
                'P'
            } else if outline.contains(p) {
                '.'
            } else {
                ' '
            };
            print!("{}", c);
        }
        println!();
    }
}

fn contains(rect: Rect, p: Point) -> bool {
    p.x > rect.min_x && p.x < rect.max_x && p.z > rect.min_z && p.z < rect.max_z
}
