//! Automatic rack placement.
//!
//! A floor outline is filled with rows of identical racks, stacked in levels
//! up to the ceiling. The planner is greedy and axis-aligned:
//!
//! 1. Rows are stacked along the floor axis with the larger fit ratio. X
//!    counts pitches of `width + min_row_distance`, Z counts pitches of
//!    `depth + min_row_distance`; X wins a tie. Rows stacked along X hold
//!    racks turned a quarter, so their depth lies along the stacking axis.
//! 2. Row centers start `depth / 2 + min_obstacle_distance` in from the
//!    bounding box and advance by `depth + min_row_distance` while the
//!    row's far edge stays `min_obstacle_distance` off the bounding box.
//! 3. Inside a row, slot centers start `width / 2 + min_obstacle_distance`
//!    in and advance by the rack width, so racks of one row touch.
//! 4. A slot is kept when it stays `min_obstacle_distance` off the bounding
//!    box, its center and corners lie inside the outline, and the footprint
//!    grown by `min_obstacle_distance` hits no obstacle.
//! 5. Every kept slot produces one footprint per level.
//!
//! Running out of room is not an error; the plan just gets smaller.

use rackyard_geometry::{Point, Polygon, Rect, SceneObject, scene::obstacles};
use tracing::debug;

use crate::error::LayoutError;
use crate::floor::{FloorId, FloorRegistry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slack for comparisons against the usable area.
const EPSILON: f64 = 1e-9;

/// Upper bound on stacked levels per slot.
pub const MAX_LEVELS: u32 = 256;

/// Dimensions of one rack. `width` runs along the row, `depth` across it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RackSpec {
    /// Extent along the row.
    pub width: f64,
    /// Extent across the row.
    pub depth: f64,
    /// Height of one level.
    pub height: f64,
}

impl RackSpec {
    /// Creates a rack description.
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        RackSpec { width, depth, height }
    }

    /// Checks that every dimension is positive and finite.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.width) {
            return Err(LayoutError::InvalidRack("Rack width must be positive and finite"));
        }
        if !ok(self.depth) {
            return Err(LayoutError::InvalidRack("Rack depth must be positive and finite"));
        }
        if !ok(self.height) {
            return Err(LayoutError::InvalidRack("Rack height must be positive and finite"));
        }
        Ok(())
    }

    /// Number of whole levels that fit under `ceiling_height`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::CeilingTooLow`] when not even one level fits,
    /// [`LayoutError::InvalidRack`] when more than [`MAX_LEVELS`] would.
    pub fn levels_under(&self, ceiling_height: f64) -> Result<u32, LayoutError> {
        self.validate()?;
        let levels = if ceiling_height.is_finite() { (ceiling_height / self.height).floor() } else { 0.0 };
        if levels < 1.0 {
            return Err(LayoutError::CeilingTooLow { ceiling_height, rack_height: self.height });
        }
        if levels > MAX_LEVELS as f64 {
            return Err(LayoutError::InvalidRack("Ceiling holds more rack levels than supported"));
        }
        Ok(levels as u32)
    }
}

/// Spacing rules for placement.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clearance {
    /// Gap kept to the floor boundary and to every obstacle.
    pub min_obstacle_distance: f64,
    /// Aisle between neighbouring rows.
    pub min_row_distance: f64,
}

impl Clearance {
    /// Creates a clearance description.
    pub const fn new(min_obstacle_distance: f64, min_row_distance: f64) -> Self {
        Clearance { min_obstacle_distance, min_row_distance }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if !ok(self.min_obstacle_distance) || !ok(self.min_row_distance) {
            return Err(LayoutError::InvalidRack("Clearances must be non-negative and finite"));
        }
        Ok(())
    }
}

/// One placed rack level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RackFootprint {
    /// Center of the footprint at the bottom of this level.
    pub base: Point,
    /// Level index, 0 on the floor.
    pub level: u32,
    /// True when the rack is turned a quarter so its width runs along Z.
    pub rotated: bool,
    /// Rack dimensions.
    pub rack: RackSpec,
}

impl RackFootprint {
    /// Horizontal extents of the footprint.
    pub fn rect(&self) -> Rect {
        if self.rotated {
            Rect::centered(self.base, self.rack.depth, self.rack.width)
        } else {
            Rect::centered(self.base, self.rack.width, self.rack.depth)
        }
    }

    /// Center of the rack volume.
    pub fn center(&self) -> Point {
        Point::new(self.base.x, self.base.y + self.rack.height * 0.5, self.base.z)
    }

    /// Yaw around +Y: 0 for unrotated racks, a quarter turn otherwise.
    pub fn yaw(&self) -> f64 {
        if self.rotated { core::f64::consts::FRAC_PI_2 } else { 0.0 }
    }
}

/// Outcome of a placement run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RackPlan {
    /// Placed footprints, row by row, slot by slot, level by level.
    pub footprints: Vec<RackFootprint>,
    /// Levels stacked on each slot.
    pub levels: u32,
    /// True when rows are stacked along X and run along Z.
    pub rotated: bool,
    /// Rows visited.
    pub rows: usize,
    /// Slots evaluated.
    pub slots_tried: usize,
    /// Slots that passed every check.
    pub slots_accepted: usize,
}

impl RackPlan {
    /// Number of placed footprints.
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    /// True if nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}

/// Fills `floor` with racks and reports how the run went.
///
/// # Arguments
/// * `floor` - Floor outline in world coordinates; racks stand on its lowest vertex height
/// * `rack` - Dimensions of one rack
/// * `ceiling_height` - Clear height above the floor
/// * `clearance` - Spacing rules
/// * `objects` - Scene snapshot; floor-related objects are ignored
///
/// # Errors
///
/// Invalid dimensions or a ceiling lower than one rack. Nothing is placed then.
pub fn plan_racks(
    floor: &Polygon,
    rack: &RackSpec,
    ceiling_height: f64,
    clearance: &Clearance,
    objects: &[SceneObject],
) -> Result<RackPlan, LayoutError> {
    clearance.validate()?;
    let levels = rack.levels_under(ceiling_height)?;

    let bounds = floor.bounds();
    let area = bounds.footprint();
    let floor_y = bounds.min.y;
    let margin = clearance.min_obstacle_distance;
    let usable = area.inflate(-margin + EPSILON);

    let row_pitch = rack.depth + clearance.min_row_distance;
    let fit_x = area.size_x() / (rack.width + clearance.min_row_distance);
    let fit_z = area.size_z() / row_pitch;
    // Rows stacked along X run along Z.
    let rotated = fit_x >= fit_z;
    let (stack_min, stack_max, run_min, run_max) = if rotated {
        (area.min_x, area.max_x, area.min_z, area.max_z)
    } else {
        (area.min_z, area.max_z, area.min_x, area.max_x)
    };

    let blockers: Vec<&SceneObject> = obstacles(objects).collect();
    let mut plan = RackPlan { levels, rotated, ..RackPlan::default() };

    let first_row = stack_min + margin + rack.depth * 0.5;
    let first_slot = run_min + margin + rack.width * 0.5;
    let mut row = 0usize;
    loop {
        let row_center = first_row + row as f64 * row_pitch;
        if row_center + rack.depth * 0.5 > stack_max - margin + EPSILON {
            break;
        }
        plan.rows += 1;

        let mut slot = 0usize;
        loop {
            let slot_center = first_slot + slot as f64 * rack.width;
            if slot_center > run_max - margin + EPSILON {
                break;
            }
            plan.slots_tried += 1;
            slot += 1;

            let (x, z) = if rotated { (row_center, slot_center) } else { (slot_center, row_center) };
            let base = Point::new(x, floor_y, z);
            let candidate = RackFootprint { base, level: 0, rotated, rack: *rack };
            let rect = candidate.rect();

            if !usable.contains_rect(&rect) || !floor.contains_rect(&rect) {
                continue;
            }
            let guard = rect.inflate(margin);
            if blockers.iter().any(|o| o.bounds.overlaps_rect(&guard)) {
                continue;
            }

            plan.slots_accepted += 1;
            plan.footprints.extend((0..levels).map(|level| RackFootprint {
                base: Point::new(x, floor_y + level as f64 * rack.height, z),
                level,
                ..candidate
            }));
        }
        row += 1;
    }

    debug!(
        levels,
        rotated,
        rows = plan.rows,
        slots_tried = plan.slots_tried,
        slots_accepted = plan.slots_accepted,
        footprints = plan.footprints.len(),
        "Planned rack layout"
    );
    Ok(plan)
}

/// Fills `floor` with racks.
///
/// Same as [`plan_racks`] without the run statistics.
pub fn place_racks(
    floor: &Polygon,
    rack: &RackSpec,
    ceiling_height: f64,
    clearance: &Clearance,
    objects: &[SceneObject],
) -> Result<Vec<RackFootprint>, LayoutError> {
    plan_racks(floor, rack, ceiling_height, clearance, objects).map(|plan| plan.footprints)
}

/// Plans racks on a registered floor.
///
/// # Errors
///
/// [`LayoutError::FloorNotFound`] and [`LayoutError::MissingCenter`] in
/// addition to the errors of [`plan_racks`].
pub fn place_racks_on_floor(
    registry: &FloorRegistry,
    floor: FloorId,
    rack: &RackSpec,
    ceiling_height: f64,
    clearance: &Clearance,
    objects: &[SceneObject],
) -> Result<RackPlan, LayoutError> {
    let outline = registry.absolute_polygon(floor)?;
    plan_racks(&outline, rack, ceiling_height, clearance, objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackyard_geometry::{Aabb, BoundingVolume, ObjectId, Sphere};
    use std::collections::{HashMap, HashSet};

    const RACK: RackSpec = RackSpec::new(18.0, 11.0, 20.0);
    const CLEARANCE: Clearance = Clearance::new(1.0, 3.0);

    fn square(size: f64) -> Polygon {
        Polygon::from_xz(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)], 0.0).unwrap()
    }

    fn rectangle(sx: f64, sz: f64) -> Polygon {
        Polygon::from_xz(&[(0.0, 0.0), (sx, 0.0), (sx, sz), (0.0, sz)], 0.0).unwrap()
    }

    fn pillar(id: u32, min: (f64, f64), max: (f64, f64)) -> SceneObject {
        SceneObject::solid(
            ObjectId(id),
            BoundingVolume::Box(Aabb::new(Point::new(min.0, 0.0, min.1), Point::new(max.0, 50.0, max.1))),
        )
    }

    fn assert_no_overlap(footprints: &[RackFootprint]) {
        for (i, a) in footprints.iter().enumerate() {
            for b in &footprints[i + 1..] {
                if a.level == b.level {
                    let (ra, rb) = (a.rect().inflate(-1e-6), b.rect().inflate(-1e-6));
                    assert!(!ra.overlaps(&rb), "Racks at {} and {} overlap", a.base, b.base);
                }
            }
        }
    }

    #[test]
    fn test_levels_under_ceiling() {
        assert_eq!(RACK.levels_under(60.0), Ok(3));
        assert_eq!(RACK.levels_under(79.9), Ok(3));
        assert_eq!(RACK.levels_under(20.0), Ok(1));
        assert_eq!(
            RACK.levels_under(19.0),
            Err(LayoutError::CeilingTooLow { ceiling_height: 19.0, rack_height: 20.0 })
        );
    }

    #[test]
    fn test_square_floor_three_levels() {
        let plan = plan_racks(&square(100.0), &RACK, 60.0, &CLEARANCE, &[]).unwrap();

        assert_eq!(plan.levels, 3);
        assert!(!plan.rotated);
        // Rows at z = 6.5 + 14k for k in 0..7, slots at x = 10 + 18k for k in 0..5.
        assert_eq!(plan.rows, 7);
        assert_eq!(plan.slots_accepted, 35);
        assert_eq!(plan.len(), 105);

        let levels: HashSet<u32> = plan.footprints.iter().map(|f| f.level).collect();
        assert_eq!(levels, HashSet::from([0, 1, 2]));
        for f in &plan.footprints {
            assert_eq!(f.base.y, f.level as f64 * 20.0);
            assert!(f.rect().min_x >= 1.0 && f.rect().max_x <= 99.0);
            assert!(f.rect().min_z >= 1.0 && f.rect().max_z <= 99.0);
        }
    }

    #[test]
    fn test_no_duplicate_positions() {
        let footprints = place_racks(&square(100.0), &RACK, 60.0, &CLEARANCE, &[]).unwrap();
        let keys: HashSet<(i64, i64, u32)> = footprints
            .iter()
            .map(|f| ((f.base.x * 1000.0) as i64, (f.base.z * 1000.0) as i64, f.level))
            .collect();
        assert_eq!(keys.len(), footprints.len());
        assert_no_overlap(&footprints);
    }

    #[test]
    fn test_rows_keep_aisle() {
        let footprints = place_racks(&square(100.0), &RACK, 20.0, &CLEARANCE, &[]).unwrap();
        let mut rows: Vec<f64> = footprints.iter().map(|f| f.base.z).collect();
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
        rows.dedup();
        for pair in rows.windows(2) {
            let gap = (pair[1] - pair[0]) - RACK.depth;
            assert!(gap >= CLEARANCE.min_row_distance - 1e-9, "Aisle {} too narrow", gap);
        }
    }

    #[test]
    fn test_ceiling_too_low_places_nothing() {
        let result = place_racks(&square(100.0), &RACK, 10.0, &CLEARANCE, &[]);
        assert!(matches!(result, Err(LayoutError::CeilingTooLow { .. })));
    }

    #[test]
    fn test_invalid_dimensions() {
        let bad = RackSpec::new(0.0, 11.0, 20.0);
        assert!(matches!(place_racks(&square(100.0), &bad, 60.0, &CLEARANCE, &[]), Err(LayoutError::InvalidRack(_))));
        let negative = Clearance::new(-1.0, 3.0);
        assert!(matches!(place_racks(&square(100.0), &RACK, 60.0, &negative, &[]), Err(LayoutError::InvalidRack(_))));
    }

    #[test]
    fn test_floor_too_small_is_empty_not_error() {
        let plan = plan_racks(&square(15.0), &RACK, 60.0, &CLEARANCE, &[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.slots_accepted, 0);
    }

    #[test]
    fn test_obstacles_keep_clearance() {
        let objects = [
            pillar(1, (45.0, 45.0), (55.0, 55.0)),
            SceneObject::solid(ObjectId(2), BoundingVolume::Sphere(Sphere::new(Point::flat(20.0, 80.0), 4.0))),
            SceneObject::floor(ObjectId(3), BoundingVolume::Box(Aabb::new(Point::flat(0.0, 0.0), Point::flat(100.0, 100.0)))),
        ];
        let free = place_racks(&square(100.0), &RACK, 60.0, &CLEARANCE, &[]).unwrap();
        let blocked = place_racks(&square(100.0), &RACK, 60.0, &CLEARANCE, &objects).unwrap();

        assert!(blocked.len() < free.len());
        assert!(!blocked.is_empty(), "The floor object must not block everything");
        for f in &blocked {
            let guard = f.rect().inflate(CLEARANCE.min_obstacle_distance);
            assert!(!objects[0].bounds.overlaps_rect(&guard));
            assert!(!objects[1].bounds.overlaps_rect(&guard));
        }
        assert_no_overlap(&blocked);
    }

    #[test]
    fn test_rows_stack_along_longer_fit() {
        // X fits 100 / 21 racks, Z only 30 / 14 rows: rows are stacked along X.
        let wide = plan_racks(&rectangle(100.0, 30.0), &RACK, 20.0, &CLEARANCE, &[]).unwrap();
        assert!(wide.rotated);
        // Row centers at x = 6.5 + 14k for k in 0..7, one slot each at z = 10.
        assert_eq!(wide.rows, 7);
        assert_eq!(wide.len(), 7);
        let mut xs: Vec<f64> = wide.footprints.iter().map(|f| f.base.x).collect();
        xs.dedup();
        assert_eq!(xs, vec![6.5, 20.5, 34.5, 48.5, 62.5, 76.5, 90.5]);
        for f in &wide.footprints {
            assert_eq!(f.base.z, 10.0);
            assert_eq!(f.rect().size_x(), RACK.depth);
            assert_eq!(f.rect().size_z(), RACK.width);
            assert_eq!(f.yaw(), core::f64::consts::FRAC_PI_2);
        }

        let deep = plan_racks(&rectangle(30.0, 100.0), &RACK, 20.0, &CLEARANCE, &[]).unwrap();
        assert!(!deep.rotated);
        assert_eq!(deep.rows, 7);
        assert_eq!(deep.len(), 7);
        for f in &deep.footprints {
            assert_eq!(f.base.x, 10.0);
            assert_eq!(f.rect().size_x(), RACK.width);
            assert_eq!(f.yaw(), 0.0);
        }
    }

    #[test]
    fn test_every_slot_gets_each_level_once() {
        let plan = plan_racks(&square(100.0), &RACK, 60.0, &CLEARANCE, &[]).unwrap();
        let mut per_slot: HashMap<(i64, i64), Vec<u32>> = HashMap::new();
        for f in &plan.footprints {
            let key = ((f.base.x * 1000.0) as i64, (f.base.z * 1000.0) as i64);
            per_slot.entry(key).or_default().push(f.level);
        }
        assert_eq!(per_slot.len(), plan.slots_accepted);
        for levels in per_slot.values() {
            assert_eq!(levels, &vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_absurd_level_count_is_rejected() {
        let thin = RackSpec::new(1.0, 1.0, 1.0);
        assert_eq!(thin.levels_under(MAX_LEVELS as f64), Ok(MAX_LEVELS));
        assert!(matches!(thin.levels_under(1e12), Err(LayoutError::InvalidRack(_))));
        assert!(matches!(
            place_racks(&square(100.0), &thin, 1e12, &CLEARANCE, &[]),
            Err(LayoutError::InvalidRack(_))
        ));
    }

    #[test]
    fn test_concave_floor_skips_notch() {
        // L-shape: the top-right 50x50 quadrant is missing.
        let l = Polygon::from_xz(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0), (50.0, 50.0), (50.0, 100.0), (0.0, 100.0)],
            0.0,
        )
        .unwrap();
        let footprints = place_racks(&l, &RACK, 20.0, &CLEARANCE, &[]).unwrap();
        assert!(!footprints.is_empty());
        for f in &footprints {
            let r = f.rect();
            assert!(!(r.max_x > 50.0 + 1e-9 && r.max_z > 50.0 + 1e-9 && r.min_x < 100.0), "Rack at {} sits in the notch", f.base);
            assert!(l.contains_rect(&r));
        }
        assert_no_overlap(&footprints);
    }

    #[test]
    fn test_racks_stand_on_lowest_floor_vertex() {
        let raised = square(100.0).translated(Point::new(0.0, 2.5, 0.0));
        let footprints = place_racks(&raised, &RACK, 40.0, &CLEARANCE, &[]).unwrap();
        assert!(footprints.iter().filter(|f| f.level == 0).all(|f| f.base.y == 2.5));
        assert!(footprints.iter().filter(|f| f.level == 1).all(|f| f.base.y == 22.5));
        assert_eq!(footprints[0].center().y, 12.5);
    }

    #[test]
    fn test_registered_floor() {
        let mut registry = FloorRegistry::new();
        let id = registry.insert(&square(100.0));
        let plan = place_racks_on_floor(&registry, id, &RACK, 60.0, &CLEARANCE, &[]).unwrap();
        assert_eq!(plan.len(), 105);

        let orphan = registry.insert_relative(square(10.0).into_vertices(), None);
        assert_eq!(
            place_racks_on_floor(&registry, orphan, &RACK, 60.0, &CLEARANCE, &[]),
            Err(LayoutError::MissingCenter(orphan))
        );
        assert_eq!(
            place_racks_on_floor(&registry, FloorId(99), &RACK, 60.0, &CLEARANCE, &[]),
            Err(LayoutError::FloorNotFound(FloorId(99)))
        );
    }
}
