#![warn(missing_docs)]

use rackyard_geometry::{Point, Rect};

use crate::error::NavigationError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest number of cells a grid may hold.
const MAX_CELLS: usize = 1 << 26;

/// Represents a cell of the planning grid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Column index, increasing along world X.
    pub col: usize,
    /// Row index, increasing along world Z.
    pub row: usize,
}

impl GridCell {
    /// Creates a new `GridCell`.
    #[must_use]
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Chebyshev (king-move) distance to `other`.
    pub fn chebyshev(&self, other: &GridCell) -> usize {
        self.col.abs_diff(other.col).max(self.row.abs_diff(other.row))
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.col, self.row)
    }
}

/// The shared discretization of the warehouse floor.
///
/// The grid is `2 * length_units` columns by `2 * width_units` rows of square
/// cells, centered at the world origin. Cell `(c, r)` covers
/// `x in [(c - length_units) * spacing, (c - length_units + 1) * spacing)` and the
/// matching range on Z.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// World units per cell edge.
    spacing: f64,
    /// Half the number of columns.
    length_units: usize,
    /// Half the number of rows.
    width_units: usize,
    /// Height of the ground plane; returned as the y of every waypoint.
    ground_y: f64,
}

impl GridConfig {
    /// Creates a new grid configuration.
    ///
    /// # Arguments
    /// * `spacing` - World units per cell edge
    /// * `length_units` - Half the number of columns (extent along X)
    /// * `width_units` - Half the number of rows (extent along Z)
    /// * `ground_y` - Height of the ground plane
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The grid or an error if parameters are invalid
    pub fn new(spacing: f64, length_units: usize, width_units: usize, ground_y: f64) -> Result<Self, NavigationError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(NavigationError::InvalidSpacing("Spacing must be positive and finite"));
        }
        if length_units == 0 || width_units == 0 {
            return Err(NavigationError::InvalidDimensions("Length and width must be non-zero"));
        }
        let cells = (2 * length_units as u128) * (2 * width_units as u128);
        if cells > MAX_CELLS as u128 {
            return Err(NavigationError::InvalidDimensions("Grid dimensions too large"));
        }
        Ok(GridConfig { spacing, length_units, width_units, ground_y })
    }

    /// A copy of this grid with a new extent, as done by the grid-size editor.
    pub fn resized(&self, length_units: usize, width_units: usize) -> Result<Self, NavigationError> {
        GridConfig::new(self.spacing, length_units, width_units, self.ground_y)
    }

    /// World units per cell edge.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Half the number of columns.
    pub fn length_units(&self) -> usize {
        self.length_units
    }

    /// Half the number of rows.
    pub fn width_units(&self) -> usize {
        self.width_units
    }

    /// Height of the ground plane.
    pub fn ground_y(&self) -> f64 {
        self.ground_y
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        2 * self.length_units
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        2 * self.width_units
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Converts a world point to the cell containing it.
    ///
    /// Points outside the grid are clamped onto the nearest border cell, so
    /// the result is always a valid cell.
    pub fn to_cell(&self, p: Point) -> GridCell {
        GridCell::new(
            Self::axis_index(p.x, self.spacing, self.length_units),
            Self::axis_index(p.z, self.spacing, self.width_units),
        )
    }

    /// Converts a cell to the world position of its center, at ground height.
    pub fn to_world(&self, cell: GridCell) -> Point {
        Point::new(
            (cell.col as f64 - self.length_units as f64 + 0.5) * self.spacing,
            self.ground_y,
            (cell.row as f64 - self.width_units as f64 + 0.5) * self.spacing,
        )
    }

    /// World-space rectangle covered by the grid.
    pub fn world_bounds(&self) -> Rect {
        let hx = self.length_units as f64 * self.spacing;
        let hz = self.width_units as f64 * self.spacing;
        Rect::new(-hx, -hz, hx, hz)
    }

    /// True if `p` lies on the grid (the max edges are outside).
    pub fn contains(&self, p: Point) -> bool {
        let b = self.world_bounds();
        p.x >= b.min_x && p.x < b.max_x && p.z >= b.min_z && p.z < b.max_z
    }

    /// True if the cell indices are in range.
    pub fn contains_cell(&self, cell: GridCell) -> bool {
        cell.col < self.columns() && cell.row < self.rows()
    }

    /// Row-major index of `cell`, or `None` when out of range.
    pub fn index_of(&self, cell: GridCell) -> Option<usize> {
        self.contains_cell(cell).then(|| cell.row * self.columns() + cell.col)
    }

    /// Inclusive range of cells whose squares intersect `rect`, or `None`
    /// when the rectangle misses the grid entirely.
    pub fn cells_covering(&self, rect: &Rect) -> Option<(GridCell, GridCell)> {
        let b = self.world_bounds();
        if rect.max_x < b.min_x || rect.min_x >= b.max_x || rect.max_z < b.min_z || rect.min_z >= b.max_z {
            return None;
        }
        let lo = self.to_cell(Point::flat(rect.min_x, rect.min_z));
        let hi = GridCell::new(
            Self::upper_index(rect.min_x, rect.max_x, self.spacing, self.length_units),
            Self::upper_index(rect.min_z, rect.max_z, self.spacing, self.width_units),
        );
        Some((lo, hi))
    }

    /// The in-bounds 8-neighbourhood of `cell`, each flagged `true` when the
    /// move is diagonal.
    pub fn neighbours8(&self, cell: GridCell) -> impl Iterator<Item = (GridCell, bool)> + '_ {
        const DIRECTIONS: [(isize, isize); 8] =
            [(0, -1), (-1, 0), (1, 0), (0, 1), (-1, -1), (1, -1), (-1, 1), (1, 1)];
        DIRECTIONS.iter().filter_map(move |&(dc, dr)| {
            let col = cell.col.checked_add_signed(dc)?;
            let row = cell.row.checked_add_signed(dr)?;
            let n = GridCell::new(col, row);
            self.contains_cell(n).then_some((n, dc != 0 && dr != 0))
        })
    }

    fn axis_index(coord: f64, spacing: f64, half_units: usize) -> usize {
        let max = 2 * half_units as i64 - 1;
        let raw = (coord / spacing).floor();
        if raw.is_nan() {
            return half_units;
        }
        // Saturating float-to-int cast keeps far-away points finite.
        ((raw as i64).saturating_add(half_units as i64)).clamp(0, max) as usize
    }

    /// Last cell touched by an interval ending at `max`: a max edge that lies
    /// exactly on a cell boundary does not reach into the next cell.
    fn upper_index(min: f64, max: f64, spacing: f64, half_units: usize) -> usize {
        let upper = (max / spacing).ceil() - 1.0;
        let lower = (min / spacing).floor();
        let raw = upper.max(lower);
        let top = 2 * half_units as i64 - 1;
        ((raw as i64).saturating_add(half_units as i64)).clamp(0, top) as usize
    }
}

impl std::fmt::Display for GridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GridConfig ({}x{}, spacing: {:.3}, ground: {:.3})",
            self.columns(),
            self.rows(),
            self.spacing,
            self.ground_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = GridConfig::new(0.5, 10, 4, 0.0).unwrap();
        assert_eq!(grid.columns(), 20);
        assert_eq!(grid.rows(), 8);
        assert_eq!(grid.cell_count(), 160);
        assert_eq!(grid.world_bounds(), Rect::new(-5.0, -2.0, 5.0, 2.0));
    }

    #[test]
    fn test_invalid_creation() {
        assert!(matches!(GridConfig::new(0.0, 10, 10, 0.0), Err(NavigationError::InvalidSpacing(_))));
        assert!(matches!(GridConfig::new(f64::NAN, 10, 10, 0.0), Err(NavigationError::InvalidSpacing(_))));
        assert!(matches!(GridConfig::new(1.0, 0, 10, 0.0), Err(NavigationError::InvalidDimensions(_))));
        assert!(matches!(GridConfig::new(1.0, 10, 0, 0.0), Err(NavigationError::InvalidDimensions(_))));
        assert!(matches!(
            GridConfig::new(1.0, usize::MAX / 4, 10, 0.0),
            Err(NavigationError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_coordinate_conversion() {
        let grid = GridConfig::new(1.0, 10, 10, 2.0).unwrap();

        // World origin is the corner shared by the four central cells.
        assert_eq!(grid.to_cell(Point::flat(0.0, 0.0)), GridCell::new(10, 10));
        assert_eq!(grid.to_cell(Point::flat(-0.1, -0.1)), GridCell::new(9, 9));

        let center = grid.to_world(GridCell::new(10, 10));
        assert!((center.x - 0.5).abs() < 1e-12);
        assert!((center.z - 0.5).abs() < 1e-12);
        assert_eq!(center.y, 2.0);

        let corner = grid.to_world(GridCell::new(0, 0));
        assert_eq!(corner, Point::new(-9.5, 2.0, -9.5));
    }

    #[test]
    fn test_round_trip_every_cell() {
        let grid = GridConfig::new(0.25, 6, 3, 0.0).unwrap();
        for row in 0..grid.rows() {
            for col in 0..grid.columns() {
                let cell = GridCell::new(col, row);
                assert_eq!(grid.to_cell(grid.to_world(cell)), cell);
            }
        }
    }

    #[test]
    fn test_out_of_bounds_points_clamp() {
        let grid = GridConfig::new(1.0, 5, 5, 0.0).unwrap();
        assert_eq!(grid.to_cell(Point::flat(1000.0, -1000.0)), GridCell::new(9, 0));
        assert_eq!(grid.to_cell(Point::flat(-5.0, 5.0)), GridCell::new(0, 9));
        assert_eq!(grid.to_cell(Point::flat(f64::INFINITY, f64::NEG_INFINITY)), GridCell::new(9, 0));
        assert!(!grid.contains(Point::flat(5.0, 0.0)));
        assert!(grid.contains(Point::flat(-5.0, 4.99)));
    }

    #[test]
    fn test_index_of() {
        let grid = GridConfig::new(1.0, 2, 2, 0.0).unwrap();
        assert_eq!(grid.index_of(GridCell::new(0, 0)), Some(0));
        assert_eq!(grid.index_of(GridCell::new(3, 1)), Some(7));
        assert_eq!(grid.index_of(GridCell::new(4, 0)), None);
        assert_eq!(grid.index_of(GridCell::new(0, 4)), None);
    }

    #[test]
    fn test_cells_covering() {
        let grid = GridConfig::new(1.0, 5, 5, 0.0).unwrap();
        // [0, 2) x [0, 1) covers columns 5..=6 and row 5 only.
        let (lo, hi) = grid.cells_covering(&Rect::new(0.0, 0.0, 2.0, 1.0)).unwrap();
        assert_eq!(lo, GridCell::new(5, 5));
        assert_eq!(hi, GridCell::new(6, 5));

        // Degenerate rectangle still covers the cell it sits in.
        let (lo, hi) = grid.cells_covering(&Rect::new(0.5, 0.5, 0.5, 0.5)).unwrap();
        assert_eq!(lo, hi);

        // Partially outside is clipped, fully outside is skipped.
        let (lo, hi) = grid.cells_covering(&Rect::new(3.5, -20.0, 40.0, -4.5)).unwrap();
        assert_eq!(lo, GridCell::new(8, 0));
        assert_eq!(hi, GridCell::new(9, 0));
        assert!(grid.cells_covering(&Rect::new(6.0, 6.0, 8.0, 8.0)).is_none());
    }

    #[test]
    fn test_neighbours() {
        let grid = GridConfig::new(1.0, 2, 2, 0.0).unwrap();
        let corner: Vec<_> = grid.neighbours8(GridCell::new(0, 0)).collect();
        assert_eq!(corner.len(), 3);
        assert_eq!(corner.iter().filter(|(_, diagonal)| *diagonal).count(), 1);

        let inner: Vec<_> = grid.neighbours8(GridCell::new(1, 1)).collect();
        assert_eq!(inner.len(), 8);
        assert_eq!(inner.iter().filter(|(_, diagonal)| *diagonal).count(), 4);
    }

    #[test]
    fn test_resized_keeps_spacing() {
        let grid = GridConfig::new(0.5, 10, 10, 1.0).unwrap();
        let bigger = grid.resized(20, 5).unwrap();
        assert_eq!(bigger.spacing(), 0.5);
        assert_eq!(bigger.ground_y(), 1.0);
        assert_eq!(bigger.columns(), 40);
        assert_eq!(bigger.rows(), 10);
        assert!(grid.resized(0, 5).is_err());
    }

    #[test]
    fn test_display() {
        let grid = GridConfig::new(0.5, 2, 3, 0.0).unwrap();
        let s = format!("{}", grid);
        assert!(s.contains("GridConfig (4x6"));
        assert_eq!(format!("{}", GridCell::new(1, 2)), "[1, 2]");
    }
}
