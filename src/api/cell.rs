use crate::core::grid::{GridParams, gps_to_grid, grid_to_centre, grid_to_polygon};
use geo_types::{Point, Polygon};

/// A single rectangular cell of a lon/lat lattice.
///
/// Carries its `(col, row)` position, center point and the lattice
/// parameters it was cut from, so the polygon can be rebuilt without
/// re-supplying the params.
///
/// # Example
///
/// ```
/// use transgrid::{GridCell, GridParams};
///
/// # fn main() -> Result<(), transgrid::TransgridError> {
/// let params = GridParams::from_bounds([113.6, 22.4, 114.8, 22.9], 500.0)?;
/// let cell = GridCell::from_gps(113.8725, 22.5117, &params);
/// let polygon = cell.to_polygon();
/// assert_eq!(polygon.exterior().coords().count(), 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Column index in the lattice.
    pub col: i64,
    /// Row index in the lattice.
    pub row: i64,
    /// Cell center in WGS84 coordinates.
    pub center: Point<f64>,
    /// Lattice the cell belongs to.
    pub params: GridParams,
}

impl GridCell {
    /// Builds the cell at a lattice position.
    pub fn new(col: i64, row: i64, params: &GridParams) -> Self {
        let (lon, lat) = grid_to_centre(col, row, params);
        Self {
            col,
            row,
            center: Point::new(lon, lat),
            params: *params,
        }
    }

    /// Builds the cell containing a GPS position.
    pub fn from_gps(lon: f64, lat: f64, params: &GridParams) -> Self {
        let (col, row) = gps_to_grid(lon, lat, params);
        Self::new(col, row, params)
    }

    /// Longitude of the cell center.
    pub fn lon(&self) -> f64 {
        self.center.x()
    }

    /// Latitude of the cell center.
    pub fn lat(&self) -> f64 {
        self.center.y()
    }

    /// Rebuilds the cell rectangle as a closed ring.
    pub fn to_polygon(&self) -> Polygon<f64> {
        grid_to_polygon(self.col, self.row, &self.params)
    }
}
