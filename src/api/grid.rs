use crate::api::cell::GridCell;
use crate::core::constants::GRID_EARTH_RADIUS;
use crate::core::geometry::create_hexagon;
use crate::core::grid::{GridParams, gps_to_grid};
use crate::util::error::TransgridError;
use geo_types::{Coord, LineString, Point, Polygon};
use log::debug;
use std::f64::consts::PI;

/// A materialized rectangular lattice over a study area.
///
/// Enumerates the full lattice covering the bounds, `floor((max-min)/delta)
/// + 1` cells per axis starting at the south-west corner, not just cells
/// that contain data. Intended for human-interactive study areas, not
/// planet-scale indexing.
///
/// # Example
///
/// ```
/// use transgrid::RectGrid;
/// use geo_types::point;
///
/// # fn main() -> Result<(), transgrid::TransgridError> {
/// let grid = RectGrid::builder()
///     .bounds([113.6, 22.4, 114.8, 22.9])
///     .accuracy(500.0)
///     .build()?;
///
/// let pt = point! { x: 113.8725, y: 22.5117 };
/// assert!(grid.get_cell_at(&pt).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RectGrid {
    cells: Vec<GridCell>,
    params: GridParams,
}

impl RectGrid {
    pub fn builder() -> RectGridBuilder {
        RectGridBuilder::new()
    }

    /// Materializes every cell of the lattice covering `bounds` with a
    /// target cell edge of `accuracy` meters.
    pub fn from_bounds(bounds: [f64; 4], accuracy: f64) -> Result<Self, TransgridError> {
        let params = GridParams::from_bounds(bounds, accuracy)?;

        let lon_span = (bounds[0] - bounds[2]).abs();
        let lat_span = (bounds[1] - bounds[3]).abs();
        let cols = (lon_span / params.delta_lon).floor() as i64 + 1;
        let rows = (lat_span / params.delta_lat).floor() as i64 + 1;

        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(GridCell::new(col, row, &params));
            }
        }

        debug!("rect grid: {} x {} = {} cells", cols, rows, cells.len());
        Ok(Self { cells, params })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    /// Finds the materialized cell containing a point, if the point falls
    /// inside the gridded extent.
    pub fn get_cell_at(&self, point: &Point<f64>) -> Option<&GridCell> {
        let (col, row) = gps_to_grid(point.x(), point.y(), &self.params);
        self.cells
            .iter()
            .find(|cell| cell.col == col && cell.row == row)
    }

    pub fn to_polygons(&self) -> Vec<Polygon<f64>> {
        self.cells.iter().map(|cell| cell.to_polygon()).collect()
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<&GridCell>
    where
        F: Fn(&GridCell) -> bool,
    {
        self.cells.iter().filter(|cell| predicate(cell)).collect()
    }
}

#[derive(Debug, Default)]
pub struct RectGridBuilder {
    bounds: Option<[f64; 4]>,
    accuracy: Option<f64>,
}

impl RectGridBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(mut self, bounds: [f64; 4]) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn build(self) -> Result<RectGrid, TransgridError> {
        let bounds = self.bounds.expect("bounds must be set");
        let accuracy = self.accuracy.expect("accuracy must be set");
        RectGrid::from_bounds(bounds, accuracy)
    }
}

/// One flat-top hexagonal cell, in WGS84 coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    pub center: Point<f64>,
    pub polygon: Polygon<f64>,
}

/// A hexagonal tiling of a study area.
///
/// Hex centers are laid out in a local metric frame (equirectangular
/// scaling at the bounds' mean latitude) as two interleaved rectangular
/// lattices offset by half the hex pitch, which together tile the plane
/// with flat-top hexagons; centers and polygons are then mapped back to
/// lon/lat.
#[derive(Debug, Clone)]
pub struct HexGrid {
    cells: Vec<HexCell>,
    side_m: f64,
}

impl HexGrid {
    /// Tiles `bounds` with flat-top hexagons of circumradius `side_m`
    /// meters.
    pub fn from_bounds(bounds: [f64; 4], side_m: f64) -> Result<Self, TransgridError> {
        if !(side_m > 0.0 && side_m.is_finite()) {
            return Err(TransgridError::InvalidAccuracy(side_m));
        }
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(TransgridError::InvalidBounds(format!("{:?}", bounds)));
        }

        let (lon_min, lon_max) = (bounds[0].min(bounds[2]), bounds[0].max(bounds[2]));
        let (lat_min, lat_max) = (bounds[1].min(bounds[3]), bounds[1].max(bounds[3]));

        let m_per_deg_lat = 2.0 * PI * GRID_EARTH_RADIUS / 360.0;
        let m_per_deg_lon = m_per_deg_lat * (PI * (lat_min + lat_max) / 360.0).cos();

        let width = (lon_max - lon_min) * m_per_deg_lon;
        let height = (lat_max - lat_min) * m_per_deg_lat;

        // Flat-top tiling: column pitch 3R per lattice, row pitch sqrt(3)R,
        // second lattice shifted by half of each.
        let col_pitch = 3.0 * side_m;
        let row_pitch = 3.0_f64.sqrt() * side_m;

        let cols = (width / col_pitch).ceil() as i64 + 1;
        let rows = (height / row_pitch).ceil() as i64 + 1;

        let to_lonlat = |x: f64, y: f64| -> (f64, f64) {
            (lon_min + x / m_per_deg_lon, lat_min + y / m_per_deg_lat)
        };

        let mut cells = Vec::new();
        for (x_off, y_off) in [(0.0, 0.0), (col_pitch / 2.0, row_pitch / 2.0)] {
            for i in -1..=cols {
                for j in -1..=rows {
                    let x = i as f64 * col_pitch + x_off;
                    let y = j as f64 * row_pitch + y_off;

                    let metric_hex = create_hexagon(x, y, side_m);
                    let ring: Vec<Coord<f64>> = metric_hex
                        .exterior()
                        .coords()
                        .map(|c| {
                            let (lon, lat) = to_lonlat(c.x, c.y);
                            Coord { x: lon, y: lat }
                        })
                        .collect();

                    let (lon, lat) = to_lonlat(x, y);
                    cells.push(HexCell {
                        center: Point::new(lon, lat),
                        polygon: Polygon::new(LineString::from(ring), vec![]),
                    });
                }
            }
        }

        debug!("hex grid: {} cells at side {} m", cells.len(), side_m);
        Ok(Self { cells, side_m })
    }

    pub fn side_m(&self) -> f64 {
        self.side_m
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &HexCell> {
        self.cells.iter()
    }

    pub fn to_polygons(&self) -> Vec<Polygon<f64>> {
        self.cells.iter().map(|cell| cell.polygon.clone()).collect()
    }
}
