use crate::core::constants::GRID_EARTH_RADIUS;
use crate::core::geometry::create_rectangle;
use crate::util::error::TransgridError;
use geo_types::Polygon;
use std::f64::consts::PI;

/// Parameters of a rectangular lon/lat lattice.
///
/// The lattice is anchored at the south-west corner of the study area and
/// extends over the whole integer plane: points outside the original bounds
/// simply map to negative or large cell indices.
///
/// Cell sizes are angular steps derived from a target edge length in meters
/// using a spherical earth; the metric size is exact only at the bounds'
/// mean latitude.
///
/// # Example
///
/// ```
/// use transgrid::GridParams;
///
/// # fn main() -> Result<(), transgrid::TransgridError> {
/// let params = GridParams::from_bounds([113.6, 22.4, 114.8, 22.9], 500.0)?;
/// assert!((params.delta_lat - 0.0044966).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    /// Longitude of the lattice origin (cell (0, 0) center).
    pub origin_lon: f64,
    /// Latitude of the lattice origin (cell (0, 0) center).
    pub origin_lat: f64,
    /// Angular cell width in degrees of longitude.
    pub delta_lon: f64,
    /// Angular cell height in degrees of latitude.
    pub delta_lat: f64,
}

impl GridParams {
    /// Derives lattice parameters from `bounds = [lon_min, lat_min, lon_max,
    /// lat_max]` and a target cell edge length in meters.
    ///
    /// Bounds given in the wrong order are normalized via min/max; zero-area
    /// bounds are accepted and produce a one-cell lattice. A non-positive or
    /// non-finite `accuracy` is rejected.
    pub fn from_bounds(bounds: [f64; 4], accuracy: f64) -> Result<Self, TransgridError> {
        if !(accuracy > 0.0 && accuracy.is_finite()) {
            return Err(TransgridError::InvalidAccuracy(accuracy));
        }
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(TransgridError::InvalidBounds(format!("{:?}", bounds)));
        }

        let (lon_min, lon_max) = (bounds[0].min(bounds[2]), bounds[0].max(bounds[2]));
        let (lat_min, lat_max) = (bounds[1].min(bounds[3]), bounds[1].max(bounds[3]));

        let delta_lat = accuracy * 360.0 / (2.0 * PI * GRID_EARTH_RADIUS);
        // Longitude step widened by the meridian convergence at the mean
        // latitude so cells stay approximately square in meters.
        let delta_lon = delta_lat / (PI * (lat_min + lat_max) / 360.0).cos();

        Ok(Self {
            origin_lon: lon_min,
            origin_lat: lat_min,
            delta_lon,
            delta_lat,
        })
    }

    /// Normalized extent of the bounds this lattice was built from is not
    /// retained; the lattice itself is unbounded. This returns the origin as
    /// a `(lon, lat)` pair.
    pub fn origin(&self) -> (f64, f64) {
        (self.origin_lon, self.origin_lat)
    }
}

/// Maps a GPS position to the `(col, row)` of the cell containing it.
///
/// Quantizing and many-to-one: every point inside a cell maps to the same
/// id. There is no clipping; callers indexing points outside their study
/// area get out-of-range indices back, not an error.
pub fn gps_to_grid(lon: f64, lat: f64, params: &GridParams) -> (i64, i64) {
    let col = ((lon - (params.origin_lon - params.delta_lon / 2.0)) / params.delta_lon).floor();
    let row = ((lat - (params.origin_lat - params.delta_lat / 2.0)) / params.delta_lat).floor();
    (col as i64, row as i64)
}

/// Reconstructs the center coordinate of a cell.
///
/// Exact inverse of [`gps_to_grid`] through the center:
/// `gps_to_grid(grid_to_centre(c)) == c` for any cell id.
pub fn grid_to_centre(col: i64, row: i64, params: &GridParams) -> (f64, f64) {
    (
        params.origin_lon + col as f64 * params.delta_lon,
        params.origin_lat + row as f64 * params.delta_lat,
    )
}

/// Builds the axis-aligned rectangle of a cell as a closed ring, counter-
/// clockwise from the bottom-left corner.
pub fn grid_to_polygon(col: i64, row: i64, params: &GridParams) -> Polygon<f64> {
    let (lon, lat) = grid_to_centre(col, row, params);
    create_rectangle(lon, lat, params.delta_lon / 2.0, params.delta_lat / 2.0)
}
