pub mod constants;
pub mod geohash;
pub mod geometry;
pub mod grid;

pub use constants::{DEFAULT_ACTIVITY_THRESHOLD, GRID_EARTH_RADIUS};
pub use geometry::{create_hexagon, create_hexagon_from_point, create_rectangle};
pub use grid::{GridParams, gps_to_grid, grid_to_centre, grid_to_polygon};
