//! # transgrid
//!
//! Spatio-temporal analysis of mobility data: grid indexing, trajectory
//! cleaning, stay/move detection and origin-destination aggregation.
//!
//! ### 1. `GridParams` - Rectangular Grid Indexing
//!
//! ```
//! use transgrid::{GridParams, gps_to_grid, grid_to_centre};
//!
//! # fn main() -> Result<(), transgrid::TransgridError> {
//! // 500 m grid over the Shenzhen bounding box
//! let params = GridParams::from_bounds([113.75, 22.4, 114.62, 22.86], 500.0)?;
//! let (col, row) = gps_to_grid(113.8725, 22.5117, &params);
//! let (lon, lat) = grid_to_centre(col, row, &params);
//! assert_eq!(gps_to_grid(lon, lat, &params), (col, row));
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. Trajectory Cleaning and Stay/Move Detection
//!
//! ```
//! use transgrid::{GridParams, TrajPoint, clean_drift, stay_move};
//!
//! # fn main() -> Result<(), transgrid::TransgridError> {
//! let params = GridParams::from_bounds([113.75, 22.4, 114.62, 22.86], 500.0)?;
//! let points = vec![
//!     TrajPoint::new("v1", 0.0, 113.8725, 22.5117),
//!     TrajPoint::new("v1", 60.0, 113.8727, 22.5118),
//!     TrajPoint::new("v1", 3600.0, 113.8726, 22.5117),
//!     TrajPoint::new("v1", 3660.0, 113.9300, 22.5700),
//! ];
//! let cleaned = clean_drift(&points, Some(80.0), None);
//! let (stays, moves) = stay_move(&cleaned, &params, 1800.0);
//! assert_eq!(stays.len(), 1);
//! assert!(moves.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. OD Aggregation
//!
//! ```
//! use transgrid::{GridParams, OdRecord, odagg_grid};
//!
//! # fn main() -> Result<(), transgrid::TransgridError> {
//! let params = GridParams::from_bounds([113.75, 22.4, 114.62, 22.86], 500.0)?;
//! let records = vec![
//!     OdRecord::new(113.80, 22.55, 114.05, 22.61),
//!     OdRecord::new(113.80, 22.55, 114.05, 22.61),
//! ];
//! let flows = odagg_grid(&records, &params, None)?;
//! assert_eq!(flows.len(), 1);
//! assert_eq!(flows[0].weight, 2.0);
//! # Ok(())
//! # }
//! ```
//!
//! ### 4. CSV Workflows
//!
//! Read trajectory or OD tables with configurable column names, converting
//! GCJ02/BD09 coordinates to WGS84 on the way in:
//!
//! ```no_run
//! use transgrid::{Crs, TrajCsvConfig, read_traj_csv};
//!
//! let config = TrajCsvConfig::new("VehicleNum", "Time", "Lng", "Lat").crs(Crs::Gcj02);
//! let points = read_traj_csv("taxi.csv", &config).unwrap();
//! ```

pub mod api;
pub mod coord;
pub mod core;
pub mod od;
pub mod traj;
pub mod util;

pub use api::{
    Crs, GeometryFormat, GridCell, HexCell, HexGrid, OdCsvConfig, RectGrid, RectGridBuilder,
    TrajCsvConfig, WeightSource, load_zones, parse_time, read_od_csv, read_traj_csv,
    write_flows_csv, write_moves_csv, write_stays_csv, write_zone_flows_csv,
};
pub use coord::{
    Coordinate, bd09_to_bd09mc, bd09_to_gcj02, bd09_to_wgs84, bd09mc_to_bd09, convert_line,
    convert_polygon, gcj02_to_bd09, gcj02_to_wgs84, wgs84_to_bd09, wgs84_to_gcj02,
};
pub use core::geohash;
pub use core::{
    DEFAULT_ACTIVITY_THRESHOLD, GRID_EARTH_RADIUS, GridParams, create_hexagon,
    create_hexagon_from_point, create_rectangle, gps_to_grid, grid_to_centre, grid_to_polygon,
};
pub use od::{
    ArrowStyle, BikeEvent, BikeMove, BikeStop, GridFlow, OdRecord, ZoneFlow, bike_to_od,
    odagg_grid, odagg_shape,
};
pub use traj::{Move, Stay, TrajPoint, clean_drift, clean_same, clean_same_by, stay_move};
pub use util::TransgridError;

pub use geo_types;

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{MultiPolygon, polygon};

    fn shenzhen_params() -> GridParams {
        GridParams::from_bounds([113.75, 22.4, 114.62, 22.86], 500.0).unwrap()
    }

    #[test]
    fn test_end_to_end_taxi_workflow() -> Result<(), TransgridError> {
        let params = shenzhen_params();

        // One vehicle: a long stay with a stationary run and a drift spike,
        // a brief transit cell, a second stay, then a final relocation so
        // the second stay has an observed end.
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.8725, 22.5117),
            TrajPoint::new("v1", 600.0, 113.8726, 22.5118),
            TrajPoint::new("v1", 610.0, 114.5000, 22.8000), // drift
            TrajPoint::new("v1", 620.0, 113.8727, 22.5117),
            TrajPoint::new("v1", 1200.0, 113.8726, 22.5118),
            TrajPoint::new("v1", 1600.0, 113.8726, 22.5118),
            TrajPoint::new("v1", 2000.0, 113.8726, 22.5118),
            TrajPoint::new("v1", 2400.0, 113.9000, 22.5500),
            TrajPoint::new("v1", 2700.0, 113.9300, 22.5700),
            TrajPoint::new("v1", 8000.0, 113.9301, 22.5701),
            TrajPoint::new("v1", 9000.0, 113.8000, 22.5000),
        ];

        let deduped = clean_same(&points);
        assert_eq!(deduped.len(), points.len() - 1);

        let cleaned = clean_drift(&deduped, Some(120.0), None);
        assert_eq!(cleaned.len(), deduped.len() - 1);
        assert!(cleaned.iter().all(|p| p.lon < 114.0));

        let (stays, moves) = stay_move(&cleaned, &params, 1800.0);
        assert_eq!(stays.len(), 2);
        assert_eq!(moves.len(), 1);
        // The 300 s transit cell was filtered; the move absorbs it.
        assert_eq!(moves[0].stime, 2400.0);
        assert_eq!(moves[0].etime, 2700.0);
        assert_eq!(moves[0].stime, stays[0].etime);
        assert_eq!(moves[0].etime, stays[1].stime);
        Ok(())
    }

    #[test]
    fn test_stays_feed_od_aggregation() -> Result<(), TransgridError> {
        let params = shenzhen_params();

        let records: Vec<OdRecord> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    OdRecord::new(113.80, 22.55, 114.05, 22.61)
                } else {
                    OdRecord::new(114.05, 22.61, 113.80, 22.55)
                }
            })
            .collect();

        let flows = odagg_grid(&records, &params, None)?;
        assert_eq!(flows.len(), 2);
        let total: f64 = flows.iter().map(|f| f.weight).sum();
        assert_eq!(total, 10.0);
        // Each direction is its own flow.
        assert_ne!(
            (flows[0].scol, flows[0].srow),
            (flows[1].scol, flows[1].srow)
        );
        Ok(())
    }

    #[test]
    fn test_zone_aggregation_workflow() -> Result<(), TransgridError> {
        let west: MultiPolygon<f64> = polygon![
            (x: 113.60, y: 22.40), (x: 114.10, y: 22.40),
            (x: 114.10, y: 22.90), (x: 113.60, y: 22.90),
            (x: 113.60, y: 22.40),
        ]
        .into();
        let east: MultiPolygon<f64> = polygon![
            (x: 114.10, y: 22.40), (x: 114.70, y: 22.40),
            (x: 114.70, y: 22.90), (x: 114.10, y: 22.90),
            (x: 114.10, y: 22.40),
        ]
        .into();
        let zones = vec![("west".to_string(), west), ("east".to_string(), east)];

        let records = vec![
            OdRecord::new(113.80, 22.55, 114.30, 22.60),
            OdRecord::new(113.85, 22.50, 114.35, 22.65),
        ];
        let flows = odagg_shape(&records, &zones, None, None)?;
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].origin_zone, "west");
        assert_eq!(flows[0].dest_zone, "east");
        assert_eq!(flows[0].weight, 2.0);
        Ok(())
    }

    #[test]
    fn test_grid_builder_workflow() -> Result<(), TransgridError> {
        let grid = RectGrid::builder()
            .bounds([113.75, 22.4, 113.80, 22.45])
            .accuracy(500.0)
            .build()?;

        assert!(!grid.is_empty());
        let cell = grid.get_cell_at(&geo_types::point! { x: 113.77, y: 22.42 });
        assert!(cell.is_some());
        let cell = cell.unwrap();
        let polygon = cell.to_polygon();
        assert_eq!(polygon.exterior().coords().count(), 5);
        Ok(())
    }

    #[test]
    fn test_geohash_matches_grid_region() -> Result<(), TransgridError> {
        let hash = geohash::encode(113.8725, 22.5117, 7)?;
        assert_eq!(hash.len(), 7);
        let (lon, lat) = geohash::decode(&hash)?;
        assert!((lon - 113.8725).abs() < 0.01);
        assert!((lat - 22.5117).abs() < 0.01);
        Ok(())
    }

    #[test]
    fn test_coordinate_round_trips_stay_local() {
        let (lon, lat) = (113.8725, 22.5117);
        let (glon, glat) = wgs84_to_gcj02(lon, lat);
        let (blon, blat) = gcj02_to_bd09(glon, glat);
        let (rlon, rlat) = bd09_to_wgs84(blon, blat);
        assert!((rlon - lon).abs() < 1e-4);
        assert!((rlat - lat).abs() < 1e-4);
    }
}
