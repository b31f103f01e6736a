pub mod cell;
pub mod csv;
pub mod grid;

pub use cell::GridCell;
pub use csv::{
    Crs, GeometryFormat, OdCsvConfig, TrajCsvConfig, WeightSource, load_zones, parse_time,
    read_od_csv, read_traj_csv, write_flows_csv, write_moves_csv, write_stays_csv,
    write_zone_flows_csv,
};
pub use grid::{HexCell, HexGrid, RectGrid, RectGridBuilder};
