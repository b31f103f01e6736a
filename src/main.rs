use transgrid::{GridCell, GridParams, TransgridError, geohash};

fn main() -> Result<(), TransgridError> {
    let lon = 113.87250012;
    let lat = 22.51170232;

    let params = GridParams::from_bounds([113.75, 22.4, 114.62, 22.86], 500.0)?;
    let cell = GridCell::from_gps(lon, lat, &params);

    println!("Col: {}, Row: {}", cell.col, cell.row);
    println!("Center: ({}, {})", cell.lon(), cell.lat());

    let polygon = cell.to_polygon();
    println!("Polygon: {:?}", polygon);

    let hash = geohash::encode(lon, lat, 9)?;
    println!("Geohash: {}", hash);

    Ok(())
}
