//! Closed-form conversions between the coordinate systems found in Chinese
//! transportation data: WGS84, GCJ02 (the state obfuscation applied by most
//! map providers), BD09 (Baidu's additional offset) and BD09MC (Baidu's
//! Mercator meters).
//!
//! All transforms take and return `(lon, lat)` pairs (or `(x, y)` meters for
//! BD09MC) and are infallible; positions outside mainland China pass through
//! the GCJ02 obfuscation unchanged.

use crate::core::constants::{KRASOVSKY_A, KRASOVSKY_EE, LL2MC, LL_BAND, MC2LL, MC_BAND, X_PI};
use geo_types::{Coord, LineString, Point, Polygon};
use std::f64::consts::PI;

/// Anything that exposes an x/y coordinate pair.
pub trait Coordinate {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
}

impl Coordinate for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }
    fn y(&self) -> f64 {
        self.1
    }
}

impl Coordinate for Point<f64> {
    fn x(&self) -> f64 {
        Point::x(*self)
    }
    fn y(&self) -> f64 {
        Point::y(*self)
    }
}

/// The GCJ02 obfuscation only applies inside mainland China.
fn out_of_china(lon: f64, lat: f64) -> bool {
    !((73.66..135.05).contains(&lon) && (3.86..53.55).contains(&lat))
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lon(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// GCJ02 offset of a WGS84 position, in degrees.
fn gcj_offset(lon: f64, lat: f64) -> (f64, f64) {
    let dlat = transform_lat(lon - 105.0, lat - 35.0);
    let dlon = transform_lon(lon - 105.0, lat - 35.0);
    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - KRASOVSKY_EE * rad_lat.sin() * rad_lat.sin();
    let sqrt_magic = magic.sqrt();
    let dlat = dlat * 180.0 / (KRASOVSKY_A * (1.0 - KRASOVSKY_EE) / (magic * sqrt_magic) * PI);
    let dlon = dlon * 180.0 / (KRASOVSKY_A / sqrt_magic * rad_lat.cos() * PI);
    (dlon, dlat)
}

/// WGS84 to GCJ02.
pub fn wgs84_to_gcj02(lon: f64, lat: f64) -> (f64, f64) {
    if out_of_china(lon, lat) {
        return (lon, lat);
    }
    let (dlon, dlat) = gcj_offset(lon, lat);
    (lon + dlon, lat + dlat)
}

/// GCJ02 to WGS84, first-order inverse: the offset is evaluated at the
/// GCJ02 position and subtracted, accurate to roughly a meter.
pub fn gcj02_to_wgs84(lon: f64, lat: f64) -> (f64, f64) {
    if out_of_china(lon, lat) {
        return (lon, lat);
    }
    let (glon, glat) = wgs84_to_gcj02(lon, lat);
    (lon * 2.0 - glon, lat * 2.0 - glat)
}

/// GCJ02 to BD09.
pub fn gcj02_to_bd09(lon: f64, lat: f64) -> (f64, f64) {
    let z = (lon * lon + lat * lat).sqrt() + 0.00002 * (lat * X_PI).sin();
    let theta = lat.atan2(lon) + 0.000003 * (lon * X_PI).cos();
    (z * theta.cos() + 0.0065, z * theta.sin() + 0.006)
}

/// BD09 to GCJ02.
pub fn bd09_to_gcj02(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon - 0.0065;
    let y = lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * X_PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * X_PI).cos();
    (z * theta.cos(), z * theta.sin())
}

/// WGS84 to BD09.
pub fn wgs84_to_bd09(lon: f64, lat: f64) -> (f64, f64) {
    let (glon, glat) = wgs84_to_gcj02(lon, lat);
    gcj02_to_bd09(glon, glat)
}

/// BD09 to WGS84.
pub fn bd09_to_wgs84(lon: f64, lat: f64) -> (f64, f64) {
    let (glon, glat) = bd09_to_gcj02(lon, lat);
    gcj02_to_wgs84(glon, glat)
}

/// Evaluates one Baidu piecewise polynomial on an (x, y) pair.
fn baidu_converter(x: f64, y: f64, cf: &[f64; 10]) -> (f64, f64) {
    let out_x = cf[0] + cf[1] * x.abs();
    let c = y.abs() / cf[9];
    let mut out_y = 0.0;
    let mut power = 1.0;
    for coef in &cf[2..9] {
        out_y += coef * power;
        power *= c;
    }
    (out_x.copysign(x), out_y.copysign(y))
}

/// Baidu Mercator meters (BD09MC) to BD09 lon/lat.
pub fn bd09mc_to_bd09(x: f64, y: f64) -> (f64, f64) {
    let band = MC_BAND
        .iter()
        .position(|&edge| y.abs() >= edge)
        .unwrap_or(MC_BAND.len() - 1);
    baidu_converter(x, y, &MC2LL[band])
}

/// BD09 lon/lat to Baidu Mercator meters (BD09MC).
pub fn bd09_to_bd09mc(lon: f64, lat: f64) -> (f64, f64) {
    // The forward tables only cover |lat| <= 74.
    let lat = lat.clamp(-74.0, 74.0);
    let band = LL_BAND
        .iter()
        .position(|&edge| lat.abs() >= edge)
        .unwrap_or(LL_BAND.len() - 1);
    baidu_converter(lon, lat, &LL2MC[band])
}

/// Applies a coordinate transform to every vertex of a line.
pub fn convert_line(line: &LineString<f64>, transform: impl Fn(f64, f64) -> (f64, f64)) -> LineString<f64> {
    LineString::from(
        line.coords()
            .map(|c| {
                let (x, y) = transform(c.x, c.y);
                Coord { x, y }
            })
            .collect::<Vec<_>>(),
    )
}

/// Applies a coordinate transform to every vertex of a polygon, exterior and
/// interior rings alike.
pub fn convert_polygon(
    polygon: &Polygon<f64>,
    transform: impl Fn(f64, f64) -> (f64, f64),
) -> Polygon<f64> {
    Polygon::new(
        convert_line(polygon.exterior(), &transform),
        polygon
            .interiors()
            .iter()
            .map(|ring| convert_line(ring, &transform))
            .collect(),
    )
}
