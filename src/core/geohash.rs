use crate::core::constants::GEOHASH_BASE32;
use crate::core::geometry::create_rectangle;
use crate::util::error::TransgridError;
use geo_types::Polygon;

/// Encodes a WGS84 position into a geohash of `precision` characters.
///
/// Interleaved binary search over the longitude and latitude half-intervals,
/// alternating axes starting with longitude, 5 bits per base-32 character.
///
/// # Example
///
/// ```
/// use transgrid::geohash;
///
/// # fn main() -> Result<(), transgrid::TransgridError> {
/// let hash = geohash::encode(10.40744, 57.64911, 11)?;
/// assert_eq!(hash, "u4pruydqqvj");
/// # Ok(())
/// # }
/// ```
pub fn encode(lon: f64, lat: f64, precision: usize) -> Result<String, TransgridError> {
    if precision == 0 {
        return Err(TransgridError::InvalidPrecision(precision));
    }

    let mut lon_interval = (-180.0_f64, 180.0_f64);
    let mut lat_interval = (-90.0_f64, 90.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut ch: usize = 0;
    let mut bit = 0;

    while hash.len() < precision {
        if even_bit {
            let mid = (lon_interval.0 + lon_interval.1) / 2.0;
            if lon >= mid {
                ch = (ch << 1) | 1;
                lon_interval.0 = mid;
            } else {
                ch <<= 1;
                lon_interval.1 = mid;
            }
        } else {
            let mid = (lat_interval.0 + lat_interval.1) / 2.0;
            if lat >= mid {
                ch = (ch << 1) | 1;
                lat_interval.0 = mid;
            } else {
                ch <<= 1;
                lat_interval.1 = mid;
            }
        }
        even_bit = !even_bit;

        bit += 1;
        if bit == 5 {
            hash.push(GEOHASH_BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }

    Ok(hash)
}

/// Decodes a geohash into its interval center and half-width error bounds,
/// as `(lon, lat, lon_err, lat_err)`.
///
/// The encoded position lies within `lon_err` / `lat_err` of the returned
/// center along the respective axis.
pub fn decode_exactly(hash: &str) -> Result<(f64, f64, f64, f64), TransgridError> {
    let mut lon_interval = (-180.0_f64, 180.0_f64);
    let mut lat_interval = (-90.0_f64, 90.0_f64);
    let mut even_bit = true;

    for c in hash.chars() {
        let value = GEOHASH_BASE32
            .iter()
            .position(|&b| b as char == c)
            .ok_or(TransgridError::InvalidGeohash(c))?;

        for shift in (0..5).rev() {
            let is_set = (value >> shift) & 1 == 1;
            if even_bit {
                let mid = (lon_interval.0 + lon_interval.1) / 2.0;
                if is_set {
                    lon_interval.0 = mid;
                } else {
                    lon_interval.1 = mid;
                }
            } else {
                let mid = (lat_interval.0 + lat_interval.1) / 2.0;
                if is_set {
                    lat_interval.0 = mid;
                } else {
                    lat_interval.1 = mid;
                }
            }
            even_bit = !even_bit;
        }
    }

    let lon = (lon_interval.0 + lon_interval.1) / 2.0;
    let lat = (lat_interval.0 + lat_interval.1) / 2.0;
    let lon_err = (lon_interval.1 - lon_interval.0) / 2.0;
    let lat_err = (lat_interval.1 - lat_interval.0) / 2.0;

    Ok((lon, lat, lon_err, lat_err))
}

/// Decodes a geohash into a `(lon, lat)` center rounded to the number of
/// significant decimal digits implied by the error bounds.
pub fn decode(hash: &str) -> Result<(f64, f64), TransgridError> {
    let (lon, lat, lon_err, lat_err) = decode_exactly(hash)?;
    Ok((round_to_error(lon, lon_err), round_to_error(lat, lat_err)))
}

/// Reconstructs the bounding rectangle of a geohash as a closed polygon.
pub fn geohash_to_polygon(hash: &str) -> Result<Polygon<f64>, TransgridError> {
    let (lon, lat, lon_err, lat_err) = decode_exactly(hash)?;
    Ok(create_rectangle(lon, lat, lon_err, lat_err))
}

fn round_to_error(value: f64, err: f64) -> f64 {
    let digits = ((-err.log10()).round() as i32).max(1) - 1;
    if digits <= 0 {
        return value.round();
    }
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_vector() -> Result<(), TransgridError> {
        // 57.64911 N, 10.40744 E
        assert_eq!(encode(10.40744, 57.64911, 11)?, "u4pruydqqvj");
        assert_eq!(encode(10.40744, 57.64911, 5)?, "u4pru");
        Ok(())
    }

    #[test]
    fn test_encode_zero_precision() {
        assert!(matches!(
            encode(0.0, 0.0, 0),
            Err(TransgridError::InvalidPrecision(0))
        ));
    }

    #[test]
    fn test_decode_exactly_ezs42() -> Result<(), TransgridError> {
        let (lon, lat, lon_err, lat_err) = decode_exactly("ezs42")?;
        assert!((lon - (-5.60302734375)).abs() < 1e-12);
        assert!((lat - 42.60498046875).abs() < 1e-12);
        // 5 characters = 25 bits: 13 longitude, 12 latitude.
        assert!((lon_err - 180.0 / (1u64 << 13) as f64).abs() < 1e-12);
        assert!((lat_err - 90.0 / (1u64 << 12) as f64).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_decode_rounds_to_significant_digits() -> Result<(), TransgridError> {
        let (lon, lat) = decode("ezs42")?;
        assert_eq!(lon, -5.6);
        assert_eq!(lat, 42.6);
        Ok(())
    }

    #[test]
    fn test_round_trip_within_error() -> Result<(), TransgridError> {
        let samples = [
            (10.40744, 57.64911),
            (-5.603, 42.605),
            (113.8725, 22.5117),
            (-179.999, -89.999),
            (0.0, 0.0),
        ];
        for &(lon, lat) in &samples {
            for precision in 1..=12 {
                let hash = encode(lon, lat, precision)?;
                let (dlon, dlat, lon_err, lat_err) = decode_exactly(&hash)?;
                assert!(
                    (lon - dlon).abs() <= lon_err,
                    "lon off for {} at precision {}",
                    hash,
                    precision
                );
                assert!((lat - dlat).abs() <= lat_err);
            }
        }
        Ok(())
    }

    #[test]
    fn test_error_shrinks_with_precision() -> Result<(), TransgridError> {
        let hash = encode(113.8725, 22.5117, 12)?;
        let mut prev = f64::INFINITY;
        for precision in 1..=12 {
            let (_, _, lon_err, lat_err) = decode_exactly(&hash[..precision])?;
            let area = lon_err * lat_err;
            assert!(area < prev);
            prev = area;
        }
        Ok(())
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            decode_exactly("ez a2"),
            Err(TransgridError::InvalidGeohash(_))
        ));
    }

    #[test]
    fn test_geohash_polygon_contains_point() -> Result<(), TransgridError> {
        use geo::Contains;
        use geo_types::point;

        let hash = encode(113.8725, 22.5117, 7)?;
        let poly = geohash_to_polygon(&hash)?;
        assert_eq!(poly.exterior().coords().count(), 5);
        assert!(poly.contains(&point! { x: 113.8725, y: 22.5117 }));
        Ok(())
    }
}
