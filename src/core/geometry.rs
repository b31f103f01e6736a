use geo_types::{Coord, LineString, Point, Polygon};

/// Builds an axis-aligned rectangle around a center point as a closed ring,
/// counter-clockwise starting at the bottom-left corner.
pub fn create_rectangle(center_x: f64, center_y: f64, half_x: f64, half_y: f64) -> Polygon<f64> {
    let coords = vec![
        Coord {
            x: center_x - half_x,
            y: center_y - half_y,
        },
        Coord {
            x: center_x + half_x,
            y: center_y - half_y,
        },
        Coord {
            x: center_x + half_x,
            y: center_y + half_y,
        },
        Coord {
            x: center_x - half_x,
            y: center_y + half_y,
        },
        Coord {
            x: center_x - half_x,
            y: center_y - half_y,
        },
    ];

    Polygon::new(LineString::from(coords), vec![])
}

/// Builds a flat-top hexagon of circumradius `size` around a center point,
/// closed ring with 7 vertices.
pub fn create_hexagon(center_x: f64, center_y: f64, size: f64) -> Polygon<f64> {
    let mut coords = Vec::with_capacity(7);

    for i in 0..6 {
        let angle_rad = (i as f64 * 60.0).to_radians();
        let x = center_x + size * angle_rad.cos();
        let y = center_y + size * angle_rad.sin();
        coords.push(Coord { x, y });
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

/// Builds a flat-top hexagon around a `Point`.
pub fn create_hexagon_from_point(center: &Point<f64>, size: f64) -> Polygon<f64> {
    create_hexagon(center.x(), center.y(), size)
}
