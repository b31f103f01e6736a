//! Trajectory cleaning and stay/move segmentation for per-entity GPS point
//! sequences.

pub mod clean;
pub mod staymove;

pub use clean::{clean_drift, clean_same, clean_same_by};
pub use staymove::{Move, Stay, stay_move};

use serde::{Deserialize, Serialize};

/// One GPS fix of a tracked entity (vehicle, phone, bike).
///
/// Time is carried as epoch seconds; the CSV layer handles parsing calendar
/// timestamps into this form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajPoint {
    /// Identifier of the tracked entity.
    pub entity: String,
    /// Timestamp in epoch seconds.
    pub time: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Latitude in WGS84 degrees.
    pub lat: f64,
}

impl TrajPoint {
    pub fn new(entity: impl Into<String>, time: f64, lon: f64, lat: f64) -> Self {
        Self {
            entity: entity.into(),
            time,
            lon,
            lat,
        }
    }
}

/// Stable sort by (entity, time). All trajectory functions sort their input
/// through this before processing, so callers need not pre-sort; points with
/// duplicate timestamps keep their input order.
pub(crate) fn sort_by_entity_time(points: &mut [TrajPoint]) {
    points.sort_by(|a, b| {
        a.entity
            .cmp(&b.entity)
            .then_with(|| a.time.total_cmp(&b.time))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_stable_for_duplicate_timestamps() {
        let mut points = vec![
            TrajPoint::new("b", 10.0, 1.0, 1.0),
            TrajPoint::new("a", 10.0, 2.0, 2.0),
            TrajPoint::new("a", 10.0, 3.0, 3.0),
            TrajPoint::new("a", 5.0, 4.0, 4.0),
        ];
        sort_by_entity_time(&mut points);

        assert_eq!(points[0].lon, 4.0);
        // Ties keep input order.
        assert_eq!(points[1].lon, 2.0);
        assert_eq!(points[2].lon, 3.0);
        assert_eq!(points[3].entity, "b");
    }
}
