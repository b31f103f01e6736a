use crate::traj::{TrajPoint, sort_by_entity_time};
use geo::{Distance, Haversine, Point};
use log::debug;

/// Collapses stationary runs to their first and last sample.
///
/// A point is dropped iff its coordinates are identical to both its
/// immediate predecessor and successor within the same entity, so run
/// boundaries are preserved. Idempotent.
pub fn clean_same(points: &[TrajPoint]) -> Vec<TrajPoint> {
    clean_same_by(points, |p| (p.lon.to_bits(), p.lat.to_bits()))
}

/// [`clean_same`] with a caller-supplied key, for tracking extra attributes
/// beyond the coordinates (e.g. passenger state of a taxi).
pub fn clean_same_by<K: PartialEq>(
    points: &[TrajPoint],
    key: impl Fn(&TrajPoint) -> K,
) -> Vec<TrajPoint> {
    let mut sorted = points.to_vec();
    sort_by_entity_time(&mut sorted);

    let mut kept = Vec::with_capacity(sorted.len());
    for i in 0..sorted.len() {
        let interior_dup = i > 0
            && i + 1 < sorted.len()
            && sorted[i - 1].entity == sorted[i].entity
            && sorted[i + 1].entity == sorted[i].entity
            && key(&sorted[i]) == key(&sorted[i - 1])
            && key(&sorted[i]) == key(&sorted[i + 1]);
        if !interior_dup {
            kept.push(sorted[i].clone());
        }
    }

    debug!(
        "clean_same: {} of {} points kept",
        kept.len(),
        sorted.len()
    );
    kept
}

/// Removes statistically drifting fixes: an interior point is a drift spike
/// iff going through it is implausibly fast (or far) in both directions
/// while skipping it is plausible.
///
/// Speeds are great-circle distance over elapsed time, in km/h. Each
/// criterion applies only when its limit is supplied; entity-boundary
/// points are never removed.
pub fn clean_drift(
    points: &[TrajPoint],
    speed_limit_kmh: Option<f64>,
    dist_limit_m: Option<f64>,
) -> Vec<TrajPoint> {
    let mut sorted = points.to_vec();
    sort_by_entity_time(&mut sorted);

    let mut kept = Vec::with_capacity(sorted.len());
    for i in 0..sorted.len() {
        if !(i > 0
            && i + 1 < sorted.len()
            && sorted[i - 1].entity == sorted[i].entity
            && sorted[i + 1].entity == sorted[i].entity)
        {
            kept.push(sorted[i].clone());
            continue;
        }

        let (prev, cur, next) = (&sorted[i - 1], &sorted[i], &sorted[i + 1]);
        let d_in = haversine_m(prev, cur);
        let d_out = haversine_m(cur, next);
        let d_skip = haversine_m(prev, next);

        let mut drift = false;
        if let Some(limit) = dist_limit_m {
            drift |= d_in > limit && d_out > limit && d_skip < limit;
        }
        if let Some(limit) = speed_limit_kmh {
            let v_in = speed_kmh(d_in, cur.time - prev.time);
            let v_out = speed_kmh(d_out, next.time - cur.time);
            let v_skip = speed_kmh(d_skip, next.time - prev.time);
            drift |= v_in > limit && v_out > limit && v_skip < limit;
        }

        if !drift {
            kept.push(cur.clone());
        }
    }

    debug!(
        "clean_drift: {} of {} points kept",
        kept.len(),
        sorted.len()
    );
    kept
}

fn haversine_m(a: &TrajPoint, b: &TrajPoint) -> f64 {
    Haversine::distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

fn speed_kmh(dist_m: f64, dt_s: f64) -> f64 {
    dist_m / dt_s * 3.6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stationary_run() -> Vec<TrajPoint> {
        vec![
            TrajPoint::new("v1", 0.0, 113.80, 22.50),
            TrajPoint::new("v1", 10.0, 113.81, 22.50),
            TrajPoint::new("v1", 20.0, 113.81, 22.50),
            TrajPoint::new("v1", 30.0, 113.81, 22.50),
            TrajPoint::new("v1", 40.0, 113.81, 22.50),
            TrajPoint::new("v1", 50.0, 113.82, 22.50),
        ]
    }

    #[test]
    fn test_clean_same_collapses_runs_to_boundaries() {
        let cleaned = clean_same(&stationary_run());
        // The four identical fixes collapse to their first and last.
        assert_eq!(cleaned.len(), 4);
        assert_eq!(cleaned[1].time, 10.0);
        assert_eq!(cleaned[2].time, 40.0);
    }

    #[test]
    fn test_clean_same_idempotent() {
        let once = clean_same(&stationary_run());
        let twice = clean_same(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_same_respects_entity_boundaries() {
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.8, 22.5),
            TrajPoint::new("v1", 10.0, 113.8, 22.5),
            TrajPoint::new("v2", 20.0, 113.8, 22.5),
            TrajPoint::new("v2", 30.0, 113.8, 22.5),
        ];
        // No point has two same-entity neighbors with identical coordinates.
        assert_eq!(clean_same(&points).len(), 4);
    }

    #[test]
    fn test_clean_same_by_extra_attribute() {
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.8, 22.5),
            TrajPoint::new("v1", 10.0, 113.8, 22.5),
            TrajPoint::new("v1", 20.0, 113.8, 22.5),
        ];
        // Keying on time makes every point distinct.
        let cleaned = clean_same_by(&points, |p| p.time.to_bits());
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_clean_drift_removes_spike() {
        // Steady eastward drive at ~40 km/h with one fix thrown ~5 km north.
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.800, 22.500),
            TrajPoint::new("v1", 60.0, 113.806, 22.500),
            TrajPoint::new("v1", 120.0, 113.812, 22.545),
            TrajPoint::new("v1", 180.0, 113.818, 22.500),
            TrajPoint::new("v1", 240.0, 113.824, 22.500),
        ];
        let cleaned = clean_drift(&points, Some(80.0), None);
        assert_eq!(cleaned.len(), 4);
        assert!(cleaned.iter().all(|p| p.time != 120.0));
    }

    #[test]
    fn test_clean_drift_distance_criterion() {
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.800, 22.500),
            TrajPoint::new("v1", 60.0, 113.806, 22.545),
            TrajPoint::new("v1", 120.0, 113.812, 22.500),
        ];
        let cleaned = clean_drift(&points, None, Some(2000.0));
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_clean_drift_keeps_boundary_points() {
        // A genuine spike placed first and last is not eligible for removal.
        let points = vec![
            TrajPoint::new("v1", 0.0, 113.800, 22.545),
            TrajPoint::new("v1", 60.0, 113.806, 22.500),
            TrajPoint::new("v1", 120.0, 113.812, 22.500),
            TrajPoint::new("v1", 180.0, 113.818, 22.545),
        ];
        let cleaned = clean_drift(&points, Some(80.0), Some(1000.0));
        assert_eq!(cleaned.first().unwrap().time, 0.0);
        assert_eq!(cleaned.last().unwrap().time, 180.0);
    }

    #[test]
    fn test_clean_drift_no_limits_is_identity() {
        let points = stationary_run();
        assert_eq!(clean_drift(&points, None, None), points);
    }
}
