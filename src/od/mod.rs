//! Origin-destination aggregation: endpoint pairs are binned to grid cells
//! or polygon zones and merged into weighted flow geometries.

pub mod bike;

pub use bike::{BikeEvent, BikeMove, BikeStop, bike_to_od};

use crate::core::grid::{GridParams, gps_to_grid, grid_to_centre};
use crate::util::error::TransgridError;
use geo::{BoundingRect, Centroid, Contains};
use geo_types::{LineString, MultiLineString, MultiPolygon, Point, Rect};
use log::debug;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// One origin-destination pair with an attached trip count.
#[derive(Debug, Clone, PartialEq)]
pub struct OdRecord {
    pub origin: Point<f64>,
    pub dest: Point<f64>,
    /// Trip weight; one trip per record unless set otherwise.
    pub weight: f64,
}

impl OdRecord {
    pub fn new(origin_lon: f64, origin_lat: f64, dest_lon: f64, dest_lat: f64) -> Self {
        Self {
            origin: Point::new(origin_lon, origin_lat),
            dest: Point::new(dest_lon, dest_lat),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Arrowhead ornament for flow lines: two short segments rotated away from
/// the reverse bearing, meeting at a point along the line. Pure rendering
/// decoration; grouping never looks at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowStyle {
    /// Position of the arrowhead along the line, `0.0..=1.0`.
    pub pos: f64,
    /// Angle between each barb and the reverse bearing, degrees.
    pub theta_deg: f64,
    /// Barb length as a fraction of the line length.
    pub length_frac: f64,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            pos: 0.5,
            theta_deg: 30.0,
            length_frac: 0.1,
        }
    }
}

/// Aggregate flow between two grid cells.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFlow {
    pub scol: i64,
    pub srow: i64,
    pub ecol: i64,
    pub erow: i64,
    /// Summed weight of all records in this cell pair.
    pub weight: f64,
    /// Straight line between the cell centers; three parts when an
    /// arrowhead is requested.
    pub geometry: MultiLineString<f64>,
}

/// Aggregate flow between two named polygon zones.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneFlow {
    pub origin_zone: String,
    pub dest_zone: String,
    pub weight: f64,
    /// Straight line between the zone centroids.
    pub geometry: MultiLineString<f64>,
}

/// Grid-indexes both endpoints of every record, sums weights per
/// `(origin cell, destination cell)` pair, and emits one line per pair
/// between the cell centers.
///
/// Output is sorted ascending by weight so that, drawn in order, heavy
/// flows overprint light ones. Every input weight lands in exactly one
/// output flow.
pub fn odagg_grid(
    records: &[OdRecord],
    params: &GridParams,
    arrow: Option<ArrowStyle>,
) -> Result<Vec<GridFlow>, TransgridError> {
    if records.is_empty() {
        return Err(TransgridError::EmptyInput("OD records"));
    }

    let mut groups: BTreeMap<(i64, i64, i64, i64), f64> = BTreeMap::new();
    for rec in records {
        let (scol, srow) = gps_to_grid(rec.origin.x(), rec.origin.y(), params);
        let (ecol, erow) = gps_to_grid(rec.dest.x(), rec.dest.y(), params);
        *groups.entry((scol, srow, ecol, erow)).or_insert(0.0) += rec.weight;
    }

    let mut flows: Vec<GridFlow> = groups
        .into_iter()
        .map(|((scol, srow, ecol, erow), weight)| {
            let (slon, slat) = grid_to_centre(scol, srow, params);
            let (elon, elat) = grid_to_centre(ecol, erow, params);
            GridFlow {
                scol,
                srow,
                ecol,
                erow,
                weight,
                geometry: flow_geometry(
                    Point::new(slon, slat),
                    Point::new(elon, elat),
                    arrow.as_ref(),
                ),
            }
        })
        .collect();
    flows.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    debug!("odagg_grid: {} records -> {} flows", records.len(), flows.len());
    Ok(flows)
}

/// Aggregates OD records between polygon zones via a point-in-polygon join.
///
/// With `prebin`, endpoints are first snapped to grid cells and only the
/// distinct occupied cell centers are joined to zones, which cuts the join
/// candidate count for large point volumes; the final grouping is
/// semantically identical. Records whose endpoint falls in no zone are
/// dropped.
pub fn odagg_shape(
    records: &[OdRecord],
    zones: &[(String, MultiPolygon<f64>)],
    prebin: Option<&GridParams>,
    arrow: Option<ArrowStyle>,
) -> Result<Vec<ZoneFlow>, TransgridError> {
    if records.is_empty() {
        return Err(TransgridError::EmptyInput("OD records"));
    }
    if zones.is_empty() {
        return Err(TransgridError::EmptyInput("zones"));
    }

    let index = ZoneIndex::build(zones);

    let mut groups: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    match prebin {
        None => {
            for rec in records {
                let (Some(o), Some(d)) = (index.locate(&rec.origin), index.locate(&rec.dest))
                else {
                    continue;
                };
                *groups.entry((o, d)).or_insert(0.0) += rec.weight;
            }
        }
        Some(params) => {
            // Join each distinct occupied cell once, then route records
            // through the cell lookup.
            let mut cell_zone: BTreeMap<(i64, i64), Option<usize>> = BTreeMap::new();
            let mut zone_of = |pt: &Point<f64>| -> Option<usize> {
                let cell = gps_to_grid(pt.x(), pt.y(), params);
                *cell_zone.entry(cell).or_insert_with(|| {
                    let (lon, lat) = grid_to_centre(cell.0, cell.1, params);
                    index.locate(&Point::new(lon, lat))
                })
            };
            for rec in records {
                let (Some(o), Some(d)) = (zone_of(&rec.origin), zone_of(&rec.dest)) else {
                    continue;
                };
                *groups.entry((o, d)).or_insert(0.0) += rec.weight;
            }
        }
    }

    let mut flows: Vec<ZoneFlow> = groups
        .into_iter()
        .filter_map(|((o, d), weight)| {
            let from = zones[o].1.centroid()?;
            let to = zones[d].1.centroid()?;
            Some(ZoneFlow {
                origin_zone: zones[o].0.clone(),
                dest_zone: zones[d].0.clone(),
                weight,
                geometry: flow_geometry(from, to, arrow.as_ref()),
            })
        })
        .collect();
    flows.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    debug!(
        "odagg_shape: {} records, {} zones -> {} flows",
        records.len(),
        zones.len(),
        flows.len()
    );
    Ok(flows)
}

/// Zones with precomputed bounding rectangles for a cheap containment
/// pre-check.
struct ZoneIndex<'a> {
    zones: &'a [(String, MultiPolygon<f64>)],
    bboxes: Vec<Option<Rect<f64>>>,
}

impl<'a> ZoneIndex<'a> {
    fn build(zones: &'a [(String, MultiPolygon<f64>)]) -> Self {
        let bboxes = zones.iter().map(|(_, mp)| mp.bounding_rect()).collect();
        Self { zones, bboxes }
    }

    /// Index of the first zone containing the point. Overlapping zones
    /// resolve to the earlier one in the input order.
    fn locate(&self, pt: &Point<f64>) -> Option<usize> {
        self.zones.iter().enumerate().find_map(|(i, (_, mp))| {
            let bbox = self.bboxes[i]?;
            if bbox.contains(pt) && mp.contains(pt) {
                Some(i)
            } else {
                None
            }
        })
    }
}

/// Line between two representative points, optionally with an arrowhead.
fn flow_geometry(o: Point<f64>, d: Point<f64>, arrow: Option<&ArrowStyle>) -> MultiLineString<f64> {
    let main = LineString::from(vec![(o.x(), o.y()), (d.x(), d.y())]);
    let Some(style) = arrow else {
        return MultiLineString::new(vec![main]);
    };

    let dx = d.x() - o.x();
    let dy = d.y() - o.y();
    let line_len = (dx * dx + dy * dy).sqrt();
    let tip = (o.x() + style.pos * dx, o.y() + style.pos * dy);
    let back = dy.atan2(dx) + PI;
    let theta = style.theta_deg.to_radians();
    let barb_len = style.length_frac * line_len;

    let barb = |angle: f64| {
        LineString::from(vec![
            tip,
            (
                tip.0 + barb_len * angle.cos(),
                tip.1 + barb_len * angle.sin(),
            ),
        ])
    };

    MultiLineString::new(vec![main, barb(back + theta), barb(back - theta)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn params() -> GridParams {
        GridParams::from_bounds([113.6, 22.4, 114.8, 22.9], 500.0).unwrap()
    }

    fn sample_records() -> Vec<OdRecord> {
        vec![
            OdRecord::new(113.70, 22.55, 113.80, 22.60),
            OdRecord::new(113.70, 22.55, 113.80, 22.60),
            OdRecord::new(113.74, 22.50, 113.80, 22.60).with_weight(3.0),
        ]
    }

    #[test]
    fn test_odagg_grid_groups_and_sums() -> Result<(), TransgridError> {
        let flows = odagg_grid(&sample_records(), &params(), None)?;
        assert_eq!(flows.len(), 2);
        // Ascending by weight.
        assert_eq!(flows[0].weight, 2.0);
        assert_eq!(flows[1].weight, 3.0);
        Ok(())
    }

    #[test]
    fn test_odagg_grid_conserves_weight() -> Result<(), TransgridError> {
        let records = sample_records();
        let flows = odagg_grid(&records, &params(), None)?;
        let input: f64 = records.iter().map(|r| r.weight).sum();
        let output: f64 = flows.iter().map(|f| f.weight).sum();
        assert!((input - output).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_odagg_grid_empty_input() {
        assert!(matches!(
            odagg_grid(&[], &params(), None),
            Err(TransgridError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_odagg_grid_line_connects_cell_centers() -> Result<(), TransgridError> {
        let p = params();
        let flows = odagg_grid(&sample_records(), &p, None)?;
        let flow = &flows[1];
        let (slon, slat) = grid_to_centre(flow.scol, flow.srow, &p);
        let line = &flow.geometry.0[0];
        assert_eq!(line.0[0].x, slon);
        assert_eq!(line.0[0].y, slat);
        Ok(())
    }

    #[test]
    fn test_arrow_adds_two_barbs() -> Result<(), TransgridError> {
        let flows = odagg_grid(&sample_records(), &params(), Some(ArrowStyle::default()))?;
        for flow in &flows {
            assert_eq!(flow.geometry.0.len(), 3);
            let main = &flow.geometry.0[0];
            let mid = (
                (main.0[0].x + main.0[1].x) / 2.0,
                (main.0[0].y + main.0[1].y) / 2.0,
            );
            // Default pos 0.5: both barbs start at the midpoint.
            assert!((flow.geometry.0[1].0[0].x - mid.0).abs() < 1e-12);
            assert!((flow.geometry.0[2].0[0].y - mid.1).abs() < 1e-12);
        }
        Ok(())
    }

    fn sample_zones() -> Vec<(String, MultiPolygon<f64>)> {
        let west = polygon![
            (x: 113.65, y: 22.45),
            (x: 113.75, y: 22.45),
            (x: 113.75, y: 22.65),
            (x: 113.65, y: 22.65),
            (x: 113.65, y: 22.45),
        ];
        let east = polygon![
            (x: 113.75, y: 22.45),
            (x: 113.85, y: 22.45),
            (x: 113.85, y: 22.65),
            (x: 113.75, y: 22.65),
            (x: 113.75, y: 22.45),
        ];
        vec![
            ("west".to_string(), MultiPolygon::new(vec![west])),
            ("east".to_string(), MultiPolygon::new(vec![east])),
        ]
    }

    #[test]
    fn test_odagg_shape_groups_by_zone() -> Result<(), TransgridError> {
        let flows = odagg_shape(&sample_records(), &sample_zones(), None, None)?;
        // All three records run west -> east.
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].origin_zone, "west");
        assert_eq!(flows[0].dest_zone, "east");
        assert_eq!(flows[0].weight, 5.0);
        Ok(())
    }

    #[test]
    fn test_odagg_shape_prebin_matches_direct() -> Result<(), TransgridError> {
        let p = params();
        let direct = odagg_shape(&sample_records(), &sample_zones(), None, None)?;
        let binned = odagg_shape(&sample_records(), &sample_zones(), Some(&p), None)?;
        assert_eq!(direct.len(), binned.len());
        assert_eq!(direct[0].origin_zone, binned[0].origin_zone);
        assert_eq!(direct[0].weight, binned[0].weight);
        Ok(())
    }

    #[test]
    fn test_odagg_shape_drops_unmatched_records() -> Result<(), TransgridError> {
        let mut records = sample_records();
        // Destination far outside every zone.
        records.push(OdRecord::new(113.70, 22.55, 120.0, 30.0).with_weight(100.0));
        let flows = odagg_shape(&records, &sample_zones(), None, None)?;
        let total: f64 = flows.iter().map(|f| f.weight).sum();
        assert_eq!(total, 5.0);
        Ok(())
    }

    #[test]
    fn test_odagg_shape_requires_zones() {
        assert!(matches!(
            odagg_shape(&sample_records(), &[], None, None),
            Err(TransgridError::EmptyInput("zones"))
        ));
    }
}
