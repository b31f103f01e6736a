use crate::core::grid::{GridParams, gps_to_grid, grid_to_centre};
use crate::traj::{TrajPoint, sort_by_entity_time};
use log::debug;
use serde::{Deserialize, Serialize};

/// A stationary interval: an entity dwelt in one grid cell for at least the
/// activity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stay {
    pub entity: String,
    /// Start time, epoch seconds.
    pub stime: f64,
    /// End time = start of the following cell run, epoch seconds.
    pub etime: f64,
    pub col: i64,
    pub row: i64,
    /// Representative coordinate: the cell center.
    pub lon: f64,
    pub lat: f64,
    /// `etime - stime`, seconds. Always `>=` the activity threshold.
    pub duration: f64,
}

/// A transition between two consecutive retained stays of the same entity.
///
/// When short stays are filtered out, the move spans the gap between the two
/// surviving stays, absorbing the filtered intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub entity: String,
    /// End of the preceding stay, epoch seconds.
    pub stime: f64,
    /// Start of the following stay, epoch seconds.
    pub etime: f64,
    pub scol: i64,
    pub srow: i64,
    pub ecol: i64,
    pub erow: i64,
    /// Start location: the preceding stay's cell center.
    pub slon: f64,
    pub slat: f64,
    /// End location: the following stay's cell center.
    pub elon: f64,
    pub elat: f64,
    pub duration: f64,
}

/// First point of a run of identical cells for one entity.
struct Run {
    entity: String,
    stime: f64,
    col: i64,
    row: i64,
}

/// Partitions per-entity point sequences into alternating stays and moves.
///
/// Points are grid-indexed, runs of identical cell id are merged, each run's
/// end time is the next run's start time (so the trailing run of every
/// entity is dropped: its end is unobserved), and runs shorter than
/// `activity_threshold_s` are discarded. Moves are then the gaps between
/// temporally consecutive surviving stays.
///
/// Entities with fewer than two points yield nothing.
///
/// # Example
///
/// ```
/// use transgrid::{GridParams, TrajPoint, stay_move};
///
/// # fn main() -> Result<(), transgrid::TransgridError> {
/// let params = GridParams::from_bounds([113.6, 22.4, 114.8, 22.9], 500.0)?;
/// let points = vec![
///     TrajPoint::new("u1", 0.0, 113.70, 22.55),
///     TrajPoint::new("u1", 2000.0, 113.75, 22.60),
///     TrajPoint::new("u1", 6000.0, 113.75, 22.60),
/// ];
/// let (stays, _moves) = stay_move(&points, &params, 1800.0);
/// assert_eq!(stays.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn stay_move(
    points: &[TrajPoint],
    params: &GridParams,
    activity_threshold_s: f64,
) -> (Vec<Stay>, Vec<Move>) {
    let mut sorted = points.to_vec();
    sort_by_entity_time(&mut sorted);

    // Change-point run-length encoding over (entity, cell).
    let mut runs: Vec<Run> = Vec::new();
    for p in &sorted {
        let (col, row) = gps_to_grid(p.lon, p.lat, params);
        let same_run = runs
            .last()
            .is_some_and(|r| r.entity == p.entity && r.col == col && r.row == row);
        if !same_run {
            runs.push(Run {
                entity: p.entity.clone(),
                stime: p.time,
                col,
                row,
            });
        }
    }

    // A run survives only if another run of the same entity follows it; the
    // follower's start time is this run's end time.
    let mut stays: Vec<Stay> = Vec::new();
    for pair in runs.windows(2) {
        let (run, next) = (&pair[0], &pair[1]);
        if run.entity != next.entity {
            continue;
        }
        let duration = next.stime - run.stime;
        if duration < activity_threshold_s {
            continue;
        }
        let (lon, lat) = grid_to_centre(run.col, run.row, params);
        stays.push(Stay {
            entity: run.entity.clone(),
            stime: run.stime,
            etime: next.stime,
            col: run.col,
            row: run.row,
            lon,
            lat,
            duration,
        });
    }

    // Moves bridge consecutive surviving stays; filtered short stays are
    // silently absorbed into the bridging move.
    let mut moves: Vec<Move> = Vec::new();
    for pair in stays.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if from.entity != to.entity {
            continue;
        }
        moves.push(Move {
            entity: from.entity.clone(),
            stime: from.etime,
            etime: to.stime,
            scol: from.col,
            srow: from.row,
            ecol: to.col,
            erow: to.row,
            slon: from.lon,
            slat: from.lat,
            elon: to.lon,
            elat: to.lat,
            duration: to.stime - from.etime,
        });
    }

    debug!(
        "stay_move: {} points -> {} runs -> {} stays, {} moves",
        sorted.len(),
        runs.len(),
        stays.len(),
        moves.len()
    );
    (stays, moves)
}
