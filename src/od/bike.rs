use log::debug;
use serde::{Deserialize, Serialize};

/// One bike-share lock-state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeEvent {
    pub bike: String,
    /// Timestamp, epoch seconds.
    pub time: f64,
    pub lon: f64,
    pub lat: f64,
    /// `true` when the bike was locked (trip end), `false` when unlocked
    /// (trip start).
    pub locked: bool,
}

impl BikeEvent {
    pub fn new(bike: impl Into<String>, time: f64, lon: f64, lat: f64, locked: bool) -> Self {
        Self {
            bike: bike.into(),
            time,
            lon,
            lat,
            locked,
        }
    }
}

/// A trip: an unlock immediately followed by a lock of the same bike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeMove {
    pub bike: String,
    pub stime: f64,
    pub etime: f64,
    pub slon: f64,
    pub slat: f64,
    pub elon: f64,
    pub elat: f64,
    pub duration: f64,
}

/// A parked interval: a lock immediately followed by an unlock of the same
/// bike, located where the bike was locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeStop {
    pub bike: String,
    pub stime: f64,
    pub etime: f64,
    pub lon: f64,
    pub lat: f64,
    pub duration: f64,
}

/// Pairs unlock/lock events into moves and lock/unlock events into stops.
///
/// Unlike the trajectory segmenter, this accepts an explicit observation
/// window: with `window = Some((start, end))` a synthetic lock at `start`
/// (at the bike's first observed location) and a synthetic unlock at `end`
/// (at its last) are added per bike, so the parked intervals touching the
/// window edges are reported too. Without a window, boundary intervals are
/// unobservable and silently omitted.
pub fn bike_to_od(
    events: &[BikeEvent],
    window: Option<(f64, f64)>,
) -> (Vec<BikeMove>, Vec<BikeStop>) {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.bike.cmp(&b.bike).then_with(|| a.time.total_cmp(&b.time)));

    if let Some((start, end)) = window {
        let mut padded: Vec<BikeEvent> = Vec::with_capacity(sorted.len() + 2);
        let mut i = 0;
        while i < sorted.len() {
            let mut j = i;
            while j < sorted.len() && sorted[j].bike == sorted[i].bike {
                j += 1;
            }
            let first = &sorted[i];
            let last = &sorted[j - 1];
            padded.push(BikeEvent::new(
                first.bike.clone(),
                start,
                first.lon,
                first.lat,
                true,
            ));
            padded.extend_from_slice(&sorted[i..j]);
            padded.push(BikeEvent::new(
                last.bike.clone(),
                end,
                last.lon,
                last.lat,
                false,
            ));
            i = j;
        }
        sorted = padded;
    }

    let mut moves = Vec::new();
    let mut stops = Vec::new();
    for pair in sorted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.bike != b.bike {
            continue;
        }
        match (a.locked, b.locked) {
            (false, true) => moves.push(BikeMove {
                bike: a.bike.clone(),
                stime: a.time,
                etime: b.time,
                slon: a.lon,
                slat: a.lat,
                elon: b.lon,
                elat: b.lat,
                duration: b.time - a.time,
            }),
            (true, false) => stops.push(BikeStop {
                bike: a.bike.clone(),
                stime: a.time,
                etime: b.time,
                lon: a.lon,
                lat: a.lat,
                duration: b.time - a.time,
            }),
            // Consecutive same-state events (missed reports) pair with
            // nothing.
            _ => {}
        }
    }

    debug!(
        "bike_to_od: {} events -> {} moves, {} stops",
        events.len(),
        moves.len(),
        stops.len()
    );
    (moves, stops)
}
