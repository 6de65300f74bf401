// libs/scheduling-cell/src/services/slots.rs
use chrono::{Duration, NaiveTime};

use crate::models::AvailabilityWindow;

/// Starts stepping every `granularity` from the window's start whose full
/// session still fits inside the window (`start + session <= end`), in
/// chronological order. These are the only valid booking starts.
pub fn bookable_starts(
    window: &AvailabilityWindow,
    granularity: Duration,
    session: Duration,
) -> Vec<NaiveTime> {
    // A non-positive step would never advance the loop.
    if granularity <= Duration::zero() {
        return Vec::new();
    }

    let mut starts = Vec::new();
    let mut current = window.start_time;

    loop {
        let (session_end, wrapped) = current.overflowing_add_signed(session);
        if wrapped != 0 || session_end > window.end_time {
            break;
        }
        starts.push(current);

        let (next, wrapped) = current.overflowing_add_signed(granularity);
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    starts
}

/// Every time point from `start` to `end` inclusive of both boundaries,
/// stepping by `granularity`. Backs the hour pickers in the availability
/// editing dialogs; not a slot listing -- the trailing boundary is never a
/// bookable start.
pub fn time_points(start: NaiveTime, end: NaiveTime, granularity: Duration) -> Vec<NaiveTime> {
    if granularity <= Duration::zero() {
        return Vec::new();
    }

    let mut points = Vec::new();
    let mut current = start;

    while current <= end {
        points.push(current);
        let (next, wrapped) = current.overflowing_add_signed(granularity);
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    points
}

/// Half-open interval overlap: [a_start, a_end) intersects [b_start, b_end).
/// Used instead of exact start equality so the occupancy test stays correct
/// if session lengths ever vary.
pub fn overlaps(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}
