use super::history::TrackHistory;

/// Number of most recent samples the speed estimate looks at.
pub const MOTION_WINDOW: usize = 3;

/// Speed at `MOTION_SATURATION` times the threshold maps to a full score.
const MOTION_SATURATION: f64 = 3.0;

/// Average shoulder speed over the last [`MOTION_WINDOW`] samples, in
/// pixels per second.
///
/// `None` when the window is not yet full, when any sample in it lacks a
/// position, or when no time elapsed across it.
pub fn recent_speed(history: &TrackHistory) -> Option<f64> {
    if history.len() < MOTION_WINDOW {
        return None;
    }
    let window: Vec<_> = history.recent(MOTION_WINDOW).collect();

    let mut distance = 0.0;
    let mut elapsed = 0.0;
    for pair in window.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let (Some(a), Some(b)) = (prev.position, next.position) else {
            return None;
        };
        distance += a.distance(b);
        elapsed += next.timestamp - prev.timestamp;
    }

    if elapsed > 0.0 {
        Some(distance / elapsed)
    } else {
        None
    }
}

/// Motion corroboration score in [0, 1].
///
/// Zero until the speed exceeds `motion_threshold`; above it the score
/// ramps linearly and saturates at three times the threshold.
pub fn motion_score(history: &TrackHistory, motion_threshold: f64) -> f64 {
    match recent_speed(history) {
        Some(speed) if speed > motion_threshold => {
            (speed / (MOTION_SATURATION * motion_threshold)).min(1.0)
        }
        _ => 0.0,
    }
}
