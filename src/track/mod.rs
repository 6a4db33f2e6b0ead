//! Per-object temporal state: bounded sample history and motion analysis.

pub mod history;
pub mod motion;

pub use history::{HistorySample, TrackHistory};
pub use motion::{motion_score, recent_speed, MOTION_WINDOW};
