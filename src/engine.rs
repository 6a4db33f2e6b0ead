use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::Serialize;

use crate::config::{ConfigSnapshot, FallConfig};
use crate::error::PoseError;
use crate::pose::PoseSample;
use crate::score::{score_frame, ScoreBreakdown};
use crate::track::{motion_score, HistorySample, TrackHistory};

/// Object id assigned by the upstream tracker and stable across frames.
pub type TrackId = u64;

/// Outcome of one detection call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FallDecision {
    pub is_fall: bool,
    /// Frame score blended with motion score, in [0, 1].
    pub combined_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Fall decision engine with a thread-safe registry of track histories.
///
/// The registry map is held only long enough to look up or create a
/// track; each track then has its own lock, so calls for different ids run
/// in parallel while calls for the same id serialise their
/// append-and-average sequence.
pub struct FallDetector {
    config: FallConfig,
    tracks: Mutex<HashMap<TrackId, Arc<Mutex<TrackHistory>>>>,
}

impl FallDetector {
    pub fn new(config: FallConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tracks: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &FallConfig {
        &self.config
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.config.snapshot()
    }

    /// Score a sample stamped with the current wall-clock time.
    pub fn detect(&self, object_id: TrackId, sample: &PoseSample) -> FallDecision {
        self.detect_at(object_id, sample, now_epoch_secs())
    }

    /// Validate raw `[x, y, confidence]` rows, then score them.
    pub fn detect_rows(
        &self,
        object_id: TrackId,
        rows: &[[f64; 3]],
    ) -> std::result::Result<FallDecision, PoseError> {
        let sample = PoseSample::from_rows(rows).map_err(|err| {
            log::warn!("object {}: rejected pose sample: {}", object_id, err);
            err
        })?;
        Ok(self.detect(object_id, &sample))
    }

    /// Score a sample observed at `timestamp` (seconds since the epoch).
    pub fn detect_at(&self, object_id: TrackId, sample: &PoseSample, timestamp: f64) -> FallDecision {
        let frame = score_frame(sample, &self.config);
        let weights = self.config.weights();
        let track = self.track(object_id);

        let (motion, avg_score, history_length) = {
            let mut history = lock(&track);
            history.push(HistorySample {
                score: frame.total,
                position: sample.shoulder_center(),
                timestamp,
            });
            (
                motion_score(&history, self.config.motion_threshold),
                history.average_score(),
                history.len(),
            )
        };

        let combined_score = frame.total * weights.frame_weight + motion * weights.motion_weight;
        let is_fall = avg_score > self.config.fall_threshold;

        if let Some(marker) = frame.breakdown.error {
            log::debug!("object {}: frame gated ({})", object_id, marker);
        }

        let mut breakdown = frame.breakdown;
        breakdown.motion_score = motion;
        breakdown.combined_score = combined_score;
        breakdown.avg_score = avg_score;
        breakdown.history_length = history_length;

        log::debug!(
            "object {}: score={:.3} motion={:.3} avg={:.3} fall={}",
            object_id,
            frame.total,
            motion,
            avg_score,
            is_fall
        );

        FallDecision {
            is_fall,
            combined_score,
            breakdown,
        }
    }

    /// Drop the history of one object, or of every object when `None`.
    /// Resetting an unknown id is a no-op.
    pub fn reset(&self, object_id: Option<TrackId>) {
        let mut tracks = lock(&self.tracks);
        match object_id {
            None => {
                tracks.clear();
                log::info!("reset history for all objects");
            }
            Some(id) => {
                if tracks.remove(&id).is_some() {
                    log::info!("reset history for object {}", id);
                }
            }
        }
    }

    /// Ids that currently have history, ascending.
    pub fn tracked_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = lock(&self.tracks).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of samples retained for `object_id` (0 if untracked).
    pub fn history_len(&self, object_id: TrackId) -> usize {
        let Some(track) = lock(&self.tracks).get(&object_id).cloned() else {
            return 0;
        };
        let len = lock(&track).len();
        len
    }

    fn track(&self, object_id: TrackId) -> Arc<Mutex<TrackHistory>> {
        let capacity = self.config.history_length;
        let mut tracks = lock(&self.tracks);
        let track = tracks
            .entry(object_id)
            .or_insert_with(|| Arc::new(Mutex::new(TrackHistory::new(capacity))));
        Arc::clone(track)
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        Self {
            config: FallConfig::default(),
            tracks: Mutex::new(HashMap::new()),
        }
    }
}

pub(crate) fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// Histories are plain sample buffers, so a panic elsewhere cannot leave
// them logically inconsistent; keep serving instead of propagating poison.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("track registry lock poisoned; recovering");
        poisoned.into_inner()
    })
}
