//! Frame-level processing: every body detected in one video frame is run
//! through the decision engine and summarised into a single report.

use serde::{Deserialize, Serialize};

use crate::engine::{now_epoch_secs, FallDetector, TrackId};
use crate::pose::PoseSample;
use crate::score::ScoreBreakdown;

/// One body reported by the upstream pose model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseDetection {
    pub id: TrackId,
    /// `[x1, y1, x2, y2]` in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Person-detection confidence from the pose model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default = "PoseSample::missing")]
    pub keypoints: PoseSample,
}

/// All detections from one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Capture time in seconds since the epoch; wall clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub detections: Vec<PoseDetection>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionReport {
    pub id: TrackId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub is_fall: bool,
    pub fall_score: f64,
    pub details: ScoreBreakdown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub fall_detected: bool,
    pub detection_count: usize,
    pub detections: Vec<DetectionReport>,
    pub timestamp: f64,
}

impl FallDetector {
    /// Run every detection of a frame through the engine.
    ///
    /// All detections share the frame timestamp. `fall_detected` is set
    /// when any tracked body is judged to be falling.
    pub fn process_frame(&self, request: &FrameRequest) -> FrameReport {
        let timestamp = request
            .timestamp
            .filter(|t| t.is_finite())
            .unwrap_or_else(now_epoch_secs);

        let detections: Vec<DetectionReport> = request
            .detections
            .iter()
            .map(|det| {
                let decision = self.detect_at(det.id, &det.keypoints, timestamp);
                DetectionReport {
                    id: det.id,
                    bbox: det.bbox,
                    confidence: det.confidence,
                    is_fall: decision.is_fall,
                    fall_score: decision.combined_score,
                    details: decision.breakdown,
                }
            })
            .collect();

        let fall_detected = detections.iter().any(|d| d.is_fall);
        log::info!(
            "frame processed: fall_detected={} detections={}",
            fall_detected,
            detections.len()
        );

        FrameReport {
            fall_detected,
            detection_count: detections.len(),
            detections,
            timestamp,
        }
    }
}
