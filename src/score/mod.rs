//! Single-frame fall scoring.
//!
//! `score_frame` is memoryless: it turns one pose sample into a score in
//! [0, 1] plus a named breakdown. The temporal fields of the breakdown are
//! left at zero here and filled in by the decision engine.

pub mod geometry;

use serde::Serialize;

use crate::config::FallConfig;
use crate::pose::PoseSample;

use self::geometry::BodyCenters;

pub const MAX_FRAME_SCORE: f64 = 1.0;

/// Why a frame scored zero without being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMarker {
    MissingKeypoints,
    LowConfidenceKeypoints,
}

impl ScoreMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreMarker::MissingKeypoints => "missing_keypoints",
            ScoreMarker::LowConfidenceKeypoints => "low_confidence_keypoints",
        }
    }
}

impl std::fmt::Display for ScoreMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-scores for one detection.
///
/// Geometric fields are `None` when the frame was gated out; `error` then
/// names the reason.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ScoreMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_ratio_score: Option<f64>,
    pub total_score: f64,
    pub motion_score: f64,
    pub combined_score: f64,
    pub avg_score: f64,
    pub history_length: usize,
}

impl ScoreBreakdown {
    fn gated(marker: ScoreMarker) -> Self {
        Self {
            error: Some(marker),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameScore {
    pub total: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score one pose sample in isolation.
pub fn score_frame(sample: &PoseSample, cfg: &FallConfig) -> FrameScore {
    let Some(kps) = sample.keypoints() else {
        return FrameScore {
            total: 0.0,
            breakdown: ScoreBreakdown::gated(ScoreMarker::MissingKeypoints),
        };
    };
    if !geometry::critical_joints_reliable(kps, cfg.min_keypoint_confidence) {
        return FrameScore {
            total: 0.0,
            breakdown: ScoreBreakdown::gated(ScoreMarker::LowConfidenceKeypoints),
        };
    }

    let weights = cfg.weights();
    let centers = BodyCenters::from_keypoints(kps);
    let angle = geometry::body_angle(&centers, cfg, &weights);
    let height = geometry::height_ratio(&centers, cfg, &weights);
    let posture = geometry::posture_score(&centers, &weights);
    let ratio = geometry::body_ratio(&centers, &weights);

    let total = (angle.score + height.score + posture + ratio.score).min(MAX_FRAME_SCORE);

    FrameScore {
        total,
        breakdown: ScoreBreakdown {
            error: None,
            body_angle: Some(angle.value),
            angle_score: Some(angle.score),
            height_ratio: Some(height.value),
            height_score: Some(height.score),
            posture_score: Some(posture),
            body_ratio: Some(ratio.value),
            body_ratio_score: Some(ratio.score),
            total_score: total,
            ..ScoreBreakdown::default()
        },
    }
}
