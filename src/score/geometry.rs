//! Single-sample geometric heuristics.
//!
//! Every function here is pure: it looks at one set of keypoints and the
//! configured thresholds, nothing else. Degenerate geometry (zero-length
//! legs, feet or nose at y <= 0) falls back to a neutral value with a
//! zero score rather than dividing by zero.

use crate::config::{FallConfig, TierWeights};
use crate::pose::{Keypoint, KeypointKind, Point, CRITICAL_JOINTS, NUM_KEYPOINTS};

/// Hips are considered "at knee level" once they drop below this fraction
/// of the knee height.
const HIP_KNEE_FACTOR: f64 = 0.85;

const BODY_RATIO_HIGH: f64 = 0.8;
const BODY_RATIO_MID: f64 = 0.6;

/// Neutral height ratio reported when it cannot be computed.
pub const NEUTRAL_HEIGHT_RATIO: f64 = 1.0;

/// A measured quantity and the sub-score it earned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tiered {
    pub value: f64,
    pub score: f64,
}

impl Tiered {
    fn neutral(value: f64) -> Self {
        Self { value, score: 0.0 }
    }
}

/// Joint midpoints shared by the scorers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyCenters {
    pub nose: Point,
    pub shoulder: Point,
    pub hip: Point,
    pub knee: Point,
    pub ankle: Point,
}

impl BodyCenters {
    pub fn from_keypoints(kps: &[Keypoint; NUM_KEYPOINTS]) -> Self {
        let mid = |a: KeypointKind, b: KeypointKind| {
            Point::midpoint(kps[a.idx()].point(), kps[b.idx()].point())
        };
        Self {
            nose: kps[KeypointKind::Nose.idx()].point(),
            shoulder: mid(KeypointKind::LeftShoulder, KeypointKind::RightShoulder),
            hip: mid(KeypointKind::LeftHip, KeypointKind::RightHip),
            knee: mid(KeypointKind::LeftKnee, KeypointKind::RightKnee),
            ankle: mid(KeypointKind::LeftAnkle, KeypointKind::RightAnkle),
        }
    }
}

/// True when every torso joint is strictly above the confidence floor.
pub fn critical_joints_reliable(kps: &[Keypoint; NUM_KEYPOINTS], min_confidence: f64) -> bool {
    CRITICAL_JOINTS
        .iter()
        .all(|kind| kps[kind.idx()].confidence > min_confidence)
}

/// Torso inclination from vertical, in degrees.
///
/// A perfectly horizontal torso (no vertical extent) reads as 90 degrees.
pub fn body_angle(centers: &BodyCenters, cfg: &FallConfig, weights: &TierWeights) -> Tiered {
    let dx = centers.hip.x - centers.shoulder.x;
    let dy = centers.hip.y - centers.shoulder.y;
    let angle = if dy != 0.0 {
        (dx / dy).atan().abs().to_degrees()
    } else {
        90.0
    };

    let score = if angle > cfg.angle_threshold_high {
        weights.angle_high
    } else if angle > cfg.angle_threshold_mid {
        weights.angle_mid
    } else {
        0.0
    };
    Tiered {
        value: angle,
        score,
    }
}

/// Head height relative to the feet: `(ankle_y - nose_y) / ankle_y`.
///
/// Small values mean the head is close to foot level in the image.
pub fn height_ratio(centers: &BodyCenters, cfg: &FallConfig, weights: &TierWeights) -> Tiered {
    let ankle_y = centers.ankle.y;
    let nose_y = centers.nose.y;
    if ankle_y <= 0.0 || nose_y <= 0.0 {
        log::debug!(
            "height ratio undefined (ankle_y={:.1}, nose_y={:.1})",
            ankle_y,
            nose_y
        );
        return Tiered::neutral(NEUTRAL_HEIGHT_RATIO);
    }

    let ratio = (ankle_y - nose_y) / ankle_y;
    let score = if ratio < cfg.height_ratio_high {
        weights.height_high
    } else if ratio < cfg.height_ratio_mid {
        weights.height_mid
    } else {
        0.0
    };
    Tiered {
        value: ratio,
        score,
    }
}

/// Additive posture anomalies: torso inverted, hips sunk to knee level.
pub fn posture_score(centers: &BodyCenters, weights: &TierWeights) -> f64 {
    let mut score = 0.0;
    if centers.shoulder.y > centers.hip.y {
        score += weights.posture_step;
    }
    if centers.hip.y > centers.knee.y * HIP_KNEE_FACTOR {
        score += weights.posture_step;
    }
    score
}

/// Torso length over leg length. Grows when the legs fold or foreshorten.
pub fn body_ratio(centers: &BodyCenters, weights: &TierWeights) -> Tiered {
    let torso = centers.shoulder.distance(centers.hip);
    let leg = centers.hip.distance(centers.ankle);
    if leg == 0.0 {
        log::debug!("body ratio undefined: zero leg length");
        return Tiered::neutral(0.0);
    }

    let ratio = torso / leg;
    let score = if ratio > BODY_RATIO_HIGH {
        weights.body_ratio_high
    } else if ratio > BODY_RATIO_MID {
        weights.body_ratio_mid
    } else {
        0.0
    };
    Tiered {
        value: ratio,
        score,
    }
}
