//! Pose samples as delivered by the upstream pose model.
//!
//! A sample is 17 keypoints in COCO order. Coordinates are image pixels
//! with y growing downward. The index layout is fixed: `KeypointKind as
//! usize` is the row index in the model output and is never reordered.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;

pub const NUM_KEYPOINTS: usize = 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointKind {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointKind {
    pub const ALL: [KeypointKind; NUM_KEYPOINTS] = [
        KeypointKind::Nose,
        KeypointKind::LeftEye,
        KeypointKind::RightEye,
        KeypointKind::LeftEar,
        KeypointKind::RightEar,
        KeypointKind::LeftShoulder,
        KeypointKind::RightShoulder,
        KeypointKind::LeftElbow,
        KeypointKind::RightElbow,
        KeypointKind::LeftWrist,
        KeypointKind::RightWrist,
        KeypointKind::LeftHip,
        KeypointKind::RightHip,
        KeypointKind::LeftKnee,
        KeypointKind::RightKnee,
        KeypointKind::LeftAnkle,
        KeypointKind::RightAnkle,
    ];

    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Largest accepted coordinate magnitude, in pixels. Anything beyond this
/// cannot come from a real frame and would overflow the limb geometry.
pub const MAX_COORDINATE: f64 = 1.0e6;

/// Joints whose confidence gates scoring. Without a trustworthy torso the
/// geometric heuristics are meaningless.
pub const CRITICAL_JOINTS: [KeypointKind; 4] = [
    KeypointKind::LeftShoulder,
    KeypointKind::RightShoulder,
    KeypointKind::LeftHip,
    KeypointKind::RightHip,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(a: Point, b: Point) -> Point {
        Point {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn validate(&self, index: usize) -> Result<(), PoseError> {
        for (field, value) in [("x", self.x), ("y", self.y), ("confidence", self.confidence)] {
            if !value.is_finite() {
                return Err(PoseError::NonFiniteValue { index, field });
            }
        }
        for (field, value) in [("x", self.x), ("y", self.y)] {
            if value.abs() > MAX_COORDINATE {
                return Err(PoseError::CoordinateOutOfRange {
                    index,
                    field,
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(PoseError::ConfidenceOutOfRange {
                index,
                value: self.confidence,
            });
        }
        Ok(())
    }
}

/// One detected body.
///
/// A sample is either complete (exactly 17 validated keypoints) or
/// missing (the detector reported a body but no keypoints). Any other
/// shape is rejected with [`PoseError`] before it reaches scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 3]>", into = "Vec<[f64; 3]>")]
pub struct PoseSample {
    keypoints: Option<[Keypoint; NUM_KEYPOINTS]>,
}

impl PoseSample {
    pub fn new(keypoints: [Keypoint; NUM_KEYPOINTS]) -> Result<Self, PoseError> {
        for (index, kp) in keypoints.iter().enumerate() {
            kp.validate(index)?;
        }
        Ok(Self {
            keypoints: Some(keypoints),
        })
    }

    /// A detection that carried no keypoints at all.
    pub fn missing() -> Self {
        Self { keypoints: None }
    }

    /// Build from model rows of `[x, y, confidence]`.
    ///
    /// Zero rows yields [`PoseSample::missing`]; any count other than 0 or
    /// 17 is an error.
    pub fn from_rows(rows: &[[f64; 3]]) -> Result<Self, PoseError> {
        if rows.is_empty() {
            return Ok(Self::missing());
        }
        if rows.len() != NUM_KEYPOINTS {
            return Err(PoseError::wrong_count(rows.len()));
        }
        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (slot, row) in keypoints.iter_mut().zip(rows) {
            *slot = Keypoint::new(row[0], row[1], row[2]);
        }
        Self::new(keypoints)
    }

    pub fn is_missing(&self) -> bool {
        self.keypoints.is_none()
    }

    pub fn keypoints(&self) -> Option<&[Keypoint; NUM_KEYPOINTS]> {
        self.keypoints.as_ref()
    }

    pub fn get(&self, kind: KeypointKind) -> Option<&Keypoint> {
        self.keypoints.as_ref().map(|kps| &kps[kind.idx()])
    }

    /// Midpoint of two joints, or `None` for a missing sample.
    pub fn midpoint(&self, a: KeypointKind, b: KeypointKind) -> Option<Point> {
        let kps = self.keypoints.as_ref()?;
        Some(Point::midpoint(kps[a.idx()].point(), kps[b.idx()].point()))
    }

    /// Shoulder midpoint, the position tracked for motion analysis.
    pub fn shoulder_center(&self) -> Option<Point> {
        self.midpoint(KeypointKind::LeftShoulder, KeypointKind::RightShoulder)
    }
}

impl TryFrom<Vec<[f64; 3]>> for PoseSample {
    type Error = PoseError;

    fn try_from(rows: Vec<[f64; 3]>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<PoseSample> for Vec<[f64; 3]> {
    fn from(sample: PoseSample) -> Self {
        match sample.keypoints {
            Some(kps) => kps.iter().map(|kp| [kp.x, kp.y, kp.confidence]).collect(),
            None => Vec::new(),
        }
    }
}
