use crate::pose::NUM_KEYPOINTS;

/// Caller-visible faults for malformed pose input.
///
/// Geometry problems on a well-formed sample (low confidence, missing
/// joints, degenerate limbs) are never reported here; they are absorbed
/// into the score breakdown instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("expected {expected} keypoints (or none), got {actual}")]
    WrongKeypointCount { expected: usize, actual: usize },

    #[error("keypoint {index} has a non-finite {field}")]
    NonFiniteValue { index: usize, field: &'static str },

    #[error("keypoint {index} {field} {value} is outside the frame bounds")]
    CoordinateOutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("keypoint {index} confidence {value} is outside [0, 1]")]
    ConfidenceOutOfRange { index: usize, value: f64 },
}

impl PoseError {
    pub(crate) fn wrong_count(actual: usize) -> Self {
        PoseError::WrongKeypointCount {
            expected: NUM_KEYPOINTS,
            actual,
        }
    }
}
