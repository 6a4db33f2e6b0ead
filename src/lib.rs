//! Fall Sentinel
//!
//! Decides, per tracked subject, whether a body posture indicates a fall.
//! Keypoints come from an external pose model; this crate scores them and
//! smooths the scores over time.
//!
//! # Pipeline
//!
//! 1. `pose`: a validated 17-keypoint sample (COCO order).
//! 2. `score`: geometric sub-scores and the single-frame score.
//! 3. `track`: bounded per-object history and motion corroboration.
//! 4. `engine`: the registry of histories and the final decision.
//! 5. `report`: frame-level batching of several detections.
//!
//! Scoring never fails on a well-formed sample. Missing or unreliable
//! keypoints score zero and are flagged in the breakdown; only malformed
//! input (wrong keypoint count, non-finite values) is rejected with
//! [`PoseError`].

pub mod config;
pub mod engine;
pub mod error;
pub mod pose;
pub mod report;
pub mod score;
pub mod track;

pub use config::{ConfigSnapshot, FallConfig, ScoringProfile, TierWeights};
pub use engine::{FallDecision, FallDetector, TrackId};
pub use error::PoseError;
pub use pose::{Keypoint, KeypointKind, Point, PoseSample, NUM_KEYPOINTS};
pub use report::{DetectionReport, FrameReport, FrameRequest, PoseDetection};
pub use score::{score_frame, FrameScore, ScoreBreakdown, ScoreMarker};
pub use track::{HistorySample, TrackHistory};
