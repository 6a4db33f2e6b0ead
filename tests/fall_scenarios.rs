use assert_approx_eq::assert_approx_eq;

use fall_sentinel::{
    score_frame, FallConfig, FallDetector, Keypoint, KeypointKind, PoseSample, ScoreMarker,
    NUM_KEYPOINTS,
};

fn pose(points: &[(KeypointKind, f64, f64)]) -> PoseSample {
    let mut kps = [Keypoint::new(100.0, 70.0, 1.0); NUM_KEYPOINTS];
    for &(kind, x, y) in points {
        kps[kind.idx()] = Keypoint::new(x, y, 1.0);
    }
    PoseSample::new(kps).expect("valid pose")
}

fn shifted(sample: &PoseSample, dx: f64) -> PoseSample {
    let mut kps = *sample.keypoints().expect("keypoints");
    for kp in kps.iter_mut() {
        kp.x += dx;
    }
    PoseSample::new(kps).expect("valid pose")
}

/// Standing: shoulders over hips over knees over ankles, head well up.
fn upright() -> PoseSample {
    use KeypointKind::*;
    pose(&[
        (Nose, 100.0, 50.0),
        (LeftShoulder, 80.0, 100.0),
        (RightShoulder, 120.0, 100.0),
        (LeftHip, 85.0, 240.0),
        (RightHip, 115.0, 240.0),
        (LeftKnee, 88.0, 380.0),
        (RightKnee, 112.0, 380.0),
        (LeftAnkle, 90.0, 500.0),
        (RightAnkle, 110.0, 500.0),
    ])
}

/// Torso 80 degrees from vertical, head-to-ankle ratio 0.1.
fn fallen() -> PoseSample {
    use KeypointKind::*;
    let (sx, sy) = (100.0, 400.0);
    let torso = 150.0_f64;
    let theta = 80.0_f64.to_radians();
    let (hx, hy) = (sx + torso * theta.sin(), sy + torso * theta.cos());
    pose(&[
        (Nose, 40.0, 405.0),
        (LeftShoulder, sx, sy - 10.0),
        (RightShoulder, sx, sy + 10.0),
        (LeftHip, hx, hy - 10.0),
        (RightHip, hx, hy + 10.0),
        (LeftKnee, 330.0, 425.0),
        (RightKnee, 330.0, 435.0),
        (LeftAnkle, 420.0, 445.0),
        (RightAnkle, 420.0, 455.0),
    ])
}

#[test]
fn upright_pose_scores_zero_and_is_not_a_fall() {
    let detector = FallDetector::default();
    let decision = detector.detect_at(1, &upright(), 0.0);
    assert_eq!(decision.breakdown.total_score, 0.0);
    assert_eq!(decision.breakdown.angle_score, Some(0.0));
    assert_eq!(decision.breakdown.height_score, Some(0.0));
    assert_eq!(decision.breakdown.posture_score, Some(0.0));
    assert_eq!(decision.breakdown.body_ratio_score, Some(0.0));
    assert!(!decision.is_fall);
}

#[test]
fn sustained_fallen_pose_is_a_fall() {
    let cfg = FallConfig::default();
    let history_length = cfg.history_length;
    let detector = FallDetector::new(cfg).unwrap();
    let sample = fallen();

    let mut last = None;
    for i in 0..history_length {
        last = Some(detector.detect_at(5, &sample, i as f64 * 0.1));
    }
    let decision = last.unwrap();
    assert_approx_eq!(decision.breakdown.body_angle.unwrap(), 80.0);
    assert_approx_eq!(decision.breakdown.height_ratio.unwrap(), 0.1);
    assert_eq!(decision.breakdown.history_length, history_length);
    assert!(decision.breakdown.avg_score > detector.config().fall_threshold);
    assert!(decision.is_fall);
}

#[test]
fn single_bad_frame_does_not_flip_a_long_window() {
    let detector = FallDetector::default();
    for i in 0..7 {
        detector.detect_at(2, &upright(), i as f64);
    }
    let decision = detector.detect_at(2, &fallen(), 7.0);
    assert_eq!(decision.breakdown.total_score, 1.0);
    assert!(!decision.is_fall);
}

#[test]
fn fast_displacement_raises_motion_score_without_posture() {
    let detector = FallDetector::default();
    let base = upright();
    detector.detect_at(3, &base, 10.0);
    detector.detect_at(3, &shifted(&base, 250.0), 10.05);
    let decision = detector.detect_at(3, &shifted(&base, 500.0), 10.1);

    assert_eq!(decision.breakdown.total_score, 0.0);
    assert!(decision.breakdown.motion_score > 0.0);
    assert_approx_eq!(decision.combined_score, 0.3);
    assert!(!decision.is_fall);
}

#[test]
fn low_confidence_critical_joint_always_scores_zero() {
    let cfg = FallConfig::default();
    let critical = [
        KeypointKind::LeftShoulder,
        KeypointKind::RightShoulder,
        KeypointKind::LeftHip,
        KeypointKind::RightHip,
    ];
    for kind in critical {
        for confidence in [0.0, 0.2, cfg.min_keypoint_confidence] {
            let mut kps = *fallen().keypoints().unwrap();
            kps[kind.idx()].confidence = confidence;
            let fs = score_frame(&PoseSample::new(kps).unwrap(), &cfg);
            assert_eq!(fs.total, 0.0, "{:?} at {}", kind, confidence);
            assert_eq!(fs.breakdown.error, Some(ScoreMarker::LowConfidenceKeypoints));
        }
    }
}

#[test]
fn scores_stay_within_unit_interval() {
    use KeypointKind::*;
    let detector = FallDetector::default();
    let mut t = 0.0;
    for step in 0..24 {
        let theta = (step as f64 * 15.0).to_radians();
        for scale in [0.1, 1.0, 10.0] {
            let (sx, sy) = (300.0, 300.0);
            let (hx, hy) = (sx + 150.0 * theta.sin(), sy + 150.0 * theta.cos());
            let sample = pose(&[
                (Nose, sx, sy - 40.0 * scale),
                (LeftShoulder, sx, sy),
                (RightShoulder, sx, sy),
                (LeftHip, hx, hy),
                (RightHip, hx, hy),
                (LeftKnee, hx, hy + 100.0 * scale),
                (RightKnee, hx, hy + 100.0 * scale),
                (LeftAnkle, hx, hy + 200.0 * scale),
                (RightAnkle, hx, hy + 200.0 * scale),
            ]);
            t += 0.01;
            let d = detector.detect_at(step as u64 % 3, &sample, t);
            assert!((0.0..=1.0).contains(&d.breakdown.total_score));
            assert!((0.0..=1.0).contains(&d.breakdown.motion_score));
            assert!((0.0..=1.0 + 1e-12).contains(&d.combined_score));
            assert!((0.0..=1.0).contains(&d.breakdown.avg_score));
        }
    }
}

#[test]
fn average_tracks_the_retained_window() {
    let detector = FallDetector::new(FallConfig {
        history_length: 4,
        ..FallConfig::default()
    })
    .unwrap();

    let sequence = [fallen(), upright(), upright(), fallen(), fallen(), upright()];
    let mut scores = Vec::new();
    for (i, sample) in sequence.iter().enumerate() {
        let d = detector.detect_at(9, sample, i as f64);
        scores.push(d.breakdown.total_score);
        let window = &scores[scores.len().saturating_sub(4)..];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        assert_approx_eq!(d.breakdown.avg_score, mean);
        assert_eq!(d.breakdown.history_length, window.len());
    }
}

#[test]
fn identical_sequences_give_identical_decisions() {
    let a = FallDetector::default();
    let b = FallDetector::default();
    let base = fallen();
    let sequence = [
        upright(),
        base.clone(),
        shifted(&base, 40.0),
        PoseSample::missing(),
        shifted(&base, 80.0),
    ];
    for (i, sample) in sequence.iter().enumerate() {
        let t = 100.0 + i as f64 * 0.2;
        assert_eq!(a.detect_at(1, sample, t), b.detect_at(1, sample, t));
    }
}

#[test]
fn reset_clears_smoothing_state() {
    let detector = FallDetector::default();
    for i in 0..8 {
        detector.detect_at(4, &fallen(), i as f64);
    }
    detector.reset(Some(4));
    let decision = detector.detect_at(4, &upright(), 9.0);
    assert_eq!(decision.breakdown.history_length, 1);
    assert_eq!(decision.breakdown.avg_score, 0.0);
    assert!(!decision.is_fall);
}

#[test]
fn breakdown_serializes_with_documented_names() {
    let detector = FallDetector::default();
    let decision = detector.detect_at(1, &fallen(), 0.0);
    let json = serde_json::to_value(&decision.breakdown).unwrap();
    for key in [
        "body_angle",
        "angle_score",
        "height_ratio",
        "height_score",
        "posture_score",
        "body_ratio",
        "body_ratio_score",
        "total_score",
        "motion_score",
        "combined_score",
        "avg_score",
        "history_length",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert!(json.get("error").is_none());
    assert_eq!(json["history_length"], 1);
}
