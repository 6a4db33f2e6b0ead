use std::sync::Arc;
use std::thread;

use fall_sentinel::{FallConfig, FallDetector, Keypoint, PoseSample, NUM_KEYPOINTS};

fn sample(offset: f64) -> PoseSample {
    PoseSample::new([Keypoint::new(50.0 + offset, 60.0, 0.9); NUM_KEYPOINTS]).unwrap()
}

#[test]
fn concurrent_calls_on_one_id_lose_no_samples() {
    let detector = Arc::new(
        FallDetector::new(FallConfig {
            history_length: 1000,
            ..FallConfig::default()
        })
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let detector = detector.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let t = worker as f64 * 1000.0 + i as f64;
                    detector.detect_at(1, &sample(i as f64), t);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(detector.history_len(1), 800);
}

#[test]
fn parallel_ids_keep_independent_bounded_histories() {
    let detector = Arc::new(
        FallDetector::new(FallConfig {
            history_length: 16,
            ..FallConfig::default()
        })
        .unwrap(),
    );

    let handles: Vec<_> = (0..6u64)
        .map(|id| {
            let detector = detector.clone();
            thread::spawn(move || {
                let rounds = 5 + id as usize * 5;
                for i in 0..rounds {
                    let d = detector.detect_at(id, &sample(0.0), i as f64);
                    assert_eq!(d.breakdown.history_length, (i + 1).min(16));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(detector.tracked_ids(), vec![0, 1, 2, 3, 4, 5]);
    for id in 0..6u64 {
        let rounds = 5 + id as usize * 5;
        assert_eq!(detector.history_len(id), rounds.min(16));
    }
}

#[test]
fn reset_during_traffic_never_faults() {
    let detector = Arc::new(FallDetector::default());
    let writer = {
        let detector = detector.clone();
        thread::spawn(move || {
            for i in 0..200 {
                detector.detect_at(i % 4, &sample(0.0), i as f64);
            }
        })
    };
    let resetter = {
        let detector = detector.clone();
        thread::spawn(move || {
            for i in 0..200u64 {
                if i % 10 == 0 {
                    detector.reset(None);
                } else {
                    detector.reset(Some(i % 5));
                }
            }
        })
    };
    writer.join().expect("writer panicked");
    resetter.join().expect("resetter panicked");

    for id in detector.tracked_ids() {
        assert!(detector.history_len(id) <= detector.config().history_length);
    }
}
