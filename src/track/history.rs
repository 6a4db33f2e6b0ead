use std::collections::VecDeque;

use serde::Serialize;

use crate::pose::Point;

/// One scored observation of a tracked body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HistorySample {
    pub score: f64,
    /// Shoulder midpoint. `None` when the detection carried no keypoints.
    pub position: Option<Point>,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Bounded ring buffer of recent samples for one object id.
///
/// Pushing past capacity evicts the oldest sample, so the buffer always
/// holds the most recent `capacity` observations.
#[derive(Clone, Debug)]
pub struct TrackHistory {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// The last `n` samples in chronological order (fewer if not yet filled).
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistorySample> + '_ {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> + '_ {
        self.samples.iter()
    }

    /// Mean frame score over the retained window; 0 when empty.
    pub fn average_score(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s.score).sum();
        sum / self.samples.len() as f64
    }
}
