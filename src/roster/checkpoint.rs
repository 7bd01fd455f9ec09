//! Checkpoint buckets along the track and the celebration they trigger.

use std::time::{Duration, Instant};

use crate::models::{CHECKPOINT_INTERVAL, TARGET_POINTS};

/// Keep points on the track, `[0, TARGET_POINTS]`.
pub fn clamp_points(points: i64) -> i64 {
    points.clamp(0, TARGET_POINTS)
}

/// Checkpoint bucket for a score, `0..=TARGET_POINTS / CHECKPOINT_INTERVAL`.
pub fn checkpoint_of(points: i64) -> i64 {
    clamp_points(points) / CHECKPOINT_INTERVAL
}

/// True when moving from `old` to `new` enters a higher bucket. `old` is
/// bucketed as-is, so a score edited below zero still counts its distance.
pub fn crossed_upward(old: i64, new: i64) -> bool {
    new > 0 && checkpoint_of(new) > old.div_euclid(CHECKPOINT_INTERVAL)
}

/// A member currently being celebrated. Only one at a time.
#[derive(Debug, Clone)]
pub struct Celebration {
    pub member_id: String,
    started: Instant,
}

impl Celebration {
    pub fn new(member_id: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            started: Instant::now(),
        }
    }

    pub fn is_active(&self, window: Duration) -> bool {
        self.started.elapsed() < window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_requires_a_higher_bucket() {
        assert!(crossed_upward(95, 105));
        assert!(!crossed_upward(100, 150));
        assert!(crossed_upward(0, 100));
        assert!(!crossed_upward(105, 95));
        assert!(!crossed_upward(0, 99));
        assert!(crossed_upward(990, 1000));
    }

    #[test]
    fn crossing_from_a_negative_score_counts_unclamped_buckets() {
        assert!(crossed_upward(-250, 50));
        assert!(crossed_upward(-1, 1));
        assert!(!crossed_upward(-250, 0));
        assert!(!crossed_upward(-250, -120));
    }

    #[test]
    fn buckets_stay_on_the_track() {
        assert_eq!(checkpoint_of(-40), 0);
        assert_eq!(checkpoint_of(999), 9);
        assert_eq!(checkpoint_of(1000), 10);
        assert_eq!(checkpoint_of(2500), 10);
        assert_eq!(clamp_points(1010), TARGET_POINTS);
        assert_eq!(clamp_points(-3), 0);
    }

    #[test]
    fn celebration_expires_after_window() {
        let celebration = Celebration::new("m-1");
        assert!(celebration.is_active(Duration::from_secs(60)));
        assert!(!celebration.is_active(Duration::ZERO));
    }
}
