/// Landmark Smoothing Service
///
/// Keeps the live signal steady across frames:
/// - Side locking: pick the body side facing the camera once per session
/// - Exponential moving average per tracked joint
/// - Freeze-on-occlusion: low-visibility landmarks never move a smoothed point

use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::models::landmark::{Joint, JointPoints, JointSet, Landmark, Point, Side, SideLandmarks};

/// Chooses the tracked side and holds it until reset
#[derive(Debug, Clone)]
pub struct SideLocker {
    /// Consecutive agreeing frames required to lock
    lock_frames: usize,
    candidate: Option<(Side, usize)>,
    locked: Option<Side>,
}

impl SideLocker {
    pub fn new(lock_frames: usize) -> Self {
        Self {
            lock_frames: lock_frames.max(1),
            candidate: None,
            locked: None,
        }
    }

    /// Side with the higher summed visibility; ties go left
    pub fn pick_side(left: &SideLandmarks, right: &SideLandmarks) -> Side {
        if right.total_visibility() > left.total_visibility() {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Select the tracked side, locking it once enough frames agree
    pub fn select_side(&mut self, left: &SideLandmarks, right: &SideLandmarks) -> Side {
        if let Some(side) = self.locked {
            return side;
        }

        let winner = Self::pick_side(left, right);
        if left.total_visibility() == 0.0 && right.total_visibility() == 0.0 {
            return winner;
        }

        let count = match self.candidate {
            Some((side, n)) if side == winner => n + 1,
            _ => 1,
        };
        self.candidate = Some((winner, count));

        if count >= self.lock_frames {
            tracing::debug!("Locked tracked side {:?} after {} frame(s)", winner, count);
            self.locked = Some(winner);
        }

        winner
    }

    pub fn locked_side(&self) -> Option<Side> {
        self.locked
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.locked = None;
    }
}

/// Exponential smoother for the tracked joints
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    /// EMA factor (weight of the new sample)
    alpha: f64,
    /// Landmarks below this visibility are ignored
    min_visibility: f64,
    points: HashMap<Joint, Point>,
}

impl LandmarkSmoother {
    pub fn new(alpha: f64, min_visibility: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            min_visibility,
            points: HashMap::with_capacity(Joint::ALL.len()),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.smoothing_alpha, config.min_visibility)
    }

    /// Smooth one joint
    ///
    /// A missing or low-visibility landmark returns the stored point
    /// unchanged, or the raw position when nothing is stored yet.
    pub fn smooth(&mut self, joint: Joint, raw: Option<&Landmark>) -> Option<Point> {
        let previous = self.points.get(&joint).copied();

        let raw = match raw {
            Some(lm) if lm.is_visible(self.min_visibility) => lm.point(),
            Some(lm) if lm.is_finite() => return previous.or(Some(lm.point())),
            _ => return previous,
        };

        let smoothed = match previous {
            Some(prev) => Point::new(
                prev.x + self.alpha * (raw.x - prev.x),
                prev.y + self.alpha * (raw.y - prev.y),
            ),
            None => raw,
        };

        self.points.insert(joint, smoothed);
        Some(smoothed)
    }

    /// Smooth all six joints of the tracked side
    pub fn smooth_side(&mut self, landmarks: &SideLandmarks) -> JointPoints {
        JointSet::from_fn(|joint| self.smooth(joint, landmarks.get(joint).as_ref()))
    }

    pub fn get(&self, joint: Joint) -> Option<Point> {
        self.points.get(&joint).copied()
    }

    /// Reset temporal smoothing state
    pub fn reset(&mut self) {
        self.points.clear();
    }
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
