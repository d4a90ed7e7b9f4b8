/// Per-frame transform: landmarks in, metrics (and issues) out
///
/// Owns all rolling state of one capture session. Hosts call it from a
/// single event loop, one frame at a time.

use crate::config::PipelineConfig;
use crate::models::issue::Issue;
use crate::models::landmark::{side_landmarks, Landmark, Side};
use crate::models::metrics::Metrics;
use crate::models::preset::Preset;
use crate::services::advice_engine::evaluate_issues;
use crate::services::angle_engine::AngleEngine;
use crate::services::bdc_detector::BdcDetector;
use crate::services::landmark_smoother::{LandmarkSmoother, SideLocker};

#[derive(Debug, Clone)]
pub struct FramePipeline {
    config: PipelineConfig,
    side_locker: SideLocker,
    smoother: LandmarkSmoother,
    angle_engine: AngleEngine,
    bdc: BdcDetector,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            side_locker: SideLocker::new(config.side_lock_frames),
            smoother: LandmarkSmoother::from_config(&config),
            angle_engine: AngleEngine::from_config(&config),
            bdc: BdcDetector::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Measure one frame of landmarks
    pub fn process(&mut self, landmarks: &[Landmark], now_ms: u64) -> Metrics {
        let left = side_landmarks(landmarks, Side::Left);
        let right = side_landmarks(landmarks, Side::Right);
        let side = self.side_locker.select_side(&left, &right);
        let raw = match side {
            Side::Left => left,
            Side::Right => right,
        };

        let points = self.smoother.smooth_side(&raw);
        let angles = self.angle_engine.compute(&points, &raw);

        // A frozen ankle would fake a turning point, so only fresh samples feed BDC
        let ankle_y = raw
            .ankle
            .filter(|lm| lm.is_visible(self.config.min_visibility))
            .and(points.ankle)
            .map(|p| p.y);
        self.bdc.update(ankle_y, angles.knee, now_ms);

        Metrics {
            side: Some(side),
            knee: angles.knee,
            elbow: angles.elbow,
            torso: angles.torso,
            stability: Some(angles.stability),
            knee_at_bdc: self.bdc.latch().map(|latch| latch.knee),
            knee_at_bdc_age_ms: self.bdc.age_ms(now_ms),
        }
    }

    /// Measure a frame and evaluate it against a preset
    pub fn analyze(&mut self, landmarks: &[Landmark], preset: &Preset, now_ms: u64) -> (Metrics, Vec<Issue>) {
        let metrics = self.process(landmarks, now_ms);
        let issues = evaluate_issues(
            &metrics,
            preset,
            self.config.min_stability,
            self.config.bdc_max_age_ms,
        );
        (metrics, issues)
    }

    /// Age of the current BDC latch at `now_ms`
    pub fn bdc_age_ms(&self, now_ms: u64) -> Option<u64> {
        self.bdc.age_ms(now_ms)
    }

    pub fn locked_side(&self) -> Option<Side> {
        self.side_locker.locked_side()
    }

    /// Drop side lock, smoothing and BDC history
    pub fn reset(&mut self) {
        self.side_locker.reset();
        self.smoother.reset();
        self.bdc.reset();
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::IssueKey;
    use crate::models::landmark::{PoseLandmark, POSE_LANDMARK_COUNT};
    use crate::models::preset::{Discipline, Goal};
    use crate::services::preset_resolver::resolve;

    fn square_config() -> PipelineConfig {
        PipelineConfig {
            frame_width: 1.0,
            frame_height: 1.0,
            ..PipelineConfig::default()
        }
    }

    /// Right-side rider with a straight vertical leg
    fn frame(ankle_y: f64, visibility: f64) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(0.0, 0.0, 0.05); POSE_LANDMARK_COUNT];
        let mut set = |lm: PoseLandmark, x: f64, y: f64| {
            lms[lm.index()] = Landmark::new(x, y, visibility);
        };
        set(PoseLandmark::RightShoulder, 0.5, 0.2);
        set(PoseLandmark::RightElbow, 0.6, 0.3);
        set(PoseLandmark::RightWrist, 0.7, 0.3);
        set(PoseLandmark::RightHip, 0.5, 0.5);
        set(PoseLandmark::RightKnee, 0.5, 0.6);
        set(PoseLandmark::RightAnkle, 0.5, ankle_y);
        lms
    }

    #[test]
    fn test_process_measures_tracked_side() {
        let mut pipeline = FramePipeline::new(square_config());
        let metrics = pipeline.process(&frame(0.7, 0.9), 0);

        assert_eq!(metrics.side, Some(Side::Right));
        assert_eq!(pipeline.locked_side(), Some(Side::Right));
        assert!((metrics.knee.unwrap() - 180.0).abs() < 1e-4);
        assert!(metrics.torso.unwrap().abs() < 1e-9);
        assert!((metrics.stability.unwrap() - 90.0).abs() < 1e-9);
        assert!(metrics.knee_at_bdc.is_none());
    }

    #[test]
    fn test_occluded_ankle_does_not_fake_bdc() {
        let mut pipeline = FramePipeline::new(square_config());
        pipeline.process(&frame(0.70, 0.9), 0);
        pipeline.process(&frame(0.72, 0.9), 33);
        pipeline.process(&frame(0.74, 0.9), 66);

        // Ankle drops out: smoothed position freezes, BDC must not fire
        let mut occluded = frame(0.74, 0.9);
        occluded[PoseLandmark::RightAnkle.index()].visibility = 0.1;
        let metrics = pipeline.process(&occluded, 99);
        assert!(metrics.knee_at_bdc.is_none());
    }

    #[test]
    fn test_analyze_reports_low_stability() {
        let mut pipeline = FramePipeline::new(square_config());
        let preset = resolve(Discipline::Road, Goal::Neutral);

        let (metrics, issues) = pipeline.analyze(&frame(0.7, 0.4), &preset, 0);
        assert!((metrics.stability.unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, IssueKey::StabLow);
    }

    #[test]
    fn test_reset_unlocks_side() {
        let mut pipeline = FramePipeline::new(square_config());
        pipeline.process(&frame(0.7, 0.9), 0);
        pipeline.reset();
        assert_eq!(pipeline.locked_side(), None);
    }
}
