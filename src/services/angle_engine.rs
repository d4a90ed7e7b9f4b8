/// Joint angle calculations
///
/// All angles are computed in pixel space so that non-square frames do not
/// skew them. Torso lean is measured from vertical: 0° is upright and the
/// value grows as the rider leans forward.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::models::landmark::{Joint, JointPoints, Point, SideLandmarks};

/// Rays shorter than this are treated as degenerate
const MIN_RAY_LENGTH: f64 = 1e-6;

/// Angle at `b` between rays b→a and b→c, in degrees
///
/// Returns `None` when either ray has (near) zero length.
pub fn joint_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let (ba_x, ba_y) = (a.x - b.x, a.y - b.y);
    let (bc_x, bc_y) = (c.x - b.x, c.y - b.y);

    let mag_ba = ba_x.hypot(ba_y);
    let mag_bc = bc_x.hypot(bc_y);
    if !(mag_ba >= MIN_RAY_LENGTH && mag_bc >= MIN_RAY_LENGTH) {
        return None;
    }

    let cos_angle = (ba_x * bc_x + ba_y * bc_y) / (mag_ba * mag_bc);
    Some(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Torso lean from vertical, measured at the hip
///
/// Image Y grows downward, so the vertical reference sits at a smaller Y.
pub fn torso_angle(hip: Point, shoulder: Point) -> Option<f64> {
    let vertical = Point::new(hip.x, hip.y - 1.0);
    joint_angle(vertical, hip, shoulder)
}

/// Mean visibility of the six tracked joints as a percentage
pub fn stability(landmarks: &SideLandmarks) -> f64 {
    landmarks.total_visibility() / Joint::ALL.len() as f64 * 100.0
}

/// Angles derived from one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointAngles {
    pub knee: Option<f64>,
    pub elbow: Option<f64>,
    pub torso: Option<f64>,
    /// 0-100
    pub stability: f64,
}

/// Computes joint angles from tracked points
#[derive(Debug, Clone)]
pub struct AngleEngine {
    frame_width: f64,
    frame_height: f64,
}

impl AngleEngine {
    pub fn new(frame_width: f64, frame_height: f64) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.frame_width, config.frame_height)
    }

    fn to_pixels(&self, point: Option<Point>) -> Option<Point> {
        point.map(|p| p.scaled(self.frame_width, self.frame_height))
    }

    /// Calculate knee, elbow and torso angles plus stability
    ///
    /// # Arguments
    /// * `points` - Smoothed (or frozen) normalized positions of the tracked side
    /// * `raw` - Raw landmarks of the same side, for visibility
    pub fn compute(&self, points: &JointPoints, raw: &SideLandmarks) -> JointAngles {
        let px = points.map(|_, p| self.to_pixels(*p));

        let knee = match (px.hip, px.knee, px.ankle) {
            (Some(hip), Some(knee), Some(ankle)) => joint_angle(hip, knee, ankle),
            _ => None,
        };
        let elbow = match (px.shoulder, px.elbow, px.wrist) {
            (Some(shoulder), Some(elbow), Some(wrist)) => joint_angle(shoulder, elbow, wrist),
            _ => None,
        };
        let torso = match (px.hip, px.shoulder) {
            (Some(hip), Some(shoulder)) => torso_angle(hip, shoulder),
            _ => None,
        };

        JointAngles {
            knee,
            elbow,
            torso,
            stability: stability(raw),
        }
    }
}

impl Default for AngleEngine {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmark::{JointSet, Landmark};
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_line_is_180() {
        let angle = joint_angle(p(0.0, 0.0), p(0.5, 0.5), p(1.0, 1.0)).unwrap();
        assert!((angle - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_folded_back_is_zero() {
        let angle = joint_angle(p(1.0, 2.0), p(0.0, 0.0), p(1.0, 2.0)).unwrap();
        assert!(angle.abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_ray_is_none() {
        assert!(joint_angle(p(0.3, 0.3), p(0.3, 0.3), p(1.0, 1.0)).is_none());
        assert!(joint_angle(p(0.0, 0.0), p(0.3, 0.3), p(0.3, 0.3)).is_none());
    }

    #[test]
    fn test_torso_convention() {
        let hip = p(100.0, 100.0);
        assert!(torso_angle(hip, p(100.0, 50.0)).unwrap().abs() < 1e-9);
        assert!((torso_angle(hip, p(150.0, 50.0)).unwrap() - 45.0).abs() < 1e-9);
        assert!((torso_angle(hip, p(150.0, 100.0)).unwrap() - 90.0).abs() < 1e-9);
        // Leaning the other way is symmetric
        assert!((torso_angle(hip, p(50.0, 50.0)).unwrap() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_engine_scales_to_pixels() {
        // 45° in normalized space on a 2:1 frame is not 45° on screen
        let engine = AngleEngine::new(200.0, 100.0);
        let points: JointPoints = JointSet {
            hip: Some(p(0.5, 0.5)),
            shoulder: Some(p(0.6, 0.4)),
            ..JointSet::default()
        };
        let angles = engine.compute(&points, &SideLandmarks::default());
        let expected = (20.0f64).atan2(10.0).to_degrees();
        assert!((angles.torso.unwrap() - expected).abs() < 1e-9);
        assert!(angles.knee.is_none());
        assert!(angles.elbow.is_none());
        assert_eq!(angles.stability, 0.0);
    }

    #[test]
    fn test_stability_is_mean_visibility() {
        let raw: SideLandmarks = JointSet {
            shoulder: Some(Landmark::new(0.5, 0.2, 0.9)),
            elbow: Some(Landmark::new(0.6, 0.3, 0.6)),
            wrist: None,
            hip: Some(Landmark::new(0.4, 0.5, 1.0)),
            knee: Some(Landmark::new(0.5, 0.7, 0.8)),
            ankle: Some(Landmark::new(0.45, 0.9, 0.7)),
        };
        assert!((stability(&raw) - 400.0 / 6.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_angle_in_range(
            ax in -1.0f64..2.0, ay in -1.0f64..2.0,
            bx in -1.0f64..2.0, by in -1.0f64..2.0,
            cx in -1.0f64..2.0, cy in -1.0f64..2.0,
        ) {
            if let Some(angle) = joint_angle(p(ax, ay), p(bx, by), p(cx, cy)) {
                prop_assert!((0.0..=180.0).contains(&angle));
            }
        }

        #[test]
        fn prop_angle_symmetric(
            ax in -1.0f64..2.0, ay in -1.0f64..2.0,
            bx in -1.0f64..2.0, by in -1.0f64..2.0,
            cx in -1.0f64..2.0, cy in -1.0f64..2.0,
        ) {
            let forward = joint_angle(p(ax, ay), p(bx, by), p(cx, cy));
            let backward = joint_angle(p(cx, cy), p(bx, by), p(ax, ay));
            match (forward, backward) {
                (Some(f), Some(b)) => prop_assert!((f - b).abs() < 1e-9),
                (None, None) => {}
                _ => prop_assert!(false, "degeneracy must be symmetric"),
            }
        }
    }
}
