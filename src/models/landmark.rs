/// Pose landmark models
///
/// Landmarks arrive from the pose source in normalized image coordinates
/// (0-1 on both axes, Y growing downward) with a visibility score. Only the
/// six joints per side that matter for a side-on bike fit are tracked.

use serde::{Deserialize, Serialize};

/// Number of landmarks a complete pose result carries
pub const POSE_LANDMARK_COUNT: usize = 33;

/// A single body keypoint as delivered by the pose source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate (normalized 0-1)
    pub x: f64,
    /// Y coordinate (normalized 0-1, downward)
    pub y: f64,
    /// Detection visibility (0-1)
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Visibility clamped to [0, 1]; NaN counts as invisible
    pub fn visibility(&self) -> f64 {
        if self.visibility.is_nan() {
            0.0
        } else {
            self.visibility.clamp(0.0, 1.0)
        }
    }

    /// Check the landmark is trustworthy enough to move a smoothed point
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.is_finite() && self.visibility() >= min_visibility
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A bare 2D position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale normalized coordinates into pixel space
    pub fn scaled(&self, width: f64, height: f64) -> Point {
        Point::new(self.x * width, self.y * height)
    }
}

/// MediaPipe Pose landmark indices used by the fit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseLandmark {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

impl PoseLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Body side facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// Joints tracked on one side of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl Joint {
    pub const ALL: [Joint; 6] = [
        Joint::Shoulder,
        Joint::Elbow,
        Joint::Wrist,
        Joint::Hip,
        Joint::Knee,
        Joint::Ankle,
    ];

    /// Pose source index of this joint on the given side
    pub fn landmark(self, side: Side) -> PoseLandmark {
        use PoseLandmark::*;
        match (self, side) {
            (Joint::Shoulder, Side::Left) => LeftShoulder,
            (Joint::Shoulder, Side::Right) => RightShoulder,
            (Joint::Elbow, Side::Left) => LeftElbow,
            (Joint::Elbow, Side::Right) => RightElbow,
            (Joint::Wrist, Side::Left) => LeftWrist,
            (Joint::Wrist, Side::Right) => RightWrist,
            (Joint::Hip, Side::Left) => LeftHip,
            (Joint::Hip, Side::Right) => RightHip,
            (Joint::Knee, Side::Left) => LeftKnee,
            (Joint::Knee, Side::Right) => RightKnee,
            (Joint::Ankle, Side::Left) => LeftAnkle,
            (Joint::Ankle, Side::Right) => RightAnkle,
        }
    }
}

/// One value per tracked joint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointSet<T> {
    pub shoulder: T,
    pub elbow: T,
    pub wrist: T,
    pub hip: T,
    pub knee: T,
    pub ankle: T,
}

impl<T> JointSet<T> {
    pub fn get(&self, joint: Joint) -> &T {
        match joint {
            Joint::Shoulder => &self.shoulder,
            Joint::Elbow => &self.elbow,
            Joint::Wrist => &self.wrist,
            Joint::Hip => &self.hip,
            Joint::Knee => &self.knee,
            Joint::Ankle => &self.ankle,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Joint) -> T) -> Self {
        Self {
            shoulder: f(Joint::Shoulder),
            elbow: f(Joint::Elbow),
            wrist: f(Joint::Wrist),
            hip: f(Joint::Hip),
            knee: f(Joint::Knee),
            ankle: f(Joint::Ankle),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Joint, &T) -> U) -> JointSet<U> {
        JointSet::from_fn(|joint| f(joint, self.get(joint)))
    }
}

/// Raw landmarks for one side; `None` where the pose source gave nothing usable
pub type SideLandmarks = JointSet<Option<Landmark>>;

/// Smoothed positions for the tracked side
pub type JointPoints = JointSet<Option<Point>>;

impl SideLandmarks {
    /// Visibility of a joint, zero when missing
    pub fn visibility(&self, joint: Joint) -> f64 {
        self.get(joint).map_or(0.0, |lm| lm.visibility())
    }

    /// Summed visibility of all six joints
    pub fn total_visibility(&self) -> f64 {
        Joint::ALL.iter().map(|&joint| self.visibility(joint)).sum()
    }
}

/// One pose source result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Frame timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Ordered landmarks, or `None` when no body was detected
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
}

impl PoseFrame {
    pub fn new(timestamp_ms: u64, landmarks: Option<Vec<Landmark>>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    /// Landmarks when the result is a complete body, `None` otherwise
    pub fn complete_landmarks(&self) -> Option<&[Landmark]> {
        self.landmarks
            .as_deref()
            .filter(|lms| lms.len() >= POSE_LANDMARK_COUNT)
    }
}

/// Pick one side's tracked joints out of a full landmark list
pub fn side_landmarks(landmarks: &[Landmark], side: Side) -> SideLandmarks {
    JointSet::from_fn(|joint| {
        landmarks
            .get(joint.landmark(side).index())
            .copied()
            .filter(Landmark::is_finite)
    })
}
