use bikefit::models::{
    Discipline, FitSession, Goal, IssueKey, Kpi, Landmark, PoseFrame, PoseLandmark, POSE_LANDMARK_COUNT,
};
use bikefit::services::{CaptureDevice, LiveController, UiSink};
use bikefit::{CaptureError, PipelineConfig};
use chrono::Utc;
use pretty_assertions::assert_eq;
use std::f64::consts::PI;

/// Camera stand-in that counts open/close calls
#[derive(Default)]
struct FakeCamera {
    fail_with: Option<CaptureError>,
    opened: u32,
    closed: u32,
}

impl CaptureDevice for FakeCamera {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.opened += 1;
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}

#[derive(Default)]
struct Screen {
    status: Option<(String, bool)>,
    hints: Vec<String>,
    client_lists: Vec<Vec<IssueKey>>,
    kpi_knee: String,
    kpi_stab: String,
}

impl UiSink for Screen {
    fn on_status(&mut self, text: &str, active: bool) {
        self.status = Some((text.to_string(), active));
    }
    fn on_debug(&mut self, _message: &str) {}
    fn on_coach_hint(&mut self, title: &str, _text: &str) {
        self.hints.push(title.to_string());
    }
    fn on_client_issues(&mut self, issues: &[bikefit::models::Issue]) {
        self.client_lists.push(issues.iter().map(|i| i.key).collect());
    }
    fn on_kpi(&mut self, kpi: Kpi, value: &str) {
        match kpi {
            Kpi::Knee => self.kpi_knee = value.to_string(),
            Kpi::Stability => self.kpi_stab = value.to_string(),
            _ => {}
        }
    }
}

fn square_config() -> PipelineConfig {
    PipelineConfig {
        frame_width: 1.0,
        frame_height: 1.0,
        ..PipelineConfig::default()
    }
}

/// Right-side rider pedaling at 60 rpm, sampled at ~30 fps
///
/// Torso leans 45°, elbow is bent 90° and the leg nearly locks out at the
/// bottom of the stroke (saddle too high).
fn pedaling_frame(i: u64) -> PoseFrame {
    let mut landmarks = vec![Landmark::new(0.1, 0.1, 0.02); POSE_LANDMARK_COUNT];
    let ankle_y = 0.7 + 0.1 * (2.0 * PI * i as f64 / 30.0).sin();
    let points = [
        (PoseLandmark::RightShoulder, 0.70, 0.20),
        (PoseLandmark::RightElbow, 0.70, 0.35),
        (PoseLandmark::RightWrist, 0.85, 0.35),
        (PoseLandmark::RightHip, 0.50, 0.40),
        (PoseLandmark::RightKnee, 0.52, 0.60),
        (PoseLandmark::RightAnkle, 0.50, ankle_y),
    ];
    for (landmark, x, y) in points {
        landmarks[landmark.index()] = Landmark::new(x, y, 0.95);
    }
    PoseFrame::new(i * 33, Some(landmarks))
}

/// A saddle that is too high is flagged from the BDC knee angle
#[test]
fn test_high_saddle_is_flagged_at_bdc() {
    let mut controller = LiveController::new(square_config(), FakeCamera::default(), Screen::default());
    controller.start(Discipline::Road, Goal::Neutral).unwrap();

    let mut last = None;
    for i in 0..90 {
        last = controller.process_frame(&pedaling_frame(i));
    }
    let outcome = last.unwrap();

    let knee_at_bdc = outcome.metrics.knee_at_bdc.expect("BDC should have latched");
    assert!(knee_at_bdc > 160.0 && knee_at_bdc < 175.0, "knee at BDC {}", knee_at_bdc);
    assert!(outcome.metrics.knee_at_bdc_age_ms.unwrap() <= 1000);

    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.issues[0].key, IssueKey::KneeHigh);
    assert!(outcome.issues[0].text.contains("lower the saddle"));

    let screen = controller.sink();
    assert_eq!(screen.status, Some(("ON".to_string(), true)));
    assert_eq!(screen.kpi_stab, "95%");
    assert!(screen.kpi_knee.ends_with('°'));
    // Nothing to judge before the first BDC, then the knee takes over
    assert_eq!(screen.client_lists.first(), Some(&vec![IssueKey::AllOk]));
    assert_eq!(screen.client_lists.last(), Some(&vec![IssueKey::KneeHigh]));
    assert!(screen.hints.iter().any(|h| h.contains("lower the saddle")));
}

/// Stopping and starting again behaves like a fresh session
#[test]
fn test_restart_forgets_previous_session() {
    let mut controller = LiveController::new(square_config(), FakeCamera::default(), Screen::default());
    controller.start(Discipline::Road, Goal::Neutral).unwrap();
    for i in 0..60 {
        controller.process_frame(&pedaling_frame(i));
    }
    assert!(controller.last_metrics().knee_at_bdc.is_some());

    controller.stop();
    assert_eq!(controller.sink().status, Some(("OFF".to_string(), false)));
    assert_eq!(controller.sink().kpi_knee, "—");
    assert!(controller.process_frame(&pedaling_frame(60)).is_none());

    controller.start(Discipline::Road, Goal::Neutral).unwrap();
    let outcome = controller.process_frame(&pedaling_frame(61)).unwrap();
    assert_eq!(outcome.metrics.knee_at_bdc, None);
    assert_eq!(outcome.issues[0].key, IssueKey::AllOk);
}

/// Dismissed permission is reported once and not retried
#[test]
fn test_permission_denied_is_not_retried() {
    let camera = FakeCamera {
        fail_with: Some(CaptureError::PermissionDenied("prompt dismissed".into())),
        ..FakeCamera::default()
    };
    let mut controller = LiveController::new(PipelineConfig::default(), camera, Screen::default());

    let err = controller.start(Discipline::Gravel, Goal::Aero).unwrap_err();
    assert!(err.to_string().contains("permission"));
    assert!(!controller.is_running());
    assert_eq!(controller.sink().hints, vec!["Camera unavailable".to_string()]);
    assert_eq!(controller.last_hint().title, "Camera unavailable");

    for i in 0..10 {
        assert!(controller.process_frame(&pedaling_frame(i)).is_none());
    }
}

/// A frame without a body blanks the KPIs and asks for the rider
#[test]
fn test_lost_rider_blanks_display() {
    let mut controller = LiveController::new(square_config(), FakeCamera::default(), Screen::default());
    controller.start(Discipline::Road, Goal::Neutral).unwrap();
    controller.process_frame(&pedaling_frame(0));

    controller.process_frame(&PoseFrame::new(40, Some(vec![Landmark::new(0.5, 0.5, 0.9); 5])));
    assert_eq!(controller.sink().kpi_knee, "—");
    assert_eq!(controller.sink().hints.last().map(String::as_str), Some("Looking for the rider"));

    // The next real frame replaces the hint straight away
    controller.process_frame(&pedaling_frame(2));
    assert_eq!(controller.sink().hints.last().map(String::as_str), Some("Looks good"));
}

/// A BDC latch keeps ageing while the rider is out of frame, so a capture
/// taken afterwards falls back to the instantaneous knee angle
#[test]
fn test_stale_bdc_latch_is_not_captured() {
    let mut controller = LiveController::new(square_config(), FakeCamera::default(), Screen::default());
    controller.start(Discipline::Road, Goal::Neutral).unwrap();
    for i in 0..90 {
        controller.process_frame(&pedaling_frame(i));
    }
    let latched = controller.last_metrics().knee_at_bdc.expect("BDC should have latched");

    // Ten seconds with nobody in frame
    for i in 90..390 {
        controller.process_frame(&PoseFrame::new(i * 33, None));
    }
    let metrics = *controller.last_metrics();
    let max_age = controller.config().bdc_max_age_ms;
    assert!(metrics.knee_at_bdc_age_ms.unwrap() > max_age);
    assert_eq!(metrics.fresh_knee_at_bdc(max_age), None);

    let mut session = FitSession::new();
    let saved = session
        .record_measurement(&metrics, max_age, None, Utc::now())
        .unwrap();
    assert_eq!(saved.knee, metrics.knee);
    assert_ne!(saved.knee, Some(latched));
}
