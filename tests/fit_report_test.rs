use bikefit::models::{Discipline, FitSession, Goal, Landmark, Metrics, PoseFrame, PoseLandmark, POSE_LANDMARK_COUNT};
use bikefit::services::report_comparator::NO_CHANGE_LINE;
use bikefit::services::{select_pair, FramePipeline, KeyValueStore, MemoryStore, ReportComparator, SessionStore, SESSION_KEY};
use bikefit::{PipelineConfig, SessionError};
use chrono::{TimeZone, Utc};
use std::f64::consts::PI;

fn rider(i: u64, saddle_drop: f64) -> PoseFrame {
    let mut landmarks = vec![Landmark::new(0.1, 0.1, 0.02); POSE_LANDMARK_COUNT];
    let ankle_y = 0.7 - saddle_drop + 0.1 * (2.0 * PI * i as f64 / 30.0).sin();
    let points = [
        (PoseLandmark::LeftShoulder, 0.30, 0.20),
        (PoseLandmark::LeftElbow, 0.30, 0.35),
        (PoseLandmark::LeftWrist, 0.15, 0.35),
        (PoseLandmark::LeftHip, 0.50, 0.40),
        (PoseLandmark::LeftKnee, 0.48, 0.60),
        (PoseLandmark::LeftAnkle, 0.50, ankle_y),
    ];
    for (landmark, x, y) in points {
        landmarks[landmark.index()] = Landmark::new(x, y, 0.9);
    }
    PoseFrame::new(i * 33, Some(landmarks))
}

/// Run a short clip and return the last metrics
fn measure_clip(saddle_drop: f64) -> Metrics {
    let config = PipelineConfig {
        frame_width: 1.0,
        frame_height: 1.0,
        ..PipelineConfig::default()
    };
    let mut pipeline = FramePipeline::new(config);
    let mut metrics = Metrics::default();
    for i in 0..75 {
        let frame = rider(i, saddle_drop);
        if let Some(landmarks) = frame.complete_landmarks() {
            metrics = pipeline.process(landmarks, frame.timestamp_ms);
        }
    }
    metrics
}

/// Lowering the ankle path (a lower saddle) bends the knee at BDC
#[test]
fn test_before_after_report_after_saddle_change() {
    let mut session = FitSession::new();
    session.client.name = "Test Rider".to_string();

    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    let before_metrics = measure_clip(0.0);
    let after_metrics = measure_clip(0.12);
    assert!(before_metrics.knee_at_bdc.unwrap() > after_metrics.knee_at_bdc.unwrap());

    session.record_measurement(&before_metrics, 2500, None, t0).unwrap();
    session
        .record_measurement(&after_metrics, 2500, None, t0 + chrono::Duration::minutes(5))
        .unwrap();

    let (before, after) = select_pair(&session.measurements, None, None).unwrap();
    assert_eq!((before.label.as_str(), after.label.as_str()), ("BEFORE", "AFTER"));

    let lines = ReportComparator::default().compare(before, after);
    assert!(lines[0].starts_with("Knee angle changed by -"), "{:?}", lines);
    assert!(lines[0].contains("saddle height"));
    assert!(!lines.contains(&NO_CHANGE_LINE.to_string()));
}

/// In-range captures without real change produce the single "very similar" line
#[test]
fn test_repeat_capture_is_very_similar() {
    let metrics = Metrics {
        knee: Some(120.0),
        elbow: Some(100.0),
        torso: Some(40.0),
        stability: Some(85.0),
        knee_at_bdc: Some(145.0),
        knee_at_bdc_age_ms: Some(200),
        ..Metrics::default()
    };
    let mut session = FitSession::new();
    session.set_profile(Discipline::Mtb, Goal::Comfort);
    session.record_measurement(&metrics, 2500, None, Utc::now()).unwrap();
    session.record_measurement(&metrics, 2500, None, Utc::now()).unwrap();

    let (before, after) = select_pair(&session.measurements, None, None).unwrap();
    let lines = ReportComparator::default().compare(before, after);
    assert_eq!(lines, vec![NO_CHANGE_LINE.to_string()]);
}

/// Sessions survive the store and garbage degrades to a fresh session
#[test]
fn test_session_persists_through_store() {
    let store = SessionStore::new(MemoryStore::new());
    let mut session = store.load();
    assert!(session.measurements.is_empty());

    session.client.name = "Marta".to_string();
    session.bike_setup.stem_len = "100".to_string();
    session.record_measurement(&measure_clip(0.0), 2500, None, Utc::now()).unwrap();
    store.save(&session).unwrap();

    let reloaded = store.load();
    assert_eq!(reloaded, session);

    store.inner().set(SESSION_KEY, "\"just a string\"").unwrap();
    let fresh = store.load();
    assert!(fresh.client.name.is_empty());
    assert!(fresh.measurements.is_empty());
}

#[test]
fn test_capture_requires_live_data() {
    let mut session = FitSession::new();
    let err = session
        .record_measurement(&Metrics::default(), 2500, None, Utc::now())
        .unwrap_err();
    assert!(matches!(err, SessionError::NoLiveData));
}
