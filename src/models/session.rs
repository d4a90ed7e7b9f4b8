use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::issue::AngleKind;
use super::metrics::Metrics;
use super::preset::{Discipline, Goal};
use crate::error::SessionError;

/// Schema version written with every session
pub const SESSION_SCHEMA_VERSION: u64 = 1;

fn default_version() -> u64 {
    SESSION_SCHEMA_VERSION
}

/// Persisted fitting session: client intake plus captured measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSession {
    #[serde(default = "default_version")]
    pub version: u64,
    pub client: ClientInfo,
    pub body: BodyMeasurements,
    pub bike: BikeSelection,
    #[serde(default)]
    pub bike_setup: BikeSetup,
    /// Append-only, in capture order
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub name: String,
    /// Session date (YYYY-MM-DD)
    pub date: String,
    pub notes: String,
}

/// Anthropometrics as entered by the operator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyMeasurements {
    pub height_cm: String,
    pub inseam_cm: String,
    pub foot_cm: String,
    pub arms_cm: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BikeSelection {
    pub discipline: Discipline,
    pub goal: Goal,
}

/// The client's current bike, recorded for the report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BikeSetup {
    pub bike_model: String,
    pub frame_size: String,
    pub stem_len: String,
    pub stem_angle: String,
    pub bar_width: String,
    pub bar_height: String,
    pub saddle_model: String,
    pub saddle_height: String,
    pub saddle_setback: String,
    pub saddle_tilt: String,
    pub crank_len: String,
    pub q_factor: String,
    pub cleat_fore_aft: String,
    pub cleat_lateral: String,
    pub bike_notes: String,
}

impl BikeSetup {
    pub fn is_empty(&self) -> bool {
        *self == BikeSetup::default()
    }
}

/// A captured snapshot of live metrics; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub discipline: Discipline,
    pub goal: Goal,
    pub knee: Option<f64>,
    pub elbow: Option<f64>,
    pub torso: Option<f64>,
    /// Stability at capture (0-100)
    pub stability: Option<f64>,
    /// Captured frame as a `data:image/jpeg;base64,...` URL
    #[serde(default)]
    pub image_data: Option<String>,
}

impl Measurement {
    pub fn angle(&self, kind: AngleKind) -> Option<f64> {
        match kind {
            AngleKind::Knee => self.knee,
            AngleKind::Torso => self.torso,
            AngleKind::Elbow => self.elbow,
        }
    }
}

impl Default for FitSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FitSession {
    /// Create an empty session dated today
    pub fn new() -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            client: ClientInfo {
                date: Local::now().format("%Y-%m-%d").to_string(),
                ..ClientInfo::default()
            },
            body: BodyMeasurements::default(),
            bike: BikeSelection::default(),
            bike_setup: BikeSetup::default(),
            measurements: Vec::new(),
        }
    }

    /// Reset client data and drop every measurement
    pub fn clear(&mut self) {
        *self = FitSession::new();
    }

    pub fn set_profile(&mut self, discipline: Discipline, goal: Goal) {
        self.bike = BikeSelection { discipline, goal };
    }

    /// Label for the next capture: BEFORE, AFTER, AFTER 2, ...
    pub fn suggest_label(&self) -> String {
        match self.measurements.len() {
            0 => "BEFORE".to_string(),
            1 => "AFTER".to_string(),
            n => format!("AFTER {}", n),
        }
    }

    pub fn find_measurement(&self, id: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.id == id)
    }

    /// Append a measurement built from the latest live metrics
    ///
    /// The knee value is the fresh BDC-latched angle when one exists and the
    /// instantaneous angle otherwise.
    pub fn record_measurement(
        &mut self,
        metrics: &Metrics,
        bdc_max_age_ms: u64,
        image_data: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&Measurement, SessionError> {
        let knee = metrics.display_knee(bdc_max_age_ms);
        if metrics.stability.is_none() && knee.is_none() {
            return Err(SessionError::NoLiveData);
        }

        let timestamp = DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let measurement = Measurement {
            id: Uuid::new_v4().to_string(),
            timestamp,
            label: self.suggest_label(),
            discipline: self.bike.discipline,
            goal: self.bike.goal,
            knee,
            elbow: metrics.elbow,
            torso: metrics.torso,
            stability: metrics.stability,
            image_data,
        };

        tracing::debug!("Recorded measurement {} ({})", measurement.id, measurement.label);
        self.measurements.push(measurement);
        Ok(&self.measurements[self.measurements.len() - 1])
    }
}
