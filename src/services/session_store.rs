/// Session persistence boundary
///
/// A session is stored as a single JSON blob under one versioned key. Every
/// load goes through `validate_session`, which checks the shape, migrates
/// older records and deserializes. Anything it rejects is replaced by a
/// fresh session; load never fails upward.

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SessionError;
use crate::models::session::{FitSession, SESSION_SCHEMA_VERSION};

/// Storage key of the current session
pub const SESSION_KEY: &str = "bikefit/session/v1";

/// String key-value storage collaborator
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, used by tests and embedding hosts without storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Validate, migrate and deserialize a raw session blob
pub fn validate_session(raw: &str) -> Result<FitSession, SessionError> {
    let value: Value = serde_json::from_str(raw).map_err(SessionError::Parse)?;
    let Value::Object(mut root) = value else {
        return Err(SessionError::WrongType {
            field: "session",
            expected: "an object",
        });
    };

    for section in ["client", "body", "bike"] {
        match root.get(section) {
            Some(Value::Object(_)) => {}
            Some(Value::Null) | None => return Err(SessionError::MissingSection(section)),
            Some(_) => {
                return Err(SessionError::WrongType {
                    field: section,
                    expected: "an object",
                })
            }
        }
    }

    match root.get("measurements") {
        Some(Value::Array(_)) => {}
        Some(Value::Null) | None => return Err(SessionError::MissingSection("measurements")),
        Some(_) => {
            return Err(SessionError::WrongType {
                field: "measurements",
                expected: "an array",
            })
        }
    }

    let version = match root.get("version") {
        None | Some(Value::Null) => 1,
        Some(value) => value.as_u64().ok_or(SessionError::WrongType {
            field: "version",
            expected: "a non-negative integer",
        })?,
    };
    if version == 0 || version > SESSION_SCHEMA_VERSION {
        return Err(SessionError::UnsupportedVersion(version));
    }

    migrate_v1(&mut root);
    root.insert("version".to_string(), Value::from(SESSION_SCHEMA_VERSION));

    serde_json::from_value(Value::Object(root)).map_err(SessionError::Schema)
}

/// Bring a v1 record written by older hosts up to the current field names
fn migrate_v1(root: &mut Map<String, Value>) {
    if !matches!(root.get("bikeSetup"), Some(Value::Object(_))) {
        root.insert("bikeSetup".to_string(), Value::Object(Map::new()));
    }

    let bike = root.get("bike").cloned().unwrap_or(Value::Null);
    let Some(Value::Array(measurements)) = root.get_mut("measurements") else {
        return;
    };

    for measurement in measurements.iter_mut() {
        let Value::Object(m) = measurement else {
            continue;
        };
        rename_field(m, "ts", "timestamp");
        rename_field(m, "imgDataUrl", "imageData");

        // Old captures stored stability as a 0-1 fraction
        if let Some(stab) = m.remove("stab") {
            if !m.contains_key("stability") {
                let percent = stab.as_f64().map(|s| if s <= 1.0 { s * 100.0 } else { s });
                m.insert("stability".to_string(), percent.map_or(Value::Null, Value::from));
            }
        }

        for field in ["discipline", "goal"] {
            if !m.contains_key(field) {
                let fallback = bike.get(field).cloned().unwrap_or(Value::Null);
                if !fallback.is_null() {
                    m.insert(field.to_string(), fallback);
                }
            }
        }
    }
}

fn rename_field(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        if !map.contains_key(to) {
            map.insert(to.to_string(), value);
        }
    }
}

pub fn serialize_session(session: &FitSession) -> Result<String, SessionError> {
    serde_json::to_string(session).map_err(SessionError::Serialize)
}

/// Loads and saves the session through a key-value store
pub struct SessionStore<K: KeyValueStore> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(store: K) -> Self {
        Self::with_key(store, SESSION_KEY)
    }

    pub fn with_key(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the stored session, or a fresh one if none is usable
    pub fn load(&self) -> FitSession {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return FitSession::new(),
            Err(err) => {
                tracing::warn!("Could not read session, starting fresh: {:#}", err);
                return FitSession::new();
            }
        };

        match validate_session(&raw) {
            Ok(session) => {
                tracing::debug!("Loaded session with {} measurements", session.measurements.len());
                session
            }
            Err(err) => {
                tracing::warn!("Stored session rejected, starting fresh: {}", err);
                FitSession::new()
            }
        }
    }

    pub fn save(&self, session: &FitSession) -> Result<()> {
        let raw = serialize_session(session)?;
        self.store.set(&self.key, &raw)?;
        tracing::debug!("Saved session ({} bytes)", raw.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    pub fn inner(&self) -> &K {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::Metrics;
    use crate::models::preset::{Discipline, Goal};
    use assert_matches::assert_matches;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn session_with_captures() -> FitSession {
        let mut session = FitSession::new();
        session.client.name = "Jan".to_string();
        session.body.inseam_cm = "84".to_string();
        session.bike_setup.saddle_height = "735".to_string();
        session.set_profile(Discipline::Gravel, Goal::Comfort);

        let metrics = Metrics {
            knee: Some(139.5),
            elbow: Some(101.0),
            torso: Some(44.2),
            stability: Some(81.0),
            ..Metrics::default()
        };
        for _ in 0..3 {
            session
                .record_measurement(&metrics, 2500, Some("data:image/jpeg;base64,/9j/".into()), Utc::now())
                .unwrap();
        }
        session
    }

    #[test]
    fn test_round_trip_preserves_session() {
        let session = session_with_captures();
        let raw = serialize_session(&session).unwrap();
        let restored = validate_session(&raw).unwrap();

        assert_eq!(restored, session);
        let labels: Vec<_> = restored.measurements.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["BEFORE", "AFTER", "AFTER 2"]);
    }

    proptest! {
        #[test]
        fn prop_computed_angles_survive_round_trip(
            knee in 0.0f64..180.0,
            elbow in 0.0f64..180.0,
            torso in -90.0f64..90.0,
            stability in proptest::num::f64::NORMAL | proptest::num::f64::ZERO,
        ) {
            let mut session = FitSession::new();
            let metrics = Metrics {
                knee: Some(knee),
                elbow: Some(elbow),
                torso: Some(torso),
                stability: Some(stability),
                ..Metrics::default()
            };
            session.record_measurement(&metrics, 2500, None, Utc::now()).unwrap();

            let restored = validate_session(&serialize_session(&session).unwrap()).unwrap();
            prop_assert_eq!(restored, session);
        }
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let raw = json!({"client": {}, "body": {}, "measurements": []}).to_string();
        assert_matches!(validate_session(&raw), Err(SessionError::MissingSection("bike")));
    }

    #[test]
    fn test_measurements_must_be_an_array() {
        let raw = json!({"client": {}, "body": {}, "bike": {}, "measurements": {}}).to_string();
        assert_matches!(
            validate_session(&raw),
            Err(SessionError::WrongType { field: "measurements", .. })
        );
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert_matches!(validate_session("{not json"), Err(SessionError::Parse(_)));
        assert_matches!(validate_session("[]"), Err(SessionError::WrongType { .. }));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let raw = json!({"version": 9, "client": {}, "body": {}, "bike": {}, "measurements": []}).to_string();
        assert_matches!(validate_session(&raw), Err(SessionError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_legacy_record_is_migrated() {
        let raw = json!({
            "client": {"name": "Ola", "date": "2024-05-01", "notes": ""},
            "body": {"heightCm": "170", "inseamCm": "", "footCm": "", "armsCm": ""},
            "bike": {"discipline": "mtb", "goal": "comfort"},
            "measurements": [{
                "id": "abc-1",
                "ts": 1714550400000_i64,
                "label": "BEFORE",
                "knee": 141.2,
                "elbow": null,
                "torso": 38.0,
                "stab": 0.72,
                "imgDataUrl": "data:image/jpeg;base64,AA=="
            }]
        })
        .to_string();

        let session = validate_session(&raw).unwrap();
        assert_eq!(session.version, SESSION_SCHEMA_VERSION);
        assert!(session.bike_setup.is_empty());
        assert_eq!(session.client.name, "Ola");

        let m = &session.measurements[0];
        assert_eq!(m.timestamp.timestamp_millis(), 1_714_550_400_000);
        assert_eq!(m.discipline, Discipline::Mtb);
        assert_eq!(m.goal, Goal::Comfort);
        assert!((m.stability.unwrap() - 72.0).abs() < 1e-9);
        assert_eq!(m.image_data.as_deref(), Some("data:image/jpeg;base64,AA=="));
        assert_eq!(m.elbow, None);
    }

    #[test]
    fn test_store_falls_back_to_default() {
        let store = SessionStore::new(MemoryStore::new());
        assert!(store.load().measurements.is_empty());

        store.inner().set(SESSION_KEY, "{\"client\": 3}").unwrap();
        let session = store.load();
        assert!(session.client.name.is_empty());
        assert_eq!(session.version, SESSION_SCHEMA_VERSION);
    }

    #[test]
    fn test_store_save_load_clear() {
        let store = SessionStore::new(MemoryStore::new());
        let session = session_with_captures();

        store.save(&session).unwrap();
        assert_eq!(store.load(), session);

        store.clear().unwrap();
        assert_eq!(store.inner().get(SESSION_KEY).unwrap(), None);
    }
}
