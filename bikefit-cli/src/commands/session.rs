use anyhow::{bail, Context, Result};
use bikefit::models::{BikeSetup, Discipline, Goal};
use bikefit::services::session_store::{serialize_session, validate_session};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::storage::open_session_store;
use crate::ui::print_session;

/// Optional client/body fields from the command line
#[derive(Debug, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub height: Option<String>,
    pub inseam: Option<String>,
    pub foot: Option<String>,
    pub arms: Option<String>,
}

pub fn show_session(config: &Config) -> Result<()> {
    let store = open_session_store(config)?;
    print_session(&store.load());
    Ok(())
}

pub fn update_client(config: &Config, update: ClientUpdate) -> Result<()> {
    let store = open_session_store(config)?;
    let mut session = store.load();

    let fields = [
        (update.name, &mut session.client.name),
        (update.date, &mut session.client.date),
        (update.notes, &mut session.client.notes),
        (update.height, &mut session.body.height_cm),
        (update.inseam, &mut session.body.inseam_cm),
        (update.foot, &mut session.body.foot_cm),
        (update.arms, &mut session.body.arms_cm),
    ];
    for (value, slot) in fields {
        if let Some(value) = value {
            *slot = value;
        }
    }

    store.save(&session)?;
    println!("✓ Client data saved");
    Ok(())
}

pub fn update_bike(config: &Config, discipline: Option<&str>, goal: Option<&str>) -> Result<()> {
    let store = open_session_store(config)?;
    let mut session = store.load();

    let discipline = discipline.map_or(session.bike.discipline, Discipline::from);
    let goal = goal.map_or(session.bike.goal, Goal::from);
    session.set_profile(discipline, goal);

    store.save(&session)?;
    println!("✓ Bike profile: {} / {}", discipline.label(), goal.label());
    Ok(())
}

/// Apply `field=value` assignments to a bike setup
pub fn apply_setup(setup: &BikeSetup, assignments: &[String]) -> Result<BikeSetup> {
    let Value::Object(mut fields) = serde_json::to_value(setup)? else {
        bail!("Bike setup did not serialize to an object");
    };

    for assignment in assignments {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Expected FIELD=VALUE, got `{}`", assignment);
        };
        let key = key.trim();
        if !fields.contains_key(key) {
            let known: Vec<&str> = fields.keys().map(String::as_str).collect();
            bail!("Unknown bike setup field `{}` (known: {})", key, known.join(", "));
        }
        fields.insert(key.to_string(), Value::String(value.trim().to_string()));
    }

    serde_json::from_value(Value::Object(fields)).context("Failed to rebuild bike setup")
}

pub fn update_setup(config: &Config, assignments: &[String]) -> Result<()> {
    if assignments.is_empty() {
        bail!("Nothing to set; pass --set FIELD=VALUE");
    }

    let store = open_session_store(config)?;
    let mut session = store.load();
    session.bike_setup = apply_setup(&session.bike_setup, assignments)?;

    store.save(&session)?;
    println!("✓ Bike setup saved ({} field(s))", assignments.len());
    Ok(())
}

pub fn export_session(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = open_session_store(config)?;
    let json = serialize_session(&store.load())?;

    match output {
        Some(path) => {
            fs::write(path, &json).context("Failed to write session file")?;
            println!("✓ Session exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn import_session(config: &Config, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file).context("Failed to read session file")?;
    let session = validate_session(&raw).context("Session file rejected")?;

    let store = open_session_store(config)?;
    store.save(&session)?;
    println!(
        "✓ Imported session for {} with {} measurement(s)",
        if session.client.name.is_empty() { "unnamed client" } else { session.client.name.as_str() },
        session.measurements.len()
    );
    Ok(())
}

pub fn clear_session(config: &Config, force: bool) -> Result<()> {
    if !force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Delete client data and all measurements?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled");
            return Ok(());
        }
    }

    let store = open_session_store(config)?;
    store.clear()?;
    println!("✓ Session cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_setup_assigns_known_fields() {
        let setup = apply_setup(
            &BikeSetup::default(),
            &["saddleHeight=735".to_string(), "stemLen = 100".to_string()],
        )
        .unwrap();

        assert_eq!(setup.saddle_height, "735");
        assert_eq!(setup.stem_len, "100");
        assert!(setup.bike_model.is_empty());
    }

    #[test]
    fn test_apply_setup_rejects_unknown_field() {
        let err = apply_setup(&BikeSetup::default(), &["seatpost=27.2".to_string()]).unwrap_err();
        assert!(err.to_string().contains("seatpost"));

        assert!(apply_setup(&BikeSetup::default(), &["saddleHeight".to_string()]).is_err());
    }
}
