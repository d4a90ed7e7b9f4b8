use anyhow::{bail, Result};
use bikefit::models::{FitSession, Measurement, MISSING_VALUE};
use bikefit::services::{select_pair, ReportComparator};
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::storage::open_session_store;
use crate::ui::print_measurement;

#[derive(Args)]
pub struct ReportCommand {
    /// BEFORE measurement (id or label); defaults to the first capture
    #[arg(long, requires = "after")]
    before: Option<String>,

    /// AFTER measurement (id or label); defaults to the second capture
    #[arg(long, requires = "before")]
    after: Option<String>,
}

/// Resolve a measurement reference: exact id, then case-insensitive label
pub fn resolve_reference<'a>(session: &'a FitSession, reference: &str) -> Option<&'a Measurement> {
    session.find_measurement(reference).or_else(|| {
        session
            .measurements
            .iter()
            .find(|m| m.label.eq_ignore_ascii_case(reference.trim()))
    })
}

impl ReportCommand {
    pub fn execute(self, config: &Config) -> Result<()> {
        let store = open_session_store(config)?;
        let session = store.load();

        let before_id = match self.before.as_deref() {
            Some(reference) => Some(lookup(&session, reference)?),
            None => None,
        };
        let after_id = match self.after.as_deref() {
            Some(reference) => Some(lookup(&session, reference)?),
            None => None,
        };

        let Some((before, after)) =
            select_pair(&session.measurements, before_id.as_deref(), after_id.as_deref())
        else {
            bail!(
                "A report needs two measurements; this session has {}",
                session.measurements.len()
            );
        };

        let client = if session.client.name.is_empty() {
            MISSING_VALUE
        } else {
            session.client.name.as_str()
        };

        println!("{}", "Bike Fit Report".bold());
        println!("────────────────────────────────");
        println!("Client: {}", client);
        println!("Date:   {}", session.client.date);
        println!(
            "Bike:   {} / {}",
            session.bike.discipline.label(),
            session.bike.goal.label()
        );
        println!();
        print_measurement(before);
        print_measurement(after);
        println!();
        println!("{}", "Recommendations".underline());

        let comparator = ReportComparator::new(config.pipeline.report_delta_deg);
        for line in comparator.compare(before, after) {
            println!("  • {}", line);
        }

        Ok(())
    }
}

fn lookup(session: &FitSession, reference: &str) -> Result<String> {
    match resolve_reference(session, reference) {
        Some(m) => Ok(m.id.clone()),
        None => bail!("No measurement matches `{}`", reference),
    }
}
