// Terminal rendering of controller callbacks and session data

use bikefit::models::{
    format_angle, format_stability, FitSession, Issue, IssueKey, Kpi, Measurement, Preset, MISSING_VALUE,
};
use colored::Colorize;
use indicatif::ProgressBar;
use std::collections::BTreeMap;

use crate::config::UiConfig;

/// Prints controller callbacks as they arrive
pub struct ConsoleSink {
    settings: UiConfig,
    kpis: BTreeMap<&'static str, String>,
    status: String,
    hint: Option<(String, String)>,
    client_updates: usize,
    /// Spinner currently drawing on the terminal, if any
    progress: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new(settings: UiConfig) -> Self {
        if !settings.color {
            colored::control::set_override(false);
        }
        let kpis = Kpi::ALL
            .iter()
            .map(|kpi| (kpi.as_str(), MISSING_VALUE.to_string()))
            .collect();
        Self {
            settings,
            kpis,
            status: "OFF".to_string(),
            hint: None,
            client_updates: 0,
            progress: None,
        }
    }

    /// Print through `progress` until detached, so lines never tear the spinner
    pub fn attach_progress(&mut self, progress: ProgressBar) {
        self.progress = Some(progress);
    }

    pub fn detach_progress(&mut self) {
        self.progress = None;
    }

    pub fn has_progress(&self) -> bool {
        self.progress.is_some()
    }

    fn emit(&self, text: String) {
        match &self.progress {
            Some(progress) => progress.suspend(|| println!("{}", text)),
            None => println!("{}", text),
        }
    }

    pub fn kpi(&self, kpi: Kpi) -> &str {
        self.kpis.get(kpi.as_str()).map_or(MISSING_VALUE, String::as_str)
    }

    /// One-line KPI panel: `knee 147.2° | elbow ... | stab 91%`
    pub fn kpi_line(&self) -> String {
        Kpi::ALL
            .iter()
            .map(|&kpi| format!("{} {}", kpi.as_str(), self.kpi(kpi)))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn hint(&self) -> Option<&(String, String)> {
        self.hint.as_ref()
    }

    pub fn client_updates(&self) -> usize {
        self.client_updates
    }
}

impl bikefit::services::UiSink for ConsoleSink {
    fn on_status(&mut self, text: &str, active: bool) {
        self.status = text.to_string();
        let badge = if active { text.green().bold() } else { text.red().bold() };
        self.emit(format!("Camera: {}", badge));
    }

    fn on_debug(&mut self, message: &str) {
        if self.settings.show_debug {
            self.emit(format!("  {}", message.dimmed()));
        }
        tracing::trace!("pipeline: {}", message);
    }

    fn on_coach_hint(&mut self, title: &str, text: &str) {
        self.emit(format!("{} {}\n  {}", "▶".cyan(), title.bold(), text));
        self.hint = Some((title.to_string(), text.to_string()));
    }

    fn on_client_issues(&mut self, issues: &[Issue]) {
        self.client_updates += 1;
        if !self.settings.show_client_updates {
            return;
        }
        let mut lines = vec!["Client view".underline().to_string()];
        for issue in issues {
            lines.push(format!("  {} {}", issue_marker(issue.key), issue.title));
        }
        self.emit(lines.join("\n"));
    }

    fn on_kpi(&mut self, kpi: Kpi, value: &str) {
        self.kpis.insert(kpi.as_str(), value.to_string());
    }
}

fn issue_marker(key: IssueKey) -> colored::ColoredString {
    match key {
        IssueKey::AllOk => "✓".green(),
        IssueKey::StabLow => "!".yellow(),
        _ => "•".red(),
    }
}

pub fn print_issue(issue: &Issue) {
    println!("  {} {}", issue_marker(issue.key), issue.title.bold());
    println!("    {}", issue.text);
}

pub fn print_preset(label: &str, preset: &Preset) {
    println!(
        "  {:<18} knee {:<10} elbow {:<10} torso {}",
        label, preset.knee.to_string(), preset.elbow.to_string(), preset.torso
    );
}

pub fn print_measurement(m: &Measurement) {
    println!(
        "  {:<8} {}  {} / {}  knee {}  elbow {}  torso {}  stability {}{}",
        m.label.bold(),
        m.timestamp.format("%Y-%m-%d %H:%M:%S"),
        m.discipline.label(),
        m.goal.label(),
        format_angle(m.knee),
        format_angle(m.elbow),
        format_angle(m.torso),
        format_stability(m.stability),
        if m.image_data.is_some() { "  [image]" } else { "" }
    );
    println!("           id {}", m.id.dimmed());
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        MISSING_VALUE
    } else {
        value
    }
}

pub fn print_session(session: &FitSession) {
    println!("{}", "Fitting Session".bold());
    println!("────────────────────────────────");
    println!("Client:  {}", or_dash(&session.client.name));
    println!("Date:    {}", or_dash(&session.client.date));
    println!("Notes:   {}", or_dash(&session.client.notes));
    println!(
        "Body:    height {} cm, inseam {} cm, foot {} cm, arms {} cm",
        or_dash(&session.body.height_cm),
        or_dash(&session.body.inseam_cm),
        or_dash(&session.body.foot_cm),
        or_dash(&session.body.arms_cm)
    );
    println!(
        "Bike:    {} / {}",
        session.bike.discipline.label(),
        session.bike.goal.label()
    );

    if !session.bike_setup.is_empty() {
        println!();
        println!("{}", "Bike setup".underline());
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(&session.bike_setup) {
            for (key, value) in fields {
                if let Some(text) = value.as_str().filter(|t| !t.is_empty()) {
                    println!("  {:<14} {}", key, text);
                }
            }
        }
    }

    println!();
    if session.measurements.is_empty() {
        println!("No measurements saved yet.");
    } else {
        println!("{} ({})", "Measurements".underline(), session.measurements.len());
        for m in &session.measurements {
            print_measurement(m);
        }
    }
}
