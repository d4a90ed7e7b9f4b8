use anyhow::{Context, Result};
use base64::Engine;
use bikefit::models::{format_angle, format_stability, Discipline, Goal};
use bikefit::services::LiveController;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::capture::{stream_frames, ReplayDevice};
use crate::commands::{DISCIPLINES, GOALS};
use crate::config::Config;
use crate::storage::open_session_store;
use crate::ui::{print_issue, ConsoleSink};

#[derive(Args)]
pub struct ReplayCommand {
    /// Pose recording, one JSON frame per line
    file: PathBuf,

    /// Override the session's discipline
    #[arg(long, value_parser = DISCIPLINES)]
    discipline: Option<String>,

    /// Override the session's goal
    #[arg(long, value_parser = GOALS)]
    goal: Option<String>,

    /// Pace frames by their timestamps
    #[arg(long)]
    realtime: bool,

    /// Save the final metrics as a measurement
    #[arg(long)]
    save: bool,

    /// Snapshot image to attach to the saved measurement
    #[arg(long, requires = "save")]
    image: Option<PathBuf>,
}

/// Encode an image file as a data URL
pub fn image_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).context("Failed to read snapshot image")?;
    let mime = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

impl ReplayCommand {
    pub async fn execute(self, config: Config) -> Result<()> {
        let store = open_session_store(&config)?;
        let mut session = store.load();

        let discipline = self
            .discipline
            .as_deref()
            .map_or(session.bike.discipline, Discipline::from);
        let goal = self.goal.as_deref().map_or(session.bike.goal, Goal::from);

        let sink = ConsoleSink::new(config.ui.clone());
        let device = ReplayDevice::new(&self.file);
        let mut controller = LiveController::new(config.pipeline.clone(), device, sink);
        controller
            .start(discipline, goal)
            .context("Could not start the replay")?;

        let (tx, mut rx) = mpsc::channel(64);
        let path = self.file.clone();
        let realtime = self.realtime;
        let reader = tokio::spawn(async move { stream_frames(&path, tx, realtime).await });

        let progress = ProgressBar::new_spinner();
        progress.set_style(ProgressStyle::with_template("{spinner} {pos} frames  {msg}")?);
        controller.sink_mut().attach_progress(progress.clone());

        let mut last_outcome = None;
        while let Some(frame) = rx.recv().await {
            if let Some(outcome) = controller.process_frame(&frame) {
                last_outcome = Some(outcome);
            }
            progress.inc(1);
            progress.set_message(controller.sink().kpi_line());
        }
        progress.finish_and_clear();
        controller.sink_mut().detach_progress();

        let frames = reader.await.context("Frame reader task failed")??;
        tracing::info!("Replayed {} frames from {:?}", frames, self.file);

        println!();
        println!("{}", "Replay summary".bold());
        println!("────────────────────────────────");
        println!("Frames:   {}", frames);
        println!("Profile:  {} / {}", discipline.label(), goal.label());
        let metrics = *controller.last_metrics();
        println!(
            "Side:     {}",
            metrics.side.map_or("—", |side| side.as_str())
        );
        println!("KPIs:     {}", controller.sink().kpi_line());
        println!(
            "BDC knee: {}",
            format_angle(metrics.fresh_knee_at_bdc(config.pipeline.bdc_max_age_ms))
        );
        println!("Stab:     {}", format_stability(metrics.stability));

        if let Some(outcome) = &last_outcome {
            println!();
            println!("{}", "Issues".underline());
            for issue in &outcome.issues {
                print_issue(issue);
            }
        }

        if self.save {
            let image = self.image.as_deref().map(image_data_url).transpose()?;
            session.set_profile(discipline, goal);
            let label = session
                .record_measurement(&metrics, config.pipeline.bdc_max_age_ms, image, Utc::now())?
                .label
                .clone();
            store.save(&session)?;
            println!();
            println!("✓ Saved measurement: {}", label);
        }

        controller.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_image_data_url() -> Result<()> {
        let mut file = Builder::new().suffix(".png").tempfile()?;
        file.write_all(&[0x89, b'P', b'N', b'G'])?;

        let url = image_data_url(file.path())?;
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        Ok(())
    }
}
