/// Live capture session controller
///
/// Wraps one capture session: device start/stop, the per-frame pipeline,
/// throttled advice and every callback the host UI listens to. Frames must
/// be delivered sequentially; the controller never buffers or reorders.

use crate::config::PipelineConfig;
use crate::error::CaptureError;
use crate::models::issue::Issue;
use crate::models::landmark::PoseFrame;
use crate::models::metrics::{format_angle, format_stability, Kpi, Metrics, MISSING_VALUE};
use crate::models::preset::{Discipline, Goal, Preset};
use crate::services::advice_engine::AdviceEngine;
use crate::services::frame_pipeline::FramePipeline;
use crate::services::preset_resolver::resolve;

/// Host-side display callbacks; all fire-and-forget
pub trait UiSink {
    fn on_status(&mut self, text: &str, active: bool);
    fn on_debug(&mut self, message: &str);
    fn on_coach_hint(&mut self, title: &str, text: &str);
    fn on_client_issues(&mut self, issues: &[Issue]);
    fn on_kpi(&mut self, kpi: Kpi, value: &str);
}

/// Camera (or any frame producer) the session owns while running
#[cfg_attr(test, mockall::automock)]
pub trait CaptureDevice {
    /// Acquire the device; called once per start
    fn open(&mut self) -> Result<(), CaptureError>;
    /// Release every resource; must be safe to call when not open
    fn close(&mut self);
}

/// Currently displayed coach message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoachHint {
    pub title: String,
    pub text: String,
}

/// Result of one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub metrics: Metrics,
    /// Sorted issues, empty when no body was detected
    pub issues: Vec<Issue>,
}

pub struct LiveController<D: CaptureDevice, S: UiSink> {
    device: D,
    sink: S,
    running: bool,
    discipline: Discipline,
    goal: Goal,
    preset: Preset,
    pipeline: FramePipeline,
    advice: AdviceEngine,
    last_metrics: Metrics,
    last_hint: CoachHint,
}

impl<D: CaptureDevice, S: UiSink> LiveController<D, S> {
    pub fn new(config: PipelineConfig, device: D, sink: S) -> Self {
        let discipline = Discipline::default();
        let goal = Goal::default();
        Self {
            device,
            sink,
            running: false,
            discipline,
            goal,
            preset: resolve(discipline, goal),
            advice: AdviceEngine::new(&config),
            pipeline: FramePipeline::new(config),
            last_metrics: Metrics::default(),
            last_hint: CoachHint::default(),
        }
    }

    /// Start capturing for the given profile
    ///
    /// A second start while running is a no-op. A device failure is reported
    /// once and leaves the controller stopped; nothing is retried.
    pub fn start(&mut self, discipline: Discipline, goal: Goal) -> Result<(), CaptureError> {
        if self.running {
            return Ok(());
        }
        self.set_profile(discipline, goal);
        self.running = true;

        self.sink.on_status("ON", true);
        self.sink.on_debug("starting camera…");

        if let Err(err) = self.device.open() {
            tracing::warn!("Capture failed to start: {}", err);
            self.running = false;
            self.device.close();
            self.sink.on_status("OFF", false);
            self.sink.on_debug(&format!("error: {}", err));
            self.set_hint(
                "Camera unavailable",
                "Check camera permissions and close other apps using the camera, then start again.",
            );
            return Err(err);
        }

        self.reset_state();
        tracing::info!(
            "Live session started ({} / {})",
            self.discipline.label(),
            self.goal.label()
        );
        self.sink.on_debug("camera running");
        Ok(())
    }

    /// Stop capturing, release the device and forget all rolling state
    pub fn stop(&mut self) {
        self.running = false;
        self.device.close();
        self.reset_state();

        self.sink.on_status("OFF", false);
        self.sink.on_debug("stop");
        self.clear_kpis();
        tracing::info!("Live session stopped");
    }

    /// Restart measurement without touching the device
    pub fn reset(&mut self) {
        self.reset_state();
        self.clear_kpis();
        self.sink.on_debug("reset");
    }

    /// Change the preset used for advice
    pub fn set_profile(&mut self, discipline: Discipline, goal: Goal) {
        self.discipline = discipline;
        self.goal = goal;
        self.preset = resolve(discipline, goal);
        self.advice.reset();
    }

    fn reset_state(&mut self) {
        self.pipeline.reset();
        self.advice.reset();
        self.last_metrics = Metrics::default();
    }

    fn clear_kpis(&mut self) {
        for kpi in Kpi::ALL {
            self.sink.on_kpi(kpi, MISSING_VALUE);
        }
    }

    fn set_hint(&mut self, title: &str, text: &str) {
        self.last_hint = CoachHint {
            title: title.to_string(),
            text: text.to_string(),
        };
        self.sink.on_coach_hint(title, text);
    }

    /// Process one pose result; `None` when the session is not running
    pub fn process_frame(&mut self, frame: &PoseFrame) -> Option<FrameOutcome> {
        if !self.running {
            return None;
        }
        let now_ms = frame.timestamp_ms;

        let Some(landmarks) = frame.complete_landmarks() else {
            // The latch keeps ageing while the rider is out of frame
            self.last_metrics.knee_at_bdc_age_ms = self.pipeline.bdc_age_ms(now_ms);
            self.clear_kpis();
            self.set_hint(
                "Looking for the rider",
                "Stand side-on and keep hip, knee and ankle in frame.",
            );
            // Whatever comes next must replace this hint straight away
            self.advice.release_coach();
            self.sink.on_debug("no landmarks");
            return Some(FrameOutcome {
                metrics: self.last_metrics,
                issues: Vec::new(),
            });
        };

        let metrics = self.pipeline.process(landmarks, now_ms);
        self.last_metrics = metrics;

        let max_age = self.pipeline.config().bdc_max_age_ms;
        self.sink
            .on_kpi(Kpi::Knee, &format_angle(metrics.display_knee(max_age)));
        self.sink.on_kpi(Kpi::Elbow, &format_angle(metrics.elbow));
        self.sink.on_kpi(Kpi::Torso, &format_angle(metrics.torso));
        self.sink
            .on_kpi(Kpi::Stability, &format_stability(metrics.stability));

        let update = self.advice.update(&metrics, &self.preset, now_ms);
        if let Some(issues) = &update.client {
            self.sink.on_client_issues(issues);
        }
        if let Some(top) = &update.coach {
            self.set_hint(&top.title, &top.text);
        }

        let side = metrics.side.map_or("?", |side| side.as_str());
        self.sink.on_debug(&format!("ok (side={})", side));

        Some(FrameOutcome {
            metrics,
            issues: update.issues,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_metrics(&self) -> &Metrics {
        &self.last_metrics
    }

    pub fn last_hint(&self) -> &CoachHint {
        &self.last_hint
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
